//! JWT 认证中间件与角色校验
//!
//! 认证按固定顺序执行：请求头存在 -> 格式 -> 令牌解码 -> 主体 ID -> 用户查找。
//! 每一步都是独立函数，任一步失败即返回 401。

use crate::{
    auth::jwt::{Claims, JwtService},
    error::AppError,
    middleware::AppState,
    models::user::{Role, User},
    repository::UserStore,
};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use uuid::Uuid;

/// 当前请求的已认证用户（附加到请求扩展）
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

// 实现 FromRequestParts 以便在 handler 中直接提取 CurrentUser
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

/// 从 Authorization 头提取 Bearer 令牌
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let value = match headers.get(AUTHORIZATION) {
        None => return Err(AppError::AuthHeaderRequired),
        Some(v) if v.is_empty() => return Err(AppError::AuthHeaderRequired),
        Some(v) => v.to_str().map_err(|_| AppError::MalformedAuthHeader)?,
    };

    let parts: Vec<&str> = value.split(' ').collect();
    match parts.as_slice() {
        ["Bearer", token] => Ok(*token),
        _ => Err(AppError::MalformedAuthHeader),
    }
}

/// 解码并校验令牌
pub fn decode_token(jwt_service: &JwtService, token: &str) -> Result<Claims, AppError> {
    jwt_service.decode(token).map_err(|_| AppError::InvalidToken)
}

/// 解析令牌中的用户 ID
pub fn subject_id(claims: &Claims) -> Result<Uuid, AppError> {
    Uuid::parse_str(&claims.sub).map_err(|_| AppError::InvalidSubject)
}

/// 查找令牌对应的用户
pub async fn resolve_user(store: &dyn UserStore, user_id: &Uuid) -> Result<User, AppError> {
    store
        .find_by_id(user_id)
        .await?
        .ok_or(AppError::IdentityNotFound)
}

/// 按顺序执行全部认证步骤
pub async fn authenticate(
    jwt_service: &JwtService,
    store: &dyn UserStore,
    headers: &HeaderMap,
) -> Result<User, AppError> {
    let token = bearer_token(headers)?;
    let claims = decode_token(jwt_service, token)?;
    let user_id = subject_id(&claims)?;
    resolve_user(store, &user_id).await
}

/// JWT 认证中间件 - 必须认证
pub async fn jwt_auth_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = authenticate(&state.jwt_service, state.store.as_ref(), req.headers())
        .await
        .map_err(|e| {
            tracing::debug!(reason = %e, "Authentication failed");
            e
        })?;

    tracing::Span::current().record("user_id", tracing::field::display(user.id));

    // 附加到请求扩展
    req.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(req).await)
}

/// 校验当前用户角色；未认证视为 401，而不是放行
pub fn check_role(current: Option<&CurrentUser>, required: Role) -> Result<(), AppError> {
    let CurrentUser(user) = current.ok_or(AppError::Unauthorized)?;

    if user.role != required {
        tracing::warn!(user_id = %user.id, required = %required, "Role check failed");
        return Err(AppError::Forbidden);
    }

    Ok(())
}

/// 管理员路由守卫，必须在 jwt_auth_middleware 之后执行
pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    check_role(req.extensions().get::<CurrentUser>(), Role::Admin)?;
    Ok(next.run(req).await)
}
