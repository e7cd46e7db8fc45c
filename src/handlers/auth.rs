//! 认证相关的 HTTP 处理器

use crate::{
    auth::middleware::CurrentUser,
    error::AppError,
    middleware::AppState,
    models::{
        auth::{LoginRequest, RegisterRequest},
        user::User,
    },
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

/// 注册
pub async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload?;

    let response = state.auth_service.register(req).await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// 登录
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload?;

    let response = state.auth_service.login(req).await?;

    Ok(Json(response))
}

/// 获取当前用户信息
pub async fn me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

/// 刷新令牌
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let response = state.auth_service.refresh(user)?;

    Ok(Json(response))
}
