//! 管理员接口

use crate::{error::AppError, middleware::AppState, models::user::User};
use axum::{
    extract::{rejection::PathRejection, Path, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

/// 按 ID 查询用户
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<User>, AppError> {
    // 非法 ID 与不存在的用户同样返回 404
    let Path(id) = path.map_err(|_| AppError::NotFound)?;

    let user = state.store.find_by_id(&id).await?.ok_or(AppError::NotFound)?;

    Ok(Json(user))
}
