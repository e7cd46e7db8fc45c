//! 路由注册
//! 创建所有 API 路由并应用中间件

use axum::{
    error_handling::HandleErrorLayer,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower::{timeout::error::Elapsed, timeout::TimeoutLayer, BoxError, ServiceBuilder};

use crate::{
    auth::middleware::{jwt_auth_middleware, require_admin},
    error::AppError,
    handlers,
    middleware::{cors_layer, force_https_middleware, request_tracking_middleware, AppState},
};

/// 创建应用路由
pub fn create_router(state: Arc<AppState>) -> Router {
    // 健康检查（公开）
    let health_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/health/live", get(handlers::health::liveness_check))
        .route("/health/ready", get(handlers::health::readiness_check));

    // 认证路由（无需认证）
    let public_auth_routes = Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login));

    // 需要认证的路由
    let authenticated_routes = Router::new()
        .route("/auth/me", get(handlers::auth::me))
        .route("/auth/refresh", post(handlers::auth::refresh))
        .route("/api/v1/profile", get(handlers::auth::me))
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    // 管理员路由：先认证，再校验角色（后添加的 layer 先执行）
    let admin_routes = Router::new()
        .route("/api/v1/admin/users/{id}", get(handlers::admin::get_user))
        .route_layer(from_fn(require_admin))
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    let request_timeout = Duration::from_secs(state.config.server.request_timeout_secs);

    Router::new()
        .merge(health_routes)
        .merge(public_auth_routes)
        .merge(authenticated_routes)
        .merge(admin_routes)
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_timeout_error))
                .layer(TimeoutLayer::new(request_timeout)),
        )
        .layer(cors_layer(&state.config))
        .layer(from_fn_with_state(state.clone(), force_https_middleware))
        .layer(from_fn(request_tracking_middleware))
        .with_state(state)
}

/// 超时以 JSON 错误体返回 408
async fn handle_timeout_error(err: BoxError) -> AppError {
    if err.is::<Elapsed>() {
        AppError::RequestTimeout
    } else {
        AppError::Internal(format!("Unhandled middleware error: {}", err))
    }
}
