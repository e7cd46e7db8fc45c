//! HTTP 中间件与应用状态
//! 请求追踪、HTTPS 重定向、CORS

use crate::{
    auth::{JwtService, PasswordHasher},
    config::AppConfig,
    error::AppError,
    repository::UserStore,
    services::AuthService,
};
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tracing::Instrument;
use uuid::Uuid;

/// 应用状态
///
/// 所有请求共享同一份只读配置、令牌服务与凭据存储
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn UserStore>,
    pub jwt_service: Arc<JwtService>,
    pub auth_service: Arc<AuthService>,
    pub started_at: Instant,
}

impl AppState {
    /// 根据配置和凭据存储构建完整状态
    pub fn new(config: AppConfig, store: Arc<dyn UserStore>) -> Result<Self, AppError> {
        let jwt_service = Arc::new(JwtService::from_config(&config)?);
        let hasher = PasswordHasher::from_config(&config.security)?;
        let auth_service = Arc::new(AuthService::new(
            store.clone(),
            jwt_service.clone(),
            hasher,
        )?);

        Ok(Self {
            config,
            store,
            jwt_service,
            auth_service,
            started_at: Instant::now(),
        })
    }
}

/// 请求追踪中间件
/// 为每个请求生成 trace_id 和 request_id，并记录指标
pub async fn request_tracking_middleware(req: Request, next: Next) -> Response {
    let trace_id = extract_or_generate_trace_id(req.headers());
    let request_id = Uuid::new_v4().to_string();

    let method = req.method().clone();
    let uri = req.uri().path().to_string();

    let span = tracing::info_span!(
        "http_request",
        trace_id = %trace_id,
        request_id = %request_id,
        method = %method,
        uri = %uri,
        user_id = tracing::field::Empty,
    );

    async move {
        let start = Instant::now();

        let mut response = next.run(req).await;

        let elapsed = start.elapsed();
        let status = response.status().as_u16();

        metrics::counter!(
            "http_requests_total",
            "method" => method_label(&method),
            "status" => status_label(status)
        )
        .increment(1);
        metrics::histogram!("http_request_duration_seconds").record(elapsed.as_secs_f64());

        tracing::info!(
            status = status,
            elapsed_ms = elapsed.as_millis() as u64,
            "Request completed"
        );

        if let Ok(value) = HeaderValue::from_str(&trace_id) {
            response.headers_mut().insert("x-trace-id", value);
        }
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert("x-request-id", value);
        }

        response
    }
    .instrument(span)
    .await
}

/// 生产环境下把非 HTTPS 请求永久重定向到 HTTPS
///
/// TLS 由反向代理终止，协议以 X-Forwarded-Proto 为准。健康检查不重定向。
pub async fn force_https_middleware(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    if state.config.is_production() && !req.uri().path().starts_with("/health") {
        if let Some(location) = https_redirect_target(req.headers(), req.uri()) {
            tracing::debug!(location = %location, "Redirecting to HTTPS");
            return (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]).into_response();
        }
    }

    next.run(req).await
}

/// 请求已经是 HTTPS 或缺少 Host 时返回 None
fn https_redirect_target(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    let forwarded_https = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|proto| proto.eq_ignore_ascii_case("https"));
    if forwarded_https {
        return None;
    }

    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .filter(|h| !h.is_empty())?;
    let path = uri.path_and_query().map_or("/", |pq| pq.as_str());

    Some(format!("https://{}{}", host, path))
}

/// 指标标签使用静态字符串，避免基数膨胀
fn method_label(method: &Method) -> &'static str {
    match *method {
        Method::GET => "GET",
        Method::POST => "POST",
        Method::PUT => "PUT",
        Method::DELETE => "DELETE",
        Method::PATCH => "PATCH",
        Method::OPTIONS => "OPTIONS",
        _ => "UNKNOWN",
    }
}

fn status_label(status: u16) -> &'static str {
    match status {
        200 => "200",
        201 => "201",
        301 => "301",
        400 => "400",
        401 => "401",
        403 => "403",
        404 => "404",
        408 => "408",
        500 => "500",
        503 => "503",
        _ => "other",
    }
}

/// 从请求头中提取或生成 trace_id
fn extract_or_generate_trace_id(headers: &HeaderMap) -> String {
    headers
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// CORS 配置，未指定来源时允许任意来源
pub fn cors_layer(config: &AppConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    let origins: Vec<HeaderValue> = config
        .security
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(origins)
    }
}
