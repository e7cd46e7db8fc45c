//! 健康检查处理器
//! 提供 /health、/health/live 和 /health/ready 端点

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::middleware::AppState;

/// 综合健康信息
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub uptime_secs: u64,
    pub version: String,
    pub services: BTreeMap<String, String>,
    pub system: SystemInfo,
}

/// 运行环境信息
#[derive(Debug, Serialize, Deserialize)]
pub struct SystemInfo {
    pub os: String,
    pub arch: String,
    pub num_cpus: usize,
}

/// 存活探针响应
#[derive(Debug, Serialize, Deserialize)]
pub struct LivenessResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

/// 就绪探针响应
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub services: BTreeMap<String, String>,
}

fn store_backend(state: &AppState) -> &'static str {
    if state.config.database.url.is_some() {
        "postgres"
    } else {
        "in_memory"
    }
}

/// 综合健康信息，不检查依赖
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let mut services = BTreeMap::new();
    services.insert("api".to_string(), "healthy".to_string());
    services.insert("credential_store".to_string(), store_backend(&state).to_string());

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        services,
        system: SystemInfo {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            num_cpus: std::thread::available_parallelism().map_or(1, |n| n.get()),
        },
    })
}

/// 存活探针
/// 快速响应，不检查依赖
pub async fn liveness_check() -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: "alive".to_string(),
        timestamp: Utc::now(),
    })
}

/// 就绪探针
/// 检查凭据存储，不可用时返回 503
pub async fn readiness_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<ReadinessResponse>) {
    let mut services = BTreeMap::new();
    services.insert("api".to_string(), "ready".to_string());

    let store_health = state.store.health_check().await;
    let ready = store_health.is_healthy();
    services.insert(
        "credential_store".to_string(),
        if ready { "ready" } else { "not_ready" }.to_string(),
    );

    let (status, code) = if ready {
        ("ready", StatusCode::OK)
    } else {
        tracing::warn!(health = ?store_health, "Readiness check failed");
        ("not_ready", StatusCode::SERVICE_UNAVAILABLE)
    };

    (
        code,
        Json(ReadinessResponse {
            status: status.to_string(),
            timestamp: Utc::now(),
            services,
        }),
    )
}
