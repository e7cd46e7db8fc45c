//! 测试公共模块
//! 提供测试配置、应用构建和请求辅助函数

#![allow(dead_code)]

use auth_scaffold::{
    auth::PasswordHasher,
    config::{AppConfig, DatabaseConfig, LoggingConfig, SecurityConfig, ServerConfig},
    middleware::AppState,
    models::user::{NewUser, Role, User},
    repository::{InMemoryUserStore, UserStore},
    routes,
};
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use secrecy::Secret;
use std::sync::Arc;
use tower::ServiceExt;

pub const TEST_JWT_SECRET: &str = "test-secret-key-for-testing-only-min-32-chars";
pub const TEST_ISSUER: &str = "auth-scaffold";

/// 创建测试配置（低成本 Argon2 参数，内存存储）
pub fn create_test_config() -> AppConfig {
    AppConfig {
        environment: "test".to_string(),
        server: ServerConfig {
            addr: "127.0.0.1:0".to_string(),
            graceful_shutdown_timeout_secs: 5,
            request_timeout_secs: 10,
        },
        database: DatabaseConfig {
            url: None,
            max_connections: 5,
            min_connections: 1,
            acquire_timeout_secs: 5,
            idle_timeout_secs: 300,
            max_lifetime_secs: 1800,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        security: SecurityConfig {
            jwt_secret: Secret::new(TEST_JWT_SECRET.to_string()),
            jwt_issuer: TEST_ISSUER.to_string(),
            token_ttl_secs: 86400,
            password_hash_memory_kib: 1024,
            password_hash_iterations: 1,
            password_hash_parallelism: 1,
            cors_allowed_origins: vec![],
        },
    }
}

/// 测试应用：路由、状态和底层内存存储
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub store: Arc<InMemoryUserStore>,
}

pub fn create_test_app() -> TestApp {
    create_test_app_with_config(create_test_config())
}

/// 使用自定义配置（例如生产环境）构建内存存储应用
pub fn create_test_app_with_config(config: AppConfig) -> TestApp {
    let store = Arc::new(InMemoryUserStore::new());
    let (router, state) = build_router(config, store.clone());

    TestApp { router, state, store }
}

/// 使用任意凭据存储构建路由，用于注入故障存储
pub fn build_router(config: AppConfig, store: Arc<dyn UserStore>) -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(config, store).expect("Failed to build app state"));
    let router = routes::create_router(state.clone());

    (router, state)
}

/// 发送请求并解析 JSON 响应体（非 JSON 时为 Null）
pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);

    (status, json)
}

impl TestApp {
    /// 直接写入存储创建用户，绕过注册接口
    pub async fn create_user(&self, name: &str, email: &str, password: &str, role: Role) -> User {
        let hasher = PasswordHasher::new(1024, 1, 1).expect("valid params");
        let password_hash = hasher.hash(password).expect("Failed to hash password");

        self.store
            .create(NewUser {
                name: name.to_string(),
                email: email.to_string(),
                password_hash,
                role,
            })
            .await
            .expect("Failed to create test user")
    }

    /// 为用户签发令牌
    pub fn token_for(&self, user: &User) -> String {
        self.state
            .jwt_service
            .issue(user)
            .expect("Failed to issue token")
            .token
    }

    pub async fn post_json(
        &self,
        uri: &str,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        self.send(request).await
    }

    pub async fn get_with_auth(
        &self,
        uri: &str,
        authorization: Option<&str>,
    ) -> (StatusCode, serde_json::Value) {
        self.request_with_auth("GET", uri, authorization).await
    }

    pub async fn request_with_auth(
        &self,
        method: &str,
        uri: &str,
        authorization: Option<&str>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }

        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        send(&self.router, request).await
    }
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}
