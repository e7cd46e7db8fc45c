//! 用户注册、登录与 JWT 鉴权服务
//! 提供凭据存储、令牌签发校验、认证中间件和健康检查

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;
pub mod telemetry;
