//! PostgreSQL 仓库集成测试
//! 需要设置 TEST_DATABASE_URL，运行：cargo test -- --ignored

use auth_scaffold::{
    config::DatabaseConfig,
    db,
    error::AppError,
    models::user::{NewUser, Role},
    repository::{PgUserRepository, UserStore},
};
use secrecy::Secret;
use serial_test::serial;
use uuid::Uuid;

async fn setup_repo() -> PgUserRepository {
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");
    let config = DatabaseConfig {
        url: None,
        max_connections: 2,
        min_connections: 1,
        acquire_timeout_secs: 5,
        idle_timeout_secs: 60,
        max_lifetime_secs: 300,
    };

    let pool = db::create_pool(&Secret::new(url), &config)
        .await
        .expect("Failed to connect to test database");
    db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    sqlx::query("DELETE FROM users")
        .execute(&pool)
        .await
        .expect("Failed to clean users table");

    PgUserRepository::new(pool)
}

fn new_user(email: &str) -> NewUser {
    NewUser {
        name: "Test User".to_string(),
        email: email.to_string(),
        password_hash: "$argon2id$placeholder".to_string(),
        role: Role::User,
    }
}

#[tokio::test]
#[serial]
#[ignore]
async fn test_create_and_find_user() {
    let repo = setup_repo().await;

    let user = repo.create(new_user("test@example.com")).await.unwrap();
    assert_eq!(user.role, Role::User);

    let by_email = repo.find_by_email("test@example.com").await.unwrap().unwrap();
    assert_eq!(by_email.id, user.id);
    assert_eq!(by_email.password_hash, "$argon2id$placeholder");

    let by_id = repo.find_by_id(&user.id).await.unwrap().unwrap();
    assert_eq!(by_id.email, "test@example.com");

    assert!(repo.find_by_id(&Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
#[ignore]
async fn test_duplicate_email_is_rejected() {
    let repo = setup_repo().await;

    repo.create(new_user("test@example.com")).await.unwrap();
    let err = repo.create(new_user("TEST@example.com")).await.unwrap_err();

    match err {
        AppError::Validation { details, .. } => {
            assert!(details["email"].contains("already taken"));
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[tokio::test]
#[serial]
#[ignore]
async fn test_health_check() {
    let repo = setup_repo().await;

    assert!(repo.health_check().await.is_healthy());
}
