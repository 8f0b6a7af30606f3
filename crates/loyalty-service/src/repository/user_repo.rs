//! 用户仓储

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::is_unique_violation;
use super::traits::UserRepositoryTrait;
use crate::error::{LoyaltyError, Result};
use crate::models::User;

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 创建用户
    ///
    /// login 上的唯一约束冲突映射为 `LoginTaken`
    pub async fn create(&self, login: &str, password_hash: &str) -> Result<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, login, password_hash, created_at)
            VALUES ($1, $2, $3, NOW())
            RETURNING id, login, password_hash, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(login)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                LoyaltyError::LoginTaken(login.to_string())
            } else {
                LoyaltyError::Database(e)
            }
        })
    }

    pub async fn find_by_login(&self, login: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, login, password_hash, created_at
            FROM users
            WHERE login = $1
            "#,
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}

#[async_trait]
impl UserRepositoryTrait for UserRepository {
    async fn create(&self, login: &str, password_hash: &str) -> Result<User> {
        self.create(login, password_hash).await
    }

    async fn find_by_login(&self, login: &str) -> Result<Option<User>> {
        self.find_by_login(login).await
    }
}
