//! 用户实体

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// 注册用户
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub login: String,
    /// bcrypt 哈希，不对外输出
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}
