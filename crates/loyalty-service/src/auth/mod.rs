//! 认证模块
//!
//! 提供 JWT Token 生成、验证和密码处理功能

mod jwt;
mod password;

pub use jwt::{AuthUser, Claims, JwtConfig, JwtManager};
pub use password::{hash_password, verify_password};
