//! 用户注册与登录服务
//!
//! 注册成功即视为登录，两者都返回新签发的 JWT

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::auth::{JwtManager, hash_password, verify_password};
use crate::error::{LoyaltyError, Result};
use crate::repository::UserRepositoryTrait;
use crate::service::dto::CredentialsRequest;

pub struct UserService {
    user_repo: Arc<dyn UserRepositoryTrait>,
    jwt_manager: Arc<JwtManager>,
}

impl UserService {
    pub fn new(user_repo: Arc<dyn UserRepositoryTrait>, jwt_manager: Arc<JwtManager>) -> Self {
        Self {
            user_repo,
            jwt_manager,
        }
    }

    fn validate(request: &CredentialsRequest) -> Result<()> {
        if request.login.trim().is_empty() || request.password.is_empty() {
            return Err(LoyaltyError::BadRequest("登录名和密码不能为空".to_string()));
        }
        Ok(())
    }

    /// 注册新用户并返回 Token
    #[instrument(skip(self, request), fields(login = %request.login))]
    pub async fn register(&self, request: &CredentialsRequest) -> Result<String> {
        Self::validate(request)?;

        let password_hash = hash_password(&request.password)?;
        let user = self.user_repo.create(&request.login, &password_hash).await?;

        info!(user_id = %user.id, "用户注册成功");
        self.jwt_manager.generate_token(user.id, &user.login)
    }

    /// 校验凭据并返回 Token
    #[instrument(skip(self, request), fields(login = %request.login))]
    pub async fn login(&self, request: &CredentialsRequest) -> Result<String> {
        Self::validate(request)?;

        let Some(user) = self.user_repo.find_by_login(&request.login).await? else {
            warn!("登录失败：用户不存在");
            return Err(LoyaltyError::InvalidCredentials);
        };

        if !verify_password(&request.password, &user.password_hash)? {
            warn!(user_id = %user.id, "登录失败：密码错误");
            return Err(LoyaltyError::InvalidCredentials);
        }

        self.jwt_manager.generate_token(user.id, &user.login)
    }
}
