//! JWT Token 处理

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use loyalty_shared::config::AuthConfig;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LoyaltyError;

/// JWT 配置
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    /// Token 过期时间（秒）
    pub expires_in_secs: i64,
    pub issuer: String,
}

impl From<&AuthConfig> for JwtConfig {
    fn from(config: &AuthConfig) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            expires_in_secs: config.token_ttl_secs,
            issuer: config.issuer.clone(),
        }
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self::from(&AuthConfig::default())
    }
}

/// JWT Claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// 用户 ID
    pub sub: String,
    pub login: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

/// 已认证的调用方，由认证中间件注入请求扩展
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub login: String,
}

impl TryFrom<Claims> for AuthUser {
    type Error = LoyaltyError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| LoyaltyError::Unauthorized("无效的用户 ID".to_string()))?;
        Ok(Self {
            user_id,
            login: claims.login,
        })
    }
}

/// JWT 管理器
///
/// 在启动时由配置构建一次，放入 AppState 共享
#[derive(Clone)]
pub struct JwtManager {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtManager {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// 生成 HS256 Token
    pub fn generate_token(&self, user_id: Uuid, login: &str) -> Result<String, LoyaltyError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.config.expires_in_secs);

        let claims = Claims {
            sub: user_id.to_string(),
            login: login.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: self.config.issuer.clone(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| LoyaltyError::Internal(format!("JWT 生成失败: {}", e)))
    }

    /// 验证 Token 并解析出调用方
    pub fn verify_token(&self, token: &str) -> Result<AuthUser, LoyaltyError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.config.issuer]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(
            |e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    LoyaltyError::Unauthorized("Token 已过期".to_string())
                }
                _ => LoyaltyError::Unauthorized(format!("Token 验证失败: {}", e)),
            },
        )?;

        AuthUser::try_from(token_data.claims)
    }
}
