//! 认证能力：注册、登录、refresh token 轮换、吊销与请求鉴权。
//!
//! - `jwt`：HS256 token 签发与校验
//! - `password`：Argon2 口令哈希
//! - `codes`：2FA / 手机验证码校验
//! - `service`：认证核心操作
//! - `gate`：Bearer token 鉴权
//!
//! 所有操作都在 `AuthService` 配置的超时内完成，超时返回 `AuthError::Timeout`。

mod codes;
mod gate;
mod jwt;
mod password;
mod service;
mod validate;

use async_trait::async_trait;
use bored_storage::{
    RefreshTokenStore, RevocationStore, StorageError, UserRecord, UserStore,
};
use domain::AuthContext;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub use codes::{CodeVerifier, StaticCode};
pub use gate::bearer_token;
pub use jwt::{
    AccessClaims, IssuedTokens, RefreshClaims, TokenCodec, TokenError, issue_access_token,
    issue_refresh_token, verify_access_token, verify_refresh_token,
};
pub use password::{
    hash_password, spawn_hash_password, spawn_verify_password, verify_password,
};
pub use validate::{MIN_PASSWORD_LEN, is_valid_email};

/// 默认操作超时。
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(5);

/// 认证相关错误。
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),
    #[error("please provide either email or username")]
    MissingIdentifier,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("the user email is already in use")]
    DuplicateEmail,
    #[error("username already in use")]
    DuplicateUsername,
    #[error("email not verified")]
    EmailNotVerified,
    #[error("invalid or missing 2FA code")]
    InvalidTwoFactorCode,
    #[error("invalid verification code")]
    InvalidCode,
    #[error("invalid or expired refresh token")]
    InvalidOrExpiredToken,
    #[error("Unauthorized")]
    Unauthenticated,
    #[error("Token has expired")]
    TokenExpired,
    #[error("user not found")]
    NotFound,
    #[error("operation timed out")]
    Timeout,
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StorageError> for AuthError {
    fn from(err: StorageError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

/// 登录凭据（至少提供用户名或邮箱之一）。
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: String,
    pub phone_number: Option<String>,
    pub two_fa_code: Option<String>,
}

/// 注册输入。
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub phone_number: Option<String>,
}

/// 登录/注册结果：token 对与公开的用户记录。
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub tokens: IssuedTokens,
    pub user: UserRecord,
}

/// 认证服务实现（基于三个存储 + JWT）。
pub struct AuthService {
    users: Arc<dyn UserStore>,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
    revocations: Arc<dyn RevocationStore>,
    codec: TokenCodec,
    two_factor: Arc<dyn CodeVerifier>,
    phone_codes: Arc<dyn CodeVerifier>,
    op_timeout: Duration,
}

impl AuthService {
    /// 创建认证服务实例；验证码校验默认拒绝一切输入。
    pub fn new(
        users: Arc<dyn UserStore>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        revocations: Arc<dyn RevocationStore>,
        codec: TokenCodec,
    ) -> Self {
        Self {
            users,
            refresh_tokens,
            revocations,
            codec,
            two_factor: Arc::new(StaticCode::disabled()),
            phone_codes: Arc::new(StaticCode::disabled()),
            op_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }

    pub fn with_two_factor(mut self, verifier: Arc<dyn CodeVerifier>) -> Self {
        self.two_factor = verifier;
        self
    }

    pub fn with_phone_codes(mut self, verifier: Arc<dyn CodeVerifier>) -> Self {
        self.phone_codes = verifier;
        self
    }

    pub fn with_timeout(mut self, op_timeout: Duration) -> Self {
        self.op_timeout = op_timeout;
        self
    }

    async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> Result<T, AuthError>
    where
        F: Future<Output = Result<T, AuthError>>,
    {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    operation,
                    timeout_ms = self.op_timeout.as_millis() as u64,
                    "auth operation timed out"
                );
                Err(AuthError::Timeout)
            }
        }
    }
}

/// 当前时间戳（毫秒）。
pub(crate) fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// 认证能力 trait，便于替换实现与测试。
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn register(&self, registration: Registration) -> Result<AuthSession, AuthError>;
    async fn login(&self, credentials: Credentials) -> Result<AuthSession, AuthError>;
    async fn rotate_refresh_token(&self, refresh_token: &str) -> Result<IssuedTokens, AuthError>;
    async fn logout(&self, refresh_token: &str, access_token: Option<&str>)
    -> Result<(), AuthError>;
    async fn blacklist_access_token(
        &self,
        access_token: &str,
        remaining_ttl: Duration,
    ) -> Result<(), AuthError>;
    async fn verify_email(&self, user_id: &str) -> Result<UserRecord, AuthError>;
    async fn verify_phone_number(&self, user_id: &str, code: &str)
    -> Result<UserRecord, AuthError>;
    async fn enable_two_factor(&self, user_id: &str) -> Result<UserRecord, AuthError>;
    async fn change_password(
        &self,
        user_id: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError>;
    async fn logout_all(&self, user_id: &str, access_token: Option<&str>)
    -> Result<(), AuthError>;
    async fn deactivate_account(
        &self,
        user_id: &str,
        access_token: Option<&str>,
    ) -> Result<(), AuthError>;
    async fn delete_user(&self, user_id: &str) -> Result<(), AuthError>;
    async fn current_user(&self, user_id: &str) -> Result<UserRecord, AuthError>;
    async fn list_users(&self) -> Result<Vec<UserRecord>, AuthError>;
    async fn authorize(&self, authorization: Option<&str>) -> Result<AuthContext, AuthError>;
}

#[async_trait]
impl Authenticator for AuthService {
    async fn register(&self, registration: Registration) -> Result<AuthSession, AuthError> {
        self.register(registration).await
    }

    async fn login(&self, credentials: Credentials) -> Result<AuthSession, AuthError> {
        self.login(credentials).await
    }

    async fn rotate_refresh_token(&self, refresh_token: &str) -> Result<IssuedTokens, AuthError> {
        self.rotate_refresh_token(refresh_token).await
    }

    async fn logout(
        &self,
        refresh_token: &str,
        access_token: Option<&str>,
    ) -> Result<(), AuthError> {
        self.logout(refresh_token, access_token).await
    }

    async fn blacklist_access_token(
        &self,
        access_token: &str,
        remaining_ttl: Duration,
    ) -> Result<(), AuthError> {
        self.blacklist_access_token(access_token, remaining_ttl).await
    }

    async fn verify_email(&self, user_id: &str) -> Result<UserRecord, AuthError> {
        self.verify_email(user_id).await
    }

    async fn verify_phone_number(
        &self,
        user_id: &str,
        code: &str,
    ) -> Result<UserRecord, AuthError> {
        self.verify_phone_number(user_id, code).await
    }

    async fn enable_two_factor(&self, user_id: &str) -> Result<UserRecord, AuthError> {
        self.enable_two_factor(user_id).await
    }

    async fn change_password(
        &self,
        user_id: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        self.change_password(user_id, current_password, new_password)
            .await
    }

    async fn logout_all(
        &self,
        user_id: &str,
        access_token: Option<&str>,
    ) -> Result<(), AuthError> {
        self.logout_all(user_id, access_token).await
    }

    async fn deactivate_account(
        &self,
        user_id: &str,
        access_token: Option<&str>,
    ) -> Result<(), AuthError> {
        self.deactivate_account(user_id, access_token).await
    }

    async fn delete_user(&self, user_id: &str) -> Result<(), AuthError> {
        self.delete_user(user_id).await
    }

    async fn current_user(&self, user_id: &str) -> Result<UserRecord, AuthError> {
        self.current_user(user_id).await
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, AuthError> {
        self.list_users().await
    }

    async fn authorize(&self, authorization: Option<&str>) -> Result<AuthContext, AuthError> {
        self.authorize(authorization).await
    }
}
