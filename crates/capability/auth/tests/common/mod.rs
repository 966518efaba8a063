#![allow(dead_code)]

use std::sync::Arc;

use bored_auth::{AuthService, AuthSession, Registration, StaticCode, TokenCodec};
use bored_storage::{
    InMemoryRefreshTokenStore, InMemoryRevocationStore, InMemoryUserStore, RefreshTokenStore,
    RevocationStore, UserStore,
};

pub const ACCESS_SECRET: &str = "access-secret";
pub const REFRESH_SECRET: &str = "refresh-secret";
pub const TWO_FACTOR_CODE: &str = "654321";
pub const PHONE_CODE: &str = "123456";
pub const PASSWORD: &str = "correct horse";

pub struct Harness {
    pub auth: AuthService,
    pub users: Arc<InMemoryUserStore>,
    pub refresh_tokens: Arc<InMemoryRefreshTokenStore>,
    pub revocations: Arc<InMemoryRevocationStore>,
}

pub fn codec() -> TokenCodec {
    TokenCodec::from_minutes_and_days(ACCESS_SECRET, REFRESH_SECRET, 15, 7)
}

pub fn harness() -> Harness {
    harness_with_codec(codec())
}

pub fn harness_with_codec(codec: TokenCodec) -> Harness {
    let users = Arc::new(InMemoryUserStore::new());
    let refresh_tokens = Arc::new(InMemoryRefreshTokenStore::new());
    let revocations = Arc::new(InMemoryRevocationStore::new());
    let auth = AuthService::new(
        users.clone(),
        refresh_tokens.clone(),
        revocations.clone(),
        codec,
    )
    .with_two_factor(Arc::new(StaticCode::new(TWO_FACTOR_CODE)))
    .with_phone_codes(Arc::new(StaticCode::new(PHONE_CODE)));
    Harness {
        auth,
        users,
        refresh_tokens,
        revocations,
    }
}

/// 使用自定义吊销存储构建服务（故障注入）。
pub fn service_with_revocations(revocations: Arc<dyn RevocationStore>) -> AuthService {
    AuthService::new(
        Arc::new(InMemoryUserStore::new()),
        Arc::new(InMemoryRefreshTokenStore::new()),
        revocations,
        codec(),
    )
}

/// 使用自定义用户 / refresh token 存储构建服务（注入延迟）。
pub fn service_with_stores(
    users: Arc<dyn UserStore>,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
) -> AuthService {
    AuthService::new(
        users,
        refresh_tokens,
        Arc::new(InMemoryRevocationStore::new()),
        codec(),
    )
    .with_two_factor(Arc::new(StaticCode::new(TWO_FACTOR_CODE)))
    .with_phone_codes(Arc::new(StaticCode::new(PHONE_CODE)))
}

pub fn registration(username: &str, email: &str) -> Registration {
    Registration {
        username: username.to_string(),
        email: email.to_string(),
        password: PASSWORD.to_string(),
        phone_number: None,
    }
}

/// 注册并完成邮箱验证。
pub async fn verified_user(auth: &AuthService, username: &str, email: &str) -> AuthSession {
    let session = auth
        .register(registration(username, email))
        .await
        .expect("register");
    auth.verify_email(&session.user.user_id)
        .await
        .expect("verify email");
    session
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}
