//! JWT 签发与校验（HS256）。
//!
//! access token 与 refresh token 使用不同密钥，`typ` claim 区分类型。
//! 每个 token 带独立 `jti`，同一秒内为同一用户签发的 token 也互不相同。

use domain::RoleTag;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

// 区分 access 与 refresh 的 token 类型。
const ACCESS_TOKEN_TYPE: &str = "access";
const REFRESH_TOKEN_TYPE: &str = "refresh";

/// token 编解码错误。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("malformed token")]
    Malformed,
    #[error("signing secret is empty")]
    EmptySecret,
    #[error("token signing failed: {0}")]
    Signing(String),
}

/// access token claims。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    pub roles: BTreeSet<RoleTag>,
    pub ver: i64,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
    pub typ: String,
}

/// refresh token claims（不含角色）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: String,
    pub ver: i64,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
    pub typ: String,
}

trait TypedClaims {
    fn typ(&self) -> &str;
    fn exp(&self) -> i64;
}

impl TypedClaims for AccessClaims {
    fn typ(&self) -> &str {
        &self.typ
    }

    fn exp(&self) -> i64 {
        self.exp
    }
}

impl TypedClaims for RefreshClaims {
    fn typ(&self) -> &str {
        &self.typ
    }

    fn exp(&self) -> i64 {
        self.exp
    }
}

/// 签发 access token。
pub fn issue_access_token(
    user_id: &str,
    roles: &BTreeSet<RoleTag>,
    token_version: i64,
    secret: &[u8],
    ttl: Duration,
) -> Result<String, TokenError> {
    let claims = access_claims(user_id, roles, token_version, now_epoch_seconds(), ttl);
    encode(&claims, secret)
}

/// 签发 refresh token。
pub fn issue_refresh_token(
    user_id: &str,
    token_version: i64,
    secret: &[u8],
    ttl: Duration,
) -> Result<String, TokenError> {
    let claims = refresh_claims(user_id, token_version, now_epoch_seconds(), ttl);
    encode(&claims, secret)
}

fn access_claims(
    user_id: &str,
    roles: &BTreeSet<RoleTag>,
    token_version: i64,
    iat: i64,
    ttl: Duration,
) -> AccessClaims {
    AccessClaims {
        sub: user_id.to_string(),
        roles: roles.clone(),
        ver: token_version,
        iat,
        exp: expires_at(iat, ttl),
        jti: Uuid::new_v4().to_string(),
        typ: ACCESS_TOKEN_TYPE.to_string(),
    }
}

fn refresh_claims(user_id: &str, token_version: i64, iat: i64, ttl: Duration) -> RefreshClaims {
    RefreshClaims {
        sub: user_id.to_string(),
        ver: token_version,
        iat,
        exp: expires_at(iat, ttl),
        jti: Uuid::new_v4().to_string(),
        typ: REFRESH_TOKEN_TYPE.to_string(),
    }
}

/// 校验 access token 并解出 claims。
pub fn verify_access_token(token: &str, secret: &[u8]) -> Result<AccessClaims, TokenError> {
    decode(token, secret, ACCESS_TOKEN_TYPE)
}

/// 校验 refresh token 并解出 claims。
pub fn verify_refresh_token(token: &str, secret: &[u8]) -> Result<RefreshClaims, TokenError> {
    decode(token, secret, REFRESH_TOKEN_TYPE)
}

/// 一次签发得到的 token 对，过期时间为 unix 秒。
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_at: i64,
    pub refresh_expires_at: i64,
}

/// JWT 生成与校验，持有双密钥与双 TTL。
#[derive(Clone)]
pub struct TokenCodec {
    access_secret: Vec<u8>,
    refresh_secret: Vec<u8>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenCodec {
    pub fn new(
        access_secret: impl Into<String>,
        refresh_secret: impl Into<String>,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            access_secret: access_secret.into().into_bytes(),
            refresh_secret: refresh_secret.into().into_bytes(),
            access_ttl,
            refresh_ttl,
        }
    }

    /// access TTL 以分钟、refresh TTL 以天配置。
    pub fn from_minutes_and_days(
        access_secret: impl Into<String>,
        refresh_secret: impl Into<String>,
        access_ttl_minutes: u64,
        refresh_ttl_days: u64,
    ) -> Self {
        Self::new(
            access_secret,
            refresh_secret,
            Duration::from_secs(access_ttl_minutes.saturating_mul(60)),
            Duration::from_secs(refresh_ttl_days.saturating_mul(24 * 60 * 60)),
        )
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// 签发 access/refresh token 对。
    pub fn issue_pair(
        &self,
        user_id: &str,
        roles: &BTreeSet<RoleTag>,
        token_version: i64,
    ) -> Result<IssuedTokens, TokenError> {
        let iat = now_epoch_seconds();
        let access = access_claims(user_id, roles, token_version, iat, self.access_ttl);
        let refresh = refresh_claims(user_id, token_version, iat, self.refresh_ttl);
        Ok(IssuedTokens {
            access_token: encode(&access, &self.access_secret)?,
            refresh_token: encode(&refresh, &self.refresh_secret)?,
            access_expires_at: access.exp,
            refresh_expires_at: refresh.exp,
        })
    }

    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        verify_access_token(token, &self.access_secret)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        verify_refresh_token(token, &self.refresh_secret)
    }
}

/// 当前时间戳（秒）。
pub(crate) fn now_epoch_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

fn expires_at(iat: i64, ttl: Duration) -> i64 {
    iat.saturating_add(ttl.as_secs().min(i64::MAX as u64) as i64)
}

fn encode<C: Serialize>(claims: &C, secret: &[u8]) -> Result<String, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::EmptySecret);
    }
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|err| TokenError::Signing(err.to_string()))
}

fn decode<C>(token: &str, secret: &[u8], expected_type: &str) -> Result<C, TokenError>
where
    C: DeserializeOwned + TypedClaims,
{
    if secret.is_empty() {
        return Err(TokenError::EmptySecret);
    }
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.validate_exp = true;
    let decoded = jsonwebtoken::decode::<C>(token, &DecodingKey::from_secret(secret), &validation)
        .map_err(map_jwt_error)?;
    let claims = decoded.claims;
    if claims.typ() != expected_type {
        return Err(TokenError::Malformed);
    }
    // 库的过期判断是 exp < now，这里按 exp <= now 收紧。
    if claims.exp() <= now_epoch_seconds() {
        return Err(TokenError::Expired);
    }
    Ok(claims)
}

/// 将 jwt 库错误映射为编解码错误。
fn map_jwt_error(err: jsonwebtoken::errors::Error) -> TokenError {
    match err.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::InvalidSignature,
        _ => TokenError::Malformed,
    }
}
