//! 应用运行配置加载。
//!
//! token 密钥与 TTL、数据库地址为必填项，缺失即启动失败；其余项带默认值。

use std::env;
use std::time::Duration;

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env: {0}")]
    Missing(String),
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

/// 应用运行配置。
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http_addr: String,
    pub database_url: String,
    pub redis_url: String,
    pub access_token_secret: String,
    pub refresh_token_secret: String,
    /// access token 有效期（分钟）
    pub access_token_expiry_minutes: u64,
    /// refresh token 有效期（天）
    pub refresh_token_expiry_days: u64,
    pub auth_timeout_seconds: u64,
    pub cors_origin: String,
    pub two_factor_code: Option<String>,
    pub phone_verification_code: Option<String>,
    pub cookie_secure: bool,
}

impl AppConfig {
    /// 从环境变量读取配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 通过任意键值来源读取配置（测试时传入内存表）。
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let reader = Reader { lookup };
        let access_token_secret = reader.required("ACCESS_TOKEN_SECRET")?;
        let refresh_token_secret = reader.required("REFRESH_TOKEN_SECRET")?;
        let access_token_expiry_minutes = reader.u64("ACCESS_TOKEN_EXPIRY")?;
        let refresh_token_expiry_days = reader.u64("REFRESH_TOKEN_EXPIRY")?;
        let database_url = reader.required("BORED_DATABASE_URL")?;
        let http_addr = reader.with_default("BORED_HTTP_ADDR", "127.0.0.1:8080");
        let redis_url = reader.with_default("BORED_REDIS_URL", "redis://127.0.0.1:6379");
        let auth_timeout_seconds = reader.u64_with_default("BORED_AUTH_TIMEOUT_SECONDS", 5)?;
        if auth_timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "BORED_AUTH_TIMEOUT_SECONDS".to_string(),
                "0".to_string(),
            ));
        }
        let cors_origin = reader.with_default("BORED_CORS_ORIGIN", "http://localhost:3000");
        let two_factor_code = reader.optional("BORED_TWO_FACTOR_CODE");
        let phone_verification_code = reader.optional("BORED_PHONE_VERIFICATION_CODE");
        let cookie_secure = reader.bool_with_default("BORED_COOKIE_SECURE", false);

        Ok(Self {
            http_addr,
            database_url,
            redis_url,
            access_token_secret,
            refresh_token_secret,
            access_token_expiry_minutes,
            refresh_token_expiry_days,
            auth_timeout_seconds,
            cors_origin,
            two_factor_code,
            phone_verification_code,
            cookie_secure,
        })
    }

    pub fn auth_timeout(&self) -> Duration {
        Duration::from_secs(self.auth_timeout_seconds)
    }

    /// refresh cookie 的 max-age（秒），与 refresh token 有效期一致。
    pub fn refresh_cookie_max_age_seconds(&self) -> i64 {
        self.refresh_token_expiry_days
            .saturating_mul(24 * 60 * 60)
            .min(i64::MAX as u64) as i64
    }
}

struct Reader<F> {
    lookup: F,
}

impl<F> Reader<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// 必填字符串，空值视为缺失。
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::Missing(key.to_string()))
    }

    fn optional(&self, key: &str) -> Option<String> {
        match (self.lookup)(key) {
            Some(value) if !value.trim().is_empty() => Some(value),
            _ => None,
        }
    }

    fn with_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// 读取 u64 类型必填项。
    fn u64(&self, key: &str) -> Result<u64, ConfigError> {
        let value = self.required(key)?;
        value
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::Invalid(key.to_string(), value))
    }

    fn u64_with_default(&self, key: &str, default: u64) -> Result<u64, ConfigError> {
        let Some(value) = self.optional(key) else {
            return Ok(default);
        };
        value
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::Invalid(key.to_string(), value))
    }

    fn bool_with_default(&self, key: &str, default: bool) -> bool {
        match self.optional(key) {
            Some(value) => matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "on"),
            None => default,
        }
    }
}
