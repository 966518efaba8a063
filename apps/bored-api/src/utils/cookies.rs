//! refresh token 的 httpOnly cookie。

use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

/// refresh token cookie 名称
pub const REFRESH_COOKIE: &str = "refresh_token";

/// cookie 属性（来自配置）
#[derive(Debug, Clone)]
pub struct CookieSettings {
    secure: bool,
    max_age_seconds: i64,
}

impl CookieSettings {
    pub fn new(secure: bool, max_age_seconds: i64) -> Self {
        Self {
            secure,
            max_age_seconds,
        }
    }

    /// 写入新的 refresh token，max-age 与 refresh token 有效期一致。
    pub fn refresh_cookie(&self, token: &str) -> Cookie<'static> {
        self.build(token.to_string(), Duration::seconds(self.max_age_seconds))
    }

    /// 立即过期的空 cookie，用于登出。
    pub fn clear_refresh_cookie(&self) -> Cookie<'static> {
        self.build(String::new(), Duration::ZERO)
    }

    fn build(&self, value: String, max_age: Duration) -> Cookie<'static> {
        Cookie::build((REFRESH_COOKIE.to_string(), value))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .path("/".to_string())
            .max_age(max_age)
            .build()
    }
}
