//! 输入验证
//!
//! `RequestValidator` 在启动时显式构造并放进 `AppState`，handler 通过它把请求体
//! 转换为认证输入。验证规则：
//! - 去除首尾空格，空字符串视为缺失
//! - 邮箱需符合基本格式，口令长度不少于最小值
//! - 失败返回 bad_request_error 响应

use crate::utils::response::bad_request_error;
use api_contract::{LoginRequest, RegisterRequest};
use axum::response::Response;
use bored_auth::{Credentials, MIN_PASSWORD_LEN, Registration, is_valid_email};

#[derive(Debug, Clone)]
pub struct RequestValidator {
    min_password_len: usize,
}

impl Default for RequestValidator {
    fn default() -> Self {
        Self::new(MIN_PASSWORD_LEN)
    }
}

impl RequestValidator {
    pub fn new(min_password_len: usize) -> Self {
        Self { min_password_len }
    }

    /// 验证必填字段，去除空格并检查非空
    pub fn required(&self, value: String, field: &str) -> Result<String, Response> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(bad_request_error(format!("{field} is required")));
        }
        Ok(trimmed.to_string())
    }

    /// 可选字段：去除空格，空值视为未提供
    pub fn optional(&self, value: Option<String>) -> Option<String> {
        value
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    /// 新口令：不去空格，只检查长度
    pub fn password(&self, value: String, field: &str) -> Result<String, Response> {
        if value.is_empty() {
            return Err(bad_request_error(format!("{field} is required")));
        }
        if value.chars().count() < self.min_password_len {
            return Err(bad_request_error(format!(
                "{field} must be at least {} characters",
                self.min_password_len
            )));
        }
        Ok(value)
    }

    pub fn registration(&self, req: RegisterRequest) -> Result<Registration, Response> {
        let username = self.required(req.username, "username")?;
        let email = self.required(req.email, "email")?;
        if !is_valid_email(&email) {
            return Err(bad_request_error("invalid email address"));
        }
        let password = self.password(req.password, "password")?;
        Ok(Registration {
            username,
            email,
            password,
            phone_number: self.optional(req.phone_number),
        })
    }

    /// 登录输入；用户名/邮箱都缺失的情况交给认证服务判定
    pub fn credentials(&self, req: LoginRequest) -> Result<Credentials, Response> {
        if req.password.is_empty() {
            return Err(bad_request_error("password is required"));
        }
        Ok(Credentials {
            username: self.optional(req.username),
            email: self.optional(req.email),
            password: req.password,
            phone_number: self.optional(req.phone_number),
            two_fa_code: self.optional(req.two_fa_code),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn registration_is_trimmed() {
        let validator = RequestValidator::default();
        let registration = validator
            .registration(RegisterRequest {
                username: "  alice ".to_string(),
                email: " alice@example.com".to_string(),
                password: "correct horse".to_string(),
                phone_number: Some("   ".to_string()),
            })
            .expect("valid");
        assert_eq!(registration.username, "alice");
        assert_eq!(registration.email, "alice@example.com");
        assert!(registration.phone_number.is_none());
    }

    #[test]
    fn registration_rejects_bad_input() {
        let validator = RequestValidator::default();
        let missing = validator.registration(RegisterRequest {
            username: "alice".to_string(),
            ..RegisterRequest::default()
        });
        assert_eq!(
            missing.err().map(|r| r.status()),
            Some(StatusCode::BAD_REQUEST)
        );

        let short = validator.registration(RegisterRequest {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "short".to_string(),
            phone_number: None,
        });
        assert!(short.is_err());

        let bad_email = validator.registration(RegisterRequest {
            username: "alice".to_string(),
            email: "alice".to_string(),
            password: "correct horse".to_string(),
            phone_number: None,
        });
        assert!(bad_email.is_err());
    }

    #[test]
    fn credentials_require_password() {
        let validator = RequestValidator::default();
        assert!(validator.credentials(LoginRequest::default()).is_err());
        let credentials = validator
            .credentials(LoginRequest {
                email: Some(" alice@example.com ".to_string()),
                username: Some(String::new()),
                password: "pw".to_string(),
                ..LoginRequest::default()
            })
            .expect("valid");
        assert_eq!(credentials.email.as_deref(), Some("alice@example.com"));
        assert!(credentials.username.is_none());
    }
}
