//! 稳定的 DTO 与 API 响应契约。
//!
//! 所有字段使用 snake_case；请求体字段缺省为空值，由服务端统一校验并返回 400。

use serde::{Deserialize, Serialize};

pub const STATUS_SUCCESS: &str = "success";
pub const STATUS_FAIL: &str = "fail";
pub const STATUS_ERROR: &str = "error";

/// 标准 API 响应封装：`{status, message?, data?}`。
///
/// - `success`：请求成功
/// - `fail`：调用方可修正的失败（4xx）
/// - `error`：服务端故障或超时（5xx）
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: STATUS_SUCCESS,
            message: None,
            data: Some(data),
        }
    }

    pub fn success_with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            status: STATUS_SUCCESS,
            message: Some(message.into()),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status: STATUS_SUCCESS,
            message: Some(message.into()),
            data: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            status: STATUS_FAIL,
            message: Some(message.into()),
            data: None,
        }
    }

    pub fn error(message: Option<String>) -> Self {
        Self {
            status: STATUS_ERROR,
            message,
            data: None,
        }
    }
}

/// 登录请求体（用户名或邮箱至少一个）。
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: String,
    pub phone_number: Option<String>,
    pub two_fa_code: Option<String>,
}

/// 注册请求体。
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub phone_number: Option<String>,
}

/// 邮箱验证 / 开启 2FA 请求体。
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UserIdRequest {
    pub user_id: String,
}

/// 手机号验证请求体。
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct VerifyPhoneRequest {
    pub user_id: String,
    pub code: String,
}

/// 修改口令请求体。
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// 对外用户结构（不含口令哈希），时间为毫秒时间戳。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDto {
    pub id: String,
    pub username: String,
    pub email: String,
    pub token_version: i64,
    pub roles: Vec<String>,
    pub email_verified: bool,
    pub phone_number: Option<String>,
    pub phone_verified: bool,
    pub two_factor_enabled: bool,
    pub deactivated: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// 登录 / 注册响应体。
#[derive(Debug, Serialize)]
pub struct AuthPayload {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserDto,
}

/// refresh token 轮换响应体。
#[derive(Debug, Serialize)]
pub struct TokenPairDto {
    pub access_token: String,
    pub refresh_token: String,
}

/// 健康检查响应体。
#[derive(Debug, Serialize)]
pub struct HealthDto {
    pub ok: bool,
}
