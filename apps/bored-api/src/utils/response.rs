//! HTTP 响应辅助函数和 DTO 转换
//!
//! - 错误响应：auth_error_response, bad_request_error, forbidden_error
//! - DTO 转换：user_to_dto
//!
//! 状态码约定：
//! - 401：鉴权失败（Unauthorized / Token has expired / refresh token 无效）
//! - 400：调用方可修正的业务错误，message 为错误描述
//! - 500：存储或签名故障，只返回通用描述，细节写日志
//! - 504：认证操作超时

use api_contract::{ApiResponse, UserDto};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bored_auth::AuthError;
use bored_storage::UserRecord;
use domain::roles_to_strings;

/// 把认证错误统一转换为响应
pub fn auth_error_response(err: AuthError) -> Response {
    match err {
        AuthError::Unauthenticated
        | AuthError::TokenExpired
        | AuthError::InvalidOrExpiredToken => fail(StatusCode::UNAUTHORIZED, err.to_string()),
        AuthError::Timeout => (
            StatusCode::GATEWAY_TIMEOUT,
            Json(ApiResponse::<()>::error(None)),
        )
            .into_response(),
        AuthError::Internal(detail) => {
            tracing::error!(error = %detail, "auth operation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<()>::error(Some(
                    "internal server error".to_string(),
                ))),
            )
                .into_response()
        }
        other => bad_request_error(other.to_string()),
    }
}

/// 错误请求响应
pub fn bad_request_error(message: impl Into<String>) -> Response {
    fail(StatusCode::BAD_REQUEST, message)
}

/// 禁止访问错误响应
pub fn forbidden_error() -> Response {
    fail(StatusCode::FORBIDDEN, "Forbidden")
}

fn fail(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ApiResponse::<()>::fail(message))).into_response()
}

/// UserRecord 转 UserDto（不含口令哈希）
pub fn user_to_dto(record: UserRecord) -> UserDto {
    UserDto {
        id: record.user_id,
        username: record.username,
        email: record.email,
        token_version: record.token_version,
        roles: roles_to_strings(&record.roles),
        email_verified: record.email_verified,
        phone_number: record.phone_number,
        phone_verified: record.phone_verified,
        two_factor_enabled: record.two_factor_enabled,
        deactivated: record.deactivated,
        created_at: record.created_at_ms,
        updated_at: record.updated_at_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        let cases = [
            (AuthError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (AuthError::TokenExpired, StatusCode::UNAUTHORIZED),
            (AuthError::InvalidOrExpiredToken, StatusCode::UNAUTHORIZED),
            (AuthError::Timeout, StatusCode::GATEWAY_TIMEOUT),
            (
                AuthError::Internal("db down".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (AuthError::InvalidCredentials, StatusCode::BAD_REQUEST),
            (AuthError::EmailNotVerified, StatusCode::BAD_REQUEST),
            (AuthError::NotFound, StatusCode::BAD_REQUEST),
        ];
        for (err, status) in cases {
            assert_eq!(auth_error_response(err).status(), status);
        }
    }
}
