//! 认证相关 handlers
//!
//! ## 提供的端点
//!
//! ### 公开端点（无需认证）
//! - `POST /api/auth/login` - 用户名或邮箱 + 口令登录（开启 2FA 时需 `two_fa_code`）
//! - `POST /api/auth/register` - 注册并直接签发 token 对
//! - `POST /api/auth/verify-email` - 标记邮箱已验证
//! - `POST /api/auth/verify-phone` - 校验手机验证码
//! - `POST /api/auth/enable-2fa` - 为已验证手机号的账户开启 2FA
//!
//! ### cookie 端点（读取 `refresh_token` httpOnly cookie）
//! - `POST /api/auth/logout` - 删除 refresh token 并清除 cookie
//! - `POST /api/auth/rotate-token` - 轮换 refresh token，签发新的 token 对
//!
//! ### 私有端点（需 Bearer token 认证）
//! - `GET /api/auth/me` - 当前用户
//! - `POST /api/auth/change-password` - 修改口令，使已签发的 token 全部失效
//! - `POST /api/auth/logout-all` - 退出所有会话
//!
//! ## Token 下发
//! 登录、注册与轮换都在响应体返回 `access_token`/`refresh_token`，同时把
//! refresh token 写入 httpOnly cookie；后续轮换与登出只认 cookie。

use crate::AppState;
use crate::middleware::{CurrentUser, presented_access_token};
use crate::utils::extract::ApiJson;
use crate::utils::response::{auth_error_response, bad_request_error, user_to_dto};
use api_contract::{
    ApiResponse, AuthPayload, ChangePasswordRequest, LoginRequest, RegisterRequest,
    TokenPairDto, UserIdRequest, VerifyPhoneRequest,
};
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use bored_auth::{AuthError, AuthSession};

use crate::utils::cookies::REFRESH_COOKIE;

/// 用户登录
///
/// # Arguments
///
/// * `state` - 应用状态，包含认证服务与请求校验器
/// * `jar` - cookie jar，成功时写入 refresh token
/// * `req` - 登录请求体：`username` 或 `email`、`password`、可选 `two_fa_code`
///
/// # Returns
///
/// 成功返回 `{status: "success", data: {access_token, refresh_token, user}}`，
/// 并设置 `refresh_token` cookie。
///
/// # Errors
///
/// - `400`：缺少标识、凭据错误（用户不存在与口令错误返回同一描述）、邮箱未验证、2FA 码无效
/// - `500`：存储故障
/// - `504`：操作超时
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Response {
    let credentials = match state.validator.credentials(req) {
        Ok(credentials) => credentials,
        Err(response) => return response,
    };
    match state.auth.login(credentials).await {
        Ok(session) => {
            tracing::info!(user_id = %session.user.user_id, "login succeeded");
            session_response(&state, jar, StatusCode::OK, session)
        }
        Err(err) => {
            tracing::warn!(error = %err, "login rejected");
            auth_error_response(err)
        }
    }
}

/// 用户注册
///
/// 首个注册用户获得 admin 角色，其余用户为默认角色。注册后邮箱处于未验证状态，
/// 但仍直接返回 token 对。
///
/// # Errors
///
/// - `400`：字段缺失、邮箱格式错误、口令过短、邮箱或用户名已被占用
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Response {
    let registration = match state.validator.registration(req) {
        Ok(registration) => registration,
        Err(response) => return response,
    };
    match state.auth.register(registration).await {
        Ok(session) => {
            tracing::info!(user_id = %session.user.user_id, "user registered");
            session_response(&state, jar, StatusCode::CREATED, session)
        }
        Err(err) => {
            tracing::warn!(error = %err, "registration rejected");
            auth_error_response(err)
        }
    }
}

/// 标记邮箱已验证
pub async fn verify_email(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<UserIdRequest>,
) -> Response {
    let user_id = match state.validator.required(req.user_id, "user_id") {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };
    match state.auth.verify_email(&user_id).await {
        Ok(user) => (
            StatusCode::OK,
            Json(ApiResponse::success_with_message(
                "email verified",
                user_to_dto(user),
            )),
        )
            .into_response(),
        Err(err) => auth_error_response(err),
    }
}

/// 校验手机验证码
///
/// # Errors
///
/// - `400`：用户不存在、未登记手机号、验证码错误
pub async fn verify_phone(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<VerifyPhoneRequest>,
) -> Response {
    let user_id = match state.validator.required(req.user_id, "user_id") {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };
    let code = match state.validator.required(req.code, "code") {
        Ok(code) => code,
        Err(response) => return response,
    };
    match state.auth.verify_phone_number(&user_id, &code).await {
        Ok(user) => (
            StatusCode::OK,
            Json(ApiResponse::success_with_message(
                "phone number verified",
                user_to_dto(user),
            )),
        )
            .into_response(),
        Err(err) => auth_error_response(err),
    }
}

/// 开启 2FA（要求手机号已验证）
pub async fn enable_two_factor(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<UserIdRequest>,
) -> Response {
    let user_id = match state.validator.required(req.user_id, "user_id") {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };
    match state.auth.enable_two_factor(&user_id).await {
        Ok(user) => (
            StatusCode::OK,
            Json(ApiResponse::success_with_message(
                "two-factor authentication enabled",
                user_to_dto(user),
            )),
        )
            .into_response(),
        Err(err) => auth_error_response(err),
    }
}

/// 登出
///
/// 删除 cookie 中的 refresh token；若同时携带 Bearer access token，则将其加入黑名单。
/// refresh token 不存在也视为成功。
///
/// # Errors
///
/// - `400`：请求未携带 `refresh_token` cookie
pub async fn logout(State(state): State<AppState>, headers: HeaderMap, jar: CookieJar) -> Response {
    let Some(refresh_token) = refresh_cookie_value(&jar) else {
        return bad_request_error("No refresh token provided");
    };
    let access_token = presented_access_token(&headers);
    match state.auth.logout(&refresh_token, access_token).await {
        Ok(()) => (
            StatusCode::OK,
            jar.add(state.cookies.clear_refresh_cookie()),
            Json(ApiResponse::message("Logged out successfully")),
        )
            .into_response(),
        Err(err) => auth_error_response(err),
    }
}

/// 轮换 refresh token
///
/// 旧 refresh token 单次有效：并发轮换同一 token 只有一个请求成功。
///
/// # Errors
///
/// - `400`：请求未携带 `refresh_token` cookie
/// - `401`：refresh token 无效、过期、已被使用，或用户 token 版本已变化
pub async fn rotate_token(State(state): State<AppState>, jar: CookieJar) -> Response {
    let Some(refresh_token) = refresh_cookie_value(&jar) else {
        return bad_request_error("No refresh token provided");
    };
    match state.auth.rotate_refresh_token(&refresh_token).await {
        Ok(tokens) => {
            let jar = jar.add(state.cookies.refresh_cookie(&tokens.refresh_token));
            let pair = TokenPairDto {
                access_token: tokens.access_token,
                refresh_token: tokens.refresh_token,
            };
            (StatusCode::OK, jar, Json(ApiResponse::success(pair))).into_response()
        }
        Err(err) => {
            if matches!(err, AuthError::InvalidOrExpiredToken) {
                tracing::warn!("refresh token rotation rejected");
            }
            auth_error_response(err)
        }
    }
}

/// 当前用户信息
pub async fn me(State(state): State<AppState>, CurrentUser(ctx): CurrentUser) -> Response {
    match state.auth.current_user(&ctx.user_id).await {
        Ok(user) => (StatusCode::OK, Json(ApiResponse::success(user_to_dto(user)))).into_response(),
        Err(err) => auth_error_response(err),
    }
}

/// 修改口令
///
/// 成功后用户 token 版本递增，所有已签发的 access/refresh token 失效，需重新登录。
///
/// # Errors
///
/// - `400`：当前口令错误、新口令过短
pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    jar: CookieJar,
    ApiJson(req): ApiJson<ChangePasswordRequest>,
) -> Response {
    if req.current_password.is_empty() {
        return bad_request_error("current_password is required");
    }
    let new_password = match state.validator.password(req.new_password, "new_password") {
        Ok(password) => password,
        Err(response) => return response,
    };
    match state
        .auth
        .change_password(&ctx.user_id, &req.current_password, &new_password)
        .await
    {
        Ok(()) => {
            tracing::info!(user_id = %ctx.user_id, "password changed");
            (
                StatusCode::OK,
                jar.add(state.cookies.clear_refresh_cookie()),
                Json(ApiResponse::message("Password updated successfully")),
            )
                .into_response()
        }
        Err(err) => auth_error_response(err),
    }
}

/// 退出所有会话：递增 token 版本、删除全部 refresh token，并吊销当前 access token
pub async fn logout_all(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    headers: HeaderMap,
    jar: CookieJar,
) -> Response {
    let access_token = presented_access_token(&headers);
    match state.auth.logout_all(&ctx.user_id, access_token).await {
        Ok(()) => {
            tracing::info!(user_id = %ctx.user_id, "all sessions revoked");
            (
                StatusCode::OK,
                jar.add(state.cookies.clear_refresh_cookie()),
                Json(ApiResponse::message("Logged out from all sessions")),
            )
                .into_response()
        }
        Err(err) => auth_error_response(err),
    }
}

fn refresh_cookie_value(jar: &CookieJar) -> Option<String> {
    jar.get(REFRESH_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

fn session_response(
    state: &AppState,
    jar: CookieJar,
    status: StatusCode,
    session: AuthSession,
) -> Response {
    let jar = jar.add(state.cookies.refresh_cookie(&session.tokens.refresh_token));
    let payload = AuthPayload {
        access_token: session.tokens.access_token,
        refresh_token: session.tokens.refresh_token,
        user: user_to_dto(session.user),
    };
    (status, jar, Json(ApiResponse::success(payload))).into_response()
}
