//! 用户管理 handlers（均需 Bearer token）
//!
//! - `GET /api/users` - 用户列表，仅 admin 角色可访问
//! - `GET /api/users/me` - 当前用户
//! - `DELETE /api/users/me` - 停用当前账户
//! - `DELETE /api/users/:id` - 删除指定用户，仅 admin 角色可访问

use crate::AppState;
use crate::middleware::{CurrentUser, presented_access_token};
use crate::utils::response::{auth_error_response, forbidden_error, user_to_dto};
use api_contract::ApiResponse;
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use domain::RoleTag;

/// 用户列表
///
/// 角色以鉴权网关读取的最新用户记录为准。
///
/// # Errors
///
/// - `403`：当前用户不是 admin
pub async fn list_users(State(state): State<AppState>, CurrentUser(ctx): CurrentUser) -> Response {
    if !ctx.has_role(RoleTag::Admin) {
        tracing::warn!(user_id = %ctx.user_id, "user list denied");
        return forbidden_error();
    }
    match state.auth.list_users().await {
        Ok(users) => {
            let users: Vec<_> = users.into_iter().map(user_to_dto).collect();
            (StatusCode::OK, Json(ApiResponse::success(users))).into_response()
        }
        Err(err) => auth_error_response(err),
    }
}

/// 停用当前账户，并使其全部 token 失效
pub async fn deactivate_account(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    headers: HeaderMap,
    jar: CookieJar,
) -> Response {
    let access_token = presented_access_token(&headers);
    match state
        .auth
        .deactivate_account(&ctx.user_id, access_token)
        .await
    {
        Ok(()) => {
            tracing::info!(user_id = %ctx.user_id, "account deactivated");
            (
                StatusCode::OK,
                jar.add(state.cookies.clear_refresh_cookie()),
                Json(ApiResponse::message("Account deactivated")),
            )
                .into_response()
        }
        Err(err) => auth_error_response(err),
    }
}

/// 删除指定用户及其全部 refresh token
///
/// # Errors
///
/// - `403`：当前用户不是 admin
/// - `400`：用户不存在
pub async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(user_id): Path<String>,
) -> Response {
    if !ctx.has_role(RoleTag::Admin) {
        tracing::warn!(user_id = %ctx.user_id, target = %user_id, "user delete denied");
        return forbidden_error();
    }
    match state.auth.delete_user(&user_id).await {
        Ok(()) => {
            tracing::info!(admin_id = %ctx.user_id, user_id = %user_id, "user deleted");
            (
                StatusCode::OK,
                Json(ApiResponse::message("User deleted successfully")),
            )
                .into_response()
        }
        Err(err) => auth_error_response(err),
    }
}
