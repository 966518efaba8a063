//! 路由定义
//!
//! 路由包括：
//! - 健康检查：/health
//! - 公开认证接口：/api/auth/{login,register,verify-email,verify-phone,enable-2fa}
//! - cookie 认证接口：/api/auth/{logout,rotate-token}
//! - Bearer 认证接口：/api/auth/{me,change-password,logout-all}、/api/users/*

use crate::AppState;
use crate::handlers::*;
use crate::middleware::require_auth;
use axum::{
    Router,
    middleware,
    routing::{delete, get, post},
};

/// 创建完整路由；受保护路由统一经过 `require_auth`。
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/auth/me", get(me))
        .route("/api/auth/change-password", post(change_password))
        .route("/api/auth/logout-all", post(logout_all))
        .route("/api/users", get(list_users))
        .route("/api/users/me", get(me).delete(deactivate_account))
        .route("/api/users/:id", delete(delete_user))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(health))
        .route("/api/auth/login", post(login))
        .route("/api/auth/register", post(register))
        .route("/api/auth/verify-email", post(verify_email))
        .route("/api/auth/verify-phone", post(verify_phone))
        .route("/api/auth/enable-2fa", post(enable_two_factor))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/rotate-token", post(rotate_token))
        .merge(protected)
        .with_state(state)
}
