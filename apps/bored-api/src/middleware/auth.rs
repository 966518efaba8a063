//! 认证和授权中间件
//!
//! 提供以下中间件和辅助函数：
//! - request_context：请求上下文中间件，注入 request_id/trace_id
//! - require_auth：校验 Bearer access token，把 AuthContext 挂到请求扩展
//! - CurrentUser：从请求扩展读取 AuthContext 的提取器
//!
//! 认证流程：
//! 1. request_context：在所有请求前注入追踪 ID
//! 2. require_auth：调用 `Authenticator::authorize`（签名、黑名单、token 版本）
//! 3. handler 通过 `CurrentUser` 取得身份，缺失即 401

use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, HeaderValue, header, request::Parts},
    middleware::Next,
    response::Response,
};
use bored_auth::AuthError;
use bored_telemetry::new_request_ids;
use domain::AuthContext;
use tracing::{Instrument, info_span};

use crate::AppState;
use crate::utils::response::auth_error_response;

/// 请求上下文中间件：注入 request_id/trace_id
pub async fn request_context(mut req: Request<Body>, next: Next) -> Response {
    let ids = new_request_ids();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    req.extensions_mut().insert(ids.clone());

    let span = info_span!(
        "request",
        request_id = %ids.request_id,
        trace_id = %ids.trace_id,
        method = %method,
        path = %path
    );

    let mut response = next.run(req).instrument(span).await;
    response.headers_mut().insert(
        "x-request-id",
        HeaderValue::from_str(&ids.request_id).unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    response.headers_mut().insert(
        "x-trace-id",
        HeaderValue::from_str(&ids.trace_id).unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    response
}

/// Authorization 头原值（非 UTF-8 视为缺失）
pub fn authorization_header(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::AUTHORIZATION)?.to_str().ok()
}

/// 请求携带的 access token
pub fn presented_access_token(headers: &HeaderMap) -> Option<&str> {
    authorization_header(headers).and_then(bored_auth::bearer_token)
}

/// 鉴权中间件：通过后把 AuthContext 写入请求扩展
pub async fn require_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let authorization = authorization_header(req.headers()).map(str::to_string);
    match state.auth.authorize(authorization.as_deref()).await {
        Ok(ctx) => {
            req.extensions_mut().insert(ctx);
            next.run(req).await
        }
        Err(err) => {
            tracing::warn!(error = %err, "request rejected by auth gate");
            auth_error_response(err)
        }
    }
}

/// 已鉴权的当前用户
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthContext);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| auth_error_response(AuthError::Unauthenticated))
    }
}
