//! Bored 认证 HTTP API：注册、登录、refresh token 轮换、登出与账户管理。
//!
//! 启动流程：
//! 1. 加载 `.env` 与 `AppConfig`
//! 2. 初始化结构化日志
//! 3. 连接 Postgres（用户、refresh token）与 Redis（access token 黑名单）
//! 4. 组装 `AuthService` 并启动 axum 服务

mod handlers;
mod middleware;
mod routes;
mod utils;


use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
};
use bored_auth::{Authenticator, AuthService, StaticCode, TokenCodec};
use bored_config::AppConfig;
use bored_storage::{PgRefreshTokenStore, PgUserStore, RedisRevocationStore, connect_pool};
use bored_telemetry::init_tracing;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::utils::{cookies::CookieSettings, validation::RequestValidator};

/// 应用共享状态
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<dyn Authenticator>,
    pub validator: RequestValidator,
    pub cookies: CookieSettings,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    init_tracing();

    // Postgres 凭据存储（需先执行 migrations）
    let pool = connect_pool(&config.database_url).await?;
    let users = Arc::new(PgUserStore::new(pool.clone()));
    let refresh_tokens = Arc::new(PgRefreshTokenStore::new(pool));
    // Redis access token 黑名单
    let revocations = Arc::new(RedisRevocationStore::connect(&config.redis_url)?);

    let codec = TokenCodec::from_minutes_and_days(
        config.access_token_secret.clone(),
        config.refresh_token_secret.clone(),
        config.access_token_expiry_minutes,
        config.refresh_token_expiry_days,
    );
    let auth = AuthService::new(users, refresh_tokens, revocations, codec)
        .with_two_factor(Arc::new(StaticCode::from_option(
            config.two_factor_code.clone(),
        )))
        .with_phone_codes(Arc::new(StaticCode::from_option(
            config.phone_verification_code.clone(),
        )))
        .with_timeout(config.auth_timeout());

    let state = AppState {
        auth: Arc::new(auth),
        validator: RequestValidator::default(),
        cookies: CookieSettings::new(
            config.cookie_secure,
            config.refresh_cookie_max_age_seconds(),
        ),
    };
    let cors = cors_layer(&config.cors_origin)?;
    let app = build_app(state).layer(cors);

    tracing::info!(addr = %config.http_addr, "bored-api listening");
    let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// 组装路由与全局中间件（不含 CORS）。
pub fn build_app(state: AppState) -> Router {
    routes::create_router(state)
        .layer(TraceLayer::new_for_http())
        // 注入 request_id/trace_id
        .layer(axum_middleware::from_fn(middleware::request_context))
}

/// 允许配置的前端源携带 cookie 跨域访问。
fn cors_layer(origin: &str) -> Result<CorsLayer, axum::http::header::InvalidHeaderValue> {
    let origin = HeaderValue::from_str(origin)?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]))
}
