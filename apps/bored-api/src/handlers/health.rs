use api_contract::HealthDto;
use axum::{Json, response::IntoResponse};

/// 健康检查端点（无需认证），返回 `{"ok": true}`
pub async fn health() -> impl IntoResponse {
    Json(HealthDto { ok: true })
}
