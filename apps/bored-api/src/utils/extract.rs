//! JSON 请求体提取器
//!
//! `Json<T>` 的拒绝响应是纯文本（缺少 Content-Type 时为 415）；
//! `ApiJson<T>` 把所有拒绝统一为 `400 {"status":"fail","message":...}`。

use axum::{
    Json, async_trait,
    extract::{FromRequest, Request, rejection::JsonRejection},
    response::Response,
};

use crate::utils::response::bad_request_error;

/// 请求体解析失败时返回统一信封的 JSON 提取器
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                tracing::warn!(
                    status = rejection.status().as_u16(),
                    error = %rejection.body_text(),
                    "request body rejected"
                );
                Err(bad_request_error(rejection_message(&rejection)))
            }
        }
    }
}

fn rejection_message(rejection: &JsonRejection) -> String {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            "expected request with `Content-Type: application/json`".to_string()
        }
        JsonRejection::JsonSyntaxError(_) => "malformed JSON body".to_string(),
        JsonRejection::JsonDataError(_) => rejection.body_text(),
        _ => "invalid request body".to_string(),
    }
}
