//! Custom extractors
//!
//! JSON extraction that reports rejections in the API's error shape.

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    Json,
};
use serde_json::json;

/// JSON extractor answering malformed bodies with `{error, status}`
pub struct JsonExtractor<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for JsonExtractor<T>
where
    T: serde::de::DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let rejection = match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => return Ok(Self(value)),
            Err(rejection) => rejection,
        };

        let error_message = match rejection {
            JsonRejection::JsonDataError(err) => format!("Invalid request body: {}", err),
            JsonRejection::JsonSyntaxError(err) => format!("Malformed JSON: {}", err),
            JsonRejection::MissingJsonContentType(_) => {
                "Expected 'Content-Type: application/json'".to_string()
            }
            other => format!("Unreadable request body: {}", other),
        };

        Err((
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": error_message,
                "status": StatusCode::BAD_REQUEST.as_u16(),
            })),
        ))
    }
}
