use crate::errors::ServerError;
use crate::responses::json::json_body;
use astra::{Body, Response};
use tracing::error;

pub type ResultResp = Result<Response, ServerError>;

/// Convert a ServerError into a JSON error response: `{"error": "..."}`.
pub fn error_to_response(err: ServerError) -> Response {
    let status = err.status();
    if status >= 500 {
        error!(status, error = %err, "request failed");
    }

    let body = serde_json::json!({ "error": err.to_string() }).to_string();
    json_body(status, body).unwrap_or_else(|_| {
        Response::new(Body::from(r#"{"error":"Internal Server Error"}"#))
    })
}
