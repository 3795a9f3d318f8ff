use crate::errors::ServerError;
use crate::responses::ResultResp;
use astra::{Body, ResponseBuilder};
use serde::Serialize;

/// Serialize `value` as the JSON body of a response with `status`.
pub fn json_response<T: Serialize>(status: u16, value: &T) -> ResultResp {
    let body = serde_json::to_string(value).map_err(|_| ServerError::InternalError)?;
    json_body(status, body)
}

/// `{"status": "success", "data": ...}`
pub fn success_response<T: Serialize>(status: u16, data: &T) -> ResultResp {
    json_response(
        status,
        &serde_json::json!({ "status": "success", "data": data }),
    )
}

pub(crate) fn json_body(status: u16, body: String) -> ResultResp {
    ResponseBuilder::new()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Body::from(body))
        .map_err(|_| ServerError::InternalError)
}
