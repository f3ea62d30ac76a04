//! API error types with HTTP response mapping.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::OrderError;
use serde_json::{Value, json};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Order domain error.
    Order(OrderError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Order(err) => match err {
                OrderError::NotFound { .. } => StatusCode::NOT_FOUND,
                OrderError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
                OrderError::InsufficientStock { .. } | OrderError::Conflict { .. } => {
                    StatusCode::CONFLICT
                }
                OrderError::Timeout { .. } => StatusCode::SERVICE_UNAVAILABLE,
                OrderError::Fatal { .. } | OrderError::Storage(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    /// JSON body: `error` kind, human `message`, plus per-kind details.
    fn body(&self) -> Value {
        match self {
            ApiError::Order(err) => {
                let mut body = json!({ "error": err.kind(), "message": err.to_string() });
                let details = match err {
                    OrderError::NotFound { entity, key } => {
                        json!({ "entity": entity.to_string(), "key": key })
                    }
                    OrderError::InvalidInput { field, reason } => {
                        json!({ "field": field, "reason": reason })
                    }
                    OrderError::InsufficientStock {
                        product_id,
                        requested,
                        available,
                    } => json!({
                        "product_id": product_id.as_i64(),
                        "requested": requested,
                        "available": available,
                    }),
                    OrderError::Conflict { attempts } | OrderError::Timeout { attempts } => {
                        json!({ "attempts": attempts })
                    }
                    OrderError::Fatal { .. } | OrderError::Storage(_) => json!({}),
                };
                if let (Some(body), Value::Object(details)) = (body.as_object_mut(), details) {
                    body.extend(details);
                }
                body
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = ?self, %status, "request failed");
        }

        (status, axum::Json(self.body())).into_response()
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        ApiError::Order(err)
    }
}

/// A request body that didn't deserialize is reported like any other
/// invalid input, naming the offending field when serde tells us which.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let (field, reason) = match &rejection {
            JsonRejection::JsonDataError(err) => describe_data_error(&err.body_text()),
            _ => ("body".to_string(), rejection.body_text()),
        };
        ApiError::Order(OrderError::invalid(field, reason))
    }
}

/// Splits `"<preamble>: [<path>: ]<serde message>"` into a field path and reason.
fn describe_data_error(text: &str) -> (String, String) {
    let detail = text.split_once(": ").map_or(text, |(_, detail)| detail);
    let (path, reason) = match detail.split_once(": ") {
        Some((path, reason)) if !path.contains(' ') => (Some(path), reason),
        _ => (None, detail),
    };
    let reason = reason
        .rsplit_once(" at line ")
        .map_or(reason, |(reason, _)| reason);

    let missing = reason
        .strip_prefix("missing field `")
        .and_then(|rest| rest.strip_suffix('`'));
    let field = match (path, missing) {
        (Some(path), Some(name)) => format!("{path}.{name}"),
        (None, Some(name)) => name.to_string(),
        (Some(path), None) => path.to_string(),
        (None, None) => "body".to_string(),
    };

    (field, reason.to_string())
}
