use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::resources::{Outcome, Rejection};

/// Uniform body for resource operations: `{status, success, message, data}`.
///
/// The transport status is always 200. An ownership rejection is reported by
/// `status: 401` and `success: false` inside the body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    pub status: u16,
    pub success: bool,
    pub message: String,
    pub data: Value,
}

impl Envelope {
    /// Successful envelope around any serializable payload
    pub fn success<T: Serialize>(message: impl Into<String>, data: T) -> Self {
        match serde_json::to_value(data) {
            Ok(data) => Self {
                status: StatusCode::OK.as_u16(),
                success: true,
                message: message.into(),
                data,
            },
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                    success: false,
                    message: "Failed to serialize response data".to_string(),
                    data: json!({}),
                }
            }
        }
    }

    pub fn rejected(rejection: &Rejection) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED.as_u16(),
            success: false,
            message: rejection.message(),
            data: json!({}),
        }
    }

    /// Render a guarded mutation, using `message` when it was applied
    pub fn from_outcome<R: Serialize>(message: impl Into<String>, outcome: Outcome<R>) -> Self {
        match outcome {
            Outcome::Applied(record) => Self::success(message, record),
            Outcome::Rejected(rejection) => Self::rejected(&rejection),
        }
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

pub type ApiResult<T> = Result<T, crate::error::ApiError>;
