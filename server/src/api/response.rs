//! Response envelope
//!
//! Every endpoint answers `{"isSuccess", "payload", "message"}`. Success
//! carries a payload and no message, failure the reverse.

use crate::error::AppError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub is_success: bool,
    pub payload: Option<T>,
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(payload: T) -> Self {
        Self {
            is_success: true,
            payload: Some(payload),
            message: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            is_success: false,
            payload: None,
            message: Some(message.into()),
        }
    }
}

pub type ApiResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), AppError>;

/// 200 with payload
pub fn ok<T: Serialize>(payload: T) -> ApiResult<T> {
    Ok((StatusCode::OK, Json(ApiResponse::success(payload))))
}

/// 201 with payload, used by POST and PUT
pub fn created<T: Serialize>(payload: T) -> ApiResult<T> {
    Ok((StatusCode::CREATED, Json(ApiResponse::success(payload))))
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match &self {
            AppError::Validation(msg) | AppError::Multipart(msg) => {
                tracing::warn!("Rejected request: {}", msg);
                msg.clone()
            }
            AppError::NotFound(msg) => {
                tracing::info!("Resource not found: {}", msg);
                msg.clone()
            }
            AppError::Conflict(msg) => {
                tracing::warn!("Conflict: {}", msg);
                msg.clone()
            }
            AppError::Database(_)
            | AppError::Io(_)
            | AppError::Serialization(_) => {
                tracing::error!("Request failed: {}", self);
                "Internal server error".to_string()
            }
        };

        (status, Json(ApiResponse::failure(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_success_envelope() {
        let value = serde_json::to_value(ApiResponse::success(vec![1, 2])).unwrap();
        assert_eq!(
            value,
            json!({"isSuccess": true, "payload": [1, 2], "message": null})
        );
    }

    #[tokio::test]
    async fn test_validation_error_response() {
        let response = AppError::required("name").into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({"isSuccess": false, "payload": null, "message": "\"name\" is required"})
        );
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let response = AppError::from(io).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Internal server error");
    }
}
