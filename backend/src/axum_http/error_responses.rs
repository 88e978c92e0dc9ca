use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::usecases::{
    bookings::BookingError, payment_webhook::WebhookError, payments::PaymentError,
    platform_config::PlatformConfigError,
};

const INTERNAL_MESSAGE: &str = "Internal server error";

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
}

pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = Json(ErrorResponse {
        code: status.as_u16(),
        message: message.into(),
    });
    (status, body).into_response()
}

/// 5xx bodies never carry internal detail; the cause is logged where it happened.
fn use_case_error_response(status: StatusCode, message: String) -> Response {
    if status.is_server_error() {
        error_response(status, INTERNAL_MESSAGE)
    } else {
        error_response(status, message)
    }
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        use_case_error_response(self.status_code(), self.to_string())
    }
}

impl IntoResponse for PaymentError {
    fn into_response(self) -> Response {
        use_case_error_response(self.status_code(), self.to_string())
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        use_case_error_response(self.status_code(), self.to_string())
    }
}

impl IntoResponse for PlatformConfigError {
    fn into_response(self) -> Response {
        use_case_error_response(self.status_code(), self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn client_errors_keep_their_message() {
        let response = BookingError::StartsInPast.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_of(response).await;
        assert_eq!(body["code"], 400);
        assert_eq!(body["message"], "El turno debe ser en el futuro");
    }

    #[tokio::test]
    async fn internal_errors_are_masked() {
        let response = PaymentError::Internal(anyhow::anyhow!("password=hunter2")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_of(response).await;
        assert_eq!(body["message"], INTERNAL_MESSAGE);
    }
}
