// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping of domain errors onto HTTP responses.
//!
//! Client errors carry their message. Server errors are logged in full and
//! reach the client only as `"internal error"`.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use flatmate_core::FlatmateError;

/// Message returned for every server-side failure.
pub const INTERNAL_MESSAGE: &str = "internal error";

/// A [`FlatmateError`] on its way out of a handler.
#[derive(Debug)]
pub struct ApiError(pub FlatmateError);

impl From<FlatmateError> for ApiError {
    fn from(err: FlatmateError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(FlatmateError::Validation(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(FlatmateError::Validation(rejection.body_text()))
    }
}

impl ApiError {
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            FlatmateError::Validation(_) | FlatmateError::TenantNotFound(_) => {
                StatusCode::BAD_REQUEST
            }
            FlatmateError::SelfConversation
            | FlatmateError::Forbidden(_)
            | FlatmateError::QuotaExceeded { .. } => StatusCode::FORBIDDEN,
            FlatmateError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            FlatmateError::Config(_)
            | FlatmateError::Storage { .. }
            | FlatmateError::TenantUnavailable { .. }
            | FlatmateError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    limit_exceeded: bool,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
            INTERNAL_MESSAGE.to_string()
        } else {
            self.0.to_string()
        };
        let body = ErrorBody {
            success: false,
            message,
            limit_exceeded: matches!(self.0, FlatmateError::QuotaExceeded { .. }),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn status_codes() {
        let cases = [
            (FlatmateError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (FlatmateError::TenantNotFound("x".into()), StatusCode::BAD_REQUEST),
            (FlatmateError::SelfConversation, StatusCode::FORBIDDEN),
            (FlatmateError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (
                FlatmateError::QuotaExceeded {
                    conversation_id: "a_b_p".into(),
                    limit: 5,
                },
                StatusCode::FORBIDDEN,
            ),
            (FlatmateError::Unauthenticated("x".into()), StatusCode::UNAUTHORIZED),
            (FlatmateError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (
                FlatmateError::TenantUnavailable {
                    name: "x".into(),
                    reason: "y".into(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError(err).status_code(), expected);
        }
    }

    #[tokio::test]
    async fn quota_errors_are_flagged() {
        let response = ApiError(FlatmateError::QuotaExceeded {
            conversation_id: "a_b_p".into(),
            limit: 5,
        })
        .into_response();
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["limitExceeded"], true);
    }

    #[tokio::test]
    async fn server_errors_do_not_leak_details() {
        let response = ApiError(FlatmateError::Internal("disk on fire at /var/lib".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["message"], INTERNAL_MESSAGE);
        assert!(json.get("limitExceeded").is_none());
    }
}
