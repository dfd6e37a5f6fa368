//! Mapping of quiz errors onto HTTP responses

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRequest, FromRequestParts,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use quiz_core::QuizError;
use tracing::{error, warn};

/// Handler error. Bodies use the `{"detail": "..."}` shape; storage and
/// provider failures are logged and reported generically.
#[derive(Debug)]
pub enum ApiError {
    Quiz(QuizError),
    /// The request could not be decoded; `reason` is logged only
    Malformed {
        status: StatusCode,
        detail: &'static str,
        reason: String,
    },
}

impl From<QuizError> for ApiError {
    fn from(err: QuizError) -> Self {
        Self::Quiz(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Malformed {
            status: rejection.status(),
            detail: "Invalid request body",
            reason: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Malformed {
            status: rejection.status(),
            detail: "Invalid query parameters",
            reason: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            ApiError::Malformed { status, detail, reason } => {
                warn!(%reason, "Malformed request");
                (*status, *detail)
            }
            ApiError::Quiz(err) if err.is_client_error() => {
                warn!(error = %err, "Request rejected");
                match err {
                    QuizError::InvalidToken(_) => (StatusCode::BAD_REQUEST, "Invalid Google token"),
                    _ => (StatusCode::NOT_FOUND, "User not found"),
                }
            }
            ApiError::Quiz(err) => {
                error!(error = %err, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status, Json(serde_json::json!({ "detail": detail }))).into_response()
    }
}

/// JSON body extractor whose rejection is an `ApiError`
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

/// Query string extractor whose rejection is an `ApiError`
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct AppQuery<T>(pub T);
