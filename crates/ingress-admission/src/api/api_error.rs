use axum::{extract::rejection::JsonRejection, http::StatusCode, response::IntoResponse};
use tracing::debug;

/// An error returned by the API.
///
/// The API server only looks at the status code of a failed review, the
/// response carries no body.
#[derive(Debug)]
pub(crate) struct ApiError {
    pub(crate) status: StatusCode,
    pub(crate) message: String,
}

impl ApiError {
    pub(crate) fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        // every decoding failure is a client error, including a wrong content type
        Self::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        debug!(status = self.status.as_u16(), message = %self.message, "request rejected");
        self.status.into_response()
    }
}
