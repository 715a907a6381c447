use axum::{
    extract::{self, FromRequest},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error};

use crate::{
    admission::{AdmissionReviewRequest, AdmissionReviewResponse},
    api::{
        api_error::ApiError, populate_span_with_admission_request_data,
        populate_span_with_decision, state::ApiServerState,
    },
    evaluation::errors::EvaluationError,
};

// create an extractor that internally uses `axum::Json` but has a custom rejection
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub(crate) struct JsonExtractor<T>(pub(crate) T);

impl<T: Serialize> IntoResponse for JsonExtractor<T> {
    fn into_response(self) -> axum::response::Response {
        let Self(value) = self;
        axum::Json(value).into_response()
    }
}

#[tracing::instrument(
    name = "validation",
    fields(
        request_uid=tracing::field::Empty,
        host=crate::config::HOSTNAME.as_str(),
        name=tracing::field::Empty,
        namespace=tracing::field::Empty,
        operation=tracing::field::Empty,
        kind=tracing::field::Empty,
        allowed=tracing::field::Empty,
        response_message=tracing::field::Empty,
    ),
    skip_all)]
pub(crate) async fn validate_handler(
    extract::State(state): extract::State<Arc<ApiServerState>>,
    JsonExtractor(admission_review): JsonExtractor<AdmissionReviewRequest>,
) -> Result<Json<AdmissionReviewResponse>, (StatusCode, ApiError)> {
    debug!(uid = admission_review.request.uid.as_str(), "admission review received");

    let request = &admission_review.request;
    populate_span_with_admission_request_data(request);

    let response = state.evaluator.evaluate(request).await.map_err(|error| {
        handle_evaluation_error(request.namespace(), request.name(), error)
    })?;

    populate_span_with_decision(&response);

    Ok(Json(AdmissionReviewResponse::new(admission_review, response)))
}

pub(crate) async fn health_handler() -> &'static str {
    "OK"
}

pub(crate) async fn version_handler(
    extract::State(state): extract::State<Arc<ApiServerState>>,
) -> String {
    state.version.clone()
}

fn handle_evaluation_error(
    namespace: &str,
    name: &str,
    error: EvaluationError,
) -> (StatusCode, ApiError) {
    let status = match error {
        EvaluationError::InvalidObject(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error!(namespace, name, error = %error, "unable to evaluate admission review");

    (status, ApiError::new(status, error.to_string()))
}
