use tracing::Span;

use crate::admission::{AdmissionRequest, AdmissionResponse};

pub(crate) mod api_error;
pub(crate) mod handlers;
pub(crate) mod state;

pub(crate) fn populate_span_with_admission_request_data(adm_req: &AdmissionRequest) {
    Span::current().record("kind", adm_req.kind.kind.as_str());
    Span::current().record("name", adm_req.name());
    Span::current().record("namespace", adm_req.namespace());
    Span::current().record("operation", adm_req.operation.as_str());
    Span::current().record("request_uid", adm_req.uid.as_str());
}

pub(crate) fn populate_span_with_decision(response: &AdmissionResponse) {
    Span::current().record("allowed", response.allowed);
    if let Some(message) = response.message() {
        Span::current().record("response_message", message);
    }
}
