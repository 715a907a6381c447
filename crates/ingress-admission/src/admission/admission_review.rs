use serde::{Deserialize, Serialize};

use super::{AdmissionRequest, AdmissionResponse};

pub const ADMISSION_REVIEW_KIND: &str = "AdmissionReview";
pub const ADMISSION_REVIEW_API_VERSION: &str = "admission.k8s.io/v1";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReviewRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    pub request: AdmissionRequest,
}

/// The document handed back to the API server. It echoes the metadata of
/// the reviewed request next to the decision.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReviewResponse {
    pub kind: String,

    pub api_version: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<AdmissionRequest>,

    pub response: AdmissionResponse,
}

impl AdmissionReviewResponse {
    pub fn new(review: AdmissionReviewRequest, response: AdmissionResponse) -> Self {
        AdmissionReviewResponse {
            kind: String::from(ADMISSION_REVIEW_KIND),
            api_version: review
                .api_version
                .unwrap_or_else(|| String::from(ADMISSION_REVIEW_API_VERSION)),
            request: Some(review.request),
            response,
        }
    }
}
