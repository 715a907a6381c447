//! Wire types of the Kubernetes admission webhook protocol.

mod admission_request;
mod admission_response;
mod admission_review;

pub use admission_request::{AdmissionRequest, GroupVersionKind, GroupVersionResource, Operation};
pub use admission_response::{
    AdmissionResponse, AdmissionResponseStatus, AdmissionResponseStatusValue, StatusReason,
    FORBIDDEN_CODE,
};
pub use admission_review::{
    AdmissionReviewRequest, AdmissionReviewResponse, ADMISSION_REVIEW_API_VERSION,
    ADMISSION_REVIEW_KIND,
};
