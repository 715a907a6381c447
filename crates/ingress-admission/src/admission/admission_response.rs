use serde::{Deserialize, Serialize};

/// HTTP-style code carried by every policy rejection
pub const FORBIDDEN_CODE: u16 = 403;

/// This models the admission/v1/AdmissionResponse object of Kubernetes
/// See https://pkg.go.dev/k8s.io/kubernetes/pkg/apis/admission#AdmissionResponse
///
/// `status` is present if and only if the request was denied.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionResponse {
    /// UID is an identifier for the individual request/response.
    /// This must be copied over from the corresponding AdmissionRequest.
    pub uid: String,

    /// Allowed indicates whether or not the admission request was permitted.
    pub allowed: bool,

    /// Status contains extra details into why an admission request was denied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AdmissionResponseStatus>,
}

/// Values that Status.Status of an AdmissionResponse can have
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub enum AdmissionResponseStatusValue {
    Success,
    Failure,
}

/// StatusReason is a machine-readable description of why the request is
/// in the "Failure" status. Only the reasons emitted by this webhook are
/// modeled.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub enum StatusReason {
    /// The server understood the request, but refuses to let it through.
    /// Status code 403.
    Forbidden,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct AdmissionResponseStatus {
    /// Suggested HTTP return code for this status
    pub code: u16,

    /// A human-readable description of the status of this operation.
    pub message: String,

    pub reason: StatusReason,

    /// One of: "Success" or "Failure".
    pub status: AdmissionResponseStatusValue,
}

impl AdmissionResponse {
    pub fn allow(uid: String) -> AdmissionResponse {
        AdmissionResponse {
            uid,
            allowed: true,
            status: None,
        }
    }

    pub fn forbid(uid: String, message: String) -> AdmissionResponse {
        AdmissionResponse {
            uid,
            allowed: false,
            status: Some(AdmissionResponseStatus {
                code: FORBIDDEN_CODE,
                message,
                reason: StatusReason::Forbidden,
                status: AdmissionResponseStatusValue::Failure,
            }),
        }
    }

    /// The denial message, if any
    pub fn message(&self) -> Option<&str> {
        self.status.as_ref().map(|status| status.message.as_str())
    }
}
