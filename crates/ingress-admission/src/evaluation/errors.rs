use thiserror::Error;

pub type Result<T> = std::result::Result<T, EvaluationError>;

/// The reasons a review is rejected by the namespace policy.
///
/// The `Display` output is the message handed back to the API server.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("invalid object for review: {kind}, expected: {expected}")]
    InvalidObjectKind { kind: String, expected: String },

    #[error("unable to get namespace")]
    NamespaceLookupFailed,

    #[error("namespace has no whitelist annotation: {0}")]
    NoWhitelistAnnotation(String),

    #[error("namespace whitelist is empty")]
    EmptyWhitelist,

    #[error("hostname: {0} is not permitted by namespace policy")]
    HostnameNotPermitted(String),
}

#[derive(Debug, Error)]
pub enum EvaluationError {
    /// The request has been rejected by the policy. This is turned into a
    /// denial by the evaluator and never reaches the HTTP layer.
    #[error(transparent)]
    Denied(#[from] PolicyError),

    #[error("invalid object: {0}")]
    InvalidObject(String),
}
