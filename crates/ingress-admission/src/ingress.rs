use serde::Deserialize;

use crate::evaluation::errors::{EvaluationError, Result};

/// Kind of the objects this webhook reviews
pub const INGRESS_KIND: &str = "Ingress";

// Only the rules are decoded. This keeps networking/v1 and the legacy
// extensions/v1beta1 objects readable, their backends differ but the rules
// layout is the same.
#[derive(Deserialize)]
struct Ingress {
    spec: Option<IngressSpec>,
}

#[derive(Deserialize)]
struct IngressSpec {
    rules: Option<Vec<IngressRule>>,
}

#[derive(Deserialize)]
struct IngressRule {
    host: Option<String>,
}

/// Returns the hostnames requested by the rules of the given Ingress
/// object, in declaration order. A rule without a host yields an empty
/// hostname.
pub fn requested_hosts(object: Option<&serde_json::Value>) -> Result<Vec<String>> {
    let object = object
        .ok_or_else(|| EvaluationError::InvalidObject("request carries no object".to_string()))?;

    let ingress: Ingress = serde_json::from_value(object.clone())
        .map_err(|e| EvaluationError::InvalidObject(format!("cannot decode ingress: {e}")))?;

    Ok(ingress
        .spec
        .and_then(|spec| spec.rules)
        .unwrap_or_default()
        .into_iter()
        .map(|rule| rule.host.unwrap_or_default())
        .collect())
}
