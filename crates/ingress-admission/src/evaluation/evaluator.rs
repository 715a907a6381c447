use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::{
    admission::{AdmissionRequest, AdmissionResponse, Operation},
    evaluation::errors::{EvaluationError, PolicyError, Result},
    ingress,
    resolver::NamespacePolicyResolver,
};

/// Takes the admission decision for a single review.
///
/// The evaluator holds no mutable state: it can be shared by all the
/// concurrent reviews once wrapped inside of an `Arc`.
pub struct PolicyEvaluator {
    resolver: NamespacePolicyResolver,
    /// Namespaces where every review is accepted without looking at the
    /// Namespace policy
    ignore_namespaces: BTreeSet<String>,
    expected_kind: String,
}

impl PolicyEvaluator {
    pub fn new(resolver: NamespacePolicyResolver, ignore_namespaces: BTreeSet<String>) -> Self {
        Self {
            resolver,
            ignore_namespaces,
            expected_kind: ingress::INGRESS_KIND.to_string(),
        }
    }

    /// Evaluate the request against the policy of its Namespace.
    ///
    /// Policy rejections are returned as a denied `AdmissionResponse`, the
    /// `Err` variant is reserved to requests that cannot be evaluated at all.
    pub async fn evaluate(&self, request: &AdmissionRequest) -> Result<AdmissionResponse> {
        match self.check(request).await {
            Ok(()) => {
                info!(
                    namespace = request.namespace(),
                    name = request.name(),
                    request_uid = request.uid.as_str(),
                    allowed = true,
                    "admission review"
                );
                Ok(AdmissionResponse::allow(request.uid.clone()))
            }
            Err(EvaluationError::Denied(denial)) => {
                warn!(
                    namespace = request.namespace(),
                    name = request.name(),
                    request_uid = request.uid.as_str(),
                    allowed = false,
                    message = %denial,
                    "admission review"
                );
                Ok(AdmissionResponse::forbid(
                    request.uid.clone(),
                    denial.to_string(),
                ))
            }
            Err(error) => Err(error),
        }
    }

    async fn check(&self, request: &AdmissionRequest) -> Result<()> {
        if request.kind.kind != self.expected_kind {
            return Err(PolicyError::InvalidObjectKind {
                kind: request.kind.kind.clone(),
                expected: self.expected_kind.clone(),
            }
            .into());
        }

        let namespace = request.namespace();
        if self.ignore_namespaces.contains(namespace) {
            debug!(namespace, "namespace is ignored, skipping policy");
            return Ok(());
        }

        let policy = self.resolver.resolve(namespace).await?;

        // the API server sends no object on DELETE
        let hosts = match (&request.object, request.operation) {
            (None, Operation::Delete) => Vec::new(),
            (object, _) => ingress::requested_hosts(object.as_ref())?,
        };

        for host in hosts {
            if !policy.permits(&host) {
                return Err(PolicyError::HostnameNotPermitted(host).into());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        admission::{AdmissionResponseStatusValue, GroupVersionKind, GroupVersionResource},
        namespaces::{LookupError, MockNamespaceLookup},
    };
    use rstest::rstest;
    use serde_json::json;
    use std::{collections::BTreeMap, sync::Arc, time::Duration};

    const ANNOTATION: &str = "ingress-admission.acp.homeoffice.gov.uk/domains";

    fn ingress_request(namespace: &str, hosts: &[&str]) -> AdmissionRequest {
        let rules: Vec<_> = hosts.iter().map(|host| json!({ "host": host })).collect();
        AdmissionRequest {
            uid: "uid-1".to_string(),
            kind: GroupVersionKind {
                group: "networking.k8s.io".to_string(),
                version: "v1".to_string(),
                kind: "Ingress".to_string(),
            },
            resource: GroupVersionResource {
                group: "networking.k8s.io".to_string(),
                version: "v1".to_string(),
                resource: "ingresses".to_string(),
            },
            sub_resource: None,
            name: Some("site".to_string()),
            namespace: Some(namespace.to_string()),
            operation: Operation::Create,
            user_info: None,
            object: Some(json!({
                "apiVersion": "networking.k8s.io/v1",
                "kind": "Ingress",
                "metadata": {"name": "site", "namespace": namespace},
                "spec": {"rules": rules},
            })),
            old_object: None,
            dry_run: None,
        }
    }

    fn lookup_with_annotation(value: Option<&str>) -> MockNamespaceLookup {
        let annotations = match value {
            Some(value) => BTreeMap::from([(ANNOTATION.to_string(), value.to_string())]),
            None => BTreeMap::new(),
        };
        let mut lookup = MockNamespaceLookup::new();
        lookup
            .expect_namespace_annotations()
            .returning(move |_| Ok(Some(annotations.clone())));
        lookup
    }

    fn lookup_never_called() -> MockNamespaceLookup {
        let mut lookup = MockNamespaceLookup::new();
        lookup.expect_namespace_annotations().never();
        lookup
    }

    fn evaluator(lookup: MockNamespaceLookup, ignored: &[&str]) -> PolicyEvaluator {
        let resolver =
            NamespacePolicyResolver::new(Arc::new(lookup), ANNOTATION, Duration::from_secs(1));
        PolicyEvaluator::new(resolver, ignored.iter().map(|ns| ns.to_string()).collect())
    }

    #[rstest]
    #[case::single_host(&["rohith.test.svc.cluster.local"])]
    #[case::many_hosts(&["rohith.test.svc.cluster.local", "site.test.svc.cluster.local"])]
    #[case::no_hosts(&[])]
    #[tokio::test]
    async fn allowed_hosts(#[case] hosts: &[&str]) {
        let evaluator = evaluator(lookup_with_annotation(Some("*.test.svc.cluster.local")), &[]);

        let response = evaluator
            .evaluate(&ingress_request("test", hosts))
            .await
            .unwrap();

        assert!(response.allowed);
        assert!(response.status.is_none());
        assert_eq!(response.uid, "uid-1");
    }

    #[tokio::test]
    async fn first_offending_host_is_reported() {
        let evaluator = evaluator(lookup_with_annotation(Some("*.test.svc.cluster.local")), &[]);
        let request = ingress_request(
            "test",
            &[
                "rohith.test.svc.cluster.local",
                "bad.test.test.svc.cluster.local",
                "other.example.com",
            ],
        );

        let response = evaluator.evaluate(&request).await.unwrap();

        assert!(!response.allowed);
        let status = response.status.unwrap();
        assert_eq!(status.code, 403);
        assert_eq!(status.status, AdmissionResponseStatusValue::Failure);
        assert_eq!(
            status.message,
            "hostname: bad.test.test.svc.cluster.local is not permitted by namespace policy"
        );
    }

    #[tokio::test]
    async fn hostless_rule_is_denied() {
        let evaluator = evaluator(lookup_with_annotation(Some("*.example.com")), &[]);
        let request = ingress_request("test", &[""]);

        let response = evaluator.evaluate(&request).await.unwrap();

        assert_eq!(
            response.message(),
            Some("hostname:  is not permitted by namespace policy")
        );
    }

    #[rstest]
    #[case::no_annotation(None, "namespace has no whitelist annotation: ingress-admission.acp.homeoffice.gov.uk/domains")]
    #[case::empty_annotation(Some(""), "namespace whitelist is empty")]
    #[tokio::test]
    async fn namespace_policy_denials(#[case] annotation: Option<&str>, #[case] message: &str) {
        let evaluator = evaluator(lookup_with_annotation(annotation), &[]);

        let response = evaluator
            .evaluate(&ingress_request("test", &["site.example.com"]))
            .await
            .unwrap();

        assert!(!response.allowed);
        assert_eq!(response.message(), Some(message));
    }

    #[tokio::test]
    async fn namespace_lookup_failure_is_a_denial() {
        let mut lookup = MockNamespaceLookup::new();
        lookup
            .expect_namespace_annotations()
            .returning(|_| Err(LookupError::InvalidName(String::new())));
        let evaluator = evaluator(lookup, &[]);

        let response = evaluator
            .evaluate(&ingress_request("test", &["site.example.com"]))
            .await
            .unwrap();

        assert_eq!(response.message(), Some("unable to get namespace"));
    }

    #[tokio::test]
    async fn ignored_namespace_skips_lookup() {
        let evaluator = evaluator(lookup_never_called(), &["kube-system", "test"]);

        let response = evaluator
            .evaluate(&ingress_request("test", &["anything.example.com"]))
            .await
            .unwrap();

        assert!(response.allowed);
    }

    #[tokio::test]
    async fn other_namespaces_are_not_ignored() {
        let evaluator = evaluator(lookup_with_annotation(None), &["other_namespace"]);

        let response = evaluator
            .evaluate(&ingress_request("test", &["rohith.test.svc.cluster.local"]))
            .await
            .unwrap();

        assert!(!response.allowed);
    }

    #[tokio::test]
    async fn wrong_kind_is_checked_before_ignored_namespaces() {
        let evaluator = evaluator(lookup_never_called(), &["test"]);
        let mut request = ingress_request("test", &["site.example.com"]);
        request.kind.kind = "Service".to_string();

        let response = evaluator.evaluate(&request).await.unwrap();

        assert_eq!(
            response.message(),
            Some("invalid object for review: Service, expected: Ingress")
        );
    }

    fn delete_request(namespace: &str) -> AdmissionRequest {
        let mut request = ingress_request(namespace, &[]);
        request.operation = Operation::Delete;
        request.object = None;
        request
    }

    #[tokio::test]
    async fn delete_is_allowed_by_a_namespace_policy() {
        let evaluator = evaluator(lookup_with_annotation(Some("*.example.com")), &[]);

        let response = evaluator.evaluate(&delete_request("test")).await.unwrap();

        assert!(response.allowed);
    }

    #[rstest]
    #[case::no_annotation(None, "namespace has no whitelist annotation: ingress-admission.acp.homeoffice.gov.uk/domains")]
    #[case::empty_annotation(Some(""), "namespace whitelist is empty")]
    #[tokio::test]
    async fn delete_is_subject_to_namespace_policy(
        #[case] annotation: Option<&str>,
        #[case] message: &str,
    ) {
        let evaluator = evaluator(lookup_with_annotation(annotation), &[]);

        let response = evaluator.evaluate(&delete_request("test")).await.unwrap();

        assert!(!response.allowed);
        assert_eq!(response.message(), Some(message));
    }

    #[tokio::test]
    async fn connect_hosts_are_checked() {
        let evaluator = evaluator(lookup_with_annotation(Some("*.example.com")), &[]);
        let mut request = ingress_request("test", &["site.example.org"]);
        request.operation = Operation::Connect;

        let response = evaluator.evaluate(&request).await.unwrap();

        assert_eq!(
            response.message(),
            Some("hostname: site.example.org is not permitted by namespace policy")
        );
    }

    #[tokio::test]
    async fn missing_object_cannot_be_evaluated() {
        let evaluator = evaluator(lookup_with_annotation(Some("*.example.com")), &[]);
        let mut request = ingress_request("test", &["site.example.com"]);
        request.object = None;

        let error = evaluator.evaluate(&request).await.unwrap_err();

        assert!(matches!(error, EvaluationError::InvalidObject(_)));
    }

    #[tokio::test]
    async fn evaluation_is_deterministic() {
        let evaluator = evaluator(
            lookup_with_annotation(Some("a.example.com,*.example.org")),
            &[],
        );
        let request = ingress_request("test", &["a.example.com", "b.example.com"]);

        let first = evaluator.evaluate(&request).await.unwrap();
        for _ in 0..10 {
            assert_eq!(evaluator.evaluate(&request).await.unwrap(), first);
        }
        assert_eq!(
            first.message(),
            Some("hostname: b.example.com is not permitted by namespace policy")
        );
    }
}
