use async_trait::async_trait;
use axum::{
    body::Body,
    http::{self, header, Request},
    Router,
};
use ingress_admission::{
    config::{Config, DEFAULT_WHITELIST_ANNOTATION},
    namespaces::{LookupError, NamespaceLookup},
    AdmissionServer,
};
use serde_json::{json, Value};
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

/// In-memory Namespace store
#[derive(Default)]
pub(crate) struct StaticNamespaces {
    namespaces: BTreeMap<String, BTreeMap<String, String>>,
}

impl StaticNamespaces {
    pub(crate) fn with_namespace(mut self, name: &str, annotations: &[(&str, &str)]) -> Self {
        self.namespaces.insert(
            name.to_string(),
            annotations
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        );
        self
    }

    pub(crate) fn with_whitelist(self, name: &str, whitelist: &str) -> Self {
        self.with_namespace(name, &[(DEFAULT_WHITELIST_ANNOTATION, whitelist)])
    }
}

#[async_trait]
impl NamespaceLookup for StaticNamespaces {
    async fn namespace_annotations(
        &self,
        name: &str,
    ) -> Result<Option<BTreeMap<String, String>>, LookupError> {
        Ok(self.namespaces.get(name).cloned())
    }
}

pub(crate) fn default_test_config() -> Config {
    Config {
        ignore_namespaces: BTreeSet::from(["kube-system".to_string()]),
        version: "v0.0.1-test".to_string(),
        ..Default::default()
    }
}

pub(crate) fn app(config: Config, namespaces: StaticNamespaces) -> Router {
    AdmissionServer::new(config, Arc::new(namespaces)).router()
}

/// An AdmissionReview for the creation of an Ingress exposing the given
/// hosts
pub(crate) fn ingress_review(namespace: &str, hosts: &[&str]) -> Value {
    let rules: Vec<Value> = hosts
        .iter()
        .map(|host| {
            json!({
                "host": host,
                "http": {"paths": [{
                    "path": "/",
                    "pathType": "Prefix",
                    "backend": {"service": {"name": "web", "port": {"number": 80}}}
                }]}
            })
        })
        .collect();

    json!({
        "apiVersion": "admission.k8s.io/v1",
        "kind": "AdmissionReview",
        "request": {
            "uid": "705ab4f5-6393-11e8-b7cc-42010a800002",
            "kind": {"group": "networking.k8s.io", "version": "v1", "kind": "Ingress"},
            "resource": {"group": "networking.k8s.io", "version": "v1", "resource": "ingresses"},
            "name": "site",
            "namespace": namespace,
            "operation": "CREATE",
            "userInfo": {"username": "admin", "groups": ["system:authenticated"]},
            "object": {
                "apiVersion": "networking.k8s.io/v1",
                "kind": "Ingress",
                "metadata": {"name": "site", "namespace": namespace},
                "spec": {"rules": rules}
            },
            "dryRun": false
        }
    })
}

pub(crate) fn validate_request(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(http::Method::POST)
        .header(header::CONTENT_TYPE, "application/json")
        .uri("/")
        .body(body.into())
        .unwrap()
}
