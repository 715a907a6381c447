use std::{sync::Arc, time::Duration};

use tracing::{debug, warn};

use crate::{evaluation::errors::PolicyError, matcher, namespaces::NamespaceLookup};

/// The hostnames a Namespace allows its Ingresses to expose.
///
/// This is computed from the Namespace annotation on every review, it is
/// never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespacePolicy {
    pub whitelist: Vec<String>,
}

impl NamespacePolicy {
    /// Parse the comma separated value of the whitelist annotation.
    /// Entries are taken verbatim, empty ones are discarded.
    pub fn parse(value: &str) -> Result<Self, PolicyError> {
        let whitelist: Vec<String> = value
            .split(',')
            .filter(|entry| !entry.is_empty())
            .map(String::from)
            .collect();

        if whitelist.is_empty() {
            return Err(PolicyError::EmptyWhitelist);
        }

        Ok(Self { whitelist })
    }

    pub fn permits(&self, hostname: &str) -> bool {
        matcher::matches(hostname, &self.whitelist)
    }
}

/// Fetches a Namespace and turns its whitelist annotation into a
/// `NamespacePolicy`.
pub struct NamespacePolicyResolver {
    lookup: Arc<dyn NamespaceLookup>,
    annotation: String,
    lookup_timeout: Duration,
}

impl NamespacePolicyResolver {
    pub fn new(
        lookup: Arc<dyn NamespaceLookup>,
        annotation: impl Into<String>,
        lookup_timeout: Duration,
    ) -> Self {
        Self {
            lookup,
            annotation: annotation.into(),
            lookup_timeout,
        }
    }

    pub async fn resolve(&self, namespace: &str) -> Result<NamespacePolicy, PolicyError> {
        let lookup = self.lookup.namespace_annotations(namespace);
        let annotations = match tokio::time::timeout(self.lookup_timeout, lookup).await {
            Ok(Ok(Some(annotations))) => annotations,
            Ok(Ok(None)) => {
                warn!(namespace, "namespace not found");
                return Err(PolicyError::NamespaceLookupFailed);
            }
            Ok(Err(error)) => {
                warn!(namespace, error = %error, "unable to retrieve namespace");
                return Err(PolicyError::NamespaceLookupFailed);
            }
            Err(_) => {
                warn!(
                    namespace,
                    timeout_ms = self.lookup_timeout.as_millis() as u64,
                    "namespace lookup timed out"
                );
                return Err(PolicyError::NamespaceLookupFailed);
            }
        };

        let value = annotations
            .get(&self.annotation)
            .ok_or_else(|| PolicyError::NoWhitelistAnnotation(self.annotation.clone()))?;

        let policy = NamespacePolicy::parse(value)?;
        debug!(namespace, whitelist = ?policy.whitelist, "namespace policy resolved");

        Ok(policy)
    }
}
