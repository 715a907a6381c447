use std::collections::BTreeMap;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Namespace;
use kube::Api;
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("kubernetes api error: {0}")]
    Kube(#[from] kube::Error),

    #[error("invalid namespace name: {0:?}")]
    InvalidName(String),
}

// an empty name would turn the GET into a LIST of every Namespace
fn validate_name(name: &str) -> Result<(), LookupError> {
    if name.is_empty() {
        return Err(LookupError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Read access to the Namespace objects of the cluster.
///
/// This is the only interaction the webhook has with the Kubernetes API
/// server. Implementations are shared by all the concurrent reviews, hence
/// they must be `Send + Sync`.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait NamespaceLookup: Send + Sync {
    /// Returns the annotations of the given Namespace, or `None` when the
    /// Namespace does not exist.
    async fn namespace_annotations(
        &self,
        name: &str,
    ) -> Result<Option<BTreeMap<String, String>>, LookupError>;
}

/// `NamespaceLookup` backed by the Kubernetes API server
pub struct KubeNamespaces {
    api: Api<Namespace>,
}

impl KubeNamespaces {
    pub fn new(client: kube::Client) -> Self {
        Self {
            api: Api::all(client),
        }
    }
}

#[async_trait]
impl NamespaceLookup for KubeNamespaces {
    async fn namespace_annotations(
        &self,
        name: &str,
    ) -> Result<Option<BTreeMap<String, String>>, LookupError> {
        validate_name(name)?;
        let namespace = self.api.get_opt(name).await?;

        Ok(namespace.map(|ns| ns.metadata.annotations.unwrap_or_default()))
    }
}
