pub mod admission;
mod api;
pub(crate) mod certs;
pub mod cli;
pub mod config;
pub mod evaluation;
pub mod ingress;
pub mod matcher;
pub mod namespaces;
pub mod resolver;
pub mod tracing;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use ::tracing::{error, info};
use anyhow::{anyhow, Result};
use axum::{
    routing::{get, post},
    Router,
};
use axum_server::Handle;
use tokio::signal;
use tower_http::trace::TraceLayer;

use crate::{
    api::{
        handlers::{health_handler, validate_handler, version_handler},
        state::ApiServerState,
    },
    config::{Config, TlsConfig},
    evaluation::PolicyEvaluator,
    namespaces::{KubeNamespaces, NamespaceLookup},
    resolver::NamespacePolicyResolver,
};

/// Time given to the in-flight reviews to complete once a shutdown signal
/// is received
const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(10);

/// The admission webhook: owns the configuration and the state shared by
/// every review.
pub struct AdmissionServer {
    addr: SocketAddr,
    tls_config: Option<TlsConfig>,
    enable_http_logging: bool,
    state: Arc<ApiServerState>,
}

impl AdmissionServer {
    /// Build a server that reads the Namespaces through the given lookup.
    pub fn new(config: Config, lookup: Arc<dyn NamespaceLookup>) -> Self {
        let resolver = NamespacePolicyResolver::new(
            lookup,
            config.whitelist_annotation,
            config.namespace_lookup_timeout,
        );
        let evaluator = PolicyEvaluator::new(resolver, config.ignore_namespaces);

        Self {
            addr: config.addr,
            tls_config: config.tls_config,
            enable_http_logging: config.enable_http_logging,
            state: Arc::new(ApiServerState {
                evaluator: Arc::new(evaluator),
                version: config.version,
            }),
        }
    }

    /// Build a server talking to the cluster found through the in-cluster
    /// environment or the local kubeconfig.
    pub async fn new_from_config(config: Config) -> Result<Self> {
        let client = kube::Client::try_default()
            .await
            .map_err(|e| anyhow!("Cannot connect to Kubernetes cluster: {e}"))?;

        Ok(Self::new(config, Arc::new(KubeNamespaces::new(client))))
    }

    pub fn router(&self) -> Router {
        let router = Router::new()
            .route("/", post(validate_handler))
            .route("/health", get(health_handler))
            .route("/version", get(version_handler))
            .with_state(self.state.clone());

        if self.enable_http_logging {
            router.layer(TraceLayer::new_for_http())
        } else {
            router
        }
    }

    /// Serve until SIGINT or SIGTERM is received.
    pub async fn run(self) -> Result<()> {
        let router = self.router();
        let handle = Handle::new();

        let shutdown_handle = handle.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            info!(
                grace_period_secs = SHUTDOWN_GRACE_PERIOD.as_secs(),
                "shutdown signal received, draining in-flight reviews"
            );
            shutdown_handle.graceful_shutdown(Some(SHUTDOWN_GRACE_PERIOD));
        });

        let served = match self.tls_config {
            Some(tls_config) => {
                let rustls_config = certs::rustls_config(tls_config).await?;
                info!(address = %self.addr, "started HTTPS server");
                axum_server::bind_rustls(self.addr, rustls_config)
                    .handle(handle)
                    .serve(router.into_make_service())
                    .await
            }
            None => {
                info!(address = %self.addr, "started HTTP server");
                axum_server::bind(self.addr)
                    .handle(handle)
                    .serve(router.into_make_service())
                    .await
            }
        };
        served.map_err(|e| anyhow!("Server error: {e}"))?;

        info!("server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "cannot listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
