use anyhow::{anyhow, Result};
use tokio::runtime::Runtime;
use tracing::{debug, info};

use ingress_admission::{cli, config::Config, tracing::setup_tracing, AdmissionServer};

fn main() -> Result<()> {
    let matches = cli::build_cli().get_matches();
    let config = Config::from_args(&matches)?;

    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Cannot install the rustls crypto provider"))?;

    let rt = Runtime::new()?;
    rt.block_on(async {
        setup_tracing(&config.log_level, &config.log_fmt, config.log_no_color)?;
        debug!("tracing system ready");

        info!(
            version = config.version.as_str(),
            ignored_namespaces = ?config.ignore_namespaces,
            whitelist_annotation = config.whitelist_annotation.as_str(),
            "starting ingress admission webhook"
        );

        let server = AdmissionServer::new_from_config(config).await?;
        server.run().await
    })
}
