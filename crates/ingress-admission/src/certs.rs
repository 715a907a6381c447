use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use ::tracing::{info, warn};
use anyhow::{anyhow, Result};
use axum_server::tls_rustls::RustlsConfig;
use rustls::{
    server::{danger::ClientCertVerifier, WebPkiClientVerifier},
    RootCertStore, ServerConfig,
};
use rustls_pki_types::{pem::PemObject, CertificateDer, PrivateKeyDer};

use crate::config::TlsConfig;

/// Everything required to build the rustls configuration of the server.
struct TlsMaterial {
    cert: CertificateDer<'static>,
    key: PrivateKeyDer<'static>,
    client_verifier: Option<Arc<dyn ClientCertVerifier>>,
}

impl TlsMaterial {
    async fn load(tls_config: &TlsConfig) -> Result<Self> {
        let (cert, key) = load_server_cert_and_key(&tls_config.cert_file, &tls_config.key_file).await?;
        let client_verifier = load_client_verifier(&tls_config.client_ca_file).await?;

        Ok(Self {
            cert,
            key,
            client_verifier,
        })
    }

    fn server_config(&self) -> Result<ServerConfig> {
        let builder = ServerConfig::builder();
        let builder = match &self.client_verifier {
            Some(verifier) => builder.with_client_cert_verifier(verifier.clone()),
            None => builder.with_no_client_auth(),
        };
        let mut config = builder.with_single_cert(vec![self.cert.clone()], self.key.clone_key())?;
        config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

        Ok(config)
    }
}

/// Build the TLS configuration of the server.
///
/// On linux the certificate, key and client CA files are watched with
/// inotify: once both the certificate and the key have been rewritten, or
/// any client CA changed, the returned `RustlsConfig` is reloaded in place.
pub(crate) async fn rustls_config(tls_config: TlsConfig) -> Result<RustlsConfig> {
    let material = TlsMaterial::load(&tls_config).await?;
    let rustls_config = RustlsConfig::from_config(Arc::new(material.server_config()?));

    #[cfg(target_os = "linux")]
    reload::watch_certificate_changes(tls_config, material, rustls_config.clone())?;

    Ok(rustls_config)
}

#[cfg(target_os = "linux")]
mod reload {
    use super::*;
    use ::tracing::error;
    use inotify::{Inotify, WatchDescriptor, WatchMask};
    use tokio_stream::StreamExt;

    struct Watches {
        cert: WatchDescriptor,
        key: WatchDescriptor,
        client_ca: Vec<WatchDescriptor>,
    }

    fn watch(inotify: &Inotify, path: &Path, what: &str) -> Result<WatchDescriptor> {
        inotify
            .watches()
            .add(path, WatchMask::CLOSE_WRITE)
            .map_err(|e| anyhow!("Cannot watch {what} file {}: {e}", path.display()))
    }

    pub(super) fn watch_certificate_changes(
        tls_config: TlsConfig,
        mut material: TlsMaterial,
        rustls_config: RustlsConfig,
    ) -> Result<()> {
        let inotify = Inotify::init().map_err(|e| anyhow!("Cannot initialize inotify: {e}"))?;
        let watches = Watches {
            cert: watch(&inotify, &tls_config.cert_file, "certificate")?,
            key: watch(&inotify, &tls_config.key_file, "key")?,
            client_ca: tls_config
                .client_ca_file
                .iter()
                .map(|path| watch(&inotify, path, "client CA"))
                .collect::<Result<_>>()?,
        };

        let stream = inotify
            .into_event_stream([0u8; 1024])
            .map_err(|e| anyhow!("Cannot create inotify event stream: {e}"))?;

        tokio::spawn(async move {
            tokio::pin!(stream);
            let mut cert_changed = false;
            let mut key_changed = false;

            while let Some(event) = stream.next().await {
                let event = match event {
                    Ok(event) => event,
                    Err(e) => {
                        warn!("Cannot read inotify event: {e}");
                        continue;
                    }
                };

                let mut reload = false;
                if event.wd == watches.cert {
                    info!("TLS certificate file has been modified");
                    cert_changed = true;
                }
                if event.wd == watches.key {
                    info!("TLS key file has been modified");
                    key_changed = true;
                }

                if watches.client_ca.contains(&event.wd) {
                    info!("Reloading client CA certificates");
                    match load_client_verifier(&tls_config.client_ca_file).await {
                        Ok(verifier) => {
                            material.client_verifier = verifier;
                            reload = true;
                        }
                        Err(e) => error!("Failed to reload client CA certificates: {e}"),
                    }
                }

                // certificate and key are replaced together
                if cert_changed && key_changed {
                    info!("Reloading server TLS certificate");
                    cert_changed = false;
                    key_changed = false;
                    match load_server_cert_and_key(&tls_config.cert_file, &tls_config.key_file)
                        .await
                    {
                        Ok((cert, key)) => {
                            material.cert = cert;
                            material.key = key;
                            reload = true;
                        }
                        Err(e) => error!("Failed to reload TLS certificate: {e}"),
                    }
                }

                if !reload {
                    continue;
                }
                match material.server_config() {
                    Ok(server_config) => rustls_config.reload_from_config(Arc::new(server_config)),
                    Err(e) => error!("Failed to reload TLS configuration: {e}"),
                }
            }
        });

        Ok(())
    }
}

fn parse_pem_objects<T: PemObject>(contents: &[u8], what: &str) -> Vec<T> {
    T::pem_slice_iter(contents)
        .filter_map(|item| {
            if let Err(ref e) = item {
                warn!("Cannot parse {what}: {e}");
            }
            item.ok()
        })
        .collect()
}

fn exactly_one<T>(mut items: Vec<T>, what: &str, file: &Path) -> Result<T> {
    if items.len() != 1 {
        return Err(anyhow!(
            "Expected exactly one {what} in {}, found {}",
            file.display(),
            items.len()
        ));
    }
    items
        .pop()
        .ok_or_else(|| anyhow!("no {what} found in {}", file.display()))
}

async fn load_server_cert_and_key(
    cert_file: &Path,
    key_file: &Path,
) -> Result<(CertificateDer<'static>, PrivateKeyDer<'static>)> {
    let cert_contents = tokio::fs::read(cert_file)
        .await
        .map_err(|e| anyhow!("Cannot read {}: {e}", cert_file.display()))?;
    let key_contents = tokio::fs::read(key_file)
        .await
        .map_err(|e| anyhow!("Cannot read {}: {e}", key_file.display()))?;

    let cert = exactly_one(
        parse_pem_objects::<CertificateDer<'static>>(&cert_contents, "certificate"),
        "certificate",
        cert_file,
    )?;
    let key = exactly_one(
        parse_pem_objects::<PrivateKeyDer<'static>>(&key_contents, "private key"),
        "key",
        key_file,
    )?;

    Ok((cert, key))
}

async fn load_client_verifier(
    client_ca_files: &[PathBuf],
) -> Result<Option<Arc<dyn ClientCertVerifier>>> {
    if client_ca_files.is_empty() {
        return Ok(None);
    }

    let mut store = RootCertStore::empty();
    for client_ca_file in client_ca_files {
        let contents = tokio::fs::read(client_ca_file)
            .await
            .map_err(|e| anyhow!("Cannot read {}: {e}", client_ca_file.display()))?;
        let certs =
            parse_pem_objects::<CertificateDer<'static>>(&contents, "client CA certificate");
        let (added, ignored) = store.add_parsable_certificates(certs);
        info!(
            client_ca_file = %client_ca_file.display(),
            client_ca_certs_added = added,
            client_ca_certs_ignored = ignored,
            "Loaded client CA certificates"
        );
    }

    let verifier = WebPkiClientVerifier::builder(Arc::new(store))
        .build()
        .map_err(|e| anyhow!("Cannot build client verifier: {e}"))?;

    Ok(Some(verifier))
}
