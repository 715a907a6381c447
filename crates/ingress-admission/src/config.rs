use anyhow::{anyhow, Result};
use clap::ArgMatches;
use lazy_static::lazy_static;
use std::collections::BTreeSet;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_WHITELIST_ANNOTATION: &str = "ingress-admission.acp.homeoffice.gov.uk/domains";
pub(crate) const DEFAULT_NAMESPACE_LOOKUP_TIMEOUT_SECS: &str = "3";

lazy_static! {
    pub(crate) static ref HOSTNAME: String =
        std::env::var("HOSTNAME").unwrap_or_else(|_| String::from("unknown"));
    /// Crate version plus the commit given through `GIT_SHA` at build time
    pub static ref VERSION: String = format!(
        "{} (git+sha: {})",
        env!("CARGO_PKG_VERSION"),
        option_env!("GIT_SHA").unwrap_or("unknown")
    );
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub tls_config: Option<TlsConfig>,
    pub ignore_namespaces: BTreeSet<String>,
    pub whitelist_annotation: String,
    pub namespace_lookup_timeout: Duration,
    pub enable_http_logging: bool,
    pub log_level: String,
    pub log_fmt: String,
    pub log_no_color: bool,
    /// Reported by the `/version` endpoint
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsConfig {
    pub cert_file: PathBuf,
    pub key_file: PathBuf,
    /// When not empty, clients must present a certificate signed by one
    /// of these CAs
    pub client_ca_file: Vec<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8443)),
            tls_config: None,
            ignore_namespaces: BTreeSet::new(),
            whitelist_annotation: DEFAULT_WHITELIST_ANNOTATION.to_string(),
            namespace_lookup_timeout: Duration::from_secs(3),
            enable_http_logging: false,
            log_level: "info".to_string(),
            log_fmt: "text".to_string(),
            log_no_color: false,
            version: VERSION.clone(),
        }
    }
}

impl Config {
    pub fn from_args(matches: &ArgMatches) -> Result<Self> {
        let addr = api_bind_address(matches)?;
        let tls_config = tls_config(matches)?;

        let ignore_namespaces: BTreeSet<String> = matches
            .get_many::<String>("ignore-namespace")
            .unwrap_or_default()
            .filter(|ns| !ns.is_empty())
            .cloned()
            .collect();

        let whitelist_annotation = string_arg(matches, "whitelist-annotation")?;
        if whitelist_annotation.is_empty() {
            return Err(anyhow!(
                "error parsing arguments: --whitelist-annotation cannot be empty"
            ));
        }

        let namespace_lookup_timeout = string_arg(matches, "namespace-lookup-timeout")?
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| anyhow!("error parsing --namespace-lookup-timeout: {}", e))?;

        Ok(Self {
            addr,
            tls_config,
            ignore_namespaces,
            whitelist_annotation,
            namespace_lookup_timeout,
            enable_http_logging: matches.get_flag("enable-http-logging"),
            log_level: string_arg(matches, "log-level")?,
            log_fmt: string_arg(matches, "log-fmt")?,
            log_no_color: matches.get_flag("log-no-color"),
            version: VERSION.clone(),
        })
    }
}

fn string_arg(matches: &ArgMatches, id: &str) -> Result<String> {
    matches
        .get_one::<String>(id)
        .cloned()
        .ok_or_else(|| anyhow!("error parsing arguments: missing value for {}", id))
}

fn api_bind_address(matches: &ArgMatches) -> Result<SocketAddr> {
    format!(
        "{}:{}",
        string_arg(matches, "address")?,
        string_arg(matches, "port")?
    )
    .parse()
    .map_err(|e| anyhow!("error parsing arguments: {}", e))
}

fn tls_config(matches: &ArgMatches) -> Result<Option<TlsConfig>> {
    let cert_file = string_arg(matches, "cert-file")?;
    let key_file = string_arg(matches, "key-file")?;
    if cert_file.is_empty() != key_file.is_empty() {
        return Err(anyhow!("error parsing arguments: either both --cert-file and --key-file must be provided, or neither"));
    }

    let client_ca_file: Vec<PathBuf> = matches
        .get_many::<String>("client-ca-file")
        .unwrap_or_default()
        .filter(|path| !path.is_empty())
        .map(PathBuf::from)
        .collect();

    let client_tls = matches.get_flag("enable-client-tls");
    if client_tls && cert_file.is_empty() {
        return Err(anyhow!(
            "error parsing arguments: --enable-client-tls requires --cert-file and --key-file"
        ));
    }
    if client_tls && client_ca_file.is_empty() {
        return Err(anyhow!(
            "error parsing arguments: --enable-client-tls requires at least one --client-ca-file"
        ));
    }

    if cert_file.is_empty() {
        return Ok(None);
    }

    Ok(Some(TlsConfig {
        cert_file: PathBuf::from(cert_file),
        key_file: PathBuf::from(key_file),
        client_ca_file: if client_tls { client_ca_file } else { Vec::new() },
    }))
}
