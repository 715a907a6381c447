use clap::builder::PossibleValue;
use clap::{crate_authors, crate_description, crate_name, crate_version, Arg, ArgAction, Command};

use crate::config::{DEFAULT_NAMESPACE_LOOKUP_TIMEOUT_SECS, DEFAULT_WHITELIST_ANNOTATION, VERSION};

pub fn build_cli() -> Command {
    let mut args = vec![
        Arg::new("log-level")
            .long("log-level")
            .value_name("LOG_LEVEL")
            .default_value("info")
            .value_parser([
                PossibleValue::new("trace"),
                PossibleValue::new("debug"),
                PossibleValue::new("info"),
                PossibleValue::new("warn"),
                PossibleValue::new("error"),
            ])
            .help("Log level"),
        Arg::new("log-fmt")
            .long("log-fmt")
            .value_name("LOG_FMT")
            .default_value("text")
            .value_parser([PossibleValue::new("text"), PossibleValue::new("json")])
            .help("Log output format"),
        Arg::new("log-no-color")
            .long("log-no-color")
            .env("NO_COLOR")
            .action(ArgAction::SetTrue)
            .help("Disable colored output for logs"),
        Arg::new("address")
            .long("addr")
            .value_name("BIND_ADDRESS")
            .default_value("0.0.0.0")
            .env("INGRESS_ADMISSION_BIND_ADDRESS")
            .help("Bind against ADDRESS"),
        Arg::new("port")
            .long("port")
            .value_name("PORT")
            .default_value("8443")
            .env("INGRESS_ADMISSION_PORT")
            .help("Listen on PORT"),
        Arg::new("cert-file")
            .long("cert-file")
            .value_name("CERT_FILE")
            .default_value("")
            .env("INGRESS_ADMISSION_CERT_FILE")
            .help("Path to an X.509 certificate file for HTTPS"),
        Arg::new("key-file")
            .long("key-file")
            .value_name("KEY_FILE")
            .default_value("")
            .env("INGRESS_ADMISSION_KEY_FILE")
            .help("Path to a private key file for HTTPS"),
        Arg::new("enable-client-tls")
            .long("enable-client-tls")
            .env("INGRESS_ADMISSION_ENABLE_CLIENT_TLS")
            .action(ArgAction::SetTrue)
            .help("Require the API server to present a certificate signed by one of the client CAs"),
        Arg::new("client-ca-file")
            .long("client-ca-file")
            .value_name("CLIENT_CA_FILE")
            .env("INGRESS_ADMISSION_CLIENT_CA_FILE")
            .value_delimiter(',')
            .action(ArgAction::Append)
            .help("Path to a CA certificate file used to verify client certificates. Can be repeated"),
        Arg::new("ignore-namespace")
            .long("ignore-namespace")
            .value_name("NAMESPACE")
            .env("INGRESS_ADMISSION_IGNORE_NAMESPACE")
            .value_delimiter(',')
            .action(ArgAction::Append)
            .help("Namespace whose Ingresses are always accepted. Can be repeated"),
        Arg::new("whitelist-annotation")
            .long("whitelist-annotation")
            .value_name("ANNOTATION")
            .default_value(DEFAULT_WHITELIST_ANNOTATION)
            .help("Namespace annotation holding the comma separated list of permitted domains"),
        Arg::new("namespace-lookup-timeout")
            .long("namespace-lookup-timeout")
            .value_name("SECONDS")
            .default_value(DEFAULT_NAMESPACE_LOOKUP_TIMEOUT_SECS)
            .help("Deadline of a single namespace lookup"),
        Arg::new("enable-http-logging")
            .long("enable-http-logging")
            .action(ArgAction::SetTrue)
            .help("Log every HTTP request served"),
    ];
    args.sort_by(|a, b| a.get_id().cmp(b.get_id()));

    Command::new(crate_name!())
        .author(crate_authors!())
        .version(crate_version!())
        .about(crate_description!())
        .long_version(VERSION.as_str())
        .args(args)
}
