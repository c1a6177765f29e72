// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Schema registry HTTP service.
//!
//! Loads a YAML config (§6.6), builds the KV-backed [`RegistryStore`],
//! and serves the §4.4 REST surface over plain HTTP or, when a
//! `keyfile`/`certfile` pair is configured, HTTPS.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum_server::tls_rustls::RustlsConfig;
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing::info;

use ldms_registry_server::auth::BasicAuth;
use ldms_registry_server::config::{Config, ListenAddr};
use ldms_registry_server::routes::build_router;
use ldms_registry_server::state::AppState;

/// Schema registry HTTP service
#[derive(Parser, Debug)]
#[command(name = "ldms-registry-server")]
#[command(about = "Schema registry and daemon control-plane HTTP surface")]
#[command(version)]
struct Args {
    /// Path to the YAML config file
    #[arg(short, long, default_value = "ldms-registry.yaml")]
    config: PathBuf,

    /// Override the configured listen address ("addr:port")
    #[arg(short, long)]
    listen: Option<String>,

    /// Directory for file-backed KV storage, when `members` is configured
    #[arg(long, default_value = "./data")]
    data_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log_level)),
        )
        .with_target(false)
        .init();

    let config = Config::load(&args.config).expect("failed to load config");

    // CLI `--listen` overrides the YAML value, which overrides the
    // built-in default ("*:8080", see config::default_listen).
    let listen = args.listen.as_deref().unwrap_or(&config.schema_registry.listen);
    let listen_addr = ListenAddr::parse(listen).expect("malformed listen address");

    let store = AppState::build_store(&config, &args.data_dir).expect("failed to open kv store");
    let state = AppState::new(store);
    let basic_auth = Arc::new(BasicAuth::from_config(config.schema_registry.auth.as_ref()));

    let app = build_router(state, basic_auth).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = listen_addr
        .socket_addr()
        .expect("failed to resolve listen address");

    if config.tls_enabled() {
        let certfile = config.schema_registry.certfile.as_ref().unwrap();
        let keyfile = config.schema_registry.keyfile.as_ref().unwrap();
        info!("schema registry listening on https://{}", addr);
        let tls_config = RustlsConfig::from_pem_file(certfile, keyfile)
            .await
            .expect("failed to load TLS cert/key");
        axum_server::bind_rustls(addr, tls_config)
            .serve(app.into_make_service())
            .await
            .expect("server error");
    } else {
        info!("schema registry listening on http://{}", addr);
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .expect("failed to bind listener");
        axum::serve(listener, app).await.expect("server error");
    }
}
