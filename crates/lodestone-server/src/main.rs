//! lodestone server binary.
//!
//! Opens (or creates) the store at the data directory, then serves the
//! gRPC API (over TCP or a unix socket) and, when configured, the JSON
//! HTTP surface, until terminated by signal.
//!
//! ```bash
//! # unix socket (default), HTTP disabled
//! lodestoned --data /var/lib/lodestone
//!
//! # TCP gRPC + HTTP
//! lodestoned --bind 0.0.0.0:50051 --http 0.0.0.0:8080 --data /var/lib/lodestone -v
//! ```
//!
//! Every flag also reads an environment variable (`LODESTONE_BIND`,
//! `LODESTONE_DATA_DIR`, `LODESTONE_HTTP`); `LODESTONE_LOG_LEVEL` sets
//! the tracing filter when `-v` is not given, and
//! `LODESTONE_MAP_SIZE_GB` overrides the 16 GiB map size budget.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::UnixListener;
use tokio_stream::wrappers::UnixListenerStream;
use tonic::transport::Server;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use lodestone_api::GraphService;
use lodestone_graph::Store;

mod http;

#[derive(Debug, Parser)]
#[command(name = "lodestoned", version, about = "graph + vector store server")]
struct Args {
    /// gRPC bind address: `host:port` or `unix:/path/to.sock`
    #[arg(short, long, env = "LODESTONE_BIND", default_value = "unix:/tmp/lodestone.sock")]
    bind: String,

    /// Data directory for the storage environment
    #[arg(short, long = "data", env = "LODESTONE_DATA_DIR", default_value = "data")]
    data: PathBuf,

    /// HTTP bind address, e.g. `0.0.0.0:8080` (disabled when absent)
    #[arg(short = 'H', long, env = "LODESTONE_HTTP")]
    http: Option<SocketAddr>,

    /// Increase logging verbosity (-v = debug, -vv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn log_filter(verbose: u8) -> EnvFilter {
    let fallback = match verbose {
        0 => std::env::var("LODESTONE_LOG_LEVEL").unwrap_or_else(|_| "info".into()),
        1 => "debug".into(),
        _ => "trace".into(),
    };
    EnvFilter::try_new(&fallback).unwrap_or_else(|_| EnvFilter::new("info"))
}

fn map_size() -> usize {
    let gb: usize = std::env::var("LODESTONE_MAP_SIZE_GB")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(16);
    gb << 30
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    fmt()
        .with_env_filter(log_filter(args.verbose))
        .with_target(true)
        .with_thread_ids(false)
        .compact()
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        data = %args.data.display(),
        bind = %args.bind,
        "lodestone starting"
    );

    let store = Arc::new(
        Store::open_with_map_size(&args.data, map_size())
            .with_context(|| format!("failed to open store at {}", args.data.display()))?,
    );

    if let Some(addr) = args.http {
        let http_store = Arc::clone(&store);
        tokio::spawn(async move {
            http::serve(http_store, addr).await;
        });
    }

    let service = GraphService::new(store).into_service();

    let reflection = tonic_reflection::server::Builder::configure()
        .register_encoded_file_descriptor_set(lodestone_api::LODESTONE_DESCRIPTOR)
        .build_v1()
        .context("failed to build gRPC reflection service")?;

    if let Some(path) = args.bind.strip_prefix("unix:") {
        // a stale socket file from a previous run would fail the bind
        let _ = std::fs::remove_file(path);
        let listener = UnixListener::bind(path)
            .with_context(|| format!("failed to bind unix socket {path}"))?;
        info!(socket = path, "grpc listening");
        Server::builder()
            .add_service(reflection)
            .add_service(service)
            .serve_with_incoming(UnixListenerStream::new(listener))
            .await?;
    } else {
        let addr: SocketAddr = args
            .bind
            .parse()
            .with_context(|| format!("invalid bind address {:?}", args.bind))?;
        info!(%addr, "grpc listening");
        Server::builder()
            .add_service(reflection)
            .add_service(service)
            .serve(addr)
            .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_args_parse() {
        let args = Args::parse_from(["lodestoned"]);
        assert_eq!(args.bind, "unix:/tmp/lodestone.sock");
        assert_eq!(args.data, PathBuf::from("data"));
        assert!(args.http.is_none());
        assert_eq!(args.verbose, 0);
    }

    #[test]
    fn flags_override_defaults() {
        let args = Args::parse_from([
            "lodestoned",
            "--bind",
            "127.0.0.1:50051",
            "--data",
            "/tmp/ls-data",
            "-H",
            "127.0.0.1:8080",
            "-vv",
        ]);
        assert_eq!(args.bind, "127.0.0.1:50051");
        assert_eq!(args.data, PathBuf::from("/tmp/ls-data"));
        assert_eq!(args.http, Some("127.0.0.1:8080".parse().unwrap()));
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn verbosity_controls_filter() {
        assert_eq!(log_filter(1).to_string(), "debug");
        assert_eq!(log_filter(2).to_string(), "trace");
    }
}
