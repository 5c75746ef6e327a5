use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{debug, info, warn, Level};
use tracing_subscriber;

use turnstile::admission::{AdmissionGuard, MemoryCounterStore, RuleResolver, TierRegistry};
use turnstile::config::TurnstileConfig;
use turnstile::grpc::GrpcServer;
use turnstile::ops::{builtin_registry, export_group_manifests};

/// Tiered request-admission gateway.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path to the YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Export per-group operation manifests to this directory before serving
    #[arg(long)]
    export_manifests: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    info!("Starting Turnstile Admission Gateway");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = match &args.config {
        Some(path) => TurnstileConfig::from_file(path)?,
        None => TurnstileConfig::default(),
    };
    info!(grpc_addr = %config.server.grpc_addr, "Configuration loaded");

    // Tier definitions are validated up front; a malformed tier list is fatal.
    let tiers = TierRegistry::new(&config.admission.tiers)?;
    info!(tiers = tiers.len(), "Tier registry loaded");

    let registry = Arc::new(builtin_registry()?);

    if let Some(dir) = &args.export_manifests {
        if let Err(e) = export_group_manifests(&registry, dir) {
            warn!(error = %e, "Manifest export failed");
        }
    }

    let (operation_rules, group_rules) = registry.rules();
    let resolver = RuleResolver::new(
        config.admission.bypass.iter().cloned().collect(),
        operation_rules,
        group_rules,
    );

    let store = Arc::new(MemoryCounterStore::new());
    let guard = Arc::new(AdmissionGuard::new(tiers, resolver, Arc::clone(&store)));
    info!("Admission guard initialized");

    // Periodically drop counters whose window has long expired.
    let sweep_interval = Duration::from_secs(config.admission.sweep_interval_secs.max(1));
    let sweeper_store = Arc::clone(&store);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_interval);
        loop {
            interval.tick().await;
            let removed = sweeper_store.purge_expired();
            if removed > 0 {
                debug!(removed, "Purged expired counters");
            }
        }
    });

    let server = GrpcServer::new(config.server.grpc_addr, guard, registry);

    info!("Starting gRPC server on {}", config.server.grpc_addr);

    // Run the server with graceful shutdown on Ctrl+C
    server.serve_with_shutdown(shutdown_signal()).await?;

    info!("Turnstile Admission Gateway stopped");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
