use std::sync::Arc;

use clap::Parser;
use procmetrics_admin::{AdminState, admin_router};
use procmetrics_core::{MetricRegistry, MetricsRegistrar, TextEncoder};
use procmetrics_process::StandardMetrics;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "procmetrics", about = "Serves process metrics for Prometheus scraping")]
struct Cli {
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    #[arg(long, default_value = "9184")]
    port: u16,

    /// Append the scrape time to every exported sample.
    #[arg(long, default_value_t = false)]
    timestamps: bool,

    /// Skip the standard process_* metrics.
    #[arg(long, default_value_t = false)]
    no_process_metrics: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::from_default_env().add_directive("procmetrics=info".parse()?);
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    let host = std::env::var("PROCMETRICS_HOST").unwrap_or(cli.host);
    let port = match std::env::var("PROCMETRICS_PORT") {
        Ok(value) => value.trim().parse::<u16>()?,
        Err(_) => cli.port,
    };
    let addr = format!("{host}:{port}");

    let registry = Arc::new(MetricRegistry::new());
    if cli.no_process_metrics {
        info!("standard process metrics disabled");
    } else {
        let standard = StandardMetrics::new();
        let capabilities = standard.capabilities();
        if let Err(err) = standard.register_metrics_to(&registry) {
            warn!(error = %err, code = err.error_code(), "failed to register process metrics");
            return Err(err.into());
        }
        info!(
            file_descriptors = capabilities.file_descriptors,
            memory_status = capabilities.memory_status,
            "standard process metrics registered"
        );
    }

    let encoder = TextEncoder::new().with_timestamps(cli.timestamps);
    let state = Arc::new(AdminState::new(Arc::clone(&registry), encoder)?);
    let app = admin_router(state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(metrics = registry.len(), "procmetrics listening on {addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("procmetrics stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
