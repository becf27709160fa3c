pub mod metrics;
pub mod routes;
pub mod state;

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use clap::Parser;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::{
	metrics::{LogMetrics, MetricsSink, PrometheusMetrics},
	state::AppState,
};

#[derive(Debug, Parser)]
#[command(
	version = redcat_cli::VERSION,
	rename_all = "kebab",
	styles = redcat_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = redcat_config::load(&args.config)?;

	redcat_cli::init_tracing(&config.service.log_level);

	let http_addr: SocketAddr = config.service.http_bind.parse()?;
	let shutdown = CancellationToken::new();
	let metrics: Arc<dyn MetricsSink> = match PrometheusMetrics::new() {
		Ok(metrics) => Arc::new(metrics),
		Err(err) => {
			tracing::warn!(
				error = %err,
				"Prometheus recorder unavailable; logging request metrics instead."
			);

			Arc::new(LogMetrics)
		},
	};
	let state = AppState::new(&config, metrics, shutdown.clone()).await?;
	let app = routes::router(state);
	let listener = TcpListener::bind(http_addr).await?;

	tracing::info!(%http_addr, "HTTP server listening.");

	axum::serve(listener, app).with_graceful_shutdown(shutdown_signal(shutdown)).await?;

	tracing::info!("HTTP server stopped.");

	Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
	let ctrl_c = async {
		if let Err(err) = tokio::signal::ctrl_c().await {
			tracing::error!(error = %err, "Failed to listen for Ctrl-C.");
		}
	};
	#[cfg(unix)]
	let terminate = async {
		match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
			Ok(mut signal) => {
				signal.recv().await;
			},
			Err(err) => {
				tracing::error!(error = %err, "Failed to listen for SIGTERM.");

				std::future::pending::<()>().await;
			},
		}
	};
	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => {},
		_ = terminate => {},
	}

	tracing::info!("Shutdown requested; draining in-flight requests.");

	shutdown.cancel();
}
