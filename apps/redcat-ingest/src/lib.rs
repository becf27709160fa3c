pub mod pipeline;
pub mod sink;
pub mod source;

mod error;

pub use error::{Error, Result};

use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use tokio_util::sync::CancellationToken;

use crate::{
	pipeline::{PROGRESS_INTERVAL, PipelineOptions},
	sink::{DryRunSink, HttpSink, PlaceSink},
};

/// Bulk-loads places from a parquet file into a running place API.
#[derive(Debug, Parser)]
#[command(
	version = redcat_cli::VERSION,
	rename_all = "kebab",
	styles = redcat_cli::styles(),
)]
pub struct Args {
	/// Parquet file to load.
	#[arg(long, value_name = "FILE")]
	pub file: PathBuf,
	/// Place API base URL.
	#[arg(long, value_name = "URL", default_value = "http://127.0.0.1:8080")]
	pub api: String,
	/// Concurrent senders.
	#[arg(long, value_name = "N", default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..))]
	pub workers: u32,
	/// Maximum rows to read; 0 reads everything.
	#[arg(long, value_name = "N", default_value_t = 0)]
	pub limit: u64,
	/// Decode and count rows without sending anything.
	#[arg(long)]
	pub dry_run: bool,
	/// Send only id, name, coordinates, categories and country.
	#[arg(long)]
	pub slim: bool,
	#[arg(long, value_name = "LEVEL", default_value = "info")]
	pub log_level: String,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	redcat_cli::init_tracing(&args.log_level);

	let total_rows = source::row_count(&args.file)?;
	let workers = args.workers as usize;

	tracing::info!(file = %args.file.display(), rows = total_rows, "Parquet file opened.");

	let sink: Arc<dyn PlaceSink> = if args.dry_run {
		Arc::new(DryRunSink)
	} else {
		let sink = HttpSink::new(&args.api, workers)?;

		tracing::info!(endpoint = %sink.endpoint(), workers, "Sending places.");

		Arc::new(sink)
	};
	let options = PipelineOptions {
		workers,
		limit: args.limit,
		slim: args.slim,
		progress_interval: PROGRESS_INTERVAL,
	};
	let cancel = CancellationToken::new();

	tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

	let file = args.file.clone();
	let report =
		pipeline::run(move || source::open(&file), total_rows, sink, &options, cancel).await;

	tracing::info!(
		read = report.read,
		loaded = report.loaded,
		skipped = report.skipped,
		errors = report.errors,
		elapsed_ms = report.elapsed.as_millis() as u64,
		rate = format_args!("{:.0}", report.rate()),
		"Ingest finished."
	);

	Ok(())
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
	match tokio::signal::ctrl_c().await {
		Ok(()) => {
			tracing::info!("Interrupt received; stopping after in-flight requests.");

			cancel.cancel();
		},
		Err(err) => tracing::error!(error = %err, "Failed to listen for Ctrl-C."),
	}
}
