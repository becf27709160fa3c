//! Reader, bounded queue, sender pool.
//!
//! One blocking task decodes rows and pushes places into a queue holding `workers * 10`
//! entries; a full queue parks the reader. `workers` async tasks drain the queue into the
//! sink. Cancellation stops the reader at the next row and each sender after its in-flight
//! request; whatever was counted up to then is still reported.

use std::{
	sync::{
		Arc,
		atomic::{AtomicU64, Ordering},
	},
	time::{Duration, Instant},
};

use async_channel::{Receiver, Sender};
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::{Result, sink::PlaceSink, source::SourceRecord};
use redcat_domain::Place;

pub const PROGRESS_INTERVAL: Duration = Duration::from_secs(5);
const QUEUE_SLOTS_PER_WORKER: usize = 10;

#[derive(Clone, Debug)]
pub struct PipelineOptions {
	pub workers: usize,
	/// Maximum rows to read; zero reads everything.
	pub limit: u64,
	pub slim: bool,
	pub progress_interval: Duration,
}
impl Default for PipelineOptions {
	fn default() -> Self {
		Self { workers: 10, limit: 0, slim: false, progress_interval: PROGRESS_INTERVAL }
	}
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Report {
	pub read: u64,
	pub loaded: u64,
	pub skipped: u64,
	pub errors: u64,
	pub elapsed: Duration,
}
impl Report {
	pub fn rate(&self) -> f64 {
		per_second(self.loaded, self.elapsed)
	}
}

#[derive(Default)]
struct Counters {
	read: AtomicU64,
	loaded: AtomicU64,
	skipped: AtomicU64,
	errors: AtomicU64,
}
impl Counters {
	fn bump(counter: &AtomicU64) {
		counter.fetch_add(1, Ordering::Relaxed);
	}

	fn report(&self, elapsed: Duration) -> Report {
		Report {
			read: self.read.load(Ordering::Relaxed),
			loaded: self.loaded.load(Ordering::Relaxed),
			skipped: self.skipped.load(Ordering::Relaxed),
			errors: self.errors.load(Ordering::Relaxed),
			elapsed,
		}
	}
}

/// Streams every row from `open_rows` into `sink` and returns the final tallies.
///
/// `open_rows` runs on the blocking reader thread, so the row iterator never crosses threads.
/// `total` only feeds progress lines.
pub async fn run<F, I>(
	open_rows: F,
	total: u64,
	sink: Arc<dyn PlaceSink>,
	options: &PipelineOptions,
	cancel: CancellationToken,
) -> Report
where
	F: FnOnce() -> Result<I> + Send + 'static,
	I: Iterator<Item = Result<SourceRecord>>,
{
	let workers = options.workers.max(1);
	let (tx, rx) = async_channel::bounded::<Place>(workers * QUEUE_SLOTS_PER_WORKER);
	let counters = Arc::new(Counters::default());
	let started = Instant::now();
	let target = if options.limit > 0 { total.min(options.limit) } else { total };
	let reader = {
		let counters = counters.clone();
		let cancel = cancel.clone();
		let limit = options.limit;
		let slim = options.slim;

		tokio::task::spawn_blocking(move || {
			read_rows(open_rows, &tx, &counters, &cancel, limit, slim);
		})
	};
	let senders = (0..workers)
		.map(|_| {
			tokio::spawn(send_places(rx.clone(), sink.clone(), counters.clone(), cancel.clone()))
		})
		.collect::<Vec<_>>();

	drop(rx);

	let done = CancellationToken::new();
	let progress = tokio::spawn(report_progress(
		counters.clone(),
		target,
		options.progress_interval,
		started,
		done.clone(),
	));

	if let Err(err) = reader.await {
		tracing::error!(error = %err, "Row reader task failed.");

		Counters::bump(&counters.errors);
	}

	for sender in senders {
		if let Err(err) = sender.await {
			tracing::error!(error = %err, "Sender task failed.");
		}
	}

	done.cancel();

	let _ = progress.await;

	counters.report(started.elapsed())
}

fn read_rows<F, I>(
	open_rows: F,
	tx: &Sender<Place>,
	counters: &Counters,
	cancel: &CancellationToken,
	limit: u64,
	slim: bool,
) where
	F: FnOnce() -> Result<I>,
	I: Iterator<Item = Result<SourceRecord>>,
{
	let rows = match open_rows() {
		Ok(rows) => rows,
		Err(err) => {
			tracing::error!(error = %err, "Failed to open source rows.");
			Counters::bump(&counters.errors);

			return;
		},
	};

	for row in rows {
		if cancel.is_cancelled() {
			tracing::info!("Reader stopped by cancellation.");

			break;
		}
		if limit > 0 && counters.read.load(Ordering::Relaxed) >= limit {
			break;
		}

		let record = match row {
			Ok(record) => record,
			Err(err) => {
				tracing::error!(error = %err, "Failed to read source row; stopping.");
				Counters::bump(&counters.errors);

				break;
			},
		};

		Counters::bump(&counters.read);

		let Some(place) = record.into_place(slim) else {
			Counters::bump(&counters.skipped);

			continue;
		};

		// Fails only once every sender is gone.
		if tx.send_blocking(place).is_err() {
			break;
		}
	}
}

async fn send_places(
	rx: Receiver<Place>,
	sink: Arc<dyn PlaceSink>,
	counters: Arc<Counters>,
	cancel: CancellationToken,
) {
	loop {
		let place = tokio::select! {
			biased;
			_ = cancel.cancelled() => break,
			place = rx.recv() => match place {
				Ok(place) => place,
				Err(_) => break,
			},
		};

		match sink.send(&place).await {
			Ok(()) => Counters::bump(&counters.loaded),
			Err(err) => {
				tracing::debug!(id = %place.id, error = %err, "Failed to submit place.");
				Counters::bump(&counters.errors);
			},
		}
	}
}

async fn report_progress(
	counters: Arc<Counters>,
	target: u64,
	interval: Duration,
	started: Instant,
	done: CancellationToken,
) {
	let mut ticker = time::interval(interval);

	// The first tick fires immediately.
	ticker.tick().await;

	loop {
		tokio::select! {
			_ = done.cancelled() => return,
			_ = ticker.tick() => {
				let report = counters.report(started.elapsed());
				let percent = if target == 0 {
					0.0
				} else {
					report.loaded as f64 * 100.0 / target as f64
				};

				tracing::info!(
					loaded = report.loaded,
					total = target,
					percent = format_args!("{percent:.1}"),
					rate = format_args!("{:.0}", report.rate()),
					errors = report.errors,
					"Ingest progress."
				);
			},
		}
	}
}

fn per_second(count: u64, elapsed: Duration) -> f64 {
	let seconds = elapsed.as_secs_f64();

	if seconds > 0.0 { count as f64 / seconds } else { 0.0 }
}
