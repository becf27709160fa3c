use std::time::{Duration, Instant};

use axum::{
	extract::{MatchedPath, Request, State},
	http::{StatusCode, header},
	middleware::Next,
	response::{IntoResponse, Response},
};
use metrics::Unit;
use metrics_exporter_prometheus::{
	BuildError, Matcher, PrometheusBuilder, PrometheusHandle, PrometheusRecorder,
};

use crate::state::AppState;

pub const REQUEST_DURATION: &str = "http_request_duration_seconds";
pub const REQUESTS_TOTAL: &str = "http_requests_total";

const DURATION_BUCKETS: [f64; 12] =
	[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];
const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// One finished HTTP request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestRecord {
	pub method: String,
	/// Route template such as `/places/{id}`, so ids never become label values.
	pub route: String,
	pub status: u16,
	pub elapsed: Duration,
}

pub trait MetricsSink
where
	Self: Send + Sync,
{
	fn record(&self, record: &RequestRecord);

	/// Scrape body in the Prometheus text format, or `None` when this sink exports nothing.
	fn render(&self) -> Option<String> {
		None
	}
}

/// Aggregates request counts and latencies for `GET /metrics`.
///
/// The recorder is owned rather than installed globally, so several apps can live in one
/// process without sharing series.
pub struct PrometheusMetrics {
	recorder: PrometheusRecorder,
	handle: PrometheusHandle,
}
impl PrometheusMetrics {
	pub fn new() -> Result<Self, BuildError> {
		let recorder = PrometheusBuilder::new()
			.set_buckets_for_metric(Matcher::Full(REQUEST_DURATION.to_string()), &DURATION_BUCKETS)?
			.build_recorder();
		let handle = recorder.handle();

		metrics::with_local_recorder(&recorder, || {
			metrics::describe_histogram!(
				REQUEST_DURATION,
				Unit::Seconds,
				"HTTP request duration in seconds"
			);
			metrics::describe_counter!(REQUESTS_TOTAL, "Total number of HTTP requests");
		});

		Ok(Self { recorder, handle })
	}
}
impl MetricsSink for PrometheusMetrics {
	fn record(&self, record: &RequestRecord) {
		let labels = [
			("method", record.method.clone()),
			("path", record.route.clone()),
			("status", record.status.to_string()),
		];

		metrics::with_local_recorder(&self.recorder, || {
			metrics::counter!(REQUESTS_TOTAL, &labels).increment(1);
			metrics::histogram!(REQUEST_DURATION, &labels).record(record.elapsed.as_secs_f64());
		});
	}

	fn render(&self) -> Option<String> {
		Some(self.handle.render())
	}
}

/// Emits every record as a `tracing` event. Used when the Prometheus recorder cannot be built.
pub struct LogMetrics;
impl MetricsSink for LogMetrics {
	fn record(&self, record: &RequestRecord) {
		tracing::debug!(
			method = %record.method,
			route = %record.route,
			status = record.status,
			elapsed_ms = record.elapsed.as_millis() as u64,
			"HTTP request completed."
		);
	}
}

pub async fn track(State(state): State<AppState>, req: Request, next: Next) -> Response {
	let started = Instant::now();
	let method = req.method().to_string();
	let route = req
		.extensions()
		.get::<MatchedPath>()
		.map(|path| path.as_str().to_string())
		.unwrap_or_else(|| "unmatched".to_string());
	let response = next.run(req).await;

	state.metrics.record(&RequestRecord {
		method,
		route,
		status: response.status().as_u16(),
		elapsed: started.elapsed(),
	});

	response
}

pub async fn scrape(State(state): State<AppState>) -> Response {
	match state.metrics.render() {
		Some(body) => ([(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)], body).into_response(),
		None => StatusCode::NOT_FOUND.into_response(),
	}
}
