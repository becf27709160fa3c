use std::{
	net::SocketAddr,
	sync::{Arc, Mutex},
	time::Duration,
};

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use redcat_domain::Place;
use redcat_ingest::{
	Error,
	pipeline::{self, PipelineOptions},
	sink::{HttpSink, PlaceSink},
	source::SourceRecord,
};

type Received = Arc<Mutex<Vec<Value>>>;

async fn accept_place(State(received): State<Received>, Json(body): Json<Value>) -> StatusCode {
	let id = body["id"].as_str().unwrap_or_default().to_string();

	received.lock().unwrap_or_else(|err| err.into_inner()).push(body);

	match id.as_str() {
		"broken" => StatusCode::INTERNAL_SERVER_ERROR,
		"existing" => StatusCode::OK,
		_ => StatusCode::CREATED,
	}
}

async fn spawn_api() -> (SocketAddr, Received, CancellationToken) {
	let received = Received::default();
	let app = Router::new().route("/places", post(accept_place)).with_state(received.clone());
	let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind test listener.");
	let addr = listener.local_addr().expect("Failed to read listener address.");
	let shutdown = CancellationToken::new();
	let server_shutdown = shutdown.clone();

	tokio::spawn(async move {
		let _ = axum::serve(listener, app)
			.with_graceful_shutdown(async move { server_shutdown.cancelled().await })
			.await;
	});

	(addr, received, shutdown)
}

fn place(id: &str) -> Place {
	Place { id: id.to_string(), name: "Name".to_string(), ..Default::default() }
}

#[tokio::test]
async fn accepts_created_and_ok_statuses() {
	let (addr, received, shutdown) = spawn_api().await;
	let sink = HttpSink::new(&format!("http://{addr}/"), 2).expect("Failed to build sink.");

	assert_eq!(sink.endpoint(), format!("http://{addr}/places"));

	sink.send(&place("fresh")).await.expect("Expected 201 to succeed.");
	sink.send(&place("existing")).await.expect("Expected 200 to succeed.");

	let err = sink.send(&place("broken")).await.expect_err("Expected 500 to fail.");

	assert!(matches!(err, Error::Status { status: 500 }));

	let bodies = received.lock().unwrap_or_else(|err| err.into_inner()).clone();

	assert_eq!(bodies.len(), 3);
	assert_eq!(bodies[0]["category_ids"], serde_json::json!([]));
	assert!(bodies[0].get("address").is_none());

	shutdown.cancel();
}

#[tokio::test]
async fn pipeline_posts_rows_to_api() {
	let (addr, received, shutdown) = spawn_api().await;
	let sink = Arc::new(HttpSink::new(&format!("http://{addr}"), 3).expect("Failed to build sink."));
	let rows = ["one", "two", "broken", "four"]
		.iter()
		.map(|id| SourceRecord {
			fsq_place_id: id.to_string(),
			name: format!("Place {id}"),
			latitude: 35.0,
			longitude: 33.0,
			country: "CY".to_string(),
			fsq_category_ids: vec!["cat".to_string()],
			..Default::default()
		})
		.collect::<Vec<_>>();
	let options =
		PipelineOptions { workers: 3, limit: 0, slim: true, progress_interval: Duration::from_secs(5) };
	let report = pipeline::run(
		move || Ok(rows.into_iter().map(Ok)),
		4,
		sink,
		&options,
		CancellationToken::new(),
	)
	.await;

	assert_eq!(report.loaded, 3);
	assert_eq!(report.errors, 1);

	let bodies = received.lock().unwrap_or_else(|err| err.into_inner()).clone();

	assert_eq!(bodies.len(), 4);
	assert!(bodies.iter().all(|body| body["country"] == "CY"));

	shutdown.cancel();
}
