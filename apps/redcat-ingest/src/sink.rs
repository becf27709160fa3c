use std::{future::Future, pin::Pin, time::Duration};

use reqwest::{Client, StatusCode};

use crate::{Error, Result};
use redcat_domain::Place;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Where ingested places go.
pub trait PlaceSink
where
	Self: Send + Sync,
{
	fn send<'a>(&'a self, place: &'a Place) -> BoxFuture<'a, Result<()>>;
}

/// Posts each place to a running place API.
pub struct HttpSink {
	client: Client,
	endpoint: String,
}
impl HttpSink {
	pub fn new(api_base: &str, workers: usize) -> Result<Self> {
		let client = Client::builder()
			.timeout(REQUEST_TIMEOUT)
			.pool_max_idle_per_host(workers.saturating_mul(2))
			.build()?;
		let endpoint = format!("{}/places", api_base.trim_end_matches('/'));

		Ok(Self { client, endpoint })
	}

	pub fn endpoint(&self) -> &str {
		&self.endpoint
	}
}
impl PlaceSink for HttpSink {
	fn send<'a>(&'a self, place: &'a Place) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let res = self.client.post(&self.endpoint).json(place).send().await?;
			let status = res.status();

			// Drain the body so the connection goes back to the pool.
			let _ = res.bytes().await;

			if status == StatusCode::CREATED || status == StatusCode::OK {
				Ok(())
			} else {
				Err(Error::Status { status: status.as_u16() })
			}
		})
	}
}

/// Accepts everything without any I/O.
pub struct DryRunSink;
impl PlaceSink for DryRunSink {
	fn send<'a>(&'a self, _place: &'a Place) -> BoxFuture<'a, Result<()>> {
		Box::pin(async { Ok(()) })
	}
}
