mod error;

pub use error::{Error, Result};

use std::{env, future::Future, thread, time::Duration};

use redis::{Client, aio::MultiplexedConnection};
use tokio::{runtime::Builder, time};
use uuid::Uuid;

const CLEANUP_TIMEOUT: Duration = Duration::from_secs(10);
const SCAN_BATCH: usize = 500;

/// A uniquely named index and key prefix on a shared store, dropped with its documents when
/// the test is done.
pub struct TestIndex {
	url: String,
	index: String,
	key_prefix: String,
	cleaned: bool,
}
impl TestIndex {
	pub fn new(base_url: &str) -> Self {
		let suffix = Uuid::new_v4().simple().to_string();

		Self {
			url: base_url.to_string(),
			index: format!("redcat_test_{suffix}"),
			key_prefix: format!("redcat_test_{suffix}:"),
			cleaned: false,
		}
	}

	pub fn index(&self) -> &str {
		&self.index
	}

	pub fn key_prefix(&self) -> &str {
		&self.key_prefix
	}

	/// Store settings pointing at this index, ready for `ValkeyStore::connect`.
	pub fn valkey_config(&self) -> redcat_config::Valkey {
		redcat_config::Valkey {
			url: self.url.clone(),
			username: None,
			password: None,
			index: self.index.clone(),
			key_prefix: self.key_prefix.clone(),
			command_timeout_ms: 5_000,
		}
	}

	pub async fn cleanup(mut self) -> Result<()> {
		self.cleanup_inner().await
	}

	async fn cleanup_inner(&mut self) -> Result<()> {
		if self.cleaned {
			return Ok(());
		}

		cleanup_index(&self.url, &self.index, &self.key_prefix).await?;

		self.cleaned = true;

		Ok(())
	}
}
impl Drop for TestIndex {
	fn drop(&mut self) {
		if self.cleaned {
			return;
		}

		let url = self.url.clone();
		let index = self.index.clone();
		let key_prefix = self.key_prefix.clone();
		let cleanup_thread = thread::spawn(move || {
			let runtime = match Builder::new_current_thread().enable_all().build() {
				Ok(runtime) => runtime,
				Err(err) => {
					eprintln!("Test index cleanup failed: {err}.");

					return;
				},
			};

			if let Err(err) = runtime.block_on(cleanup_index(&url, &index, &key_prefix)) {
				eprintln!("Test index cleanup failed: {err}.");
			}
		});
		let _ = cleanup_thread.join();
	}
}

pub fn env_valkey_url() -> Option<String> {
	env::var("REDCAT_VALKEY_URL").ok().filter(|url| !url.trim().is_empty())
}

pub async fn with_test_index<F, Fut, T>(base_url: &str, f: F) -> Result<T>
where
	F: FnOnce(&TestIndex) -> Fut,
	Fut: Future<Output = Result<T>>,
{
	let index = TestIndex::new(base_url);
	let result = f(&index).await;
	let mut index = index;

	if let Err(err) = index.cleanup_inner().await {
		eprintln!("Test index cleanup warning: {err}.");

		if result.is_ok() {
			return Err(err);
		}
	}

	result
}

async fn cleanup_index(url: &str, index: &str, key_prefix: &str) -> Result<()> {
	let client = Client::open(url)?;
	let mut conn = time::timeout(CLEANUP_TIMEOUT, client.get_multiplexed_async_connection())
		.await
		.map_err(|_| Error::Message("Connecting for cleanup timed out.".to_string()))??;
	let mut drop_index = redis::cmd("FT.DROPINDEX");

	drop_index.arg(index).arg("DD");

	let dropped: redis::RedisResult<()> = time::timeout(
		CLEANUP_TIMEOUT,
		drop_index.query_async(&mut conn),
	)
	.await
	.map_err(|_| Error::Message(format!("Dropping index {index:?} timed out.")))?;

	if let Err(err) = dropped {
		let message = err.to_string().to_ascii_lowercase();

		if !message.contains("unknown index") && !message.contains("not found") {
			return Err(err.into());
		}
	}

	// Documents written before the index existed are not covered by `DD`.
	delete_prefixed_keys(&mut conn, key_prefix).await
}

async fn delete_prefixed_keys(conn: &mut MultiplexedConnection, key_prefix: &str) -> Result<()> {
	let pattern = format!("{key_prefix}*");
	let mut cursor = 0_u64;

	loop {
		let mut scan = redis::cmd("SCAN");

		scan.arg(cursor).arg("MATCH").arg(&pattern).arg("COUNT").arg(SCAN_BATCH);

		let (next, keys): (u64, Vec<String>) = scan.query_async(conn).await?;

		if !keys.is_empty() {
			let mut del = redis::cmd("DEL");

			del.arg(&keys);

			let _: i64 = del.query_async(conn).await?;
		}
		if next == 0 {
			return Ok(());
		}

		cursor = next;
	}
}
