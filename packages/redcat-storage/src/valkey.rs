use std::time::Duration;

use redis::{Client, Cmd, FromRedisValue, IntoConnectionInfo, aio::ConnectionManager};
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::{Error, Result};

/// Shared handle to the place store.
///
/// Connects to one standalone node; cluster seed lists are rejected by config validation.
///
/// The underlying connection is multiplexed and reconnects on its own, so one instance serves
/// every concurrent request; clone-per-call is how commands reach it.
pub struct ValkeyStore {
	conn: ConnectionManager,
	pub index: String,
	pub key_prefix: String,
	command_timeout: Duration,
}
impl ValkeyStore {
	pub async fn connect(cfg: &redcat_config::Valkey) -> Result<Self> {
		let mut info = cfg.url.as_str().into_connection_info()?;

		if let Some(username) = cfg.username.as_ref() {
			info.redis.username = Some(username.clone());
		}
		if let Some(password) = cfg.password.as_ref() {
			info.redis.password = Some(password.clone());
		}

		let client = Client::open(info)?;
		let conn = ConnectionManager::new(client).await?;

		tracing::info!(index = %cfg.index, key_prefix = %cfg.key_prefix, "Connected to Valkey.");

		Ok(Self {
			conn,
			index: cfg.index.clone(),
			key_prefix: cfg.key_prefix.clone(),
			command_timeout: Duration::from_millis(cfg.command_timeout_ms),
		})
	}

	/// Hash key of a place; see [`place_key`].
	pub fn key(&self, id: &str) -> String {
		place_key(&self.key_prefix, id)
	}

	/// Runs one command, racing it against the caller's token and the command timeout.
	pub(crate) async fn query<T>(&self, cancel: &CancellationToken, cmd: &Cmd) -> Result<T>
	where
		T: FromRedisValue,
	{
		let mut conn = self.conn.clone();
		let request = async {
			let reply: T = cmd.query_async(&mut conn).await?;

			Ok::<T, Error>(reply)
		};

		tokio::select! {
			biased;
			_ = cancel.cancelled() => Err(Error::Cancelled),
			result = time::timeout(self.command_timeout, request) => match result {
				Ok(reply) => reply,
				Err(_) => Err(Error::Timeout {
					timeout_ms: self.command_timeout.as_millis() as u64,
				}),
			},
		}
	}
}

/// Hash key of a place: `<prefix>{<id>}`.
///
/// The braces make the id a cluster hash tag so keys stay stable if the store is ever
/// sharded, but the supported deployment is a single node reached through one URL.
pub fn place_key(prefix: &str, id: &str) -> String {
	format!("{prefix}{{{id}}}")
}

/// Inverse of [`place_key`]; `None` when the key is not under `prefix`.
pub fn id_from_key<'a>(prefix: &str, key: &'a str) -> Option<&'a str> {
	key.strip_prefix(prefix)?.strip_prefix('{')?.strip_suffix('}')
}
