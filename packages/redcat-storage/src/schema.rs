use redis::RedisError;
use tokio_util::sync::CancellationToken;

use crate::{Error, Result, valkey::ValkeyStore};

pub const CATEGORY_FIELD: &str = "category_ids";
pub const COUNTRY_FIELD: &str = "country";
pub const LAT_FIELD: &str = "lat";
pub const LON_FIELD: &str = "lon";
pub const VECTOR_FIELD: &str = "location";
pub const VECTOR_DIM: usize = 3;

/// Arguments of the `FT.CREATE` call defining the places index.
///
/// Tags use the default comma separator, which is how category ids are joined on write. The
/// vector index is FLAT: an exhaustive scan, no graph structure to tune.
pub fn places_index_args(index: &str, key_prefix: &str) -> Vec<String> {
	let dim = VECTOR_DIM.to_string();
	let args = [
		index,
		"ON",
		"HASH",
		"PREFIX",
		"1",
		key_prefix,
		"SCHEMA",
		CATEGORY_FIELD,
		"TAG",
		COUNTRY_FIELD,
		"TAG",
		LAT_FIELD,
		"NUMERIC",
		LON_FIELD,
		"NUMERIC",
		VECTOR_FIELD,
		"VECTOR",
		"FLAT",
		"6",
		"TYPE",
		"FLOAT32",
		"DIM",
		dim.as_str(),
		"DISTANCE_METRIC",
		"L2",
	];

	args.iter().map(|arg| arg.to_string()).collect()
}

impl ValkeyStore {
	/// Creates the places index unless it already exists.
	///
	/// The `FT.INFO` check is only a shortcut. Another process may create the index between
	/// check and create, so "already exists" from `FT.CREATE` counts as success.
	pub async fn ensure_places_index(&self, cancel: &CancellationToken) -> Result<()> {
		let mut info = redis::cmd("FT.INFO");

		info.arg(&self.index);

		match self.query::<redis::Value>(cancel, &info).await {
			Ok(_) => {
				tracing::info!(index = %self.index, "Places index already present.");

				return Ok(());
			},
			Err(Error::Store(err)) => {
				tracing::debug!(index = %self.index, error = %err, "Places index lookup failed.");
			},
			Err(err) => return Err(err),
		}

		let mut create = redis::cmd("FT.CREATE");

		create.arg(places_index_args(&self.index, &self.key_prefix));

		match self.query::<()>(cancel, &create).await {
			Ok(()) => {
				tracing::info!(index = %self.index, prefix = %self.key_prefix, "Places index created.");

				Ok(())
			},
			Err(Error::Store(err)) if is_index_exists(&err) => {
				tracing::info!(index = %self.index, "Places index was created concurrently.");

				Ok(())
			},
			Err(err) => Err(err),
		}
	}
}

fn is_index_exists(err: &RedisError) -> bool {
	err.to_string().to_ascii_lowercase().contains("already exists")
}
