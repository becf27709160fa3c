use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::metrics::MetricsSink;
use redcat_service::PlacesService;
use redcat_storage::valkey::ValkeyStore;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<PlacesService>,
	pub metrics: Arc<dyn MetricsSink>,
	/// Parent of every per-request token; cancelled once shutdown starts.
	pub shutdown: CancellationToken,
}
impl AppState {
	pub async fn new(
		config: &redcat_config::Config,
		metrics: Arc<dyn MetricsSink>,
		shutdown: CancellationToken,
	) -> color_eyre::Result<Self> {
		let store = ValkeyStore::connect(&config.storage.valkey).await?;

		store.ensure_places_index(&shutdown).await?;

		Ok(Self::from_parts(PlacesService::new(store), metrics, shutdown))
	}

	pub fn from_parts(
		service: PlacesService,
		metrics: Arc<dyn MetricsSink>,
		shutdown: CancellationToken,
	) -> Self {
		Self { service: Arc::new(service), metrics, shutdown }
	}
}
