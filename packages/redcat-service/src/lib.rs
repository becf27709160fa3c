pub mod memory;
pub mod places;
pub mod search;

mod error;

pub use error::{Error, Result};
pub use search::{GeoPoint, SearchQuery, SearchRequest, SearchResponse, SearchResultItem};

use std::{future::Future, pin::Pin, sync::Arc};

use tokio_util::sync::CancellationToken;

use redcat_domain::Place;
use redcat_storage::{
	places::{SearchHit, SearchParams},
	valkey::ValkeyStore,
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Persistence capabilities the service needs, nothing more.
pub trait PlaceRepository
where
	Self: Send + Sync,
{
	fn upsert<'a>(
		&'a self,
		cancel: &'a CancellationToken,
		place: &'a Place,
	) -> BoxFuture<'a, redcat_storage::Result<()>>;

	fn get<'a>(
		&'a self,
		cancel: &'a CancellationToken,
		id: &'a str,
	) -> BoxFuture<'a, redcat_storage::Result<Place>>;

	fn delete<'a>(
		&'a self,
		cancel: &'a CancellationToken,
		id: &'a str,
	) -> BoxFuture<'a, redcat_storage::Result<()>>;

	fn search_nearest<'a>(
		&'a self,
		cancel: &'a CancellationToken,
		params: &'a SearchParams,
	) -> BoxFuture<'a, redcat_storage::Result<Vec<SearchHit>>>;
}
impl PlaceRepository for ValkeyStore {
	fn upsert<'a>(
		&'a self,
		cancel: &'a CancellationToken,
		place: &'a Place,
	) -> BoxFuture<'a, redcat_storage::Result<()>> {
		Box::pin(ValkeyStore::upsert(self, cancel, place))
	}

	fn get<'a>(
		&'a self,
		cancel: &'a CancellationToken,
		id: &'a str,
	) -> BoxFuture<'a, redcat_storage::Result<Place>> {
		Box::pin(ValkeyStore::get(self, cancel, id))
	}

	fn delete<'a>(
		&'a self,
		cancel: &'a CancellationToken,
		id: &'a str,
	) -> BoxFuture<'a, redcat_storage::Result<()>> {
		Box::pin(ValkeyStore::delete(self, cancel, id))
	}

	fn search_nearest<'a>(
		&'a self,
		cancel: &'a CancellationToken,
		params: &'a SearchParams,
	) -> BoxFuture<'a, redcat_storage::Result<Vec<SearchHit>>> {
		Box::pin(ValkeyStore::search_nearest(self, cancel, params))
	}
}

pub struct PlacesService {
	pub repository: Arc<dyn PlaceRepository>,
}
impl PlacesService {
	pub fn new(store: ValkeyStore) -> Self {
		Self::with_repository(Arc::new(store))
	}

	pub fn with_repository(repository: Arc<dyn PlaceRepository>) -> Self {
		Self { repository }
	}
}
