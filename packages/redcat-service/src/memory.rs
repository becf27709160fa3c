//! Process-local [`PlaceRepository`] for tests and for running the service without a store.
//!
//! Search scans every stored place and ranks by exact distance, so it returns what the
//! store-backed search converges to once its index has caught up.

use std::sync::Mutex;

use tokio_util::sync::CancellationToken;

use crate::{BoxFuture, PlaceRepository};
use redcat_domain::{Place, clean_category_ids};
use redcat_storage::{
	Error, Result,
	places::{self, SearchHit, SearchParams},
};

#[derive(Default)]
pub struct MemoryRepository {
	places: Mutex<Vec<Place>>,
}
impl MemoryRepository {
	pub fn new() -> Self {
		Self::default()
	}

	/// Stored places in first-insertion order.
	pub fn snapshot(&self) -> Vec<Place> {
		self.places.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}

	fn upsert_now(&self, place: &Place) {
		let mut stored = place.clone();

		stored.category_ids = clean_category_ids(&stored.category_ids);

		let mut places = self.places.lock().unwrap_or_else(|err| err.into_inner());

		match places.iter_mut().find(|existing| existing.id == stored.id) {
			Some(existing) => *existing = stored,
			None => places.push(stored),
		}
	}

	fn get_now(&self, id: &str) -> Place {
		let places = self.places.lock().unwrap_or_else(|err| err.into_inner());

		places.iter().find(|place| place.id == id).cloned().unwrap_or_default()
	}

	fn delete_now(&self, id: &str) {
		self.places.lock().unwrap_or_else(|err| err.into_inner()).retain(|place| place.id != id);
	}

	fn search_now(&self, params: &SearchParams) -> Vec<SearchHit> {
		let limit = places::effective_limit(params.limit);
		let wanted = clean_category_ids(&params.category_ids);
		let candidates = self
			.places
			.lock()
			.unwrap_or_else(|err| err.into_inner())
			.iter()
			.filter(|place| {
				wanted.is_empty() || place.category_ids.iter().any(|id| wanted.contains(id))
			})
			.cloned()
			.collect::<Vec<_>>();

		places::rank_by_distance(params.lat, params.lon, candidates, limit)
	}
}
impl PlaceRepository for MemoryRepository {
	fn upsert<'a>(
		&'a self,
		cancel: &'a CancellationToken,
		place: &'a Place,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			checked(cancel, &place.id)?;
			self.upsert_now(place);

			Ok(())
		})
	}

	fn get<'a>(&'a self, cancel: &'a CancellationToken, id: &'a str) -> BoxFuture<'a, Result<Place>> {
		Box::pin(async move {
			checked(cancel, id)?;

			Ok(self.get_now(id))
		})
	}

	fn delete<'a>(&'a self, cancel: &'a CancellationToken, id: &'a str) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			checked(cancel, id)?;
			self.delete_now(id);

			Ok(())
		})
	}

	fn search_nearest<'a>(
		&'a self,
		cancel: &'a CancellationToken,
		params: &'a SearchParams,
	) -> BoxFuture<'a, Result<Vec<SearchHit>>> {
		Box::pin(async move {
			if cancel.is_cancelled() {
				return Err(Error::Cancelled);
			}

			Ok(self.search_now(params))
		})
	}
}

fn checked(cancel: &CancellationToken, id: &str) -> Result<()> {
	if cancel.is_cancelled() {
		return Err(Error::Cancelled);
	}
	if id.trim().is_empty() {
		return Err(Error::Validation("id must be non-empty.".to_string()));
	}

	Ok(())
}
