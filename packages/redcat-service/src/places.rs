use tokio_util::sync::CancellationToken;

use crate::{Error, PlacesService, Result};
use redcat_domain::Place;

impl PlacesService {
	/// Creates or fully replaces a place.
	pub async fn add(&self, cancel: &CancellationToken, place: Place) -> Result<Place> {
		if place.id.trim().is_empty() {
			return Err(Error::MissingField { field: "id".to_string() });
		}
		if place.name.trim().is_empty() {
			return Err(Error::MissingField { field: "name".to_string() });
		}

		self.repository.upsert(cancel, &place).await.inspect_err(|err| {
			tracing::warn!(id = %place.id, error = %err, "Failed to store place.");
		})?;

		tracing::info!(id = %place.id, "Place stored.");

		Ok(place)
	}

	/// Reads a place; an unknown id yields the zero-valued place.
	pub async fn get(&self, cancel: &CancellationToken, id: &str) -> Result<Place> {
		let id = required_id(id)?;

		Ok(self.repository.get(cancel, id).await?)
	}

	pub async fn delete(&self, cancel: &CancellationToken, id: &str) -> Result<()> {
		let id = required_id(id)?;

		self.repository.delete(cancel, id).await.inspect_err(|err| {
			tracing::warn!(id = %id, error = %err, "Failed to delete place.");
		})?;

		tracing::info!(id = %id, "Place deleted.");

		Ok(())
	}
}

fn required_id(id: &str) -> Result<&str> {
	if id.trim().is_empty() {
		return Err(Error::MissingField { field: "id".to_string() });
	}

	Ok(id)
}
