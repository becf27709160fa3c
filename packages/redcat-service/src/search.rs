use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::{PlacesService, Result};
use redcat_domain::null_as_default;
use redcat_storage::places::{SearchHit, SearchParams, effective_limit};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
	#[serde(default, deserialize_with = "null_as_default")]
	pub lat: f64,
	#[serde(default, deserialize_with = "null_as_default")]
	pub lon: f64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SearchRequest {
	#[serde(default, deserialize_with = "null_as_default")]
	pub location: GeoPoint,
	#[serde(default, deserialize_with = "null_as_default")]
	pub category_ids: Vec<String>,
	/// Zero, negative, or above the maximum falls back to the default.
	#[serde(default, deserialize_with = "null_as_default")]
	pub limit: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchResultItem {
	pub id: String,
	pub name: String,
	pub location: GeoPoint,
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub address: String,
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub locality: String,
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub region: String,
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub postcode: String,
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub admin_region: String,
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub post_town: String,
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub po_box: String,
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub country: String,
	#[serde(default)]
	pub category_ids: Vec<String>,
	pub distance_m: f64,
}
impl From<SearchHit> for SearchResultItem {
	fn from(hit: SearchHit) -> Self {
		let place = hit.place;

		Self {
			location: GeoPoint { lat: place.lat, lon: place.lon },
			id: place.id,
			name: place.name,
			address: place.address,
			locality: place.locality,
			region: place.region,
			postcode: place.postcode,
			admin_region: place.admin_region,
			post_town: place.post_town,
			po_box: place.po_box,
			country: place.country,
			category_ids: place.category_ids,
			distance_m: hit.distance_m,
		}
	}
}

/// Echo of the query as executed, with the limit after clamping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
	pub location: GeoPoint,
	pub limit: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
	pub places: Vec<SearchResultItem>,
	pub total: usize,
	pub query: SearchQuery,
}

impl PlacesService {
	pub async fn search(
		&self,
		cancel: &CancellationToken,
		req: SearchRequest,
	) -> Result<SearchResponse> {
		let limit = effective_limit(req.limit);
		let params = SearchParams {
			lat: req.location.lat,
			lon: req.location.lon,
			limit: limit as i64,
			category_ids: req.category_ids,
		};
		let hits = self.repository.search_nearest(cancel, &params).await.inspect_err(|err| {
			tracing::warn!(error = %err, "Nearest-place search failed.");
		})?;
		let places = hits.into_iter().map(SearchResultItem::from).collect::<Vec<_>>();

		tracing::info!(
			lat = params.lat,
			lon = params.lon,
			limit,
			categories = params.category_ids.len(),
			results = places.len(),
			"Nearest-place search completed."
		);

		Ok(SearchResponse {
			total: places.len(),
			places,
			query: SearchQuery { location: req.location, limit },
		})
	}
}
