use redis::Value;
use tokio_util::sync::CancellationToken;

use redcat_domain::{Place, haversine_m, pack_f32_le, project};

use crate::{
	Error, Result,
	codec::{self, FieldMap},
	query::{FilterExpr, VECTOR_PARAM, attach_knn},
	schema::VECTOR_FIELD,
	valkey::{ValkeyStore, id_from_key},
};

pub const DEFAULT_SEARCH_LIMIT: usize = 100;
pub const MAX_SEARCH_LIMIT: usize = 200;

/// Fields projected into search candidates; enough to render a result without a second read.
pub const SEARCH_RETURN_FIELDS: [&str; 13] = [
	"id",
	"name",
	"lat",
	"lon",
	"address",
	"locality",
	"region",
	"postcode",
	"admin_region",
	"post_town",
	"po_box",
	"country",
	"category_ids",
];

#[derive(Clone, Debug, Default)]
pub struct SearchParams {
	pub lat: f64,
	pub lon: f64,
	/// Requested result count; anything outside `1..=MAX_SEARCH_LIMIT` means the default.
	pub limit: i64,
	pub category_ids: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SearchHit {
	pub place: Place,
	pub distance_m: f64,
}

impl ValkeyStore {
	pub async fn upsert(&self, cancel: &CancellationToken, place: &Place) -> Result<()> {
		let id = non_empty_id(&place.id)?;
		let fields = codec::encode_place(place)?;
		let mut cmd = redis::cmd("HSET");

		cmd.arg(self.key(id));

		for (name, value) in &fields {
			cmd.arg(*name).arg(value.as_slice());
		}

		self.query::<()>(cancel, &cmd).await
	}

	/// Reads a place back. An unknown id yields the zero-valued place, not an error.
	pub async fn get(&self, cancel: &CancellationToken, id: &str) -> Result<Place> {
		let id = non_empty_id(id)?;
		let mut cmd = redis::cmd("HGETALL");

		cmd.arg(self.key(id));

		let fields: FieldMap = self.query(cancel, &cmd).await?;

		codec::decode_place(&fields)
	}

	/// Removes a place; removing an unknown id succeeds.
	pub async fn delete(&self, cancel: &CancellationToken, id: &str) -> Result<()> {
		let id = non_empty_id(id)?;
		let mut cmd = redis::cmd("DEL");

		cmd.arg(self.key(id));

		self.query::<()>(cancel, &cmd).await
	}

	/// Nearest places to a point, closest first, by exact great-circle distance.
	///
	/// The index ranks candidates by L2 distance between unit-sphere embeddings. That picks the
	/// right neighborhood but can swap neighbors near the poles, across the antimeridian, or
	/// at equal-looking distances, so the order it returns is only a hint. Freshly upserted
	/// places may be missing until the index catches up.
	pub async fn search_nearest(
		&self,
		cancel: &CancellationToken,
		params: &SearchParams,
	) -> Result<Vec<SearchHit>> {
		let limit = effective_limit(params.limit);
		let vector = pack_f32_le(project(params.lat, params.lon));
		let expr = attach_knn(FilterExpr::categories(&params.category_ids), limit, VECTOR_FIELD);
		let mut cmd = redis::cmd("FT.SEARCH");

		cmd.arg(&self.index)
			.arg(expr.to_string())
			.arg("RETURN")
			.arg(SEARCH_RETURN_FIELDS.len())
			.arg(&SEARCH_RETURN_FIELDS[..])
			.arg("LIMIT")
			.arg(0)
			.arg(limit)
			.arg("PARAMS")
			.arg(2)
			.arg(VECTOR_PARAM)
			.arg(&vector[..])
			.arg("DIALECT")
			.arg(2);

		let reply: Value = self.query(cancel, &cmd).await?;
		let candidates = parse_search_reply(&self.key_prefix, &reply)?;

		tracing::debug!(
			index = %self.index,
			query = %expr,
			candidates = candidates.len(),
			"Nearest-place candidates fetched."
		);

		Ok(rank_by_distance(params.lat, params.lon, candidates, limit))
	}
}

/// Clamps a requested limit: values in `1..=MAX_SEARCH_LIMIT` pass, everything else is the
/// default.
pub fn effective_limit(limit: i64) -> usize {
	match usize::try_from(limit) {
		Ok(limit) if (1..=MAX_SEARCH_LIMIT).contains(&limit) => limit,
		_ => DEFAULT_SEARCH_LIMIT,
	}
}

/// Attaches exact distances, sorts ascending (stable, so store order breaks ties), truncates.
pub fn rank_by_distance(lat: f64, lon: f64, candidates: Vec<Place>, limit: usize) -> Vec<SearchHit> {
	let mut hits = candidates
		.into_iter()
		.map(|place| {
			let distance_m = haversine_m(lat, lon, place.lat, place.lon);

			SearchHit { place, distance_m }
		})
		.collect::<Vec<_>>();

	hits.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));
	hits.truncate(limit);

	hits
}

/// Decodes an `FT.SEARCH` reply: the total, then alternating keys and field lists.
pub fn parse_search_reply(key_prefix: &str, reply: &Value) -> Result<Vec<Place>> {
	let items: Vec<Value> = redis::from_redis_value(reply)
		.map_err(|err| Error::Decode(format!("search reply is not an array: {err}")))?;
	let Some((total, rows)) = items.split_first() else {
		return Ok(Vec::new());
	};
	let _total: i64 = redis::from_redis_value(total)
		.map_err(|err| Error::Decode(format!("search reply total is not an integer: {err}")))?;

	if rows.len() % 2 != 0 {
		return Err(Error::Decode("search reply has a key without fields.".to_string()));
	}

	let mut places = Vec::with_capacity(rows.len() / 2);

	for row in rows.chunks_exact(2) {
		let key: String = redis::from_redis_value(&row[0])
			.map_err(|err| Error::Decode(format!("search reply key is not a string: {err}")))?;
		let fields: FieldMap = redis::from_redis_value(&row[1]).map_err(|err| {
			Error::Decode(format!("search reply fields for {key} are malformed: {err}"))
		})?;
		let mut place = codec::decode_place(&fields)?;

		if place.id.is_empty()
			&& let Some(id) = id_from_key(key_prefix, &key)
		{
			place.id = id.to_string();
		}

		places.push(place);
	}

	Ok(places)
}

fn non_empty_id(id: &str) -> Result<&str> {
	if id.trim().is_empty() {
		return Err(Error::Validation("id must be non-empty.".to_string()));
	}

	Ok(id)
}
