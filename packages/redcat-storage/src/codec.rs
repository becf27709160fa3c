//! Place ⇄ hash field mapping.

use std::collections::HashMap;

use redcat_domain::{BBox, Place, clean_category_ids, pack_f32_le, project};

use crate::{
	Error, Result,
	schema::{CATEGORY_FIELD, COUNTRY_FIELD, LAT_FIELD, LON_FIELD, VECTOR_FIELD},
};

pub type FieldMap = HashMap<String, Vec<u8>>;

const CATEGORY_LABELS_FIELD: &str = "category_labels";
const BBOX_FIELDS: [&str; 4] = ["bbox_xmin", "bbox_ymin", "bbox_xmax", "bbox_ymax"];

/// Every field of the hash, absent values included as empty strings.
///
/// Writing the complete set each time is what makes an upsert a full replacement: `HSET` never
/// removes fields, so an omitted one would survive from an earlier write.
pub fn encode_place(place: &Place) -> Result<Vec<(&'static str, Vec<u8>)>> {
	let labels = if place.category_labels.is_empty() {
		String::new()
	} else {
		serde_json::to_string(&place.category_labels).map_err(|err| {
			Error::Validation(format!("category_labels cannot be encoded: {err}"))
		})?
	};
	let bbox = match place.bbox {
		Some(b) => [b.xmin, b.ymin, b.xmax, b.ymax].map(|v| v.to_string()),
		None => Default::default(),
	};
	let text = |value: &str| value.as_bytes().to_vec();
	let mut fields = vec![
		("id", text(&place.id)),
		("name", text(&place.name)),
		(LAT_FIELD, place.lat.to_string().into_bytes()),
		(LON_FIELD, place.lon.to_string().into_bytes()),
		("address", text(&place.address)),
		("locality", text(&place.locality)),
		("region", text(&place.region)),
		("postcode", text(&place.postcode)),
		("admin_region", text(&place.admin_region)),
		("post_town", text(&place.post_town)),
		("po_box", text(&place.po_box)),
		(COUNTRY_FIELD, text(&place.country)),
		("date_created", text(&place.date_created)),
		("date_refreshed", text(&place.date_refreshed)),
		("date_closed", text(&place.date_closed)),
		("tel", text(&place.tel)),
		("website", text(&place.website)),
		("email", text(&place.email)),
		("facebook_id", text(&place.facebook_id)),
		("instagram", text(&place.instagram)),
		("twitter", text(&place.twitter)),
		(CATEGORY_FIELD, clean_category_ids(&place.category_ids).join(",").into_bytes()),
		(CATEGORY_LABELS_FIELD, labels.into_bytes()),
		("placemaker_url", text(&place.placemaker_url)),
		("dt", text(&place.dt)),
	];

	for (name, value) in BBOX_FIELDS.into_iter().zip(bbox) {
		fields.push((name, value.into_bytes()));
	}

	fields.push((VECTOR_FIELD, pack_f32_le(project(place.lat, place.lon)).to_vec()));

	Ok(fields)
}

/// Rebuilds a place from whatever subset of fields the store returned.
///
/// Missing fields read as empty; only values that are present but unparsable are errors.
pub fn decode_place(fields: &FieldMap) -> Result<Place> {
	let text = |name: &str| {
		fields.get(name).map(|raw| String::from_utf8_lossy(raw).into_owned()).unwrap_or_default()
	};
	let categories = text(CATEGORY_FIELD);
	let labels = text(CATEGORY_LABELS_FIELD);

	Ok(Place {
		id: text("id"),
		name: text("name"),
		lat: parse_f64(LAT_FIELD, &text(LAT_FIELD))?,
		lon: parse_f64(LON_FIELD, &text(LON_FIELD))?,
		address: text("address"),
		locality: text("locality"),
		region: text("region"),
		postcode: text("postcode"),
		admin_region: text("admin_region"),
		post_town: text("post_town"),
		po_box: text("po_box"),
		country: text(COUNTRY_FIELD),
		date_created: text("date_created"),
		date_refreshed: text("date_refreshed"),
		date_closed: text("date_closed"),
		tel: text("tel"),
		website: text("website"),
		email: text("email"),
		facebook_id: text("facebook_id"),
		instagram: text("instagram"),
		twitter: text("twitter"),
		category_ids: split_categories(&categories),
		category_labels: if labels.trim().is_empty() {
			Vec::new()
		} else {
			serde_json::from_str(&labels).map_err(|err| {
				Error::Decode(format!("{CATEGORY_LABELS_FIELD} is not a JSON string array: {err}"))
			})?
		},
		placemaker_url: text("placemaker_url"),
		bbox: decode_bbox(&BBOX_FIELDS.map(text))?,
		dt: text("dt"),
	})
}

/// Comma-split of a stored category list; an empty string is an empty list, not `[""]`.
pub fn split_categories(raw: &str) -> Vec<String> {
	let raw = raw.trim();

	if raw.is_empty() {
		return Vec::new();
	}

	raw.split(',').map(str::to_string).collect()
}

fn decode_bbox(raw: &[String; 4]) -> Result<Option<BBox>> {
	if raw.iter().all(|value| value.trim().is_empty()) {
		return Ok(None);
	}

	let [xmin, ymin, xmax, ymax] = [
		parse_f64(BBOX_FIELDS[0], &raw[0])?,
		parse_f64(BBOX_FIELDS[1], &raw[1])?,
		parse_f64(BBOX_FIELDS[2], &raw[2])?,
		parse_f64(BBOX_FIELDS[3], &raw[3])?,
	];

	Ok(Some(BBox { xmin, ymin, xmax, ymax }))
}

fn parse_f64(field: &str, raw: &str) -> Result<f64> {
	let raw = raw.trim();

	if raw.is_empty() {
		return Ok(0.0);
	}

	raw.parse().map_err(|_| Error::Decode(format!("{field} is not a number: {raw:?}")))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn to_map(fields: Vec<(&'static str, Vec<u8>)>) -> FieldMap {
		fields.into_iter().map(|(name, value)| (name.to_string(), value)).collect()
	}

	fn sample() -> Place {
		Place {
			id: "fsq-1".to_string(),
			name: "Kafeneio".to_string(),
			lat: 35.170_012_345,
			lon: 33.360_098_765,
			locality: "Nicosia".to_string(),
			country: "CY".to_string(),
			date_created: "2014-06-01".to_string(),
			category_ids: vec!["a".to_string(), " ".to_string(), "b".to_string()],
			category_labels: vec!["Dining and Drinking > Cafe, Coffee, and Tea House".to_string()],
			bbox: Some(BBox { xmin: 33.3, ymin: 35.1, xmax: 33.4, ymax: 35.2 }),
			..Default::default()
		}
	}

	#[test]
	fn encodes_every_field_and_the_vector() {
		let fields = encode_place(&sample()).expect("Failed to encode place.");
		let map = to_map(fields.clone());

		assert_eq!(map.len(), fields.len(), "field names must be unique");
		assert_eq!(map["category_ids"], b"a,b");
		assert_eq!(map["address"], b"");
		assert_eq!(map["bbox_xmax"], b"33.4");
		assert_eq!(map["location"], pack_f32_le(project(35.170_012_345, 33.360_098_765)));
	}

	#[test]
	fn round_trips_through_fields() {
		let place = sample();
		let decoded =
			decode_place(&to_map(encode_place(&place).expect("Failed to encode place.")))
				.expect("Failed to decode place.");

		assert_eq!(decoded.category_ids, vec!["a", "b"]);
		assert_eq!(decoded.lat, place.lat);
		assert_eq!(decoded.lon, place.lon);
		assert_eq!(Place { category_ids: place.category_ids.clone(), ..decoded }, place);
	}

	#[test]
	fn empty_categories_round_trip_to_empty() {
		let place = Place { id: "x".to_string(), name: "X".to_string(), ..Default::default() };
		let decoded =
			decode_place(&to_map(encode_place(&place).expect("Failed to encode place.")))
				.expect("Failed to decode place.");

		assert!(decoded.category_ids.is_empty());
		assert!(decoded.category_labels.is_empty());
		assert!(decoded.bbox.is_none());
		assert_eq!(decoded, place);
	}

	#[test]
	fn missing_record_decodes_to_zero_value() {
		assert_eq!(decode_place(&FieldMap::new()).expect("Failed to decode."), Place::default());
	}

	#[test]
	fn unparsable_coordinates_are_decode_errors() {
		let mut map = FieldMap::new();

		map.insert("lat".to_string(), b"north".to_vec());

		assert!(matches!(decode_place(&map), Err(Error::Decode(_))));
	}

	#[test]
	fn splits_stored_categories() {
		assert!(split_categories("").is_empty());
		assert!(split_categories("  ").is_empty());
		assert_eq!(split_categories("a,b"), vec!["a", "b"]);
	}
}
