//! Foursquare open-places parquet rows.

use std::{fs::File, path::Path};

use parquet::{
	file::reader::{FileReader, SerializedFileReader},
	record::{Field, Row},
};

use crate::{Error, Result};
use redcat_domain::Place;

/// One source row, loosely typed: every column is optional and unknown columns are ignored.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SourceRecord {
	pub fsq_place_id: String,
	pub name: String,
	pub latitude: f64,
	pub longitude: f64,
	pub address: String,
	pub locality: String,
	pub region: String,
	pub postcode: String,
	pub admin_region: String,
	pub post_town: String,
	pub po_box: String,
	pub country: String,
	pub date_created: String,
	pub date_refreshed: String,
	pub date_closed: String,
	pub tel: String,
	pub website: String,
	pub email: String,
	pub facebook_id: Option<i64>,
	pub instagram: String,
	pub twitter: String,
	pub fsq_category_ids: Vec<String>,
	pub fsq_category_labels: Vec<String>,
	pub placemaker_url: String,
}
impl SourceRecord {
	pub fn from_row(row: &Row) -> Self {
		let mut record = Self::default();

		for (name, field) in row.get_column_iter() {
			match name.as_str() {
				"fsq_place_id" => record.fsq_place_id = text(field),
				"name" => record.name = text(field),
				"latitude" => record.latitude = number(field),
				"longitude" => record.longitude = number(field),
				"address" => record.address = text(field),
				"locality" => record.locality = text(field),
				"region" => record.region = text(field),
				"postcode" => record.postcode = text(field),
				"admin_region" => record.admin_region = text(field),
				"post_town" => record.post_town = text(field),
				"po_box" => record.po_box = text(field),
				"country" => record.country = text(field),
				"date_created" => record.date_created = text(field),
				"date_refreshed" => record.date_refreshed = text(field),
				"date_closed" => record.date_closed = text(field),
				"tel" => record.tel = text(field),
				"website" => record.website = text(field),
				"email" => record.email = text(field),
				"facebook_id" => record.facebook_id = integer(field),
				"instagram" => record.instagram = text(field),
				"twitter" => record.twitter = text(field),
				"fsq_category_ids" => record.fsq_category_ids = texts(field),
				"fsq_category_labels" => record.fsq_category_labels = texts(field),
				"placemaker_url" => record.placemaker_url = text(field),
				_ => {},
			}
		}

		record
	}

	/// The place to submit, or `None` for rows missing an id or a name.
	///
	/// `slim` keeps only what search needs: id, name, coordinates, categories and country.
	pub fn into_place(self, slim: bool) -> Option<Place> {
		if self.fsq_place_id.trim().is_empty() || self.name.trim().is_empty() {
			return None;
		}

		let place = Place {
			id: self.fsq_place_id,
			name: self.name,
			lat: self.latitude,
			lon: self.longitude,
			country: self.country,
			category_ids: self.fsq_category_ids,
			..Default::default()
		};

		if slim {
			return Some(place);
		}

		Some(Place {
			address: self.address,
			locality: self.locality,
			region: self.region,
			postcode: self.postcode,
			admin_region: self.admin_region,
			post_town: self.post_town,
			po_box: self.po_box,
			date_created: self.date_created,
			date_refreshed: self.date_refreshed,
			date_closed: self.date_closed,
			tel: self.tel,
			website: self.website,
			email: self.email,
			facebook_id: self
				.facebook_id
				.filter(|id| *id != 0)
				.map(|id| id.to_string())
				.unwrap_or_default(),
			instagram: self.instagram,
			twitter: self.twitter,
			category_labels: self.fsq_category_labels,
			placemaker_url: self.placemaker_url,
			..place
		})
	}
}

/// Row count from the file footer, without reading any data page.
pub fn row_count(path: &Path) -> Result<u64> {
	let reader = SerializedFileReader::new(open_file(path)?)?;

	Ok(reader.metadata().file_metadata().num_rows().max(0) as u64)
}

/// Opens a parquet file as a stream of decoded rows.
pub fn open(path: &Path) -> Result<Box<dyn Iterator<Item = Result<SourceRecord>>>> {
	let reader = SerializedFileReader::new(open_file(path)?)?;
	let rows = reader
		.into_iter()
		.map(|row| row.map(|row| SourceRecord::from_row(&row)).map_err(Error::from));

	Ok(Box::new(rows))
}

fn open_file(path: &Path) -> Result<File> {
	File::open(path).map_err(|source| Error::Open { path: path.display().to_string(), source })
}

fn text(field: &Field) -> String {
	match field {
		Field::Str(value) => value.clone(),
		Field::Bytes(bytes) => bytes.as_utf8().map(str::to_string).unwrap_or_default(),
		Field::Long(value) => value.to_string(),
		Field::Int(value) => value.to_string(),
		_ => String::new(),
	}
}

fn number(field: &Field) -> f64 {
	match field {
		Field::Double(value) => *value,
		Field::Float(value) => f64::from(*value),
		Field::Long(value) => *value as f64,
		Field::Int(value) => f64::from(*value),
		Field::Str(value) => value.trim().parse().unwrap_or_default(),
		_ => 0.0,
	}
}

fn integer(field: &Field) -> Option<i64> {
	match field {
		Field::Long(value) => Some(*value),
		Field::Int(value) => Some(i64::from(*value)),
		Field::Str(value) => value.trim().parse().ok(),
		_ => None,
	}
}

fn texts(field: &Field) -> Vec<String> {
	match field {
		Field::ListInternal(list) => list
			.elements()
			.iter()
			.map(text)
			.filter(|value| !value.is_empty())
			.collect(),
		Field::Null => Vec::new(),
		other => {
			let value = text(other);

			if value.is_empty() { Vec::new() } else { vec![value] }
		},
	}
}
