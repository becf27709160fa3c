use serde::{Deserialize, Deserializer, Serialize};

/// A geo-tagged point of interest.
///
/// Optional descriptive fields are plain strings where empty means absent, so a record read
/// back from the store with missing fields decodes without ceremony. `Default` is the
/// zero-valued place returned for ids that do not exist.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Place {
	#[serde(default, deserialize_with = "null_as_default")]
	pub id: String,
	#[serde(default, deserialize_with = "null_as_default")]
	pub name: String,
	#[serde(default, deserialize_with = "null_as_default")]
	pub lat: f64,
	#[serde(default, deserialize_with = "null_as_default")]
	pub lon: f64,
	#[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
	pub address: String,
	#[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
	pub locality: String,
	#[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
	pub region: String,
	#[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
	pub postcode: String,
	#[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
	pub admin_region: String,
	#[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
	pub post_town: String,
	#[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
	pub po_box: String,
	#[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
	pub country: String,
	#[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
	pub date_created: String,
	#[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
	pub date_refreshed: String,
	#[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
	pub date_closed: String,
	#[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
	pub tel: String,
	#[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
	pub website: String,
	#[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
	pub email: String,
	#[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
	pub facebook_id: String,
	#[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
	pub instagram: String,
	#[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
	pub twitter: String,
	#[serde(default, deserialize_with = "null_as_default")]
	pub category_ids: Vec<String>,
	#[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
	pub category_labels: Vec<String>,
	#[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
	pub placemaker_url: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub bbox: Option<BBox>,
	#[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
	pub dt: String,
}
impl Place {
	/// True for the zero-valued place a lookup of an unknown id yields.
	pub fn is_empty(&self) -> bool {
		self.id.is_empty()
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BBox {
	#[serde(default, deserialize_with = "null_as_default")]
	pub xmin: f64,
	#[serde(default, deserialize_with = "null_as_default")]
	pub ymin: f64,
	#[serde(default, deserialize_with = "null_as_default")]
	pub xmax: f64,
	#[serde(default, deserialize_with = "null_as_default")]
	pub ymax: f64,
}

/// Trims every id and drops the blank ones, keeping order and duplicates.
pub fn clean_category_ids<S>(ids: &[S]) -> Vec<String>
where
	S: AsRef<str>,
{
	ids.iter()
		.map(|id| id.as_ref().trim())
		.filter(|id| !id.is_empty())
		.map(str::to_string)
		.collect()
}

/// Reads an explicit JSON `null` as the zero value, the same as an absent field.
///
/// Pair with `#[serde(default)]` so missing and `null` decode alike.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
	D: Deserializer<'de>,
	T: Default + Deserialize<'de>,
{
	Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
