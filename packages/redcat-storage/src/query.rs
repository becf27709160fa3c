//! Search expressions as structured tokens.
//!
//! Nothing here clamps or validates; the string form produced by `Display` is the search
//! module's query dialect 2 and only matters at the protocol edge.

use std::fmt::{Display, Formatter, Result as FmtResult};

use redcat_domain::clean_category_ids;

use crate::schema::CATEGORY_FIELD;

/// Name of the query parameter the KNN clause binds its vector to.
pub const VECTOR_PARAM: &str = "vec";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FilterExpr {
	MatchAll,
	/// Matches records whose tag field holds any of `values`.
	AnyTag { field: String, values: Vec<String> },
}
impl FilterExpr {
	/// Category inclusion filter; blank ids are ignored and no ids at all means match-all.
	pub fn categories<S>(ids: &[S]) -> Self
	where
		S: AsRef<str>,
	{
		Self::any_tag(CATEGORY_FIELD, ids)
	}

	pub fn any_tag<S>(field: &str, ids: &[S]) -> Self
	where
		S: AsRef<str>,
	{
		let values = clean_category_ids(ids);

		if values.is_empty() {
			Self::MatchAll
		} else {
			Self::AnyTag { field: field.to_string(), values }
		}
	}

	pub fn is_match_all(&self) -> bool {
		matches!(self, Self::MatchAll)
	}
}
impl Display for FilterExpr {
	fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
		match self {
			Self::MatchAll => f.write_str("*"),
			Self::AnyTag { field, values } => {
				write!(f, "@{field}:{{")?;

				for (i, value) in values.iter().enumerate() {
					if i > 0 {
						f.write_str("|")?;
					}

					write_tag_escaped(f, value)?;
				}

				f.write_str("}")
			},
		}
	}
}

/// A filter combined with a request for the `k` nearest records on a vector field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchExpr {
	pub filter: FilterExpr,
	pub k: usize,
	pub vector_field: String,
}
impl Display for SearchExpr {
	fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
		write!(f, "{}=>[KNN {} @{} ${VECTOR_PARAM}]", self.filter, self.k, self.vector_field)
	}
}

pub fn attach_knn(filter: FilterExpr, k: usize, vector_field: &str) -> SearchExpr {
	SearchExpr { filter, k, vector_field: vector_field.to_string() }
}

fn write_tag_escaped(f: &mut Formatter<'_>, value: &str) -> FmtResult {
	for ch in value.chars() {
		if !(ch.is_alphanumeric() || ch == '_') {
			f.write_str("\\")?;
		}

		write!(f, "{ch}")?;
	}

	Ok(())
}
