pub mod geo;
pub mod place;

pub use geo::{EARTH_RADIUS_M, UnitVector, haversine_m, pack_f32_le, project};
pub use place::{BBox, Place, clean_category_ids, null_as_default};
