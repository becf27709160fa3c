//! Geocentric unit-sphere embedding and great-circle distance.
//!
//! Euclidean distance between two embedded points grows monotonically with their great-circle
//! separation for anything well under a quarter turn of the globe, which lets an L2 vector
//! index stand in for a geographic one. The embedding treats the Earth as a perfect sphere,
//! so callers that need exact distances recompute them with [`haversine_m`].

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

pub type UnitVector = [f32; 3];

/// Maps latitude/longitude in degrees onto the unit sphere.
///
/// Inputs are not range checked. Out-of-range degrees still land on the sphere, just not
/// anywhere meaningful.
pub fn project(lat_deg: f64, lon_deg: f64) -> UnitVector {
	let lat = lat_deg.to_radians();
	let lon = lon_deg.to_radians();
	let (sin_lat, cos_lat) = lat.sin_cos();
	let (sin_lon, cos_lon) = lon.sin_cos();

	[(cos_lat * cos_lon) as f32, (cos_lat * sin_lon) as f32, sin_lat as f32]
}

/// Little-endian packed `f32` triple, the byte form vector fields are stored and bound as.
pub fn pack_f32_le(vec: UnitVector) -> [u8; 12] {
	let mut out = [0_u8; 12];

	for (chunk, value) in out.chunks_exact_mut(4).zip(vec) {
		chunk.copy_from_slice(&value.to_le_bytes());
	}

	out
}

/// Great-circle distance in meters between two latitude/longitude pairs in degrees.
pub fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
	let d_lat = (lat2 - lat1).to_radians();
	let d_lon = (lon2 - lon1).to_radians();
	let a = (d_lat / 2.0).sin().powi(2)
		+ lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

	// Rounding can push `a` a hair past 1 for antipodal points.
	2.0 * EARTH_RADIUS_M * a.sqrt().min(1.0).asin()
}
