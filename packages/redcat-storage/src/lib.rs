pub mod codec;
pub mod places;
pub mod query;
pub mod schema;
pub mod valkey;

mod error;

pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;
