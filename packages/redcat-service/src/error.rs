pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{field} is required.")]
	MissingField { field: String },
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Store unavailable: {message}")]
	StoreUnavailable { message: String },
	#[error("Decode error: {message}")]
	Decode { message: String },
	#[error("Request was cancelled.")]
	Cancelled,
}
impl From<redcat_storage::Error> for Error {
	fn from(err: redcat_storage::Error) -> Self {
		match err {
			redcat_storage::Error::Validation(message) => Self::InvalidRequest { message },
			redcat_storage::Error::Store(inner) =>
				Self::StoreUnavailable { message: inner.to_string() },
			err @ redcat_storage::Error::Timeout { .. } =>
				Self::StoreUnavailable { message: err.to_string() },
			redcat_storage::Error::Cancelled => Self::Cancelled,
			redcat_storage::Error::Decode(message) => Self::Decode { message },
		}
	}
}
