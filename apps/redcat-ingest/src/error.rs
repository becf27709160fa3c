pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Failed to open {path}: {source}")]
	Open { path: String, source: std::io::Error },
	#[error(transparent)]
	Parquet(#[from] parquet::errors::ParquetError),
	#[error(transparent)]
	Http(#[from] reqwest::Error),
	#[error("Place API answered with status {status}.")]
	Status { status: u16 },
}
