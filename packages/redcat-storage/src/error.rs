#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid argument: {0}")]
	Validation(String),
	#[error(transparent)]
	Store(#[from] redis::RedisError),
	#[error("Store command timed out after {timeout_ms} ms.")]
	Timeout { timeout_ms: u64 },
	#[error("Store command was cancelled.")]
	Cancelled,
	#[error("Malformed store reply: {0}")]
	Decode(String),
}
