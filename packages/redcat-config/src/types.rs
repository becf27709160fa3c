use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub valkey: Valkey,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Valkey {
	/// `redis://` or `rediss://` URL of a node with the search module loaded.
	pub url: String,
	pub username: Option<String>,
	pub password: Option<String>,
	#[serde(default = "default_index")]
	pub index: String,
	/// Every place hash lives under this prefix; the index covers exactly this prefix.
	#[serde(default = "default_key_prefix")]
	pub key_prefix: String,
	#[serde(default = "default_command_timeout_ms")]
	pub command_timeout_ms: u64,
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_index() -> String {
	"index_places".to_string()
}

fn default_key_prefix() -> String {
	"places:".to_string()
}

fn default_command_timeout_ms() -> u64 {
	5_000
}
