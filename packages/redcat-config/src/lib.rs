mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, Service, Storage, Valkey};

use std::{fs, net::SocketAddr, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.service.http_bind.parse::<SocketAddr>().is_err() {
		return Err(Error::Validation {
			message: "service.http_bind must be a socket address such as 127.0.0.1:8080."
				.to_string(),
		});
	}

	let valkey = &cfg.storage.valkey;

	for (label, value) in [
		("storage.valkey.url", &valkey.url),
		("storage.valkey.index", &valkey.index),
		("storage.valkey.key_prefix", &valkey.key_prefix),
	] {
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	if !valkey.url.starts_with("redis://") && !valkey.url.starts_with("rediss://") {
		return Err(Error::Validation {
			message: "storage.valkey.url must use the redis:// or rediss:// scheme.".to_string(),
		});
	}
	if valkey.url.contains(',') {
		return Err(Error::Validation {
			message: "storage.valkey.url must name a single node; cluster seed lists are not supported."
				.to_string(),
		});
	}
	if valkey.command_timeout_ms == 0 {
		return Err(Error::Validation {
			message: "storage.valkey.command_timeout_ms must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	let valkey = &mut cfg.storage.valkey;

	if valkey.username.as_deref().map(|user| user.trim().is_empty()).unwrap_or(false) {
		valkey.username = None;
	}
	if valkey.password.as_deref().map(|pass| pass.is_empty()).unwrap_or(false) {
		valkey.password = None;
	}

	valkey.url = valkey.url.trim().to_string();
}
