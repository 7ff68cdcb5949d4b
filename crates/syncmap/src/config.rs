//! Container configuration.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading a [`ContainerConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error parsing TOML syntax or field types.
	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),

	/// A field holds a value outside its allowed range.
	#[error("invalid value for `{field}`: {reason}")]
	Invalid {
		/// Offending field.
		field: &'static str,
		/// Why the value was refused.
		reason: &'static str,
	},
}

/// Tunables for one container.
///
/// ```toml
/// name = "sessions"
/// capacity = 1
/// shutdown_timeout_ms = 500
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContainerConfig {
	/// Name attached to the actor's log events.
	pub name: String,
	/// Per-channel request capacity. `1` keeps each send close to a
	/// rendezvous with the actor.
	pub capacity: usize,
	/// Budget used by [`SyncMap::shutdown_graceful_or_force`](crate::SyncMap::shutdown_graceful_or_force)
	/// when no explicit timeout is given.
	pub shutdown_timeout_ms: u64,
}

impl Default for ContainerConfig {
	fn default() -> Self {
		Self {
			name: "syncmap".to_string(),
			capacity: 1,
			shutdown_timeout_ms: 1000,
		}
	}
}

impl ContainerConfig {
	/// Parses and validates a config from TOML text.
	pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(text)?;
		config.validate()?;
		Ok(config)
	}

	/// Checks value ranges.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.capacity == 0 {
			return Err(ConfigError::Invalid {
				field: "capacity",
				reason: "must be greater than zero",
			});
		}
		Ok(())
	}

	/// Shutdown budget as a [`Duration`].
	pub fn shutdown_timeout(&self) -> Duration {
		Duration::from_millis(self.shutdown_timeout_ms)
	}
}
