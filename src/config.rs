//! Capture configuration, read from an optional TOML file.
//!
//! ```toml
//! model = "DS1054Z"
//! channel = 1
//! hosts = ["192.168.1.101"]
//! trigger_timeout_ms = 5000
//!
//! [commands]
//! chunk_cap = 125000
//! ```
//!
//! Every field has a default, including the whole `[commands]` table.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::acquisition::{AcquisitionOptions, DEFAULT_POLL_INTERVAL, DEFAULT_TRIGGER_TIMEOUT};
use crate::devices::ds1000z::CommandSet;
use crate::error::{Error, Result};
use crate::vxi11::DEFAULT_IO_TIMEOUT_MS;

pub const DEFAULT_MODEL:&str = "DS1054Z";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
	pub model: String,
	pub channel: u8,
	pub hosts: Vec<String>,
	pub discover: bool,
	pub discovery_listen_ms: u64,
	pub trigger_timeout_ms: u64,
	pub poll_interval_ms: u64,
	pub io_timeout_ms: u64,
	pub commands: CommandSet,
}

impl Default for Config {
	fn default() -> Self {
		Self{
			model: DEFAULT_MODEL.to_owned(),
			channel: 1,
			hosts: vec![],
			discover: false,
			discovery_listen_ms: 2000,
			trigger_timeout_ms: DEFAULT_TRIGGER_TIMEOUT.as_millis() as u64,
			poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
			io_timeout_ms: u64::from(DEFAULT_IO_TIMEOUT_MS),
			commands: CommandSet::default(),
		}
	}
}

impl Config {

	pub fn from_file(path:&Path) -> Result<Self> {
		let text = fs::read_to_string(path).map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
		Self::from_toml_str(&text)
	}

	pub fn from_toml_str(text:&str) -> Result<Self> {
		let config:Config = toml::from_str(text)?;
		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> Result<()> {
		if self.commands.channels == 0 {
			return Err(Error::Config("commands.channels must be at least 1".to_owned()));
		}
		if self.channel == 0 || self.channel > self.commands.channels {
			return Err(Error::Config(format!("channel {} is outside 1..={}", self.channel, self.commands.channels)));
		}
		if self.commands.chunk_cap == 0 {
			return Err(Error::Config("commands.chunk_cap must be positive".to_owned()));
		}
		if self.poll_interval_ms == 0 {
			return Err(Error::Config("poll_interval_ms must be positive".to_owned()));
		}
		Ok(())
	}

	pub fn acquisition_options(&self) -> AcquisitionOptions {
		AcquisitionOptions{
			trigger_timeout: Duration::from_millis(self.trigger_timeout_ms),
			poll_interval: Duration::from_millis(self.poll_interval_ms),
		}
	}

	pub fn io_timeout(&self) -> Duration { Duration::from_millis(self.io_timeout_ms) }

	pub fn discovery_listen(&self) -> Duration { Duration::from_millis(self.discovery_listen_ms) }

}
