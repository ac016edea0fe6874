//! Error type shared by every stage of a capture.
//!
//! The wire layers (`xdr`, `rpc`, `vxi11`) report `std::io::Error`; those are
//! folded into [`Error::Io`] at the transport seam. Everything above that
//! reports one of the typed variants so callers can tell a missing device from
//! a trigger that never fired or a transfer that came back short.

use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::acquisition::AcqState;

/// Convenience alias for results using the crate error type.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
	#[error("no instrument with model '{0}' was found")]
	DeviceNotFound(String),

	#[error("trigger did not report a stopped acquisition within {0:?}")]
	TriggerTimeout(Duration),

	#[error("invalid acquisition settings: {0}")]
	InvalidSettings(String),

	#[error("incomplete transfer: reassembled {received} of {declared} samples")]
	IncompleteTransfer{ declared: usize, received: usize },

	#[error("vertical scale must be positive, got {0} V/div")]
	ScaleMismatch(f64),

	#[error("failed to close instrument at {descriptor}: {source}")]
	CloseFailed{ descriptor: String, #[source] source: Box<Error> },

	#[error("{operation} is not allowed while the acquisition is {state:?}")]
	InvalidState{ operation: &'static str, state: AcqState },

	#[error("channel {channel} does not exist (instrument has {available})")]
	InvalidChannel{ channel: u8, available: u8 },

	#[error("malformed response to '{command}': {detail}")]
	MalformedResponse{ command: String, detail: String },

	#[error("configuration error: {0}")]
	Config(String),

	#[error("I/O error: {0}")]
	Io(#[from] io::Error),
}

impl Error {
	pub(crate) fn malformed(command:&str, detail:impl Into<String>) -> Self {
		Error::MalformedResponse{ command: command.to_owned(), detail: detail.into() }
	}
}

impl From<toml::de::Error> for Error {
	fn from(e:toml::de::Error) -> Self {
		Error::Config(e.to_string())
	}
}
