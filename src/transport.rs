//! The request/response seam between the capture logic and an instrument.

use std::io;
use std::str;
use std::time::Duration;

use log::{debug, info};

use crate::error::{Error, Result};
use crate::vxi11::CoreClient;

/// A message-based connection to one instrument.
///
/// Commands are ASCII text. `query_bytes` returns the raw response so binary
/// blocks survive untouched; `query` is the text form with the trailing
/// terminator stripped. Closing is not part of this trait: a transport is
/// given back to the [`Connector`] that opened it.
pub trait Transport {
	fn write(&mut self, command:&str) -> Result<()>;

	fn query_bytes(&mut self, command:&str) -> Result<Vec<u8>>;

	fn query(&mut self, command:&str) -> Result<String> {
		let raw = self.query_bytes(command)?;
		str::from_utf8(&raw)
			.map(|s| s.trim_end().to_owned())
			.map_err(|_| Error::malformed(command, "response is not valid UTF-8"))
	}
}

/// Opens transports to instruments by descriptor and releases them again.
pub trait Connector {
	type Transport: Transport;

	fn connect(&self, descriptor:&str) -> Result<Self::Transport>;

	/// Consumes the transport, so a connection can only be released once.
	fn disconnect(&self, transport:Self::Transport) -> Result<()>;
}

/// A VXI-11 link to the `inst0` logical device of an instrument.
pub struct Vxi11Link {
	core: CoreClient,
}

impl Vxi11Link {

	pub fn open(host:&str, io_timeout:Duration) -> io::Result<Self> {
		let mut core = CoreClient::new(host, io_timeout)?;
		core.create_link("inst0")?;
		info!("Opened VXI-11 link to {}", host);
		Ok(Self{ core })
	}

	pub fn host(&self) -> &str { self.core.host() }

}

impl Transport for Vxi11Link {

	fn write(&mut self, command:&str) -> Result<()> {
		debug!("{} <- {}", self.core.host(), command);
		Ok(self.core.write(command.as_bytes())?)
	}

	fn query_bytes(&mut self, command:&str) -> Result<Vec<u8>> {
		debug!("{} <- {}", self.core.host(), command);
		let response = self.core.ask(command.as_bytes())?;
		debug!("{} -> {} bytes", self.core.host(), response.len());
		Ok(response)
	}

}

/// Connects over VXI-11, treating descriptors as host names or addresses.
#[derive(Debug, Clone)]
pub struct Vxi11Connector {
	pub io_timeout: Duration,
}

impl Default for Vxi11Connector {
	fn default() -> Self {
		Self{ io_timeout: Duration::from_millis(u64::from(crate::vxi11::DEFAULT_IO_TIMEOUT_MS)) }
	}
}

impl Connector for Vxi11Connector {
	type Transport = Vxi11Link;

	fn connect(&self, descriptor:&str) -> Result<Vxi11Link> {
		Ok(Vxi11Link::open(descriptor, self.io_timeout)?)
	}

	fn disconnect(&self, mut link:Vxi11Link) -> Result<()> {
		link.core.destroy_link()?;
		info!("Closed VXI-11 link to {}", link.core.host());
		Ok(())
	}
}
