
// Device core
pub const DEVICE_CORE_PROG:u32  = 0x0607af;
pub const DEVICE_CORE_VERS:u32  = 1;
pub const CREATE_LINK:u32       = 10;
pub const DEVICE_WRITE:u32      = 11;
pub const DEVICE_READ:u32       = 12;
pub const DESTROY_LINK:u32      = 23;

pub const CLIENT_ID:i32 = 3333;
pub const DEFAULT_IO_TIMEOUT_MS:u32   = 10000;
pub const DEFAULT_LOCK_TIMEOUT_MS:u32 = 10000;

pub const OPERATION_FLAGS_END:i32 = 8;

// Reason bits in a device_read response
pub const REASON_REQCNT:i32 = 1;
pub const REASON_CHR:i32    = 2;
pub const REASON_END:i32    = 4;

use std::io::{self, Error, ErrorKind};
use std::time::Duration;

use log::{debug, warn};

use crate::rpc::port_mapping::{TcpPortMapperClient, Mapping, Protocol};
use crate::rpc::tcp_clients::TcpClient;

pub mod xdr_pack;

fn err(msg:&str) -> io::Error { Error::new(ErrorKind::Other, msg) }

// VXI-11 section B.5.3, device error codes
fn device_error(code:i32) -> io::Result<()> {
	let msg = match code {
		0  => return Ok(()),
		1  => "Syntax error",
		3  => "Device not accessible",
		4  => "Invalid link identifier",
		5  => "Parameter error",
		6  => "Channel not established",
		8  => "Operation not supported",
		9  => "Out of resources",
		11 => "Device locked by another link",
		12 => "No lock held by this link",
		15 => return Err(Error::new(ErrorKind::TimedOut, "I/O timeout")),
		17 => "I/O error",
		21 => "Invalid address",
		23 => "Abort",
		29 => "Channel already established",
		_  => "Unknown device error",
	};
	Err(Error::new(ErrorKind::Other, format!("{} (VXI-11 error {})", msg, code)))
}

#[derive(Debug, Clone, Copy)]
pub struct Link {
	pub link_id: i32,
	pub abort_port: u16,
	pub max_recv_size: u32,
}

pub struct CoreClient {
	client: TcpClient,
	host: String,
	opt_link: Option<Link>,
	io_timeout_ms: u32,
	lock_timeout_ms: u32,
}

impl CoreClient {

	pub fn new(host:&str, io_timeout:Duration) -> io::Result<Self> {
		// The socket waits a little longer than the instrument so the device gets to report its own timeout
		let socket_timeout = Some(io_timeout + Duration::from_secs(1));

		// Find the port to use for the core program
		let mut pmap_client = TcpPortMapperClient::new(host, socket_timeout)?;

		let mapping = Mapping {
			program: DEVICE_CORE_PROG,
			version: DEVICE_CORE_VERS,
			protocol: Protocol::TCP,
			port: 0,
		};

		let port = pmap_client.get_port(&mapping)?;
		debug!("{} serves the VXI-11 core channel on port {}", host, port);

		let client = TcpClient::connect((host, port), DEVICE_CORE_PROG, DEVICE_CORE_VERS, socket_timeout)?;
		let io_timeout_ms = u32::try_from(io_timeout.as_millis()).unwrap_or(u32::MAX);

		Ok(CoreClient{ client, host: host.to_owned(), opt_link: None, io_timeout_ms, lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS })
	}

	pub fn host(&self) -> &str { &self.host }

	pub fn link(&self) -> Option<Link> { self.opt_link }

	fn link_id(&self) -> io::Result<i32> {
		self.opt_link.map(|l| l.link_id).ok_or_else(|| err("No link"))
	}

	pub fn create_link(&mut self, device:&str) -> io::Result<()> {
		if self.opt_link.is_some() {
			return Err(err("Already connected to a link"));
		}

		self.client.start_call(CREATE_LINK)?;
		xdr_pack::pack_create_link_parms(&mut self.client.packer, CLIENT_ID, false, self.lock_timeout_ms, device)?;
		self.client.do_call()?;

		let error:i32         = self.client.unpacker.unpack_i32()?;
		let link_id:i32       = self.client.unpacker.unpack_i32()?;
		let abort_port:u32    = self.client.unpacker.unpack_u32()?;
		let max_recv_size:u32 = self.client.unpacker.unpack_u32()?;
		device_error(error)?;

		let abort_port = u16::try_from(abort_port).map_err(|_| err("Abort port out of range"))?;
		self.opt_link = Some(Link{ link_id, abort_port, max_recv_size });
		debug!("Created link {} to {} (max_recv_size {})", link_id, self.host, max_recv_size);
		Ok(())
	}

	pub fn ask(&mut self, data:&[u8]) -> io::Result<Vec<u8>> {
		self.write(data)?;
		self.read()
	}

	pub fn write(&mut self, data:&[u8]) -> io::Result<()> {
		let link = self.opt_link.ok_or_else(|| err("No link"))?;

		// Anything bigger than max_recv_size has to go out in pieces, with END only on the last one
		let max = (link.max_recv_size as usize).max(1);
		let mut chunks = data.chunks(max).peekable();
		if chunks.peek().is_none() { return Err(err("Refusing to send an empty message")); }

		while let Some(chunk) = chunks.next() {
			let flags = if chunks.peek().is_none() { OPERATION_FLAGS_END } else { 0 };

			self.client.start_call(DEVICE_WRITE)?;
			xdr_pack::pack_device_write_parms(&mut self.client.packer, link.link_id, self.io_timeout_ms, self.lock_timeout_ms, flags, chunk)?;
			self.client.do_call()?;

			let error:i32 = self.client.unpacker.unpack_i32()?;
			let size:u32  = self.client.unpacker.unpack_u32()?;
			device_error(error)?;

			if size as usize != chunk.len() {
				return Err(err("Number of bytes in confirmation doesn't match number of bytes sent"));
			}
		}

		Ok(())
	}

	// Keeps issuing device_read until the instrument flags the end of its message
	pub fn read(&mut self) -> io::Result<Vec<u8>> {
		let link_id:i32 = self.link_id()?;
		let mut ans:Vec<u8> = vec![];

		loop {
			self.client.start_call(DEVICE_READ)?;
			xdr_pack::pack_device_read_parms(&mut self.client.packer, link_id, u32::MAX, self.io_timeout_ms, self.lock_timeout_ms, 0, 0)?;
			self.client.do_call()?;

			let error:i32  = self.client.unpacker.unpack_i32()?;
			let reason:i32 = self.client.unpacker.unpack_i32()?;
			let mut data:Vec<u8> = self.client.unpacker.unpack_variable_len_opaque()?;
			device_error(error)?;

			ans.append(&mut data);

			if reason & REASON_END != 0 { return Ok(ans); }
			if reason & (REASON_REQCNT | REASON_CHR) == 0 {
				return Err(err("Expected one of three reason bits to be set"));
			}
		}
	}

	pub fn destroy_link(&mut self) -> io::Result<()> {
		let link_id:i32 = self.link_id().map_err(|_| err("No link to destroy"))?;

		self.client.start_call(DESTROY_LINK)?;
		self.client.packer.pack_i32(link_id)?;

		// Whatever the instrument says, this link is gone as far as we're concerned
		self.opt_link = None;
		self.client.do_call()?;

		device_error(self.client.unpacker.unpack_i32()?)
	}

}

impl Drop for CoreClient {

	fn drop(&mut self) {
		if self.opt_link.is_some() {
			if let Err(e) = self.destroy_link() {
				warn!("Unable to destroy link to {}: {}", self.host, e);
			}
		}
	}

}
