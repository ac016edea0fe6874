
use std::io::{self, Read, Write, Error, ErrorKind};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use byteorder::{BigEndian, WriteBytesExt, ReadBytesExt};
use log::trace;

use crate::xdr::{Packer, Unpacker};
use super::{initial_xid, xdr_pack, xdr_unpack};

const LAST_FRAGMENT:u32 = 0x8000_0000;

// RPC over TCP with record marking (RFC 5531 section 11)
pub struct TcpClient {
	stream: TcpStream,
	pub prog: u32,
	pub vers: u32,
	pub lastxid: u32,
	pub packer: Packer,
	pub unpacker: Unpacker,
}

impl TcpClient {

	pub fn connect<A: ToSocketAddrs>(addr: A, prog: u32, vers: u32, timeout: Option<Duration>) -> io::Result<Self> {
		let stream = TcpStream::connect(addr)?;
		stream.set_read_timeout(timeout)?;
		stream.set_write_timeout(timeout)?;
		stream.set_nodelay(true)?;
		Ok(Self{ stream, prog, vers, lastxid: initial_xid(), packer: Packer::new(), unpacker: Unpacker::new() })
	}

	// Starts a new call; arguments get packed into self.packer before calling do_call
	pub fn start_call(&mut self, prc:u32) -> io::Result<()> {
		self.lastxid = self.lastxid.wrapping_add(1);
		self.packer.reset();
		xdr_pack::pack_callheader_no_auth(&mut self.packer, self.lastxid, self.prog, self.vers, prc)
	}

	// Sends the packed call and leaves the results of the matching reply in self.unpacker
	pub fn do_call(&mut self) -> io::Result<()> {
		let call:&[u8] = self.packer.as_bytes();
		let len:u32 = u32::try_from(call.len()).map_err(|_| Error::new(ErrorKind::InvalidInput, "RPC call too large"))?;

		let mut send_bytes:Vec<u8> = Vec::with_capacity(call.len() + 4);
		send_bytes.write_u32::<BigEndian>(len | LAST_FRAGMENT)?;
		send_bytes.extend_from_slice(call);
		self.stream.write_all(&send_bytes)?;

		loop {
			let reply:Vec<u8> = self.read_record()?;
			self.unpacker.reset(&reply);

			let (xid, _) = xdr_unpack::unpack_replyheader(&mut self.unpacker)?;
			if xid == self.lastxid {
				return Ok(());
			} else {
				// A late reply to an earlier call, most likely one that timed out
				trace!("Discarding RPC reply with stale xid {} (expecting {})", xid, self.lastxid);
			}
		}
	}

	fn read_record(&mut self) -> io::Result<Vec<u8>> {
		let mut record:Vec<u8> = vec![];

		let mut last:bool = false;
		while !last {
			let marker:u32 = self.stream.read_u32::<BigEndian>()?;
			last = (marker & LAST_FRAGMENT) != 0;
			let n:usize = (marker & !LAST_FRAGMENT) as usize;

			let start = record.len();
			record.resize(start + n, 0);
			self.stream.read_exact(&mut record[start..])?;
		}

		Ok(record)
	}

}
