
use std::io::{self, Error, ErrorKind};
use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

use log::debug;

use crate::xdr::{Packer, Unpacker};
use super::{initial_xid, xdr_pack, xdr_unpack};

const RECV_BUFF_SIZE:usize = 8192;

// Sends one RPC call to the broadcast address and collects every reply until the read timeout expires
pub struct BroadcastUdpClient {
	socket: UdpSocket,
	pub prog: u32,
	pub vers: u32,
	pub port: u16,
	pub lastxid: u32,
	pub packer: Packer,
	recv_buff: Vec<u8>,
}

impl BroadcastUdpClient {

	pub fn bind(port:u16, prog:u32, vers:u32, listen:Duration) -> io::Result<Self> {
		let socket = UdpSocket::bind("0.0.0.0:0")?;
		socket.set_read_timeout(Some(listen))?;
		socket.set_broadcast(true)?;

		Ok(Self{ socket, prog, vers, port, lastxid: initial_xid(), packer: Packer::new(), recv_buff: vec![0; RECV_BUFF_SIZE] })
	}

	pub fn start_call(&mut self, prc:u32) -> io::Result<()> {
		self.lastxid = self.lastxid.wrapping_add(1);
		self.packer.reset();
		xdr_pack::pack_callheader_no_auth(&mut self.packer, self.lastxid, self.prog, self.vers, prc)
	}

	// Returns the sender and the unread results of every reply carrying our xid
	pub fn do_call(&mut self) -> io::Result<Vec<(SocketAddr, Vec<u8>)>> {
		let call:&[u8] = self.packer.as_bytes();
		let n = self.socket.send_to(call, ("255.255.255.255", self.port))?;
		if n != call.len() {
			return Err(Error::new(ErrorKind::Other, "Sent the wrong number of bytes"));
		}

		let mut replies = vec![];
		let mut unpacker = Unpacker::new();
		loop {
			let (n, addr) = match self.socket.recv_from(&mut self.recv_buff) {
				Ok(x) => x,
				Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => break,
				Err(e) => return Err(e),
			};

			unpacker.reset(&self.recv_buff[..n]);
			match xdr_unpack::unpack_replyheader(&mut unpacker) {
				Ok((xid, _)) if xid == self.lastxid => replies.push((addr, unpacker.remaining_bytes().to_vec())),
				Ok(_)  => { },
				Err(e) => debug!("Ignoring malformed broadcast reply from {}: {}", addr, e),
			}
		}

		Ok(replies)
	}

}
