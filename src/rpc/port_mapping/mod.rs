
pub const PMAP_PROG:u32 = 100000;
pub const PMAP_VERS:u32 = 2;
pub const PMAP_PORT:u16 = 111;

pub const PMAPPROC_GETPORT:u32 = 3;     // (mapping) -> unsigned int

use std::io::{self, Error, ErrorKind};
use std::net::IpAddr;
use std::time::Duration;

use crate::xdr::Unpacker;

use super::{IPPROTO_TCP, IPPROTO_UDP};
use super::xdr_pack;
use super::tcp_clients::TcpClient;
use super::udp_clients::BroadcastUdpClient;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Protocol {
	TCP,
	UDP,
}

impl Protocol {
	pub fn to_u32(self) -> u32 { match self {
		Protocol::TCP => IPPROTO_TCP,
		Protocol::UDP => IPPROTO_UDP,
	}}
}

#[derive(Debug, Clone, Copy)]
pub struct Mapping {
	pub program: u32,
	pub version: u32,
	pub protocol: Protocol,
	pub port: u32,				// XDR encodes ports as u32
}

fn unpack_port(unpacker:&mut Unpacker) -> io::Result<u16> {
	let port:u32 = unpacker.unpack_u32()?;
	if port == 0 {
		return Err(Error::new(ErrorKind::NotFound, "Program is not registered with the port mapper"));
	}
	u16::try_from(port).map_err(|_| Error::new(ErrorKind::InvalidData, "Port mapper returned a port out of range"))
}

pub struct TcpPortMapperClient {
	client: TcpClient,
}

impl TcpPortMapperClient {

	pub fn new(host:&str, timeout:Option<Duration>) -> io::Result<Self> {
		Ok(Self{ client: TcpClient::connect((host, PMAP_PORT), PMAP_PROG, PMAP_VERS, timeout)? })
	}

	pub fn get_port(&mut self, m:&Mapping) -> io::Result<u16> {
		self.client.start_call(PMAPPROC_GETPORT)?;
		xdr_pack::pack_mapping(&mut self.client.packer, m.program, m.version, m.protocol.to_u32(), m.port)?;
		self.client.do_call()?;

		let port = unpack_port(&mut self.client.unpacker)?;

		if self.client.unpacker.all_data_consumed() { Ok(port) }
		else { Err(Error::new(ErrorKind::InvalidData, "Data unexpectedly left over in unpacker after unpacking port")) }
	}

}

// Asks every port mapper on the local network where the given program lives
pub fn broadcast_get_port(m:&Mapping, listen:Duration) -> io::Result<Vec<(IpAddr, u16)>> {
	let mut client = BroadcastUdpClient::bind(PMAP_PORT, PMAP_PROG, PMAP_VERS, listen)?;
	client.start_call(PMAPPROC_GETPORT)?;
	xdr_pack::pack_mapping(&mut client.packer, m.program, m.version, m.protocol.to_u32(), m.port)?;

	let mut ans = vec![];
	let mut unpacker = Unpacker::new();
	for (addr, results) in client.do_call()? {
		unpacker.reset(&results);
		if let Ok(port) = unpack_port(&mut unpacker) {
			if !ans.iter().any(|(ip, _)| *ip == addr.ip()) {
				ans.push((addr.ip(), port));
			}
		}
	}

	Ok(ans)
}
