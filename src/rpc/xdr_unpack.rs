
use std::io::{self, Error, ErrorKind};

use crate::xdr::Unpacker;
use crate::rpc::{REPLY, MSG_DENIED, RPC_MISMATCH, AUTH_ERROR, MSG_ACCEPTED, PROG_UNAVAIL, PROG_MISMATCH,
	PROC_UNAVAIL, GARBAGE_ARGS, SYSTEM_ERR, SUCCESS};

fn err(msg:String) -> io::Error { Error::new(ErrorKind::Other, msg) }

#[derive(Debug, PartialEq)]
pub struct Auth {
	pub flavor: i32,
	pub body: Vec<u8>,
}

pub fn unpack_auth(unpacker:&mut Unpacker) -> io::Result<Auth> {
	let flavor:i32   = unpacker.unpack_enum()?;
	let body:Vec<u8> = unpacker.unpack_variable_len_opaque()?;
	Ok(Auth{ flavor, body })
}

// Leaves the unpacker positioned at the start of the procedure's results
pub fn unpack_replyheader(unpacker:&mut Unpacker) -> io::Result<(u32, Auth)> {
	let xid:u32 = unpacker.unpack_u32()?;

	let mtype:i32 = unpacker.unpack_enum()?;
	if mtype != REPLY { return Err(err(format!("Expected REPLY message type but got {}", mtype))); }

	match unpacker.unpack_enum()? {
		MSG_DENIED => {
			return match unpacker.unpack_enum()? {
				RPC_MISMATCH => {
					let low:u32  = unpacker.unpack_u32()?;
					let high:u32 = unpacker.unpack_u32()?;
					Err(err(format!("Message denied, server supports RPC versions {} to {}", low, high)))
				},
				AUTH_ERROR => {
					let stat:u32 = unpacker.unpack_u32()?;
					Err(err(format!("Message denied due to AUTH_ERROR (auth_stat {})", stat)))
				},
				x => Err(err(format!("Message denied for an unknown reason ({})", x))),
			}
		},
		MSG_ACCEPTED => { },
		x => return Err(err(format!("Neither MSG_DENIED nor MSG_ACCEPTED in reply header ({})", x))),
	}

	let verf = unpack_auth(unpacker)?;

	match unpacker.unpack_enum()? {
		SUCCESS       => Ok((xid, verf)),
		PROG_UNAVAIL  => Err(err("Program unavailable".to_owned())),
		PROG_MISMATCH => {
			let low:u32  = unpacker.unpack_u32()?;
			let high:u32 = unpacker.unpack_u32()?;
			Err(err(format!("Program mismatch, server supports versions {} to {}", low, high)))
		},
		PROC_UNAVAIL  => Err(err("Procedure unavailable".to_owned())),
		GARBAGE_ARGS  => Err(err("Server could not decode the arguments".to_owned())),
		SYSTEM_ERR    => Err(err("Server system error".to_owned())),
		x             => Err(err(format!("Call failed for unknown reason ({})", x))),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::xdr::Packer;

	fn reply(xid:u32, accept:i32, stat:i32) -> Vec<u8> {
		let mut p = Packer::new();
		p.pack_u32(xid).unwrap();
		p.pack_enum(REPLY).unwrap();
		p.pack_enum(accept).unwrap();
		p.pack_enum(0).unwrap();
		p.pack_variable_len_opaque(&[]).unwrap();
		p.pack_enum(stat).unwrap();
		p.pack_u32(0xdead).unwrap();
		p.as_bytes().to_vec()
	}

	#[test]
	fn accepted_reply_leaves_results_unread() {
		let mut u = Unpacker::new();
		u.reset(&reply(17, MSG_ACCEPTED, SUCCESS));
		let (xid, verf) = unpack_replyheader(&mut u).unwrap();
		assert_eq!(xid, 17);
		assert_eq!(verf, Auth{ flavor: 0, body: vec![] });
		assert_eq!(u.unpack_u32().unwrap(), 0xdead);
	}

	#[test]
	fn garbage_args_is_reported() {
		let mut u = Unpacker::new();
		u.reset(&reply(3, MSG_ACCEPTED, GARBAGE_ARGS));
		let e = unpack_replyheader(&mut u).unwrap_err();
		assert!(e.to_string().contains("decode the arguments"));
	}
}
