
use std::io::{self, Cursor, Error, ErrorKind, Read};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

fn err(msg:&str) -> io::Error { Error::new(ErrorKind::InvalidData, msg) }

// Number of zero bytes needed to bring n up to a multiple of four
fn padding(n:usize) -> usize { (4 - n % 4) % 4 }

#[derive(Debug, Default)]
pub struct Packer {
	buff: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct Unpacker {
	rdr: Cursor<Vec<u8>>,
}

impl Packer {

	pub fn new() -> Self { Self::default() }

	pub fn reset(&mut self) { self.buff.clear(); }

	pub fn as_bytes(&self) -> &[u8] { &self.buff }

	// Every primitive is a multiple of four bytes, so alignment is preserved as long as opaque data gets padded
	pub fn pack_u32(&mut self, x:u32) -> io::Result<()> { self.buff.write_u32::<BigEndian>(x) }
	pub fn pack_i32(&mut self, x:i32) -> io::Result<()> { self.buff.write_i32::<BigEndian>(x) }
	pub fn pack_bool(&mut self, b:bool) -> io::Result<()> { self.pack_i32(if b { 1 } else { 0 }) }
	pub fn pack_enum(&mut self, x:i32) -> io::Result<()> { self.pack_i32(x) }

	pub fn pack_variable_len_opaque(&mut self, data:&[u8]) -> io::Result<()> {
		let len:u32 = u32::try_from(data.len()).map_err(|_| err("Opaque data too long for XDR"))?;
		self.pack_u32(len)?;
		self.buff.extend_from_slice(data);
		self.buff.resize(self.buff.len() + padding(data.len()), 0);
		Ok(())
	}

	pub fn pack_string(&mut self, s:&str) -> io::Result<()> {
		if !s.is_ascii() { return Err(err("XDR strings must be ASCII")); }
		self.pack_variable_len_opaque(s.as_bytes())
	}

}

impl Unpacker {

	pub fn new() -> Self { Self::default() }

	pub fn reset(&mut self, data:&[u8]) {
		self.rdr = Cursor::new(data.to_vec());
	}

	pub fn remaining(&self) -> usize {
		self.rdr.get_ref().len().saturating_sub(self.rdr.position() as usize)
	}

	pub fn all_data_consumed(&self) -> bool { self.remaining() == 0 }

	pub fn remaining_bytes(&self) -> &[u8] {
		let pos = (self.rdr.position() as usize).min(self.rdr.get_ref().len());
		&self.rdr.get_ref()[pos..]
	}

	pub fn unpack_u32(&mut self) -> io::Result<u32> { self.rdr.read_u32::<BigEndian>() }
	pub fn unpack_i32(&mut self) -> io::Result<i32> { self.rdr.read_i32::<BigEndian>() }

	// Whether an enum value is in range depends on the program, so at this level it's just an i32
	pub fn unpack_enum(&mut self) -> io::Result<i32> { self.unpack_i32() }

	pub fn unpack_bool(&mut self) -> io::Result<bool> {
		match self.unpack_i32()? {
			0 => Ok(false),
			1 => Ok(true),
			x => Err(Error::new(ErrorKind::InvalidData, format!("Expected 0 or 1 for XDR bool but got {}", x))),
		}
	}

	pub fn unpack_variable_len_opaque(&mut self) -> io::Result<Vec<u8>> {
		let n:usize = self.unpack_u32()? as usize;
		if n + padding(n) > self.remaining() {
			return Err(Error::new(ErrorKind::UnexpectedEof, "Opaque length runs past the end of the buffer"));
		}

		let mut ans:Vec<u8> = vec![0; n];
		self.rdr.read_exact(&mut ans)?;

		let mut pad = [0u8; 3];
		self.rdr.read_exact(&mut pad[..padding(n)])?;
		Ok(ans)
	}

}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn opaque_is_padded_to_four_bytes() {
		let mut p = Packer::new();
		p.pack_variable_len_opaque(b"inst0").unwrap();
		assert_eq!(p.as_bytes(), &[0, 0, 0, 5, b'i', b'n', b's', b't', b'0', 0, 0, 0]);
	}

	#[test]
	fn unpacker_reads_back_mixed_fields() {
		let mut p = Packer::new();
		p.pack_i32(-7).unwrap();
		p.pack_bool(true).unwrap();
		p.pack_variable_len_opaque(b":WAV:DATA?").unwrap();
		p.pack_u32(42).unwrap();

		let mut u = Unpacker::new();
		u.reset(p.as_bytes());
		assert_eq!(u.unpack_i32().unwrap(), -7);
		assert!(u.unpack_bool().unwrap());
		assert_eq!(u.unpack_variable_len_opaque().unwrap(), b":WAV:DATA?".to_vec());
		assert_eq!(u.unpack_u32().unwrap(), 42);
		assert!(u.all_data_consumed());
	}

	#[test]
	fn truncated_opaque_is_an_error() {
		let mut u = Unpacker::new();
		u.reset(&[0, 0, 0, 9, 1, 2, 3]);
		assert_eq!(u.unpack_variable_len_opaque().unwrap_err().kind(), ErrorKind::UnexpectedEof);
	}

	#[test]
	fn bad_bool_is_an_error_not_a_panic() {
		let mut u = Unpacker::new();
		u.reset(&[0, 0, 0, 2]);
		assert!(u.unpack_bool().is_err());
	}
}
