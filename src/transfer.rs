//! Chunked raw-memory transfer.
//!
//! One data query returns at most `chunk_cap` samples, so a capture of `N`
//! samples takes `ceil(N / chunk_cap)` queries. Before each one the
//! instrument's read window is moved to the next disjoint range of memory;
//! the segments are concatenated in request order.

use log::{debug, warn};

use crate::devices::ds1000z::CommandSet;
use crate::error::{Error, Result};
use crate::transport::Transport;

#[derive(Debug, Clone, PartialEq)]
pub struct RawTransfer {
	pub data: Vec<u8>,
	pub chunks: usize,
}

pub struct ChunkedTransfer<'a, T: Transport + ?Sized> {
	link: &'a mut T,
	commands: &'a CommandSet,
}

impl<'a, T: Transport + ?Sized> ChunkedTransfer<'a, T> {

	pub fn new(link:&'a mut T, commands:&'a CommandSet) -> Self {
		Self{ link, commands }
	}

	/// Fetches `declared_len` samples, `chunk_cap` at a time.
	///
	/// Fails with `IncompleteTransfer` as soon as a chunk comes back shorter
	/// than requested, and again if the reassembled length differs from
	/// `declared_len`.
	pub fn fetch(&mut self, declared_len:usize, chunk_cap:usize) -> Result<RawTransfer> {
		if chunk_cap == 0 {
			return Err(Error::InvalidSettings("chunk cap must be positive".to_owned()));
		}
		if declared_len == 0 {
			return Err(Error::InvalidSettings("nothing to transfer, declared length is zero".to_owned()));
		}

		let chunks:usize = declared_len.div_ceil(chunk_cap);
		let mut data:Vec<u8> = Vec::with_capacity(declared_len);

		for idx in 0..chunks {
			let done:usize  = idx * chunk_cap;
			let count:usize = chunk_cap.min(declared_len - done);
			let start:usize = self.commands.first_offset + done;

			// Move the read window before every query, including the first
			self.link.write(&CommandSet::for_offset(&self.commands.waveform_start, start))?;
			if let Some(stop) = &self.commands.waveform_stop {
				self.link.write(&CommandSet::for_offset(stop, start + count - 1))?;
			}

			let response:Vec<u8> = self.link.query_bytes(&self.commands.waveform_data)?;
			let payload:&[u8] = parse_block(&response, count).map_err(|detail| Error::malformed(&self.commands.waveform_data, detail))?;
			debug!("Chunk {}/{}: offset {} requested {} got {}", idx + 1, chunks, start, count, payload.len());

			if payload.len() > count {
				return Err(Error::malformed(&self.commands.waveform_data,
					format!("chunk {} carried {} samples but only {} were requested", idx + 1, payload.len(), count)));
			}

			data.extend_from_slice(payload);

			if payload.len() < count {
				warn!("Chunk {} came back short ({} of {} samples)", idx + 1, payload.len(), count);
				return Err(Error::IncompleteTransfer{ declared: declared_len, received: data.len() });
			}
		}

		if data.len() != declared_len {
			return Err(Error::IncompleteTransfer{ declared: declared_len, received: data.len() });
		}

		Ok(RawTransfer{ data, chunks })
	}

}

/// Extracts the payload of an IEEE 488.2 block, `#<n><n length digits><payload>`.
///
/// `#0` introduces an indefinite-length block that runs to the end of the
/// response. A byte sample can be 0x0A, so a trailing newline is only dropped
/// when the body holds more than the `requested` samples. A definite block
/// that is cut short yields whatever arrived.
pub fn parse_block(response:&[u8], requested:usize) -> std::result::Result<&[u8], String> {
	if response.first() != Some(&b'#') {
		return Err("block does not start with '#'".to_owned());
	}

	let n:usize = match response.get(1) {
		Some(d) if d.is_ascii_digit() => (d - b'0') as usize,
		_ => return Err("missing block length digit count".to_owned()),
	};

	if n == 0 {
		let body = &response[2..];
		return Ok(match body.strip_suffix(b"\n") {
			Some(trimmed) if body.len() > requested => trimmed,
			_ => body,
		});
	}

	let digits:&[u8] = response.get(2..2 + n).ok_or("block header is truncated")?;
	let len:usize = std::str::from_utf8(digits).ok()
		.filter(|s| s.bytes().all(|b| b.is_ascii_digit()))
		.and_then(|s| s.parse::<usize>().ok())
		.ok_or_else(|| format!("block length '{}' is not a number", String::from_utf8_lossy(digits)))?;

	let body = &response[2 + n..];
	Ok(&body[..len.min(body.len())])
}

/// Converts raw samples to volts by multiplying each one by `volts_per_unit`.
pub fn scale(raw:&[u8], volts_per_unit:f64) -> Result<Vec<f64>> {
	if !(volts_per_unit.is_finite() && volts_per_unit > 0.0) {
		return Err(Error::ScaleMismatch(volts_per_unit));
	}
	Ok(raw.iter().map(|&b| f64::from(b) * volts_per_unit).collect())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn definite_block() {
		assert_eq!(parse_block(b"#9000000004\x01\x02\x03\x04\n", 4).unwrap(), &[1, 2, 3, 4]);
		assert_eq!(parse_block(b"#14abcd", 4).unwrap(), b"abcd");
	}

	#[test]
	fn truncated_block_yields_what_arrived() {
		assert_eq!(parse_block(b"#9000000004\x01\x02", 4).unwrap(), &[1, 2]);
	}

	#[test]
	fn indefinite_block() {
		assert_eq!(parse_block(b"#0xyz\n", 3).unwrap(), b"xyz");
		assert_eq!(parse_block(b"#0xyz", 3).unwrap(), b"xyz");
	}

	#[test]
	fn indefinite_block_keeps_a_newline_sample() {
		assert_eq!(parse_block(b"#0\x05\x0a", 2).unwrap(), &[0x05, 0x0a]);
		assert_eq!(parse_block(b"#0\x05\x0a\n", 2).unwrap(), &[0x05, 0x0a]);
	}

	#[test]
	fn malformed_headers() {
		assert!(parse_block(b"", 4).is_err());
		assert!(parse_block(b"9000000004abcd", 4).is_err());
		assert!(parse_block(b"#x", 4).is_err());
		assert!(parse_block(b"#90000", 4).is_err());
		assert!(parse_block(b"#3a12xyz", 4).is_err());
	}

	#[test]
	fn scaling_is_linear() {
		let raw:Vec<u8> = (0..=255).collect();
		let a = scale(&raw, 0.04).unwrap();
		let b = scale(&raw, 0.08).unwrap();
		for (x, y) in a.iter().zip(&b) {
			assert!((y - 2.0 * x).abs() < 1e-12);
		}
	}

	#[test]
	fn non_positive_scale_is_rejected() {
		assert!(matches!(scale(&[1, 2], 0.0), Err(Error::ScaleMismatch(_))));
		assert!(matches!(scale(&[1, 2], -1.0), Err(Error::ScaleMismatch(_))));
		assert!(matches!(scale(&[1, 2], f64::NAN), Err(Error::ScaleMismatch(_))));
	}
}
