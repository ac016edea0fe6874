
// Instrument models whose command sets are known.  Currently only the Rigol DS1000Z series; other
// models can be described with a CommandSet loaded from configuration.

pub mod ds1000z;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::error::{Error, Result};

lazy_static! {
	static ref IDN_RE: Regex = Regex::new(r"^\s*([^,]+),([^,]+),([^,]*),([^,\s]+)\s*$").unwrap();
}

pub const IDN_QUERY:&str = "*IDN?";

// Response to *IDN?, which every IEEE 488.2 instrument has to answer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identity {
	pub manufacturer: String,
	pub model: String,
	pub serial_num: String,
	pub fw_version: String,
}

impl Identity {

	pub fn parse(response:&str) -> Result<Self> {
		let caps = IDN_RE.captures(response).ok_or_else(|| Error::malformed(IDN_QUERY, format!("unexpected identity '{}'", response.trim())))?;
		let field = |i:usize| caps.get(i).map(|m| m.as_str().trim().to_owned()).unwrap_or_default();

		Ok(Self{ manufacturer: field(1), model: field(2), serial_num: field(3), fw_version: field(4) })
	}

}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_rigol_identity() {
		let idn = Identity::parse("RIGOL TECHNOLOGIES,DS1054Z,DS1ZA170000000,00.04.04.SP3\n").unwrap();
		assert_eq!(idn.manufacturer, "RIGOL TECHNOLOGIES");
		assert_eq!(idn.model, "DS1054Z");
		assert_eq!(idn.serial_num, "DS1ZA170000000");
		assert_eq!(idn.fw_version, "00.04.04.SP3");
	}

	#[test]
	fn rejects_garbage() {
		assert!(matches!(Identity::parse("hello"), Err(Error::MalformedResponse{ .. })));
	}
}
