
use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};

// Upper bounds (inclusive for ns, exclusive for the rest) on the sample period for each display unit
pub const NS_MAX_PERIOD:f64 = 1e-9;
pub const US_MAX_PERIOD:f64 = 1e-7;
pub const MS_MAX_PERIOD:f64 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TimeUnit {
	#[serde(rename = "ns")] Nanoseconds,
	#[serde(rename = "us")] Microseconds,
	#[serde(rename = "ms")] Milliseconds,
	#[serde(rename = "s")]  Seconds,
}

impl TimeUnit {

	pub fn for_period(period_s:f64) -> Self {
		if period_s <= NS_MAX_PERIOD     { TimeUnit::Nanoseconds  }
		else if period_s < US_MAX_PERIOD { TimeUnit::Microseconds }
		else if period_s < MS_MAX_PERIOD { TimeUnit::Milliseconds }
		else                             { TimeUnit::Seconds      }
	}

	pub fn symbol(self) -> &'static str { match self {
		TimeUnit::Nanoseconds  => "ns",
		TimeUnit::Microseconds => "us",
		TimeUnit::Milliseconds => "ms",
		TimeUnit::Seconds      => "s",
	}}

	// Multiply a value in seconds by this to express it in this unit
	pub fn per_second(self) -> f64 { match self {
		TimeUnit::Nanoseconds  => 1e9,
		TimeUnit::Microseconds => 1e6,
		TimeUnit::Milliseconds => 1e3,
		TimeUnit::Seconds      => 1.0,
	}}

}

impl fmt::Display for TimeUnit {
	fn fmt(&self, f:&mut fmt::Formatter) -> fmt::Result { f.write_str(self.symbol()) }
}

/// Snapshot of the instrument's acquisition parameters, taken once per capture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AcquisitionSettings {
	memory_depth: usize,
	sample_rate: f64,
	vertical_scale: f64,
}

impl AcquisitionSettings {

	/// Fails with `InvalidSettings` unless both memory depth and sample rate are positive.
	pub fn new(memory_depth:usize, sample_rate:f64, vertical_scale:f64) -> Result<Self> {
		if memory_depth == 0 {
			return Err(Error::InvalidSettings("memory depth must be positive".to_owned()));
		}
		if !(sample_rate.is_finite() && sample_rate > 0.0) {
			return Err(Error::InvalidSettings(format!("sample rate must be positive, got {}", sample_rate)));
		}
		if !vertical_scale.is_finite() {
			return Err(Error::InvalidSettings(format!("vertical scale must be finite, got {}", vertical_scale)));
		}

		Ok(Self{ memory_depth, sample_rate, vertical_scale })
	}

	/// Builds settings from the instrument's text responses.
	pub fn parse(memory_depth:&str, sample_rate:&str, vertical_scale:&str) -> Result<Self> {
		let depth = parse_memory_depth(memory_depth)?;
		let rate  = parse_number("sample rate", sample_rate)?;
		let scale = parse_number("vertical scale", vertical_scale)?;
		Self::new(depth, rate, scale)
	}

	pub fn memory_depth(&self) -> usize { self.memory_depth }
	pub fn sample_rate(&self) -> f64 { self.sample_rate }
	pub fn vertical_scale(&self) -> f64 { self.vertical_scale }

	pub fn capture_duration(&self) -> f64 { self.memory_depth as f64 / self.sample_rate }
	pub fn sample_period(&self) -> f64 { 1.0 / self.sample_rate }
	pub fn time_unit(&self) -> TimeUnit { TimeUnit::for_period(self.sample_period()) }

}

impl fmt::Display for AcquisitionSettings {
	fn fmt(&self, f:&mut fmt::Formatter) -> fmt::Result {
		write!(f, "memory depth {} pts, sample rate {:e} Sa/s, capture {:e} s, period {:e} s, scale {} V/div",
			self.memory_depth, self.sample_rate, self.capture_duration(), self.sample_period(), self.vertical_scale)
	}
}

fn parse_number(what:&str, s:&str) -> Result<f64> {
	s.trim().parse::<f64>().map_err(|_| Error::InvalidSettings(format!("{} '{}' is not a number", what, s.trim())))
}

// Depth comes back as a plain integer or in scientific notation; "AUTO" means it isn't known yet
fn parse_memory_depth(s:&str) -> Result<usize> {
	let s = s.trim();
	if let Ok(n) = s.parse::<usize>() { return Ok(n); }

	let x = parse_number("memory depth", s)?;
	if x.is_finite() && x >= 0.0 && x.fract() == 0.0 && x <= usize::MAX as f64 { Ok(x as usize) }
	else { Err(Error::InvalidSettings(format!("memory depth '{}' is not a whole number of samples", s))) }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn derived_quantities() {
		let s = AcquisitionSettings::new(600_000, 1e9, 0.5).unwrap();
		assert_eq!(s.capture_duration(), 600_000.0 / 1e9);
		assert_eq!(s.sample_period(), 1.0 / 1e9);
		assert_eq!(s.time_unit(), TimeUnit::Nanoseconds);
	}

	#[test]
	fn unit_bands() {
		assert_eq!(TimeUnit::for_period(1.0 / 1e9), TimeUnit::Nanoseconds);
		assert_eq!(TimeUnit::for_period(5e-11), TimeUnit::Nanoseconds);
		assert_eq!(TimeUnit::for_period(2e-9), TimeUnit::Microseconds);
		assert_eq!(TimeUnit::for_period(1e-7), TimeUnit::Milliseconds);
		assert_eq!(TimeUnit::for_period(1.0 / 1e5), TimeUnit::Milliseconds);
		assert_eq!(TimeUnit::for_period(1e-4), TimeUnit::Seconds);
		assert_eq!(TimeUnit::for_period(2.0), TimeUnit::Seconds);
	}

	#[test]
	fn rejects_non_positive_depth_and_rate() {
		assert!(matches!(AcquisitionSettings::new(0, 1e9, 1.0), Err(Error::InvalidSettings(_))));
		assert!(matches!(AcquisitionSettings::new(12, 0.0, 1.0), Err(Error::InvalidSettings(_))));
		assert!(matches!(AcquisitionSettings::new(12, -1e6, 1.0), Err(Error::InvalidSettings(_))));
		assert!(matches!(AcquisitionSettings::new(12, f64::NAN, 1.0), Err(Error::InvalidSettings(_))));
	}

	#[test]
	fn parses_instrument_text() {
		let s = AcquisitionSettings::parse("1.200000e+07\n", "1.000000e+08\n", "5.000000e-01\n").unwrap();
		assert_eq!(s.memory_depth(), 12_000_000);
		assert_eq!(s.sample_rate(), 1e8);
		assert_eq!(s.vertical_scale(), 0.5);

		assert!(matches!(AcquisitionSettings::parse("AUTO", "1e8", "1"), Err(Error::InvalidSettings(_))));
		assert!(matches!(AcquisitionSettings::parse("12000.5", "1e8", "1"), Err(Error::InvalidSettings(_))));
		assert!(matches!(AcquisitionSettings::parse("-5", "1e8", "1"), Err(Error::InvalidSettings(_))));
		assert!(matches!(AcquisitionSettings::parse("12000", "fast", "1"), Err(Error::InvalidSettings(_))));
	}
}
