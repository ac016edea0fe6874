//! The captured waveform handed to renderers.

use serde::Serialize;

use crate::acquisition::{AcquisitionSettings, TimeUnit};

/// Scaled samples from one capture and the time axis they were taken on.
///
/// The time axis always has one point per sample, starts at zero and ends at
/// the capture duration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Waveform {
	channel: u8,
	volts_per_div: f64,
	time_unit: TimeUnit,
	time_axis: Vec<f64>,
	samples: Vec<f64>,
}

impl Waveform {

	pub fn new(channel:u8, samples:Vec<f64>, settings:&AcquisitionSettings) -> Self {
		Self{
			channel,
			volts_per_div: settings.vertical_scale(),
			time_unit: settings.time_unit(),
			time_axis: time_axis(samples.len(), settings.capture_duration()),
			samples,
		}
	}

	pub fn channel(&self) -> u8 { self.channel }
	pub fn volts_per_div(&self) -> f64 { self.volts_per_div }
	pub fn samples(&self) -> &[f64] { &self.samples }

	/// Sample times in seconds.
	pub fn time_axis(&self) -> &[f64] { &self.time_axis }

	pub fn time_unit(&self) -> TimeUnit { self.time_unit }

	/// Sample times expressed in [`Waveform::time_unit`].
	pub fn display_time_axis(&self) -> Vec<f64> {
		let k = self.time_unit.per_second();
		self.time_axis.iter().map(|t| t * k).collect()
	}

	pub fn title(&self) -> String { format!("Oscilloscope Channel {}", self.channel) }

	pub fn len(&self) -> usize { self.samples.len() }
	pub fn is_empty(&self) -> bool { self.samples.is_empty() }

}

/// `n` evenly spaced points from 0 to `duration` inclusive.
pub fn time_axis(n:usize, duration:f64) -> Vec<f64> {
	match n {
		0 => vec![],
		1 => vec![0.0],
		_ => {
			let step:f64 = duration / (n - 1) as f64;
			(0..n).map(|i| i as f64 * step).collect()
		}
	}
}
