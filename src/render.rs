//! Renderers consume a finished [`Waveform`].

use std::io::Write;

use serde::Serialize;

use crate::error::Result;
use crate::waveform::Waveform;

pub trait Renderer {
	fn render(&mut self, waveform:&Waveform) -> Result<()>;
}

#[derive(Serialize)]
struct Plot<'a> {
	title: String,
	x_label: String,
	y_label: &'static str,
	time_unit: &'static str,
	volts_per_div: f64,
	time: Vec<f64>,
	voltage: &'a [f64],
}

/// Writes the plot data (labels plus both axes) as JSON, for any plotting
/// front end to pick up.
pub struct JsonRenderer<W: Write> {
	out: W,
	pretty: bool,
}

impl<W: Write> JsonRenderer<W> {

	pub fn new(out:W) -> Self { Self{ out, pretty: false } }

	pub fn pretty(mut self, pretty:bool) -> Self {
		self.pretty = pretty;
		self
	}

	pub fn into_inner(self) -> W { self.out }

}

impl<W: Write> Renderer for JsonRenderer<W> {
	fn render(&mut self, waveform:&Waveform) -> Result<()> {
		let plot = Plot{
			title: waveform.title(),
			x_label: format!("Time ({})", waveform.time_unit()),
			y_label: "Voltage (V)",
			time_unit: waveform.time_unit().symbol(),
			volts_per_div: waveform.volts_per_div(),
			time: waveform.display_time_axis(),
			voltage: waveform.samples(),
		};

		if self.pretty {
			serde_json::to_writer_pretty(&mut self.out, &plot).map_err(std::io::Error::from)?;
		} else {
			serde_json::to_writer(&mut self.out, &plot).map_err(std::io::Error::from)?;
		}
		writeln!(self.out)?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::acquisition::AcquisitionSettings;

	#[test]
	fn renders_labels_and_axes() {
		let settings = AcquisitionSettings::new(3, 1e5, 0.5).unwrap();
		let wf = Waveform::new(1, vec![0.0, 0.5, 1.0], &settings);

		let mut r = JsonRenderer::new(Vec::new());
		r.render(&wf).unwrap();
		let v:serde_json::Value = serde_json::from_slice(&r.into_inner()).unwrap();

		assert_eq!(v["title"], "Oscilloscope Channel 1");
		assert_eq!(v["x_label"], "Time (ms)");
		assert_eq!(v["time_unit"], "ms");
		assert_eq!(v["voltage"].as_array().unwrap().len(), 3);
		assert_eq!(v["time"][0], 0.0);
	}
}
