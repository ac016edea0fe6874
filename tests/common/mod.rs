// A simulated DS1000Z that speaks the default command set over the Transport trait

#![allow(dead_code)]

use std::cell::RefCell;
use std::io;
use std::rc::Rc;

use vxi11_capture::devices::ds1000z::MAX_BYTE_POINTS_PER_READ;
use vxi11_capture::{Connector, Error, Result, Transport};

#[derive(Debug, Default)]
pub struct BusLog {
	pub writes: Vec<String>,
	pub status_polls: usize,
	pub data_queries: usize,
	pub closes: usize,
}

impl BusLog {
	pub fn writes_starting_with(&self, prefix:&str) -> Vec<String> {
		self.writes.iter().filter(|w| w.starts_with(prefix)).cloned().collect()
	}
}

#[derive(Debug, Clone)]
pub struct SimScope {
	pub memory: Vec<u8>,
	pub memory_depth: String,
	pub sample_rate: String,
	pub scale: String,
	pub polls_until_stop: Option<usize>,
	pub failed_arms: usize,
	pub short_by: usize,
	pub extra_bytes: usize,
	pub fail_close: bool,
	pub log: Rc<RefCell<BusLog>>,

	raw_mode: bool,
	byte_format: bool,
	start: usize,
	stop: usize,
	polls: usize,
	arms: usize,
}

pub fn ramp(n:usize) -> Vec<u8> {
	(0..n).map(|i| (i % 251) as u8).collect()
}

impl SimScope {

	pub fn new(memory:Vec<u8>, sample_rate:f64, scale:f64) -> Self {
		Self {
			memory_depth: memory.len().to_string(),
			memory,
			sample_rate: format!("{:e}", sample_rate),
			scale: format!("{:e}", scale),
			polls_until_stop: Some(2),
			failed_arms: 0,
			short_by: 0,
			extra_bytes: 0,
			fail_close: false,
			log: Rc::new(RefCell::new(BusLog::default())),
			raw_mode: false,
			byte_format: false,
			start: 1,
			stop: 1200,
			polls: 0,
			arms: 0,
		}
	}

	fn execution_error(what:&str) -> Error {
		Error::Io(io::Error::new(io::ErrorKind::Other, format!("execution error: {}", what)))
	}

	fn read_window(&self) -> Result<Vec<u8>> {
		if !(self.raw_mode && self.byte_format) { return Err(Self::execution_error("waveform mode not configured")); }
		if self.stop < self.start || self.stop - self.start + 1 > MAX_BYTE_POINTS_PER_READ {
			return Err(Self::execution_error("read window too large"));
		}

		let from = (self.start - 1).min(self.memory.len());
		let to = self.stop.min(self.memory.len());
		let mut payload = self.memory[from..to].to_vec();
		if to == self.memory.len() {
			payload.truncate(payload.len().saturating_sub(self.short_by));
		}
		payload.extend(std::iter::repeat(0x80).take(self.extra_bytes));

		let mut block = format!("#9{:09}", payload.len()).into_bytes();
		block.extend_from_slice(&payload);
		block.push(b'\n');
		Ok(block)
	}

}

impl Transport for SimScope {

	fn write(&mut self, command:&str) -> Result<()> {
		self.log.borrow_mut().writes.push(command.to_owned());

		let arg = |prefix:&str| command.strip_prefix(prefix).and_then(|s| s.trim().parse::<usize>().ok());
		if command == ":SING" { self.polls = 0; self.arms += 1; }
		else if command == ":WAV:MODE RAW" { self.raw_mode = true; }
		else if command == ":WAV:FORM BYTE" { self.byte_format = true; }
		else if let Some(n) = arg(":WAV:STAR ") { self.start = n; }
		else if let Some(n) = arg(":WAV:STOP ") { self.stop = n; }
		Ok(())
	}

	fn query_bytes(&mut self, command:&str) -> Result<Vec<u8>> {
		let text = |s:&str| -> Result<Vec<u8>> { Ok(format!("{}\n", s).into_bytes()) };
		match command {
			"*IDN?"       => text("RIGOL TECHNOLOGIES,DS1054Z,DS1ZA000000001,00.04.04.SP3"),
			":TRIG:STAT?" => {
				self.polls += 1;
				self.log.borrow_mut().status_polls += 1;
				let stopped = self.arms > self.failed_arms && self.polls_until_stop.map_or(false, |n| self.polls >= n);
				text(if stopped { "STOP" } else { "WAIT" })
			},
			":ACQ:MDEP?"  => text(&self.memory_depth),
			":ACQ:SRAT?"  => text(&self.sample_rate),
			":CHAN1:SCAL?" | ":CHAN2:SCAL?" | ":CHAN3:SCAL?" | ":CHAN4:SCAL?" => text(&self.scale),
			":WAV:DATA?"  => {
				self.log.borrow_mut().data_queries += 1;
				self.read_window()
			},
			other => Err(Self::execution_error(other)),
		}
	}

}

// Hands out clones of one simulated instrument; the clones share a bus log
pub struct SimConnector {
	pub scope: SimScope,
}

impl Connector for SimConnector {
	type Transport = SimScope;

	fn connect(&self, _descriptor:&str) -> Result<SimScope> { Ok(self.scope.clone()) }

	fn disconnect(&self, scope:SimScope) -> Result<()> {
		scope.log.borrow_mut().closes += 1;
		if scope.fail_close { Err(Error::Io(io::Error::new(io::ErrorKind::Other, "destroy_link refused"))) }
		else { Ok(()) }
	}
}
