//! Single-shot acquisition state machine.
//!
//! A capture walks `Idle -> Armed -> Stopped`, then configures the transfer
//! and reads the settings (in either order) to reach `TransferReady`, from
//! which the waveform is fetched and the controller returns to `Idle`. Any
//! failure leaves it `Aborted`; a new capture can be armed from there.

pub mod settings;
pub mod wait;

use std::time::Duration;

use log::{debug, info};

use crate::devices::ds1000z::CommandSet;
use crate::error::{Error, Result};
use crate::transfer::{self, ChunkedTransfer};
use crate::transport::Transport;
use crate::waveform::Waveform;

pub use settings::{AcquisitionSettings, TimeUnit};

pub const DEFAULT_POLL_INTERVAL:Duration   = Duration::from_millis(200);
pub const DEFAULT_TRIGGER_TIMEOUT:Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcqState {
	Idle,
	Armed,
	Stopped,
	Configured,
	SettingsRead,
	TransferReady,
	Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcquisitionOptions {
	pub trigger_timeout: Duration,
	pub poll_interval: Duration,
}

impl Default for AcquisitionOptions {
	fn default() -> Self {
		Self{ trigger_timeout: DEFAULT_TRIGGER_TIMEOUT, poll_interval: DEFAULT_POLL_INTERVAL }
	}
}

pub struct Acquisition<'a, T: Transport + ?Sized> {
	link: &'a mut T,
	commands: &'a CommandSet,
	options: AcquisitionOptions,
	state: AcqState,
	channel: Option<u8>,
	settings: Option<AcquisitionSettings>,
}

impl<'a, T: Transport + ?Sized> Acquisition<'a, T> {

	pub fn new(link:&'a mut T, commands:&'a CommandSet, options:AcquisitionOptions) -> Self {
		Self{ link, commands, options, state: AcqState::Idle, channel: None, settings: None }
	}

	pub fn state(&self) -> AcqState { self.state }

	pub fn settings(&self) -> Option<&AcquisitionSettings> { self.settings.as_ref() }

	fn expect_state(&self, operation:&'static str, allowed:&[AcqState]) -> Result<()> {
		if allowed.contains(&self.state) { Ok(()) }
		else { Err(Error::InvalidState{ operation, state: self.state }) }
	}

	fn check_channel(&self, channel:u8) -> Result<()> {
		if (1..=self.commands.channels).contains(&channel) { Ok(()) }
		else { Err(Error::InvalidChannel{ channel, available: self.commands.channels }) }
	}

	// Any error from a bus operation aborts the capture
	fn abort_on_err<R>(&mut self, r:Result<R>) -> Result<R> {
		if r.is_err() { self.state = AcqState::Aborted; }
		r
	}

	/// Selects the source channel, arms a single acquisition and blocks until
	/// the instrument reports it stopped, or fails with `TriggerTimeout`.
	pub fn arm_and_trigger(&mut self, channel:u8) -> Result<()> {
		self.expect_state("arm_and_trigger", &[AcqState::Idle, AcqState::Aborted])?;
		self.check_channel(channel)?;

		self.channel = Some(channel);
		self.settings = None;

		let r = self.arm(channel);
		self.abort_on_err(r)
	}

	fn arm(&mut self, channel:u8) -> Result<()> {
		self.link.write(&CommandSet::for_channel(&self.commands.select_source, channel))?;
		self.link.write(&self.commands.single_trigger)?;
		self.state = AcqState::Armed;
		info!("Armed single acquisition on channel {}", channel);

		let AcquisitionOptions{ trigger_timeout, poll_interval } = self.options;
		let link = &mut *self.link;
		let commands = self.commands;
		let stopped = wait::poll_until(trigger_timeout, poll_interval, || {
			let status = link.query(&commands.trigger_status)?;
			debug!("Trigger status {}", status);
			Ok(commands.is_stopped(&status))
		})?;

		if !stopped { return Err(Error::TriggerTimeout(trigger_timeout)); }

		self.state = AcqState::Stopped;
		info!("Acquisition stopped");
		Ok(())
	}

	/// Queries memory depth, sample rate and the channel's vertical scale.
	pub fn read_settings(&mut self, channel:u8) -> Result<AcquisitionSettings> {
		self.expect_state("read_settings", &[AcqState::Stopped, AcqState::Configured])?;
		self.check_channel(channel)?;
		let r = match self.channel {
			Some(armed) if armed == channel => self.query_settings(channel),
			armed => Err(Error::InvalidSettings(format!("settings requested for channel {} but channel {:?} was captured", channel, armed))),
		};
		let settings = self.abort_on_err(r)?;
		info!("Acquisition settings: {}", settings);

		self.settings = Some(settings);
		self.state = match self.state {
			AcqState::Configured => AcqState::TransferReady,
			_ => AcqState::SettingsRead,
		};
		Ok(settings)
	}

	fn query_settings(&mut self, channel:u8) -> Result<AcquisitionSettings> {
		let depth = self.link.query(&self.commands.memory_depth)?;
		let rate  = self.link.query(&self.commands.sample_rate)?;
		let scale = self.link.query(&CommandSet::for_channel(&self.commands.vertical_scale, channel))?;
		AcquisitionSettings::parse(&depth, &rate, &scale)
	}

	/// Switches waveform readout to raw captured memory with one byte per
	/// sample. Only valid once the acquisition has stopped.
	pub fn configure_transfer(&mut self) -> Result<()> {
		self.expect_state("configure_transfer", &[AcqState::Stopped, AcqState::SettingsRead])?;

		let r = self.link.write(&self.commands.waveform_mode)
			.and_then(|_| self.link.write(&self.commands.waveform_format));
		self.abort_on_err(r)?;

		self.state = match self.state {
			AcqState::SettingsRead => AcqState::TransferReady,
			_ => AcqState::Configured,
		};
		Ok(())
	}

	/// Pulls the whole captured memory in chunks and builds the waveform.
	pub fn fetch_waveform(&mut self) -> Result<Waveform> {
		self.expect_state("fetch_waveform", &[AcqState::TransferReady])?;

		let r = self.transfer();
		let waveform = self.abort_on_err(r)?;
		self.state = AcqState::Idle;
		Ok(waveform)
	}

	fn transfer(&mut self) -> Result<Waveform> {
		let (channel, settings) = match (self.channel, self.settings) {
			(Some(c), Some(s)) => (c, s),
			_ => return Err(Error::InvalidState{ operation: "fetch_waveform", state: self.state }),
		};

		let raw = ChunkedTransfer::new(&mut *self.link, self.commands).fetch(settings.memory_depth(), self.commands.chunk_cap)?;
		let volts = transfer::scale(&raw.data, settings.vertical_scale())?;
		info!("Transferred {} samples in {} chunks", raw.data.len(), raw.chunks);

		Ok(Waveform::new(channel, volts, &settings))
	}

}

/// Runs one complete capture on an open transport.
pub fn capture<T: Transport + ?Sized>(link:&mut T, commands:&CommandSet, options:AcquisitionOptions, channel:u8) -> Result<Waveform> {
	let mut acq = Acquisition::new(link, commands, options);
	acq.arm_and_trigger(channel)?;
	acq.read_settings(channel)?;
	acq.configure_transfer()?;
	acq.fetch_waveform()
}
