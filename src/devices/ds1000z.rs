
// Command set for the Rigol DS1000Z series (DS1054Z, DS1104Z, ...), and the template machinery
// that lets other models supply their own text through configuration.

use serde::{Deserialize, Serialize};

// Largest number of BYTE-format points one :WAV:DATA? may return in RAW mode
pub const MAX_BYTE_POINTS_PER_READ:usize = 250_000;

pub const CHANNEL_PLACEHOLDER:&str = "{channel}";
pub const OFFSET_PLACEHOLDER:&str  = "{offset}";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandSet {
	pub select_source: String,
	pub single_trigger: String,
	pub trigger_status: String,
	pub stopped_status: String,
	pub memory_depth: String,
	pub sample_rate: String,
	pub vertical_scale: String,
	pub waveform_mode: String,
	pub waveform_format: String,
	pub waveform_start: String,
	pub waveform_stop: Option<String>,
	pub waveform_data: String,

	pub channels: u8,
	pub chunk_cap: usize,
	pub first_offset: usize,
}

impl Default for CommandSet {

	fn default() -> Self {
		Self {
			select_source:   ":WAV:SOUR CHAN{channel}".to_owned(),
			single_trigger:  ":SING".to_owned(),
			trigger_status:  ":TRIG:STAT?".to_owned(),
			stopped_status:  "STOP".to_owned(),
			memory_depth:    ":ACQ:MDEP?".to_owned(),
			sample_rate:     ":ACQ:SRAT?".to_owned(),
			vertical_scale:  ":CHAN{channel}:SCAL?".to_owned(),
			waveform_mode:   ":WAV:MODE RAW".to_owned(),		// Only valid once the acquisition is stopped
			waveform_format: ":WAV:FORM BYTE".to_owned(),		// One byte per point gets the most points per read
			waveform_start:  ":WAV:STAR {offset}".to_owned(),
			waveform_stop:   Some(":WAV:STOP {offset}".to_owned()),
			waveform_data:   ":WAV:DATA?".to_owned(),

			channels: 4,
			chunk_cap: MAX_BYTE_POINTS_PER_READ,
			first_offset: 1,
		}
	}

}

impl CommandSet {

	pub fn for_channel(template:&str, channel:u8) -> String {
		template.replace(CHANNEL_PLACEHOLDER, &channel.to_string())
	}

	pub fn for_offset(template:&str, offset:usize) -> String {
		template.replace(OFFSET_PLACEHOLDER, &offset.to_string())
	}

	pub fn is_stopped(&self, status:&str) -> bool {
		status.trim().eq_ignore_ascii_case(&self.stopped_status)
	}

}
