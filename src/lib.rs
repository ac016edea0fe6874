
// External data representation, a protocol for serializing data to be sent over the network
pub mod xdr;

// Remote procedure call, a protocol built on top of XDR to provide something like C-style function calls over the network
pub mod rpc;

// A protocol using RPC that's meant to communicate with instruments like oscilloscopes, power supplies, waveform generators, etc
pub mod vxi11;

// Command sets for the instruments we know how to drive
pub mod devices;

pub mod error;
pub mod transport;
pub mod registry;

// Trigger, settings and transfer configuration for one capture
pub mod acquisition;

// Fetching captured memory that doesn't fit in a single read
pub mod transfer;

pub mod waveform;
pub mod render;
pub mod config;

pub use acquisition::{capture, Acquisition, AcquisitionOptions, AcquisitionSettings, AcqState, TimeUnit};
pub use config::Config;
pub use devices::ds1000z::CommandSet;
pub use error::{Error, Result};
pub use registry::{Handle, Registry};
pub use render::{JsonRenderer, Renderer};
pub use transport::{Connector, Transport, Vxi11Connector, Vxi11Link};
pub use waveform::Waveform;
