//! Caller-owned map from instrument model to bus address.
//!
//! A `Registry` is built explicitly, usually by [`Registry::discover`], and
//! hands out [`Handle`]s. Every handle is released exactly once: by
//! [`Registry::close`], or from `Drop` if the caller never got that far.
//! The transport inside a handle is only ever given back to the connector,
//! so nothing reachable from a handle can close it early.

use std::collections::BTreeMap;
use std::io;
use std::time::Duration;

use log::{info, warn};

use crate::devices::{Identity, IDN_QUERY};
use crate::error::{Error, Result};
use crate::rpc::port_mapping::{self, Mapping, Protocol};
use crate::transport::{Connector, Transport};
use crate::vxi11::{DEVICE_CORE_PROG, DEVICE_CORE_VERS};

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
	pub descriptor: String,
	pub identity: Option<Identity>,
}

pub struct Registry<C: Connector> {
	connector: C,
	instruments: BTreeMap<String, Entry>,
}

impl<C: Connector> Registry<C> {

	pub fn new(connector:C) -> Self {
		Self{ connector, instruments: BTreeMap::new() }
	}

	/// Identifies every candidate with `*IDN?` and records the ones that answer.
	pub fn discover<I, S>(connector:C, candidates:I) -> Self
	where I: IntoIterator<Item=S>, S: AsRef<str> {
		let mut registry = Self::new(connector);
		for candidate in candidates {
			let descriptor = candidate.as_ref();
			match registry.identify(descriptor) {
				Ok(identity) => {
					info!("Found {} {} at {}", identity.manufacturer, identity.model, descriptor);
					registry.instruments.insert(identity.model.clone(), Entry{ descriptor: descriptor.to_owned(), identity: Some(identity) });
				},
				Err(e) => warn!("Skipping {}: {}", descriptor, e),
			}
		}
		info!("Devices found: {}", registry.instruments.len());
		registry
	}

	fn identify(&self, descriptor:&str) -> Result<Identity> {
		let mut link = self.connector.connect(descriptor)?;
		let identity = link.query(IDN_QUERY).and_then(|idn| Identity::parse(&idn));
		if let Err(e) = self.connector.disconnect(link) {
			warn!("Unable to close {} after identifying it: {}", descriptor, e);
		}
		identity
	}

	/// Adds a known instrument without asking it who it is.
	pub fn register(&mut self, model:&str, descriptor:&str) {
		self.instruments.insert(model.to_owned(), Entry{ descriptor: descriptor.to_owned(), identity: None });
	}

	pub fn list(&self) -> BTreeMap<String, String> {
		self.instruments.iter().map(|(model, entry)| (model.clone(), entry.descriptor.clone())).collect()
	}

	pub fn entries(&self) -> impl Iterator<Item=(&str, &Entry)> {
		self.instruments.iter().map(|(m, e)| (m.as_str(), e))
	}

	// Exact model first, then a case-insensitive match
	fn lookup(&self, model:&str) -> Option<&Entry> {
		self.instruments.get(model).or_else(|| {
			self.instruments.iter().find(|(m, _)| m.eq_ignore_ascii_case(model)).map(|(_, e)| e)
		})
	}

	pub fn open(&self, model:&str) -> Result<Handle<'_, C>> {
		let entry = self.lookup(model).ok_or_else(|| Error::DeviceNotFound(model.to_owned()))?;
		let transport = self.connector.connect(&entry.descriptor)?;
		info!("Opened {} at {}", model, entry.descriptor);
		Ok(Handle{ connector: &self.connector, descriptor: entry.descriptor.clone(), transport: Some(transport) })
	}

	pub fn close(&self, mut handle:Handle<'_, C>) -> Result<()> {
		handle.release()
	}

	/// Opens `model`, runs `f` on it and closes it again, whatever `f` returns.
	///
	/// An error from `f` is returned in preference to a close failure, which is
	/// then only logged.
	pub fn with_instrument<R, F>(&self, model:&str, f:F) -> Result<R>
	where F: FnOnce(&mut C::Transport) -> Result<R> {
		let mut handle = self.open(model)?;
		let result = handle.transport().and_then(f);
		let closed = handle.release();

		match (result, closed) {
			(Ok(r), Ok(()))          => Ok(r),
			(Ok(_), Err(e))          => Err(e),
			(Err(e), Ok(()))         => Err(e),
			(Err(e), Err(close_err)) => {
				warn!("{}", close_err);
				Err(e)
			},
		}
	}

}

/// Exclusive ownership of one open instrument connection.
pub struct Handle<'a, C: Connector> {
	connector: &'a C,
	descriptor: String,
	transport: Option<C::Transport>,
}

impl<'a, C: Connector> Handle<'a, C> {

	pub fn descriptor(&self) -> &str { &self.descriptor }

	/// The open transport. Only fails once the handle has been released.
	pub fn transport(&mut self) -> Result<&mut C::Transport> {
		let descriptor = &self.descriptor;
		self.transport.as_mut().ok_or_else(|| {
			Error::Io(io::Error::new(io::ErrorKind::NotConnected, format!("{} has already been released", descriptor)))
		})
	}

	fn release(&mut self) -> Result<()> {
		match self.transport.take() {
			Some(transport) => self.connector.disconnect(transport).map_err(|e| Error::CloseFailed{
				descriptor: self.descriptor.clone(),
				source: Box::new(e),
			}),
			None => Ok(()),
		}
	}

}

impl<'a, C: Connector> Drop for Handle<'a, C> {
	fn drop(&mut self) {
		if let Err(e) = self.release() {
			warn!("{}", e);
		}
	}
}

/// Asks every port mapper on the local network whether it serves a VXI-11
/// core channel and returns the addresses that do.
pub fn broadcast_candidates(listen:Duration) -> Result<Vec<String>> {
	let mapping = Mapping{ program: DEVICE_CORE_PROG, version: DEVICE_CORE_VERS, protocol: Protocol::TCP, port: 0 };
	let found = port_mapping::broadcast_get_port(&mapping, listen)?;
	Ok(found.into_iter().map(|(ip, _)| ip.to_string()).collect())
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::cell::RefCell;
	use std::rc::Rc;

	#[derive(Default)]
	struct Log {
		opened: Vec<String>,
		closed: Vec<String>,
	}

	struct FakeLink {
		descriptor: String,
	}

	impl Transport for FakeLink {
		fn write(&mut self, _command:&str) -> Result<()> { Ok(()) }

		fn query_bytes(&mut self, command:&str) -> Result<Vec<u8>> {
			match (command, self.descriptor.as_str()) {
				(IDN_QUERY, "10.0.0.2") => Ok(b"RIGOL TECHNOLOGIES,DS1054Z,DS1ZA1,00.04.04\n".to_vec()),
				(IDN_QUERY, "10.0.0.3") => Ok(b"Siglent Technologies,SDS1202X,SDS1X,1.1.1\n".to_vec()),
				_ => Err(Error::Io(io::Error::new(io::ErrorKind::TimedOut, "no answer"))),
			}
		}
	}

	#[derive(Clone, Default)]
	struct FakeConnector {
		log: Rc<RefCell<Log>>,
		fail_close: bool,
	}

	impl Connector for FakeConnector {
		type Transport = FakeLink;

		fn connect(&self, descriptor:&str) -> Result<FakeLink> {
			self.log.borrow_mut().opened.push(descriptor.to_owned());
			Ok(FakeLink{ descriptor: descriptor.to_owned() })
		}

		fn disconnect(&self, link:FakeLink) -> Result<()> {
			self.log.borrow_mut().closed.push(link.descriptor);
			if self.fail_close { Err(Error::Io(io::Error::new(io::ErrorKind::Other, "link refused"))) }
			else { Ok(()) }
		}
	}

	#[test]
	fn discovery_maps_models_and_closes_probes() {
		let connector = FakeConnector::default();
		let log = connector.log.clone();
		let registry = Registry::discover(connector, ["10.0.0.2", "10.0.0.3", "10.0.0.9"]);

		let list = registry.list();
		assert_eq!(list.len(), 2);
		assert_eq!(list["DS1054Z"], "10.0.0.2");
		assert_eq!(list["SDS1202X"], "10.0.0.3");
		assert_eq!(log.borrow().closed.len(), 3);
	}

	#[test]
	fn unknown_model_is_device_not_found() {
		let registry = Registry::new(FakeConnector::default());
		assert!(matches!(registry.open("DS1054Z"), Err(Error::DeviceNotFound(_))));
	}

	#[test]
	fn lookup_ignores_case() {
		let mut registry = Registry::new(FakeConnector::default());
		registry.register("DS1054Z", "10.0.0.2");
		let handle = registry.open("ds1054z").unwrap();
		assert_eq!(handle.descriptor(), "10.0.0.2");
		registry.close(handle).unwrap();
	}

	#[test]
	fn close_failure_is_reported_once() {
		let connector = FakeConnector{ fail_close: true, ..Default::default() };
		let log = connector.log.clone();
		let mut registry = Registry::new(connector);
		registry.register("DS1054Z", "10.0.0.2");

		let handle = registry.open("DS1054Z").unwrap();
		assert!(matches!(registry.close(handle), Err(Error::CloseFailed{ .. })));
		assert_eq!(log.borrow().closed.len(), 1);
	}

	#[test]
	fn dropped_handle_is_released() {
		let connector = FakeConnector::default();
		let log = connector.log.clone();
		let mut registry = Registry::new(connector);
		registry.register("DS1054Z", "10.0.0.2");

		drop(registry.open("DS1054Z").unwrap());
		assert_eq!(log.borrow().closed, vec!["10.0.0.2".to_owned()]);
	}

	#[test]
	fn released_handle_is_not_released_again() {
		let connector = FakeConnector::default();
		let log = connector.log.clone();
		let mut registry = Registry::new(connector);
		registry.register("DS1054Z", "10.0.0.2");

		let mut handle = registry.open("DS1054Z").unwrap();
		handle.transport().unwrap().write(":SING").unwrap();
		handle.release().unwrap();
		assert!(handle.transport().is_err());
		assert!(handle.release().is_ok());
		drop(handle);
		assert_eq!(log.borrow().closed.len(), 1);
	}

	#[test]
	fn scoped_use_releases_after_failure() {
		let connector = FakeConnector::default();
		let log = connector.log.clone();
		let mut registry = Registry::new(connector);
		registry.register("DS1054Z", "10.0.0.2");

		let r:Result<()> = registry.with_instrument("DS1054Z", |_| Err(Error::InvalidSettings("bad".to_owned())));
		assert!(matches!(r, Err(Error::InvalidSettings(_))));
		assert_eq!(log.borrow().closed.len(), 1);
	}
}
