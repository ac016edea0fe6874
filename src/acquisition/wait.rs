
use std::thread;
use std::time::{Duration, Instant};

use crate::error::Result;

// Probes at least once, then every `interval` until the probe answers true or `timeout` has elapsed.
// Ok(false) means the deadline passed; probe errors end the wait immediately.
pub fn poll_until<F>(timeout:Duration, interval:Duration, mut probe:F) -> Result<bool>
where F: FnMut() -> Result<bool>
{
	let deadline = Instant::now() + timeout;

	loop {
		if probe()? { return Ok(true); }

		let now = Instant::now();
		if now >= deadline { return Ok(false); }
		thread::sleep(interval.min(deadline - now));
	}
}
