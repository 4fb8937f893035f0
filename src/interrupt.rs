//! Forwarding of SIGINT to the pipeline that is currently running.
//!
//! The registry of the running pipeline is published here for as long as
//! `execute` runs. The signal handler may fire on any thread, so readers
//! announce themselves in `READERS` and unpublishing waits for them to leave
//! before the registry can be dropped.

use std::marker::PhantomData;

use crate::{prelude::*, registry::Registry};

static CURRENT: AtomicPtr<Registry> = AtomicPtr::new(std::ptr::null_mut());
static READERS: AtomicUsize = AtomicUsize::new(0);

/// Keeps a registry published until dropped
#[derive(Debug)]
pub struct Published<'a> {
	_registry: PhantomData<&'a Registry>,
}

impl<'a> Published<'a> {
	pub fn new(registry: &'a Registry) -> Self {
		let prev = CURRENT.swap(registry as *const Registry as *mut Registry, Ordering::SeqCst);
		debug_assert!(prev.is_null(), "only one pipeline may run at a time");
		Self { _registry: PhantomData }
	}
}

impl Drop for Published<'_> {
	fn drop(&mut self) {
		CURRENT.store(std::ptr::null_mut(), Ordering::SeqCst);
		while READERS.load(Ordering::SeqCst) != 0 {
			std::hint::spin_loop();
		}
	}
}

fn with_current<T>(f: impl FnOnce(&Registry) -> T) -> Option<T> {
	READERS.fetch_add(1, Ordering::SeqCst);
	let ptr = CURRENT.load(Ordering::SeqCst);
	// The publisher cannot drop the registry while READERS is non-zero
	let result = unsafe { ptr.as_ref() }.map(f);
	READERS.fetch_sub(1, Ordering::SeqCst);
	result
}

/// Forwards SIGINT to every process of the running pipeline that has not been reaped.
///
/// Async-signal-safe: this is what the SIGINT handler calls. Returns the number
/// of processes signalled, which is 0 when no pipeline is running.
pub fn interrupt() -> usize {
	with_current(|registry| registry.signal_unreaped(Signal::SIGINT)).unwrap_or(0)
}

/// Number of processes of the running pipeline that are launched but not yet reaped
pub fn in_flight() -> usize {
	with_current(Registry::unreaped).unwrap_or(0)
}

/// Whether a pipeline is currently running
pub fn is_running() -> bool {
	with_current(|_| ()).is_some()
}

#[cfg(test)]
mod tests {
	use std::os::unix::process::ExitStatusExt;

	use super::*;

	// A single test, since the published registry is process-wide
	#[test]
	fn forwards_only_while_published() {
		assert_eq!(interrupt(), 0);
		assert!(!is_running());

		let mut child = std::process::Command::new("sleep").arg("30").spawn().unwrap();
		let registry = Registry::with_capacity(1);
		assert!(registry.record(Pid::from_raw(child.id() as i32)));
		{
			let _published = Published::new(&registry);
			assert!(is_running());
			assert_eq!(in_flight(), 1);
			assert_eq!(interrupt(), 1);
		}
		let status = child.wait().unwrap();
		assert_eq!(status.signal(), Some(libc::SIGINT));

		assert!(!is_running());
		assert_eq!(in_flight(), 0);
		assert_eq!(interrupt(), 0);
	}
}
