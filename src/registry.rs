use nix::sys::signal::kill;

use crate::prelude::*;

/// The processes launched for one pipeline.
///
/// Written by the launcher and the waiter on the main thread, read by the
/// interrupt forwarder from signal context. Slots are fixed in size when the
/// pipeline starts and every field is atomic, so reading never allocates or
/// locks, and `launched` only moves forward once the matching slot is filled.
#[derive(Debug)]
pub struct Registry {
	pids: Box<[AtomicI32]>,
	launched: AtomicUsize,
	reaped: AtomicUsize,
}

impl Registry {
	pub fn with_capacity(stages: usize) -> Self {
		let pids = (0..stages).map(|_| AtomicI32::new(0)).collect::<Vec<_>>().into_boxed_slice();
		Self { pids, launched: AtomicUsize::new(0), reaped: AtomicUsize::new(0) }
	}

	pub fn capacity(&self) -> usize {
		self.pids.len()
	}

	/// Appends a launched process. Returns false if every slot is taken.
	pub fn record(&self, pid: Pid) -> bool {
		let idx = self.launched.load(Ordering::Relaxed);
		let Some(slot) = self.pids.get(idx) else {
			return false
		};
		slot.store(pid.as_raw(), Ordering::Relaxed);
		// Publishes the slot to the forwarder
		self.launched.store(idx + 1, Ordering::Release);
		true
	}

	pub fn launched(&self) -> usize {
		self.launched.load(Ordering::Acquire)
	}

	pub fn reaped(&self) -> usize {
		self.reaped.load(Ordering::Acquire)
	}

	pub fn pid(&self, idx: usize) -> Option<Pid> {
		if idx >= self.launched() {
			return None
		}
		Some(Pid::from_raw(self.pids[idx].load(Ordering::Relaxed)))
	}

	/// The next process to reap, in launch order
	pub fn next_unreaped(&self) -> Option<Pid> {
		self.pid(self.reaped())
	}

	pub fn mark_reaped(&self) {
		let reaped = self.reaped.load(Ordering::Relaxed);
		debug_assert!(reaped < self.launched());
		self.reaped.store(reaped + 1, Ordering::Release);
	}

	pub fn unreaped(&self) -> usize {
		self.launched().saturating_sub(self.reaped())
	}

	pub fn pids(&self) -> Vec<Pid> {
		(0..self.launched()).filter_map(|idx| self.pid(idx)).collect()
	}

	/// Sends `sig` to every launched process that has not been reaped yet.
	/// Async-signal-safe. Returns how many processes were signalled.
	pub fn signal_unreaped(&self, sig: Signal) -> usize {
		let launched = self.launched();
		let mut sent = 0;
		for idx in self.reaped()..launched {
			let pid = Pid::from_raw(self.pids[idx].load(Ordering::Relaxed));
			if kill(pid, sig).is_ok() {
				sent += 1;
			}
		}
		sent
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn record_and_reap_in_order() {
		let registry = Registry::with_capacity(3);
		assert_eq!(registry.next_unreaped(), None);
		assert!(registry.record(Pid::from_raw(100)));
		assert!(registry.record(Pid::from_raw(101)));
		assert_eq!(registry.launched(), 2);
		assert_eq!(registry.unreaped(), 2);
		assert_eq!(registry.next_unreaped(), Some(Pid::from_raw(100)));

		registry.mark_reaped();
		assert_eq!(registry.next_unreaped(), Some(Pid::from_raw(101)));
		registry.mark_reaped();
		assert_eq!(registry.next_unreaped(), None);
		assert_eq!(registry.unreaped(), 0);
		assert_eq!(registry.pids(), [Pid::from_raw(100), Pid::from_raw(101)]);
	}

	#[test]
	fn record_past_capacity_fails() {
		let registry = Registry::with_capacity(1);
		assert!(registry.record(Pid::from_raw(7)));
		assert!(!registry.record(Pid::from_raw(8)));
		assert_eq!(registry.launched(), 1);
	}

	#[test]
	fn unlaunched_slots_are_hidden() {
		let registry = Registry::with_capacity(4);
		assert_eq!(registry.capacity(), 4);
		assert_eq!(registry.pid(0), None);
		assert!(registry.pids().is_empty());
	}

	#[test]
	fn empty_registry_signals_nobody() {
		let registry = Registry::with_capacity(2);
		assert_eq!(registry.signal_unreaped(Signal::SIGINT), 0);
	}
}
