use log::{trace, warn};
use nix::sys::wait::waitpid;

use crate::{prelude::*, registry::Registry, signal::SigintWindow};

/// Reaps every launched process of `registry` in launch order.
///
/// SIGINT is deliverable for exactly this long, so the forwarder only ever
/// runs against a registry whose launches are complete.
pub fn wait_all(registry: &Registry) -> Result<Vec<WaitStatus>, ExecError> {
	let window = SigintWindow::open()?;
	let mut statuses = Vec::with_capacity(registry.launched());

	while let Some(pid) = registry.next_unreaped() {
		let status = loop {
			match waitpid(pid, None) {
				Ok(status) => break Some(status),
				Err(Errno::EINTR) => continue,
				Err(e) => {
					// Nothing left to wait for, someone else collected it
					warn!("waitpid({}) failed: {}", pid, e);
					break None
				}
			}
		};
		// Before anything else, so the forwarder never signals a pid that may be reused
		registry.mark_reaped();
		trace!("reaped {}: {:?}", pid, status);
		statuses.push(status.unwrap_or(WaitStatus::StillAlive));
	}

	window.close()?;
	Ok(statuses)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn reaps_in_launch_order() {
		let registry = Registry::with_capacity(2);
		let slow = std::process::Command::new("sh").args(["-c", "sleep 0.2; exit 3"]).spawn().unwrap();
		let fast = std::process::Command::new("true").spawn().unwrap();
		let slow = Pid::from_raw(slow.id() as i32);
		let fast = Pid::from_raw(fast.id() as i32);
		registry.record(slow);
		registry.record(fast);

		let statuses = wait_all(&registry).unwrap();
		assert_eq!(statuses, [WaitStatus::Exited(slow, 3), WaitStatus::Exited(fast, 0)]);
		assert_eq!(registry.reaped(), 2);
		assert_eq!(registry.next_unreaped(), None);
	}

	#[test]
	fn already_collected_child_is_marked_reaped() {
		let registry = Registry::with_capacity(1);
		let mut child = std::process::Command::new("true").spawn().unwrap();
		registry.record(Pid::from_raw(child.id() as i32));
		child.wait().unwrap();

		let statuses = wait_all(&registry).unwrap();
		assert_eq!(statuses, [WaitStatus::StillAlive]);
		assert_eq!(registry.unreaped(), 0);
	}
}
