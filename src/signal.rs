use log::{debug, error};
use nix::sys::signal::{signal, SigHandler, SigSet};
use signal_hook::{consts::SIGINT, SigId};

use crate::{interrupt, prelude::*};

// SIGINT is kept blocked by the shell at all times except while a pipeline is being waited on.
// Reading a command line, launching stages and everything in between run with it blocked.

fn sigint_set() -> SigSet {
	let mut set = SigSet::empty();
	set.add(Signal::SIGINT);
	set
}

pub fn disable_sigint() -> Result<(), ExecError> {
	sigint_set().thread_block().map_err(|e| ExecError::fatal("disable_sigint", e))
}

pub fn enable_sigint() -> Result<(), ExecError> {
	sigint_set().thread_unblock().map_err(|e| ExecError::fatal("enable_sigint", e))
}

/// The span of time during which SIGINT may be delivered.
/// It is unblocked when the window opens and blocked again when it closes.
#[derive(Debug)]
pub struct SigintWindow {
	open: bool,
}

impl SigintWindow {
	pub fn open() -> Result<Self, ExecError> {
		enable_sigint()?;
		Ok(Self { open: true })
	}

	pub fn close(mut self) -> Result<(), ExecError> {
		self.open = false;
		disable_sigint()
	}
}

impl Drop for SigintWindow {
	fn drop(&mut self) {
		if self.open {
			if let Err(e) = disable_sigint() {
				error!("Failed to block SIGINT again: {}", e);
			}
		}
	}
}

/// Gives a freshly forked child default SIGINT behavior and unblocks it.
///
/// The disposition is reset before unblocking so that a signal arriving
/// before `exec` kills the child instead of running the shell's forwarder
/// against the child's copy of the registry.
pub fn reset_in_child() -> Result<(), Errno> {
	unsafe { signal(Signal::SIGINT, SigHandler::SigDfl) }?;
	sigint_set().thread_unblock()
}

/// Blocks SIGINT and installs the handler that forwards it to the running pipeline.
/// Meant to be called once, at startup, before any pipeline runs.
pub fn install() -> Result<SigId, ExecError> {
	disable_sigint()?;
	let id = unsafe {
		signal_hook::low_level::register(SIGINT, || {
			interrupt::interrupt();
		})
	}.map_err(|e| ExecError::from_io("install SIGINT handler", e))?;
	debug!("SIGINT handler installed");
	Ok(id)
}
