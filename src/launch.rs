use std::io::{Read, Write};

use log::{debug, trace};

use crate::{
	cursor::{PipeCursor, PipePair},
	prelude::*,
	setup,
	stage::PreparedStage
};

/// What the self-pipe handshake reported for one stage.
/// Every variant carries the forked child, which still has to be reaped.
#[derive(Debug)]
pub enum Launch {
	/// The child replaced its image
	Running(Pid),
	/// The child failed before or during `exec` and is exiting
	Failed(Pid),
	/// The child was forked but the handshake itself broke down
	Unconfirmed(Pid, ExecError),
}

impl Launch {
	pub fn pid(&self) -> Pid {
		match self {
			Launch::Running(pid) | Launch::Failed(pid) | Launch::Unconfirmed(pid, _) => *pid,
		}
	}
}

/// Forks the stage under `cursor` and blocks until its child has either
/// replaced its image or given up.
///
/// A private close-on-exec pipe carries the answer. The child writes a single
/// byte to it if setup fails. If `exec` succeeds the kernel closes the child's
/// write end and the parent reads end-of-stream instead.
pub fn launch(stage: &PreparedStage, cursor: &mut PipeCursor) -> Result<Launch, ExecError> {
	let (mut handshake_r, mut handshake_w) = RustFd::pipe()
		.map_err(|e| ExecError::from_io("pipe", e))?;

	if !cursor.is_last() {
		let pair = PipePair::open().map_err(|e| ExecError::from_io("pipe", e))?;
		cursor.set_output(pair);
	}

	match unsafe { fork() } {
		Ok(ForkResult::Child) => {
			drop(handshake_r);
			// Already close-on-exec from pipe(), this only makes sure of it
			let _ = handshake_w.set_cloexec();

			match setup::replace_image(stage, cursor) {
				Ok(never) => match never {},
				Err(error) => setup::report(&error),
			}
			let _ = handshake_w.write(&[1]);
			unsafe { libc::_exit(1) }
		}
		Ok(ForkResult::Parent { child }) => {
			drop(handshake_w);
			release_parent_ends(cursor);
			trace!("forked {:?} as {}", stage.name(), child);

			let mut buf = [0u8; 1];
			match handshake_r.read(&mut buf) {
				Ok(0) => {
					debug!("stage {:?} running as {}", stage.name(), child);
					Ok(Launch::Running(child))
				}
				Ok(_) => {
					debug!("stage {:?} ({}) failed to start", stage.name(), child);
					Ok(Launch::Failed(child))
				}
				Err(e) => Ok(Launch::Unconfirmed(child, ExecError::from_io("read self-pipe", e))),
			}
		}
		Err(e) => Err(ExecError::fatal("fork", e)),
	}
}

/// Drops the pipe ends that now belong to the child alone.
/// Only the read end feeding the next stage stays open in the parent.
fn release_parent_ends(cursor: &mut PipeCursor) {
	if !cursor.is_last() {
		cursor.output_mut().write.take();
	}
	if !cursor.is_first() {
		cursor.input_mut().read.take();
	}
}
