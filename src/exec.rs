use log::{debug, error};

use crate::{
	cursor::PipeCursor,
	interrupt::Published,
	launch::{self, Launch},
	prelude::*,
	registry::Registry,
	signal,
	stage,
	wait
};

/// How a pipeline went
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
	/// Every launched process, in launch order
	pub pids: Vec<Pid>,
	/// The reaped status of each entry of `pids`.
	/// `WaitStatus::StillAlive` marks a process whose status could not be collected.
	pub statuses: Vec<WaitStatus>,
	/// Index of the stage that failed to start, if any. Later stages were never forked.
	pub failed_stage: Option<usize>,
}

impl Outcome {
	pub fn launched(&self) -> usize {
		self.pids.len()
	}

	pub fn is_aborted(&self) -> bool {
		self.failed_stage.is_some()
	}

	/// Shell-style status of the pipeline: that of the last stage that ran,
	/// `128 + n` if it was killed by signal `n`
	pub fn exit_code(&self) -> i32 {
		match self.statuses.last() {
			Some(WaitStatus::Exited(_, code)) => *code,
			Some(WaitStatus::Signaled(_, sig, _)) => 128 + *sig as i32,
			Some(_) => 1,
			None => 0,
		}
	}
}

/// What the launch loop does after a stage has been forked
#[derive(Debug)]
enum Settled {
	Running,
	Failed,
	Fatal(ExecError),
}

/// Records the child of `launched` so that it gets reaped whatever happened to it
fn settle(registry: &Registry, launched: Launch) -> Settled {
	let recorded = registry.record(launched.pid());
	debug_assert!(recorded, "registry holds one slot per stage");
	match launched {
		Launch::Running(_) => Settled::Running,
		Launch::Failed(_) => Settled::Failed,
		Launch::Unconfirmed(_, e) => Settled::Fatal(e),
	}
}

/// Runs `list` as one pipeline and waits for all of its stages.
///
/// Stages are launched left to right, each one confirmed before the next is
/// forked. If a stage fails to start, no further stages are launched and the
/// ones already running are waited for.
///
/// A fatal error is only returned once every launched stage has been reaped.
pub fn execute(list: &CommandList) -> Result<Outcome, ExecError> {
	list.validate()?;
	let stages = stage::prepare_all(list)?;
	signal::disable_sigint()?;

	let registry = Registry::with_capacity(stages.len());
	let _published = Published::new(&registry);

	let mut cursor = PipeCursor::new();
	let mut failed_stage = None;
	let mut fatal = None;

	for (idx, stage) in stages.iter().enumerate() {
		if idx + 1 == stages.len() {
			cursor.mark_last();
		}
		let launched = match launch::launch(stage, &mut cursor) {
			Ok(launched) => launched,
			Err(e) => {
				error!("{}", e);
				fatal = Some(e);
				break
			}
		};
		match settle(&registry, launched) {
			Settled::Running => {}
			Settled::Failed => {
				failed_stage = Some(idx);
				break
			}
			Settled::Fatal(e) => {
				error!("{}", e);
				fatal = Some(e);
				break
			}
		}
		cursor.advance();
	}
	// Whatever is left of the pipes is closed before waiting
	drop(cursor);
	debug!("launched {} of {} stages", registry.launched(), stages.len());

	let statuses = wait::wait_all(&registry)?;
	if let Some(e) = fatal {
		return Err(e)
	}

	Ok(Outcome { pids: registry.pids(), statuses, failed_stage })
}

#[cfg(test)]
mod tests {
	use super::*;

	fn spawn_true() -> Pid {
		let child = std::process::Command::new("true").spawn().unwrap();
		Pid::from_raw(child.id() as i32)
	}

	#[test]
	fn unconfirmed_child_is_still_reaped() {
		let registry = Registry::with_capacity(2);
		let running = spawn_true();
		let lost = spawn_true();

		assert!(matches!(settle(&registry, Launch::Running(running)), Settled::Running));
		let broken = Launch::Unconfirmed(lost, ExecError::fatal("read self-pipe", Errno::EIO));
		match settle(&registry, broken) {
			Settled::Fatal(ExecError::Fatal { op, errno }) => {
				assert_eq!(op, "read self-pipe");
				assert_eq!(errno, Errno::EIO);
			}
			other => panic!("expected a fatal outcome, got {:?}", other),
		}
		assert_eq!(registry.pids(), [running, lost]);

		let statuses = wait::wait_all(&registry).unwrap();
		assert_eq!(statuses, [WaitStatus::Exited(running, 0), WaitStatus::Exited(lost, 0)]);
		assert_eq!(registry.unreaped(), 0);
	}

	#[test]
	fn failed_child_stops_the_loop() {
		let registry = Registry::with_capacity(1);
		let pid = spawn_true();
		assert!(matches!(settle(&registry, Launch::Failed(pid)), Settled::Failed));
		assert_eq!(registry.pids(), [pid]);
		wait::wait_all(&registry).unwrap();
	}
}
