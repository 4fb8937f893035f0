//! Process-image setup. Everything in here runs in the forked child, between
//! `fork` and `exec`, and sticks to async-signal-safe calls: no allocation, no
//! logging, no locks.

use std::fmt::Write as _;

use crate::{
	cursor::PipeCursor,
	fd::errno_of,
	prelude::*,
	redirect,
	signal,
	stage::PreparedStage
};

/// Wires the child's standard streams, applies redirections and replaces the
/// process image. Only ever returns on failure.
pub fn replace_image<'a>(stage: &'a PreparedStage, cursor: &mut PipeCursor) -> Result<Infallible, SetupError<'a>> {
	if !cursor.is_first() {
		let input = cursor.input_mut();
		wire(input.read.take(), STDIN_FILENO, "stdin")?;
		input.close().map_err(|e| SetupError::Dup { stream: "stdin", errno: errno_of(&e) })?;
	}

	if !cursor.is_last() {
		let output = cursor.output_mut();
		wire(output.write.take(), STDOUT_FILENO, "stdout")?;
		output.close().map_err(|e| SetupError::Dup { stream: "stdout", errno: errno_of(&e) })?;
	}

	// Explicit redirection wins over the pipe, so it is applied second
	if let Some(path) = stage.input() {
		redirect::redirect_stdin(path)?;
	}
	if let Some(path) = stage.output() {
		redirect::redirect_stdout(path)?;
	}

	signal::reset_in_child().map_err(SetupError::Signal)?;

	unsafe { libc::execvp(stage.name().as_ptr(), stage.argv_ptr()) };
	match Errno::last() {
		Errno::ENOENT => Err(SetupError::NotFound { name: stage.name() }),
		errno => Err(SetupError::Exec { name: stage.name(), errno }),
	}
}

/// Makes `fd` the descriptor `target`. The original descriptor is closed
/// afterwards unless it already was `target`.
fn wire(fd: Option<RustFd>, target: RawFd, stream: &'static str) -> Result<(), SetupError<'static>> {
	let Some(fd) = fd else {
		return Ok(())
	};
	fd.dup2(&target).map_err(|e| SetupError::Dup { stream, errno: errno_of(&e) })?;
	if fd.as_raw_fd() == target {
		let _ = fd.into_raw_fd();
	}
	Ok(())
}

/// Writes straight to descriptor 2, bypassing the locked and possibly
/// captured `std::io::stderr`
pub struct StderrSink;

impl fmt::Write for StderrSink {
	fn write_str(&mut self, s: &str) -> fmt::Result {
		let mut buf = s.as_bytes();
		while !buf.is_empty() {
			let result = unsafe { libc::write(STDERR_FILENO, buf.as_ptr() as *const libc::c_void, buf.len()) };
			if result < 0 {
				if Errno::last() == Errno::EINTR {
					continue
				}
				return Err(fmt::Error)
			}
			buf = &buf[result as usize..];
		}
		Ok(())
	}
}

/// Prints a setup failure on the child's standard error
pub fn report(error: &SetupError<'_>) {
	let _ = writeln!(StderrSink, "seash: {}", error);
}
