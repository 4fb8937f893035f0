use crate::{fd::errno_of, prelude::*};

/// Permission bits for files created by output redirection: rw-r--r--
pub const CREATE_MODE: mode_t = 0o644;

/// Replaces standard input with `path`, opened read-only
pub fn redirect_stdin(path: &CStr) -> Result<(), SetupError<'_>> {
	splice(path, O_RDONLY, 0, STDIN_FILENO)
}

/// Replaces standard output with `path`, created if absent and truncated if present
pub fn redirect_stdout(path: &CStr) -> Result<(), SetupError<'_>> {
	splice(path, O_WRONLY | O_CREAT | O_TRUNC, CREATE_MODE, STDOUT_FILENO)
}

fn splice(path: &CStr, flags: i32, mode: mode_t, target: RawFd) -> Result<(), SetupError<'_>> {
	let blame = |e: io::Error| SetupError::Redirect { path, errno: errno_of(&e) };
	// The opened descriptor is closed when `file` drops, leaving only the duplicate
	let file = RustFd::open(path, flags | O_CLOEXEC, mode).map_err(blame)?;
	file.dup2(&target).map_err(blame)?;
	if file.as_raw_fd() == target {
		let _ = file.into_raw_fd();
	}
	Ok(())
}
