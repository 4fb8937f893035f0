use thiserror::Error;

use crate::prelude::*;

// Three layers of errors, from the inside out.
// A setup error happens inside a forked child and never crosses the fork; the parent only learns about it through the self-pipe.
// An exec error is raised by the launching process itself while running a pipeline.
// A shell error is what the read-eval loop sees.

pub type ShellResult<T> = Result<T, ShellError>;

/// Errors raised by the launching process while it runs a pipeline
#[derive(Debug, Error)]
pub enum ExecError {
	/// A process or descriptor primitive failed in the launching process itself.
	/// The host is in a state we cannot reason about, so the shell terminates on this.
	#[error("{op}: {errno}")]
	Fatal { op: &'static str, errno: Errno },

	#[error("Invalid argument: {0}")]
	Nul(#[from] std::ffi::NulError),

	#[error("Invalid command list: {0}")]
	InvalidCommand(String),
}

impl ExecError {
	pub fn fatal(op: &'static str, errno: Errno) -> Self {
		Self::Fatal { op, errno }
	}

	pub fn from_io(op: &'static str, error: io::Error) -> Self {
		Self::Fatal { op, errno: crate::fd::errno_of(&error) }
	}

	pub fn is_fatal(&self) -> bool {
		matches!(self, Self::Fatal { .. })
	}
}

/// Failures while preparing a child's process image.
///
/// These only ever exist between `fork` and `exec`, so they borrow the stage's
/// pre-built C strings instead of owning anything, and their `Display` output
/// never allocates for valid UTF-8 names.
#[derive(Debug, Error)]
pub enum SetupError<'a> {
	#[error("{stream}: {errno}")]
	Dup { stream: &'static str, errno: Errno },

	#[error("{}: {errno}", path.to_string_lossy())]
	Redirect { path: &'a CStr, errno: Errno },

	#[error("{}: command not found", name.to_string_lossy())]
	NotFound { name: &'a CStr },

	#[error("{}: {errno}", name.to_string_lossy())]
	Exec { name: &'a CStr, errno: Errno },

	#[error("SIGINT: {0}")]
	Signal(Errno),
}

/// Errors seen by the read-eval loop
#[derive(Debug, Error)]
pub enum ShellError {
	#[error("Parse Error: {0}")]
	Parse(String),

	#[error(transparent)]
	Exec(#[from] ExecError),

	#[error("cd: {}: {source}", path.display())]
	ChangeDir { path: PathBuf, source: io::Error },

	#[error("Readline Error: {0}")]
	Readline(#[from] rustyline::error::ReadlineError),
}

impl ShellError {
	/// Fatal errors end the shell, everything else is reported and the loop carries on
	pub fn is_fatal(&self) -> bool {
		match self {
			ShellError::Exec(e) => e.is_fatal(),
			ShellError::Readline(..) => true,
			ShellError::Parse(..) => false,
			ShellError::ChangeDir { .. } => false,
		}
	}
}
