pub use std::{
	convert::Infallible,
	env,
	ffi::{
		CStr,
		CString
	},
	fmt,
	io,
	os::fd::{
		AsRawFd,
		FromRawFd,
		IntoRawFd,
		RawFd
	},
	path::{
		Path,
		PathBuf
	},
	sync::atomic::{
		AtomicI32,
		AtomicPtr,
		AtomicUsize,
		Ordering
	}
};

pub use libc::{
	c_char,
	mode_t,
	STDIN_FILENO,
	STDOUT_FILENO,
	STDERR_FILENO,
	O_CLOEXEC,
	O_CREAT,
	O_RDONLY,
	O_TRUNC,
	O_WRONLY
};
pub use nix::{
	errno::Errno,
	sys::{
		signal::Signal,
		wait::WaitStatus
	},
	unistd::{
		fork,
		ForkResult,
		Pid
	}
};
pub use bitflags::bitflags;
pub use crate::{
	command::{
		Command,
		CommandList
	},
	error::{
		ExecError,
		SetupError,
		ShellError,
		ShellResult
	},
	fd::RustFd,
};
