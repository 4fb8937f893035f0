use crate::prelude::*;

/// An owned raw file descriptor that is closed when dropped.
///
/// Every method here boils down to a single system call, so a `RustFd` is
/// safe to use in a freshly forked child, where heap allocation and locks
/// are off limits.
#[derive(Hash, Eq, PartialEq, Debug)]
pub struct RustFd {
	fd: RawFd,
}

impl io::Read for RustFd {
	/// Reads into `buf`, retrying for as long as the call is interrupted by a signal
	fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		if !self.is_valid() {
			return Err(io::Error::from_raw_os_error(libc::EBADF))
		}
		loop {
			let result = unsafe { libc::read(self.fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len()) };
			if result >= 0 {
				return Ok(result as usize)
			}
			let err = io::Error::last_os_error();
			if err.raw_os_error() != Some(libc::EINTR) {
				return Err(err)
			}
		}
	}
}

impl io::Write for RustFd {
	/// Writes from `buf`, retrying for as long as the call is interrupted by a signal
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		if !self.is_valid() {
			return Err(io::Error::from_raw_os_error(libc::EBADF))
		}
		loop {
			let result = unsafe { libc::write(self.fd, buf.as_ptr() as *const libc::c_void, buf.len()) };
			if result >= 0 {
				return Ok(result as usize)
			}
			let err = io::Error::last_os_error();
			if err.raw_os_error() != Some(libc::EINTR) {
				return Err(err)
			}
		}
	}
	fn flush(&mut self) -> io::Result<()> {
		Ok(())
	}
}

impl RustFd {
	pub fn new(fd: RawFd) -> io::Result<Self> {
		if fd < 0 {
			return Err(io::Error::from_raw_os_error(libc::EBADF))
		}
		Ok(RustFd { fd })
	}

	/// Produces the `(read, write)` ends of a new pipe. Both ends are close-on-exec,
	/// so they only survive into a child's new image if they are duplicated onto
	/// another descriptor first.
	pub fn pipe() -> io::Result<(Self,Self)> {
		let mut fds = [0;2];
		let result = unsafe { libc::pipe2(fds.as_mut_ptr(), O_CLOEXEC) };

		if result == -1 {
			return Err(io::Error::last_os_error())
		}
		let r_fd = RustFd::new(fds[0])?;
		let w_fd = RustFd::new(fds[1])?;
		Ok((r_fd,w_fd))
	}

	/// Open a file with the given flags and permission bits
	pub fn open(path: &CStr, flags: i32, mode: mode_t) -> io::Result<Self> {
		loop {
			let file_fd = unsafe { libc::open(path.as_ptr(), flags, mode as libc::c_uint) };
			if file_fd >= 0 {
				return Self::new(file_fd)
			}
			let err = io::Error::last_os_error();
			if err.raw_os_error() != Some(libc::EINTR) {
				return Err(err)
			}
		}
	}

	/// Duplicates `self` onto `target`, which is closed first if it was open.
	/// The copy does not inherit close-on-exec.
	pub fn dup2<T: AsRawFd>(&self, target: &T) -> io::Result<()> {
		let target_fd = target.as_raw_fd();
		if !self.is_valid() || target_fd < 0 {
			return Err(io::Error::from_raw_os_error(libc::EBADF))
		}
		if self.fd == target_fd {
			// dup2() onto itself would leave close-on-exec set
			return self.clear_cloexec()
		}
		loop {
			let result = unsafe { libc::dup2(self.fd, target_fd) };
			if result >= 0 {
				return Ok(())
			}
			let err = io::Error::last_os_error();
			if err.raw_os_error() != Some(libc::EINTR) {
				return Err(err)
			}
		}
	}

	pub fn set_cloexec(&self) -> io::Result<()> {
		self.update_fd_flags(|flags| flags | libc::FD_CLOEXEC)
	}

	pub fn clear_cloexec(&self) -> io::Result<()> {
		self.update_fd_flags(|flags| flags & !libc::FD_CLOEXEC)
	}

	pub fn is_cloexec(&self) -> io::Result<bool> {
		let flags = unsafe { libc::fcntl(self.fd, libc::F_GETFD) };
		if flags < 0 {
			return Err(io::Error::last_os_error())
		}
		Ok(flags & libc::FD_CLOEXEC != 0)
	}

	fn update_fd_flags(&self, f: impl FnOnce(i32) -> i32) -> io::Result<()> {
		let flags = unsafe { libc::fcntl(self.fd, libc::F_GETFD) };
		if flags < 0 {
			return Err(io::Error::last_os_error())
		}
		if unsafe { libc::fcntl(self.fd, libc::F_SETFD, f(flags)) } < 0 {
			return Err(io::Error::last_os_error())
		}
		Ok(())
	}

	/// Closes the descriptor now instead of at drop.
	/// Not retried on EINTR: Linux has already released the descriptor by then.
	pub fn close(&mut self) -> io::Result<()> {
		if !self.is_valid() {
			return Ok(())
		}
		let result = unsafe { libc::close(self.fd) };
		self.fd = -1;
		if result < 0 {
			let err = io::Error::last_os_error();
			if err.raw_os_error() != Some(libc::EINTR) {
				return Err(err)
			}
		}
		Ok(())
	}

	pub fn is_valid(&self) -> bool {
		self.fd >= 0
	}
}

impl Drop for RustFd {
	fn drop(&mut self) {
		let _ = self.close();
	}
}

impl fmt::Display for RustFd {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.fd)
	}
}

impl AsRawFd for RustFd {
	fn as_raw_fd(&self) -> RawFd {
		self.fd
	}
}

impl IntoRawFd for RustFd {
	fn into_raw_fd(self) -> RawFd {
		let fd = self.fd;
		std::mem::forget(self);
		fd
	}
}

impl FromRawFd for RustFd {
	unsafe fn from_raw_fd(fd: RawFd) -> Self {
		RustFd { fd }
	}
}

/// Converts an OS-level `io::Error` into the errno it carries
pub fn errno_of(error: &io::Error) -> Errno {
	error.raw_os_error().map(Errno::from_raw).unwrap_or(Errno::UnknownErrno)
}
