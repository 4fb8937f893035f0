use std::os::unix::ffi::OsStrExt;

use crate::prelude::*;

/// A command converted into the exact C-level data `execvp` needs.
///
/// Everything is built in the parent before forking. The child of a
/// multi-threaded process may not touch the allocator, so it only ever
/// reads from a `PreparedStage`.
#[derive(Debug)]
pub struct PreparedStage {
	argv: Vec<CString>,
	// Points into `argv`, terminated by a null pointer
	argv_ptrs: Vec<*const c_char>,
	input: Option<CString>,
	output: Option<CString>,
}

impl PreparedStage {
	pub fn new(command: &Command) -> Result<Self, ExecError> {
		if command.name().is_empty() {
			return Err(ExecError::InvalidCommand("empty command name".into()))
		}
		let mut argv = Vec::with_capacity(command.arguments().len() + 1);
		argv.push(CString::new(command.name())?);
		for arg in command.arguments() {
			argv.push(CString::new(arg.as_str())?);
		}
		let argv_ptrs = argv.iter()
			.map(|arg| arg.as_ptr())
			.chain(std::iter::once(std::ptr::null()))
			.collect::<Vec<_>>();

		let input = command.input().map(path_to_cstring).transpose()?;
		let output = command.output().map(path_to_cstring).transpose()?;

		Ok(Self { argv, argv_ptrs, input, output })
	}

	pub fn name(&self) -> &CStr {
		&self.argv[0]
	}

	pub fn argv(&self) -> &[CString] {
		&self.argv
	}

	/// Null-terminated argument vector, valid for as long as `self` is
	pub fn argv_ptr(&self) -> *const *const c_char {
		self.argv_ptrs.as_ptr()
	}

	pub fn input(&self) -> Option<&CStr> {
		self.input.as_deref()
	}

	pub fn output(&self) -> Option<&CStr> {
		self.output.as_deref()
	}
}

/// Prepares every stage of `list`, so a bad argument is caught before anything is forked
pub fn prepare_all(list: &CommandList) -> Result<Vec<PreparedStage>, ExecError> {
	list.iter().map(PreparedStage::new).collect()
}

fn path_to_cstring(path: &Path) -> Result<CString, ExecError> {
	Ok(CString::new(path.as_os_str().as_bytes())?)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn argv_starts_with_name() {
		let cmd = Command::new("echo").args(["a", "b c"]);
		let stage = PreparedStage::new(&cmd).unwrap();
		assert_eq!(stage.name().to_str().unwrap(), "echo");
		let argv = stage.argv().iter().map(|a| a.to_str().unwrap()).collect::<Vec<_>>();
		assert_eq!(argv, ["echo", "a", "b c"]);
	}

	#[test]
	fn argv_ptrs_are_null_terminated() {
		let stage = PreparedStage::new(&Command::new("true").arg("x")).unwrap();
		let ptrs = unsafe { std::slice::from_raw_parts(stage.argv_ptr(), 3) };
		assert_eq!(ptrs[0], stage.argv()[0].as_ptr());
		assert_eq!(ptrs[1], stage.argv()[1].as_ptr());
		assert!(ptrs[2].is_null());
	}

	#[test]
	fn redirects_carried_over() {
		let cmd = Command::new("cat").read_from("/tmp/in").write_to("/tmp/out");
		let stage = PreparedStage::new(&cmd).unwrap();
		assert_eq!(stage.input().unwrap().to_str().unwrap(), "/tmp/in");
		assert_eq!(stage.output().unwrap().to_str().unwrap(), "/tmp/out");
	}

	#[test]
	fn nul_byte_rejected() {
		let list = CommandList::from(vec![Command::new("true"), Command::new("echo").arg("a\0b")]);
		let err = prepare_all(&list).unwrap_err();
		assert!(matches!(err, ExecError::Nul(_)));
	}
}
