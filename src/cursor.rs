use crate::prelude::*;

bitflags! {
	#[derive(Debug,Clone,Copy,PartialEq,Eq)]
	pub struct StageFlags: u32 {
		const FIRST = 0b00000000000000000000000000000001;
		const LAST  = 0b00000000000000000000000000000010;
	}
}

/// Both ends of one data pipe between two adjacent stages.
/// An end is `None` once it has been handed off or released.
#[derive(Debug, Default)]
pub struct PipePair {
	pub read: Option<RustFd>,
	pub write: Option<RustFd>,
}

impl PipePair {
	pub fn open() -> io::Result<Self> {
		let (read, write) = RustFd::pipe()?;
		Ok(Self { read: Some(read), write: Some(write) })
	}

	/// Releases both ends
	pub fn close(&mut self) -> io::Result<()> {
		if let Some(mut fd) = self.read.take() {
			fd.close()?;
		}
		if let Some(mut fd) = self.write.take() {
			fd.close()?;
		}
		Ok(())
	}

	pub fn is_released(&self) -> bool {
		self.read.is_none() && self.write.is_none()
	}
}

/// Tracks which pipe feeds the stage being launched and which pipe it feeds.
///
/// The cursor only hands out the pipe pairs, the launcher decides when they
/// are opened and when each end is released.
#[derive(Debug)]
pub struct PipeCursor {
	input: PipePair,
	output: PipePair,
	flags: StageFlags,
}

impl Default for PipeCursor {
	fn default() -> Self {
		Self::new()
	}
}

impl PipeCursor {
	pub fn new() -> Self {
		Self { input: PipePair::default(), output: PipePair::default(), flags: StageFlags::FIRST }
	}

	pub fn mark_last(&mut self) {
		self.flags |= StageFlags::LAST;
	}

	pub fn is_first(&self) -> bool {
		self.flags.contains(StageFlags::FIRST)
	}

	pub fn is_last(&self) -> bool {
		self.flags.contains(StageFlags::LAST)
	}

	pub fn flags(&self) -> StageFlags {
		self.flags
	}

	pub fn input_mut(&mut self) -> &mut PipePair {
		&mut self.input
	}

	pub fn output_mut(&mut self) -> &mut PipePair {
		&mut self.output
	}

	pub fn set_output(&mut self, pair: PipePair) {
		self.output = pair;
	}

	/// Moves on to the next stage: this stage's output pipe becomes the next stage's input
	pub fn advance(&mut self) {
		std::mem::swap(&mut self.input, &mut self.output);
		// What was the input is fully released by now, any leftover end is closed here
		self.output = PipePair::default();
		self.flags.remove(StageFlags::FIRST);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn starts_first_not_last() {
		let cursor = PipeCursor::new();
		assert!(cursor.is_first());
		assert!(!cursor.is_last());
		assert_eq!(cursor.flags(), StageFlags::FIRST);
	}

	#[test]
	fn advance_swaps_roles() {
		let mut cursor = PipeCursor::new();
		cursor.set_output(PipePair::open().unwrap());
		let read_fd = cursor.output_mut().read.as_ref().unwrap().as_raw_fd();
		cursor.output_mut().write.take();

		cursor.advance();
		assert!(!cursor.is_first());
		assert!(cursor.output_mut().is_released());
		let input = cursor.input_mut();
		assert_eq!(input.read.as_ref().map(|fd| fd.as_raw_fd()), Some(read_fd));
		assert!(input.write.is_none());
	}

	#[test]
	fn single_stage_is_first_and_last() {
		let mut cursor = PipeCursor::new();
		cursor.mark_last();
		assert_eq!(cursor.flags(), StageFlags::FIRST | StageFlags::LAST);
	}

	#[test]
	fn middle_stage_flags() {
		let mut cursor = PipeCursor::new();
		cursor.advance();
		assert!(!cursor.is_first());
		assert!(!cursor.is_last());
		cursor.advance();
		cursor.mark_last();
		assert_eq!(cursor.flags(), StageFlags::LAST);
	}

	#[test]
	fn close_releases_both_ends() {
		let mut pair = PipePair::open().unwrap();
		assert!(!pair.is_released());
		pair.close().unwrap();
		assert!(pair.is_released());
	}
}
