use crate::prelude::*;

/// One stage of a pipeline, as produced by the parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
	name: String,
	args: Vec<String>,
	input: Option<PathBuf>,
	output: Option<PathBuf>,
}

impl Command {
	pub fn new(name: impl Into<String>) -> Self {
		Self { name: name.into(), args: vec![], input: None, output: None }
	}

	pub fn arg(mut self, arg: impl Into<String>) -> Self {
		self.args.push(arg.into());
		self
	}

	pub fn args<I, S>(mut self, args: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.args.extend(args.into_iter().map(Into::into));
		self
	}

	/// Redirect standard input from `path`
	pub fn read_from(mut self, path: impl Into<PathBuf>) -> Self {
		self.input = Some(path.into());
		self
	}

	/// Redirect standard output to `path`, creating or truncating it
	pub fn write_to(mut self, path: impl Into<PathBuf>) -> Self {
		self.output = Some(path.into());
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn arguments(&self) -> &[String] {
		&self.args
	}

	pub fn input(&self) -> Option<&Path> {
		self.input.as_deref()
	}

	pub fn output(&self) -> Option<&Path> {
		self.output.as_deref()
	}
}

/// The ordered stages of a single pipeline. Stage `i` feeds stage `i + 1`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandList {
	commands: Vec<Command>,
}

impl CommandList {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push(&mut self, command: Command) {
		self.commands.push(command);
	}

	pub fn len(&self) -> usize {
		self.commands.len()
	}

	pub fn is_empty(&self) -> bool {
		self.commands.is_empty()
	}

	pub fn iter(&self) -> std::slice::Iter<'_, Command> {
		self.commands.iter()
	}

	pub fn first(&self) -> Option<&Command> {
		self.commands.first()
	}

	/// Checks the preconditions the executor relies on
	pub fn validate(&self) -> Result<(), ExecError> {
		if self.commands.is_empty() {
			return Err(ExecError::InvalidCommand("empty pipeline".into()))
		}
		if let Some(pos) = self.commands.iter().position(|cmd| cmd.name.is_empty()) {
			return Err(ExecError::InvalidCommand(format!("stage {} has no command name", pos + 1)))
		}
		Ok(())
	}
}

impl From<Vec<Command>> for CommandList {
	fn from(commands: Vec<Command>) -> Self {
		Self { commands }
	}
}

impl FromIterator<Command> for CommandList {
	fn from_iter<I: IntoIterator<Item = Command>>(iter: I) -> Self {
		Self { commands: iter.into_iter().collect() }
	}
}

impl<'a> IntoIterator for &'a CommandList {
	type Item = &'a Command;
	type IntoIter = std::slice::Iter<'a, Command>;

	fn into_iter(self) -> Self::IntoIter {
		self.commands.iter()
	}
}
