use log::{debug, trace};
use nix::unistd::{getuid, User};
use rustyline::{error::ReadlineError, DefaultEditor};

use crate::{config::Config, exec, parse, prelude::*};

/// The read-eval loop around the pipeline executor
#[derive(Debug)]
pub struct Shell {
	config: Config,
	last_status: i32,
}

impl Shell {
	pub fn new(config: Config) -> Self {
		Self { config, last_status: 0 }
	}

	pub fn last_status(&self) -> i32 {
		self.last_status
	}

	/// Parses and runs one line. Returns the status of what ran.
	pub fn eval_line(&mut self, line: &str) -> ShellResult<i32> {
		let list = parse::parse_line(line)?;
		if list.is_empty() {
			return Ok(self.last_status)
		}
		list.validate()?;

		let status = match list.first() {
			Some(cmd) if cmd.name() == "cd" => {
				self.change_dir(cmd.arguments().first().map(String::as_str))?;
				0
			}
			_ => {
				let outcome = exec::execute(&list)?;
				trace!("pipeline finished: {:?}", outcome);
				outcome.exit_code()
			}
		};
		self.last_status = status;
		Ok(status)
	}

	/// The `cd` builtin: changes to `target`, or to the user's home directory without one
	pub fn change_dir(&self, target: Option<&str>) -> ShellResult<()> {
		let path = match target {
			Some(dir) => PathBuf::from(dir),
			None => home_dir(),
		};
		env::set_current_dir(&path).map_err(|source| ShellError::ChangeDir { path: path.clone(), source })?;
		debug!("changed directory to {}", path.display());
		Ok(())
	}

	/// Runs the shell: the `-c` line if one was given, the interactive loop otherwise.
	/// Returns the exit status for the process.
	pub fn run(&mut self) -> ShellResult<i32> {
		if let Some(line) = self.config.command.clone() {
			return match self.eval_line(&line) {
				Ok(status) => Ok(status),
				Err(e) if e.is_fatal() => Err(e),
				Err(e) => {
					eprintln!("seash: {}", e);
					Ok(1)
				}
			}
		}
		self.interactive()
	}

	fn interactive(&mut self) -> ShellResult<i32> {
		let config = rustyline::Config::builder()
			.auto_add_history(self.config.history)
			.build();
		let mut rl = DefaultEditor::with_config(config)?;
		let prompt = format!("{} ", self.config.prompt);

		loop {
			match rl.readline(&prompt) {
				Ok(line) => match self.eval_line(&line) {
					Ok(_) => {}
					Err(e) if e.is_fatal() => return Err(e),
					Err(e) => eprintln!("seash: {}", e),
				},
				// Ctrl-C at the prompt only discards the line
				Err(ReadlineError::Interrupted) => continue,
				Err(ReadlineError::Eof) => break,
				Err(e) => return Err(e.into()),
			}
		}
		Ok(self.last_status)
	}
}

/// Home directory of the current user, from the password database first and `$HOME` second
fn home_dir() -> PathBuf {
	match User::from_uid(getuid()) {
		Ok(Some(user)) => user.dir,
		_ => env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("/")),
	}
}
