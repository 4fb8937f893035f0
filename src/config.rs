use clap::{Arg, ArgAction};

pub const DEFAULT_PROMPT: &str = "->";

/// Startup options of the shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
	/// Printed before each line read, followed by a space
	pub prompt: String,
	/// Evaluate this single line instead of reading interactively
	pub command: Option<String>,
	/// Add entered lines to the line editor's history
	pub history: bool,
}

impl Default for Config {
	fn default() -> Self {
		Self { prompt: DEFAULT_PROMPT.into(), command: None, history: true }
	}
}

impl Config {
	pub fn cli() -> clap::Command {
		clap::Command::new("seash")
			.about("A small shell that runs pipelines of external commands")
			.arg(
				Arg::new("command")
					.short('c')
					.value_name("LINE")
					.help("Run LINE as a pipeline and exit with its status")
			)
			.arg(
				Arg::new("prompt")
					.long("prompt")
					.value_name("TEXT")
					.default_value(DEFAULT_PROMPT)
					.help("Prompt shown before each line")
			)
			.arg(
				Arg::new("no-history")
					.long("no-history")
					.action(ArgAction::SetTrue)
					.help("Do not keep a history of entered lines")
			)
	}

	pub fn from_matches(matches: &clap::ArgMatches) -> Self {
		let prompt = matches.get_one::<String>("prompt").cloned().unwrap_or_else(|| DEFAULT_PROMPT.into());
		let command = matches.get_one::<String>("command").cloned();
		let history = !matches.get_flag("no-history");
		Self { prompt, command, history }
	}

	pub fn try_from_args<I, T>(args: I) -> Result<Self, clap::Error>
	where
		I: IntoIterator<Item = T>,
		T: Into<std::ffi::OsString> + Clone,
	{
		let matches = Self::cli().try_get_matches_from(args)?;
		Ok(Self::from_matches(&matches))
	}

	/// Parses the process arguments, exiting with a usage message if they are invalid
	pub fn from_env() -> Self {
		Self::from_matches(&Self::cli().get_matches())
	}
}
