use log::trace;
use pest::{iterators::Pair, Parser};
use thiserror::Error;

use crate::prelude::*;

#[derive(pest_derive::Parser)]
#[grammar_inline = r##"
WHITESPACE  = _{ " " | "\t" }

line        =  { SOI ~ pipeline? ~ NEWLINE? ~ EOI }
pipeline    =  { command ~ ("|" ~ command)* }
command     =  { redir* ~ word ~ (redir | word)* }

redir       = _{ redir_in | redir_out }
redir_in    =  { "<" ~ word }
redir_out   =  { ">" ~ word }

// A word is any run of bare text and quoted strings with nothing in between
word        = ${ (squoted | dquoted | bare)+ }
bare        = @{ (!(WHITESPACE | NEWLINE | "|" | "<" | ">" | "'" | "\"") ~ ANY)+ }
squoted     = ${ "'" ~ squote_body ~ "'" }
squote_body = @{ (!"'" ~ ANY)* }
dquoted     = ${ "\"" ~ dquote_body ~ "\"" }
dquote_body = @{ ("\\\"" | "\\\\" | !"\"" ~ ANY)* }
"##]
pub struct LineParser;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct ParseError(Box<pest::error::Error<Rule>>);

impl From<pest::error::Error<Rule>> for ParseError {
	fn from(e: pest::error::Error<Rule>) -> Self {
		Self(Box::new(e))
	}
}

impl From<ParseError> for ShellError {
	fn from(e: ParseError) -> Self {
		ShellError::Parse(e.to_string())
	}
}

/// Parses one input line into the pipeline it describes.
/// A blank line gives an empty list.
pub fn parse_line(input: &str) -> Result<CommandList, ParseError> {
	let mut list = CommandList::new();
	let line = LineParser::parse(Rule::line, input)?;
	for pair in line.flatten().filter(|pair| pair.as_rule() == Rule::command) {
		list.push(build_command(pair));
	}
	trace!("parsed {:?} into {:?}", input, list);
	Ok(list)
}

fn build_command(pair: Pair<Rule>) -> Command {
	let mut name = None;
	let mut args = vec![];
	let mut input = None;
	let mut output = None;
	for part in pair.into_inner() {
		match part.as_rule() {
			Rule::word => {
				let word = build_word(part);
				if name.is_none() {
					name = Some(word);
				} else {
					args.push(word);
				}
			}
			Rule::redir_in => input = part.into_inner().next().map(build_word),
			Rule::redir_out => output = part.into_inner().next().map(build_word),
			_ => unreachable!("unexpected rule in command: {:?}", part.as_rule())
		}
	}
	// The grammar guarantees a word, so the name is never empty here
	let mut command = Command::new(name.unwrap_or_default()).args(args);
	if let Some(path) = input {
		command = command.read_from(path);
	}
	if let Some(path) = output {
		command = command.write_to(path);
	}
	command
}

fn build_word(pair: Pair<Rule>) -> String {
	let mut word = String::new();
	for part in pair.into_inner() {
		match part.as_rule() {
			Rule::bare => word.push_str(part.as_str()),
			Rule::squoted => {
				let body = part.into_inner().next();
				word.push_str(body.map_or("", |body| body.as_str()));
			}
			Rule::dquoted => {
				let body = part.into_inner().next();
				word.push_str(&unescape(body.map_or("", |body| body.as_str())));
			}
			_ => unreachable!("unexpected rule in word: {:?}", part.as_rule())
		}
	}
	word
}

/// Resolves `\"` and `\\` inside double quotes, other backslashes are kept
fn unescape(body: &str) -> String {
	let mut result = String::with_capacity(body.len());
	let mut chars = body.chars().peekable();
	while let Some(c) = chars.next() {
		if c == '\\' {
			if let Some(&next) = chars.peek() {
				if next == '"' || next == '\\' {
					result.push(next);
					chars.next();
					continue
				}
			}
		}
		result.push(c);
	}
	result
}

#[cfg(test)]
mod tests {
	use super::*;

	fn names(list: &CommandList) -> Vec<&str> {
		list.iter().map(|cmd| cmd.name()).collect()
	}

	#[test]
	fn simple_command() {
		let list = parse_line("ls -l /home/user").unwrap();
		assert_eq!(names(&list), ["ls"]);
		assert_eq!(list.first().unwrap().arguments(), ["-l", "/home/user"]);
	}

	#[test]
	fn pipeline_stages() {
		let list = parse_line("cat file | grep foo|wc -l").unwrap();
		assert_eq!(names(&list), ["cat", "grep", "wc"]);
	}

	#[test]
	fn redirections() {
		let list = parse_line("sort < in.txt > out.txt").unwrap();
		let cmd = list.first().unwrap();
		assert_eq!(cmd.name(), "sort");
		assert!(cmd.arguments().is_empty());
		assert_eq!(cmd.input(), Some(Path::new("in.txt")));
		assert_eq!(cmd.output(), Some(Path::new("out.txt")));
	}

	#[test]
	fn redirection_before_name() {
		let list = parse_line("<in.txt tr a b").unwrap();
		let cmd = list.first().unwrap();
		assert_eq!(cmd.name(), "tr");
		assert_eq!(cmd.arguments(), ["a", "b"]);
		assert_eq!(cmd.input(), Some(Path::new("in.txt")));
	}

	#[test]
	fn quoted_words() {
		let list = parse_line(r#"echo 'a | b' "say \"hi\"" mixed'quo'"ted""#).unwrap();
		let cmd = list.first().unwrap();
		assert_eq!(cmd.arguments(), ["a | b", "say \"hi\"", "mixedquoted"]);
	}

	#[test]
	fn blank_line_is_empty() {
		assert!(parse_line("").unwrap().is_empty());
		assert!(parse_line("   \t").unwrap().is_empty());
	}

	#[test]
	fn dangling_pipe_is_an_error() {
		assert!(parse_line("ls |").is_err());
		assert!(parse_line("| ls").is_err());
		assert!(parse_line("cat <").is_err());
	}

	#[test]
	fn unescape_keeps_unknown_escapes() {
		assert_eq!(unescape(r#"a\"b\\c\n"#), "a\"b\\c\\n");
	}
}
