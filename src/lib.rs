//! `seash` runs shell pipelines: one process per command, adjacent stages
//! joined by pipes, optional file redirections, and SIGINT forwarded to every
//! stage while the shell waits for them.

pub mod prelude;
pub mod error;
pub mod command;
pub mod fd;
pub mod cursor;
pub mod redirect;
pub mod stage;
pub mod setup;
pub mod launch;
pub mod registry;
pub mod interrupt;
pub mod signal;
pub mod wait;
pub mod exec;
pub mod parse;
pub mod config;
pub mod shell;

pub use exec::{execute, Outcome};
pub use interrupt::interrupt;
