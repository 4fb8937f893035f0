// Installs the real SIGINT handler, so these live in their own test binary

use std::{
	sync::Once,
	thread,
	time::{Duration, Instant},
};

use nix::{
	sys::signal::{kill, Signal},
	sys::wait::WaitStatus,
	unistd::getpid,
};
use serial_test::serial;

use seash::{exec::execute, interrupt, prelude::*, signal};

static INSTALL: Once = Once::new();

fn install_handler() {
	INSTALL.call_once(|| {
		signal::install().unwrap();
	});
}

#[test]
#[serial]
fn sigint_reaches_every_stage() {
	install_handler();
	let list = CommandList::from(vec![
		Command::new("sleep").arg("30"),
		Command::new("sleep").arg("30"),
	]);

	let sender = thread::spawn(|| {
		let deadline = Instant::now() + Duration::from_secs(10);
		while interrupt::in_flight() < 2 && Instant::now() < deadline {
			thread::sleep(Duration::from_millis(10));
		}
		kill(getpid(), Signal::SIGINT).unwrap();
	});

	let started = Instant::now();
	let outcome = execute(&list).unwrap();
	sender.join().unwrap();

	assert!(started.elapsed() < Duration::from_secs(20));
	assert_eq!(outcome.statuses.len(), 2);
	for status in &outcome.statuses {
		assert!(matches!(status, WaitStatus::Signaled(_, Signal::SIGINT, _)));
	}
	assert!(!interrupt::is_running());
}

#[test]
#[serial]
fn sigint_before_launch_is_harmless() {
	install_handler();
	kill(getpid(), Signal::SIGINT).unwrap();
	thread::sleep(Duration::from_millis(50));

	// The shell survives and the next pipeline runs to completion
	let list = CommandList::from(vec![Command::new("echo").arg("ok"), Command::new("cat")]);
	let outcome = execute(&list).unwrap();
	assert_eq!(outcome.exit_code(), 0);
	assert!(outcome.statuses.iter().all(|status| matches!(status, WaitStatus::Exited(_, 0))));
}
