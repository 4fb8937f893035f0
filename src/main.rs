use log::{debug, error};

use seash::{config::Config, shell::Shell, signal};

fn main() {
	env_logger::init();
	let config = Config::from_env();

	if let Err(e) = signal::install() {
		error!("{}", e);
		eprintln!("seash: {}", e);
		std::process::exit(255);
	}

	let mut shell = Shell::new(config);
	debug!("Starting read-eval loop");
	let code = match shell.run() {
		Ok(code) => code,
		Err(e) => {
			error!("{}", e);
			eprintln!("seash: {}", e);
			255
		}
	};
	std::process::exit(code)
}
