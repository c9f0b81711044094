pub mod config;

use bevy::prelude::*;
use config::AppConfig;

#[bevy_main]
pub fn main() {
	#[cfg(debug_assertions)]
	{
		unsafe { std::env::set_var("RUST_BACKTRACE", "full"); }
		if let Err(e) = color_eyre::install() {
			eprintln!("Failed to install color-eyre: {e}");
		}
	}

	// Logging is not up yet. The error is reported once the app is built.
	let (config, config_error) = match AppConfig::load() {
		Ok(config) => (config, None),
		Err(e) => (AppConfig::default(), Some(e)),
	};

	let mut app = App::new();
	config.apply(&mut app);

	if let Some(e) = config_error {
		error!("{e}. Using default configuration");
	}

	app.run();
}
