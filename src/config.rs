use std::io::ErrorKind;
use bevy::prelude::*;
use quest_xr::gfx::GfxError;
use quest_xr::prelude::*;
use quest_xr::utils::io;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shipped configuration. Used when no override file exists.
pub const DEFAULT_CONFIG: &str = include_str!("../assets/quest_xr.toml");

/// Override read from the external data path (or the APK assets) on Android and the working directory elsewhere.
pub const CONFIG_PATH: &str = "quest_xr.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("Failed to read {CONFIG_PATH}: {0}")]
	Io(#[from] std::io::Error),
	#[error("{CONFIG_PATH} is not valid UTF-8: {0}")]
	Utf8(#[from] std::string::FromUtf8Error),
	#[error("Failed to parse {CONFIG_PATH}: {0}")]
	Parse(#[from] toml::de::Error),
	#[error("Invalid [render] settings in {CONFIG_PATH}: {0}")]
	Invalid(#[from] GfxError),
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
	pub level: LogLevel,
	pub filter: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
	pub log: LogConfig,
	pub render: RenderSettings,
	pub xr: XrSettings,
	pub input: InputSettings,
}

impl AppConfig {
	/// Reads the override file, falling back to the shipped defaults if there is none.
	pub fn load() -> Result<Self, ConfigError> {
		match io::read(CONFIG_PATH) {
			Ok(bytes) => Self::parse(&String::from_utf8(bytes)?),
			Err(e) if e.kind() == ErrorKind::NotFound => Self::parse(DEFAULT_CONFIG),
			Err(e) => Err(e.into()),
		}
	}

	pub fn parse(s: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(s)?;
		config.render.validate()?;
		Ok(config)
	}

	/// Inserts the settings as resources and adds the app plugins configured from this.
	pub fn apply(self, app: &mut App) -> &mut App {
		app
			.insert_resource(self.render)
			.insert_resource(self.xr)
			.insert_resource(self.input)
			.add_plugins(QuestXrPlugin {
				log_level: self.log.level,
				log_filter: self.log.filter,
			})
	}
}

#[cfg(test)]
mod tests {
	use quest_xr::gfx::gfx_utils::MsaaCount;
	use super::*;

	#[test]
	fn shipped_config_matches_defaults() {
		let config = AppConfig::parse(DEFAULT_CONFIG).unwrap();
		let defaults = AppConfig::default();

		assert_eq!(config.log.level, LogLevel::Info);
		assert_eq!(config.render.frames_in_flight, defaults.render.frames_in_flight);
		assert_eq!(config.render.near_z, defaults.render.near_z);
		assert_eq!(config.render.far_z, defaults.render.far_z);
		assert_eq!(config.render.clear_color, defaults.render.clear_color);
		assert_eq!(config.render.max_msaa, MsaaCount::Sample64);
		assert_eq!(config.xr.app_space, defaults.xr.app_space);
		assert_eq!(config.xr.visualized_spaces, defaults.xr.visualized_spaces);
		assert_eq!(config.input.grab_haptic_threshold, defaults.input.grab_haptic_threshold);
	}

	#[test]
	fn sections_are_optional() {
		let config = AppConfig::parse("[xr]\napp_space = \"Stage\"\n").unwrap();
		assert_eq!(config.xr.app_space, "Stage");
		assert_eq!(config.xr.application_name, "quest-xr");
		assert_eq!(config.render.frames_in_flight, 2);
		assert_eq!(config.log.level, LogLevel::Info);
		assert!(config.log.filter.is_none());

		let config = AppConfig::parse("").unwrap();
		assert_eq!(config.input.haptic_amplitude, 0.5);
	}

	#[test]
	fn invalid_values_are_rejected() {
		assert!(matches!(AppConfig::parse("[render]\nmax_msaa = 3\n"), Err(ConfigError::Parse(_))));
		assert!(matches!(AppConfig::parse("[log]\nlevel = \"loud\"\n"), Err(ConfigError::Parse(_))));
		assert!(matches!(AppConfig::parse("[render"), Err(ConfigError::Parse(_))));
		assert!(matches!(
			AppConfig::parse("[render]\nframes_in_flight = 0\n"),
			Err(ConfigError::Invalid(GfxError::NoFramesInFlight)),
		));
	}
}
