pub mod runner;

use bevy::core::{FrameCountPlugin, TaskPoolPlugin, TypeRegistrationPlugin};
use bevy::log::{Level, LogPlugin};
use bevy::prelude::*;
use bevy::state::app::StatesPlugin;
use bevy::time::TimePlugin;
use serde::{Deserialize, Serialize};

pub use quest_xr_gfx as gfx;
pub use quest_xr_utils as utils;

pub mod prelude {
	pub use crate::QuestXrPlugin;
	pub use crate::LogLevel;
	pub use quest_xr_gfx::{InputSettings, RenderSettings, XrSettings, XrState};
}

#[derive(Default, Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
	Trace,
	Debug,
	#[default]
	Info,
	Warn,
	Error,
}

impl From<LogLevel> for Level {
	fn from(level: LogLevel) -> Self {
		match level {
			LogLevel::Trace => Level::TRACE,
			LogLevel::Debug => Level::DEBUG,
			LogLevel::Info => Level::INFO,
			LogLevel::Warn => Level::WARN,
			LogLevel::Error => Level::ERROR,
		}
	}
}

/// Everything the headset app needs. Replaces `DefaultPlugins`: there is no window and the XR runner owns the main loop.
#[derive(Clone, Debug, Default)]
pub struct QuestXrPlugin {
	pub log_level: LogLevel,
	pub log_filter: Option<String>,// Defaults to LogPlugin's filter.
}

impl Plugin for QuestXrPlugin {
	fn build(&self, app: &mut App) {
		let log = LogPlugin {
			level: self.log_level.into(),
			filter: self.log_filter.clone().unwrap_or_else(|| LogPlugin::default().filter),
			..default()
		};

		app
			.add_plugins(TaskPoolPlugin::default())
			.add_plugins(TypeRegistrationPlugin)
			.add_plugins(FrameCountPlugin)
			.add_plugins(TimePlugin)
			.add_plugins(log)
			.add_plugins(StatesPlugin)
			.add_plugins(quest_xr_gfx::RenderPlugin)
			.set_runner(runner::xr_runner);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[derive(Deserialize)]
	struct Log {
		level: LogLevel,
	}

	#[test]
	fn log_levels_parse_lowercase() {
		let log: Log = toml::from_str("level = \"debug\"").unwrap();
		assert_eq!(log.level, LogLevel::Debug);
		assert_eq!(Level::from(log.level), Level::DEBUG);

		assert!(toml::from_str::<Log>("level = \"Debug\"").is_err());
		assert!(toml::from_str::<Log>("level = \"verbose\"").is_err());
	}

	#[test]
	fn default_level_is_info() {
		assert_eq!(Level::from(LogLevel::default()), Level::INFO);
	}

	// The activity backend pulls in winit, which does not build for desktop hosts.
	#[test]
	fn android_activity_is_android_only() {
		let manifests = [
			include_str!("../../../../Cargo.toml"),
			include_str!("../Cargo.toml"),
			include_str!("../../quest_xr_utils/Cargo.toml"),
		];

		for manifest in manifests {
			let manifest: toml::Table = toml::from_str(manifest).unwrap();

			let features = manifest["dependencies"]["bevy"]["features"].as_array().unwrap();
			assert!(!features.iter().any(|feature| feature.as_str() == Some("android-native-activity")));

			let android = &manifest["target"]["cfg(target_os = \"android\")"]["dependencies"]["bevy"]["features"];
			assert!(android.as_array().unwrap().iter().any(|feature| feature.as_str() == Some("android-native-activity")));
		}
	}
}
