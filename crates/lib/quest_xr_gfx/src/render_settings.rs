use bevy::prelude::*;
use quest_xr_gfx_utils::MsaaCount;
use serde::{Deserialize, Serialize};
use crate::error::GfxError;

#[derive(Clone, Debug, Reflect, Resource, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
	pub frames_in_flight: usize,
	pub near_z: f32,
	pub far_z: f32,// At or below near_z for an infinite far plane.
	pub clear_color: [f32; 4],
	// Upper bound on the sample count. The device limit still applies.
	pub max_msaa: MsaaCount,
}

impl RenderSettings {
	/// Rejects values that deserialize fine but can not be rendered with.
	pub fn validate(&self) -> Result<(), GfxError> {
		if self.frames_in_flight == 0 {
			return Err(GfxError::NoFramesInFlight);
		}

		Ok(())
	}
}

impl Default for RenderSettings {
	fn default() -> Self {
		Self {
			frames_in_flight: 2,
			near_z: 0.05,
			far_z: 100.0,
			clear_color: [0.184313729, 0.309803933, 0.309803933, 1.0],
			max_msaa: MsaaCount::Sample64,
		}
	}
}

#[derive(Clone, Debug, Reflect, Resource, Serialize, Deserialize)]
#[serde(default)]
pub struct XrSettings {
	pub application_name: String,
	// Reference space names. See ReferenceSpace.
	pub app_space: String,
	pub visualized_spaces: Vec<String>,
}

impl Default for XrSettings {
	fn default() -> Self {
		Self {
			application_name: "quest-xr".into(),
			app_space: "Local".into(),
			visualized_spaces: [
				"ViewFront",
				"Local",
				"Stage",
				"StageLeft",
				"StageRight",
				"StageLeftRotated",
				"StageRightRotated",
			]
				.into_iter()
				.map(String::from)
				.collect(),
		}
	}
}

#[derive(Clone, Debug, Reflect, Resource, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSettings {
	// Grab value above which the controller vibrates.
	pub grab_haptic_threshold: f32,
	pub haptic_amplitude: f32,
}

impl Default for InputSettings {
	fn default() -> Self {
		Self {
			grab_haptic_threshold: 0.9,
			haptic_amplitude: 0.5,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn missing_fields_fall_back_to_defaults() {
		let settings: RenderSettings = toml::from_str("near_z = 0.1\nmax_msaa = 4").unwrap();
		assert_eq!(settings.near_z, 0.1);
		assert_eq!(settings.far_z, 100.0);
		assert_eq!(settings.frames_in_flight, 2);
		assert_eq!(settings.max_msaa, MsaaCount::Sample4);

		let settings: XrSettings = toml::from_str("app_space = \"Stage\"").unwrap();
		assert_eq!(settings.app_space, "Stage");
		assert_eq!(settings.visualized_spaces.len(), 7);
		assert_eq!(settings.application_name, "quest-xr");
	}

	#[test]
	fn zero_frames_in_flight_is_rejected() {
		assert!(RenderSettings::default().validate().is_ok());

		let settings: RenderSettings = toml::from_str("frames_in_flight = 0").unwrap();
		assert!(matches!(settings.validate(), Err(GfxError::NoFramesInFlight)));

		let settings: RenderSettings = toml::from_str("frames_in_flight = 1").unwrap();
		assert!(settings.validate().is_ok());
	}

	#[test]
	fn input_defaults() {
		let settings = InputSettings::default();
		assert_eq!(settings.grab_haptic_threshold, 0.9);
		assert_eq!(settings.haptic_amplitude, 0.5);
	}
}
