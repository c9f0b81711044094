use std::fmt;
use std::str::FromStr;
use bevy::math::Vec3;
use openxr as xr;
use crate::math;
use super::XrError;

/// Named reference spaces the app space and the visualized cubes are created from.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ReferenceSpace {
	View,
	ViewFront,
	Local,
	Stage,
	StageLeft,
	StageRight,
	StageLeftRotated,
	StageRightRotated,
}

impl ReferenceSpace {
	pub const ALL: [Self; 8] = [
		Self::View,
		Self::ViewFront,
		Self::Local,
		Self::Stage,
		Self::StageLeft,
		Self::StageRight,
		Self::StageLeftRotated,
		Self::StageRightRotated,
	];

	// Deliberately not exactly pi / 3.
	const ROTATION: f32 = 3.14 / 3.0;

	pub fn name(self) -> &'static str {
		match self {
			Self::View => "View",
			Self::ViewFront => "ViewFront",
			Self::Local => "Local",
			Self::Stage => "Stage",
			Self::StageLeft => "StageLeft",
			Self::StageRight => "StageRight",
			Self::StageLeftRotated => "StageLeftRotated",
			Self::StageRightRotated => "StageRightRotated",
		}
	}

	/// Underlying runtime space and the pose of this space within it.
	pub fn create_info(self) -> (xr::ReferenceSpaceType, xr::Posef) {
		match self {
			Self::View => (xr::ReferenceSpaceType::VIEW, xr::Posef::IDENTITY),
			// Two meters in front of the head.
			Self::ViewFront => (xr::ReferenceSpaceType::VIEW, math::pose_translation(Vec3::new(0.0, 0.0, -2.0))),
			Self::Local => (xr::ReferenceSpaceType::LOCAL, xr::Posef::IDENTITY),
			Self::Stage => (xr::ReferenceSpaceType::STAGE, xr::Posef::IDENTITY),
			Self::StageLeft => (xr::ReferenceSpaceType::STAGE, math::pose_rotate_ccw_about_y(0.0, Vec3::new(-2.0, 0.0, -2.0))),
			Self::StageRight => (xr::ReferenceSpaceType::STAGE, math::pose_rotate_ccw_about_y(0.0, Vec3::new(2.0, 0.0, -2.0))),
			Self::StageLeftRotated => (xr::ReferenceSpaceType::STAGE, math::pose_rotate_ccw_about_y(Self::ROTATION, Vec3::new(-2.0, 0.5, -2.0))),
			Self::StageRightRotated => (xr::ReferenceSpaceType::STAGE, math::pose_rotate_ccw_about_y(-Self::ROTATION, Vec3::new(2.0, 0.5, -2.0))),
		}
	}
}

impl FromStr for ReferenceSpace {
	type Err = XrError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|space| space.name().eq_ignore_ascii_case(s))
			.ok_or_else(|| XrError::UnknownReferenceSpace(s.to_owned()))
	}
}

impl fmt::Display for ReferenceSpace {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parse_ignores_case() {
		assert_eq!("stage".parse::<ReferenceSpace>().unwrap(), ReferenceSpace::Stage);
		assert_eq!("VIEWFRONT".parse::<ReferenceSpace>().unwrap(), ReferenceSpace::ViewFront);
		assert_eq!("stageRightRotated".parse::<ReferenceSpace>().unwrap(), ReferenceSpace::StageRightRotated);

		for space in ReferenceSpace::ALL {
			assert_eq!(space.to_string().parse::<ReferenceSpace>().unwrap(), space);
		}
	}

	#[test]
	fn unknown_name_is_an_error() {
		let err = "Floor".parse::<ReferenceSpace>().unwrap_err();
		assert!(matches!(err, XrError::UnknownReferenceSpace(name) if name == "Floor"));
		assert!("".parse::<ReferenceSpace>().is_err());
	}

	#[test]
	fn offsets_and_base_spaces() {
		let (ty, pose) = ReferenceSpace::ViewFront.create_info();
		assert_eq!(ty, xr::ReferenceSpaceType::VIEW);
		assert_eq!((pose.position.x, pose.position.y, pose.position.z), (0.0, 0.0, -2.0));

		let (ty, pose) = ReferenceSpace::StageLeft.create_info();
		assert_eq!(ty, xr::ReferenceSpaceType::STAGE);
		assert_eq!((pose.position.x, pose.position.y, pose.position.z), (-2.0, 0.0, -2.0));
		assert!((pose.orientation.w - 1.0).abs() < 1e-6);

		let (ty, pose) = ReferenceSpace::Local.create_info();
		assert_eq!(ty, xr::ReferenceSpaceType::LOCAL);
		assert_eq!(pose.orientation.w, 1.0);
	}

	#[test]
	fn rotated_stage_spaces_mirror_each_other() {
		let (_, left) = ReferenceSpace::StageLeftRotated.create_info();
		let (_, right) = ReferenceSpace::StageRightRotated.create_info();

		assert_eq!(left.position.y, 0.5);
		assert_eq!(left.position.x, -right.position.x);
		assert!((left.orientation.y + right.orientation.y).abs() < 1e-6);
		assert!((left.orientation.y - (ReferenceSpace::ROTATION * 0.5).sin()).abs() < 1e-6);
	}
}
