use bevy::math::{Mat4, Quat, Vec3, Vec4};
use openxr as xr;

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct CubeTransform {
	pub orientation: Quat,
	pub position: Vec3,
	pub scale: Vec3,
}

impl CubeTransform {
	pub fn from_pose(pose: &xr::Posef, scale: f32) -> Self {
		Self {
			orientation: quat(pose.orientation),
			position: vec3(pose.position),
			scale: Vec3::splat(scale),
		}
	}

	/// translation * rotation * scale
	#[inline(always)]
	pub fn model_matrix(&self) -> Mat4 {
		Mat4::from_scale_rotation_translation(self.scale, self.orientation, self.position)
	}
}

/// Projection from the tangents of an asymmetric field of view. Clip space follows Vulkan: depth maps to 0..1
/// and y points down. A `far` at or below `near` puts the far plane at infinity.
pub fn projection_fov(fov: &xr::Fovf, near: f32, far: f32) -> Mat4 {
	let tan_left = fov.angle_left.tan();
	let tan_right = fov.angle_right.tan();
	let tan_down = fov.angle_down.tan();
	let tan_up = fov.angle_up.tan();

	let tan_width = tan_right - tan_left;
	let tan_height = tan_up - tan_down;

	let (z_scale, z_offset) = match far <= near {
		true => (-1.0, -near),
		false => (-far / (far - near), -(far * near) / (far - near)),
	};

	Mat4::from_cols(
		Vec4::new(2.0 / tan_width, 0.0, 0.0, 0.0),
		Vec4::new(0.0, 2.0 / tan_height, 0.0, 0.0),
		Vec4::new((tan_right + tan_left) / tan_width, (tan_up + tan_down) / tan_height, z_scale, -1.0),
		Vec4::new(0.0, 0.0, z_offset, 0.0),
	)
}

/// Inverse of a matrix that only rotates and translates. Cheaper than a general inverse.
pub fn invert_rigid_body(m: &Mat4) -> Mat4 {
	let [c0, c1, c2, c3] = m.to_cols_array_2d();

	// Transposed rotation, column by column.
	let r0 = Vec3::new(c0[0], c1[0], c2[0]);
	let r1 = Vec3::new(c0[1], c1[1], c2[1]);
	let r2 = Vec3::new(c0[2], c1[2], c2[2]);
	let t = Vec3::new(c3[0], c3[1], c3[2]);

	let translation = -(r0 * t.x + r1 * t.y + r2 * t.z);

	Mat4::from_cols(
		r0.extend(0.0),
		r1.extend(0.0),
		r2.extend(0.0),
		translation.extend(1.0),
	)
}

#[inline(always)]
pub fn vec3(v: xr::Vector3f) -> Vec3 {
	Vec3::new(v.x, v.y, v.z)
}

#[inline(always)]
pub fn quat(q: xr::Quaternionf) -> Quat {
	Quat::from_xyzw(q.x, q.y, q.z, q.w)
}

// Translation followed by rotation.
#[inline(always)]
pub fn pose_matrix(pose: &xr::Posef) -> Mat4 {
	Mat4::from_translation(vec3(pose.position)) * Mat4::from_quat(quat(pose.orientation))
}

pub fn pose_translation(translation: Vec3) -> xr::Posef {
	xr::Posef {
		position: xr::Vector3f {
			x: translation.x,
			y: translation.y,
			z: translation.z,
		},
		..xr::Posef::IDENTITY
	}
}

pub fn pose_rotate_ccw_about_y(radians: f32, translation: Vec3) -> xr::Posef {
	let (sin, cos) = (radians * 0.5).sin_cos();

	xr::Posef {
		orientation: xr::Quaternionf {
			x: 0.0,
			y: sin,
			z: 0.0,
			w: cos,
		},
		..pose_translation(translation)
	}
}

#[cfg(test)]
mod tests {
	use std::f32::consts::FRAC_PI_4;
	use super::*;

	const EPSILON: f32 = 1e-5;

	fn symmetric_fov(half_angle: f32) -> xr::Fovf {
		xr::Fovf {
			angle_left: -half_angle,
			angle_right: half_angle,
			angle_up: half_angle,
			angle_down: -half_angle,
		}
	}

	fn project(m: &Mat4, p: Vec3) -> Vec3 {
		let clip = *m * p.extend(1.0);
		clip.truncate() / clip.w
	}

	#[test]
	fn projection_maps_near_and_far_to_unit_depth() {
		let (near, far) = (0.05, 100.0);
		let m = projection_fov(&symmetric_fov(FRAC_PI_4), near, far);

		assert!((m.x_axis.x - 1.0).abs() < EPSILON);
		assert!((m.y_axis.y - 1.0).abs() < EPSILON);
		assert!(m.z_axis.x.abs() < EPSILON);
		assert_eq!(m.z_axis.w, -1.0);
		assert_eq!(m.w_axis.w, 0.0);

		assert!(project(&m, Vec3::new(0.0, 0.0, -near)).z.abs() < EPSILON);
		assert!((project(&m, Vec3::new(0.0, 0.0, -far)).z - 1.0).abs() < 1e-4);
	}

	#[test]
	fn projection_with_far_behind_near_is_infinite() {
		let near = 0.1;
		let m = projection_fov(&symmetric_fov(FRAC_PI_4), near, 0.0);

		assert_eq!(m.z_axis.z, -1.0);
		assert_eq!(m.w_axis.z, -near);

		// Depth approaches 1 but never reaches it.
		let z = project(&m, Vec3::new(0.0, 0.0, -1000.0)).z;
		assert!(z < 1.0 && z > 0.999);
	}

	#[test]
	fn asymmetric_projection_shifts_center() {
		let fov = xr::Fovf {
			angle_left: -0.9,
			angle_right: 0.7,
			angle_up: 0.8,
			angle_down: -0.8,
		};
		let m = projection_fov(&fov, 0.05, 100.0);

		let (l, r) = (fov.angle_left.tan(), fov.angle_right.tan());
		assert!((m.z_axis.x - (r + l) / (r - l)).abs() < EPSILON);
		assert!(m.z_axis.y.abs() < EPSILON);

		// Edges of the field of view land on the clip edges.
		let edge = project(&m, Vec3::new(r, 0.0, -1.0));
		assert!((edge.x - 1.0).abs() < EPSILON);
	}

	#[test]
	fn rigid_body_inverse_matches_general_inverse() {
		let m = Mat4::from_translation(Vec3::new(1.0, -2.0, 3.5))
			* Mat4::from_quat(Quat::from_euler(bevy::math::EulerRot::YXZ, 0.3, -1.1, 0.7));

		let inverse = invert_rigid_body(&m);
		assert!(inverse.abs_diff_eq(m.inverse(), EPSILON));
		assert!((inverse * m).abs_diff_eq(Mat4::IDENTITY, EPSILON));
		assert_eq!(inverse.w_axis.w, 1.0);
	}

	#[test]
	fn xr_quaternion_keeps_component_order() {
		let q = quat(xr::Quaternionf { x: 0.1, y: 0.2, z: 0.3, w: 0.9 });
		assert_eq!(q.to_array(), [0.1, 0.2, 0.3, 0.9]);
	}

	#[test]
	fn pose_helpers() {
		let pose = pose_translation(Vec3::new(0.0, 0.0, -2.0));
		assert_eq!(pose.orientation.w, 1.0);
		assert_eq!(vec3(pose.position), Vec3::new(0.0, 0.0, -2.0));

		let pose = pose_rotate_ccw_about_y(std::f32::consts::FRAC_PI_2, Vec3::new(-2.0, 0.5, -2.0));
		let rotated = quat(pose.orientation) * Vec3::X;
		assert!(rotated.abs_diff_eq(Vec3::NEG_Z, EPSILON));
		assert_eq!(vec3(pose.position), Vec3::new(-2.0, 0.5, -2.0));

		let m = pose_matrix(&pose);
		assert!((m * Vec4::new(0.0, 0.0, 0.0, 1.0)).truncate().abs_diff_eq(Vec3::new(-2.0, 0.5, -2.0), EPSILON));
	}

	#[test]
	fn cube_model_matrix_scales_then_rotates_then_translates() {
		let cube = CubeTransform::from_pose(&pose_rotate_ccw_about_y(std::f32::consts::PI, Vec3::new(1.0, 0.0, 0.0)), 0.25);
		assert_eq!(cube.scale, Vec3::splat(0.25));

		let corner = cube.model_matrix() * Vec4::new(0.5, 0.5, 0.5, 1.0);
		assert!(corner.truncate().abs_diff_eq(Vec3::new(1.0 - 0.125, 0.125, -0.125), EPSILON));
	}
}
