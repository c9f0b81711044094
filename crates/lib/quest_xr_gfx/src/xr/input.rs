use bevy::log::debug;
use openxr as xr;
use crate::render_settings::InputSettings;
use super::{log, XrError, XrInstance};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Hand {
	Left = 0,
	Right = 1,
}

impl Hand {
	pub const ALL: [Self; 2] = [Self::Left, Self::Right];

	pub fn path(self) -> &'static str {
		match self {
			Self::Left => "/user/hand/left",
			Self::Right => "/user/hand/right",
		}
	}

	#[inline(always)]
	pub fn index(self) -> usize {
		self as usize
	}
}

/// Gameplay action set with one pose space per hand.
pub struct XrInput {
	// Dropped in declaration order. Spaces and actions go before their action set.
	hand_spaces: [xr::Space; 2],
	grab_action: xr::Action<f32>,
	pose_action: xr::Action<xr::Posef>,
	vibrate_action: xr::Action<xr::Haptic>,
	quit_action: xr::Action<bool>,
	action_set: xr::ActionSet,
	hand_paths: [xr::Path; 2],
	hand_scale: [f32; 2],
	hand_active: [bool; 2],
	settings: InputSettings,
}

impl XrInput {
	const INTERACTION_PROFILE: &'static str = "/interaction_profiles/oculus/touch_controller";

	pub fn new(instance: &XrInstance, session: &xr::Session<xr::Vulkan>, settings: InputSettings) -> Result<Self, XrError> {
		let action_set = instance.create_action_set("gameplay", "Gameplay", 0)?;

		let hand_paths = [
			instance.string_to_path(Hand::Left.path())?,
			instance.string_to_path(Hand::Right.path())?,
		];

		let grab_action = action_set.create_action::<f32>("grab_object", "Grab Object", &hand_paths)?;
		let pose_action = action_set.create_action::<xr::Posef>("hand_pose", "Hand Pose", &hand_paths)?;
		let vibrate_action = action_set.create_action::<xr::Haptic>("vibrate_hand", "Vibrate Hand", &hand_paths)?;
		let quit_action = action_set.create_action::<bool>("quit_session", "Quit Session", &[])?;

		let path = |hand: Hand, component: &str| instance.string_to_path(&format!("{}/{component}", hand.path()));

		instance.suggest_interaction_profile_bindings(
			instance.string_to_path(Self::INTERACTION_PROFILE)?,
			&[
				xr::Binding::new(&grab_action, path(Hand::Left, "input/squeeze/value")?),
				xr::Binding::new(&grab_action, path(Hand::Right, "input/squeeze/value")?),
				xr::Binding::new(&pose_action, path(Hand::Left, "input/grip/pose")?),
				xr::Binding::new(&pose_action, path(Hand::Right, "input/grip/pose")?),
				xr::Binding::new(&quit_action, path(Hand::Left, "input/menu/click")?),
				xr::Binding::new(&vibrate_action, path(Hand::Left, "output/haptic")?),
				xr::Binding::new(&vibrate_action, path(Hand::Right, "output/haptic")?),
			],
		)?;

		let hand_spaces = [
			pose_action.create_space(session.clone(), hand_paths[Hand::Left.index()], xr::Posef::IDENTITY)?,
			pose_action.create_space(session.clone(), hand_paths[Hand::Right.index()], xr::Posef::IDENTITY)?,
		];

		session.attach_action_sets(&[&action_set])?;

		#[cfg(debug_assertions)]
		unsafe {
			instance.set_debug_name("gameplay", action_set.as_raw().into_raw(), xr::sys::ObjectType::ACTION_SET);
			for hand in Hand::ALL {
				instance.set_debug_name(&format!("hand_space[{hand:?}]"), hand_spaces[hand.index()].as_raw().into_raw(), xr::sys::ObjectType::SPACE);
			}
		}

		Ok(Self {
			hand_spaces,
			grab_action,
			pose_action,
			vibrate_action,
			quit_action,
			action_set,
			hand_paths,
			hand_scale: [1.0; 2],
			hand_active: [false; 2],
			settings,
		})
	}

	#[inline(always)]
	pub fn hand_space(&self, hand: Hand) -> &xr::Space {
		&self.hand_spaces[hand.index()]
	}

	#[inline(always)]
	pub fn hand_scale(&self, hand: Hand) -> f32 {
		self.hand_scale[hand.index()]
	}

	#[inline(always)]
	pub fn hand_active(&self, hand: Hand) -> bool {
		self.hand_active[hand.index()]
	}

	/// Syncs the action set, updates the per hand state and reacts to grab and quit input.
	pub fn poll_actions(&mut self, session: &xr::Session<xr::Vulkan>) -> Result<(), XrError> {
		self.hand_active = [false; 2];

		session.sync_actions(&[xr::ActiveActionSet::new(&self.action_set)])?;

		for hand in Hand::ALL {
			let path = self.hand_paths[hand.index()];

			let grab = self.grab_action.state(session, path)?;
			if grab.is_active {
				let response = grab_response(grab.current_state, self.settings.grab_haptic_threshold);
				self.hand_scale[hand.index()] = response.scale;

				if response.vibrate {
					let vibration = xr::HapticVibration::new()
						.amplitude(self.settings.haptic_amplitude)
						.duration(xr::Duration::MIN_HAPTIC)
						.frequency(xr::FREQUENCY_UNSPECIFIED);

					self.vibrate_action.apply_feedback(session, path, &vibration)?;
				}
			}

			self.hand_active[hand.index()] = self.pose_action.is_active(session, path)?;
		}

		let quit = self.quit_action.state(session, xr::Path::NULL)?;
		if should_quit(quit.is_active, quit.changed_since_last_sync, quit.current_state) {
			debug!("Quit action pressed. Requesting session exit");
			session.request_exit()?;
		}

		Ok(())
	}

	/// Logs what each action is bound to under the current interaction profile.
	pub fn log_bindings(&self, instance: &xr::Instance, session: &xr::Session<xr::Vulkan>) -> Result<(), XrError> {
		log::action_sources(instance, session, "Grab", self.grab_action.as_raw())?;
		log::action_sources(instance, session, "Quit", self.quit_action.as_raw())?;
		log::action_sources(instance, session, "Pose", self.pose_action.as_raw())?;
		log::action_sources(instance, session, "Vibrate", self.vibrate_action.as_raw())?;
		Ok(())
	}
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct GrabResponse {
	pub scale: f32,
	pub vibrate: bool,
}

/// Squeezing shrinks the hand cube to half size. Past `threshold` the controller vibrates.
pub fn grab_response(value: f32, threshold: f32) -> GrabResponse {
	GrabResponse {
		scale: 1.0 - 0.5 * value,
		vibrate: value > threshold,
	}
}

#[inline]
pub fn should_quit(is_active: bool, changed_since_last_sync: bool, pressed: bool) -> bool {
	is_active && changed_since_last_sync && pressed
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn grab_shrinks_hand() {
		assert_eq!(grab_response(0.0, 0.9), GrabResponse { scale: 1.0, vibrate: false });
		assert_eq!(grab_response(0.5, 0.9).scale, 0.75);
		assert_eq!(grab_response(1.0, 0.9), GrabResponse { scale: 0.5, vibrate: true });
	}

	#[test]
	fn vibration_threshold_is_exclusive() {
		assert!(!grab_response(0.9, 0.9).vibrate);
		assert!(grab_response(0.91, 0.9).vibrate);
	}

	#[test]
	fn quit_only_on_fresh_press() {
		assert!(should_quit(true, true, true));
		assert!(!should_quit(true, false, true));// Held.
		assert!(!should_quit(true, true, false));// Released.
		assert!(!should_quit(false, true, true));
	}

	#[test]
	fn hand_paths() {
		assert_eq!(Hand::Left.path(), "/user/hand/left");
		assert_eq!(Hand::Right.path(), "/user/hand/right");
		assert_eq!(Hand::ALL.map(Hand::index), [0, 1]);
	}
}
