use bevy::prelude::*;
use crate::render_settings::{InputSettings, RenderSettings, XrSettings};
use crate::xr::{XrError, XrProgram};

#[derive(Default, Clone, Copy, Eq, PartialEq, Hash, Debug, States)]
pub enum XrState {
	#[default]
	Idle,
	Running,// Session has begun. Frames are rendered.
}

impl XrState {
	/// State to switch to once the session is or is no longer running. None if already there.
	pub fn transition(self, session_running: bool) -> Option<Self> {
		let target = match session_running {
			true => Self::Running,
			false => Self::Idle,
		};

		(self != target).then_some(target)
	}
}

/// Drives the OpenXR session and renders into it. Expects `StatesPlugin`.
#[derive(Clone, Debug, Default)]
pub struct RenderPlugin;

impl Plugin for RenderPlugin {
	fn build(&self, app: &mut App) {
		app
			.register_type::<RenderSettings>()
			.register_type::<XrSettings>()
			.register_type::<InputSettings>()
			.init_resource::<RenderSettings>()
			.init_resource::<XrSettings>()
			.init_resource::<InputSettings>()
			.init_state::<XrState>()
			.add_systems(Startup, create_xr_program.pipe(exit_on_error))
			.add_systems(
				PreUpdate,
				(
					poll_xr_events.pipe(exit_on_error),
					exit_when_requested,
				)
					.chain()
					.run_if(resource_exists::<XrProgram>),
			)
			.add_systems(
				Update,
				(
					poll_actions.pipe(exit_on_error),
					render_frame.pipe(exit_on_error),
				)
					.chain()
					.run_if(in_state(XrState::Running)),
			);
	}
}

fn create_xr_program(
	mut commands: Commands,
	render_settings: Res<RenderSettings>,
	xr_settings: Res<XrSettings>,
	input_settings: Res<InputSettings>,
) -> Result<(), XrError> {
	let program = XrProgram::new(render_settings.clone(), &xr_settings, input_settings.clone())?;
	commands.insert_resource(program);
	Ok(())
}

fn poll_xr_events(
	mut program: ResMut<XrProgram>,
	state: Res<State<XrState>>,
	mut next_state: ResMut<NextState<XrState>>,
) -> Result<(), XrError> {
	program.poll_events()?;

	if let Some(target) = state.get().transition(program.is_running()) {
		info!("XrState {:?} -> {target:?}", state.get());
		next_state.set(target);
	}

	Ok(())
}

fn exit_when_requested(program: Res<XrProgram>, mut exit: EventWriter<AppExit>) {
	if program.exit_requested() {
		info!("OpenXR runtime requested exit");
		exit.send(AppExit::Success);
	}
}

fn poll_actions(mut program: ResMut<XrProgram>) -> Result<(), XrError> {
	program.poll_actions()
}

fn render_frame(mut program: ResMut<XrProgram>) -> Result<(), XrError> {
	program.render_frame()
}

fn exit_on_error(In(result): In<Result<(), XrError>>, mut exit: EventWriter<AppExit>) {
	if let Err(e) = result {
		error!("{e}");
		exit.send(AppExit::error());
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn xr_state_follows_the_session() {
		assert_eq!(XrState::default(), XrState::Idle);
		assert_eq!(XrState::Idle.transition(true), Some(XrState::Running));
		assert_eq!(XrState::Running.transition(false), Some(XrState::Idle));
		assert_eq!(XrState::Idle.transition(false), None);
		assert_eq!(XrState::Running.transition(true), None);
	}
}
