use std::sync::Arc;
use ash::vk;
use bevy::log::{debug, error, info, warn};
use bevy::math::UVec2;
use bevy::prelude::Resource;
use openxr as xr;
use smallvec::SmallVec;
use crate::context::GpuContext;
use crate::math::CubeTransform;
use crate::render_settings::{InputSettings, RenderSettings, XrSettings};
use crate::renderer::Renderer;
use super::input::Hand;
use super::{log, ReferenceSpace, XrError, XrInput, XrInstance, VIEW_TYPE};

const BLEND_MODE: xr::EnvironmentBlendMode = xr::EnvironmentBlendMode::OPAQUE;
const VISUALIZED_SPACE_SCALE: f32 = 0.25;
const HAND_SCALE: f32 = 0.1;

struct Swapchain {
	handle: xr::Swapchain<xr::Vulkan>,
	resolution: UVec2,
}

struct VisualizedSpace {
	name: ReferenceSpace,
	handle: xr::Space,
}

/// Owns the OpenXR session and everything rendered through it.
#[derive(Resource)]
pub struct XrProgram {
	// Dropped in declaration order. The session goes before the device it was created with.
	input: XrInput,
	swapchains: Vec<Swapchain>,
	visualized_spaces: Vec<VisualizedSpace>,
	app_space: xr::Space,
	frame_stream: xr::FrameStream<xr::Vulkan>,
	frame_waiter: xr::FrameWaiter,
	session: xr::Session<xr::Vulkan>,
	renderer: Renderer,
	instance: XrInstance,
	system: xr::SystemId,
	event_buffer: xr::EventDataBuffer,
	lifecycle: SessionLifecycle,
}

impl XrProgram {
	/// Creates the instance, the Vulkan device, the session and its swapchains.
	pub fn new(render_settings: RenderSettings, xr_settings: &XrSettings, input_settings: InputSettings) -> Result<Self, XrError> {
		let instance = XrInstance::new(&xr_settings.application_name)?;
		let system = instance.system()?;

		let context = Arc::new(GpuContext::new(&instance, system, &xr_settings.application_name)?);
		let renderer = Renderer::new(context, render_settings)?;

		let (session, frame_waiter, frame_stream) = unsafe { instance.create_session::<xr::Vulkan>(system, &renderer.context().session_create_info()) }?;

		log::reference_spaces(&session)?;

		let input = XrInput::new(&instance, &session, input_settings)?;

		let mut visualized_spaces = Vec::with_capacity(xr_settings.visualized_spaces.len());
		for name in &xr_settings.visualized_spaces {
			let name = name.parse::<ReferenceSpace>()?;
			let (ty, pose) = name.create_info();
			match session.create_reference_space(ty, pose) {
				Ok(handle) => visualized_spaces.push(VisualizedSpace { name, handle }),
				Err(e) => warn!("Failed to create reference space {name} with error {e}"),
			}
		}

		let app_space = {
			let (ty, pose) = xr_settings.app_space.parse::<ReferenceSpace>()?.create_info();
			session.create_reference_space(ty, pose)?
		};

		#[cfg(debug_assertions)]
		unsafe {
			instance.set_debug_name("session", session.as_raw().into_raw(), xr::sys::ObjectType::SESSION);
			instance.set_debug_name("app_space", app_space.as_raw().into_raw(), xr::sys::ObjectType::SPACE);
			for space in &visualized_spaces {
				instance.set_debug_name(space.name.name(), space.handle.as_raw().into_raw(), xr::sys::ObjectType::SPACE);
			}
		}

		let mut this = Self {
			input,
			swapchains: Vec::new(),
			visualized_spaces,
			app_space,
			frame_stream,
			frame_waiter,
			session,
			renderer,
			instance,
			system,
			event_buffer: xr::EventDataBuffer::new(),
			lifecycle: SessionLifecycle::default(),
		};

		this.create_swapchains()?;

		Ok(this)
	}

	/// True between the runtime reporting READY and STOPPING.
	#[inline(always)]
	pub fn is_running(&self) -> bool {
		self.lifecycle.running
	}

	/// Set once the runtime is exiting or the instance is about to be lost.
	#[inline(always)]
	pub fn exit_requested(&self) -> bool {
		self.lifecycle.exit_requested
	}

	fn create_swapchains(&mut self) -> Result<(), XrError> {
		log::system_properties(&self.instance, self.system)?;

		if !self.instance.enumerate_view_configurations(self.system)?.contains(&VIEW_TYPE) {
			return Err(XrError::UnsupportedViewConfiguration(VIEW_TYPE));
		}

		let formats = self.session
			.enumerate_swapchain_formats()?
			.into_iter()
			.map(|format| vk::Format::from_raw(format as _))
			.collect::<Vec<_>>();

		let format = self.renderer.select_swapchain_format(&formats)?;

		let views = self.instance.enumerate_view_configuration_views(self.system, VIEW_TYPE)?;
		for (i, view) in views.iter().enumerate() {
			info!(
				"Creating swapchain for view {i} with dimensions Width={} Height={} SampleCount={}",
				view.recommended_image_rect_width,
				view.recommended_image_rect_height,
				view.recommended_swapchain_sample_count,
			);

			let create_info = xr::SwapchainCreateInfo::<xr::Vulkan> {
				create_flags: xr::SwapchainCreateFlags::EMPTY,
				usage_flags: xr::SwapchainUsageFlags::SAMPLED | xr::SwapchainUsageFlags::COLOR_ATTACHMENT,
				format: format.as_raw() as _,
				sample_count: view.recommended_swapchain_sample_count,
				width: view.recommended_image_rect_width,
				height: view.recommended_image_rect_height,
				face_count: 1,
				array_size: 1,
				mip_count: 1,
			};

			let handle = self.session.create_swapchain(&create_info)?;
			let resolution = UVec2::new(view.recommended_image_rect_width, view.recommended_image_rect_height);

			#[cfg(debug_assertions)]
			unsafe { self.instance.set_debug_name(&format!("swapchain[{i}]"), handle.as_raw().into_raw(), xr::sys::ObjectType::SWAPCHAIN); }

			let images = handle.enumerate_images()?;
			let index = self.renderer.create_swapchain_context(&images, resolution)?;
			debug_assert_eq!(index, self.swapchains.len());

			self.swapchains.push(Swapchain {
				handle,
				resolution,
			});
		}

		Ok(())
	}

	/// Drains the runtime's event queue and drives the session lifecycle.
	pub fn poll_events(&mut self) -> Result<(), XrError> {
		while let Some(event) = self.instance.poll_event(&mut self.event_buffer)? {
			match event {
				xr::Event::EventsLost(e) => warn!("{} events lost", e.lost_event_count()),
				xr::Event::InstanceLossPending(_) => {
					warn!("Instance loss pending");
					self.lifecycle.on_instance_loss_pending();
					return Ok(());
				},
				xr::Event::SessionStateChanged(e) => {
					if e.session() != self.session.as_raw() {
						error!("State change for an unknown session {:?}", e.session());
						continue;
					}

					let new_state = e.state();
					info!("Session state {:?}->{new_state:?} time={:?}", self.lifecycle.state, e.time());

					match self.lifecycle.on_state_change(new_state) {
						SessionAction::Begin => {
							self.session.begin(VIEW_TYPE)?;
						},
						SessionAction::End => {
							self.session.end()?;
						},
						SessionAction::None => {},
					}
				},
				xr::Event::InteractionProfileChanged(_) => self.input.log_bindings(&self.instance, &self.session)?,
				_ => debug!("Ignoring event"),
			}
		}

		Ok(())
	}

	pub fn poll_actions(&mut self) -> Result<(), XrError> {
		self.input.poll_actions(&self.session)
	}

	/// Waits for, renders and submits one frame. Frames the runtime does not want rendered are submitted empty.
	pub fn render_frame(&mut self) -> Result<(), XrError> {
		let frame_state = self.frame_waiter.wait()?;
		self.frame_stream.begin()?;

		let time = frame_state.predicted_display_time;
		let views = match frame_state.should_render {
			true => match self.render_layer(time) {
				Ok(views) => views,
				Err(e) => {
					// Every begun frame must be ended.
					self.frame_stream.end(time, BLEND_MODE, &[])?;
					return Err(e);
				},
			},
			false => None,
		};

		match views {
			Some(views) => {
				let projection_views = views
					.iter()
					.zip(&self.swapchains)
					.map(|(view, swapchain)| {
						xr::CompositionLayerProjectionView::new()
							.pose(view.pose)
							.fov(view.fov)
							.sub_image(
								xr::SwapchainSubImage::new()
									.swapchain(&swapchain.handle)
									.image_array_index(0)
									.image_rect(image_rect(swapchain.resolution)),
							)
					})
					.collect::<SmallVec<[_; 2]>>();

				let layer = xr::CompositionLayerProjection::new()
					.space(&self.app_space)
					.views(&projection_views);

				self.frame_stream.end(time, BLEND_MODE, &[&layer])?;
			},
			None => self.frame_stream.end(time, BLEND_MODE, &[])?,
		}

		Ok(())
	}

	/// Renders every view. Returns None when the views could not be located.
	fn render_layer(&mut self, time: xr::Time) -> Result<Option<SmallVec<[xr::View; 2]>>, XrError> {
		let (view_state, views) = self.session.locate_views(VIEW_TYPE, time, &self.app_space)?;
		if !view_state.contains(xr::ViewStateFlags::POSITION_VALID) || !view_state.contains(xr::ViewStateFlags::ORIENTATION_VALID) {
			return Ok(None);
		}

		let mut cubes = SmallVec::<[CubeTransform; 16]>::new();

		for space in &self.visualized_spaces {
			match space.handle.locate(&self.app_space, time) {
				Ok(location) if is_pose_valid(location.location_flags) => {
					cubes.push(CubeTransform::from_pose(&location.pose, VISUALIZED_SPACE_SCALE));
				},
				Ok(_) => {},
				Err(e) => debug!("Unable to locate a visualized reference space {} in app space: {e}", space.name),
			}
		}

		for hand in Hand::ALL {
			match self.input.hand_space(hand).locate(&self.app_space, time) {
				Ok(location) if is_pose_valid(location.location_flags) => {
					cubes.push(CubeTransform::from_pose(&location.pose, HAND_SCALE * self.input.hand_scale(hand)));
				},
				Ok(_) => if self.input.hand_active(hand) {
					debug!("Unable to relate {hand:?} hand action space in app space");
				},
				Err(e) => if self.input.hand_active(hand) {
					debug!("Unable to locate {hand:?} hand action space in app space: {e}");
				},
			}
		}

		for (i, view) in views.iter().enumerate() {
			let Some(swapchain) = self.swapchains.get_mut(i) else {
				break;
			};

			let image_index = swapchain.handle.acquire_image()?;
			swapchain.handle.wait_image(xr::Duration::INFINITE)?;

			// The image must be released even if recording fails.
			let result = self.renderer.render_view(view, 0, i, image_index as usize, &cubes);
			swapchain.handle.release_image()?;
			result?;
		}

		Ok(Some(views.into_iter().collect()))
	}
}

impl Drop for XrProgram {
	fn drop(&mut self) {
		// Image views go before the runtime frees the images they view.
		self.renderer.clear_swapchains();
	}
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SessionAction {
	None,
	Begin,
	End,
}

/// Where the session is in its lifecycle, as reported by the runtime.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SessionLifecycle {
	pub state: xr::SessionState,
	// Between READY and STOPPING.
	pub running: bool,
	pub exit_requested: bool,
}

impl Default for SessionLifecycle {
	fn default() -> Self {
		Self {
			state: xr::SessionState::UNKNOWN,
			running: false,
			exit_requested: false,
		}
	}
}

impl SessionLifecycle {
	/// Records `state` and returns what has to be done to the session in response.
	pub fn on_state_change(&mut self, state: xr::SessionState) -> SessionAction {
		self.state = state;

		match state {
			xr::SessionState::READY => {
				self.running = true;
				SessionAction::Begin
			},
			xr::SessionState::STOPPING => {
				self.running = false;
				SessionAction::End
			},
			xr::SessionState::EXITING | xr::SessionState::LOSS_PENDING => {
				self.exit_requested = true;
				SessionAction::None
			},
			_ => SessionAction::None,
		}
	}

	pub fn on_instance_loss_pending(&mut self) {
		self.exit_requested = true;
	}
}

#[inline]
pub fn is_pose_valid(flags: xr::SpaceLocationFlags) -> bool {
	flags.contains(xr::SpaceLocationFlags::POSITION_VALID) && flags.contains(xr::SpaceLocationFlags::ORIENTATION_VALID)
}

/// Whole image of a swapchain.
pub fn image_rect(resolution: UVec2) -> xr::Rect2Di {
	xr::Rect2Di {
		offset: xr::Offset2Di { x: 0, y: 0 },
		extent: xr::Extent2Di {
			width: resolution.x as i32,
			height: resolution.y as i32,
		},
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn pose_needs_position_and_orientation() {
		assert!(is_pose_valid(xr::SpaceLocationFlags::POSITION_VALID | xr::SpaceLocationFlags::ORIENTATION_VALID));
		assert!(is_pose_valid(
			xr::SpaceLocationFlags::POSITION_VALID
				| xr::SpaceLocationFlags::ORIENTATION_VALID
				| xr::SpaceLocationFlags::POSITION_TRACKED,
		));
		assert!(!is_pose_valid(xr::SpaceLocationFlags::POSITION_VALID));
		assert!(!is_pose_valid(xr::SpaceLocationFlags::ORIENTATION_VALID | xr::SpaceLocationFlags::ORIENTATION_TRACKED));
		assert!(!is_pose_valid(xr::SpaceLocationFlags::EMPTY));
	}

	#[test]
	fn ready_begins_and_stopping_ends() {
		let mut lifecycle = SessionLifecycle::default();
		assert!(!lifecycle.running);

		assert_eq!(lifecycle.on_state_change(xr::SessionState::IDLE), SessionAction::None);
		assert!(!lifecycle.running);

		assert_eq!(lifecycle.on_state_change(xr::SessionState::READY), SessionAction::Begin);
		assert!(lifecycle.running);
		assert_eq!(lifecycle.state, xr::SessionState::READY);

		for state in [xr::SessionState::SYNCHRONIZED, xr::SessionState::VISIBLE, xr::SessionState::FOCUSED] {
			assert_eq!(lifecycle.on_state_change(state), SessionAction::None);
			assert!(lifecycle.running);
		}

		assert_eq!(lifecycle.on_state_change(xr::SessionState::STOPPING), SessionAction::End);
		assert!(!lifecycle.running);
		assert!(!lifecycle.exit_requested);
	}

	#[test]
	fn exiting_and_loss_request_exit() {
		for state in [xr::SessionState::EXITING, xr::SessionState::LOSS_PENDING] {
			let mut lifecycle = SessionLifecycle::default();
			assert_eq!(lifecycle.on_state_change(state), SessionAction::None);
			assert!(lifecycle.exit_requested);
			assert!(!lifecycle.running);
		}

		let mut lifecycle = SessionLifecycle::default();
		lifecycle.on_state_change(xr::SessionState::READY);
		lifecycle.on_instance_loss_pending();
		assert!(lifecycle.exit_requested);
		assert!(lifecycle.running);
	}

	#[test]
	fn image_rect_covers_the_swapchain() {
		let rect = image_rect(UVec2::new(1832, 1920));
		assert_eq!((rect.offset.x, rect.offset.y), (0, 0));
		assert_eq!((rect.extent.width, rect.extent.height), (1832, 1920));
	}
}
