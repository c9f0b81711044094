use std::sync::Arc;
use ash::vk;
use bevy::log::info;
use bevy::math::{Mat4, UVec2};
use openxr as xr;
use quest_xr_gfx_utils::MsaaCount;
use quest_xr_utils::dbgfmt;
use smallvec::SmallVec;
use crate::buffer::{Buffer, BufferCreateInfo};
use crate::context::GpuContext;
use crate::error::GfxError;
use crate::graphics_pipeline::{GraphicsPipeline, PipelineConfig};
use crate::math::{self, CubeTransform};
use crate::mesh::{self, Vertex};
use crate::render_pass::RenderPass;
use crate::render_settings::RenderSettings;
use crate::shader::{shaders, ShaderModule};
use crate::swapchain::{SwapchainContext, SwapchainCreateInfo};

// Ordered by preference. The runtime's order decides among these.
pub const SWAPCHAIN_FORMATS: [vk::Format; 4] = [
	vk::Format::R8G8B8A8_SRGB,
	vk::Format::R8G8B8A8_UNORM,
	vk::Format::B8G8R8A8_SRGB,
	vk::Format::B8G8R8A8_UNORM,
];

/// Draws the cube scene into the runtime's swapchains.
pub struct Renderer {
	// Dropped in declaration order. Swapchains reference the pipeline and render pass.
	swapchains: Vec<SwapchainContext>,
	pipeline: Option<GraphicsPipeline>,
	render_pass: Option<Arc<RenderPass>>,
	msaa: MsaaCount,
	depth_format: vk::Format,
	settings: RenderSettings,
	context: Arc<GpuContext>,
}

impl Renderer {
	pub fn new(context: Arc<GpuContext>, settings: RenderSettings) -> Result<Self, GfxError> {
		settings.validate()?;

		let msaa = context.max_usable_sample_count(settings.max_msaa);
		let depth_format = context.depth_format()?;

		info!("Depth format {depth_format:?}, msaa {}x", msaa.as_u32());

		Ok(Self {
			swapchains: Vec::new(),
			pipeline: None,
			render_pass: None,
			msaa,
			depth_format,
			settings,
			context,
		})
	}

	#[inline(always)]
	pub fn context(&self) -> &Arc<GpuContext> {
		&self.context
	}

	/// Picks the color format from the runtime's supported `formats` and builds the render pass and pipeline for it.
	/// Can only be called once.
	pub fn select_swapchain_format(&mut self, formats: &[vk::Format]) -> Result<vk::Format, GfxError> {
		if self.render_pass.is_some() {
			return Err(GfxError::FormatAlreadySelected);
		}

		let format = pick_swapchain_format(formats)
			.ok_or_else(|| GfxError::NoSupportedFormat(SWAPCHAIN_FORMATS.to_vec()))?;

		info!("Swapchain format {format:?} from runtime formats {formats:?}");

		let render_pass = Arc::new(RenderPass::new(
			"render_pass".into(),
			Arc::clone(&self.context),
			format,
			self.depth_format,
			self.msaa,
		)?);

		let pipeline = {
			let vertex_shader = ShaderModule::new(Arc::clone(&self.context), shaders::CUBE_VERT, "main")?;
			let fragment_shader = ShaderModule::new(Arc::clone(&self.context), shaders::CUBE_FRAG, "main")?;

			let mut pipeline = GraphicsPipeline::new(
				"cube_pipeline".into(),
				Arc::clone(&self.context),
				&render_pass,
				&vertex_shader,
				&fragment_shader,
				&Vertex::layout(),
				&PipelineConfig::CUBE,
			)?;

			let mut vertex_buffer = Buffer::new(
				"cube_vertices".into(),
				Arc::clone(&self.context),
				&BufferCreateInfo::vertex_buffer::<Vertex>(mesh::CUBE_VERTICES.len()),
			)?;
			vertex_buffer.update(&mesh::CUBE_VERTICES)?;

			let mut index_buffer = Buffer::new(
				"cube_indices".into(),
				Arc::clone(&self.context),
				&BufferCreateInfo::index_buffer::<u16>(mesh::CUBE_INDICES.len()),
			)?;
			index_buffer.update(&mesh::CUBE_INDICES)?;

			pipeline.set_vertex_buffer(vertex_buffer);
			pipeline.set_index_buffer(index_buffer, mesh::CUBE_INDEX_TYPE)?;
			pipeline
		};

		self.render_pass = Some(render_pass);
		self.pipeline = Some(pipeline);

		Ok(format)
	}

	/// Wraps the images of a runtime swapchain. Returns the index to render into it with.
	pub fn create_swapchain_context(&mut self, images: &[u64], resolution: UVec2) -> Result<usize, GfxError> {
		let render_pass = self.render_pass.as_ref().ok_or(GfxError::FormatNotSelected)?;
		let images = images
			.iter()
			.map(|&image| <vk::Image as vk::Handle>::from_raw(image))
			.collect::<Vec<_>>();

		let index = self.swapchains.len();
		let swapchain = SwapchainContext::new(
			dbgfmt!("swapchain[{index}]"),
			Arc::clone(&self.context),
			Arc::clone(render_pass),
			&images,
			&SwapchainCreateInfo {
				resolution,
				frames_in_flight: self.settings.frames_in_flight,
				clear_color: self.settings.clear_color,
			},
		)?;

		self.swapchains.push(swapchain);
		Ok(index)
	}

	/// Destroys every swapchain context. Must happen before the runtime destroys the images.
	pub fn clear_swapchains(&mut self) {
		self.swapchains.clear();
	}

	/// Renders `cubes` from the point of view of `view` into image `image_index` of swapchain `swapchain_index`.
	pub fn render_view(
		&mut self,
		view: &xr::View,
		image_array_index: u32,
		swapchain_index: usize,
		image_index: usize,
		cubes: &[CubeTransform],
	) -> Result<(), GfxError> {
		if image_array_index != 0 {
			return Err(GfxError::TextureArrayUnsupported(image_array_index));
		}

		let pipeline = self.pipeline.as_ref().ok_or(GfxError::FormatNotSelected)?;
		let swapchain = self.swapchains
			.get_mut(swapchain_index)
			.ok_or(GfxError::InvalidSwapchain(swapchain_index))?;

		let view_projection = view_projection(view, self.settings.near_z, self.settings.far_z);
		let transforms = cubes
			.iter()
			.map(|cube| view_projection * cube.model_matrix())
			.collect::<SmallVec<[Mat4; 16]>>();

		swapchain.draw(image_index, pipeline, &transforms)
	}
}

/// First runtime format, in runtime order, that is one of SWAPCHAIN_FORMATS.
pub fn pick_swapchain_format(runtime_formats: &[vk::Format]) -> Option<vk::Format> {
	runtime_formats
		.iter()
		.copied()
		.find(|format| SWAPCHAIN_FORMATS.contains(format))
}

pub fn view_projection(view: &xr::View, near: f32, far: f32) -> Mat4 {
	let projection = math::projection_fov(&view.fov, near, far);
	let view = math::invert_rigid_body(&math::pose_matrix(&view.pose));
	projection * view
}

#[cfg(test)]
mod tests {
	use bevy::math::{Vec3, Vec4};
	use super::*;

	#[test]
	fn runtime_order_wins() {
		let formats = [
			vk::Format::R16G16B16A16_SFLOAT,
			vk::Format::B8G8R8A8_SRGB,
			vk::Format::R8G8B8A8_SRGB,
		];
		assert_eq!(pick_swapchain_format(&formats), Some(vk::Format::B8G8R8A8_SRGB));
	}

	#[test]
	fn no_known_format() {
		assert_eq!(pick_swapchain_format(&[vk::Format::R16G16B16A16_SFLOAT, vk::Format::A2B10G10R10_UNORM_PACK32]), None);
		assert_eq!(pick_swapchain_format(&[]), None);
	}

	#[test]
	fn view_projection_looks_down_negative_z() {
		let half_angle = std::f32::consts::FRAC_PI_4;
		let view = xr::View {
			pose: math::pose_translation(Vec3::new(0.0, 1.5, 0.0)),
			fov: xr::Fovf {
				angle_left: -half_angle,
				angle_right: half_angle,
				angle_up: half_angle,
				angle_down: -half_angle,
			},
		};

		let m = view_projection(&view, 0.05, 100.0);

		// A point straight ahead of the eye lands in the center of the image.
		let clip = m * Vec4::new(0.0, 1.5, -2.0, 1.0);
		let ndc = clip.truncate() / clip.w;
		assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
		assert!(ndc.z > 0.0 && ndc.z < 1.0);

		// Behind the eye is clipped.
		let behind = m * Vec4::new(0.0, 1.5, 2.0, 1.0);
		assert!(behind.w < 0.0);
	}
}
