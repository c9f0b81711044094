use std::slice;
use std::sync::Arc;
use ash::vk;
use quest_xr_gfx_utils::{CompareOp, CullMode, DataType, DrawMode, FrontFace};
use quest_xr_utils::debug_string::DebugString;
use crate::buffer::Buffer;
use crate::context::GpuContext;
use crate::error::GfxError;
use crate::render_pass::RenderPass;
use crate::shader::{ShaderModule, ShaderReflection};
use crate::vertex_layout::VertexBufferLayout;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PipelineConfig {
	pub draw_mode: DrawMode,
	pub cull_mode: CullMode,
	pub front_face: FrontFace,
	pub enable_depth_test: bool,
	pub depth_function: CompareOp,
}

impl PipelineConfig {
	pub const CUBE: Self = Self {
		draw_mode: DrawMode::TriangleList,
		cull_mode: CullMode::Back,
		front_face: FrontFace::Ccw,
		enable_depth_test: true,
		depth_function: CompareOp::Less,
	};
}

impl Default for PipelineConfig {
	fn default() -> Self {
		Self {
			draw_mode: DrawMode::TriangleStrip,
			cull_mode: CullMode::None,
			front_face: FrontFace::Cw,
			enable_depth_test: false,
			depth_function: CompareOp::Less,
		}
	}
}

struct IndexBuffer {
	buffer: Buffer,
	index_type: vk::IndexType,
	count: u32,
}

pub struct GraphicsPipeline {
	name: DebugString,
	pub(crate) handle: vk::Pipeline,
	pub(crate) layout: vk::PipelineLayout,
	vertex_buffer: Option<Buffer>,
	index_buffer: Option<IndexBuffer>,
	context: Arc<GpuContext>,
}

impl GraphicsPipeline {
	// The shader modules may be destroyed once this returns.
	pub fn new(
		name: DebugString,
		context: Arc<GpuContext>,
		render_pass: &RenderPass,
		vertex_shader: &ShaderModule,
		fragment_shader: &ShaderModule,
		vertex_layout: &VertexBufferLayout,
		config: &PipelineConfig,
	) -> Result<Self, GfxError> {
		let layout = {
			let push_constant_ranges = push_constant_ranges(&[&vertex_shader.reflection, &fragment_shader.reflection]);
			let create_info = vk::PipelineLayoutCreateInfo::default()
				.push_constant_ranges(&push_constant_ranges);

			unsafe { context.device.create_pipeline_layout(&create_info, None) }?
		};

		let pipeline = (|| -> Result<vk::Pipeline, GfxError> {
			let stages = [vertex_shader.stage_info(), fragment_shader.stage_info()];

			let binding_descriptions = [vertex_layout.binding_description()];
			let attribute_descriptions = vertex_layout.attribute_descriptions()?;

			let vertex_input_state = vk::PipelineVertexInputStateCreateInfo::default()
				.vertex_binding_descriptions(&binding_descriptions)
				.vertex_attribute_descriptions(&attribute_descriptions);

			let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo::default()
				.topology(config.draw_mode.into())
				.primitive_restart_enable(false);

			let viewport_state = vk::PipelineViewportStateCreateInfo::default()
				.viewport_count(1)
				.scissor_count(1);

			let rasterization_state = vk::PipelineRasterizationStateCreateInfo::default()
				.depth_clamp_enable(false)
				.rasterizer_discard_enable(false)
				.polygon_mode(vk::PolygonMode::FILL)
				.line_width(1.0)
				.cull_mode(config.cull_mode.into())
				.front_face(config.front_face.into())
				.depth_bias_enable(false);

			let msaa_state = vk::PipelineMultisampleStateCreateInfo::default()
				.rasterization_samples(render_pass.msaa.as_vk_sample_count())
				.sample_shading_enable(false)
				.min_sample_shading(1.0);

			let depth_stencil_state = vk::PipelineDepthStencilStateCreateInfo::default()
				.depth_test_enable(config.enable_depth_test)
				.depth_write_enable(true)
				.depth_compare_op(config.depth_function.into())
				.depth_bounds_test_enable(false)
				.min_depth_bounds(0.0)
				.max_depth_bounds(1.0)
				.stencil_test_enable(false);

			let color_attachments = [
				vk::PipelineColorBlendAttachmentState::default()
					.color_write_mask(vk::ColorComponentFlags::R | vk::ColorComponentFlags::G | vk::ColorComponentFlags::B | vk::ColorComponentFlags::A)
					.blend_enable(false),
			];

			let color_blend_state = vk::PipelineColorBlendStateCreateInfo::default()
				.logic_op_enable(false)
				.attachments(&color_attachments);

			let dynamic_states = [
				vk::DynamicState::VIEWPORT,
				vk::DynamicState::SCISSOR,
			];

			let dynamic_state = vk::PipelineDynamicStateCreateInfo::default()
				.dynamic_states(&dynamic_states);

			let create_info = vk::GraphicsPipelineCreateInfo::default()
				.stages(&stages)
				.vertex_input_state(&vertex_input_state)
				.input_assembly_state(&input_assembly_state)
				.viewport_state(&viewport_state)
				.rasterization_state(&rasterization_state)
				.multisample_state(&msaa_state)
				.depth_stencil_state(&depth_stencil_state)
				.color_blend_state(&color_blend_state)
				.dynamic_state(&dynamic_state)
				.layout(layout)
				.render_pass(render_pass.handle)
				.subpass(0)
				.base_pipeline_handle(vk::Pipeline::null())
				.base_pipeline_index(-1);

			let pipelines = unsafe { context.device.create_graphics_pipelines(vk::PipelineCache::null(), slice::from_ref(&create_info), None) }
				.map_err(|(_, e)| e)?;

			Ok(pipelines[0])
		})();

		let pipeline = match pipeline {
			Ok(pipeline) => pipeline,
			Err(e) => {
				unsafe { context.device.destroy_pipeline_layout(layout, None); }
				return Err(e);
			},
		};

		#[cfg(debug_assertions)]
		unsafe {
			context.set_debug_name(name.as_str(), pipeline);
			context.set_debug_name(format!("{name}_layout").as_str(), layout);
		}

		Ok(Self {
			name,
			handle: pipeline,
			layout,
			vertex_buffer: None,
			index_buffer: None,
			context,
		})
	}

	#[inline(always)]
	pub fn layout(&self) -> vk::PipelineLayout {
		self.layout
	}

	pub fn set_vertex_buffer(&mut self, buffer: Buffer) {
		self.vertex_buffer = Some(buffer);
	}

	pub fn set_index_buffer(&mut self, buffer: Buffer, data_type: DataType) -> Result<(), GfxError> {
		let index_type = data_type
			.vk_index_type()
			.ok_or(GfxError::UnsupportedIndexType(data_type))?;

		let count = (buffer.size() / data_type.size_in_bytes()) as u32;
		self.index_buffer = Some(IndexBuffer {
			buffer,
			index_type,
			count,
		});

		Ok(())
	}

	/// Number of indices in the bound index buffer.
	#[inline]
	pub fn index_count(&self) -> u32 {
		self.index_buffer.as_ref().map_or(0, |x| x.count)
	}

	pub unsafe fn bind(&self, cmd: vk::CommandBuffer) -> Result<(), GfxError> {
		let (Some(vertex_buffer), Some(index_buffer)) = (&self.vertex_buffer, &self.index_buffer) else {
			return Err(GfxError::MissingGeometry(self.name.to_string()));
		};

		unsafe {
			self.context.device.cmd_bind_pipeline(cmd, vk::PipelineBindPoint::GRAPHICS, self.handle);
			self.context.device.cmd_bind_vertex_buffers(cmd, VertexBufferLayout::BINDING, &[vertex_buffer.handle()], &[0]);
			self.context.device.cmd_bind_index_buffer(cmd, index_buffer.buffer.handle(), 0, index_buffer.index_type);
		}

		Ok(())
	}
}

impl Drop for GraphicsPipeline {
	fn drop(&mut self) {
		// May still be referenced by in-flight command buffers.
		self.context.wait_idle();

		unsafe {
			self.context.device.destroy_pipeline(self.handle, None);
			self.context.device.destroy_pipeline_layout(self.layout, None);
		}
	}
}

/// Push constant ranges of every stage, in stage order.
pub fn push_constant_ranges(shaders: &[&ShaderReflection]) -> Vec<vk::PushConstantRange> {
	shaders
		.iter()
		.flat_map(|shader| shader.vk_push_constant_ranges())
		.collect()
}

#[cfg(test)]
mod tests {
	use quest_xr_gfx_utils::ShaderStage;
	use crate::shader::PushConstantRange;
	use super::*;

	#[test]
	fn cube_config_differs_from_defaults() {
		let default = PipelineConfig::default();
		assert_eq!(default.draw_mode, DrawMode::TriangleStrip);
		assert_eq!(default.cull_mode, CullMode::None);
		assert_eq!(default.front_face, FrontFace::Cw);
		assert!(!default.enable_depth_test);

		assert_eq!(PipelineConfig::CUBE.draw_mode, DrawMode::TriangleList);
		assert!(PipelineConfig::CUBE.enable_depth_test);
		assert_eq!(PipelineConfig::CUBE.depth_function, CompareOp::Less);
	}

	#[test]
	fn push_constants_concatenate_per_stage() {
		let vertex = ShaderReflection {
			stage: ShaderStage::Vertex,
			push_constants: vec![PushConstantRange { offset: 0, size: 64 }],
		};
		let fragment = ShaderReflection {
			stage: ShaderStage::Fragment,
			push_constants: vec![PushConstantRange { offset: 64, size: 16 }],
		};

		let ranges = push_constant_ranges(&[&vertex, &fragment]);
		assert_eq!(ranges.len(), 2);
		assert_eq!((ranges[0].stage_flags, ranges[0].offset, ranges[0].size), (vk::ShaderStageFlags::VERTEX, 0, 64));
		assert_eq!((ranges[1].stage_flags, ranges[1].offset, ranges[1].size), (vk::ShaderStageFlags::FRAGMENT, 64, 16));
	}
}
