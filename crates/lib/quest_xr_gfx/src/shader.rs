use std::ffi::CString;
use std::io::Cursor;
use std::sync::Arc;
use ash::vk;
use quest_xr_gfx_utils::ShaderStage;
use crate::context::GpuContext;
use crate::error::GfxError;

/// SPIR-V compiled from shaders/ by the build script.
pub mod shaders {
	pub const CUBE_VERT: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/cube.vert.spv"));
	pub const CUBE_FRAG: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/cube.frag.spv"));
}

// What the pipeline needs to know about a shader, read straight from its SPIR-V.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShaderReflection {
	pub stage: ShaderStage,
	pub push_constants: Vec<PushConstantRange>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PushConstantRange {
	pub offset: u32,
	pub size: u32,
}

impl ShaderReflection {
	pub fn new(code: &[u32], entry_point: &str) -> Result<Self, GfxError> {
		let module = spirv_reflect::ShaderModule::load_u32_data(code).map_err(GfxError::ShaderReflection)?;

		let stage = vk::ShaderStageFlags::from_raw(module.get_shader_stage().bits());
		let stage = ShaderStage::from_vk(stage).ok_or(GfxError::UnsupportedShaderStage(stage))?;

		let push_constants = module
			.enumerate_push_constant_blocks(Some(entry_point))
			.map_err(GfxError::ShaderReflection)?
			.into_iter()
			.map(|block| PushConstantRange {
				offset: block.offset,
				size: block.size,
			})
			.collect();

		Ok(Self {
			stage,
			push_constants,
		})
	}

	pub fn vk_push_constant_ranges(&self) -> impl Iterator<Item = vk::PushConstantRange> + '_ {
		self.push_constants
			.iter()
			.map(|range| vk::PushConstantRange::default()
				.stage_flags(self.stage.into())
				.offset(range.offset)
				.size(range.size)
			)
	}
}

pub struct ShaderModule {
	pub handle: vk::ShaderModule,
	pub reflection: ShaderReflection,
	entry_point: CString,
	context: Arc<GpuContext>,
}

impl ShaderModule {
	pub fn new(context: Arc<GpuContext>, spirv: &[u8], entry_point: &str) -> Result<Self, GfxError> {
		let code = ash::util::read_spv(&mut Cursor::new(spirv)).map_err(GfxError::InvalidSpirv)?;
		let reflection = ShaderReflection::new(&code, entry_point)?;

		let entry_point = CString::new(entry_point)
			.map_err(|e| GfxError::InvalidSpirv(std::io::Error::new(std::io::ErrorKind::InvalidInput, e)))?;

		let handle = {
			let create_info = vk::ShaderModuleCreateInfo::default()
				.code(&code);

			unsafe { context.device.create_shader_module(&create_info, None) }?
		};

		Ok(Self {
			handle,
			reflection,
			entry_point,
			context,
		})
	}

	pub fn stage_info(&self) -> vk::PipelineShaderStageCreateInfo<'_> {
		vk::PipelineShaderStageCreateInfo::default()
			.stage(self.reflection.stage.into())
			.module(self.handle)
			.name(&self.entry_point)
	}
}

impl Drop for ShaderModule {
	fn drop(&mut self) {
		unsafe { self.context.device.destroy_shader_module(self.handle, None); }
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn reflect(spirv: &[u8]) -> ShaderReflection {
		let code = ash::util::read_spv(&mut Cursor::new(spirv)).unwrap();
		ShaderReflection::new(&code, "main").unwrap()
	}

	#[test]
	fn cube_vertex_shader_has_mvp_push_constant() {
		let reflection = reflect(shaders::CUBE_VERT);
		assert_eq!(reflection.stage, ShaderStage::Vertex);
		assert_eq!(reflection.push_constants, vec![PushConstantRange { offset: 0, size: 64 }]);

		let ranges = reflection.vk_push_constant_ranges().collect::<Vec<_>>();
		assert_eq!(ranges.len(), 1);
		assert_eq!(ranges[0].stage_flags, vk::ShaderStageFlags::VERTEX);
		assert_eq!(ranges[0].size, size_of::<[[f32; 4]; 4]>() as u32);
	}

	#[test]
	fn cube_fragment_shader_has_no_push_constants() {
		let reflection = reflect(shaders::CUBE_FRAG);
		assert_eq!(reflection.stage, ShaderStage::Fragment);
		assert!(reflection.push_constants.is_empty());
	}

	#[test]
	fn garbage_is_rejected() {
		assert!(ShaderReflection::new(&[0xdead_beef, 0, 0, 0, 0], "main").is_err());
	}
}
