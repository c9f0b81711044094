use ash::vk;
use openxr as xr;
use quest_xr_gfx_utils::DataType;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GfxError {
	#[error("Vulkan call failed: {0}")]
	Vulkan(#[from] vk::Result),
	#[error("OpenXR call failed: {0}")]
	Xr(#[from] xr::sys::Result),
	#[error("Failed to load the Vulkan library: {0}")]
	Loading(#[from] ash::LoadingError),
	#[error("GPU memory allocation failed: {0}")]
	Allocation(#[from] gpu_allocator::AllocationError),
	#[error("OpenXR runtime supports Vulkan {min}..={max} but the device reports {device}!")]
	UnsupportedVulkanVersion {
		min: xr::Version,
		max: xr::Version,
		device: String,
	},
	#[error("No queue family supports graphics!")]
	NoGraphicsQueue,
	#[error("None of the formats {0:?} are supported!")]
	NoSupportedFormat(Vec<vk::Format>),
	#[error("Unsupported image layout transition {0:?} -> {1:?}!")]
	UnsupportedLayoutTransition(vk::ImageLayout, vk::ImageLayout),
	#[error("Invalid SPIR-V: {0}")]
	InvalidSpirv(#[source] std::io::Error),
	#[error("Shader reflection failed: {0}")]
	ShaderReflection(&'static str),
	#[error("Unsupported shader stage {0:?}!")]
	UnsupportedShaderStage(vk::ShaderStageFlags),
	#[error("{0:?} can not be used as an index type!")]
	UnsupportedIndexType(DataType),
	#[error("{0:?} x {1} is not a valid vertex attribute format!")]
	UnsupportedVertexFormat(DataType, u32),
	#[error("Buffer \"{name}\" is {expected} bytes but {actual} bytes were written!")]
	SizeMismatch {
		name: String,
		expected: usize,
		actual: usize,
	},
	#[error("Pipeline \"{0}\" has no vertex or index buffer bound!")]
	MissingGeometry(String),
	#[error("The swapchain format was already selected!")]
	FormatAlreadySelected,
	#[error("Rendering was requested before a swapchain format was selected!")]
	FormatNotSelected,
	#[error("Texture arrays are not supported (image array index {0})!")]
	TextureArrayUnsupported(u32),
	#[error("Swapchain index {0} is out of range!")]
	InvalidSwapchain(usize),
	#[error("frames_in_flight must be at least 1!")]
	NoFramesInFlight,
}
