use std::mem::ManuallyDrop;
use std::sync::Arc;
use ash::vk;
use bevy::math::UVec2;
use gpu_allocator::MemoryLocation;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use quest_xr_gfx_utils::MsaaCount;
use quest_xr_utils::debug_string::DebugString;
use crate::context::GpuContext;
use crate::error::GfxError;

// Single mip, single layer 2D attachment image with its view.
pub struct Image {
	pub(crate) handle: vk::Image,
	pub(crate) view: vk::ImageView,
	pub(crate) allocation: ManuallyDrop<Allocation>,
	pub(crate) format: vk::Format,
	context: Arc<GpuContext>,
}

impl Image {
	pub fn new(
		name: DebugString,
		context: Arc<GpuContext>,
		create_info: &ImageCreateInfo,
	) -> Result<Self, GfxError> {
		assert!(create_info.resolution.x > 0 && create_info.resolution.y > 0, "Resolution was {:?}! Must be greater than 0!", create_info.resolution);

		let image = {
			let create_info = vk::ImageCreateInfo::default()
				.image_type(vk::ImageType::TYPE_2D)
				.extent(vk::Extent3D::default()
					.width(create_info.resolution.x)
					.height(create_info.resolution.y)
					.depth(1)
				)
				.mip_levels(1)
				.array_layers(1)
				.format(create_info.format)
				.samples(create_info.msaa.as_vk_sample_count())
				.tiling(vk::ImageTiling::OPTIMAL)
				.usage(create_info.usage)
				.sharing_mode(vk::SharingMode::EXCLUSIVE)
				.initial_layout(vk::ImageLayout::UNDEFINED);

			unsafe { context.device.create_image(&create_info, None) }?
		};

		let allocation = {
			let (requirements, dedicated_allocation) = {
				let info = vk::ImageMemoryRequirementsInfo2::default()
					.image(image);

				let mut requirements = vk::MemoryRequirements2::default();
				let mut dedicated_requirements = vk::MemoryDedicatedRequirements::default();
				requirements = requirements.push_next(&mut dedicated_requirements);

				unsafe { context.device.get_image_memory_requirements2(&info, &mut requirements); }
				(requirements.memory_requirements, dedicated_requirements.prefers_dedicated_allocation == vk::TRUE)
			};

			let allocation_scheme = match dedicated_allocation {
				true => AllocationScheme::DedicatedImage(image),
				false => AllocationScheme::GpuAllocatorManaged,
			};

			let create_info = AllocationCreateDesc {
				name: name.as_str(),
				requirements,
				location: create_info.memory,
				linear: false,
				allocation_scheme,
			};

			match context.alloc(&create_info) {
				Ok(allocation) => allocation,
				Err(e) => {
					unsafe { context.device.destroy_image(image, None); }
					return Err(e);
				},
			}
		};

		let image_view = unsafe { context.device.bind_image_memory(image, allocation.memory(), allocation.offset()) }
			.map_err(GfxError::from)
			.and_then(|_| context.create_image_view(image, create_info.format, aspect_mask(create_info.format)));

		let image_view = match image_view {
			Ok(image_view) => image_view,
			Err(e) => {
				context.dealloc(allocation);
				unsafe { context.device.destroy_image(image, None); }
				return Err(e);
			},
		};

		#[cfg(debug_assertions)]
		unsafe {
			context.set_debug_name(name.as_str(), image);
			context.set_debug_name(format!("{name}_view").as_str(), image_view);
		}

		Ok(Self {
			handle: image,
			view: image_view,
			allocation: ManuallyDrop::new(allocation),
			format: create_info.format,
			context,
		})
	}

	#[inline(always)]
	pub fn handle(&self) -> vk::Image {
		self.handle
	}

	#[inline(always)]
	pub fn view(&self) -> vk::ImageView {
		self.view
	}

	#[inline(always)]
	pub fn format(&self) -> vk::Format {
		self.format
	}
}

impl Drop for Image {
	fn drop(&mut self) {
		unsafe {
			self.context.device.destroy_image_view(self.view, None);
			self.context.dealloc(ManuallyDrop::take(&mut self.allocation));
			self.context.device.destroy_image(self.handle, None);
		}
	}
}

#[derive(Clone, Debug)]
pub struct ImageCreateInfo {
	pub resolution: UVec2,
	pub format: vk::Format,
	pub usage: vk::ImageUsageFlags,
	pub msaa: MsaaCount,
	pub memory: MemoryLocation,
}

pub fn aspect_mask(format: vk::Format) -> vk::ImageAspectFlags {
	match format {
		vk::Format::D32_SFLOAT | vk::Format::X8_D24_UNORM_PACK32 | vk::Format::D16_UNORM => vk::ImageAspectFlags::DEPTH,
		vk::Format::D32_SFLOAT_S8_UINT | vk::Format::D24_UNORM_S8_UINT | vk::Format::D16_UNORM_S8_UINT => vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL,
		_ => vk::ImageAspectFlags::COLOR,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn aspect_from_format() {
		assert_eq!(aspect_mask(vk::Format::R8G8B8A8_SRGB), vk::ImageAspectFlags::COLOR);
		assert_eq!(aspect_mask(vk::Format::D32_SFLOAT), vk::ImageAspectFlags::DEPTH);
		assert_eq!(aspect_mask(vk::Format::D24_UNORM_S8_UINT), vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL);
	}
}
