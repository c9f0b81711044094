use std::mem::ManuallyDrop;
use std::sync::Arc;
use ash::vk;
use derivative::Derivative;
use gpu_allocator::MemoryLocation;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use quest_xr_utils::debug_string::{dbgfmt, DebugString};
use crate::context::GpuContext;
use crate::error::GfxError;

#[derive(Derivative)]
#[derivative(Debug)]
pub struct Buffer {
	pub(crate) name: DebugString,
	pub(crate) handle: vk::Buffer,
	#[derivative(Debug = "ignore")]
	pub(crate) allocation: ManuallyDrop<Allocation>,
	size: usize,
	memory: MemoryLocation,
	#[derivative(Debug = "ignore")]
	pub(crate) cx: Arc<GpuContext>,
}

impl Buffer {
	pub fn new(
		name: DebugString,
		context: Arc<GpuContext>,
		create_info: &BufferCreateInfo,
	) -> Result<Self, GfxError> {
		assert_ne!(create_info.size, 0);
		assert!(!create_info.usage.is_empty());

		// Device local memory can only be written through a staging copy.
		let usage = match create_info.memory {
			MemoryLocation::GpuOnly => create_info.usage | vk::BufferUsageFlags::TRANSFER_DST,
			_ => create_info.usage,
		};

		let buffer = {
			let create_info = vk::BufferCreateInfo::default()
				.usage(usage)
				.sharing_mode(vk::SharingMode::EXCLUSIVE)
				.size(create_info.size as u64);

			unsafe { context.device.create_buffer(&create_info, None) }?
		};

		let allocation = {
			let (requirements, dedicated_allocation) = {
				let info = vk::BufferMemoryRequirementsInfo2::default()
					.buffer(buffer);

				let mut requirements = vk::MemoryRequirements2::default();
				let mut dedicated_requirements = vk::MemoryDedicatedRequirements::default();
				requirements = requirements.push_next(&mut dedicated_requirements);

				unsafe { context.device.get_buffer_memory_requirements2(&info, &mut requirements); }
				(requirements.memory_requirements, dedicated_requirements.prefers_dedicated_allocation == vk::TRUE)
			};

			let allocation_scheme = match dedicated_allocation {
				true => AllocationScheme::DedicatedBuffer(buffer),
				false => AllocationScheme::GpuAllocatorManaged,
			};

			let create_info = AllocationCreateDesc {
				name: name.as_str(),
				requirements,
				location: create_info.memory,
				linear: true,
				allocation_scheme,
			};

			match context.alloc(&create_info) {
				Ok(allocation) => allocation,
				Err(e) => {
					unsafe { context.device.destroy_buffer(buffer, None); }
					return Err(e);
				},
			}
		};

		if let Err(e) = unsafe { context.device.bind_buffer_memory(buffer, allocation.memory(), allocation.offset()) } {
			context.dealloc(allocation);
			unsafe { context.device.destroy_buffer(buffer, None); }
			return Err(e.into());
		}

		#[cfg(debug_assertions)]
		unsafe {
			context.set_debug_name(name.as_str(), buffer);
		}

		Ok(Self {
			name,
			handle: buffer,
			allocation: ManuallyDrop::new(allocation),
			size: create_info.size,
			memory: create_info.memory,
			cx: context,
		})
	}

	#[inline(always)]
	pub fn handle(&self) -> vk::Buffer {
		self.handle
	}

	#[inline(always)]
	pub fn size(&self) -> usize {
		self.size
	}

	/// Returns None if this Buffer is not host visible.
	#[inline(always)]
	pub fn mapping_mut(&mut self) -> Option<&mut [u8]> {
		let size = self.size;
		self
			.allocation
			.mapped_slice_mut()
			.map(|data| &mut data[..size])
	}

	/// Overwrites the whole buffer. Host visible buffers are written through their mapping, device local
	/// buffers through a temporary staging buffer.
	pub fn update<T: bytemuck::NoUninit>(&mut self, data: &[T]) -> Result<(), GfxError> {
		let bytes = bytemuck::cast_slice::<T, u8>(data);
		if bytes.len() != self.size {
			return Err(GfxError::SizeMismatch {
				name: self.name.to_string(),
				expected: self.size,
				actual: bytes.len(),
			});
		}

		if let Some(mapping) = self.mapping_mut() {
			mapping.copy_from_slice(bytes);
			return Ok(());
		}

		let mut staging_buffer = Buffer::new(
			dbgfmt!("staging_buffer_{}", self.name.as_str()),
			Arc::clone(&self.cx),
			&BufferCreateInfo {
				size: self.size,
				usage: vk::BufferUsageFlags::TRANSFER_SRC,
				memory: MemoryLocation::CpuToGpu,
			},
		)?;

		staging_buffer.update(data)?;
		self.cx.copy_buffer(staging_buffer.handle, self.handle, self.size as vk::DeviceSize)
	}
}

impl Drop for Buffer {
	fn drop(&mut self) {
		unsafe {
			self.cx.dealloc(ManuallyDrop::take(&mut self.allocation));
			self.cx.device.destroy_buffer(self.handle, None);
		}
	}
}

#[derive(Clone, Debug)]
pub struct BufferCreateInfo {
	pub size: usize,
	pub usage: vk::BufferUsageFlags,
	pub memory: MemoryLocation,
}

impl BufferCreateInfo {
	#[inline(always)]
	pub const fn vertex_buffer<T>(len: usize) -> Self {
		Self {
			size: len * size_of::<T>(),
			usage: vk::BufferUsageFlags::VERTEX_BUFFER,
			memory: MemoryLocation::GpuOnly,
		}
	}

	#[inline(always)]
	pub const fn index_buffer<T>(len: usize) -> Self {
		Self {
			size: len * size_of::<T>(),
			usage: vk::BufferUsageFlags::INDEX_BUFFER,
			memory: MemoryLocation::GpuOnly,
		}
	}
}

impl Default for BufferCreateInfo {
	fn default() -> Self {
		Self {
			size: 0,
			usage: vk::BufferUsageFlags::empty(),
			memory: MemoryLocation::GpuOnly,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::mesh::{Vertex, CUBE_INDICES, CUBE_VERTICES};

	#[test]
	fn cube_buffer_sizes() {
		let vertices = BufferCreateInfo::vertex_buffer::<Vertex>(CUBE_VERTICES.len());
		assert_eq!(vertices.size, 8 * 24);
		assert_eq!(vertices.usage, vk::BufferUsageFlags::VERTEX_BUFFER);
		assert_eq!(vertices.memory, MemoryLocation::GpuOnly);

		let indices = BufferCreateInfo::index_buffer::<u16>(CUBE_INDICES.len());
		assert_eq!(indices.size, 36 * 2);
		assert_eq!(indices.usage, vk::BufferUsageFlags::INDEX_BUFFER);
	}
}
