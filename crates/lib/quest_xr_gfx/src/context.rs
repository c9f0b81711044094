use std::ffi::{c_void, CStr, CString};
use std::mem::ManuallyDrop;
use std::sync::Mutex;
use std::{mem, slice};
use ash::vk;
use ash::vk::Handle;
use bevy::log::{debug, error, info, warn};
use bevy::utils::HashSet;
use gpu_allocator::{AllocationSizes, AllocatorDebugSettings};
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, Allocator, AllocatorCreateDesc};
use openxr as xr;
use quest_xr_gfx_utils::MsaaCount;
use crate::error::GfxError;

/// Vulkan objects created through the OpenXR runtime (XR_KHR_vulkan_enable2) plus the memory allocator.
pub struct GpuContext {
	pub entry: ash::Entry,
	pub instance: ash::Instance,
	pub physical_device: vk::PhysicalDevice,
	pub device: ash::Device,
	pub queue_family: u32,
	pub queue: vk::Queue,
	pub command_pool: vk::CommandPool,
	pub extensions: Extensions,
	pub(crate) allocator: ManuallyDrop<Mutex<Allocator>>,
}

impl GpuContext {
	#[cfg(debug_assertions)]
	const VALIDATION_LAYER: &'static CStr = c"VK_LAYER_KHRONOS_validation";

	#[cfg(debug_assertions)]
	const VALIDATION_FEATURES: [vk::ValidationFeatureEnableEXT; 4] = [
		vk::ValidationFeatureEnableEXT::GPU_ASSISTED,
		vk::ValidationFeatureEnableEXT::GPU_ASSISTED_RESERVE_BINDING_SLOT,
		vk::ValidationFeatureEnableEXT::BEST_PRACTICES,
		vk::ValidationFeatureEnableEXT::SYNCHRONIZATION_VALIDATION,
	];

	// Ordered by preference.
	pub const DEPTH_FORMATS: [vk::Format; 3] = [
		vk::Format::D32_SFLOAT,
		vk::Format::D32_SFLOAT_S8_UINT,
		vk::Format::D24_UNORM_S8_UINT,
	];

	// With OpenXR the runtime must create the instance and device so it can inject the extensions it needs.
	pub fn new(xr_instance: &xr::Instance, system: xr::SystemId, application_name: &str) -> Result<Self, GfxError> {
		let requirements = xr_instance.graphics_requirements::<xr::Vulkan>(system)?;
		let max_version = requirements.max_api_version_supported;
		let api_version = vk::make_api_version(0, max_version.major() as u32, max_version.minor() as u32, max_version.patch());

		info!(
			"Vulkan requirements: min {}, max {}",
			requirements.min_api_version_supported,
			requirements.max_api_version_supported,
		);

		let entry = unsafe { ash::Entry::load() }?;

		#[allow(unused_mut)]
		let mut layer_names = Vec::<&CStr>::new();
		#[allow(unused_mut)]
		let mut extension_names = Vec::<&CStr>::new();
		#[allow(unused_mut, unused_variables)]
		let mut validation_features_enabled = false;

		#[cfg(debug_assertions)]
		{
			let available_layers = unsafe { entry.enumerate_instance_layer_properties() }?
				.into_iter()
				.map(|x| unsafe { CStr::from_ptr(x.layer_name.as_ptr()) }.to_owned())
				.collect::<HashSet<_>>();

			if available_layers.contains(Self::VALIDATION_LAYER) {
				layer_names.push(Self::VALIDATION_LAYER);

				let available_extensions = unsafe { entry.enumerate_instance_extension_properties(Some(Self::VALIDATION_LAYER)) }?
					.into_iter()
					.map(|x| unsafe { CStr::from_ptr(x.extension_name.as_ptr()) }.to_owned())
					.collect::<HashSet<_>>();

				for name in [ash::ext::debug_utils::NAME, ash::ext::validation_features::NAME] {
					if available_extensions.contains(name) {
						extension_names.push(name);
					} else {
						warn!("Extension {name:?} is unavailable! Removing from list of instance extensions");
					}
				}

				validation_features_enabled = extension_names.contains(&ash::ext::validation_features::NAME);
			} else {
				warn!("Layer {:?} is unavailable! Removing from list of layers", Self::VALIDATION_LAYER);
			}
		}

		let instance = {
			let application_name = CString::new(application_name).unwrap_or_else(|_| c"quest-xr".to_owned());
			let layer_names = layer_names.iter().map(|x| x.as_ptr()).collect::<Vec<_>>();
			let extension_names = extension_names.iter().map(|x| x.as_ptr()).collect::<Vec<_>>();

			let app_info = vk::ApplicationInfo::default()
				.api_version(api_version)
				.application_name(&application_name)
				.application_version(0)
				.engine_name(c"No Engine")
				.engine_version(0);

			#[cfg(debug_assertions)]
			let mut validation_features = vk::ValidationFeaturesEXT::default()
				.enabled_validation_features(&Self::VALIDATION_FEATURES);

			#[allow(unused_mut)]
			let mut create_info = vk::InstanceCreateInfo::default()
				.application_info(&app_info)
				.enabled_layer_names(&layer_names)
				.enabled_extension_names(&extension_names);

			#[cfg(debug_assertions)]
			if validation_features_enabled {
				create_info = create_info.push_next(&mut validation_features);
			}

			let raw = unsafe {
				xr_instance.create_vulkan_instance(
					system,
					mem::transmute(entry.static_fn().get_instance_proc_addr),
					&create_info as *const _ as *const _,
				)
			}?
			.map_err(vk::Result::from_raw)?;

			unsafe { ash::Instance::load(entry.static_fn(), vk::Instance::from_raw(raw as _)) }
		};

		let physical_device = vk::PhysicalDevice::from_raw(unsafe { xr_instance.vulkan_graphics_device(system, instance.handle().as_raw() as _) }? as _);

		let device_props = unsafe { instance.get_physical_device_properties(physical_device) };
		let device_name = unsafe { CStr::from_ptr(device_props.device_name.as_ptr()) }.to_string_lossy();
		info!(
			"Vulkan device {device_name} (api {}.{}.{})",
			vk::api_version_major(device_props.api_version),
			vk::api_version_minor(device_props.api_version),
			vk::api_version_patch(device_props.api_version),
		);

		let min_version = requirements.min_api_version_supported;
		if device_props.api_version < vk::make_api_version(0, min_version.major() as u32, min_version.minor() as u32, 0) {
			return Err(GfxError::UnsupportedVulkanVersion {
				min: min_version,
				max: max_version,
				device: format!(
					"{}.{}",
					vk::api_version_major(device_props.api_version),
					vk::api_version_minor(device_props.api_version),
				),
			});
		}

		let queue_family = unsafe { instance.get_physical_device_queue_family_properties(physical_device) }
			.iter()
			.position(|x| x.queue_flags.contains(vk::QueueFlags::GRAPHICS))
			.ok_or(GfxError::NoGraphicsQueue)? as u32;

		let device = {
			let queue_priorities = [0.0];
			let queue_create_infos = [
				vk::DeviceQueueCreateInfo::default()
					.queue_family_index(queue_family)
					.queue_priorities(&queue_priorities),
			];

			let features = vk::PhysicalDeviceFeatures::default();
			let create_info = vk::DeviceCreateInfo::default()
				.queue_create_infos(&queue_create_infos)
				.enabled_features(&features);

			let raw = unsafe {
				xr_instance.create_vulkan_device(
					system,
					mem::transmute(entry.static_fn().get_instance_proc_addr),
					physical_device.as_raw() as _,
					&create_info as *const _ as *const _,
				)
			}?
			.map_err(vk::Result::from_raw)?;

			unsafe { ash::Device::load(instance.fp_v1_0(), vk::Device::from_raw(raw as _)) }
		};

		let queue = unsafe { device.get_device_queue(queue_family, 0) };

		let command_pool = {
			let create_info = vk::CommandPoolCreateInfo::default()
				.flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER)
				.queue_family_index(queue_family);

			unsafe { device.create_command_pool(&create_info, None) }?
		};

		let extensions = Extensions {
			#[cfg(debug_assertions)]
			debug_utils: if extension_names.contains(&ash::ext::debug_utils::NAME) {
				Some(DebugUtils::new(&entry, &instance, &device)?)
			} else {
				None
			},
		};

		let allocator = {
			#[cfg(debug_assertions)]
			let debug_settings = AllocatorDebugSettings {
				log_leaks_on_shutdown: true,
				..Default::default()
			};

			#[cfg(not(debug_assertions))]
			let debug_settings = AllocatorDebugSettings::default();

			let create_info = AllocatorCreateDesc {
				instance: instance.clone(),
				device: device.clone(),
				physical_device,
				debug_settings,
				buffer_device_address: false,
				allocation_sizes: AllocationSizes::default(),
			};

			Allocator::new(&create_info)?
		};

		Ok(Self {
			entry,
			instance,
			physical_device,
			device,
			queue_family,
			queue,
			command_pool,
			extensions,
			allocator: ManuallyDrop::new(Mutex::new(allocator)),
		})
	}

	/// Graphics binding handed to xrCreateSession.
	pub fn session_create_info(&self) -> xr::vulkan::SessionCreateInfo {
		xr::vulkan::SessionCreateInfo {
			instance: self.instance.handle().as_raw() as *const _,
			physical_device: self.physical_device.as_raw() as *const _,
			device: self.device.handle().as_raw() as *const _,
			queue_family_index: self.queue_family,
			queue_index: 0,
		}
	}

	pub fn alloc(&self, create_info: &AllocationCreateDesc) -> Result<Allocation, GfxError> {
		let mut allocator = self.allocator.lock().unwrap_or_else(|e| e.into_inner());
		Ok(allocator.allocate(create_info)?)
	}

	pub fn dealloc(&self, allocation: Allocation) {
		let mut allocator = self.allocator.lock().unwrap_or_else(|e| e.into_inner());
		if let Err(e) = allocator.free(allocation) {
			error!("Failed to free GPU memory: {e}");
		}
	}

	/// First candidate whose `tiling` features contain `features`.
	pub fn find_supported_format(&self, candidates: &[vk::Format], tiling: vk::ImageTiling, features: vk::FormatFeatureFlags) -> Result<vk::Format, GfxError> {
		candidates
			.iter()
			.copied()
			.find(|&format| {
				let props = unsafe { self.instance.get_physical_device_format_properties(self.physical_device, format) };
				match tiling {
					vk::ImageTiling::LINEAR => props.linear_tiling_features.contains(features),
					vk::ImageTiling::OPTIMAL => props.optimal_tiling_features.contains(features),
					_ => false,
				}
			})
			.ok_or_else(|| GfxError::NoSupportedFormat(candidates.to_vec()))
	}

	pub fn depth_format(&self) -> Result<vk::Format, GfxError> {
		self.find_supported_format(&Self::DEPTH_FORMATS, vk::ImageTiling::OPTIMAL, vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT)
	}

	/// Highest sample count usable for both color and depth attachments, capped by `max`.
	pub fn max_usable_sample_count(&self, max: MsaaCount) -> MsaaCount {
		let props = unsafe { self.instance.get_physical_device_properties(self.physical_device) };
		let counts = props.limits.framebuffer_color_sample_counts & props.limits.framebuffer_depth_sample_counts;
		MsaaCount::max_from_flags(counts).min(max)
	}

	pub fn create_image_view(&self, image: vk::Image, format: vk::Format, aspect_mask: vk::ImageAspectFlags) -> Result<vk::ImageView, GfxError> {
		let create_info = vk::ImageViewCreateInfo::default()
			.image(image)
			.view_type(vk::ImageViewType::TYPE_2D)
			.format(format)
			.subresource_range(vk::ImageSubresourceRange::default()
				.aspect_mask(aspect_mask)
				.base_mip_level(0)
				.level_count(1)
				.base_array_layer(0)
				.layer_count(1)
			);

		Ok(unsafe { self.device.create_image_view(&create_info, None) }?)
	}

	pub unsafe fn cmd_transition_image_layout(
		&self,
		cmd: vk::CommandBuffer,
		image: vk::Image,
		format: vk::Format,
		old_layout: vk::ImageLayout,
		new_layout: vk::ImageLayout,
	) -> Result<(), GfxError> {
		let barrier = layout_transition_barrier(image, format, old_layout, new_layout)?;

		unsafe {
			self.device.cmd_pipeline_barrier(
				cmd,
				barrier.src_stage,
				barrier.dst_stage,
				vk::DependencyFlags::empty(),
				&[],
				&[],
				slice::from_ref(&barrier.barrier),
			);
		}

		Ok(())
	}

	pub fn transition_image_layout(&self, image: vk::Image, format: vk::Format, old_layout: vk::ImageLayout, new_layout: vk::ImageLayout) -> Result<(), GfxError> {
		self.immediate_cmd(|cmd| unsafe { self.cmd_transition_image_layout(cmd, image, format, old_layout, new_layout) })?
	}

	pub fn copy_buffer(&self, src: vk::Buffer, dst: vk::Buffer, size: vk::DeviceSize) -> Result<(), GfxError> {
		self.immediate_cmd(|cmd| {
			let regions = [
				vk::BufferCopy::default()
					.src_offset(0)
					.dst_offset(0)
					.size(size),
			];

			unsafe { self.device.cmd_copy_buffer(cmd, src, dst, &regions); }
		})
	}

	// Records with `closure` into a single-use command buffer and blocks until the GPU has executed it.
	pub fn immediate_cmd<T>(&self, closure: impl FnOnce(vk::CommandBuffer) -> T) -> Result<T, GfxError> {
		let command_pool = {
			let create_info = vk::CommandPoolCreateInfo::default()
				.flags(vk::CommandPoolCreateFlags::TRANSIENT)
				.queue_family_index(self.queue_family);

			unsafe { self.device.create_command_pool(&create_info, None) }?
		};

		let result = (|| -> Result<T, GfxError> {
			let cmd = {
				let create_info = vk::CommandBufferAllocateInfo::default()
					.command_pool(command_pool)
					.level(vk::CommandBufferLevel::PRIMARY)
					.command_buffer_count(1);

				unsafe { self.device.allocate_command_buffers(&create_info) }?[0]
			};

			unsafe {
				let begin_info = vk::CommandBufferBeginInfo::default()
					.flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

				self.device.begin_command_buffer(cmd, &begin_info)?;
			}

			let result = closure(cmd);

			unsafe { self.device.end_command_buffer(cmd) }?;

			let fence = unsafe { self.device.create_fence(&vk::FenceCreateInfo::default(), None) }?;

			let submit_info = vk::SubmitInfo::default()
				.command_buffers(slice::from_ref(&cmd));

			let submitted = unsafe {
				self.device.queue_submit(self.queue, slice::from_ref(&submit_info), fence)
					.and_then(|_| self.device.wait_for_fences(slice::from_ref(&fence), true, u64::MAX))
			};

			unsafe { self.device.destroy_fence(fence, None); }

			submitted?;
			Ok(result)
		})();

		// Also frees the command buffer.
		unsafe { self.device.destroy_command_pool(command_pool, None); }

		result
	}

	pub fn wait_idle(&self) {
		if let Err(e) = unsafe { self.device.device_wait_idle() } {
			error!("Failed to wait for device to become idle: {e}");
		}
	}

	// Handle must be valid and ensure this is only called from a single thread per-object!
	#[cfg(debug_assertions)]
	pub unsafe fn set_debug_name(&self, name: &str, handle: impl vk::Handle) {
		let Some(debug_utils) = &self.extensions.debug_utils else {
			return;
		};

		let Ok(name) = CString::new(name) else {
			return;
		};

		let name_info = vk::DebugUtilsObjectNameInfoEXT::default()
			.object_name(&name)
			.object_handle(handle);

		if let Err(e) = unsafe { debug_utils.device.set_debug_utils_object_name(&name_info) } {
			warn!("Failed to set debug name {name:?}: {e}");
		}
	}
}

impl Drop for GpuContext {
	fn drop(&mut self) {
		self.wait_idle();

		unsafe {
			ManuallyDrop::drop(&mut self.allocator);
			self.device.destroy_command_pool(self.command_pool, None);
			self.device.destroy_device(None);

			#[cfg(debug_assertions)]
			if let Some(debug_utils) = &self.extensions.debug_utils {
				debug_utils.instance.destroy_debug_utils_messenger(debug_utils.messenger, None);
			}

			self.instance.destroy_instance(None);
		}
	}
}

pub struct Extensions {
	#[cfg(debug_assertions)]
	pub debug_utils: Option<DebugUtils>,
}

#[cfg(debug_assertions)]
pub struct DebugUtils {
	pub instance: ash::ext::debug_utils::Instance,
	pub device: ash::ext::debug_utils::Device,
	pub messenger: vk::DebugUtilsMessengerEXT,
}

#[cfg(debug_assertions)]
impl DebugUtils {
	fn new(entry: &ash::Entry, instance: &ash::Instance, device: &ash::Device) -> Result<Self, GfxError> {
		let instance_fns = ash::ext::debug_utils::Instance::new(entry, instance);
		let create_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
			.message_severity(
				vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
					| vk::DebugUtilsMessageSeverityFlagsEXT::INFO
					| vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
					| vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
			)
			.message_type(
				vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
					| vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
					| vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE
			)
			.pfn_user_callback(Some(vk_messenger_callback));

		let messenger = unsafe { instance_fns.create_debug_utils_messenger(&create_info, None) }?;

		Ok(Self {
			instance: instance_fns,
			device: ash::ext::debug_utils::Device::new(instance, device),
			messenger,
		})
	}
}

pub(crate) struct LayoutTransition {
	pub barrier: vk::ImageMemoryBarrier<'static>,
	pub src_stage: vk::PipelineStageFlags,
	pub dst_stage: vk::PipelineStageFlags,
}

pub(crate) fn layout_transition_barrier(
	image: vk::Image,
	format: vk::Format,
	old_layout: vk::ImageLayout,
	new_layout: vk::ImageLayout,
) -> Result<LayoutTransition, GfxError> {
	use vk::AccessFlags;
	use vk::ImageAspectFlags;
	use vk::ImageLayout;
	use vk::PipelineStageFlags;

	let (aspect_mask, src_access_mask, dst_access_mask, src_stage, dst_stage) = match (old_layout, new_layout) {
		(ImageLayout::UNDEFINED, ImageLayout::TRANSFER_DST_OPTIMAL) => (
			ImageAspectFlags::COLOR,
			AccessFlags::empty(),
			AccessFlags::TRANSFER_WRITE,
			PipelineStageFlags::TOP_OF_PIPE,
			PipelineStageFlags::TRANSFER,
		),
		(ImageLayout::TRANSFER_DST_OPTIMAL, ImageLayout::SHADER_READ_ONLY_OPTIMAL) => (
			ImageAspectFlags::COLOR,
			AccessFlags::TRANSFER_WRITE,
			AccessFlags::SHADER_READ,
			PipelineStageFlags::TRANSFER,
			PipelineStageFlags::FRAGMENT_SHADER,
		),
		(ImageLayout::UNDEFINED, ImageLayout::COLOR_ATTACHMENT_OPTIMAL) => (
			ImageAspectFlags::COLOR,
			AccessFlags::empty(),
			AccessFlags::COLOR_ATTACHMENT_READ | AccessFlags::COLOR_ATTACHMENT_WRITE,
			PipelineStageFlags::TOP_OF_PIPE,
			PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
		),
		(ImageLayout::UNDEFINED, ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL) => (
			crate::image::aspect_mask(format) & (ImageAspectFlags::DEPTH | ImageAspectFlags::STENCIL),
			AccessFlags::empty(),
			AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ | AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
			PipelineStageFlags::TOP_OF_PIPE,
			PipelineStageFlags::EARLY_FRAGMENT_TESTS,
		),
		_ => return Err(GfxError::UnsupportedLayoutTransition(old_layout, new_layout)),
	};

	let barrier = vk::ImageMemoryBarrier::default()
		.src_access_mask(src_access_mask)
		.dst_access_mask(dst_access_mask)
		.old_layout(old_layout)
		.new_layout(new_layout)
		.src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
		.dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
		.image(image)
		.subresource_range(vk::ImageSubresourceRange::default()
			.aspect_mask(aspect_mask)
			.base_mip_level(0)
			.level_count(1)
			.base_array_layer(0)
			.layer_count(1)
		);

	Ok(LayoutTransition {
		barrier,
		src_stage,
		dst_stage,
	})
}

#[cfg(debug_assertions)]
unsafe extern "system" fn vk_messenger_callback(
	severity: vk::DebugUtilsMessageSeverityFlagsEXT,
	msg_type: vk::DebugUtilsMessageTypeFlagsEXT,
	data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
	_user_data: *mut c_void,
) -> vk::Bool32 {
	if data.is_null() {
		return vk::FALSE;
	}

	let data = unsafe { &*data };
	let msg = match data.p_message.is_null() {
		true => "".into(),
		false => unsafe { CStr::from_ptr(data.p_message) }.to_string_lossy(),
	};

	let mut types = String::new();
	for (flag, name) in [
		(vk::DebugUtilsMessageTypeFlagsEXT::GENERAL, "GENERAL"),
		(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION, "VALIDATION"),
		(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE, "PERFORMANCE"),
	] {
		if msg_type.contains(flag) {
			types.push('|');
			types.push_str(name);
		}
	}
	types.push('|');

	if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
		error!("validation layer {types}: {msg}");
	} else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
		warn!("validation layer {types}: {msg}");
	} else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
		info!("validation layer {types}: {msg}");
	} else {
		debug!("validation layer {types}: {msg}");
	}

	vk::FALSE
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn supported_transitions_pick_matching_aspect_and_stages() {
		let image = vk::Image::null();

		let color = layout_transition_barrier(image, vk::Format::R8G8B8A8_SRGB, vk::ImageLayout::UNDEFINED, vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL).unwrap();
		assert_eq!(color.barrier.subresource_range.aspect_mask, vk::ImageAspectFlags::COLOR);
		assert_eq!(color.dst_stage, vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT);
		assert_eq!(color.barrier.dst_access_mask, vk::AccessFlags::COLOR_ATTACHMENT_READ | vk::AccessFlags::COLOR_ATTACHMENT_WRITE);

		let depth = layout_transition_barrier(image, vk::Format::D32_SFLOAT, vk::ImageLayout::UNDEFINED, vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL).unwrap();
		assert_eq!(depth.barrier.subresource_range.aspect_mask, vk::ImageAspectFlags::DEPTH);

		let depth_stencil = layout_transition_barrier(image, vk::Format::D24_UNORM_S8_UINT, vk::ImageLayout::UNDEFINED, vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL).unwrap();
		assert_eq!(depth_stencil.barrier.subresource_range.aspect_mask, vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL);
		assert_eq!(depth.dst_stage, vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS);

		let upload = layout_transition_barrier(image, vk::Format::R8G8B8A8_UNORM, vk::ImageLayout::TRANSFER_DST_OPTIMAL, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL).unwrap();
		assert_eq!(upload.src_stage, vk::PipelineStageFlags::TRANSFER);
		assert_eq!(upload.dst_stage, vk::PipelineStageFlags::FRAGMENT_SHADER);
	}

	#[test]
	fn unsupported_transition_is_an_error() {
		let result = layout_transition_barrier(vk::Image::null(), vk::Format::R8G8B8A8_SRGB, vk::ImageLayout::PRESENT_SRC_KHR, vk::ImageLayout::GENERAL);
		assert!(matches!(
			result,
			Err(GfxError::UnsupportedLayoutTransition(vk::ImageLayout::PRESENT_SRC_KHR, vk::ImageLayout::GENERAL))
		));
	}
}
