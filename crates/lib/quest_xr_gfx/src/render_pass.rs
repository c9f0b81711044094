use std::slice;
use std::sync::Arc;
use ash::vk;
use quest_xr_gfx_utils::MsaaCount;
use quest_xr_utils::debug_string::DebugString;
use smallvec::SmallVec;
use crate::context::GpuContext;
use crate::error::GfxError;

pub struct RenderPass {
	pub name: DebugString,
	pub handle: vk::RenderPass,
	pub color_format: vk::Format,
	pub depth_format: vk::Format,
	pub msaa: MsaaCount,
	pub context: Arc<GpuContext>,
}

impl RenderPass {
	pub const COLOR_ATTACHMENT: u32 = 0;
	pub const DEPTH_ATTACHMENT: u32 = 1;
	// Only present with msaa. The swapchain image is the resolve target.
	pub const RESOLVE_ATTACHMENT: u32 = 2;

	pub fn new(
		name: DebugString,
		context: Arc<GpuContext>,
		color_format: vk::Format,
		depth_format: vk::Format,
		msaa: MsaaCount,
	) -> Result<Self, GfxError> {
		let attachments = attachment_descriptions(color_format, depth_format, msaa);

		let color_ref = vk::AttachmentReference::default()
			.attachment(Self::COLOR_ATTACHMENT)
			.layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL);

		let depth_ref = vk::AttachmentReference::default()
			.attachment(Self::DEPTH_ATTACHMENT)
			.layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL);

		let resolve_ref = vk::AttachmentReference::default()
			.attachment(Self::RESOLVE_ATTACHMENT)
			.layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL);

		let mut subpass = vk::SubpassDescription::default()
			.pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
			.color_attachments(slice::from_ref(&color_ref))
			.depth_stencil_attachment(&depth_ref);

		if msaa.enabled() {
			subpass = subpass.resolve_attachments(slice::from_ref(&resolve_ref));
		}

		let dependency = external_dependency();

		let handle = {
			let create_info = vk::RenderPassCreateInfo::default()
				.attachments(&attachments)
				.subpasses(slice::from_ref(&subpass))
				.dependencies(slice::from_ref(&dependency));

			unsafe { context.device.create_render_pass(&create_info, None) }?
		};

		#[cfg(debug_assertions)]
		unsafe {
			context.set_debug_name(name.as_str(), handle);
		}

		Ok(Self {
			name,
			handle,
			color_format,
			depth_format,
			msaa,
			context,
		})
	}
}

impl Drop for RenderPass {
	fn drop(&mut self) {
		unsafe {
			self.context.device.destroy_render_pass(self.handle, None);
		}
	}
}

// Swapchain images are handed back to the runtime in COLOR_ATTACHMENT_OPTIMAL.
pub(crate) fn attachment_descriptions(
	color_format: vk::Format,
	depth_format: vk::Format,
	msaa: MsaaCount,
) -> SmallVec<[vk::AttachmentDescription; 3]> {
	let color = vk::AttachmentDescription::default()
		.format(color_format)
		.samples(msaa.as_vk_sample_count())
		.load_op(vk::AttachmentLoadOp::CLEAR)
		.store_op(match msaa.enabled() {
			true => vk::AttachmentStoreOp::DONT_CARE,
			false => vk::AttachmentStoreOp::STORE,
		})
		.stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
		.stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
		.initial_layout(vk::ImageLayout::UNDEFINED)
		.final_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL);

	// Transitioned once at creation so it starts in its attachment layout.
	let depth = vk::AttachmentDescription::default()
		.format(depth_format)
		.samples(msaa.as_vk_sample_count())
		.load_op(vk::AttachmentLoadOp::CLEAR)
		.store_op(vk::AttachmentStoreOp::DONT_CARE)
		.stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
		.stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
		.initial_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL)
		.final_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL);

	let mut attachments = SmallVec::from_iter([color, depth]);

	if msaa.enabled() {
		attachments.push(vk::AttachmentDescription::default()
			.format(color_format)
			.samples(vk::SampleCountFlags::TYPE_1)
			.load_op(vk::AttachmentLoadOp::DONT_CARE)
			.store_op(vk::AttachmentStoreOp::STORE)
			.stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
			.stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
			.initial_layout(vk::ImageLayout::UNDEFINED)
			.final_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
		);
	}

	attachments
}

// The color and depth attachments are shared between frames in flight. The previous submission's attachment writes
// must finish before this one clears them.
pub(crate) fn external_dependency() -> vk::SubpassDependency {
	let stages = vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
		| vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS
		| vk::PipelineStageFlags::LATE_FRAGMENT_TESTS;

	vk::SubpassDependency::default()
		.src_subpass(vk::SUBPASS_EXTERNAL)
		.dst_subpass(0)
		.src_stage_mask(stages)
		.dst_stage_mask(stages)
		.src_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE)
		.dst_access_mask(
			vk::AccessFlags::COLOR_ATTACHMENT_READ
				| vk::AccessFlags::COLOR_ATTACHMENT_WRITE
				| vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE
		)
		.dependency_flags(vk::DependencyFlags::BY_REGION)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn msaa_resolves_into_third_attachment() {
		let attachments = attachment_descriptions(vk::Format::R8G8B8A8_SRGB, vk::Format::D32_SFLOAT, MsaaCount::Sample4);
		assert_eq!(attachments.len(), 3);

		let [color, depth, resolve] = [attachments[0], attachments[1], attachments[2]];
		assert_eq!(color.samples, vk::SampleCountFlags::TYPE_4);
		assert_eq!(color.load_op, vk::AttachmentLoadOp::CLEAR);
		assert_eq!(depth.format, vk::Format::D32_SFLOAT);
		assert_eq!(depth.samples, vk::SampleCountFlags::TYPE_4);
		assert_eq!(depth.store_op, vk::AttachmentStoreOp::DONT_CARE);
		assert_eq!(resolve.samples, vk::SampleCountFlags::TYPE_1);
		assert_eq!(resolve.store_op, vk::AttachmentStoreOp::STORE);
		assert_eq!(resolve.final_layout, vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL);
	}

	#[test]
	fn single_sample_renders_straight_to_color() {
		let attachments = attachment_descriptions(vk::Format::R8G8B8A8_UNORM, vk::Format::D24_UNORM_S8_UINT, MsaaCount::Sample1);
		assert_eq!(attachments.len(), 2);
		assert_eq!(attachments[0].store_op, vk::AttachmentStoreOp::STORE);
		assert_eq!(attachments[0].samples, vk::SampleCountFlags::TYPE_1);
	}

	#[test]
	fn depth_clear_waits_for_previous_depth_writes() {
		let dependency = external_dependency();
		assert_eq!(dependency.src_subpass, vk::SUBPASS_EXTERNAL);
		assert_eq!(dependency.dst_subpass, 0);

		for stages in [dependency.src_stage_mask, dependency.dst_stage_mask] {
			assert!(stages.contains(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT));
			assert!(stages.contains(vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS));
			assert!(stages.contains(vk::PipelineStageFlags::LATE_FRAGMENT_TESTS));
		}

		assert!(dependency.src_access_mask.contains(vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE));
		assert!(dependency.dst_access_mask.contains(vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE));
		assert!(dependency.dst_access_mask.contains(vk::AccessFlags::COLOR_ATTACHMENT_WRITE));
	}
}
