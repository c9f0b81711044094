use std::slice;
use std::sync::Arc;
use ash::vk;
use bevy::math::{Mat4, UVec2};
use gpu_allocator::MemoryLocation;
use quest_xr_utils::dbgfmt;
use quest_xr_utils::debug_string::DebugString;
use crate::context::GpuContext;
use crate::error::GfxError;
use crate::graphics_pipeline::GraphicsPipeline;
use crate::image::{Image, ImageCreateInfo};
use crate::render_pass::RenderPass;

#[derive(Clone, Debug)]
pub struct SwapchainCreateInfo {
	pub resolution: UVec2,
	pub frames_in_flight: usize,
	pub clear_color: [f32; 4],
}

/// Render targets and per-frame synchronization for one runtime owned swapchain.
pub struct SwapchainContext {
	name: DebugString,
	render_pass: Arc<RenderPass>,
	image_views: Vec<vk::ImageView>,
	frame_buffers: Vec<vk::Framebuffer>,
	// Shared by every swapchain image. None without msaa.
	msaa_color_attachment: Option<Image>,
	depth_attachment: Image,
	frames: Vec<Frame>,
	// Fence of the frame that last rendered into each swapchain image.
	images_in_flight: Vec<vk::Fence>,
	current_frame: usize,
	resolution: UVec2,
	clear_color: [f32; 4],
	context: Arc<GpuContext>,
}

struct Frame {
	cmd: vk::CommandBuffer,
	in_flight_fence: vk::Fence,
}

impl SwapchainContext {
	pub fn new(
		name: DebugString,
		context: Arc<GpuContext>,
		render_pass: Arc<RenderPass>,
		images: &[vk::Image],
		create_info: &SwapchainCreateInfo,
	) -> Result<Self, GfxError> {
		assert!(!images.is_empty());
		if create_info.frames_in_flight == 0 {
			return Err(GfxError::NoFramesInFlight);
		}

		let resolution = create_info.resolution;
		let msaa = render_pass.msaa;

		let msaa_color_attachment = match msaa.enabled() {
			true => {
				let image = Image::new(dbgfmt!("{name}_msaa_color"), Arc::clone(&context), &ImageCreateInfo {
					resolution,
					format: render_pass.color_format,
					usage: vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::TRANSIENT_ATTACHMENT,
					msaa,
					memory: MemoryLocation::GpuOnly,
				})?;

				context.transition_image_layout(image.handle(), image.format(), vk::ImageLayout::UNDEFINED, vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)?;
				Some(image)
			},
			false => None,
		};

		let depth_attachment = Image::new(dbgfmt!("{name}_depth"), Arc::clone(&context), &ImageCreateInfo {
			resolution,
			format: render_pass.depth_format,
			usage: vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT,
			msaa,
			memory: MemoryLocation::GpuOnly,
		})?;

		context.transition_image_layout(depth_attachment.handle(), depth_attachment.format(), vk::ImageLayout::UNDEFINED, vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL)?;

		// Everything below is released by Drop if a later step fails.
		let mut this = Self {
			name,
			render_pass,
			image_views: Vec::with_capacity(images.len()),
			frame_buffers: Vec::with_capacity(images.len()),
			msaa_color_attachment,
			depth_attachment,
			frames: Vec::new(),
			images_in_flight: vec![vk::Fence::null(); images.len()],
			current_frame: 0,
			resolution,
			clear_color: create_info.clear_color,
			context,
		};

		for (i, &image) in images.iter().enumerate() {
			let view = this.context.create_image_view(image, this.render_pass.color_format, vk::ImageAspectFlags::COLOR)?;
			this.image_views.push(view);

			let attachments = match &this.msaa_color_attachment {
				Some(msaa_color_attachment) => vec![
					msaa_color_attachment.view(),
					this.depth_attachment.view(),
					view,// Resolve target.
				],
				None => vec![
					view,
					this.depth_attachment.view(),
				],
			};

			let frame_buffer = {
				let create_info = vk::FramebufferCreateInfo::default()
					.render_pass(this.render_pass.handle)
					.attachments(&attachments)
					.width(resolution.x)
					.height(resolution.y)
					.layers(1);

				unsafe { this.context.device.create_framebuffer(&create_info, None) }?
			};
			this.frame_buffers.push(frame_buffer);

			#[cfg(debug_assertions)]
			unsafe {
				this.context.set_debug_name(format!("{}_image[{i}]", this.name).as_str(), image);
				this.context.set_debug_name(format!("{}_image_view[{i}]", this.name).as_str(), view);
				this.context.set_debug_name(format!("{}_frame_buffer[{i}]", this.name).as_str(), frame_buffer);
			}

			#[cfg(not(debug_assertions))]
			let _ = i;
		}

		let frames_in_flight = create_info.frames_in_flight.min(images.len());
		for i in 0..frames_in_flight {
			let cmd = {
				let create_info = vk::CommandBufferAllocateInfo::default()
					.command_pool(this.context.command_pool)
					.level(vk::CommandBufferLevel::PRIMARY)
					.command_buffer_count(1);

				unsafe { this.context.device.allocate_command_buffers(&create_info) }?[0]
			};

			let in_flight_fence = {
				let create_info = vk::FenceCreateInfo::default()
					.flags(vk::FenceCreateFlags::SIGNALED);

				match unsafe { this.context.device.create_fence(&create_info, None) } {
					Ok(fence) => fence,
					Err(e) => {
						unsafe { this.context.device.free_command_buffers(this.context.command_pool, slice::from_ref(&cmd)); }
						return Err(e.into());
					},
				}
			};

			#[cfg(debug_assertions)]
			unsafe {
				this.context.set_debug_name(format!("{}_cmd[{i}]", this.name).as_str(), cmd);
				this.context.set_debug_name(format!("{}_fence[{i}]", this.name).as_str(), in_flight_fence);
			}

			#[cfg(not(debug_assertions))]
			let _ = i;

			this.frames.push(Frame {
				cmd,
				in_flight_fence,
			});
		}

		Ok(this)
	}

	/// Records and submits one draw of `pipeline` per model-view-projection matrix into swapchain image `image_index`.
	pub fn draw(&mut self, image_index: usize, pipeline: &GraphicsPipeline, transforms: &[Mat4]) -> Result<(), GfxError> {
		let frame_buffer = *self.frame_buffers
			.get(image_index)
			.ok_or(GfxError::InvalidSwapchain(image_index))?;

		let device = &self.context.device;
		let Frame { cmd, in_flight_fence } = self.frames[self.current_frame];

		unsafe { device.wait_for_fences(slice::from_ref(&in_flight_fence), true, u64::MAX) }?;

		let image_fence = self.images_in_flight[image_index];
		if image_fence != vk::Fence::null() && image_fence != in_flight_fence {
			unsafe { device.wait_for_fences(slice::from_ref(&image_fence), true, u64::MAX) }?;
		}
		self.images_in_flight[image_index] = in_flight_fence;

		unsafe {
			device.reset_command_buffer(cmd, vk::CommandBufferResetFlags::empty())?;

			let begin_info = vk::CommandBufferBeginInfo::default()
				.flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

			device.begin_command_buffer(cmd, &begin_info)?;
		}

		let clear_values = [
			vk::ClearValue {
				color: vk::ClearColorValue {
					float32: self.clear_color,
				},
			},
			vk::ClearValue {
				depth_stencil: vk::ClearDepthStencilValue {
					depth: 1.0,
					stencil: 0,
				},
			},
			// Resolve target is never cleared.
			vk::ClearValue::default(),
		];
		let attachment_count = if self.msaa_color_attachment.is_some() { 3 } else { 2 };

		let render_area = vk::Rect2D {
			offset: vk::Offset2D { x: 0, y: 0 },
			extent: vk::Extent2D {
				width: self.resolution.x,
				height: self.resolution.y,
			},
		};

		unsafe {
			let begin_info = vk::RenderPassBeginInfo::default()
				.render_pass(self.render_pass.handle)
				.framebuffer(frame_buffer)
				.render_area(render_area)
				.clear_values(&clear_values[..attachment_count]);

			device.cmd_begin_render_pass(cmd, &begin_info, vk::SubpassContents::INLINE);

			pipeline.bind(cmd)?;

			device.cmd_set_viewport(cmd, 0, &[flipped_viewport(self.resolution)]);
			device.cmd_set_scissor(cmd, 0, &[render_area]);

			for transform in transforms {
				let mvp = transform.to_cols_array();
				device.cmd_push_constants(cmd, pipeline.layout(), vk::ShaderStageFlags::VERTEX, 0, bytemuck::cast_slice(&mvp));
				device.cmd_draw_indexed(cmd, pipeline.index_count(), 1, 0, 0, 0);
			}

			device.cmd_end_render_pass(cmd);
			device.end_command_buffer(cmd)?;
		}

		unsafe {
			device.reset_fences(slice::from_ref(&in_flight_fence))?;

			let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
			let submit_info = vk::SubmitInfo::default()
				.wait_dst_stage_mask(&wait_stages)
				.command_buffers(slice::from_ref(&cmd));

			device.queue_submit(self.context.queue, slice::from_ref(&submit_info), in_flight_fence)?;
		}

		self.current_frame = next_frame(self.current_frame, self.frames.len());

		Ok(())
	}
}

impl Drop for SwapchainContext {
	fn drop(&mut self) {
		self.context.wait_idle();

		unsafe {
			for frame in self.frames.drain(..) {
				self.context.device.destroy_fence(frame.in_flight_fence, None);
				self.context.device.free_command_buffers(self.context.command_pool, slice::from_ref(&frame.cmd));
			}

			for frame_buffer in self.frame_buffers.drain(..) {
				self.context.device.destroy_framebuffer(frame_buffer, None);
			}

			for view in self.image_views.drain(..) {
				self.context.device.destroy_image_view(view, None);
			}
		}
	}
}

/// Negative height flips y so +y points up like the projection expects.
pub fn flipped_viewport(resolution: UVec2) -> vk::Viewport {
	vk::Viewport {
		x: 0.0,
		y: resolution.y as f32,
		width: resolution.x as f32,
		height: -(resolution.y as f32),
		min_depth: 0.0,
		max_depth: 1.0,
	}
}

#[inline(always)]
pub fn next_frame(current: usize, frames_in_flight: usize) -> usize {
	(current + 1) % frames_in_flight
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn viewport_is_flipped_vertically() {
		let viewport = flipped_viewport(UVec2::new(1832, 1920));
		assert_eq!(viewport.x, 0.0);
		assert_eq!(viewport.y, 1920.0);
		assert_eq!(viewport.width, 1832.0);
		assert_eq!(viewport.height, -1920.0);
		assert_eq!((viewport.min_depth, viewport.max_depth), (0.0, 1.0));
	}

	#[test]
	fn frames_in_flight_ring() {
		let mut frame = 0;
		let visited = (0..5)
			.map(|_| {
				let current = frame;
				frame = next_frame(frame, 2);
				current
			})
			.collect::<Vec<_>>();

		assert_eq!(visited, [0, 1, 0, 1, 0]);
		assert_eq!(next_frame(0, 1), 0);
	}
}
