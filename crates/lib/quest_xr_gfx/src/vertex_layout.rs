use ash::vk;
use quest_xr_gfx_utils::DataType;
use smallvec::SmallVec;
use crate::error::GfxError;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct VertexElement {
	pub location: u32,
	pub data_type: DataType,
	pub count: u32,
}

impl VertexElement {
	#[inline(always)]
	pub const fn size_in_bytes(&self) -> u32 {
		self.data_type.size_in_bytes() as u32 * self.count
	}
}

/// Interleaved attributes of a single vertex buffer bound at binding 0.
#[derive(Clone, Default, Debug)]
pub struct VertexBufferLayout {
	elements: SmallVec<[VertexElement; 4]>,
	stride: u32,
}

impl VertexBufferLayout {
	pub const BINDING: u32 = 0;

	pub fn push(&mut self, element: VertexElement) -> &mut Self {
		self.stride += element.size_in_bytes();
		self.elements.push(element);
		self
	}

	#[inline(always)]
	pub fn stride(&self) -> u32 {
		self.stride
	}

	pub fn attribute_descriptions(&self) -> Result<Vec<vk::VertexInputAttributeDescription>, GfxError> {
		let mut offset = 0;
		self.elements
			.iter()
			.map(|element| {
				let format = element.data_type
					.vk_format(element.count)
					.ok_or(GfxError::UnsupportedVertexFormat(element.data_type, element.count))?;

				let description = vk::VertexInputAttributeDescription::default()
					.binding(Self::BINDING)
					.location(element.location)
					.format(format)
					.offset(offset);

				offset += element.size_in_bytes();
				Ok(description)
			})
			.collect()
	}

	pub fn binding_description(&self) -> vk::VertexInputBindingDescription {
		vk::VertexInputBindingDescription::default()
			.binding(Self::BINDING)
			.stride(self.stride)
			.input_rate(vk::VertexInputRate::VERTEX)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn offsets_follow_push_order() {
		let mut layout = VertexBufferLayout::default();
		layout
			.push(VertexElement { location: 0, data_type: DataType::Float, count: 3 })
			.push(VertexElement { location: 1, data_type: DataType::Byte, count: 4 })
			.push(VertexElement { location: 2, data_type: DataType::Float, count: 2 });

		assert_eq!(layout.stride(), 12 + 4 + 8);

		let attributes = layout.attribute_descriptions().unwrap();
		assert_eq!(attributes.iter().map(|x| x.offset).collect::<Vec<_>>(), [0, 12, 16]);
		assert_eq!(attributes[1].format, vk::Format::R8G8B8A8_UNORM);
		assert!(attributes.iter().all(|x| x.binding == VertexBufferLayout::BINDING));

		let binding = layout.binding_description();
		assert_eq!(binding.stride, 24);
		assert_eq!(binding.input_rate, vk::VertexInputRate::VERTEX);
	}

	#[test]
	fn too_many_components_is_an_error() {
		let mut layout = VertexBufferLayout::default();
		layout.push(VertexElement { location: 0, data_type: DataType::Float, count: 5 });

		assert!(matches!(
			layout.attribute_descriptions(),
			Err(GfxError::UnsupportedVertexFormat(DataType::Float, 5))
		));
	}
}
