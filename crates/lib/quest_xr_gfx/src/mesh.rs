use bytemuck::{Pod, Zeroable};
use quest_xr_gfx_utils::DataType;
use crate::vertex_layout::{VertexBufferLayout, VertexElement};

#[repr(C)]
#[derive(Clone, Copy, PartialEq, Debug, Pod, Zeroable)]
pub struct Vertex {
	pub position: [f32; 3],
	pub color: [f32; 3],
}

impl Vertex {
	#[inline(always)]
	const fn new(position: [f32; 3], color: [f32; 3]) -> Self {
		Self { position, color }
	}

	pub fn layout() -> VertexBufferLayout {
		let mut layout = VertexBufferLayout::default();
		layout
			.push(VertexElement { location: 0, data_type: DataType::Float, count: 3 })
			.push(VertexElement { location: 1, data_type: DataType::Float, count: 3 });
		layout
	}
}

// Unit cube centered on the origin.
pub const CUBE_VERTICES: [Vertex; 8] = [
	Vertex::new([-0.5, -0.5, 0.5], [1.0, 0.0, 0.0]),
	Vertex::new([0.5, -0.5, 0.5], [0.0, 1.0, 0.0]),
	Vertex::new([0.5, 0.5, 0.5], [0.0, 0.0, 1.0]),
	Vertex::new([-0.5, 0.5, 0.5], [1.0, 1.0, 1.0]),
	Vertex::new([-0.5, -0.5, -0.5], [1.0, 0.0, 0.0]),
	Vertex::new([0.5, -0.5, -0.5], [0.0, 1.0, 0.0]),
	Vertex::new([0.5, 0.5, -0.5], [0.0, 0.0, 1.0]),
	Vertex::new([-0.5, 0.5, -0.5], [1.0, 1.0, 1.0]),
];

pub const CUBE_INDICES: [u16; 36] = [
	0, 1, 2, 2, 3, 0,
	1, 5, 6, 6, 2, 1,
	7, 6, 5, 5, 4, 7,
	4, 0, 3, 3, 7, 4,
	4, 5, 1, 1, 0, 4,
	3, 2, 6, 6, 7, 3,
];

pub const CUBE_INDEX_TYPE: DataType = DataType::UInt16;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn layout_matches_vertex_struct() {
		let layout = Vertex::layout();
		assert_eq!(layout.stride() as usize, size_of::<Vertex>());

		let attributes = layout.attribute_descriptions().unwrap();
		assert_eq!(attributes[0].offset as usize, std::mem::offset_of!(Vertex, position));
		assert_eq!(attributes[1].offset as usize, std::mem::offset_of!(Vertex, color));
	}

	#[test]
	fn indices_stay_in_range() {
		assert!(CUBE_INDICES.iter().all(|&i| (i as usize) < CUBE_VERTICES.len()));
		assert_eq!(CUBE_INDEX_TYPE.size_in_bytes(), size_of::<u16>());

		// Every vertex is used by some triangle.
		for i in 0..CUBE_VERTICES.len() as u16 {
			assert!(CUBE_INDICES.contains(&i));
		}
	}
}
