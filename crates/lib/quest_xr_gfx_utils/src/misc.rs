use ash::vk;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Reflect, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum MsaaCount {
	#[default]
	Sample1,// No MSAA.
	Sample2,
	Sample4,
	Sample8,
	Sample16,
	Sample32,
	Sample64,
}

impl MsaaCount {
	// Highest to lowest.
	pub const ALL: [MsaaCount; 7] = [
		MsaaCount::Sample64,
		MsaaCount::Sample32,
		MsaaCount::Sample16,
		MsaaCount::Sample8,
		MsaaCount::Sample4,
		MsaaCount::Sample2,
		MsaaCount::Sample1,
	];

	// If Msaa > 1.
	#[inline(always)]
	pub const fn enabled(&self) -> bool {
		!matches!(self, MsaaCount::Sample1)
	}

	#[inline(always)]
	pub const fn as_u32(&self) -> u32 {
		match self {
			MsaaCount::Sample1 => 1,
			MsaaCount::Sample2 => 2,
			MsaaCount::Sample4 => 4,
			MsaaCount::Sample8 => 8,
			MsaaCount::Sample16 => 16,
			MsaaCount::Sample32 => 32,
			MsaaCount::Sample64 => 64,
		}
	}

	#[inline(always)]
	pub const fn as_vk_sample_count(&self) -> vk::SampleCountFlags {
		match self {
			MsaaCount::Sample1 => vk::SampleCountFlags::TYPE_1,
			MsaaCount::Sample2 => vk::SampleCountFlags::TYPE_2,
			MsaaCount::Sample4 => vk::SampleCountFlags::TYPE_4,
			MsaaCount::Sample8 => vk::SampleCountFlags::TYPE_8,
			MsaaCount::Sample16 => vk::SampleCountFlags::TYPE_16,
			MsaaCount::Sample32 => vk::SampleCountFlags::TYPE_32,
			MsaaCount::Sample64 => vk::SampleCountFlags::TYPE_64,
		}
	}

	/// Picks the highest sample count set in `flags`. Falls back to a single sample.
	pub fn max_from_flags(flags: vk::SampleCountFlags) -> Self {
		Self::ALL
			.into_iter()
			.find(|msaa| flags.contains(msaa.as_vk_sample_count()))
			.unwrap_or(MsaaCount::Sample1)
	}
}

impl From<MsaaCount> for u32 {
	#[inline(always)]
	fn from(msaa: MsaaCount) -> Self {
		msaa.as_u32()
	}
}

impl TryFrom<u32> for MsaaCount {
	type Error = String;

	fn try_from(count: u32) -> Result<Self, Self::Error> {
		Self::ALL
			.into_iter()
			.find(|msaa| msaa.as_u32() == count)
			.ok_or_else(|| format!("{count} is not a valid sample count. Expected a power of two in 1..=64"))
	}
}

impl Into<vk::SampleCountFlags> for MsaaCount {
	#[inline(always)]
	fn into(self) -> vk::SampleCountFlags {
		self.as_vk_sample_count()
	}
}

impl From<vk::SampleCountFlags> for MsaaCount {
	#[inline(always)]
	fn from(flags: vk::SampleCountFlags) -> Self {
		Self::max_from_flags(flags)
	}
}

// Scalar type of a vertex attribute or index.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Reflect)]
pub enum DataType {
	Byte,
	UInt16,
	UInt32,
	Float,
}

impl DataType {
	#[inline(always)]
	pub const fn size_in_bytes(&self) -> usize {
		match self {
			DataType::Byte => 1,
			DataType::UInt16 => 2,
			DataType::UInt32 | DataType::Float => 4,
		}
	}

	/// Vertex attribute format for `count` components. None if `count` is outside 1..=4.
	pub const fn vk_format(&self, count: u32) -> Option<vk::Format> {
		use vk::Format;

		Some(match (self, count) {
			(DataType::Byte, 1) => Format::R8_UNORM,
			(DataType::Byte, 2) => Format::R8G8_UNORM,
			(DataType::Byte, 3) => Format::R8G8B8_UNORM,
			(DataType::Byte, 4) => Format::R8G8B8A8_UNORM,
			(DataType::UInt16, 1) => Format::R16_UINT,
			(DataType::UInt16, 2) => Format::R16G16_UINT,
			(DataType::UInt16, 3) => Format::R16G16B16_UINT,
			(DataType::UInt16, 4) => Format::R16G16B16A16_UINT,
			(DataType::UInt32, 1) => Format::R32_UINT,
			(DataType::UInt32, 2) => Format::R32G32_UINT,
			(DataType::UInt32, 3) => Format::R32G32B32_UINT,
			(DataType::UInt32, 4) => Format::R32G32B32A32_UINT,
			(DataType::Float, 1) => Format::R32_SFLOAT,
			(DataType::Float, 2) => Format::R32G32_SFLOAT,
			(DataType::Float, 3) => Format::R32G32B32_SFLOAT,
			(DataType::Float, 4) => Format::R32G32B32A32_SFLOAT,
			_ => return None,
		})
	}

	/// Only 16 and 32 bit unsigned integers can index.
	pub const fn vk_index_type(&self) -> Option<vk::IndexType> {
		match self {
			DataType::UInt16 => Some(vk::IndexType::UINT16),
			DataType::UInt32 => Some(vk::IndexType::UINT32),
			_ => None,
		}
	}
}

#[derive(Default, Clone, Copy, PartialEq, Eq, Hash, Debug, Reflect)]
pub enum DrawMode {
	PointList,
	LineList,
	LineStrip,
	TriangleList,
	#[default]
	TriangleStrip,
	TriangleFan,
}

impl Into<vk::PrimitiveTopology> for DrawMode {
	fn into(self) -> vk::PrimitiveTopology {
		match self {
			DrawMode::PointList => vk::PrimitiveTopology::POINT_LIST,
			DrawMode::LineList => vk::PrimitiveTopology::LINE_LIST,
			DrawMode::LineStrip => vk::PrimitiveTopology::LINE_STRIP,
			DrawMode::TriangleList => vk::PrimitiveTopology::TRIANGLE_LIST,
			DrawMode::TriangleStrip => vk::PrimitiveTopology::TRIANGLE_STRIP,
			DrawMode::TriangleFan => vk::PrimitiveTopology::TRIANGLE_FAN,
		}
	}
}

#[derive(Default, Clone, Copy, PartialEq, Eq, Hash, Debug, Reflect)]
pub enum CullMode {
	#[default]
	None,
	Front,
	Back,
	FrontAndBack,
}

impl Into<vk::CullModeFlags> for CullMode {
	fn into(self) -> vk::CullModeFlags {
		match self {
			CullMode::None => vk::CullModeFlags::NONE,
			CullMode::Front => vk::CullModeFlags::FRONT,
			CullMode::Back => vk::CullModeFlags::BACK,
			CullMode::FrontAndBack => vk::CullModeFlags::FRONT_AND_BACK,
		}
	}
}

#[derive(Default, Clone, Copy, PartialEq, Eq, Hash, Debug, Reflect)]
pub enum FrontFace {
	#[default]
	Cw,
	Ccw,
}

impl Into<vk::FrontFace> for FrontFace {
	fn into(self) -> vk::FrontFace {
		match self {
			FrontFace::Cw => vk::FrontFace::CLOCKWISE,
			FrontFace::Ccw => vk::FrontFace::COUNTER_CLOCKWISE,
		}
	}
}

#[derive(Default, Clone, Copy, PartialEq, Eq, Hash, Debug, Reflect)]
pub enum CompareOp {
	Never,
	#[default]
	Less,
	Equal,
	LessOrEqual,
	Greater,
	NotEqual,
	GreaterOrEqual,
	Always,
}

impl Into<vk::CompareOp> for CompareOp {
	fn into(self) -> vk::CompareOp {
		match self {
			CompareOp::Never => vk::CompareOp::NEVER,
			CompareOp::Less => vk::CompareOp::LESS,
			CompareOp::Equal => vk::CompareOp::EQUAL,
			CompareOp::LessOrEqual => vk::CompareOp::LESS_OR_EQUAL,
			CompareOp::Greater => vk::CompareOp::GREATER,
			CompareOp::NotEqual => vk::CompareOp::NOT_EQUAL,
			CompareOp::GreaterOrEqual => vk::CompareOp::GREATER_OR_EQUAL,
			CompareOp::Always => vk::CompareOp::ALWAYS,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn max_sample_count_picks_highest_bit() {
		let flags = vk::SampleCountFlags::TYPE_1 | vk::SampleCountFlags::TYPE_2 | vk::SampleCountFlags::TYPE_4;
		assert_eq!(MsaaCount::max_from_flags(flags), MsaaCount::Sample4);

		let flags = vk::SampleCountFlags::TYPE_1 | vk::SampleCountFlags::TYPE_64;
		assert_eq!(MsaaCount::max_from_flags(flags), MsaaCount::Sample64);

		assert_eq!(MsaaCount::max_from_flags(vk::SampleCountFlags::empty()), MsaaCount::Sample1);
	}

	#[test]
	fn intersected_limits_select_common_count() {
		let color = vk::SampleCountFlags::TYPE_1 | vk::SampleCountFlags::TYPE_2 | vk::SampleCountFlags::TYPE_4 | vk::SampleCountFlags::TYPE_8;
		let depth = vk::SampleCountFlags::TYPE_1 | vk::SampleCountFlags::TYPE_2 | vk::SampleCountFlags::TYPE_4;
		assert_eq!(MsaaCount::from(color & depth), MsaaCount::Sample4);
	}

	#[test]
	fn sample_count_from_integer() {
		assert_eq!(MsaaCount::try_from(8), Ok(MsaaCount::Sample8));
		assert_eq!(u32::from(MsaaCount::Sample16), 16);
		assert!(MsaaCount::try_from(3).is_err());
		assert!(MsaaCount::try_from(0).is_err());
	}

	#[test]
	fn sample_count_deserializes_from_toml_integer() {
		#[derive(Deserialize)]
		struct Settings {
			max_msaa: MsaaCount,
		}

		let settings: Settings = toml::from_str("max_msaa = 4").unwrap();
		assert_eq!(settings.max_msaa, MsaaCount::Sample4);
		assert!(toml::from_str::<Settings>("max_msaa = 5").is_err());
	}

	#[test]
	fn data_type_sizes() {
		assert_eq!(DataType::Byte.size_in_bytes(), 1);
		assert_eq!(DataType::UInt16.size_in_bytes(), 2);
		assert_eq!(DataType::UInt32.size_in_bytes(), 4);
		assert_eq!(DataType::Float.size_in_bytes(), 4);
	}

	#[test]
	fn data_type_vertex_formats() {
		assert_eq!(DataType::Float.vk_format(3), Some(vk::Format::R32G32B32_SFLOAT));
		assert_eq!(DataType::Byte.vk_format(4), Some(vk::Format::R8G8B8A8_UNORM));
		assert_eq!(DataType::UInt16.vk_format(1), Some(vk::Format::R16_UINT));
		assert_eq!(DataType::Float.vk_format(0), None);
		assert_eq!(DataType::UInt32.vk_format(5), None);
	}

	#[test]
	fn only_unsigned_integers_index() {
		assert_eq!(DataType::UInt16.vk_index_type(), Some(vk::IndexType::UINT16));
		assert_eq!(DataType::UInt32.vk_index_type(), Some(vk::IndexType::UINT32));
		assert_eq!(DataType::Float.vk_index_type(), None);
		assert_eq!(DataType::Byte.vk_index_type(), None);
	}

	#[test]
	fn pipeline_enums_map_to_vulkan() {
		assert_eq!(<DrawMode as Into<vk::PrimitiveTopology>>::into(DrawMode::TriangleList), vk::PrimitiveTopology::TRIANGLE_LIST);
		assert_eq!(<CullMode as Into<vk::CullModeFlags>>::into(CullMode::Back), vk::CullModeFlags::BACK);
		assert_eq!(<FrontFace as Into<vk::FrontFace>>::into(FrontFace::Ccw), vk::FrontFace::COUNTER_CLOCKWISE);
		assert_eq!(<CompareOp as Into<vk::CompareOp>>::into(CompareOp::Less), vk::CompareOp::LESS);
	}
}
