use ash::vk;
use bevy::reflect::Reflect;

#[derive(Default, Clone, Copy, Eq, PartialEq, Hash, Debug, Reflect)]
pub enum ShaderStage {
	#[default]
	Vertex,
	Fragment,
}

impl ShaderStage {
	pub fn from_vk(stage: vk::ShaderStageFlags) -> Option<Self> {
		match stage {
			vk::ShaderStageFlags::VERTEX => Some(ShaderStage::Vertex),
			vk::ShaderStageFlags::FRAGMENT => Some(ShaderStage::Fragment),
			_ => None,
		}
	}
}

impl Into<vk::ShaderStageFlags> for ShaderStage {
	fn into(self) -> vk::ShaderStageFlags {
		match self {
			ShaderStage::Vertex => vk::ShaderStageFlags::VERTEX,
			ShaderStage::Fragment => vk::ShaderStageFlags::FRAGMENT,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn stage_flags_round_trip() {
		for stage in [ShaderStage::Vertex, ShaderStage::Fragment] {
			let flags: vk::ShaderStageFlags = stage.into();
			assert_eq!(ShaderStage::from_vk(flags), Some(stage));
		}
	}

	#[test]
	fn unsupported_stages_are_rejected() {
		assert_eq!(ShaderStage::from_vk(vk::ShaderStageFlags::COMPUTE), None);
		assert_eq!(ShaderStage::from_vk(vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT), None);
	}
}
