pub mod misc;
pub mod spirv;

pub use misc::*;
pub use spirv::ShaderStage;
