pub extern crate quest_xr_gfx_utils;

pub use quest_xr_gfx_utils as gfx_utils;

pub mod context;
pub mod error;
pub mod buffer;
pub mod image;
pub mod shader;
pub mod render_pass;
pub mod vertex_layout;
pub mod graphics_pipeline;
pub mod swapchain;
pub mod mesh;
pub mod math;
pub mod renderer;
pub mod render_settings;
pub mod xr;
pub mod plugin;

pub use context::*;
pub use error::GfxError;
pub use plugin::{RenderPlugin, XrState};
pub use render_settings::*;
