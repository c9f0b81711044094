pub mod input;
pub mod instance;
pub mod log;
pub mod reference_space;
pub mod session;

pub use input::XrInput;
pub use instance::XrInstance;
pub use reference_space::ReferenceSpace;
pub use session::{SessionAction, SessionLifecycle, XrProgram};

use openxr as xr;
use thiserror::Error;
use crate::error::GfxError;

/// Only stereo rendering is supported.
pub const VIEW_TYPE: xr::ViewConfigurationType = xr::ViewConfigurationType::PRIMARY_STEREO;

#[derive(Debug, Error)]
pub enum XrError {
	#[error("OpenXR call failed: {0}")]
	Xr(#[from] xr::sys::Result),
	#[error(transparent)]
	Gfx(#[from] GfxError),
	#[error("Failed to load the OpenXR loader: {0}")]
	Loading(#[from] xr::LoadError),
	#[error("Runtime does not support the {0:?} view configuration!")]
	UnsupportedViewConfiguration(xr::ViewConfigurationType),
	#[error("Unknown reference space \"{0}\"!")]
	UnknownReferenceSpace(String),
}
