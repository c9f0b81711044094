use std::ffi::{c_void, CStr};
use std::ops::Deref;
use bevy::log::{debug, error, info, warn};
use openxr as xr;
use super::{log, XrError};

pub struct XrInstance {
	pub handle: xr::Instance,
	pub entry: xr::Entry,
	exts: Extensions,
}

impl XrInstance {
	#[cfg(debug_assertions)]
	const LAYERS: [&'static str; 1] = ["XR_APILAYER_LUNARG_core_validation"];

	#[cfg(not(debug_assertions))]
	const LAYERS: [&'static str; 0] = [];

	pub fn new(application_name: &str) -> Result<Self, XrError> {
		#[cfg(target_os = "windows")]
		let entry = xr::Entry::linked();

		#[cfg(not(target_os = "windows"))]
		let entry = unsafe { xr::Entry::load() }?;

		#[cfg(target_os = "android")]
		entry.initialize_android_loader()?;

		let available_exts = entry.enumerate_extensions()?;
		let available_layers = entry.enumerate_layers()?;

		log::layers_and_extensions(&available_layers, &available_exts);

		let mut exts = xr::ExtensionSet::default();
		exts.khr_vulkan_enable2 = true;
		#[cfg(target_os = "android")]
		{
			exts.khr_android_create_instance = true;
		}
		exts.ext_debug_utils = cfg!(debug_assertions) && available_exts.ext_debug_utils;

		let layers = Self::LAYERS
			.iter()
			.copied()
			.filter(|&layer| {
				let available = available_layers.iter().any(|x| x.layer_name == layer);
				if !available {
					warn!("OpenXR layer {layer} is unavailable! Removing from list of layers");
				}

				available
			})
			.collect::<Vec<_>>();

		let app_info = xr::ApplicationInfo {
			application_name,
			application_version: 0,
			engine_name: "quest_xr",
			engine_version: 0,
			api_version: xr::Version::new(1, 0, 0),
		};

		let instance = entry.create_instance(&app_info, &exts, &layers)?;

		let exts = Extensions {
			#[cfg(debug_assertions)]
			debug_utils: match exts.ext_debug_utils {
				true => match DebugUtils::new(&entry, &instance) {
					Ok(debug_utils) => Some(debug_utils),
					Err(e) => {
						warn!("Failed to create OpenXR debug messenger: {e}");
						None
					},
				},
				false => None,
			},
		};

		let this = Self {
			handle: instance,
			entry,
			exts,
		};

		log::instance_properties(&this.handle)?;

		#[cfg(debug_assertions)]
		unsafe { this.set_debug_name("instance", this.handle.as_raw().into_raw(), xr::sys::ObjectType::INSTANCE); }

		Ok(this)
	}

	/// Head mounted display. Fails if no headset is connected.
	pub fn system(&self) -> Result<xr::SystemId, XrError> {
		let system = self.handle.system(xr::FormFactor::HEAD_MOUNTED_DISPLAY)?;
		log::view_configurations(&self.handle, system)?;
		Ok(system)
	}

	#[allow(unused_variables)]
	pub unsafe fn set_debug_name(&self, name: &str, handle: u64, object_type: xr::sys::ObjectType) {
		#[cfg(debug_assertions)]
		{
			let Some(debug_utils) = &self.exts.debug_utils else {
				return;
			};

			let Ok(object_name) = std::ffi::CString::new(name) else {
				return;
			};

			let name_info = xr::sys::DebugUtilsObjectNameInfoEXT {
				ty: xr::sys::DebugUtilsObjectNameInfoEXT::TYPE,
				next: std::ptr::null(),
				object_type,
				object_handle: handle,
				object_name: object_name.as_ptr(),
			};

			let result = unsafe { (debug_utils.fns.set_debug_utils_object_name)(self.handle.as_raw(), &name_info) };
			if result != xr::sys::Result::SUCCESS {
				error!("Failed to name OpenXR object <{object_type:?}> {name}: {result}");
			}
		}
	}
}

impl Deref for XrInstance {
	type Target = xr::Instance;

	fn deref(&self) -> &Self::Target {
		&self.handle
	}
}

impl Drop for XrInstance {
	fn drop(&mut self) {
		#[cfg(debug_assertions)]
		if let Some(debug_utils) = self.exts.debug_utils.take() {
			let result = unsafe { (debug_utils.fns.destroy_debug_utils_messenger)(debug_utils.messenger) };
			if result != xr::sys::Result::SUCCESS {
				error!("Failed to destroy OpenXR debug messenger: {result}");
			}
		}
	}
}

struct Extensions {
	#[cfg(debug_assertions)]
	debug_utils: Option<DebugUtils>,
}

#[cfg(debug_assertions)]
struct DebugUtils {
	fns: xr::raw::DebugUtilsEXT,
	messenger: xr::sys::DebugUtilsMessengerEXT,
}

#[cfg(debug_assertions)]
impl DebugUtils {
	fn new(entry: &xr::Entry, instance: &xr::Instance) -> Result<Self, xr::sys::Result> {
		let fns = unsafe { xr::raw::DebugUtilsEXT::load(entry, instance.as_raw()) }?;

		let create_info = xr::sys::DebugUtilsMessengerCreateInfoEXT {
			ty: xr::sys::DebugUtilsMessengerCreateInfoEXT::TYPE,
			next: std::ptr::null(),
			message_severities:
				xr::sys::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
					| xr::sys::DebugUtilsMessageSeverityFlagsEXT::INFO
					| xr::sys::DebugUtilsMessageSeverityFlagsEXT::WARNING
					| xr::sys::DebugUtilsMessageSeverityFlagsEXT::ERROR,
			message_types:
				xr::sys::DebugUtilsMessageTypeFlagsEXT::GENERAL
					| xr::sys::DebugUtilsMessageTypeFlagsEXT::VALIDATION
					| xr::sys::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE
					| xr::sys::DebugUtilsMessageTypeFlagsEXT::CONFORMANCE,
			user_callback: Some(dbg_messenger_callback),
			user_data: std::ptr::null_mut(),
		};

		let mut messenger = xr::sys::DebugUtilsMessengerEXT::default();
		let result = unsafe { (fns.create_debug_utils_messenger)(instance.as_raw(), &create_info, &mut messenger) };
		match result {
			xr::sys::Result::SUCCESS => Ok(Self { fns, messenger }),
			e => Err(e),
		}
	}
}

#[derive(Debug)]
enum MsgType {
	General,
	Validation,
	Performance,
	Conformance,
	Unknown,
}

impl From<xr::sys::DebugUtilsMessageTypeFlagsEXT> for MsgType {
	fn from(flags: xr::sys::DebugUtilsMessageTypeFlagsEXT) -> Self {
		match flags {
			xr::sys::DebugUtilsMessageTypeFlagsEXT::GENERAL => Self::General,
			xr::sys::DebugUtilsMessageTypeFlagsEXT::VALIDATION => Self::Validation,
			xr::sys::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE => Self::Performance,
			xr::sys::DebugUtilsMessageTypeFlagsEXT::CONFORMANCE => Self::Conformance,
			_ => Self::Unknown,
		}
	}
}

unsafe extern "system" fn dbg_messenger_callback(
	severity: xr::sys::DebugUtilsMessageSeverityFlagsEXT,
	msg_type: xr::sys::DebugUtilsMessageTypeFlagsEXT,
	data: *const xr::sys::DebugUtilsMessengerCallbackDataEXT,
	_user_data: *mut c_void,
) -> xr::sys::Bool32 {
	if data.is_null() {
		return xr::sys::FALSE;
	}

	let data = unsafe { &*data };
	let fn_name = match data.function_name.is_null() {
		true => "".into(),
		false => unsafe { CStr::from_ptr(data.function_name) }.to_string_lossy(),
	};
	let msg = match data.message.is_null() {
		true => "".into(),
		false => unsafe { CStr::from_ptr(data.message) }.to_string_lossy(),
	};

	let msg_type = MsgType::from(msg_type);

	match severity {
		xr::sys::DebugUtilsMessageSeverityFlagsEXT::VERBOSE => debug!("XR[{msg_type:?}][Verbose][{fn_name}]: {msg}"),
		xr::sys::DebugUtilsMessageSeverityFlagsEXT::INFO => info!("XR[{msg_type:?}][Info][{fn_name}]: {msg}"),
		xr::sys::DebugUtilsMessageSeverityFlagsEXT::WARNING => warn!("XR[{msg_type:?}][Warning][{fn_name}]: {msg}"),
		_ => error!("XR[{msg_type:?}][Error][{fn_name}]: {msg}"),
	}

	xr::sys::FALSE
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn message_types_map_one_to_one() {
		assert!(matches!(MsgType::from(xr::sys::DebugUtilsMessageTypeFlagsEXT::GENERAL), MsgType::General));
		assert!(matches!(MsgType::from(xr::sys::DebugUtilsMessageTypeFlagsEXT::VALIDATION), MsgType::Validation));
		assert!(matches!(MsgType::from(xr::sys::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE), MsgType::Performance));
		assert!(matches!(MsgType::from(xr::sys::DebugUtilsMessageTypeFlagsEXT::CONFORMANCE), MsgType::Conformance));

		let combined = xr::sys::DebugUtilsMessageTypeFlagsEXT::GENERAL | xr::sys::DebugUtilsMessageTypeFlagsEXT::VALIDATION;
		assert!(matches!(MsgType::from(combined), MsgType::Unknown));
	}
}
