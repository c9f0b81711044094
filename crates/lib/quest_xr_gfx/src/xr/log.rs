//! Startup and runtime diagnostics about the OpenXR runtime.

use std::ffi::{c_char, CStr};
use std::ptr;
use bevy::log::{debug, info};
use openxr as xr;
use super::XrError;

pub fn layers_and_extensions(layers: &[xr::ApiLayerProperties], extensions: &xr::ExtensionSet) {
	info!("Available Layers: ({})", layers.len());
	for layer in layers {
		debug!(
			"  Name={} SpecVersion={} LayerVersion={} Description={}",
			layer.layer_name,
			layer.spec_version,
			layer.layer_version,
			layer.description,
		);
	}

	debug!("Available Extensions: {extensions:#?}");
}

pub fn instance_properties(instance: &xr::Instance) -> Result<(), XrError> {
	let props = instance.properties()?;
	info!("Instance RuntimeName={} RuntimeVersion={}", props.runtime_name, props.runtime_version);
	Ok(())
}

pub fn view_configurations(instance: &xr::Instance, system: xr::SystemId) -> Result<(), XrError> {
	let view_config_types = instance.enumerate_view_configurations(system)?;
	info!("Available View Configuration Types: ({})", view_config_types.len());

	for view_config_type in view_config_types {
		let props = instance.view_configuration_properties(system, view_config_type)?;
		debug!(
			"  View Configuration Type: {view_config_type:?}{} FovMutable={}",
			if view_config_type == super::VIEW_TYPE { " (Selected)" } else { "" },
			props.fov_mutable,
		);

		let views = instance.enumerate_view_configuration_views(system, view_config_type)?;
		debug!("  View Configuration Views: ({})", views.len());
		for (i, view) in views.iter().enumerate() {
			debug!(
				"    View [{i}]: Recommended Width={} Height={} SampleCount={}",
				view.recommended_image_rect_width,
				view.recommended_image_rect_height,
				view.recommended_swapchain_sample_count,
			);
			debug!(
				"    View [{i}]:     Maximum Width={} Height={} SampleCount={}",
				view.max_image_rect_width,
				view.max_image_rect_height,
				view.max_swapchain_sample_count,
			);
		}

		let blend_modes = instance.enumerate_environment_blend_modes(system, view_config_type)?;
		debug!("  Available Environment Blend Mode count: ({})", blend_modes.len());
		for blend_mode in blend_modes {
			debug!("    Environment Blend Mode: {blend_mode:?}");
		}
	}

	Ok(())
}

pub fn system_properties(instance: &xr::Instance, system: xr::SystemId) -> Result<(), XrError> {
	let props = instance.system_properties(system)?;
	info!("System Properties: Name={} VendorId={}", props.system_name, props.vendor_id);
	info!(
		"System Graphics Properties: MaxWidth={} MaxHeight={} MaxLayers={}",
		props.graphics_properties.max_swapchain_image_width,
		props.graphics_properties.max_swapchain_image_height,
		props.graphics_properties.max_layer_count,
	);
	info!(
		"System Tracking Properties: OrientationTracking={} PositionTracking={}",
		props.tracking_properties.orientation_tracking,
		props.tracking_properties.position_tracking,
	);
	Ok(())
}

pub fn reference_spaces(session: &xr::Session<xr::Vulkan>) -> Result<(), XrError> {
	let spaces = session.enumerate_reference_spaces()?;
	info!("Available reference spaces: {}", spaces.len());
	for space in spaces {
		debug!("  Name: {space:?}");
	}
	Ok(())
}

/// Logs the localized names of every input source `action` is currently bound to.
pub fn action_sources(instance: &xr::Instance, session: &xr::Session<xr::Vulkan>, name: &str, action: xr::sys::Action) -> Result<(), XrError> {
	let sources = unsafe { bound_source_names(instance, session.as_raw(), action) }?;

	match sources.is_empty() {
		true => info!("{name} action is bound to nothing"),
		false => info!("{name} action is bound to {}", sources.join(" ")),
	}

	Ok(())
}

fn check(result: xr::sys::Result) -> Result<(), xr::sys::Result> {
	match result.into_raw() < 0 {
		true => Err(result),
		false => Ok(()),
	}
}

unsafe fn bound_source_names(instance: &xr::Instance, session: xr::sys::Session, action: xr::sys::Action) -> Result<Vec<String>, xr::sys::Result> {
	let fp = instance.fp();

	let enumerate_info = xr::sys::BoundSourcesForActionEnumerateInfo {
		ty: xr::sys::BoundSourcesForActionEnumerateInfo::TYPE,
		next: ptr::null(),
		action,
	};

	let mut count = 0;
	check(unsafe { (fp.enumerate_bound_sources_for_action)(session, &enumerate_info, 0, &mut count, ptr::null_mut()) })?;

	let mut paths = vec![xr::Path::NULL; count as usize];
	check(unsafe { (fp.enumerate_bound_sources_for_action)(session, &enumerate_info, count, &mut count, paths.as_mut_ptr()) })?;
	paths.truncate(count as usize);

	let mut names = Vec::with_capacity(paths.len());
	for path in paths {
		let get_info = xr::sys::InputSourceLocalizedNameGetInfo {
			ty: xr::sys::InputSourceLocalizedNameGetInfo::TYPE,
			next: ptr::null(),
			source_path: path,
			which_components: xr::sys::InputSourceLocalizedNameFlags::USER_PATH
				| xr::sys::InputSourceLocalizedNameFlags::INTERACTION_PROFILE
				| xr::sys::InputSourceLocalizedNameFlags::COMPONENT,
		};

		let mut len = 0;
		check(unsafe { (fp.get_input_source_localized_name)(session, &get_info, 0, &mut len, ptr::null_mut()) })?;
		if len == 0 {
			continue;
		}

		let mut buffer = vec![0 as c_char; len as usize];
		check(unsafe { (fp.get_input_source_localized_name)(session, &get_info, len, &mut len, buffer.as_mut_ptr()) })?;

		let name = unsafe { CStr::from_ptr(buffer.as_ptr()) };
		names.push(format!("'{}'", name.to_string_lossy()));
	}

	Ok(names)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn only_negative_results_are_errors() {
		assert!(check(xr::sys::Result::SUCCESS).is_ok());
		assert!(check(xr::sys::Result::SESSION_LOSS_PENDING).is_ok());
		assert_eq!(check(xr::sys::Result::ERROR_HANDLE_INVALID), Err(xr::sys::Result::ERROR_HANDLE_INVALID));
	}
}
