use std::path::Path;

/// Platform agnostic file reading. On Android this will attempt to read from the external data file
/// path first and if that fails then it will attempt to read that file path from the asset manager.
#[cfg(not(target_os = "android"))]
#[inline]
pub fn read(path: impl AsRef<Path>) -> std::io::Result<Vec<u8>> {
	std::fs::read(path)
}

#[cfg(target_os = "android")]
pub fn read(path: impl AsRef<Path>) -> std::io::Result<Vec<u8>> {
	use std::ffi::CString;
	use std::io::{Error, ErrorKind};

	let android_app = bevy::window::ANDROID_APP
		.get()
		.ok_or_else(|| Error::new(ErrorKind::NotFound, "android app is not initialized. Must be called after #[bevy_main]"))?;

	// First attempt to read from the data file path. Then try reading from the asset manager.
	let file_err = match android_app.external_data_path() {
		Some(data_path) => match std::fs::read(data_path.join(path.as_ref())) {
			Ok(data) => return Ok(data),
			Err(e) => e,
		},
		None => Error::new(ErrorKind::NotFound, "no external data path"),
	};

	let asset_path = path
		.as_ref()
		.to_str()
		.and_then(|path| CString::new(path).ok())
		.ok_or_else(|| Error::new(ErrorKind::InvalidInput, format!("invalid asset path {:?}", path.as_ref())))?;

	let mut opened_asset = android_app
		.asset_manager()
		.open(&asset_path)
		.ok_or_else(|| Error::new(ErrorKind::NotFound, format!("File not found in external data path or asset manager!: {file_err:?}")))?;

	Ok(opened_asset.buffer()?.to_vec())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	#[cfg(not(target_os = "android"))]
	fn read_missing_file_is_not_found() {
		let err = read("this/file/does/not/exist.toml").unwrap_err();
		assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
	}

	#[test]
	#[cfg(not(target_os = "android"))]
	fn read_round_trips_file_contents() {
		let path = std::env::temp_dir().join("quest_xr_utils_io_read.txt");
		std::fs::write(&path, b"[render]\nframes_in_flight = 2\n").unwrap();

		assert_eq!(read(&path).unwrap(), b"[render]\nframes_in_flight = 2\n");
		std::fs::remove_file(&path).unwrap();
	}
}
