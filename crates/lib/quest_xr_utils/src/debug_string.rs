use std::borrow::Cow;
use std::ops::Deref;

// A name for GPU / XR objects. Only carries a value in debug_assertion builds, formatting is skipped otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DebugString {
	#[cfg(debug_assertions)]
	string: Cow<'static, str>,
}

impl DebugString {
	// Use dbgfmt!(..) instead.
	#[doc(hidden)]
	#[allow(unused_variables)]
	pub fn _new(string: Cow<'static, str>) -> Self {
		Self {
			#[cfg(debug_assertions)]
			string,
		}
	}

	pub fn as_str(&self) -> &str {
		#[cfg(debug_assertions)]
		return &self.string;

		#[cfg(not(debug_assertions))]
		return "NULL";
	}
}

impl From<&'static str> for DebugString {
	fn from(string: &'static str) -> Self {
		Self::_new(string.into())
	}
}

impl From<String> for DebugString {
	fn from(string: String) -> Self {
		Self::_new(string.into())
	}
}

impl Default for DebugString {
	fn default() -> Self {
		Self {
			#[cfg(debug_assertions)]
			string: "uninit".into(),
		}
	}
}

impl Deref for DebugString {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		self.as_str()
	}
}

impl std::fmt::Display for DebugString {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		self.as_str().fmt(f)
	}
}

// Only runs formatting logic in debug_assertion builds.
#[macro_export]
#[cfg(debug_assertions)]
macro_rules! dbgfmt {
	($($arg:tt)*) => {
		$crate::debug_string::DebugString::_new(format!($($arg)*).into())
	}
}

#[macro_export]
#[cfg(not(debug_assertions))]
macro_rules! dbgfmt {
	($($arg:tt)*) => {
		$crate::debug_string::DebugString::default()
	}
}

pub use dbgfmt;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn formats_only_in_debug_builds() {
		let index = 3;
		let name = dbgfmt!("swapchain_image_view[{index}]");

		if cfg!(debug_assertions) {
			assert_eq!(name.as_str(), "swapchain_image_view[3]");
		} else {
			assert_eq!(name.as_str(), "NULL");
		}
	}

	#[test]
	fn display_matches_as_str() {
		let name = DebugString::from("cube_vertex_buffer");
		assert_eq!(name.to_string(), name.as_str());
		assert_eq!(&*name, name.as_str());
	}
}
