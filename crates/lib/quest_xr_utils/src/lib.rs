pub mod debug_string;
pub mod io;

pub use debug_string::DebugString;
