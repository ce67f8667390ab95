mod mono_api;
pub use mono_api::*;
