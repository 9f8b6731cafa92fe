//! Browser-facing services.
//!
//! # Services
//!
//! - [`upload`] - multipart upload to the gallery endpoint
//! - [`object_url`] - scoped `blob:` URLs backing the previews

pub mod upload;
pub mod object_url;

pub use upload::*;
pub use object_url::*;
