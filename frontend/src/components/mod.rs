//! UI components for the upload widget.
//!
//! - [`PreviewGrid`] / [`PreviewCard`] - thumbnails of the current batch
//! - [`StatusList`] - one line per finished upload
//! - [`DropZone`] - the whole widget rendered by Leptos

mod dropzone;
mod preview;
mod status;

pub use dropzone::*;
pub use preview::*;
pub use status::*;
