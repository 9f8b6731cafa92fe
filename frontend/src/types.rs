//! Common types used across the widget.
//!
//! # Categories
//!
//! - **File Types** - files picked by the user and their media class
//! - **Preview Types** - one thumbnail card per file
//! - **Status Types** - one outcome line per upload
//! - **API Types** - upload endpoint response
//! - **Error Types** - widget error handling

use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

use crate::config::{FAILURE_CLASS, SUCCESS_CLASS};
use crate::services::ObjectUrl;

// =============================================================================
// File Types
// =============================================================================

/// Visual class of a file, decided by its declared MIME type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MediaKind {
    /// `image/*`
    Image,
    /// `video/*`
    Video,
    /// Anything else
    Document,
}

impl MediaKind {
    pub fn classify(mime_type: &str) -> Self {
        if mime_type.starts_with("image/") {
            MediaKind::Image
        } else if mime_type.starts_with("video/") {
            MediaKind::Video
        } else {
            MediaKind::Document
        }
    }

    /// Whether the preview shows the file's own bytes.
    pub fn has_visual(&self) -> bool {
        matches!(self, MediaKind::Image | MediaKind::Video)
    }
}

/// A file chosen through the dialog or dropped on the region.
///
/// Lives only for one batch: it is moved into its upload task and
/// dropped once the response is handled.
#[derive(Clone, Debug)]
pub struct SelectedFile {
    pub name: String,
    pub mime_type: String,
    /// Size in bytes as reported by the browser.
    pub size: f64,
    /// Browser handle to the bytes. `None` when built outside a browser.
    pub blob: Option<web_sys::File>,
}

impl SelectedFile {
    pub fn from_file(file: web_sys::File) -> Self {
        Self {
            name: file.name(),
            mime_type: file.type_(),
            size: file.size(),
            blob: Some(file),
        }
    }

    /// A file without browser-backed content.
    pub fn detached(name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size: 0.0,
            blob: None,
        }
    }

    pub fn kind(&self) -> MediaKind {
        MediaKind::classify(&self.mime_type)
    }
}

// =============================================================================
// Preview Types
// =============================================================================

/// Thumbnail card for one file of the current batch.
///
/// Never updated after creation. The object URL behind `thumbnail` is
/// revoked when the last clone of the entry is dropped, which happens when
/// the next batch clears the preview list.
#[derive(Clone, Debug, PartialEq)]
pub struct PreviewEntry {
    /// Batch this card belongs to
    pub batch: u64,
    /// Position of the file in its batch
    pub position: usize,
    /// File name shown as caption
    pub name: String,
    pub kind: MediaKind,
    pub thumbnail: Option<Rc<ObjectUrl>>,
}

impl PreviewEntry {
    pub fn key(&self) -> (u64, usize) {
        (self.batch, self.position)
    }

    pub fn src(&self) -> Option<String> {
        self.thumbnail.as_ref().map(|url| url.href().to_string())
    }
}

// =============================================================================
// Status Types
// =============================================================================

/// Terminal result of a single upload task.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Server answered `success: true`.
    Uploaded,
    /// Server answered `success: false`.
    Rejected,
    /// The request or the response decoding failed.
    Failed(String),
}

impl UploadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, UploadOutcome::Uploaded)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusKind {
    Success,
    Failure,
}

impl StatusKind {
    /// Get CSS class for styling.
    pub fn css_class(&self) -> &'static str {
        match self {
            StatusKind::Success => SUCCESS_CLASS,
            StatusKind::Failure => FAILURE_CLASS,
        }
    }
}

/// One line of the status list.
#[derive(Clone, Debug, PartialEq)]
pub struct StatusEntry {
    /// Unique per page, used as list key
    pub id: u64,
    /// Batch the upload was started from
    pub batch: u64,
    pub file_name: String,
    pub kind: StatusKind,
    pub message: String,
    /// Arrival time (HH:MM:SS)
    pub at: String,
}

impl StatusEntry {
    pub fn for_outcome(id: u64, batch: u64, file_name: &str, outcome: &UploadOutcome) -> Self {
        let (kind, message) = match outcome {
            UploadOutcome::Uploaded => (
                StatusKind::Success,
                format!("{} uploaded successfully!", file_name),
            ),
            UploadOutcome::Rejected => (StatusKind::Failure, format!("Error uploading {}", file_name)),
            UploadOutcome::Failed(reason) => (
                StatusKind::Failure,
                format!("Upload failed for {}: {}", file_name, reason),
            ),
        };

        Self {
            id,
            batch,
            file_name: file_name.to_string(),
            kind,
            message,
            at: chrono::Local::now().format("%H:%M:%S").to_string(),
        }
    }
}

// =============================================================================
// API Response Types
// =============================================================================

/// Body returned by the upload endpoint. Extra fields are ignored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
}

// =============================================================================
// Drag State
// =============================================================================

/// Cosmetic state of the drop region.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    DraggingOver,
}

// =============================================================================
// Error Types
// =============================================================================

/// Widget errors.
#[derive(Clone, Debug, PartialEq)]
pub enum AppError {
    /// The request could not be built.
    Upload(String),
    /// Network/HTTP transport error, shown as the browser reported it.
    Network(String),
    /// The response body is not the expected JSON.
    Decode(String),
    /// A template element is missing or has the wrong type.
    Dom(String),
    /// Invalid options passed from JavaScript.
    Config(String),
    /// `initialize` was already called on this page.
    AlreadyInitialized,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Upload(msg) => write!(f, "Upload error: {}", msg),
            AppError::Network(msg) => write!(f, "{}", msg),
            AppError::Decode(msg) => write!(f, "Invalid response: {}", msg),
            AppError::Dom(msg) => write!(f, "DOM error: {}", msg),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::AlreadyInitialized => write!(f, "Upload widget is already initialized"),
        }
    }
}

impl std::error::Error for AppError {}

/// Result type alias for widget operations.
pub type AppResult<T> = Result<T, AppError>;

/// Best-effort message out of a thrown JS value.
pub fn js_error_message(value: &wasm_bindgen::JsValue) -> String {
    js_sys::Reflect::get(value, &"message".into())
        .ok()
        .and_then(|v| v.as_string())
        .or_else(|| value.as_string())
        .unwrap_or_else(|| format!("{:?}", value))
}
