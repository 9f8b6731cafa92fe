//! Scoped `blob:` URLs for previews.
//!
//! `URL.createObjectURL` pins the file's bytes in memory until the URL is
//! revoked. [`ObjectUrl`] revokes on drop, so a preview list that is cleared
//! releases everything it referenced.

use std::fmt;

use web_sys::{Blob, Url};

use crate::{js_error_message, AppError, AppResult};

/// Releases a URL once nothing displays it any more.
pub type Revoke = fn(&str);

pub struct ObjectUrl {
    href: String,
    revoke: Revoke,
}

fn revoke_in_browser(href: &str) {
    if let Err(e) = Url::revoke_object_url(href) {
        log::warn!("Could not revoke {}: {}", href, js_error_message(&e));
    }
}

impl ObjectUrl {
    pub fn create(blob: &Blob) -> AppResult<Self> {
        let href = Url::create_object_url_with_blob(blob)
            .map_err(|e| AppError::Dom(format!("Failed to create object URL: {}", js_error_message(&e))))?;
        Ok(Self::with_revoke(href, revoke_in_browser))
    }

    /// Wrap an already-created URL with its own release function.
    pub fn with_revoke(href: impl Into<String>, revoke: Revoke) -> Self {
        Self {
            href: href.into(),
            revoke,
        }
    }

    pub fn href(&self) -> &str {
        &self.href
    }
}

impl fmt::Debug for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ObjectUrl").field(&self.href).finish()
    }
}

impl PartialEq for ObjectUrl {
    fn eq(&self, other: &Self) -> bool {
        self.href == other.href
    }
}

impl Eq for ObjectUrl {}

impl Drop for ObjectUrl {
    fn drop(&mut self) {
        (self.revoke)(&self.href);
    }
}
