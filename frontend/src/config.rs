//! Widget configuration.
//!
//! The page template owns the upload endpoint and the anti-forgery token.
//! Both are read from the DOM at startup (or passed explicitly from
//! JavaScript); everything else is a fixed constant of the template contract.

use serde::Deserialize;
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlInputElement};

use crate::{AppError, AppResult};

/// Upload endpoint used when the template does not provide one.
pub const DEFAULT_UPLOAD_URL: &str = "/upload/";

/// Form field carrying the anti-forgery token.
pub const CSRF_FIELD_NAME: &str = "csrfmiddlewaretoken";

/// Form field carrying the file bytes.
pub const FILE_FIELD_NAME: &str = "file";

/// Header flagging the request as programmatic.
pub const REQUESTED_WITH_HEADER: &str = "x-requested-with";
pub const REQUESTED_WITH_VALUE: &str = "XMLHttpRequest";

/// Data attribute on the upload form overriding its `action`.
pub const UPLOAD_URL_ATTRIBUTE: &str = "data-upload-url";

/// Present on the drop region when the page calls `initUploadWidget` itself.
pub const MANUAL_INIT_ATTRIBUTE: &str = "data-manual-init";

// Element ids of the server template.
pub const DROP_REGION_ID: &str = "dropzone";
pub const UPLOAD_FORM_ID: &str = "uploadForm";
pub const PREVIEW_CONTAINER_ID: &str = "previewContainer";
pub const STATUS_CONTAINER_ID: &str = "statusMessages";

/// Classes toggled on the drop region while a drag hovers it.
pub const HIGHLIGHT_CLASSES: [&str; 2] = ["border-accent", "bg-accent/10"];

pub const SUCCESS_CLASS: &str = "text-green-400";
pub const FAILURE_CLASS: &str = "text-red-400";

/// Upload settings supplied by the page.
#[derive(Clone, Debug, PartialEq)]
pub struct WidgetConfig {
    /// Endpoint receiving the multipart POST.
    pub upload_url: String,
    /// Opaque anti-forgery token, forwarded untouched.
    pub csrf_token: String,
    /// Form field name for the token.
    pub csrf_field: String,
}

/// Fields a page may set explicitly through `initUploadWidget`:
/// `{ uploadUrl: "/upload/", csrfToken: "...", csrfField: "csrfmiddlewaretoken" }`.
///
/// Anything left out keeps the value read from the template.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetOverrides {
    pub upload_url: Option<String>,
    pub csrf_token: Option<String>,
    pub csrf_field: Option<String>,
}

fn default_upload_url() -> String {
    DEFAULT_UPLOAD_URL.to_string()
}

fn default_csrf_field() -> String {
    CSRF_FIELD_NAME.to_string()
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            upload_url: default_upload_url(),
            csrf_token: String::new(),
            csrf_field: default_csrf_field(),
        }
    }
}

impl WidgetConfig {
    /// Pick the endpoint from the data attribute, then the form action,
    /// then the default. Blank values count as absent.
    pub fn resolve(
        data_url: Option<String>,
        form_action: Option<String>,
        csrf_token: Option<String>,
    ) -> Self {
        let non_blank = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        Self {
            upload_url: non_blank(data_url)
                .or_else(|| non_blank(form_action))
                .unwrap_or_else(default_upload_url),
            csrf_token: csrf_token.unwrap_or_default(),
            csrf_field: default_csrf_field(),
        }
    }

    /// Read the configuration off the template's upload form.
    pub fn from_form(form: &Element) -> Self {
        let token = form
            .query_selector(&format!("input[name=\"{}\"]", CSRF_FIELD_NAME))
            .ok()
            .flatten()
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
            .map(|input| input.value());

        Self::resolve(
            form.get_attribute(UPLOAD_URL_ATTRIBUTE),
            form.get_attribute("action"),
            token,
        )
    }

    /// Apply the fields a page set explicitly on top of this configuration.
    pub fn merge(self, overrides: WidgetOverrides) -> Self {
        Self {
            upload_url: overrides.upload_url.unwrap_or(self.upload_url),
            csrf_token: overrides.csrf_token.unwrap_or(self.csrf_token),
            csrf_field: overrides.csrf_field.unwrap_or(self.csrf_field),
        }
    }
}

impl WidgetOverrides {
    /// Decode an options object handed over from JavaScript.
    pub fn from_js(options: wasm_bindgen::JsValue) -> AppResult<Self> {
        if options.is_undefined() || options.is_null() {
            return Ok(Self::default());
        }
        serde_wasm_bindgen::from_value(options).map_err(|e| AppError::Config(e.to_string()))
    }
}
