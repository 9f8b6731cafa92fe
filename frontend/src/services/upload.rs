//! HTTP upload of a single file to the gallery endpoint.

use futures::future::LocalBoxFuture;
use futures::FutureExt;
use gloo_net::http::Request;
use web_sys::FormData;

use crate::config::{FILE_FIELD_NAME, REQUESTED_WITH_HEADER, REQUESTED_WITH_VALUE};
use crate::{js_error_message, AppError, AppResult, SelectedFile, UploadResponse, WidgetConfig};

/// Sends one file and yields the endpoint's verdict.
///
/// The widget only depends on this trait, so pages (and tests) can swap
/// the transport.
pub trait Uploader: Clone + 'static {
    fn upload(&self, file: &SelectedFile) -> LocalBoxFuture<'static, AppResult<UploadResponse>>;
}

/// `multipart/form-data` POST through the browser's fetch.
#[derive(Clone, Debug)]
pub struct HttpUploader {
    config: WidgetConfig,
}

impl HttpUploader {
    pub fn new(config: WidgetConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }
}

impl Uploader for HttpUploader {
    fn upload(&self, file: &SelectedFile) -> LocalBoxFuture<'static, AppResult<UploadResponse>> {
        upload_file(file.clone(), self.config.clone()).boxed_local()
    }
}

/// Build the form body: anti-forgery token plus the file bytes.
fn build_form(file: &SelectedFile, config: &WidgetConfig) -> AppResult<FormData> {
    let blob = file
        .blob
        .as_ref()
        .ok_or_else(|| AppError::Upload(format!("{} has no readable content", file.name)))?;

    let form_data =
        FormData::new().map_err(|e| AppError::Upload(format!("Failed to create FormData: {}", js_error_message(&e))))?;

    form_data
        .append_with_str(&config.csrf_field, &config.csrf_token)
        .map_err(|e| AppError::Upload(format!("Failed to append token: {}", js_error_message(&e))))?;

    form_data
        .append_with_blob_and_filename(FILE_FIELD_NAME, blob, &file.name)
        .map_err(|e| AppError::Upload(format!("Failed to append file: {}", js_error_message(&e))))?;

    Ok(form_data)
}

/// POST a file and decode the JSON verdict.
///
/// The body is decoded whatever the HTTP status is: the endpoint reports
/// rejections as `{"success": false}`, and anything that is not JSON is a
/// transport-level failure.
pub async fn upload_file(file: SelectedFile, config: WidgetConfig) -> AppResult<UploadResponse> {
    let form_data = build_form(&file, &config)?;

    log::info!("📤 Uploading {} ({} bytes) to {}", file.name, file.size, config.upload_url);

    let request = Request::post(&config.upload_url)
        .header(REQUESTED_WITH_HEADER, REQUESTED_WITH_VALUE)
        .body(form_data)
        .map_err(|e| AppError::Upload(format!("Failed to build request: {}", e)))?;

    let response = request
        .send()
        .await
        .map_err(|e| AppError::Network(e.to_string()))?;

    if !response.ok() {
        log::debug!("{} answered {} for {}", config.upload_url, response.status(), file.name);
    }

    response
        .json::<UploadResponse>()
        .await
        .map_err(|e| AppError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detached_file_is_refused_before_any_request() {
        let file = SelectedFile::detached("notes.txt", "text/plain");
        let err = build_form(&file, &WidgetConfig::default()).unwrap_err();
        assert_eq!(err, AppError::Upload("notes.txt has no readable content".to_string()));
    }

    #[test]
    fn test_http_uploader_keeps_config() {
        let config = WidgetConfig::resolve(Some("/media/upload/".to_string()), None, Some("t0k".to_string()));
        let uploader = HttpUploader::new(config.clone());
        assert_eq!(uploader.config(), &config);
    }
}
