//! Upload orchestration: selection → preview → upload → status.
//!
//! [`UploadWidget`] owns no DOM. It writes into [`WidgetState`] signals that
//! the components render, and it starts uploads on whatever
//! [`LocalSpawn`] executor it was given (the browser's microtask queue in
//! production, a `LocalPool` in tests).
//!
//! A new batch clears the previous previews and statuses but does not cancel
//! the previous uploads: their status lines still land in the current list.

use std::future::Future;
use std::rc::Rc;

use futures::channel::oneshot;
use futures::future::LocalFutureObj;
use futures::task::{LocalSpawn, LocalSpawnExt, SpawnError};
use leptos::*;

use crate::services::{ObjectUrl, Uploader};
use crate::{DragState, PreviewEntry, SelectedFile, StatusEntry, UploadOutcome};

/// Reactive state shared between the widget and its views.
#[derive(Clone, Copy)]
pub struct WidgetState {
    pub previews: RwSignal<Vec<PreviewEntry>>,
    pub statuses: RwSignal<Vec<StatusEntry>>,
    pub drag: RwSignal<DragState>,
    batch: StoredValue<u64>,
    next_status_id: StoredValue<u64>,
}

impl WidgetState {
    pub fn new() -> Self {
        Self {
            previews: create_rw_signal(Vec::new()),
            statuses: create_rw_signal(Vec::new()),
            drag: create_rw_signal(DragState::Idle),
            batch: store_value(0),
            next_status_id: store_value(0),
        }
    }

    pub fn current_batch(&self) -> u64 {
        self.batch.get_value()
    }

    /// Start a new batch and discard what the previous one displayed.
    fn begin_batch(&self) -> u64 {
        self.batch.update_value(|batch| *batch += 1);
        self.previews.set(Vec::new());
        self.statuses.set(Vec::new());
        self.current_batch()
    }

    fn push_status(&self, batch: u64, file_name: &str, outcome: &UploadOutcome) -> StatusEntry {
        let id = self.next_status_id.get_value();
        self.next_status_id.set_value(id + 1);

        let entry = StatusEntry::for_outcome(id, batch, file_name, outcome);
        self.statuses.update(|statuses| statuses.push(entry.clone()));
        entry
    }
}

impl Default for WidgetState {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs futures on the page's event loop.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserSpawner;

impl LocalSpawn for BrowserSpawner {
    fn spawn_local_obj(&self, future: LocalFutureObj<'static, ()>) -> Result<(), SpawnError> {
        wasm_bindgen_futures::spawn_local(future);
        Ok(())
    }
}

/// Completion notification for one dispatched upload.
///
/// Dropping it does not cancel the upload.
pub struct UploadTask {
    pub file_name: String,
    pub batch: u64,
    done: oneshot::Receiver<UploadOutcome>,
}

impl UploadTask {
    /// Resolves with the upload's outcome once its status line is shown.
    /// `None` if the executor dropped the task before it finished.
    pub async fn wait(self) -> Option<UploadOutcome> {
        self.done.await.ok()
    }
}

/// Produces the object URL a visual preview displays.
pub type Thumbnailer = fn(&SelectedFile) -> Option<ObjectUrl>;

/// Object URL over the file's browser blob, if it has one.
pub fn browser_thumbnail(file: &SelectedFile) -> Option<ObjectUrl> {
    let blob = file.blob.as_ref()?;
    match ObjectUrl::create(blob) {
        Ok(url) => Some(url),
        Err(e) => {
            log::warn!("No thumbnail for {}: {}", file.name, e);
            None
        }
    }
}

/// Build the card for one file. Images and videos get an object URL to
/// their bytes; everything else gets the document glyph.
pub fn build_preview(file: &SelectedFile, batch: u64, position: usize) -> PreviewEntry {
    build_preview_with(file, batch, position, browser_thumbnail)
}

fn build_preview_with(file: &SelectedFile, batch: u64, position: usize, thumbnails: Thumbnailer) -> PreviewEntry {
    let kind = file.kind();
    let thumbnail = if kind.has_visual() {
        thumbnails(file).map(Rc::new)
    } else {
        None
    };

    PreviewEntry {
        batch,
        position,
        name: file.name.clone(),
        kind,
        thumbnail,
    }
}

#[derive(Clone)]
pub struct UploadWidget<U, S> {
    state: WidgetState,
    uploader: U,
    spawner: S,
    thumbnails: Thumbnailer,
}

impl<U, S> UploadWidget<U, S>
where
    U: Uploader,
    S: LocalSpawn + Clone + 'static,
{
    pub fn new(state: WidgetState, uploader: U, spawner: S) -> Self {
        Self {
            state,
            uploader,
            spawner,
            thumbnails: browser_thumbnail,
        }
    }

    /// Use another source for preview object URLs.
    pub fn with_thumbnails(mut self, thumbnails: Thumbnailer) -> Self {
        self.thumbnails = thumbnails;
        self
    }

    pub fn state(&self) -> WidgetState {
        self.state
    }

    /// Toggle the cosmetic highlight of the drop region.
    pub fn set_dragging(&self, over: bool) {
        let next = if over { DragState::DraggingOver } else { DragState::Idle };
        if self.state.drag.get_untracked() != next {
            self.state.drag.set(next);
        }
    }

    /// Files dropped on the region: the highlight resets, then the batch runs.
    pub fn accept_drop(&self, files: Vec<SelectedFile>) -> Vec<UploadTask> {
        self.set_dragging(false);
        self.handle_file_batch(files)
    }

    /// Replace the displayed batch with `files` and upload each of them.
    ///
    /// All previews exist before this returns; uploads only make progress
    /// once the executor runs.
    pub fn handle_file_batch(&self, files: Vec<SelectedFile>) -> Vec<UploadTask> {
        let batch = self.state.begin_batch();
        log::info!("📂 Batch {}: {} file(s) selected", batch, files.len());

        let previews: Vec<PreviewEntry> = files
            .iter()
            .enumerate()
            .map(|(position, file)| build_preview_with(file, batch, position, self.thumbnails))
            .collect();
        self.state.previews.set(previews);

        files
            .into_iter()
            .map(|file| self.dispatch(file, batch))
            .collect()
    }

    /// Upload one file and report it in the status list.
    pub fn submit_upload(&self, file: SelectedFile) -> impl Future<Output = UploadOutcome> + 'static {
        let batch = self.state.current_batch();
        self.clone().run_upload(file, batch)
    }

    fn dispatch(&self, file: SelectedFile, batch: u64) -> UploadTask {
        let file_name = file.name.clone();
        let (done_tx, done_rx) = oneshot::channel();

        let upload = self.clone().run_upload(file, batch);
        let spawned = self.spawner.spawn_local(async move {
            let outcome = upload.await;
            let _ = done_tx.send(outcome);
        });

        let done = match spawned {
            Ok(()) => done_rx,
            Err(e) => {
                log::error!("❌ Could not start upload of {}: {}", file_name, e);
                let outcome = UploadOutcome::Failed(e.to_string());
                self.state.push_status(batch, &file_name, &outcome);

                let (done_tx, done_rx) = oneshot::channel();
                let _ = done_tx.send(outcome);
                done_rx
            }
        };

        UploadTask {
            file_name,
            batch,
            done,
        }
    }

    async fn run_upload(self, file: SelectedFile, batch: u64) -> UploadOutcome {
        let outcome = match self.uploader.upload(&file).await {
            Ok(response) if response.success => {
                log::info!("✅ {} uploaded", file.name);
                UploadOutcome::Uploaded
            }
            Ok(_) => {
                log::info!("❌ {} rejected by the server", file.name);
                UploadOutcome::Rejected
            }
            Err(e) => {
                log::warn!("Upload of {} failed: {}", file.name, e);
                UploadOutcome::Failed(e.to_string())
            }
        };

        if batch != self.state.current_batch() {
            log::debug!(
                "{} finished after batch {} was replaced by batch {}",
                file.name,
                batch,
                self.state.current_batch()
            );
        }

        self.state.push_status(batch, &file.name, &outcome);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AppError, AppResult, MediaKind, StatusKind, UploadResponse};
    use futures::executor::{block_on, LocalPool, LocalSpawner};
    use leptos_reactive::create_runtime;
    use futures::future::LocalBoxFuture;
    use futures::FutureExt;
    use std::cell::RefCell;
    use std::collections::{HashMap, VecDeque};

    type Reply = AppResult<UploadResponse>;

    /// Uploader whose replies are released by the test, one per call.
    #[derive(Clone, Default)]
    struct ScriptedUploader {
        replies: Rc<RefCell<HashMap<String, VecDeque<oneshot::Receiver<Reply>>>>>,
        calls: Rc<RefCell<Vec<String>>>,
    }

    impl ScriptedUploader {
        fn script(&self, name: &str) -> oneshot::Sender<Reply> {
            let (tx, rx) = oneshot::channel();
            self.replies
                .borrow_mut()
                .entry(name.to_string())
                .or_default()
                .push_back(rx);
            tx
        }

        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }
    }

    impl Uploader for ScriptedUploader {
        fn upload(&self, file: &SelectedFile) -> LocalBoxFuture<'static, Reply> {
            self.calls.borrow_mut().push(file.name.clone());
            let reply = self
                .replies
                .borrow_mut()
                .get_mut(&file.name)
                .and_then(|queue| queue.pop_front());

            async move {
                match reply {
                    Some(rx) => rx
                        .await
                        .unwrap_or_else(|_| Err(AppError::Network("reply dropped".to_string()))),
                    None => Err(AppError::Network("no scripted reply".to_string())),
                }
            }
            .boxed_local()
        }
    }

    #[derive(Clone)]
    struct ClosedSpawner;

    impl LocalSpawn for ClosedSpawner {
        fn spawn_local_obj(&self, _future: LocalFutureObj<'static, ()>) -> Result<(), SpawnError> {
            Err(SpawnError::shutdown())
        }
    }

    fn ok(success: bool) -> Reply {
        Ok(UploadResponse { success })
    }

    fn with_widget<T>(
        test: impl FnOnce(&mut LocalPool, UploadWidget<ScriptedUploader, LocalSpawner>, ScriptedUploader) -> T,
    ) -> T {
        let runtime = create_runtime();
        let mut pool = LocalPool::new();
        let uploader = ScriptedUploader::default();
        let widget = UploadWidget::new(WidgetState::new(), uploader.clone(), pool.spawner());

        let result = test(&mut pool, widget, uploader);
        runtime.dispose();
        result
    }

    fn messages(widget: &UploadWidget<ScriptedUploader, LocalSpawner>) -> Vec<String> {
        widget
            .state()
            .statuses
            .with_untracked(|statuses| statuses.iter().map(|s| s.message.clone()).collect())
    }

    #[test]
    fn test_image_upload_succeeds() {
        with_widget(|pool, widget, uploader| {
            let reply = uploader.script("photo.png");
            widget.handle_file_batch(vec![SelectedFile::detached("photo.png", "image/png")]);

            let previews = widget.state().previews.get_untracked();
            assert_eq!(previews.len(), 1);
            assert_eq!(previews[0].kind, MediaKind::Image);
            assert_eq!(previews[0].name, "photo.png");

            pool.run_until_stalled();
            assert!(messages(&widget).is_empty());

            reply.send(ok(true)).unwrap();
            pool.run_until_stalled();

            let statuses = widget.state().statuses.get_untracked();
            assert_eq!(statuses.len(), 1);
            assert_eq!(statuses[0].message, "photo.png uploaded successfully!");
            assert_eq!(statuses[0].kind, StatusKind::Success);
        });
    }

    #[test]
    fn test_server_rejection_is_reported() {
        with_widget(|pool, widget, uploader| {
            uploader.script("report.pdf").send(ok(false)).unwrap();
            widget.handle_file_batch(vec![SelectedFile::detached("report.pdf", "application/pdf")]);

            let previews = widget.state().previews.get_untracked();
            assert_eq!(previews[0].kind, MediaKind::Document);
            assert!(previews[0].src().is_none());

            pool.run_until_stalled();
            let statuses = widget.state().statuses.get_untracked();
            assert_eq!(statuses.len(), 1);
            assert_eq!(statuses[0].message, "Error uploading report.pdf");
            assert_eq!(statuses[0].kind.css_class(), "text-red-400");
        });
    }

    #[test]
    fn test_transport_failure_is_reported() {
        with_widget(|pool, widget, uploader| {
            uploader
                .script("offline.png")
                .send(Err(AppError::Network("TypeError: Failed to fetch".to_string())))
                .unwrap();
            widget.handle_file_batch(vec![SelectedFile::detached("offline.png", "image/png")]);
            pool.run_until_stalled();

            assert_eq!(
                messages(&widget),
                vec!["Upload failed for offline.png: TypeError: Failed to fetch".to_string()]
            );
            assert_eq!(widget.state().statuses.get_untracked()[0].kind, StatusKind::Failure);
        });
    }

    #[test]
    fn test_previews_keep_order_and_statuses_follow_arrival() {
        with_widget(|pool, widget, uploader| {
            let a = uploader.script("a.jpg");
            let b = uploader.script("b.mp4");
            let c = uploader.script("c.txt");

            let tasks = widget.handle_file_batch(vec![
                SelectedFile::detached("a.jpg", "image/jpeg"),
                SelectedFile::detached("b.mp4", "video/mp4"),
                SelectedFile::detached("c.txt", "text/plain"),
            ]);
            assert_eq!(tasks.len(), 3);

            let previews = widget.state().previews.get_untracked();
            let kinds: Vec<_> = previews.iter().map(|p| (p.name.as_str(), p.kind, p.position)).collect();
            assert_eq!(
                kinds,
                vec![
                    ("a.jpg", MediaKind::Image, 0),
                    ("b.mp4", MediaKind::Video, 1),
                    ("c.txt", MediaKind::Document, 2),
                ]
            );
            assert!(messages(&widget).is_empty());

            c.send(ok(true)).unwrap();
            pool.run_until_stalled();
            a.send(ok(false)).unwrap();
            pool.run_until_stalled();
            b.send(Err(AppError::Decode("expected value at line 1".to_string()))).unwrap();
            pool.run_until_stalled();

            assert_eq!(
                messages(&widget),
                vec![
                    "c.txt uploaded successfully!".to_string(),
                    "Error uploading a.jpg".to_string(),
                    "Upload failed for b.mp4: Invalid response: expected value at line 1".to_string(),
                ]
            );
        });
    }

    #[test]
    fn test_every_file_gets_exactly_one_status() {
        with_widget(|pool, widget, uploader| {
            let names = ["1.png", "2.mov", "3.zip", "4.gif", "5.doc"];
            // 5.doc is never scripted and fails on its own.
            uploader.script("1.png").send(ok(true)).unwrap();
            uploader.script("2.mov").send(ok(false)).unwrap();
            uploader.script("3.zip").send(Err(AppError::Network("timeout".to_string()))).unwrap();
            drop(uploader.script("4.gif"));

            let files = names
                .iter()
                .map(|name| SelectedFile::detached(*name, "application/octet-stream"))
                .collect();
            widget.handle_file_batch(files);
            pool.run_until_stalled();

            let statuses = widget.state().statuses.get_untracked();
            assert_eq!(statuses.len(), names.len());
            let mut reported: Vec<_> = statuses.iter().map(|s| s.file_name.clone()).collect();
            reported.sort();
            assert_eq!(reported, names.iter().map(|n| n.to_string()).collect::<Vec<_>>());

            let ids: Vec<_> = statuses.iter().map(|s| s.id).collect();
            assert_eq!(ids, vec![0, 1, 2, 3, 4]);
        });
    }

    #[test]
    fn test_new_batch_clears_without_cancelling() {
        with_widget(|pool, widget, uploader| {
            let first = uploader.script("same.png");
            let second = uploader.script("same.png");

            widget.handle_file_batch(vec![SelectedFile::detached("same.png", "image/png")]);
            pool.run_until_stalled();
            assert_eq!(widget.state().current_batch(), 1);

            widget.handle_file_batch(vec![SelectedFile::detached("same.png", "image/png")]);
            pool.run_until_stalled();
            assert_eq!(widget.state().current_batch(), 2);

            let previews = widget.state().previews.get_untracked();
            assert_eq!(previews.len(), 1);
            assert_eq!(previews[0].key(), (2, 0));
            assert!(messages(&widget).is_empty());

            // The superseded upload still completes into the current list.
            first.send(ok(true)).unwrap();
            pool.run_until_stalled();
            second.send(ok(true)).unwrap();
            pool.run_until_stalled();

            let batches: Vec<_> = widget
                .state()
                .statuses
                .get_untracked()
                .iter()
                .map(|s| s.batch)
                .collect();
            assert_eq!(batches, vec![1, 2]);
            assert_eq!(uploader.calls(), vec!["same.png".to_string(), "same.png".to_string()]);
        });
    }

    #[test]
    fn test_empty_batch_only_clears() {
        with_widget(|pool, widget, uploader| {
            uploader.script("x.png").send(ok(true)).unwrap();
            widget.handle_file_batch(vec![SelectedFile::detached("x.png", "image/png")]);
            pool.run_until_stalled();
            assert_eq!(messages(&widget).len(), 1);

            let tasks = widget.handle_file_batch(Vec::new());
            pool.run_until_stalled();

            assert!(tasks.is_empty());
            assert!(widget.state().previews.get_untracked().is_empty());
            assert!(messages(&widget).is_empty());
            assert_eq!(uploader.calls().len(), 1);
        });
    }

    #[test]
    fn test_task_reports_completion() {
        with_widget(|pool, widget, uploader| {
            uploader.script("song.mp3").send(ok(true)).unwrap();
            let mut tasks = widget.handle_file_batch(vec![SelectedFile::detached("song.mp3", "audio/mpeg")]);
            let task = tasks.remove(0);
            assert_eq!(task.file_name, "song.mp3");
            assert_eq!(task.batch, 1);

            let outcome = pool.run_until(task.wait());
            assert_eq!(outcome, Some(UploadOutcome::Uploaded));
            assert_eq!(messages(&widget), vec!["song.mp3 uploaded successfully!".to_string()]);
        });
    }

    #[test]
    fn test_dropped_task_handle_keeps_upload_running() {
        with_widget(|pool, widget, uploader| {
            let reply = uploader.script("keep.png");
            drop(widget.handle_file_batch(vec![SelectedFile::detached("keep.png", "image/png")]));

            reply.send(ok(true)).unwrap();
            pool.run_until_stalled();
            assert_eq!(messages(&widget), vec!["keep.png uploaded successfully!".to_string()]);
        });
    }

    #[test]
    fn test_submit_upload_directly() {
        with_widget(|pool, widget, uploader| {
            uploader.script("solo.pdf").send(ok(false)).unwrap();
            let outcome = pool.run_until(widget.submit_upload(SelectedFile::detached("solo.pdf", "application/pdf")));

            assert_eq!(outcome, UploadOutcome::Rejected);
            assert_eq!(messages(&widget), vec!["Error uploading solo.pdf".to_string()]);
            assert!(widget.state().previews.get_untracked().is_empty());
        });
    }

    #[test]
    fn test_refused_spawn_still_reports() {
        let runtime = create_runtime();
        let uploader = ScriptedUploader::default();
        let widget = UploadWidget::new(WidgetState::new(), uploader.clone(), ClosedSpawner);

        let mut tasks = widget.handle_file_batch(vec![SelectedFile::detached("late.png", "image/png")]);
        assert_eq!(widget.state().previews.get_untracked().len(), 1);

        let statuses = widget.state().statuses.get_untracked();
        assert_eq!(statuses.len(), 1);
        assert!(statuses[0].message.starts_with("Upload failed for late.png: "));
        assert!(uploader.calls().is_empty());

        let outcome = block_on(tasks.remove(0).wait());
        assert!(matches!(outcome, Some(UploadOutcome::Failed(_))));
        runtime.dispose();
    }

    thread_local! {
        static REVOKED: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
    }

    fn record_revoke(href: &str) {
        REVOKED.with(|revoked| revoked.borrow_mut().push(href.to_string()));
    }

    fn revoked() -> Vec<String> {
        REVOKED.with(|revoked| revoked.borrow().clone())
    }

    fn counted_thumbnail(file: &SelectedFile) -> Option<ObjectUrl> {
        Some(ObjectUrl::with_revoke(format!("blob:test/{}", file.name), record_revoke))
    }

    #[test]
    fn test_clearing_a_batch_releases_its_thumbnails() {
        with_widget(|pool, widget, _| {
            let widget = widget.with_thumbnails(counted_thumbnail);

            widget.handle_file_batch(vec![
                SelectedFile::detached("a.jpg", "image/jpeg"),
                SelectedFile::detached("b.mp4", "video/mp4"),
                SelectedFile::detached("c.txt", "text/plain"),
            ]);
            pool.run_until_stalled();

            let sources: Vec<_> = widget
                .state()
                .previews
                .with_untracked(|previews| previews.iter().map(|p| p.src()).collect());
            assert_eq!(
                sources,
                vec![
                    Some("blob:test/a.jpg".to_string()),
                    Some("blob:test/b.mp4".to_string()),
                    None,
                ]
            );
            assert!(revoked().is_empty());

            widget.handle_file_batch(vec![SelectedFile::detached("d.png", "image/png")]);
            let mut released = revoked();
            released.sort();
            assert_eq!(released, vec!["blob:test/a.jpg".to_string(), "blob:test/b.mp4".to_string()]);

            widget.handle_file_batch(Vec::new());
            assert_eq!(revoked().len(), 3);
            assert_eq!(revoked()[2], "blob:test/d.png");
        });
    }

    #[test]
    fn test_drop_resets_highlight_and_runs_batch() {
        with_widget(|pool, widget, uploader| {
            uploader.script("dropped.png").send(ok(true)).unwrap();
            widget.set_dragging(true);

            let tasks = widget.accept_drop(vec![SelectedFile::detached("dropped.png", "image/png")]);
            assert_eq!(widget.state().drag.get_untracked(), DragState::Idle);
            assert_eq!(tasks.len(), 1);
            assert_eq!(widget.state().previews.with_untracked(|p| p.len()), 1);

            pool.run_until_stalled();
            assert_eq!(messages(&widget), vec!["dropped.png uploaded successfully!".to_string()]);
        });
    }

    #[test]
    fn test_empty_drop_still_resets_highlight() {
        with_widget(|_, widget, uploader| {
            widget.set_dragging(true);
            assert!(widget.accept_drop(Vec::new()).is_empty());
            assert_eq!(widget.state().drag.get_untracked(), DragState::Idle);
            assert!(uploader.calls().is_empty());
        });
    }

    #[test]
    fn test_drag_state_toggles() {
        with_widget(|_, widget, _| {
            assert_eq!(widget.state().drag.get_untracked(), DragState::Idle);
            widget.set_dragging(true);
            assert_eq!(widget.state().drag.get_untracked(), DragState::DraggingOver);
            widget.set_dragging(true);
            assert_eq!(widget.state().drag.get_untracked(), DragState::DraggingOver);
            widget.set_dragging(false);
            assert_eq!(widget.state().drag.get_untracked(), DragState::Idle);
        });
    }
}
