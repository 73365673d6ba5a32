//! Per-job transcode pipeline.
//!
//! Runs exactly the sequence {mark UPLOADED, download, mark PROCESSING,
//! transcode, upload, mark READY} for one job descriptor, with a monotonic
//! failure policy: any failure after the source is local records FAILED
//! best-effort and aborts the job.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use vodforge_media::{generate_thumbnail, probe_video, Transcoder};
use vodforge_models::{JobDescriptor, VideoStatus};
use vodforge_notifier::{MetadataUpdate, NotifierClient};
use vodforge_storage::ObjectStoreClient;

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::workspace::Workspace;

/// Object store seam: source download and rendition upload.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn download(&self, bucket: &str, key: &str, dest: &Path) -> WorkerResult<()>;

    /// Upload every regular file under `dir`, preserving relative paths
    /// beneath `prefix`.
    async fn upload_tree(&self, dir: &Path, bucket: &str, prefix: &str) -> WorkerResult<u32>;
}

/// Encoder seam: one rendition set per invocation.
#[async_trait]
pub trait Encoder: Send + Sync {
    async fn transcode(&self, input: &Path, output_dir: &Path) -> WorkerResult<()>;

    /// Best-effort duration probe of the downloaded source.
    async fn probe_duration(&self, input: &Path) -> Option<i32> {
        let _ = input;
        None
    }

    /// Best-effort thumbnail extraction into the rendition set.
    async fn thumbnail(&self, input: &Path, output: &Path) -> WorkerResult<()> {
        let _ = (input, output);
        Ok(())
    }
}

/// Status record seam.
#[async_trait]
pub trait StatusSink: Send + Sync {
    async fn update(&self, video_id: &str, update: &MetadataUpdate) -> WorkerResult<()>;
}

#[async_trait]
impl<T: ObjectStore + ?Sized> ObjectStore for Arc<T> {
    async fn download(&self, bucket: &str, key: &str, dest: &Path) -> WorkerResult<()> {
        (**self).download(bucket, key, dest).await
    }

    async fn upload_tree(&self, dir: &Path, bucket: &str, prefix: &str) -> WorkerResult<u32> {
        (**self).upload_tree(dir, bucket, prefix).await
    }
}

#[async_trait]
impl<T: Encoder + ?Sized> Encoder for Arc<T> {
    async fn transcode(&self, input: &Path, output_dir: &Path) -> WorkerResult<()> {
        (**self).transcode(input, output_dir).await
    }

    async fn probe_duration(&self, input: &Path) -> Option<i32> {
        (**self).probe_duration(input).await
    }

    async fn thumbnail(&self, input: &Path, output: &Path) -> WorkerResult<()> {
        (**self).thumbnail(input, output).await
    }
}

#[async_trait]
impl<T: StatusSink + ?Sized> StatusSink for Arc<T> {
    async fn update(&self, video_id: &str, update: &MetadataUpdate) -> WorkerResult<()> {
        (**self).update(video_id, update).await
    }
}

#[async_trait]
impl ObjectStore for ObjectStoreClient {
    async fn download(&self, bucket: &str, key: &str, dest: &Path) -> WorkerResult<()> {
        self.download_file(bucket, key, dest)
            .await
            .map_err(|e| WorkerError::download_failed(e.to_string()))
    }

    async fn upload_tree(&self, dir: &Path, bucket: &str, prefix: &str) -> WorkerResult<u32> {
        self.upload_dir(dir, bucket, prefix)
            .await
            .map_err(|e| WorkerError::upload_failed(e.to_string()))
    }
}

#[async_trait]
impl Encoder for Transcoder {
    async fn transcode(&self, input: &Path, output_dir: &Path) -> WorkerResult<()> {
        Transcoder::transcode(self, input, output_dir)
            .await
            .map_err(|e| WorkerError::transcode_failed(e.to_string()))
    }

    async fn probe_duration(&self, input: &Path) -> Option<i32> {
        match probe_video(input).await {
            Ok(info) => Some(info.duration_sec),
            Err(e) => {
                warn!("Source probe failed: {}", e);
                None
            }
        }
    }

    async fn thumbnail(&self, input: &Path, output: &Path) -> WorkerResult<()> {
        generate_thumbnail(input, output, "00:00:01")
            .await
            .map_err(|e| WorkerError::transcode_failed(e.to_string()))
    }
}

#[async_trait]
impl StatusSink for NotifierClient {
    async fn update(&self, video_id: &str, update: &MetadataUpdate) -> WorkerResult<()> {
        NotifierClient::update(self, video_id, update)
            .await
            .map_err(|e| WorkerError::StatusSyncFailed(e.to_string()))
    }
}

/// The transcode orchestrator.
pub struct TranscodePipeline<S, E, N> {
    store: S,
    encoder: E,
    status: N,
    config: WorkerConfig,
}

impl<S, E, N> TranscodePipeline<S, E, N>
where
    S: ObjectStore,
    E: Encoder,
    N: StatusSink,
{
    pub fn new(store: S, encoder: E, status: N, config: WorkerConfig) -> Self {
        Self {
            store,
            encoder,
            status,
            config,
        }
    }

    /// Process one job descriptor.
    ///
    /// Steps are strictly sequential. Status sync failures are non-fatal
    /// side effects except for the final READY update, whose failure is
    /// surfaced even though the rendition set is already published. The
    /// workspace is removed on every exit path.
    pub async fn process(&self, job: &JobDescriptor) -> WorkerResult<()> {
        info!(
            owner_id = %job.owner_id,
            video_id = %job.video_id,
            key = %job.key,
            size = job.size,
            "Processing job"
        );

        // The source object is durably stored by the time the event fires;
        // a failed status update must not stop the job.
        self.sync_status(job, VideoStatus::Uploaded).await;

        let workspace = Workspace::create(&self.config.work_dir)?;
        let input = workspace.input_path();
        let output = workspace.output_dir();

        self.store.download(&job.bucket, &job.key, &input).await?;

        self.sync_status(job, VideoStatus::Processing).await;

        let duration_sec = self.encoder.probe_duration(&input).await;

        if let Err(e) = self.encoder.transcode(&input, &output).await {
            error!(video_id = %job.video_id, "Transcode failed: {}", e);
            self.sync_status(job, VideoStatus::Failed).await;
            return Err(e);
        }

        if let Err(e) = self.encoder.thumbnail(&input, &output.join("thumbnail.jpg")).await {
            warn!(video_id = %job.video_id, "Thumbnail extraction failed: {}", e);
        }

        if let Err(e) = self
            .store
            .upload_tree(&output, &job.bucket, &job.rendition_prefix())
            .await
        {
            error!(video_id = %job.video_id, "Upload failed: {}", e);
            self.sync_status(job, VideoStatus::Failed).await;
            return Err(e);
        }

        let ready = MetadataUpdate::status(&job.owner_id, VideoStatus::Ready)
            .with_title(job.title())
            .with_duration(duration_sec);
        if let Err(e) = self.status.update(&job.video_id, &ready).await {
            // The rendition set is published but the record still says
            // PROCESSING; surface the drift instead of hiding it.
            error!(video_id = %job.video_id, "READY status sync failed: {}", e);
            return Err(e);
        }

        info!(video_id = %job.video_id, "Job completed");
        Ok(())
    }

    /// Best-effort status update; failures are logged, never fatal.
    async fn sync_status(&self, job: &JobDescriptor, status: VideoStatus) {
        let update = MetadataUpdate::status(&job.owner_id, status);
        if let Err(e) = self.status.update(&job.video_id, &update).await {
            warn!(
                video_id = %job.video_id,
                status = %status,
                "Status sync failed: {}", e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::path::PathBuf;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeStore {
        uploads: Mutex<Vec<String>>,
        fail_download: bool,
        fail_upload: bool,
    }

    impl FakeStore {
        fn uploaded_keys(&self) -> Vec<String> {
            self.uploads.lock().unwrap().clone()
        }
    }

    fn collect_files(root: &Path, dir: &Path, out: &mut Vec<String>) {
        for entry in std::fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                collect_files(root, &path, out);
            } else {
                let rel = path.strip_prefix(root).unwrap();
                out.push(rel.to_string_lossy().into_owned());
            }
        }
    }

    #[async_trait]
    impl ObjectStore for FakeStore {
        async fn download(&self, _bucket: &str, _key: &str, dest: &Path) -> WorkerResult<()> {
            if self.fail_download {
                return Err(WorkerError::download_failed("connection reset"));
            }
            tokio::fs::write(dest, b"source").await?;
            Ok(())
        }

        async fn upload_tree(&self, dir: &Path, _bucket: &str, prefix: &str) -> WorkerResult<u32> {
            let mut files = Vec::new();
            collect_files(dir, dir, &mut files);
            files.sort();

            let mut uploads = self.uploads.lock().unwrap();
            if self.fail_upload {
                // First file goes through before the transfer dies.
                if let Some(first) = files.first() {
                    uploads.push(format!("{}/{}", prefix, first));
                }
                return Err(WorkerError::upload_failed("socket closed"));
            }
            let count = files.len() as u32;
            for file in files {
                uploads.push(format!("{}/{}", prefix, file));
            }
            Ok(count)
        }
    }

    #[derive(Default)]
    struct FakeEncoder {
        fail: bool,
    }

    #[async_trait]
    impl Encoder for FakeEncoder {
        async fn transcode(&self, _input: &Path, output_dir: &Path) -> WorkerResult<()> {
            if self.fail {
                return Err(WorkerError::transcode_failed("unsupported pixel format"));
            }
            tokio::fs::create_dir_all(output_dir.join("0")).await?;
            tokio::fs::write(output_dir.join("master.m3u8"), b"#EXTM3U").await?;
            tokio::fs::write(output_dir.join("0").join("segment_000.ts"), b"ts").await?;
            Ok(())
        }

        async fn probe_duration(&self, _input: &Path) -> Option<i32> {
            Some(120)
        }
    }

    #[derive(Default)]
    struct FakeSink {
        updates: Mutex<Vec<MetadataUpdate>>,
        fail_on: HashSet<VideoStatus>,
    }

    impl FakeSink {
        fn failing_on(statuses: impl IntoIterator<Item = VideoStatus>) -> Self {
            Self {
                updates: Mutex::new(Vec::new()),
                fail_on: statuses.into_iter().collect(),
            }
        }

        fn statuses(&self) -> Vec<VideoStatus> {
            self.updates.lock().unwrap().iter().map(|u| u.status).collect()
        }

        fn last_update(&self) -> MetadataUpdate {
            self.updates.lock().unwrap().last().unwrap().clone()
        }
    }

    #[async_trait]
    impl StatusSink for FakeSink {
        async fn update(&self, _video_id: &str, update: &MetadataUpdate) -> WorkerResult<()> {
            self.updates.lock().unwrap().push(update.clone());
            if self.fail_on.contains(&update.status) {
                return Err(WorkerError::StatusSyncFailed("503".into()));
            }
            Ok(())
        }
    }

    struct Harness {
        store: Arc<FakeStore>,
        sink: Arc<FakeSink>,
        pipeline: TranscodePipeline<Arc<FakeStore>, Arc<FakeEncoder>, Arc<FakeSink>>,
        work_root: tempfile::TempDir,
    }

    fn harness(store: FakeStore, encoder: FakeEncoder, sink: FakeSink) -> Harness {
        let work_root = tempfile::tempdir().unwrap();
        let store = Arc::new(store);
        let sink = Arc::new(sink);
        let config = WorkerConfig {
            work_dir: work_root.path().to_path_buf(),
            ..WorkerConfig::default()
        };
        let pipeline = TranscodePipeline::new(
            Arc::clone(&store),
            Arc::new(encoder),
            Arc::clone(&sink),
            config,
        );
        Harness {
            store,
            sink,
            pipeline,
            work_root,
        }
    }

    fn job() -> JobDescriptor {
        JobDescriptor::new("media", "u1/v42/source.mp4", 104857600).unwrap()
    }

    fn workspace_entries(root: &Path) -> Vec<PathBuf> {
        std::fs::read_dir(root)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect()
    }

    #[tokio::test]
    async fn test_success_walks_uploaded_processing_ready() {
        let h = harness(FakeStore::default(), FakeEncoder::default(), FakeSink::default());

        h.pipeline.process(&job()).await.unwrap();

        assert_eq!(
            h.sink.statuses(),
            vec![VideoStatus::Uploaded, VideoStatus::Processing, VideoStatus::Ready]
        );
        let ready = h.sink.last_update();
        assert_eq!(ready.duration_sec, Some(120));
        assert_eq!(ready.title.as_deref(), Some("source"));
        assert_eq!(ready.user_id, "u1");

        let keys = h.store.uploaded_keys();
        assert!(keys.contains(&"u1/v42/master.m3u8".to_string()));
        assert!(keys.contains(&"u1/v42/0/segment_000.ts".to_string()));
        assert!(workspace_entries(h.work_root.path()).is_empty());
    }

    #[tokio::test]
    async fn test_encode_failure_records_failed_and_skips_upload() {
        let h = harness(
            FakeStore::default(),
            FakeEncoder { fail: true },
            FakeSink::default(),
        );

        let err = h.pipeline.process(&job()).await.unwrap_err();

        assert!(matches!(err, WorkerError::TranscodeFailed(_)));
        assert!(!err.leaves_message_for_redelivery());
        assert_eq!(
            h.sink.statuses(),
            vec![VideoStatus::Uploaded, VideoStatus::Processing, VideoStatus::Failed]
        );
        assert!(h.store.uploaded_keys().is_empty());
        assert!(workspace_entries(h.work_root.path()).is_empty());
    }

    #[tokio::test]
    async fn test_partial_upload_failure_records_failed() {
        let h = harness(
            FakeStore {
                fail_upload: true,
                ..FakeStore::default()
            },
            FakeEncoder::default(),
            FakeSink::default(),
        );

        let err = h.pipeline.process(&job()).await.unwrap_err();

        assert!(matches!(err, WorkerError::UploadFailed(_)));
        // Some files were already uploaded, but the outcome is FAILED.
        assert!(!h.store.uploaded_keys().is_empty());
        assert_eq!(h.sink.statuses().last(), Some(&VideoStatus::Failed));
    }

    #[tokio::test]
    async fn test_download_failure_leaves_message_and_skips_processing() {
        let h = harness(
            FakeStore {
                fail_download: true,
                ..FakeStore::default()
            },
            FakeEncoder::default(),
            FakeSink::default(),
        );

        let err = h.pipeline.process(&job()).await.unwrap_err();

        assert!(matches!(err, WorkerError::DownloadFailed(_)));
        assert!(err.leaves_message_for_redelivery());
        // No PROCESSING transition after a failed fetch.
        assert_eq!(h.sink.statuses(), vec![VideoStatus::Uploaded]);
        assert!(workspace_entries(h.work_root.path()).is_empty());
    }

    #[tokio::test]
    async fn test_early_status_sync_failures_do_not_abort() {
        let h = harness(
            FakeStore::default(),
            FakeEncoder::default(),
            FakeSink::failing_on([VideoStatus::Uploaded, VideoStatus::Processing]),
        );

        h.pipeline.process(&job()).await.unwrap();
        assert_eq!(h.sink.statuses().last(), Some(&VideoStatus::Ready));
        assert!(!h.store.uploaded_keys().is_empty());
    }

    #[tokio::test]
    async fn test_ready_sync_failure_is_surfaced_after_publish() {
        let h = harness(
            FakeStore::default(),
            FakeEncoder::default(),
            FakeSink::failing_on([VideoStatus::Ready]),
        );

        let err = h.pipeline.process(&job()).await.unwrap_err();

        assert!(matches!(err, WorkerError::StatusSyncFailed(_)));
        // The rendition set is published; the message is still acknowledged.
        assert!(!err.leaves_message_for_redelivery());
        assert!(!h.store.uploaded_keys().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_delivery_is_idempotent() {
        let h = harness(FakeStore::default(), FakeEncoder::default(), FakeSink::default());

        h.pipeline.process(&job()).await.unwrap();
        let first: HashSet<String> = h.store.uploaded_keys().into_iter().collect();
        h.store.uploads.lock().unwrap().clear();

        h.pipeline.process(&job()).await.unwrap();
        let second: HashSet<String> = h.store.uploaded_keys().into_iter().collect();

        assert_eq!(first, second);
        assert_eq!(h.sink.statuses().last(), Some(&VideoStatus::Ready));
    }
}
