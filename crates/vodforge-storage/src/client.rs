//! S3 client implementation.

use std::path::Path;

use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};

/// Configuration for the object store client.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// AWS region
    pub region: String,
    /// Optional custom endpoint (S3-compatible stores); enables path-style addressing
    pub endpoint_url: Option<String>,
    /// Optional static access key ID (falls back to the default provider chain)
    pub access_key_id: Option<String>,
    /// Optional static secret access key
    pub secret_access_key: Option<String>,
}

impl StorageConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            region: std::env::var("AWS_REGION").unwrap_or_else(|_| "ap-south-1".to_string()),
            endpoint_url: std::env::var("S3_ENDPOINT_URL").ok(),
            access_key_id: std::env::var("AWS_ACCESS_KEY_ID").ok(),
            secret_access_key: std::env::var("AWS_SECRET_ACCESS_KEY").ok(),
        }
    }
}

/// Object store client for source downloads and rendition uploads.
#[derive(Clone)]
pub struct ObjectStoreClient {
    client: Client,
}

impl ObjectStoreClient {
    /// Create a new client from configuration.
    pub async fn new(config: StorageConfig) -> StorageResult<Self> {
        let base = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        let mut builder = Builder::from(&base);

        if let Some(endpoint) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        if let (Some(id), Some(secret)) = (&config.access_key_id, &config.secret_access_key) {
            builder =
                builder.credentials_provider(Credentials::new(id, secret, None, None, "static"));
        }

        Ok(Self {
            client: Client::from_conf(builder.build()),
        })
    }

    /// Create from environment variables.
    pub async fn from_env() -> StorageResult<Self> {
        Self::new(StorageConfig::from_env()).await
    }

    /// Download an object to a local file, creating parent directories.
    pub async fn download_file(
        &self,
        bucket: &str,
        key: &str,
        path: impl AsRef<Path>,
    ) -> StorageResult<()> {
        let path = path.as_ref();
        debug!("Downloading s3://{}/{} to {}", bucket, key, path.display());

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.to_string().contains("NoSuchKey") {
                    StorageError::not_found(key)
                } else {
                    StorageError::download_failed(e.to_string())
                }
            })?;

        let mut file = tokio::fs::File::create(path).await?;
        let mut body = response.body.into_async_read();
        tokio::io::copy(&mut body, &mut file)
            .await
            .map_err(|e| StorageError::download_failed(e.to_string()))?;
        file.flush().await?;

        info!("Downloaded s3://{}/{} to {}", bucket, key, path.display());
        Ok(())
    }

    /// Upload a single file.
    pub async fn upload_file(
        &self,
        path: impl AsRef<Path>,
        bucket: &str,
        key: &str,
    ) -> StorageResult<()> {
        let path = path.as_ref();
        debug!("Uploading {} to s3://{}/{}", path.display(), bucket, key);

        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .content_type(content_type_for(path))
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        Ok(())
    }

    /// Upload every regular file under a directory, preserving relative
    /// paths under the given key prefix.
    pub async fn upload_dir(
        &self,
        dir: impl AsRef<Path>,
        bucket: &str,
        prefix: &str,
    ) -> StorageResult<u32> {
        let dir = dir.as_ref();
        let mut uploaded = 0u32;
        let mut stack = vec![dir.to_path_buf()];

        while let Some(current) = stack.pop() {
            let mut entries = tokio::fs::read_dir(&current).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                let file_type = entry.file_type().await?;
                if file_type.is_dir() {
                    stack.push(path);
                } else if file_type.is_file() {
                    let key = relative_key(dir, &path, prefix)?;
                    self.upload_file(&path, bucket, &key).await?;
                    uploaded += 1;
                }
            }
        }

        info!("Uploaded {} files from {} to s3://{}/{}", uploaded, dir.display(), bucket, prefix);
        Ok(uploaded)
    }
}

/// Build the object key for a file under `root`, preserving its relative
/// path beneath `prefix`.
fn relative_key(root: &Path, path: &Path, prefix: &str) -> StorageResult<String> {
    let rel = path
        .strip_prefix(root)
        .map_err(|e| StorageError::upload_failed(e.to_string()))?;
    let rel: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(format!("{}/{}", prefix.trim_end_matches('/'), rel.join("/")))
}

/// Content type for streaming media files, by extension.
fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("m3u8") => "application/vnd.apple.mpegurl",
        Some("mpd") => "application/dash+xml",
        Some("ts") => "video/mp2t",
        Some("m4s") => "video/iso.segment",
        Some("mp4") => "video/mp4",
        Some("aac") => "audio/aac",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_content_type_mapping() {
        assert_eq!(
            content_type_for(Path::new("out/master.m3u8")),
            "application/vnd.apple.mpegurl"
        );
        assert_eq!(content_type_for(Path::new("manifest.mpd")), "application/dash+xml");
        assert_eq!(content_type_for(Path::new("0/segment_001.ts")), "video/mp2t");
        assert_eq!(content_type_for(Path::new("chunk.m4s")), "video/iso.segment");
        assert_eq!(content_type_for(Path::new("thumb.jpg")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("mystery")), "application/octet-stream");
    }

    #[test]
    fn test_relative_key_preserves_nested_paths() {
        let root = PathBuf::from("/tmp/job/output");
        let path = root.join("1").join("segment_003.ts");
        let key = relative_key(&root, &path, "u1/v42").unwrap();
        assert_eq!(key, "u1/v42/1/segment_003.ts");
    }

    #[test]
    fn test_relative_key_trims_trailing_slash() {
        let root = PathBuf::from("/out");
        let path = root.join("master.m3u8");
        let key = relative_key(&root, &path, "u1/v42/").unwrap();
        assert_eq!(key, "u1/v42/master.m3u8");
    }
}
