//! Storage collaborator for the range-serving component.
//!
//! Local videos live under `server.upload_dir`, named by their stored name.
//! Remote videos are served by redirecting the client to a URL produced by a
//! [`RemoteUrlResolver`]: a public base URL when one is known, otherwise a
//! time-limited signed URL.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use cr_core::config::RemoteStorageConfig;
use cr_core::{Error, Result};
use cr_store::models::{StorageDescriptor, Video};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Produces a client-reachable URL for a remote object.
#[async_trait]
pub trait RemoteUrlResolver: Send + Sync {
    async fn stream_url(&self, video: &Video) -> Result<String>;
}

/// Where a video's bytes can be read from.
pub struct VideoStorage {
    upload_dir: PathBuf,
    remote: Arc<dyn RemoteUrlResolver>,
}

impl std::fmt::Debug for VideoStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoStorage")
            .field("upload_dir", &self.upload_dir)
            .finish_non_exhaustive()
    }
}

impl VideoStorage {
    pub fn new(upload_dir: impl Into<PathBuf>, remote: Arc<dyn RemoteUrlResolver>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            remote,
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Path of a local video's bytes, or `None` when the video has no usable
    /// stored name.
    ///
    /// Names containing a path separator or `..` never resolve.
    pub fn resolve_local_path(&self, video: &Video) -> Option<PathBuf> {
        if video.is_remote() {
            return None;
        }
        let name = video.stored_name.as_deref()?.trim();
        if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
            return None;
        }
        Some(self.upload_dir.join(name))
    }

    pub fn is_remote_backed(&self, video: &Video) -> bool {
        video.is_remote()
    }

    pub async fn remote_stream_url(&self, video: &Video) -> Result<String> {
        self.remote.stream_url(video).await
    }
}

/// Resolver that builds public or signed URLs locally, without a network
/// round trip.
#[derive(Debug, Clone)]
pub struct SignedUrlResolver {
    config: RemoteStorageConfig,
}

impl SignedUrlResolver {
    pub fn new(config: RemoteStorageConfig) -> Self {
        Self { config }
    }

    fn host(&self, bucket: &str, region: &str) -> String {
        let endpoint = self.config.endpoint.trim().trim_end_matches('/');
        if endpoint.is_empty() {
            format!("https://{bucket}.{region}.aliyuncs.com")
        } else if endpoint.contains("://") {
            endpoint.to_string()
        } else {
            format!("https://{bucket}.{endpoint}")
        }
    }

    fn sign(&self, bucket: &str, key: &str, expires: i64) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(self.config.access_key_secret.as_bytes())
            .map_err(|e| Error::Internal(format!("invalid remote storage secret: {e}")))?;
        mac.update(format!("GET\n{expires}\n/{bucket}/{key}").as_bytes());
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }

    /// Build the URL for `key`, signed to expire `signed_url_expires_secs`
    /// after `now`.
    pub fn build_url(
        &self,
        key: &str,
        bucket: &str,
        region: &str,
        base_url: Option<&str>,
        now: i64,
    ) -> Result<String> {
        let base = base_url
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .or_else(|| Some(self.config.base_url.trim()).filter(|b| !b.is_empty()));
        if let Some(base) = base {
            return Ok(format!("{}/{}", base.trim_end_matches('/'), encode_key(key)));
        }

        if self.config.access_key_id.is_empty() || self.config.access_key_secret.is_empty() {
            return Err(Error::Internal(
                "remote storage credentials are not configured".into(),
            ));
        }
        let bucket = Some(bucket)
            .filter(|b| !b.is_empty())
            .unwrap_or(self.config.bucket.as_str());
        let region = Some(region)
            .filter(|r| !r.is_empty())
            .unwrap_or(self.config.region.as_str());
        if bucket.is_empty() {
            return Err(Error::Internal("remote storage bucket is not configured".into()));
        }

        let expires = now + self.config.signed_url_expires_secs as i64;
        let signature = self.sign(bucket, key, expires)?;
        Ok(format!(
            "{}/{}?Expires={expires}&AccessKeyId={}&Signature={}",
            self.host(bucket, region),
            encode_key(key),
            urlencoding::encode(&self.config.access_key_id),
            urlencoding::encode(&signature),
        ))
    }
}

/// Percent-encode each path segment of an object key, keeping the slashes.
fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[async_trait]
impl RemoteUrlResolver for SignedUrlResolver {
    async fn stream_url(&self, video: &Video) -> Result<String> {
        let StorageDescriptor::Remote {
            object_key,
            bucket,
            region,
            base_url,
        } = &video.storage
        else {
            return Err(Error::Internal(format!("video {} is not remote-backed", video.id)));
        };
        let key = object_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::Internal(format!("remote video {} has no object key", video.id)))?;

        self.build_url(key, bucket, region, base_url.as_deref(), Utc::now().timestamp())
    }
}
