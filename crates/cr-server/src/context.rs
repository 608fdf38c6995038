//! Application context shared by every request handler.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::HeaderMap;
use cr_core::config::Config;
use cr_core::{Result, VideoId};
use cr_store::models::Video;
use cr_store::queries::grades::GradeStore;
use cr_store::queries::videos::{JsonVideoCatalog, VideoCatalog};
use cr_store::queries::watch_records::{JsonWatchRecords, WatchRecordLog};

use crate::access::{self, AccessParams};
use crate::grade_cache::GradeCache;
use crate::storage::{SignedUrlResolver, VideoStorage};

/// Handler state. Cheap to clone: every field is an `Arc`.
#[derive(Clone)]
pub struct AppContext {
    /// Immutable configuration snapshot.
    pub config: Arc<Config>,
    pub videos: Arc<dyn VideoCatalog>,
    pub watch_records: Arc<dyn WatchRecordLog>,
    pub grades: Arc<GradeStore>,
    /// Allowed-grade cache; the grade update handler invalidates it.
    pub grade_cache: Arc<GradeCache>,
    pub storage: Arc<VideoStorage>,
    pub started_at: Instant,
}

impl AppContext {
    /// Build the context with JSON-file stores under `config.server.data_dir`.
    pub fn from_config(config: Config) -> Self {
        let data_dir = config.data_dir().to_path_buf();
        let remote = Arc::new(SignedUrlResolver::new(config.storage.remote.clone()));

        Self {
            videos: Arc::new(JsonVideoCatalog::open(&data_dir)),
            watch_records: Arc::new(JsonWatchRecords::open(&data_dir)),
            grades: Arc::new(GradeStore::open(&data_dir, config.grades.defaults.clone())),
            grade_cache: Arc::new(GradeCache::new(Duration::from_millis(
                config.grades.cache_ttl_ms,
            ))),
            storage: Arc::new(VideoStorage::new(config.server.upload_dir.clone(), remote)),
            started_at: Instant::now(),
            config: Arc::new(config),
        }
    }

    /// Look up a video, mapping absence to `NotFound`.
    pub fn require_video(&self, id: VideoId) -> Result<Video> {
        self.videos
            .get(id)?
            .ok_or_else(|| cr_core::Error::not_found("video", id))
    }

    /// Run grade/access gating for `video`.
    pub fn check_access(
        &self,
        video: &Video,
        params: &AccessParams,
        headers: &HeaderMap,
    ) -> Result<()> {
        let allowed = self.grade_cache.allowed(&self.grades);
        access::check(
            video,
            params,
            headers,
            &allowed,
            &self.config.grades.access_tokens,
        )
    }
}
