//! Video catalog operations.

use std::path::Path;

use chrono::Utc;
use cr_core::{Result, VideoId};

use crate::collection::JsonCollection;
use crate::models::Video;

/// File name of the catalog inside the data directory.
pub const VIDEOS_FILE: &str = "videos.json";

/// Read/write access to the per-video aggregate records.
pub trait VideoCatalog: Send + Sync {
    /// Every video, in upload order.
    fn list(&self) -> Result<Vec<Video>>;

    fn get(&self, id: VideoId) -> Result<Option<Video>>;

    fn insert(&self, video: Video) -> Result<Video>;

    /// Add one counted view and stamp the last-viewed time.
    ///
    /// Returns `None` when the video does not exist.
    fn increment_view_counter(&self, id: VideoId) -> Result<Option<Video>>;

    /// Stamp the last-viewed time without counting a view.
    fn touch_last_viewed(&self, id: VideoId) -> Result<Option<Video>>;
}

/// [`VideoCatalog`] backed by `videos.json`.
#[derive(Debug, Clone)]
pub struct JsonVideoCatalog {
    collection: JsonCollection<Video>,
}

impl JsonVideoCatalog {
    pub fn open(data_dir: &Path) -> Self {
        Self {
            collection: JsonCollection::open(data_dir.join(VIDEOS_FILE)),
        }
    }

    fn modify(&self, id: VideoId, f: impl FnOnce(&mut Video)) -> Result<Option<Video>> {
        self.collection.update(|videos| {
            Ok(videos.iter_mut().find(|v| v.id == id).map(|video| {
                f(video);
                video.clone()
            }))
        })
    }
}

impl VideoCatalog for JsonVideoCatalog {
    fn list(&self) -> Result<Vec<Video>> {
        self.collection.read_all()
    }

    fn get(&self, id: VideoId) -> Result<Option<Video>> {
        Ok(self.collection.read_all()?.into_iter().find(|v| v.id == id))
    }

    fn insert(&self, video: Video) -> Result<Video> {
        self.collection.update(|videos| {
            videos.push(video.clone());
            Ok(())
        })?;
        tracing::debug!(video_id = %video.id, "Video added to catalog");
        Ok(video)
    }

    fn increment_view_counter(&self, id: VideoId) -> Result<Option<Video>> {
        self.modify(id, |video| {
            video.views += 1;
            video.last_viewed_at = Some(Utc::now());
        })
    }

    fn touch_last_viewed(&self, id: VideoId) -> Result<Option<Video>> {
        self.modify(id, |video| {
            video.last_viewed_at = Some(Utc::now());
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> (tempfile::TempDir, JsonVideoCatalog) {
        let dir = tempfile::tempdir().unwrap();
        let catalog = JsonVideoCatalog::open(dir.path());
        (dir, catalog)
    }

    #[test]
    fn insert_and_get() {
        let (_dir, catalog) = catalog();
        let video = catalog
            .insert(Video::new_local("a.mp4", "1-a.mp4", "video/mp4", 100, Some("Grade 7".into())))
            .unwrap();

        let fetched = catalog.get(video.id).unwrap().unwrap();
        assert_eq!(fetched, video);
        assert_eq!(catalog.list().unwrap().len(), 1);
    }

    #[test]
    fn get_missing_is_none() {
        let (_dir, catalog) = catalog();
        assert!(catalog.get(VideoId::new()).unwrap().is_none());
    }

    #[test]
    fn increment_counts_and_stamps() {
        let (_dir, catalog) = catalog();
        let video = catalog
            .insert(Video::new_local("a.mp4", "1-a.mp4", "video/mp4", 100, None))
            .unwrap();

        catalog.increment_view_counter(video.id).unwrap();
        let updated = catalog.increment_view_counter(video.id).unwrap().unwrap();
        assert_eq!(updated.views, 2);
        assert!(updated.last_viewed_at.is_some());
    }

    #[test]
    fn touch_does_not_count() {
        let (_dir, catalog) = catalog();
        let video = catalog
            .insert(Video::new_local("a.mp4", "1-a.mp4", "video/mp4", 100, None))
            .unwrap();

        let touched = catalog.touch_last_viewed(video.id).unwrap().unwrap();
        assert_eq!(touched.views, 0);
        assert!(touched.last_viewed_at.is_some());
        assert_eq!(touched.original_name, video.original_name);
        assert_eq!(touched.size, video.size);
    }

    #[test]
    fn increment_missing_is_none() {
        let (_dir, catalog) = catalog();
        assert!(catalog.increment_view_counter(VideoId::new()).unwrap().is_none());
    }
}
