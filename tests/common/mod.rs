//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`], which builds a full [`AppContext`] over a
//! temporary data and upload directory. [`TestHarness::with_server`] starts
//! Axum on a random port for HTTP-level testing.

#![allow(dead_code)]

use std::net::SocketAddr;

use chrono::{Duration, Utc};
use cr_core::config::Config;
use cr_core::ViewerId;
use cr_server::context::AppContext;
use cr_server::middleware::auth::{issue_token, Role};
use cr_server::router::build_router;
use cr_store::models::{StorageDescriptor, Video};
use tempfile::TempDir;

pub const TOKEN_SECRET: &str = "integration-secret";

/// Test harness wrapping an [`AppContext`] on temporary directories.
pub struct TestHarness {
    pub ctx: AppContext,
    pub dir: TempDir,
}

impl TestHarness {
    /// Harness with default configuration plus a token secret.
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// Harness whose configuration is adjusted by `customize` after the
    /// directories and token secret are filled in.
    pub fn with_config(customize: impl FnOnce(&mut Config)) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let mut config = Config::default();
        config.server.data_dir = dir.path().join("data");
        config.server.upload_dir = dir.path().join("uploads");
        config.auth.token_secret = Some(TOKEN_SECRET.into());
        customize(&mut config);

        std::fs::create_dir_all(&config.server.upload_dir).expect("failed to create upload dir");
        let ctx = AppContext::from_config(config);
        Self { ctx, dir }
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        Self::new().serve().await
    }

    /// Start an Axum server with a customized configuration.
    pub async fn with_server_config(customize: impl FnOnce(&mut Config)) -> (Self, SocketAddr) {
        Self::with_config(customize).serve().await
    }

    pub async fn serve(self) -> (Self, SocketAddr) {
        let app = build_router(self.ctx.clone(), None);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (self, addr)
    }

    /// Write `bytes` into the upload directory and register a local video.
    pub fn add_local_video(&self, stored_name: &str, bytes: &[u8], grade: Option<&str>) -> Video {
        let path = self.ctx.storage.upload_dir().join(stored_name);
        std::fs::write(&path, bytes).expect("failed to write video file");
        self.ctx
            .videos
            .insert(Video::new_local(
                stored_name,
                stored_name,
                "video/mp4",
                bytes.len() as u64,
                grade.map(String::from),
            ))
            .expect("failed to insert video")
    }

    /// Register a remote-backed video.
    pub fn add_remote_video(&self, object_key: Option<&str>, base_url: Option<&str>) -> Video {
        let mut video = Video::new_local("remote.mp4", "unused", "video/mp4", 0, None);
        video.stored_name = None;
        video.storage = StorageDescriptor::Remote {
            object_key: object_key.map(String::from),
            bucket: "clips".into(),
            region: "oss-cn-hangzhou".into(),
            base_url: base_url.map(String::from),
        };
        self.ctx.videos.insert(video).expect("failed to insert video")
    }

    pub fn student_token(&self, viewer: ViewerId) -> String {
        issue_token(
            TOKEN_SECRET,
            &viewer.to_string(),
            Role::Student,
            Duration::hours(1),
            Utc::now(),
        )
        .expect("failed to issue token")
    }

    pub fn admin_token(&self) -> String {
        issue_token(TOKEN_SECRET, "admin", Role::Admin, Duration::hours(1), Utc::now())
            .expect("failed to issue token")
    }
}

/// HTTP client that reports redirects instead of following them.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("failed to build client")
}
