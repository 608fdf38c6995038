//! Integration tests for the catalog, config, grade and statistics APIs.

mod common;

use common::{client, TestHarness};
use cr_core::ViewerId;
use serde_json::{json, Value};

#[tokio::test]
async fn health_reports_ok() {
    let (_h, addr) = TestHarness::with_server().await;
    let body: Value = reqwest::get(format!("http://{addr}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert!(body["uptime_secs"].is_u64());
}

#[tokio::test]
async fn responses_carry_request_id() {
    let (_h, addr) = TestHarness::with_server().await;
    let resp = client()
        .get(format!("http://{addr}/health"))
        .header("x-request-id", "trace-me")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.headers()["x-request-id"], "trace-me");
}

#[tokio::test]
async fn client_config_lists_grades_and_key_requirements() {
    let (_h, addr) = TestHarness::with_server_config(|c| {
        c.grades.access_tokens.insert("Grade 8".into(), "owl".into());
        c.playback.refresh_interval_ms = 30_000;
    })
    .await;

    let body: Value = reqwest::get(format!("http://{addr}/api/config"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["refreshIntervalMs"], 30_000);
    assert_eq!(body["storageDriver"], "local");
    assert_eq!(body["allowSeek"], false);

    let grades = body["grades"].as_array().unwrap();
    assert_eq!(grades.len(), 3);
    assert_eq!(grades[1], json!({"name": "Grade 8", "requiresAccessKey": true}));
    assert_eq!(grades[0]["requiresAccessKey"], false);
}

#[tokio::test]
async fn list_videos_filters_by_grade() {
    let (h, addr) = TestHarness::with_server().await;
    let seven = h.add_local_video("seven.mp4", b"7", Some("Grade 7"));
    h.add_local_video("eight.mp4", b"8", Some("Grade 8"));
    h.add_local_video("open.mp4", b"o", None);

    let all: Vec<Value> = reqwest::get(format!("http://{addr}/api/videos"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all.len(), 3);

    let filtered: Vec<Value> = reqwest::get(format!("http://{addr}/api/videos?grade=Grade%207"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0]["id"], seven.id.to_string());
    assert_eq!(
        filtered[0]["streamPath"],
        format!("/api/videos/{}/stream?grade=Grade%207", seven.id)
    );
}

#[tokio::test]
async fn get_video_by_id() {
    let (h, addr) = TestHarness::with_server().await;
    let video = h.add_local_video("one.mp4", b"1", None);

    let resp = reqwest::get(format!("http://{addr}/api/videos/{}", video.id))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["storageType"], "local");
    assert_eq!(body["views"], 0);

    let missing = reqwest::get(format!("http://{addr}/api/videos/{}", cr_core::VideoId::new()))
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);
    let request_id = missing.headers()["x-request-id"].to_str().unwrap().to_string();
    let err: Value = missing.json().await.unwrap();
    assert_eq!(err["code"], "not_found");
    assert_eq!(err["request_id"], request_id);
}

#[tokio::test]
async fn grade_update_requires_admin_and_takes_effect_immediately() {
    let (h, addr) = TestHarness::with_server().await;
    let video = h.add_local_video("ten.mp4", b"10", Some("Grade 10"));
    let stream = format!("http://{addr}/api/videos/{}/stream?grade=Grade%2010", video.id);

    // Grade 10 is not in the default list.
    assert_eq!(client().get(&stream).send().await.unwrap().status(), 403);

    let url = format!("http://{addr}/api/grades");
    let body = json!({"grades": ["Grade 9", " Grade 10 ", ""]});

    let anon = client().put(&url).json(&body).send().await.unwrap();
    assert_eq!(anon.status(), 401);

    let student = client()
        .put(&url)
        .bearer_auth(h.student_token(ViewerId::new()))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(student.status(), 403);

    let admin = client()
        .put(&url)
        .bearer_auth(h.admin_token())
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(admin.status(), 200);
    let stored: Value = admin.json().await.unwrap();
    assert_eq!(stored["grades"], json!(["Grade 9", "Grade 10"]));

    let listed: Value = reqwest::get(&url).await.unwrap().json().await.unwrap();
    assert_eq!(listed["grades"], json!(["Grade 9", "Grade 10"]));

    // The cache was invalidated, so the new grade is allowed right away.
    assert_eq!(client().get(&stream).send().await.unwrap().status(), 200);
}

#[tokio::test]
async fn empty_grade_list_is_rejected() {
    let (h, addr) = TestHarness::with_server().await;
    let resp = client()
        .put(format!("http://{addr}/api/grades"))
        .bearer_auth(h.admin_token())
        .json(&json!({"grades": ["  "]}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn view_stats_aggregate_sessions() {
    let (h, addr) = TestHarness::with_server().await;
    let video = h.add_local_video("stats.mp4", b"s", None);
    let viewer = ViewerId::new();
    let token = h.student_token(viewer);

    for body in [
        json!({"watchedTime": 40, "totalDuration": 100, "isNewView": true}),
        json!({"watchedTime": 96, "totalDuration": 100, "isNewView": true}),
    ] {
        let resp = client()
            .post(format!("http://{addr}/api/videos/{}/view", video.id))
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    let anon = client()
        .get(format!("http://{addr}/api/view-stats"))
        .send()
        .await
        .unwrap();
    assert_eq!(anon.status(), 401);

    let stats: Value = client()
        .get(format!("http://{addr}/api/view-stats"))
        .bearer_auth(h.admin_token())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let entries = stats["statistics"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["viewerId"], viewer.to_string());
    assert_eq!(entries[0]["viewCount"], 2);
    assert_eq!(entries[0]["maxWatchedTime"], 96);
    assert_eq!(entries[0]["isCompleted"], true);
    assert_eq!(entries[0]["video"]["originalName"], "stats.mp4");

    let by_viewer: Value = client()
        .get(format!("http://{addr}/api/view-stats/by-viewer/{viewer}"))
        .bearer_auth(h.admin_token())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(by_viewer["records"].as_array().unwrap().len(), 2);
    assert_eq!(by_viewer["records"][0]["video"]["id"], video.id.to_string());

    let by_video: Value = client()
        .get(format!("http://{addr}/api/view-stats/by-video/{}", video.id))
        .bearer_auth(h.admin_token())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(by_video["video"]["originalName"], "stats.mp4");
    assert_eq!(by_video["records"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn student_cannot_read_view_stats() {
    let (h, addr) = TestHarness::with_server().await;
    let resp = client()
        .get(format!("http://{addr}/api/view-stats"))
        .bearer_auth(h.student_token(ViewerId::new()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}
