use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use bytes::Bytes;
use futures::StreamExt;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use inkcut::app::DefaultAppContainer;
use inkcut::domain::errors::PipelineError;
use inkcut::domain::model::*;
use inkcut::http::{router, AppState};
use inkcut::ports::*;

/// Test doubles standing in for yt-dlp, ffmpeg and the search API
mod fakes {
    use super::*;

    #[derive(Clone, Copy, PartialEq)]
    pub enum StreamMode {
        Ok,
        /// One chunk, then never finishes
        Stall,
        /// One chunk, then a classified error
        Fail,
    }

    pub struct FakeResolver {
        pub duration: f64,
        pub mode: StreamMode,
    }

    impl FakeResolver {
        pub fn new(mode: StreamMode) -> Self {
            Self {
                duration: 180.0,
                mode,
            }
        }
    }

    fn option(token: &str, height: Option<u32>, capabilities: Capabilities) -> EncodingOption {
        EncodingOption {
            token: token.to_string(),
            container: if height.is_some() { "mp4" } else { "webm" }.to_string(),
            video_codec: height.map(|_| "avc1".to_string()),
            audio_codec: Some("mp4a".to_string()),
            height,
            audio_bitrate_kbps: Some(128.0),
            total_bitrate_kbps: height.map(|h| h as f64),
            capabilities,
            requires_auth: false,
        }
    }

    #[async_trait]
    impl SourceResolver for FakeResolver {
        async fn resolve(&self, source: &SourceDescriptor) -> Result<MediaMetadata, PipelineError> {
            if source.id() == "missing" {
                return Err(PipelineError::SourceNotFound("Video unavailable".to_string()));
            }
            Ok(MediaMetadata {
                title: "Integration Clip".to_string(),
                duration: self.duration,
                thumbnail: Some("https://i.ytimg.com/vi/abc123/maxresdefault.jpg".to_string()),
                author: "InkCut".to_string(),
                formats: vec![
                    option("18", Some(360), Capabilities::VIDEO | Capabilities::AUDIO),
                    option("22", Some(720), Capabilities::VIDEO | Capabilities::AUDIO),
                    option("140", None, Capabilities::AUDIO),
                ],
            })
        }

        async fn open_stream(
            &self,
            _source: &SourceDescriptor,
            _option: &EncodingOption,
        ) -> Result<ByteStream, PipelineError> {
            let first =
                futures::stream::once(async { Ok::<_, std::io::Error>(Bytes::from_static(b"source bytes")) });
            Ok(match self.mode {
                StreamMode::Ok => first.boxed(),
                StreamMode::Stall => first.chain(futures::stream::pending()).boxed(),
                StreamMode::Fail => first
                    .chain(futures::stream::once(async {
                        Err(PipelineError::AuthRequired("Sign in to confirm your age".to_string()).into_io())
                    }))
                    .boxed(),
            })
        }
    }

    #[derive(Default)]
    pub struct FakeExtractor {
        pub calls: Mutex<Vec<(TrimWindow, ExtractOptions)>>,
        pub fail: bool,
        pub delay: Option<Duration>,
        pub in_flight: AtomicUsize,
        pub max_in_flight: AtomicUsize,
    }

    #[async_trait]
    impl SegmentExtractor for FakeExtractor {
        async fn extract(
            &self,
            input: &Path,
            output: &Path,
            window: &TrimWindow,
            options: &ExtractOptions,
        ) -> Result<(), PipelineError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            self.calls.lock().unwrap().push((*window, *options));
            assert!(input.exists());
            if self.fail {
                return Err(PipelineError::TranscodeFailed("Invalid data found when processing input".to_string()));
            }
            tokio::fs::write(output, b"trimmed media").await.unwrap();
            Ok(())
        }
    }

    pub struct FakeSearch;

    #[async_trait]
    impl VideoSearchPort for FakeSearch {
        async fn search(&self, query: &SearchQuery) -> Result<SearchPage, SearchError> {
            if query.query == "broken" {
                return Err(SearchError::Backend("quotaExceeded".to_string()));
            }
            Ok(SearchPage {
                hits: vec![
                    SearchHit {
                        id: "short1".to_string(),
                        title: "A short".to_string(),
                        thumbnail: None,
                        channel: "Shorts".to_string(),
                        duration_seconds: 30,
                    },
                    SearchHit {
                        id: "long1".to_string(),
                        title: "A talk".to_string(),
                        thumbnail: Some("m.jpg".to_string()),
                        channel: "Talks".to_string(),
                        duration_seconds: 253,
                    },
                ],
                next_page_token: Some("NEXT".to_string()),
                prev_page_token: None,
                total_results: 2,
            })
        }
    }
}

use fakes::*;

struct Harness {
    downloads: TempDir,
    dist: TempDir,
    container: DefaultAppContainer,
    extractor: Arc<FakeExtractor>,
}

impl Harness {
    fn new(mode: StreamMode, extractor: FakeExtractor, max_concurrent_jobs: usize) -> Self {
        let downloads = tempfile::tempdir().unwrap();
        let dist = tempfile::tempdir().unwrap();
        let settings = Arc::new(PipelineSettings {
            downloads_dir: downloads.path().to_path_buf(),
            max_concurrent_jobs,
            verify_output: false,
            ..PipelineSettings::default()
        });
        let extractor = Arc::new(extractor);
        let container = DefaultAppContainer::from_parts(
            Arc::new(FakeResolver::new(mode)),
            extractor.clone(),
            None,
            Arc::new(FakeSearch),
            settings,
        );

        Self {
            downloads,
            dist,
            container,
            extractor,
        }
    }

    fn ok() -> Self {
        Self::new(StreamMode::Ok, FakeExtractor::default(), 0)
    }

    fn router(&self, youtube_api_configured: bool) -> Router {
        router(AppState::new(
            &self.container,
            self.dist.path().to_path_buf(),
            youtube_api_configured,
        ))
    }

    fn files(&self) -> Vec<String> {
        list_files(self.downloads.path())
    }
}

fn list_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Bytes) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body)
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_health() {
    let harness = Harness::ok();
    let (status, body) = get_json(harness.router(false), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["youtubeApiConfigured"], false);
}

#[tokio::test]
async fn test_video_info() {
    let harness = Harness::ok();

    let (status, body) = get_json(harness.router(false), "/api/video/info?videoId=abc123").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "title": "Integration Clip",
            "duration": 180,
            "thumbnail": "https://i.ytimg.com/vi/abc123/maxresdefault.jpg",
            "author": "InkCut"
        })
    );

    let (status, body) = get_json(harness.router(false), "/api/video/info").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Video ID is required");

    let (status, body) = get_json(harness.router(false), "/api/video/info?videoId=missing").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to fetch video information");
    assert_eq!(body["kind"], "SourceNotFound");
    assert!(body["details"].as_str().unwrap().contains("Video unavailable"));
}

#[tokio::test]
async fn test_download_and_fetch_artifact() {
    let harness = Harness::ok();
    let (status, body) = post_json(
        harness.router(false),
        "/api/download",
        json!({"videoId": "abc123", "startTime": 10, "endTime": 40, "quality": "720p", "format": "mp4"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["success"], true);
    assert_eq!(body["fileType"], "mp4");
    assert_eq!(body["message"], "Video segment processed successfully");
    let file_name = body["fileName"].as_str().unwrap().to_string();
    assert!(file_name.starts_with("Integration_Clip_"));
    assert_eq!(body["downloadUrl"], format!("/downloads/{}", file_name));
    assert_eq!(harness.files(), vec![file_name.clone()]);

    let calls = harness.extractor.calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0.duration(), 30.0);
    assert!(!calls[0].1.audio_only);

    let request = Request::builder()
        .uri(format!("/downloads/{}", file_name))
        .body(Body::empty())
        .unwrap();
    let (status, bytes) = send(harness.router(false), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&bytes[..], b"trimmed media");
}

#[tokio::test]
async fn test_download_audio_only() {
    let harness = Harness::ok();
    let (status, body) = post_json(
        harness.router(false),
        "/api/download",
        json!({"videoId": "abc123", "startTime": 0, "endTime": 15, "audioOnly": true}),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["fileType"], "mp3");
    assert_eq!(body["message"], "Audio extracted successfully");
    let calls = harness.extractor.calls.lock().unwrap().clone();
    assert!(calls[0].1.audio_only);
    assert_eq!(calls[0].1.container, Container::Mp3);
}

#[tokio::test]
async fn test_download_rejects_bad_requests() {
    let harness = Harness::ok();

    let (status, body) = post_json(
        harness.router(false),
        "/api/download",
        json!({"videoId": "abc123", "startTime": 10}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "videoId, startTime, and endTime are required");

    let (status, body) = post_json(
        harness.router(false),
        "/api/download",
        json!({"videoId": "abc123", "startTime": 40, "endTime": 10}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "ValidationError");

    let (status, body) = post_json(
        harness.router(false),
        "/api/download",
        json!({"videoId": "abc123", "startTime": 170, "endTime": 200}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "ValidationError");

    let request = Request::builder()
        .method("POST")
        .uri("/api/download")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _) = send(harness.router(false), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(harness.files().is_empty());
}

#[tokio::test]
async fn test_download_failures_leave_no_files() {
    let harness = Harness::new(
        StreamMode::Ok,
        FakeExtractor {
            fail: true,
            ..FakeExtractor::default()
        },
        0,
    );
    let (status, body) = post_json(
        harness.router(false),
        "/api/download",
        json!({"videoId": "abc123", "startTime": 10, "endTime": 40}),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to process media");
    assert_eq!(body["kind"], "TranscodeFailed");
    assert!(harness.files().is_empty());

    let harness = Harness::new(StreamMode::Fail, FakeExtractor::default(), 0);
    let (status, body) = post_json(
        harness.router(false),
        "/api/download",
        json!({"videoId": "abc123", "startTime": 10, "endTime": 40}),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["kind"], "AuthRequired");
    assert!(harness.files().is_empty());
    assert!(harness.extractor.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_cancelled_job_cleans_up() {
    let harness = Harness::new(StreamMode::Stall, FakeExtractor::default(), 0);
    let trim = inkcut::app::AppContainer::trim_interactor(&harness.container);
    let request = TrimRequest::new("abc123", 10.0, 40.0).unwrap();

    let outcome = tokio::time::timeout(Duration::from_millis(200), trim.execute(request)).await;

    assert!(outcome.is_err(), "stalled job should not finish");
    assert!(harness.files().is_empty());
}

#[tokio::test]
async fn test_concurrent_jobs_are_bounded() {
    let harness = Harness::new(
        StreamMode::Ok,
        FakeExtractor {
            delay: Some(Duration::from_millis(30)),
            ..FakeExtractor::default()
        },
        1,
    );
    let trim = inkcut::app::AppContainer::trim_interactor(&harness.container);

    let jobs = (0..4).map(|_| {
        let trim = trim.clone();
        async move {
            trim.execute(TrimRequest::new("abc123", 10.0, 40.0).unwrap())
                .await
        }
    });
    let results = futures::future::join_all(jobs).await;

    assert!(results.iter().all(|r| r.is_ok()));
    assert_eq!(harness.extractor.max_in_flight.load(Ordering::SeqCst), 1);
    assert_eq!(harness.files().len(), 4);
}

#[tokio::test]
async fn test_search() {
    let harness = Harness::ok();

    let (status, body) = get_json(harness.router(true), "/api/search").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Search query is required");

    let (status, body) = get_json(harness.router(false), "/api/search?q=talks").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "YouTube API key not configured");
    assert_eq!(body["message"], "Please add YOUTUBE_API_KEY to your .env file");

    let (status, body) = get_json(harness.router(true), "/api/search?q=talks&maxResults=5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["results"],
        json!([{"id": "long1", "title": "A talk", "thumbnail": "m.jpg", "channel": "Talks", "duration": "4:13"}])
    );
    assert_eq!(body["nextPageToken"], "NEXT");
    assert_eq!(body["totalResults"], 2);

    let (status, body) = get_json(harness.router(true), "/api/search?q=broken").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to search videos");
}

#[tokio::test]
async fn test_player_page() {
    let harness = Harness::ok();

    let request = Request::builder()
        .uri("/api/player/dQw4w9WgXcQ")
        .body(Body::empty())
        .unwrap();
    let response = harness.router(false).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/html"));
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert!(String::from_utf8_lossy(&body).contains("dQw4w9WgXcQ"));

    let (status, _) = get_json(harness.router(false), "/api/player/bad%27id").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_frontend_fallback() {
    let harness = Harness::ok();

    let (status, body) = get_json(harness.router(false), "/editor").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Frontend not found");

    std::fs::write(harness.dist.path().join("index.html"), "<html>inkcut</html>").unwrap();
    std::fs::write(harness.dist.path().join("app.js"), "console.log(1)").unwrap();

    let request = Request::builder().uri("/editor/123").body(Body::empty()).unwrap();
    let (status, body) = send(harness.router(false), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"<html>inkcut</html>");

    let request = Request::builder().uri("/app.js").body(Body::empty()).unwrap();
    let (status, body) = send(harness.router(false), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"console.log(1)");
}

#[test]
fn test_downloads_dir_is_shared_with_state() {
    let harness = Harness::ok();
    let state = AppState::new(&harness.container, PathBuf::from("dist"), false);
    assert_eq!(state.downloads_dir, harness.downloads.path());
}
