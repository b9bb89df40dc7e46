//! Shared fakes and fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use post_archiver::fetcher::{
    Credentials, FetcherError, FetcherResult, MediaFetcher, PageCursor, PlatformApi,
    RawFeedPage, RawItemDetail, RawStatus, Session,
};
use post_archiver::output::{ArchiveSink, OutputResult};
use post_archiver::{MediaKind, Post};
use serde_json::{json, Value};
use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Raw image item
pub fn image_item(id: &str, taken_at: i64) -> Value {
    json!({
        "id": id,
        "code": format!("C{id}"),
        "media_type": 1,
        "taken_at": taken_at,
        "caption": { "text": format!("post {id} #archive") },
        "like_count": 10,
        "comment_count": 2,
        "image_versions2": {
            "candidates": [
                { "url": format!("https://cdn.example.com/{id}.jpg"), "width": 1080, "height": 1350 },
                { "url": format!("https://cdn.example.com/{id}_small.jpg"), "width": 320, "height": 400 }
            ]
        }
    })
}

/// Raw video item
pub fn video_item(id: &str, taken_at: i64) -> Value {
    json!({
        "id": id,
        "code": format!("V{id}"),
        "media_type": 2,
        "taken_at": taken_at,
        "caption": null,
        "video_versions": [
            { "url": format!("https://cdn.example.com/{id}.mp4"), "width": 720, "height": 1280 }
        ],
        "image_versions2": {
            "candidates": [{ "url": format!("https://cdn.example.com/{id}_cover.jpg") }]
        }
    })
}

/// Raw carousel item with one image child and one video child
pub fn carousel_item(id: &str, taken_at: i64) -> Value {
    json!({
        "id": id,
        "code": format!("A{id}"),
        "media_type": 8,
        "taken_at": taken_at,
        "location": { "pk": 777, "name": "Harbour", "lat": 59.9, "lng": 10.7 },
        "carousel_media": [
            {
                "id": format!("{id}c0"),
                "media_type": 1,
                "image_versions2": { "candidates": [{ "url": format!("https://cdn.example.com/{id}_0.jpg") }] }
            },
            {
                "id": format!("{id}c1"),
                "media_type": 2,
                "video_versions": [{ "url": format!("https://cdn.example.com/{id}_1.mp4") }]
            }
        ]
    })
}

/// Feed page from raw items
pub fn feed_page(items: Vec<Value>, next: Option<&str>) -> RawFeedPage {
    serde_json::from_value(json!({
        "items": items,
        "more_available": next.is_some(),
        "next_max_id": next
    }))
    .unwrap()
}

/// Scripted [`PlatformApi`]
#[derive(Default)]
pub struct FakeApi {
    pub pages: Mutex<VecDeque<FetcherResult<RawFeedPage>>>,
    pub detail: Mutex<Option<Value>>,
    pub refuse_archive: HashSet<String>,
    pub break_archive: HashSet<String>,
    pub reject_login: bool,
    pub endless_feed: bool,
    pub cursors: Mutex<Vec<Option<String>>>,
    pub archived: Mutex<Vec<String>>,
    pub detail_requests: Mutex<Vec<String>>,
}

impl FakeApi {
    pub fn with_pages(pages: Vec<FetcherResult<RawFeedPage>>) -> Self {
        Self {
            pages: Mutex::new(pages.into()),
            ..Self::default()
        }
    }
}

#[async_trait]
impl PlatformApi for FakeApi {
    async fn login(&self, credentials: &Credentials) -> FetcherResult<Session> {
        if self.reject_login {
            return Err(FetcherError::AuthError("bad_password".to_string()));
        }
        Ok(Session {
            user_id: "42".to_string(),
            username: credentials.username.clone(),
        })
    }

    async fn get_feed_page(
        &self,
        _session: &Session,
        cursor: Option<&PageCursor>,
    ) -> FetcherResult<RawFeedPage> {
        self.cursors
            .lock()
            .unwrap()
            .push(cursor.map(|c| c.as_str().to_string()));

        if self.endless_feed {
            return Ok(feed_page(Vec::new(), Some("again")));
        }

        self.pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(FetcherError::NetworkError("script exhausted".to_string())))
    }

    async fn get_item_detail(
        &self,
        _session: &Session,
        media_id: &str,
    ) -> FetcherResult<RawItemDetail> {
        self.detail_requests
            .lock()
            .unwrap()
            .push(media_id.to_string());
        let items: Vec<Value> = self.detail.lock().unwrap().iter().cloned().collect();
        Ok(serde_json::from_value(json!({ "items": items })).unwrap())
    }

    async fn set_archived(&self, _session: &Session, media_id: &str) -> FetcherResult<RawStatus> {
        self.archived.lock().unwrap().push(media_id.to_string());
        if self.break_archive.contains(media_id) {
            return Err(FetcherError::NetworkError("connection reset".to_string()));
        }
        if self.refuse_archive.contains(media_id) {
            return Ok(RawStatus {
                status: "fail".to_string(),
                message: Some("media not owned".to_string()),
            });
        }
        Ok(RawStatus {
            status: "ok".to_string(),
            message: None,
        })
    }
}

/// [`MediaFetcher`] returning the URL as the body
#[derive(Default)]
pub struct FakeMedia {
    pub broken: HashSet<String>,
    pub requested: Mutex<Vec<String>>,
}

#[async_trait]
impl MediaFetcher for FakeMedia {
    async fn fetch(&self, url: &str) -> FetcherResult<Bytes> {
        self.requested.lock().unwrap().push(url.to_string());
        if self.broken.contains(url) {
            return Err(FetcherError::HttpError(format!("HTTP 403 Forbidden for {url}")));
        }
        Ok(Bytes::from(url.as_bytes().to_vec()))
    }
}

/// [`ArchiveSink`] that keeps everything in memory
#[derive(Default)]
pub struct MemorySink {
    pub media: Mutex<Vec<(String, usize, MediaKind)>>,
    pub metadata_writes: Mutex<Vec<Vec<Post>>>,
}

#[async_trait]
impl ArchiveSink for MemorySink {
    async fn write_media(
        &self,
        post: &Post,
        index: usize,
        _bytes: &[u8],
        kind: MediaKind,
    ) -> OutputResult<PathBuf> {
        self.media
            .lock()
            .unwrap()
            .push((post.id.clone(), index, kind));
        Ok(PathBuf::from(format!("memory/{}/{index}", post.id)))
    }

    async fn write_metadata(&self, posts: &[Post]) -> OutputResult<()> {
        self.metadata_writes.lock().unwrap().push(posts.to_vec());
        Ok(())
    }
}

/// Canned HTTP response
pub struct CannedResponse {
    pub status: u16,
    pub body: String,
}

impl CannedResponse {
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }

    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }
}

/// Serve `responses` in order, one per connection, and record the raw requests
pub async fn spawn_http_server(
    responses: Vec<CannedResponse>,
) -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));

    let seen = requests.clone();
    tokio::spawn(async move {
        for response in responses {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let request = read_request(&mut socket).await;
            seen.lock().unwrap().push(request);

            let reason = match response.status {
                200 => "OK",
                400 => "Bad Request",
                404 => "Not Found",
                429 => "Too Many Requests",
                500 => "Internal Server Error",
                503 => "Service Unavailable",
                _ => "Unknown",
            };
            let raw = format!(
                "HTTP/1.1 {} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                response.status,
                response.body.len(),
                response.body
            );
            let _ = socket.write_all(raw.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });

    (format!("http://{addr}"), requests)
}

async fn read_request(socket: &mut TcpStream) -> String {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let n = socket.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buffer);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buffer.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }

    String::from_utf8_lossy(&buffer).into_owned()
}
