//! Shared harness for the behavior tests: a scripted HTTP transport plus
//! zip fixtures shaped like the service's archives.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::io::Write;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub use tickvault_core::{
    ArchiveDownloader, ArchivePeriod, CancelToken, DataCategory, DownloadError, DownloadRequest,
    FetchErrorKind, Granularity, HttpClient, HttpError, HttpRequest, HttpResponse, MarketSegment,
    RetryConfig, Symbol,
};

/// Build a zip archive holding one CSV entry, the way the service packages
/// every archive.
pub fn zip_archive(csv: &str) -> Vec<u8> {
    let cursor = std::io::Cursor::new(Vec::new());
    let mut writer = ZipWriter::new(cursor);
    writer
        .start_file("data.csv", SimpleFileOptions::default())
        .expect("zip entry");
    writer.write_all(csv.as_bytes()).expect("zip body");
    writer.finish().expect("zip finish").into_inner()
}

/// A trades archive with one row per `(id, timestamp_ms)` pair.
pub fn trades_archive(rows: &[(u64, i64)]) -> Vec<u8> {
    let csv: String = rows
        .iter()
        .map(|(id, ts)| format!("{id},26.63000000,1.19000000,31.68970000,{ts},true\n"))
        .collect();
    zip_archive(&csv)
}

/// Archive URL for a USD-futures daily trades file under the default host.
pub fn trades_url(symbol: &str, day: &str) -> String {
    format!(
        "https://data.binance.vision/data/futures/um/daily/trades/{symbol}/{symbol}-trades-{day}.zip"
    )
}

#[derive(Clone)]
struct ScriptedReply {
    delay: Option<Duration>,
    outcome: Result<HttpResponse, HttpError>,
}

/// Scripted transport: replies queue per URL and are consumed in order,
/// with the final reply repeating. URLs with no script answer 404, matching
/// how the service answers for unpublished days.
#[derive(Default)]
pub struct ScriptedArchiveClient {
    scripts: Mutex<HashMap<String, VecDeque<ScriptedReply>>>,
    requests: AtomicUsize,
}

impl ScriptedArchiveClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, url: impl Into<String>, status: u16, body: Vec<u8>) {
        self.push(url.into(), None, Ok(HttpResponse { status, body }));
    }

    pub fn script_with_delay(
        &self,
        url: impl Into<String>,
        status: u16,
        body: Vec<u8>,
        delay: Duration,
    ) {
        self.push(url.into(), Some(delay), Ok(HttpResponse { status, body }));
    }

    pub fn script_error(&self, url: impl Into<String>, error: HttpError) {
        self.push(url.into(), None, Err(error));
    }

    /// Total requests served, retries included.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn push(&self, url: String, delay: Option<Duration>, outcome: Result<HttpResponse, HttpError>) {
        let mut scripts = self
            .scripts
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        scripts
            .entry(url)
            .or_default()
            .push_back(ScriptedReply { delay, outcome });
    }

    fn next_reply(&self, url: &str) -> Option<ScriptedReply> {
        let mut scripts = self
            .scripts
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        let queue = scripts.get_mut(url)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

impl HttpClient for ScriptedArchiveClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        Box::pin(async move {
            self.requests.fetch_add(1, Ordering::SeqCst);
            match self.next_reply(&request.url) {
                Some(reply) => {
                    if let Some(delay) = reply.delay {
                        tokio::time::sleep(delay).await;
                    }
                    reply.outcome
                }
                None => Ok(HttpResponse::status(404)),
            }
        })
    }
}
