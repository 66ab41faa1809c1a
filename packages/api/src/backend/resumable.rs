//! Client side of the storage platform's resumable-upload protocol.
//!
//! A transfer is a session: created with one POST carrying the object
//! metadata, advanced with fixed-size PATCH chunks, and probed with HEAD to
//! find the committed offset when resuming. The session URL is remembered
//! under a fingerprint of the file+destination pairing so an interrupted
//! transfer continues where it stopped instead of restarting at byte zero.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use super::response_error;
use super::storage::VIDEO_BUCKET;
use crate::config::PublicConfig;
use crate::error::BackendError;

/// Fixed by the storage backend's resumable-upload contract; callers must
/// not vary it.
pub const CHUNK_SIZE: usize = 6 * 1024 * 1024;

/// Protocol version sent with every request of a session.
pub const TUS_VERSION: &str = "1.0.0";

/// Backoff before each chunk attempt, in milliseconds. Exhausting the
/// sequence is a terminal error.
pub const RETRY_DELAYS_MS: [u64; 5] = [0, 3_000, 5_000, 10_000, 20_000];

const CACHE_CONTROL: &str = "3600";

/// A file picked in the browser, fully read into memory.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadSource {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadSource {
    pub fn content_type_or_default(&self) -> &str {
        if self.content_type.is_empty() {
            "video/mp4"
        } else {
            &self.content_type
        }
    }
}

#[async_trait(?Send)]
pub trait ResumableUploader {
    /// Transfer `source` to `object_path` in the video bucket, reporting
    /// `(bytes_sent, bytes_total)` after every committed chunk. The bearer
    /// token must be fetched fresh by the caller.
    async fn upload(
        &self,
        access_token: &str,
        object_path: &str,
        source: &UploadSource,
        on_progress: &mut (dyn FnMut(u64, u64)),
    ) -> Result<(), BackendError>;
}

/// Where fingerprints map to open session URLs. A persistent implementation
/// makes resume survive page reloads; the in-memory one covers a single
/// page lifetime.
#[async_trait(?Send)]
pub trait FingerprintStore {
    async fn get(&self, fingerprint: &str) -> Option<String>;
    async fn set(&self, fingerprint: &str, upload_url: &str);
    async fn remove(&self, fingerprint: &str);
}

#[derive(Default)]
pub struct MemoryFingerprintStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryFingerprintStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait(?Send)]
impl FingerprintStore for MemoryFingerprintStore {
    async fn get(&self, fingerprint: &str) -> Option<String> {
        self.entries
            .lock()
            .expect("fingerprint lock poisoned")
            .get(fingerprint)
            .cloned()
    }

    async fn set(&self, fingerprint: &str, upload_url: &str) {
        self.entries
            .lock()
            .expect("fingerprint lock poisoned")
            .insert(fingerprint.to_string(), upload_url.to_string());
    }

    async fn remove(&self, fingerprint: &str) {
        self.entries
            .lock()
            .expect("fingerprint lock poisoned")
            .remove(fingerprint);
    }
}

/// Stable id for a file+destination pairing, used to match an in-progress
/// session across attempts.
pub fn fingerprint(file_name: &str, byte_len: usize, endpoint: &str, object_key: &str) -> String {
    let mut hasher = Sha256::new();
    for part in [file_name, &byte_len.to_string(), endpoint, object_key] {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    hex::encode(hasher.finalize())
}

fn encode_metadata(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{k} {}", BASE64.encode(v)))
        .collect::<Vec<_>>()
        .join(",")
}

fn chunk_end(offset: usize, total: usize) -> usize {
    (offset + CHUNK_SIZE).min(total)
}

fn parse_offset(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get("Upload-Offset")?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// The session URL comes back in `Location`, sometimes host-relative.
fn resolve_location(endpoint: &str, location: &str) -> String {
    if location.starts_with("http://") || location.starts_with("https://") {
        return location.to_string();
    }
    if let Some(rest) = location.strip_prefix('/') {
        if let Some((scheme, tail)) = endpoint.split_once("://") {
            let authority = tail.split('/').next().unwrap_or(tail);
            return format!("{scheme}://{authority}/{rest}");
        }
    }
    format!("{}/{}", endpoint.trim_end_matches('/'), location)
}

async fn sleep_ms(ms: u64) {
    #[cfg(target_arch = "wasm32")]
    gloo_timers::future::TimeoutFuture::new(ms as u32).await;
    #[cfg(not(target_arch = "wasm32"))]
    tokio::time::sleep(std::time::Duration::from_millis(ms)).await;
}

pub struct TusClient {
    http: reqwest::Client,
    endpoint: String,
    anon_key: String,
    fingerprints: Arc<dyn FingerprintStore>,
}

impl TusClient {
    pub fn new(
        http: reqwest::Client,
        config: &PublicConfig,
        fingerprints: Arc<dyn FingerprintStore>,
    ) -> Self {
        Self {
            http,
            endpoint: config.resumable_endpoint(),
            anon_key: config.anon_key.clone(),
            fingerprints,
        }
    }

    /// HEAD an open session to learn its committed offset. Any failure means
    /// the session is gone and a new one is needed.
    async fn probe(&self, url: &str, token: &str) -> Option<u64> {
        let resp = self
            .http
            .head(url)
            .header("Tus-Resumable", TUS_VERSION)
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await
            .ok()?;
        if !resp.status().is_success() {
            return None;
        }
        parse_offset(resp.headers())
    }

    async fn create(
        &self,
        token: &str,
        object_path: &str,
        source: &UploadSource,
    ) -> Result<String, BackendError> {
        let metadata = encode_metadata(&[
            ("bucketName", VIDEO_BUCKET),
            ("objectName", object_path),
            ("contentType", source.content_type_or_default()),
            ("cacheControl", CACHE_CONTROL),
        ]);

        let resp = self
            .http
            .post(&self.endpoint)
            .header("Tus-Resumable", TUS_VERSION)
            .header("Upload-Length", source.bytes.len().to_string())
            .header("Upload-Metadata", metadata)
            .header("x-upsert", "true")
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(response_error(resp).await);
        }

        let location = resp
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                BackendError::Transport("resumable session missing Location header".into())
            })?;
        Ok(resolve_location(&self.endpoint, location))
    }

    /// One PATCH attempt. A 4xx is the backend's verdict and is terminal;
    /// everything else is treated as transient.
    async fn patch_chunk(
        &self,
        url: &str,
        token: &str,
        offset: u64,
        chunk: &[u8],
    ) -> Result<u64, BackendError> {
        let resp = self
            .http
            .patch(url)
            .header("Tus-Resumable", TUS_VERSION)
            .header("Upload-Offset", offset.to_string())
            .header(reqwest::header::CONTENT_TYPE, "application/offset+octet-stream")
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .body(chunk.to_vec())
            .send()
            .await?;

        if resp.status().is_client_error() {
            return Err(response_error(resp).await);
        }
        if !resp.status().is_success() {
            return Err(BackendError::Transport(format!(
                "chunk rejected with status {}",
                resp.status()
            )));
        }
        Ok(parse_offset(resp.headers()).unwrap_or(offset + chunk.len() as u64))
    }

    async fn patch_with_retry(
        &self,
        url: &str,
        token: &str,
        offset: u64,
        chunk: &[u8],
    ) -> Result<u64, BackendError> {
        let mut last = String::new();
        for (attempt, delay) in RETRY_DELAYS_MS.iter().enumerate() {
            if *delay > 0 {
                sleep_ms(*delay).await;
            }
            match self.patch_chunk(url, token, offset, chunk).await {
                Ok(next) => return Ok(next),
                Err(BackendError::Request(m)) => return Err(BackendError::Request(m)),
                Err(e) => {
                    warn!(
                        "resumable.upload: chunk attempt {}/{} failed: {e}",
                        attempt + 1,
                        RETRY_DELAYS_MS.len()
                    );
                    last = e.to_string();
                }
            }
        }
        Err(BackendError::RetriesExhausted(last))
    }
}

#[async_trait(?Send)]
impl ResumableUploader for TusClient {
    async fn upload(
        &self,
        access_token: &str,
        object_path: &str,
        source: &UploadSource,
        on_progress: &mut (dyn FnMut(u64, u64)),
    ) -> Result<(), BackendError> {
        let total = source.bytes.len() as u64;
        let key = format!("{VIDEO_BUCKET}/{object_path}");
        let fp = fingerprint(&source.file_name, source.bytes.len(), &self.endpoint, &key);

        let mut offset: u64 = 0;
        let mut session_url = None;
        if let Some(stored) = self.fingerprints.get(&fp).await {
            match self.probe(&stored, access_token).await {
                Some(resumed) => {
                    info!("resumable.upload: resuming key={key} at offset {resumed}");
                    offset = resumed;
                    session_url = Some(stored);
                }
                None => {
                    debug!("resumable.upload: stale session for key={key}, restarting");
                    self.fingerprints.remove(&fp).await;
                }
            }
        }

        let session_url = match session_url {
            Some(url) => url,
            None => {
                let url = self.create(access_token, object_path, source).await?;
                self.fingerprints.set(&fp, &url).await;
                url
            }
        };

        on_progress(offset, total);
        while offset < total {
            let end = chunk_end(offset as usize, source.bytes.len());
            let chunk = &source.bytes[offset as usize..end];
            offset = self
                .patch_with_retry(&session_url, access_token, offset, chunk)
                .await?;
            on_progress(offset, total);
        }

        self.fingerprints.remove(&fp).await;
        info!("resumable.upload: complete key={key} bytes={total}");
        Ok(())
    }
}
