//! Local snapshot persistence, TTL memoization and HTTP fetch utilities for JobWatch.

use std::collections::HashMap;
use std::hash::Hash;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use chrono::Local;
use jobwatch_core::{ListingRecord, Snapshot, SNAPSHOT_TIMESTAMP_FORMAT};
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

pub const CRATE_NAME: &str = "jobwatch-storage";

pub const DEFAULT_STATE_DIR: &str = ".jobwatch_state";
pub const SNAPSHOT_FILE_NAME: &str = "snapshot.json";

pub const API_KEY_HEADER: &str = "X-API-Key";
pub const DEFAULT_USER_AGENT: &str =
    "Jobsuche/2.9.2 (de.arbeitsagentur.jobboerse; build:1077) jobwatch";

/// Single-file store for the baseline snapshot.
///
/// There is no locking: one process, one user. Writes go through a temp
/// file in the same directory and a rename, so a reader never sees a
/// half-written document.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(SNAPSHOT_FILE_NAME)
    }

    /// Read the snapshot; an absent file is the empty default.
    ///
    /// Malformed content is an error, not an empty snapshot.
    pub async fn load(&self) -> anyhow::Result<Snapshot> {
        let path = self.path();
        if !fs::try_exists(&path)
            .await
            .with_context(|| format!("checking snapshot path {}", path.display()))?
        {
            return Ok(Snapshot::default());
        }
        let text = fs::read_to_string(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    /// Overwrite the snapshot with `items` stamped with the current local time.
    pub async fn save(&self, items: &[ListingRecord]) -> anyhow::Result<Snapshot> {
        let snapshot = Snapshot {
            timestamp: Some(Local::now().format(SNAPSHOT_TIMESTAMP_FORMAT).to_string()),
            items: items.to_vec(),
        };
        let bytes = serde_json::to_vec_pretty(&snapshot).context("serializing snapshot")?;

        fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("creating state directory {}", self.dir.display()))?;

        let path = self.path();
        let temp_path = self
            .dir
            .join(format!(".{}.{}.tmp", Uuid::new_v4(), bytes.len()));

        let mut file = fs::OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&temp_path)
            .await
            .with_context(|| format!("opening temp snapshot file {}", temp_path.display()))?;
        file.write_all(&bytes)
            .await
            .with_context(|| format!("writing temp snapshot file {}", temp_path.display()))?;
        file.flush()
            .await
            .with_context(|| format!("flushing temp snapshot file {}", temp_path.display()))?;
        drop(file);

        if let Err(err) = fs::rename(&temp_path, &path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(err).with_context(|| {
                format!(
                    "renaming temp snapshot {} -> {}",
                    temp_path.display(),
                    path.display()
                )
            });
        }

        info!(
            path = %path.display(),
            items = snapshot.items.len(),
            "snapshot saved"
        );
        Ok(snapshot)
    }

    /// Remove the snapshot file. Returns whether a file was removed.
    pub async fn delete(&self) -> anyhow::Result<bool> {
        let path = self.path();
        match fs::remove_file(&path).await {
            Ok(()) => {
                info!(path = %path.display(), "snapshot deleted");
                Ok(true)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err).with_context(|| format!("removing {}", path.display())),
        }
    }
}

#[derive(Debug)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// Memo table whose entries expire a fixed time after insertion.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Fresh value for `key`; an expired entry is evicted and reported as a miss.
    pub async fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store `value` under `key`. Every insert first drops all expired
    /// entries, so keys that are never read again do not accumulate.
    pub async fn insert(&self, key: K, value: V) {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: now + self.ttl,
            },
        );
    }

    /// Number of entries held, expired ones included until the next insert.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub timeout: Duration,
    pub user_agent: Option<String>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(25),
            user_agent: Some(DEFAULT_USER_AGENT.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchedResponse {
    pub status: StatusCode,
    pub final_url: String,
    pub body: Vec<u8>,
}

impl FetchedResponse {
    pub fn is_ok(&self) -> bool {
        self.status == StatusCode::OK
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Single-shot GET client carrying the job-search API header set.
///
/// Every status code is handed back to the caller; only transport failures
/// (timeout, connect, body read) surface as [`FetchError`].
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: HttpClientConfig) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder()
            .gzip(true)
            .brotli(true)
            .timeout(config.timeout);

        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }

        let client = builder.build().context("building reqwest client")?;
        Ok(Self { client })
    }

    pub async fn get(
        &self,
        url: &str,
        query: &[(&str, String)],
        api_key: &str,
    ) -> Result<FetchedResponse, FetchError> {
        let span = info_span!("http_fetch", url, params = query.len());
        async {
            let resp = self
                .client
                .get(url)
                .query(query)
                .header(API_KEY_HEADER, api_key)
                .header(ACCEPT, "application/json")
                .send()
                .await?;

            let status = resp.status();
            let final_url = resp.url().to_string();
            let body = resp.bytes().await?.to_vec();
            debug!(%status, bytes = body.len(), "response received");

            Ok(FetchedResponse {
                status,
                final_url,
                body,
            })
        }
        .instrument(span)
        .await
    }
}
