// =====================================================================================
// QUERY CACHE - STALE-WHILE-REVALIDATE OVER THE FETCHER
// =====================================================================================
//
// Responses are cached by request URL. A settled response younger than the
// dedupe interval is served without touching the network; anything older is
// fetched again. Callers arriving while a fetch for the same key is in flight
// wait for it instead of issuing their own. Failed fetches are never treated
// as fresh. Settled entries untouched for longer than the retention period
// are dropped whenever a new fetch starts.
//
// =====================================================================================

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use tokio::sync::{watch, RwLock};
use tracing::{debug, error, instrument, warn, Instrument};

use shared_config::{AppConfig, DEFAULT_CACHE_RETENTION_MS};
use shared_models::error::FetchError;

use crate::fetcher::{FetchResponse, Fetcher};

type Entries = RwLock<HashMap<String, CacheEntry>>;

/// What a hook observes for one key at one moment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub data: Option<FetchResponse>,
    pub error: Option<FetchError>,
    pub is_loading: bool,
    pub is_validating: bool,
}

impl QueryResult {
    pub fn loading() -> Self {
        Self {
            is_loading: true,
            ..Self::default()
        }
    }

    /// Decode `data` into `T`. A body that fails to decode is reported as an
    /// error alongside any error already recorded, and yields no data.
    pub fn decode<T: DeserializeOwned>(&self) -> (Option<T>, Option<FetchError>) {
        let mut error = self.error.clone();
        let data = match &self.data {
            Some(response) => match response.decode::<T>() {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("Discarding undecodable response: {}", e);
                    error.get_or_insert(e);
                    None
                }
            },
            None => None,
        };
        (data, error)
    }
}

#[derive(Debug)]
struct CacheEntry {
    response: Option<FetchResponse>,
    error: Option<FetchError>,
    settled_at: Option<Instant>,
    in_flight: usize,
    // Sequence numbers of the latest started and the latest stored fetch.
    started: u64,
    settled: u64,
    // Ticks every time a fetch for this key completes.
    settled_tx: watch::Sender<u64>,
}

impl Default for CacheEntry {
    fn default() -> Self {
        let (settled_tx, _) = watch::channel(0);
        Self {
            response: None,
            error: None,
            settled_at: None,
            in_flight: 0,
            started: 0,
            settled: 0,
            settled_tx,
        }
    }
}

impl CacheEntry {
    fn snapshot(&self) -> QueryResult {
        QueryResult {
            data: self.response.clone(),
            error: self.error.clone(),
            is_loading: self.in_flight > 0 && self.response.is_none() && self.error.is_none(),
            is_validating: self.in_flight > 0,
        }
    }

    fn is_fresh(&self, dedupe_interval: Duration) -> bool {
        self.response.is_some()
            && self.error.is_none()
            && self.settled_at.is_some_and(|at| at.elapsed() < dedupe_interval)
    }

    fn is_expired(&self, retention: Duration) -> bool {
        self.in_flight == 0 && self.settled_at.is_some_and(|at| at.elapsed() >= retention)
    }

    fn begin(&mut self) -> u64 {
        self.in_flight += 1;
        self.started += 1;
        self.started
    }
}

enum Plan {
    Cached(QueryResult),
    Join(watch::Receiver<u64>),
    Fetch(u64),
}

pub struct QueryClient {
    fetcher: Arc<dyn Fetcher>,
    entries: Arc<Entries>,
    dedupe_interval: Duration,
    retention: Duration,
}

impl QueryClient {
    pub fn new(fetcher: Arc<dyn Fetcher>, dedupe_interval: Duration) -> Self {
        Self {
            fetcher,
            entries: Arc::new(RwLock::new(HashMap::new())),
            dedupe_interval,
            retention: Duration::from_millis(DEFAULT_CACHE_RETENTION_MS),
        }
    }

    pub fn from_config(fetcher: Arc<dyn Fetcher>, config: &AppConfig) -> Self {
        Self::new(fetcher, Duration::from_millis(config.dedupe_interval_ms))
            .with_retention(Duration::from_millis(config.cache_retention_ms))
    }

    /// How long a settled entry is kept after its last fetch.
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    /// Serve a fresh cached response for `key`, join a fetch already in
    /// flight for it, or fetch it.
    #[instrument(skip(self))]
    pub async fn query(&self, key: &str) -> QueryResult {
        {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(key) {
                if entry.is_fresh(self.dedupe_interval) {
                    debug!("Serving cached response for {}", key);
                    return entry.snapshot();
                }
            }
        }

        let plan = {
            let mut entries = self.entries.write().await;
            self.prune(&mut entries, key);
            let entry = entries.entry(key.to_string()).or_default();
            if entry.is_fresh(self.dedupe_interval) {
                Plan::Cached(entry.snapshot())
            } else if entry.in_flight > 0 {
                Plan::Join(entry.settled_tx.subscribe())
            } else {
                Plan::Fetch(entry.begin())
            }
        };

        match plan {
            Plan::Cached(result) => result,
            Plan::Join(mut settled) => {
                debug!("Joining in-flight request for {}", key);
                if settled.changed().await.is_err() {
                    warn!("Cache entry for {} dropped while in flight", key);
                }
                self.peek(key).await
            }
            Plan::Fetch(sequence) => self.complete(key, sequence).await,
        }
    }

    /// Fetch `key` regardless of what is cached.
    #[instrument(skip(self))]
    pub async fn revalidate(&self, key: &str) -> QueryResult {
        let sequence = {
            let mut entries = self.entries.write().await;
            self.prune(&mut entries, key);
            entries.entry(key.to_string()).or_default().begin()
        };

        self.complete(key, sequence).await
    }

    /// Current state for `key` without fetching.
    pub async fn peek(&self, key: &str) -> QueryResult {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .map(CacheEntry::snapshot)
            .unwrap_or_else(QueryResult::loading)
    }

    fn prune(&self, entries: &mut HashMap<String, CacheEntry>, keep: &str) {
        let before = entries.len();
        entries.retain(|key, entry| key == keep || !entry.is_expired(self.retention));
        let dropped = before - entries.len();
        if dropped > 0 {
            debug!("Pruned {} expired cache entries", dropped);
        }
    }

    /// Run the fetch on its own task so it settles even if the caller is
    /// cancelled; waiters joined on the entry depend on that.
    async fn complete(&self, key: &str, sequence: u64) -> QueryResult {
        let fetcher = self.fetcher.clone();
        let entries = self.entries.clone();
        let owned_key = key.to_string();

        let task = tokio::spawn(
            async move {
                let outcome = fetcher.fetch(&owned_key).await;
                settle(&entries, &owned_key, sequence, outcome).await
            }
            .in_current_span(),
        );

        match task.await {
            Ok(result) => result,
            Err(err) => {
                error!("Fetch task for {} failed: {}", key, err);
                let outcome = Err(FetchError::Network(err.to_string()));
                settle(&self.entries, key, sequence, outcome).await
            }
        }
    }
}

async fn settle(
    entries: &Entries,
    key: &str,
    sequence: u64,
    outcome: Result<FetchResponse, FetchError>,
) -> QueryResult {
    let mut entries = entries.write().await;
    let entry = entries.entry(key.to_string()).or_default();
    entry.in_flight = entry.in_flight.saturating_sub(1);

    if sequence < entry.settled {
        debug!("Dropping superseded response #{} for {}", sequence, key);
    } else {
        entry.settled = sequence;
        entry.settled_at = Some(Instant::now());

        match outcome {
            Ok(response) => {
                entry.response = Some(response);
                entry.error = None;
            }
            Err(err) => {
                // Stale data stays visible next to the error.
                warn!("Fetch failed for {}: {}", key, err);
                entry.error = Some(err);
            }
        }
    }

    let settled = entry.settled;
    entry.settled_tx.send_replace(settled);
    entry.snapshot()
}

/// One hook's view on the cache: remembers the key it asked for last so that
/// [`QueryObserver::current`] never reports a superseded key.
pub struct QueryObserver {
    client: Arc<QueryClient>,
    latest: RwLock<Option<String>>,
}

impl QueryObserver {
    pub fn new(client: Arc<QueryClient>) -> Self {
        Self {
            client,
            latest: RwLock::new(None),
        }
    }

    pub async fn observe(&self, key: &str) -> QueryResult {
        *self.latest.write().await = Some(key.to_string());
        self.client.query(key).await
    }

    pub async fn current(&self) -> QueryResult {
        match self.latest_key().await {
            Some(key) => self.client.peek(&key).await,
            None => QueryResult::loading(),
        }
    }

    /// Re-fetch the latest key, bypassing the dedupe interval.
    pub async fn mutate(&self) -> QueryResult {
        match self.latest_key().await {
            Some(key) => self.client.revalidate(&key).await,
            None => QueryResult::loading(),
        }
    }

    /// Make `key` the latest and fetch it, bypassing the dedupe interval.
    pub async fn refresh(&self, key: &str) -> QueryResult {
        *self.latest.write().await = Some(key.to_string());
        self.client.revalidate(key).await
    }

    pub async fn latest_key(&self) -> Option<String> {
        self.latest.read().await.clone()
    }
}
