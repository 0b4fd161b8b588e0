use std::collections::HashMap;
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, SyncSender, TrySendError};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::Result;
use serde_json::Value;
use thiserror::Error;

use crate::cache::{ResponseCache, SweepHandle, spawn_sweeper};
use crate::fallback;
use crate::http::{HttpTransport, Transport};

const DEFAULT_BASE_URL: &str = "https://v3.football.api-sports.io";

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    /// Minimum start-to-start gap between network calls.
    pub pacing: Duration,
    /// Cache TTL applied when a request does not name its own.
    pub default_ttl: Duration,
    pub sweep_interval: Duration,
    /// Buffered depth of the pending queue; overflow is rejected.
    pub queue_cap: usize,
    pub http_timeout: Duration,
    /// Serve every request from the seed data, never touching the network.
    pub offline: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            pacing: Duration::from_secs(2),
            default_ttl: Duration::from_secs(5 * 60),
            sweep_interval: Duration::from_secs(10 * 60),
            queue_cap: 64,
            http_timeout: Duration::from_secs(10),
            offline: false,
        }
    }
}

impl FetchConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let base_url = env::var("API_FOOTBALL_BASE_URL")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.base_url);
        let api_key = env::var("API_FOOTBALL_KEY")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let pacing_ms = env_u64("FETCH_PACING_MS")
            .unwrap_or(defaults.pacing.as_millis() as u64)
            .min(60_000);
        let ttl_secs = env_u64("FETCH_CACHE_TTL_SECS").unwrap_or(defaults.default_ttl.as_secs());
        let sweep_secs = env_u64("FETCH_SWEEP_SECS")
            .unwrap_or(defaults.sweep_interval.as_secs())
            .max(10);
        let queue_cap = env_u64("FETCH_QUEUE_CAP")
            .unwrap_or(defaults.queue_cap as u64)
            .clamp(1, 1024) as usize;
        let timeout_secs = env_u64("HTTP_TIMEOUT_SECS")
            .unwrap_or(defaults.http_timeout.as_secs())
            .clamp(1, 120);
        let offline = env_bool("MATCHDAY_OFFLINE", false);

        Self {
            base_url,
            api_key,
            pacing: Duration::from_millis(pacing_ms),
            default_ttl: Duration::from_secs(ttl_secs),
            sweep_interval: Duration::from_secs(sweep_secs),
            queue_cap,
            http_timeout: Duration::from_secs(timeout_secs),
            offline,
        }
    }
}

fn env_u64(name: &str) -> Option<u64> {
    env::var(name).ok().and_then(|val| val.parse::<u64>().ok())
}

fn env_bool(name: &str, default: bool) -> bool {
    match env::var(name) {
        Ok(val) => matches!(
            val.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        Err(_) => default,
    }
}

/// Why a canned value was substituted for the real reply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DegradeReason {
    #[error("rate limited (http 429)")]
    RateLimited,
    #[error("forbidden (http 403)")]
    Forbidden,
    #[error("http {0}")]
    HttpStatus(u16),
    #[error("network error: {0}")]
    Network(String),
    #[error("unparseable body: {0}")]
    BadBody(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("pending request queue is full")]
    QueueFull,
    #[error("fetch service stopped")]
    ServiceStopped,
}

/// Settled result of a request. Every accepted request settles exactly once
/// with one of these; nothing panics or hangs on the caller side.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Real data, fetched or served from cache.
    Ok(Value),
    /// Seed data stood in for the real reply.
    Degraded { value: Value, reason: DegradeReason },
    /// No data at all.
    Failed(FetchError),
}

impl FetchOutcome {
    pub fn value(&self) -> Option<&Value> {
        match self {
            FetchOutcome::Ok(value) | FetchOutcome::Degraded { value, .. } => Some(value),
            FetchOutcome::Failed(_) => None,
        }
    }

    pub fn degrade_reason(&self) -> Option<&DegradeReason> {
        match self {
            FetchOutcome::Degraded { reason, .. } => Some(reason),
            _ => None,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, FetchOutcome::Ok(_))
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, FetchOutcome::Degraded { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, FetchOutcome::Failed(_))
    }
}

/// Caller's half of a pending request. `wait` blocks until the service
/// settles it.
pub struct FetchTicket {
    rx: Receiver<FetchOutcome>,
}

impl FetchTicket {
    fn pending() -> (Sender<FetchOutcome>, Self) {
        let (tx, rx) = mpsc::channel();
        (tx, Self { rx })
    }

    fn resolved(outcome: FetchOutcome) -> Self {
        let (tx, ticket) = Self::pending();
        let _ = tx.send(outcome);
        ticket
    }

    pub fn wait(self) -> FetchOutcome {
        self.rx
            .recv()
            .unwrap_or(FetchOutcome::Failed(FetchError::ServiceStopped))
    }
}

struct Job {
    key: String,
    ttl: Duration,
}

struct Shared {
    cache: ResponseCache,
    /// Waiters per endpoint key, for every key currently queued or in
    /// flight. An entry exists from enqueue until its outcome fans out.
    pending: Mutex<HashMap<String, Vec<Sender<FetchOutcome>>>>,
    log_tx: Sender<String>,
    stop: AtomicBool,
}

/// Serializes all outbound API calls through one worker thread: strict FIFO
/// order, paced starts, a response cache consulted before the queue, and
/// seed-data substitution when the wire call cannot succeed.
pub struct FetchService {
    shared: Arc<Shared>,
    job_tx: Option<SyncSender<Job>>,
    worker: Option<JoinHandle<()>>,
    default_ttl: Duration,
    sweep_interval: Duration,
}

impl FetchService {
    /// Builds the service over the real HTTP transport. The log receiver
    /// carries `[INFO]`/`[WARN]` diagnostic lines; dropping it just mutes
    /// them.
    pub fn new(config: FetchConfig) -> Result<(Self, Receiver<String>)> {
        let transport =
            HttpTransport::new(&config.base_url, config.api_key.as_deref(), config.http_timeout)?;
        Ok(Self::with_transport(config, Box::new(transport)))
    }

    pub fn with_transport(
        config: FetchConfig,
        transport: Box<dyn Transport>,
    ) -> (Self, Receiver<String>) {
        let (log_tx, log_rx) = mpsc::channel();
        let shared = Arc::new(Shared {
            cache: ResponseCache::new(),
            pending: Mutex::new(HashMap::new()),
            log_tx,
            stop: AtomicBool::new(false),
        });
        let (job_tx, job_rx) = mpsc::sync_channel(config.queue_cap.max(1));
        let worker_shared = shared.clone();
        let pacing = config.pacing;
        let offline = config.offline;
        let worker =
            thread::spawn(move || worker_loop(worker_shared, job_rx, transport, pacing, offline));
        let service = Self {
            shared,
            job_tx: Some(job_tx),
            worker: Some(worker),
            default_ttl: config.default_ttl,
            sweep_interval: config.sweep_interval,
        };
        (service, log_rx)
    }

    /// Requests the resource behind `endpoint_key` (path plus query, e.g.
    /// `fixtures?live=all`). A live cache entry settles the ticket
    /// immediately; otherwise the request joins the FIFO queue, or attaches
    /// to an already-pending call for the same key.
    pub fn request(&self, endpoint_key: &str, ttl: Option<Duration>) -> FetchTicket {
        let ttl = ttl.unwrap_or(self.default_ttl);
        if let Some(value) = self.shared.cache.get_live(endpoint_key) {
            return FetchTicket::resolved(FetchOutcome::Ok(value));
        }

        let (tx, ticket) = FetchTicket::pending();
        {
            let mut pending = self.shared.pending.lock().expect("pending map lock poisoned");
            if let Some(waiters) = pending.get_mut(endpoint_key) {
                // Same key already queued or in flight: one wire call, the
                // result fans out to every waiter. The first request's TTL
                // governs the flight.
                waiters.push(tx);
                return ticket;
            }
            pending.insert(endpoint_key.to_string(), vec![tx]);
        }

        let job = Job {
            key: endpoint_key.to_string(),
            ttl,
        };
        let sent = self
            .job_tx
            .as_ref()
            .expect("job queue closed before drop")
            .try_send(job);
        if let Err(err) = sent {
            let error = match err {
                TrySendError::Full(_) => FetchError::QueueFull,
                TrySendError::Disconnected(_) => FetchError::ServiceStopped,
            };
            let _ = self
                .shared
                .log_tx
                .send(format!("[WARN] {endpoint_key}: {error}, dropping request"));
            let waiters = self
                .shared
                .pending
                .lock()
                .expect("pending map lock poisoned")
                .remove(endpoint_key)
                .unwrap_or_default();
            for waiter in waiters {
                let _ = waiter.send(FetchOutcome::Failed(error));
            }
        }
        ticket
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.shared.cache
    }

    /// Starts the periodic expiry sweep. The owning application decides
    /// when; nothing spawns at construction time.
    pub fn spawn_sweeper(&self) -> SweepHandle {
        spawn_sweeper(
            self.shared.cache.clone(),
            self.sweep_interval,
            self.shared.log_tx.clone(),
        )
    }
}

impl Drop for FetchService {
    fn drop(&mut self) {
        self.shared.stop.store(true, Ordering::Relaxed);
        // Closing the queue lets the worker drain and exit; still-queued
        // jobs settle as Failed(ServiceStopped) under the stop flag.
        self.job_tx.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn worker_loop(
    shared: Arc<Shared>,
    job_rx: Receiver<Job>,
    transport: Box<dyn Transport>,
    pacing: Duration,
    offline: bool,
) {
    let mut last_call_started: Option<Instant> = None;
    while let Ok(job) = job_rx.recv() {
        if shared.stop.load(Ordering::Relaxed) {
            resolve(&shared, &job.key, FetchOutcome::Failed(FetchError::ServiceStopped));
            continue;
        }

        let outcome = if offline {
            let _ = shared
                .log_tx
                .send(format!("[INFO] {}: offline mode, serving seed data", job.key));
            FetchOutcome::Ok(fallback::fallback_for(&job.key))
        } else {
            if let Some(started) = last_call_started {
                let elapsed = started.elapsed();
                if elapsed < pacing {
                    thread::sleep(pacing - elapsed);
                }
            }
            // Pacing is measured start-to-start, whatever the outcome.
            last_call_started = Some(Instant::now());
            execute(transport.as_ref(), &shared, &job)
        };

        // Only real replies are cached; a degraded request retries the
        // network next time its key comes around.
        if let FetchOutcome::Ok(value) = &outcome {
            shared.cache.insert(&job.key, value.clone(), job.ttl);
        }
        resolve(&shared, &job.key, outcome);
    }
}

fn execute(transport: &dyn Transport, shared: &Shared, job: &Job) -> FetchOutcome {
    let degraded = |reason: DegradeReason| {
        let _ = shared
            .log_tx
            .send(format!("[WARN] {}: {reason}, serving fallback", job.key));
        FetchOutcome::Degraded {
            value: fallback::fallback_for(&job.key),
            reason,
        }
    };

    match transport.get(&job.key) {
        Ok(reply) if reply.is_success() => match serde_json::from_str::<Value>(&reply.body) {
            Ok(value) => FetchOutcome::Ok(value),
            Err(err) => degraded(DegradeReason::BadBody(err.to_string())),
        },
        Ok(reply) if reply.status == 429 => degraded(DegradeReason::RateLimited),
        Ok(reply) if reply.status == 403 => degraded(DegradeReason::Forbidden),
        Ok(reply) => degraded(DegradeReason::HttpStatus(reply.status)),
        Err(err) => degraded(DegradeReason::Network(err)),
    }
}

fn resolve(shared: &Shared, key: &str, outcome: FetchOutcome) {
    let waiters = shared
        .pending
        .lock()
        .expect("pending map lock poisoned")
        .remove(key)
        .unwrap_or_default();
    for waiter in waiters {
        let _ = waiter.send(outcome.clone());
    }
}
