//! Journalisation : `tracing` vers la console et vers un tampon mémoire
//!
//! Le tampon conserve les dernières entrées pour `/log-dump` et alimente
//! `/log-sse` en direct. Le niveau minimum se change à chaud via
//! `/api/logs/log_setup`, grâce à un filtre `reload`.

mod routes;
mod sselayer;

use std::collections::{BTreeMap, VecDeque};
use std::str::FromStr;
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::Level;
use tracing_subscriber::{Registry, filter::LevelFilter, layer::SubscriberExt, reload, util::SubscriberInitExt};

pub use routes::{LogFilter, LogsApiDoc, create_logs_router, log_dump, log_sse};
pub use sselayer::SseLayer;

const LIVE_CHANNEL_CAPACITY: usize = 1024;

/// Une entrée capturée par [`SseLayer`]
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: SystemTime,
    pub level: String,
    pub target: String,
    pub message: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, String>,
}

impl LogEntry {
    fn level(&self) -> Option<Level> {
        Level::from_str(&self.level).ok()
    }
}

type LevelHandle = reload::Handle<LevelFilter, Registry>;

struct Inner {
    history: Mutex<VecDeque<LogEntry>>,
    capacity: usize,
    live: broadcast::Sender<LogEntry>,
    level: RwLock<Level>,
    handle: Option<LevelHandle>,
}

/// Tampon circulaire partagé entre le layer et les routes HTTP
#[derive(Clone)]
pub struct LogState {
    inner: Arc<Inner>,
}

impl LogState {
    /// `handle` permet d'appliquer les changements de niveau au subscriber
    pub fn new(capacity: usize, handle: Option<LevelHandle>) -> Self {
        let capacity = capacity.max(1);
        let (live, _) = broadcast::channel(LIVE_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                history: Mutex::new(VecDeque::with_capacity(capacity)),
                capacity,
                live,
                level: RwLock::new(Level::TRACE),
                handle,
            }),
        }
    }

    pub fn level(&self) -> Level {
        *self.inner.level.read()
    }

    pub fn set_level(&self, level: Level) {
        *self.inner.level.write() = level;
        if let Some(handle) = &self.inner.handle {
            if let Err(e) = handle.reload(LevelFilter::from_level(level)) {
                eprintln!("Cannot apply log level {}: {}", level, e);
            }
        }
    }

    /// Vrai si l'entrée passe le niveau courant
    pub fn accepts(&self, entry: &LogEntry) -> bool {
        entry.level().is_some_and(|level| level <= self.level())
    }

    pub(crate) fn record(&self, entry: LogEntry) {
        let mut history = self.inner.history.lock();
        if history.len() == self.inner.capacity {
            history.pop_front();
        }
        history.push_back(entry.clone());
        drop(history);

        // Aucun abonné SSE : rien à faire
        let _ = self.inner.live.send(entry);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.inner.live.subscribe()
    }

    pub fn history(&self) -> Vec<LogEntry> {
        self.inner.history.lock().iter().cloned().collect()
    }
}

/// Réglages de [`init_logging`]
#[derive(Debug, Clone)]
pub struct LoggingOptions {
    pub buffer_capacity: usize,
    pub enable_console: bool,
    /// `ERROR`, `WARN`, `INFO`, `DEBUG` ou `TRACE`
    pub min_level: String,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            buffer_capacity: 1000,
            enable_console: true,
            min_level: "INFO".to_string(),
        }
    }
}

impl LoggingOptions {
    /// Réglages de la section `host.logger` de la configuration
    pub fn from_config() -> Self {
        let config = pmoconfig::get_config();
        Self {
            buffer_capacity: config.get_log_cache_size(),
            enable_console: config.get_log_enable_console(),
            min_level: config.get_log_min_level(),
        }
    }
}

/// Installe le subscriber global et retourne le tampon associé
///
/// Si un subscriber est déjà installé (tests, double initialisation), le
/// tampon est tout de même retourné mais ne recevra rien.
pub fn init_logging(options: LoggingOptions) -> LogState {
    let level = Level::from_str(&options.min_level).unwrap_or(Level::INFO);
    let (filter, handle) = reload::Layer::new(LevelFilter::from_level(level));

    let state = LogState::new(options.buffer_capacity, Some(handle));
    *state.inner.level.write() = level;

    let console = options.enable_console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_ansi(true)
    });

    // Le filtre précède le layer SSE pour ne capturer que ce qui passe
    let installed = Registry::default()
        .with(filter)
        .with(SseLayer::new(state.clone()))
        .with(console)
        .try_init();
    if let Err(e) = installed {
        eprintln!("Tracing subscriber already installed: {}", e);
    }

    state
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(super) fn entry(level: &str, message: &str) -> LogEntry {
        LogEntry {
            timestamp: SystemTime::now(),
            level: level.to_string(),
            target: "pmostage::stage".to_string(),
            message: message.to_string(),
            fields: BTreeMap::new(),
        }
    }

    #[test]
    fn test_history_keeps_latest_entries() {
        let state = LogState::new(2, None);
        for message in ["one", "two", "three"] {
            state.record(entry("INFO", message));
        }

        let kept: Vec<_> = state.history().into_iter().map(|e| e.message).collect();
        assert_eq!(kept, vec!["two", "three"]);
    }

    #[test]
    fn test_accepts_follows_level() {
        let state = LogState::new(8, None);
        state.set_level(Level::INFO);

        assert!(state.accepts(&entry("ERROR", "x")));
        assert!(state.accepts(&entry("INFO", "x")));
        assert!(!state.accepts(&entry("DEBUG", "x")));
        assert!(!state.accepts(&entry("loud", "x")));
    }

    #[tokio::test]
    async fn test_live_subscribers_receive_entries() {
        let state = LogState::new(8, None);
        let mut rx = state.subscribe();
        state.record(entry("WARN", "display evicted"));

        assert_eq!(rx.recv().await.unwrap().message, "display evicted");
    }
}
