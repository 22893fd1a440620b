//! # Failure Diagnostics
//!
//! Capture of packet errors and unparseable batches.
//!
//! Two channels reach a [`DiagnosticsSink`]:
//! - `notify` for every error tied to a session, with the offending sub-frame when
//!   there is one
//! - `record` for the full dump of a batch that could not be decoded at all
//!
//! A dump is a boxed hex dump of the raw (still compressed) batch followed by a
//! base64 copy of the same bytes, stored under a freshly generated id.

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::DiagnosticsConfig;
use crate::error::ProtocolError;
use crate::utils::hexdump::pretty_hex_dump;

/// Log target for contextual debug data, kept apart from per-player error logs
pub const DEBUG_TARGET: &str = "proxy_transport::debug";

/// Separator between the hex dump and the base64 copy
pub const BASE64_MARKER: &str = "======== Begin Of Base64 data ========";

/// Receiver of error notifications and buffer dumps
pub trait DiagnosticsSink: Send + Sync {
    /// Store a buffer dump under `id`. Returns whether the dump was kept.
    fn record(&self, id: &str, payload: &str) -> bool;

    /// Report an error for a session, with the sub-frame that caused it if known
    fn notify(&self, player: &str, error: &ProtocolError, slice: Option<&[u8]>);
}

/// Build the sink described by the configuration
pub fn sink_from_config(config: &DiagnosticsConfig) -> Arc<dyn DiagnosticsSink> {
    match config.dump_directory {
        Some(ref dir) => Arc::new(DirectorySink::new(dir)),
        None => Arc::new(LogSink),
    }
}

/// Produces and submits buffer dumps for failed batches
#[derive(Clone)]
pub struct FailureRecorder {
    sink: Arc<dyn DiagnosticsSink>,
    include_base64: bool,
}

impl FailureRecorder {
    pub fn new(sink: Arc<dyn DiagnosticsSink>, include_base64: bool) -> Self {
        Self {
            sink,
            include_base64,
        }
    }

    pub fn sink(&self) -> &Arc<dyn DiagnosticsSink> {
        &self.sink
    }

    /// Hex dump of `raw`, then the base64 marker and a base64 copy
    pub fn format_dump(&self, raw: &[u8]) -> String {
        let mut dump = pretty_hex_dump(raw);
        if self.include_base64 {
            dump.push_str(BASE64_MARKER);
            dump.push_str(&STANDARD.encode(raw));
        }
        dump
    }

    /// Dump `raw` under a new id and submit it to the sink
    pub fn record(&self, player: &str, raw: &[u8]) -> RecordedDump {
        let id = Uuid::new_v4().to_string();
        let dump = self.format_dump(raw);
        let stored = self.sink.record(&id, &dump);
        if stored {
            info!(target: DEBUG_TARGET, player, id = %id, "Packet dump for {player} saved with id {id}");
        }
        RecordedDump { id, stored }
    }
}

/// Id a dump was submitted under and whether the sink kept it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedDump {
    pub id: String,
    pub stored: bool,
}

/// Logs everything through `tracing` and keeps nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticsSink for LogSink {
    fn record(&self, id: &str, payload: &str) -> bool {
        debug!(target: DEBUG_TARGET, id, bytes = payload.len(), "Buffer dump not persisted");
        false
    }

    fn notify(&self, player: &str, error: &ProtocolError, slice: Option<&[u8]>) {
        warn!(
            player,
            error = %error,
            slice_len = slice.map(<[u8]>::len),
            "Downstream exception"
        );
    }
}

/// Persists each dump as `<id>.txt` in a directory
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.txt"))
    }
}

impl DiagnosticsSink for DirectorySink {
    fn record(&self, id: &str, payload: &str) -> bool {
        let path = self.path_for(id);
        match fs::write(&path, payload) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, path = %path.display(), "Failed to write buffer dump");
                false
            }
        }
    }

    fn notify(&self, player: &str, error: &ProtocolError, slice: Option<&[u8]>) {
        LogSink.notify(player, error, slice);
    }
}

/// A notification captured by [`MemorySink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub player: String,
    pub error: String,
    pub slice: Option<Vec<u8>>,
}

/// Keeps dumps and notifications in memory
#[derive(Debug)]
pub struct MemorySink {
    accept: bool,
    records: Mutex<Vec<(String, String)>>,
    notifications: Mutex<Vec<Notification>>,
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new(true)
    }
}

impl MemorySink {
    /// `accept` decides what `record` reports back
    pub fn new(accept: bool) -> Self {
        Self {
            accept,
            records: Mutex::new(Vec::new()),
            notifications: Mutex::new(Vec::new()),
        }
    }

    pub fn records(&self) -> Vec<(String, String)> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications
            .lock()
            .map(|n| n.clone())
            .unwrap_or_default()
    }
}

impl DiagnosticsSink for MemorySink {
    fn record(&self, id: &str, payload: &str) -> bool {
        if let Ok(mut records) = self.records.lock() {
            records.push((id.to_string(), payload.to_string()));
        }
        self.accept
    }

    fn notify(&self, player: &str, error: &ProtocolError, slice: Option<&[u8]>) {
        if let Ok(mut notifications) = self.notifications.lock() {
            notifications.push(Notification {
                player: player.to_string(),
                error: error.to_string(),
                slice: slice.map(<[u8]>::to_vec),
            });
        }
    }
}
