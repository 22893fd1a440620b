//! Observability and Metrics
//!
//! Counters for the downstream ingestion pipeline.
//!
//! Uses atomic counters for thread-safe metrics collection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info};

/// Metrics collector for batch decoding
#[derive(Debug)]
pub struct Metrics {
    /// Batches handed to the decoder
    pub batches_received: AtomicU64,
    /// Batches decoded and forwarded
    pub batches_decoded: AtomicU64,
    /// Batches abandoned by a fatal error
    pub batches_failed: AtomicU64,
    /// Packets decoded successfully
    pub packets_decoded: AtomicU64,
    /// Sub-frames dropped by a recoverable decode error
    pub packets_dropped: AtomicU64,
    /// Latency probe requests observed
    pub latency_probes: AtomicU64,
    /// Compressed bytes received
    pub bytes_compressed: AtomicU64,
    /// Bytes after decompression
    pub bytes_decompressed: AtomicU64,
    /// Buffer dumps accepted by the diagnostics sink
    pub dumps_recorded: AtomicU64,
    /// Start time for uptime calculation
    start_time: Instant,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            batches_received: AtomicU64::new(0),
            batches_decoded: AtomicU64::new(0),
            batches_failed: AtomicU64::new(0),
            packets_decoded: AtomicU64::new(0),
            packets_dropped: AtomicU64::new(0),
            latency_probes: AtomicU64::new(0),
            bytes_compressed: AtomicU64::new(0),
            bytes_decompressed: AtomicU64::new(0),
            dumps_recorded: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a batch arriving from the transport
    pub fn batch_received(&self, compressed_len: u64) {
        self.batches_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_compressed
            .fetch_add(compressed_len, Ordering::Relaxed);
    }

    /// Record a completed batch
    pub fn batch_decoded(&self, decompressed_len: u64, packets: u64) {
        self.batches_decoded.fetch_add(1, Ordering::Relaxed);
        self.bytes_decompressed
            .fetch_add(decompressed_len, Ordering::Relaxed);
        self.packets_decoded.fetch_add(packets, Ordering::Relaxed);
    }

    /// Record a batch lost to a fatal error
    pub fn batch_failed(&self) {
        self.batches_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a dropped sub-frame
    pub fn packet_dropped(&self) {
        self.packets_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a latency probe
    pub fn latency_probe(&self) {
        self.latency_probes.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a stored dump
    pub fn dump_recorded(&self) {
        self.dumps_recorded.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            batches_received: self.batches_received.load(Ordering::Relaxed),
            batches_decoded: self.batches_decoded.load(Ordering::Relaxed),
            batches_failed: self.batches_failed.load(Ordering::Relaxed),
            packets_decoded: self.packets_decoded.load(Ordering::Relaxed),
            packets_dropped: self.packets_dropped.load(Ordering::Relaxed),
            latency_probes: self.latency_probes.load(Ordering::Relaxed),
            bytes_compressed: self.bytes_compressed.load(Ordering::Relaxed),
            bytes_decompressed: self.bytes_decompressed.load(Ordering::Relaxed),
            dumps_recorded: self.dumps_recorded.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Log current metrics
    pub fn log_metrics(&self) {
        let snapshot = self.snapshot();
        info!(
            batches_received = snapshot.batches_received,
            batches_decoded = snapshot.batches_decoded,
            batches_failed = snapshot.batches_failed,
            packets_decoded = snapshot.packets_decoded,
            packets_dropped = snapshot.packets_dropped,
            latency_probes = snapshot.latency_probes,
            bytes_compressed = snapshot.bytes_compressed,
            bytes_decompressed = snapshot.bytes_decompressed,
            dumps_recorded = snapshot.dumps_recorded,
            uptime_seconds = snapshot.uptime_seconds,
            "Downstream pipeline metrics snapshot"
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub batches_received: u64,
    pub batches_decoded: u64,
    pub batches_failed: u64,
    pub packets_decoded: u64,
    pub packets_dropped: u64,
    pub latency_probes: u64,
    pub bytes_compressed: u64,
    pub bytes_decompressed: u64,
    pub dumps_recorded: u64,
    pub uptime_seconds: u64,
}

/// Timer for measuring operation duration
pub struct Timer {
    start: Instant,
    operation: &'static str,
}

impl Timer {
    /// Start timing an operation
    pub fn start(operation: &'static str) -> Self {
        Self {
            start: Instant::now(),
            operation,
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        debug!(
            operation = self.operation,
            duration_us = duration.as_micros() as u64,
            "Operation completed"
        );
    }
}
