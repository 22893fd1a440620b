//! # Utility Modules
//!
//! Supporting utilities for compression, diagnostics, logging, and metrics.
//!
//! ## Components
//! - **Compression**: raw deflate and Snappy with a decompressed size ceiling
//! - **Diagnostics**: error notifications and buffer dumps for failed batches
//! - **Hexdump**: boxed hex/ASCII rendering of raw bytes
//! - **Logging**: structured logging configuration
//! - **Metrics**: thread-safe pipeline counters
//!
//! ## Security
//! - Decompression bomb protection (4 MiB default ceiling)
//! - Snappy claimed lengths are checked before allocation

pub mod compression;
pub mod diagnostics;
pub mod hexdump;
pub mod logging;
pub mod metrics;
