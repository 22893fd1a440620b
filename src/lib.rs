//! # Proxy Transport
//!
//! Downstream packet ingestion for a game protocol proxy.
//!
//! Batches received from a backend server are decompressed, split into
//! length-prefixed sub-frames, decoded against the codec of the player's protocol
//! version and forwarded, together with the raw buffer, toward the client.
//!
//! ## Layout
//! - [`core`]: varints, packed headers, sub-frame splitting
//! - [`protocol`]: codec tables, the batch decoder, packet handlers, dispatch
//! - [`transport`]: session boundary and connection driver
//! - [`utils`]: compression, diagnostics, logging, metrics
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use proxy_transport::config::ProxyConfig;
//! use proxy_transport::protocol::codec::PacketCodec;
//! use proxy_transport::protocol::decoder::PacketDecoder;
//! use proxy_transport::protocol::dispatcher::ChannelDispatcher;
//! use proxy_transport::transport::session::TransportSession;
//! use proxy_transport::utils::diagnostics::LogSink;
//! use proxy_transport::utils::metrics::Metrics;
//!
//! let config = ProxyConfig::default();
//! let (dispatcher, _batches) = ChannelDispatcher::channel();
//! let mut session = TransportSession::new("Steve", 589, PacketCodec::standard(589).build(), dispatcher);
//! let decoder = PacketDecoder::new("Steve", &config, Arc::new(LogSink), Arc::new(Metrics::new()));
//!
//! // Garbage is not a valid deflate stream: the whole batch fails.
//! assert!(decoder.decode(&mut session, bytes::Bytes::from_static(&[0xFF; 8])).is_err());
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod transport;
pub mod utils;
