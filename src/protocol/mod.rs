//! # Protocol Layer
//!
//! Packet decoding and forwarding for batches received from a backend server.
//!
//! ## Components
//! - **Packet**: decoded packet bodies and routing metadata
//! - **Codec**: versioned packet id to decode/encode routine table
//! - **Decoder**: the batch pipeline with per-frame failure isolation
//! - **Handler**: per-session packet hooks, including duplicate suppression
//! - **Dispatcher**: batch forwarding toward the client-facing side

pub mod codec;
pub mod decoder;
pub mod dispatcher;
pub mod handler;
pub mod packet;
