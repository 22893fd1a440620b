//! # Transport Layer
//!
//! Session boundary and the async driver for a backend connection.

pub mod downstream;
pub mod session;
