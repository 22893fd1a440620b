//! # Core Wire Components
//!
//! Low-level parsing of a decompressed batch.
//!
//! ## Components
//! - **VarInt**: unsigned LEB128 integers
//! - **Header**: packet id, sender id and client id packed into one varint
//! - **Frame**: zero-copy splitting of length-prefixed sub-frames
//!
//! ## Wire Format
//! ```text
//! batch    := frame*
//! frame    := [VarInt length] [header VarInt] [payload]
//! ```
//!
//! ## Security
//! - Lengths are validated against the remaining buffer before slicing
//! - Empty frames invalidate the batch

pub mod frame;
pub mod header;
pub mod varint;
