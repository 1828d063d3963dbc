//! DTAS request authentication.
//!
//! Each outgoing request carries a fresh challenge and timestamp, and a SHA1
//! checksum over the shared API key followed by the values of the headers
//! named in `X-DTAS-ChecksumCalculatingOrder`.

pub mod challenge;
pub mod checksum;
pub mod signing;

pub use challenge::*;
pub use checksum::*;
pub use signing::*;
