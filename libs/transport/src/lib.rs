//! Point-to-point packet framing for serial links between a microcontroller
//! and a host PC.
//!
//! The crate turns arbitrary in-memory payloads of 1 to 254 bytes into
//! self-delimiting, integrity-checked packets and recovers them on the other
//! side. Every packet on the wire has the same anatomy:
//!
//! ```text
//! [START] [PAYLOAD_SIZE] [OVERHEAD] [PAYLOAD (1..=254)] [DELIMITER] [CRC (1/2/4)]
//! ```
//!
//! Payload bytes are opaque to the layer. COBS byte stuffing removes every
//! occurrence of the delimiter value from the body so the delimiter appears
//! exactly once per packet, and a table-driven CRC over the stuffed body plus
//! delimiter lets the receiver verify integrity with the standard
//! zero-remainder check.
//!
//! [`SerialTransport`] owns the transmission and reception staging buffers and
//! drives both pipelines over a caller-supplied [`ByteStream`] and [`Clock`].
//! No allocation happens after construction.

#![cfg_attr(not(feature = "std"), no_std)]

pub mod cobs;
pub mod crc;
mod error;
pub mod mock;
pub mod stream;
mod transport;

pub use crc::{CrcParameters, CrcProcessor};
pub use error::{Error, Result};
pub use stream::{ByteStream, Clock};
pub use transport::{SerialTransport, TransportConfig};

#[cfg(feature = "std")]
pub use stream::StdClock;
