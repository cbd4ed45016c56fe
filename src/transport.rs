//! The byte-level seam between the protocol layer and the USB bridge.
//! Anything that can push an MPSSE command stream at a device and hand back
//! the bytes the device queued on TDO can implement `Transport`.
use thiserror::Error;

#[cfg(feature = "ftd2xx")]
pub mod ftd2xx;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("MPSSE bridge I/O failed: {0}")]
    Io(String),
    #[error("short read from MPSSE bridge: wanted {want} bytes, got {got}")]
    ShortRead { want: usize, got: usize },
}

/// Exclusive handle on an MPSSE-capable bridge for the life of a session.
/// The TAP is a single shared state machine, so a transport must never be
/// shared between concurrent callers.
pub trait Transport {
    /// Send one batched command buffer.  Command order is preserved exactly
    /// as built; nothing is reordered or coalesced across buffers.
    fn write(&mut self, data: &[u8]) -> Result<(), TransportError>;

    /// Read exactly `len` bytes of queued TDO data.  A short read is an
    /// error, never partial data.
    fn read(&mut self, len: usize) -> Result<Vec<u8>, TransportError>;
}
