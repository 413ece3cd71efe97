//! Error types for APDU encoding, decoding and transport

use crate::transport::TransportError;

/// Errors produced by the APDU codec and transport layer
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Command bytes are not a well-formed APDU
    #[error("invalid command length: {0} bytes")]
    InvalidCommandLength(usize),

    /// Command payload does not fit the encoding supported by the transport
    #[error("payload of {len} bytes exceeds the supported maximum of {max}")]
    PayloadTooLarge {
        /// Actual payload length
        len: usize,
        /// Largest encodable payload
        max: usize,
    },

    /// Response shorter than the two-byte status word
    #[error("response of {0} bytes is too short to carry a status word")]
    TruncatedResponse(usize),

    /// Underlying transport failure
    #[error(transparent)]
    Transport(#[from] TransportError),
}
