//! Contactless transport for APDU operations
//!
//! Wraps a PC/SC connection to a contactless reader. A connection is valid
//! for a single tag presentation only: once the tag leaves the field every
//! exchange fails with [`TransportError::Disconnected`], which callers
//! should treat as "retry on the next tap", never as fatal.
//!
//! Contactless frames are short APDUs; extended length is not offered and
//! command payloads are capped at 255 data bytes per exchange.
#![forbid(unsafe_code)]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]

use keyfob_apdu_core::{Bytes, CardTransport, TransportError};
use pcsc::{Card, Context, Protocols, Scope, ShareMode as PcscShareMode, MAX_BUFFER_SIZE};
use tracing::{debug, trace};

/// Sharing mode for reader connections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareMode {
    /// Exclusive access to the tag (default; a tag is a single-holder resource)
    Exclusive,
    /// Shared access to the tag
    Shared,
}

impl From<ShareMode> for PcscShareMode {
    fn from(mode: ShareMode) -> Self {
        match mode {
            ShareMode::Exclusive => Self::Exclusive,
            ShareMode::Shared => Self::Shared,
        }
    }
}

/// Configuration options for the contactless transport
#[derive(Debug, Clone)]
pub struct NfcConfig {
    /// Sharing mode for the connection
    pub share_mode: ShareMode,
    /// Preferred protocols for tag communication
    pub protocols: Protocols,
}

impl Default for NfcConfig {
    fn default() -> Self {
        Self {
            share_mode: ShareMode::Exclusive,
            protocols: Protocols::ANY,
        }
    }
}

impl NfcConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sharing mode
    pub const fn with_share_mode(mut self, mode: ShareMode) -> Self {
        self.share_mode = mode;
        self
    }

    /// Set the preferred protocols
    pub const fn with_protocols(mut self, protocols: Protocols) -> Self {
        self.protocols = protocols;
        self
    }
}

/// Contactless card transport bound to one tag presentation
pub struct NfcTransport {
    card: Card,
    reader: String,
}

impl std::fmt::Debug for NfcTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NfcTransport")
            .field("reader", &self.reader)
            .finish()
    }
}

impl NfcTransport {
    /// Connect to the tag currently presented at the named reader
    pub fn connect(reader: &str, config: NfcConfig) -> Result<Self, TransportError> {
        let context = Context::establish(Scope::User).map_err(map_pcsc_error)?;
        Self::connect_with(&context, reader, config)
    }

    /// Connect using an existing PC/SC context
    pub fn connect_with(
        context: &Context,
        reader: &str,
        config: NfcConfig,
    ) -> Result<Self, TransportError> {
        let c_reader = std::ffi::CString::new(reader)
            .map_err(|_| TransportError::Device("reader name contains NUL".to_string()))?;
        let card = context
            .connect(&c_reader, config.share_mode.into(), config.protocols)
            .map_err(map_pcsc_error)?;

        debug!(reader, "connected to presented tag");
        Ok(Self {
            card,
            reader: reader.to_string(),
        })
    }

    /// Name of the reader this transport is bound to
    pub fn reader(&self) -> &str {
        &self.reader
    }
}

impl CardTransport for NfcTransport {
    fn transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, TransportError> {
        trace!(command = %hex::encode(command), "nfc transmit");
        let mut buf = [0u8; MAX_BUFFER_SIZE];
        let response = self
            .card
            .transmit(command, &mut buf)
            .map_err(map_pcsc_error)?;
        trace!(response = %hex::encode(response), "nfc response");
        Ok(Bytes::copy_from_slice(response))
    }

    fn max_payload_len(&self) -> usize {
        255
    }

    fn supports_extended_length(&self) -> bool {
        false
    }

    fn reset(&mut self) -> Result<(), TransportError> {
        // A contactless connection cannot be reset in place; the tag has to
        // be presented again.
        Err(TransportError::Disconnected)
    }
}

fn map_pcsc_error(err: pcsc::Error) -> TransportError {
    match err {
        pcsc::Error::RemovedCard
        | pcsc::Error::ResetCard
        | pcsc::Error::NoSmartcard
        | pcsc::Error::UnpoweredCard => TransportError::Disconnected,
        pcsc::Error::Timeout | pcsc::Error::CommError => TransportError::Io(err.to_string()),
        pcsc::Error::InsufficientBuffer => TransportError::BufferTooSmall,
        other => TransportError::Device(other.to_string()),
    }
}
