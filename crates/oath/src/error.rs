//! Error taxonomy for OATH session operations
//!
//! All errors are value-like outcomes: after a non-fatal protocol error the
//! session remains usable. Only a failed underlying transport requires the
//! session to be closed and re-established.

use keyfob_apdu_core::{StatusWord, TransportError};

use crate::types::{DeviceId, Version};

/// Result type for OATH operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for OATH session operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport-level failure; recoverable variants mean "retry after the
    /// permission grant / on the next tap"
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// APDU encoding or decoding failure
    #[error(transparent)]
    Apdu(#[from] keyfob_apdu_core::Error),

    /// The OATH applet is not present on the device
    #[error("OATH applet not present on the device")]
    AppletMissing,

    /// The applet version is below the minimum this crate supports
    #[error("applet version {version} is below the minimum supported {min}")]
    UnsupportedApplet {
        /// Version the applet reported
        version: Version,
        /// Oldest supported version
        min: Version,
    },

    /// Selection succeeded at the transport level but the response payload
    /// is not a valid select response
    #[error("malformed select response: {0}")]
    AppletSelect(&'static str),

    /// A password is needed before catalog operations may proceed
    #[error("password required for device {device_id}")]
    PasswordRequired {
        /// Identity of the applet instance the password belongs to
        device_id: DeviceId,
        /// true when a password was presented and refused; false when no
        /// cached password was available in the first place
        rejected: bool,
    },

    /// Per-operation protocol failure; the session stays usable
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Operation attempted in a state that does not allow it
    #[error("operation not permitted while the session is {0}")]
    SessionState(&'static str),
}

/// Protocol-level failures mapped from applet status words and payloads
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// A credential with the requested name already exists
    #[error("a credential with this name already exists")]
    DuplicateName,

    /// No credential with the requested name exists
    #[error("no credential with this name exists")]
    NotFound,

    /// The applet requires authentication for this operation
    #[error("authentication required")]
    AuthRequired,

    /// The applet is out of credential storage
    #[error("no space left for new credentials")]
    NoSpace,

    /// Response payload did not decode
    #[error("malformed response: {0}")]
    Malformed(&'static str),

    /// A status word with no specific mapping
    #[error("unexpected status word {0}")]
    UnexpectedStatus(StatusWord),
}
