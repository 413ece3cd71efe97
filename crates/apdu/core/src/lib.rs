//! APDU (Application Protocol Data Unit) codec and transport contract
//!
//! This crate provides the foundational types for talking to smart card
//! applets according to ISO/IEC 7816-4:
//!
//! - Creating and parsing APDU commands and responses
//! - Status word interpretation
//! - The [`CardTransport`] contract implemented by physical backends
//!
//! The codec is independent of any particular transport. Whether a command
//! may use extended length encoding is a property of the connected
//! transport and is passed to [`Command::serialize`] at call time.
#![forbid(unsafe_code)]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]

// Re-export bytes for convenience
pub use bytes::{Bytes, BytesMut};

pub mod command;
pub mod error;
pub mod response;
pub mod transport;

pub use command::Command;
pub use error::Error;
pub use response::Response;
pub use response::status::StatusWord;
pub use transport::{CardTransport, MockTransport, TransportError};

/// Prelude module containing commonly used types
pub mod prelude {
    pub use crate::command::Command;
    pub use crate::response::Response;
    pub use crate::response::status::{StatusWord, common as status};
    pub use crate::transport::{CardTransport, TransportError};
    pub use crate::{Bytes, BytesMut, Error};
}
