//! OATH applet session management
//!
//! This crate drives the OATH applet found on security keys over any
//! [`CardTransport`](keyfob_apdu_core::CardTransport): applet selection,
//! password unlock via mutual challenge-response, the credential catalog
//! (list/add/delete) and one-time code calculation. The long-term
//! credential secrets never leave the applet; the host only ever sees
//! truncated digests.
//!
//! A typical exchange:
//!
//! ```no_run
//! # use keyfob_oath::{KeyManager, MemoryStore, OathSession};
//! # use keyfob_transport_nfc::{NfcConfig, NfcTransport};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let keys = KeyManager::new(std::sync::Arc::new(MemoryStore::new()));
//! let transport = NfcTransport::connect("ACS ACR122U", NfcConfig::default())?;
//!
//! let mut session = OathSession::new(transport)?;
//! if session.is_locked() {
//!     let key = session.unlock("password")?;
//!     keys.put(session.device_id(), key);
//! }
//! for entry in session.list()? {
//!     let code = session.calculate(&entry, std::time::SystemTime::now())?;
//!     println!("{}: {}", entry.name, code.value);
//! }
//! session.close();
//! # Ok(())
//! # }
//! ```
#![forbid(unsafe_code)]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]

mod commands;
mod constants;
mod credential;
mod crypto;
mod error;
mod key_manager;
mod session;
mod tlv;
mod types;

pub use credential::{CredentialEntry, OtpCode};
pub use crypto::DerivedKey;
pub use error::{Error, ProtocolError, Result};
pub use key_manager::{KeyManager, MemoryStore, SecretStore};
pub use session::{OathSession, SessionState};
pub use types::{DeviceId, HashAlgorithm, OathType, Version};

pub use constants::{DEFAULT_PERIOD, MIN_SUPPORTED_VERSION, OATH_AID};
