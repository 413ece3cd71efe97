//! Credential catalog entries and applet payload parsing.
//!
//! Credential names on the wire are labels of the form
//! `[period/]issuer:account`. The period prefix appears only when a TOTP
//! credential deviates from the 30-second default; the issuer part is
//! optional.

use std::collections::HashMap;
use std::time::SystemTime;

use tracing::debug;

use crate::commands;
use crate::constants::{tags, DEFAULT_PERIOD};
use crate::error::ProtocolError;
use crate::tlv::TlvIter;
use crate::types::{HashAlgorithm, OathType};

/// One credential as stored in the applet catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialEntry {
    /// Full label exactly as stored on the applet
    pub name: String,
    /// Issuer component of the label, when present
    pub issuer: Option<String>,
    /// Account component of the label
    pub account: String,
    /// Code type
    pub oath_type: OathType,
    /// Digest algorithm
    pub algorithm: HashAlgorithm,
    /// Number of code digits; 6 unless the device reports otherwise
    pub digits: u8,
    /// TOTP time step in seconds; meaningful only for TOTP entries
    pub period: u32,
    /// Whether the applet demands a physical touch before calculating
    pub touch_required: bool,
}

impl CredentialEntry {
    fn from_label(label: String, oath_type: OathType, algorithm: HashAlgorithm) -> Self {
        let (period, issuer, account) = split_label(&label, oath_type);
        Self {
            name: label,
            issuer,
            account,
            oath_type,
            algorithm,
            digits: 6,
            period,
            touch_required: false,
        }
    }
}

/// A calculated one-time code together with its validity window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpCode {
    /// Zero-padded decimal code
    pub value: String,
    /// Start of the validity window
    pub valid_from: SystemTime,
    /// End of the validity window; `None` for HOTP codes, which stay
    /// valid until the next calculation advances the counter
    pub valid_until: Option<SystemTime>,
}

/// Split a label into its period, issuer and account parts
fn split_label(label: &str, oath_type: OathType) -> (u32, Option<String>, String) {
    let mut period = DEFAULT_PERIOD;
    let mut rest = label;
    if oath_type == OathType::Totp {
        if let Some((prefix, tail)) = label.split_once('/') {
            if let Ok(value) = prefix.parse::<u32>() {
                if value > 0 {
                    period = value;
                    rest = tail;
                }
            }
        }
    }
    match rest.split_once(':') {
        Some((issuer, account)) => (period, Some(issuer.to_owned()), account.to_owned()),
        None => (period, None, rest.to_owned()),
    }
}

/// Parse a LIST response payload into catalog entries.
///
/// Entries that do not decode (unknown type or algorithm nibble, empty or
/// non-UTF-8 name) are skipped rather than failing the whole listing; the
/// count of skipped entries is returned alongside.
pub(crate) fn parse_list(payload: &[u8]) -> Result<(Vec<CredentialEntry>, usize), ProtocolError> {
    let mut entries = Vec::new();
    let mut skipped = 0;
    for item in TlvIter::new(payload) {
        let (tag, value) = item?;
        if tag != tags::NAME_LIST {
            return Err(ProtocolError::Malformed("unexpected tag in list response"));
        }
        let Some((type_algo, name_bytes)) = value.split_first() else {
            skipped += 1;
            continue;
        };
        let oath_type = OathType::from_wire(type_algo & 0xF0);
        let algorithm = HashAlgorithm::from_wire(type_algo & 0x0F);
        let name = std::str::from_utf8(name_bytes).ok().filter(|n| !n.is_empty());
        match (oath_type, algorithm, name) {
            (Some(oath_type), Some(algorithm), Some(name)) => {
                entries.push(CredentialEntry::from_label(
                    name.to_owned(),
                    oath_type,
                    algorithm,
                ));
            }
            _ => {
                debug!(type_algo, "skipping undecodable catalog entry");
                skipped += 1;
            }
        }
    }
    Ok((entries, skipped))
}

/// Per-credential facts a CALCULATE ALL pass reveals that LIST does not
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CodeHint {
    /// Digit count from the leading byte of a truncated response
    pub(crate) digits: Option<u8>,
    /// Credential was reported with a touch marker
    pub(crate) touch: bool,
}

/// Parse a CALCULATE ALL response into per-name hints.
///
/// The payload alternates NAME entries with one response entry each: a
/// truncated code, an HOTP marker or a touch marker.
pub(crate) fn parse_calculate_all(
    payload: &[u8],
) -> Result<HashMap<String, CodeHint>, ProtocolError> {
    let mut hints = HashMap::new();
    let mut current: Option<String> = None;
    for item in TlvIter::new(payload) {
        let (tag, value) = item?;
        match tag {
            tags::NAME => {
                current = std::str::from_utf8(value).ok().map(str::to_owned);
            }
            tags::TRUNCATED | tags::RESPONSE => {
                if let Some(name) = current.take() {
                    // An out-of-range digits byte is dropped, not trusted
                    let digits = value
                        .first()
                        .copied()
                        .filter(|digits| (1..=commands::calculate::MAX_DIGITS).contains(digits));
                    hints.insert(name, CodeHint { digits, touch: false });
                }
            }
            tags::HOTP => {
                if let Some(name) = current.take() {
                    hints.insert(name, CodeHint::default());
                }
            }
            tags::TOUCH => {
                if let Some(name) = current.take() {
                    hints.insert(
                        name,
                        CodeHint {
                            digits: None,
                            touch: true,
                        },
                    );
                }
            }
            _ => return Err(ProtocolError::Malformed("unexpected tag in calculate all")),
        }
    }
    Ok(hints)
}
