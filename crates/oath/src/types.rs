//! Small value types shared across the session and catalog

use std::fmt;

use bytes::Bytes;

use crate::error::ProtocolError;

/// Applet version reported in the select response
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    /// Major version
    pub major: u8,
    /// Minor version
    pub minor: u8,
    /// Patch version
    pub patch: u8,
}

impl Version {
    /// Create a version from its parts
    pub const fn new(major: u8, minor: u8, patch: u8) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl TryFrom<&[u8]> for Version {
    type Error = ProtocolError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        match value {
            [major, minor, patch] => Ok(Self::new(*major, *minor, *patch)),
            _ => Err(ProtocolError::Malformed("version is not 3 bytes")),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Identity bytes of a physical applet instance.
///
/// Returned at selection time, stable for the lifetime of the applet, and
/// used both as the PBKDF2 salt for password derivation and as the cache
/// key for previously derived unlock secrets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceId(Bytes);

impl DeviceId {
    /// Wrap raw identity bytes
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }
}

impl AsRef<[u8]> for DeviceId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0.iter() {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Digest algorithm used for challenge-response and code derivation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum HashAlgorithm {
    /// HMAC-SHA1 (the applet default)
    #[default]
    Sha1 = 0x01,
    /// HMAC-SHA256
    Sha256 = 0x02,
    /// HMAC-SHA512
    Sha512 = 0x03,
}

impl HashAlgorithm {
    /// Parse from the low nibble of a type/algorithm byte
    pub(crate) const fn from_wire(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Self::Sha1),
            0x02 => Some(Self::Sha256),
            0x03 => Some(Self::Sha512),
            _ => None,
        }
    }

    /// HMAC block size in bytes; keys longer than this get digested first
    pub(crate) const fn block_size(self) -> usize {
        match self {
            Self::Sha1 | Self::Sha256 => 64,
            Self::Sha512 => 128,
        }
    }
}

/// One-time code type of a credential
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OathType {
    /// Counter-based (RFC 4226); the applet owns the counter
    Hotp = 0x10,
    /// Time-based (RFC 6238)
    Totp = 0x20,
}

impl OathType {
    /// Parse from the high nibble of a type/algorithm byte
    pub(crate) const fn from_wire(value: u8) -> Option<Self> {
        match value {
            0x10 => Some(Self::Hotp),
            0x20 => Some(Self::Totp),
            _ => None,
        }
    }
}
