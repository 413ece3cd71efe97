//! Wire constants fixed by the OATH applet's published command set

use crate::types::Version;

/// Application identifier of the OATH applet
pub const OATH_AID: &[u8] = b"\xA0\x00\x00\x05\x27\x21\x01";

/// Oldest applet version this crate knows how to drive
pub const MIN_SUPPORTED_VERSION: Version = Version::new(1, 0, 0);

/// TOTP time step in seconds unless a credential overrides it
pub const DEFAULT_PERIOD: u32 = 30;

/// PBKDF2 iteration count for password-derived unlock keys
pub(crate) const PBKDF2_ITERATIONS: u32 = 1000;
/// Length in bytes of the derived unlock key
pub(crate) const DERIVED_KEY_LEN: usize = 16;
/// Length in bytes of the host counter-challenge sent with VALIDATE
pub(crate) const HOST_CHALLENGE_LEN: usize = 8;

pub(crate) mod ins {
    pub(crate) const PUT: u8 = 0x01;
    pub(crate) const DELETE: u8 = 0x02;
    pub(crate) const SET_CODE: u8 = 0x03;
    pub(crate) const SELECT: u8 = 0xA4;
    pub(crate) const LIST: u8 = 0xA1;
    pub(crate) const CALCULATE: u8 = 0xA2;
    pub(crate) const VALIDATE: u8 = 0xA3;
    pub(crate) const CALCULATE_ALL: u8 = 0xA4;
    pub(crate) const SEND_REMAINING: u8 = 0xA5;
}

pub(crate) mod tags {
    /// Credential name / device identity (select response)
    pub(crate) const NAME: u8 = 0x71;
    /// List response entry: algorithm/type byte followed by the name
    pub(crate) const NAME_LIST: u8 = 0x72;
    /// Secret key material (PUT, SET CODE)
    pub(crate) const KEY: u8 = 0x73;
    /// Challenge bytes (select response, VALIDATE, CALCULATE)
    pub(crate) const CHALLENGE: u8 = 0x74;
    /// Full response: digit count followed by the whole digest
    pub(crate) const RESPONSE: u8 = 0x75;
    /// Truncated response: digit count followed by a 4-byte code
    pub(crate) const TRUNCATED: u8 = 0x76;
    /// Marks an HOTP credential in a CALCULATE ALL response
    pub(crate) const HOTP: u8 = 0x77;
    /// Credential property byte (PUT); not length-prefixed on the wire
    pub(crate) const PROPERTY: u8 = 0x78;
    /// Applet version (select response)
    pub(crate) const VERSION: u8 = 0x79;
    /// Challenge-response algorithm (select response)
    pub(crate) const ALGORITHM: u8 = 0x7B;
    /// Marks a touch-required credential in a CALCULATE ALL response
    pub(crate) const TOUCH: u8 = 0x7C;
}

pub(crate) mod properties {
    /// Credential requires a physical touch before calculation
    pub(crate) const REQUIRE_TOUCH: u8 = 0x02;
}
