//! APDU response parsing and status word interpretation

use bytes::Bytes;

use crate::error::Error;

pub mod status {
    //! Status word type and well-known values

    use std::fmt;

    /// Two-byte status word trailing every APDU response
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StatusWord {
        /// First status byte (SW1)
        pub sw1: u8,
        /// Second status byte (SW2)
        pub sw2: u8,
    }

    impl StatusWord {
        /// Create a new status word
        pub const fn new(sw1: u8, sw2: u8) -> Self {
            Self { sw1, sw2 }
        }

        /// Combined 16-bit value
        pub const fn to_u16(self) -> u16 {
            ((self.sw1 as u16) << 8) | self.sw2 as u16
        }

        /// Whether this status word denotes success (0x9000)
        pub const fn is_success(self) -> bool {
            self.to_u16() == common::SUCCESS.to_u16()
        }

        /// Whether more response data is available (SW1 == 0x61)
        pub const fn has_more_data(self) -> bool {
            self.sw1 == 0x61
        }

        /// Number of bytes still available when SW1 == 0x61
        pub const fn bytes_remaining(self) -> u8 {
            self.sw2
        }
    }

    impl fmt::Display for StatusWord {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{:02X}{:02X}", self.sw1, self.sw2)
        }
    }

    impl From<StatusWord> for u16 {
        fn from(sw: StatusWord) -> Self {
            sw.to_u16()
        }
    }

    /// Well-known status words
    pub mod common {
        use super::StatusWord;

        /// Normal processing, no further qualification
        pub const SUCCESS: StatusWord = StatusWord::new(0x90, 0x00);
        /// Security status not satisfied (authentication required)
        pub const SECURITY_STATUS_NOT_SATISFIED: StatusWord = StatusWord::new(0x69, 0x82);
        /// Conditions of use not satisfied
        pub const CONDITIONS_NOT_SATISFIED: StatusWord = StatusWord::new(0x69, 0x85);
        /// Referenced data not found
        pub const NO_SUCH_OBJECT: StatusWord = StatusWord::new(0x69, 0x84);
        /// Incorrect parameters in the data field
        pub const WRONG_SYNTAX: StatusWord = StatusWord::new(0x6A, 0x80);
        /// File or application not found
        pub const FILE_NOT_FOUND: StatusWord = StatusWord::new(0x6A, 0x82);
        /// Not enough memory space in the file
        pub const MEMORY_FULL: StatusWord = StatusWord::new(0x6A, 0x84);
        /// File or object already exists
        pub const FILE_ALREADY_EXISTS: StatusWord = StatusWord::new(0x6A, 0x89);
        /// Incorrect P1/P2 parameters
        pub const INCORRECT_P1P2: StatusWord = StatusWord::new(0x6A, 0x86);
        /// Instruction not supported or invalid
        pub const INS_NOT_SUPPORTED: StatusWord = StatusWord::new(0x6D, 0x00);
        /// Generic execution error
        pub const GENERIC_ERROR: StatusWord = StatusWord::new(0x65, 0x81);
    }
}

use status::StatusWord;

/// Decoded APDU response: payload plus trailing status word
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    payload: Bytes,
    status: StatusWord,
}

impl Response {
    /// Create a response from its parts
    pub const fn new(payload: Bytes, status: StatusWord) -> Self {
        Self { payload, status }
    }

    /// Split raw transport bytes into payload and status word
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let Some((payload, sw)) = bytes.len().checked_sub(2).map(|at| bytes.split_at(at)) else {
            return Err(Error::TruncatedResponse(bytes.len()));
        };
        Ok(Self {
            payload: Bytes::copy_from_slice(payload),
            status: StatusWord::new(sw[0], sw[1]),
        })
    }

    /// Response data, without the status word
    pub const fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Take ownership of the response data
    pub fn into_payload(self) -> Bytes {
        self.payload
    }

    /// The trailing status word
    pub const fn status(&self) -> StatusWord {
        self.status
    }

    /// Whether the status word denotes success
    pub const fn is_success(&self) -> bool {
        self.status.is_success()
    }
}
