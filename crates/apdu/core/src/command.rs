//! APDU command definitions
//!
//! This module provides the [`Command`] type for building APDU commands
//! according to ISO/IEC 7816-4, including short and extended length
//! serialization.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::Error;

/// Maximum data length encodable with a single-byte Lc
pub const SHORT_FORM_MAX: usize = 255;

/// Generic APDU command structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Command class byte
    pub cla: u8,
    /// Instruction byte
    pub ins: u8,
    /// Parameter 1
    pub p1: u8,
    /// Parameter 2
    pub p2: u8,
    /// Command data (optional)
    pub data: Option<Bytes>,
    /// Expected response length (optional)
    pub le: Option<u16>,
}

impl Command {
    /// Create a new command with just the header bytes
    pub const fn new(cla: u8, ins: u8, p1: u8, p2: u8) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: None,
            le: None,
        }
    }

    /// Create a new command with data payload
    pub fn new_with_data<T: Into<Bytes>>(cla: u8, ins: u8, p1: u8, p2: u8, data: T) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: Some(data.into()),
            le: None,
        }
    }

    /// Set the data field
    pub fn with_data<T: Into<Bytes>>(mut self, data: T) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Set the expected length field
    pub const fn with_le(mut self, le: u16) -> Self {
        self.le = Some(le);
        self
    }

    /// Serialize the command to raw APDU bytes.
    ///
    /// When `extended` is false the short form is used throughout: payloads
    /// larger than 255 bytes fail with [`Error::PayloadTooLarge`]. When
    /// `extended` is true and the payload (or Le) does not fit the short
    /// form, the 3-byte extended encoding is emitted instead.
    pub fn serialize(&self, extended: bool) -> Result<Bytes, Error> {
        let data_len = self.data.as_ref().map_or(0, |d| d.len());
        let needs_extended = data_len > SHORT_FORM_MAX || self.le.is_some_and(|le| le > 256);

        if needs_extended && !extended {
            return Err(Error::PayloadTooLarge {
                len: data_len,
                max: SHORT_FORM_MAX,
            });
        }
        if data_len > u16::MAX as usize {
            return Err(Error::PayloadTooLarge {
                len: data_len,
                max: u16::MAX as usize,
            });
        }

        let mut buffer = BytesMut::with_capacity(7 + data_len + 3);

        // Header: CLA, INS, P1, P2
        buffer.put_u8(self.cla);
        buffer.put_u8(self.ins);
        buffer.put_u8(self.p1);
        buffer.put_u8(self.p2);

        // Lc and data
        if let Some(data) = &self.data {
            if needs_extended {
                buffer.put_u8(0x00);
                buffer.put_u16(data.len() as u16);
            } else {
                buffer.put_u8(data.len() as u8);
            }
            buffer.put_slice(data);
        }

        // Le
        if let Some(le) = self.le {
            if needs_extended {
                if self.data.is_none() {
                    buffer.put_u8(0x00);
                }
                buffer.put_u16(le);
            } else {
                // Le of 256 is encoded as 0x00 in the short form
                buffer.put_u8(le as u8);
            }
        }

        Ok(buffer.freeze())
    }

    /// Parse a command from raw bytes.
    ///
    /// Handles both short and extended length bodies. The length fields
    /// themselves are derived, so `from_bytes(serialize(cmd))` reproduces
    /// the original class, instruction, parameters and data.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() < 4 {
            return Err(Error::InvalidCommandLength(bytes.len()));
        }

        let mut command = Self::new(bytes[0], bytes[1], bytes[2], bytes[3]);
        let body = &bytes[4..];

        match body {
            [] => Ok(command),
            // Le only
            [le] => {
                command.le = Some(*le as u16);
                Ok(command)
            }
            // Extended Le with no data: 00 LE1 LE2
            [0x00, le1, le2] => {
                command.le = Some(u16::from_be_bytes([*le1, *le2]));
                Ok(command)
            }
            // Extended form, marked by a zero prefix byte
            [0x00, rest @ ..] if rest.len() >= 2 => {
                let lc = u16::from_be_bytes([rest[0], rest[1]]) as usize;
                let rest = &rest[2..];
                if rest.len() < lc {
                    return Err(Error::InvalidCommandLength(bytes.len()));
                }
                if lc > 0 {
                    command.data = Some(Bytes::copy_from_slice(&rest[..lc]));
                }
                match &rest[lc..] {
                    [] => Ok(command),
                    [le1, le2] => {
                        command.le = Some(u16::from_be_bytes([*le1, *le2]));
                        Ok(command)
                    }
                    _ => Err(Error::InvalidCommandLength(bytes.len())),
                }
            }
            // Short form: Lc, data, optional Le
            [lc, rest @ ..] => {
                let lc = *lc as usize;
                if rest.len() < lc {
                    return Err(Error::InvalidCommandLength(bytes.len()));
                }
                if lc > 0 {
                    command.data = Some(Bytes::copy_from_slice(&rest[..lc]));
                }
                match &rest[lc..] {
                    [] => Ok(command),
                    [le] => {
                        command.le = Some(*le as u16);
                        Ok(command)
                    }
                    _ => Err(Error::InvalidCommandLength(bytes.len())),
                }
            }
        }
    }
}
