//! CALCULATE: compute one code for a named credential.
//!
//! P2 selects the response form; the session always asks for the full
//! digest (P2 0x00) and truncates host-side, which keeps truncation
//! uniform across applet versions. TOTP credentials carry the time step as
//! an 8-byte challenge; HOTP credentials send the name alone and let the
//! applet advance its own counter.

use bytes::{Bytes, BytesMut};
use keyfob_apdu_core::{Command, Response};

use crate::constants::{ins, tags};
use crate::error::ProtocolError;
use crate::tlv::{find_tlv, push_tlv};

pub(crate) fn command(name: &str, challenge: Option<&[u8]>) -> Command {
    let mut data = BytesMut::new();
    push_tlv(&mut data, tags::NAME, name.as_bytes());
    if let Some(challenge) = challenge {
        push_tlv(&mut data, tags::CHALLENGE, challenge);
    }
    Command::new_with_data(super::CLA, ins::CALCULATE, 0x00, 0x00, data.freeze())
}

/// Widest digit count a code can meaningfully have; a truncated digest is
/// at most 31 bits, so ten decimal digits already exhaust it
pub(crate) const MAX_DIGITS: u8 = 10;

/// Digit count and full digest from a calculate response
pub(crate) fn parse(response: &Response) -> Result<(u8, Bytes), ProtocolError> {
    super::check_status(response.status())?;
    let value = find_tlv(response.payload(), tags::RESPONSE)?;
    let Some((&digits, digest)) = value.split_first() else {
        return Err(ProtocolError::Malformed("empty calculate response"));
    };
    if !(1..=MAX_DIGITS).contains(&digits) {
        return Err(ProtocolError::Malformed("implausible digit count"));
    }
    if digest.is_empty() {
        return Err(ProtocolError::Malformed("calculate response has no digest"));
    }
    Ok((digits, Bytes::copy_from_slice(digest)))
}
