//! VALIDATE: answer the applet's select-time challenge.
//!
//! The command carries the host's HMAC over the applet challenge plus a
//! fresh host challenge. A genuine applet proves knowledge of the same key
//! by answering the host challenge in its response; the session verifies
//! that answer before treating the device as unlocked.

use bytes::{Bytes, BytesMut};
use keyfob_apdu_core::{Command, Response};

use crate::constants::{ins, tags};
use crate::error::ProtocolError;
use crate::tlv::{find_tlv, push_tlv};

pub(crate) fn command(response: &[u8], host_challenge: &[u8]) -> Command {
    let mut data = BytesMut::new();
    push_tlv(&mut data, tags::RESPONSE, response);
    push_tlv(&mut data, tags::CHALLENGE, host_challenge);
    Command::new_with_data(super::CLA, ins::VALIDATE, 0x00, 0x00, data.freeze())
}

/// The applet's answer to the host challenge
pub(crate) fn parse(response: &Response) -> Result<Bytes, ProtocolError> {
    super::check_status(response.status())?;
    let answer = find_tlv(response.payload(), tags::RESPONSE)?;
    Ok(Bytes::copy_from_slice(answer))
}
