//! CALCULATE ALL: compute truncated codes for every TOTP credential.
//!
//! One challenge covers every default-period credential; the applet answers
//! with markers instead of codes for HOTP and touch-required entries. The
//! session uses this pass to learn digit counts and touch flags the LIST
//! response does not carry.

use bytes::BytesMut;
use keyfob_apdu_core::Command;

use crate::constants::{ins, tags};
use crate::tlv::push_tlv;

pub(crate) fn command(challenge: &[u8]) -> Command {
    let mut data = BytesMut::new();
    push_tlv(&mut data, tags::CHALLENGE, challenge);
    Command::new_with_data(super::CLA, ins::CALCULATE_ALL, 0x00, 0x01, data.freeze())
}
