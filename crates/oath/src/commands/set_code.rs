//! SET CODE: install or remove the applet password.
//!
//! Installing a key requires proving the host can actually use it: the
//! command carries a challenge and the HMAC answer computed with the new
//! key, so a typo'd derivation cannot lock the device. An empty KEY entry
//! removes the password.

use bytes::BytesMut;
use keyfob_apdu_core::Command;

use crate::constants::{ins, tags};
use crate::crypto;
use crate::tlv::push_tlv;
use crate::types::{HashAlgorithm, OathType};

pub(crate) fn set(key: &[u8], algorithm: HashAlgorithm, challenge: &[u8]) -> Command {
    let mut value = Vec::with_capacity(1 + key.len());
    value.push(OathType::Totp as u8 | algorithm as u8);
    value.extend_from_slice(key);

    let mut data = BytesMut::new();
    push_tlv(&mut data, tags::KEY, &value);
    push_tlv(&mut data, tags::CHALLENGE, challenge);
    let answer = crypto::challenge_response(algorithm, key, challenge);
    push_tlv(&mut data, tags::RESPONSE, &answer);
    Command::new_with_data(super::CLA, ins::SET_CODE, 0x00, 0x00, data.freeze())
}

pub(crate) fn clear() -> Command {
    let mut data = BytesMut::new();
    push_tlv(&mut data, tags::KEY, &[]);
    Command::new_with_data(super::CLA, ins::SET_CODE, 0x00, 0x00, data.freeze())
}
