//! PUT: store or replace a credential.
//!
//! The KEY value packs the type/algorithm byte and digit count in front of
//! the secret. The touch property rides behind the key as a bare property
//! pair, not as a length-prefixed entry.

use bytes::BytesMut;
use keyfob_apdu_core::Command;

use crate::constants::{ins, properties, tags};
use crate::crypto;
use crate::tlv::push_tlv;
use crate::types::{HashAlgorithm, OathType};

pub(crate) fn command(
    name: &str,
    secret: &[u8],
    oath_type: OathType,
    algorithm: HashAlgorithm,
    digits: u8,
    touch_required: bool,
) -> Command {
    let key = crypto::prepare_secret(secret, algorithm);
    let mut value = Vec::with_capacity(2 + key.len());
    value.push(oath_type as u8 | algorithm as u8);
    value.push(digits);
    value.extend_from_slice(&key);

    let mut data = BytesMut::new();
    push_tlv(&mut data, tags::NAME, name.as_bytes());
    push_tlv(&mut data, tags::KEY, &value);
    if touch_required {
        data.extend_from_slice(&[tags::PROPERTY, properties::REQUIRE_TOUCH]);
    }
    Command::new_with_data(super::CLA, ins::PUT, 0x00, 0x00, data.freeze())
}
