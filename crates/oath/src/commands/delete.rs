//! DELETE: remove a credential by name

use bytes::BytesMut;
use keyfob_apdu_core::Command;

use crate::constants::{ins, tags};
use crate::tlv::push_tlv;

pub(crate) fn command(name: &str) -> Command {
    let mut data = BytesMut::new();
    push_tlv(&mut data, tags::NAME, name.as_bytes());
    Command::new_with_data(super::CLA, ins::DELETE, 0x00, 0x00, data.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_bytes() {
        let bytes = command("a").serialize(false).unwrap();
        assert_eq!(bytes.as_ref(), &[0x00, 0x02, 0x00, 0x00, 0x03, 0x71, 0x01, b'a']);
    }
}
