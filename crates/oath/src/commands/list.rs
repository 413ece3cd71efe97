//! LIST: enumerate the credential catalog

use keyfob_apdu_core::Command;

use crate::constants::ins;

pub(crate) fn command() -> Command {
    Command::new(super::CLA, ins::LIST, 0x00, 0x00)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_bytes() {
        let bytes = command().serialize(false).unwrap();
        assert_eq!(bytes.as_ref(), &[0x00, 0xA1, 0x00, 0x00]);
    }
}
