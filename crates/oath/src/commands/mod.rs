//! Builders and parsers for the applet command set.
//!
//! Each module pairs a `command()` builder with a parser for the response
//! payload. Builders return plain [`Command`] values; the session layer
//! owns serialization, the continuation loop and state checks.
//!
//! [`Command`]: keyfob_apdu_core::Command

pub(crate) mod calculate;
pub(crate) mod calculate_all;
pub(crate) mod delete;
pub(crate) mod list;
pub(crate) mod put;
pub(crate) mod select;
pub(crate) mod send_remaining;
pub(crate) mod set_code;
pub(crate) mod validate;

use keyfob_apdu_core::response::status::{common, StatusWord};

use crate::error::ProtocolError;

/// Class byte shared by the whole command set
pub(crate) const CLA: u8 = 0x00;

/// Map an applet status word onto the protocol error taxonomy
pub(crate) fn check_status(status: StatusWord) -> Result<(), ProtocolError> {
    if status.is_success() {
        return Ok(());
    }
    Err(match status {
        common::SECURITY_STATUS_NOT_SATISFIED => ProtocolError::AuthRequired,
        common::NO_SUCH_OBJECT => ProtocolError::NotFound,
        common::FILE_ALREADY_EXISTS => ProtocolError::DuplicateName,
        common::MEMORY_FULL => ProtocolError::NoSpace,
        common::WRONG_SYNTAX => ProtocolError::Malformed("applet rejected command syntax"),
        other => ProtocolError::UnexpectedStatus(other),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(check_status(common::SUCCESS).is_ok());
        assert_eq!(
            check_status(StatusWord::new(0x69, 0x82)),
            Err(ProtocolError::AuthRequired)
        );
        assert_eq!(
            check_status(StatusWord::new(0x69, 0x84)),
            Err(ProtocolError::NotFound)
        );
        assert_eq!(
            check_status(StatusWord::new(0x6A, 0x89)),
            Err(ProtocolError::DuplicateName)
        );
        assert_eq!(
            check_status(StatusWord::new(0x6A, 0x84)),
            Err(ProtocolError::NoSpace)
        );
        assert_eq!(
            check_status(StatusWord::new(0x6F, 0x00)),
            Err(ProtocolError::UnexpectedStatus(StatusWord::new(0x6F, 0x00)))
        );
    }
}
