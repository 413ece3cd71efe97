//! SEND REMAINING: fetch the rest of a chained response.
//!
//! The applet signals a continuation with SW1 0x61; the session keeps
//! issuing this command until a final status arrives.

use keyfob_apdu_core::Command;

use crate::constants::ins;

pub(crate) fn command() -> Command {
    Command::new(super::CLA, ins::SEND_REMAINING, 0x00, 0x00)
}
