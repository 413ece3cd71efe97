//! SELECT: activate the applet and read its identity.
//!
//! The select response carries the applet version, the stable device
//! identity and, when a password is set, a challenge the host must answer
//! before the catalog opens up.

use bytes::Bytes;
use keyfob_apdu_core::{response::status::common, Command, Response};

use crate::constants::{ins, tags, MIN_SUPPORTED_VERSION, OATH_AID};
use crate::error::{Error, ProtocolError, Result};
use crate::tlv::TlvIter;
use crate::types::{DeviceId, HashAlgorithm, Version};

/// Decoded select response
#[derive(Debug, Clone)]
pub(crate) struct SelectResponse {
    pub(crate) version: Version,
    pub(crate) device_id: DeviceId,
    /// Present only when the applet is password-protected
    pub(crate) challenge: Option<Bytes>,
    pub(crate) algorithm: HashAlgorithm,
}

pub(crate) fn command() -> Command {
    Command::new_with_data(super::CLA, ins::SELECT, 0x04, 0x00, OATH_AID)
}

pub(crate) fn parse(response: &Response) -> Result<SelectResponse> {
    match response.status() {
        status if status.is_success() => {}
        common::FILE_NOT_FOUND | common::INS_NOT_SUPPORTED => return Err(Error::AppletMissing),
        other => return Err(ProtocolError::UnexpectedStatus(other).into()),
    }

    let mut version = None;
    let mut device_id = None;
    let mut challenge = None;
    let mut algorithm = HashAlgorithm::default();
    for item in TlvIter::new(response.payload()) {
        let (tag, value) = item.map_err(|_| Error::AppletSelect("undecodable payload"))?;
        match tag {
            tags::VERSION => {
                version = Some(
                    Version::try_from(value)
                        .map_err(|_| Error::AppletSelect("version is not 3 bytes"))?,
                );
            }
            tags::NAME => device_id = Some(DeviceId::new(value.to_vec())),
            tags::CHALLENGE if !value.is_empty() => {
                challenge = Some(Bytes::copy_from_slice(value));
            }
            tags::ALGORITHM => {
                algorithm = value
                    .first()
                    .and_then(|byte| HashAlgorithm::from_wire(*byte))
                    .ok_or(Error::AppletSelect("unknown challenge algorithm"))?;
            }
            _ => {}
        }
    }

    let version = version.ok_or(Error::AppletSelect("missing version"))?;
    if version < MIN_SUPPORTED_VERSION {
        return Err(Error::UnsupportedApplet {
            version,
            min: MIN_SUPPORTED_VERSION,
        });
    }
    let device_id = device_id.ok_or(Error::AppletSelect("missing device identity"))?;

    Ok(SelectResponse {
        version,
        device_id,
        challenge,
        algorithm,
    })
}
