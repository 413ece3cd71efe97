//! OATH applet session: select, authenticate, operate.
//!
//! A session owns its transport exclusively. It is established by
//! selecting the applet, optionally unlocked with a password-derived key,
//! and then drives the credential catalog until closed or until the
//! transport is lost.

use std::time::SystemTime;

use bytes::{Bytes, BytesMut};
use keyfob_apdu_core::{CardTransport, Command, Response};
use rand::RngCore;
use tracing::{debug, trace, warn};

use crate::commands::{
    self, calculate, calculate_all, delete, list, put, select, send_remaining, set_code, validate,
};
use crate::constants::{DEFAULT_PERIOD, HOST_CHALLENGE_LEN};
use crate::credential::{self, CredentialEntry, OtpCode};
use crate::crypto::{self, DerivedKey};
use crate::error::{Error, ProtocolError, Result};
use crate::key_manager::KeyManager;
use crate::types::{DeviceId, HashAlgorithm, OathType, Version};

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Applet selected, no password set; catalog operations are allowed
    Selected,
    /// Applet selected but password-protected; unlock required
    Locked,
    /// Password accepted; catalog operations are allowed
    Unlocked,
    /// Transport released; no further operations possible
    Closed,
}

impl SessionState {
    const fn name(self) -> &'static str {
        match self {
            Self::Selected => "selected",
            Self::Locked => "locked",
            Self::Unlocked => "unlocked",
            Self::Closed => "closed",
        }
    }
}

/// An established session with the OATH applet
#[derive(Debug)]
pub struct OathSession<T: CardTransport> {
    transport: Option<T>,
    state: SessionState,
    version: Version,
    device_id: DeviceId,
    algorithm: HashAlgorithm,
    /// Applet challenge from the select response; present while locked
    challenge: Option<Bytes>,
}

impl<T: CardTransport> OathSession<T> {
    /// Select the applet on the given transport and establish a session
    pub fn new(mut transport: T) -> Result<Self> {
        let response = transceive_on(&mut transport, &select::command())?;
        let parsed = select::parse(&response)?;
        let state = if parsed.challenge.is_some() {
            SessionState::Locked
        } else {
            SessionState::Selected
        };
        debug!(
            version = %parsed.version,
            device_id = %parsed.device_id,
            state = state.name(),
            "applet selected"
        );
        Ok(Self {
            transport: Some(transport),
            state,
            version: parsed.version,
            device_id: parsed.device_id,
            algorithm: parsed.algorithm,
            challenge: parsed.challenge,
        })
    }

    /// Applet version reported at select time
    pub const fn version(&self) -> Version {
        self.version
    }

    /// Stable identity of the applet instance
    pub const fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    /// Current lifecycle state
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Whether an unlock is required before catalog operations
    pub const fn is_locked(&self) -> bool {
        matches!(self.state, SessionState::Locked)
    }

    /// Derive the unlock key from a password and unlock the session.
    ///
    /// On success the derived key is returned so the caller can hand it to
    /// a [`KeyManager`] for later silent unlocks. The password itself is
    /// never retained.
    pub fn unlock(&mut self, password: &str) -> Result<DerivedKey> {
        let key = crypto::derive_key(password, &self.device_id);
        self.unlock_with_key(&key)?;
        Ok(key)
    }

    /// Unlock with a previously derived key
    pub fn unlock_with_key(&mut self, key: &DerivedKey) -> Result<()> {
        let mut host_challenge = [0u8; HOST_CHALLENGE_LEN];
        rand::rng().fill_bytes(&mut host_challenge);
        self.unlock_inner(key, host_challenge)
    }

    /// Unlock silently from the key cache.
    ///
    /// A no-op when the session is not locked. Fails with
    /// `rejected = false` when no key is cached for this device, and with
    /// `rejected = true` when the cached key was refused; a refused key is
    /// dropped from the cache.
    pub fn unlock_cached(&mut self, manager: &KeyManager) -> Result<()> {
        if self.state != SessionState::Locked {
            return Ok(());
        }
        let Some(key) = manager.get(&self.device_id) else {
            return Err(Error::PasswordRequired {
                device_id: self.device_id.clone(),
                rejected: false,
            });
        };
        match self.unlock_with_key(&key) {
            Err(err @ Error::PasswordRequired { .. }) => {
                manager.clear(&self.device_id);
                Err(err)
            }
            other => other,
        }
    }

    fn unlock_inner(&mut self, key: &DerivedKey, host_challenge: [u8; HOST_CHALLENGE_LEN]) -> Result<()> {
        if self.state != SessionState::Locked {
            return Err(Error::SessionState(self.state.name()));
        }
        let Some(challenge) = self.challenge.clone() else {
            return Err(Error::SessionState(self.state.name()));
        };

        let answer = crypto::challenge_response(self.algorithm, key.as_bytes(), &challenge);
        let response = self.transceive(&validate::command(&answer, &host_challenge))?;
        let applet_answer = match validate::parse(&response) {
            Ok(answer) => answer,
            Err(ProtocolError::AuthRequired | ProtocolError::NotFound) => {
                return Err(self.password_rejected());
            }
            Err(other) => return Err(other.into()),
        };

        // A spoofed applet cannot answer the host challenge without the key
        let expected = crypto::challenge_response(self.algorithm, key.as_bytes(), &host_challenge);
        if applet_answer.as_ref() != expected.as_slice() {
            warn!(device_id = %self.device_id, "applet failed the host counter-challenge");
            return Err(self.password_rejected());
        }

        self.state = SessionState::Unlocked;
        debug!(device_id = %self.device_id, "session unlocked");
        Ok(())
    }

    fn password_rejected(&self) -> Error {
        Error::PasswordRequired {
            device_id: self.device_id.clone(),
            rejected: true,
        }
    }

    /// Enumerate the credential catalog.
    ///
    /// The listing merges a calculate-all pass, which is the only place
    /// the applet reveals digit counts and touch flags. Individual entries
    /// that fail to decode are skipped, not fatal.
    pub fn list(&mut self) -> Result<Vec<CredentialEntry>> {
        self.require_operable()?;
        let response = self.transceive(&list::command())?;
        commands::check_status(response.status())?;
        let (mut entries, skipped) = credential::parse_list(response.payload())?;
        if skipped > 0 {
            warn!(skipped, "skipped undecodable catalog entries");
        }

        let challenge = crypto::time_challenge(SystemTime::now(), DEFAULT_PERIOD);
        let response = self.transceive(&calculate_all::command(&challenge))?;
        commands::check_status(response.status())?;
        let hints = credential::parse_calculate_all(response.payload())?;
        for entry in &mut entries {
            if let Some(hint) = hints.get(&entry.name) {
                if let Some(digits) = hint.digits {
                    entry.digits = digits;
                }
                entry.touch_required = hint.touch;
            }
        }
        Ok(entries)
    }

    /// Calculate a one-time code for a credential.
    ///
    /// The applet returns the full HMAC digest and truncation happens
    /// here, which keeps code derivation uniform across applet versions.
    /// For HOTP credentials the applet advances its own counter.
    pub fn calculate(&mut self, entry: &CredentialEntry, time: SystemTime) -> Result<OtpCode> {
        self.require_operable()?;
        let command = match entry.oath_type {
            OathType::Totp => {
                let challenge = crypto::time_challenge(time, entry.period);
                calculate::command(&entry.name, Some(&challenge))
            }
            OathType::Hotp => calculate::command(&entry.name, None),
        };
        let response = self.transceive(&command)?;
        let (digits, digest) = calculate::parse(&response)?;
        let value = crypto::dynamic_truncation(&digest)?;

        let (valid_from, valid_until) = match entry.oath_type {
            OathType::Totp => {
                let (from, until) = crypto::step_window(time, entry.period);
                (from, Some(until))
            }
            OathType::Hotp => (time, None),
        };
        Ok(OtpCode {
            value: crypto::format_code(value, digits),
            valid_from,
            valid_until,
        })
    }

    /// Store a credential, replacing nothing: an existing name fails with
    /// [`ProtocolError::DuplicateName`]. The secret is not retained.
    pub fn put(
        &mut self,
        name: &str,
        secret: &[u8],
        oath_type: OathType,
        algorithm: HashAlgorithm,
        digits: u8,
        touch_required: bool,
    ) -> Result<()> {
        self.require_operable()?;
        let command = put::command(name, secret, oath_type, algorithm, digits, touch_required);
        let response = self.transceive(&command)?;
        commands::check_status(response.status())?;
        debug!(name, "credential stored");
        Ok(())
    }

    /// Delete a credential by name
    pub fn delete(&mut self, name: &str) -> Result<()> {
        self.require_operable()?;
        let response = self.transceive(&delete::command(name))?;
        commands::check_status(response.status())?;
        debug!(name, "credential deleted");
        Ok(())
    }

    /// Install a password-derived key as the applet password
    pub fn set_password(&mut self, key: &DerivedKey) -> Result<()> {
        self.require_operable()?;
        let mut challenge = [0u8; HOST_CHALLENGE_LEN];
        rand::rng().fill_bytes(&mut challenge);
        let command = set_code::set(key.as_bytes(), self.algorithm, &challenge);
        let response = self.transceive(&command)?;
        commands::check_status(response.status())?;
        // This session proved knowledge of the new key
        self.state = SessionState::Unlocked;
        debug!(device_id = %self.device_id, "applet password set");
        Ok(())
    }

    /// Remove the applet password
    pub fn clear_password(&mut self) -> Result<()> {
        self.require_operable()?;
        let response = self.transceive(&set_code::clear())?;
        commands::check_status(response.status())?;
        self.state = SessionState::Selected;
        self.challenge = None;
        debug!(device_id = %self.device_id, "applet password cleared");
        Ok(())
    }

    /// Release the transport. Idempotent; never fails.
    pub fn close(&mut self) {
        if self.transport.take().is_some() {
            debug!(device_id = %self.device_id, "session closed");
        }
        self.state = SessionState::Closed;
    }

    fn require_operable(&self) -> Result<()> {
        match self.state {
            SessionState::Selected | SessionState::Unlocked => Ok(()),
            SessionState::Locked | SessionState::Closed => {
                Err(Error::SessionState(self.state.name()))
            }
        }
    }

    fn transceive(&mut self, command: &Command) -> Result<Response> {
        let transport = self
            .transport
            .as_mut()
            .ok_or(Error::SessionState(SessionState::Closed.name()))?;
        transceive_on(transport, command)
    }
}

/// Exchange one command, following SW1 0x61 continuations until a final
/// status word arrives
fn transceive_on<T: CardTransport>(transport: &mut T, command: &Command) -> Result<Response> {
    let extended = transport.supports_extended_length();
    let bytes = command.serialize(extended)?;
    trace!(ins = command.ins, len = bytes.len(), "transmitting");
    let mut response = Response::from_bytes(&transport.transmit_raw(&bytes)?)?;

    if !response.status().has_more_data() {
        return Ok(response);
    }
    let mut payload = BytesMut::from(response.payload().as_ref());
    while response.status().has_more_data() {
        trace!(remaining = response.status().bytes_remaining(), "continuing");
        let next = send_remaining::command().serialize(extended)?;
        response = Response::from_bytes(&transport.transmit_raw(&next)?)?;
        payload.extend_from_slice(response.payload());
    }
    Ok(Response::new(payload.freeze(), response.status()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyfob_apdu_core::MockTransport;

    use crate::constants::tags;
    use crate::tlv::push_tlv;

    const DEVICE_ID: [u8; 8] = [0xDE, 0xAD, 0xBE, 0xEF, 0x01, 0x02, 0x03, 0x04];
    const APPLET_CHALLENGE: [u8; 8] = [9, 8, 7, 6, 5, 4, 3, 2];
    const HOST_CHALLENGE: [u8; 8] = [1, 1, 2, 2, 3, 3, 4, 4];

    fn select_response(locked: bool) -> Vec<u8> {
        let mut buf = BytesMut::new();
        push_tlv(&mut buf, tags::VERSION, &[5, 4, 3]);
        push_tlv(&mut buf, tags::NAME, &DEVICE_ID);
        if locked {
            push_tlv(&mut buf, tags::CHALLENGE, &APPLET_CHALLENGE);
            push_tlv(&mut buf, tags::ALGORITHM, &[0x01]);
        }
        let mut bytes = buf.to_vec();
        bytes.extend_from_slice(&[0x90, 0x00]);
        bytes
    }

    fn test_key() -> DerivedKey {
        crypto::derive_key("password", &DeviceId::new(DEVICE_ID.to_vec()))
    }

    /// Applet side of a successful VALIDATE for `test_key`
    fn validate_response() -> Vec<u8> {
        let key = test_key();
        let answer =
            crypto::challenge_response(HashAlgorithm::Sha1, key.as_bytes(), &HOST_CHALLENGE);
        let mut buf = BytesMut::new();
        push_tlv(&mut buf, tags::RESPONSE, &answer);
        let mut bytes = buf.to_vec();
        bytes.extend_from_slice(&[0x90, 0x00]);
        bytes
    }

    fn name_list_entry(type_algo: u8, name: &str) -> Vec<u8> {
        let mut value = vec![type_algo];
        value.extend_from_slice(name.as_bytes());
        let mut buf = BytesMut::new();
        push_tlv(&mut buf, tags::NAME_LIST, &value);
        buf.to_vec()
    }

    #[test]
    fn test_select_without_password() {
        let session = OathSession::new(MockTransport::with_response(select_response(false))).unwrap();
        assert_eq!(session.state(), SessionState::Selected);
        assert!(!session.is_locked());
        assert_eq!(session.version(), Version::new(5, 4, 3));
        assert_eq!(session.device_id().as_ref(), &DEVICE_ID);
    }

    #[test]
    fn test_select_with_password_is_locked() {
        let session = OathSession::new(MockTransport::with_response(select_response(true))).unwrap();
        assert_eq!(session.state(), SessionState::Locked);
        assert!(session.is_locked());
    }

    #[test]
    fn test_select_applet_missing() {
        let result = OathSession::new(MockTransport::with_response(vec![0x6A, 0x82]));
        assert!(matches!(result, Err(Error::AppletMissing)));
    }

    #[test]
    fn test_unlock_succeeds_and_checks_the_applet() {
        let mut mock = MockTransport::with_response(select_response(true));
        mock.push_response(validate_response());
        let mut session = OathSession::new(&mut mock).unwrap();

        session.unlock_inner(&test_key(), HOST_CHALLENGE).unwrap();
        assert_eq!(session.state(), SessionState::Unlocked);
        drop(session);

        // The VALIDATE command must carry the HMAC over the applet challenge
        let key = test_key();
        let expected =
            crypto::challenge_response(HashAlgorithm::Sha1, key.as_bytes(), &APPLET_CHALLENGE);
        let validate_cmd = &mock.transmitted()[1];
        let answer_at = 7; // header (5) + tag + length
        assert_eq!(validate_cmd[5], tags::RESPONSE);
        assert_eq!(&validate_cmd[answer_at..answer_at + 20], expected.as_slice());
    }

    #[test]
    fn test_wrong_password_stays_locked() {
        let mut mock = MockTransport::with_response(select_response(true));
        mock.push_response(vec![0x69, 0x82]);
        let mut session = OathSession::new(mock).unwrap();

        let result = session.unlock("wrong password");
        assert!(matches!(
            result,
            Err(Error::PasswordRequired { rejected: true, .. })
        ));
        assert_eq!(session.state(), SessionState::Locked);
    }

    #[test]
    fn test_spoofed_applet_is_rejected() {
        let mut mock = MockTransport::with_response(select_response(true));
        let mut buf = BytesMut::new();
        push_tlv(&mut buf, tags::RESPONSE, &[0x42; 20]);
        let mut bytes = buf.to_vec();
        bytes.extend_from_slice(&[0x90, 0x00]);
        mock.push_response(bytes);
        let mut session = OathSession::new(mock).unwrap();

        let result = session.unlock_inner(&test_key(), HOST_CHALLENGE);
        assert!(matches!(
            result,
            Err(Error::PasswordRequired { rejected: true, .. })
        ));
        assert_eq!(session.state(), SessionState::Locked);
    }

    #[test]
    fn test_locked_catalog_operation_fails_without_an_exchange() {
        let mut mock = MockTransport::with_response(select_response(true));
        let mut session = OathSession::new(&mut mock).unwrap();

        assert!(matches!(session.list(), Err(Error::SessionState(_))));
        assert!(matches!(session.delete("x"), Err(Error::SessionState(_))));
        drop(session);

        // Only the select command went over the wire
        assert_eq!(mock.transmitted().len(), 1);
    }

    #[test]
    fn test_unlock_cached_without_a_key() {
        let mock = MockTransport::with_response(select_response(true));
        let mut session = OathSession::new(mock).unwrap();

        let result = session.unlock_cached(&KeyManager::in_memory());
        assert!(matches!(
            result,
            Err(Error::PasswordRequired { rejected: false, .. })
        ));
    }

    #[test]
    fn test_unlock_cached_drops_a_refused_key() {
        let mut mock = MockTransport::with_response(select_response(true));
        mock.push_response(vec![0x69, 0x82]);
        let mut session = OathSession::new(mock).unwrap();

        let manager = KeyManager::in_memory();
        let id = DeviceId::new(DEVICE_ID.to_vec());
        manager.put(&id, DerivedKey::new(vec![0x11; 16]));

        let result = session.unlock_cached(&manager);
        assert!(matches!(
            result,
            Err(Error::PasswordRequired { rejected: true, .. })
        ));
        assert!(manager.get(&id).is_none());
    }

    #[test]
    fn test_unlock_cached_is_a_noop_when_operable() {
        let mock = MockTransport::with_response(select_response(false));
        let mut session = OathSession::new(mock).unwrap();
        session.unlock_cached(&KeyManager::in_memory()).unwrap();
        assert_eq!(session.state(), SessionState::Selected);
    }

    #[test]
    fn test_list_merges_calculate_all_hints() {
        let mut mock = MockTransport::with_response(select_response(false));
        let mut list_bytes = name_list_entry(0x21, "Example:alice");
        list_bytes.extend(name_list_entry(0x12, "Example:bob"));
        list_bytes.extend_from_slice(&[0x90, 0x00]);
        mock.push_response(list_bytes);

        let mut all = BytesMut::new();
        push_tlv(&mut all, tags::NAME, b"Example:alice");
        push_tlv(&mut all, tags::TRUNCATED, &[8, 0, 0, 0, 0]);
        push_tlv(&mut all, tags::NAME, b"Example:bob");
        push_tlv(&mut all, tags::HOTP, &[]);
        let mut all_bytes = all.to_vec();
        all_bytes.extend_from_slice(&[0x90, 0x00]);
        mock.push_response(all_bytes);

        let mut session = OathSession::new(mock).unwrap();
        let entries = session.list().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].digits, 8);
        assert_eq!(entries[1].digits, 6);
        assert!(!entries[0].touch_required);
    }

    #[test]
    fn test_chained_response_is_reassembled() {
        let mut mock = MockTransport::with_response(select_response(false));

        let mut part1 = name_list_entry(0x21, "Example:alice");
        part1.extend_from_slice(&[0x61, 0x10]);
        mock.push_response(part1);
        let mut part2 = name_list_entry(0x21, "Example:bob");
        part2.extend_from_slice(&[0x90, 0x00]);
        mock.push_response(part2);

        let mut all = BytesMut::new();
        push_tlv(&mut all, tags::NAME, b"Example:alice");
        push_tlv(&mut all, tags::TRUNCATED, &[6, 0, 0, 0, 0]);
        push_tlv(&mut all, tags::NAME, b"Example:bob");
        push_tlv(&mut all, tags::TRUNCATED, &[6, 0, 0, 0, 0]);
        let mut all_bytes = all.to_vec();
        all_bytes.extend_from_slice(&[0x90, 0x00]);
        mock.push_response(all_bytes);

        let mut session = OathSession::new(&mut mock).unwrap();
        let entries = session.list().unwrap();
        assert_eq!(entries.len(), 2);
        drop(session);

        // select, list, send-remaining, calculate-all
        assert_eq!(mock.transmitted().len(), 4);
        assert_eq!(mock.transmitted()[2].as_ref(), &[0x00, 0xA5, 0x00, 0x00]);
    }

    #[test]
    fn test_close_is_idempotent() {
        let mock = MockTransport::with_response(select_response(false));
        let mut session = OathSession::new(mock).unwrap();
        session.close();
        session.close();
        assert_eq!(session.state(), SessionState::Closed);
        assert!(matches!(session.list(), Err(Error::SessionState("closed"))));
    }

    #[test]
    fn test_end_to_end_select_unlock_list_calculate() {
        let mut mock = MockTransport::with_response(select_response(true));
        mock.push_response(validate_response());

        // Catalog: two decodable entries and one with a bogus algorithm
        let mut list_bytes = name_list_entry(0x21, "Example:alice");
        list_bytes.extend(name_list_entry(0x2F, "Example:broken"));
        list_bytes.extend(name_list_entry(0x21, "Example:bob"));
        list_bytes.extend_from_slice(&[0x90, 0x00]);
        mock.push_response(list_bytes);
        let mut all = BytesMut::new();
        push_tlv(&mut all, tags::NAME, b"Example:alice");
        push_tlv(&mut all, tags::TRUNCATED, &[6, 0, 0, 0, 0]);
        push_tlv(&mut all, tags::NAME, b"Example:bob");
        push_tlv(&mut all, tags::TRUNCATED, &[6, 0, 0, 0, 0]);
        let mut all_bytes = all.to_vec();
        all_bytes.extend_from_slice(&[0x90, 0x00]);
        mock.push_response(all_bytes);

        // Calculate response: HMAC-SHA1("12345678901234567890", counter 0),
        // which truncates to 755224
        let digest = hex::decode("cc93cf18508d94934c64b65d8ba7667fb7cde4b0").unwrap();
        let mut value = vec![6u8];
        value.extend_from_slice(&digest);
        let mut buf = BytesMut::new();
        push_tlv(&mut buf, tags::RESPONSE, &value);
        let mut calc_bytes = buf.to_vec();
        calc_bytes.extend_from_slice(&[0x90, 0x00]);
        mock.push_response(calc_bytes);

        let mut session = OathSession::new(mock).unwrap();
        session.unlock_inner(&test_key(), HOST_CHALLENGE).unwrap();

        let entries = session.list().unwrap();
        assert_eq!(entries.len(), 2);

        let time = std::time::UNIX_EPOCH + std::time::Duration::from_secs(42);
        let code = session.calculate(&entries[0], time).unwrap();
        assert_eq!(code.value, "755224");
        assert_eq!(code.valid_from, std::time::UNIX_EPOCH + std::time::Duration::from_secs(30));
        assert_eq!(
            code.valid_until,
            Some(std::time::UNIX_EPOCH + std::time::Duration::from_secs(60))
        );
    }

    #[test]
    fn test_hotp_code_has_an_open_window() {
        let mut mock = MockTransport::with_response(select_response(false));
        let digest = hex::decode("75a48a19d4cbe100644e8ac1397eea747a2d33ab").unwrap();
        let mut value = vec![6u8];
        value.extend_from_slice(&digest);
        let mut buf = BytesMut::new();
        push_tlv(&mut buf, tags::RESPONSE, &value);
        let mut bytes = buf.to_vec();
        bytes.extend_from_slice(&[0x90, 0x00]);
        mock.push_response(bytes);

        let mut session = OathSession::new(&mut mock).unwrap();
        let entry = CredentialEntry {
            name: "Example:bob".to_owned(),
            issuer: Some("Example".to_owned()),
            account: "bob".to_owned(),
            oath_type: OathType::Hotp,
            algorithm: HashAlgorithm::Sha1,
            digits: 6,
            period: DEFAULT_PERIOD,
            touch_required: false,
        };
        let code = session.calculate(&entry, SystemTime::now()).unwrap();
        assert_eq!(code.value, "287082");
        assert!(code.valid_until.is_none());
        drop(session);

        // The HOTP calculate command must not carry a challenge entry
        let calc_cmd = &mock.transmitted()[1];
        let name_len = "Example:bob".len();
        assert_eq!(calc_cmd.len(), 5 + 2 + name_len);
    }

    #[test]
    fn test_corrupt_digit_count_is_an_error_not_a_panic() {
        let mut mock = MockTransport::with_response(select_response(false));
        let mut value = vec![0xFFu8];
        value.extend_from_slice(&[0xCC; 20]);
        let mut buf = BytesMut::new();
        push_tlv(&mut buf, tags::RESPONSE, &value);
        let mut bytes = buf.to_vec();
        bytes.extend_from_slice(&[0x90, 0x00]);
        mock.push_response(bytes);
        mock.push_response(vec![0x90, 0x00]);

        let mut session = OathSession::new(mock).unwrap();
        let entry = CredentialEntry {
            name: "Example:alice".to_owned(),
            issuer: Some("Example".to_owned()),
            account: "alice".to_owned(),
            oath_type: OathType::Totp,
            algorithm: HashAlgorithm::Sha1,
            digits: 6,
            period: DEFAULT_PERIOD,
            touch_required: false,
        };

        let result = session.calculate(&entry, SystemTime::now());
        assert!(matches!(
            result,
            Err(Error::Protocol(ProtocolError::Malformed(_)))
        ));
        // A malformed response does not invalidate the session
        assert_eq!(session.state(), SessionState::Selected);
        session.delete("Example:alice").unwrap();
    }

    #[test]
    fn test_duplicate_name_on_put() {
        let mut mock = MockTransport::with_response(select_response(false));
        mock.push_response(vec![0x6A, 0x89]);
        let mut session = OathSession::new(mock).unwrap();

        let result = session.put(
            "Example:alice",
            &[0xAB; 20],
            OathType::Totp,
            HashAlgorithm::Sha1,
            6,
            false,
        );
        assert!(matches!(
            result,
            Err(Error::Protocol(ProtocolError::DuplicateName))
        ));
    }

    #[test]
    fn test_set_and_clear_password() {
        let mut mock = MockTransport::with_response(select_response(false));
        mock.push_response(vec![0x90, 0x00]);
        mock.push_response(vec![0x90, 0x00]);
        let mut session = OathSession::new(mock).unwrap();

        session.set_password(&DerivedKey::new(vec![0x22; 16])).unwrap();
        assert_eq!(session.state(), SessionState::Unlocked);

        session.clear_password().unwrap();
        assert_eq!(session.state(), SessionState::Selected);
    }
}
