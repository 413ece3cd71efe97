//! Key derivation, challenge-response and code truncation.
//!
//! The unlock key is derived with PBKDF2-HMAC-SHA1 over the NFKD-normalized
//! password, salted with the device identity from the select response. The
//! applet's published parameters are a fixed 1000 iterations and a 16-byte
//! key. Challenge-response uses HMAC with the digest algorithm the applet
//! reports at select time.

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use pbkdf2::pbkdf2_hmac;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::constants::{DERIVED_KEY_LEN, PBKDF2_ITERATIONS};
use crate::error::ProtocolError;
use crate::types::{DeviceId, HashAlgorithm};

/// Secret derived from a password and a device identity.
///
/// This is what gets cached by the key manager instead of the password
/// itself. Zeroized on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey(Vec<u8>);

impl DerivedKey {
    /// Wrap raw key bytes
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Raw key bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DerivedKey({} bytes)", self.0.len())
    }
}

/// Derive the unlock key for a device from a password
pub(crate) fn derive_key(password: &str, device_id: &DeviceId) -> DerivedKey {
    let normalized: String = password.nfkd().collect();
    let mut key = vec![0u8; DERIVED_KEY_LEN];
    pbkdf2_hmac::<Sha1>(
        normalized.as_bytes(),
        device_id.as_ref(),
        PBKDF2_ITERATIONS,
        &mut key,
    );
    DerivedKey::new(key)
}

/// HMAC over a challenge with the given algorithm
pub(crate) fn challenge_response(
    algorithm: HashAlgorithm,
    key: &[u8],
    challenge: &[u8],
) -> Vec<u8> {
    match algorithm {
        HashAlgorithm::Sha1 => {
            let mut mac = Hmac::<Sha1>::new_from_slice(key).expect("HMAC takes keys of any size");
            mac.update(challenge);
            mac.finalize().into_bytes().to_vec()
        }
        HashAlgorithm::Sha256 => {
            let mut mac = Hmac::<Sha256>::new_from_slice(key).expect("HMAC takes keys of any size");
            mac.update(challenge);
            mac.finalize().into_bytes().to_vec()
        }
        HashAlgorithm::Sha512 => {
            let mut mac = Hmac::<Sha512>::new_from_slice(key).expect("HMAC takes keys of any size");
            mac.update(challenge);
            mac.finalize().into_bytes().to_vec()
        }
    }
}

/// Prepare a credential secret for PUT: digest it down when it exceeds the
/// HMAC block size, then right-pad to the applet's 14-byte minimum.
pub(crate) fn prepare_secret(secret: &[u8], algorithm: HashAlgorithm) -> Vec<u8> {
    let mut key = if secret.len() > algorithm.block_size() {
        match algorithm {
            HashAlgorithm::Sha1 => Sha1::digest(secret).to_vec(),
            HashAlgorithm::Sha256 => Sha256::digest(secret).to_vec(),
            HashAlgorithm::Sha512 => Sha512::digest(secret).to_vec(),
        }
    } else {
        secret.to_vec()
    };
    if key.len() < 14 {
        key.resize(14, 0);
    }
    key
}

/// Number of the time step containing `time`
pub(crate) fn time_step(time: SystemTime, period: u32) -> u64 {
    let seconds = time
        .duration_since(UNIX_EPOCH)
        .as_ref()
        .map_or(0, Duration::as_secs);
    seconds / u64::from(period.max(1))
}

/// 8-byte big-endian TOTP challenge for `time`
pub(crate) fn time_challenge(time: SystemTime, period: u32) -> [u8; 8] {
    time_step(time, period).to_be_bytes()
}

/// Validity window of the step containing `time`
pub(crate) fn step_window(time: SystemTime, period: u32) -> (SystemTime, SystemTime) {
    let step = time_step(time, period);
    let start = UNIX_EPOCH + Duration::from_secs(step * u64::from(period.max(1)));
    (start, start + Duration::from_secs(u64::from(period.max(1))))
}

/// Dynamic truncation of an HMAC digest (RFC 4226 §5.3)
pub(crate) fn dynamic_truncation(digest: &[u8]) -> Result<u32, ProtocolError> {
    let last = *digest
        .last()
        .ok_or(ProtocolError::Malformed("empty digest"))?;
    let offset = (last & 0x0F) as usize;
    let window = digest
        .get(offset..offset + 4)
        .ok_or(ProtocolError::Malformed("digest too short to truncate"))?;
    Ok(u32::from_be_bytes([window[0], window[1], window[2], window[3]]) & 0x7FFF_FFFF)
}

/// Format a truncated value as a zero-padded decimal code
pub(crate) fn format_code(value: u32, digits: u8) -> String {
    let digits = usize::from(digits);
    let modulus = 10u64.pow(digits as u32);
    format!("{:0width$}", u64::from(value) % modulus, width = digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 4226/6238 reference secret
    const SECRET: &[u8] = b"12345678901234567890";

    fn hotp(counter: u64, digits: u8) -> String {
        let digest = challenge_response(HashAlgorithm::Sha1, SECRET, &counter.to_be_bytes());
        format_code(dynamic_truncation(&digest).unwrap(), digits)
    }

    #[test]
    fn test_rfc4226_vectors() {
        let expected = [
            "755224", "287082", "359152", "969429", "338314", "254676", "287922", "162583",
            "399871", "520489",
        ];
        for (counter, want) in expected.iter().enumerate() {
            assert_eq!(hotp(counter as u64, 6), *want, "counter {counter}");
        }
    }

    #[test]
    fn test_rfc6238_vectors() {
        let cases: [(u64, &str); 6] = [
            (59, "94287082"),
            (1111111109, "07081804"),
            (1111111111, "14050471"),
            (1234567890, "89005924"),
            (2000000000, "69279037"),
            (20000000000, "65353130"),
        ];
        for (seconds, want) in cases {
            let time = UNIX_EPOCH + Duration::from_secs(seconds);
            let step = time_step(time, 30);
            assert_eq!(hotp(step, 8), want, "T={seconds}");
        }
    }

    #[test]
    fn test_dynamic_truncation_reference() {
        // Worked example from RFC 4226 §5.4
        let digest = hex::decode("1f8698690e02ca16618550ef7f19da8e945b555a").unwrap();
        assert_eq!(dynamic_truncation(&digest).unwrap(), 0x50ef7f19);
        assert_eq!(format_code(0x50ef7f19, 6), "872921");
    }

    #[test]
    fn test_derive_key_is_deterministic() {
        let id = DeviceId::new(vec![1, 2, 3, 4, 5, 6, 7, 8]);
        let a = derive_key("secret", &id);
        let b = derive_key("secret", &id);
        assert_eq!(a, b);
        assert_eq!(a.as_bytes().len(), 16);
    }

    #[test]
    fn test_derive_key_depends_on_salt() {
        let a = derive_key("secret", &DeviceId::new(vec![1; 8]));
        let b = derive_key("secret", &DeviceId::new(vec![2; 8]));
        assert_ne!(a, b);
    }

    #[test]
    fn test_prepare_secret_pads_and_shortens() {
        assert_eq!(prepare_secret(b"short", HashAlgorithm::Sha1).len(), 14);
        let long = [0xAB; 100];
        assert_eq!(prepare_secret(&long, HashAlgorithm::Sha1), Sha1::digest(long).to_vec());
        // At the block size the secret passes through untouched
        let exact = [0x01; 64];
        assert_eq!(prepare_secret(&exact, HashAlgorithm::Sha1), exact.to_vec());
    }

    #[test]
    fn test_step_window_brackets_time() {
        let time = UNIX_EPOCH + Duration::from_secs(59);
        let (from, until) = step_window(time, 30);
        assert_eq!(from, UNIX_EPOCH + Duration::from_secs(30));
        assert_eq!(until, UNIX_EPOCH + Duration::from_secs(60));
    }

    #[test]
    fn test_format_code_zero_pads() {
        assert_eq!(format_code(7, 6), "000007");
        assert_eq!(format_code(94287082 + 100_000_000, 8), "94287082");
    }
}
