//! Card transport contract
//!
//! A transport moves raw APDU bytes to a card and back. Implementations
//! exist for USB bulk (CCID framing) and contactless (PC/SC) backends;
//! [`MockTransport`] provides a scripted stand-in for tests.

use std::collections::VecDeque;
use std::fmt;

use bytes::Bytes;

/// Errors raised by a card transport
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// I/O failure while exchanging with the device
    #[error("transport I/O error: {0}")]
    Io(String),

    /// The OS has not yet granted access to the device. The caller should
    /// retry the operation once the permission grant event arrives.
    #[error("device access permission not yet granted")]
    PermissionPending,

    /// The device was unplugged or the tag left the field mid-session
    #[error("device or tag disconnected")]
    Disconnected,

    /// Backend-specific failure that retrying will not fix
    #[error("device error: {0}")]
    Device(String),

    /// The response did not fit the receive buffer
    #[error("response buffer too small")]
    BufferTooSmall,
}

impl TransportError {
    /// Whether the condition clears on its own: a permission grant, the
    /// next tag tap, or a straightforward retry.
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Io(_) | Self::PermissionPending | Self::Disconnected
        )
    }
}

/// Blocking byte-exchange contract implemented by every physical backend.
///
/// A transport carries exactly one request/response pair at a time. It is
/// owned exclusively by a session for the duration of that session and is
/// invalidated by disconnect or tag loss.
pub trait CardTransport: fmt::Debug + Send {
    /// Send raw command bytes and wait for the raw response bytes
    fn transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, TransportError>;

    /// Largest command payload this transport can carry in one exchange
    fn max_payload_len(&self) -> usize {
        255
    }

    /// Whether extended length APDUs may be used on this transport
    fn supports_extended_length(&self) -> bool {
        false
    }

    /// Reset the transport to a fresh state
    fn reset(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

impl<T: CardTransport + ?Sized> CardTransport for &mut T {
    fn transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, TransportError> {
        (**self).transmit_raw(command)
    }

    fn max_payload_len(&self) -> usize {
        (**self).max_payload_len()
    }

    fn supports_extended_length(&self) -> bool {
        (**self).supports_extended_length()
    }

    fn reset(&mut self) -> Result<(), TransportError> {
        (**self).reset()
    }
}

/// Scripted transport for tests.
///
/// Responses are served in FIFO order; every transmitted command is
/// recorded for later assertions. Running out of scripted responses is an
/// I/O error, which doubles as a "no exchange may happen here" probe.
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: VecDeque<Bytes>,
    commands: Vec<Bytes>,
    extended_length: bool,
}

impl MockTransport {
    /// Create a transport with a single scripted response
    pub fn with_response(response: impl Into<Bytes>) -> Self {
        Self::with_responses([response.into()])
    }

    /// Create a transport with a sequence of scripted responses
    pub fn with_responses<I>(responses: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Bytes>,
    {
        Self {
            responses: responses.into_iter().map(Into::into).collect(),
            commands: Vec::new(),
            extended_length: false,
        }
    }

    /// Enable extended length support on the mock
    pub fn with_extended_length(mut self) -> Self {
        self.extended_length = true;
        self
    }

    /// Queue another scripted response
    pub fn push_response(&mut self, response: impl Into<Bytes>) {
        self.responses.push_back(response.into());
    }

    /// Commands transmitted so far, in order
    pub fn transmitted(&self) -> &[Bytes] {
        &self.commands
    }
}

impl CardTransport for MockTransport {
    fn transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, TransportError> {
        self.commands.push(Bytes::copy_from_slice(command));
        self.responses
            .pop_front()
            .ok_or_else(|| TransportError::Io("no scripted response left".to_string()))
    }

    fn supports_extended_length(&self) -> bool {
        self.extended_length
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_serves_responses_in_order() {
        let mut mock = MockTransport::with_responses([
            Bytes::from_static(&[0x01, 0x90, 0x00]),
            Bytes::from_static(&[0x02, 0x90, 0x00]),
        ]);

        assert_eq!(
            mock.transmit_raw(&[0x00, 0xA4, 0x04, 0x00]).unwrap().as_ref(),
            &[0x01, 0x90, 0x00]
        );
        assert_eq!(
            mock.transmit_raw(&[0x00, 0xB0, 0x00, 0x00]).unwrap().as_ref(),
            &[0x02, 0x90, 0x00]
        );
        assert!(mock.transmit_raw(&[0x00, 0x00, 0x00, 0x00]).is_err());
        assert_eq!(mock.transmitted().len(), 3);
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(TransportError::PermissionPending.is_recoverable());
        assert!(TransportError::Disconnected.is_recoverable());
        assert!(TransportError::Io("reset".into()).is_recoverable());
        assert!(!TransportError::Device("broken".into()).is_recoverable());
    }
}
