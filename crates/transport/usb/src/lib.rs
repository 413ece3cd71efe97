//! USB bulk transport for APDU operations
//!
//! Speaks the USB CCID (Chip Card Interface Device) protocol directly over
//! bulk endpoints, without smart card middleware. CCID messages consist of
//! a 10-byte header followed by the APDU payload:
//!
//! ```text
//! Offset  Size  Description
//! 0       1     Message type (0x6F = XfrBlock, 0x80 = DataBlock)
//! 1       4     Data length (little-endian)
//! 5       1     Slot number (always 0 here)
//! 6       1     Sequence number
//! 7       3     Type-specific parameters
//! 10      N     Data payload
//! ```
//!
//! Device access may require an OS permission grant; until granted,
//! [`UsbTransport::connect`] fails with [`TransportError::PermissionPending`]
//! and the caller is expected to retry after the grant event.
#![forbid(unsafe_code)]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]

use std::time::Duration;

use keyfob_apdu_core::{Bytes, CardTransport, TransportError};
use rusb::{Device, DeviceHandle, Direction, TransferType, UsbContext};
use tracing::{debug, trace, warn};

/// Yubico USB vendor id
pub const VENDOR_YUBICO: u16 = 0x1050;

/// Smart card (CCID) USB interface class
const CLASS_CCID: u8 = 0x0B;

/// CCID message header size in bytes
const CCID_HEADER_SIZE: usize = 10;

/// Largest CCID response we accept in one read
const MAX_RESPONSE_SIZE: usize = 4096;

mod message_type {
    /// PC to reader: transfer block (carries an APDU)
    pub(crate) const PC_TO_RDR_XFR_BLOCK: u8 = 0x6F;
    /// PC to reader: ICC power on
    pub(crate) const PC_TO_RDR_ICC_POWER_ON: u8 = 0x62;
    /// PC to reader: ICC power off
    pub(crate) const PC_TO_RDR_ICC_POWER_OFF: u8 = 0x63;
    /// Reader to PC: data block (carries the APDU response)
    pub(crate) const RDR_TO_PC_DATA_BLOCK: u8 = 0x80;
    /// Reader to PC: slot status (power on/off acknowledgement)
    pub(crate) const RDR_TO_PC_SLOT_STATUS: u8 = 0x81;
}

/// Configuration options for the USB transport
#[derive(Debug, Clone)]
pub struct UsbConfig {
    /// Timeout applied to every bulk transfer
    pub timeout: Duration,
    /// Vendor id the capability check matches against
    pub vendor_id: u16,
}

impl Default for UsbConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            vendor_id: VENDOR_YUBICO,
        }
    }
}

impl UsbConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bulk transfer timeout
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the vendor id to match
    pub const fn with_vendor_id(mut self, vendor_id: u16) -> Self {
        self.vendor_id = vendor_id;
        self
    }
}

/// USB bulk (CCID) card transport
pub struct UsbTransport<C: UsbContext> {
    handle: DeviceHandle<C>,
    interface_number: u8,
    endpoint_in: u8,
    endpoint_out: u8,
    sequence: u8,
    timeout: Duration,
}

impl<C: UsbContext> std::fmt::Debug for UsbTransport<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsbTransport")
            .field("interface_number", &self.interface_number)
            .field("endpoint_in", &self.endpoint_in)
            .field("endpoint_out", &self.endpoint_out)
            .field("sequence", &self.sequence)
            .finish()
    }
}

/// CCID interface location on a device
#[derive(Debug, Clone, Copy)]
struct CcidInterface {
    number: u8,
    endpoint_in: u8,
    endpoint_out: u8,
}

fn find_ccid_interface<C: UsbContext>(device: &Device<C>) -> Option<CcidInterface> {
    let config = device.active_config_descriptor().ok()?;
    for interface in config.interfaces() {
        for desc in interface.descriptors() {
            if desc.class_code() != CLASS_CCID {
                continue;
            }
            let mut endpoint_in = None;
            let mut endpoint_out = None;
            for endpoint in desc.endpoint_descriptors() {
                if endpoint.transfer_type() == TransferType::Bulk {
                    match endpoint.direction() {
                        Direction::In => endpoint_in = Some(endpoint.address()),
                        Direction::Out => endpoint_out = Some(endpoint.address()),
                    }
                }
            }
            if let (Some(endpoint_in), Some(endpoint_out)) = (endpoint_in, endpoint_out) {
                return Some(CcidInterface {
                    number: desc.interface_number(),
                    endpoint_in,
                    endpoint_out,
                });
            }
        }
    }
    None
}

impl<C: UsbContext> UsbTransport<C> {
    /// Check whether a device looks like it carries the applet, from
    /// descriptors alone. No I/O is performed; this is meant for filtering
    /// an enumeration before requesting access permission.
    pub fn is_supported(device: &Device<C>, config: &UsbConfig) -> bool {
        let Ok(desc) = device.device_descriptor() else {
            return false;
        };
        desc.vendor_id() == config.vendor_id && find_ccid_interface(device).is_some()
    }

    /// List all supported devices on the given context
    pub fn list_supported(context: &C, config: &UsbConfig) -> Result<Vec<Device<C>>, TransportError> {
        let devices = context.devices().map_err(map_usb_error)?;
        Ok(devices
            .iter()
            .filter(|device| Self::is_supported(device, config))
            .collect())
    }

    /// Open the device, claim its CCID interface and power the card on.
    ///
    /// Fails with [`TransportError::PermissionPending`] when the OS denies
    /// access; the caller should retry after the permission grant.
    pub fn connect(device: &Device<C>, config: UsbConfig) -> Result<Self, TransportError> {
        let interface = find_ccid_interface(device).ok_or_else(|| {
            TransportError::Device("no CCID interface with bulk endpoints".to_string())
        })?;

        let handle = device.open().map_err(map_usb_error)?;

        #[cfg(target_os = "linux")]
        if handle.kernel_driver_active(interface.number).unwrap_or(false) {
            handle
                .detach_kernel_driver(interface.number)
                .map_err(map_usb_error)?;
        }

        handle
            .claim_interface(interface.number)
            .map_err(map_usb_error)?;

        debug!(
            interface = interface.number,
            endpoint_in = format_args!("{:#04x}", interface.endpoint_in),
            endpoint_out = format_args!("{:#04x}", interface.endpoint_out),
            "claimed CCID interface"
        );

        let mut transport = Self {
            handle,
            interface_number: interface.number,
            endpoint_in: interface.endpoint_in,
            endpoint_out: interface.endpoint_out,
            sequence: 0,
            timeout: config.timeout,
        };

        transport.power_on()?;
        Ok(transport)
    }

    fn next_sequence(&mut self) -> u8 {
        let seq = self.sequence;
        self.sequence = self.sequence.wrapping_add(1);
        seq
    }

    /// Send `PC_to_RDR_IccPowerOn`; the reply carries the ATR
    fn power_on(&mut self) -> Result<Bytes, TransportError> {
        let mut cmd = [0u8; CCID_HEADER_SIZE];
        cmd[0] = message_type::PC_TO_RDR_ICC_POWER_ON;
        cmd[6] = self.next_sequence();
        // bPowerSelect = 0: automatic voltage selection
        self.send_raw(&cmd)?;
        self.receive()
    }

    fn power_off(&mut self) -> Result<(), TransportError> {
        let mut cmd = [0u8; CCID_HEADER_SIZE];
        cmd[0] = message_type::PC_TO_RDR_ICC_POWER_OFF;
        cmd[6] = self.next_sequence();
        self.send_raw(&cmd)?;
        self.receive().map(|_| ())
    }

    fn send_raw(&self, data: &[u8]) -> Result<(), TransportError> {
        let written = self
            .handle
            .write_bulk(self.endpoint_out, data, self.timeout)
            .map_err(map_usb_error)?;
        if written != data.len() {
            return Err(TransportError::Io(format!(
                "incomplete bulk write: {written}/{} bytes",
                data.len()
            )));
        }
        Ok(())
    }

    fn receive(&mut self) -> Result<Bytes, TransportError> {
        let mut buf = vec![0u8; MAX_RESPONSE_SIZE];
        let read = self
            .handle
            .read_bulk(self.endpoint_in, &mut buf, self.timeout)
            .map_err(map_usb_error)?;

        if read < CCID_HEADER_SIZE {
            return Err(TransportError::Io(format!(
                "CCID response too short: {read} bytes"
            )));
        }

        let msg_type = buf[0];
        let data_len = u32::from_le_bytes([buf[1], buf[2], buf[3], buf[4]]) as usize;
        let slot_status = buf[7];
        let error_code = buf[8];

        if error_code != 0 {
            return Err(TransportError::Device(format!(
                "CCID error: status={slot_status:#04x} error={error_code:#04x}"
            )));
        }

        match msg_type {
            message_type::RDR_TO_PC_DATA_BLOCK | message_type::RDR_TO_PC_SLOT_STATUS => {
                // Slot status low bits: 0 = present and active
                if msg_type == message_type::RDR_TO_PC_DATA_BLOCK && (slot_status & 0x03) != 0 {
                    return Err(TransportError::Disconnected);
                }
                let end = CCID_HEADER_SIZE + data_len;
                if end > read {
                    return Err(TransportError::BufferTooSmall);
                }
                buf.truncate(end);
                buf.drain(..CCID_HEADER_SIZE);
                Ok(Bytes::from(buf))
            }
            other => Err(TransportError::Device(format!(
                "unexpected CCID message type {other:#04x}"
            ))),
        }
    }
}

impl<C: UsbContext> CardTransport for UsbTransport<C> {
    fn transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, TransportError> {
        let mut frame = vec![0u8; CCID_HEADER_SIZE + command.len()];
        frame[0] = message_type::PC_TO_RDR_XFR_BLOCK;
        frame[1..5].copy_from_slice(&(command.len() as u32).to_le_bytes());
        frame[6] = self.next_sequence();
        frame[CCID_HEADER_SIZE..].copy_from_slice(command);

        trace!(command = %hex::encode(command), "usb transmit");
        self.send_raw(&frame)?;
        let response = self.receive()?;
        trace!(response = %hex::encode(&response), "usb response");
        Ok(response)
    }

    fn max_payload_len(&self) -> usize {
        // Extended length APDUs are supported over bulk transfers
        u16::MAX as usize
    }

    fn supports_extended_length(&self) -> bool {
        true
    }

    fn reset(&mut self) -> Result<(), TransportError> {
        self.power_off()?;
        self.power_on().map(|_| ())
    }
}

impl<C: UsbContext> Drop for UsbTransport<C> {
    fn drop(&mut self) {
        if let Err(err) = self.power_off() {
            warn!(%err, "failed to power card off");
        }
        let _ = self.handle.release_interface(self.interface_number);
    }
}

fn map_usb_error(err: rusb::Error) -> TransportError {
    match err {
        rusb::Error::Access => TransportError::PermissionPending,
        rusb::Error::NoDevice | rusb::Error::NotFound | rusb::Error::Pipe => {
            TransportError::Disconnected
        }
        rusb::Error::Timeout | rusb::Error::Io | rusb::Error::Interrupted | rusb::Error::Busy => {
            TransportError::Io(err.to_string())
        }
        other => TransportError::Device(other.to_string()),
    }
}
