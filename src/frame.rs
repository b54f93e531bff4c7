//! MBAP framing for Modbus TCP
//!
//! A TCP ADU is the 7-byte MBAP header followed by the PDU. The header is a
//! structured type with named fields; request assembly and response
//! correlation go through it instead of positional byte indexing. The length
//! field is always computed from the actual PDU size, and each request gets
//! its own transaction id so a response can be matched to the exchange that
//! produced it.

use tracing::debug;

use crate::constants::{MAX_MBAP_LENGTH, MBAP_HEADER_LEN};
use crate::error::{ModbusError, ModbusResult};
use crate::pdu::ModbusPdu;

/// Modbus Application Protocol header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MbapHeader {
    /// Per-request correlation id, echoed back by the device.
    pub transaction_id: u16,
    /// Always 0 for Modbus.
    pub protocol_id: u16,
    /// Byte count of everything after this field: unit id + PDU.
    pub length: u16,
    /// Target unit (slave) identifier.
    pub unit_id: u8,
}

impl MbapHeader {
    /// Header for an outbound request; the length field is derived from the
    /// PDU it will carry.
    pub fn for_request(transaction_id: u16, unit_id: u8, pdu: &ModbusPdu) -> Self {
        Self {
            transaction_id,
            protocol_id: 0,
            length: (pdu.len() + 1) as u16,
            unit_id,
        }
    }

    /// Wire image of the header.
    pub fn to_bytes(&self) -> [u8; MBAP_HEADER_LEN] {
        let mut bytes = [0u8; MBAP_HEADER_LEN];
        bytes[0..2].copy_from_slice(&self.transaction_id.to_be_bytes());
        bytes[2..4].copy_from_slice(&self.protocol_id.to_be_bytes());
        bytes[4..6].copy_from_slice(&self.length.to_be_bytes());
        bytes[6] = self.unit_id;
        bytes
    }

    /// Decode a header from the 7 bytes read off the wire.
    pub fn from_bytes(bytes: [u8; MBAP_HEADER_LEN]) -> Self {
        Self {
            transaction_id: u16::from_be_bytes([bytes[0], bytes[1]]),
            protocol_id: u16::from_be_bytes([bytes[2], bytes[3]]),
            length: u16::from_be_bytes([bytes[4], bytes[5]]),
            unit_id: bytes[6],
        }
    }

    /// Reject headers no conforming device would produce.
    pub fn validate(&self) -> ModbusResult<()> {
        if self.protocol_id != 0 {
            return Err(ModbusError::Frame(format!(
                "invalid protocol id: expected 0, got {}",
                self.protocol_id
            )));
        }
        // length counts the unit id byte plus at least a function code
        if self.length < 2 || self.length as usize > MAX_MBAP_LENGTH {
            return Err(ModbusError::Frame(format!(
                "length field out of bounds: {}",
                self.length
            )));
        }
        Ok(())
    }

    /// Bytes remaining on the wire after the header: the PDU.
    ///
    /// Only meaningful once [`validate`](Self::validate) has passed.
    pub fn body_len(&self) -> usize {
        (self.length as usize).saturating_sub(1)
    }
}

/// Assemble the full ADU for transmission.
pub fn encode_adu(header: &MbapHeader, pdu: &ModbusPdu) -> Vec<u8> {
    let mut frame = Vec::with_capacity(MBAP_HEADER_LEN + pdu.len());
    frame.extend_from_slice(&header.to_bytes());
    frame.extend_from_slice(pdu.as_slice());

    debug!(
        transaction_id = header.transaction_id,
        unit_id = header.unit_id,
        function_code = pdu.function_code().unwrap_or(0),
        pdu_len = pdu.len(),
        "built request frame"
    );

    frame
}

/// Correlate a response header with the request that is in flight.
pub fn check_response(
    header: &MbapHeader,
    expected_transaction_id: u16,
    expected_unit_id: u8,
) -> ModbusResult<()> {
    if header.transaction_id != expected_transaction_id {
        return Err(ModbusError::Frame(format!(
            "transaction id mismatch: expected {:04X}, got {:04X}",
            expected_transaction_id, header.transaction_id
        )));
    }
    if header.unit_id != expected_unit_id {
        return Err(ModbusError::Frame(format!(
            "unit id mismatch: expected {}, got {}",
            expected_unit_id, header.unit_id
        )));
    }
    Ok(())
}
