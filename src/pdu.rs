//! Modbus PDU container
//!
//! A PDU is the transport-independent part of a frame: one function code byte
//! followed by function-specific data. The buffer is a fixed-size stack array
//! sized to the protocol maximum, so building a request never allocates and
//! every append is bounds-checked. A fresh value is constructed per exchange;
//! nothing is reused between calls.

use crate::constants::{EXCEPTION_FLAG, MAX_PDU_SIZE};
use crate::error::{ModbusError, ModbusResult};

/// Protocol Data Unit: function code plus function-specific data.
#[derive(Debug, Clone)]
pub struct ModbusPdu {
    data: [u8; MAX_PDU_SIZE],
    len: usize,
}

impl ModbusPdu {
    /// Create an empty PDU.
    pub fn new() -> Self {
        Self {
            data: [0; MAX_PDU_SIZE],
            len: 0,
        }
    }

    /// Create a PDU from received bytes.
    pub fn from_slice(bytes: &[u8]) -> ModbusResult<Self> {
        if bytes.len() > MAX_PDU_SIZE {
            return Err(ModbusError::Frame(format!(
                "PDU too large: {} bytes (max {})",
                bytes.len(),
                MAX_PDU_SIZE
            )));
        }
        let mut pdu = Self::new();
        pdu.data[..bytes.len()].copy_from_slice(bytes);
        pdu.len = bytes.len();
        Ok(pdu)
    }

    /// Append a single byte.
    pub fn push(&mut self, byte: u8) -> ModbusResult<()> {
        if self.len >= MAX_PDU_SIZE {
            return Err(ModbusError::InvalidRequest("PDU buffer full".to_string()));
        }
        self.data[self.len] = byte;
        self.len += 1;
        Ok(())
    }

    /// Append a big-endian 16-bit word.
    pub fn push_u16(&mut self, value: u16) -> ModbusResult<()> {
        let [hi, lo] = value.to_be_bytes();
        self.push(hi)?;
        self.push(lo)
    }

    /// Append a byte slice.
    pub fn extend(&mut self, bytes: &[u8]) -> ModbusResult<()> {
        if self.len + bytes.len() > MAX_PDU_SIZE {
            return Err(ModbusError::InvalidRequest(format!(
                "PDU would exceed max size: {} + {} > {}",
                self.len,
                bytes.len(),
                MAX_PDU_SIZE
            )));
        }
        self.data[self.len..self.len + bytes.len()].copy_from_slice(bytes);
        self.len += bytes.len();
        Ok(())
    }

    /// The populated bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Current length in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when no bytes have been written.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Function code (first byte), if present.
    pub fn function_code(&self) -> Option<u8> {
        self.as_slice().first().copied()
    }

    /// True when the function code carries the exception flag.
    pub fn is_exception(&self) -> bool {
        self.function_code()
            .map(|fc| fc & EXCEPTION_FLAG != 0)
            .unwrap_or(false)
    }

    /// Exception code byte of an exception response.
    pub fn exception_code(&self) -> Option<u8> {
        if self.is_exception() && self.len > 1 {
            Some(self.data[1])
        } else {
            None
        }
    }
}

impl Default for ModbusPdu {
    fn default() -> Self {
        Self::new()
    }
}
