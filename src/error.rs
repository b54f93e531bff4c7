//! Error types and device exception classification
//!
//! All fallible operations in this crate return [`ModbusResult`]. Transport
//! failures, framing violations and device-reported exceptions are kept as
//! distinct variants so callers can tell "the wire broke" apart from "the
//! device refused".

use std::fmt;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type ModbusResult<T> = Result<T, ModbusError>;

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum ModbusError {
    /// Endpoint address unusable or TCP connect failed.
    #[error("connection error: {0}")]
    Connection(String),

    /// A transport primitive was invoked without an established connection.
    #[error("transport is not connected")]
    NotConnected,

    /// Socket read/write failure mid-exchange.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The transport accepted fewer bytes than the frame holds.
    #[error("short write: transport accepted {actual} of {expected} bytes")]
    ShortWrite { expected: usize, actual: usize },

    /// Malformed or mismatched response framing.
    #[error("invalid frame: {0}")]
    Frame(String),

    /// The device answered with an exception response.
    #[error("device exception: {0}")]
    Exception(ExceptionCode),

    /// Request rejected before any I/O (quantity out of range, empty PDU).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Device-reported exception codes per the Modbus specification.
///
/// Codes outside the defined set are preserved in [`ExceptionCode::Unknown`]
/// rather than discarded, so the raw byte stays available for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionCode {
    /// 0x01
    IllegalFunction,
    /// 0x02
    IllegalDataAddress,
    /// 0x03
    IllegalDataValue,
    /// 0x04
    ServerDeviceFailure,
    /// 0x05
    Acknowledge,
    /// 0x06
    ServerDeviceBusy,
    /// 0x07
    NegativeAcknowledge,
    /// 0x08
    MemoryParityError,
    /// 0x0A
    GatewayPathUnavailable,
    /// 0x0B
    GatewayTargetFailed,
    /// Any code without a defined meaning.
    Unknown(u8),
}

impl ExceptionCode {
    /// Classify a raw exception code byte.
    pub fn from_code(code: u8) -> Self {
        match code {
            0x01 => Self::IllegalFunction,
            0x02 => Self::IllegalDataAddress,
            0x03 => Self::IllegalDataValue,
            0x04 => Self::ServerDeviceFailure,
            0x05 => Self::Acknowledge,
            0x06 => Self::ServerDeviceBusy,
            0x07 => Self::NegativeAcknowledge,
            0x08 => Self::MemoryParityError,
            0x0A => Self::GatewayPathUnavailable,
            0x0B => Self::GatewayTargetFailed,
            other => Self::Unknown(other),
        }
    }

    /// The raw wire code.
    pub fn code(&self) -> u8 {
        match self {
            Self::IllegalFunction => 0x01,
            Self::IllegalDataAddress => 0x02,
            Self::IllegalDataValue => 0x03,
            Self::ServerDeviceFailure => 0x04,
            Self::Acknowledge => 0x05,
            Self::ServerDeviceBusy => 0x06,
            Self::NegativeAcknowledge => 0x07,
            Self::MemoryParityError => 0x08,
            Self::GatewayPathUnavailable => 0x0A,
            Self::GatewayTargetFailed => 0x0B,
            Self::Unknown(code) => *code,
        }
    }

    /// Fixed human-readable meaning of the code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::IllegalFunction => "illegal function",
            Self::IllegalDataAddress => "illegal data address",
            Self::IllegalDataValue => "illegal data value",
            Self::ServerDeviceFailure => "server device failure",
            Self::Acknowledge => "acknowledge, request accepted and still processing",
            Self::ServerDeviceBusy => "server device busy",
            Self::NegativeAcknowledge => "negative acknowledge",
            Self::MemoryParityError => "memory parity error",
            Self::GatewayPathUnavailable => "gateway path unavailable",
            Self::GatewayTargetFailed => "gateway target device failed to respond",
            Self::Unknown(_) => "unknown error",
        }
    }
}

impl fmt::Display for ExceptionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code 0x{:02X})", self.description(), self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defined_codes_round_trip() {
        for code in [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x0A, 0x0B] {
            let classified = ExceptionCode::from_code(code);
            assert_eq!(classified.code(), code);
            assert!(!matches!(classified, ExceptionCode::Unknown(_)));
        }
    }

    #[test]
    fn test_classification_table() {
        assert_eq!(
            ExceptionCode::from_code(0x01),
            ExceptionCode::IllegalFunction
        );
        assert_eq!(
            ExceptionCode::from_code(0x02),
            ExceptionCode::IllegalDataAddress
        );
        assert_eq!(
            ExceptionCode::from_code(0x03),
            ExceptionCode::IllegalDataValue
        );
        assert_eq!(
            ExceptionCode::from_code(0x04),
            ExceptionCode::ServerDeviceFailure
        );
        assert_eq!(ExceptionCode::from_code(0x05), ExceptionCode::Acknowledge);
        assert_eq!(
            ExceptionCode::from_code(0x06),
            ExceptionCode::ServerDeviceBusy
        );
        assert_eq!(
            ExceptionCode::from_code(0x07),
            ExceptionCode::NegativeAcknowledge
        );
        assert_eq!(
            ExceptionCode::from_code(0x08),
            ExceptionCode::MemoryParityError
        );
        assert_eq!(
            ExceptionCode::from_code(0x0A),
            ExceptionCode::GatewayPathUnavailable
        );
        assert_eq!(
            ExceptionCode::from_code(0x0B),
            ExceptionCode::GatewayTargetFailed
        );
    }

    #[test]
    fn test_undefined_codes_fall_back_to_unknown() {
        // 0x09 has no defined meaning in the specification
        assert_eq!(ExceptionCode::from_code(0x09), ExceptionCode::Unknown(0x09));
        assert_eq!(ExceptionCode::from_code(0xFF), ExceptionCode::Unknown(0xFF));
        assert_eq!(ExceptionCode::from_code(0x09).description(), "unknown error");
    }

    #[test]
    fn test_display_carries_code_and_meaning() {
        let msg = ExceptionCode::IllegalDataAddress.to_string();
        assert!(msg.contains("illegal data address"));
        assert!(msg.contains("0x02"));

        let msg = ExceptionCode::Unknown(0x09).to_string();
        assert!(msg.contains("unknown error"));
        assert!(msg.contains("0x09"));
    }

    #[test]
    fn test_short_write_message_reports_both_counts() {
        let err = ModbusError::ShortWrite {
            expected: 12,
            actual: 5,
        };
        let msg = err.to_string();
        assert!(msg.contains("12"));
        assert!(msg.contains('5'));
    }

    #[test]
    fn test_exception_error_display() {
        let err = ModbusError::Exception(ExceptionCode::ServerDeviceBusy);
        assert!(err.to_string().contains("server device busy"));
    }
}
