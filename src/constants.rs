//! Modbus protocol constants based on the official specification
//!
//! The maximum PDU is 253 bytes (inherited from the 256-byte RS485 ADU
//! minus slave address and CRC); every quantity limit below is the largest
//! count whose request and response both fit inside that bound.

// ============================================================================
// Frame sizes
// ============================================================================

/// Full MBAP header length on the wire.
/// Transaction ID(2) + Protocol ID(2) + Length(2) + Unit ID(1) = 7 bytes.
pub const MBAP_HEADER_LEN: usize = 7;

/// Maximum PDU (Protocol Data Unit) size per the Modbus specification.
pub const MAX_PDU_SIZE: usize = 253;

/// Maximum value of the MBAP length field (unit ID byte + PDU).
pub const MAX_MBAP_LENGTH: usize = 1 + MAX_PDU_SIZE;

// ============================================================================
// Quantity limits
// ============================================================================

/// Maximum coils/discrete inputs per read (FC01/FC02).
pub const MAX_READ_BITS: u16 = 2000;

/// Maximum coils per multiple write (FC15).
pub const MAX_WRITE_BITS: u16 = 1968;

/// Maximum registers per read (FC03/FC04).
pub const MAX_READ_REGISTERS: u16 = 125;

/// Maximum registers per multiple write (FC16).
pub const MAX_WRITE_REGISTERS: u16 = 123;

// ============================================================================
// Function codes
// ============================================================================

/// Read Coils (FC01)
pub const FC_READ_COILS: u8 = 0x01;

/// Read Discrete Inputs (FC02)
pub const FC_READ_DISCRETE_INPUTS: u8 = 0x02;

/// Read Holding Registers (FC03)
pub const FC_READ_HOLDING_REGISTERS: u8 = 0x03;

/// Read Input Registers (FC04)
pub const FC_READ_INPUT_REGISTERS: u8 = 0x04;

/// Write Single Coil (FC05)
pub const FC_WRITE_SINGLE_COIL: u8 = 0x05;

/// Write Single Register (FC06)
pub const FC_WRITE_SINGLE_REGISTER: u8 = 0x06;

/// Write Multiple Coils (FC15)
pub const FC_WRITE_MULTIPLE_COILS: u8 = 0x0F;

/// Write Multiple Registers (FC16)
pub const FC_WRITE_MULTIPLE_REGISTERS: u8 = 0x10;

/// Exception responses set the high bit of the echoed function code.
pub const EXCEPTION_FLAG: u8 = 0x80;

// ============================================================================
// Wire encodings
// ============================================================================

/// FC05 data word for switching a coil ON.
pub const COIL_ON: u16 = 0xFF00;

/// FC05 data word for switching a coil OFF.
pub const COIL_OFF: u16 = 0x0000;

/// Modbus TCP registered port.
pub const DEFAULT_TCP_PORT: u16 = 502;

/// Unit identifier used when a device exposes a single unit.
pub const DEFAULT_UNIT_ID: u8 = 1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_size_constants() {
        assert_eq!(MBAP_HEADER_LEN, 7);
        assert_eq!(MAX_PDU_SIZE, 253);
        assert_eq!(MAX_MBAP_LENGTH, 254);
    }

    #[test]
    fn test_read_limits_fit_pdu() {
        // FC03/04 response: FC(1) + byte count(1) + registers
        let register_response = 1 + 1 + (MAX_READ_REGISTERS as usize * 2);
        assert!(register_response <= MAX_PDU_SIZE);

        // FC01/02 response: FC(1) + byte count(1) + packed bits
        let bit_response = 1 + 1 + (MAX_READ_BITS as usize).div_ceil(8);
        assert!(bit_response <= MAX_PDU_SIZE);
    }

    #[test]
    fn test_write_limits_fit_pdu() {
        // FC16 request: FC(1) + addr(2) + qty(2) + byte count(1) + registers
        let register_request = 1 + 2 + 2 + 1 + (MAX_WRITE_REGISTERS as usize * 2);
        assert!(register_request <= MAX_PDU_SIZE);

        // FC15 request: FC(1) + addr(2) + qty(2) + byte count(1) + packed bits
        let bit_request = 1 + 2 + 2 + 1 + (MAX_WRITE_BITS as usize).div_ceil(8);
        assert!(bit_request <= MAX_PDU_SIZE);
    }

    #[test]
    fn test_coil_encodings() {
        assert_eq!(COIL_ON.to_be_bytes(), [0xFF, 0x00]);
        assert_eq!(COIL_OFF.to_be_bytes(), [0x00, 0x00]);
    }
}
