//! Request construction and response decoding per function code
//!
//! Builders validate quantities against the protocol limits before any I/O
//! happens, so an oversized request is rejected at the call site rather than
//! by the device. Parsers are strict: a byte count that does not match the
//! requested quantity is a framing error, not something to degrade around.

use crate::constants::{
    COIL_OFF, COIL_ON, FC_READ_COILS, FC_READ_DISCRETE_INPUTS, FC_READ_INPUT_REGISTERS,
    FC_WRITE_MULTIPLE_COILS, FC_WRITE_MULTIPLE_REGISTERS, FC_WRITE_SINGLE_COIL,
    FC_WRITE_SINGLE_REGISTER, MAX_READ_BITS, MAX_READ_REGISTERS, MAX_WRITE_BITS,
    MAX_WRITE_REGISTERS,
};
use crate::error::{ModbusError, ModbusResult};
use crate::pdu::ModbusPdu;

/// Build a read request PDU for FC01 through FC04.
pub fn read_request(function: u8, address: u16, quantity: u16) -> ModbusResult<ModbusPdu> {
    if !(FC_READ_COILS..=FC_READ_INPUT_REGISTERS).contains(&function) {
        return Err(ModbusError::InvalidRequest(format!(
            "not a read function code: 0x{function:02X}"
        )));
    }

    let limit = match function {
        FC_READ_COILS | FC_READ_DISCRETE_INPUTS => MAX_READ_BITS,
        _ => MAX_READ_REGISTERS,
    };
    if quantity == 0 || quantity > limit {
        return Err(ModbusError::InvalidRequest(format!(
            "read quantity {quantity} out of range 1..={limit} for FC{function:02}"
        )));
    }

    let mut pdu = ModbusPdu::new();
    pdu.push(function)?;
    pdu.push_u16(address)?;
    pdu.push_u16(quantity)?;
    Ok(pdu)
}

/// Build an FC05 (Write Single Coil) request.
///
/// The data word is 0xFF00 for ON and 0x0000 for OFF per the Modbus
/// convention; any other value is rejected by conforming devices.
pub fn write_single_coil_request(address: u16, value: bool) -> ModbusResult<ModbusPdu> {
    let mut pdu = ModbusPdu::new();
    pdu.push(FC_WRITE_SINGLE_COIL)?;
    pdu.push_u16(address)?;
    pdu.push_u16(if value { COIL_ON } else { COIL_OFF })?;
    Ok(pdu)
}

/// Build an FC06 (Write Single Register) request.
pub fn write_single_register_request(address: u16, value: u16) -> ModbusResult<ModbusPdu> {
    let mut pdu = ModbusPdu::new();
    pdu.push(FC_WRITE_SINGLE_REGISTER)?;
    pdu.push_u16(address)?;
    pdu.push_u16(value)?;
    Ok(pdu)
}

/// Build an FC15 (Write Multiple Coils) request with LSB-first bit packing.
pub fn write_multiple_coils_request(address: u16, values: &[bool]) -> ModbusResult<ModbusPdu> {
    if values.is_empty() || values.len() > MAX_WRITE_BITS as usize {
        return Err(ModbusError::InvalidRequest(format!(
            "coil count {} out of range 1..={MAX_WRITE_BITS} for FC15",
            values.len()
        )));
    }

    let mut pdu = ModbusPdu::new();
    pdu.push(FC_WRITE_MULTIPLE_COILS)?;
    pdu.push_u16(address)?;
    pdu.push_u16(values.len() as u16)?;
    pdu.push(values.len().div_ceil(8) as u8)?;

    let mut current = 0u8;
    let mut bit = 0;
    for &value in values {
        if value {
            current |= 1 << bit;
        }
        bit += 1;
        if bit == 8 {
            pdu.push(current)?;
            current = 0;
            bit = 0;
        }
    }
    if bit > 0 {
        pdu.push(current)?;
    }

    Ok(pdu)
}

/// Build an FC16 (Write Multiple Registers) request.
pub fn write_multiple_registers_request(address: u16, values: &[u16]) -> ModbusResult<ModbusPdu> {
    if values.is_empty() || values.len() > MAX_WRITE_REGISTERS as usize {
        return Err(ModbusError::InvalidRequest(format!(
            "register count {} out of range 1..={MAX_WRITE_REGISTERS} for FC16",
            values.len()
        )));
    }

    let mut pdu = ModbusPdu::new();
    pdu.push(FC_WRITE_MULTIPLE_REGISTERS)?;
    pdu.push_u16(address)?;
    pdu.push_u16(values.len() as u16)?;
    pdu.push((values.len() * 2) as u8)?;
    for &value in values {
        pdu.push_u16(value)?;
    }

    Ok(pdu)
}

/// Decode an FC01/FC02 response into per-point states.
///
/// Bit 0 of the first data byte is the first requested point.
pub fn parse_bit_response(
    pdu: &ModbusPdu,
    function: u8,
    quantity: u16,
) -> ModbusResult<Vec<bool>> {
    let data = expect_read_payload(pdu, function)?;

    let expected_bytes = (quantity as usize).div_ceil(8);
    if data.len() != expected_bytes {
        return Err(ModbusError::Frame(format!(
            "byte count mismatch for FC{function:02}: expected {expected_bytes} bytes for {quantity} points, got {}",
            data.len()
        )));
    }

    let mut bits = Vec::with_capacity(quantity as usize);
    for index in 0..quantity as usize {
        let byte = data[index / 8];
        bits.push((byte >> (index % 8)) & 0x01 != 0);
    }
    Ok(bits)
}

/// Decode an FC03/FC04 response into 16-bit register values.
///
/// Each register arrives high byte first: `(hi << 8) | lo`.
pub fn parse_register_response(
    pdu: &ModbusPdu,
    function: u8,
    quantity: u16,
) -> ModbusResult<Vec<u16>> {
    let data = expect_read_payload(pdu, function)?;

    let expected_bytes = quantity as usize * 2;
    if data.len() != expected_bytes {
        return Err(ModbusError::Frame(format!(
            "byte count mismatch for FC{function:02}: expected {expected_bytes} bytes for {quantity} registers, got {}",
            data.len()
        )));
    }

    let registers = data
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    Ok(registers)
}

/// Validate a write response.
///
/// Every write function echoes the function code followed by four data bytes
/// (address + value for FC05/FC06, address + quantity for FC15/FC16).
pub fn parse_write_response(pdu: &ModbusPdu, function: u8) -> ModbusResult<()> {
    match pdu.function_code() {
        None => Err(ModbusError::Frame("empty response PDU".to_string())),
        Some(fc) if fc != function => Err(ModbusError::Frame(format!(
            "function code mismatch: expected 0x{function:02X}, got 0x{fc:02X}"
        ))),
        Some(_) if pdu.len() != 5 => Err(ModbusError::Frame(format!(
            "write echo has {} bytes, expected 5",
            pdu.len()
        ))),
        Some(_) => Ok(()),
    }
}

/// Strip the function code and byte count off a read response, returning the
/// data bytes the byte count declares.
fn expect_read_payload<'a>(pdu: &'a ModbusPdu, function: u8) -> ModbusResult<&'a [u8]> {
    let bytes = pdu.as_slice();
    if bytes.len() < 2 {
        return Err(ModbusError::Frame(format!(
            "response PDU too short: {} bytes",
            bytes.len()
        )));
    }
    if bytes[0] != function {
        return Err(ModbusError::Frame(format!(
            "function code mismatch: expected 0x{function:02X}, got 0x{:02X}",
            bytes[0]
        )));
    }

    let declared = bytes[1] as usize;
    let data = &bytes[2..];
    if declared != data.len() {
        return Err(ModbusError::Frame(format!(
            "byte count field says {declared}, {} data bytes present",
            data.len()
        )));
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::FC_READ_HOLDING_REGISTERS;

    // ===== request builders =====

    #[test]
    fn test_read_request_fc01() {
        let pdu = read_request(FC_READ_COILS, 0x0031, 1).unwrap();
        assert_eq!(pdu.as_slice(), &[0x01, 0x00, 0x31, 0x00, 0x01]);
    }

    #[test]
    fn test_read_request_fc03() {
        let pdu = read_request(FC_READ_HOLDING_REGISTERS, 0x006B, 3).unwrap();
        assert_eq!(pdu.as_slice(), &[0x03, 0x00, 0x6B, 0x00, 0x03]);
    }

    #[test]
    fn test_read_request_rejects_write_codes() {
        assert!(read_request(FC_WRITE_SINGLE_COIL, 0, 1).is_err());
        assert!(read_request(FC_WRITE_MULTIPLE_REGISTERS, 0, 1).is_err());
    }

    #[test]
    fn test_read_request_quantity_limits() {
        assert!(read_request(FC_READ_COILS, 0, 0).is_err());
        assert!(read_request(FC_READ_COILS, 0, MAX_READ_BITS).is_ok());
        assert!(read_request(FC_READ_COILS, 0, MAX_READ_BITS + 1).is_err());

        assert!(read_request(FC_READ_HOLDING_REGISTERS, 0, MAX_READ_REGISTERS).is_ok());
        assert!(read_request(FC_READ_HOLDING_REGISTERS, 0, MAX_READ_REGISTERS + 1).is_err());
    }

    #[test]
    fn test_write_single_coil_encoding() {
        let on = write_single_coil_request(0x0031, true).unwrap();
        assert_eq!(on.as_slice(), &[0x05, 0x00, 0x31, 0xFF, 0x00]);

        let off = write_single_coil_request(0x0031, false).unwrap();
        assert_eq!(off.as_slice(), &[0x05, 0x00, 0x31, 0x00, 0x00]);
    }

    #[test]
    fn test_write_single_register_encoding() {
        let pdu = write_single_register_request(0x0300, 0x1234).unwrap();
        assert_eq!(pdu.as_slice(), &[0x06, 0x03, 0x00, 0x12, 0x34]);
    }

    #[test]
    fn test_write_multiple_coils_encoding() {
        let pdu = write_multiple_coils_request(0x0100, &[true]).unwrap();
        assert_eq!(pdu.as_slice(), &[0x0F, 0x01, 0x00, 0x00, 0x01, 0x01, 0x01]);

        // 10 coils pack into 2 bytes, LSB first
        let values = [
            true, false, true, true, false, false, true, true, // 0xCD
            true, false, // 0x01
        ];
        let pdu = write_multiple_coils_request(0x0013, &values).unwrap();
        assert_eq!(
            pdu.as_slice(),
            &[0x0F, 0x00, 0x13, 0x00, 0x0A, 0x02, 0xCD, 0x01]
        );
    }

    #[test]
    fn test_write_multiple_registers_encoding() {
        let pdu = write_multiple_registers_request(0x0001, &[0x000A, 0x0102]).unwrap();
        assert_eq!(
            pdu.as_slice(),
            &[0x10, 0x00, 0x01, 0x00, 0x02, 0x04, 0x00, 0x0A, 0x01, 0x02]
        );
    }

    #[test]
    fn test_multiple_write_count_limits() {
        assert!(write_multiple_coils_request(0, &[]).is_err());
        assert!(write_multiple_registers_request(0, &[]).is_err());

        let too_many_regs = vec![0u16; MAX_WRITE_REGISTERS as usize + 1];
        assert!(write_multiple_registers_request(0, &too_many_regs).is_err());

        let too_many_coils = vec![false; MAX_WRITE_BITS as usize + 1];
        assert!(write_multiple_coils_request(0, &too_many_coils).is_err());
    }

    // ===== response parsers =====

    #[test]
    fn test_parse_bit_response_unpacks_lsb_first() {
        // 0xCD = 1100_1101: points 0,2,3,6,7 on
        let pdu = ModbusPdu::from_slice(&[0x01, 0x01, 0xCD]).unwrap();
        let bits = parse_bit_response(&pdu, FC_READ_COILS, 8).unwrap();
        assert_eq!(
            bits,
            vec![true, false, true, true, false, false, true, true]
        );
    }

    #[test]
    fn test_parse_bit_response_partial_last_byte() {
        let pdu = ModbusPdu::from_slice(&[0x02, 0x02, 0xCD, 0x01]).unwrap();
        let bits = parse_bit_response(&pdu, FC_READ_DISCRETE_INPUTS, 10).unwrap();
        assert_eq!(bits.len(), 10);
        assert!(bits[8]);
        assert!(!bits[9]);
    }

    #[test]
    fn test_parse_register_response_big_endian() {
        // data bytes 0x01, 0x02 decode to 258
        let pdu = ModbusPdu::from_slice(&[0x03, 0x02, 0x01, 0x02]).unwrap();
        let registers = parse_register_response(&pdu, FC_READ_HOLDING_REGISTERS, 1).unwrap();
        assert_eq!(registers, vec![258]);
    }

    #[test]
    fn test_parse_register_response_multiple() {
        let pdu = ModbusPdu::from_slice(&[0x04, 0x04, 0x00, 0x0A, 0x12, 0x34]).unwrap();
        let registers = parse_register_response(&pdu, FC_READ_INPUT_REGISTERS, 2).unwrap();
        assert_eq!(registers, vec![0x000A, 0x1234]);
    }

    #[test]
    fn test_parse_rejects_function_code_mismatch() {
        let pdu = ModbusPdu::from_slice(&[0x03, 0x02, 0x00, 0x0A]).unwrap();
        assert!(matches!(
            parse_register_response(&pdu, FC_READ_INPUT_REGISTERS, 1),
            Err(ModbusError::Frame(_))
        ));
    }

    #[test]
    fn test_parse_rejects_byte_count_mismatch() {
        // byte count field disagrees with the data present
        let pdu = ModbusPdu::from_slice(&[0x03, 0x04, 0x00, 0x0A]).unwrap();
        assert!(parse_register_response(&pdu, FC_READ_HOLDING_REGISTERS, 2).is_err());

        // byte count consistent but wrong for the requested quantity
        let pdu = ModbusPdu::from_slice(&[0x03, 0x02, 0x00, 0x0A]).unwrap();
        assert!(parse_register_response(&pdu, FC_READ_HOLDING_REGISTERS, 2).is_err());
    }

    #[test]
    fn test_parse_rejects_truncated_pdu() {
        let pdu = ModbusPdu::from_slice(&[0x03]).unwrap();
        assert!(parse_register_response(&pdu, FC_READ_HOLDING_REGISTERS, 1).is_err());
    }

    #[test]
    fn test_parse_write_response() {
        let echo = ModbusPdu::from_slice(&[0x05, 0x00, 0x31, 0xFF, 0x00]).unwrap();
        assert!(parse_write_response(&echo, FC_WRITE_SINGLE_COIL).is_ok());

        let wrong_fc = ModbusPdu::from_slice(&[0x06, 0x00, 0x31, 0xFF, 0x00]).unwrap();
        assert!(parse_write_response(&wrong_fc, FC_WRITE_SINGLE_COIL).is_err());

        let truncated = ModbusPdu::from_slice(&[0x05, 0x00, 0x31]).unwrap();
        assert!(parse_write_response(&truncated, FC_WRITE_SINGLE_COIL).is_err());

        let empty = ModbusPdu::new();
        assert!(parse_write_response(&empty, FC_WRITE_SINGLE_COIL).is_err());
    }

    // ===== request/response symmetry =====

    #[test]
    fn test_coil_state_survives_pack_unpack() {
        let values = [true, false, false, true, true, false, true, false, true];
        let request = write_multiple_coils_request(0, &values).unwrap();

        // byte count field and packed bytes sit after FC + addr + qty
        let packed = &request.as_slice()[6..];
        let mut response = vec![0x01, packed.len() as u8];
        response.extend_from_slice(packed);
        let pdu = ModbusPdu::from_slice(&response).unwrap();

        let bits = parse_bit_response(&pdu, FC_READ_COILS, values.len() as u16).unwrap();
        assert_eq!(bits, values);
    }
}
