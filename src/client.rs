//! Modbus TCP master client
//!
//! [`ModbusClient`] owns one endpoint and one blocking TCP connection, and
//! exposes typed read/write operations over it. Exactly one request/response
//! exchange is in flight at a time; every operation takes `&mut self`, so
//! concurrent use of a single instance is ruled out at compile time.
//!
//! Two API layers are provided:
//! - block operations named after the protocol functions
//!   ([`read_coils`](ModbusClient::read_coils),
//!   [`write_multiple_registers`](ModbusClient::write_multiple_registers), ...)
//! - single-point convenience operations in the DO/DI/AO/AI vocabulary of
//!   remote I/O modules ([`read_do`](ModbusClient::read_do),
//!   [`write_ao`](ModbusClient::write_ao), ...)

use std::net::{IpAddr, SocketAddr};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::codec;
use crate::constants::{
    DEFAULT_TCP_PORT, DEFAULT_UNIT_ID, FC_READ_COILS, FC_READ_DISCRETE_INPUTS,
    FC_READ_HOLDING_REGISTERS, FC_READ_INPUT_REGISTERS, FC_WRITE_MULTIPLE_COILS,
    FC_WRITE_MULTIPLE_REGISTERS, FC_WRITE_SINGLE_COIL, FC_WRITE_SINGLE_REGISTER,
};
use crate::error::{ExceptionCode, ModbusError, ModbusResult};
use crate::frame::{self, MbapHeader};
use crate::pdu::ModbusPdu;
use crate::transport::{ConnectionState, TcpTransport};

fn default_port() -> u16 {
    DEFAULT_TCP_PORT
}

fn default_name() -> String {
    "unknown".to_string()
}

/// Network identity of one device.
///
/// Deployments typically embed this in their own configuration; port and
/// display name may be omitted there and fall back to the Modbus defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Device IP address as text; resolved at connect time.
    pub ip_address: String,
    /// TCP port, 502 unless overridden.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Display name for logs and diagnostics.
    #[serde(default = "default_name")]
    pub name: String,
}

impl Endpoint {
    /// Endpoint on the default Modbus port with an anonymous name.
    pub fn new(ip_address: impl Into<String>) -> Self {
        Self {
            ip_address: ip_address.into(),
            port: default_port(),
            name: default_name(),
        }
    }

    /// Override the TCP port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Attach a display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Resolve to a socket address without touching the network.
    ///
    /// Fails when the address is empty, unparseable or the unspecified
    /// address (0.0.0.0 / ::), all of which can never identify a device.
    fn socket_addr(&self) -> ModbusResult<SocketAddr> {
        let ip: IpAddr = self.ip_address.parse().map_err(|_| {
            ModbusError::Connection(format!("invalid ip address: {:?}", self.ip_address))
        })?;
        if ip.is_unspecified() {
            return Err(ModbusError::Connection(
                "unspecified ip address".to_string(),
            ));
        }
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Master-side client for one Modbus TCP device.
#[derive(Debug)]
pub struct ModbusClient {
    endpoint: Endpoint,
    transport: TcpTransport,
    unit_id: u8,
    next_transaction_id: u16,
}

impl ModbusClient {
    /// Client for the given endpoint. No I/O happens until the first
    /// connect or operation.
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            transport: TcpTransport::new(),
            unit_id: DEFAULT_UNIT_ID,
            next_transaction_id: 1,
        }
    }

    /// Target a unit id other than the default 1 (devices behind gateways).
    pub fn with_unit_id(mut self, unit_id: u8) -> Self {
        self.unit_id = unit_id;
        self
    }

    // ===== connection lifecycle =====

    /// Establish the TCP connection.
    ///
    /// Address problems are reported without any network I/O. Idempotent:
    /// calling again while connected is a no-op.
    pub fn connect(&mut self) -> ModbusResult<()> {
        if self.transport.is_connected() {
            return Ok(());
        }
        let addr = self.endpoint.socket_addr()?;
        debug!(device = %self.endpoint.name, %addr, "establishing connection");
        self.transport.connect(addr)
    }

    /// Drop the connection.
    pub fn close(&mut self) {
        self.transport.close();
    }

    /// True while the transport holds a healthy connection.
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Observable connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.transport.state()
    }

    // ===== endpoint access =====

    /// Display name.
    pub fn name(&self) -> &str {
        &self.endpoint.name
    }

    /// Configured IP address text.
    pub fn ip_address(&self) -> &str {
        &self.endpoint.ip_address
    }

    /// Configured TCP port.
    pub fn port(&self) -> u16 {
        self.endpoint.port
    }

    /// Unit id used in outbound frames.
    pub fn unit_id(&self) -> u8 {
        self.unit_id
    }

    /// Point the client at a different address. Invalidates the current
    /// connection; the next operation reconnects first.
    pub fn set_ip_address(&mut self, ip_address: impl Into<String>) {
        self.endpoint.ip_address = ip_address.into();
        self.transport.invalidate();
    }

    /// Change the TCP port. Invalidates the current connection; the next
    /// operation reconnects first.
    pub fn set_port(&mut self, port: u16) {
        self.endpoint.port = port;
        self.transport.invalidate();
    }

    /// Rename the client. Purely cosmetic, the connection is untouched.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.endpoint.name = name.into();
    }

    // ===== block operations =====

    /// Read coil states (FC01).
    pub fn read_coils(&mut self, address: u16, quantity: u16) -> ModbusResult<Vec<bool>> {
        let request = codec::read_request(FC_READ_COILS, address, quantity)?;
        let response = self.execute(request)?;
        codec::parse_bit_response(&response, FC_READ_COILS, quantity)
    }

    /// Read discrete input states (FC02).
    pub fn read_discrete_inputs(&mut self, address: u16, quantity: u16) -> ModbusResult<Vec<bool>> {
        let request = codec::read_request(FC_READ_DISCRETE_INPUTS, address, quantity)?;
        let response = self.execute(request)?;
        codec::parse_bit_response(&response, FC_READ_DISCRETE_INPUTS, quantity)
    }

    /// Read holding registers (FC03).
    pub fn read_holding_registers(
        &mut self,
        address: u16,
        quantity: u16,
    ) -> ModbusResult<Vec<u16>> {
        let request = codec::read_request(FC_READ_HOLDING_REGISTERS, address, quantity)?;
        let response = self.execute(request)?;
        codec::parse_register_response(&response, FC_READ_HOLDING_REGISTERS, quantity)
    }

    /// Read input registers (FC04).
    pub fn read_input_registers(&mut self, address: u16, quantity: u16) -> ModbusResult<Vec<u16>> {
        let request = codec::read_request(FC_READ_INPUT_REGISTERS, address, quantity)?;
        let response = self.execute(request)?;
        codec::parse_register_response(&response, FC_READ_INPUT_REGISTERS, quantity)
    }

    /// Write one coil (FC05).
    pub fn write_single_coil(&mut self, address: u16, value: bool) -> ModbusResult<()> {
        let request = codec::write_single_coil_request(address, value)?;
        let response = self.execute(request)?;
        codec::parse_write_response(&response, FC_WRITE_SINGLE_COIL)
    }

    /// Write one holding register (FC06).
    pub fn write_single_register(&mut self, address: u16, value: u16) -> ModbusResult<()> {
        let request = codec::write_single_register_request(address, value)?;
        let response = self.execute(request)?;
        codec::parse_write_response(&response, FC_WRITE_SINGLE_REGISTER)
    }

    /// Write a run of coils (FC15).
    pub fn write_multiple_coils(&mut self, address: u16, values: &[bool]) -> ModbusResult<()> {
        let request = codec::write_multiple_coils_request(address, values)?;
        let response = self.execute(request)?;
        codec::parse_write_response(&response, FC_WRITE_MULTIPLE_COILS)
    }

    /// Write a run of holding registers (FC16).
    pub fn write_multiple_registers(&mut self, address: u16, values: &[u16]) -> ModbusResult<()> {
        let request = codec::write_multiple_registers_request(address, values)?;
        let response = self.execute(request)?;
        codec::parse_write_response(&response, FC_WRITE_MULTIPLE_REGISTERS)
    }

    // ===== single-point operations (I/O module vocabulary) =====

    /// State of one digital output point.
    pub fn read_do(&mut self, address: u16) -> ModbusResult<bool> {
        single_bit(self.read_coils(address, 1)?)
    }

    /// State of one digital input point.
    pub fn read_di(&mut self, address: u16) -> ModbusResult<bool> {
        single_bit(self.read_discrete_inputs(address, 1)?)
    }

    /// Value of one analog output point.
    pub fn read_ao(&mut self, address: u16) -> ModbusResult<u16> {
        single_register(self.read_holding_registers(address, 1)?)
    }

    /// Value of one analog input point.
    pub fn read_ai(&mut self, address: u16) -> ModbusResult<u16> {
        single_register(self.read_input_registers(address, 1)?)
    }

    /// Switch one digital output point.
    pub fn write_do(&mut self, address: u16, value: bool) -> ModbusResult<()> {
        self.write_single_coil(address, value)
    }

    /// Set one analog output point.
    pub fn write_ao(&mut self, address: u16, value: u16) -> ModbusResult<()> {
        self.write_single_register(address, value)
    }

    /// Switch a run of digital output points.
    pub fn write_dos(&mut self, address: u16, values: &[bool]) -> ModbusResult<()> {
        self.write_multiple_coils(address, values)
    }

    /// Set a run of analog output points.
    pub fn write_aos(&mut self, address: u16, values: &[u16]) -> ModbusResult<()> {
        self.write_multiple_registers(address, values)
    }

    // ===== exchange =====

    fn next_transaction_id(&mut self) -> u16 {
        let id = self.next_transaction_id;
        self.next_transaction_id = self.next_transaction_id.wrapping_add(1);
        id
    }

    /// Run one request/response exchange.
    ///
    /// Reconnects first when the connection is not established (covers both
    /// lazy initial connect and recovery after an endpoint change or fault),
    /// then sends the freshly built frame and validates the response against
    /// it. Device exceptions surface as [`ModbusError::Exception`].
    fn execute(&mut self, request: ModbusPdu) -> ModbusResult<ModbusPdu> {
        let function = request
            .function_code()
            .ok_or_else(|| ModbusError::InvalidRequest("empty request PDU".to_string()))?;

        self.connect()?;

        let transaction_id = self.next_transaction_id();
        let header = MbapHeader::for_request(transaction_id, self.unit_id, &request);
        let frame_bytes = frame::encode_adu(&header, &request);

        self.transport.send(&frame_bytes)?;
        let (response_header, response) = self.transport.recv()?;

        frame::check_response(&response_header, transaction_id, self.unit_id)?;

        let response_function = response
            .function_code()
            .ok_or_else(|| ModbusError::Frame("empty response PDU".to_string()))?;

        if response.is_exception() {
            if response_function & 0x7F != function {
                return Err(ModbusError::Frame(format!(
                    "exception for foreign function: sent 0x{function:02X}, got 0x{response_function:02X}"
                )));
            }
            let code = response
                .exception_code()
                .ok_or_else(|| ModbusError::Frame("truncated exception response".to_string()))?;
            let classified = ExceptionCode::from_code(code);
            debug!(
                device = %self.endpoint.name,
                function_code = function,
                exception = %classified,
                "device reported exception"
            );
            return Err(ModbusError::Exception(classified));
        }

        if response_function != function {
            return Err(ModbusError::Frame(format!(
                "function code mismatch: sent 0x{function:02X}, got 0x{response_function:02X}"
            )));
        }

        Ok(response)
    }
}

fn single_bit(bits: Vec<bool>) -> ModbusResult<bool> {
    bits.first()
        .copied()
        .ok_or_else(|| ModbusError::Frame("empty point response".to_string()))
}

fn single_register(registers: Vec<u16>) -> ModbusResult<u16> {
    registers
        .first()
        .copied()
        .ok_or_else(|| ModbusError::Frame("empty point response".to_string()))
}
