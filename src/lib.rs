//! # modbus_io - Blocking Modbus TCP Master Client
//!
//! A master-side Modbus TCP client for reading and writing discrete/analog
//! I/O points on remote industrial controllers (remote I/O modules) over a
//! persistent TCP connection.
//!
//! The transport is deliberately blocking `std::net`: one client owns one
//! connection, one exchange is in flight at a time, and every socket
//! operation blocks the calling thread until it completes or the transport
//! fails. Deployments that need timeouts or retries wrap the calls in their
//! own policy.
//!
//! ## Supported Function Codes
//!
//! | Code | Function |
//! |------|----------|
//! | 0x01 | Read Coils |
//! | 0x02 | Read Discrete Inputs |
//! | 0x03 | Read Holding Registers |
//! | 0x04 | Read Input Registers |
//! | 0x05 | Write Single Coil |
//! | 0x06 | Write Single Register |
//! | 0x0F | Write Multiple Coils |
//! | 0x10 | Write Multiple Registers |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use modbus_io::{Endpoint, ModbusClient, ModbusResult};
//!
//! fn main() -> ModbusResult<()> {
//!     let mut client =
//!         ModbusClient::new(Endpoint::new("192.168.1.10").with_name("rack-a"));
//!     client.connect()?;
//!
//!     // switch digital output 49 on and read it back
//!     client.write_do(49, true)?;
//!     let state = client.read_do(49)?;
//!     println!("DO 49: {state}");
//!
//!     // block read of four holding registers
//!     let values = client.read_holding_registers(0, 4)?;
//!     println!("AO block: {values:?}");
//!
//!     client.close();
//!     Ok(())
//! }
//! ```
//!
//! Device-reported failures surface as
//! [`ModbusError::Exception`](crate::error::ModbusError::Exception) with the
//! classified [`ExceptionCode`], distinct from transport errors, so callers
//! can tell a broken wire apart from a device that refused the request.

/// Protocol constants derived from the Modbus specification
pub mod constants;

/// Error types and device exception classification
pub mod error;

/// Stack-allocated PDU container
pub mod pdu;

/// MBAP framing and response correlation
pub mod frame;

/// Request builders and response parsers per function code
pub mod codec;

/// Blocking TCP transport with explicit connection state
pub mod transport;

/// The Modbus TCP master client
pub mod client;

// ============================================================================
// Re-exports for convenience
// ============================================================================

// === Core client API ===
pub use client::{Endpoint, ModbusClient};

// === Error handling ===
pub use error::{ExceptionCode, ModbusError, ModbusResult};

// === Connection lifecycle ===
pub use transport::{ConnectionState, TcpTransport};

// === Framing (advanced usage) ===
pub use frame::MbapHeader;
pub use pdu::ModbusPdu;

// === Protocol limits (commonly needed constants) ===
pub use constants::{
    DEFAULT_TCP_PORT, MAX_READ_BITS, MAX_READ_REGISTERS, MAX_WRITE_BITS, MAX_WRITE_REGISTERS,
};
