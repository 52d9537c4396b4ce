//! BACnet/IP device adapter.
//!
//! This crate lets application logic act as a BACnet/IP device by servicing
//! an external protocol engine's callbacks. The engine owns all BACnet
//! semantics (BVLC/NPDU/APDU framing, service decoding, timers, retries);
//! the adapter answers its typed property queries from an in-memory store
//! and performs the actual UDP I/O, translating between raw byte buffers
//! plus 6-byte connection descriptors and real datagrams.
//!
//! # Getting Started
//!
//! Supply an engine implementing [`ProtocolEngine`], then let the
//! controller drive it cooperatively:
//!
//! ```no_run
//! use bacnet_adapter::{DeviceConfig, DeviceController, EngineCallbacks, ProtocolEngine};
//!
//! struct MyEngine; // the external BACnet stack, supplied separately
//! # impl ProtocolEngine for MyEngine {
//! #     fn version_info(&self) -> String { String::new() }
//! #     fn add_device(&mut self, _: u32) -> bool { true }
//! #     fn add_object(&mut self, _: u32, _: u16, _: u32) -> bool { true }
//! #     fn set_service_enabled(&mut self, _: u32, _: u16, _: bool) -> bool { true }
//! #     fn process(&mut self, _: &mut dyn EngineCallbacks) {}
//! # }
//!
//! fn main() -> bacnet_adapter::Result<()> {
//!     let mut controller = DeviceController::new(MyEngine, DeviceConfig::default())?;
//!     controller.startup()?;
//!
//!     loop {
//!         controller.tick();
//!         std::thread::sleep(std::time::Duration::from_millis(100));
//!     }
//! }
//! ```
//!
//! During each `tick()` the engine synchronously invokes zero or more
//! [`EngineCallbacks`] (property lookups, send, receive, system time),
//! all serviced on the caller's stack. Everything runs on one logical
//! thread; the non-blocking receive is bounded by a short tunable timeout
//! so a tick never stalls.
//!
//! # Failure model
//!
//! Setup failures (socket bind, registration rejections) are real errors
//! and abort startup. Everything at the callback boundary is converted to
//! the protocol's own pass/fail signal: lookup misses and refused I/O
//! report `false` or a zero length, and receive timeouts are normal
//! control flow. The callback boundary never unwinds into the engine.

pub mod backend;
pub mod descriptor;
pub mod device;
pub mod engine;
mod error;
pub mod store;
pub mod transport;
pub mod types;

// Crate-level error types
pub use error::{Error, Result};

// Engine boundary contracts
pub use engine::{EngineCallbacks, ProtocolEngine};

// Callback backend
pub use backend::DeviceBackend;

// Device lifecycle
pub use device::{DeviceConfig, DeviceController};

// Property storage
pub use store::PropertyStore;

// Transport shim
pub use transport::{TransportConfig, UdpTransport};

// Connection descriptor codec
pub use descriptor::{MalformedDescriptor, DESCRIPTOR_LEN};

// Core types and constants
pub use types::{
    encoding, property, service, NetworkType, ObjectType, PropertyKey, BACNET_IP_PORT,
};
