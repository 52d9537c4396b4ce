//! Crate-level error types.
//!
//! Only the fatal setup class lives here: socket bind failures and engine
//! registration rejections abort startup. Per-callback failures are reported
//! through the callback protocol's own pass/fail signals (a bool or a zero
//! length) and never unwind past the engine.

use std::io;
use std::net::SocketAddr;

use crate::types::ObjectType;

/// Crate-level error type.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The UDP endpoint could not be bound at startup.
    #[error("failed to bind UDP socket on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// The device was initialized a second time.
    #[error("device {device_instance} is already initialized")]
    AlreadyInitialized { device_instance: u32 },

    /// The engine refused the device registration (e.g. duplicate instance).
    #[error("engine rejected device {device_instance}")]
    DeviceRejected { device_instance: u32 },

    /// The engine refused an object registration.
    #[error("engine rejected {object_type} object {object_instance} on device {device_instance}")]
    ObjectRejected {
        device_instance: u32,
        object_type: ObjectType,
        object_instance: u32,
    },

    /// The engine refused a service enable call.
    #[error("engine rejected service {service} on device {device_instance}")]
    ServiceRejected { device_instance: u32, service: u16 },
}

/// Crate-level result type.
pub type Result<T> = std::result::Result<T, Error>;
