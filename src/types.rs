//! Core BACnet object model types.
//!
//! Provides the typed registration surface (object and network type enums)
//! and the raw-code property key used for value lookups. Typed enums are for
//! the controller-facing API; raw integer codes cross the engine boundary
//! unchanged, so lookups work for any code the engine hands over.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// Standard BACnet/IP (annex J) UDP port.
pub const BACNET_IP_PORT: u16 = 47808;

/// BACnet object types recognized by this adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ObjectType {
    AnalogInput,
    AnalogOutput,
    AnalogValue,
    BinaryInput,
    BinaryOutput,
    BinaryValue,
    Device,
}

impl ObjectType {
    /// Returns the wire code for this object type.
    pub fn code(self) -> u16 {
        match self {
            ObjectType::AnalogInput => 0,
            ObjectType::AnalogOutput => 1,
            ObjectType::AnalogValue => 2,
            ObjectType::BinaryInput => 3,
            ObjectType::BinaryOutput => 4,
            ObjectType::BinaryValue => 5,
            ObjectType::Device => 8,
        }
    }

    /// Parses a wire code. Returns `None` for codes outside the recognized subset.
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            0 => Some(ObjectType::AnalogInput),
            1 => Some(ObjectType::AnalogOutput),
            2 => Some(ObjectType::AnalogValue),
            3 => Some(ObjectType::BinaryInput),
            4 => Some(ObjectType::BinaryOutput),
            5 => Some(ObjectType::BinaryValue),
            8 => Some(ObjectType::Device),
            _ => None,
        }
    }

    /// Returns the display name for this object type.
    pub fn display_name(&self) -> &'static str {
        match self {
            ObjectType::AnalogInput => "analog-input",
            ObjectType::AnalogOutput => "analog-output",
            ObjectType::AnalogValue => "analog-value",
            ObjectType::BinaryInput => "binary-input",
            ObjectType::BinaryOutput => "binary-output",
            ObjectType::BinaryValue => "binary-value",
            ObjectType::Device => "device",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Network types the engine may declare on a message.
///
/// Only [`NetworkType::Ipv4Udp`] is serviced; anything else is refused
/// before any I/O is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NetworkType {
    /// BACnet/IP over UDP.
    Ipv4Udp,
    /// MS/TP serial. Declared by the engine but not supported here.
    Mstp,
}

impl NetworkType {
    /// Returns the wire code for this network type.
    pub fn code(self) -> u8 {
        match self {
            NetworkType::Ipv4Udp => 0,
            NetworkType::Mstp => 1,
        }
    }

    /// Parses a wire code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(NetworkType::Ipv4Udp),
            1 => Some(NetworkType::Mstp),
            _ => None,
        }
    }
}

/// Property identifiers in the recognized subset.
pub mod property {
    pub const OBJECT_IDENTIFIER: u32 = 75;
    pub const OBJECT_NAME: u32 = 77;
    pub const OBJECT_TYPE: u32 = 79;
    pub const PRESENT_VALUE: u32 = 85;
    pub const UNITS: u32 = 117;
}

/// Service identifiers the controller may enable on the engine.
pub mod service {
    pub const READ_PROPERTY_MULTIPLE: u16 = 14;
}

/// Character string encoding codes reported by the string property callback.
pub mod encoding {
    pub const UTF8: u8 = 0;
}

/// Exact-match lookup key for a stored property value.
///
/// The object type is kept as its raw wire code so keys can be formed for
/// any code the engine supplies, recognized or not. Array indexes are not
/// part of the key; callers accept and ignore them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PropertyKey {
    pub object_type: u16,
    pub object_instance: u32,
    pub property: u32,
}

impl PropertyKey {
    /// Creates a key from raw wire codes.
    pub fn new(object_type: u16, object_instance: u32, property: u32) -> Self {
        Self {
            object_type,
            object_instance,
            property,
        }
    }

    /// Creates a key for a recognized object type.
    pub fn of(object_type: ObjectType, object_instance: u32, property: u32) -> Self {
        Self::new(object_type.code(), object_instance, property)
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.object_type, self.object_instance, self.property
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_type_codes_round_trip() {
        for object_type in [
            ObjectType::AnalogInput,
            ObjectType::AnalogOutput,
            ObjectType::AnalogValue,
            ObjectType::BinaryInput,
            ObjectType::BinaryOutput,
            ObjectType::BinaryValue,
            ObjectType::Device,
        ] {
            assert_eq!(ObjectType::from_code(object_type.code()), Some(object_type));
        }
    }

    #[test]
    fn unknown_object_type_code_is_none() {
        assert_eq!(ObjectType::from_code(6), None);
        assert_eq!(ObjectType::from_code(1000), None);
    }

    #[test]
    fn network_type_codes_round_trip() {
        assert_eq!(NetworkType::from_code(0), Some(NetworkType::Ipv4Udp));
        assert_eq!(NetworkType::from_code(1), Some(NetworkType::Mstp));
        assert_eq!(NetworkType::from_code(2), None);
    }

    #[test]
    fn property_key_display_matches_code_triple() {
        let key = PropertyKey::of(ObjectType::AnalogInput, 1, property::PRESENT_VALUE);
        assert_eq!(key.to_string(), "0:1:85");
    }
}
