//! Callback backend servicing the engine against the store and transport.

use log::{debug, warn};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::descriptor::{self, DESCRIPTOR_LEN};
use crate::engine::EngineCallbacks;
use crate::store::PropertyStore;
use crate::transport::UdpTransport;
use crate::types::{encoding, NetworkType, PropertyKey};

/// The concrete [`EngineCallbacks`] implementation.
///
/// Owns the property store and the UDP endpoint, plus the registered device
/// instance used to gate property lookups. Callbacks run nested inside the
/// engine's processing step on one logical thread; the store is mutated only
/// by the device controller between steps (single writer), so no locking is
/// involved anywhere.
pub struct DeviceBackend {
    store: PropertyStore,
    transport: UdpTransport,
    device_instance: Option<u32>,
}

impl DeviceBackend {
    pub fn new(transport: UdpTransport) -> Self {
        Self {
            store: PropertyStore::new(),
            transport,
            device_instance: None,
        }
    }

    /// Records the registered device instance once registration succeeds.
    pub(crate) fn set_device_instance(&mut self, device_instance: u32) {
        self.device_instance = Some(device_instance);
    }

    pub fn store(&self) -> &PropertyStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut PropertyStore {
        &mut self.store
    }

    pub fn transport(&self) -> &UdpTransport {
        &self.transport
    }

    /// Device-id gate: lookups for anything but the registered device are
    /// answered "not found", never an error.
    fn is_registered_device(&self, device_instance: u32) -> bool {
        match self.device_instance {
            Some(registered) if registered == device_instance => true,
            Some(registered) => {
                debug!(
                    "device instance mismatch: expected {}, got {}",
                    registered, device_instance
                );
                false
            }
            None => {
                debug!("property lookup before device registration");
                false
            }
        }
    }
}

impl EngineCallbacks for DeviceBackend {
    fn get_system_time(&mut self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default()
    }

    fn send_message(
        &mut self,
        payload: &[u8],
        destination: &[u8],
        network_type: u8,
        broadcast: bool,
    ) -> usize {
        if NetworkType::from_code(network_type) != Some(NetworkType::Ipv4Udp) {
            warn!(
                "refusing send: unsupported network type {} (only BACnet/IP)",
                network_type
            );
            return 0;
        }

        let dest = match descriptor::decode(destination) {
            Ok(addr) => addr,
            Err(e) => {
                warn!("refusing send: {}", e);
                return 0;
            }
        };

        self.transport.send(payload, dest, broadcast)
    }

    fn receive_message(
        &mut self,
        buffer: &mut [u8],
        source_out: &mut [u8],
        source_len_out: &mut usize,
        network_type_out: &mut u8,
    ) -> usize {
        // Checked before any socket I/O so a refused call leaves the
        // datagram pending.
        if source_out.len() < DESCRIPTOR_LEN {
            warn!(
                "refusing receive: descriptor buffer holds {} bytes, need {}",
                source_out.len(),
                DESCRIPTOR_LEN
            );
            return 0;
        }

        let Some((len, src)) = self.transport.try_receive(buffer) else {
            return 0;
        };

        match descriptor::encode_into(src, source_out) {
            Ok(written) => *source_len_out = written,
            Err(_) => return 0,
        }
        *network_type_out = NetworkType::Ipv4Udp.code();
        len
    }

    fn get_property_real(
        &mut self,
        device_instance: u32,
        object_type: u16,
        object_instance: u32,
        property: u32,
        value: &mut f32,
        _use_array_index: bool,
        _array_index: u32,
    ) -> bool {
        if !self.is_registered_device(device_instance) {
            return false;
        }

        let key = PropertyKey::new(object_type, object_instance, property);
        match self.store.get_real(key) {
            Some(found) => {
                debug!("real property {} = {}", key, found);
                *value = found;
                true
            }
            None => {
                debug!("real property {} not found", key);
                false
            }
        }
    }

    fn get_property_character_string(
        &mut self,
        device_instance: u32,
        object_type: u16,
        object_instance: u32,
        property: u32,
        value: &mut [u8],
        value_len_out: &mut usize,
        encoding_out: &mut u8,
        _use_array_index: bool,
        _array_index: u32,
    ) -> bool {
        if !self.is_registered_device(device_instance) {
            return false;
        }

        let key = PropertyKey::new(object_type, object_instance, property);
        let Some(text) = self.store.get_text(key) else {
            debug!("text property {} not found", key);
            return false;
        };

        let bytes = text.as_bytes();
        if bytes.len() >= value.len() {
            warn!(
                "text property {} needs {} bytes, buffer holds {}",
                key,
                bytes.len(),
                value.len()
            );
            return false;
        }

        value[..bytes.len()].copy_from_slice(bytes);
        *value_len_out = bytes.len();
        *encoding_out = encoding::UTF8;
        debug!("text property {} = {:?} ({} bytes)", key, text, bytes.len());
        true
    }

    fn get_property_enumerated(
        &mut self,
        device_instance: u32,
        object_type: u16,
        object_instance: u32,
        property: u32,
        value: &mut u32,
        _use_array_index: bool,
        _array_index: u32,
    ) -> bool {
        if !self.is_registered_device(device_instance) {
            return false;
        }

        let key = PropertyKey::new(object_type, object_instance, property);
        match self.store.get_enum(key) {
            Some(found) => {
                debug!("enumerated property {} = {}", key, found);
                *value = found;
                true
            }
            None => {
                debug!("enumerated property {} not found", key);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportConfig;
    use crate::types::{property, ObjectType};
    use std::net::Ipv4Addr;

    const DEVICE: u32 = 12345;

    fn backend() -> DeviceBackend {
        let config = TransportConfig {
            bind_addr: Ipv4Addr::LOCALHOST,
            port: 0,
            ..Default::default()
        };
        let mut backend = DeviceBackend::new(UdpTransport::bind(&config).unwrap());
        backend.set_device_instance(DEVICE);
        backend
    }

    fn seed_real(backend: &mut DeviceBackend, value: f32) -> PropertyKey {
        let key = PropertyKey::of(ObjectType::AnalogInput, 1, property::PRESENT_VALUE);
        backend.store_mut().set_real(key, value);
        key
    }

    #[test]
    fn system_time_is_after_epoch() {
        let mut backend = backend();
        assert!(backend.get_system_time() > 1_500_000_000);
    }

    #[test]
    fn real_lookup_found_and_missing() {
        let mut backend = backend();
        let key = seed_real(&mut backend, 99.1);

        let mut value = 0.0f32;
        assert!(backend.get_property_real(
            DEVICE,
            key.object_type,
            key.object_instance,
            key.property,
            &mut value,
            false,
            0
        ));
        assert_eq!(value, 99.1);

        assert!(!backend.get_property_real(DEVICE, key.object_type, 2, key.property, &mut value, false, 0));
    }

    #[test]
    fn device_id_mismatch_reads_as_not_found() {
        let mut backend = backend();
        let key = seed_real(&mut backend, 99.1);

        let mut value = 0.0f32;
        assert!(!backend.get_property_real(
            DEVICE + 1,
            key.object_type,
            key.object_instance,
            key.property,
            &mut value,
            false,
            0
        ));
        assert_eq!(value, 0.0, "refused lookup must not write");
    }

    #[test]
    fn array_index_is_ignored_for_lookup() {
        let mut backend = backend();
        let key = seed_real(&mut backend, 42.0);

        let mut value = 0.0f32;
        assert!(backend.get_property_real(
            DEVICE,
            key.object_type,
            key.object_instance,
            key.property,
            &mut value,
            true,
            7
        ));
        assert_eq!(value, 42.0);
    }

    #[test]
    fn value_kinds_stay_isolated_across_callbacks() {
        let mut backend = backend();
        let key = PropertyKey::of(ObjectType::AnalogInput, 1, property::OBJECT_NAME);
        backend.store_mut().set_text(key, "Temperature Sensor");

        let mut real = 0.0f32;
        let mut enumerated = 0u32;
        assert!(!backend.get_property_real(
            DEVICE,
            key.object_type,
            key.object_instance,
            key.property,
            &mut real,
            false,
            0
        ));
        assert!(!backend.get_property_enumerated(
            DEVICE,
            key.object_type,
            key.object_instance,
            key.property,
            &mut enumerated,
            false,
            0
        ));
    }

    #[test]
    fn string_lookup_reports_length_and_encoding() {
        let mut backend = backend();
        let key = PropertyKey::of(ObjectType::AnalogInput, 1, property::OBJECT_NAME);
        backend.store_mut().set_text(key, "Temperature Sensor");

        let mut out = [0u8; 64];
        let mut len = 0usize;
        let mut enc = 0xFFu8;
        assert!(backend.get_property_character_string(
            DEVICE,
            key.object_type,
            key.object_instance,
            key.property,
            &mut out,
            &mut len,
            &mut enc,
            false,
            0
        ));
        assert_eq!(&out[..len], b"Temperature Sensor");
        assert_eq!(enc, encoding::UTF8);
    }

    #[test]
    fn string_overflow_is_refused_with_no_partial_write() {
        let mut backend = backend();
        let key = PropertyKey::of(ObjectType::AnalogInput, 1, property::OBJECT_NAME);
        backend.store_mut().set_text(key, "Temperature Sensor");

        // 18 bytes of text into an 18-byte buffer: the fit must be strict.
        let mut out = [0xEEu8; 18];
        let mut len = 0usize;
        let mut enc = 0xFFu8;
        assert!(!backend.get_property_character_string(
            DEVICE,
            key.object_type,
            key.object_instance,
            key.property,
            &mut out,
            &mut len,
            &mut enc,
            false,
            0
        ));
        assert_eq!(out, [0xEE; 18], "refused lookup must not write");
        assert_eq!(len, 0);

        let mut roomy = [0u8; 19];
        assert!(backend.get_property_character_string(
            DEVICE,
            key.object_type,
            key.object_instance,
            key.property,
            &mut roomy,
            &mut len,
            &mut enc,
            false,
            0
        ));
        assert_eq!(len, 18);
    }

    #[test]
    fn send_refuses_unsupported_network_type() {
        let mut backend = backend();
        let descriptor = descriptor::encode(std::net::SocketAddrV4::new(
            Ipv4Addr::LOCALHOST,
            47808,
        ));
        let sent = backend.send_message(
            &[0x81, 0x0A],
            &descriptor,
            NetworkType::Mstp.code(),
            false,
        );
        assert_eq!(sent, 0);
        assert_eq!(backend.send_message(&[0x81, 0x0A], &descriptor, 0x7F, false), 0);
    }

    #[test]
    fn send_refuses_malformed_descriptor() {
        let mut backend = backend();
        let sent = backend.send_message(
            &[0x81, 0x0A],
            &[127, 0, 0, 1],
            NetworkType::Ipv4Udp.code(),
            false,
        );
        assert_eq!(sent, 0);
    }

    #[test]
    fn receive_refuses_short_descriptor_buffer_before_io() {
        let mut backend = backend();

        // Park a datagram on the socket, then call with a 4-byte descriptor
        // buffer: the refusal must leave the datagram unconsumed.
        let peer = std::net::UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        let local = backend.transport().local_addr().unwrap();
        peer.send_to(&[0x81, 0x0B, 0x00, 0x04], local).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(20));

        let mut buffer = [0u8; 64];
        let mut short = [0u8; 4];
        let mut source_len = 0usize;
        let mut network_type = 0xFFu8;
        assert_eq!(
            backend.receive_message(&mut buffer, &mut short, &mut source_len, &mut network_type),
            0
        );
        assert_eq!(network_type, 0xFF, "refused receive must not write");

        let mut source = [0u8; DESCRIPTOR_LEN];
        let mut len = 0;
        for _ in 0..100 {
            len = backend.receive_message(&mut buffer, &mut source, &mut source_len, &mut network_type);
            if len > 0 {
                break;
            }
        }
        assert_eq!(len, 4, "datagram should still be pending after refusal");
        assert_eq!(source_len, DESCRIPTOR_LEN);
        assert_eq!(network_type, NetworkType::Ipv4Udp.code());
        let src = descriptor::decode(&source).unwrap();
        assert_eq!(src.port(), peer.local_addr().unwrap().port());
    }
}
