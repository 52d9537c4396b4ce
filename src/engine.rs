//! Contract surface between the adapter and the external protocol engine.
//!
//! The engine owns all BACnet semantics: BVLC/NPDU/APDU framing, service
//! decoding, timers and retries. It is supplied by the host application and
//! interacts with this crate through exactly two seams: the registration
//! and processing surface it exposes ([`ProtocolEngine`]) and the callback
//! surface it invokes ([`EngineCallbacks`]). The adapter implements the
//! callbacks; the controller hands them to [`ProtocolEngine::process`] on
//! every cooperative step.

/// Surface the external protocol engine exposes to the device controller.
///
/// Registration calls are fallible in the engine's own vocabulary: `false`
/// means the engine refused the identifier (a duplicate, for instance). The
/// controller converts refusals into registration errors.
pub trait ProtocolEngine {
    /// Human-readable engine build/version string, logged at startup.
    fn version_info(&self) -> String;

    /// Registers a device instance.
    fn add_device(&mut self, device_instance: u32) -> bool;

    /// Registers an object on a previously added device.
    fn add_object(&mut self, device_instance: u32, object_type: u16, object_instance: u32)
        -> bool;

    /// Enables or disables an optional service on a device.
    fn set_service_enabled(&mut self, device_instance: u32, service: u16, enabled: bool) -> bool;

    /// Performs one processing step.
    ///
    /// During the step the engine synchronously invokes zero or more
    /// callbacks on `callbacks`, all nested on the caller's stack. The
    /// engine must not retain the reference past the step.
    fn process(&mut self, callbacks: &mut dyn EngineCallbacks);
}

/// Callback surface the engine invokes during [`ProtocolEngine::process`].
///
/// # Contract
///
/// Implementations must never panic and never block longer than the
/// transport's receive timeout: every failure is converted into the
/// protocol's own pass/fail signal (a `bool` or a zero length) so control
/// always returns to the engine cleanly. All callbacks run on the one
/// logical thread that called `process`, so implementations need no
/// internal locking.
///
/// Output parameters are mutable slice or reference views with explicit
/// capacities; implementations validate lengths before writing and never
/// write past a declared capacity.
pub trait EngineCallbacks {
    /// Returns the current time in whole seconds since the UNIX epoch.
    /// Always succeeds.
    fn get_system_time(&mut self) -> u64;

    /// Sends `payload` to the peer encoded in the `destination` connection
    /// descriptor.
    ///
    /// A network-type code other than IPv4/UDP or a malformed descriptor is
    /// refused without any I/O. With `broadcast` set the destination
    /// address is overridden by the limited-broadcast address. Returns the
    /// number of bytes sent; zero signals refusal or a send failure.
    fn send_message(
        &mut self,
        payload: &[u8],
        destination: &[u8],
        network_type: u8,
        broadcast: bool,
    ) -> usize;

    /// Polls for one incoming datagram into `buffer`.
    ///
    /// Refused immediately (returns zero, no socket I/O) when `source_out`
    /// cannot hold a full connection descriptor. On receipt the source
    /// descriptor, its length, and the network-type code are written to the
    /// out-parameters and the payload length is returned. Zero also covers
    /// the normal nothing-pending case.
    fn receive_message(
        &mut self,
        buffer: &mut [u8],
        source_out: &mut [u8],
        source_len_out: &mut usize,
        network_type_out: &mut u8,
    ) -> usize;

    /// Looks up a Real property value.
    ///
    /// Fails (returns `false`) when `device_instance` is not the registered
    /// device or the key is absent from the Real store. On success the
    /// value is written to `value`. The array index is accepted but ignored.
    #[allow(clippy::too_many_arguments)]
    fn get_property_real(
        &mut self,
        device_instance: u32,
        object_type: u16,
        object_instance: u32,
        property: u32,
        value: &mut f32,
        use_array_index: bool,
        array_index: u32,
    ) -> bool;

    /// Looks up a CharacterString property value.
    ///
    /// The UTF-8 bytes are written to `value` only when they fit strictly
    /// within its capacity; otherwise the lookup fails with no partial
    /// write. On success `value_len_out` receives the byte count and
    /// `encoding_out` the character encoding code.
    #[allow(clippy::too_many_arguments)]
    fn get_property_character_string(
        &mut self,
        device_instance: u32,
        object_type: u16,
        object_instance: u32,
        property: u32,
        value: &mut [u8],
        value_len_out: &mut usize,
        encoding_out: &mut u8,
        use_array_index: bool,
        array_index: u32,
    ) -> bool;

    /// Looks up an Enumerated property value.
    #[allow(clippy::too_many_arguments)]
    fn get_property_enumerated(
        &mut self,
        device_instance: u32,
        object_type: u16,
        object_instance: u32,
        property: u32,
        value: &mut u32,
        use_array_index: bool,
        array_index: u32,
    ) -> bool;
}
