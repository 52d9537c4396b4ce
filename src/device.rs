//! Device lifecycle and the cooperative tick loop.

use log::{debug, info};
use std::time::{Duration, Instant};

use crate::backend::DeviceBackend;
use crate::engine::ProtocolEngine;
use crate::error::{Error, Result};
use crate::transport::{TransportConfig, UdpTransport};
use crate::types::{property, service, ObjectType, PropertyKey};

/// Configuration for [`DeviceController`].
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// BACnet device instance to register.
    pub device_instance: u32,
    /// Analog-input object instance created at startup.
    pub object_instance: u32,
    /// Object name seeded for the analog input.
    pub object_name: String,
    /// Present value seeded at startup.
    pub initial_value: f32,
    /// Amount added to the tracked value on each timed update.
    pub value_increment: f32,
    /// Minimum wall-clock gap between timed updates.
    pub update_interval: Duration,
    /// Transport endpoint settings.
    pub transport: TransportConfig,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            device_instance: 12345,
            object_instance: 1,
            object_name: "Temperature Sensor".to_string(),
            initial_value: 99.1,
            value_increment: 1.1,
            update_interval: Duration::from_secs(3),
            transport: TransportConfig::default(),
        }
    }
}

/// Owns the engine and the callback backend; drives startup and the
/// cooperative tick loop.
///
/// The lifecycle is one-way: a controller goes from uninitialized to
/// initialized exactly once, and a second [`startup`](Self::startup) fails.
/// Cadence belongs to the host loop; `tick()` performs one step and returns.
pub struct DeviceController<E: ProtocolEngine> {
    engine: E,
    backend: DeviceBackend,
    config: DeviceConfig,
    initialized: bool,
    tracked_value: f32,
    last_update: Instant,
}

impl<E: ProtocolEngine> DeviceController<E> {
    /// Binds the transport and wraps the engine. A bind failure is fatal.
    pub fn new(engine: E, config: DeviceConfig) -> Result<Self> {
        let transport = UdpTransport::bind(&config.transport)?;
        Ok(Self {
            engine,
            backend: DeviceBackend::new(transport),
            tracked_value: config.initial_value,
            config,
            initialized: false,
            last_update: Instant::now(),
        })
    }

    /// Registers the device and its objects with the engine, seeds the
    /// initial property values, and enables optional services.
    pub fn startup(&mut self) -> Result<()> {
        info!("using engine: {}", self.engine.version_info());

        let device = self.config.device_instance;
        self.initialize_device()?;

        let object_type = ObjectType::AnalogInput;
        let instance = self.config.object_instance;
        if !self.engine.add_object(device, object_type.code(), instance) {
            return Err(Error::ObjectRejected {
                device_instance: device,
                object_type,
                object_instance: instance,
            });
        }
        info!("registered {} {} on device {}", object_type, instance, device);

        let store = self.backend.store_mut();
        store.set_real(
            PropertyKey::of(object_type, instance, property::PRESENT_VALUE),
            self.config.initial_value,
        );
        store.set_text(
            PropertyKey::of(object_type, instance, property::OBJECT_NAME),
            self.config.object_name.clone(),
        );
        debug!(
            "seeded {} {} with present value {} and name {:?}",
            object_type, instance, self.config.initial_value, self.config.object_name
        );

        if !self
            .engine
            .set_service_enabled(device, service::READ_PROPERTY_MULTIPLE, true)
        {
            return Err(Error::ServiceRejected {
                device_instance: device,
                service: service::READ_PROPERTY_MULTIPLE,
            });
        }

        self.last_update = Instant::now();
        info!("device {} startup complete", device);
        Ok(())
    }

    /// Registers the device instance; succeeds exactly once.
    fn initialize_device(&mut self) -> Result<()> {
        let device = self.config.device_instance;
        if self.initialized {
            return Err(Error::AlreadyInitialized {
                device_instance: device,
            });
        }
        if !self.engine.add_device(device) {
            return Err(Error::DeviceRejected {
                device_instance: device,
            });
        }
        self.backend.set_device_instance(device);
        self.initialized = true;
        info!("device {} initialized", device);
        Ok(())
    }

    /// Performs one cooperative step: lets the engine make progress (which
    /// drives callbacks into the backend), then applies the timed value
    /// update once the configured interval has elapsed.
    pub fn tick(&mut self) {
        self.engine.process(&mut self.backend);

        if self.last_update.elapsed() >= self.config.update_interval {
            self.last_update = Instant::now();
            let next = self.tracked_value + self.config.value_increment;
            self.tracked_value = next;
            self.update_present_value(self.config.object_instance, next);
        }
    }

    /// Writes a new present value for an analog-input instance through the
    /// store. This is the single mutation path for callback-visible values.
    pub fn update_present_value(&mut self, object_instance: u32, value: f32) {
        let key = PropertyKey::of(ObjectType::AnalogInput, object_instance, property::PRESENT_VALUE);
        let previous = self.backend.store_mut().set_real(key, value);
        match previous {
            Some(old) => debug!("analog-input {}: present value {} -> {}", object_instance, old, value),
            None => debug!("analog-input {}: present value set to {}", object_instance, value),
        }
    }

    /// Returns whether startup has completed.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// The value tracked by the timed update rule.
    pub fn tracked_value(&self) -> f32 {
        self.tracked_value
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn backend(&self) -> &DeviceBackend {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut DeviceBackend {
        &mut self.backend
    }
}
