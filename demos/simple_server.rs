//! Minimal BACnet/IP device demo.
//!
//! Wires the device controller to a placeholder engine that drains the
//! socket and prints traffic. Swap `LoggingEngine` for a real protocol
//! engine to serve actual BACnet requests; the adapter side stays the same.
//!
//! Run with: `cargo run --example simple_server -- --device-instance 12345`

use bacnet_adapter::{
    DeviceConfig, DeviceController, EngineCallbacks, ProtocolEngine, Result, BACNET_IP_PORT,
};
use clap::Parser;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(about = "Run a demo BACnet/IP device")]
struct Args {
    /// Device instance to register.
    #[arg(long, default_value_t = 12345)]
    device_instance: u32,

    /// Milliseconds to sleep between ticks.
    #[arg(long, default_value_t = 100)]
    tick_ms: u64,
}

/// Placeholder engine: drains pending datagrams so the demo shows live
/// traffic, but speaks no BACnet itself.
struct LoggingEngine;

impl ProtocolEngine for LoggingEngine {
    fn version_info(&self) -> String {
        "logging-engine (placeholder)".to_string()
    }

    fn add_device(&mut self, _device_instance: u32) -> bool {
        true
    }

    fn add_object(&mut self, _device_instance: u32, _object_type: u16, _object_instance: u32) -> bool {
        true
    }

    fn set_service_enabled(&mut self, _device_instance: u32, _service: u16, _enabled: bool) -> bool {
        true
    }

    fn process(&mut self, callbacks: &mut dyn EngineCallbacks) {
        let mut buffer = [0u8; 1472];
        let mut source = [0u8; 6];
        let mut source_len = 0usize;
        let mut network_type = 0u8;
        let len = callbacks.receive_message(&mut buffer, &mut source, &mut source_len, &mut network_type);
        if len > 0 {
            println!("received {} byte datagram (network type {})", len, network_type);
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = DeviceConfig {
        device_instance: args.device_instance,
        ..Default::default()
    };
    let mut controller = DeviceController::new(LoggingEngine, config)?;
    controller.startup()?;

    println!(
        "Serving device {} on UDP port {}... Press Ctrl+C to stop",
        args.device_instance, BACNET_IP_PORT
    );

    loop {
        controller.tick();
        std::thread::sleep(Duration::from_millis(args.tick_ms));
    }
}
