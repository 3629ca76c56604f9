// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the witmotion-vibration project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Serial WitMotion sensor
//!
//! Reads the frame stream of a WitMotion sensor from a serial device node,
//! typically `/dev/rfcomm0` for a sensor paired through an HC-06 Bluetooth
//! module. The port is opened with the blocking serialport API re-exported
//! by tokio-serial; no async runtime is involved.

use std::io::{ErrorKind, Read};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};
use tokio_serial::SerialPort;

use super::{CollectedData, FrameCollector, SampleSource};
use crate::config::DeviceConfig;
use crate::error::{Result, VibrationError};

/// Pause between two polls of an idle port
const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Largest chunk read from the port at once
const READ_CHUNK: usize = 256;

/// WitMotion sensor reached through a serial port
pub struct WitmotionDevice {
    config: DeviceConfig,
    port: Option<Box<dyn SerialPort>>,
    last_error: Option<String>,
}

impl WitmotionDevice {
    pub fn new(config: DeviceConfig) -> Self {
        Self {
            config,
            port: None,
            last_error: None,
        }
    }
}

impl SampleSource for WitmotionDevice {
    fn name(&self) -> &str {
        &self.config.serial_device
    }

    fn connect(&mut self) -> bool {
        if self.port.is_some() {
            return true;
        }

        info!(
            "Connecting to device {} at {} baud...",
            self.config.serial_device, self.config.baud_rate
        );
        let opened = tokio_serial::new(self.config.serial_device.as_str(), self.config.baud_rate)
            .timeout(Duration::from_millis(self.config.read_timeout_ms))
            .open();

        match opened {
            Ok(port) => {
                // Let the Bluetooth bridge settle before the first read
                thread::sleep(Duration::from_millis(self.config.settle_time_ms));
                self.port = Some(port);
                self.last_error = None;
                info!("Connected successfully");
                true
            }
            Err(e) => {
                error!(
                    "Failed to connect to device {}: {}",
                    self.config.serial_device, e
                );
                self.last_error = Some(e.to_string());
                false
            }
        }
    }

    fn collect_data(&mut self, duration: Duration) -> Result<CollectedData> {
        let port = self
            .port
            .as_mut()
            .ok_or_else(|| VibrationError::NotConnected {
                device: self.config.serial_device.clone(),
            })?;

        info!(
            "Collecting data for {:.1} seconds...",
            duration.as_secs_f64()
        );
        let mut collector = FrameCollector::new();
        let mut buffer = [0u8; READ_CHUNK];
        let start = Instant::now();
        // Bytes of a chunk arrived between the previous read and this one
        let mut last_read = 0.0;

        while start.elapsed() < duration {
            let available = match port.bytes_to_read() {
                Ok(count) => count as usize,
                Err(e) => {
                    error!("Error reading data: {}", e);
                    break;
                }
            };
            if available == 0 {
                thread::sleep(POLL_INTERVAL);
                continue;
            }

            let wanted = available.min(READ_CHUNK);
            match port.read(&mut buffer[..wanted]) {
                Ok(0) => continue,
                Ok(read) => {
                    let now = start.elapsed().as_secs_f64();
                    collector.feed_spanning(&buffer[..read], last_read, now);
                    last_read = now;
                }
                Err(e) if e.kind() == ErrorKind::TimedOut => {
                    debug!("Read timed out, polling again");
                }
                Err(e) => {
                    error!("Error reading data: {}", e);
                    break;
                }
            }
        }

        let data = collector.finish();
        if data.dropped_frames > 0 {
            warn!("{} malformed frames were skipped", data.dropped_frames);
        }
        Ok(data)
    }

    fn disconnect(&mut self) {
        if self.port.take().is_some() {
            info!("Disconnected from {}", self.config.serial_device);
        }
    }

    fn is_connected(&self) -> bool {
        self.port.is_some()
    }

    fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

/// List the serial ports present on this host
pub fn available_devices() -> Result<Vec<String>> {
    let ports = tokio_serial::available_ports().map_err(std::io::Error::from)?;
    Ok(ports.into_iter().map(|port| port.port_name).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn missing_device() -> DeviceConfig {
        DeviceConfig {
            serial_device: "/dev/witmotion-does-not-exist".to_string(),
            settle_time_ms: 0,
            ..DeviceConfig::default()
        }
    }

    #[test]
    fn test_connect_to_missing_device_returns_false() {
        let mut device = WitmotionDevice::new(missing_device());
        assert!(!device.connect());
        assert!(!device.is_connected());
        assert!(device.last_error().is_some());
    }

    #[test]
    fn test_collect_without_connection_fails() {
        let mut device = WitmotionDevice::new(missing_device());
        let result = device.collect_data(Duration::from_millis(10));
        assert!(matches!(result, Err(VibrationError::NotConnected { .. })));
    }

    #[test]
    fn test_disconnect_is_idempotent() {
        let mut device = WitmotionDevice::new(missing_device());
        device.disconnect();
        device.disconnect();
        assert!(!device.is_connected());
    }
}
