//! Serial/UART channel implementation.
//!
//! This module provides serial port communication for peripherals
//! connected via USB/UART.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::Mutex;
use tokio_serial::{SerialPort, SerialPortBuilderExt, SerialStream};

use crate::error::{Error, Result};
use crate::transport::{ByteChannel, ChannelState};

/// Default baud rate.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default delay after opening before the port is considered ready.
pub const DEFAULT_OPEN_DELAY: Duration = Duration::from_millis(300);

/// Configuration for a serial channel.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Serial port path (e.g., "/dev/ttyUSB0" or "COM3").
    pub port: String,
    /// Baud rate.
    pub baud_rate: u32,
    /// Delay after opening before traffic starts.
    pub open_delay: Duration,
}

impl SerialConfig {
    /// Creates a new serial configuration with default settings.
    #[must_use]
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            open_delay: DEFAULT_OPEN_DELAY,
        }
    }

    /// Sets the baud rate.
    #[must_use]
    pub const fn baud_rate(mut self, rate: u32) -> Self {
        self.baud_rate = rate;
        self
    }

    /// Sets the open delay.
    #[must_use]
    pub const fn open_delay(mut self, delay: Duration) -> Self {
        self.open_delay = delay;
        self
    }
}

/// Serial channel backed by tokio-serial.
///
/// The stream is behind an async mutex so sends and receives may be
/// issued from different tasks. Receivers are expected to consult
/// [`ByteChannel::available`] before reading, so the lock is never held
/// across a blocking wait for data.
pub struct SerialChannel {
    config: SerialConfig,
    stream: Mutex<Option<SerialStream>>,
    state: AtomicU8,
}

impl SerialChannel {
    /// Creates a new serial channel with the given configuration.
    #[must_use]
    pub fn new(config: SerialConfig) -> Self {
        Self {
            config,
            stream: Mutex::new(None),
            state: AtomicU8::new(ChannelState::Closed as u8),
        }
    }

    /// Creates a new serial channel for the given port with default settings.
    #[must_use]
    pub fn with_port(port: impl Into<String>) -> Self {
        Self::new(SerialConfig::new(port))
    }

    fn set_state(&self, state: ChannelState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }
}

impl ByteChannel for SerialChannel {
    fn open(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            let mut stream = self.stream.lock().await;
            if stream.is_some() {
                return Ok(());
            }

            tracing::info!("opening serial port: {}", self.config.port);

            let mut port = tokio_serial::new(&self.config.port, self.config.baud_rate)
                .open_native_async()
                .map_err(Error::Serial)?;

            // Clear RTS; some adapters hold the peripheral in reset otherwise
            if let Err(e) = port.write_request_to_send(false) {
                tracing::warn!("failed to set RTS: {}", e);
            }

            // Wait for the peripheral to be ready
            tokio::time::sleep(self.config.open_delay).await;

            *stream = Some(port);
            self.set_state(ChannelState::Open);

            tracing::info!("serial port open");
            Ok(())
        })
    }

    fn close(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            let mut stream = self.stream.lock().await;
            if stream.take().is_some() {
                tracing::info!("closing serial port: {}", self.config.port);
            }
            self.set_state(ChannelState::Closed);
            Ok(())
        })
    }

    fn send(&self, data: Bytes) -> Pin<Box<dyn Future<Output = Result<usize>> + Send + '_>> {
        Box::pin(async move {
            let mut stream = self.stream.lock().await;
            let stream = stream.as_mut().ok_or(Error::PortNotOpen)?;

            tracing::trace!("sending {} bytes", data.len());

            if let Err(e) = stream.write_all(&data).await {
                self.set_state(ChannelState::Error);
                return Err(Error::Io(e));
            }
            if let Err(e) = stream.flush().await {
                self.set_state(ChannelState::Error);
                return Err(Error::Io(e));
            }

            Ok(data.len())
        })
    }

    fn receive<'a>(
        &'a self,
        buf: &'a mut [u8],
    ) -> Pin<Box<dyn Future<Output = Result<usize>> + Send + 'a>> {
        Box::pin(async move {
            let mut stream = self.stream.lock().await;
            let stream = stream.as_mut().ok_or(Error::PortNotOpen)?;

            match stream.read(buf).await {
                Ok(n) => {
                    tracing::trace!("received {} bytes", n);
                    Ok(n)
                }
                Err(e) => {
                    self.set_state(ChannelState::Error);
                    Err(Error::Io(e))
                }
            }
        })
    }

    fn available(&self) -> Pin<Box<dyn Future<Output = Result<usize>> + Send + '_>> {
        Box::pin(async move {
            let stream = self.stream.lock().await;
            let stream = stream.as_ref().ok_or(Error::PortNotOpen)?;

            let count = stream.bytes_to_read().map_err(Error::Serial)?;
            Ok(count as usize)
        })
    }

    fn state(&self) -> ChannelState {
        ChannelState::from_u8(self.state.load(Ordering::SeqCst))
    }
}

/// Lists available serial ports.
///
/// # Errors
///
/// Returns an error if the port list cannot be retrieved.
pub fn list_ports() -> Result<Vec<String>> {
    let ports = tokio_serial::available_ports().map_err(Error::Serial)?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}
