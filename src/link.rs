//! High-level [`ProtoLink`] client.
//!
//! This module combines a byte channel, a protocol adapter, and the frame
//! assembler into a unified interface: `connect` opens the channel and
//! starts the background assembly task, `send` encodes and writes a
//! message, and `subscribe` registers a callback for decoded messages.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::assembler::{AssemblerConfig, FrameAssembler};
use crate::error::Result;
use crate::protocol::{Message, ProtocolAdapter};
use crate::subscriber::SubscriberRegistry;
use crate::transport::{ByteChannel, ChannelState, SerialChannel, serial::SerialConfig};

/// Client for framed message exchange with a peripheral.
pub struct ProtoLink<C, A> {
    channel: Arc<C>,
    adapter: Arc<A>,
    registry: Arc<SubscriberRegistry>,
    config: AssemblerConfig,
    assembler_task: Option<JoinHandle<()>>,
}

impl<A: ProtocolAdapter + 'static> ProtoLink<SerialChannel, A> {
    /// Creates a client for a serial port with the given adapter.
    ///
    /// # Arguments
    ///
    /// * `port` - Serial port path (e.g., "/dev/ttyUSB0")
    /// * `adapter` - Protocol adapter for the wire transform
    ///
    /// # Returns
    ///
    /// A new client (not yet connected).
    #[must_use]
    pub fn serial(port: impl Into<String>, adapter: A) -> Self {
        Self::new(SerialChannel::new(SerialConfig::new(port)), adapter)
    }
}

impl<C: ByteChannel + 'static, A: ProtocolAdapter + 'static> ProtoLink<C, A> {
    /// Creates a new client with the given channel and adapter.
    #[must_use]
    pub fn new(channel: C, adapter: A) -> Self {
        Self::with_config(channel, adapter, AssemblerConfig::default())
    }

    /// Creates a new client with custom assembler configuration.
    #[must_use]
    pub fn with_config(channel: C, adapter: A, config: AssemblerConfig) -> Self {
        Self {
            channel: Arc::new(channel),
            adapter: Arc::new(adapter),
            registry: Arc::new(SubscriberRegistry::new()),
            config,
            assembler_task: None,
        }
    }

    /// Connects to the peripheral.
    ///
    /// Opens the channel and spawns the background frame assembly task.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel cannot be opened.
    pub async fn connect(&mut self) -> Result<()> {
        self.channel.open().await?;

        if self.assembler_task.is_none() {
            let assembler = FrameAssembler::with_config(
                Arc::clone(&self.channel),
                Arc::clone(&self.adapter),
                Arc::clone(&self.registry),
                self.config.clone(),
            );
            self.assembler_task = Some(tokio::spawn(assembler.run()));
        }

        tracing::info!("link connected");
        Ok(())
    }

    /// Disconnects from the peripheral.
    ///
    /// Closes the channel and stops the assembly task.
    ///
    /// # Errors
    ///
    /// Returns an error if closing the channel fails.
    pub async fn disconnect(&mut self) -> Result<()> {
        self.channel.close().await?;

        if let Some(task) = self.assembler_task.take() {
            task.abort();
        }

        tracing::info!("link disconnected");
        Ok(())
    }

    /// Returns true if the channel is open.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.channel.state() == ChannelState::Open
    }

    /// Encodes and sends a message, returning the bytes written.
    ///
    /// # Errors
    ///
    /// Returns a frame error if encoding fails, `PortNotOpen` if the
    /// channel is closed, or an I/O error from the channel.
    pub async fn send(&self, message: &Message) -> Result<usize> {
        let frame = self.adapter.encode(message)?;
        tracing::trace!(
            "sending {} message, index {}, {} frame bytes",
            message.message_type.as_str(),
            message.index,
            frame.len()
        );
        self.channel.send(frame).await
    }

    /// Registers a callback invoked with each decoded message.
    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn(Message) + Send + 'static,
    {
        self.registry.subscribe(callback);
    }

    /// Returns the protocol adapter, e.g. to create counter-stamped
    /// messages.
    #[must_use]
    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Returns the underlying channel.
    #[must_use]
    pub fn channel(&self) -> &C {
        &self.channel
    }
}

impl<C, A> Drop for ProtoLink<C, A> {
    fn drop(&mut self) {
        if let Some(task) = self.assembler_task.take() {
            task.abort();
        }
    }
}
