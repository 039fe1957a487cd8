//! Receive-side frame assembly.
//!
//! The [`FrameAssembler`] turns the unbounded, arbitrarily-chunked byte
//! stream of a [`ByteChannel`] into complete frames, decodes them through a
//! [`ProtocolAdapter`], and publishes each decoded [`Message`] to the
//! [`SubscriberRegistry`].
//!
//! Each cycle waits for a length byte, then for the declared number of
//! payload bytes under a timeout budget, then dispatches. On success,
//! failure, or timeout the loop returns to waiting for a length byte; it
//! ends only when the channel leaves the open state.
//!
//! There is no sentinel byte in the wire format, so the assembler cannot
//! resynchronize within a continuous stream: a stray or missing byte shifts
//! the length interpretation until traffic pauses past the timeout budget.

use std::sync::Arc;
use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};
use tokio::time::Instant;

use crate::error::Error;
use crate::protocol::{MAX_FRAME_LEN, ProtocolAdapter};
use crate::subscriber::SubscriberRegistry;
use crate::transport::{ByteChannel, ChannelState};

/// Default budget for a declared payload to fully arrive.
pub const DEFAULT_PAYLOAD_TIMEOUT: Duration = Duration::from_millis(1000);

/// Default sleep between polls of the channel.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Configuration for the frame assembler.
#[derive(Debug, Clone)]
pub struct AssemblerConfig {
    /// Budget for the declared payload to fully arrive.
    pub payload_timeout: Duration,
    /// Sleep between polls of the channel.
    pub poll_interval: Duration,
    /// Largest accepted total frame size, including the length byte.
    pub max_frame_len: usize,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            payload_timeout: DEFAULT_PAYLOAD_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_frame_len: MAX_FRAME_LEN,
        }
    }
}

impl AssemblerConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the payload arrival budget.
    #[must_use]
    pub const fn payload_timeout(mut self, timeout: Duration) -> Self {
        self.payload_timeout = timeout;
        self
    }

    /// Sets the poll sleep interval.
    #[must_use]
    pub const fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the largest accepted total frame size.
    #[must_use]
    pub const fn max_frame_len(mut self, len: usize) -> Self {
        self.max_frame_len = len;
        self
    }
}

/// Receive-side state machine reconstructing frames from a byte stream.
///
/// Runs as a dedicated task for the lifetime of an open channel; see
/// [`FrameAssembler::run`].
pub struct FrameAssembler<C, A> {
    channel: Arc<C>,
    adapter: Arc<A>,
    registry: Arc<SubscriberRegistry>,
    config: AssemblerConfig,
}

impl<C: ByteChannel, A: ProtocolAdapter> FrameAssembler<C, A> {
    /// Creates an assembler with default configuration.
    #[must_use]
    pub fn new(channel: Arc<C>, adapter: Arc<A>, registry: Arc<SubscriberRegistry>) -> Self {
        Self::with_config(channel, adapter, registry, AssemblerConfig::default())
    }

    /// Creates an assembler with the given configuration.
    #[must_use]
    pub fn with_config(
        channel: Arc<C>,
        adapter: Arc<A>,
        registry: Arc<SubscriberRegistry>,
        config: AssemblerConfig,
    ) -> Self {
        Self {
            channel,
            adapter,
            registry,
            config,
        }
    }

    /// Runs the assembly loop until the channel leaves the open state.
    ///
    /// Decode failures and payload timeouts are logged and recovered
    /// locally; no error crosses the loop boundary.
    pub async fn run(self) {
        tracing::debug!("frame assembler started");
        while self.cycle().await {}
        tracing::debug!("frame assembler stopped");
    }

    /// Executes one assembly cycle. Returns false when the loop must end.
    async fn cycle(&self) -> bool {
        // Wait for the candidate length byte.
        let Some(length) = self.await_length().await else {
            return false;
        };

        let length = usize::from(length);
        if length == 0 || 1 + length > self.config.max_frame_len {
            tracing::warn!("discarding invalid length byte: {}", length);
            return true;
        }

        // Wait for the declared payload under the timeout budget. Nothing
        // is consumed on timeout, so later bytes start a fresh attempt.
        if let Err(e) = self.await_payload(length).await {
            match e {
                Error::AssemblyTimeout { .. } => {
                    tracing::warn!("{}, discarding frame attempt (length {})", e, length);
                    return true;
                }
                _ => return false,
            }
        }

        let Some(frame) = self.read_frame(length).await else {
            return false;
        };

        // Dispatch. A frame that fails to decode is dropped here; no
        // subscriber sees it and no NACK is sent to the peer.
        match self.adapter.decode(&frame) {
            Ok(message) => {
                tracing::debug!(
                    "assembled {} message, index {}, {} payload bytes",
                    message.message_type.as_str(),
                    message.index,
                    message.payload.len()
                );
                self.registry.notify(&message);
            }
            Err(e) => tracing::warn!("frame decode error: {}", e),
        }

        true
    }

    /// Polls the channel for exactly one byte, the candidate length.
    ///
    /// Unbounded, but re-checks channel state every poll so a close
    /// unblocks it promptly. Returns `None` when the channel is gone.
    async fn await_length(&self) -> Option<u8> {
        let mut byte = [0u8; 1];
        loop {
            if self.channel.state() != ChannelState::Open {
                return None;
            }

            match self.channel.available().await {
                Ok(0) => tokio::time::sleep(self.config.poll_interval).await,
                Ok(_) => match self.channel.receive(&mut byte).await {
                    Ok(0) => tokio::time::sleep(self.config.poll_interval).await,
                    Ok(_) => return Some(byte[0]),
                    Err(Error::PortNotOpen) => return None,
                    Err(e) => {
                        tracing::error!("channel receive error: {}", e);
                        return None;
                    }
                },
                Err(Error::PortNotOpen) => return None,
                Err(e) => {
                    tracing::error!("channel error: {}", e);
                    return None;
                }
            }
        }
    }

    /// Polls until the channel reports at least `length` bytes available.
    async fn await_payload(&self, length: usize) -> Result<(), Error> {
        let deadline = Instant::now() + self.config.payload_timeout;
        loop {
            if self.channel.state() != ChannelState::Open {
                return Err(Error::PortNotOpen);
            }

            match self.channel.available().await {
                Ok(count) if count >= length => return Ok(()),
                Ok(_) => {}
                Err(Error::PortNotOpen) => return Err(Error::PortNotOpen),
                Err(e) => {
                    tracing::error!("channel error: {}", e);
                    return Err(e);
                }
            }

            if Instant::now() >= deadline {
                return Err(Error::AssemblyTimeout {
                    timeout_ms: u64::try_from(self.config.payload_timeout.as_millis())
                        .unwrap_or(u64::MAX),
                });
            }

            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    /// Reads exactly `length` bytes and prepends the length byte to form
    /// the complete frame.
    async fn read_frame(&self, length: usize) -> Option<Bytes> {
        let mut payload = vec![0u8; length];
        let mut read = 0;

        while read < length {
            match self.channel.receive(&mut payload[read..]).await {
                Ok(0) => tokio::time::sleep(self.config.poll_interval).await,
                Ok(n) => read += n,
                Err(Error::PortNotOpen) => return None,
                Err(e) => {
                    tracing::error!("channel receive error: {}", e);
                    return None;
                }
            }
        }

        let mut frame = BytesMut::with_capacity(1 + length);
        frame.put_u8(length as u8);
        frame.put_slice(&payload);
        Some(frame.freeze())
    }
}
