//! Byte channel layer for peripheral communication.
//!
//! This module provides the abstraction for duplex byte transports.
//! Serial (UART) and an in-memory simulated channel are implemented.

pub mod serial;
pub mod sim;

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;

use crate::error::Result;

/// Connection state of a byte channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum ChannelState {
    /// Channel is closed.
    #[default]
    Closed = 0,
    /// Channel is open for traffic.
    Open = 1,
    /// Channel hit an unrecoverable I/O failure.
    Error = 2,
}

impl ChannelState {
    /// Converts a stored state byte back into a state.
    #[must_use]
    pub const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Open,
            2 => Self::Error,
            _ => Self::Closed,
        }
    }
}

/// Trait for duplex byte transports.
///
/// Channels are full-duplex: `send` and `receive` may be called
/// concurrently from different tasks. Implementations guard their
/// internals so neither starves the other.
pub trait ByteChannel: Send + Sync {
    /// Opens the channel.
    fn open(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Closes the channel.
    fn close(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Sends bytes, returning the count written.
    fn send(&self, data: Bytes) -> Pin<Box<dyn Future<Output = Result<usize>> + Send + '_>>;

    /// Receives up to `buf.len()` bytes, returning the count read.
    fn receive<'a>(
        &'a self,
        buf: &'a mut [u8],
    ) -> Pin<Box<dyn Future<Output = Result<usize>> + Send + 'a>>;

    /// Returns the number of bytes waiting to be received.
    fn available(&self) -> Pin<Box<dyn Future<Output = Result<usize>> + Send + '_>>;

    /// Returns the current connection state.
    fn state(&self) -> ChannelState;
}

pub use serial::SerialChannel;
pub use sim::SimulatedChannel;
