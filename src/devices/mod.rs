//! Device implementations built on top of [`ProtoLink`](crate::ProtoLink).
//!
//! Devices consume the protocol core: they build command payloads and
//! react to received messages, but contain no framing logic of their own.

pub mod led;
pub mod test_device;

use std::future::Future;
use std::pin::Pin;

use crate::error::Result;

/// Trait for devices driven over a protocol link.
pub trait Device: Send {
    /// Connects the underlying link.
    fn connect(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Disconnects the underlying link.
    fn disconnect(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

pub use led::{LedController, LedPin};
pub use test_device::TestDevice;
