//! # protolink
//!
//! A Rust library for framed message exchange with serial peripherals.
//!
//! This library speaks a compact length-prefixed wire format: each frame
//! carries a type byte, a big-endian message index, and up to 249 payload
//! bytes, all counted by a leading length byte. A pluggable protocol
//! adapter applies an optional payload transform (pass-through or an
//! additive byte cipher), and a background frame assembler reconstructs
//! complete messages from the arbitrarily-chunked byte stream of the
//! channel.
//!
//! ## Features
//!
//! - Async/await based API using Tokio
//! - Receive-side frame assembly with a per-frame timeout budget
//! - Pluggable payload transforms (plain and shift adapters)
//! - Ordered, synchronous subscriber dispatch
//! - Serial (UART) and in-memory simulated channels
//!
//! ## Quick Start
//!
//! ```no_run
//! use protolink::{PlainAdapter, ProtoLink, ProtocolAdapter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), protolink::Error> {
//!     // Connect to a peripheral on a serial port
//!     let mut link = ProtoLink::serial("/dev/ttyUSB0", PlainAdapter::new());
//!     link.subscribe(|msg| {
//!         println!("received {} (index {})", msg.message_type.as_str(), msg.index);
//!     });
//!     link.connect().await?;
//!
//!     // Send a counter-stamped command
//!     let cmd = link.adapter().create_command(bytes::Bytes::from_static(b"on"))?;
//!     link.send(&cmd).await?;
//!
//!     link.disconnect().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`protocol`] - Message layout, message types, protocol adapters
//! - [`assembler`] - Receive-side frame assembly state machine
//! - [`subscriber`] - Ordered subscriber registry
//! - [`transport`] - Byte channel implementations (serial, simulated)
//! - [`devices`] - Devices built on top of the link
//! - [`link`] - High-level [`ProtoLink`] client

pub mod assembler;
pub mod devices;
pub mod error;
pub mod link;
pub mod protocol;
pub mod subscriber;
pub mod transport;

// Re-exports for convenience
pub use assembler::{AssemblerConfig, FrameAssembler};
pub use devices::{Device, LedController, LedPin, TestDevice};
pub use error::{Error, FrameError, Result};
pub use link::ProtoLink;
pub use protocol::{Message, MessageType, PlainAdapter, ProtocolAdapter, ShiftAdapter};
pub use subscriber::SubscriberRegistry;
pub use transport::{
    ByteChannel, ChannelState, SerialChannel, SimulatedChannel, serial::list_ports,
};
