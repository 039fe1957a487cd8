//! Protocol definitions for peripheral communication.
//!
//! This module contains the message layer:
//! - Message layout and (de)serialization
//! - Message type definitions
//! - Protocol adapters (framing + payload transform)

pub mod adapter;
pub mod message;

pub use adapter::{PlainAdapter, ProtocolAdapter, ShiftAdapter};
pub use message::{FIXED_LEN, MAX_FRAME_LEN, MAX_PAYLOAD_LEN, Message, MessageType, PREAMBLE_LEN};
