//! Protocol adapters: framing plus an optional payload byte transform.
//!
//! An adapter turns a [`Message`] into wire bytes and back. Whatever
//! transform an adapter applies must be scoped to the payload only: the
//! length/type/index preamble stays untouched so the frame assembler can
//! determine frame boundaries before the transform is reversed.

use std::sync::atomic::{AtomicU32, Ordering};

use bytes::Bytes;

use crate::error::FrameError;
use crate::protocol::message::{Message, MessageType};

/// Bidirectional transform between messages and wire bytes.
///
/// `encode` must be the exact inverse of `decode` for the same adapter
/// instance and configuration. Adapters also stamp outgoing messages from
/// an internal counter via the `create_*` constructors.
pub trait ProtocolAdapter: Send + Sync {
    /// Encodes a message into its wire frame.
    fn encode(&self, message: &Message) -> Result<Bytes, FrameError>;

    /// Decodes a complete wire frame into a message.
    fn decode(&self, frame: &[u8]) -> Result<Message, FrameError>;

    /// Returns the next message index and advances the counter.
    ///
    /// The counter wraps on overflow; wraparound is defined behavior,
    /// not an error.
    fn next_index(&self) -> u32;

    /// Resets the message counter to zero (reconnect/protocol restart).
    fn reset_counter(&self);

    /// Creates a counter-stamped command message.
    fn create_command(&self, payload: Bytes) -> Result<Message, FrameError> {
        Message::new(self.next_index(), MessageType::Command, payload)
    }

    /// Creates a counter-stamped response message.
    fn create_response(&self, payload: Bytes) -> Result<Message, FrameError> {
        Message::new(self.next_index(), MessageType::Response, payload)
    }

    /// Creates a counter-stamped data message.
    fn create_data(&self, payload: Bytes) -> Result<Message, FrameError> {
        Message::new(self.next_index(), MessageType::Data, payload)
    }

    /// Creates a counter-stamped error message.
    fn create_error(&self, payload: Bytes) -> Result<Message, FrameError> {
        Message::new(self.next_index(), MessageType::Error, payload)
    }

    /// Creates a counter-stamped heartbeat with an empty payload.
    fn create_heartbeat(&self) -> Message {
        Message {
            index: self.next_index(),
            message_type: MessageType::HeartBeat,
            payload: Bytes::new(),
        }
    }
}

/// Identity adapter: framing only, no payload transform.
///
/// This is the baseline against which other adapters are checked.
#[derive(Debug, Default)]
pub struct PlainAdapter {
    counter: AtomicU32,
}

impl PlainAdapter {
    /// Creates a plain adapter with the counter at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProtocolAdapter for PlainAdapter {
    fn encode(&self, message: &Message) -> Result<Bytes, FrameError> {
        message.serialize()
    }

    fn decode(&self, frame: &[u8]) -> Result<Message, FrameError> {
        Message::deserialize(frame)
    }

    fn next_index(&self) -> u32 {
        self.counter.fetch_add(1, Ordering::SeqCst)
    }

    fn reset_counter(&self) {
        self.counter.store(0, Ordering::SeqCst);
    }
}

/// Additive byte cipher over the payload, modulo 256.
///
/// Obfuscation only, not integrity protection. The configured shift is
/// reduced modulo 256 and applied to payload bytes; length, type, and
/// index are serialized unshifted.
#[derive(Debug)]
pub struct ShiftAdapter {
    shift: u8,
    counter: AtomicU32,
}

impl ShiftAdapter {
    /// Creates a shift adapter with the given shift, applied modulo 256.
    #[must_use]
    pub fn new(shift: u16) -> Self {
        Self {
            shift: (shift % 256) as u8,
            counter: AtomicU32::new(0),
        }
    }

    fn shift_payload(&self, payload: &[u8]) -> Bytes {
        payload
            .iter()
            .map(|byte| byte.wrapping_add(self.shift))
            .collect()
    }

    fn unshift_payload(&self, payload: &[u8]) -> Bytes {
        payload
            .iter()
            .map(|byte| byte.wrapping_sub(self.shift))
            .collect()
    }
}

impl ProtocolAdapter for ShiftAdapter {
    fn encode(&self, message: &Message) -> Result<Bytes, FrameError> {
        let shifted = Message {
            index: message.index,
            message_type: message.message_type,
            payload: self.shift_payload(&message.payload),
        };
        shifted.serialize()
    }

    fn decode(&self, frame: &[u8]) -> Result<Message, FrameError> {
        // The header is read unshifted; only the payload is reversed.
        let mut message = Message::deserialize(frame)?;
        message.payload = self.unshift_payload(&message.payload);
        Ok(message)
    }

    fn next_index(&self) -> u32 {
        self.counter.fetch_add(1, Ordering::SeqCst)
    }

    fn reset_counter(&self) {
        self.counter.store(0, Ordering::SeqCst);
    }
}
