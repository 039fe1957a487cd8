//! Message layout and (de)serialization.
//!
//! The wire format frames one message as:
//! ```text
//! ┌──────────┬──────────┬─────────────┬─────────────────┐
//! │  length  │   type   │ index (BE)  │     payload     │
//! │  1 byte  │  1 byte  │   4 bytes   │  length-5 bytes │
//! └──────────┴──────────┴─────────────┴─────────────────┘
//! ```
//! The length byte counts everything after itself (type + index + payload),
//! so a complete frame is `1 + length` bytes and never exceeds 255 bytes
//! total.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::FrameError;

/// Maximum total frame size in bytes, including the length byte.
pub const MAX_FRAME_LEN: usize = 255;

/// Bytes counted by the length byte besides the payload (type + index).
pub const FIXED_LEN: usize = 5;

/// Preamble size: length byte + type byte + 4 index bytes.
pub const PREAMBLE_LEN: usize = 6;

/// Maximum payload size (255 total minus length byte and fixed fields).
pub const MAX_PAYLOAD_LEN: usize = MAX_FRAME_LEN - 1 - FIXED_LEN;

/// Message kind carried in the type byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum MessageType {
    /// No particular kind.
    #[default]
    None = 0x00,
    /// Command to the peripheral.
    Command = 0x01,
    /// Response to a command.
    Response = 0x02,
    /// Application data.
    Data = 0x03,
    /// Keep-alive with empty payload.
    HeartBeat = 0x04,
    /// Error report.
    Error = 0x05,
    /// Sentinel for type bytes outside the defined range.
    Undefined = 0xFF,
}

impl MessageType {
    /// Converts a wire byte into a message type.
    ///
    /// Unrecognized values degrade to [`MessageType::Undefined`] rather
    /// than failing, so decoding continues.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Self {
        match byte {
            0x00 => Self::None,
            0x01 => Self::Command,
            0x02 => Self::Response,
            0x03 => Self::Data,
            0x04 => Self::HeartBeat,
            0x05 => Self::Error,
            _ => Self::Undefined,
        }
    }

    /// Returns an uppercase name for logging.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Command => "COMMAND",
            Self::Response => "RESPONSE",
            Self::Data => "DATA",
            Self::HeartBeat => "HEARTBEAT",
            Self::Error => "ERROR",
            Self::Undefined => "UNDEFINED",
        }
    }
}

impl From<MessageType> for u8 {
    fn from(message_type: MessageType) -> Self {
        message_type as Self
    }
}

/// A single protocol message.
///
/// Constructed either explicitly (to be sent) or by [`Message::deserialize`]
/// on the receive path. Content is immutable once serialized; the payload is
/// exclusively owned and cloned per subscriber on dispatch.
#[derive(Debug, Clone)]
pub struct Message {
    /// Sender-assigned identifier.
    pub index: u32,
    /// Message kind.
    pub message_type: MessageType,
    /// Payload bytes (0 to [`MAX_PAYLOAD_LEN`]).
    pub payload: Bytes,
}

impl Message {
    /// Creates a message, validating the payload size bound.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::TooLarge`] if the payload exceeds
    /// [`MAX_PAYLOAD_LEN`] bytes.
    pub fn new(
        index: u32,
        message_type: MessageType,
        payload: impl Into<Bytes>,
    ) -> Result<Self, FrameError> {
        let payload = payload.into();
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(FrameError::TooLarge {
                size: 1 + FIXED_LEN + payload.len(),
                max: MAX_FRAME_LEN,
            });
        }
        Ok(Self {
            index,
            message_type,
            payload,
        })
    }

    /// Value of the length byte: bytes following it on the wire.
    #[must_use]
    pub fn length(&self) -> u8 {
        (FIXED_LEN + self.payload.len()) as u8
    }

    /// Total frame size including the length byte.
    #[must_use]
    pub fn wire_len(&self) -> usize {
        1 + FIXED_LEN + self.payload.len()
    }

    /// Serializes the message into its wire frame.
    ///
    /// The length byte is computed from the payload, never stored.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::TooLarge`] if the frame would exceed
    /// [`MAX_FRAME_LEN`] bytes.
    pub fn serialize(&self) -> Result<Bytes, FrameError> {
        if self.wire_len() > MAX_FRAME_LEN {
            return Err(FrameError::TooLarge {
                size: self.wire_len(),
                max: MAX_FRAME_LEN,
            });
        }

        let mut buf = BytesMut::with_capacity(self.wire_len());
        buf.put_u8(self.length());
        buf.put_u8(self.message_type.into());
        buf.put_u32(self.index);
        buf.put_slice(&self.payload);
        Ok(buf.freeze())
    }

    /// Deserializes a message from a complete wire frame.
    ///
    /// Trailing bytes beyond the declared frame are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::TooSmall`] if fewer than [`PREAMBLE_LEN`]
    /// bytes are supplied or the declared length cannot cover the fixed
    /// fields, [`FrameError::TooLarge`] if the declared frame exceeds
    /// [`MAX_FRAME_LEN`] bytes, and [`FrameError::Incomplete`] if the
    /// declared length implies more bytes than are present.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() < PREAMBLE_LEN {
            return Err(FrameError::TooSmall(bytes.len()));
        }

        let length = bytes[0] as usize;
        if length < FIXED_LEN {
            return Err(FrameError::TooSmall(1 + length));
        }

        let total = 1 + length;
        if total > MAX_FRAME_LEN {
            return Err(FrameError::TooLarge {
                size: total,
                max: MAX_FRAME_LEN,
            });
        }
        if bytes.len() < total {
            return Err(FrameError::Incomplete {
                expected: total,
                got: bytes.len(),
            });
        }

        let message_type = MessageType::from_byte(bytes[1]);
        let index = u32::from_be_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]);
        let payload = Bytes::copy_from_slice(&bytes[PREAMBLE_LEN..total]);

        Ok(Self {
            index,
            message_type,
            payload,
        })
    }
}

/// Messages compare by `index` and wire length only; payload content and
/// type are not part of equality.
impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.length() == other.length()
    }
}

impl Eq for Message {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_data_message() {
        let msg = Message::new(
            0x1234_5678,
            MessageType::Data,
            vec![0x41, 0x42, 0x43, 0x44],
        )
        .unwrap();

        let frame = msg.serialize().unwrap();
        assert_eq!(
            frame.as_ref(),
            &[0x09, 0x03, 0x12, 0x34, 0x56, 0x78, 0x41, 0x42, 0x43, 0x44]
        );
    }

    #[test]
    fn test_round_trip() {
        let msg = Message::new(42, MessageType::Command, vec![1, 2, 3]).unwrap();
        let frame = msg.serialize().unwrap();
        let decoded = Message::deserialize(&frame).unwrap();

        assert_eq!(decoded.index, 42);
        assert_eq!(decoded.message_type, MessageType::Command);
        assert_eq!(decoded.payload.as_ref(), &[1, 2, 3]);
    }

    #[test]
    fn test_empty_payload() {
        let msg = Message::new(7, MessageType::HeartBeat, Bytes::new()).unwrap();
        let frame = msg.serialize().unwrap();

        assert_eq!(frame.as_ref(), &[0x05, 0x04, 0x00, 0x00, 0x00, 0x07]);

        let decoded = Message::deserialize(&frame).unwrap();
        assert!(decoded.payload.is_empty());
    }

    #[test]
    fn test_length_byte_counts_fixed_fields() {
        let msg = Message::new(0, MessageType::None, vec![0u8; 10]).unwrap();
        assert_eq!(msg.length(), 15);
        assert_eq!(msg.serialize().unwrap()[0], 15);
    }

    #[test]
    fn test_deserialize_too_small() {
        let result = Message::deserialize(&[0x05, 0x01, 0x00, 0x00]);
        assert_eq!(result.unwrap_err(), FrameError::TooSmall(4));
    }

    #[test]
    fn test_deserialize_length_below_fixed_fields() {
        // Length byte of 2 cannot cover the type and index fields.
        let result = Message::deserialize(&[0x02, 0x01, 0x00, 0x00, 0x00, 0x01]);
        assert!(matches!(result.unwrap_err(), FrameError::TooSmall(_)));
    }

    #[test]
    fn test_deserialize_incomplete() {
        // Declares 5 payload bytes but only 2 are present.
        let result = Message::deserialize(&[0x0A, 0x03, 0x00, 0x00, 0x00, 0x01, 0xAA, 0xBB]);
        assert_eq!(
            result.unwrap_err(),
            FrameError::Incomplete {
                expected: 11,
                got: 8
            }
        );
    }

    #[test]
    fn test_deserialize_ignores_trailing_bytes() {
        let frame = [0x05, 0x02, 0x00, 0x00, 0x00, 0x09, 0xDE, 0xAD];
        let decoded = Message::deserialize(&frame).unwrap();

        assert_eq!(decoded.index, 9);
        assert_eq!(decoded.message_type, MessageType::Response);
        assert!(decoded.payload.is_empty());
    }

    #[test]
    fn test_undefined_type_does_not_fail() {
        let frame = [0x05, 0x7F, 0x00, 0x00, 0x00, 0x01];
        let decoded = Message::deserialize(&frame).unwrap();
        assert_eq!(decoded.message_type, MessageType::Undefined);
    }

    #[test]
    fn test_payload_boundary() {
        let max = Message::new(1, MessageType::Data, vec![0u8; MAX_PAYLOAD_LEN]).unwrap();
        let frame = max.serialize().unwrap();
        assert_eq!(frame.len(), MAX_FRAME_LEN);
        assert_eq!(
            Message::deserialize(&frame).unwrap().payload.len(),
            MAX_PAYLOAD_LEN
        );

        let result = Message::new(1, MessageType::Data, vec![0u8; MAX_PAYLOAD_LEN + 1]);
        assert!(matches!(result.unwrap_err(), FrameError::TooLarge { .. }));
    }

    #[test]
    fn test_message_type_from_byte() {
        assert_eq!(MessageType::from_byte(0x00), MessageType::None);
        assert_eq!(MessageType::from_byte(0x04), MessageType::HeartBeat);
        assert_eq!(MessageType::from_byte(0x06), MessageType::Undefined);
        assert_eq!(MessageType::from_byte(0xFF), MessageType::Undefined);
    }

    #[test]
    fn test_equality_ignores_payload_content() {
        let a = Message::new(1, MessageType::Data, vec![1, 2, 3]).unwrap();
        let b = Message::new(1, MessageType::Command, vec![9, 9, 9]).unwrap();
        let c = Message::new(1, MessageType::Data, vec![1, 2]).unwrap();
        let d = Message::new(2, MessageType::Data, vec![1, 2, 3]).unwrap();

        assert_eq!(a, b); // same index, same length
        assert_ne!(a, c); // lengths differ
        assert_ne!(a, d); // indices differ
    }
}
