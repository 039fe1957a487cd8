//! Test device for protocol and transport debugging.
//!
//! Sends the various message kinds on demand and logs every received
//! message with a hex payload dump. Intended for development, not
//! production use.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;

use crate::devices::Device;
use crate::error::Result;
use crate::link::ProtoLink;
use crate::protocol::{Message, ProtocolAdapter};
use crate::transport::ByteChannel;

/// Debug device that exercises the message kinds and logs traffic.
pub struct TestDevice<C, A> {
    link: ProtoLink<C, A>,
}

impl<C: ByteChannel + 'static, A: ProtocolAdapter + 'static> TestDevice<C, A> {
    /// Creates a test device and registers its receive logger.
    #[must_use]
    pub fn new(link: ProtoLink<C, A>) -> Self {
        link.subscribe(|msg| {
            tracing::info!(
                "received {} message, index {}, payload [{}]",
                msg.message_type.as_str(),
                msg.index,
                hex::encode(&msg.payload)
            );
        });
        Self { link }
    }

    /// Sends a counter-stamped command message.
    pub async fn send_command(&self, payload: impl Into<Bytes>) -> Result<usize> {
        let msg = self.link.adapter().create_command(payload.into())?;
        self.send_logged(&msg).await
    }

    /// Sends a counter-stamped response message.
    pub async fn send_response(&self, payload: impl Into<Bytes>) -> Result<usize> {
        let msg = self.link.adapter().create_response(payload.into())?;
        self.send_logged(&msg).await
    }

    /// Sends a counter-stamped data message.
    pub async fn send_data(&self, payload: impl Into<Bytes>) -> Result<usize> {
        let msg = self.link.adapter().create_data(payload.into())?;
        self.send_logged(&msg).await
    }

    /// Sends a counter-stamped heartbeat.
    pub async fn send_heartbeat(&self) -> Result<usize> {
        let msg = self.link.adapter().create_heartbeat();
        self.send_logged(&msg).await
    }

    async fn send_logged(&self, msg: &Message) -> Result<usize> {
        let written = self.link.send(msg).await?;
        tracing::debug!(
            "sent {} message, index {}, payload [{}]",
            msg.message_type.as_str(),
            msg.index,
            hex::encode(&msg.payload)
        );
        Ok(written)
    }

    /// Returns the underlying link.
    #[must_use]
    pub fn link(&self) -> &ProtoLink<C, A> {
        &self.link
    }
}

impl<C: ByteChannel + 'static, A: ProtocolAdapter + 'static> Device for TestDevice<C, A> {
    fn connect(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(self.link.connect())
    }

    fn disconnect(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(self.link.disconnect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::PlainAdapter;
    use crate::transport::SimulatedChannel;

    #[tokio::test(start_paused = true)]
    async fn test_send_kinds_stamp_sequential_indices() {
        let mut device = TestDevice::new(ProtoLink::new(
            SimulatedChannel::new(),
            PlainAdapter::new(),
        ));
        device.connect().await.unwrap();

        device.send_command(&b"cmd"[..]).await.unwrap();
        device.send_response(&b"ok"[..]).await.unwrap();
        device.send_data(&b"d"[..]).await.unwrap();
        device.send_heartbeat().await.unwrap();

        let wire = device.link().channel().transmitted();

        // Four frames back to back; index bytes advance 0, 1, 2, 3.
        assert_eq!(wire[0], 8); // 5 + "cmd"
        assert_eq!(wire[1], 0x01);
        assert_eq!(wire[5], 0);

        let second = &wire[9..];
        assert_eq!(second[0], 7); // 5 + "ok"
        assert_eq!(second[1], 0x02);
        assert_eq!(second[5], 1);

        let third = &second[8..];
        assert_eq!(third[0], 6); // 5 + "d"
        assert_eq!(third[1], 0x03);
        assert_eq!(third[5], 2);

        let fourth = &third[7..];
        assert_eq!(fourth[0], 5); // heartbeat, empty payload
        assert_eq!(fourth[1], 0x04);
        assert_eq!(fourth[5], 3);
        assert_eq!(fourth.len(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_via_device_trait() {
        let mut device = TestDevice::new(ProtoLink::new(
            SimulatedChannel::new(),
            PlainAdapter::new(),
        ));
        device.connect().await.unwrap();
        assert!(device.link().is_connected());

        device.disconnect().await.unwrap();
        assert!(!device.link().is_connected());
    }
}
