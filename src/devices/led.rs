//! LED controller device.
//!
//! Builds LED control command payloads over a pin/port pair and sends
//! them as counter-stamped command messages.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;

use crate::devices::Device;
use crate::error::Result;
use crate::link::ProtoLink;
use crate::protocol::ProtocolAdapter;
use crate::transport::ByteChannel;

/// LED command opcodes, first byte of the command payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum LedOpcode {
    TurnOn = 0x01,
    TurnOff = 0x02,
    SetBrightness = 0x03,
}

/// Pin and port addressing an LED on the peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedPin {
    /// Pin number.
    pub pin: u8,
    /// Port identifier.
    pub port: u8,
}

impl LedPin {
    /// Creates a pin/port pair.
    #[must_use]
    pub const fn new(pin: u8, port: u8) -> Self {
        Self { pin, port }
    }
}

/// Controller for a single LED on the peripheral.
pub struct LedController<C, A> {
    link: ProtoLink<C, A>,
    led: LedPin,
}

impl<C: ByteChannel + 'static, A: ProtocolAdapter + 'static> LedController<C, A> {
    /// Creates a controller for the given LED.
    #[must_use]
    pub fn new(link: ProtoLink<C, A>, led: LedPin) -> Self {
        Self { link, led }
    }

    /// Turns the LED on.
    pub async fn turn_on(&self) -> Result<()> {
        self.send_led_command(LedOpcode::TurnOn, None).await?;
        tracing::info!("turn on command sent");
        Ok(())
    }

    /// Turns the LED off.
    pub async fn turn_off(&self) -> Result<()> {
        self.send_led_command(LedOpcode::TurnOff, None).await?;
        tracing::info!("turn off command sent");
        Ok(())
    }

    /// Sets the LED brightness level.
    pub async fn set_brightness(&self, level: u8) -> Result<()> {
        self.send_led_command(LedOpcode::SetBrightness, Some(level))
            .await?;
        tracing::info!("set brightness command sent, level {}", level);
        Ok(())
    }

    async fn send_led_command(&self, opcode: LedOpcode, level: Option<u8>) -> Result<()> {
        // Payload layout: [opcode, pin, port] plus the level when present.
        let mut payload = vec![opcode as u8, self.led.pin, self.led.port];
        if let Some(level) = level {
            payload.push(level);
        }

        let msg = self.link.adapter().create_command(Bytes::from(payload))?;
        self.link.send(&msg).await?;
        Ok(())
    }

    /// Returns the underlying link.
    #[must_use]
    pub fn link(&self) -> &ProtoLink<C, A> {
        &self.link
    }
}

impl<C: ByteChannel + 'static, A: ProtocolAdapter + 'static> Device for LedController<C, A> {
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

    async fn controller() -> LedController<SimulatedChannel, PlainAdapter> {
        let link = ProtoLink::new(SimulatedChannel::new(), PlainAdapter::new());
        let mut controller = LedController::new(link, LedPin::new(13, 2));
        controller.connect().await.unwrap();
        controller
    }

    #[tokio::test(start_paused = true)]
    async fn test_turn_on_payload() {
        let controller = controller().await;
        controller.turn_on().await.unwrap();

        let wire = controller.link().channel().transmitted();
        assert_eq!(wire[0], 8); // 5 + 3 payload bytes
        assert_eq!(wire[1], 0x01); // command type
        assert_eq!(&wire[6..], &[0x01, 13, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_turn_off_payload() {
        let controller = controller().await;
        controller.turn_off().await.unwrap();

        let wire = controller.link().channel().transmitted();
        assert_eq!(&wire[6..], &[0x02, 13, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_brightness_payload() {
        let controller = controller().await;
        controller.set_brightness(127).await.unwrap();

        let wire = controller.link().channel().transmitted();
        assert_eq!(wire[0], 9); // 5 + 4 payload bytes
        assert_eq!(&wire[6..], &[0x03, 13, 2, 127]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_commands_advance_counter() {
        let controller = controller().await;
        controller.turn_on().await.unwrap();
        controller.turn_off().await.unwrap();

        let wire = controller.link().channel().transmitted();
        assert_eq!(wire[5], 0);
        assert_eq!(wire[9 + 5], 1);
    }
}
