//! In-memory simulated channel.
//!
//! Stands in for a UART peer in tests and demos: the test side injects
//! bytes that the client will receive and inspects bytes the client sent.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU8, Ordering};

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::transport::{ByteChannel, ChannelState};

/// Simulated duplex byte channel.
#[derive(Debug, Default)]
pub struct SimulatedChannel {
    rx: Mutex<VecDeque<u8>>,
    tx: Mutex<Vec<u8>>,
    state: AtomicU8,
}

impl SimulatedChannel {
    /// Creates a new simulated channel in the closed state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues bytes on the receive side, as if the peer had sent them.
    pub fn inject(&self, bytes: &[u8]) {
        self.rx
            .lock()
            .expect("rx lock poisoned")
            .extend(bytes.iter().copied());
    }

    /// Drains and returns everything the client has sent so far.
    pub fn transmitted(&self) -> Vec<u8> {
        std::mem::take(&mut *self.tx.lock().expect("tx lock poisoned"))
    }

    /// Moves the channel into the error state, as if the device vanished.
    pub fn fail(&self) {
        self.state.store(ChannelState::Error as u8, Ordering::SeqCst);
    }

    fn is_open(&self) -> bool {
        self.state() == ChannelState::Open
    }
}

impl ByteChannel for SimulatedChannel {
    fn open(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            self.rx.lock().expect("rx lock poisoned").clear();
            self.state.store(ChannelState::Open as u8, Ordering::SeqCst);
            Ok(())
        })
    }

    fn close(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            self.state
                .store(ChannelState::Closed as u8, Ordering::SeqCst);
            Ok(())
        })
    }

    fn send(&self, data: Bytes) -> Pin<Box<dyn Future<Output = Result<usize>> + Send + '_>> {
        Box::pin(async move {
            if !self.is_open() {
                return Err(Error::PortNotOpen);
            }
            self.tx
                .lock()
                .expect("tx lock poisoned")
                .extend_from_slice(&data);
            Ok(data.len())
        })
    }

    fn receive<'a>(
        &'a self,
        buf: &'a mut [u8],
    ) -> Pin<Box<dyn Future<Output = Result<usize>> + Send + 'a>> {
        Box::pin(async move {
            if !self.is_open() {
                return Err(Error::PortNotOpen);
            }
            let mut rx = self.rx.lock().expect("rx lock poisoned");
            let count = buf.len().min(rx.len());
            for slot in &mut buf[..count] {
                *slot = rx.pop_front().unwrap_or_default();
            }
            Ok(count)
        })
    }

    fn available(&self) -> Pin<Box<dyn Future<Output = Result<usize>> + Send + '_>> {
        Box::pin(async move {
            if !self.is_open() {
                return Err(Error::PortNotOpen);
            }
            Ok(self.rx.lock().expect("rx lock poisoned").len())
        })
    }

    fn state(&self) -> ChannelState {
        ChannelState::from_u8(self.state.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_inject_then_receive() {
        let channel = SimulatedChannel::new();
        channel.open().await.unwrap();
        channel.inject(&[1, 2, 3]);

        assert_eq!(channel.available().await.unwrap(), 3);

        let mut buf = [0u8; 2];
        assert_eq!(channel.receive(&mut buf).await.unwrap(), 2);
        assert_eq!(buf, [1, 2]);
        assert_eq!(channel.available().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_send_is_inspectable() {
        let channel = SimulatedChannel::new();
        channel.open().await.unwrap();

        channel.send(Bytes::from_static(&[9, 8])).await.unwrap();
        channel.send(Bytes::from_static(&[7])).await.unwrap();

        assert_eq!(channel.transmitted(), vec![9, 8, 7]);
        assert!(channel.transmitted().is_empty());
    }

    #[tokio::test]
    async fn test_closed_channel_rejects_traffic() {
        let channel = SimulatedChannel::new();

        let result = channel.send(Bytes::from_static(&[1])).await;
        assert!(matches!(result.unwrap_err(), Error::PortNotOpen));

        channel.open().await.unwrap();
        channel.close().await.unwrap();
        assert_eq!(channel.state(), ChannelState::Closed);

        let mut buf = [0u8; 1];
        let result = channel.receive(&mut buf).await;
        assert!(matches!(result.unwrap_err(), Error::PortNotOpen));
    }

    #[tokio::test]
    async fn test_open_clears_stale_rx() {
        let channel = SimulatedChannel::new();
        channel.open().await.unwrap();
        channel.inject(&[1, 2, 3]);
        channel.close().await.unwrap();

        channel.open().await.unwrap();
        assert_eq!(channel.available().await.unwrap(), 0);
    }
}
