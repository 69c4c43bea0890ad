//! Outgoing frame queue.
//!
//! Handlers build messages synchronously while decoding or while serving a
//! user action, so they cannot await a socket write. They push finished
//! frames into an [`Outbox`] instead; the client loop owns the matching
//! [`OutboxReceiver`] and writes each frame to the connection in push order.
//!
//! The queue is unbounded: the protocol has no flow control of its own and
//! relies on whatever the transport provides.

use tokio::sync::mpsc;

use crate::TransportError;

/// Creates a linked outbox sender/receiver pair.
pub fn outbox() -> (Outbox, OutboxReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Outbox { tx }, OutboxReceiver { rx })
}

/// Cloneable handle for queueing finished frames.
#[derive(Debug, Clone)]
pub struct Outbox {
    tx: mpsc::UnboundedSender<Vec<u8>>,
}

impl Outbox {
    /// Queues one complete frame.
    ///
    /// # Errors
    /// Returns [`TransportError::ConnectionClosed`] once the receiving side
    /// (the client loop) has stopped.
    pub fn push(&self, frame: Vec<u8>) -> Result<(), TransportError> {
        self.tx
            .send(frame)
            .map_err(|_| TransportError::ConnectionClosed("outbox receiver dropped".into()))
    }

    /// Returns `true` if the receiving side is gone.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving half of the outbox, owned by the client loop.
#[derive(Debug)]
pub struct OutboxReceiver {
    rx: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl OutboxReceiver {
    /// Waits for the next queued frame. Returns `None` once every
    /// [`Outbox`] handle has been dropped and the queue is empty.
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        self.rx.recv().await
    }

    /// Takes the next queued frame without waiting.
    pub fn try_recv(&mut self) -> Option<Vec<u8>> {
        self.rx.try_recv().ok()
    }

    /// Drains every frame queued so far.
    pub fn drain(&mut self) -> Vec<Vec<u8>> {
        let mut frames = Vec::new();
        while let Some(frame) = self.try_recv() {
            frames.push(frame);
        }
        frames
    }

    /// Stops accepting new frames. Already queued frames stay readable.
    pub fn close(&mut self) {
        self.rx.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outbox_push_preserves_order() {
        let (tx, mut rx) = outbox();
        tx.push(vec![1]).unwrap();
        tx.push(vec![2]).unwrap();
        tx.clone().push(vec![3]).unwrap();
        assert_eq!(rx.drain(), vec![vec![1], vec![2], vec![3]]);
    }

    #[test]
    fn test_outbox_push_after_close_fails() {
        let (tx, mut rx) = outbox();
        rx.close();
        assert!(tx.is_closed());
        let err = tx.push(vec![0]).unwrap_err();
        assert!(matches!(err, TransportError::ConnectionClosed(_)));
    }

    #[test]
    fn test_outbox_try_recv_on_empty_returns_none() {
        let (_tx, mut rx) = outbox();
        assert!(rx.try_recv().is_none());
    }
}
