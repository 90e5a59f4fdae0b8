//! Outbound queue for one connection.

use tokio::sync::mpsc;
use tracing::trace;

use super::OutPacket;

/// Cloneable handle that enqueues packets for the connection's writer.
///
/// Writes never block; once the connection is gone they are dropped.
#[derive(Debug, Clone)]
pub struct PacketSink {
    tx: mpsc::UnboundedSender<OutPacket>,
}

impl PacketSink {
    /// Create a sink and the receiver the writer half drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<OutPacket>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Queue a packet. Returns false if the connection has closed.
    pub fn write(&self, packet: OutPacket) -> bool {
        match self.tx.send(packet) {
            Ok(()) => true,
            Err(e) => {
                trace!("Dropped packet for closed connection: {:?}", e.0);
                false
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
