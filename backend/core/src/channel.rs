use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::event::GatewayEvent;

/// Default channel buffer size for inbound gateway events.
const DEFAULT_BUFFER_SIZE: usize = 256;

/// The inbound event bus between a platform connection and the bot's run loop.
///
/// The connection side keeps cloning `tx`; the run loop takes the receiver once.
/// Built on Tokio mpsc channels for async, bounded backpressure.
pub struct GatewayBus {
    pub tx: mpsc::Sender<GatewayEvent>,
    rx: Option<mpsc::Receiver<GatewayEvent>>,
}

impl GatewayBus {
    /// Create a new bus with the default buffer size.
    pub fn new() -> Self {
        Self::with_buffer_size(DEFAULT_BUFFER_SIZE)
    }

    /// Create a new bus with a custom buffer size.
    pub fn with_buffer_size(buffer: usize) -> Self {
        let (tx, rx) = mpsc::channel(buffer);
        info!(buffer_size = buffer, "GatewayBus initialized");
        Self { tx, rx: Some(rx) }
    }

    pub fn sender(&self) -> mpsc::Sender<GatewayEvent> {
        self.tx.clone()
    }

    /// Take the receiver (can only be called once).
    pub fn take_rx(&mut self) -> Option<mpsc::Receiver<GatewayEvent>> {
        debug!("Gateway receiver taken");
        self.rx.take()
    }
}

impl Default for GatewayBus {
    fn default() -> Self {
        Self::new()
    }
}
