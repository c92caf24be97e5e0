//! In-process worker channel

use bridge_traits::{
    error::{BridgeError, Result},
    message::{MessagePort, WorkerMessage},
};
use tokio::sync::mpsc;
use tracing::trace;

/// `MessagePort` over an unbounded tokio channel.
///
/// The receiving half belongs to whoever runs the offline cache worker.
pub struct ChannelMessagePort {
    sender: mpsc::UnboundedSender<WorkerMessage>,
}

impl ChannelMessagePort {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<WorkerMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl MessagePort for ChannelMessagePort {
    fn post_message(&self, message: WorkerMessage) -> Result<()> {
        trace!(kind = message.kind(), "Posting worker message");
        self.sender
            .send(message)
            .map_err(|_| BridgeError::ChannelClosed("offline cache worker is gone".to_string()))
    }
}
