use std::{ops::Deref, sync::Arc};

use crossbeam::channel::{Receiver, RecvError, TryRecvError};
use prometheus::{Counter, Gauge};

#[derive(Clone)]
pub struct TokenizedReceiver<T> {
    pub(crate) receiver: Receiver<T>,
    pub(crate) name: String,
    /// channel size
    pub(crate) actual_len: Gauge,
    /// total received messages
    pub(crate) received: Counter,
    /// shared by clones, the last one dropped unregisters the metrics
    pub(crate) ref_counter: Arc<()>,
}

impl<T> Drop for TokenizedReceiver<T> {
    fn drop(&mut self) {
        if Arc::strong_count(&self.ref_counter) == 1 {
            self.unregister();
        }
    }
}

impl<T> TokenizedReceiver<T> {
    /// Name the channel was created with
    pub fn name(&self) -> &str {
        &self.name
    }

    fn unregister(&self) {
        let _ = prometheus::unregister(Box::new(self.actual_len.clone()));
        let _ = prometheus::unregister(Box::new(self.received.clone()));
    }

    fn on_received(&self) {
        // a message can be counted by several receivers, use the real length
        self.actual_len.set(self.receiver.len() as f64);
        self.received.inc();
    }

    /// attempt to receive a message from the channel
    pub fn try_recv(&self) -> Result<T, TryRecvError> {
        let msg = self.receiver.try_recv()?;
        self.on_received();
        Ok(msg)
    }

    /// Blocks until a message arrives or every sender is dropped
    pub fn recv(&self) -> Result<T, RecvError> {
        let msg = self.receiver.recv()?;
        self.on_received();
        Ok(msg)
    }
}

impl<T> Deref for TokenizedReceiver<T> {
    type Target = Receiver<T>;

    fn deref(&self) -> &Self::Target {
        &self.receiver
    }
}
