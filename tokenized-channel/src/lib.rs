//! Named crossbeam channels reporting their queue length to prometheus.

use std::sync::Arc;

use receiver::TokenizedReceiver;
use sender::TokenizedSender;

pub mod receiver;
pub mod sender;

#[derive(Clone)]
pub struct TokenizedChannel {}

impl TokenizedChannel {
    /// Creates a channel named `name`, bounded when `capacity` is set.
    ///
    /// Fails only if the metric names are invalid. A metric that is already
    /// registered (two channels sharing a name) is logged and left alone.
    #[allow(clippy::new_ret_no_self)]
    pub fn new<T>(
        name: String,
        capacity: Option<usize>,
    ) -> Result<(TokenizedSender<T>, TokenizedReceiver<T>), prometheus::Error> {
        use prometheus::{Counter, Gauge};
        use tracing::error;

        let (s, r) = if let Some(capacity) = capacity {
            crossbeam::channel::bounded::<T>(capacity)
        } else {
            crossbeam::channel::unbounded::<T>()
        };

        let actual_len = Gauge::new(
            format!("{}_channel_actual_size", name),
            "Actual length of channel",
        )?;

        let received = Counter::new(
            format!("{}_channel_total_receive", name),
            "Total received messages",
        )?;

        if let Err(e) = prometheus::register(Box::new(actual_len.clone())) {
            error!("Failed to register actual_len gauge for {} : {}", name, e);
        }

        if let Err(e) = prometheus::register(Box::new(received.clone())) {
            error!("Failed to register received counter for {} : {}", name, e);
        }

        let sender = TokenizedSender {
            sender: s,
            actual_len: actual_len.clone(),
        };

        let receiver = TokenizedReceiver {
            receiver: r,
            name,
            actual_len,
            received,
            ref_counter: Arc::new(()),
        };

        Ok((sender, receiver))
    }
}
