use crate::HoldingsCache;
use crossbeam::channel::SendTimeoutError;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokenized_channel::receiver::TokenizedReceiver;
use tokenized_channel::sender::TokenizedSender;
use tokenized_channel::TokenizedChannel;
use tokenized_holdings_exports::{CacheItem, HoldingsConfig, HoldingsError};
use tracing::{debug, error, warn};

/// Metric prefix of the flush channel
pub const CACHE_CHANNEL_NAME: &str = "holdings_cache";

/// How long `add` waits on a full queue before checking the writer again
const ADD_RETRY_INTERVAL: Duration = Duration::from_millis(100);

/// Bounded queue of cache items waiting to be written.
///
/// The sender doubles as the open flag: `close` drops it, which lets the
/// receiving side drain what is left and then stop. Once processing aborts
/// nothing drains the queue anymore, so `add` fails instead of blocking.
pub struct CacheChannel {
    sender: Mutex<Option<TokenizedSender<CacheItem>>>,
    receiver: TokenizedReceiver<CacheItem>,
    aborted: AtomicBool,
}

impl CacheChannel {
    pub fn new(config: &HoldingsConfig) -> Result<Self, HoldingsError> {
        let (sender, receiver) =
            TokenizedChannel::new(CACHE_CHANNEL_NAME.to_string(), Some(config.channel_size))
                .map_err(|err| HoldingsError::ChannelError(err.to_string()))?;
        Ok(CacheChannel {
            sender: Mutex::new(Some(sender)),
            receiver,
            aborted: AtomicBool::new(false),
        })
    }

    /// Queues an item, blocking while the queue is full.
    ///
    /// Fails with `WriterAborted` once processing stopped on an error, even
    /// when the call was already waiting.
    pub fn add(&self, item: CacheItem) -> Result<(), HoldingsError> {
        // `close` must never wait behind a blocked send
        let sender = match self.sender.lock().as_ref() {
            Some(sender) => sender.clone(),
            None => return Err(HoldingsError::ChannelClosed),
        };
        let mut item = item;
        loop {
            if self.is_aborted() {
                return Err(HoldingsError::WriterAborted);
            }
            match sender.send_timeout(item, ADD_RETRY_INTERVAL) {
                Ok(()) => return Ok(()),
                Err(SendTimeoutError::Timeout(returned)) => item = returned,
                Err(SendTimeoutError::Disconnected(_)) => {
                    return Err(HoldingsError::ChannelClosed)
                }
            }
        }
    }

    /// Stops accepting items. Items already queued are still processed.
    pub fn close(&self) -> Result<(), HoldingsError> {
        match self.sender.lock().take() {
            Some(_) => {
                debug!("holdings cache channel closed");
                Ok(())
            }
            None => Err(HoldingsError::ChannelClosed),
        }
    }

    pub fn is_open(&self) -> bool {
        self.sender.lock().is_some()
    }

    /// Whether processing stopped on a write error
    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::Acquire)
    }

    /// Writes queued items until the channel is closed and empty.
    ///
    /// An item whose holding left the cache before being written is skipped.
    /// Any other error stops processing and is returned.
    pub fn process_cache_items(&self, cache: &HoldingsCache) -> Result<(), HoldingsError> {
        while let Ok(item) = self.receiver.recv() {
            match cache.write_cache_update(&item) {
                Ok(()) => {}
                Err(HoldingsError::NotInCache) => {
                    warn!(
                        "holding {} left the cache before being written",
                        item.storage_key()
                    );
                }
                Err(err) => {
                    error!(
                        "failed to write holding {} : {}",
                        item.storage_key(),
                        err
                    );
                    self.aborted.store(true, Ordering::Release);
                    return Err(err);
                }
            }
        }
        Ok(())
    }
}
