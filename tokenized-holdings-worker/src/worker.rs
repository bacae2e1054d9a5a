use crate::{CacheChannel, HoldingsCache};
use std::sync::Arc;
use std::thread;
use tokenized_holdings_exports::HoldingsError;
use tracing::{error, info};

/// Handle on the holdings writer thread
pub trait HoldingsWriterManager {
    /// Closes the flush channel, waits for the queued items to be written
    /// and returns the outcome of the writer thread
    fn stop(&mut self) -> Result<(), HoldingsError>;

    /// False once the writer thread has returned, stopped or aborted
    fn is_running(&self) -> bool;
}

struct HoldingsWriterManagerImpl {
    channel: Arc<CacheChannel>,
    thread_handle: Option<thread::JoinHandle<Result<(), HoldingsError>>>,
}

impl HoldingsWriterManager for HoldingsWriterManagerImpl {
    fn stop(&mut self) -> Result<(), HoldingsError> {
        info!("Stopping HoldingsWriter...");
        // a channel closed elsewhere still needs its writer joined
        let _ = self.channel.close();
        let res = match self.thread_handle.take() {
            Some(join_handle) => join_handle.join().map_err(|_| HoldingsError::WriterPanicked)?,
            None => Ok(()),
        };
        info!("HoldingsWriter stopped");
        res
    }

    fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .map_or(false, |handle| !handle.is_finished())
    }
}

/// Starts the thread that writes every item sent to `channel`
pub fn start_holdings_writer(
    cache: Arc<HoldingsCache>,
    channel: Arc<CacheChannel>,
) -> Box<dyn HoldingsWriterManager> {
    let thread_channel = channel.clone();
    let thread_handle = thread::Builder::new()
        .name("holdings_writer".into())
        .spawn(move || {
            let res = thread_channel.process_cache_items(&cache);
            if let Err(err) = &res {
                error!("holdings writer aborted: {}", err);
            }
            res
        })
        .expect("failed to spawn thread : holdings_writer");

    info!("HoldingsWriter started");
    Box::new(HoldingsWriterManagerImpl {
        channel,
        thread_handle: Some(thread_handle),
    })
}
