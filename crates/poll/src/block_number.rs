//! Latest block number feed.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use klaywallet_protocol::normalize_quantity;
use klaywallet_rpc::{ChainRpc, same_chain};
use tracing::{debug, info};

use crate::broadcast::{Listener, ValueBroadcaster};
use crate::poller::{PollHandle, PollRequest, Poller};

/// Polls the latest block number of the active provider and broadcasts it.
///
/// At most one polling loop runs at a time; switching providers cancels the
/// previous loop before the next one starts.
pub struct BlockNumberWatcher {
    broadcaster: Arc<ValueBroadcaster<String>>,
    poller: Poller<Arc<dyn ChainRpc>, Option<String>>,
    current: Mutex<Option<(Arc<dyn ChainRpc>, PollHandle)>>,
}

impl BlockNumberWatcher {
    pub fn new(interval: Duration) -> Self {
        let broadcaster = Arc::new(ValueBroadcaster::new());
        let poller = {
            let broadcaster = Arc::clone(&broadcaster);
            Poller::new(
                move |rpc: Arc<dyn ChainRpc>| {
                    let broadcaster = Arc::clone(&broadcaster);
                    PollRequest::new(
                        move || {
                            let rpc = Arc::clone(&rpc);
                            async move { fetch_block_number(rpc.as_ref()).await }
                        },
                        move |block_number| {
                            broadcaster.update_value(block_number);
                        },
                    )
                },
                interval,
            )
        };

        Self {
            broadcaster,
            poller,
            current: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<(Arc<dyn ChainRpc>, PollHandle)>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Points the watcher at a new provider, or at none.
    ///
    /// Without a provider the block number becomes unknown and no loop runs.
    /// Setting the provider already being polled is a no-op.
    pub fn set_provider(&self, provider: Option<Arc<dyn ChainRpc>>) {
        let mut current = self.lock();

        if let (Some((active, _)), Some(next)) = (current.as_ref(), provider.as_ref())
            && same_chain(active, next)
        {
            return;
        }

        if let Some((_, handle)) = current.take() {
            handle.cancel();
            debug!("block number polling stopped");
        }

        match provider {
            None => {
                drop(current);
                self.broadcaster.update_value(None);
            }
            Some(rpc) => {
                let handle = self.poller.start(Arc::clone(&rpc));
                *current = Some((rpc, handle));
                info!(
                    interval_ms = self.poller.delay().as_millis() as u64,
                    "block number polling started"
                );
            }
        }
    }

    /// Stops polling and forgets the provider.
    pub fn stop(&self) {
        self.set_provider(None);
    }

    pub fn is_polling(&self) -> bool {
        self.lock().is_some()
    }

    /// The last known block number.
    pub fn block_number(&self) -> Option<String> {
        self.broadcaster.last_value()
    }

    pub fn add_listener(&self, cb: &Listener<String>) -> bool {
        self.broadcaster.add_listener(cb)
    }

    pub fn remove_listener(&self, cb: &Listener<String>) -> bool {
        self.broadcaster.remove_listener(cb)
    }
}

/// Fetches and normalises the block number; failures read as unknown.
async fn fetch_block_number(rpc: &dyn ChainRpc) -> Option<String> {
    match rpc.get_block_number().await {
        Ok(Some(raw)) => normalize_quantity(&raw),
        Ok(None) => None,
        Err(e) => {
            debug!(error = %e, "block number fetch failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedChain;

    const INTERVAL: Duration = Duration::from_millis(5000);

    fn recorder() -> (Listener<String>, Arc<Mutex<Vec<Option<String>>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen2 = seen.clone();
        let cb: Listener<String> = Arc::new(move |v| seen2.lock().unwrap().push(v));
        (cb, seen)
    }

    #[tokio::test(start_paused = true)]
    async fn broadcasts_normalized_block_numbers() {
        let chain = ScriptedChain::with_blocks(&["0x10", "0x10", "0x11"]);
        let watcher = BlockNumberWatcher::new(INTERVAL);
        let (cb, seen) = recorder();
        watcher.add_listener(&cb);

        watcher.set_provider(Some(chain.clone()));
        tokio::time::sleep(Duration::from_millis(10_100)).await;

        // Replay, then "16" once despite being fetched twice, then "17".
        assert_eq!(
            *seen.lock().unwrap(),
            vec![None, Some("16".to_string()), Some("17".to_string())]
        );
        assert_eq!(watcher.block_number().as_deref(), Some("17"));
        assert_eq!(chain.block_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn clearing_provider_resets_to_none() {
        let chain = ScriptedChain::with_blocks(&["0x5"]);
        let watcher = BlockNumberWatcher::new(INTERVAL);
        watcher.set_provider(Some(chain.clone()));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(watcher.block_number().as_deref(), Some("5"));

        watcher.set_provider(None);
        assert!(!watcher.is_polling());
        assert_eq!(watcher.block_number(), None);

        tokio::time::sleep(INTERVAL * 3).await;
        assert_eq!(chain.block_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn switching_provider_cancels_previous_loop() {
        let first = ScriptedChain::with_blocks(&["0x1"]);
        let second = ScriptedChain::with_blocks(&["0x100"]);
        let watcher = BlockNumberWatcher::new(INTERVAL);

        watcher.set_provider(Some(first.clone()));
        tokio::time::sleep(Duration::from_millis(10)).await;
        watcher.set_provider(Some(second.clone()));
        tokio::time::sleep(INTERVAL * 2 + Duration::from_millis(10)).await;

        assert_eq!(first.block_calls(), 1);
        assert_eq!(second.block_calls(), 3);
        assert_eq!(watcher.block_number().as_deref(), Some("256"));
    }

    #[tokio::test(start_paused = true)]
    async fn same_provider_does_not_restart() {
        let chain = ScriptedChain::with_blocks(&["0x1"]);
        let watcher = BlockNumberWatcher::new(INTERVAL);

        watcher.set_provider(Some(chain.clone()));
        tokio::time::sleep(Duration::from_millis(10)).await;
        watcher.set_provider(Some(chain.clone()));
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(chain.block_calls(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn clearing_provider_leaves_none_under_contention() {
        for _ in 0..500 {
            let chain = ScriptedChain::with_blocks(&["0x1", "0x2"]).cycling();
            let watcher = BlockNumberWatcher::new(Duration::ZERO);
            watcher.set_provider(Some(chain.clone()));
            tokio::task::yield_now().await;

            watcher.set_provider(None);
            tokio::time::sleep(Duration::from_millis(2)).await;
            assert_eq!(watcher.block_number(), None);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_errors_read_as_unknown() {
        let chain = ScriptedChain::with_blocks(&["0x9"]);
        let watcher = BlockNumberWatcher::new(INTERVAL);
        watcher.set_provider(Some(chain.clone()));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(watcher.block_number().as_deref(), Some("9"));

        chain.fail_blocks(true);
        tokio::time::sleep(INTERVAL).await;
        assert_eq!(watcher.block_number(), None);
    }
}
