//! Account balance feed.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use klaywallet_protocol::{NO_BALANCE, normalize_quantity};
use klaywallet_rpc::{ChainRpc, same_chain};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::poller::{PollHandle, PollRequest, Poller};

struct Watched {
    account: String,
    rpc: Arc<dyn ChainRpc>,
    handle: PollHandle,
}

/// Polls the balance of one `(account, provider)` pair at a time.
///
/// The published balance is a decimal string, or [`NO_BALANCE`] while no
/// pair is watched or the balance could not be determined. Only values that
/// differ from the last delivered one are published.
pub struct BalanceWatcher {
    balance: Arc<watch::Sender<String>>,
    poller: Poller<(String, Arc<dyn ChainRpc>), String>,
    current: Mutex<Option<Watched>>,
}

impl BalanceWatcher {
    pub fn new(interval: Duration) -> Self {
        let (balance, _) = watch::channel(NO_BALANCE.to_string());
        let balance = Arc::new(balance);
        let poller = {
            let balance = Arc::clone(&balance);
            Poller::new(
                move |(account, rpc): (String, Arc<dyn ChainRpc>)| {
                    let balance = Arc::clone(&balance);
                    let mut last = NO_BALANCE.to_string();
                    PollRequest::new(
                        move || {
                            let rpc = Arc::clone(&rpc);
                            let account = account.clone();
                            async move { fetch_balance(rpc.as_ref(), &account).await }
                        },
                        move |value: String| {
                            if value != last {
                                last = value.clone();
                                balance.send_replace(value);
                            }
                        },
                    )
                },
                interval,
            )
        };

        Self {
            balance,
            poller,
            current: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Watched>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Watches a new pair. Any missing half stops polling.
    ///
    /// Watching the pair already being polled is a no-op; any change
    /// restarts the loop from the sentinel.
    pub fn watch(&self, account: Option<&str>, rpc: Option<Arc<dyn ChainRpc>>) {
        let mut current = self.lock();

        if let (Some(w), Some(account), Some(rpc)) = (current.as_ref(), account, rpc.as_ref())
            && w.account == account
            && same_chain(&w.rpc, rpc)
        {
            return;
        }

        if let Some(w) = current.take() {
            w.handle.cancel();
            self.balance.send_replace(NO_BALANCE.to_string());
            debug!(account = %w.account, "balance polling stopped");
        }

        if let (Some(account), Some(rpc)) = (account, rpc) {
            let handle = self
                .poller
                .start((account.to_string(), Arc::clone(&rpc)));
            info!(
                account = %account,
                interval_ms = self.poller.delay().as_millis() as u64,
                "balance polling started"
            );
            *current = Some(Watched {
                account: account.to_string(),
                rpc,
                handle,
            });
        }
    }

    /// Stops polling and resets the balance to the sentinel.
    pub fn stop(&self) {
        self.watch(None, None);
    }

    pub fn is_polling(&self) -> bool {
        self.lock().is_some()
    }

    /// The current balance.
    pub fn balance(&self) -> String {
        self.balance.borrow().clone()
    }

    /// Subscribes to balance changes.
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.balance.subscribe()
    }
}

/// Fetches and normalises a balance; failures read as [`NO_BALANCE`].
async fn fetch_balance(rpc: &dyn ChainRpc, account: &str) -> String {
    match rpc.get_balance(account).await {
        Ok(Some(raw)) => normalize_quantity(&raw).unwrap_or_else(|| NO_BALANCE.to_string()),
        Ok(None) => NO_BALANCE.to_string(),
        Err(e) => {
            debug!(account, error = %e, "balance fetch failed");
            NO_BALANCE.to_string()
        }
    }
}
