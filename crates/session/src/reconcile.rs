//! Follows the activation state: feeds the watchers and classifies the
//! connected account.

use std::sync::Arc;

use klaywallet_protocol::{AccountKind, ConnectionStatus};
use klaywallet_rpc::{ChainRpc, same_chain};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::activator::ActivationState;
use crate::session::SessionInner;

type Pair = (String, Arc<dyn ChainRpc>);

/// Spawns the reconciliation task. It runs until the session shuts down.
pub(crate) fn spawn(inner: Arc<SessionInner>) {
    let rx = inner.activator.state();
    tokio::spawn(run(inner, rx));
}

async fn run(inner: Arc<SessionInner>, mut rx: tokio::sync::watch::Receiver<ActivationState>) {
    let mut reconciler = Reconciler::default();
    loop {
        let state = rx.borrow_and_update().clone();
        reconciler.apply(&inner, &state);

        tokio::select! {
            _ = inner.shutdown.cancelled() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    debug!("activation state closed");
                    inner.shutdown.cancelled().await;
                    break;
                }
            }
        }
    }
    reconciler.cancel_effect();
}

/// One classification run per `(account, provider)` pair.
#[derive(Default)]
struct Reconciler {
    pair: Option<Pair>,
    effect: Option<CancellationToken>,
}

impl Reconciler {
    /// Feeds both watchers and, when the `(account, provider)` pair changes,
    /// restarts the account classification.
    ///
    /// On a change the account kind is cleared, but the status only falls
    /// back to `Disconnected` when it was `Connected`. A `Connecting` or
    /// `Error` status belongs to the latest `connect` call and is left to it.
    fn apply(&mut self, inner: &Arc<SessionInner>, state: &ActivationState) {
        if inner.shutdown.is_cancelled() {
            return;
        }

        inner
            .balance
            .watch(state.account.as_deref(), state.library.clone());
        inner.block_number.set_provider(state.library.clone());

        let next = state
            .pair()
            .map(|(account, library)| (account.to_string(), Arc::clone(library)));
        let unchanged = match (self.pair.as_ref(), next.as_ref()) {
            (Some((a, l)), Some((b, m))) => a == b && same_chain(l, m),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return;
        }

        self.cancel_effect();
        if self.pair.take().is_some() {
            inner.state.send_if_modified(|s| {
                let before = (s.account_kind, s.status);
                s.account_kind = None;
                if s.status == ConnectionStatus::Connected {
                    s.status = ConnectionStatus::Disconnected;
                }
                before != (s.account_kind, s.status)
            });
        }

        if let Some((account, library)) = next.clone() {
            let token = inner.shutdown.child_token();
            self.effect = Some(token.clone());
            tokio::spawn(classify_account(Arc::clone(inner), account, library, token));
        }
        self.pair = next;
    }

    fn cancel_effect(&mut self) {
        if let Some(token) = self.effect.take() {
            token.cancel();
        }
    }
}

/// Determines whether `account` is a contract and marks the session
/// connected, unless the pair changed in the meantime.
async fn classify_account(
    inner: Arc<SessionInner>,
    account: String,
    library: Arc<dyn ChainRpc>,
    token: CancellationToken,
) {
    let kind = match library.is_contract_account(&account).await {
        Ok(is_contract) => AccountKind::from_is_contract(is_contract),
        Err(e) => {
            debug!(account = %account, error = %e, "contract check failed");
            AccountKind::Normal
        }
    };

    let applied = inner.state.send_if_modified(|s| {
        if token.is_cancelled() {
            return false;
        }
        s.status = ConnectionStatus::Connected;
        s.account_kind = Some(kind);
        true
    });
    if applied {
        info!(account = %account, kind = ?kind, "account classified");
    } else {
        debug!(account = %account, "discarding stale account classification");
    }
}
