//! Test doubles for the activation mechanism and the chain facade.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use klaywallet_connectors::ProviderHandle;
use klaywallet_protocol::ActivationError;
use klaywallet_rpc::{ChainRpc, RpcError};
use tokio::sync::{Notify, oneshot, watch};

use crate::activator::{ActivationState, Activator};

type Gate = oneshot::Sender<Result<(), ActivationError>>;

#[derive(Default)]
struct Activations {
    handles: Vec<ProviderHandle>,
    gates: Vec<Option<Gate>>,
}

/// Activator whose activations wait until the test resolves them, unless
/// built with [`MockActivator::approving`].
///
/// A successful activation publishes the configured account and chain, but
/// only if no newer activation was started in the meantime.
pub(crate) struct MockActivator {
    state: watch::Sender<ActivationState>,
    activations: Mutex<Activations>,
    started: watch::Sender<usize>,
    finished: watch::Sender<usize>,
    deactivations: AtomicUsize,
    on_success: Option<(String, Arc<dyn ChainRpc>)>,
    auto_approve: bool,
}

impl MockActivator {
    fn build(on_success: Option<(String, Arc<dyn ChainRpc>)>, auto_approve: bool) -> Arc<Self> {
        Arc::new(Self {
            state: watch::channel(ActivationState::default()).0,
            activations: Mutex::new(Activations::default()),
            started: watch::channel(0).0,
            finished: watch::channel(0).0,
            deactivations: AtomicUsize::new(0),
            on_success,
            auto_approve,
        })
    }

    /// Gated activator; a success exposes no account.
    pub fn new() -> Arc<Self> {
        Self::build(None, false)
    }

    /// Approves every activation immediately and exposes `account` on `chain`.
    pub fn approving(account: &str, chain: Arc<MockChain>) -> Arc<Self> {
        Self::build(Some((account.to_string(), chain as Arc<dyn ChainRpc>)), true)
    }

    pub fn succeed(&self, index: usize) {
        self.resolve(index, Ok(()));
    }

    pub fn fail(&self, index: usize, error: ActivationError) {
        self.resolve(index, Err(error));
    }

    fn resolve(&self, index: usize, result: Result<(), ActivationError>) {
        let gate = self.activations.lock().unwrap().gates[index]
            .take()
            .expect("activation already resolved");
        let _ = gate.send(result);
    }

    pub async fn wait_started(&self, n: usize) {
        let mut rx = self.started.subscribe();
        let _ = rx.wait_for(|count| *count >= n).await;
    }

    pub async fn wait_finished(&self, n: usize) {
        let mut rx = self.finished.subscribe();
        let _ = rx.wait_for(|count| *count >= n).await;
    }

    pub fn activation_count(&self) -> usize {
        self.activations.lock().unwrap().handles.len()
    }

    pub fn handles(&self) -> Vec<ProviderHandle> {
        self.activations.lock().unwrap().handles.clone()
    }

    pub fn deactivation_count(&self) -> usize {
        self.deactivations.load(Ordering::SeqCst)
    }

    /// Publishes an activation state directly, as a provider switching
    /// accounts would.
    pub fn publish(&self, account: Option<&str>, library: Option<Arc<MockChain>>) {
        self.state.send_replace(ActivationState {
            account: account.map(str::to_string),
            active: library.is_some(),
            library: library.map(|chain| chain as Arc<dyn ChainRpc>),
        });
    }
}

#[async_trait]
impl Activator for MockActivator {
    async fn activate(&self, handle: ProviderHandle) -> Result<(), ActivationError> {
        let (tx, rx) = oneshot::channel();
        let index = {
            let mut activations = self.activations.lock().unwrap();
            activations.handles.push(handle);
            activations.gates.push(Some(tx));
            activations.handles.len() - 1
        };
        self.started.send_modify(|n| *n += 1);

        let result = if self.auto_approve {
            Ok(())
        } else {
            rx.await
                .unwrap_or_else(|_| Err(ActivationError::Other("activation dropped".into())))
        };

        if result.is_ok() && index + 1 == self.activation_count() {
            let (account, library) = self.on_success.clone().unzip();
            self.state.send_replace(ActivationState {
                account,
                library,
                active: true,
            });
        }
        self.finished.send_modify(|n| *n += 1);
        result
    }

    fn deactivate(&self) {
        self.deactivations.fetch_add(1, Ordering::SeqCst);
        self.state.send_replace(ActivationState::default());
    }

    fn state(&self) -> watch::Receiver<ActivationState> {
        self.state.subscribe()
    }
}

/// In-memory chain with fixed answers.
pub(crate) struct MockChain {
    balance: String,
    block_number: String,
    is_contract: AtomicBool,
    fail_contract: AtomicBool,
    gated: AtomicBool,
    gate: Notify,
    contract_calls: watch::Sender<usize>,
}

impl MockChain {
    pub fn new(balance: &str, block_number: &str) -> Arc<Self> {
        Arc::new(Self {
            balance: balance.to_string(),
            block_number: block_number.to_string(),
            is_contract: AtomicBool::new(false),
            fail_contract: AtomicBool::new(false),
            gated: AtomicBool::new(false),
            gate: Notify::new(),
            contract_calls: watch::channel(0).0,
        })
    }

    pub fn contract(self: Arc<Self>) -> Arc<Self> {
        self.is_contract.store(true, Ordering::SeqCst);
        self
    }

    pub fn failing_contract_check(self: Arc<Self>) -> Arc<Self> {
        self.fail_contract.store(true, Ordering::SeqCst);
        self
    }

    /// Contract checks block until [`release`](Self::release).
    pub fn gated(self: Arc<Self>) -> Arc<Self> {
        self.gated.store(true, Ordering::SeqCst);
        self
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }

    pub fn contract_calls(&self) -> usize {
        *self.contract_calls.borrow()
    }

    pub async fn wait_contract_calls(&self, n: usize) {
        let mut rx = self.contract_calls.subscribe();
        let _ = rx.wait_for(|count| *count >= n).await;
    }
}

#[async_trait]
impl ChainRpc for MockChain {
    async fn get_balance(&self, _account: &str) -> Result<Option<String>, RpcError> {
        Ok(Some(self.balance.clone()))
    }

    async fn get_block_number(&self) -> Result<Option<String>, RpcError> {
        Ok(Some(self.block_number.clone()))
    }

    async fn is_contract_account(&self, _account: &str) -> Result<bool, RpcError> {
        self.contract_calls.send_modify(|n| *n += 1);
        if self.gated.load(Ordering::SeqCst) {
            self.gate.notified().await;
        }
        if self.fail_contract.load(Ordering::SeqCst) {
            return Err(RpcError::Transport("connection refused".into()));
        }
        Ok(self.is_contract.load(Ordering::SeqCst))
    }
}
