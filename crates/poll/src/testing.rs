//! In-memory chain used by the watcher tests.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use klaywallet_rpc::{ChainRpc, RpcError};

/// Serves scripted answers in order, repeating the last one forever, or
/// cycling through all of them when built with [`ScriptedChain::cycling`].
#[derive(Default)]
pub(crate) struct ScriptedChain {
    blocks: Mutex<Vec<String>>,
    balances: Mutex<Vec<Option<String>>>,
    block_calls: AtomicU32,
    balance_calls: AtomicU32,
    fail_blocks: AtomicBool,
    fail_balances: AtomicBool,
    cycle: AtomicBool,
}

impl ScriptedChain {
    pub(crate) fn with_blocks(blocks: &[&str]) -> Arc<Self> {
        let chain = Self::default();
        *chain.blocks.lock().unwrap() = blocks.iter().map(|b| b.to_string()).collect();
        Arc::new(chain)
    }

    pub(crate) fn with_balances(balances: &[Option<&str>]) -> Arc<Self> {
        let chain = Self::default();
        *chain.balances.lock().unwrap() = balances
            .iter()
            .map(|b| b.map(str::to_string))
            .collect();
        Arc::new(chain)
    }

    pub(crate) fn cycling(self: Arc<Self>) -> Arc<Self> {
        self.cycle.store(true, Ordering::SeqCst);
        self
    }

    pub(crate) fn fail_blocks(&self, fail: bool) {
        self.fail_blocks.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_balances(&self, fail: bool) {
        self.fail_balances.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn block_calls(&self) -> u32 {
        self.block_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn balance_calls(&self) -> u32 {
        self.balance_calls.load(Ordering::SeqCst)
    }
}

fn next<T: Clone>(script: &Mutex<Vec<T>>, cycle: bool) -> Option<T> {
    let mut script = script.lock().unwrap();
    if cycle && !script.is_empty() {
        script.rotate_left(1);
        script.last().cloned()
    } else if script.len() > 1 {
        Some(script.remove(0))
    } else {
        script.first().cloned()
    }
}

#[async_trait]
impl ChainRpc for ScriptedChain {
    async fn get_balance(&self, _account: &str) -> Result<Option<String>, RpcError> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_balances.load(Ordering::SeqCst) {
            return Err(RpcError::Transport("scripted failure".into()));
        }
        Ok(next(&self.balances, self.cycle.load(Ordering::SeqCst)).flatten())
    }

    async fn get_block_number(&self) -> Result<Option<String>, RpcError> {
        self.block_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_blocks.load(Ordering::SeqCst) {
            return Err(RpcError::Transport("scripted failure".into()));
        }
        Ok(next(&self.blocks, self.cycle.load(Ordering::SeqCst)))
    }

    async fn is_contract_account(&self, _account: &str) -> Result<bool, RpcError> {
        Ok(false)
    }
}
