//! Live data feeds for wallet sessions.
//!
//! A generic [`Poller`] turns a one-shot async request into a cancellable
//! loop. [`BlockNumberWatcher`] and [`BalanceWatcher`] build on it to keep
//! the latest block number and the account balance current.

pub mod balance;
pub mod block_number;
pub mod broadcast;
pub mod poller;

#[cfg(test)]
mod testing;

pub use balance::BalanceWatcher;
pub use block_number::BlockNumberWatcher;
pub use broadcast::{Listener, ValueBroadcaster};
pub use poller::{PollHandle, PollRequest, Poller, poll_every};
