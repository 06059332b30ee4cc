//! Wallet sessions.
//!
//! A [`WalletSession`] resolves connectors from its registry, drives the
//! [`Activator`] handshake with last-call-wins semantics, and keeps the
//! account balance and latest block number live while a provider is
//! connected.
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use klaywallet_session::{Activator, WalletConfig, WalletSessionBuilder};
//! # async fn run(activator: Arc<dyn Activator>) -> Result<(), klaywallet_protocol::WalletError> {
//! let session = WalletSessionBuilder::new(WalletConfig::default()).build(activator)?;
//! let outcome = session.connect("injected").await;
//! println!("{outcome:?}: {:?}", session.snapshot());
//! # Ok(())
//! # }
//! ```

pub mod activator;
pub mod config;
mod reconcile;
pub mod scope;
pub mod session;
pub mod state;

#[cfg(test)]
mod testing;

pub use activator::{ActivationState, Activator};
pub use config::{ConfigError, WalletConfig};
pub use scope::SessionScope;
pub use session::{WalletSession, WalletSessionBuilder};
pub use state::{ConnectOutcome, SessionState, WalletSnapshot};
