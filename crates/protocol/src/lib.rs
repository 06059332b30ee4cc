//! Shared vocabulary for the klaywallet crates.
//!
//! Chain identifiers, session statuses, the balance sentinel and the error
//! taxonomy surfaced to session consumers.

pub mod constants;
pub mod error;
pub mod quantity;
pub mod types;

// Re-export primary types for convenience.
pub use constants::{DEFAULT_CHAIN_ID, NO_BALANCE, network_name};
pub use error::{ActivationError, WalletError};
pub use quantity::normalize_quantity;
pub use types::{AccountKind, ConnectionStatus};
