use std::time::Duration;

/// Klaytn mainnet (Cypress) chain id, used when none is configured.
pub const DEFAULT_CHAIN_ID: u64 = 8217;

/// Balance placeholder meaning "not fetched / could not be determined".
///
/// Distinct from a real zero balance.
pub const NO_BALANCE: &str = "-1";

/// Default connector used by `connect()` when none is named.
pub const DEFAULT_CONNECTOR_ID: &str = "injected";

/// Delay between two balance requests.
pub const DEFAULT_POLL_BALANCE_INTERVAL: Duration = Duration::from_millis(2000);

/// Delay between two block number requests.
pub const DEFAULT_POLL_BLOCK_NUMBER_INTERVAL: Duration = Duration::from_millis(5000);

/// Chains with a well-known display name.
const KNOWN_CHAINS: &[(u64, &str)] = &[
    (8217, "Mainnet"),
    (1001, "Baobab"),
    // Conventional id for local development chains (ganache, buidler, ...).
    (1337, "Local"),
    (5777, "Ganache"),
];

/// Returns the display name of a chain, or `"Unknown"`.
pub fn network_name(chain_id: u64) -> &'static str {
    KNOWN_CHAINS
        .iter()
        .find(|(id, _)| *id == chain_id)
        .map(|(_, name)| *name)
        .unwrap_or("Unknown")
}
