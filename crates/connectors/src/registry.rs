//! Connector registry: built-ins merged with caller entries.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use klaywallet_protocol::{ActivationError, WalletError};
use tracing::{debug, warn};

use crate::builtin::builtin_connectors;
use crate::connector::{
    ActivationParams, Connector, ConnectorConfig, ConnectorOptions, ProviderHandle,
};

/// A caller-supplied registry entry.
#[derive(Clone)]
pub enum ConnectorEntry {
    /// A new connector, or an override of a built-in one.
    Initializer(Arc<dyn Connector>),
    /// Configuration for a connector registered elsewhere.
    Config(ConnectorConfig),
}

impl fmt::Debug for ConnectorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initializer(_) => f.write_str("Initializer(..)"),
            Self::Config(config) => f.debug_tuple("Config").field(config).finish(),
        }
    }
}

impl From<Arc<dyn Connector>> for ConnectorEntry {
    fn from(connector: Arc<dyn Connector>) -> Self {
        Self::Initializer(connector)
    }
}

impl From<ConnectorConfig> for ConnectorEntry {
    fn from(config: ConnectorConfig) -> Self {
        Self::Config(config)
    }
}

impl From<ConnectorOptions> for ConnectorEntry {
    fn from(options: ConnectorOptions) -> Self {
        Self::Config(ConnectorConfig::from_options(options))
    }
}

/// A registered connector and its optional configuration.
#[derive(Clone)]
pub struct ConnectorDescriptor {
    id: String,
    connector: Arc<dyn Connector>,
    config: Option<ConnectorConfig>,
}

impl ConnectorDescriptor {
    pub fn new(id: impl Into<String>, connector: Arc<dyn Connector>) -> Self {
        Self {
            id: id.into(),
            connector,
            config: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> Option<&ConnectorConfig> {
        self.config.as_ref()
    }

    pub fn connector(&self) -> &Arc<dyn Connector> {
        &self.connector
    }

    /// Activation parameters for this connector on `chain_id`.
    pub fn activation_params(&self, chain_id: u64) -> ActivationParams {
        ActivationParams::new(chain_id, self.config.as_ref())
    }

    /// Runs the connector's initializer with this descriptor's config.
    pub fn initialize(&self, chain_id: u64) -> Option<ProviderHandle> {
        self.connector
            .initialize(&self.activation_params(chain_id))
    }

    pub fn handle_activation_error(&self, error: &ActivationError) -> Option<WalletError> {
        self.connector.handle_activation_error(error)
    }
}

impl fmt::Debug for ConnectorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectorDescriptor")
            .field("id", &self.id)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Lookup table of connectors by id.
#[derive(Debug, Clone, Default)]
pub struct ConnectorRegistry {
    chain_id: u64,
    connectors: BTreeMap<String, ConnectorDescriptor>,
}

impl ConnectorRegistry {
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn get(&self, id: &str) -> Option<&ConnectorDescriptor> {
        self.connectors.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.connectors.contains_key(id)
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        self.connectors.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.connectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConnectorDescriptor> {
        self.connectors.values()
    }
}

/// Builds the registry for a session.
///
/// Initializer entries are overlaid on the built-ins (adding ids or
/// replacing built-ins); config entries are then attached to the matching
/// connector. Configs for unknown ids are dropped.
pub fn build_registry<I, K>(chain_id: u64, entries: I) -> Result<ConnectorRegistry, WalletError>
where
    I: IntoIterator<Item = (K, ConnectorEntry)>,
    K: Into<String>,
{
    let mut initializers = Vec::new();
    let mut configs = Vec::new();
    for (id, entry) in entries {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(WalletError::ConnectorConfig("empty connector id".into()));
        }
        match entry {
            ConnectorEntry::Initializer(connector) => initializers.push((id, connector)),
            ConnectorEntry::Config(config) => configs.push((id, config)),
        }
    }

    let mut connectors: BTreeMap<String, ConnectorDescriptor> = builtin_connectors()
        .into_iter()
        .map(|(id, connector)| (id.to_string(), ConnectorDescriptor::new(id, connector)))
        .collect();

    for (id, connector) in initializers {
        if connectors.contains_key(&id) {
            debug!(connector = %id, "overriding connector");
        }
        connectors.insert(id.clone(), ConnectorDescriptor::new(id, connector));
    }

    for (id, config) in configs {
        match connectors.get_mut(&id) {
            Some(descriptor) => descriptor.config = Some(config),
            None => warn!(connector = %id, "dropping config for unknown connector"),
        }
    }

    Ok(ConnectorRegistry {
        chain_id,
        connectors,
    })
}
