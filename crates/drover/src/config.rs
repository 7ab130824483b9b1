use drover_core::{Connection, Provider};

use std::sync::Arc;

/// Engine configuration: the ordered provider registry and the fallback
/// policy.
#[derive(Debug)]
pub struct BatchConfig {
    providers: Vec<Arc<dyn Provider>>,
    /// When set, an operation with no capable provider fails instead of
    /// silently degrading to per-item saves.
    pub disable_fallback: bool,
}

impl BatchConfig {
    /// A configuration with no providers registered.
    pub fn empty() -> Self {
        Self {
            providers: Vec::new(),
            disable_fallback: false,
        }
    }

    /// Appends a provider. Resolution tries providers in registration order
    /// and the first match wins.
    pub fn register(&mut self, provider: Arc<dyn Provider>) {
        self.providers.push(provider);
    }

    /// Resolves the provider for a live connection by strict connection-type
    /// match.
    pub fn provider_for(&self, connection: &dyn Connection) -> Option<Arc<dyn Provider>> {
        let provider = self
            .providers
            .iter()
            .find(|p| p.can_handle(connection))
            .cloned();

        match &provider {
            Some(provider) => {
                tracing::debug!(provider = ?provider, "resolved bulk provider");
            }
            None => {
                tracing::debug!("no registered provider recognizes the connection");
            }
        }

        provider
    }
}

impl Default for BatchConfig {
    /// The built-in providers, in registration order.
    fn default() -> Self {
        #[allow(unused_mut)]
        let mut config = Self::empty();

        #[cfg(feature = "mssql")]
        config.register(Arc::new(drover_driver_mssql::MssqlProvider::new()));

        #[cfg(feature = "mysql")]
        config.register(Arc::new(drover_driver_mysql::MysqlProvider::new()));

        config
    }
}
