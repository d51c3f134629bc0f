//! Application State Management
//!
//! [`AppState`] is built once at startup and cloned into every request
//! handler. It owns nothing global: two states in one process share no data.

use std::sync::Arc;

use crate::core::config::Config;
use crate::core::Result;
use crate::service::Sledge;

/// Shared state handed to HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Document store service
    pub service: Arc<Sledge>,
    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Wrap an existing service
    pub fn new(service: Arc<Sledge>, config: Config) -> Self {
        Self {
            service,
            config: Arc::new(config),
        }
    }

    /// Validate the configuration and build every service from it
    pub fn from_config(config: Config) -> Result<Self> {
        config.validate()?;
        let service = Sledge::from_config(&config)?;
        tracing::info!(
            storage = ?config.storage.storage_type,
            time_prefix = %config.ids.time_prefix,
            "application state initialized"
        );
        Ok(Self::new(Arc::new(service), config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_states_are_isolated() {
        let a = AppState::from_config(Config::default()).unwrap();
        let b = AppState::from_config(Config::default()).unwrap();
        a.service.registry().get_or_create("db");
        assert_eq!(a.service.registry().database_count(), 1);
        assert_eq!(b.service.registry().database_count(), 0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = Config::default();
        config.ids.time_prefix = String::new();
        assert!(AppState::from_config(config).is_err());
    }
}
