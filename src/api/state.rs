//! Application state for the travel allowance API.

use std::sync::Arc;

use crate::config::ConfigLoader;

/// Shared application state.
///
/// Holds only the read-only rate schedule; trip collections are built per
/// request, so no session state is shared between callers.
#[derive(Clone)]
pub struct AppState {
    config: Arc<ConfigLoader>,
}

impl AppState {
    /// Creates a new application state with the given configuration loader.
    pub fn new(config: ConfigLoader) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Returns a reference to the configuration loader.
    pub fn config(&self) -> &ConfigLoader {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_shares_config() {
        let state = AppState::new(ConfigLoader::load("./config/at-2025").unwrap());
        let cloned = state.clone();

        assert!(std::ptr::eq(state.config(), cloned.config()));
        assert_eq!(cloned.config().schedule().code, "AT-RK");
    }
}
