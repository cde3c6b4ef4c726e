//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::service::NoteService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    notes: NoteService,
}

impl AppState {
    pub fn new(config: Config, notes: NoteService) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, notes }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the note service
    pub fn notes(&self) -> &NoteService {
        &self.inner.notes
    }
}
