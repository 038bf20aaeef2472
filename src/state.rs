//! Application state management
//!
//! Contains shared state accessible across all handlers. No target database
//! connection lives here; each request opens and releases its own.

use crate::capabilities::Capabilities;
use crate::config::Settings;
use std::sync::Arc;

/// Application state shared across all handlers
pub struct AppState {
    pub settings: Settings,

    /// Registered tools, prompts and resources
    pub capabilities: Capabilities,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            capabilities: Capabilities::register(),
        }
    }
}

/// Type alias for shared state
pub type SharedState = Arc<AppState>;
