//! Engine sizing configuration.

use serde::{Deserialize, Serialize};

/// Capacity hints for the registry and slot pool. Purely about allocation
/// behavior; no semantic effect.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Slots preallocated at construction.
    pub initial_slots: usize,
    /// Capacity hint for the active-index list.
    pub active_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            initial_slots: 1024,
            active_capacity: 1024,
        }
    }
}
