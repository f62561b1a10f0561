use serde::{Deserialize, Serialize};

/// Tunables of a [`State`](super::State).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum number of memoized translations. Once reached, the whole cache
    /// is dropped and starts a new generation. A capacity of 0 disables
    /// memoization.
    pub cache_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            cache_capacity: 4096,
        }
    }
}
