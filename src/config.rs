//! Translator configuration.

use serde::{Deserialize, Serialize};

/// Per-translation configuration supplied by the embedding layer.
///
/// One `TranslatorConfig` can be shared across translations; the translator
/// itself never mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatorConfig {
    /// Maximum fetch recursion depth. Once planning reaches this depth,
    /// every fetch is forced to `joined = false` regardless of graph or
    /// profile hints. `None` means unbounded.
    pub max_fetch_depth: Option<usize>,
    /// Names of the fetch profiles enabled for this translation, in
    /// activation order.
    pub enabled_fetch_profiles: Vec<String>,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        TranslatorConfig {
            max_fetch_depth: Some(10),
            enabled_fetch_profiles: Vec::new(),
        }
    }
}

impl TranslatorConfig {
    pub fn with_max_fetch_depth(mut self, depth: Option<usize>) -> Self {
        self.max_fetch_depth = depth;
        self
    }

    pub fn with_fetch_profile(mut self, profile: impl Into<String>) -> Self {
        self.enabled_fetch_profiles.push(profile.into());
        self
    }

    pub fn is_profile_enabled(&self, profile: &str) -> bool {
        self.enabled_fetch_profiles.iter().any(|p| p == profile)
    }
}
