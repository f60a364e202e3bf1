//! Repair configuration with the empirically chosen defaults.
//!
//! The fuzzy key thresholds have no derivation beyond "works on real model
//! output"; they live here so they can be tuned against measured
//! false-accept and false-reject rates without touching the engine.

use serde::{Deserialize, Serialize};

use crate::error::RecoverError;

/// Tunable thresholds for fuzzy key resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepairConfig {
    /// Field names up to this many characters use `short_key_max_distance`.
    pub short_key_len: usize,
    /// Maximum edit distance accepted for short field names.
    pub short_key_max_distance: usize,
    /// Maximum edit distance accepted for longer field names.
    pub long_key_max_distance: usize,
    /// Maximum absolute length difference between expected and candidate key.
    pub max_length_diff: usize,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            short_key_len: 10,
            short_key_max_distance: 2,
            long_key_max_distance: 3,
            max_length_diff: 2,
        }
    }
}

impl RepairConfig {
    /// Edit distance threshold for an expected field name of `len` characters.
    pub fn distance_threshold(&self, len: usize) -> usize {
        if len <= self.short_key_len {
            self.short_key_max_distance
        } else {
            self.long_key_max_distance
        }
    }

    /// Validates this configuration.
    ///
    /// Checks:
    /// - `short_key_len` must be greater than 0
    /// - `short_key_max_distance` must be <= `long_key_max_distance`
    /// - `max_length_diff` must be <= `long_key_max_distance`
    pub fn validate(&self) -> Result<(), RecoverError> {
        if self.short_key_len == 0 {
            return Err(RecoverError::Config(
                "short_key_len must be greater than 0".into(),
            ));
        }
        if self.short_key_max_distance > self.long_key_max_distance {
            return Err(RecoverError::Config(
                "short_key_max_distance must be <= long_key_max_distance".into(),
            ));
        }
        if self.max_length_diff > self.long_key_max_distance {
            return Err(RecoverError::Config(
                "max_length_diff must be <= long_key_max_distance".into(),
            ));
        }
        Ok(())
    }
}
