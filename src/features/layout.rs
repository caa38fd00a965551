//! Feature Layout - column order of the per-step feature vector
//!
//! The layout is baked into every trained artifact through its CRC32
//! fingerprint. Any change to names or order must bump `FEATURE_VERSION`.

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

/// Current feature layout version
pub const FEATURE_VERSION: u8 = 1;

/// Feature names in exact vector order
pub const FEATURE_LAYOUT: &[&str] = &[
    // === Current step (0-4) ===
    "R",            // 0: lung resistance
    "C",            // 1: lung compliance
    "time_step",    // 2: elapsed time within the breath
    "u_in",         // 3: inspiratory valve opening
    "u_out",        // 4: expiratory valve state

    // === Lookback (5-8), zero at breath start ===
    "prev_u_in",    // 5: u_in one step back
    "prev_u_out",   // 6: u_out one step back
    "prev2_u_in",   // 7: u_in two steps back
    "prev2_u_out",  // 8: u_out two steps back
];

/// Total number of features. Must match `FEATURE_LAYOUT.len()`.
pub const FEATURE_COUNT: usize = 9;

/// Number of prior steps folded into each vector
pub const LOOKBACK: usize = 2;

/// CRC32 of the version byte and the ordered feature names
pub fn layout_hash() -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(&[FEATURE_VERSION]);

    for name in FEATURE_LAYOUT {
        hasher.update(name.as_bytes());
        hasher.update(&[0]);
    }

    hasher.finalize()
}

/// Layout description reported alongside a trained model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub version: u8,
    pub hash: u32,
    pub feature_count: usize,
    pub feature_names: Vec<String>,
}

impl LayoutInfo {
    pub fn current() -> Self {
        Self {
            version: FEATURE_VERSION,
            hash: layout_hash(),
            feature_count: FEATURE_COUNT,
            feature_names: FEATURE_LAYOUT.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn is_current(&self) -> bool {
        self.version == FEATURE_VERSION && self.hash == layout_hash()
    }
}

impl Default for LayoutInfo {
    fn default() -> Self {
        Self::current()
    }
}
