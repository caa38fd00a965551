use serde::{Deserialize, Serialize};

/// One time step of one breath cycle, as found in the uploaded CSV
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BreathRow {
    pub id: u64,
    pub breath_id: u64,

    // Lung attributes
    #[serde(rename = "R")]
    pub r: f64,
    #[serde(rename = "C")]
    pub c: f64,

    pub time_step: f64,

    // Valve controls
    pub u_in: f64,
    pub u_out: f64,

    // Target, absent in test files
    #[serde(default)]
    pub pressure: Option<f64>,
}

impl BreathRow {
    /// Physics-style reference pressure used to sanity check predictions.
    /// `None` when compliance is not positive.
    pub fn reference_pressure(&self) -> Option<f64> {
        if self.c <= 0.0 {
            return None;
        }
        Some(self.r * self.u_in * 0.1 + (1.0 / self.c) * self.time_step * 0.5)
    }
}
