use serde::{Deserialize, Serialize};

/// Point-in-time copy of the aggregation state, handed to the UI.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AggregationSnapshot {
    /// Cycle counter; bumps on every refresh that gets past track resolution.
    pub generation: u64,
    /// Share of completion calls that returned, in `[0, 1]`.
    pub completed_fraction: f64,
    pub document: String,
    /// Last completion failure of the current cycle.
    pub last_error: Option<String>,
    /// Failed refresh; the document shown is still the previous one.
    pub warning: Option<String>,
    /// Links are appended and the document will not change any more.
    pub finished: bool,
}

impl AggregationSnapshot {
    pub fn percent(&self) -> u16 {
        (self.completed_fraction.clamp(0.0, 1.0) * 100.0).round() as u16
    }

    /// Banner lines to show above the document, most recent concern first.
    pub fn banners(&self) -> Vec<&str> {
        self.warning
            .as_deref()
            .into_iter()
            .chain(self.last_error.as_deref())
            .collect()
    }
}
