//! What happened during one loop iteration.

use jiff::Timestamp;
use serde::Serialize;

use super::{DirectionsOutcome, Prediction};

/// A detected touch edge: the value published to `restart/triggeredPressed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Toggle {
    pub published: bool,
}

/// Everything one iteration observed and published.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IterationReport {
    pub started_at: Timestamp,

    /// Touch edges, in poll order.
    pub toggles: Vec<Toggle>,

    /// Predictions in service order.
    pub predictions: Vec<Prediction>,

    /// Labels published to `sight/speech/1`.
    pub announced: Vec<String>,

    /// Set only when a directions request was pending.
    pub directions: Option<DirectionsOutcome>,
}

impl IterationReport {
    pub fn new(started_at: Timestamp) -> Self {
        Self {
            started_at,
            toggles: Vec::new(),
            predictions: Vec::new(),
            announced: Vec::new(),
            directions: None,
        }
    }
}
