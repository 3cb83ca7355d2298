//! Classifier predictions and the last announced label.

use serde::Serialize;

/// One labelled prediction from the classification service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub label: String,
    pub score: f64,
}

impl Prediction {
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// The label most recently published to `sight/speech/1`.
///
/// Starts empty, so the first prediction is always announced.
/// Overwritten on every announcement, never cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LastAnnouncedLabel(String);

impl LastAnnouncedLabel {
    #[cfg(test)]
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    #[cfg(test)]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `label` would be news.
    pub fn differs(&self, label: &str) -> bool {
        self.0 != label
    }

    pub fn set(&mut self, label: &str) {
        label.clone_into(&mut self.0);
    }
}
