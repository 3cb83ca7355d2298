//! Core data model for SiteSeer.
//!
//! These types describe what flows through the control loop:
//! remote store keys, directions requests and their outcomes,
//! classifier predictions, and the per-iteration report.

mod directions;
mod key;
mod prediction;
mod report;

#[cfg(test)]
pub use directions::NO_ROUTE;
pub use directions::{DirectionsOutcome, DirectionsRequest};
pub use key::Key;
pub use prediction::{LastAnnouncedLabel, Prediction};
pub use report::{IterationReport, Toggle};
