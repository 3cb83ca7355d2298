//! Output formatting for CLI display.

use crate::model::{DirectionsOutcome, IterationReport};

/// One-line summary of an iteration.
pub(super) fn describe_report(report: &IterationReport) -> String {
    let mut parts = vec![format!("{} prediction(s)", report.predictions.len())];

    if report.announced.is_empty() {
        parts.push("nothing announced".to_string());
    } else {
        parts.push(format!("announced {}", report.announced.join(", ")));
    }

    if !report.toggles.is_empty() {
        parts.push(format!("{} touch toggle(s)", report.toggles.len()));
    }

    if let Some(outcome) = &report.directions {
        parts.push(format!("directions: {}", describe_outcome(outcome)));
    }

    parts.join("; ")
}

/// What a directions request produced, cause included.
pub(super) fn describe_outcome(outcome: &DirectionsOutcome) -> String {
    match outcome {
        DirectionsOutcome::RouteFound(text) => text.clone(),
        DirectionsOutcome::NoRoute => format!("{} (no route)", outcome.published_text()),
        DirectionsOutcome::TransportError(e) => format!("{} ({e})", outcome.published_text()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::Timestamp;

    use crate::model::{Prediction, Toggle};

    #[test]
    fn describes_quiet_iteration() {
        let report = IterationReport::new(Timestamp::UNIX_EPOCH);
        assert_eq!(describe_report(&report), "0 prediction(s); nothing announced");
    }

    #[test]
    fn describes_busy_iteration() {
        let mut report = IterationReport::new(Timestamp::UNIX_EPOCH);
        report.predictions = vec![Prediction::new("cone", 0.9)];
        report.announced = vec!["cone".into()];
        report.toggles = vec![Toggle { published: true }];
        report.directions = Some(DirectionsOutcome::RouteFound("Arrive.".into()));

        assert_eq!(
            describe_report(&report),
            "1 prediction(s); announced cone; 1 touch toggle(s); directions: Arrive."
        );
    }

    #[test]
    fn failure_keeps_cause_visible() {
        let outcome = DirectionsOutcome::TransportError("connection refused".into());
        assert_eq!(
            describe_outcome(&outcome),
            "NO POSSIBLE ROUTE (connection refused)"
        );
    }
}
