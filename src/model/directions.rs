//! Directions requests and what became of them.

use serde::Serialize;

/// Published to `maps/order/1` when no route could be produced.
pub const NO_ROUTE: &str = "NO POSSIBLE ROUTE";

/// How the route should be travelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    Walking,
}

impl TravelMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Walking => "walking",
        }
    }
}

/// A claimed directions request, ready to send to the mapping service.
///
/// The trigger flag that created it has already been cleared in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectionsRequest {
    /// `"<lat>,<long>"`, exactly as the store's values render.
    pub origin: String,
    pub destination: String,
    pub mode: TravelMode,
    pub alternatives: bool,
}

impl DirectionsRequest {
    /// A single walking route from a position to a destination.
    pub fn walking(latitude: &str, longitude: &str, destination: impl Into<String>) -> Self {
        Self {
            origin: format!("{latitude},{longitude}"),
            destination: destination.into(),
            mode: TravelMode::Walking,
            alternatives: false,
        }
    }
}

/// The result of serving one directions request.
///
/// Keeps the cause of a failure apart from what gets published;
/// both failure kinds collapse to [`NO_ROUTE`] only in [`published_text`].
///
/// [`published_text`]: DirectionsOutcome::published_text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "camelCase")]
pub enum DirectionsOutcome {
    /// Flattened step instructions of the first route.
    RouteFound(String),

    /// The service answered but had no usable route, or the request had no inputs.
    NoRoute,

    /// The service could not be reached or its answer could not be read.
    TransportError(String),
}

impl DirectionsOutcome {
    /// The text written to `maps/order/1`.
    pub fn published_text(&self) -> &str {
        match self {
            Self::RouteFound(text) => text,
            Self::NoRoute | Self::TransportError(_) => NO_ROUTE,
        }
    }
}
