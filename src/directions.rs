//! Walking directions on demand.
//!
//! An external actor sets `maps/trigger/1`. The resolver claims the request
//! by clearing the flag, reads the device position and destination from the
//! store, asks the mapping service for a single walking route, and publishes
//! the route's step instructions (or the `NO POSSIBLE ROUTE` sentinel) to
//! `maps/order/1`.
//!
//! The trigger counts as set when it is `true` or the number `1`.
//! Anything else, including a missing flag, is idle.
//!
//! The claim is not atomic. A trigger set again between the read and the
//! clear is lost, and the store offers no compare-and-swap to prevent it.

use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    model::{DirectionsOutcome, DirectionsRequest, Key},
    store::{StateStore, StoreError},
};

/// Errors from the mapping service.
#[derive(Debug, thiserror::Error)]
pub enum MapsError {
    #[error("directions request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("directions service returned HTTP {0}")]
    Status(StatusCode),

    #[error("malformed directions response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A service that can route between two places.
pub trait MapsClient {
    fn directions(&self, request: &DirectionsRequest) -> Result<DirectionsResponse, MapsError>;
}

/// JSON shape returned by the Directions API. Only the fields used are kept.
#[derive(Debug, Default, Deserialize)]
pub struct DirectionsResponse {
    #[serde(default)]
    pub status: String,

    #[serde(default)]
    pub routes: Vec<Route>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Route {
    #[serde(default)]
    pub legs: Vec<Leg>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Leg {
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
pub struct Step {
    pub html_instructions: String,
}

impl DirectionsResponse {
    /// Step instructions of the first leg of the first route, concatenated
    /// in route order with no separators.
    ///
    /// `None` when there is no route, no leg, or no steps.
    pub fn instructions(&self) -> Option<String> {
        let steps = &self.routes.first()?.legs.first()?.steps;
        if steps.is_empty() {
            return None;
        }
        Some(steps.iter().map(|s| s.html_instructions.as_str()).collect())
    }
}

/// Reduce a mapping-service result to an outcome. Never fails.
pub fn outcome_of(result: Result<DirectionsResponse, MapsError>) -> DirectionsOutcome {
    match result {
        Ok(response) => match response.instructions() {
            Some(text) => DirectionsOutcome::RouteFound(text),
            None => {
                debug!(status = %response.status, "no usable route");
                DirectionsOutcome::NoRoute
            }
        },
        Err(e) => DirectionsOutcome::TransportError(e.to_string()),
    }
}

/// Serve one directions request if the trigger flag is set.
///
/// Returns `Ok(None)` without side effects when no request is pending.
/// Mapping failures never escape: they become the sentinel. Store failures
/// do: a failed read of the inputs abandons the request (the trigger has
/// already been cleared), and a failed publish is returned to the caller.
pub fn resolve(
    store: &dyn StateStore,
    maps: &dyn MapsClient,
) -> Result<Option<DirectionsOutcome>, StoreError> {
    if !store.get(Key::DIRECTIONS_TRIGGER)?.is_some_and(|v| is_set(&v)) {
        return Ok(None);
    }
    store.put(Key::DIRECTIONS_TRIGGER, &Value::Bool(false))?;

    let outcome = match read_request(store)? {
        Some(request) => {
            info!(origin = %request.origin, destination = %request.destination, "directions requested");
            outcome_of(maps.directions(&request))
        }
        None => {
            warn!("directions requested without a position or destination");
            DirectionsOutcome::NoRoute
        }
    };

    if let DirectionsOutcome::TransportError(e) = &outcome {
        warn!("directions unavailable: {e}");
    }

    let text = outcome.published_text();
    store.put(Key::ORDER, &Value::String(text.to_string()))?;
    info!(order = text, "directions published");

    Ok(Some(outcome))
}

fn is_set(trigger: &Value) -> bool {
    match trigger {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| (f - 1.0).abs() < f64::EPSILON),
        _ => false,
    }
}

/// Read position and destination. `None` if any of them is absent.
fn read_request(store: &dyn StateStore) -> Result<Option<DirectionsRequest>, StoreError> {
    let latitude = store.get_text(Key::LATITUDE)?;
    let longitude = store.get_text(Key::LONGITUDE)?;
    let destination = store.get_text(Key::DESTINATION)?;

    let (Some(latitude), Some(longitude), Some(destination)) = (latitude, longitude, destination)
    else {
        return Ok(None);
    };

    Ok(Some(DirectionsRequest::walking(
        &latitude,
        &longitude,
        destination,
    )))
}

/// The Google Directions API.
pub struct GoogleMaps {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl GoogleMaps {
    /// `endpoint` is the full JSON endpoint,
    /// e.g. `https://maps.googleapis.com/maps/api/directions/json`.
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }
}

impl MapsClient for GoogleMaps {
    fn directions(&self, request: &DirectionsRequest) -> Result<DirectionsResponse, MapsError> {
        let alternatives = if request.alternatives { "true" } else { "false" };

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("origin", request.origin.as_str()),
                ("destination", request.destination.as_str()),
                ("mode", request.mode.as_str()),
                ("alternatives", alternatives),
                ("key", self.api_key.as_str()),
            ])
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(MapsError::Status(status));
        }

        let body = response.text()?;
        Ok(serde_json::from_str(&body)?)
    }
}
