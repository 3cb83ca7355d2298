//! Touch sensor debouncing against the remotely mirrored pressed flag.
//!
//! The debouncer remembers one boolean, `original`, seeded at startup from
//! `restart/triggeredPressed`. On startup the device writes the opposite of
//! that value back, announcing that it is running.
//!
//! A poll fires when the live pin reading *equals* `original`. On firing,
//! `original` flips and the negation of the new `original` (which is the
//! reading itself) is published. A reading that differs from `original`
//! does nothing. This is the reverse of a conventional debouncer, which
//! fires when the reading leaves the stable value. The equality test is
//! what the device has always done and it is kept as-is until its intent
//! is confirmed.
//!
//! Consecutive edges always publish alternating values: after firing on
//! `r`, the next edge needs a reading of `!r`. Detection relies on polling
//! often relative to how long a press lasts.

use serde_json::Value;
use tracing::{info, warn};

use crate::{
    hardware::{Pin, PinError},
    model::{Key, Toggle},
    store::{StateStore, StoreError},
};

/// Errors from one debounce poll.
#[derive(Debug, thiserror::Error)]
pub enum TouchError {
    #[error(transparent)]
    Pin(#[from] PinError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Edge detector for the touch sensor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TouchDebouncer {
    original: bool,
}

impl TouchDebouncer {
    /// Seed from the store and write back the opposite of what it held.
    ///
    /// An absent or non-boolean record counts as `false`.
    pub fn start(store: &dyn StateStore) -> Result<Self, StoreError> {
        let recorded = match store.get(Key::TRIGGERED_PRESSED)? {
            Some(Value::Bool(b)) => b,
            None => false,
            Some(other) => {
                warn!(key = %Key::TRIGGERED_PRESSED, %other, "not a boolean, assuming false");
                false
            }
        };

        store.put(Key::TRIGGERED_PRESSED, &Value::Bool(!recorded))?;
        Ok(Self { original: recorded })
    }

    #[cfg(test)]
    pub fn with_original(original: bool) -> Self {
        Self { original }
    }

    pub fn original(&self) -> bool {
        self.original
    }

    /// Read the pin once and publish a toggle if this reading is an edge.
    ///
    /// The local flip happens before the publish, so a failed publish still
    /// consumes the edge.
    pub fn poll(
        &mut self,
        pin: &mut dyn Pin,
        store: &dyn StateStore,
    ) -> Result<Option<Toggle>, TouchError> {
        let pressed = pin.read()?;
        if pressed != self.original {
            return Ok(None);
        }

        self.original = !self.original;
        let published = !self.original;
        store.put(Key::TRIGGERED_PRESSED, &Value::Bool(published))?;

        info!(published, "touch toggled");
        Ok(Some(Toggle { published }))
    }
}
