//! Remote store keys.
//!
//! The store is a two-level key space: a namespace and a path within it.
//! Every key the device reads or writes is declared here.

use std::fmt;

/// Top-level namespace in the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Touch sensor state.
    Restart,

    /// Directions requests and results.
    Maps,

    /// Classification announcements.
    Sight,
}

impl Namespace {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Restart => "restart",
            Self::Maps => "maps",
            Self::Sight => "sight",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A namespace plus a path within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key {
    pub namespace: Namespace,
    pub path: &'static str,
}

impl Key {
    /// Mirrored debounced touch flag (read/write, bool).
    pub const TRIGGERED_PRESSED: Self = Self::new(Namespace::Restart, "triggeredPressed");

    /// "Directions requested" flag (read/write, bool).
    pub const DIRECTIONS_TRIGGER: Self = Self::new(Namespace::Maps, "trigger/1");

    /// Current device latitude (read, number).
    pub const LATITUDE: Self = Self::new(Namespace::Maps, "latitude");

    /// Current device longitude (read, number).
    pub const LONGITUDE: Self = Self::new(Namespace::Maps, "longitude");

    /// Requested destination (read, string).
    pub const DESTINATION: Self = Self::new(Namespace::Maps, "destination");

    /// Resolved instruction text or the no-route sentinel (write, string).
    pub const ORDER: Self = Self::new(Namespace::Maps, "order/1");

    /// Newly announced classification label (write, string).
    pub const SPEECH: Self = Self::new(Namespace::Sight, "speech/1");

    pub const fn new(namespace: Namespace, path: &'static str) -> Self {
        Self { namespace, path }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.path)
    }
}
