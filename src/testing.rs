//! In-memory stand-ins for the store, hardware, and remote services.
//!
//! Each fake is `Clone` over shared state, so a test can hand one copy to
//! the code under test and inspect another afterwards.

use std::{
    cell::RefCell,
    collections::{HashMap, HashSet, VecDeque},
    fs,
    path::{Path, PathBuf},
    rc::Rc,
};

use reqwest::StatusCode;
use serde_json::{Value, json};

use crate::{
    classify::{BlobError, BlobStore, ClassifyError, Classifier},
    directions::{DirectionsResponse, MapsClient, MapsError},
    hardware::{Camera, CameraError, Pin, PinError},
    model::{DirectionsRequest, Key, Prediction},
    store::{self, StateStore, StoreError},
};

// ── Store ──

#[derive(Default)]
struct MemoryInner {
    values: HashMap<Key, Value>,
    writes: Vec<(Key, Value)>,
    failing_gets: HashSet<Key>,
    failing_puts: HashSet<Key>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<MemoryInner>>,
}

impl MemoryStore {
    /// Seed a value without recording a write.
    pub fn set(&self, key: Key, value: Value) {
        self.inner.borrow_mut().values.insert(key, value);
    }

    pub fn value(&self, key: Key) -> Option<Value> {
        self.inner.borrow().values.get(&key).cloned()
    }

    /// Every successful put, in order.
    pub fn writes(&self) -> Vec<(Key, Value)> {
        self.inner.borrow().writes.clone()
    }

    pub fn writes_to(&self, key: Key) -> Vec<Value> {
        self.inner
            .borrow()
            .writes
            .iter()
            .filter(|(k, _)| *k == key)
            .map(|(_, v)| v.clone())
            .collect()
    }

    pub fn fail_gets(&self, key: Key) {
        self.inner.borrow_mut().failing_gets.insert(key);
    }

    pub fn fail_puts(&self, key: Key) {
        self.inner.borrow_mut().failing_puts.insert(key);
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: Key) -> store::Result<Option<Value>> {
        let inner = self.inner.borrow();
        if inner.failing_gets.contains(&key) {
            return Err(StoreError::Status {
                key,
                status: StatusCode::SERVICE_UNAVAILABLE,
            });
        }
        Ok(inner.values.get(&key).cloned())
    }

    fn put(&self, key: Key, value: &Value) -> store::Result<()> {
        let mut inner = self.inner.borrow_mut();
        if inner.failing_puts.contains(&key) {
            return Err(StoreError::Status {
                key,
                status: StatusCode::SERVICE_UNAVAILABLE,
            });
        }
        inner.values.insert(key, value.clone());
        inner.writes.push((key, value.clone()));
        Ok(())
    }
}

// ── Pin ──

/// Replays scripted readings, then holds the last one.
#[derive(Clone)]
pub struct FakePin {
    readings: Rc<RefCell<VecDeque<bool>>>,
    last: Rc<RefCell<bool>>,
    broken: bool,
}

impl FakePin {
    pub fn new(readings: impl IntoIterator<Item = bool>) -> Self {
        Self {
            readings: Rc::new(RefCell::new(readings.into_iter().collect())),
            last: Rc::new(RefCell::new(false)),
            broken: false,
        }
    }

    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::new([])
        }
    }

    pub fn remaining(&self) -> usize {
        self.readings.borrow().len()
    }
}

impl Pin for FakePin {
    fn read(&mut self) -> Result<bool, PinError> {
        if self.broken {
            return Err(PinError::Value {
                path: PathBuf::from("/fake/gpio11/value"),
                value: "?".into(),
            });
        }
        let mut last = self.last.borrow_mut();
        if let Some(reading) = self.readings.borrow_mut().pop_front() {
            *last = reading;
        }
        Ok(*last)
    }
}

// ── Camera ──

#[derive(Default)]
struct CameraCounts {
    acquired: usize,
    released: usize,
}

/// Writes a fixed frame, or fails every capture.
#[derive(Clone)]
pub struct FakeCamera {
    frame: Option<Vec<u8>>,
    counts: Rc<RefCell<CameraCounts>>,
}

impl FakeCamera {
    pub fn new(frame: Vec<u8>) -> Self {
        Self {
            frame: Some(frame),
            counts: Rc::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            frame: None,
            counts: Rc::default(),
        }
    }

    pub fn acquired(&self) -> usize {
        self.counts.borrow().acquired
    }

    pub fn released(&self) -> usize {
        self.counts.borrow().released
    }
}

impl Camera for FakeCamera {
    fn acquire(&mut self) -> Result<(), CameraError> {
        self.counts.borrow_mut().acquired += 1;
        Ok(())
    }

    fn capture(&mut self, path: &Path) -> Result<(), CameraError> {
        let Some(frame) = &self.frame else {
            return Err(CameraError::Failed {
                program: "fake".into(),
                stderr: "no camera attached".into(),
            });
        };
        fs::write(path, frame).map_err(|source| CameraError::Spawn {
            program: "fake".into(),
            source,
        })
    }

    fn release(&mut self) {
        self.counts.borrow_mut().released += 1;
    }
}

// ── Maps ──

#[derive(Clone)]
enum MapsReply {
    Steps(Vec<String>),
    Body(Value),
    Unavailable,
    Malformed,
}

/// Answers every directions query the same way and records the queries.
#[derive(Clone)]
pub struct FakeMaps {
    reply: MapsReply,
    requests: Rc<RefCell<Vec<DirectionsRequest>>>,
}

impl FakeMaps {
    fn with(reply: MapsReply) -> Self {
        Self {
            reply,
            requests: Rc::default(),
        }
    }

    pub fn steps<S: Into<String>>(steps: impl IntoIterator<Item = S>) -> Self {
        Self::with(MapsReply::Steps(steps.into_iter().map(Into::into).collect()))
    }

    pub fn body(body: Value) -> Self {
        Self::with(MapsReply::Body(body))
    }

    pub fn unavailable() -> Self {
        Self::with(MapsReply::Unavailable)
    }

    pub fn malformed() -> Self {
        Self::with(MapsReply::Malformed)
    }

    pub fn requests(&self) -> Vec<DirectionsRequest> {
        self.requests.borrow().clone()
    }
}

impl MapsClient for FakeMaps {
    fn directions(&self, request: &DirectionsRequest) -> Result<DirectionsResponse, MapsError> {
        self.requests.borrow_mut().push(request.clone());
        let body = match &self.reply {
            MapsReply::Steps(steps) => {
                let steps: Vec<Value> = steps
                    .iter()
                    .map(|s| json!({ "html_instructions": s }))
                    .collect();
                json!({ "status": "OK", "routes": [{ "legs": [{ "steps": steps }] }] })
            }
            MapsReply::Body(body) => body.clone(),
            MapsReply::Unavailable => {
                return Err(MapsError::Status(StatusCode::SERVICE_UNAVAILABLE));
            }
            MapsReply::Malformed => {
                return Err(serde_json::from_str::<Value>("{\"routes\":").unwrap_err().into());
            }
        };
        Ok(serde_json::from_value(body)?)
    }
}

// ── Classifier ──

#[derive(Default)]
struct ClassifierLog {
    images: Vec<Vec<u8>>,
    thresholds: Vec<f64>,
}

/// Replays scripted prediction lists, one per call; empty once exhausted.
#[derive(Clone)]
pub struct FakeClassifier {
    responses: Rc<RefCell<VecDeque<Vec<Prediction>>>>,
    log: Rc<RefCell<ClassifierLog>>,
    failing: bool,
}

impl FakeClassifier {
    pub fn new(responses: impl IntoIterator<Item = Vec<Prediction>>) -> Self {
        Self {
            responses: Rc::new(RefCell::new(responses.into_iter().collect())),
            log: Rc::default(),
            failing: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::new([])
        }
    }

    pub fn calls(&self) -> usize {
        self.log.borrow().images.len()
    }

    pub fn images(&self) -> Vec<Vec<u8>> {
        self.log.borrow().images.clone()
    }

    pub fn thresholds(&self) -> Vec<f64> {
        self.log.borrow().thresholds.clone()
    }
}

impl Classifier for FakeClassifier {
    fn predict(&self, image: &[u8], score_threshold: f64) -> Result<Vec<Prediction>, ClassifyError> {
        let mut log = self.log.borrow_mut();
        log.images.push(image.to_vec());
        log.thresholds.push(score_threshold);
        if self.failing {
            return Err(ClassifyError::Status {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: "model unavailable".into(),
            });
        }
        Ok(self.responses.borrow_mut().pop_front().unwrap_or_default())
    }
}

// ── Blobs ──

#[derive(Clone, Default)]
pub struct FakeBlobs {
    uploads: Rc<RefCell<Vec<(String, Vec<u8>)>>>,
    failing: bool,
}

impl FakeBlobs {
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn uploads(&self) -> Vec<(String, Vec<u8>)> {
        self.uploads.borrow().clone()
    }
}

impl BlobStore for FakeBlobs {
    fn upload(&self, object: &str, bytes: &[u8]) -> Result<(), BlobError> {
        if self.failing {
            return Err(BlobError::Status(StatusCode::FORBIDDEN));
        }
        self.uploads
            .borrow_mut()
            .push((object.to_string(), bytes.to_vec()));
        Ok(())
    }
}
