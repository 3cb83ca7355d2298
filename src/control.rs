//! The control loop: one device, one context, forever.
//!
//! Each iteration captures and classifies a frame (polling the touch sensor
//! first), then runs the frequent tasks: directions, then another touch
//! poll. Everything is sequential and blocking, so the sensor and the
//! directions flag are serviced only between camera and network calls.
//! Nothing times out; a stalled call stalls the device.
//!
//! Failure policy within an iteration:
//!
//! - camera, image read, classifier, blob upload, touch pin: fatal to the
//!   iteration, which ends with an [`IterationError`]
//! - store publishes (announcements, touch toggles, directions results):
//!   logged, the iteration carries on

use std::{
    fs, io,
    path::PathBuf,
    thread,
    time::Duration,
};

use jiff::Timestamp;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::{
    classify::{self, BlobError, BlobStore, ClassifyError, Classifier},
    directions::{self, MapsClient},
    hardware::{self, Camera, CameraError, Pin, PinError},
    model::{IterationReport, Key, LastAnnouncedLabel},
    store::{StateStore, StoreError},
    touch::{TouchDebouncer, TouchError},
};

/// Errors that end an iteration early.
#[derive(Debug, thiserror::Error)]
pub enum IterationError {
    #[error("touch sensor: {0}")]
    Pin(#[from] PinError),

    #[error("camera: {0}")]
    Camera(#[from] CameraError),

    #[error("failed to read {}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("classifier: {0}")]
    Classify(#[from] ClassifyError),

    #[error("frame archive: {0}")]
    Blob(#[from] BlobError),
}

/// The collaborators the loop drives.
pub struct Services {
    pub store: Box<dyn StateStore>,
    pub pin: Box<dyn Pin>,
    pub camera: Box<dyn Camera>,
    pub maps: Box<dyn MapsClient>,
    pub classifier: Box<dyn Classifier>,
    pub blobs: Box<dyn BlobStore>,
}

/// Fixed parameters of every iteration.
#[derive(Debug, Clone)]
pub struct LoopSettings {
    pub image_path: PathBuf,
    pub score_threshold: f64,
    pub blob_object: String,
    /// Pause after each iteration. Zero runs iterations back-to-back.
    pub iteration_delay: Duration,
}

/// All mutable device state, owned in one place.
pub struct ControlLoop {
    services: Services,
    settings: LoopSettings,
    touch: TouchDebouncer,
    last_label: LastAnnouncedLabel,
}

impl ControlLoop {
    /// Seed the touch debouncer and clear any directions request left over
    /// from before the device started.
    pub fn start(services: Services, settings: LoopSettings) -> Result<Self, StoreError> {
        let touch = TouchDebouncer::start(&*services.store)?;
        services
            .store
            .put(Key::DIRECTIONS_TRIGGER, &Value::Bool(false))?;

        info!(original = touch.original(), "device started");
        Ok(Self {
            services,
            settings,
            touch,
            last_label: LastAnnouncedLabel::default(),
        })
    }

    #[cfg(test)]
    pub fn last_label(&self) -> &LastAnnouncedLabel {
        &self.last_label
    }

    /// Run iterations until the process is killed.
    pub fn run(&mut self) -> ! {
        let delay = self.settings.iteration_delay;
        loop {
            if let Err(e) = self.tick() {
                error!("iteration failed: {e}");
            }
            if !delay.is_zero() {
                thread::sleep(delay);
            }
        }
    }

    /// One iteration: capture and classify, then the frequent tasks.
    pub fn tick(&mut self) -> Result<IterationReport, IterationError> {
        let mut report = IterationReport::new(Timestamp::now());
        self.capture_and_classify(&mut report)?;
        self.frequent_tasks(&mut report)?;
        Ok(report)
    }

    /// Poll touch, take a photo, classify it, announce news, archive the frame.
    pub fn capture_and_classify(
        &mut self,
        report: &mut IterationReport,
    ) -> Result<(), IterationError> {
        self.poll_touch(report)?;

        let path = &self.settings.image_path;
        hardware::capture_frame(&mut *self.services.camera, path)?;

        let image = fs::read(path).map_err(|source| IterationError::Image {
            path: path.clone(),
            source,
        })?;

        let predictions = self
            .services
            .classifier
            .predict(&image, self.settings.score_threshold)?;
        for prediction in &predictions {
            info!(label = %prediction.label, score = prediction.score, "prediction");
        }

        report.announced = classify::announce(
            &*self.services.store,
            &mut self.last_label,
            &predictions,
        );
        report.predictions = predictions;

        self.services
            .blobs
            .upload(&self.settings.blob_object, &image)?;
        Ok(())
    }

    /// Directions, then touch.
    pub fn frequent_tasks(&mut self, report: &mut IterationReport) -> Result<(), IterationError> {
        match directions::resolve(&*self.services.store, &*self.services.maps) {
            Ok(outcome) => report.directions = outcome,
            Err(e) => warn!("directions: {e}"),
        }
        self.poll_touch(report)?;
        Ok(())
    }

    fn poll_touch(&mut self, report: &mut IterationReport) -> Result<(), PinError> {
        match self
            .touch
            .poll(&mut *self.services.pin, &*self.services.store)
        {
            Ok(Some(toggle)) => report.toggles.push(toggle),
            Ok(None) => {}
            Err(TouchError::Pin(e)) => return Err(e),
            Err(TouchError::Store(e)) => warn!("failed to publish touch toggle: {e}"),
        }
        Ok(())
    }
}
