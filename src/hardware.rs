//! Hardware primitives: the touch sensor pin and the camera.
//!
//! Both are traits so the control loop can run against fakes.
//! The real pin is a Linux sysfs GPIO input; the real camera is an
//! external still-capture command that writes a JPEG to a path.

use std::{
    fs, io,
    path::{Path, PathBuf},
    process::Command,
};

/// A digital input.
pub trait Pin {
    /// Read the current level.
    fn read(&mut self) -> Result<bool, PinError>;
}

/// Errors reading a GPIO pin.
#[derive(Debug, thiserror::Error)]
pub enum PinError {
    #[error("failed to {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unexpected value {value:?} in {}", path.display())]
    Value { path: PathBuf, value: String },
}

/// A GPIO input exposed through `/sys/class/gpio`.
#[derive(Debug)]
pub struct SysfsPin {
    value_path: PathBuf,
}

impl SysfsPin {
    /// Export `pin` under `gpio_root` if it isn't already, and make it an input.
    pub fn input(gpio_root: &Path, pin: u32) -> Result<Self, PinError> {
        let dir = gpio_root.join(format!("gpio{pin}"));

        if !dir.exists() {
            let export = gpio_root.join("export");
            fs::write(&export, pin.to_string()).map_err(|source| PinError::Io {
                action: "write",
                path: export,
                source,
            })?;
        }

        let direction = dir.join("direction");
        fs::write(&direction, "in").map_err(|source| PinError::Io {
            action: "write",
            path: direction,
            source,
        })?;

        Ok(Self {
            value_path: dir.join("value"),
        })
    }
}

impl Pin for SysfsPin {
    fn read(&mut self) -> Result<bool, PinError> {
        let raw = fs::read_to_string(&self.value_path).map_err(|source| PinError::Io {
            action: "read",
            path: self.value_path.clone(),
            source,
        })?;

        match raw.trim() {
            "0" => Ok(false),
            "1" => Ok(true),
            other => Err(PinError::Value {
                path: self.value_path.clone(),
                value: other.to_string(),
            }),
        }
    }
}

/// A camera that can be held exclusively and write one frame to a path.
pub trait Camera {
    /// Take exclusive hold of the device.
    fn acquire(&mut self) -> Result<(), CameraError>;

    /// Write one frame to `path`. Only called while held.
    fn capture(&mut self, path: &Path) -> Result<(), CameraError>;

    /// Give the device back. Must be safe to call after a failed capture.
    fn release(&mut self);
}

/// Errors capturing a frame.
#[derive(Debug, thiserror::Error)]
pub enum CameraError {
    #[error("camera is already in use")]
    Busy,

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} failed: {stderr}")]
    Failed { program: String, stderr: String },

    #[error("camera produced no image at {}", path.display())]
    Missing { path: PathBuf },

    #[error("failed to clear previous frame {}: {source}", path.display())]
    Clear {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Exclusive hold on a camera, released when dropped.
pub struct CameraSession<'a, C: Camera + ?Sized> {
    camera: &'a mut C,
}

impl<'a, C: Camera + ?Sized> CameraSession<'a, C> {
    pub fn open(camera: &'a mut C) -> Result<Self, CameraError> {
        camera.acquire()?;
        Ok(Self { camera })
    }

    pub fn capture(&mut self, path: &Path) -> Result<(), CameraError> {
        self.camera.capture(path)
    }
}

impl<C: Camera + ?Sized> Drop for CameraSession<'_, C> {
    fn drop(&mut self) {
        self.camera.release();
    }
}

/// Acquire the camera, write one frame to `path`, release the camera.
///
/// The camera is released whether or not the capture succeeded.
pub fn capture_frame<C: Camera + ?Sized>(camera: &mut C, path: &Path) -> Result<(), CameraError> {
    let mut session = CameraSession::open(camera)?;
    session.capture(path)
}

/// A camera driven by an external capture command such as `raspistill`.
///
/// The output path is appended as the final argument.
#[derive(Debug)]
pub struct CommandCamera {
    program: String,
    args: Vec<String>,
    held: bool,
}

impl CommandCamera {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            held: false,
        }
    }
}

impl Camera for CommandCamera {
    fn acquire(&mut self) -> Result<(), CameraError> {
        if self.held {
            return Err(CameraError::Busy);
        }
        self.held = true;
        Ok(())
    }

    fn capture(&mut self, path: &Path) -> Result<(), CameraError> {
        // A command that exits cleanly without writing must not pass on the
        // previous iteration's frame.
        match fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(CameraError::Clear {
                    path: path.to_path_buf(),
                    source,
                });
            }
        }

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .output()
            .map_err(|source| CameraError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CameraError::Failed {
                program: self.program.clone(),
                stderr: stderr.trim().to_string(),
            });
        }

        if !path.is_file() {
            return Err(CameraError::Missing {
                path: path.to_path_buf(),
            });
        }
        Ok(())
    }

    fn release(&mut self) {
        self.held = false;
    }
}
