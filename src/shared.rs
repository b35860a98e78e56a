use std::sync::atomic::{AtomicI8, Ordering};
use std::sync::{Mutex, OnceLock};

use crate::overlay::Overlay;
use crate::raster::{Planes, Scene};

/// The run-status flag both threads poll. The parser owns all transitions;
/// the presenter only reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// fatal error; no window should open and the process exits non-zero
    Aborted,
    /// parsing started, scene not yet known
    Parsing,
    /// scene known, planes published, the window may open
    SceneReady,
    /// the stream ended cleanly without ever naming a scene
    Finished,
}

const STATUS_ABORTED: i8 = -1;
const STATUS_PARSING: i8 = 0;
const STATUS_SCENE_READY: i8 = 1;
const STATUS_FINISHED: i8 = 2;

/// Everything the parser worker and the presenter share. The planes are
/// published exactly once; the release store of the status flag is the
/// publication point for their base storage and dimensions. The overlay
/// strings live behind a mutex, cloned per presenter frame, last writer
/// wins.
pub struct Shared {
    status: AtomicI8,
    planes: OnceLock<Planes>,
    overlay: Mutex<Overlay>,
}

impl Shared {
    pub fn new() -> Self {
        Shared {
            status: AtomicI8::new(STATUS_PARSING),
            planes: OnceLock::new(),
            overlay: Mutex::new(Overlay::default()),
        }
    }

    pub fn status(&self) -> RunStatus {
        match self.status.load(Ordering::Acquire) {
            STATUS_ABORTED => RunStatus::Aborted,
            STATUS_SCENE_READY => RunStatus::SceneReady,
            STATUS_FINISHED => RunStatus::Finished,
            _ => RunStatus::Parsing,
        }
    }

    /// fatal parse error; flips the flag whatever state it was in
    pub fn abort(&self) {
        self.status.store(STATUS_ABORTED, Ordering::Release);
    }

    /// clean end-of-stream before any scene directive; the presenter has
    /// nothing to show and should not wait forever
    pub fn finish_without_scene(&self) {
        let _ = self.status.compare_exchange(
            STATUS_PARSING,
            STATUS_FINISHED,
            Ordering::Release,
            Ordering::Relaxed,
        );
    }

    /// Allocate the planes and flip the flag from 0 to 1. False means a
    /// scene was already fixed; dimensions are immutable and the second
    /// directive is ignored.
    pub fn publish_scene(&self, scene: Scene) -> bool {
        if self.planes.set(Planes::new(scene)).is_err() {
            return false;
        }
        self.status.store(STATUS_SCENE_READY, Ordering::Release);
        true
    }

    /// the planes, once published
    pub fn planes(&self) -> Option<&Planes> {
        self.planes.get()
    }

    pub fn with_overlay<T>(&self, f: impl FnOnce(&mut Overlay) -> T) -> T {
        let mut overlay = self.overlay.lock().unwrap();
        f(&mut overlay)
    }

    pub fn overlay_snapshot(&self) -> Overlay {
        self.overlay.lock().unwrap().clone()
    }

    /// every diagnostic goes to the log sink and the on-screen ring
    pub fn warn(&self, message: &str) {
        eprintln!("Warning: {}", message);
        self.with_overlay(|overlay| overlay.errors.push(message));
    }

    pub fn error(&self, message: &str) {
        eprintln!("Error: {}", message);
        self.with_overlay(|overlay| overlay.errors.push(message));
    }
}

impl Default for Shared {
    fn default() -> Self {
        Self::new()
    }
}
