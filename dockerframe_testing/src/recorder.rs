//! Handler collecting dispatched frames.

use std::sync::{Arc, Mutex, PoisonError};

/// Shared log of the frames a stream dispatched.
#[derive(Debug)]
pub struct Recorder<T> {
    frames: Arc<Mutex<Vec<T>>>,
}

impl<T: Clone + Send + 'static> Recorder<T> {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            frames: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Handler appending a clone of every frame it receives.
    pub fn handler(&self) -> impl FnMut(&T) + Send + 'static {
        let frames = Arc::clone(&self.frames);
        move |frame: &T| {
            frames
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(frame.clone());
        }
    }

    /// Frames recorded so far.
    #[must_use]
    pub fn frames(&self) -> Vec<T> {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of frames recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl<T: Clone + Send + 'static> Default for Recorder<T> {
    fn default() -> Self { Self::new() }
}

impl<T> Clone for Recorder<T> {
    fn clone(&self) -> Self {
        Self {
            frames: Arc::clone(&self.frames),
        }
    }
}
