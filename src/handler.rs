//! Ordered registry of frame callbacks.
//!
//! Handlers run synchronously in registration order for every decoded
//! frame. There is no de-duplication and no removal.

use std::{error::Error, fmt};

/// Error returned by a fallible handler. It aborts the drain.
pub type HandlerError = Box<dyn Error + Send + Sync>;

type BoxedHandler<T> = Box<dyn FnMut(&T) -> Result<(), HandlerError> + Send>;

/// Callbacks subscribed to one frame stream.
pub struct HandlerRegistry<T> {
    handlers: Vec<BoxedHandler<T>>,
}

impl<T> HandlerRegistry<T> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self { Self { handlers: Vec::new() } }

    /// Append an infallible handler.
    pub fn push<F>(&mut self, mut handler: F)
    where
        F: FnMut(&T) + Send + 'static,
    {
        self.handlers.push(Box::new(move |frame| {
            handler(frame);
            Ok(())
        }));
    }

    /// Append a handler whose error stops dispatch.
    pub fn push_fallible<F>(&mut self, handler: F)
    where
        F: FnMut(&T) -> Result<(), HandlerError> + Send + 'static,
    {
        self.handlers.push(Box::new(handler));
    }

    /// Hand `frame` to every handler in registration order.
    ///
    /// # Errors
    ///
    /// Returns the first handler error; later handlers do not see the frame.
    pub fn dispatch(&mut self, frame: &T) -> Result<(), HandlerError> {
        self.handlers.iter_mut().try_for_each(|handler| handler(frame))
    }

    /// Number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize { self.handlers.len() }

    /// Returns true if no handler is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.handlers.is_empty() }
}

impl<T> Default for HandlerRegistry<T> {
    fn default() -> Self { Self::new() }
}

impl<T> fmt::Debug for HandlerRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
