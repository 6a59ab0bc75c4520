use std::fmt;
use std::sync::mpsc;

use crate::error::{Error, Result};

type Callback<T> = Box<dyn FnOnce(Result<T>) + Send + 'static>;

/// One-shot reply handle for an asynchronous control-layer request.
///
/// The handle is created on the control thread, travels with its request to
/// the render thread, and is resolved there exactly once. Dropping an
/// unresolved completion resolves it with [`Error::CancelledAtTeardown`].
pub struct Completion<T> {
    callback: Option<Callback<T>>,
}

impl<T: 'static> Completion<T> {
    /// Wraps a callback invoked with the outcome.
    pub fn new<F>(callback: F) -> Self
    where
        F: FnOnce(Result<T>) + Send + 'static,
    {
        Self {
            callback: Some(Box::new(callback)),
        }
    }

    /// A completion whose outcome nobody observes.
    pub fn ignore() -> Self {
        Self::new(|_| {})
    }

    /// A completion paired with a receiver the caller can block on.
    pub fn channel() -> (Self, mpsc::Receiver<Result<T>>)
    where
        T: Send,
    {
        let (tx, rx) = mpsc::channel();
        let completion = Self::new(move |outcome| {
            // The waiter may have given up; that is not our problem.
            let _ = tx.send(outcome);
        });
        (completion, rx)
    }

    /// Delivers the outcome. Consumes the handle.
    pub fn resolve(mut self, outcome: Result<T>) {
        if let Some(callback) = self.callback.take() {
            callback(outcome);
        }
    }

    #[inline]
    pub fn succeed(self, value: T) {
        self.resolve(Ok(value));
    }

    #[inline]
    pub fn fail(self, err: Error) {
        self.resolve(Err(err));
    }

    /// Resolves with [`Error::CancelledAtTeardown`].
    #[inline]
    pub fn cancel(self) {
        self.fail(Error::CancelledAtTeardown);
    }

    /// Adapts a completion expecting `T` into one accepting `U`.
    pub fn map<U, F>(mut self, f: F) -> Completion<U>
    where
        U: 'static,
        F: FnOnce(U) -> T + Send + 'static,
    {
        match self.callback.take() {
            Some(callback) => Completion::new(move |outcome: Result<U>| callback(outcome.map(f))),
            None => Completion { callback: None },
        }
    }
}

impl<T> Drop for Completion<T> {
    fn drop(&mut self) {
        if let Some(callback) = self.callback.take() {
            log::debug!("completion dropped unresolved; cancelling");
            callback(Err(Error::CancelledAtTeardown));
        }
    }
}

impl<T> fmt::Debug for Completion<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("pending", &self.callback.is_some())
            .finish()
    }
}
