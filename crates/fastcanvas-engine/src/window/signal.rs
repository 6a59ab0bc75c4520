use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::sync::Completion;

/// Surface event forwarded from the event-loop thread to the render thread.
pub enum SurfaceSignal<C> {
    /// A new GPU context for the window.
    Create(C),
    /// Resolved once the render thread has dropped its context.
    Lose(Completion<()>),
    Resize { width: u32, height: u32 },
    Destroy,
}

impl<C> SurfaceSignal<C> {
    pub fn name(&self) -> &'static str {
        match self {
            SurfaceSignal::Create(_) => "create",
            SurfaceSignal::Lose(_) => "lose",
            SurfaceSignal::Resize { .. } => "resize",
            SurfaceSignal::Destroy => "destroy",
        }
    }
}

/// Mailbox the render thread sleeps on between cycles.
///
/// Signals are delivered in order. Consecutive resizes collapse into the
/// latest one. Once closed, queued and later signals are dropped, which
/// cancels any acknowledgement they carry.
pub struct RenderSignal<C> {
    mu: Mutex<Mailbox<C>>,
    cv: Condvar,
}

struct Mailbox<C> {
    queue: VecDeque<SurfaceSignal<C>>,
    closed: bool,
}

impl<C> Default for RenderSignal<C> {
    fn default() -> Self {
        Self {
            mu: Mutex::new(Mailbox {
                queue: VecDeque::new(),
                closed: false,
            }),
            cv: Condvar::new(),
        }
    }
}

impl<C> RenderSignal<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn send(&self, signal: SurfaceSignal<C>) {
        let mut mailbox = self.mu.lock();
        if mailbox.closed {
            log::debug!("render thread gone; dropping {} signal", signal.name());
            return;
        }
        if let SurfaceSignal::Resize { .. } = signal {
            if let Some(SurfaceSignal::Resize { .. }) = mailbox.queue.back() {
                mailbox.queue.pop_back();
            }
        }
        mailbox.queue.push_back(signal);
        self.cv.notify_one();
    }

    /// Takes every queued signal without waiting.
    pub fn drain(&self) -> Vec<SurfaceSignal<C>> {
        self.mu.lock().queue.drain(..).collect()
    }

    /// Waits until a signal arrives, or `timeout` elapses when one is given.
    pub fn wait(&self, timeout: Option<Duration>) -> Vec<SurfaceSignal<C>> {
        let mut mailbox = self.mu.lock();
        if mailbox.queue.is_empty() {
            match timeout {
                Some(timeout) => {
                    self.cv.wait_for(&mut mailbox, timeout);
                }
                None => {
                    while mailbox.queue.is_empty() && !mailbox.closed {
                        self.cv.wait(&mut mailbox);
                    }
                }
            }
        }
        mailbox.queue.drain(..).collect()
    }

    /// Stops delivery. Called by the render thread on its way out.
    pub fn close(&self) {
        let dropped: Vec<_> = {
            let mut mailbox = self.mu.lock();
            mailbox.closed = true;
            mailbox.queue.drain(..).collect()
        };
        // Outside the lock: dropping an acknowledgement runs its callback.
        drop(dropped);
        self.cv.notify_all();
    }
}
