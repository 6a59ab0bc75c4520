use std::collections::VecDeque;
use std::fmt;

use parking_lot::Mutex;

use super::Completion;

/// Acknowledgement returned when a frame request is accepted.
///
/// Tickets are handed out in submission order and never reused.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameTicket(pub u64);

/// A control-thread caller waiting for the next completed frame.
///
/// Resolved with the index of the frame that satisfied it.
#[derive(Debug)]
pub struct FrameSyncRequest {
    pub ticket: FrameTicket,
    completion: Completion<u64>,
}

#[derive(Default)]
struct FrameSyncState {
    pending: VecDeque<FrameSyncRequest>,
    next_ticket: u64,
    closed: bool,
}

/// Requests waiting on a frame boundary.
///
/// Producers are control threads; the only consumer is the render thread,
/// which calls [`resolve_all_pending`](Self::resolve_all_pending) once per
/// completed frame. The lock is held only while the pending batch is swapped
/// out, never while completions run.
#[derive(Default)]
pub struct FrameSyncQueue {
    state: Mutex<FrameSyncState>,
}

impl FrameSyncQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts a request to be resolved at the next frame boundary.
    ///
    /// Never blocks on rendering. After teardown the request is cancelled
    /// immediately instead of being queued.
    pub fn enqueue(&self, completion: Completion<u64>) -> FrameTicket {
        let mut state = self.state.lock();
        let ticket = FrameTicket(state.next_ticket);
        state.next_ticket += 1;

        if state.closed {
            drop(state);
            log::debug!("frame request {} after teardown; cancelling", ticket.0);
            completion.cancel();
            return ticket;
        }

        state.pending.push_back(FrameSyncRequest { ticket, completion });
        ticket
    }

    /// Resolves every request pending when this call starts, oldest first.
    ///
    /// Requests enqueued while the batch is being resolved (including from
    /// inside a completion) wait for the next frame boundary.
    pub fn resolve_all_pending(&self, frame_index: u64) -> usize {
        let batch = std::mem::take(&mut self.state.lock().pending);
        let count = batch.len();

        for request in batch {
            request.completion.succeed(frame_index);
        }

        if count > 0 {
            log::trace!("frame {frame_index}: resolved {count} frame request(s)");
        }
        count
    }

    /// Cancels every pending request and refuses new ones.
    pub fn cancel_all(&self) -> usize {
        let batch = {
            let mut state = self.state.lock();
            state.closed = true;
            std::mem::take(&mut state.pending)
        };
        let count = batch.len();

        for request in batch {
            request.completion.cancel();
        }
        if count > 0 {
            log::debug!("cancelled {count} frame request(s) at teardown");
        }
        count
    }

    pub fn len(&self) -> usize {
        self.state.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for FrameSyncQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameSyncQueue")
            .field("pending", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::Arc;

    fn recording(log: &Arc<Mutex<Vec<(u64, u64)>>>, tag: u64) -> Completion<u64> {
        let log = Arc::clone(log);
        Completion::new(move |outcome| {
            if let Ok(frame) = outcome {
                log.lock().push((tag, frame));
            }
        })
    }

    // ── batching ──────────────────────────────────────────────────────────

    #[test]
    fn all_requests_before_boundary_resolve_together_in_order() {
        let queue = FrameSyncQueue::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        for tag in 0..5 {
            queue.enqueue(recording(&log, tag));
        }

        assert_eq!(queue.resolve_all_pending(10), 5);
        assert_eq!(
            *log.lock(),
            vec![(0, 10), (1, 10), (2, 10), (3, 10), (4, 10)]
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn request_enqueued_during_resolution_waits_for_next_boundary() {
        let queue = Arc::new(FrameSyncQueue::new());
        let log = Arc::new(Mutex::new(Vec::new()));

        let inner_queue = Arc::clone(&queue);
        let inner_log = Arc::clone(&log);
        queue.enqueue(Completion::new(move |outcome| {
            inner_log.lock().push((0, outcome.unwrap_or(u64::MAX)));
            inner_queue.enqueue(recording(&inner_log, 1));
        }));

        assert_eq!(queue.resolve_all_pending(1), 1);
        assert_eq!(*log.lock(), vec![(0, 1)]);
        assert_eq!(queue.len(), 1);

        assert_eq!(queue.resolve_all_pending(2), 1);
        assert_eq!(*log.lock(), vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn empty_boundary_resolves_nothing() {
        let queue = FrameSyncQueue::new();
        assert_eq!(queue.resolve_all_pending(0), 0);
    }

    // ── tickets ───────────────────────────────────────────────────────────

    #[test]
    fn tickets_are_monotonic() {
        let queue = FrameSyncQueue::new();
        let a = queue.enqueue(Completion::ignore());
        let b = queue.enqueue(Completion::ignore());
        assert!(a < b);
    }

    // ── teardown ──────────────────────────────────────────────────────────

    #[test]
    fn cancel_all_resolves_pending_with_cancellation() {
        let queue = FrameSyncQueue::new();
        let (c, rx) = Completion::channel();
        queue.enqueue(c);

        assert_eq!(queue.cancel_all(), 1);
        assert_eq!(rx.recv().unwrap(), Err(Error::CancelledAtTeardown));
    }

    #[test]
    fn enqueue_after_cancel_all_is_cancelled_immediately() {
        let queue = FrameSyncQueue::new();
        queue.cancel_all();

        let (c, rx) = Completion::channel();
        queue.enqueue(c);
        assert_eq!(rx.try_recv().unwrap(), Err(Error::CancelledAtTeardown));
        assert!(queue.is_empty());
    }

    #[test]
    fn concurrent_producers_all_resolve_at_one_boundary() {
        let queue = Arc::new(FrameSyncQueue::new());
        let mut receivers = Vec::new();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let (c, rx) = Completion::channel();
                receivers.push(rx);
                let queue = Arc::clone(&queue);
                std::thread::spawn(move || {
                    queue.enqueue(c);
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        queue.resolve_all_pending(42);
        for rx in receivers {
            assert_eq!(rx.recv().unwrap(), Ok(42));
        }
    }
}
