use std::collections::VecDeque;

use parking_lot::Mutex;

use super::PendingOperation;

#[derive(Debug, Default)]
struct ChannelState {
    queue: VecDeque<PendingOperation>,
    closed: bool,
}

/// Ordered queue of operations for the render thread.
///
/// Any thread may [`submit`](Self::submit); only the render thread drains.
/// Submission order is preserved, so a load followed by an unload of the
/// same id is applied in that order.
#[derive(Debug, Default)]
pub struct CommandChannel {
    state: Mutex<ChannelState>,
}

impl CommandChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `op`. Never blocks on rendering.
    ///
    /// Once the channel is closed the operation is cancelled on the spot.
    pub fn submit(&self, op: PendingOperation) {
        let mut state = self.state.lock();
        if state.closed {
            drop(state);
            log::debug!("operation submitted after teardown; cancelling");
            op.cancel();
            return;
        }
        state.queue.push_back(op);
    }

    /// Removes and returns everything queued, oldest first.
    pub fn drain_all(&self) -> Vec<PendingOperation> {
        let mut state = self.state.lock();
        state.queue.drain(..).collect()
    }

    /// Puts `ops` ahead of everything queued, keeping their relative order.
    pub fn requeue_front(&self, ops: Vec<PendingOperation>) {
        if ops.is_empty() {
            return;
        }

        let mut state = self.state.lock();
        if state.closed {
            drop(state);
            ops.into_iter().for_each(PendingOperation::cancel);
            return;
        }
        for op in ops.into_iter().rev() {
            state.queue.push_front(op);
        }
    }

    /// Refuses further submissions and hands back what was still queued.
    pub fn close(&self) -> Vec<PendingOperation> {
        let mut state = self.state.lock();
        state.closed = true;
        state.queue.drain(..).collect()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn len(&self) -> usize {
        self.state.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
