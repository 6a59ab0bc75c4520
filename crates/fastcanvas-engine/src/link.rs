use parking_lot::Mutex;

use crate::channel::CommandChannel;
use crate::sync::FrameSyncQueue;

/// The only state shared between the control thread and the render thread.
///
/// Everything else (texture cache, GPU backend, rasterizer) belongs to the
/// render thread alone.
#[derive(Debug, Default)]
pub struct ControlLink {
    pub commands: CommandChannel,
    pub frames: FrameSyncQueue,
    payload: Mutex<Option<String>>,
}

impl ControlLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites the payload for the next frame. Earlier unconsumed payloads
    /// are discarded.
    pub fn set_payload(&self, payload: String) {
        *self.payload.lock() = Some(payload);
    }

    /// Takes the payload submitted since the last call, if any.
    pub fn take_payload(&self) -> Option<String> {
        self.payload.lock().take()
    }
}
