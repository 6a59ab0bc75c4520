use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::Value;

use crate::channel::PendingOperation;
use crate::color::Rgb;
use crate::error::{Error, Result};
use crate::link::ControlLink;
use crate::raster::{CaptureRequest, Rasterizer};
use crate::render::RenderLoop;
use crate::storage::Storage;
use crate::sync::{Completion, FrameTicket};
use crate::texture::{TextureId, TextureLoader, TextureSize, TextureSpec};

use super::{Action, ActionResult};

/// Control-thread entry point.
///
/// Every method returns without waiting for the render thread; results that
/// need the GPU arrive through the supplied [`Completion`].
#[derive(Clone)]
pub struct Bridge {
    link: Arc<ControlLink>,
    storage: Arc<dyn Storage>,
    next_capture_id: Arc<AtomicU64>,
}

/// Wires a bridge and a render loop to one shared link.
pub fn connect<R: Rasterizer>(storage: Arc<dyn Storage>, rasterizer: R) -> (Bridge, RenderLoop<R>) {
    let link = Arc::new(ControlLink::new());
    let render_loop = RenderLoop::new(
        Arc::clone(&link),
        TextureLoader::new(Arc::clone(&storage)),
        rasterizer,
    );
    let bridge = Bridge {
        link,
        storage,
        next_capture_id: Arc::new(AtomicU64::new(1)),
    };
    (bridge, render_loop)
}

impl Bridge {
    /// Replaces the payload drawn by the next frame.
    pub fn render(&self, payload: String) {
        self.link.set_payload(payload);
    }

    pub fn load_texture(&self, source: String, id: TextureId, completion: Completion<TextureSize>) {
        self.link
            .commands
            .submit(PendingOperation::load(TextureSpec::new(id, source), completion));
    }

    /// Unknown ids are not an error.
    pub fn unload_texture(&self, id: TextureId) {
        self.link.commands.submit(PendingOperation::Unload { id });
    }

    /// Malformed colours are logged and ignored; the current colour stays.
    pub fn set_background_color(&self, color: &str) {
        match Rgb::parse_hex(color) {
            Ok(rgb) => self
                .link
                .commands
                .submit(PendingOperation::SetBackgroundColor(rgb)),
            Err(err) => log::error!("invalid background color {color:?}: {err}"),
        }
    }

    pub fn set_ortho(&self, width: u32, height: u32) {
        self.link
            .commands
            .submit(PendingOperation::SetOrtho { width, height });
    }

    /// Registers interest in the next completed frame.
    pub fn frame_request(&self, completion: Completion<u64>) -> FrameTicket {
        self.link.frames.enqueue(completion)
    }

    /// Captures a framebuffer region to `destination` under the storage root.
    ///
    /// The destination directory is created here, before anything is queued.
    pub fn capture(
        &self,
        x: u32,
        y: u32,
        width: Option<u32>,
        height: Option<u32>,
        destination: &str,
        completion: Completion<PathBuf>,
    ) {
        let Some(path) = self.storage.storage_path(destination) else {
            log::error!("capture: destination {destination:?} is outside the storage root");
            completion.fail(Error::InvalidArgument(format!(
                "capture destination outside storage root: {destination}"
            )));
            return;
        };
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            if !self.storage.ensure_directory(dir) {
                log::warn!("capture: could not create directory {}", dir.display());
                completion.fail(Error::Io("could not create directory".into()));
                return;
            }
        }

        let request_id = self.next_capture_id.fetch_add(1, Ordering::Relaxed);
        self.link.commands.submit(PendingOperation::Capture {
            request_id,
            request: CaptureRequest {
                x,
                y,
                width,
                height,
                destination: path,
            },
            completion,
        });
    }

    pub fn is_available(&self) -> bool {
        true
    }

    /// Runs `action` and replies through `reply`.
    pub fn execute(&self, action: Action, reply: Completion<ActionResult>) {
        log::debug!("action: {action}");
        match action {
            Action::Render { payload } => {
                self.render(payload);
                reply.succeed(ActionResult::Accepted);
            }
            Action::LoadTexture { source, id } => self.load_texture(
                source,
                id,
                reply.map(|size: TextureSize| ActionResult::Dimensions {
                    width: size.width,
                    height: size.height,
                }),
            ),
            Action::UnloadTexture { id } => {
                self.unload_texture(id);
                reply.succeed(ActionResult::Accepted);
            }
            Action::SetBackgroundColor { color } => {
                self.set_background_color(&color);
                reply.succeed(ActionResult::Accepted);
            }
            Action::SetOrtho { width, height } => {
                self.set_ortho(width, height);
                reply.succeed(ActionResult::Accepted);
            }
            Action::FrameRequest => {
                self.frame_request(reply.map(ActionResult::Frame));
            }
            Action::Capture {
                x,
                y,
                width,
                height,
                destination,
            } => self.capture(
                x,
                y,
                width,
                height,
                &destination,
                reply.map(ActionResult::Captured),
            ),
            Action::IsAvailable => reply.succeed(ActionResult::Available(self.is_available())),
        }
    }

    /// Decodes and runs a raw host call. Decoding errors go to `reply`.
    pub fn dispatch(&self, name: &str, args: &Value, reply: Completion<ActionResult>) {
        match Action::decode(name, args) {
            Ok(action) => self.execute(action, reply),
            Err(err) => {
                log::error!("rejected action {name}({args}): {err}");
                reply.fail(err);
            }
        }
    }

    /// Convenience for hosts that block: runs `action` and waits for its reply.
    pub fn execute_blocking(&self, action: Action) -> Result<ActionResult> {
        let (reply, rx) = Completion::channel();
        self.execute(action, reply);
        rx.recv().unwrap_or(Err(Error::CancelledAtTeardown))
    }
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("link", &self.link)
            .field("next_capture_id", &self.next_capture_id.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
