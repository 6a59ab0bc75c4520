use crate::raster::GpuStatus;

/// Error code reported after a frame when the surface ran out of memory.
pub const SURFACE_OUT_OF_MEMORY: u32 = 0x0505;

/// Response to a failed frame acquisition.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; rendering may resume next frame.
    Reconfigured,
    /// Transient error; skip the current frame.
    SkipFrame,
    /// The device cannot continue (out of memory).
    Fatal,
}

impl SurfaceErrorAction {
    /// What a rasterizer reports for the skipped frame.
    ///
    /// A skipped or reconfigured frame is not an error. Running out of memory
    /// is reported as an error code; the render loop logs it and keeps going.
    pub fn status(self) -> GpuStatus {
        match self {
            SurfaceErrorAction::Reconfigured | SurfaceErrorAction::SkipFrame => GpuStatus::Ok,
            SurfaceErrorAction::Fatal => GpuStatus::Error(SURFACE_OUT_OF_MEMORY),
        }
    }
}
