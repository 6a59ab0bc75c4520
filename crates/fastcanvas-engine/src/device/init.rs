/// How a window's GPU context is created.
///
/// One value is kept by the runtime and reused for every (re)creation, so a
/// context created after a suspend matches the one that was lost.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Prefer an sRGB surface format; the background colour is given in sRGB.
    pub prefer_srgb: bool,

    /// FIFO ties the render cycle to the display refresh rate, which is the
    /// cadence frame requests are resolved at.
    pub present_mode: wgpu::PresentMode,

    /// Surface alpha mode. Falls back to a supported one when unavailable.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    pub power_preference: wgpu::PowerPreference,

    pub required_features: wgpu::Features,

    /// `max_texture_dimension_2d` bounds the largest padded texture a load
    /// may allocate; larger images fail with a GPU allocation error.
    pub required_limits: wgpu::Limits,

    /// Frames queued ahead of presentation. A hint.
    pub desired_maximum_frame_latency: u32,
}

impl GpuInit {
    /// Largest texture side a load can allocate on contexts built from this.
    pub fn max_texture_side(&self) -> u32 {
        self.required_limits.max_texture_dimension_2d
    }
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            prefer_srgb: true,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            power_preference: wgpu::PowerPreference::HighPerformance,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            desired_maximum_frame_latency: 2,
        }
    }
}
