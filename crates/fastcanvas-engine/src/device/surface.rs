use winit::dpi::PhysicalSize;

use super::SurfaceErrorAction;

pub(crate) fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    if prefer_srgb {
        let preferred = [
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Rgba8UnormSrgb,
        ];
        if let Some(f) = preferred.into_iter().find(|f| caps.formats.contains(f)) {
            return Some(f);
        }
    }

    caps.formats.first().copied()
}

pub(crate) fn choose_alpha_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| caps.alpha_modes.contains(m))
        .or_else(|| caps.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

/// wgpu cannot configure a 0x0 surface; such sizes are recorded and the
/// configuration is deferred until the next non-empty size.
pub(crate) fn apply_resize(
    surface: &wgpu::Surface,
    device: &wgpu::Device,
    config: &mut wgpu::SurfaceConfiguration,
    size: &mut PhysicalSize<u32>,
    new_size: PhysicalSize<u32>,
) {
    *size = new_size;
    if new_size.width == 0 || new_size.height == 0 {
        return;
    }

    config.width = new_size.width;
    config.height = new_size.height;
    surface.configure(device, config);
}

pub(crate) fn map_surface_error(
    surface: &wgpu::Surface,
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    err: wgpu::SurfaceError,
) -> SurfaceErrorAction {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
            if size.width > 0 && size.height > 0 {
                surface.configure(device, config);
            }
            SurfaceErrorAction::Reconfigured
        }
        wgpu::SurfaceError::OutOfMemory => SurfaceErrorAction::Fatal,
        wgpu::SurfaceError::Timeout | wgpu::SurfaceError::Other => SurfaceErrorAction::SkipFrame,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(formats: &[wgpu::TextureFormat], alpha: &[wgpu::CompositeAlphaMode]) -> wgpu::SurfaceCapabilities {
        wgpu::SurfaceCapabilities {
            formats: formats.to_vec(),
            alpha_modes: alpha.to_vec(),
            ..Default::default()
        }
    }

    #[test]
    fn srgb_format_preferred_when_offered() {
        let c = caps(
            &[wgpu::TextureFormat::Bgra8Unorm, wgpu::TextureFormat::Rgba8UnormSrgb],
            &[],
        );
        assert_eq!(choose_surface_format(&c, true), Some(wgpu::TextureFormat::Rgba8UnormSrgb));
        assert_eq!(choose_surface_format(&c, false), Some(wgpu::TextureFormat::Bgra8Unorm));
        assert_eq!(choose_surface_format(&caps(&[], &[]), true), None);
    }

    #[test]
    fn unsupported_alpha_mode_falls_back() {
        let c = caps(&[], &[wgpu::CompositeAlphaMode::Opaque]);
        assert_eq!(
            choose_alpha_mode(&c, Some(wgpu::CompositeAlphaMode::PreMultiplied)),
            wgpu::CompositeAlphaMode::Opaque
        );
        assert_eq!(
            choose_alpha_mode(&caps(&[], &[]), None),
            wgpu::CompositeAlphaMode::Auto
        );
    }
}
