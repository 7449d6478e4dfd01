/// GPU bring-up parameters shared by windowed and headless devices.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Pick an sRGB swapchain format when the surface offers one.
    ///
    /// Shader playgrounds write display-referred values straight to the
    /// framebuffer, so the studio turns this off.
    pub prefer_srgb: bool,

    pub present_mode: wgpu::PresentMode,
    pub power_preference: wgpu::PowerPreference,

    /// Swapchain depth hint; the backend may ignore it.
    pub frame_latency: u32,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            prefer_srgb: true,
            present_mode: wgpu::PresentMode::Fifo,
            power_preference: wgpu::PowerPreference::HighPerformance,
            frame_latency: 2,
        }
    }
}

impl GpuInit {
    /// Device request: no optional features, downlevel limits raised to the
    /// adapter's texture resolution so large windows still get render
    /// targets.
    pub(crate) fn device_descriptor(
        &self,
        label: &'static str,
        adapter: &wgpu::Adapter,
    ) -> wgpu::DeviceDescriptor<'static> {
        wgpu::DeviceDescriptor {
            label: Some(label),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits()),
            experimental_features: wgpu::ExperimentalFeatures::disabled(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        }
    }
}
