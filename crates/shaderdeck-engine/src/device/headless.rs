use super::{GpuInit, GraphicsInitError};

/// Device/queue pair without a surface.
///
/// Used for offscreen rendering and by GPU-backed tests.
pub struct HeadlessGpu {
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl HeadlessGpu {
    pub async fn new(init: &GpuInit) -> Result<Self, GraphicsInitError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: init.power_preference,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(GraphicsInitError::Adapter)?;

        let (device, queue) = adapter
            .request_device(&init.device_descriptor("shaderdeck headless device", &adapter))
            .await
            .map_err(GraphicsInitError::Device)?;

        let info = adapter.get_info();
        log::debug!("headless gpu: {} ({:?})", info.name, info.backend);

        Ok(Self { device, queue })
    }

    /// Blocking variant of [`HeadlessGpu::new`].
    pub fn new_blocking(init: &GpuInit) -> Result<Self, GraphicsInitError> {
        pollster::block_on(Self::new(init))
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }
}
