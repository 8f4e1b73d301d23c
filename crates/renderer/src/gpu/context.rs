use std::sync::Arc;

use anyhow::{Context as AnyhowContext, Result};
use winit::dpi::PhysicalSize;
use winit::window::Window;

/// Instance, device and swapchain wiring for one window.
pub(crate) struct GpuContext {
    _instance: wgpu::Instance,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub size: PhysicalSize<u32>,
}

impl GpuContext {
    pub(crate) fn new(window: Arc<Window>) -> Result<Self> {
        let initial_size = window.inner_size();
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            flags: wgpu::InstanceFlags::default(),
            memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
            backend_options: wgpu::BackendOptions::default(),
        });

        let surface = instance
            .create_surface(window)
            .context("failed to create rendering surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("failed to find a suitable GPU adapter")?;

        let info = adapter.get_info();
        tracing::debug!(
            name = %info.name,
            backend = ?info.backend,
            device_type = ?info.device_type,
            "selected GPU adapter"
        );

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("shadercycle device"),
            required_limits: adapter.limits(),
            ..Default::default()
        }))
        .context("failed to create GPU device")?;

        let size = PhysicalSize::new(initial_size.width.max(1), initial_size.height.max(1));
        let mut config = surface
            .get_default_config(&adapter, size.width, size.height)
            .context("surface is not supported by the selected adapter")?;

        // Shader output is written as-is, so prefer a non-sRGB swapchain format.
        let caps = surface.get_capabilities(&adapter);
        if let Some(format) = caps.formats.iter().copied().find(|format| !format.is_srgb()) {
            config.format = format;
        } else {
            tracing::warn!(format = ?config.format, "no linear surface format available");
        }
        config.present_mode = wgpu::PresentMode::Fifo;
        tracing::debug!(format = ?config.format, present_mode = ?config.present_mode, "configuring surface");
        surface.configure(&device, &config);

        Ok(Self {
            _instance: instance,
            surface,
            device,
            queue,
            config,
            size,
        })
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }

        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
    }

    pub(crate) fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }
}
