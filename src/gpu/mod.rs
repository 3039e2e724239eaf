//! wgpu rendering backend.
//!
//! [`GpuBackend::probe`] creates the surface, adapter, device and the one
//! render pipeline; scenes then only get their own instance and uniform
//! buffers. Everything is drawn as additive billboards, so no depth buffer
//! is needed.

pub mod shader;

use std::sync::Arc;

use winit::window::Window;

use crate::error::GpuError;
use crate::lifecycle::{Frame, RenderBackend, Viewport};
use crate::scene::{Instance, Scene, SceneKind};
use shader::{Uniforms, RENDER_SHADER};

/// Device, surface and pipeline shared by every scene on one window.
struct GpuContext {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

impl GpuContext {
    async fn new(window: Arc<Window>, viewport: Viewport) -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(GpuError::UnsupportedSurface)?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .ok_or(GpuError::UnsupportedSurface)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: viewport.width,
            height: viewport.height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Uniform Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let pipeline = create_pipeline(&device, &bind_group_layout, config.format);

        log::info!(
            "gpu ready: {} ({:?}), format {:?}",
            adapter.get_info().name,
            adapter.get_info().backend,
            config.format
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            bind_group_layout,
        })
    }

    fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Billboard Shader"),
        source: wgpu::ShaderSource::Wgsl(RENDER_SHADER.into()),
    });

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Billboard Pipeline Layout"),
        bind_group_layouts: &[bind_group_layout],
        push_constant_ranges: &[],
    });

    let attributes = wgpu::vertex_attr_array![0 => Float32x4, 1 => Float32x4];

    // Additive: overlapping glow accumulates, draw order doesn't matter.
    let blend = wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
            dst_factor: wgpu::BlendFactor::One,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::One,
            operation: wgpu::BlendOperation::Add,
        },
    };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Billboard Pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &module,
            entry_point: Some("vs_main"),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<Instance>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &attributes,
            }],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &module,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

/// Buffers owned by one built scene.
pub struct SceneResources {
    instance_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    capacity: usize,
    staging: Vec<Instance>,
    clear: wgpu::Color,
    point_scale: f32,
}

impl SceneResources {
    /// Instances the buffer can hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// [`RenderBackend`] drawing into a winit window.
pub struct GpuBackend {
    window: Arc<Window>,
    context: Option<GpuContext>,
}

impl GpuBackend {
    pub fn new(window: Arc<Window>) -> Self {
        Self { window, context: None }
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }
}

impl RenderBackend for GpuBackend {
    type Resources = SceneResources;
    type Error = GpuError;

    fn probe(&mut self, viewport: Viewport) -> Result<(), GpuError> {
        if self.context.is_none() {
            self.context = Some(pollster::block_on(GpuContext::new(self.window.clone(), viewport))?);
        }
        Ok(())
    }

    fn allocate(&mut self, scene: &Scene, _viewport: Viewport) -> Result<SceneResources, GpuError> {
        let ctx = self.context.as_ref().ok_or(GpuError::UnsupportedSurface)?;
        let capacity = scene.instance_capacity().max(1);

        let instance_buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Instance Buffer"),
            size: (capacity * std::mem::size_of::<Instance>()) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Uniform Buffer"),
            size: std::mem::size_of::<Uniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Uniform Bind Group"),
            layout: &ctx.bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let (clear, point_scale) = match scene.kind() {
            SceneKind::Chaos => (wgpu::Color { r: 0.015, g: 0.01, b: 0.03, a: 1.0 }, 1.0),
            SceneKind::Orb => (wgpu::Color { r: 0.0, g: 0.0, b: 0.0, a: 1.0 }, 1.4),
        };

        log::debug!("allocated instance buffer for {} instances", capacity);

        Ok(SceneResources {
            instance_buffer,
            uniform_buffer,
            bind_group,
            capacity,
            staging: Vec::with_capacity(capacity),
            clear,
            point_scale,
        })
    }

    fn resize(&mut self, _resources: &mut SceneResources, viewport: Viewport) {
        if let Some(ctx) = self.context.as_mut() {
            ctx.config.width = viewport.width;
            ctx.config.height = viewport.height;
            ctx.reconfigure();
        }
    }

    fn render(&mut self, res: &mut SceneResources, frame: &Frame<'_>) -> Result<(), GpuError> {
        let Some(ctx) = self.context.as_mut() else {
            return Ok(());
        };

        let output = match ctx.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                ctx.reconfigure();
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        frame.scene.instances(&mut res.staging);
        res.staging.truncate(res.capacity);
        ctx.queue
            .write_buffer(&res.instance_buffer, 0, bytemuck::cast_slice(&res.staging));
        let uniforms = Uniforms::from_frame(frame, res.point_scale);
        ctx.queue
            .write_buffer(&res.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(res.clear),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&ctx.pipeline);
            render_pass.set_bind_group(0, &res.bind_group, &[]);
            render_pass.set_vertex_buffer(0, res.instance_buffer.slice(..));
            render_pass.draw(0..6, 0..res.staging.len() as u32);
        }

        ctx.queue.submit(std::iter::once(encoder.finish()));
        self.window.pre_present_notify();
        output.present();
        Ok(())
    }

    fn release(&mut self, resources: SceneResources) {
        resources.instance_buffer.destroy();
        resources.uniform_buffer.destroy();
    }

    fn shutdown(&mut self) {
        if self.context.take().is_some() {
            log::debug!("gpu context dropped");
        }
    }
}
