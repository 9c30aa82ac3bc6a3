//! WebGPU sprite pipeline
//!
//! One textured pipeline, one atlas, one indexed draw per frame. Positions
//! arrive in arena pixels; the view uniform maps them to clip space with +Y
//! pointing down.

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use glam::{Mat3, Vec3};
use wgpu::util::DeviceExt;
use winit::window::Window;

use super::assets::{AtlasImage, ShaderSources};
use super::sprite_buffer::{GpuSpriteBuffers, SpriteBuffer};
use super::vertex::{Vertex, colors};

/// Arena-to-clip transform, laid out as a WGSL `mat3x3<f32>` (16-byte columns)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ViewUniform {
    columns: [[f32; 4]; 3],
}

impl ViewUniform {
    pub fn new(arena_width: f32, arena_height: f32) -> Self {
        let m = view_matrix(arena_width, arena_height);
        let col = |c: Vec3| [c.x, c.y, c.z, 0.0];
        Self {
            columns: [col(m.x_axis), col(m.y_axis), col(m.z_axis)],
        }
    }
}

/// Orthographic projection of `[0, w] x [0, h]` onto clip space with the
/// Y axis flipped so the arena origin is the top-left corner.
pub fn view_matrix(arena_width: f32, arena_height: f32) -> Mat3 {
    Mat3::from_cols(
        Vec3::new(2.0 / arena_width, 0.0, 0.0),
        Vec3::new(0.0, -2.0 / arena_height, 0.0),
        Vec3::new(-1.0, 1.0, 1.0),
    )
}

/// Turn an error captured by a validation scope into a startup error
fn check_validation(stage: &str, error: Option<wgpu::Error>) -> Result<()> {
    match error {
        Some(e) => Err(anyhow!("{stage} failed validation: {e}")),
        None => Ok(()),
    }
}

/// Atlas texture plus the bind group that exposes it
struct AtlasTexture {
    width: u32,
    height: u32,
    bind_group: wgpu::BindGroup,
}

/// Window surface, device and the sprite pipeline
pub struct SpriteRenderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    atlas: AtlasTexture,
    buffers: GpuSpriteBuffers,
}

impl SpriteRenderer {
    /// Blocking constructor for the winit event loop
    pub fn new_blocking(
        window: Arc<Window>,
        arena: (u32, u32),
        shaders: &ShaderSources,
        atlas: &AtlasImage,
    ) -> Result<Self> {
        pollster::block_on(Self::new(window, arena, shaders, atlas))
    }

    pub async fn new(
        window: Arc<Window>,
        arena: (u32, u32),
        shaders: &ShaderSources,
        atlas: &AtlasImage,
    ) -> Result<Self> {
        let size = window.inner_size();
        let (width, height) = (size.width.max(1), size.height.max(1));

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .context("Failed to create surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("Failed to find a suitable GPU adapter")?;

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("ballpit-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await
            .context("Failed to create device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .or_else(|| surface_caps.formats.first().copied())
            .context("Surface reports no supported formats")?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        // Shader and pipeline errors surface here instead of panicking later
        let validation = device.push_error_scope(wgpu::ErrorFilter::Validation);

        let vertex_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sprite_vertex_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders.vertex.as_str().into()),
        });
        let fragment_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sprite_fragment_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders.fragment.as_str().into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sprite_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let view_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("view_uniform"),
            contents: bytemuck::bytes_of(&ViewUniform::new(arena.0 as f32, arena.1 as f32)),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let atlas = Self::create_atlas(&device, &queue, &bind_group_layout, &view_buffer, atlas);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sprite_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("sprite_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vertex_shader,
                entry_point: Some(ShaderSources::VERTEX_ENTRY),
                buffers: &[Vertex::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &fragment_shader,
                entry_point: Some(ShaderSources::FRAGMENT_ENTRY),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
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
            multiview_mask: None,
            cache: None,
        });

        check_validation("Sprite pipeline", validation.pop().await)?;

        let buffers = GpuSpriteBuffers::new(&device);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            atlas,
            buffers,
        })
    }

    fn create_atlas(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        view_buffer: &wgpu::Buffer,
        image: &AtlasImage,
    ) -> AtlasTexture {
        let size = wgpu::Extent3d {
            width: image.width,
            height: image.height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("sprite_atlas"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &image.rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * image.width),
                rows_per_image: Some(image.height),
            },
            size,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        // Pixel art: no filtering between texels
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("sprite_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sprite_bind_group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: view_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        AtlasTexture {
            width: image.width,
            height: image.height,
            bind_group,
        }
    }

    /// Atlas size in pixels, for normalizing sprite regions
    pub fn texture_size(&self) -> (u32, u32) {
        (self.atlas.width, self.atlas.height)
    }

    pub fn resize(&mut self, new_width: u32, new_height: u32) {
        if new_width > 0 && new_height > 0 {
            self.config.width = new_width;
            self.config.height = new_height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Reconfigure the surface at its current size after it was lost
    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    /// Upload the batch and draw it in a single pass
    pub fn render(&mut self, sprites: &mut SpriteBuffer) -> Result<(), wgpu::SurfaceError> {
        sprites.upload(&mut self.buffers, &self.device, &self.queue);

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("sprite_encoder"),
            });

        {
            let [r, g, b, a] = colors::BACKGROUND.map(f64::from);
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("sprite_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.atlas.bind_group, &[]);
            sprites.draw(&self.buffers, &mut render_pass);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn to_clip(m: Mat3, x: f32, y: f32) -> Vec2 {
        m.transform_point2(Vec2::new(x, y))
    }

    #[test]
    fn test_view_matrix_corners() {
        let m = view_matrix(800.0, 600.0);
        assert_eq!(to_clip(m, 0.0, 0.0), Vec2::new(-1.0, 1.0));
        assert_eq!(to_clip(m, 800.0, 600.0), Vec2::new(1.0, -1.0));
        assert_eq!(to_clip(m, 400.0, 300.0), Vec2::ZERO);
    }

    #[test]
    fn test_validation_error_becomes_startup_error() {
        assert!(check_validation("Sprite pipeline", None).is_ok());

        let error = wgpu::Error::Validation {
            source: Box::new(std::io::Error::other("shader parse error")),
            description: "Shader 'sprite_vertex_shader' parsing error".to_string(),
        };
        let err = check_validation("Sprite pipeline", Some(error)).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.starts_with("Sprite pipeline failed validation"));
        assert!(message.contains("sprite_vertex_shader"));
    }

    #[test]
    fn test_view_uniform_layout() {
        assert_eq!(std::mem::size_of::<ViewUniform>(), 48);
        let u = ViewUniform::new(200.0, 100.0);
        assert_eq!(u.columns[0], [0.01, 0.0, 0.0, 0.0]);
        assert_eq!(u.columns[1], [0.0, -0.02, 0.0, 0.0]);
        assert_eq!(u.columns[2], [-1.0, 1.0, 1.0, 0.0]);
    }
}
