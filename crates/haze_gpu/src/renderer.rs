//! GPU renderer implementation
//!
//! Executes a [`CompositeEffect`] with wgpu: one full-screen copy of the
//! content, blur passes into an intermediate texture, the shared noise
//! texture, then one scissored region draw per filter.

use std::ops::Range;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use haze_core::shader::{
    BLURRED_BINDING, CONTENT_BINDING, CONTENT_ENTRY, NOISE_BINDING, REGION_ENTRY,
    UNIFORM_BINDING, VERTEX_ENTRY,
};
use haze_core::{BlurFilter, CompositeEffect, EdgeMode, NoiseField, RegionFilter, RegionProgram};
use wgpu::util::DeviceExt;

use crate::shaders::{BLUR_ENTRY, BLUR_SHADER};

/// Error type for renderer operations
#[derive(Debug, thiserror::Error)]
pub enum RendererError {
    /// Failed to request GPU adapter
    #[error("No suitable GPU adapter found")]
    AdapterNotFound,
    /// Failed to request GPU device
    #[error("Failed to request GPU device: {0}")]
    DeviceError(#[from] wgpu::RequestDeviceError),
    /// Content texture has a zero dimension
    #[error("Content texture is empty ({width}x{height})")]
    EmptyContent { width: u32, height: u32 },
}

/// Configuration for creating a renderer
#[derive(Clone, Debug)]
pub struct RendererConfig {
    /// Format of the render target the region program writes to
    pub target_format: wgpu::TextureFormat,
    /// Format of the intermediate blur textures
    pub blur_format: wgpu::TextureFormat,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            target_format: wgpu::TextureFormat::Rgba8Unorm,
            blur_format: wgpu::TextureFormat::Rgba16Float,
        }
    }
}

/// Per-pass blur parameters, mirrors `BlurUniforms` in [`BLUR_SHADER`]
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
struct BlurUniforms {
    direction: [i32; 2],
    radius: i32,
    edge_mode: u32,
}

impl BlurUniforms {
    fn new(direction: [i32; 2], kernel: &[f32], edge_mode: EdgeMode) -> Self {
        Self {
            direction,
            radius: (kernel.len() / 2) as i32,
            edge_mode: match edge_mode {
                EdgeMode::Decal => 0,
                EdgeMode::Clamp => 1,
            },
        }
    }
}

struct Pipelines {
    content: wgpu::RenderPipeline,
    region: wgpu::RenderPipeline,
    blur: wgpu::RenderPipeline,
}

struct BindGroupLayouts {
    region: wgpu::BindGroupLayout,
    blur: wgpu::BindGroupLayout,
}

/// A texture with its default view
struct SizedTexture {
    size: (u32, u32),
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

/// Views and size shared by the draws of one region pass
struct RegionPassInputs<'a> {
    uniforms: &'a wgpu::Buffer,
    content: &'a wgpu::TextureView,
    blurred: &'a wgpu::TextureView,
    target: &'a wgpu::TextureView,
    size: (u32, u32),
}

/// Intermediate targets of the two blur passes
struct BlurTargets {
    horizontal: SizedTexture,
    blurred: SizedTexture,
}

/// Renderer for haze composite effects
///
/// The content texture must be created with `TEXTURE_BINDING` usage and have
/// the same size as the target. Targets must match
/// [`RendererConfig::target_format`].
pub struct HazeRenderer {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: RendererConfig,
    pipelines: Pipelines,
    bind_group_layouts: BindGroupLayouts,
    /// Distance between per-filter uniform slots
    uniform_stride: u64,
    /// Noise rasterized at the last content size
    noise_texture: Option<SizedTexture>,
    /// Blur targets at the last content size
    blur_targets: Option<BlurTargets>,
}

impl HazeRenderer {
    /// Create a renderer on an existing device
    pub fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        config: RendererConfig,
    ) -> Self {
        let bind_group_layouts = Self::create_bind_group_layouts(&device);
        let pipelines = Self::create_pipelines(&device, &bind_group_layouts, &config);

        let uniform_stride = align_to(
            std::mem::size_of::<haze_core::RegionUniforms>() as u64,
            device.limits().min_uniform_buffer_offset_alignment as u64,
        );

        tracing::debug!(
            target_format = ?config.target_format,
            blur_format = ?config.blur_format,
            uniform_stride,
            "haze renderer created"
        );

        Self {
            device,
            queue,
            config,
            pipelines,
            bind_group_layouts,
            uniform_stride,
            noise_texture: None,
            blur_targets: None,
        }
    }

    /// Create a renderer with its own device (for headless rendering)
    pub async fn new_headless(config: RendererConfig) -> Result<Self, RendererError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RendererError::AdapterNotFound)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Haze GPU Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::MemoryUsage,
                },
                None,
            )
            .await?;

        Ok(Self::new(Arc::new(device), Arc::new(queue), config))
    }

    /// Blocking variant of [`HazeRenderer::new_headless`]
    pub fn new_headless_blocking(config: RendererConfig) -> Result<Self, RendererError> {
        pollster::block_on(Self::new_headless(config))
    }

    pub fn device(&self) -> &Arc<wgpu::Device> {
        &self.device
    }

    pub fn queue(&self) -> &Arc<wgpu::Queue> {
        &self.queue
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    fn create_bind_group_layouts(device: &wgpu::Device) -> BindGroupLayouts {
        let texture_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: false },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };

        let region = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Haze Region Bind Group Layout"),
            entries: &[
                // Region uniforms, one slot per filter
                wgpu::BindGroupLayoutEntry {
                    binding: UNIFORM_BINDING,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: wgpu::BufferSize::new(
                            std::mem::size_of::<haze_core::RegionUniforms>() as u64,
                        ),
                    },
                    count: None,
                },
                texture_entry(CONTENT_BINDING),
                texture_entry(BLURRED_BINDING),
                texture_entry(NOISE_BINDING),
            ],
        });

        let blur = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Haze Blur Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Kernel weights
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                texture_entry(2),
            ],
        });

        BindGroupLayouts { region, blur }
    }

    fn create_pipelines(
        device: &wgpu::Device,
        layouts: &BindGroupLayouts,
        config: &RendererConfig,
    ) -> Pipelines {
        let region_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Haze Region Shader"),
            source: wgpu::ShaderSource::Wgsl(RegionProgram::shared().source().into()),
        });

        let blur_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Haze Blur Shader"),
            source: wgpu::ShaderSource::Wgsl(BLUR_SHADER.into()),
        });

        let primitive_state = wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            unclipped_depth: false,
            polygon_mode: wgpu::PolygonMode::Fill,
            conservative: false,
        };

        let full_screen_pipeline = |label: &str,
                                    layout: &wgpu::BindGroupLayout,
                                    module: &wgpu::ShaderModule,
                                    fragment_entry: &str,
                                    format: wgpu::TextureFormat| {
            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(label),
                bind_group_layouts: &[layout],
                push_constant_ranges: &[],
            });

            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module,
                    entry_point: Some(VERTEX_ENTRY),
                    buffers: &[],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module,
                    entry_point: Some(fragment_entry),
                    // Output replaces the target; no blending
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: primitive_state,
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        };

        Pipelines {
            content: full_screen_pipeline(
                "Haze Content Pipeline",
                &layouts.region,
                &region_shader,
                CONTENT_ENTRY,
                config.target_format,
            ),
            region: full_screen_pipeline(
                "Haze Region Pipeline",
                &layouts.region,
                &region_shader,
                REGION_ENTRY,
                config.target_format,
            ),
            blur: full_screen_pipeline(
                "Haze Blur Pipeline",
                &layouts.blur,
                &blur_shader,
                BLUR_ENTRY,
                config.blur_format,
            ),
        }
    }

    fn create_texture(
        &self,
        label: &str,
        size: (u32, u32),
        format: wgpu::TextureFormat,
        usage: wgpu::TextureUsages,
    ) -> SizedTexture {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: size.0,
                height: size.1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        SizedTexture {
            size,
            texture,
            view,
        }
    }

    /// Upload the shared noise field at `size` unless it is already resident
    fn ensure_noise_texture(&mut self, size: (u32, u32)) {
        if self.noise_texture.as_ref().is_some_and(|t| t.size == size) {
            return;
        }

        tracing::debug!(width = size.0, height = size.1, "rasterizing haze noise");
        let noise = self.create_texture(
            "Haze Noise Texture",
            size,
            wgpu::TextureFormat::Rgba8Unorm,
            wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        );
        let pixels = NoiseField::shared().rasterize(size.0, size.1);

        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &noise.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &pixels,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(size.0 * 4),
                rows_per_image: Some(size.1),
            },
            wgpu::Extent3d {
                width: size.0,
                height: size.1,
                depth_or_array_layers: 1,
            },
        );

        self.noise_texture = Some(noise);
    }

    fn ensure_blur_targets(&mut self, size: (u32, u32)) {
        if self
            .blur_targets
            .as_ref()
            .is_some_and(|t| t.blurred.size == size)
        {
            return;
        }

        let usage = wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING;
        let horizontal =
            self.create_texture("Haze Blur Horizontal", size, self.config.blur_format, usage);
        let blurred = self.create_texture("Haze Blurred", size, self.config.blur_format, usage);
        self.blur_targets = Some(BlurTargets {
            horizontal,
            blurred,
        });
    }

    /// Render `effect` over `content` into `target` and submit
    ///
    /// An empty effect draws nothing; the caller keeps presenting the
    /// original content.
    pub fn render(
        &mut self,
        content: &wgpu::Texture,
        target: &wgpu::TextureView,
        effect: &CompositeEffect,
    ) -> Result<(), RendererError> {
        if effect.is_empty() {
            return Ok(());
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Haze Render Encoder"),
            });
        self.encode(&mut encoder, content, target, effect)?;
        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    /// Record the passes for `effect` into an existing encoder
    ///
    /// Region uniforms go into a buffer owned by this call, so several
    /// encoders may be recorded before any of them is submitted. The noise
    /// texture is uploaded through the queue, so the encoder must be
    /// submitted on this renderer's queue.
    pub fn encode(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        content: &wgpu::Texture,
        target: &wgpu::TextureView,
        effect: &CompositeEffect,
    ) -> Result<(), RendererError> {
        let filters = effect.filters();
        if filters.is_empty() {
            return Ok(());
        }

        let size = (content.width(), content.height());
        if size.0 == 0 || size.1 == 0 {
            return Err(RendererError::EmptyContent {
                width: size.0,
                height: size.1,
            });
        }

        self.ensure_noise_texture(size);
        let uniforms = self.create_region_uniforms(filters);
        let content_view = content.create_view(&wgpu::TextureViewDescriptor::default());

        self.encode_content(
            encoder,
            RegionPassInputs {
                uniforms: &uniforms,
                content: &content_view,
                blurred: &content_view,
                target,
                size,
            },
        );

        for pass in plan_region_passes(filters, size) {
            let blur = filters[pass.slots.start].blur();
            let blurred_is_content = blur.is_identity();
            if !blurred_is_content {
                self.ensure_blur_targets(size);
                self.encode_blur(encoder, &content_view, blur);
            }

            let blurred_view = match (&self.blur_targets, blurred_is_content) {
                (Some(targets), false) => &targets.blurred.view,
                _ => &content_view,
            };
            self.encode_regions(
                encoder,
                RegionPassInputs {
                    uniforms: &uniforms,
                    content: &content_view,
                    blurred: blurred_view,
                    target,
                    size,
                },
                &pass.draws,
            );
        }

        tracing::trace!(filters = filters.len(), "encoded haze effect");
        Ok(())
    }

    /// Pack every filter's uniforms into one aligned slot each
    fn create_region_uniforms(&self, filters: &[RegionFilter]) -> wgpu::Buffer {
        let stride = self.uniform_stride as usize;
        let mut bytes = vec![0u8; stride * filters.len()];
        for (slot, filter) in bytes.chunks_exact_mut(stride).zip(filters) {
            let uniform_bytes = filter.uniform_bytes();
            slot[..uniform_bytes.len()].copy_from_slice(uniform_bytes);
        }
        self.device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Haze Region Uniforms"),
                contents: &bytes,
                usage: wgpu::BufferUsages::UNIFORM,
            })
    }

    fn encode_blur(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        content_view: &wgpu::TextureView,
        blur: &BlurFilter,
    ) {
        let Some(targets) = &self.blur_targets else {
            return;
        };

        let passes = [
            ([1, 0], blur.kernel_x(), content_view, &targets.horizontal.view),
            ([0, 1], blur.kernel_y(), &targets.horizontal.view, &targets.blurred.view),
        ];

        for (direction, kernel, source, destination) in passes {
            let uniforms = BlurUniforms::new(direction, kernel, blur.edge_mode());
            let uniform_buffer = self
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Haze Blur Uniforms"),
                    contents: bytemuck::bytes_of(&uniforms),
                    usage: wgpu::BufferUsages::UNIFORM,
                });
            let weight_buffer = self
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Haze Blur Weights"),
                    contents: bytemuck::cast_slice(kernel),
                    usage: wgpu::BufferUsages::STORAGE,
                });

            let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Haze Blur Bind Group"),
                layout: &self.bind_group_layouts.blur,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniform_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: weight_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(source),
                    },
                ],
            });

            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Haze Blur Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: destination,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            render_pass.set_pipeline(&self.pipelines.blur);
            render_pass.set_bind_group(0, &bind_group, &[]);
            render_pass.draw(0..3, 0..1);
        }
    }

    fn region_bind_group(&self, inputs: &RegionPassInputs<'_>) -> Option<wgpu::BindGroup> {
        let noise = self.noise_texture.as_ref()?;

        Some(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Haze Region Bind Group"),
            layout: &self.bind_group_layouts.region,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: UNIFORM_BINDING,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer: inputs.uniforms,
                        offset: 0,
                        size: wgpu::BufferSize::new(
                            std::mem::size_of::<haze_core::RegionUniforms>() as u64,
                        ),
                    }),
                },
                wgpu::BindGroupEntry {
                    binding: CONTENT_BINDING,
                    resource: wgpu::BindingResource::TextureView(inputs.content),
                },
                wgpu::BindGroupEntry {
                    binding: BLURRED_BINDING,
                    resource: wgpu::BindingResource::TextureView(inputs.blurred),
                },
                wgpu::BindGroupEntry {
                    binding: NOISE_BINDING,
                    resource: wgpu::BindingResource::TextureView(&noise.view),
                },
            ],
        }))
    }

    /// Copy the content into the whole target; regions are drawn over it
    fn encode_content(&self, encoder: &mut wgpu::CommandEncoder, inputs: RegionPassInputs<'_>) {
        let Some(bind_group) = self.region_bind_group(&inputs) else {
            return;
        };

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Haze Content Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: inputs.target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        render_pass.set_pipeline(&self.pipelines.content);
        render_pass.set_bind_group(0, &bind_group, &[0]);
        render_pass.draw(0..3, 0..1);
    }

    fn encode_regions(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        inputs: RegionPassInputs<'_>,
        draws: &[RegionDraw],
    ) {
        let Some(bind_group) = self.region_bind_group(&inputs) else {
            return;
        };

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Haze Region Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: inputs.target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        render_pass.set_pipeline(&self.pipelines.region);

        for draw in draws {
            let (x, y, w, h) = draw.scissor;
            render_pass.set_scissor_rect(x, y, w, h);
            let offset = (draw.slot as u64 * self.uniform_stride) as u32;
            render_pass.set_bind_group(0, &bind_group, &[offset]);
            render_pass.draw(0..3, 0..1);
        }
    }
}

/// One scissored draw of a region filter
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct RegionDraw {
    /// Index of the filter and of its uniform slot
    slot: usize,
    /// (x, y, width, height) in target pixels
    scissor: (u32, u32, u32, u32),
}

/// Region draws that read the same blurred texture
#[derive(Clone, Debug, PartialEq, Eq)]
struct RegionPass {
    /// Consecutive filters sharing one blur
    slots: Range<usize>,
    /// Draws in submission order
    draws: Vec<RegionDraw>,
}

/// Order the region draws so the first filter covering a pixel wins
///
/// Consecutive filters sharing a blur form one pass. Passes, and the draws
/// inside each pass, are issued from the last filter to the first; every
/// draw discards pixels outside its region, so a pixel keeps the output of
/// the earliest filter that covers it. Filters entirely off the target are
/// skipped.
fn plan_region_passes(filters: &[RegionFilter], size: (u32, u32)) -> Vec<RegionPass> {
    let mut passes = Vec::new();
    let mut start = 0;
    while start < filters.len() {
        let blur = filters[start].blur();
        let end = filters[start..]
            .iter()
            .position(|f| !Arc::ptr_eq(f.blur(), blur))
            .map_or(filters.len(), |n| start + n);

        let draws: Vec<RegionDraw> = (start..end)
            .rev()
            .filter_map(|slot| {
                let scissor = scissor_rect(filters[slot].uniforms().rectangle, size)?;
                Some(RegionDraw { slot, scissor })
            })
            .collect();
        if !draws.is_empty() {
            passes.push(RegionPass {
                slots: start..end,
                draws,
            });
        }
        start = end;
    }
    passes.reverse();
    passes
}

/// Round `rect` outwards to whole pixels and clip it to `size`
fn scissor_rect(rect: [f32; 4], size: (u32, u32)) -> Option<(u32, u32, u32, u32)> {
    let clip = |v: f32, max: u32| -> u32 {
        if v.is_nan() {
            0
        } else {
            v.clamp(0.0, max as f32) as u32
        }
    };
    let x0 = clip(rect[0].floor(), size.0);
    let y0 = clip(rect[1].floor(), size.1);
    let x1 = clip(rect[2].ceil(), size.0);
    let y1 = clip(rect[3].ceil(), size.1);
    (x1 > x0 && y1 > y0).then(|| (x0, y0, x1 - x0, y1 - y0))
}

fn align_to(value: u64, alignment: u64) -> u64 {
    value.div_ceil(alignment) * alignment
}
