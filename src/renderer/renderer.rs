use crate::error::ViewerError;
use crate::model::{Material, MeshSnapshot, Model, Texture};
use crate::renderer::mesh_render_info::{MeshRenderInfo, WireTopology};
use crate::renderer::uniforms::{DrawUniform, FrameUniform, MaterialUniform};
use crate::renderer::vertex::Vertex;
use crate::settings::{LightSettings, ViewerSettings};
use nalgebra_glm as glm;
use std::sync::Arc;
use wgpu::util::DeviceExt;

pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Uniform buffer plus its bind group for one drawn copy of the model.
pub(crate) struct DrawSlot {
    pub(crate) buffer: wgpu::Buffer,
    pub(crate) bind_group: wgpu::BindGroup,
}

pub struct Renderer {
    pub(crate) surface: wgpu::Surface<'static>,
    pub(crate) device: wgpu::Device,
    pub(crate) queue: wgpu::Queue,
    pub(crate) config: wgpu::SurfaceConfiguration,
    pub(crate) fill_pipeline: wgpu::RenderPipeline,
    pub(crate) wireframe_pipeline: wgpu::RenderPipeline,
    pub(crate) depth_view: wgpu::TextureView,
    pub(crate) frame_buffer: wgpu::Buffer,
    pub(crate) frame_bind_group: wgpu::BindGroup,
    texture_bind_group_layout: wgpu::BindGroupLayout,
    material_bind_group_layout: wgpu::BindGroupLayout,
    pub(crate) white_bind_group: wgpu::BindGroup,
    pub(crate) texture_bind_groups: Vec<wgpu::BindGroup>,
    pub(crate) default_material_bind_group: wgpu::BindGroup,
    pub(crate) solid_draw: DrawSlot,
    pub(crate) wireframe_draw: DrawSlot,
    pub(crate) meshes: Vec<MeshRenderInfo>,
    pub(crate) vertex_buffer: wgpu::Buffer,
    pub(crate) index_buffer: wgpu::Buffer,
    pub(crate) wire_vertex_buffer: wgpu::Buffer,
    pub(crate) wire_index_buffer: wgpu::Buffer,
    pub(crate) wire_topology: WireTopology,
    pub(crate) num_wire_vertices: u32,
    pub(crate) clear_color: wgpu::Color,
    pub(crate) light: LightSettings,
    pub(crate) egui_renderer: egui_wgpu::Renderer,
    egui_ctx: egui::Context,
}

impl Renderer {
    pub async fn new(
        window: &Arc<winit::window::Window>,
        settings: &ViewerSettings,
    ) -> Result<Self, ViewerError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        // Owning the Arc keeps the surface 'static
        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        log::info!("Using adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                ..Default::default()
            })
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| ViewerError::new("no-surface-format"))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shader.wgsl").into()),
        });

        // Group 0: camera and light
        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Frame Buffer"),
            size: size_of::<FrameUniform>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let frame_bind_group_layout = uniform_layout(
            &device,
            "Frame Bind Group Layout",
            wgpu::ShaderStages::VERTEX_FRAGMENT,
        );
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Bind Group"),
            layout: &frame_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        // Group 1: diffuse texture
        let texture_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Texture Bind Group Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });
        let white_bind_group = create_texture_bind_group(
            &device,
            &queue,
            &texture_bind_group_layout,
            &Texture::white(),
        );

        // Group 2: material, group 3: per-copy placement
        let material_bind_group_layout =
            uniform_layout(&device, "Material Bind Group Layout", wgpu::ShaderStages::FRAGMENT);
        let draw_bind_group_layout =
            uniform_layout(&device, "Draw Bind Group Layout", wgpu::ShaderStages::VERTEX);

        let default_material_bind_group = create_material_bind_group(
            &device,
            &material_bind_group_layout,
            &Material::default(),
            false,
        );
        let solid_draw = create_draw_slot(&device, &draw_bind_group_layout, "Solid Draw");
        let wireframe_draw = create_draw_slot(&device, &draw_bind_group_layout, "Wireframe Draw");

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Render Pipeline Layout"),
            bind_group_layouts: &[
                &frame_bind_group_layout,
                &texture_bind_group_layout,
                &material_bind_group_layout,
                &draw_bind_group_layout,
            ],
            push_constant_ranges: &[],
        });

        let fill_pipeline = create_pipeline(
            &device,
            &pipeline_layout,
            &shader,
            config.format,
            "Fill Pipeline",
            wgpu::PrimitiveTopology::TriangleList,
        );
        let wireframe_pipeline = create_pipeline(
            &device,
            &pipeline_layout,
            &shader,
            config.format,
            "Wireframe Pipeline",
            wgpu::PrimitiveTopology::LineList,
        );

        let depth_view = create_depth_view(&device, config.width, config.height);

        let vertex_buffer = empty_buffer(&device, "Vertex Buffer", wgpu::BufferUsages::VERTEX);
        let index_buffer = empty_buffer(&device, "Index Buffer", wgpu::BufferUsages::INDEX);
        let wire_vertex_buffer =
            empty_buffer(&device, "Wireframe Vertex Buffer", wgpu::BufferUsages::VERTEX);
        let wire_index_buffer =
            empty_buffer(&device, "Wireframe Index Buffer", wgpu::BufferUsages::INDEX);

        let [r, g, b] = settings.background_rgb();

        let egui_ctx = egui::Context::default();
        let egui_renderer = egui_wgpu::Renderer::new(&device, config.format, Default::default());

        Ok(Self {
            surface,
            device,
            queue,
            config,
            fill_pipeline,
            wireframe_pipeline,
            depth_view,
            frame_buffer,
            frame_bind_group,
            texture_bind_group_layout,
            material_bind_group_layout,
            white_bind_group,
            texture_bind_groups: Vec::new(),
            default_material_bind_group,
            solid_draw,
            wireframe_draw,
            meshes: Vec::new(),
            vertex_buffer,
            index_buffer,
            wire_vertex_buffer,
            wire_index_buffer,
            wire_topology: WireTopology::Stale,
            num_wire_vertices: 0,
            clear_color: wgpu::Color { r, g, b, a: 1.0 },
            light: settings.light.clone(),
            egui_renderer,
            egui_ctx,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_view = create_depth_view(&self.device, new_size.width, new_size.height);
        }
    }

    pub fn size(&self) -> [f32; 2] {
        [self.config.width as f32, self.config.height as f32]
    }

    pub fn egui_context(&self) -> egui::Context {
        self.egui_ctx.clone()
    }

    /// Upload textures, materials and the static index data of `model`.
    /// Vertex data follows every frame through [`Renderer::update_meshes`].
    pub fn upload_model(&mut self, model: &Model) {
        self.texture_bind_groups = model
            .textures
            .iter()
            .map(|texture| {
                if texture.is_valid() {
                    log::debug!(
                        "Uploading texture '{}' ({}x{})",
                        texture.name,
                        texture.width,
                        texture.height
                    );
                    create_texture_bind_group(
                        &self.device,
                        &self.queue,
                        &self.texture_bind_group_layout,
                        texture,
                    )
                } else {
                    log::warn!("Texture '{}' has invalid dimensions, using white", texture.name);
                    create_texture_bind_group(
                        &self.device,
                        &self.queue,
                        &self.texture_bind_group_layout,
                        &Texture::white(),
                    )
                }
            })
            .collect();

        let mut all_indices: Vec<u32> = Vec::new();
        let mut base_vertex: i32 = 0;
        self.meshes.clear();

        for mesh in &model.meshes {
            let texture_id = model.texture_for(mesh);
            let default_material = Material::default();
            let material = model.material_for(mesh).unwrap_or(&default_material);
            let material_bind_group = create_material_bind_group(
                &self.device,
                &self.material_bind_group_layout,
                material,
                texture_id.is_some(),
            );

            self.meshes.push(MeshRenderInfo {
                index_start: all_indices.len() as u32,
                index_count: mesh.indices.len() as u32,
                base_vertex,
                texture_id,
                material_bind_group,
            });
            all_indices.extend_from_slice(&mesh.indices);
            base_vertex += mesh.vertex_count() as i32;
        }

        self.index_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Index Buffer"),
                contents: bytemuck::cast_slice(&all_indices),
                usage: wgpu::BufferUsages::INDEX,
            });
        self.vertex_buffer = empty_buffer(&self.device, "Vertex Buffer", wgpu::BufferUsages::VERTEX);
        self.wire_topology = WireTopology::Stale;
        self.num_wire_vertices = 0;

        log::info!(
            "Uploaded model '{}': {} meshes, {} indices, {} textures",
            model.name,
            self.meshes.len(),
            all_indices.len(),
            self.texture_bind_groups.len()
        );
    }

    /// Refresh vertex data from the animated snapshots; `wireframe` feeds
    /// the wireframe copy.
    pub fn update_meshes(
        &mut self,
        snapshots: &[MeshSnapshot],
        wireframe: Option<&MeshSnapshot>,
    ) {
        let vertices: Vec<Vertex> = snapshots.iter().flat_map(Vertex::from_snapshot).collect();
        write_or_grow(
            &self.device,
            &self.queue,
            &mut self.vertex_buffer,
            bytemuck::cast_slice(&vertices),
            "Vertex Buffer",
            wgpu::BufferUsages::VERTEX,
        );

        let Some(wireframe) = wireframe else {
            self.num_wire_vertices = 0;
            return;
        };

        let wire_vertices = Vertex::from_snapshot(wireframe);
        write_or_grow(
            &self.device,
            &self.queue,
            &mut self.wire_vertex_buffer,
            bytemuck::cast_slice(&wire_vertices),
            "Wireframe Vertex Buffer",
            wgpu::BufferUsages::VERTEX,
        );
        self.num_wire_vertices = wire_vertices.len() as u32;

        if self.wire_topology.needs_build() {
            let lines = wireframe.wireframe_indices();
            self.wire_index_buffer =
                self.device
                    .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("Wireframe Index Buffer"),
                        contents: bytemuck::cast_slice(&lines),
                        usage: wgpu::BufferUsages::INDEX,
                    });
            self.wire_topology = WireTopology::Built {
                index_count: lines.len() as u32,
            };
        }
    }

    pub(crate) fn texture_bind_group(&self, texture_id: Option<usize>) -> &wgpu::BindGroup {
        texture_id
            .and_then(|id| self.texture_bind_groups.get(id))
            .unwrap_or(&self.white_bind_group)
    }

    pub(crate) fn write_uniforms(
        &self,
        view_proj: &glm::Mat4,
        eye: [f32; 3],
        separate_specular: bool,
        solid: &glm::Mat4,
        wireframe: &glm::Mat4,
    ) {
        let frame = FrameUniform::new(view_proj, eye, &self.light, separate_specular);
        self.queue
            .write_buffer(&self.frame_buffer, 0, bytemuck::cast_slice(&[frame]));
        self.queue.write_buffer(
            &self.solid_draw.buffer,
            0,
            bytemuck::cast_slice(&[DrawUniform::new(solid)]),
        );
        self.queue.write_buffer(
            &self.wireframe_draw.buffer,
            0,
            bytemuck::cast_slice(&[DrawUniform::new(wireframe)]),
        );
    }
}

fn uniform_layout(
    device: &wgpu::Device,
    label: &str,
    visibility: wgpu::ShaderStages,
) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

fn empty_buffer(device: &wgpu::Device, label: &str, usage: wgpu::BufferUsages) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: 0,
        usage: usage | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// Write `data` into `buffer`, replacing it when it is too small.
fn write_or_grow(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    buffer: &mut wgpu::Buffer,
    data: &[u8],
    label: &str,
    usage: wgpu::BufferUsages,
) {
    if data.is_empty() {
        return;
    }
    if (data.len() as wgpu::BufferAddress) > buffer.size() {
        *buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: data,
            usage: usage | wgpu::BufferUsages::COPY_DST,
        });
    } else {
        queue.write_buffer(buffer, 0, data);
    }
}

fn create_draw_slot(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    label: &str,
) -> DrawSlot {
    let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(&[DrawUniform::new(&glm::identity())]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }],
    });
    DrawSlot { buffer, bind_group }
}

fn create_material_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    material: &Material,
    has_texture: bool,
) -> wgpu::BindGroup {
    let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Material Buffer"),
        contents: bytemuck::cast_slice(&[MaterialUniform::new(material, has_texture)]),
        usage: wgpu::BufferUsages::UNIFORM,
    });
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Material Bind Group"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }],
    })
}

fn create_texture_bind_group(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    texture: &Texture,
) -> wgpu::BindGroup {
    let texture_size = wgpu::Extent3d {
        width: texture.width,
        height: texture.height,
        depth_or_array_layers: 1,
    };

    let gpu_texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(texture.name.as_str()),
        size: texture_size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &gpu_texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &texture.rgba,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * texture.width),
            rows_per_image: Some(texture.height),
        },
        texture_size,
    );

    let view = gpu_texture.create_view(&wgpu::TextureViewDescriptor::default());
    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("Texture Sampler"),
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    });

    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Texture Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&sampler),
            },
        ],
    })
}

fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    depth_texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    label: &str,
    topology: wgpu::PrimitiveTopology,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[Vertex::desc()],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
        cache: None,
    })
}
