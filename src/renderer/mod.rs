pub mod material_atlas;
pub mod mesh;
pub mod particle_pipeline;
pub mod pipeline;
pub mod post_process;

use std::sync::Arc;

use wgpu::util::DeviceExt;
use winit::window::Window;

use material_atlas::MaterialAtlas;
use mesh::GpuMesh;
use particle_pipeline::{ParticlePipeline, ParticleVertex, create_particle_pipeline, particle_vertices};
use pipeline::{InstanceRaw, LightsUniform, ScenePipeline, create_depth_view, create_scene_pipeline};
use post_process::PostProcessStack;

use crate::assets::{Material, ResourceManager};
use crate::camera::CameraUniform;
use crate::engine::{RenderBackend, RenderError, RenderFrame};
use crate::scene::{SceneGraph, Shape};

/// Instances of one shape, grouped so each shape is a single draw call.
#[derive(Default)]
struct InstanceBatches {
    cubes: Vec<InstanceRaw>,
    spheres: Vec<InstanceRaw>,
}

/// A vertex/instance buffer that only reallocates when it needs to grow.
struct DynamicBuffer {
    label: &'static str,
    usage: wgpu::BufferUsages,
    buffer: Option<wgpu::Buffer>,
    capacity: u64,
}

impl DynamicBuffer {
    fn new(label: &'static str, usage: wgpu::BufferUsages) -> Self {
        Self { label, usage: usage | wgpu::BufferUsages::COPY_DST, buffer: None, capacity: 0 }
    }

    /// Upload `bytes`, growing to the next power of two (min 4 KiB).
    fn write(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        let len = bytes.len() as u64;
        if self.buffer.is_none() || len > self.capacity {
            let capacity = len.next_power_of_two().max(4096);
            self.buffer = Some(device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(self.label),
                size: capacity,
                usage: self.usage,
                mapped_at_creation: false,
            }));
            self.capacity = capacity;
        }
        if let Some(buffer) = &self.buffer {
            queue.write_buffer(buffer, 0, bytes);
        }
    }
}

pub struct Renderer {
    pub window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    pub(crate) device: wgpu::Device,
    pub(crate) queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    scene_pipeline: ScenePipeline,
    particle_pipeline: ParticlePipeline,
    camera_buffer: wgpu::Buffer,
    lights_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    atlas: MaterialAtlas,
    atlas_bind_group: wgpu::BindGroup,
    /// `ResourceManager::revision` the atlas was built from.
    atlas_revision: u64,
    cube: GpuMesh,
    sphere: GpuMesh,
    instance_buffer: DynamicBuffer,
    particle_buffer: DynamicBuffer,
    particle_scratch: Vec<ParticleVertex>,
    depth_view: wgpu::TextureView,
    pub post_process: PostProcessStack,
}

impl Renderer {
    pub async fn new(window: Arc<Window>) -> Result<Self, RenderError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(Arc::clone(&window))
            .map_err(|e| RenderError::Init(e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                compatible_surface: Some(&surface),
                ..Default::default()
            })
            .await
            .map_err(|e| RenderError::Init(e.to_string()))?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor::default())
            .await
            .map_err(|e| RenderError::Init(e.to_string()))?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| RenderError::Init("surface reports no texture formats".into()))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: caps.alpha_modes.first().copied().unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        tracing::info!(adapter = %adapter.get_info().name, ?format, "renderer ready");

        let scene_pipeline = create_scene_pipeline(&device, format);
        let particle_pipeline =
            create_particle_pipeline(&device, format, &scene_pipeline.frame_bind_group_layout);

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("camera_buffer"),
            contents: bytemuck::bytes_of(&<CameraUniform as bytemuck::Zeroable>::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let lights_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("lights_buffer"),
            contents: bytemuck::bytes_of(&<LightsUniform as bytemuck::Zeroable>::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_bg"),
            layout: &scene_pipeline.frame_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: camera_buffer.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 1, resource: lights_buffer.as_entire_binding() },
            ],
        });

        let atlas = MaterialAtlas::empty(&device, &queue);
        let atlas_bind_group = create_atlas_bind_group(&device, &scene_pipeline, &atlas);

        let depth_view = create_depth_view(&device, config.width, config.height);
        let post_process = PostProcessStack::new(&device, &config);

        Ok(Self {
            cube: GpuMesh::upload(&device, Shape::Cube),
            sphere: GpuMesh::upload(&device, Shape::Sphere),
            window,
            surface,
            device,
            queue,
            config,
            scene_pipeline,
            particle_pipeline,
            camera_buffer,
            lights_buffer,
            frame_bind_group,
            atlas,
            atlas_bind_group,
            atlas_revision: 0,
            instance_buffer: DynamicBuffer::new("instance_buffer", wgpu::BufferUsages::VERTEX),
            particle_buffer: DynamicBuffer::new("particle_buffer", wgpu::BufferUsages::VERTEX),
            particle_scratch: Vec::new(),
            depth_view,
            post_process,
        })
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Rebuild the material atlas when the resource manager has reloaded.
    fn sync_atlas(&mut self, resources: &ResourceManager) {
        if resources.revision() == self.atlas_revision {
            return;
        }
        match MaterialAtlas::build(&self.device, &self.queue, resources) {
            Ok(atlas) => {
                self.atlas_bind_group = create_atlas_bind_group(&self.device, &self.scene_pipeline, &atlas);
                self.atlas = atlas;
                self.atlas_revision = resources.revision();
            }
            Err(e) => tracing::warn!(error = %e, "material atlas not rebuilt"),
        }
    }

    fn collect_instances(&self, scene: &SceneGraph, resources: &ResourceManager) -> InstanceBatches {
        let fallback = Material::unknown();
        let mut batches = InstanceBatches::default();
        for (_, node) in scene.iter().filter(|(_, n)| n.visible) {
            let material = resources.material(node.material).unwrap_or(&fallback);
            let instance = InstanceRaw::new(node, material, self.atlas.uv(node.material));
            match node.shape {
                Shape::Cube => batches.cubes.push(instance),
                Shape::Sphere => batches.spheres.push(instance),
            }
        }
        batches
    }
}

fn create_atlas_bind_group(
    device: &wgpu::Device,
    pipeline: &ScenePipeline,
    atlas: &MaterialAtlas,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("material_atlas_bg"),
        layout: &pipeline.atlas_bind_group_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&atlas.texture_view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&atlas.sampler),
            },
        ],
    })
}

fn clear_color(scene: &SceneGraph) -> wgpu::Color {
    let [r, g, b, a] = scene.background.0;
    wgpu::Color { r: r as f64, g: g as f64, b: b as f64, a: a as f64 }
}

impl RenderBackend for Renderer {
    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_view = create_depth_view(&self.device, width, height);
        self.post_process.resize(
            &self.device,
            &self.queue,
            &self.config,
            self.window.scale_factor() as f32,
        );
    }

    /// Render one frame.
    ///
    /// 1. Lit meshes (cubes then spheres), depth-tested and depth-writing.
    /// 2. Particle billboards, depth-tested against the meshes.
    /// 3. The post-process chain, when any effect is enabled.
    fn render(&mut self, frame: &RenderFrame<'_>) -> Result<(), RenderError> {
        self.sync_atlas(frame.resources);
        self.post_process.sync(&self.device, &self.queue, frame.post);

        self.queue.write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&frame.camera.build_uniform()));
        self.queue.write_buffer(
            &self.lights_buffer,
            0,
            bytemuck::bytes_of(&LightsUniform::from_lighting(frame.lighting)),
        );

        let batches = self.collect_instances(frame.scene, frame.resources);
        let cube_count = batches.cubes.len() as u32;
        let sphere_count = batches.spheres.len() as u32;
        let mut instances = batches.cubes;
        instances.extend(batches.spheres);
        self.instance_buffer.write(&self.device, &self.queue, bytemuck::cast_slice(&instances));

        self.particle_scratch.clear();
        particle_vertices(frame.particles, &mut self.particle_scratch);
        self.particle_buffer.write(&self.device, &self.queue, bytemuck::cast_slice(&self.particle_scratch));

        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost) => return Err(RenderError::SurfaceLost),
            Err(wgpu::SurfaceError::Outdated) => return Err(RenderError::SurfaceOutdated),
            Err(e) => return Err(RenderError::Backend(e.to_string())),
        };
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("frame_encoder") });

        // Scene goes straight to the swapchain when no post effect is active.
        let use_post = !self.post_process.is_empty();
        let scene_target: &wgpu::TextureView =
            if use_post { self.post_process.main_render_target() } else { &view };

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: scene_target,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color(frame.scene)),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            // ── Meshes ──────────────────────────────────────────────────────
            if let Some(instance_buf) = &self.instance_buffer.buffer {
                if !instances.is_empty() {
                    pass.set_pipeline(&self.scene_pipeline.render_pipeline);
                    pass.set_bind_group(0, &self.frame_bind_group, &[]);
                    pass.set_bind_group(1, &self.atlas_bind_group, &[]);
                    pass.set_vertex_buffer(1, instance_buf.slice(..));

                    for (mesh, range) in [
                        (&self.cube, 0..cube_count),
                        (&self.sphere, cube_count..cube_count + sphere_count),
                    ] {
                        if range.is_empty() {
                            continue;
                        }
                        pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                        pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                        pass.draw_indexed(0..mesh.index_count, 0, range);
                    }
                }
            }

            // ── Particles ───────────────────────────────────────────────────
            if let Some(particle_buf) = &self.particle_buffer.buffer {
                if !self.particle_scratch.is_empty() {
                    let byte_len = std::mem::size_of_val(self.particle_scratch.as_slice()) as u64;
                    pass.set_pipeline(&self.particle_pipeline.render_pipeline);
                    pass.set_bind_group(0, &self.frame_bind_group, &[]);
                    pass.set_vertex_buffer(0, particle_buf.slice(..byte_len));
                    pass.draw(0..self.particle_scratch.len() as u32, 0..1);
                }
            }
        }

        if use_post {
            self.post_process.run(&self.device, &self.queue, &mut encoder, &view);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}
