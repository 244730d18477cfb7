use bytemuck::Zeroable;
use glam::{Mat4, Quat};

use crate::assets::Material;
use crate::effects::lighting::LightingManager;
use crate::scene::MeshNode;

use super::material_atlas::UvRect;
use super::mesh::MeshVertex;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
/// Point lights uploaded per frame; the rest are dropped, dimmest first.
pub const MAX_POINT_LIGHTS: usize = 8;

// ── Per-instance data ───────────────────────────────────────────────────────

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    pub model: [[f32; 4]; 4],
    /// Material base color times node tint.
    pub color: [f32; 4],
    /// Atlas sub-rectangle `[u0, v0, u1, v1]`.
    pub uv_rect: [f32; 4],
    /// Emissive color premultiplied by its intensity.
    pub emissive: [f32; 4],
    /// `x` roughness, `y` metalness.
    pub surface: [f32; 4],
}

impl InstanceRaw {
    const ATTRIBS: [wgpu::VertexAttribute; 8] = wgpu::vertex_attr_array![
        3 => Float32x4,  // model col 0
        4 => Float32x4,  // model col 1
        5 => Float32x4,  // model col 2
        6 => Float32x4,  // model col 3
        7 => Float32x4,  // color
        8 => Float32x4,  // uv_rect
        9 => Float32x4,  // emissive
        10 => Float32x4, // surface
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBS,
        }
    }

    pub fn new(node: &MeshNode, material: &Material, uv: UvRect) -> Self {
        let model = Mat4::from_scale_rotation_translation(node.scale, Quat::IDENTITY, node.position);
        let base = material.base_color.0;
        let tint = node.tint.0;
        let strength = node.emissive_override.unwrap_or(material.emissive_intensity);
        let [er, eg, eb] = material.emissive.rgb();
        Self {
            model: model.to_cols_array_2d(),
            color: [0, 1, 2, 3].map(|i| base[i] * tint[i]),
            uv_rect: uv.to_array(),
            emissive: [er * strength, eg * strength, eb * strength, 0.0],
            surface: [material.roughness, material.metalness, 0.0, 0.0],
        }
    }
}

// ── Lights uniform ──────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointLightRaw {
    /// `w` is the range (0 = unbounded).
    pub position: [f32; 4],
    /// `w` is the intensity.
    pub color: [f32; 4],
    /// `x` is the distance decay exponent.
    pub params: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightsUniform {
    /// Premultiplied by intensity.
    pub ambient: [f32; 4],
    /// Direction the sunlight travels in.
    pub sun_direction: [f32; 4],
    pub sun_color: [f32; 4],
    pub points: [PointLightRaw; MAX_POINT_LIGHTS],
    /// `x` is the number of live entries in `points`.
    pub count: [u32; 4],
}

impl LightsUniform {
    pub fn from_lighting(lighting: &LightingManager) -> Self {
        let ambient = lighting.ambient();
        let sun = lighting.directional();
        let mut uniform = Self {
            ambient: premultiply(ambient.color.rgb(), ambient.intensity),
            sun_direction: (-sun.position).normalize_or_zero().extend(0.0).to_array(),
            sun_color: premultiply(sun.color.rgb(), sun.intensity),
            points: [PointLightRaw::zeroed(); MAX_POINT_LIGHTS],
            count: [0; 4],
        };

        let lights = lighting.brightest(MAX_POINT_LIGHTS);
        for (slot, light) in uniform.points.iter_mut().zip(&lights) {
            let [r, g, b] = light.color.rgb();
            *slot = PointLightRaw {
                position: light.position.extend(light.range).to_array(),
                color: [r, g, b, light.intensity],
                params: [light.decay, 0.0, 0.0, 0.0],
            };
        }
        uniform.count[0] = lights.len() as u32;
        uniform
    }
}

fn premultiply([r, g, b]: [f32; 3], intensity: f32) -> [f32; 4] {
    [r * intensity, g * intensity, b * intensity, 1.0]
}

// ── Pipeline ────────────────────────────────────────────────────────────────

pub struct ScenePipeline {
    pub render_pipeline: wgpu::RenderPipeline,
    /// Group 0: camera (binding 0) and lights (binding 1).
    pub frame_bind_group_layout: wgpu::BindGroupLayout,
    /// Group 1: material atlas texture and sampler.
    pub atlas_bind_group_layout: wgpu::BindGroupLayout,
}

pub fn create_scene_pipeline(
    device: &wgpu::Device,
    surface_format: wgpu::TextureFormat,
) -> ScenePipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("scene_shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("shaders/scene.wgsl").into()),
    });

    let uniform_entry = |binding| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    };
    let frame_bind_group_layout =
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame_bgl"),
            entries: &[uniform_entry(0), uniform_entry(1)],
        });

    let atlas_bind_group_layout =
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("atlas_bgl"),
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

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("scene_pipeline_layout"),
        bind_group_layouts: &[&frame_bind_group_layout, &atlas_bind_group_layout],
        ..Default::default()
    });

    let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("scene_pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[MeshVertex::layout(), InstanceRaw::layout()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: Some(wgpu::Face::Back),
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    });

    ScenePipeline { render_pipeline, frame_bind_group_layout, atlas_bind_group_layout }
}

/// Depth buffer matching the surface size.
pub fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
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
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}
