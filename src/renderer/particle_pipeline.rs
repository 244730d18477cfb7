use crate::effects::particles::Particle;

use super::pipeline::DEPTH_FORMAT;

/// One corner of a camera-facing particle quad. The vertex shader expands
/// `corner` along the camera's right/up axes.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ParticleVertex {
    pub center: [f32; 3],
    /// Half the quad's side in world units.
    pub half_size: f32,
    /// `[-1, 1]²` quad corner.
    pub corner: [f32; 2],
    pub color: [f32; 4],
}

impl ParticleVertex {
    const ATTRIBS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32,
        2 => Float32x2,
        3 => Float32x4,
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ParticleVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

const QUAD: [[f32; 2]; 6] = [
    [-1.0, -1.0],
    [1.0, -1.0],
    [1.0, 1.0],
    [-1.0, -1.0],
    [1.0, 1.0],
    [-1.0, 1.0],
];

/// Append six vertices per visible particle to `out`.
pub fn particle_vertices(particles: &[Particle], out: &mut Vec<ParticleVertex>) {
    out.reserve(particles.len() * QUAD.len());
    for p in particles {
        if p.opacity <= 0.0 || p.size <= 0.0 {
            continue;
        }
        let [r, g, b] = p.color.rgb();
        let color = [r, g, b, p.opacity.clamp(0.0, 1.0)];
        for corner in QUAD {
            out.push(ParticleVertex {
                center: p.position.to_array(),
                half_size: p.size * 0.5,
                corner,
                color,
            });
        }
    }
}

pub struct ParticlePipeline {
    pub render_pipeline: wgpu::RenderPipeline,
}

/// Billboards share the scene's group-0 layout (camera + lights). They depth
/// test against the scene but never write depth.
pub fn create_particle_pipeline(
    device: &wgpu::Device,
    surface_format: wgpu::TextureFormat,
    frame_bind_group_layout: &wgpu::BindGroupLayout,
) -> ParticlePipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("particle_shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("shaders/particle.wgsl").into()),
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("particle_pipeline_layout"),
        bind_group_layouts: &[frame_bind_group_layout],
        ..Default::default()
    });

    let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("particle_pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[ParticleVertex::layout()],
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
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: false,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    });

    ParticlePipeline { render_pipeline }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ParticleKind;
    use crate::scene::Color;
    use glam::Vec3;

    fn particle(opacity: f32, size: f32) -> Particle {
        Particle {
            position: Vec3::new(1.0, 2.0, 3.0),
            velocity: Vec3::ZERO,
            gravity: 0.0,
            lifetime: 1.0,
            max_lifetime: 1.0,
            initial_size: size,
            size,
            opacity,
            color: Color::WHITE,
            material: ParticleKind::Spark,
        }
    }

    #[test]
    fn six_vertices_per_visible_particle() {
        let mut out = Vec::new();
        particle_vertices(&[particle(1.0, 0.4), particle(0.5, 0.2)], &mut out);
        assert_eq!(out.len(), 12);
        assert!(out[..6].iter().all(|v| v.center == [1.0, 2.0, 3.0] && (v.half_size - 0.2).abs() < 1e-6));
        assert!((out[6].color[3] - 0.5).abs() < 1e-6, "alpha carries opacity");
    }

    #[test]
    fn faded_particles_are_skipped() {
        let mut out = Vec::new();
        particle_vertices(&[particle(0.0, 0.4), particle(1.0, 0.0)], &mut out);
        assert!(out.is_empty());
    }
}
