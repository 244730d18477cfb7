use wgpu::util::DeviceExt;

use crate::effects::post::{PostEffect, PostProcessSettings};

// ── PostProcessEffect ─────────────────────────────────────────────────────────

pub trait PostProcessEffect {
    /// Unique name used to identify the effect type for toggling (e.g. "bloom").
    fn effect_name(&self) -> &'static str;

    /// Upload this frame's parameters.
    fn set_params(&mut self, _queue: &wgpu::Queue, _params: [f32; 4]) {}

    fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        source_view: &wgpu::TextureView,
        target_view: &wgpu::TextureView,
    );

    fn resize(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        config: &wgpu::SurfaceConfiguration,
        scale_factor: f32,
    );
}

// ── PostProcessStack ──────────────────────────────────────────────────────────

pub struct PostProcessStack {
    effects: Vec<Box<dyn PostProcessEffect>>,
    /// Ping-pong textures for chaining multiple effects.
    view_a: wgpu::TextureView,
    view_b: wgpu::TextureView,
    format: wgpu::TextureFormat,
}

impl PostProcessStack {
    pub fn new(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration) -> Self {
        Self {
            effects: Vec::new(),
            view_a: create_intermediate_view(device, config, "post_process_a"),
            view_b: create_intermediate_view(device, config, "post_process_b"),
            format: config.format,
        }
    }

    /// Add an effect, replacing any existing effect with the same name.
    pub fn add_effect(&mut self, effect: Box<dyn PostProcessEffect>) {
        let name = effect.effect_name();
        self.effects.retain(|e| e.effect_name() != name);
        self.effects.push(effect);
    }

    /// Remove the effect with the given name, if present.
    pub fn remove_effect(&mut self, name: &str) {
        self.effects.retain(|e| e.effect_name() != name);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.effects.iter().any(|e| e.effect_name() == name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.effects.iter().map(|e| e.effect_name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Match the stack to `settings`: add or remove effects by name, keep
    /// chain order and upload every active effect's parameters.
    pub fn sync(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, settings: &PostProcessSettings) {
        for effect in PostEffect::CHAIN {
            let name = effect.name();
            match (settings.is_enabled(effect), self.contains(name)) {
                (true, false) => {
                    tracing::debug!(effect = name, "post effect enabled");
                    self.add_effect(Box::new(ShaderEffect::new(device, self.format, effect)));
                }
                (false, true) => {
                    tracing::debug!(effect = name, "post effect disabled");
                    self.remove_effect(name);
                }
                _ => {}
            }
        }
        self.effects.sort_by_key(|e| chain_position(e.effect_name()));

        for e in &mut self.effects {
            if let Some(effect) = PostEffect::CHAIN.into_iter().find(|p| p.name() == e.effect_name()) {
                e.set_params(queue, settings.params(effect));
            }
        }
    }

    pub fn resize(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        config: &wgpu::SurfaceConfiguration,
        scale_factor: f32,
    ) {
        if config.width == 0 || config.height == 0 { return; }

        self.view_a = create_intermediate_view(device, config, "post_process_a");
        self.view_b = create_intermediate_view(device, config, "post_process_b");

        for effect in &mut self.effects {
            effect.resize(device, queue, config, scale_factor);
        }
    }

    /// The view that the main scene should render into.
    pub fn main_render_target(&self) -> &wgpu::TextureView {
        &self.view_a
    }

    pub fn run(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        final_target_view: &wgpu::TextureView,
    ) {
        let n = self.effects.len();
        let (view_a, view_b) = (&self.view_a, &self.view_b);
        let mut use_a_as_source = true;

        for (i, effect) in self.effects.iter_mut().enumerate() {
            let is_last = i == n - 1;
            let (source, scratch) = if use_a_as_source { (view_a, view_b) } else { (view_b, view_a) };
            let target = if is_last { final_target_view } else { scratch };
            effect.render(device, queue, encoder, source, target);
            use_a_as_source = !use_a_as_source;
        }
    }
}

fn chain_position(name: &str) -> usize {
    PostEffect::CHAIN
        .iter()
        .position(|e| e.name() == name)
        .unwrap_or(PostEffect::CHAIN.len())
}

fn create_intermediate_view(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    label: &str,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: config.format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

// ── Fullscreen Quad Helper ──────────────────────────────────────────────────

pub fn create_fullscreen_pipeline(
    device: &wgpu::Device,
    label: &str,
    shader_source: &str,
    bind_group_layouts: &[&wgpu::BindGroupLayout],
    output_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(shader_source.into()),
    });

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(&format!("{}_layout", label)),
        bind_group_layouts,
        ..Default::default()
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: output_format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

// ── Shaders ─────────────────────────────────────────────────────────────────

const FULLSCREEN_VS: &str = "
struct VertexOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@vertex
fn vs_main(@builtin(vertex_index) vi: u32) -> VertexOut {
    var positions = array<vec2<f32>, 6>(
        vec2<f32>(-1.0,  1.0),
        vec2<f32>(-1.0, -1.0),
        vec2<f32>( 1.0,  1.0),
        vec2<f32>( 1.0,  1.0),
        vec2<f32>(-1.0, -1.0),
        vec2<f32>( 1.0, -1.0),
    );
    var uvs = array<vec2<f32>, 6>(
        vec2<f32>(0.0, 0.0),
        vec2<f32>(0.0, 1.0),
        vec2<f32>(1.0, 0.0),
        vec2<f32>(1.0, 0.0),
        vec2<f32>(0.0, 1.0),
        vec2<f32>(1.0, 1.0),
    );
    var out: VertexOut;
    out.pos = vec4<f32>(positions[vi], 0.0, 1.0);
    out.uv  = uvs[vi];
    return out;
}

@group(0) @binding(0) var t_source: texture_2d<f32>;
@group(0) @binding(1) var s_source: sampler;
@group(1) @binding(0) var<uniform> params: vec4<f32>;
";

/// Fragment stage for `effect`. `params` holds the four floats produced by
/// [`PostProcessSettings::params`].
fn fragment_source(effect: PostEffect) -> &'static str {
    match effect {
        // x threshold, y strength, z radius
        PostEffect::Bloom => "
@fragment
fn fs_main(in: VertexOut) -> @location(0) vec4<f32> {
    let color = textureSample(t_source, s_source, in.uv);
    let spread = params.z * 0.01;
    var glow = vec3<f32>(0.0);
    var weight = 0.0;
    for (var y = -2.0; y <= 2.0; y += 1.0) {
        for (var x = -2.0; x <= 2.0; x += 1.0) {
            let uv = clamp(in.uv + vec2<f32>(x, y) * spread, vec2<f32>(0.0), vec2<f32>(1.0));
            let s = textureSample(t_source, s_source, uv).rgb;
            let luma = dot(s, vec3<f32>(0.2126, 0.7152, 0.0722));
            let w = 1.0 / (1.0 + x * x + y * y);
            glow += s * smoothstep(params.x, params.x + 0.1, luma) * w;
            weight += w;
        }
    }
    return vec4<f32>(color.rgb + glow / weight * params.y, color.a);
}",
        // x channel offset in UV units
        PostEffect::ChromaticAberration => "
@fragment
fn fs_main(in: VertexOut) -> @location(0) vec4<f32> {
    let shift = vec2<f32>(params.x, 0.0);
    let r = textureSample(t_source, s_source, clamp(in.uv + shift, vec2<f32>(0.0), vec2<f32>(1.0))).r;
    let center = textureSample(t_source, s_source, in.uv);
    let b = textureSample(t_source, s_source, clamp(in.uv - shift, vec2<f32>(0.0), vec2<f32>(1.0))).b;
    return vec4<f32>(r, center.g, b, center.a);
}",
        // x offset, y darkness
        PostEffect::Vignette => "
@fragment
fn fs_main(in: VertexOut) -> @location(0) vec4<f32> {
    let texel = textureSample(t_source, s_source, in.uv);
    let uv = (in.uv - vec2<f32>(0.5)) * vec2<f32>(params.x);
    let rgb = mix(texel.rgb, vec3<f32>(1.0 - params.y), dot(uv, uv));
    return vec4<f32>(rgb, texel.a);
}",
        // x intensity, y time
        PostEffect::FilmGrain => "
fn hash(p: vec2<f32>) -> f32 {
    return fract(sin(dot(p, vec2<f32>(12.9898, 78.233))) * 43758.5453);
}

@fragment
fn fs_main(in: VertexOut) -> @location(0) vec4<f32> {
    let texel = textureSample(t_source, s_source, in.uv);
    let noise = hash(in.uv * 1000.0 + vec2<f32>(params.y * 60.0)) - 0.5;
    return vec4<f32>(texel.rgb + vec3<f32>(noise * params.x), texel.a);
}",
    }
}

// ── ShaderEffect ────────────────────────────────────────────────────────────

/// One full-screen pass: source texture + sampler in group 0, a `vec4`
/// parameter uniform in group 1.
pub struct ShaderEffect {
    effect: PostEffect,
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    cached_bg: Option<wgpu::BindGroup>,
    last_source: usize,
    params: [f32; 4],
}

impl ShaderEffect {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat, effect: PostEffect) -> Self {
        let name = effect.name();
        let bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&format!("{name}_bgl")),
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

        let u_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&format!("{name}_uniform_bgl")),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let shader = format!("{FULLSCREEN_VS}\n{}", fragment_source(effect));
        let pipeline = create_fullscreen_pipeline(device, name, &shader, &[&bgl, &u_bgl], format);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let params = [0.0f32; 4];
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{name}_uniform")),
            contents: bytemuck::cast_slice(&params),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{name}_uniform_bg")),
            layout: &u_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        Self {
            effect,
            pipeline,
            bind_group_layout: bgl,
            sampler,
            uniform_buffer,
            uniform_bind_group,
            cached_bg: None,
            last_source: 0,
            params,
        }
    }
}

impl PostProcessEffect for ShaderEffect {
    fn effect_name(&self) -> &'static str { self.effect.name() }

    fn set_params(&mut self, queue: &wgpu::Queue, params: [f32; 4]) {
        if params != self.params {
            queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&params));
            self.params = params;
        }
    }

    fn render(&mut self, device: &wgpu::Device, _queue: &wgpu::Queue, encoder: &mut wgpu::CommandEncoder, source_view: &wgpu::TextureView, target_view: &wgpu::TextureView) {
        let src_addr = source_view as *const _ as usize;
        if self.cached_bg.is_none() || self.last_source != src_addr {
            self.cached_bg = None;
            self.last_source = src_addr;
        }
        let bind_group = self.cached_bg.get_or_insert_with(|| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                layout: &self.bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(source_view) },
                    wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::Sampler(&self.sampler) },
                ],
                label: None,
            })
        });

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(self.effect.name()),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target_view,
                resolve_target: None,
                ops: wgpu::Operations { load: wgpu::LoadOp::Clear(wgpu::Color::BLACK), store: wgpu::StoreOp::Store },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &*bind_group, &[]);
        pass.set_bind_group(1, &self.uniform_bind_group, &[]);
        pass.draw(0..6, 0..1);
    }

    fn resize(&mut self, _device: &wgpu::Device, _queue: &wgpu::Queue, _config: &wgpu::SurfaceConfiguration, _scale_factor: f32) {
        // Texture views are recreated on resize.
        self.cached_bg = None;
    }
}
