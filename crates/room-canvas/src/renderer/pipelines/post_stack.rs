//! Screen-space chain run on every accumulation frame:
//! edge outline → SSAO → chromatic aberration → sharpen → running average.

use super::{fs_vbo, sampler_entry, shader_module, texture_entry, uniform_entry};
use crate::renderer::accumulation::{ssao_noise, ssao_spiral_kernel, SPIRAL_SAMPLES_PER_FRAME};
use glam::Mat4;
use rand::rngs::StdRng;
use rand::SeedableRng;
use wgpu::util::DeviceExt;

/// Intermediate texture format
pub const INTERMEDIATE_FMT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

const POST_VS_WGSL: &str = include_str!("../../../shaders/post_common.wgsl");

/// WGSL shader for a simple texture blit/passthrough.
const BLIT_WGSL: &str = r#"
@group(0) @binding(0) var tSrc: texture_2d<f32>;
@group(0) @binding(1) var samp: sampler;

@fragment
fn fs_main(in: VSOut) -> @location(0) vec4<f32> {
    return textureSampleLevel(tSrc, samp, in.uv, 0.0);
}

// Intermediate colors are display values; undo the surface encoding.
@fragment
fn fs_srgb(in: VSOut) -> @location(0) vec4<f32> {
    let c = textureSampleLevel(tSrc, samp, in.uv, 0.0);
    let lo = c.rgb / 12.92;
    let hi = pow((c.rgb + 0.055) / 1.055, vec3<f32>(2.4));
    return vec4<f32>(select(hi, lo, c.rgb <= vec3<f32>(0.04045)), c.a);
}
"#;

const NOISE_SEED: u64 = 0xa0;

/// Ping‑pong textures for multi‑pass rendering
pub struct PingPong {
    pub ping: wgpu::TextureView,
    pub pong: wgpu::TextureView,
    size: wgpu::Extent3d,
    _tex_ping: wgpu::Texture,
    _tex_pong: wgpu::Texture,
}

impl PingPong {
    pub fn new(device: &wgpu::Device, label: &str, width: u32, height: u32) -> Self {
        let size = wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        };
        let make_tex = || {
            device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: INTERMEDIATE_FMT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            })
        };

        let tex_ping = make_tex();
        let tex_pong = make_tex();
        Self {
            ping: tex_ping.create_view(&wgpu::TextureViewDescriptor::default()),
            pong: tex_pong.create_view(&wgpu::TextureViewDescriptor::default()),
            size,
            _tex_ping: tex_ping,
            _tex_pong: tex_pong,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, label: &str, width: u32, height: u32) {
        if self.size.width == width.max(1) && self.size.height == height.max(1) {
            return;
        }
        *self = Self::new(device, label, width, height);
    }

    pub fn swap(&mut self) {
        std::mem::swap(&mut self.ping, &mut self.pong);
    }
}

// -------------------- Uniform Buffers --------------------

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable, Default)]
struct UboEdge {
    inv_size: [f32; 2],
    near: f32,
    far: f32,
    strength: f32,
    depth_threshold: f32,
    normal_threshold: f32,
    _pad: f32,
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable, Default)]
struct UboSsao {
    projection_inverse: [[f32; 4]; 4],
    inv_size: [f32; 2],
    min_distance: f32,
    max_distance: f32,
    far: f32,
    frame: f32,
    radius_px: f32,
    enabled: f32,
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable, Default)]
struct UboChromatic {
    hovered: [f32; 4],
    inv_size: [f32; 2],
    amount: f32,
    vignette: f32,
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable, Default)]
struct UboSharpen {
    inv_size: [f32; 2],
    amount: f32,
    _pad: f32,
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable, Default)]
struct UboAccumulate {
    weight: f32,
    _pad: [f32; 3],
}

// -------------------- Post Parameters & Stack --------------------

#[derive(Clone, Copy, Debug)]
pub struct PostParams {
    pub edge_strength: f32,
    pub edge_depth_threshold: f32,
    pub edge_normal_threshold: f32,
    pub ssao_radius_px: f32,
    pub chromatic_amount: f32,
    pub chromatic_vignette: f32,
    pub sharpen_amount: f32,
}

impl Default for PostParams {
    fn default() -> Self {
        Self {
            edge_strength: 0.35,
            edge_depth_threshold: 0.05,
            edge_normal_threshold: 0.8,
            ssao_radius_px: 48.0,
            chromatic_amount: 0.004,
            chromatic_vignette: 0.6,
            sharpen_amount: 0.15,
        }
    }
}

/// Per-frame state the post chain reads from the renderer.
#[derive(Clone, Copy, Debug)]
pub struct PostFrame {
    pub projection: Mat4,
    pub near: f32,
    pub far: f32,
    pub edges: bool,
    pub ssao: bool,
    pub ssao_min_distance: f32,
    pub ssao_max_distance: f32,
    /// Accumulation frame index; selects the SSAO kernel row.
    pub frame: u32,
    /// Weight of this frame in the running average.
    pub weight: f32,
    /// Encoded ID of the hovered asset, when highlighting is on.
    pub hovered: Option<[f32; 4]>,
}

/// Scene targets the chain samples.
pub struct PostInputs<'a> {
    pub color: &'a wgpu::TextureView,
    pub pre_depth: &'a wgpu::TextureView,
    pub normal: &'a wgpu::TextureView,
    pub asset_id: &'a wgpu::TextureView,
}

/// Which passes [`PostStack::run`] executes, in order.
pub fn enabled_passes(frame: &PostFrame) -> Vec<&'static str> {
    let mut passes = Vec::new();
    if frame.edges {
        passes.push("edge");
    }
    if frame.ssao {
        passes.push("ssao");
    }
    if frame.hovered.is_some() {
        passes.push("chromatic");
    }
    passes.push("sharpen");
    passes.push("accumulate");
    passes
}

pub struct PostStack {
    pingpong: PingPong,
    /// `ping` holds the running average after each [`Self::run`].
    accum: PingPong,
    edge: EdgePass,
    ssao: SsaoPass,
    chromatic: ChromaticPass,
    sharpen: SharpenPass,
    accumulate: AccumulatePass,
    blit: BlitPass,
    noise: wgpu::TextureView,
    kernel: wgpu::TextureView,
    kernel_key: (u32, u32),
    pub params: PostParams,
}

impl PostStack {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        out_fmt: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let mut rng = StdRng::seed_from_u64(NOISE_SEED);
        let noise = device
            .create_texture_with_data(
                queue,
                &wgpu::TextureDescriptor {
                    label: Some("SSAO Noise"),
                    size: wgpu::Extent3d {
                        width: 4,
                        height: 4,
                        depth_or_array_layers: 1,
                    },
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: wgpu::TextureFormat::Rgba8Unorm,
                    usage: wgpu::TextureUsages::TEXTURE_BINDING,
                    view_formats: &[],
                },
                wgpu::util::TextureDataOrder::LayerMajor,
                &ssao_noise(&mut rng),
            )
            .create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            pingpong: PingPong::new(device, "PostStack PingPong", width, height),
            accum: PingPong::new(device, "PostStack Accumulation", width, height),
            edge: EdgePass::new(device, INTERMEDIATE_FMT),
            ssao: SsaoPass::new(device, INTERMEDIATE_FMT),
            chromatic: ChromaticPass::new(device, INTERMEDIATE_FMT),
            sharpen: SharpenPass::new(device, INTERMEDIATE_FMT),
            accumulate: AccumulatePass::new(device, INTERMEDIATE_FMT),
            blit: BlitPass::new(device, out_fmt),
            noise,
            kernel: spiral_kernel_texture(device, queue, 1.0, 1),
            kernel_key: (0, 0),
            params: PostParams::default(),
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.pingpong.resize(device, "PostStack PingPong", width, height);
        self.accum.resize(device, "PostStack Accumulation", width, height);
    }

    /// Rebuilds the spiral kernel when the turn count or frame count changed.
    pub fn set_ssao_kernel(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, turns: f32, frames: u32) {
        let key = (turns.to_bits(), frames.max(1));
        if key == self.kernel_key {
            return;
        }
        self.kernel = spiral_kernel_texture(device, queue, turns, key.1);
        self.kernel_key = key;
    }

    /// Post-processes `inputs.color` and folds it into the running average.
    pub fn run(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        inputs: &PostInputs,
        frame: &PostFrame,
    ) {
        let width = self.pingpong.size.width as f32;
        let height = self.pingpong.size.height as f32;
        let inv_size = [1.0 / width, 1.0 / height];
        let params = self.params;
        log::trace!("post chain: {:?}", enabled_passes(frame));

        // `source` always holds the result of the last pass.
        let mut source = inputs.color;
        let mut targets = (&self.pingpong.ping, &self.pingpong.pong);

        if frame.edges {
            let ubo = UboEdge {
                inv_size,
                near: frame.near,
                far: frame.far,
                strength: params.edge_strength,
                depth_threshold: params.edge_depth_threshold,
                normal_threshold: params.edge_normal_threshold,
                _pad: 0.0,
            };
            self.edge.draw(
                device,
                queue,
                encoder,
                targets.0,
                [source, inputs.pre_depth, inputs.normal],
                &ubo,
            );
            source = targets.0;
            std::mem::swap(&mut targets.0, &mut targets.1);
        }

        if frame.ssao {
            let ubo = UboSsao {
                projection_inverse: frame.projection.inverse().to_cols_array_2d(),
                inv_size,
                min_distance: frame.ssao_min_distance,
                max_distance: frame.ssao_max_distance,
                far: frame.far,
                frame: frame.frame as f32,
                radius_px: params.ssao_radius_px,
                enabled: 1.0,
            };
            self.ssao.draw(
                device,
                queue,
                encoder,
                targets.0,
                [source, inputs.pre_depth, inputs.normal, &self.noise, &self.kernel],
                &ubo,
            );
            source = targets.0;
            std::mem::swap(&mut targets.0, &mut targets.1);
        }

        if let Some(hovered) = frame.hovered {
            let ubo = UboChromatic {
                hovered,
                inv_size,
                amount: params.chromatic_amount,
                vignette: params.chromatic_vignette,
            };
            self.chromatic
                .draw(device, queue, encoder, targets.0, [source, inputs.asset_id], &ubo);
            source = targets.0;
            std::mem::swap(&mut targets.0, &mut targets.1);
        }

        let ubo = UboSharpen {
            inv_size,
            amount: params.sharpen_amount,
            _pad: 0.0,
        };
        self.sharpen.draw(device, queue, encoder, targets.0, [source], &ubo);
        source = targets.0;

        let ubo = UboAccumulate {
            weight: frame.weight,
            _pad: [0.0; 3],
        };
        self.accumulate.draw(
            device,
            queue,
            encoder,
            &self.accum.pong,
            [source, &self.accum.ping],
            &ubo,
        );
        self.accum.swap();
    }

    /// Copies the running average to the swapchain.
    pub fn present(&self, device: &wgpu::Device, encoder: &mut wgpu::CommandEncoder, swapchain_dst: &wgpu::TextureView) {
        self.blit.draw(device, encoder, swapchain_dst, &self.accum.ping);
    }
}

fn spiral_kernel_texture(device: &wgpu::Device, queue: &wgpu::Queue, turns: f32, frames: u32) -> wgpu::TextureView {
    let texels = ssao_spiral_kernel(SPIRAL_SAMPLES_PER_FRAME, turns, frames);
    device
        .create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some("SSAO Spiral Kernel"),
                size: wgpu::Extent3d {
                    width: SPIRAL_SAMPLES_PER_FRAME,
                    height: frames,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rg32Float,
                usage: wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            bytemuck::cast_slice(&texels),
        )
        .create_view(&wgpu::TextureViewDescriptor::default())
}

// -------------------- Pass Implementations --------------------

fn post_vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    const ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<[f32; 2]>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &ATTRIBUTES,
    }
}

/// Declares a full-screen pass reading `$textures` non-filterable inputs,
/// followed by a sampler and the `$ubo_type` uniform.
macro_rules! create_post_pass {
    ($name:ident, $ubo_type:ty, $shader:expr, $textures:literal) => {
        struct $name {
            pipeline: wgpu::RenderPipeline,
            layout: wgpu::BindGroupLayout,
            sampler: wgpu::Sampler,
            ubo: wgpu::Buffer,
            fs_vbo: wgpu::Buffer,
        }

        impl $name {
            pub fn new(device: &wgpu::Device, out_fmt: wgpu::TextureFormat) -> Self {
                let mut entries: Vec<wgpu::BindGroupLayoutEntry> = (0..$textures)
                    .map(|i| texture_entry(i, wgpu::TextureViewDimension::D2, false))
                    .collect();
                entries.push(sampler_entry($textures, false));
                entries.push(uniform_entry(
                    $textures + 1,
                    std::mem::size_of::<$ubo_type>() as u64,
                    false,
                ));
                let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some(concat!(stringify!($name), " Layout")),
                    entries: &entries,
                });

                let shader = shader_module(
                    device,
                    $shader,
                    &[POST_VS_WGSL, include_str!(concat!("../../../shaders/", $shader))],
                );

                let pipe_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some(concat!(stringify!($name), " PipelineLayout")),
                    bind_group_layouts: &[&layout],
                    push_constant_ranges: &[],
                });

                let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: Some(concat!(stringify!($name), " Pipeline")),
                    layout: Some(&pipe_layout),
                    vertex: wgpu::VertexState {
                        module: &shader,
                        entry_point: "vs_main",
                        buffers: &[post_vertex_layout()],
                        compilation_options: wgpu::PipelineCompilationOptions::default(),
                    },
                    fragment: Some(wgpu::FragmentState {
                        module: &shader,
                        entry_point: "fs_main",
                        targets: &[Some(wgpu::ColorTargetState {
                            format: out_fmt,
                            blend: None,
                            write_mask: wgpu::ColorWrites::ALL,
                        })],
                        compilation_options: wgpu::PipelineCompilationOptions::default(),
                    }),
                    primitive: wgpu::PrimitiveState::default(),
                    depth_stencil: None,
                    multisample: wgpu::MultisampleState::default(),
                    multiview: None,
                });

                let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
                    label: Some(concat!(stringify!($name), " Sampler")),
                    mag_filter: wgpu::FilterMode::Nearest,
                    min_filter: wgpu::FilterMode::Nearest,
                    ..Default::default()
                });

                let ubo = device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(concat!(stringify!($name), " UBO")),
                    size: std::mem::size_of::<$ubo_type>() as u64,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });

                Self {
                    pipeline,
                    layout,
                    sampler,
                    ubo,
                    fs_vbo: fs_vbo(device, concat!(stringify!($name), " FS VBO")),
                }
            }

            pub fn draw(
                &self,
                device: &wgpu::Device,
                queue: &wgpu::Queue,
                encoder: &mut wgpu::CommandEncoder,
                dst: &wgpu::TextureView,
                textures: [&wgpu::TextureView; $textures as usize],
                ubo: &$ubo_type,
            ) {
                queue.write_buffer(&self.ubo, 0, bytemuck::bytes_of(ubo));
                let mut entries: Vec<wgpu::BindGroupEntry> = textures
                    .iter()
                    .enumerate()
                    .map(|(i, view)| wgpu::BindGroupEntry {
                        binding: i as u32,
                        resource: wgpu::BindingResource::TextureView(view),
                    })
                    .collect();
                entries.push(wgpu::BindGroupEntry {
                    binding: $textures,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                });
                entries.push(wgpu::BindGroupEntry {
                    binding: $textures + 1,
                    resource: self.ubo.as_entire_binding(),
                });
                let bind = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(concat!(stringify!($name), " Bind")),
                    layout: &self.layout,
                    entries: &entries,
                });
                execute_pass(
                    &self.pipeline,
                    encoder,
                    &bind,
                    &self.fs_vbo,
                    dst,
                    concat!(stringify!($name), " Pass"),
                );
            }
        }
    };
}

create_post_pass!(EdgePass, UboEdge, "edge.wgsl", 3u32);
create_post_pass!(SsaoPass, UboSsao, "ssao.wgsl", 5u32);
create_post_pass!(ChromaticPass, UboChromatic, "chromatic.wgsl", 2u32);
create_post_pass!(SharpenPass, UboSharpen, "sharpen.wgsl", 1u32);
create_post_pass!(AccumulatePass, UboAccumulate, "accumulate.wgsl", 2u32);

fn execute_pass(
    pipeline: &wgpu::RenderPipeline,
    encoder: &mut wgpu::CommandEncoder,
    bind_group: &wgpu::BindGroup,
    fs_vbo: &wgpu::Buffer,
    dst: &wgpu::TextureView,
    label: &str,
) {
    let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: dst,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    });

    rpass.set_pipeline(pipeline);
    rpass.set_bind_group(0, bind_group, &[]);
    rpass.set_vertex_buffer(0, fs_vbo.slice(..));
    rpass.draw(0..3, 0..1);
}

struct BlitPass {
    pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    fs_vbo: wgpu::Buffer,
}

impl BlitPass {
    pub fn new(device: &wgpu::Device, out_fmt: wgpu::TextureFormat) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("BlitPass Layout"),
            entries: &[
                texture_entry(0, wgpu::TextureViewDimension::D2, false),
                sampler_entry(1, false),
            ],
        });

        let shader = shader_module(device, "blit.wgsl", &[POST_VS_WGSL, BLIT_WGSL]);

        let pipe_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("BlitPass PipelineLayout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("BlitPass Pipeline"),
            layout: Some(&pipe_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[post_vertex_layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: if out_fmt.is_srgb() { "fs_srgb" } else { "fs_main" },
                targets: &[Some(wgpu::ColorTargetState {
                    format: out_fmt,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("BlitPass Sampler"),
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            pipeline,
            layout,
            sampler,
            fs_vbo: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("BlitPass FS VBO"),
                contents: bytemuck::cast_slice(&super::FS_TRI),
                usage: wgpu::BufferUsages::VERTEX,
            }),
        }
    }

    pub fn draw(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        dst: &wgpu::TextureView,
        t_src: &wgpu::TextureView,
    ) {
        let bind = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Blit Bind"),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(t_src),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });
        execute_pass(&self.pipeline, encoder, &bind, &self.fs_vbo, dst, "Blit Pass");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> PostFrame {
        PostFrame {
            projection: Mat4::IDENTITY,
            near: 0.1,
            far: 100.0,
            edges: true,
            ssao: true,
            ssao_min_distance: 0.0024,
            ssao_max_distance: 0.0116,
            frame: 0,
            weight: 1.0,
            hovered: None,
        }
    }

    #[test]
    fn chain_order_is_fixed() {
        let mut f = frame();
        f.hovered = Some([1.0, 0.0, 0.0, 0.0]);
        assert_eq!(
            enabled_passes(&f),
            ["edge", "ssao", "chromatic", "sharpen", "accumulate"]
        );
    }

    #[test]
    fn disabled_passes_are_skipped() {
        let mut f = frame();
        f.edges = false;
        f.ssao = false;
        assert_eq!(enabled_passes(&f), ["sharpen", "accumulate"]);
    }

    #[test]
    fn uniform_blocks_keep_wgsl_sizes() {
        assert_eq!(std::mem::size_of::<UboEdge>(), 32);
        assert_eq!(std::mem::size_of::<UboSsao>(), 96);
        assert_eq!(std::mem::size_of::<UboChromatic>(), 32);
        assert_eq!(std::mem::size_of::<UboSharpen>(), 16);
        assert_eq!(std::mem::size_of::<UboAccumulate>(), 16);
    }
}
