//! Pipelines and the layouts they share.
//!
//! Scene pipelines agree on the first two bind groups: group 0 holds the
//! per-view [`FrameUniforms`], group 1 the per-draw [`DrawUniforms`] bound
//! with a dynamic offset.

pub mod color_scale_plane;
pub mod cuboid;
pub mod label_pass;
pub mod post_stack;
pub mod scene;
pub mod volume;

use crate::scene::MeshVertex;
use std::borrow::Cow;
use wgpu::util::DeviceExt;

/// Prepended to every scene shader.
pub const COMMON_WGSL: &str = include_str!("../../../shaders/common.wgsl");
/// Distance-field and shadow lookups used by the asset and volume shaders.
pub const SENSOR_WGSL: &str = include_str!("../../../shaders/sensor_common.wgsl");

/// Full-screen triangle vertices
pub const FS_TRI: [[f32; 2]; 3] = [[-1.0, -1.0], [3.0, -1.0], [-1.0, 3.0]];

/// Dynamic-offset stride of the per-draw uniform array.
pub const DRAW_UNIFORM_STRIDE: u64 = 256;

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniforms {
    pub view_projection: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    /// xyz eye, w near plane.
    pub eye_near: [f32; 4],
    /// xy clip-space jitter, zw frame size in pixels.
    pub ndc_offset: [f32; 4],
    /// Encoded hovered asset ID.
    pub hovered: [f32; 4],
    /// x far plane, y highlight enabled, z shadow mode index.
    pub options: [f32; 4],
    pub shadow_params: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DrawUniforms {
    pub model: [[f32; 4]; 4],
    pub node_encoded: [f32; 4],
    pub asset_encoded: [f32; 4],
    /// x node ID, y asset ID.
    pub ids: [u32; 4],
}

const _: () = assert!(std::mem::size_of::<DrawUniforms>() as u64 <= DRAW_UNIFORM_STRIDE);

impl DrawUniforms {
    pub fn new(model: glam::Mat4, node_id: u32, asset_id: u32) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            node_encoded: crate::picking::encode_id(node_id),
            asset_encoded: crate::picking::encode_id(asset_id),
            ids: [node_id, asset_id, 0, 0],
        }
    }
}

/// Writes `draws` into a fresh buffer laid out with [`DRAW_UNIFORM_STRIDE`].
pub fn create_draw_buffer(device: &wgpu::Device, label: &str, draws: &[DrawUniforms]) -> wgpu::Buffer {
    let stride = DRAW_UNIFORM_STRIDE as usize;
    let mut bytes = vec![0u8; stride * draws.len().max(1)];
    for (i, draw) in draws.iter().enumerate() {
        let raw = bytemuck::bytes_of(draw);
        bytes[i * stride..i * stride + raw.len()].copy_from_slice(raw);
    }
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: &bytes,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

pub fn uniform_entry(binding: u32, size: u64, dynamic: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: dynamic,
            min_binding_size: wgpu::BufferSize::new(size),
        },
        count: None,
    }
}

pub fn texture_entry(
    binding: u32,
    view_dimension: wgpu::TextureViewDimension,
    filterable: bool,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable },
            view_dimension,
            multisampled: false,
        },
        count: None,
    }
}

pub fn sampler_entry(binding: u32, filtering: bool) -> wgpu::BindGroupLayoutEntry {
    let ty = if filtering {
        wgpu::SamplerBindingType::Filtering
    } else {
        wgpu::SamplerBindingType::NonFiltering
    };
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(ty),
        count: None,
    }
}

/// Bind group layouts used across the scene pipelines.
pub struct SharedLayouts {
    pub frame: wgpu::BindGroupLayout,
    pub draw: wgpu::BindGroupLayout,
    /// Base color texture, sampler, [`scene::MaterialUniforms`].
    pub material: wgpu::BindGroupLayout,
    /// Sensor data and the textures the heatmap is sampled from.
    pub sensor: wgpu::BindGroupLayout,
}

impl SharedLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        use wgpu::TextureViewDimension::{D2, D3};

        let frame = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Frame Layout"),
            entries: &[uniform_entry(
                0,
                std::mem::size_of::<FrameUniforms>() as u64,
                false,
            )],
        });
        let draw = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Draw Layout"),
            entries: &[uniform_entry(
                0,
                std::mem::size_of::<DrawUniforms>() as u64,
                true,
            )],
        });
        let material = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Material Layout"),
            entries: &[
                texture_entry(0, D2, true),
                sampler_entry(1, true),
                uniform_entry(
                    2,
                    std::mem::size_of::<scene::MaterialUniforms>() as u64,
                    false,
                ),
            ],
        });
        let sensor = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Sensor Layout"),
            entries: &[
                uniform_entry(
                    0,
                    std::mem::size_of::<scene::SensorUniforms>() as u64,
                    false,
                ),
                texture_entry(1, D3, true),
                texture_entry(2, D3, true),
                texture_entry(3, D3, true),
                sampler_entry(4, true),
                texture_entry(5, D2, true),
                sampler_entry(6, true),
                texture_entry(7, D2, false),
                texture_entry(8, D2, true),
            ],
        });

        Self {
            frame,
            draw,
            material,
            sensor,
        }
    }
}

pub fn mesh_vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<MeshVertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &ATTRIBUTES,
    }
}

/// Compiles `parts` concatenated into one WGSL module.
pub fn shader_module(device: &wgpu::Device, label: &str, parts: &[&str]) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(Cow::Owned(parts.concat())),
    })
}

/// Depth state of scene pipelines drawing into `Targets::depth`.
pub fn depth_state(write: bool) -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: wgpu::TextureFormat::Depth32Float,
        depth_write_enabled: write,
        depth_compare: wgpu::CompareFunction::LessEqual,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

pub fn fs_vbo(device: &wgpu::Device, label: &str) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(&FS_TRI),
        usage: wgpu::BufferUsages::VERTEX,
    })
}

/// A mesh on the GPU, drawn indexed.
pub struct GpuMesh {
    pub vertices: wgpu::Buffer,
    pub indices: wgpu::Buffer,
    pub index_count: u32,
}

impl GpuMesh {
    pub fn new(device: &wgpu::Device, label: &str, vertices: &[MeshVertex], indices: &[u32]) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertices: vertex_buffer,
            indices: index_buffer,
            index_count: indices.len() as u32,
        }
    }

    pub fn draw<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>) {
        pass.set_vertex_buffer(0, self.vertices.slice(..));
        pass.set_index_buffer(self.indices.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}
