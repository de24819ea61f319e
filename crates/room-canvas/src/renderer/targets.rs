//! Off-screen render targets shared by the scene passes, the picker and
//! the post stack.

use crate::picking::IdTarget;

pub const SHADOW_MAP_SIZE: u32 = 2048;

pub struct Targets {
    _depth_tex: wgpu::Texture,
    _normal_tex: wgpu::Texture,
    _color_tex: wgpu::Texture,
    // Read back by the picker and the label obstruction test.
    pub pre_depth_tex: wgpu::Texture,
    pub asset_id_tex: wgpu::Texture,
    pub asset_raw_tex: wgpu::Texture,
    pub node_id_tex: wgpu::Texture,
    pub sensor_id_tex: wgpu::Texture,

    pub depth: wgpu::TextureView,
    /// NDC depth of the closest surface, cleared to `DEPTH_CLEAR`.
    pub pre_depth: wgpu::TextureView,
    pub normal: wgpu::TextureView,
    pub color: wgpu::TextureView,
    /// Encoded asset ID sampled by the post stack.
    pub asset_id: wgpu::TextureView,
    /// The same asset ID as a plain integer, read by the picker.
    pub asset_raw: wgpu::TextureView,
    /// Hierarchy node identifiers.
    pub node_id: wgpu::TextureView,
    /// Sensor cuboid identifiers, keyed by sensor ID.
    pub sensor_id: wgpu::TextureView,

    pub depth_fmt: wgpu::TextureFormat,
    pub pre_depth_fmt: wgpu::TextureFormat,
    pub normal_fmt: wgpu::TextureFormat,
    pub color_fmt: wgpu::TextureFormat,
    pub id_fmt: wgpu::TextureFormat,
    pub raw_id_fmt: wgpu::TextureFormat,

    pub width: u32,
    pub height: u32,
}

impl Targets {
    pub fn new(device: &wgpu::Device, size: winit::dpi::PhysicalSize<u32>) -> Self {
        let width = size.width.max(1);
        let height = size.height.max(1);
        let tex_size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let depth_fmt = wgpu::TextureFormat::Depth32Float;
        let pre_depth_fmt = wgpu::TextureFormat::R32Float;
        let normal_fmt = wgpu::TextureFormat::Rgba16Float;
        let color_fmt = wgpu::TextureFormat::Rgba16Float;
        let id_fmt = wgpu::TextureFormat::Rgba8Unorm;
        let raw_id_fmt = wgpu::TextureFormat::R32Uint;

        let create_tex = |label: &str, format, usage| {
            device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size: tex_size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage,
                view_formats: &[],
            })
        };

        let sampled = wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING;
        let readable = sampled | wgpu::TextureUsages::COPY_SRC;
        let copyable = wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC;

        let depth_tex = create_tex(
            "Scene Depth Target",
            depth_fmt,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        );
        let pre_depth_tex = create_tex("Pre-Depth Target", pre_depth_fmt, readable);
        let normal_tex = create_tex("Normal Target", normal_fmt, sampled);
        let color_tex = create_tex("Scene Color Target", color_fmt, sampled);
        let asset_id_tex = create_tex("Asset ID Target", id_fmt, readable);
        let asset_raw_tex = create_tex("Asset Raw ID Target", raw_id_fmt, copyable);
        let node_id_tex = create_tex("Node ID Target", id_fmt, readable);
        let sensor_id_tex = create_tex("Sensor ID Target", id_fmt, copyable);

        let view = |t: &wgpu::Texture| t.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            depth: view(&depth_tex),
            pre_depth: view(&pre_depth_tex),
            normal: view(&normal_tex),
            color: view(&color_tex),
            asset_id: view(&asset_id_tex),
            asset_raw: view(&asset_raw_tex),
            node_id: view(&node_id_tex),
            sensor_id: view(&sensor_id_tex),
            _depth_tex: depth_tex,
            _normal_tex: normal_tex,
            _color_tex: color_tex,
            pre_depth_tex,
            asset_id_tex,
            asset_raw_tex,
            node_id_tex,
            sensor_id_tex,
            depth_fmt,
            pre_depth_fmt,
            normal_fmt,
            color_fmt,
            id_fmt,
            raw_id_fmt,
            width,
            height,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, size: winit::dpi::PhysicalSize<u32>) {
        *self = Self::new(device, size);
    }

    pub fn size(&self) -> glam::Vec2 {
        glam::Vec2::new(self.width as f32, self.height as f32)
    }

    /// Texture the picker reads for `target`.
    pub fn id_texture(&self, target: IdTarget) -> &wgpu::Texture {
        match target {
            IdTarget::Asset => &self.asset_raw_tex,
            IdTarget::Node => &self.node_id_tex,
            IdTarget::Sensor => &self.sensor_id_tex,
        }
    }
}

/// Light-space depth encoded per shadow mode, plus its depth buffer.
pub struct ShadowTarget {
    _color_tex: wgpu::Texture,
    _depth_tex: wgpu::Texture,
    pub color: wgpu::TextureView,
    pub depth: wgpu::TextureView,
    pub color_fmt: wgpu::TextureFormat,
    pub depth_fmt: wgpu::TextureFormat,
}

impl ShadowTarget {
    pub fn new(device: &wgpu::Device) -> Self {
        let color_fmt = wgpu::TextureFormat::Rgba32Float;
        let depth_fmt = wgpu::TextureFormat::Depth32Float;
        let create_tex = |label: &str, format, usage| {
            device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width: SHADOW_MAP_SIZE,
                    height: SHADOW_MAP_SIZE,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage,
                view_formats: &[],
            })
        };
        let color_tex = create_tex(
            "Shadow Map",
            color_fmt,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        );
        let depth_tex = create_tex(
            "Shadow Depth",
            depth_fmt,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        );
        Self {
            color: color_tex.create_view(&wgpu::TextureViewDescriptor::default()),
            depth: depth_tex.create_view(&wgpu::TextureViewDescriptor::default()),
            _color_tex: color_tex,
            _depth_tex: depth_tex,
            color_fmt,
            depth_fmt,
        }
    }
}
