//! Sensor bind group: distance-field volumes, color-scale and opacity
//! lookups and the sensor uniform block.

use super::pipelines::scene::SensorUniforms;
use super::pipelines::SharedLayouts;
use crate::colorscale::ColorScale;
use crate::config::ColorScaleFiltering;
use crate::distance_field::{SensorFields, VolumeData};

fn volume_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    volume: &VolumeData,
) -> wgpu::Texture {
    let size = wgpu::Extent3d {
        width: volume.width.max(1),
        height: volume.height.max(1),
        depth_or_array_layers: volume.depth.max(1),
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D3,
        format: wgpu::TextureFormat::R8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    let expected = size.width as usize * size.height as usize * size.depth_or_array_layers as usize;
    if volume.texels.len() != expected {
        log::warn!(
            "{}: {} texels for {}x{}x{}, leaving it empty",
            label,
            volume.texels.len(),
            size.width,
            size.height,
            size.depth_or_array_layers
        );
        return texture;
    }
    queue.write_texture(
        texture.as_image_copy(),
        &volume.texels,
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(size.width),
            rows_per_image: Some(size.height),
        },
        size,
    );
    texture
}

/// One-row RGBA lookup texture.
fn lookup_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    rgba: &[u8],
) -> wgpu::Texture {
    let width = (rgba.len() / 4).max(1) as u32;
    let size = wgpu::Extent3d {
        width,
        height: 1,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    if rgba.len() == 4 * width as usize {
        queue.write_texture(
            texture.as_image_copy(),
            rgba,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(1),
            },
            size,
        );
    }
    texture
}

fn sampler(device: &wgpu::Device, label: &str, filter: wgpu::FilterMode) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: filter,
        min_filter: filter,
        ..Default::default()
    })
}

pub struct SensorGpu {
    pub uniforms: SensorUniforms,
    ubo: wgpu::Buffer,
    high: wgpu::Texture,
    low: wgpu::Texture,
    outside: wgpu::Texture,
    color_scale: wgpu::Texture,
    transfer: wgpu::Texture,
    field_sampler: wgpu::Sampler,
    nearest: wgpu::Sampler,
    linear: wgpu::Sampler,
    filtering: ColorScaleFiltering,
    bind_group: Option<wgpu::BindGroup>,
}

impl SensorGpu {
    /// Starts with placeholder volumes so the sensor group is always bindable.
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let empty = VolumeData::placeholder();
        let ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Sensor UBO"),
            size: std::mem::size_of::<SensorUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self {
            uniforms: SensorUniforms::default(),
            ubo,
            high: volume_texture(device, queue, "Distance High", &empty),
            low: volume_texture(device, queue, "Distance Low", &empty),
            outside: volume_texture(device, queue, "Distance Outside", &empty),
            color_scale: lookup_texture(device, queue, "Color Scale", &[255, 255, 255, 255]),
            transfer: lookup_texture(device, queue, "Transfer Function", &[255, 255, 255, 255]),
            field_sampler: sampler(device, "Distance Field Sampler", wgpu::FilterMode::Linear),
            nearest: sampler(device, "Color Scale Nearest", wgpu::FilterMode::Nearest),
            linear: sampler(device, "Color Scale Linear", wgpu::FilterMode::Linear),
            filtering: ColorScaleFiltering::Nearest,
            bind_group: None,
        }
    }

    pub fn set_fields(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, fields: &SensorFields) {
        self.high = volume_texture(device, queue, "Distance High", &fields.high);
        self.low = volume_texture(device, queue, "Distance Low", &fields.low);
        self.bind_group = None;
    }

    /// Back to placeholders, e.g. when the sensor set became empty.
    pub fn clear_fields(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        let empty = VolumeData::placeholder();
        self.high = volume_texture(device, queue, "Distance High", &empty);
        self.low = volume_texture(device, queue, "Distance Low", &empty);
        self.bind_group = None;
    }

    pub fn set_outside(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, outside: &VolumeData) {
        self.outside = volume_texture(device, queue, "Distance Outside", outside);
        self.bind_group = None;
    }

    pub fn set_color_scale(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        scale: &ColorScale,
        filtering: ColorScaleFiltering,
    ) {
        self.color_scale = lookup_texture(device, queue, "Color Scale", &scale.to_rgba());
        self.filtering = filtering;
        self.bind_group = None;
    }

    pub fn set_transfer(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, texels: &[u8]) {
        self.transfer = lookup_texture(device, queue, "Transfer Function", texels);
        self.bind_group = None;
    }

    pub fn write_uniforms(&self, queue: &wgpu::Queue) {
        queue.write_buffer(&self.ubo, 0, bytemuck::bytes_of(&self.uniforms));
    }

    /// Drops the cached bind group, e.g. after the shadow map was recreated.
    pub fn invalidate(&mut self) {
        self.bind_group = None;
    }

    pub fn bind_group(
        &mut self,
        device: &wgpu::Device,
        layouts: &SharedLayouts,
        shadow_map: &wgpu::TextureView,
    ) -> &wgpu::BindGroup {
        let ubo = &self.ubo;
        let view = |t: &wgpu::Texture| t.create_view(&wgpu::TextureViewDescriptor::default());
        let textures = [
            &self.high,
            &self.low,
            &self.outside,
            &self.color_scale,
            &self.transfer,
        ];
        let field_sampler = &self.field_sampler;
        let color_sampler = match self.filtering {
            ColorScaleFiltering::Nearest => &self.nearest,
            ColorScaleFiltering::Linear => &self.linear,
        };
        self.bind_group.get_or_insert_with(|| {
            let [high, low, outside, color_scale, transfer] = textures.map(view);
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Sensor Bind"),
                layout: &layouts.sensor,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: ubo.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&high),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(&low),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::TextureView(&outside),
                    },
                    wgpu::BindGroupEntry {
                        binding: 4,
                        resource: wgpu::BindingResource::Sampler(field_sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 5,
                        resource: wgpu::BindingResource::TextureView(&color_scale),
                    },
                    wgpu::BindGroupEntry {
                        binding: 6,
                        resource: wgpu::BindingResource::Sampler(color_sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 7,
                        resource: wgpu::BindingResource::TextureView(shadow_map),
                    },
                    wgpu::BindGroupEntry {
                        binding: 8,
                        resource: wgpu::BindingResource::TextureView(&transfer),
                    },
                ],
            })
        })
    }
}
