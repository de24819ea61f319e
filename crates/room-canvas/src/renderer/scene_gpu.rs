//! GPU copy of a loaded scene: meshes, material bind groups and the
//! per-draw uniform array in batch slot order.

use super::identity_pass::{BatchEntry, PassBindings, SceneBatches};
use super::pipelines::scene::MaterialUniforms;
use super::pipelines::{create_draw_buffer, DrawUniforms, GpuMesh, SharedLayouts, DRAW_UNIFORM_STRIDE};
use crate::scene::{ImageData, Scene};
use glam::Mat4;
use wgpu::util::DeviceExt;

pub struct SceneGpu {
    pub batches: SceneBatches,
    meshes: Vec<Option<GpuMesh>>,
    materials: Vec<wgpu::BindGroup>,
    draw_group: wgpu::BindGroup,
    _draw_buffer: wgpu::Buffer,
    _textures: Vec<wgpu::Texture>,
}

fn upload_image(device: &wgpu::Device, queue: &wgpu::Queue, image: &ImageData) -> wgpu::Texture {
    let size = wgpu::Extent3d {
        width: image.width.max(1),
        height: image.height.max(1),
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Material Texture"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    if image.rgba.len() as u64 == 4 * size.width as u64 * size.height as u64 {
        queue.write_texture(
            texture.as_image_copy(),
            &image.rgba,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * size.width),
                rows_per_image: Some(size.height),
            },
            size,
        );
    } else {
        log::warn!(
            "material image {}x{} has {} bytes, leaving it blank",
            image.width,
            image.height,
            image.rgba.len()
        );
    }
    texture
}

impl SceneGpu {
    pub fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layouts: &SharedLayouts,
        scene: &Scene,
        label: &str,
    ) -> Self {
        let batches = SceneBatches::preprocess(scene, Mat4::IDENTITY);

        let meshes = scene
            .geometries
            .iter()
            .map(|g| {
                (!g.vertices.is_empty() && !g.indices.is_empty())
                    .then(|| GpuMesh::new(device, label, &g.vertices, &g.indices))
            })
            .collect();

        let white = ImageData {
            width: 1,
            height: 1,
            rgba: vec![255; 4],
        };
        let mut textures: Vec<wgpu::Texture> = scene
            .images
            .iter()
            .map(|image| upload_image(device, queue, image))
            .collect();
        textures.push(upload_image(device, queue, &white));
        let white_index = textures.len() - 1;
        let views: Vec<wgpu::TextureView> = textures
            .iter()
            .map(|t| t.create_view(&wgpu::TextureViewDescriptor::default()))
            .collect();

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Material Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let materials = scene
            .materials
            .iter()
            .map(|material| {
                let texture = material
                    .base_color_texture
                    .filter(|i| *i < white_index)
                    .unwrap_or(white_index);
                let ubo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Material UBO"),
                    contents: bytemuck::bytes_of(&MaterialUniforms {
                        base_color: material.base_color,
                        flags: [u32::from(texture != white_index), 0, 0, 0],
                    }),
                    usage: wgpu::BufferUsages::UNIFORM,
                });
                device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("Material Bind"),
                    layout: &layouts.material,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(&views[texture]),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::Sampler(&sampler),
                        },
                        wgpu::BindGroupEntry {
                            binding: 2,
                            resource: ubo.as_entire_binding(),
                        },
                    ],
                })
            })
            .collect();

        let draws: Vec<DrawUniforms> = batches
            .entries()
            .iter()
            .map(|e| DrawUniforms::new(e.transform, e.node_id, e.asset_id))
            .collect();
        let draw_buffer = create_draw_buffer(device, label, &draws);
        let draw_group = draw_bind_group(device, layouts, &draw_buffer);

        log::info!(
            "uploaded {}: {} draws, {} meshes, {} materials",
            label,
            draws.len(),
            scene.geometries.len(),
            scene.materials.len()
        );

        Self {
            batches,
            meshes,
            materials,
            draw_group,
            _draw_buffer: draw_buffer,
            _textures: textures,
        }
    }
}

pub fn draw_bind_group(
    device: &wgpu::Device,
    layouts: &SharedLayouts,
    buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Draw Bind"),
        layout: &layouts.draw,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer,
                offset: 0,
                size: wgpu::BufferSize::new(std::mem::size_of::<DrawUniforms>() as u64),
            }),
        }],
    })
}

/// Scene pass state: pipeline, view uniforms and the optional material
/// and sensor groups.
pub struct SceneDraw<'a> {
    pub pipeline: &'a wgpu::RenderPipeline,
    pub frame: &'a wgpu::BindGroup,
    pub scene: &'a SceneGpu,
    pub bind_materials: bool,
    /// Bound at group 3.
    pub sensors: Option<&'a wgpu::BindGroup>,
}

impl<'a> PassBindings for SceneDraw<'a> {
    type Pass = wgpu::RenderPass<'a>;

    fn bind_uniforms(&self, pass: &mut wgpu::RenderPass<'a>) {
        pass.set_pipeline(self.pipeline);
        pass.set_bind_group(0, self.frame, &[]);
        if let Some(sensors) = self.sensors {
            pass.set_bind_group(3, sensors, &[]);
        }
    }

    fn bind_material(&self, pass: &mut wgpu::RenderPass<'a>, material: usize) {
        if !self.bind_materials {
            return;
        }
        let scene: &'a SceneGpu = self.scene;
        if let Some(group) = scene.materials.get(material) {
            pass.set_bind_group(2, group, &[]);
        }
    }

    fn draw(&self, pass: &mut wgpu::RenderPass<'a>, entry: &BatchEntry) {
        let scene: &'a SceneGpu = self.scene;
        let Some(Some(mesh)) = scene.meshes.get(entry.geometry) else {
            return;
        };
        let offset = entry.slot as u64 * DRAW_UNIFORM_STRIDE;
        pass.set_bind_group(1, &scene.draw_group, &[offset as u32]);
        mesh.draw(pass);
    }
}
