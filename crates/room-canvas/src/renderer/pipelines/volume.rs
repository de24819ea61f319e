//! Ray-marched temperature volumes: one sphere per probe, or the cropped
//! apartment box when no probe is placed.

use super::scene::sensor_wgsl;
use super::{
    create_draw_buffer, mesh_vertex_layout, shader_module, texture_entry, DrawUniforms, GpuMesh,
    SharedLayouts, COMMON_WGSL, DRAW_UNIFORM_STRIDE,
};
use crate::config::BoundingBox;
use crate::renderer::scene_gpu::draw_bind_group;
use crate::renderer::shapes;
use glam::{Mat4, Vec3};

const PROBE_SUBDIVISIONS: u32 = 2;

/// Model matrices of the volumes to march, in draw order.
pub fn volume_transforms(probes: &[Vec3], bbox: &BoundingBox) -> Vec<Mat4> {
    if probes.is_empty() {
        vec![Mat4::from_translation(bbox.center()) * Mat4::from_scale(0.5 * bbox.size())]
    } else {
        probes.iter().map(|p| Mat4::from_translation(*p)).collect()
    }
}

pub struct VolumePipeline {
    probe: wgpu::RenderPipeline,
    full: wgpu::RenderPipeline,
    depth_layout: wgpu::BindGroupLayout,
    sphere: GpuMesh,
    cube: GpuMesh,
    draw_buffer: wgpu::Buffer,
    draw_group: wgpu::BindGroup,
    capacity: usize,
}

impl VolumePipeline {
    pub fn new(device: &wgpu::Device, layouts: &SharedLayouts, color_fmt: wgpu::TextureFormat) -> Self {
        let depth_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Volume Depth Layout"),
            entries: &[texture_entry(0, wgpu::TextureViewDimension::D2, false)],
        });
        let pipe_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Volume PipelineLayout"),
            bind_group_layouts: &[&layouts.frame, &layouts.draw, &layouts.sensor, &depth_layout],
            push_constant_ranges: &[],
        });
        let sensor = sensor_wgsl(2);
        let shader = shader_module(
            device,
            "volume.wgsl",
            &[COMMON_WGSL, &sensor, include_str!("../../../shaders/volume.wgsl")],
        );

        let build = |label: &str, cull_mode: wgpu::Face| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipe_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: "vs_main",
                    buffers: &[mesh_vertex_layout()],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: "fs_main",
                    targets: &[Some(wgpu::ColorTargetState {
                        format: color_fmt,
                        blend: Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    cull_mode: Some(cull_mode),
                    ..Default::default()
                },
                // The march stops at the pre-depth surface itself.
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: wgpu::TextureFormat::Depth32Float,
                    depth_write_enabled: false,
                    depth_compare: wgpu::CompareFunction::Always,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
            })
        };
        let probe = build("Volume Probe Pipeline", wgpu::Face::Back);
        let full = build("Volume Box Pipeline", wgpu::Face::Front);

        let (sphere_vertices, sphere_indices) = shapes::icosphere(PROBE_SUBDIVISIONS);
        let (cube_vertices, cube_indices) = shapes::cube();
        let draw_buffer = create_draw_buffer(device, "Volume Draws", &[DrawUniforms::default()]);
        let draw_group = draw_bind_group(device, layouts, &draw_buffer);

        Self {
            probe,
            full,
            depth_layout,
            sphere: GpuMesh::new(device, "Probe Sphere", &sphere_vertices, &sphere_indices),
            cube: GpuMesh::new(device, "Volume Box", &cube_vertices, &cube_indices),
            draw_buffer,
            draw_group,
            capacity: 1,
        }
    }

    pub fn depth_bind_group(&self, device: &wgpu::Device, pre_depth: &wgpu::TextureView) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Volume Depth Bind"),
            layout: &self.depth_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(pre_depth),
            }],
        })
    }

    /// Uploads one draw per transform, growing the buffer when needed.
    pub fn update(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layouts: &SharedLayouts,
        transforms: &[Mat4],
    ) {
        let draws: Vec<DrawUniforms> = transforms
            .iter()
            .map(|m| DrawUniforms::new(*m, 0, 0))
            .collect();
        if draws.len() > self.capacity {
            self.draw_buffer = create_draw_buffer(device, "Volume Draws", &draws);
            self.draw_group = draw_bind_group(device, layouts, &self.draw_buffer);
            self.capacity = draws.len();
            return;
        }
        for (i, draw) in draws.iter().enumerate() {
            queue.write_buffer(
                &self.draw_buffer,
                i as u64 * DRAW_UNIFORM_STRIDE,
                bytemuck::bytes_of(draw),
            );
        }
    }

    /// Draws `count` volumes uploaded by [`Self::update`]; probes when
    /// `probes` is set, else the single apartment box.
    pub fn draw<'a>(
        &'a self,
        rpass: &mut wgpu::RenderPass<'a>,
        frame: &'a wgpu::BindGroup,
        sensors: &'a wgpu::BindGroup,
        depth: &'a wgpu::BindGroup,
        probes: bool,
        count: usize,
    ) {
        let (pipeline, mesh) = if probes {
            (&self.probe, &self.sphere)
        } else {
            (&self.full, &self.cube)
        };
        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, frame, &[]);
        rpass.set_bind_group(2, sensors, &[]);
        rpass.set_bind_group(3, depth, &[]);
        for i in 0..count.min(self.capacity) {
            let offset = i as u64 * DRAW_UNIFORM_STRIDE;
            rpass.set_bind_group(1, &self.draw_group, &[offset as u32]);
            mesh.draw(rpass);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_probe_list_marches_whole_box() {
        let bbox = BoundingBox {
            min: Vec3::new(0.0, 0.0, 0.0),
            max: Vec3::new(4.0, 2.0, 6.0),
        };
        let transforms = volume_transforms(&[], &bbox);
        assert_eq!(transforms.len(), 1);
        let m = transforms[0];
        assert_eq!(m.transform_point3(Vec3::splat(-1.0)), bbox.min);
        assert_eq!(m.transform_point3(Vec3::ONE), bbox.max);
    }

    #[test]
    fn one_volume_per_probe() {
        let probes = [Vec3::new(1.0, 1.0, 1.0), Vec3::new(3.0, 1.5, 2.0)];
        let transforms = volume_transforms(&probes, &BoundingBox::default());
        assert_eq!(transforms.len(), 2);
        assert_eq!(transforms[1].transform_point3(Vec3::ZERO), probes[1]);
    }
}
