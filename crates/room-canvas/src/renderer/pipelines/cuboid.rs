//! Invisible per-sensor boxes writing the sensor ID into the sensor ID target.

use super::{
    create_draw_buffer, depth_state, mesh_vertex_layout, shader_module, DrawUniforms, GpuMesh,
    SharedLayouts, COMMON_WGSL, DRAW_UNIFORM_STRIDE,
};
use crate::renderer::scene_gpu::draw_bind_group;
use crate::renderer::shapes;
use glam::{Mat4, Vec3};

/// One draw per labelled sensor, encoding the sensor ID in the ID slot.
pub fn cuboid_draws(cuboids: &[(u32, Vec3)]) -> Vec<DrawUniforms> {
    cuboids
        .iter()
        .map(|(sensor_id, position)| DrawUniforms::new(Mat4::from_translation(*position), *sensor_id, 0))
        .collect()
}

pub struct CuboidPipeline {
    pipeline: wgpu::RenderPipeline,
    cube: GpuMesh,
    draw_buffer: wgpu::Buffer,
    draw_group: wgpu::BindGroup,
    count: usize,
}

impl CuboidPipeline {
    pub fn new(device: &wgpu::Device, layouts: &SharedLayouts, id_fmt: wgpu::TextureFormat) -> Self {
        let pipe_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Cuboid PipelineLayout"),
            bind_group_layouts: &[&layouts.frame, &layouts.draw],
            push_constant_ranges: &[],
        });
        let shader = shader_module(
            device,
            "cuboid.wgsl",
            &[COMMON_WGSL, include_str!("../../../shaders/cuboid.wgsl")],
        );
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Cuboid Pipeline"),
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
                    format: id_fmt,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(depth_state(false)),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        let (vertices, indices) = shapes::cube();
        let draw_buffer = create_draw_buffer(device, "Cuboid Draws", &[DrawUniforms::default()]);
        let draw_group = draw_bind_group(device, layouts, &draw_buffer);

        Self {
            pipeline,
            cube: GpuMesh::new(device, "Cuboid", &vertices, &indices),
            draw_buffer,
            draw_group,
            count: 0,
        }
    }

    pub fn update(&mut self, device: &wgpu::Device, layouts: &SharedLayouts, cuboids: &[(u32, Vec3)]) {
        let draws = cuboid_draws(cuboids);
        self.count = draws.len();
        if draws.is_empty() {
            return;
        }
        self.draw_buffer = create_draw_buffer(device, "Cuboid Draws", &draws);
        self.draw_group = draw_bind_group(device, layouts, &self.draw_buffer);
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn draw<'a>(&'a self, rpass: &mut wgpu::RenderPass<'a>, frame: &'a wgpu::BindGroup) {
        if self.count == 0 {
            return;
        }
        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, frame, &[]);
        for i in 0..self.count {
            let offset = i as u64 * DRAW_UNIFORM_STRIDE;
            rpass.set_bind_group(1, &self.draw_group, &[offset as u32]);
            self.cube.draw(rpass);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::picking::encode_id;

    #[test]
    fn cuboids_encode_sensor_ids() {
        let draws = cuboid_draws(&[(17, Vec3::new(1.0, 2.0, 3.0)), (300, Vec3::ZERO)]);
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].node_encoded, encode_id(17));
        assert_eq!(draws[1].node_encoded, encode_id(300));
        assert_eq!(draws[0].model[3], [1.0, 2.0, 3.0, 1.0]);
    }
}
