//! Color-scale legend quad placed next to the metadata labels.

use super::scene::sensor_wgsl;
use super::{
    create_draw_buffer, depth_state, mesh_vertex_layout, shader_module, DrawUniforms, GpuMesh,
    SharedLayouts, COMMON_WGSL,
};
use crate::renderer::scene_gpu::draw_bind_group;
use crate::renderer::shapes;
use glam::Mat4;

pub struct ColorScalePlanePipeline {
    pipeline: wgpu::RenderPipeline,
    quad: GpuMesh,
    draw_buffer: wgpu::Buffer,
    draw_group: wgpu::BindGroup,
    visible: bool,
}

impl ColorScalePlanePipeline {
    pub fn new(device: &wgpu::Device, layouts: &SharedLayouts, color_fmt: wgpu::TextureFormat) -> Self {
        let pipe_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("ColorScalePlane PipelineLayout"),
            bind_group_layouts: &[&layouts.frame, &layouts.draw, &layouts.sensor],
            push_constant_ranges: &[],
        });
        let sensor = sensor_wgsl(2);
        let shader = shader_module(
            device,
            "colorscale.wgsl",
            &[COMMON_WGSL, &sensor, include_str!("../../../shaders/colorscale.wgsl")],
        );
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("ColorScalePlane Pipeline"),
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
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(depth_state(true)),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        let (vertices, indices) = shapes::quad_xz();
        let draw_buffer = create_draw_buffer(device, "ColorScalePlane Draw", &[DrawUniforms::default()]);
        let draw_group = draw_bind_group(device, layouts, &draw_buffer);

        Self {
            pipeline,
            quad: GpuMesh::new(device, "ColorScalePlane", &vertices, &indices),
            draw_buffer,
            draw_group,
            visible: false,
        }
    }

    pub fn update(&mut self, queue: &wgpu::Queue, transform: Option<Mat4>) {
        self.visible = transform.is_some();
        if let Some(model) = transform {
            queue.write_buffer(
                &self.draw_buffer,
                0,
                bytemuck::bytes_of(&DrawUniforms::new(model, 0, 0)),
            );
        }
    }

    pub fn draw<'a>(
        &'a self,
        rpass: &mut wgpu::RenderPass<'a>,
        frame: &'a wgpu::BindGroup,
        sensors: &'a wgpu::BindGroup,
    ) {
        if !self.visible {
            return;
        }
        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, frame, &[]);
        rpass.set_bind_group(1, &self.draw_group, &[0]);
        rpass.set_bind_group(2, sensors, &[]);
        self.quad.draw(rpass);
    }
}
