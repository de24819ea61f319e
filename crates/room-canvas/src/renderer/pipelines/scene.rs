//! Pipelines drawing scene graphs through the identity-batched pass.

use super::{depth_state, mesh_vertex_layout, shader_module, SharedLayouts, COMMON_WGSL, SENSOR_WGSL};
use crate::sensors::MAX_SENSORS;

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniforms {
    pub base_color: [f32; 4],
    /// x: base color texture bound.
    pub flags: [u32; 4],
}

pub mod flags {
    pub const SURFACE: u32 = 1;
    pub const ASSET_LEVEL: u32 = 2;
    pub const LOW_BIT: u32 = 4;
    pub const FIELDS_READY: u32 = 8;
    pub const OUTSIDE_READY: u32 = 16;
    pub const SHADOWS: u32 = 32;
    pub const DEBUG: u32 = 64;
    pub const DEBUG_COLOR_MAP: u32 = 128;
    pub const DEBUG_DIRECT_MIN: u32 = 256;
    pub const DEBUG_DIAGONAL_MIN: u32 = 512;
    pub const GRID: u32 = 1024;
    pub const COLOR_SCALE_READY: u32 = 2048;
    pub const TRANSFER: u32 = 4096;
}

/// Mirrors `Sensors` in `sensor_common.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SensorUniforms {
    pub light_view_projection: [[f32; 4]; 4],
    pub light_eye_far: [f32; 4],
    pub light_near_mode: [f32; 4],
    pub shadow_params: [f32; 4],
    pub sensors: [[f32; 4]; MAX_SENSORS],
    pub asset_ids: [[u32; 4]; MAX_SENSORS / 4],
    pub asset_values: [[f32; 4]; MAX_SENSORS / 4],
    /// Sensors, assets, flags, debug sensor count.
    pub counts: [u32; 4],
    /// IDW exponent, outside temperature, min value, max value.
    pub params: [f32; 4],
    pub bbox_min: [f32; 4],
    pub bbox_max: [f32; 4],
    pub debug: [f32; 4],
    pub debug_offset: [f32; 4],
    pub debug_sensors: [u32; 4],
    /// Min and max visible distance, step scale.
    pub volume: [f32; 4],
}

impl SensorUniforms {
    pub fn set_flag(&mut self, flag: u32, on: bool) {
        if on {
            self.counts[2] |= flag;
        } else {
            self.counts[2] &= !flag;
        }
    }

    pub fn has_flag(&self, flag: u32) -> bool {
        self.counts[2] & flag != 0
    }

    /// Packs `(asset, value)` pairs into the vec4 arrays.
    pub fn set_assets(&mut self, assets: &[(u32, f32)]) {
        self.asset_ids = Default::default();
        self.asset_values = Default::default();
        let n = assets.len().min(MAX_SENSORS);
        for (i, (id, value)) in assets.iter().take(n).enumerate() {
            self.asset_ids[i / 4][i % 4] = *id;
            self.asset_values[i / 4][i % 4] = *value;
        }
        self.counts[1] = n as u32;
    }
}

/// Sensor WGSL with its bind group index substituted.
pub fn sensor_wgsl(group: u32) -> String {
    SENSOR_WGSL.replace("SENSOR_GROUP", &group.to_string())
}

pub struct ScenePipelines {
    /// Pre-depth into `R32Float`, front faces culled.
    pub depth: wgpu::RenderPipeline,
    pub normal: wgpu::RenderPipeline,
    pub shadow: wgpu::RenderPipeline,
    /// Color, encoded asset ID and raw asset ID.
    pub asset: wgpu::RenderPipeline,
    pub highlight: wgpu::RenderPipeline,
    pub hierarchy_id: wgpu::RenderPipeline,
}

struct PipelineDesc<'a> {
    label: &'a str,
    layout: &'a wgpu::PipelineLayout,
    module: &'a wgpu::ShaderModule,
    fs_entry: &'a str,
    targets: &'a [Option<wgpu::ColorTargetState>],
    cull_mode: Option<wgpu::Face>,
    depth_write: bool,
}

fn build(device: &wgpu::Device, desc: PipelineDesc) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(desc.label),
        layout: Some(desc.layout),
        vertex: wgpu::VertexState {
            module: desc.module,
            entry_point: "vs_main",
            buffers: &[mesh_vertex_layout()],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: desc.module,
            entry_point: desc.fs_entry,
            targets: desc.targets,
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            cull_mode: desc.cull_mode,
            ..Default::default()
        },
        depth_stencil: Some(depth_state(desc.depth_write)),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    })
}

fn opaque(format: wgpu::TextureFormat) -> Option<wgpu::ColorTargetState> {
    Some(wgpu::ColorTargetState {
        format,
        blend: None,
        write_mask: wgpu::ColorWrites::ALL,
    })
}

fn blended(format: wgpu::TextureFormat) -> Option<wgpu::ColorTargetState> {
    Some(wgpu::ColorTargetState {
        format,
        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
        write_mask: wgpu::ColorWrites::ALL,
    })
}

pub struct SceneFormats {
    pub pre_depth: wgpu::TextureFormat,
    pub normal: wgpu::TextureFormat,
    pub shadow: wgpu::TextureFormat,
    pub color: wgpu::TextureFormat,
    pub id: wgpu::TextureFormat,
    pub raw_id: wgpu::TextureFormat,
}

impl ScenePipelines {
    pub fn new(device: &wgpu::Device, layouts: &SharedLayouts, formats: &SceneFormats) -> Self {
        let plain_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene PipelineLayout"),
            bind_group_layouts: &[&layouts.frame, &layouts.draw],
            push_constant_ranges: &[],
        });
        let asset_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Asset PipelineLayout"),
            bind_group_layouts: &[
                &layouts.frame,
                &layouts.draw,
                &layouts.material,
                &layouts.sensor,
            ],
            push_constant_ranges: &[],
        });

        let depth_module = shader_module(
            device,
            "depth.wgsl",
            &[COMMON_WGSL, include_str!("../../../shaders/depth.wgsl")],
        );
        let normal_module = shader_module(
            device,
            "normal.wgsl",
            &[COMMON_WGSL, include_str!("../../../shaders/normal.wgsl")],
        );
        let shadow_module = shader_module(
            device,
            "shadow.wgsl",
            &[COMMON_WGSL, include_str!("../../../shaders/shadow.wgsl")],
        );
        let sensor = sensor_wgsl(3);
        let asset_module = shader_module(
            device,
            "asset.wgsl",
            &[COMMON_WGSL, &sensor, include_str!("../../../shaders/asset.wgsl")],
        );
        let hierarchy_module = shader_module(
            device,
            "hierarchy.wgsl",
            &[COMMON_WGSL, include_str!("../../../shaders/hierarchy.wgsl")],
        );

        let depth = build(
            device,
            PipelineDesc {
                label: "Pre-Depth Pipeline",
                layout: &plain_layout,
                module: &depth_module,
                fs_entry: "fs_main",
                targets: &[opaque(formats.pre_depth)],
                cull_mode: Some(wgpu::Face::Front),
                depth_write: true,
            },
        );
        let normal = build(
            device,
            PipelineDesc {
                label: "Normal Pipeline",
                layout: &plain_layout,
                module: &normal_module,
                fs_entry: "fs_main",
                targets: &[opaque(formats.normal)],
                cull_mode: None,
                depth_write: true,
            },
        );
        let shadow = build(
            device,
            PipelineDesc {
                label: "Shadow Pipeline",
                layout: &plain_layout,
                module: &shadow_module,
                fs_entry: "fs_main",
                targets: &[opaque(formats.shadow)],
                cull_mode: None,
                depth_write: true,
            },
        );
        let asset = build(
            device,
            PipelineDesc {
                label: "Asset Pipeline",
                layout: &asset_layout,
                module: &asset_module,
                fs_entry: "fs_main",
                targets: &[
                    blended(formats.color),
                    opaque(formats.id),
                    opaque(formats.raw_id),
                ],
                cull_mode: None,
                depth_write: true,
            },
        );
        let highlight = build(
            device,
            PipelineDesc {
                label: "Hierarchy Highlight Pipeline",
                layout: &plain_layout,
                module: &hierarchy_module,
                fs_entry: "fs_highlight",
                targets: &[blended(formats.color)],
                cull_mode: None,
                depth_write: false,
            },
        );
        let hierarchy_id = build(
            device,
            PipelineDesc {
                label: "Hierarchy ID Pipeline",
                layout: &plain_layout,
                module: &hierarchy_module,
                fs_entry: "fs_id",
                targets: &[opaque(formats.id)],
                cull_mode: None,
                depth_write: false,
            },
        );

        Self {
            depth,
            normal,
            shadow,
            asset,
            highlight,
            hierarchy_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sensor_uniforms_match_wgsl_layout() {
        // 64 + 3 * 16 + 16 * 16 + 4 * 16 + 4 * 16 + 8 * 16
        assert_eq!(std::mem::size_of::<SensorUniforms>(), 624);
    }

    #[test]
    fn assets_pack_into_vec4_lanes() {
        let mut u = SensorUniforms::default();
        u.set_assets(&[(3, 20.5), (7, 21.0), (9, 19.0), (11, 18.0), (42, 22.0)]);
        assert_eq!(u.counts[1], 5);
        assert_eq!(u.asset_ids[0], [3, 7, 9, 11]);
        assert_eq!(u.asset_ids[1][0], 42);
        assert_eq!(u.asset_values[1][0], 22.0);
    }

    #[test]
    fn flags_toggle_independently() {
        let mut u = SensorUniforms::default();
        u.set_flag(flags::SURFACE, true);
        u.set_flag(flags::SHADOWS, true);
        u.set_flag(flags::SURFACE, false);
        assert!(!u.has_flag(flags::SURFACE));
        assert!(u.has_flag(flags::SHADOWS));
    }

    #[test]
    fn sensor_group_is_substituted() {
        let src = sensor_wgsl(2);
        assert!(src.contains("@group(2) @binding(0) var<uniform> sensors"));
        assert!(!src.contains("SENSOR_GROUP"));
    }
}
