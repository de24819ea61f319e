//! Per-sub-frame planning: which passes run, and the uniform blocks they read.

use super::pipelines::scene::{flags, SensorUniforms};
use super::pipelines::FrameUniforms;
use crate::camera::{Camera, LightCamera};
use crate::config::{RendererConfig, ShadowMode};
use crate::picking::encode_id;
use crate::sensors::{pack_asset_values, SensorSlots};
use glam::{Vec2, Vec3};

/// Ordered stages of one sub-frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FramePass {
    PreDepth,
    Normal,
    Shadow,
    Asset,
    Volume,
    HierarchyHighlight,
    /// Hierarchy node IDs.
    NodeIds,
    /// Sensor cuboid IDs, in their own target.
    SensorIds,
    ColorScalePlane,
    Labels,
    Post,
}

/// Scene-independent state the plan depends on.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlanInputs {
    pub has_hierarchy: bool,
    pub has_color_scale_plane: bool,
    pub has_labels: bool,
}

pub fn shadows_active(config: &RendererConfig) -> bool {
    config.sun_is_up && config.enable_shadow_mapping
}

pub fn plan(config: &RendererConfig, inputs: PlanInputs) -> Vec<FramePass> {
    let mut passes = vec![FramePass::PreDepth, FramePass::Normal];
    if shadows_active(config) {
        passes.push(FramePass::Shadow);
    }
    passes.push(FramePass::Asset);
    if config.enable_volume_sensor_data_visualization {
        passes.push(FramePass::Volume);
    }
    if inputs.has_hierarchy {
        passes.push(FramePass::HierarchyHighlight);
    }
    passes.push(FramePass::NodeIds);
    passes.push(FramePass::SensorIds);
    if inputs.has_color_scale_plane {
        passes.push(FramePass::ColorScalePlane);
    }
    if inputs.has_labels {
        passes.push(FramePass::Labels);
    }
    passes.push(FramePass::Post);
    passes
}

/// Value the shadow map is cleared to: fully lit in every mode.
pub fn shadow_clear(mode: &ShadowMode) -> wgpu::Color {
    match *mode {
        ShadowMode::Hard { .. } => wgpu::Color {
            r: 1.0,
            g: 0.0,
            b: 0.0,
            a: 1.0,
        },
        ShadowMode::Exponential { exponent } => wgpu::Color {
            r: (exponent as f64).exp(),
            g: 0.0,
            b: 0.0,
            a: 1.0,
        },
        ShadowMode::Variance { .. } => wgpu::Color {
            r: 1.0,
            g: 1.0,
            b: 0.0,
            a: 1.0,
        },
        ShadowMode::ExponentialVariance { exponents, .. } => {
            let pos = (exponents[0] as f64).exp();
            let neg = -(-(exponents[1] as f64)).exp();
            wgpu::Color {
                r: pos,
                g: pos * pos,
                b: neg,
                a: neg * neg,
            }
        }
    }
}

/// Main-camera uniforms; `jitter` is already in NDC.
pub fn camera_uniforms(
    camera: &Camera,
    jitter: Vec2,
    size: Vec2,
    hovered_asset: Option<u32>,
    config: &RendererConfig,
) -> FrameUniforms {
    let eye = camera.eye();
    FrameUniforms {
        view_projection: camera.view_projection().to_cols_array_2d(),
        view: camera.view().to_cols_array_2d(),
        eye_near: [eye.x, eye.y, eye.z, camera.near],
        ndc_offset: [jitter.x, jitter.y, size.x, size.y],
        hovered: encode_id(hovered_asset.unwrap_or(0)),
        options: [
            camera.far,
            config.enable_asset_highlighting_on_hover as u32 as f32,
            config.shadow_mode.index() as f32,
            0.0,
        ],
        shadow_params: config.shadow_mode.params(),
    }
}

/// Uniforms of the shadow pass, seen from `light`.
pub fn light_uniforms(light: &LightCamera, mode: &ShadowMode) -> FrameUniforms {
    FrameUniforms {
        view_projection: light.view_projection().to_cols_array_2d(),
        view: light.view().to_cols_array_2d(),
        eye_near: [light.eye.x, light.eye.y, light.eye.z, light.near],
        ndc_offset: [0.0; 4],
        hovered: [0.0; 4],
        options: [light.far, 0.0, mode.index() as f32, 0.0],
        shadow_params: mode.params(),
    }
}

/// Resources that arrive asynchronously and gate the shader paths.
#[derive(Clone, Copy, Debug, Default)]
pub struct SensorResources {
    pub fields_ready: bool,
    pub outside_ready: bool,
    pub color_scale_ready: bool,
}

pub fn sensor_uniforms(
    config: &RendererConfig,
    slots: &SensorSlots,
    light: &LightCamera,
    resources: SensorResources,
) -> SensorUniforms {
    let mut u = SensorUniforms {
        light_view_projection: light.view_projection().to_cols_array_2d(),
        light_eye_far: [light.eye.x, light.eye.y, light.eye.z, light.far],
        light_near_mode: [light.near, config.shadow_mode.index() as f32, 0.0, 0.0],
        shadow_params: config.shadow_mode.params(),
        sensors: slots.pack(&config.sensor_values),
        params: [
            config.idw_exponent,
            config.outside_temperature,
            config.sensor_min_value,
            config.sensor_max_value,
        ],
        bbox_min: extend(config.apartment_bbox.min, config.distance_map_height_slices as f32),
        bbox_max: extend(config.apartment_bbox.max, 0.0),
        volume: [
            config.volume_visible_distances[0],
            config.volume_visible_distances[1],
            2.0,
            0.0,
        ],
        ..Default::default()
    };
    u.set_assets(&pack_asset_values(&config.asset_values));
    u.counts[0] = slots.len() as u32;

    u.set_flag(flags::SURFACE, config.enable_surface_sensor_data_visualization);
    u.set_flag(flags::ASSET_LEVEL, config.visualize_on_asset_level);
    u.set_flag(flags::LOW_BIT, config.use_low_bit_distance_map);
    u.set_flag(flags::FIELDS_READY, resources.fields_ready && !slots.is_empty());
    u.set_flag(flags::OUTSIDE_READY, resources.outside_ready);
    u.set_flag(flags::SHADOWS, shadows_active(config));
    u.set_flag(flags::GRID, config.show_grid);
    u.set_flag(flags::COLOR_SCALE_READY, resources.color_scale_ready);
    u.set_flag(flags::TRANSFER, config.use_transparency_transfer_function);

    if let Some(debug) = config.debug_sensor_distances.as_ref().filter(|d| d.enable_debug) {
        u.set_flag(flags::DEBUG, true);
        u.set_flag(flags::DEBUG_COLOR_MAP, debug.color_map);
        u.set_flag(flags::DEBUG_DIRECT_MIN, debug.direct_neighbor_min_filter);
        u.set_flag(flags::DEBUG_DIAGONAL_MIN, debug.diagonal_min_filter);
        let indices: Vec<u32> = debug.debug_sensor_indices.iter().take(4).copied().collect();
        u.debug_sensors[..indices.len()].copy_from_slice(&indices);
        u.counts[3] = indices.len() as u32;
        u.debug = [debug.max_distance, 0.0, 0.0, 0.0];
        u.debug_offset = extend(debug.offset_factor, 0.0);
    }
    u
}

fn extend(v: Vec3, w: f32) -> [f32; 4] {
    [v.x, v.y, v.z, w]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CameraPose, DebugSensorDistances};
    use crate::sensors::SensorValue;

    fn sensor(id: u32, value: f32) -> SensorValue {
        SensorValue {
            sensor_id: id,
            position: Vec3::ZERO,
            value,
        }
    }

    #[test]
    fn default_plan_order() {
        let passes = plan(&RendererConfig::default(), PlanInputs::default());
        assert_eq!(
            passes,
            vec![
                FramePass::PreDepth,
                FramePass::Normal,
                FramePass::Shadow,
                FramePass::Asset,
                FramePass::NodeIds,
                FramePass::SensorIds,
                FramePass::Post,
            ]
        );
    }

    #[test]
    fn volume_pass_follows_its_toggle() {
        let mut config = RendererConfig {
            enable_volume_sensor_data_visualization: true,
            ..Default::default()
        };
        assert!(plan(&config, PlanInputs::default()).contains(&FramePass::Volume));
        config.enable_volume_sensor_data_visualization = false;
        assert!(!plan(&config, PlanInputs::default()).contains(&FramePass::Volume));
    }

    #[test]
    fn shadow_pass_needs_sun_and_toggle() {
        let night = RendererConfig {
            sun_is_up: false,
            ..Default::default()
        };
        assert!(!plan(&night, PlanInputs::default()).contains(&FramePass::Shadow));
        let off = RendererConfig {
            enable_shadow_mapping: false,
            ..Default::default()
        };
        assert!(!plan(&off, PlanInputs::default()).contains(&FramePass::Shadow));
    }

    #[test]
    fn hierarchy_and_labels_are_optional() {
        let inputs = PlanInputs {
            has_hierarchy: true,
            has_color_scale_plane: true,
            has_labels: true,
        };
        let passes = plan(&RendererConfig::default(), inputs);
        let pos = |p| passes.iter().position(|x| *x == p);
        assert!(pos(FramePass::HierarchyHighlight) < pos(FramePass::NodeIds));
        assert!(pos(FramePass::NodeIds) < pos(FramePass::Labels));
        assert_eq!(passes.last(), Some(&FramePass::Post));
    }

    #[test]
    fn sensor_ids_have_their_own_pass() {
        let passes = plan(&RendererConfig::default(), PlanInputs::default());
        let node = passes.iter().position(|p| *p == FramePass::NodeIds);
        let sensor = passes.iter().position(|p| *p == FramePass::SensorIds);
        assert!(node < sensor);
    }

    #[test]
    fn shadow_clear_is_fully_lit() {
        let c = shadow_clear(&ShadowMode::Hard { bias: 0.001 });
        assert_eq!(c.r, 1.0);
        let c = shadow_clear(&ShadowMode::Exponential { exponent: 2.0 });
        assert!((c.r - 2f64.exp()).abs() < 1e-9);
        let c = shadow_clear(&ShadowMode::ExponentialVariance {
            exponents: [1.0, 2.0],
            light_bleeding_reduction: 0.0,
        });
        assert!((c.g - 2f64.exp()).abs() < 1e-9);
        assert!(c.b < 0.0 && c.a > 0.0);
    }

    #[test]
    fn no_sensors_means_zero_count() {
        let config = RendererConfig::default();
        let u = sensor_uniforms(
            &config,
            &SensorSlots::default(),
            &LightCamera::default(),
            SensorResources {
                fields_ready: true,
                ..Default::default()
            },
        );
        assert_eq!(u.counts[0], 0);
        assert!(!u.has_flag(flags::FIELDS_READY));
        assert!(u.has_flag(flags::SHADOWS));
    }

    #[test]
    fn sensor_uniforms_carry_values_and_debug() {
        let values = vec![sensor(4, 21.0), sensor(9, 19.5)];
        let mut slots = SensorSlots::default();
        slots.assign(&values);
        let config = RendererConfig {
            sensor_values: values,
            debug_sensor_distances: Some(DebugSensorDistances {
                enable_debug: true,
                debug_sensor_indices: vec![1, 0, 1, 0, 1],
                ..Default::default()
            }),
            ..Default::default()
        };
        let u = sensor_uniforms(&config, &slots, &LightCamera::default(), SensorResources::default());
        assert_eq!(u.counts[0], 2);
        assert_eq!(u.counts[3], 4);
        assert!(u.has_flag(flags::DEBUG));
        assert_eq!(u.params[2], config.sensor_min_value);
        assert_eq!(u.bbox_min[3], config.distance_map_height_slices as f32);
    }

    #[test]
    fn camera_uniforms_encode_hover_and_jitter() {
        let camera = Camera::new(CameraPose::default(), 1.5);
        let config = RendererConfig {
            enable_asset_highlighting_on_hover: true,
            ..Default::default()
        };
        let u = camera_uniforms(&camera, Vec2::new(0.01, -0.02), Vec2::new(300.0, 200.0), Some(7), &config);
        assert_eq!(u.hovered, encode_id(7));
        assert_eq!(u.ndc_offset, [0.01, -0.02, 300.0, 200.0]);
        assert_eq!(u.options[1], 1.0);
        assert_eq!(u.eye_near[3], camera.near);
    }
}
