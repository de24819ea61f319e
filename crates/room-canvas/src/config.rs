//! Command-line options and the renderer configuration surface.
//!
//! `RendererConfig` is a plain value type. The renderer keeps the previous
//! snapshot and diffs it against the next one, so every observable property
//! maps onto exactly one [`Change`] flag.

use crate::sensors::{AssetValue, SensorValue, SensorValueLabel};
use clap::Parser;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Command-line options of the `room-canvas` binary.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Primary glTF/GLB scene
    #[arg(long, env = "ROOM_CANVAS_SCENE")]
    pub scene: PathBuf,

    /// Optional hierarchy scene used for hover highlighting and volume probes
    #[arg(long, env = "ROOM_CANVAS_HIERARCHY")]
    pub hierarchy: Option<PathBuf>,

    /// Directory containing `distance-maps/` and `colorscales/`
    #[arg(long, env = "ROOM_CANVAS_ASSET_ROOT")]
    pub asset_root: Option<PathBuf>,

    /// JSON file with a (partial) renderer configuration
    #[arg(long, env = "ROOM_CANVAS_CONFIG")]
    pub config: Option<PathBuf>,

    /// JSON file with candidate labelling positions per sensor
    #[arg(long, env = "ROOM_CANVAS_LABELLING_POSITIONS")]
    pub labelling_positions: Option<PathBuf>,

    /// JSON file with sensor time series
    #[arg(long, env = "ROOM_CANVAS_SENSORS")]
    pub sensors: Option<PathBuf>,

    /// Timestamp (unix millis) to visualise; defaults to the latest sample
    #[arg(long)]
    pub at: Option<i64>,

    /// Interpolate between the samples surrounding `--at` (`--interpolate false` picks the nearest)
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub interpolate: bool,

    /// Visualise the first derivative instead of the value
    #[arg(long, default_value_t = false)]
    pub derivative: bool,

    /// Number of accumulated sub-frames per still image
    #[arg(long, default_value_t = 64)]
    pub multi_frame_number: u32,

    #[arg(long, default_value_t = 1280)]
    pub width: u32,

    #[arg(long, default_value_t = 720)]
    pub height: u32,
}

/// Criterion used to rank surviving label candidates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderBy {
    RunningLength,
    InverseDistanceToCameraEye,
    HowDirectlyFacingCamera,
    HowStraightlyAlignedHorizontally,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LabelFilters {
    pub must_face_camera: bool,
    pub must_be_inside_viewport: bool,
    pub must_not_be_behind_obstacles: bool,
    pub must_not_be_upside_down: bool,
}

impl Default for LabelFilters {
    fn default() -> Self {
        Self {
            must_face_camera: true,
            must_be_inside_viewport: true,
            must_not_be_behind_obstacles: true,
            must_not_be_upside_down: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SensorValueLabelsConfig {
    pub display_labels: bool,
    /// Place labels on authored wall candidates chosen for the current view;
    /// otherwise they float at a fixed offset next to the sensor.
    pub approximate_optimal_labelling_positions: bool,
    pub filters: LabelFilters,
    pub order_by: Vec<OrderBy>,
}

impl Default for SensorValueLabelsConfig {
    fn default() -> Self {
        Self {
            display_labels: true,
            approximate_optimal_labelling_positions: false,
            filters: LabelFilters::default(),
            order_by: vec![
                OrderBy::RunningLength,
                OrderBy::InverseDistanceToCameraEye,
                OrderBy::HowDirectlyFacingCamera,
                OrderBy::HowStraightlyAlignedHorizontally,
            ],
        }
    }
}

/// Closed set of shadow-mapping algorithms with their per-mode parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ShadowMode {
    #[serde(rename_all = "camelCase")]
    Hard { bias: f32 },
    #[serde(rename_all = "camelCase")]
    Exponential { exponent: f32 },
    #[serde(rename_all = "camelCase")]
    Variance {
        min_variance: f32,
        light_bleeding_reduction: f32,
    },
    #[serde(rename_all = "camelCase")]
    ExponentialVariance {
        exponents: [f32; 2],
        light_bleeding_reduction: f32,
    },
}

impl Default for ShadowMode {
    fn default() -> Self {
        Self::Hard { bias: -0.0015 }
    }
}

impl ShadowMode {
    pub fn exponential() -> Self {
        Self::Exponential { exponent: 80.0 }
    }

    pub fn variance() -> Self {
        Self::Variance {
            min_variance: 0.1,
            light_bleeding_reduction: 0.1,
        }
    }

    pub fn exponential_variance() -> Self {
        Self::ExponentialVariance {
            exponents: [30.0, 10.0],
            light_bleeding_reduction: 0.1,
        }
    }

    /// Index used by the shaders to switch between algorithms.
    pub fn index(&self) -> u32 {
        match self {
            Self::Hard { .. } => 0,
            Self::Exponential { .. } => 1,
            Self::Variance { .. } => 2,
            Self::ExponentialVariance { .. } => 3,
        }
    }

    /// Packs the mode parameters as `[bias|exponent|minVariance, exp2, lbr, 0]`.
    pub fn params(&self) -> [f32; 4] {
        match *self {
            Self::Hard { bias } => [bias, 0.0, 0.0, 0.0],
            Self::Exponential { exponent } => [exponent, 0.0, 0.0, 0.0],
            Self::Variance {
                min_variance,
                light_bleeding_reduction,
            } => [min_variance, 0.0, light_bleeding_reduction, 0.0],
            Self::ExponentialVariance {
                exponents,
                light_bleeding_reduction,
            } => [exponents[0], exponents[1], light_bleeding_reduction, 0.0],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Hard { .. } => "Hard",
            Self::Exponential { .. } => "ESM",
            Self::Variance { .. } => "VSM",
            Self::ExponentialVariance { .. } => "EVSM",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SsaoConfig {
    pub min_distance: f32,
    pub max_distance: f32,
    pub spiral_turns: f32,
}

impl Default for SsaoConfig {
    fn default() -> Self {
        Self {
            min_distance: 0.0024,
            max_distance: 0.0116,
            spiral_turns: 4.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ColorScaleFiltering {
    #[default]
    Nearest,
    Linear,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColorScaleConfig {
    pub source: String,
    pub preset: String,
    pub stops: u32,
    pub invert: bool,
    pub filtering: ColorScaleFiltering,
}

impl Default for ColorScaleConfig {
    fn default() -> Self {
        Self {
            source: "colorbrewer".into(),
            preset: "RdYlBu".into(),
            stops: 7,
            invert: true,
            filtering: ColorScaleFiltering::Nearest,
        }
    }
}

/// Opacity lookup used by the volume pass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TransferFunction {
    /// Inverted five-step linear ramp.
    #[default]
    Preset,
    /// Sampled opacity values in `[0, 1]`, evenly spaced over the value range.
    Custom { points: Vec<f32> },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DebugSensorDistances {
    pub enable_debug: bool,
    pub debug_sensor_indices: Vec<u32>,
    pub max_distance: f32,
    pub color_map: bool,
    pub direct_neighbor_min_filter: bool,
    pub diagonal_min_filter: bool,
    pub offset_factor: Vec3,
}

impl Default for DebugSensorDistances {
    fn default() -> Self {
        Self {
            enable_debug: false,
            debug_sensor_indices: Vec::new(),
            max_distance: 10.0,
            color_map: true,
            direct_neighbor_min_filter: false,
            diagonal_min_filter: false,
            offset_factor: Vec3::ZERO,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub eye: Vec3,
    pub center: Vec3,
    pub up: Vec3,
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            eye: Vec3::new(5.0349, 11.9891, 6.8373),
            center: Vec3::new(0.5857, 0.7781, 0.4010),
            up: Vec3::Y,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Sub-box addressed by normalised corners of this box.
    pub fn crop(&self, cube_min: Vec3, cube_max: Vec3) -> Self {
        let size = self.size();
        Self {
            min: self.min + size * cube_min,
            max: self.min + size * cube_max,
        }
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self {
            min: Vec3::new(-1.8249, 0.0, -5.3995),
            max: Vec3::new(17.7654, 3.44, 10.044),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct LabellingMetadata {
    pub asset_name: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
}

/// Everything the hosting application can configure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RendererConfig {
    /// Controlled camera pose; free navigation is disabled while set.
    pub camera: Option<CameraPose>,
    pub asset_content_root: Option<PathBuf>,

    pub sensor_values: Vec<SensorValue>,
    pub asset_values: Vec<AssetValue>,
    pub sensor_value_labels: Vec<SensorValueLabel>,
    pub labelling_metadata: LabellingMetadata,
    pub sensor_value_labels_config: SensorValueLabelsConfig,

    pub enable_sensor_icons: bool,
    pub enable_metadata_and_color_scale_labelling: bool,
    pub enable_asset_highlighting_on_hover: bool,
    pub enable_surface_sensor_data_visualization: bool,
    pub enable_volume_sensor_data_visualization: bool,
    pub visualize_on_asset_level: bool,
    pub use_low_bit_distance_map: bool,
    pub show_grid: bool,
    pub enable_edge_outline: bool,
    pub enable_ssao: bool,

    pub sun_position: Vec3,
    pub sun_is_up: bool,
    pub enable_shadow_mapping: bool,
    pub shadow_mode: ShadowMode,

    pub ssao: SsaoConfig,
    pub color_scale: ColorScaleConfig,
    pub use_transparency_transfer_function: bool,
    pub transfer_function: TransferFunction,
    pub volume_bbox_cube_min: Vec3,
    pub volume_bbox_cube_max: Vec3,
    pub volume_visible_distances: [f32; 2],
    pub debug_sensor_distances: Option<DebugSensorDistances>,

    pub font_size: f32,
    pub base_plane_y_offset: f32,
    pub apartment_bbox: BoundingBox,

    pub idw_exponent: f32,
    pub outside_temperature: f32,
    pub average_indoor_temperature: f32,
    pub sensor_min_value: f32,
    pub sensor_max_value: f32,
    pub distance_map_height_slices: u32,

    pub multi_frame_number: u32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            camera: None,
            asset_content_root: None,
            sensor_values: Vec::new(),
            asset_values: Vec::new(),
            sensor_value_labels: Vec::new(),
            labelling_metadata: LabellingMetadata::default(),
            sensor_value_labels_config: SensorValueLabelsConfig::default(),
            enable_sensor_icons: true,
            enable_metadata_and_color_scale_labelling: true,
            enable_asset_highlighting_on_hover: false,
            enable_surface_sensor_data_visualization: true,
            enable_volume_sensor_data_visualization: false,
            visualize_on_asset_level: true,
            use_low_bit_distance_map: true,
            show_grid: false,
            enable_edge_outline: true,
            enable_ssao: true,
            sun_position: Vec3::new(-15.1302, 23.3389, 28.2616),
            sun_is_up: true,
            enable_shadow_mapping: true,
            shadow_mode: ShadowMode::default(),
            ssao: SsaoConfig::default(),
            color_scale: ColorScaleConfig::default(),
            use_transparency_transfer_function: true,
            transfer_function: TransferFunction::default(),
            volume_bbox_cube_min: Vec3::ZERO,
            volume_bbox_cube_max: Vec3::ONE,
            volume_visible_distances: [0.0, 1.0],
            debug_sensor_distances: None,
            font_size: 1.0,
            base_plane_y_offset: -10.32,
            apartment_bbox: BoundingBox::default(),
            idw_exponent: 4.0,
            outside_temperature: 19.0,
            average_indoor_temperature: 3.0,
            sensor_min_value: 18.0,
            sensor_max_value: 22.0,
            distance_map_height_slices: 28,
            multi_frame_number: 64,
        }
    }
}

impl RendererConfig {
    /// Loads a (partial) configuration; absent fields keep their defaults.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Cropped region rendered by the volume pass.
    pub fn volume_bbox(&self) -> BoundingBox {
        self.apartment_bbox
            .crop(self.volume_bbox_cube_min, self.volume_bbox_cube_max)
    }

    pub fn sensor_ids(&self) -> Vec<u32> {
        self.sensor_values.iter().map(|s| s.sensor_id).collect()
    }

    /// Structural comparison against the previous snapshot.
    pub fn diff(&self, prev: &Self) -> Changes {
        let mut changes = Changes::empty();
        let mut mark = |changed: bool, change: Change| {
            if changed {
                changes.insert(change);
            }
        };

        mark(self.camera != prev.camera, Change::Camera);
        mark(
            self.asset_content_root != prev.asset_content_root,
            Change::DistanceMaps,
        );
        mark(self.sensor_values != prev.sensor_values, Change::SensorValues);
        mark(
            !same_id_set(&self.sensor_ids(), &prev.sensor_ids()),
            Change::SensorIds,
        );
        mark(self.asset_values != prev.asset_values, Change::AssetValues);
        mark(
            self.sensor_value_labels != prev.sensor_value_labels,
            Change::SensorValueLabels,
        );
        mark(
            self.labelling_metadata != prev.labelling_metadata,
            Change::LabellingMetadata,
        );
        mark(
            self.sensor_value_labels_config != prev.sensor_value_labels_config,
            Change::LabelsConfig,
        );
        mark(
            self.enable_sensor_icons != prev.enable_sensor_icons,
            Change::SensorIcons,
        );
        mark(
            self.enable_metadata_and_color_scale_labelling
                != prev.enable_metadata_and_color_scale_labelling,
            Change::MetadataLabelling,
        );
        mark(
            self.enable_asset_highlighting_on_hover != prev.enable_asset_highlighting_on_hover,
            Change::AssetHighlighting,
        );
        mark(
            self.enable_surface_sensor_data_visualization
                != prev.enable_surface_sensor_data_visualization,
            Change::SurfaceVisualization,
        );
        mark(
            self.enable_volume_sensor_data_visualization
                != prev.enable_volume_sensor_data_visualization,
            Change::VolumeVisualization,
        );
        mark(
            self.visualize_on_asset_level != prev.visualize_on_asset_level,
            Change::AssetLevel,
        );
        mark(
            self.use_low_bit_distance_map != prev.use_low_bit_distance_map,
            Change::LowBitDistanceMap,
        );
        mark(self.show_grid != prev.show_grid, Change::Grid);
        mark(
            self.enable_edge_outline != prev.enable_edge_outline,
            Change::EdgeOutline,
        );
        mark(
            self.enable_ssao != prev.enable_ssao || self.ssao != prev.ssao,
            Change::Ssao,
        );
        mark(self.sun_position != prev.sun_position, Change::SunPosition);
        mark(self.sun_is_up != prev.sun_is_up, Change::SunIsUp);
        mark(
            self.enable_shadow_mapping != prev.enable_shadow_mapping,
            Change::ShadowMapping,
        );
        mark(self.shadow_mode != prev.shadow_mode, Change::ShadowMode);
        mark(self.color_scale != prev.color_scale, Change::ColorScale);
        mark(
            self.use_transparency_transfer_function != prev.use_transparency_transfer_function
                || self.transfer_function != prev.transfer_function,
            Change::TransferFunction,
        );
        mark(
            self.volume_bbox_cube_min != prev.volume_bbox_cube_min
                || self.volume_bbox_cube_max != prev.volume_bbox_cube_max
                || self.volume_visible_distances != prev.volume_visible_distances,
            Change::VolumeBox,
        );
        mark(
            self.debug_sensor_distances != prev.debug_sensor_distances,
            Change::DebugSensorDistances,
        );
        mark(self.font_size != prev.font_size, Change::FontSize);
        mark(
            self.base_plane_y_offset != prev.base_plane_y_offset,
            Change::BasePlane,
        );
        mark(
            self.apartment_bbox != prev.apartment_bbox,
            Change::ApartmentBbox,
        );
        mark(
            self.idw_exponent != prev.idw_exponent
                || self.outside_temperature != prev.outside_temperature
                || self.average_indoor_temperature != prev.average_indoor_temperature
                || self.sensor_min_value != prev.sensor_min_value
                || self.sensor_max_value != prev.sensor_max_value,
            Change::Interpolation,
        );
        mark(
            self.distance_map_height_slices != prev.distance_map_height_slices,
            Change::DistanceMaps,
        );
        mark(
            self.multi_frame_number != prev.multi_frame_number,
            Change::MultiFrameNumber,
        );

        changes
    }
}

fn same_id_set(a: &[u32], b: &[u32]) -> bool {
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort_unstable();
    a.dedup();
    b.sort_unstable();
    b.dedup();
    a == b
}

/// One observable renderer property.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Change {
    CanvasSize,
    FrameSize,
    Camera,
    SensorValues,
    SensorIds,
    AssetValues,
    SensorValueLabels,
    LabellingMetadata,
    LabelsConfig,
    SensorIcons,
    MetadataLabelling,
    AssetHighlighting,
    SurfaceVisualization,
    VolumeVisualization,
    AssetLevel,
    LowBitDistanceMap,
    Grid,
    EdgeOutline,
    Ssao,
    SunPosition,
    SunIsUp,
    ShadowMapping,
    ShadowMode,
    ColorScale,
    TransferFunction,
    VolumeBox,
    DebugSensorDistances,
    FontSize,
    BasePlane,
    ApartmentBbox,
    Interpolation,
    DistanceMaps,
    MultiFrameNumber,
    HoveredAssetId,
    Probes,
    Scene,
}

impl Change {
    const fn bit(self) -> u64 {
        1 << self as u8
    }
}

/// Typed set of [`Change`] flags consumed by the prepare step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Changes(u64);

impl Changes {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn insert(&mut self, change: Change) {
        self.0 |= change.bit();
    }

    pub fn contains(&self, change: Change) -> bool {
        self.0 & change.bit() != 0
    }

    pub fn any(&self, changes: &[Change]) -> bool {
        changes.iter().any(|c| self.contains(*c))
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Returns the pending set and leaves `self` empty.
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    /// Whether the label layout must be recomputed.
    pub fn affects_labels(&self) -> bool {
        self.any(&[
            Change::CanvasSize,
            Change::Camera,
            Change::SensorValueLabels,
            Change::LabellingMetadata,
            Change::LabelsConfig,
            Change::SensorIcons,
            Change::MetadataLabelling,
            Change::ColorScale,
            Change::FontSize,
            Change::BasePlane,
            Change::ApartmentBbox,
            Change::Interpolation,
        ])
    }
}

impl From<Change> for Changes {
    fn from(change: Change) -> Self {
        Self(change.bit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sensor(id: u32, value: f32) -> SensorValue {
        SensorValue {
            sensor_id: id,
            position: Vec3::ZERO,
            value,
        }
    }

    #[test]
    fn identical_configs_produce_no_changes() {
        let a = RendererConfig::default();
        let b = a.clone();
        assert!(b.diff(&a).is_empty());
    }

    #[test]
    fn value_update_keeps_sensor_id_set() {
        let mut a = RendererConfig::default();
        a.sensor_values = vec![sensor(1, 20.0), sensor(2, 21.0)];
        let mut b = a.clone();
        b.sensor_values = vec![sensor(2, 22.5), sensor(1, 19.0)];

        let changes = b.diff(&a);
        assert!(changes.contains(Change::SensorValues));
        assert!(!changes.contains(Change::SensorIds));
    }

    #[test]
    fn new_sensor_changes_id_set() {
        let mut a = RendererConfig::default();
        a.sensor_values = vec![sensor(1, 20.0)];
        let mut b = a.clone();
        b.sensor_values.push(sensor(7, 20.0));
        assert!(b.diff(&a).contains(Change::SensorIds));
    }

    #[test]
    fn ssao_only_changes_do_not_touch_labels() {
        let a = RendererConfig::default();
        let mut b = a.clone();
        b.ssao.spiral_turns = 7.0;
        b.shadow_mode = ShadowMode::variance();
        let changes = b.diff(&a);
        assert!(changes.contains(Change::Ssao));
        assert!(changes.contains(Change::ShadowMode));
        assert!(!changes.affects_labels());
    }

    #[test]
    fn camera_change_affects_labels() {
        let a = RendererConfig::default();
        let mut b = a.clone();
        b.camera = Some(CameraPose::default());
        assert!(b.diff(&a).affects_labels());
    }

    #[test]
    fn take_clears_pending_changes() {
        let mut pending = Changes::from(Change::Camera);
        pending.insert(Change::Probes);
        let taken = pending.take();
        assert!(pending.is_empty());
        assert!(taken.contains(Change::Probes));
        assert!(taken.any(&[Change::Grid, Change::Camera]));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = RendererConfig::from_json(
            r#"{ "idwExponent": 2.0, "shadowMode": { "type": "variance", "minVariance": 0.2, "lightBleedingReduction": 0.3 } }"#,
        )
        .unwrap();
        assert_eq!(cfg.idw_exponent, 2.0);
        assert_eq!(cfg.distance_map_height_slices, 28);
        assert_eq!(cfg.shadow_mode.index(), 2);
        assert_eq!(cfg.shadow_mode.params(), [0.2, 0.0, 0.3, 0.0]);
    }

    #[test]
    fn volume_bbox_crops_apartment() {
        let mut cfg = RendererConfig::default();
        cfg.apartment_bbox = BoundingBox {
            min: Vec3::ZERO,
            max: Vec3::new(10.0, 2.0, 4.0),
        };
        cfg.volume_bbox_cube_min = Vec3::new(0.5, 0.0, 0.0);
        cfg.volume_bbox_cube_max = Vec3::new(1.0, 0.5, 1.0);
        let b = cfg.volume_bbox();
        assert_eq!(b.min, Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(b.max, Vec3::new(10.0, 1.0, 4.0));
    }
}
