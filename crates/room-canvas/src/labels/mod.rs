//! Label layout: sensor value labels, sensor icons and the metadata legend.

pub mod candidates;
pub mod metadata;
pub mod placement;

use crate::config::RendererConfig;
use candidates::CandidateSet;
use glam::{Mat4, Vec3};
use metadata::Legend;
use placement::{DepthProbe, LabelView};

pub const LABEL_COLOR: [u8; 3] = [0xff, 0xff, 0xff];
pub const ICON_OUTER_COLOR: [u8; 3] = [0xf0, 0xf0, 0xf0];
pub const ICON_INNER_COLOR: [u8; 3] = [0xc1, 0xc2, 0xc6];

/// Lift of sensor icons above the sensor.
const ICON_LIFT: f32 = 0.25;
/// Offset of floating labels from the sensor.
const FLOATING_OFFSET: Vec3 = Vec3::new(0.25, 0.25, 0.0);
/// Lift off the wall for labels placed on candidates.
const WALL_OFFSET: f32 = 1e-3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LabelKind {
    Text,
    /// Outer ring of a sensor marker.
    SensorIcon,
    /// Inner disc of a sensor marker.
    SensorIconCenter,
    AssetIcon,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HorizontalAlign {
    Left,
    Center,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineAnchor {
    Baseline,
    Center,
    Top,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Orientation {
    /// Always faces the camera.
    Billboard,
    /// Lies in the plane spanned by `direction` and `up`.
    Oriented { direction: Vec3, up: Vec3 },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    pub kind: LabelKind,
    pub text: String,
    pub position: Vec3,
    pub orientation: Orientation,
    /// World units.
    pub font_size: f32,
    pub color: [u8; 3],
    pub align: HorizontalAlign,
    pub anchor: LineAnchor,
    /// Text past this width is elided.
    pub line_width: Option<f32>,
}

/// Everything the label and cuboid passes draw for one view.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LabelLayout {
    pub labels: Vec<Label>,
    pub color_scale_plane: Option<Mat4>,
    /// Pickable marker per labelled sensor.
    pub cuboids: Vec<(u32, Vec3)>,
}

impl LabelLayout {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty() && self.color_scale_plane.is_none() && self.cuboids.is_empty()
    }
}

fn icon(kind: LabelKind, position: Vec3, font: f32, color: [u8; 3]) -> Label {
    Label {
        kind,
        text: String::new(),
        position,
        orientation: Orientation::Billboard,
        font_size: ICON_LIFT * font,
        color,
        align: HorizontalAlign::Center,
        anchor: LineAnchor::Center,
        line_width: None,
    }
}

/// Builds the full label layout for the current configuration and view.
pub fn build_layout(
    config: &RendererConfig,
    candidates: &CandidateSet,
    view: &LabelView,
    center: Vec3,
    depth: Option<&dyn DepthProbe>,
) -> LabelLayout {
    let font = config.font_size;
    let mut layout = LabelLayout::default();

    for label in &config.sensor_value_labels {
        layout.cuboids.push((label.sensor_id, label.position));

        if config.enable_sensor_icons {
            let at = label.position + Vec3::Y * ICON_LIFT;
            layout
                .labels
                .push(icon(LabelKind::SensorIcon, at, font, ICON_OUTER_COLOR));
            layout
                .labels
                .push(icon(LabelKind::SensorIconCenter, at, font, ICON_INNER_COLOR));
        }

        let labels_config = &config.sensor_value_labels_config;
        if !labels_config.display_labels {
            continue;
        }

        if labels_config.approximate_optimal_labelling_positions {
            let Some(candidates) = candidates.for_sensor(label.sensor_id) else {
                log::debug!("no labelling positions for sensor {}", label.sensor_id);
                continue;
            };
            let Some(best) = placement::select(
                candidates,
                view,
                &labels_config.filters,
                &labels_config.order_by,
                depth,
            ) else {
                continue;
            };
            let candidate = candidates[best.index];
            layout.labels.push(Label {
                kind: LabelKind::Text,
                text: label.label_text.clone(),
                position: candidate.position + candidate.front_face * WALL_OFFSET,
                orientation: Orientation::Oriented {
                    direction: candidate.running_direction,
                    up: candidate.up,
                },
                font_size: 0.5 * font,
                color: LABEL_COLOR,
                align: HorizontalAlign::Left,
                anchor: LineAnchor::Baseline,
                line_width: Some(candidate.running_length),
            });
        } else {
            layout.labels.push(Label {
                kind: LabelKind::Text,
                text: label.label_text.clone(),
                position: label.position + FLOATING_OFFSET,
                orientation: Orientation::Billboard,
                font_size: 0.25 * font,
                color: LABEL_COLOR,
                align: HorizontalAlign::Left,
                anchor: LineAnchor::Center,
                line_width: None,
            });
        }
    }

    if config.enable_metadata_and_color_scale_labelling {
        let anchors =
            metadata::wall_anchors(&config.apartment_bbox, config.base_plane_y_offset, font);
        let anchor = metadata::most_facing(&anchors, view.eye, center);
        let legend = Legend {
            min: config.sensor_min_value,
            max: config.sensor_max_value,
            stops: config.color_scale.stops,
        };
        let (labels, plane) =
            metadata::metadata_layout(&anchor, &config.labelling_metadata, legend, font);
        layout.labels.extend(labels);
        layout.color_scale_plane = plane;
    }

    layout
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::config::{CameraPose, LabellingMetadata};
    use crate::sensors::SensorValueLabel;
    use candidates::Candidate;

    fn camera() -> Camera {
        Camera::new(
            CameraPose {
                eye: Vec3::new(0.0, 1.0, 10.0),
                center: Vec3::new(0.0, 1.0, 0.0),
                up: Vec3::Y,
            },
            1.0,
        )
    }

    fn sensor_label(sensor_id: u32, x: f32) -> SensorValueLabel {
        SensorValueLabel {
            sensor_id,
            position: Vec3::new(x, 1.0, 0.0),
            label_text: format!("{}.0 °C", 20 + sensor_id),
        }
    }

    fn wall(x: f32) -> Candidate {
        Candidate {
            position: Vec3::new(x, 1.0, 0.0),
            running_direction: Vec3::X,
            up: Vec3::Y,
            front_face: Vec3::Z,
            running_length: 1.0,
        }
    }

    fn bare_config() -> RendererConfig {
        RendererConfig {
            enable_sensor_icons: false,
            enable_metadata_and_color_scale_labelling: false,
            sensor_value_labels: vec![sensor_label(1, 0.0), sensor_label(2, 0.5)],
            ..RendererConfig::default()
        }
    }

    #[test]
    fn floating_labels_by_default() {
        let config = bare_config();
        let view = LabelView::from_camera(&camera());
        let layout = build_layout(&config, &CandidateSet::default(), &view, Vec3::Y, None);

        assert_eq!(layout.labels.len(), 2);
        assert_eq!(layout.labels[0].position, Vec3::new(0.25, 1.25, 0.0));
        assert_eq!(layout.labels[0].orientation, Orientation::Billboard);
        assert_eq!(layout.cuboids, vec![(1, Vec3::new(0.0, 1.0, 0.0)), (2, Vec3::new(0.5, 1.0, 0.0))]);
    }

    #[test]
    fn sensors_without_visible_candidates_are_omitted() {
        let mut config = bare_config();
        config.sensor_value_labels_config.approximate_optimal_labelling_positions = true;

        let mut set = CandidateSet::default();
        set.insert(1, vec![wall(0.0)]);
        set.insert(2, vec![wall(500.0)]);

        let view = LabelView::from_camera(&camera());
        let layout = build_layout(&config, &set, &view, Vec3::Y, None);

        assert_eq!(layout.labels.len(), 1);
        let label = &layout.labels[0];
        assert_eq!(label.text, "21.0 °C");
        assert_eq!(label.line_width, Some(1.0));
        assert_eq!(label.anchor, LineAnchor::Baseline);
        assert!((label.position - Vec3::new(0.0, 1.0, WALL_OFFSET)).length() < 1e-6);
        // Cuboids stay pickable even without a text label.
        assert_eq!(layout.cuboids.len(), 2);
    }

    #[test]
    fn icons_come_in_pairs() {
        let config = RendererConfig {
            enable_sensor_icons: true,
            sensor_value_labels_config: crate::config::SensorValueLabelsConfig {
                display_labels: false,
                ..Default::default()
            },
            ..bare_config()
        };
        let view = LabelView::from_camera(&camera());
        let layout = build_layout(&config, &CandidateSet::default(), &view, Vec3::Y, None);
        assert_eq!(layout.labels.len(), 4);
        assert_eq!(layout.labels[0].kind, LabelKind::SensorIcon);
        assert_eq!(layout.labels[1].kind, LabelKind::SensorIconCenter);
        assert_eq!(layout.labels[1].position, Vec3::new(0.0, 1.25, 0.0));
    }

    #[test]
    fn metadata_adds_legend_plane() {
        let config = RendererConfig {
            enable_metadata_and_color_scale_labelling: true,
            labelling_metadata: LabellingMetadata {
                time: Some("08:15".into()),
                ..Default::default()
            },
            sensor_value_labels: Vec::new(),
            ..bare_config()
        };
        let view = LabelView::from_camera(&camera());
        let layout = build_layout(&config, &CandidateSet::default(), &view, Vec3::Y, None);
        assert!(layout.color_scale_plane.is_some());
        assert!(layout.cuboids.is_empty());
        assert!(!layout.labels.is_empty());
    }

    #[test]
    fn nothing_configured_is_empty() {
        let config = RendererConfig {
            sensor_value_labels: Vec::new(),
            ..bare_config()
        };
        let view = LabelView::from_camera(&camera());
        let layout = build_layout(&config, &CandidateSet::default(), &view, Vec3::Y, None);
        assert!(layout.is_empty());
    }
}
