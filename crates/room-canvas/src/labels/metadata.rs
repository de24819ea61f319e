//! Metadata, date/time and color-scale legend placed on the ground next to
//! the wall that faces the camera most directly.

use super::{HorizontalAlign, Label, LabelKind, LineAnchor, Orientation};
use crate::config::{BoundingBox, LabellingMetadata};
use glam::{Mat4, Quat, Vec3};

pub const METADATA_COLOR: [u8; 3] = [0x8e, 0x96, 0x9f];

/// Ticks beyond this count collapse to the first and last one.
const MAX_TICKS: usize = 7;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WallAnchor {
    pub name: &'static str,
    pub position: Vec3,
    pub direction: Vec3,
    pub up: Vec3,
    pub rotation_deg: f32,
}

/// The four compass-aligned anchors around the building footprint.
pub fn wall_anchors(bbox: &BoundingBox, base_plane_y: f32, font: f32) -> [WallAnchor; 4] {
    let y = bbox.min.y + base_plane_y + 0.1;
    [
        WallAnchor {
            name: "east",
            position: Vec3::new(bbox.min.x, y, bbox.max.z + 1.5 * font),
            direction: Vec3::X,
            up: Vec3::NEG_Z,
            rotation_deg: 0.0,
        },
        WallAnchor {
            name: "south",
            position: Vec3::new(bbox.min.x - 1.5 * font, y, bbox.min.z),
            direction: Vec3::Z,
            up: Vec3::X,
            rotation_deg: 270.0,
        },
        WallAnchor {
            name: "west",
            position: Vec3::new(bbox.max.x, y, bbox.min.z - 1.5 * font),
            direction: Vec3::NEG_X,
            up: Vec3::Z,
            rotation_deg: 180.0,
        },
        WallAnchor {
            name: "north",
            position: Vec3::new(bbox.max.x + 1.5 * font, y, bbox.max.z),
            direction: Vec3::NEG_Z,
            up: Vec3::NEG_X,
            rotation_deg: 90.0,
        },
    ]
}

/// Anchor whose up vector best matches the viewing direction; the first wins ties.
pub fn most_facing(anchors: &[WallAnchor; 4], eye: Vec3, center: Vec3) -> WallAnchor {
    let view = center - eye;
    let mut best = anchors[0];
    for anchor in &anchors[1..] {
        if anchor.up.dot(view) > best.up.dot(view) {
            best = *anchor;
        }
    }
    best
}

/// Value range and stop count of the legend.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Legend {
    pub min: f32,
    pub max: f32,
    pub stops: u32,
}

/// Tick label text: one decimal, trailing zero dropped.
pub fn tick_text(value: f32) -> String {
    let rounded: f32 = format!("{:.1}", value).parse().unwrap_or(value);
    format!("{}", rounded)
}

fn oriented(anchor: &WallAnchor) -> Orientation {
    Orientation::Oriented {
        direction: anchor.direction,
        up: anchor.up,
    }
}

fn text(anchor: &WallAnchor, content: String, position: Vec3, font_size: f32) -> Label {
    Label {
        kind: LabelKind::Text,
        text: content,
        position,
        orientation: oriented(anchor),
        font_size,
        color: METADATA_COLOR,
        align: HorizontalAlign::Left,
        anchor: LineAnchor::Baseline,
        line_width: None,
    }
}

/// Metadata lines, tick labels and the legend plane transform.
pub fn metadata_layout(
    anchor: &WallAnchor,
    metadata: &LabellingMetadata,
    legend: Legend,
    font: f32,
) -> (Vec<Label>, Option<Mat4>) {
    let paragraph = -anchor.up;
    let mut labels = Vec::new();
    let mut plane = None;

    if let Some(asset_name) = &metadata.asset_name {
        let line = anchor.position + paragraph * (0.5 * font);
        labels.push(Label {
            kind: LabelKind::AssetIcon,
            ..text(anchor, String::new(), line, font)
        });
        labels.push(text(
            anchor,
            asset_name.clone(),
            line + anchor.direction * (1.3 * font),
            font,
        ));
    }

    if let Some(date) = &metadata.date {
        labels.push(text(
            anchor,
            date.clone(),
            anchor.position + paragraph * (2.0 * font),
            font,
        ));
    }

    if let Some(time) = &metadata.time {
        let time_position = anchor.position + paragraph * (3.2 * font);
        labels.push(text(anchor, time.clone(), time_position, font));

        let legend_start = time_position + anchor.direction * (4.0 * font);
        let translation = legend_start - paragraph * (0.8 * font);
        plane = Some(
            Mat4::from_translation(translation)
                * Mat4::from_quat(Quat::from_rotation_y(anchor.rotation_deg.to_radians()))
                * Mat4::from_scale(Vec3::new(8.0 * font, 1.0, 0.8 * font)),
        );

        let stops = legend.stops.max(1);
        let mut ticks: Vec<Label> = (0..=stops)
            .map(|i| {
                let t = i as f32 / stops as f32;
                let value = legend.min + t * (legend.max - legend.min);
                Label {
                    align: HorizontalAlign::Center,
                    anchor: LineAnchor::Top,
                    ..text(
                        anchor,
                        tick_text(value),
                        legend_start + anchor.direction * (8.0 * font * t),
                        0.5 * font,
                    )
                }
            })
            .collect();
        if ticks.len() > MAX_TICKS {
            let last = ticks.len() - 1;
            ticks = vec![ticks[0].clone(), ticks[last].clone()];
        }
        labels.extend(ticks);
    }

    (labels, plane)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox() -> BoundingBox {
        BoundingBox {
            min: Vec3::ZERO,
            max: Vec3::new(10.0, 3.0, 8.0),
        }
    }

    #[test]
    fn anchors_follow_footprint() {
        let a = wall_anchors(&bbox(), 0.0, 1.0);
        assert_eq!(a[0].position, Vec3::new(0.0, 0.1, 9.5));
        assert_eq!(a[1].position, Vec3::new(-1.5, 0.1, 0.0));
        assert_eq!(a[2].position, Vec3::new(10.0, 0.1, -1.5));
        assert_eq!(a[3].position, Vec3::new(11.5, 0.1, 8.0));
    }

    #[test]
    fn camera_looking_north_picks_east_anchor() {
        let anchors = wall_anchors(&bbox(), 0.0, 1.0);
        // Looking along -Z matches the east anchor's up vector.
        let chosen = most_facing(&anchors, Vec3::new(5.0, 5.0, 20.0), Vec3::new(5.0, 0.0, 4.0));
        assert_eq!(chosen.name, "east");
        let chosen = most_facing(&anchors, Vec3::new(-20.0, 5.0, 4.0), Vec3::new(5.0, 0.0, 4.0));
        assert_eq!(chosen.name, "south");
    }

    #[test]
    fn straight_down_view_keeps_first_anchor() {
        let anchors = wall_anchors(&bbox(), 0.0, 1.0);
        let chosen = most_facing(&anchors, Vec3::new(5.0, 20.0, 4.0), Vec3::new(5.0, 0.0, 4.0));
        assert_eq!(chosen.name, "east");
    }

    #[test]
    fn tick_text_drops_trailing_zero() {
        assert_eq!(tick_text(18.0), "18");
        assert_eq!(tick_text(18.57), "18.6");
    }

    #[test]
    fn lines_stack_along_negated_up() {
        let anchor = wall_anchors(&bbox(), 0.0, 1.0)[0];
        let metadata = LabellingMetadata {
            asset_name: Some("Flat 3".into()),
            date: Some("2024-01-01".into()),
            time: None,
        };
        let legend = Legend { min: 18.0, max: 22.0, stops: 4 };
        let (labels, plane) = metadata_layout(&anchor, &metadata, legend, 1.0);
        assert!(plane.is_none());
        assert_eq!(labels.len(), 3);
        assert_eq!(labels[0].kind, LabelKind::AssetIcon);
        assert_eq!(labels[1].position, anchor.position + Vec3::Z * 0.5 + Vec3::X * 1.3);
        assert_eq!(labels[2].position, anchor.position + Vec3::Z * 2.0);
    }

    #[test]
    fn time_adds_legend_and_ticks() {
        let anchor = wall_anchors(&bbox(), 0.0, 1.0)[0];
        let metadata = LabellingMetadata {
            time: Some("12:00".into()),
            ..LabellingMetadata::default()
        };
        let legend = Legend { min: 18.0, max: 22.0, stops: 4 };
        let (labels, plane) = metadata_layout(&anchor, &metadata, legend, 1.0);
        assert!(plane.is_some());
        // Time line plus five ticks.
        assert_eq!(labels.len(), 6);
        assert_eq!(labels[1].text, "18");
        assert_eq!(labels[5].text, "22");

        let origin = plane.unwrap().transform_point3(Vec3::ZERO);
        let expected = anchor.position + Vec3::Z * 3.2 + Vec3::X * 4.0 - Vec3::Z * 0.8;
        assert!((origin - expected).length() < 1e-5);
    }

    #[test]
    fn many_stops_collapse_ticks() {
        let anchor = wall_anchors(&bbox(), 0.0, 1.0)[0];
        let metadata = LabellingMetadata {
            time: Some("12:00".into()),
            ..LabellingMetadata::default()
        };
        let legend = Legend { min: 18.0, max: 22.0, stops: 9 };
        let (labels, _) = metadata_layout(&anchor, &metadata, legend, 1.0);
        assert_eq!(labels.len(), 3);
        assert_eq!(labels[2].text, "22");
    }
}
