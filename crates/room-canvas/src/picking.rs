//! Pointer picking through off-screen ID and depth targets.

use crate::events::HoverEvent;
use crate::labels::placement::DepthProbe;
use glam::{Mat4, Vec2, Vec3};

/// Depth written where the pre-depth pass saw no geometry.
pub const DEPTH_CLEAR: f32 = 0.999_999_94;

/// Encodes an ID as normalized RGBA, little-endian bytes.
pub fn encode_id(id: u32) -> [f32; 4] {
    id.to_le_bytes().map(|b| b as f32 / 255.0)
}

/// Decodes an `Rgba8Unorm` texel or the bytes of an `R32Uint` texel; both
/// are little-endian. Zero is the clear value and decodes to `None`.
pub fn decode_id(texel: [u8; 4]) -> Option<u32> {
    match u32::from_le_bytes(texel) {
        0 => None,
        id => Some(id),
    }
}

/// Row pitch of a texture-to-buffer copy.
pub fn padded_bytes_per_row(width: u32, bytes_per_texel: u32) -> u32 {
    let unpadded = width * bytes_per_texel;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Strips copy padding from mapped rows.
pub fn unpad_rows(data: &[u8], width: u32, height: u32, bytes_per_texel: u32) -> Vec<u8> {
    let padded = padded_bytes_per_row(width, bytes_per_texel) as usize;
    let row = (width * bytes_per_texel) as usize;
    data.chunks(padded)
        .take(height as usize)
        .flat_map(|r| &r[..row.min(r.len())])
        .copied()
        .collect()
}

/// Maps a window position onto texel coordinates of a target.
pub fn scale_to_texture(position: Vec2, window: Vec2, texture: Vec2) -> Vec2 {
    if window.x <= 0.0 || window.y <= 0.0 {
        return Vec2::ZERO;
    }
    position / window * texture
}

/// Unprojects a pixel with known depth into world space.
pub fn unproject(x: f32, y: f32, depth: f32, size: Vec2, view_projection_inverse: &Mat4) -> Vec3 {
    let ndc = Vec2::new(x / size.x * 2.0 - 1.0, 1.0 - y / size.y * 2.0);
    view_projection_inverse.project_point3(ndc.extend(depth))
}

/// CPU copy of the pre-depth target.
#[derive(Clone, Debug, PartialEq)]
pub struct DepthSnapshot {
    pub width: u32,
    pub height: u32,
    depths: Vec<f32>,
}

impl DepthSnapshot {
    pub fn new(width: u32, height: u32, depths: Vec<f32>) -> Self {
        Self {
            width,
            height,
            depths,
        }
    }

    /// Builds a snapshot from mapped `R32Float` rows.
    pub fn from_padded(data: &[u8], width: u32, height: u32) -> Self {
        let depths = unpad_rows(data, width, height, 4)
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Self::new(width, height, depths)
    }

    /// Depth under a pixel, `None` on background or outside the target.
    pub fn depth_at(&self, x: f32, y: f32) -> Option<f32> {
        if x < 0.0 || y < 0.0 {
            return None;
        }
        let (xi, yi) = (x as u32, y as u32);
        if xi >= self.width || yi >= self.height {
            return None;
        }
        let depth = *self.depths.get((yi * self.width + xi) as usize)?;
        (depth < DEPTH_CLEAR).then_some(depth)
    }
}

impl DepthProbe for DepthSnapshot {
    fn world_at(&self, x: f32, y: f32, view_projection_inverse: &Mat4) -> Option<Vec3> {
        let depth = self.depth_at(x, y)?;
        Some(unproject(x, y, depth, self.size(), view_projection_inverse))
    }

    fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdTarget {
    /// Raw asset IDs of the building scene.
    Asset,
    /// Hierarchy nodes, numbered in traversal order.
    Node,
    /// Sensor cuboids drawn at the placed labels.
    Sensor,
}

/// GPU reads used by the picker. Positions are in window pixels; each read
/// returns `None` when its target is not ready.
pub trait Readback {
    fn read_id(&mut self, target: IdTarget, position: Vec2) -> Option<Option<u32>>;
    fn read_coords(&mut self, position: Vec2) -> Option<Vec3>;
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClickOutcome {
    pub node: Option<u32>,
    pub asset: Option<u32>,
    pub sensor: Option<u32>,
    pub probe: Option<Vec3>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct HoverOutcome {
    /// Present when the asset target could be read.
    pub hovered_asset: Option<Option<u32>>,
    pub event: Option<HoverEvent>,
}

/// Click-versus-drag tracking plus the hover and click reads.
#[derive(Debug, Default)]
pub struct Picker {
    no_drag: bool,
}

impl Picker {
    pub fn pointer_down(&mut self) {
        self.no_drag = true;
    }

    /// Any movement between press and release turns the press into a drag.
    pub fn pointer_moved<R: Readback + ?Sized>(
        &mut self,
        position: Vec2,
        readback: &mut R,
    ) -> HoverOutcome {
        self.no_drag = false;

        let hovered_asset = readback.read_id(IdTarget::Asset, position);
        let mut parts = Vec::new();
        if let Some(Some(asset)) = hovered_asset {
            parts.push(format!("asset_{}", asset));
        }
        if let Some(Some(node)) = readback.read_id(IdTarget::Node, position) {
            parts.push(format!("node_{}", node));
        }
        if let Some(Some(sensor)) = readback.read_id(IdTarget::Sensor, position) {
            parts.push(format!("sensor_{}", sensor));
        }

        let event = (!parts.is_empty()).then(|| HoverEvent {
            label: parts.join("<br />"),
            x: position.x,
            y: position.y,
        });
        HoverOutcome {
            hovered_asset,
            event,
        }
    }

    /// Resolves a release; `None` if the press turned into a drag.
    pub fn pointer_up<R: Readback + ?Sized>(
        &mut self,
        position: Vec2,
        readback: &mut R,
    ) -> Option<ClickOutcome> {
        if !std::mem::take(&mut self.no_drag) {
            return None;
        }

        let node = readback.read_id(IdTarget::Node, position).flatten();
        match node {
            Some(id) => log::info!("clicked on node {}", id),
            None => log::info!("clicked on background (no node ID)"),
        }

        let probe = readback.read_coords(position);
        if let Some(p) = probe {
            log::info!("coordinates at [{}, {}]: {:?}", position.x, position.y, p);
        }

        let asset = readback.read_id(IdTarget::Asset, position).flatten();
        match asset {
            Some(id) => log::info!("clicked on asset {}", id),
            None => log::info!("clicked on background (no asset ID)"),
        }

        let sensor = readback.read_id(IdTarget::Sensor, position).flatten();
        if let Some(id) = sensor {
            log::info!("clicked on sensor {}", id);
        }

        Some(ClickOutcome {
            node,
            asset,
            sensor,
            probe,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeTargets {
        asset: Option<Option<u32>>,
        node: Option<Option<u32>>,
        sensor: Option<Option<u32>>,
        coords: Option<Vec3>,
        reads: Vec<IdTarget>,
    }

    impl Readback for FakeTargets {
        fn read_id(&mut self, target: IdTarget, _: Vec2) -> Option<Option<u32>> {
            self.reads.push(target);
            match target {
                IdTarget::Asset => self.asset,
                IdTarget::Node => self.node,
                IdTarget::Sensor => self.sensor,
            }
        }

        fn read_coords(&mut self, _: Vec2) -> Option<Vec3> {
            self.coords
        }
    }

    fn quantize(encoded: [f32; 4]) -> [u8; 4] {
        encoded.map(|c| (c * 255.0).round() as u8)
    }

    #[test]
    fn id_codec_uses_little_endian_bytes() {
        let bytes = quantize(encode_id(0x0102_0304));
        assert_eq!(bytes, [4, 3, 2, 1]);
        assert_eq!(decode_id(bytes), Some(0x0102_0304));
    }

    #[test]
    fn id_codec_covers_the_full_range() {
        for id in [1, 0xFF, 0x100, 0xFFFF, 0x1_0000, 0xFF_FFFF, 0x100_0000, u32::MAX] {
            assert_eq!(decode_id(quantize(encode_id(id))), Some(id), "id {:#x}", id);
        }
        assert_eq!(quantize(encode_id(0xFF)), [255, 0, 0, 0]);
        assert_eq!(quantize(encode_id(0x100)), [0, 1, 0, 0]);
        assert_eq!(quantize(encode_id(u32::MAX)), [255; 4]);
    }

    #[test]
    fn zero_is_background() {
        assert_eq!(encode_id(0), [0.0; 4]);
        assert_eq!(decode_id(quantize(encode_id(0))), None);
        assert_eq!(decode_id(0u32.to_le_bytes()), None);
    }

    #[test]
    fn encoded_and_raw_asset_ids_agree() {
        for id in [1, 42, 0x1234, 0xDEAD_BEEF, u32::MAX] {
            let encoded = decode_id(quantize(encode_id(id)));
            let raw = decode_id(id.to_le_bytes());
            assert_eq!(encoded, raw);
            assert_eq!(raw, Some(id));
        }
    }

    #[test]
    fn rows_are_padded_to_copy_alignment() {
        assert_eq!(padded_bytes_per_row(1, 4), 256);
        assert_eq!(padded_bytes_per_row(64, 4), 256);
        assert_eq!(padded_bytes_per_row(65, 4), 512);

        let mut data = vec![0u8; 512];
        data[..4].copy_from_slice(&[1, 2, 3, 4]);
        data[256..260].copy_from_slice(&[5, 6, 7, 8]);
        assert_eq!(unpad_rows(&data, 1, 2, 4), vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn window_positions_scale_to_texture() {
        let p = scale_to_texture(Vec2::new(50.0, 25.0), Vec2::new(100.0, 100.0), Vec2::new(200.0, 80.0));
        assert_eq!(p, Vec2::new(100.0, 20.0));
    }

    #[test]
    fn background_depth_has_no_coordinates() {
        let snapshot = DepthSnapshot::new(2, 1, vec![0.5, DEPTH_CLEAR]);
        assert_eq!(snapshot.depth_at(0.5, 0.5), Some(0.5));
        assert_eq!(snapshot.depth_at(1.5, 0.5), None);
        assert_eq!(snapshot.depth_at(2.5, 0.5), None);
        assert!(snapshot.world_at(1.5, 0.5, &Mat4::IDENTITY).is_none());
    }

    #[test]
    fn depth_unprojects_through_inverse() {
        let snapshot = DepthSnapshot::new(2, 2, vec![0.25; 4]);
        let p = snapshot.world_at(1.0, 1.0, &Mat4::IDENTITY).unwrap();
        assert_eq!(p, Vec3::new(0.0, 0.0, 0.25));
    }

    #[test]
    fn depth_snapshot_reads_padded_floats() {
        let mut data = vec![0u8; 256];
        data[..4].copy_from_slice(&0.75f32.to_le_bytes());
        let snapshot = DepthSnapshot::from_padded(&data, 1, 1);
        assert_eq!(snapshot.depth_at(0.0, 0.0), Some(0.75));
    }

    #[test]
    fn hover_joins_asset_and_node() {
        let mut picker = Picker::default();
        let mut targets = FakeTargets {
            asset: Some(Some(12)),
            node: Some(Some(3)),
            ..Default::default()
        };
        let out = picker.pointer_moved(Vec2::new(4.0, 5.0), &mut targets);
        assert_eq!(out.hovered_asset, Some(Some(12)));
        let event = out.event.unwrap();
        assert_eq!(event.label, "asset_12<br />node_3");
        assert_eq!((event.x, event.y), (4.0, 5.0));
    }

    #[test]
    fn sensor_channel_is_separate_from_nodes() {
        let mut picker = Picker::default();
        let mut targets = FakeTargets {
            node: Some(None),
            sensor: Some(Some(3)),
            ..Default::default()
        };
        let out = picker.pointer_moved(Vec2::ZERO, &mut targets);
        assert_eq!(out.event.unwrap().label, "sensor_3");

        targets.node = Some(Some(3));
        let out = picker.pointer_moved(Vec2::ZERO, &mut targets);
        assert_eq!(out.event.unwrap().label, "node_3<br />sensor_3");
        assert_eq!(
            targets.reads[3..],
            [IdTarget::Asset, IdTarget::Node, IdTarget::Sensor]
        );
    }

    #[test]
    fn hover_over_background_clears() {
        let mut picker = Picker::default();
        let mut targets = FakeTargets {
            asset: Some(None),
            node: Some(None),
            sensor: Some(None),
            ..Default::default()
        };
        let out = picker.pointer_moved(Vec2::ZERO, &mut targets);
        assert_eq!(out.hovered_asset, Some(None));
        assert!(out.event.is_none());
    }

    #[test]
    fn hover_with_only_node() {
        let mut picker = Picker::default();
        let mut targets = FakeTargets {
            node: Some(Some(9)),
            ..Default::default()
        };
        let out = picker.pointer_moved(Vec2::ZERO, &mut targets);
        assert_eq!(out.hovered_asset, None);
        assert_eq!(out.event.unwrap().label, "node_9");
    }

    #[test]
    fn click_reads_node_depth_then_asset() {
        let mut picker = Picker::default();
        let mut targets = FakeTargets {
            asset: Some(Some(7)),
            node: Some(None),
            coords: Some(Vec3::new(1.0, 2.0, 3.0)),
            ..Default::default()
        };
        picker.pointer_down();
        let click = picker.pointer_up(Vec2::ZERO, &mut targets).unwrap();
        assert_eq!(click.node, None);
        assert_eq!(click.asset, Some(7));
        assert_eq!(click.sensor, None);
        assert_eq!(click.probe, Some(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(
            targets.reads,
            vec![IdTarget::Node, IdTarget::Asset, IdTarget::Sensor]
        );
    }

    #[test]
    fn click_on_sensor_cuboid_reports_sensor() {
        let mut picker = Picker::default();
        let mut targets = FakeTargets {
            node: Some(Some(3)),
            sensor: Some(Some(3)),
            ..Default::default()
        };
        picker.pointer_down();
        let click = picker.pointer_up(Vec2::ZERO, &mut targets).unwrap();
        assert_eq!(click.node, Some(3));
        assert_eq!(click.sensor, Some(3));
    }

    #[test]
    fn drag_is_not_a_click() {
        let mut picker = Picker::default();
        let mut targets = FakeTargets::default();
        picker.pointer_down();
        picker.pointer_moved(Vec2::ONE, &mut targets);
        assert!(picker.pointer_up(Vec2::ONE, &mut targets).is_none());
    }

    #[test]
    fn release_without_press_is_ignored() {
        let mut picker = Picker::default();
        let mut targets = FakeTargets::default();
        assert!(picker.pointer_up(Vec2::ZERO, &mut targets).is_none());
    }
}
