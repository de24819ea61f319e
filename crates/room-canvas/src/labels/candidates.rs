//! Authored label anchors along room walls, loaded from JSON.
//!
//! The JSON is authored in a z-up frame; positions and directions are
//! rotated by -90° about X into the renderer's y-up frame on load.

use glam::{Quat, Vec3};
use serde::Deserialize;
use std::collections::HashMap;

/// One plausible label placement on a wall.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    pub position: Vec3,
    pub running_direction: Vec3,
    pub up: Vec3,
    pub front_face: Vec3,
    pub running_length: f32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPosition {
    position: [f32; 3],
    running_direction_local_x: [f32; 3],
    up_local_y: [f32; 3],
    front_face_local_z: [f32; 3],
    running_length_local_x_length: f32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSensorPositions {
    name: String,
    labelling_positions: Vec<RawPosition>,
}

/// Candidates keyed by sensor ID.
#[derive(Clone, Debug, Default)]
pub struct CandidateSet {
    by_sensor: HashMap<u32, Vec<Candidate>>,
}

/// Candidates shipped with the crate.
pub const BUNDLED_POSITIONS: &str = include_str!("../../assets/labelling_positions.json");

impl CandidateSet {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        let raw: Vec<RawSensorPositions> = serde_json::from_str(text)?;
        let to_y_up = Quat::from_rotation_x(-90f32.to_radians());
        let rotate = |v: [f32; 3]| to_y_up * Vec3::from(v);

        let mut by_sensor = HashMap::new();
        for entry in raw {
            let Some(sensor_id) = entry
                .name
                .strip_prefix("sensor_")
                .and_then(|id| id.parse::<u32>().ok())
            else {
                log::warn!("ignoring labelling positions for '{}'", entry.name);
                continue;
            };
            let candidates = entry
                .labelling_positions
                .iter()
                .map(|p| Candidate {
                    position: rotate(p.position),
                    running_direction: rotate(p.running_direction_local_x),
                    up: rotate(p.up_local_y),
                    front_face: rotate(p.front_face_local_z),
                    running_length: p.running_length_local_x_length,
                })
                .collect();
            by_sensor.insert(sensor_id, candidates);
        }
        Ok(Self { by_sensor })
    }

    pub fn bundled() -> Self {
        Self::from_json(BUNDLED_POSITIONS).unwrap_or_else(|e| {
            log::error!("bundled labelling positions are invalid: {}", e);
            Self::default()
        })
    }

    pub fn for_sensor(&self, sensor_id: u32) -> Option<&[Candidate]> {
        self.by_sensor.get(&sensor_id).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.by_sensor.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_sensor.is_empty()
    }

    pub fn insert(&mut self, sensor_id: u32, candidates: Vec<Candidate>) {
        self.by_sensor.insert(sensor_id, candidates);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn z_up_is_rotated_into_y_up() {
        let set = CandidateSet::from_json(
            r#"[{
                "name": "sensor_7",
                "labellingPositions": [{
                    "position": [1.0, 2.0, 3.0],
                    "runningDirectionLocalX": [1.0, 0.0, 0.0],
                    "upLocalY": [0.0, 0.0, 1.0],
                    "frontFaceLocalZ": [0.0, -1.0, 0.0],
                    "runningLengthLocalXLength": 2.5
                }]
            }]"#,
        )
        .unwrap();

        let c = set.for_sensor(7).unwrap()[0];
        assert!((c.position - Vec3::new(1.0, 3.0, -2.0)).length() < 1e-5);
        assert!((c.up - Vec3::Y).length() < 1e-5);
        assert!((c.front_face - Vec3::Z).length() < 1e-5);
        assert_eq!(c.running_length, 2.5);
    }

    #[test]
    fn unknown_names_are_skipped() {
        let set = CandidateSet::from_json(r#"[{ "name": "lamp", "labellingPositions": [] }]"#)
            .unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn bundled_positions_parse() {
        assert!(!CandidateSet::bundled().is_empty());
    }
}
