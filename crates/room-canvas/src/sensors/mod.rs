//! Sensor readings as handed to the renderer, plus uniform-slot bookkeeping.

pub mod timeseries;

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Number of sensor/asset slots the shading stage can address.
pub const MAX_SENSORS: usize = 16;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorValue {
    pub sensor_id: u32,
    pub position: Vec3,
    pub value: f32,
}

/// Readings of all sensors located in one room/asset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetValue {
    pub asset_id: u32,
    pub sensor_values: Vec<SensorValue>,
}

impl AssetValue {
    pub fn mean(&self) -> Option<f32> {
        if self.sensor_values.is_empty() {
            return None;
        }
        let sum: f32 = self.sensor_values.iter().map(|s| s.value).sum();
        Some(sum / self.sensor_values.len() as f32)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorValueLabel {
    pub sensor_id: u32,
    pub position: Vec3,
    pub label_text: String,
}

/// Maps sensor IDs onto uniform-array slots.
///
/// The order is taken from the first sequence seen for a given ID set and is
/// only reassigned when the set itself changes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SensorSlots {
    ids: Vec<u32>,
}

impl SensorSlots {
    /// Updates the assignment; returns `true` if the slots were reassigned.
    pub fn assign(&mut self, values: &[SensorValue]) -> bool {
        let mut next: Vec<u32> = Vec::with_capacity(values.len());
        for v in values {
            if !next.contains(&v.sensor_id) {
                next.push(v.sensor_id);
            }
        }
        if next.len() > MAX_SENSORS {
            log::warn!(
                "{} sensors given, only the first {} are shaded",
                next.len(),
                MAX_SENSORS
            );
            next.truncate(MAX_SENSORS);
        }

        let mut a = next.clone();
        let mut b = self.ids.clone();
        a.sort_unstable();
        b.sort_unstable();
        if a == b {
            return false;
        }
        self.ids = next;
        true
    }

    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn slot_of(&self, sensor_id: u32) -> Option<usize> {
        self.ids.iter().position(|id| *id == sensor_id)
    }

    /// Values and positions laid out by slot; unused slots stay zero.
    pub fn pack(&self, values: &[SensorValue]) -> [[f32; 4]; MAX_SENSORS] {
        let mut packed = [[0.0; 4]; MAX_SENSORS];
        for v in values {
            if let Some(slot) = self.slot_of(v.sensor_id) {
                packed[slot] = [v.position.x, v.position.y, v.position.z, v.value];
            }
        }
        packed
    }
}

/// Asset IDs and their mean values, truncated to [`MAX_SENSORS`] entries.
pub fn pack_asset_values(assets: &[AssetValue]) -> Vec<(u32, f32)> {
    assets
        .iter()
        .filter_map(|a| a.mean().map(|m| (a.asset_id, m)))
        .take(MAX_SENSORS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sv(id: u32, value: f32) -> SensorValue {
        SensorValue {
            sensor_id: id,
            position: Vec3::new(id as f32, 0.0, 0.0),
            value,
        }
    }

    #[test]
    fn asset_mean_of_multiple_values() {
        let asset = AssetValue {
            asset_id: 3,
            sensor_values: vec![sv(1, 20.0), sv(2, 22.0), sv(3, 24.0)],
        };
        assert_eq!(asset.mean(), Some(22.0));
        let empty = AssetValue {
            asset_id: 4,
            sensor_values: vec![],
        };
        assert_eq!(empty.mean(), None);
    }

    #[test]
    fn slots_survive_value_updates_and_reorders() {
        let mut slots = SensorSlots::default();
        assert!(slots.assign(&[sv(5, 20.0), sv(2, 21.0)]));
        assert_eq!(slots.ids(), &[5, 2]);

        assert!(!slots.assign(&[sv(2, 19.0), sv(5, 25.0)]));
        assert_eq!(slots.slot_of(5), Some(0));
        assert_eq!(slots.slot_of(2), Some(1));

        assert!(slots.assign(&[sv(2, 19.0), sv(9, 25.0)]));
        assert_eq!(slots.ids(), &[2, 9]);
    }

    #[test]
    fn empty_sensor_set_packs_zeroes() {
        let mut slots = SensorSlots::default();
        assert!(!slots.assign(&[]));
        assert!(slots.is_empty());
        let packed = slots.pack(&[]);
        assert!(packed.iter().all(|p| *p == [0.0; 4]));
    }

    #[test]
    fn pack_places_values_by_slot() {
        let mut slots = SensorSlots::default();
        slots.assign(&[sv(5, 20.0), sv(2, 21.0)]);
        let packed = slots.pack(&[sv(2, 21.0), sv(5, 20.0)]);
        assert_eq!(packed[0], [5.0, 0.0, 0.0, 20.0]);
        assert_eq!(packed[1], [2.0, 0.0, 0.0, 21.0]);
    }

    #[test]
    fn slot_count_is_capped() {
        let many: Vec<_> = (0..20).map(|i| sv(i, 0.0)).collect();
        let mut slots = SensorSlots::default();
        slots.assign(&many);
        assert_eq!(slots.len(), MAX_SENSORS);
    }
}
