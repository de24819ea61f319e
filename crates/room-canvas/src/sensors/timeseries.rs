//! Time series input and the value lookup used to derive labels.

use super::{AssetValue, SensorValue, SensorValueLabel};
use glam::Vec3;
use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeSeriesError {
    #[error("no data points for interpolation have been given")]
    NoInterpolationData,
    #[error("no data points have been given")]
    NoData,
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct DataPoint {
    /// Unix timestamp in milliseconds.
    pub timestamp: i64,
    pub value: f32,
}

/// How a value is derived for a timestamp between samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lookup {
    Nearest,
    Interpolate,
    FirstDerivative,
}

fn round2(v: f32) -> f32 {
    (v * 100.0).round() / 100.0
}

/// Finds the value at `at`.
///
/// Samples at or before `at` form the "before" side, later samples the
/// "after" side. An exact hit therefore resolves to its own value.
pub fn find_closest_entry(
    series: &[DataPoint],
    at: i64,
    lookup: Lookup,
) -> Result<f32, TimeSeriesError> {
    if lookup == Lookup::Nearest {
        return series
            .iter()
            .min_by_key(|p| (p.timestamp - at).unsigned_abs())
            .map(|p| p.value)
            .ok_or(TimeSeriesError::NoData);
    }

    let mut before: Option<(i64, f32)> = None;
    let mut after: Option<(i64, f32)> = None;
    for p in series {
        let dt = p.timestamp - at;
        if dt <= 0 {
            if before.map_or(true, |(b, _)| dt > b) {
                before = Some((dt, p.value));
            }
        } else if after.map_or(true, |(a, _)| dt < a) {
            after = Some((dt, p.value));
        }
    }

    match (before, after) {
        (Some((bdt, b)), Some((adt, a))) => {
            if lookup == Lookup::FirstDerivative {
                return Ok(round2(a - b));
            }
            let f = bdt.unsigned_abs() as f64 / (adt.unsigned_abs() + bdt.unsigned_abs()) as f64;
            Ok(round2(b * (1.0 - f as f32) + a * f as f32))
        }
        (Some((_, v)), None) | (None, Some((_, v))) => {
            if lookup == Lookup::FirstDerivative {
                Ok(0.0)
            } else {
                Ok(round2(v))
            }
        }
        (None, None) => Err(TimeSeriesError::NoInterpolationData),
    }
}

pub fn label_text(value: f32, unit: &str) -> String {
    format!("{} {}", value, unit)
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorSeries {
    pub sensor_id: u32,
    #[serde(default)]
    pub asset_id: Option<u32>,
    pub position: Vec3,
    pub series: Vec<DataPoint>,
}

/// Sensor readings over time for one building.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorFeed {
    #[serde(default = "default_unit")]
    pub unit: String,
    pub sensors: Vec<SensorSeries>,
}

fn default_unit() -> String {
    "°C".into()
}

/// Values, per-asset groupings and labels at one point in time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    pub sensor_values: Vec<SensorValue>,
    pub asset_values: Vec<AssetValue>,
    pub labels: Vec<SensorValueLabel>,
}

impl SensorFeed {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn latest_timestamp(&self) -> Option<i64> {
        self.sensors
            .iter()
            .flat_map(|s| s.series.iter().map(|p| p.timestamp))
            .max()
    }

    /// Sensors without samples are skipped rather than failing the lookup.
    pub fn snapshot(&self, at: i64, lookup: Lookup) -> Snapshot {
        let mut snapshot = Snapshot::default();
        let mut by_asset: BTreeMap<u32, Vec<SensorValue>> = BTreeMap::new();

        for sensor in &self.sensors {
            if sensor.series.is_empty() {
                log::warn!("sensor {} has no samples", sensor.sensor_id);
                continue;
            }
            let value = match find_closest_entry(&sensor.series, at, lookup) {
                Ok(v) => v,
                Err(e) => {
                    log::warn!("sensor {}: {}", sensor.sensor_id, e);
                    continue;
                }
            };
            let sv = SensorValue {
                sensor_id: sensor.sensor_id,
                position: sensor.position,
                value,
            };
            if let Some(asset_id) = sensor.asset_id {
                by_asset.entry(asset_id).or_default().push(sv.clone());
            }
            snapshot.labels.push(SensorValueLabel {
                sensor_id: sensor.sensor_id,
                position: sensor.position,
                label_text: label_text(value, &self.unit),
            });
            snapshot.sensor_values.push(sv);
        }

        snapshot.asset_values = by_asset
            .into_iter()
            .map(|(asset_id, sensor_values)| AssetValue {
                asset_id,
                sensor_values,
            })
            .collect();
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(timestamp: i64, value: f32) -> DataPoint {
        DataPoint { timestamp, value }
    }

    #[test]
    fn interpolates_between_neighbours() {
        let series = [p(0, 20.0), p(100, 22.0), p(1000, 30.0)];
        assert_eq!(
            find_closest_entry(&series, 25, Lookup::Interpolate),
            Ok(20.5)
        );
    }

    #[test]
    fn exact_hit_returns_sample() {
        let series = [p(0, 20.0), p(100, 22.126)];
        assert_eq!(
            find_closest_entry(&series, 100, Lookup::Interpolate),
            Ok(22.13)
        );
    }

    #[test]
    fn one_sided_returns_nearest_side() {
        let series = [p(0, 20.0), p(100, 22.0)];
        assert_eq!(
            find_closest_entry(&series, 500, Lookup::Interpolate),
            Ok(22.0)
        );
        assert_eq!(
            find_closest_entry(&series, -5, Lookup::Interpolate),
            Ok(20.0)
        );
    }

    #[test]
    fn derivative_between_neighbours() {
        let series = [p(0, 20.0), p(100, 22.5)];
        assert_eq!(
            find_closest_entry(&series, 50, Lookup::FirstDerivative),
            Ok(2.5)
        );
        assert_eq!(
            find_closest_entry(&series, 500, Lookup::FirstDerivative),
            Ok(0.0)
        );
    }

    #[test]
    fn empty_series_errors() {
        assert_eq!(
            find_closest_entry(&[], 0, Lookup::Interpolate),
            Err(TimeSeriesError::NoInterpolationData)
        );
        assert_eq!(
            find_closest_entry(&[], 0, Lookup::Nearest),
            Err(TimeSeriesError::NoData)
        );
    }

    #[test]
    fn nearest_picks_smallest_distance() {
        let series = [p(0, 1.0), p(100, 2.0), p(130, 3.0)];
        assert_eq!(find_closest_entry(&series, 120, Lookup::Nearest), Ok(3.0));
    }

    #[test]
    fn label_text_has_unit() {
        assert_eq!(label_text(21.3, "°C"), "21.3 °C");
        assert_eq!(label_text(21.0, "°C"), "21 °C");
    }

    #[test]
    fn snapshot_groups_by_asset_and_skips_empty() {
        let feed = SensorFeed::from_json(
            r#"{
                "unit": "°C",
                "sensors": [
                    { "sensorId": 1, "assetId": 4, "position": [0, 1, 0], "series": [{ "timestamp": 0, "value": 20 }] },
                    { "sensorId": 2, "assetId": 4, "position": [1, 1, 0], "series": [{ "timestamp": 0, "value": 22 }] },
                    { "sensorId": 3, "position": [2, 1, 0], "series": [] }
                ]
            }"#,
        )
        .unwrap();
        let snap = feed.snapshot(0, Lookup::Interpolate);
        assert_eq!(snap.sensor_values.len(), 2);
        assert_eq!(snap.labels.len(), 2);
        assert_eq!(snap.asset_values.len(), 1);
        assert_eq!(snap.asset_values[0].mean(), Some(21.0));
        assert_eq!(feed.latest_timestamp(), Some(0));
    }
}
