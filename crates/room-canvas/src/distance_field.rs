//! Precomputed per-sensor distance fields, stored as PNG slice atlases.
//!
//! Each PNG stacks `slices` horizontal layers vertically; layer `k` covers
//! rows `k * h .. (k + 1) * h` with `h = height / slices`. Sensor volumes
//! are concatenated along depth in sensor-slot order.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DistanceFieldError {
    #[error("failed to decode distance map '{}'", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        error: image::ImageError,
    },
    #[error("image height {height} is not divisible into {slices} slices")]
    SliceCount { height: u32, slices: u32 },
    #[error("distance map '{}' has slices of {got:?}, expected {expected:?}", .path.display())]
    DimensionMismatch {
        path: PathBuf,
        got: (u32, u32),
        expected: (u32, u32),
    },
    #[error("no sensors to load distance maps for")]
    NoSensors,
}

/// Single-channel 3D texel data, x fastest then y then z.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VolumeData {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub texels: Vec<u8>,
}

impl VolumeData {
    /// A 1x1x1 zero volume bound until real data arrives.
    pub fn placeholder() -> Self {
        Self {
            width: 1,
            height: 1,
            depth: 1,
            texels: vec![0],
        }
    }

    /// Splits one atlas of `slices` stacked layers into a volume.
    pub fn from_atlas(
        width: u32,
        height: u32,
        texels: Vec<u8>,
        slices: u32,
    ) -> Result<Self, DistanceFieldError> {
        if slices == 0 || height % slices != 0 {
            return Err(DistanceFieldError::SliceCount { height, slices });
        }
        Ok(Self {
            width,
            height: height / slices,
            depth: slices,
            texels,
        })
    }

    /// Concatenates volumes of equal footprint along depth.
    pub fn stack(volumes: Vec<(PathBuf, VolumeData)>) -> Result<Self, DistanceFieldError> {
        let mut iter = volumes.into_iter();
        let Some((_, mut stacked)) = iter.next() else {
            return Err(DistanceFieldError::NoSensors);
        };
        for (path, volume) in iter {
            if (volume.width, volume.height) != (stacked.width, stacked.height) {
                return Err(DistanceFieldError::DimensionMismatch {
                    path,
                    got: (volume.width, volume.height),
                    expected: (stacked.width, stacked.height),
                });
            }
            stacked.depth += volume.depth;
            stacked.texels.extend(volume.texels);
        }
        Ok(stacked)
    }
}

pub fn sensor_map_path(root: &Path, sensor_id: u32, part: &str) -> PathBuf {
    root.join("distance-maps")
        .join(format!("sensor_{}_{}.png", sensor_id, part))
}

pub fn outside_map_path(root: &Path) -> PathBuf {
    root.join("distance-maps").join("outside.png")
}

/// Decodes one atlas PNG into a volume.
pub fn load_atlas(path: &Path, slices: u32) -> Result<VolumeData, DistanceFieldError> {
    let image = image::open(path)
        .map_err(|error| DistanceFieldError::Decode {
            path: path.to_path_buf(),
            error,
        })?
        .to_luma8();
    let (width, height) = image.dimensions();
    VolumeData::from_atlas(width, height, image.into_raw(), slices)
}

/// High and low byte volumes of all sensors, in slot order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SensorFields {
    pub sensor_ids: Vec<u32>,
    pub high: VolumeData,
    pub low: VolumeData,
}

pub fn load_sensor_fields(
    root: &Path,
    sensor_ids: &[u32],
    slices: u32,
) -> Result<SensorFields, DistanceFieldError> {
    let load_part = |part: &str| {
        sensor_ids
            .iter()
            .map(|id| {
                let path = sensor_map_path(root, *id, part);
                load_atlas(&path, slices).map(|v| (path, v))
            })
            .collect::<Result<Vec<_>, _>>()
            .and_then(VolumeData::stack)
    };
    let high = load_part("high")?;
    let low = load_part("low")?;
    log::info!(
        "loaded distance maps for {} sensors ({}x{}x{})",
        sensor_ids.len(),
        high.width,
        high.height,
        high.depth
    );
    Ok(SensorFields {
        sensor_ids: sensor_ids.to_vec(),
        high,
        low,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atlas_splits_into_slices() {
        let v = VolumeData::from_atlas(2, 6, (0..12).collect(), 3).unwrap();
        assert_eq!((v.width, v.height, v.depth), (2, 2, 3));
        // Row 0 of slice 1 starts at texel 4.
        assert_eq!(v.texels[(v.width * v.height) as usize], 4);
    }

    #[test]
    fn uneven_slices_are_rejected() {
        let err = VolumeData::from_atlas(2, 7, vec![0; 14], 3).unwrap_err();
        assert!(matches!(err, DistanceFieldError::SliceCount { height: 7, slices: 3 }));
        assert!(VolumeData::from_atlas(2, 7, vec![0; 14], 0).is_err());
    }

    #[test]
    fn sensors_stack_along_depth() {
        let a = VolumeData::from_atlas(2, 4, vec![1; 8], 2).unwrap();
        let b = VolumeData::from_atlas(2, 4, vec![2; 8], 2).unwrap();
        let s = VolumeData::stack(vec![("a".into(), a), ("b".into(), b)]).unwrap();
        assert_eq!(s.depth, 4);
        assert_eq!(&s.texels[..8], &[1; 8]);
        assert_eq!(&s.texels[8..], &[2; 8]);
    }

    #[test]
    fn mismatched_footprints_are_rejected() {
        let a = VolumeData::from_atlas(2, 4, vec![1; 8], 2).unwrap();
        let b = VolumeData::from_atlas(3, 4, vec![2; 12], 2).unwrap();
        let err = VolumeData::stack(vec![("a".into(), a), ("b".into(), b)]).unwrap_err();
        assert!(matches!(err, DistanceFieldError::DimensionMismatch { .. }));
    }

    #[test]
    fn empty_sensor_set_is_an_error() {
        assert!(matches!(
            VolumeData::stack(Vec::new()),
            Err(DistanceFieldError::NoSensors)
        ));
    }

    #[test]
    fn paths_follow_asset_layout() {
        let root = Path::new("/data/flat");
        assert_eq!(
            sensor_map_path(root, 334, "low"),
            PathBuf::from("/data/flat/distance-maps/sensor_334_low.png")
        );
        assert_eq!(
            outside_map_path(root),
            PathBuf::from("/data/flat/distance-maps/outside.png")
        );
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_atlas(Path::new("/nonexistent/outside.png"), 28).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/outside.png"));
    }
}
