//! Color-scale presets and the volume opacity transfer function.

use crate::config::{ColorScaleConfig, TransferFunction};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

const BUNDLED_COLORBREWER: &str = include_str!("../assets/colorscales/colorbrewer.json");

/// Steps of the default opacity ramp.
const TRANSFER_PRESET_STEPS: usize = 5;

#[derive(Debug, Error)]
pub enum ColorScaleError {
    #[error("color-scale presets '{source_name}' are invalid: {error}")]
    Parse {
        source_name: String,
        #[source]
        error: serde_json::Error,
    },
    #[error("failed to read color-scale presets '{}'", .0.display())]
    Io(PathBuf, #[source] std::io::Error),
    #[error("unknown color-scale source '{0}'")]
    UnknownSource(String),
    #[error("unknown color-scale preset '{preset}' in '{source_name}'")]
    UnknownPreset { source_name: String, preset: String },
    #[error("a color scale needs at least one stop")]
    ZeroStops,
}

#[derive(Clone, Debug, Deserialize)]
struct Preset {
    identifier: String,
    colors: Vec<[u8; 3]>,
}

/// A discrete RGB lookup, lowest value first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorScale {
    colors: Vec<[u8; 3]>,
}

impl ColorScale {
    pub fn new(colors: Vec<[u8; 3]>) -> Self {
        Self { colors }
    }

    pub fn colors(&self) -> &[[u8; 3]] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Linearly resamples the scale to `stops` evenly spaced colors.
    pub fn resample(&self, stops: u32) -> Result<Self, ColorScaleError> {
        if stops == 0 || self.colors.is_empty() {
            return Err(ColorScaleError::ZeroStops);
        }
        let last = (self.colors.len() - 1) as f32;
        let colors = (0..stops)
            .map(|i| {
                let t = if stops == 1 {
                    0.5
                } else {
                    i as f32 / (stops - 1) as f32
                };
                let x = t * last;
                let lo = x.floor() as usize;
                let hi = (lo + 1).min(self.colors.len() - 1);
                let f = x - lo as f32;
                let (a, b) = (self.colors[lo], self.colors[hi]);
                [0, 1, 2].map(|c| (a[c] as f32 + (b[c] as f32 - a[c] as f32) * f).round() as u8)
            })
            .collect();
        Ok(Self { colors })
    }

    pub fn invert(&mut self) {
        self.colors.reverse();
    }

    /// Texel data for an `Rgba8Unorm` row.
    pub fn to_rgba(&self) -> Vec<u8> {
        self.colors
            .iter()
            .flat_map(|[r, g, b]| [*r, *g, *b, 255])
            .collect()
    }
}

/// Preset files discovered on disk, keyed by source name (file stem).
#[derive(Clone, Debug, Default)]
pub struct PresetLibrary {
    sources: HashMap<String, PathBuf>,
}

impl PresetLibrary {
    /// Collects `<source>.json` files below the given roots. Later roots win.
    pub fn discover<P: AsRef<Path>>(roots: &[P]) -> Self {
        let mut sources = HashMap::new();
        for root in roots {
            let root = root.as_ref();
            if !root.is_dir() {
                continue;
            }
            for entry in WalkDir::new(root).follow_links(true).into_iter().flatten() {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("json") {
                    continue;
                }
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    sources.insert(stem.to_owned(), path.to_path_buf());
                }
            }
        }
        log::debug!("found {} color-scale sources", sources.len());
        Self { sources }
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    fn read_source(&self, source: &str) -> Result<String, ColorScaleError> {
        match self.sources.get(source) {
            Some(path) => {
                std::fs::read_to_string(path).map_err(|e| ColorScaleError::Io(path.clone(), e))
            }
            None if source == "colorbrewer" => Ok(BUNDLED_COLORBREWER.to_owned()),
            None => Err(ColorScaleError::UnknownSource(source.to_owned())),
        }
    }

    /// Loads the preset named by `config` with stops and inversion applied.
    pub fn load(&self, config: &ColorScaleConfig) -> Result<ColorScale, ColorScaleError> {
        let text = self.read_source(&config.source)?;
        let mut scale = parse_preset(&config.source, &text, &config.preset)?.resample(config.stops)?;
        if config.invert {
            scale.invert();
        }
        Ok(scale)
    }
}

fn parse_preset(source: &str, text: &str, preset: &str) -> Result<ColorScale, ColorScaleError> {
    let presets: Vec<Preset> =
        serde_json::from_str(text).map_err(|error| ColorScaleError::Parse {
            source_name: source.to_owned(),
            error,
        })?;
    presets
        .into_iter()
        .find(|p| p.identifier == preset)
        .map(|p| ColorScale::new(p.colors))
        .ok_or_else(|| ColorScaleError::UnknownPreset {
            source_name: source.to_owned(),
            preset: preset.to_owned(),
        })
}

/// Scales already built, keyed by the full selection.
#[derive(Debug, Default)]
pub struct ColorScaleCache {
    entries: HashMap<(String, String, u32, bool), ColorScale>,
}

impl ColorScaleCache {
    fn key(config: &ColorScaleConfig) -> (String, String, u32, bool) {
        (
            config.source.clone(),
            config.preset.clone(),
            config.stops,
            config.invert,
        )
    }

    pub fn get(&self, config: &ColorScaleConfig) -> Option<&ColorScale> {
        self.entries.get(&Self::key(config))
    }

    pub fn insert(&mut self, config: &ColorScaleConfig, scale: ColorScale) {
        self.entries.insert(Self::key(config), scale);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// RGBA texels of the opacity lookup; only alpha carries information.
pub fn transfer_function_texels(function: &TransferFunction) -> Vec<u8> {
    let alphas: Vec<u8> = match function {
        TransferFunction::Preset => (0..TRANSFER_PRESET_STEPS)
            .rev()
            .map(|i| (i as f32 / (TRANSFER_PRESET_STEPS - 1) as f32 * 255.0).round() as u8)
            .collect(),
        TransferFunction::Custom { points } => points
            .iter()
            .map(|y| (y * 255.0).round().clamp(0.0, 255.0) as u8)
            .collect(),
    };
    if alphas.is_empty() {
        return vec![255, 255, 255, 255];
    }
    alphas.into_iter().flat_map(|a| [255, 255, 255, a]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selection(preset: &str, stops: u32, invert: bool) -> ColorScaleConfig {
        ColorScaleConfig {
            preset: preset.into(),
            stops,
            invert,
            ..ColorScaleConfig::default()
        }
    }

    #[test]
    fn resample_keeps_endpoints() {
        let scale = ColorScale::new(vec![[0, 0, 0], [200, 100, 50]]);
        let r = scale.resample(3).unwrap();
        assert_eq!(r.colors(), &[[0, 0, 0], [100, 50, 25], [200, 100, 50]]);
    }

    #[test]
    fn zero_stops_is_an_error() {
        let scale = ColorScale::new(vec![[0, 0, 0]]);
        assert!(matches!(scale.resample(0), Err(ColorScaleError::ZeroStops)));
    }

    #[test]
    fn bundled_default_loads_inverted() {
        let library = PresetLibrary::default();
        let plain = library.load(&selection("RdYlBu", 7, false)).unwrap();
        let inverted = library.load(&selection("RdYlBu", 7, true)).unwrap();
        assert_eq!(plain.len(), 7);
        assert_eq!(plain.colors()[0], [165, 0, 38]);
        assert_eq!(inverted.colors()[0], [49, 54, 149]);
        assert_eq!(inverted.to_rgba().len(), 28);
    }

    #[test]
    fn unknown_preset_and_source() {
        let library = PresetLibrary::default();
        assert!(matches!(
            library.load(&selection("Nope", 7, false)),
            Err(ColorScaleError::UnknownPreset { .. })
        ));
        let mut config = selection("RdYlBu", 7, false);
        config.source = "missing".into();
        assert!(matches!(
            library.load(&config),
            Err(ColorScaleError::UnknownSource(_))
        ));
    }

    #[test]
    fn cache_is_keyed_by_selection() {
        let mut cache = ColorScaleCache::default();
        let a = selection("RdYlBu", 7, true);
        cache.insert(&a, ColorScale::new(vec![[1, 2, 3]]));
        assert!(cache.get(&a).is_some());
        assert!(cache.get(&selection("RdYlBu", 5, true)).is_none());
    }

    #[test]
    fn default_transfer_function_is_inverted_ramp() {
        let texels = transfer_function_texels(&TransferFunction::Preset);
        let alphas: Vec<u8> = texels.chunks(4).map(|t| t[3]).collect();
        assert_eq!(alphas, vec![255, 191, 128, 64, 0]);
    }

    #[test]
    fn custom_points_are_clamped() {
        let texels = transfer_function_texels(&TransferFunction::Custom {
            points: vec![-0.5, 0.5, 2.0],
        });
        assert_eq!(texels, vec![255, 255, 255, 0, 255, 255, 255, 128, 255, 255, 255, 255]);
    }
}
