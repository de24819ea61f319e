// src/lib.rs
//! Building-interior sensor visualisation renderer.
//!
//! Renders a glTF building model with interpolated temperature heatmaps,
//! shadows, volumetric probes and camera-aware sensor labels, and resolves
//! pointer interaction through off-screen identifier buffers.

pub mod app;
pub mod camera;
pub mod colorscale;
pub mod config;
pub mod distance_field;
pub mod events;
pub mod labels;
pub mod loader;
pub mod picking;
pub mod renderer;
pub mod scene;
pub mod sensors;
pub mod sun;
pub mod ui;
