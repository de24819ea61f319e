//! Debug overlay drawn with egui on top of the presented frame.

use crate::config::{RendererConfig, ShadowMode};

/// Read-only renderer state shown in the panel.
#[derive(Clone, Copy, Debug, Default)]
pub struct HudState {
    pub frame: u32,
    pub frames: u32,
    pub probes: usize,
    pub hovered_asset: Option<u32>,
}

/// Requests from the panel that are not configuration properties.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UiActions {
    pub clear_probes: bool,
}

pub fn progress_fraction(frame: u32, frames: u32) -> f32 {
    (frame.min(frames) as f32 / frames.max(1) as f32).clamp(0.0, 1.0)
}

fn shadow_modes() -> [ShadowMode; 4] {
    [
        ShadowMode::default(),
        ShadowMode::exponential(),
        ShadowMode::variance(),
        ShadowMode::exponential_variance(),
    ]
}

/// Control panel; edits `config` in place.
pub fn draw_controls(ctx: &egui::Context, config: &mut RendererConfig, hud: &HudState) -> UiActions {
    let mut actions = UiActions::default();

    egui::SidePanel::left("controls")
        .default_width(250.0)
        .show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false; 2])
                .show(ui, |ui| {
                    ui.heading("Room Canvas");
                    ui.separator();

                    ui.label(format!(
                        "Accumulation {}/{}",
                        hud.frame.min(hud.frames),
                        hud.frames
                    ));
                    ui.add(egui::ProgressBar::new(progress_fraction(hud.frame, hud.frames)));
                    ui.add(
                        egui::Slider::new(&mut config.multi_frame_number, 1..=256)
                            .logarithmic(true)
                            .text("Sub-frames"),
                    );
                    if let Some(asset) = hud.hovered_asset {
                        ui.weak(format!("Hovering asset {}", asset));
                    }

                    ui.separator();
                    ui.label("Sensor data");
                    ui.checkbox(&mut config.enable_surface_sensor_data_visualization, "Surface");
                    ui.checkbox(&mut config.enable_volume_sensor_data_visualization, "Volume");
                    ui.checkbox(&mut config.visualize_on_asset_level, "Asset level");
                    ui.checkbox(&mut config.use_low_bit_distance_map, "Low-bit distance map");
                    ui.checkbox(&mut config.use_transparency_transfer_function, "Transfer function");
                    ui.checkbox(&mut config.show_grid, "Grid");
                    ui.add(egui::Slider::new(&mut config.idw_exponent, 1.0..=8.0).text("IDW exponent"));

                    ui.separator();
                    ui.label("Lighting");
                    ui.checkbox(&mut config.sun_is_up, "Sun is up");
                    ui.checkbox(&mut config.enable_shadow_mapping, "Shadows");
                    egui::ComboBox::from_label("Shadow mode")
                        .selected_text(config.shadow_mode.name())
                        .show_ui(ui, |ui| {
                            for mode in shadow_modes() {
                                let selected = mode.index() == config.shadow_mode.index();
                                if ui.selectable_label(selected, mode.name()).clicked() && !selected {
                                    config.shadow_mode = mode;
                                }
                            }
                        });

                    ui.separator();
                    ui.label("Shading");
                    ui.checkbox(&mut config.enable_edge_outline, "Edge outline");
                    ui.checkbox(&mut config.enable_ssao, "SSAO");
                    ui.add_enabled(
                        config.enable_ssao,
                        egui::Slider::new(&mut config.ssao.spiral_turns, 1.0..=16.0).text("Spiral turns"),
                    );

                    ui.separator();
                    ui.label("Labels");
                    ui.checkbox(&mut config.enable_sensor_icons, "Sensor icons");
                    ui.checkbox(&mut config.sensor_value_labels_config.display_labels, "Value labels");
                    ui.checkbox(
                        &mut config.enable_metadata_and_color_scale_labelling,
                        "Metadata and color scale",
                    );
                    ui.checkbox(&mut config.enable_asset_highlighting_on_hover, "Highlight on hover");
                    ui.add(egui::Slider::new(&mut config.font_size, 0.25..=4.0).text("Font size"));

                    ui.separator();
                    ui.label(format!("Probes: {}", hud.probes));
                    if ui
                        .add_enabled(hud.probes > 0, egui::Button::new("Clear probes"))
                        .clicked()
                    {
                        actions.clear_probes = true;
                    }
                });
        });

    actions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_is_clamped() {
        assert_eq!(progress_fraction(0, 64), 0.0);
        assert_eq!(progress_fraction(32, 64), 0.5);
        assert_eq!(progress_fraction(80, 64), 1.0);
        assert_eq!(progress_fraction(0, 0), 0.0);
    }

    #[test]
    fn every_shadow_mode_is_offered_once() {
        let mut indices: Vec<u32> = shadow_modes().iter().map(ShadowMode::index).collect();
        indices.sort_unstable();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }
}
