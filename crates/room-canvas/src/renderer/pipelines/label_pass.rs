//! Text and icon labels, projected to the screen on the CPU and painted
//! with an off-screen egui renderer straight into the scene color target.

use crate::labels::{HorizontalAlign, Label, LabelKind, LineAnchor, Orientation};
use glam::{Mat4, Vec2, Vec3};

/// Camera state the labels are projected with.
#[derive(Clone, Copy, Debug)]
pub struct LabelProjection {
    pub view_projection: Mat4,
    /// World-space camera right and up, for billboards.
    pub right: Vec3,
    pub up: Vec3,
    pub size: Vec2,
    /// Sub-pixel jitter in NDC, the same the scene passes use.
    pub jitter: Vec2,
}

impl LabelProjection {
    pub fn to_screen(&self, p: Vec3) -> Option<Vec2> {
        let clip = self.view_projection * p.extend(1.0);
        if clip.w <= 1e-6 {
            return None;
        }
        let ndc = clip.truncate().truncate() / clip.w + self.jitter;
        Some(Vec2::new(
            (ndc.x + 1.0) * 0.5 * self.size.x,
            (1.0 - ndc.y) * 0.5 * self.size.y,
        ))
    }
}

/// A label resolved to pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct ScreenLabel {
    pub kind: LabelKind,
    pub text: String,
    pub position: Vec2,
    /// Clockwise, radians.
    pub angle: f32,
    pub size_px: f32,
    pub color: [u8; 3],
    pub align: HorizontalAlign,
    pub anchor: LineAnchor,
    pub max_width_px: Option<f32>,
}

const MIN_SIZE_PX: f32 = 1.0;

/// Projects all labels; those behind the camera or too small are dropped.
pub fn project_labels(labels: &[Label], projection: &LabelProjection) -> Vec<ScreenLabel> {
    labels
        .iter()
        .filter_map(|label| {
            let (direction, up) = match label.orientation {
                Orientation::Billboard => (projection.right, projection.up),
                Orientation::Oriented { direction, up } => (direction, up),
            };
            let origin = projection.to_screen(label.position)?;
            let along = projection.to_screen(label.position + direction * label.font_size)?;
            let above = projection.to_screen(label.position + up * label.font_size)?;

            let size_px = origin.distance(above);
            if size_px < MIN_SIZE_PX {
                return None;
            }
            let run = along - origin;
            let angle = match label.orientation {
                Orientation::Billboard => 0.0,
                Orientation::Oriented { .. } => run.y.atan2(run.x),
            };
            let px_per_unit = run.length() / label.font_size.max(1e-6);

            Some(ScreenLabel {
                kind: label.kind,
                text: label.text.clone(),
                position: origin,
                angle,
                size_px,
                color: label.color,
                align: label.align,
                anchor: label.anchor,
                max_width_px: label.line_width.map(|w| w * px_per_unit),
            })
        })
        .collect()
}

fn color32(rgb: [u8; 3]) -> egui::Color32 {
    egui::Color32::from_rgb(rgb[0], rgb[1], rgb[2])
}

fn rotate(v: egui::Vec2, angle: f32) -> egui::Vec2 {
    let (s, c) = angle.sin_cos();
    egui::vec2(c * v.x - s * v.y, s * v.x + c * v.y)
}

fn label_shape(ctx: &egui::Context, label: &ScreenLabel) -> egui::Shape {
    let center = egui::pos2(label.position.x, label.position.y);
    let color = color32(label.color);
    match label.kind {
        LabelKind::SensorIcon => egui::Shape::circle_filled(center, label.size_px, color),
        LabelKind::SensorIconCenter => egui::Shape::circle_filled(center, 0.6 * label.size_px, color),
        LabelKind::AssetIcon => egui::Shape::rect_filled(
            egui::Rect::from_center_size(center, egui::Vec2::splat(label.size_px)),
            0.2 * label.size_px,
            color,
        ),
        LabelKind::Text => {
            let mut job = egui::text::LayoutJob::single_section(
                label.text.clone(),
                egui::TextFormat {
                    font_id: egui::FontId::proportional(label.size_px),
                    color,
                    ..Default::default()
                },
            );
            if let Some(max_width) = label.max_width_px {
                job.wrap = egui::text::TextWrapping {
                    max_width,
                    max_rows: 1,
                    break_anywhere: true,
                    ..Default::default()
                };
            }
            let galley = ctx.fonts(|f| f.layout_job(job));
            let size = galley.size();
            let x = match label.align {
                HorizontalAlign::Left => 0.0,
                HorizontalAlign::Center => 0.5 * size.x,
            };
            let y = match label.anchor {
                LineAnchor::Top => 0.0,
                LineAnchor::Center => 0.5 * size.y,
                LineAnchor::Baseline => 0.8 * label.size_px,
            };
            let top_left = center + rotate(egui::vec2(-x, -y), label.angle);
            egui::Shape::Text(egui::epaint::TextShape::new(top_left, galley, color).with_angle(label.angle))
        }
    }
}

pub struct LabelPass {
    ctx: egui::Context,
    renderer: egui_wgpu::Renderer,
}

impl LabelPass {
    pub fn new(device: &wgpu::Device, color_fmt: wgpu::TextureFormat) -> Self {
        Self {
            ctx: egui::Context::default(),
            renderer: egui_wgpu::Renderer::new(device, color_fmt, None, 1),
        }
    }

    /// Paints `labels` over `dst` without clearing it.
    pub fn draw(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        dst: &wgpu::TextureView,
        labels: &[ScreenLabel],
        size: [u32; 2],
    ) {
        if labels.is_empty() {
            return;
        }
        let input = egui::RawInput {
            screen_rect: Some(egui::Rect::from_min_size(
                egui::Pos2::ZERO,
                egui::vec2(size[0] as f32, size[1] as f32),
            )),
            ..Default::default()
        };
        let output = self.ctx.run(input, |ctx| {
            let painter = ctx.layer_painter(egui::LayerId::background());
            for label in labels {
                painter.add(label_shape(ctx, label));
            }
        });
        let primitives = self.ctx.tessellate(output.shapes, output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: size,
            pixels_per_point: output.pixels_per_point,
        };

        for (id, delta) in &output.textures_delta.set {
            self.renderer.update_texture(device, queue, *id, delta);
        }
        self.renderer
            .update_buffers(device, queue, encoder, &primitives, &screen_descriptor);
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Label Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: dst,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.renderer.render(&mut rpass, &primitives, &screen_descriptor);
        }
        for id in &output.textures_delta.free {
            self.renderer.free_texture(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::LABEL_COLOR;

    fn projection() -> LabelProjection {
        // Orthographic view down -Z over [-10, 10]^2.
        LabelProjection {
            view_projection: Mat4::orthographic_rh(-10.0, 10.0, -10.0, 10.0, 0.1, 100.0)
                * Mat4::look_at_rh(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y),
            right: Vec3::X,
            up: Vec3::Y,
            size: Vec2::new(200.0, 200.0),
            jitter: Vec2::ZERO,
        }
    }

    fn label(position: Vec3, orientation: Orientation) -> Label {
        Label {
            kind: LabelKind::Text,
            text: "21.5 °C".into(),
            position,
            orientation,
            font_size: 1.0,
            color: LABEL_COLOR,
            align: HorizontalAlign::Left,
            anchor: LineAnchor::Baseline,
            line_width: Some(3.0),
        }
    }

    #[test]
    fn billboard_projects_to_pixels() {
        let labels = project_labels(&[label(Vec3::ZERO, Orientation::Billboard)], &projection());
        assert_eq!(labels.len(), 1);
        assert!((labels[0].position - Vec2::new(100.0, 100.0)).length() < 1e-3);
        assert!((labels[0].size_px - 10.0).abs() < 1e-3);
        assert_eq!(labels[0].angle, 0.0);
        assert!((labels[0].max_width_px.unwrap_or_default() - 30.0).abs() < 1e-3);
    }

    #[test]
    fn oriented_labels_follow_their_direction() {
        let down = Orientation::Oriented {
            direction: Vec3::NEG_Y,
            up: Vec3::X,
        };
        let labels = project_labels(&[label(Vec3::ZERO, down)], &projection());
        // World -Y points down the screen: a quarter turn clockwise.
        assert!((labels[0].angle - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
    }

    #[test]
    fn labels_behind_the_camera_are_dropped() {
        let p = LabelProjection {
            view_projection: Mat4::perspective_rh(1.0, 1.0, 0.1, 100.0)
                * Mat4::look_at_rh(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y),
            ..projection()
        };
        let labels = project_labels(
            &[
                label(Vec3::new(0.0, 0.0, 5.0), Orientation::Billboard),
                label(Vec3::new(0.0, 0.0, -5.0), Orientation::Billboard),
            ],
            &p,
        );
        assert_eq!(labels.len(), 1);
    }

    #[test]
    fn jitter_shifts_every_label() {
        let jittered = LabelProjection {
            jitter: Vec2::new(0.01, 0.0),
            ..projection()
        };
        let a = project_labels(&[label(Vec3::ZERO, Orientation::Billboard)], &projection());
        let b = project_labels(&[label(Vec3::ZERO, Orientation::Billboard)], &jittered);
        assert!((b[0].position.x - a[0].position.x - 1.0).abs() < 1e-3);
    }
}
