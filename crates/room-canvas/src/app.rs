use crate::{
    camera::CameraController,
    config::RendererConfig,
    labels::candidates::CandidateSet,
    picking::{ClickOutcome, Picker},
    renderer::Renderer,
    ui::{self, HudState},
};
use anyhow::Result;
use glam::Vec2;
use std::sync::Arc;
use winit::{
    event::{ElementState, MouseButton, WindowEvent},
    window::Window,
};

pub struct App {
    pub renderer: Renderer,
    pub camera_controller: CameraController,
    pub picker: Picker,
    pub egui_ctx: egui::Context,
    pub egui_state: egui_winit::State,
    /// Last pointer position in physical pixels.
    cursor: Option<Vec2>,
}

impl App {
    pub async fn new(
        window: Arc<Window>,
        config: RendererConfig,
        candidates: CandidateSet,
    ) -> Result<Self> {
        let renderer = Renderer::new(window.clone(), config, candidates).await?;

        let mut camera_controller = CameraController::new();
        camera_controller.enabled = !renderer.camera_controlled();

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            &*window,
            None,
            None,
        );

        Ok(Self {
            renderer,
            camera_controller,
            picker: Picker::default(),
            egui_ctx,
            egui_state,
            cursor: None,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        self.renderer.resize(new_size);
    }

    fn window_size(&self) -> Vec2 {
        let size = self.renderer.gfx.size;
        Vec2::new(size.width as f32, size.height as f32)
    }

    fn hover(&mut self, position: Vec2) {
        let window = self.window_size();
        let outcome = {
            let mut readback = self.renderer.readback(window);
            self.picker.pointer_moved(position, &mut readback)
        };
        if let Some(asset) = outcome.hovered_asset {
            self.renderer.set_hovered_asset(asset);
        }
        self.renderer.report_hover(outcome.event);
    }

    fn click(&mut self, position: Vec2) {
        let window = self.window_size();
        let outcome = {
            let mut readback = self.renderer.readback(window);
            self.picker.pointer_up(position, &mut readback)
        };
        if let Some(ClickOutcome { probe: Some(p), .. }) = outcome {
            self.renderer.add_probe(p);
        }
    }

    pub fn handle_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        let response = self.egui_state.on_window_event(window, event);
        if response.consumed {
            return true;
        }

        self.camera_controller.enabled = !self.renderer.camera_controlled();
        self.camera_controller
            .handle_event(event, &mut self.renderer.camera);

        match event {
            WindowEvent::Resized(physical_size) => self.resize(*physical_size),
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state,
                ..
            } => match state {
                ElementState::Pressed => self.picker.pointer_down(),
                ElementState::Released => {
                    if let Some(position) = self.cursor {
                        self.click(position);
                    }
                }
            },
            WindowEvent::CursorMoved { position, .. } => {
                let position = Vec2::new(position.x as f32, position.y as f32);
                self.cursor = Some(position);
                self.hover(position);
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
                self.renderer.set_hovered_asset(None);
                self.renderer.report_hover(None);
            }
            _ => {}
        }

        false
    }

    pub fn render(&mut self, window: &Window) -> Result<(), wgpu::SurfaceError> {
        self.renderer.poll_loads();
        self.renderer.prepare();

        let frame = self.renderer.gfx.surface.get_current_texture()?;
        let swap_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.renderer.render(&swap_view);

        let egui_input = self.egui_state.take_egui_input(window);
        self.egui_ctx.begin_frame(egui_input);

        let (sub_frame, sub_frames) = self.renderer.progress();
        let hud = HudState {
            frame: sub_frame,
            frames: sub_frames,
            probes: self.renderer.probes().len(),
            hovered_asset: self.renderer.hovered_asset(),
        };
        let mut config = self.renderer.config().clone();
        let actions = ui::draw_controls(&self.egui_ctx, &mut config, &hud);
        self.renderer.set_config(config);
        if actions.clear_probes {
            self.renderer.clear_probes();
        }

        let egui_output = self.egui_ctx.end_frame();
        let shapes = self
            .egui_ctx
            .tessellate(egui_output.shapes, self.egui_ctx.pixels_per_point());

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [
                self.renderer.gfx.config.width,
                self.renderer.gfx.config.height,
            ],
            pixels_per_point: self.egui_ctx.pixels_per_point(),
        };

        let mut encoder = self
            .renderer
            .gfx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("UI Encoder"),
            });

        for (id, delta) in &egui_output.textures_delta.set {
            self.renderer.egui_renderer.update_texture(
                &self.renderer.gfx.device,
                &self.renderer.gfx.queue,
                *id,
                delta,
            );
        }

        self.renderer.egui_renderer.update_buffers(
            &self.renderer.gfx.device,
            &self.renderer.gfx.queue,
            &mut encoder,
            &shapes,
            &screen_descriptor,
        );

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("EGUI Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &swap_view,
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

            self.renderer
                .egui_renderer
                .render(&mut render_pass, &shapes, &screen_descriptor);
        }

        for id in &egui_output.textures_delta.free {
            self.renderer.egui_renderer.free_texture(id);
        }

        self.renderer
            .gfx
            .queue
            .submit(std::iter::once(encoder.finish()));
        frame.present();

        Ok(())
    }
}
