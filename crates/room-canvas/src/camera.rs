use crate::config::CameraPose;
use glam::{Mat4, Vec3};
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};

/// Perspective camera described by eye, center and up.
#[derive(Debug, Clone)]
pub struct Camera {
    eye: Vec3,
    center: Vec3,
    up: Vec3,
    pub fovy_deg: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    /// Set on every mutation, consumed by the renderer.
    altered: bool,
}

impl Camera {
    pub fn new(pose: CameraPose, aspect: f32) -> Self {
        Self {
            eye: pose.eye,
            center: pose.center,
            up: pose.up,
            fovy_deg: 45.0,
            aspect,
            near: 1.0,
            far: 512.0,
            altered: true,
        }
    }

    #[inline]
    pub fn eye(&self) -> Vec3 {
        self.eye
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        self.center
    }

    #[inline]
    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn pose(&self) -> CameraPose {
        CameraPose {
            eye: self.eye,
            center: self.center,
            up: self.up,
        }
    }

    pub fn set_pose(&mut self, pose: CameraPose) {
        if pose != self.pose() {
            self.eye = pose.eye;
            self.center = pose.center;
            self.up = pose.up;
            self.altered = true;
        }
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect != self.aspect {
            self.aspect = aspect;
            self.altered = true;
        }
    }

    /// Returns whether the camera changed since the last call.
    pub fn take_altered(&mut self) -> bool {
        std::mem::replace(&mut self.altered, false)
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.center, self.up)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fovy_deg.to_radians(),
            self.aspect.max(1e-4),
            self.near,
            self.far,
        )
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }

    pub fn view_projection_inverse(&self) -> Mat4 {
        self.view_projection().inverse()
    }

    /// Normalised device coordinates of a world-space point.
    pub fn ndc(&self, p: Vec3) -> Vec3 {
        self.view_projection().project_point3(p)
    }

    /// Rotates the eye around the center (azimuth about +Y, elevation from the floor plane).
    pub fn orbit(&mut self, d_azimuth: f32, d_elevation: f32) {
        let offset = self.eye - self.center;
        let radius = offset.length().max(1e-4);
        let mut azimuth = offset.x.atan2(offset.z);
        let mut elevation = (offset.y / radius).clamp(-1.0, 1.0).asin();

        azimuth -= d_azimuth;
        elevation = (elevation - d_elevation).clamp(1f32.to_radians(), 89f32.to_radians());

        let (sin_az, cos_az) = azimuth.sin_cos();
        let (sin_el, cos_el) = elevation.sin_cos();
        self.eye = self.center
            + Vec3::new(
                radius * cos_el * sin_az,
                radius * sin_el,
                radius * cos_el * cos_az,
            );
        self.up = Vec3::Y;
        self.altered = true;
    }

    /// Scales the eye distance to the center.
    pub fn zoom(&mut self, factor: f32) {
        let offset = self.eye - self.center;
        let radius = (offset.length() * factor).clamp(1.0, 200.0);
        self.eye = self.center + offset.normalize_or_zero() * radius;
        self.altered = true;
    }
}

/// Orthographic light camera used for shadow mapping.
#[derive(Debug, Clone)]
pub struct LightCamera {
    pub eye: Vec3,
    pub center: Vec3,
    pub up: Vec3,
    pub frustum_height: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for LightCamera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(-15.1302, 23.3389, 28.2616),
            center: Vec3::new(7.8, 0.0, 3.9),
            up: Vec3::Y,
            frustum_height: 40.0,
            near: 20.0,
            far: 190.0,
        }
    }
}

impl LightCamera {
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.center, self.up)
    }

    pub fn projection(&self) -> Mat4 {
        let h = self.frustum_height * 0.5;
        Mat4::orthographic_rh(-h, h, -h, h, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }

    /// Far plane reaching just past the ground plane at `base_y`.
    pub fn far_from_ground(&self, base_y: f32) -> f32 {
        let origin = self.eye + self.up * (self.frustum_height / 2.0);
        let direction = (self.eye - self.center).normalize_or_zero();
        let normal = Vec3::Y;
        let plane_point = Vec3::new(0.0, base_y, 0.0);

        let denom = normal.dot(direction);
        if denom > 1e-6 {
            let t = (plane_point - origin).dot(normal) / denom;
            t.abs() + 5.0
        } else {
            190.0
        }
    }
}

pub struct CameraController {
    mouse_down: bool,
    last_mouse: Option<(f64, f64)>,
    /// Navigation is disabled while the host controls the pose.
    pub enabled: bool,
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraController {
    /// Creates a new controller with default state.
    pub fn new() -> Self {
        Self {
            mouse_down: false,
            last_mouse: None,
            enabled: true,
        }
    }

    /// Handles window events and updates the camera.
    pub fn handle_event(&mut self, event: &WindowEvent, camera: &mut Camera) {
        match event {
            WindowEvent::MouseInput { button, state, .. } => {
                if *button == MouseButton::Left {
                    self.mouse_down = *state == ElementState::Pressed;
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.handle_cursor_orbit((position.x, position.y), camera);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 120.0,
                };

                self.handle_scroll(scroll, camera);
            }
            _ => {}
        }
    }

    fn handle_scroll(&mut self, delta: f32, camera: &mut Camera) {
        if !self.enabled {
            return;
        }
        // Positive delta = scroll up = zoom in.
        camera.zoom(1.1_f32.powf(-delta));
    }

    /// Orbits around the center while the left mouse button is held.
    fn handle_cursor_orbit(&mut self, xy: (f64, f64), camera: &mut Camera) {
        if let Some(last) = self.last_mouse {
            if self.mouse_down && self.enabled {
                let dx = ((xy.0 - last.0) * 0.005) as f32;
                let dy = ((last.1 - xy.1) * 0.005) as f32;
                camera.orbit(dx, dy);
            }
        }
        self.last_mouse = Some(xy);
    }
}
