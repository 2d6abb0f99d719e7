use glam::Vec3;

use crate::event::{Event, EventDispatcher, MouseScrolledEvent, WindowResizeEvent};
use crate::input::{InputState, KeyCode};

use super::camera::OrthographicCamera;

const MIN_ZOOM: f32 = 0.25;

/// Drives an [`OrthographicCamera`] from polled input.
///
/// WASD pans, Q/E rotates (when enabled), the scroll wheel zooms and window
/// resizes keep the aspect ratio in sync.
#[derive(Debug, Clone)]
pub struct OrthographicCameraController {
    camera: OrthographicCamera,
    aspect_ratio: f32,
    zoom: f32,
    rotation_enabled: bool,
    position: Vec3,
    rotation: f32,
    translation_speed: f32,
    rotation_speed: f32,
}

impl OrthographicCameraController {
    pub fn new(aspect_ratio: f32, rotation_enabled: bool) -> Self {
        let zoom = 1.0;
        Self {
            camera: OrthographicCamera::new(-aspect_ratio * zoom, aspect_ratio * zoom, -zoom, zoom),
            aspect_ratio,
            zoom,
            rotation_enabled,
            position: Vec3::ZERO,
            rotation: 0.0,
            translation_speed: 1.0,
            rotation_speed: 180.0,
        }
    }

    pub fn camera(&self) -> &OrthographicCamera {
        &self.camera
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom.max(MIN_ZOOM);
        self.update_projection();
    }

    pub fn on_update(&mut self, input: &InputState, dt: f32) {
        let step = self.translation_speed * dt;
        let (sin, cos) = self.rotation.to_radians().sin_cos();

        // Pan along the camera's own axes so movement follows the rotation.
        if input.is_key_pressed(KeyCode::A) {
            self.position.x -= cos * step;
            self.position.y -= sin * step;
        } else if input.is_key_pressed(KeyCode::D) {
            self.position.x += cos * step;
            self.position.y += sin * step;
        }
        if input.is_key_pressed(KeyCode::W) {
            self.position.x -= sin * step;
            self.position.y += cos * step;
        } else if input.is_key_pressed(KeyCode::S) {
            self.position.x += sin * step;
            self.position.y -= cos * step;
        }

        if self.rotation_enabled {
            if input.is_key_pressed(KeyCode::Q) {
                self.rotation += self.rotation_speed * dt;
            }
            if input.is_key_pressed(KeyCode::E) {
                self.rotation -= self.rotation_speed * dt;
            }
            self.rotation = self.rotation.rem_euclid(360.0);
            self.camera.set_rotation(self.rotation);
        }

        self.camera.set_position(self.position);
        // Pan faster when zoomed out.
        self.translation_speed = self.zoom;
    }

    /// Never marks the event handled; other layers still see scroll and resize.
    pub fn on_event(&mut self, event: &mut Event) {
        let mut dispatcher = EventDispatcher::new(event);
        dispatcher.dispatch::<MouseScrolledEvent, _>(|e| {
            self.zoom = (self.zoom - e.y_offset * 0.25).max(MIN_ZOOM);
            self.update_projection();
            false
        });
        dispatcher.dispatch::<WindowResizeEvent, _>(|e| {
            if e.width > 0 && e.height > 0 {
                self.aspect_ratio = e.width as f32 / e.height as f32;
                self.update_projection();
            }
            false
        });
    }

    fn update_projection(&mut self) {
        let (a, z) = (self.aspect_ratio, self.zoom);
        self.camera.set_projection(-a * z, a * z, -z, z);
    }
}
