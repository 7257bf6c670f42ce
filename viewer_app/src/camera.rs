//! Orbit camera driven by mouse drag and scroll

use model_viewer::assets::Bounds;
use nalgebra::{Matrix4, Point3, Vector3};

/// Radians of rotation per pixel of cursor travel
const DRAG_SENSITIVITY: f32 = 0.01;
/// Distance multiplier per scroll step
const ZOOM_STEP: f32 = 0.9;
const MIN_DISTANCE: f32 = 0.5;
const MAX_DISTANCE: f32 = 50.0;
const PITCH_LIMIT: f32 = 89.0_f32 * std::f32::consts::PI / 180.0;

/// Camera orbiting the origin
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    /// Rotation around the vertical axis, radians
    pub yaw: f32,
    /// Elevation, radians
    pub pitch: f32,
    /// Distance from the origin
    pub distance: f32,
    /// Vertical field of view, radians
    pub fov: f32,
    /// Width / height
    pub aspect: f32,
    dragging: bool,
    last_cursor: Option<(f32, f32)>,
}

impl OrbitCamera {
    /// Camera three units back on +Z
    pub fn new(aspect: f32) -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            distance: 3.0,
            fov: std::f32::consts::FRAC_PI_4,
            aspect,
            dragging: false,
            last_cursor: None,
        }
    }

    /// Start rotating with cursor movement
    pub fn begin_drag(&mut self) {
        self.dragging = true;
    }

    /// Stop rotating
    pub fn end_drag(&mut self) {
        self.dragging = false;
    }

    /// Feed a cursor position; rotates while dragging
    pub fn cursor_moved(&mut self, x: f32, y: f32) {
        if let (true, Some((last_x, last_y))) = (self.dragging, self.last_cursor) {
            self.yaw -= (x - last_x) * DRAG_SENSITIVITY;
            self.pitch = (self.pitch + (y - last_y) * DRAG_SENSITIVITY).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        }
        self.last_cursor = Some((x, y));
    }

    /// Zoom by scroll steps; positive moves closer
    pub fn zoom(&mut self, steps: f32) {
        self.distance = (self.distance * ZOOM_STEP.powf(steps)).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    /// Track a framebuffer resize; zero-sized (minimized) frames are ignored
    pub fn resize(&mut self, width: i32, height: i32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    /// Camera position
    pub fn eye(&self) -> Point3<f32> {
        Point3::new(
            self.distance * self.pitch.cos() * self.yaw.sin(),
            self.distance * self.pitch.sin(),
            self.distance * self.pitch.cos() * self.yaw.cos(),
        )
    }

    /// World to clip space
    pub fn view_projection(&self) -> Matrix4<f32> {
        let view = Matrix4::look_at_rh(&self.eye(), &Point3::origin(), &Vector3::y());
        let projection = Matrix4::new_perspective(self.aspect, self.fov, 0.1, 100.0);
        projection * view
    }
}

/// Model matrix that centres `bounds` on the origin and scales it to unit size
pub fn fit_to_unit(bounds: Bounds) -> Matrix4<f32> {
    let extent = bounds.largest_extent();
    let scale = if extent > f32::EPSILON { 1.0 / extent } else { 1.0 };
    let center = Vector3::from(bounds.center());
    Matrix4::new_scaling(scale) * Matrix4::new_translation(&-center)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_eye_on_z_axis() {
        let camera = OrbitCamera::new(1.0);
        let eye = camera.eye();
        assert_relative_eq!(eye.x, 0.0);
        assert_relative_eq!(eye.y, 0.0);
        assert_relative_eq!(eye.z, 3.0);
    }

    #[test]
    fn test_cursor_only_rotates_while_dragging() {
        let mut camera = OrbitCamera::new(1.0);
        camera.cursor_moved(0.0, 0.0);
        camera.cursor_moved(100.0, 0.0);
        assert_relative_eq!(camera.yaw, 0.0);

        camera.begin_drag();
        camera.cursor_moved(150.0, 0.0);
        assert_relative_eq!(camera.yaw, -0.5);

        camera.end_drag();
        camera.cursor_moved(300.0, 0.0);
        assert_relative_eq!(camera.yaw, -0.5);
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut camera = OrbitCamera::new(1.0);
        camera.begin_drag();
        camera.cursor_moved(0.0, 0.0);
        camera.cursor_moved(0.0, 10_000.0);
        assert_relative_eq!(camera.pitch, PITCH_LIMIT);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut camera = OrbitCamera::new(1.0);
        camera.zoom(1.0);
        assert_relative_eq!(camera.distance, 2.7, epsilon = 1e-5);
        camera.zoom(1000.0);
        assert_relative_eq!(camera.distance, MIN_DISTANCE);
        camera.zoom(-1000.0);
        assert_relative_eq!(camera.distance, MAX_DISTANCE);
    }

    #[test]
    fn test_resize_updates_aspect() {
        let mut camera = OrbitCamera::new(1.0);
        camera.resize(1600, 900);
        assert_relative_eq!(camera.aspect, 16.0 / 9.0);
        camera.resize(0, 0);
        assert_relative_eq!(camera.aspect, 16.0 / 9.0);
    }

    #[test]
    fn test_fit_to_unit() {
        let bounds = Bounds { min: [1.0, 1.0, 1.0], max: [5.0, 3.0, 2.0] };
        let matrix = fit_to_unit(bounds);
        let corner = matrix.transform_point(&Point3::new(5.0, 3.0, 2.0));
        assert_relative_eq!(corner.x, 0.5);
        assert_relative_eq!(corner.y, 0.25);
        assert_relative_eq!(corner.z, 0.125);
    }

    #[test]
    fn test_origin_projects_to_centre() {
        let camera = OrbitCamera::new(1.5);
        let clip = camera.view_projection().transform_point(&Point3::origin());
        assert_relative_eq!(clip.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(clip.y, 0.0, epsilon = 1e-5);
    }
}
