//! Free orbit camera
//!
//! The camera orbits a look-at point. Its orientation is given by azimuth
//! (degrees around +Z, measured from +X) and elevation (degrees above the
//! horizontal plane, negative looks down). Navigation distances scale with
//! the model extent so small and large models feel the same.

use nalgebra::{Point3, Vector3};
use robosim_input::{CameraNavigation, MouseAction};
use robosim_model::Statistic;

use crate::pipeline::{look_at_matrix, perspective_matrix};

/// Elevation limit in degrees, short of straight up or down
const MAX_ELEVATION: f32 = 89.0;

const DEFAULT_AZIMUTH: f32 = 90.0;
const DEFAULT_ELEVATION: f32 = -45.0;
const DEFAULT_FOVY: f32 = 45.0;
/// Initial distance as a multiple of the model extent
const DEFAULT_DISTANCE_SCALE: f32 = 1.5;

/// Orbit camera driven by mouse navigation
#[derive(Debug, Clone, PartialEq)]
pub struct FreeCamera {
    pub lookat: Point3<f32>,
    pub distance: f32,
    pub azimuth: f32,
    pub elevation: f32,
    /// Vertical field of view in degrees
    pub fovy: f32,

    extent: f32,
    /// Framing restored by `reset`
    home: Home,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Home {
    lookat: Point3<f32>,
    distance: f32,
    azimuth: f32,
    elevation: f32,
}

impl Default for FreeCamera {
    fn default() -> Self {
        Self::new(&Statistic::default())
    }
}

impl FreeCamera {
    /// Frame a model described by its statistics
    pub fn new(stat: &Statistic) -> Self {
        let extent = stat.extent.max(1e-3);
        let home = Home {
            lookat: stat.center,
            distance: DEFAULT_DISTANCE_SCALE * extent,
            azimuth: DEFAULT_AZIMUTH,
            elevation: DEFAULT_ELEVATION,
        };
        Self {
            lookat: home.lookat,
            distance: home.distance,
            azimuth: home.azimuth,
            elevation: home.elevation,
            fovy: DEFAULT_FOVY,
            extent,
            home,
        }
    }

    /// Restore the framing set at construction
    pub fn reset(&mut self) {
        self.lookat = self.home.lookat;
        self.distance = self.home.distance;
        self.azimuth = self.home.azimuth;
        self.elevation = self.home.elevation;
    }

    /// Make the current framing the one `reset` restores
    fn set_home(&mut self) {
        self.home = Home {
            lookat: self.lookat,
            distance: self.distance,
            azimuth: self.azimuth,
            elevation: self.elevation,
        };
    }

    pub fn extent(&self) -> f32 {
        self.extent
    }

    /// Unit view direction
    pub fn forward(&self) -> Vector3<f32> {
        let (az, el) = (self.azimuth.to_radians(), self.elevation.to_radians());
        Vector3::new(el.cos() * az.cos(), el.cos() * az.sin(), el.sin())
    }

    /// Unit horizontal vector pointing to the right of the view
    pub fn right(&self) -> Vector3<f32> {
        let az = self.azimuth.to_radians();
        Vector3::new(az.sin(), -az.cos(), 0.0)
    }

    /// Unit horizontal projection of the view direction
    pub fn forward_horizontal(&self) -> Vector3<f32> {
        let az = self.azimuth.to_radians();
        Vector3::new(az.cos(), az.sin(), 0.0)
    }

    /// Eye position in world space
    pub fn eye(&self) -> Point3<f32> {
        self.lookat - self.forward() * self.distance
    }

    /// World-space height of the view frustum at the look-at distance
    fn frustum_height(&self) -> f32 {
        2.0 * (self.fovy.to_radians() * 0.5).tan() * self.distance
    }

    pub fn view_matrix(&self) -> [[f32; 4]; 4] {
        look_at_matrix(&self.eye(), &self.lookat, &Vector3::z())
    }

    pub fn projection_matrix(&self, aspect: f32) -> [[f32; 4]; 4] {
        perspective_matrix(
            self.fovy.to_radians(),
            aspect,
            0.01 * self.extent,
            100.0 * self.extent,
        )
    }

    fn rotate(&mut self, reldx: f32, reldy: f32) {
        self.azimuth = wrap_degrees(self.azimuth - reldx * 180.0);
        self.elevation = (self.elevation - reldy * 180.0).clamp(-MAX_ELEVATION, MAX_ELEVATION);
    }

    fn translate(&mut self, reldx: f32, reldy: f32, horizontal: bool) {
        let scale = self.frustum_height();
        let vertical = if horizontal {
            self.forward_horizontal() * reldy
        } else {
            -Vector3::z() * reldy
        };
        self.lookat -= (self.right() * reldx + vertical) * scale;
    }

    fn zoom(&mut self, reldy: f32) {
        let extent = self.extent;
        let step = (1.0 + self.distance / extent / 3.0).ln() * reldy * 9.0 * extent;
        self.distance = (self.distance - step).clamp(1e-4 * extent, 50.0 * extent);
    }

    /// Builder: set the vertical field of view in degrees
    pub fn with_fovy(mut self, fovy: f32) -> Self {
        self.fovy = fovy;
        self
    }

    /// Builder: set azimuth and elevation in degrees
    pub fn with_orientation(mut self, azimuth: f32, elevation: f32) -> Self {
        self.azimuth = wrap_degrees(azimuth);
        self.elevation = elevation.clamp(-MAX_ELEVATION, MAX_ELEVATION);
        self.set_home();
        self
    }

    /// Builder: set the distance as a multiple of the model extent
    pub fn with_distance_scale(mut self, scale: f32) -> Self {
        self.distance = (scale * self.extent).clamp(1e-4 * self.extent, 50.0 * self.extent);
        self.set_home();
        self
    }
}

impl CameraNavigation for FreeCamera {
    fn move_camera(&mut self, action: MouseAction, reldx: f32, reldy: f32) {
        match action {
            MouseAction::RotateV | MouseAction::RotateH => self.rotate(reldx, reldy),
            MouseAction::MoveV => self.translate(reldx, reldy, false),
            MouseAction::MoveH => self.translate(reldx, reldy, true),
            MouseAction::Zoom => self.zoom(reldy),
        }
    }
}

/// Wrap an angle in degrees to (-180, 180]
fn wrap_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stat(extent: f32) -> Statistic {
        Statistic {
            center: Point3::new(1.0, 2.0, 0.5),
            extent,
        }
    }

    #[test]
    fn test_defaults_from_statistic() {
        let camera = FreeCamera::new(&stat(2.0));
        assert_eq!(camera.lookat, Point3::new(1.0, 2.0, 0.5));
        assert!((camera.distance - 3.0).abs() < 1e-6);
        assert_eq!(camera.azimuth, 90.0);
        assert_eq!(camera.elevation, -45.0);
        assert_eq!(camera.fovy, 45.0);
    }

    #[test]
    fn test_eye_above_and_behind() {
        let camera = FreeCamera::new(&stat(1.0));
        let eye = camera.eye();
        // looking along +Y and down, so the eye sits at -Y and above
        assert!(eye.y < camera.lookat.y);
        assert!(eye.z > camera.lookat.z);
        assert!(((eye - camera.lookat).norm() - camera.distance).abs() < 1e-5);
    }

    #[test]
    fn test_rotate() {
        let mut camera = FreeCamera::new(&stat(1.0));
        camera.move_camera(MouseAction::RotateV, 0.1, 0.0);
        assert!((camera.azimuth - 72.0).abs() < 1e-4);
        camera.move_camera(MouseAction::RotateH, 0.0, -0.1);
        assert!((camera.elevation + 27.0).abs() < 1e-4);
    }

    #[test]
    fn test_shift_rotate_orbits_like_rotate() {
        let mut plain = FreeCamera::new(&stat(1.0));
        let mut shifted = FreeCamera::new(&stat(1.0));
        plain.move_camera(MouseAction::RotateV, 0.05, -0.08);
        shifted.move_camera(MouseAction::RotateH, 0.05, -0.08);
        assert_eq!(plain.azimuth, shifted.azimuth);
        assert_eq!(plain.elevation, shifted.elevation);
        assert_eq!(plain.eye(), shifted.eye());
    }

    #[test]
    fn test_elevation_clamped() {
        let mut camera = FreeCamera::new(&stat(1.0));
        camera.move_camera(MouseAction::RotateV, 0.0, 5.0);
        assert_eq!(camera.elevation, -89.0);
        camera.move_camera(MouseAction::RotateV, 0.0, -5.0);
        assert_eq!(camera.elevation, 89.0);
    }

    #[test]
    fn test_azimuth_wraps() {
        assert_eq!(wrap_degrees(190.0), -170.0);
        assert_eq!(wrap_degrees(-190.0), 170.0);
        assert_eq!(wrap_degrees(180.0), 180.0);
        assert_eq!(wrap_degrees(-180.0), 180.0);
    }

    #[test]
    fn test_zoom_in_and_clamp() {
        let mut camera = FreeCamera::new(&stat(1.0));
        let before = camera.distance;
        camera.move_camera(MouseAction::Zoom, 0.0, 0.05);
        assert!(camera.distance < before);

        camera.move_camera(MouseAction::Zoom, 0.0, -1000.0);
        assert!((camera.distance - 50.0).abs() < 1e-4);
        camera.move_camera(MouseAction::Zoom, 0.0, 1000.0);
        assert!((camera.distance - 1e-4).abs() < 1e-7);
    }

    #[test]
    fn test_move_vertical_keeps_horizontal_plane_depth() {
        let mut camera = FreeCamera::new(&stat(1.0));
        let start = camera.lookat;
        camera.move_camera(MouseAction::MoveV, 0.0, 0.1);
        let delta = camera.lookat - start;
        assert!(delta.x.abs() < 1e-6 && delta.y.abs() < 1e-6);
        assert!(delta.z > 0.0);
    }

    #[test]
    fn test_move_horizontal_stays_in_plane() {
        let mut camera = FreeCamera::new(&stat(1.0));
        let start = camera.lookat;
        camera.move_camera(MouseAction::MoveH, 0.1, 0.1);
        let delta = camera.lookat - start;
        assert!(delta.z.abs() < 1e-6);
        assert!(delta.norm() > 0.0);
    }

    #[test]
    fn test_reset_restores_framing() {
        let framed = || {
            FreeCamera::new(&stat(1.0))
                .with_fovy(60.0)
                .with_orientation(30.0, -20.0)
                .with_distance_scale(2.0)
        };
        let mut camera = framed();
        camera.move_camera(MouseAction::RotateV, 0.3, 0.2);
        camera.move_camera(MouseAction::MoveH, 0.3, 0.2);
        camera.move_camera(MouseAction::Zoom, 0.0, 0.2);
        camera.reset();
        assert_eq!(camera, framed());
        assert_eq!(camera.azimuth, 30.0);
        assert!((camera.distance - 2.0).abs() < 1e-6);
    }
}
