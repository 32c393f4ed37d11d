//! Play-area boundary, modeled as the stage's axis-aligned rectangle.

use crate::error::ShimResult;
use crate::input::TRACKED_DEVICE_ALL;
use crate::session::Session;
use crate::types::{Vector2f, Vector3f};

#[derive(Debug, Clone, Copy, Default)]
pub struct BoundaryTestResult {
    pub is_triggering: bool,
    pub closest_distance: f32,
    pub closest_point: Vector3f,
    pub closest_point_normal: Vector3f,
}

/// Clamp `p` into the rectangle spanned by `±half`; when `p` is inside,
/// project it onto the nearest wall instead.
pub fn closest_wall_point(p: Vector2f, half: Vector2f) -> Vector2f {
    let mut clamped = Vector2f::new(
        p.x.clamp(-half.x, half.x),
        p.y.clamp(-half.y, half.y),
    );
    if clamped == p {
        if p.x.abs() > p.y.abs() {
            clamped.x = half.x * p.x.signum();
        } else {
            clamped.y = half.y * p.y.signum();
        }
    }
    clamped
}

impl Session {
    /// Width (x) and depth (z) of the stage rectangle; height is not
    /// modeled.
    pub fn boundary_dimensions(&mut self) -> ShimResult<Vector3f> {
        let bounds = self.runtime.stage_bounds()?;
        Ok(Vector3f::new(bounds.x, 0.0, bounds.y))
    }

    /// Corners of the stage rectangle on the floor.
    pub fn boundary_geometry(&mut self) -> ShimResult<[Vector3f; 4]> {
        let dims = self.boundary_dimensions()?;
        let mut corners = [Vector3f::new(dims.x / 2.0, 0.0, dims.z / 2.0); 4];
        for (i, corner) in corners.iter_mut().enumerate() {
            if i % 2 == 0 {
                corner.x = -corner.x;
            }
            if i / 2 == 0 {
                corner.z = -corner.z;
            }
        }
        Ok(corners)
    }

    pub fn test_boundary_point(&mut self, point: Vector3f) -> ShimResult<BoundaryTestResult> {
        let dims = self.boundary_dimensions()?;
        let half = Vector2f::new(dims.x / 2.0, dims.z / 2.0);
        let p = Vector2f::new(point.x, point.z);
        let clamped = closest_wall_point(p, half);

        let normal = Vector2f::new(p.x - clamped.x, p.y - clamped.y);
        let unit = normal.normalized();
        Ok(BoundaryTestResult {
            is_triggering: false,
            closest_distance: normal.length(),
            // No ceiling is modeled; keep the caller's height.
            closest_point: Vector3f::new(clamped.x, point.y, clamped.y),
            closest_point_normal: Vector3f::new(unit.x, 0.0, unit.y),
        })
    }

    /// Minimum boundary distance over every device selected by the mask.
    pub fn test_boundary(&mut self, device_mask: u32) -> ShimResult<BoundaryTestResult> {
        let mut devices = Vec::new();
        let mut bit = 1u32;
        while bit & TRACKED_DEVICE_ALL != 0 {
            if bit & device_mask != 0 {
                devices.push(bit);
            }
            bit <<= 1;
        }

        let abs_time = self.predicted_display_time(0);
        let poses = self.input.device_poses(&devices, abs_time)?;

        let mut best = BoundaryTestResult {
            closest_distance: f32::INFINITY,
            ..Default::default()
        };
        for pose in &poses {
            let result = self.test_boundary_point(pose.pose.position)?;
            if result.closest_distance < best.closest_distance {
                best = result;
            }
        }
        Ok(best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::headless::HeadlessRuntime;
    use rand::{thread_rng, Rng};

    fn session_with_bounds(w: f32, d: f32) -> Session {
        let runtime = HeadlessRuntime::new();
        runtime.handle().set_stage_bounds(Some(Vector2f::new(w, d)));
        Session::create(Box::new(runtime), Config::default()).unwrap()
    }

    #[test]
    fn outside_point_clamps_to_edge() {
        let mut session = session_with_bounds(2.0, 2.0);
        let result = session
            .test_boundary_point(Vector3f::new(3.0, 1.3, 0.0))
            .unwrap();
        assert!((result.closest_distance - 2.0).abs() < 1e-5);
        assert!((result.closest_point.x - 1.0).abs() < 1e-5);
        assert_eq!(result.closest_point.y, 1.3);
        assert!((result.closest_point_normal.x - 1.0).abs() < 1e-5);
        assert_eq!(result.closest_point_normal.y, 0.0);
    }

    #[test]
    fn inside_point_projects_to_nearest_wall() {
        let mut session = session_with_bounds(4.0, 4.0);
        let result = session
            .test_boundary_point(Vector3f::new(1.5, 0.0, 0.2))
            .unwrap();
        // Nearest wall is +x at 2.0.
        assert!((result.closest_point.x - 2.0).abs() < 1e-5);
        assert!((result.closest_point.z - 0.2).abs() < 1e-5);
        assert!((result.closest_distance - 0.5).abs() < 1e-5);
    }

    #[test]
    fn clamp_distance_is_symmetric_under_negation() {
        let mut session = session_with_bounds(3.0, 5.0);
        let mut rng = thread_rng();
        for _ in 0..200 {
            let x: f32 = rng.gen_range(-6.0..6.0);
            let y: f32 = rng.gen_range(-2.0..2.0);
            let z: f32 = rng.gen_range(-6.0..6.0);
            let a = session
                .test_boundary_point(Vector3f::new(x, y, z))
                .unwrap()
                .closest_distance;
            let b = session
                .test_boundary_point(Vector3f::new(-x, y, -z))
                .unwrap()
                .closest_distance;
            assert!((a - b).abs() < 1e-4, "asymmetric at ({x}, {y}, {z})");
        }
    }

    #[test]
    fn geometry_spans_all_four_quadrant_corners() {
        let mut session = session_with_bounds(2.0, 6.0);
        let corners = session.boundary_geometry().unwrap();
        let xs: Vec<f32> = corners.iter().map(|c| c.x).collect();
        let zs: Vec<f32> = corners.iter().map(|c| c.z).collect();
        assert!(xs.contains(&1.0) && xs.contains(&-1.0));
        assert!(zs.contains(&3.0) && zs.contains(&-3.0));
    }

    #[test]
    fn whole_device_test_takes_minimum_distance() {
        let mut session = session_with_bounds(2.0, 2.0);
        // Null input reports every device at the origin; the minimum is
        // the origin's wall distance.
        let origin = session
            .test_boundary_point(Vector3f::default())
            .unwrap()
            .closest_distance;
        let all = session.test_boundary(TRACKED_DEVICE_ALL).unwrap();
        assert!((all.closest_distance - origin).abs() < 1e-5);
    }
}
