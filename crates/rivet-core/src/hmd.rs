//! Headset and per-eye descriptor queries.

use crate::backend::VisibilityMaskType;
use crate::error::{ShimError, ShimResult};
use crate::session::Session;
use crate::types::{FovPort, Posef, Recti, Sizei, Vector2f};

pub const TRACKING_CAP_ORIENTATION: u32 = 0x0010;

/// Which headset generation the client is told it is talking to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HmdType {
    FirstGen,
    SecondGen,
}

#[derive(Debug, Clone)]
pub struct HmdDesc {
    pub hmd_type: HmdType,
    pub product_name: String,
    pub manufacturer: String,
    pub available_tracking_caps: u32,
    pub default_tracking_caps: u32,
    pub default_eye_fov: [FovPort; 2],
    pub max_eye_fov: [FovPort; 2],
    pub resolution: Sizei,
    pub display_refresh_rate: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct EyeRenderDesc {
    pub eye: usize,
    pub fov: FovPort,
    pub distorted_viewport: Recti,
    pub pixels_per_tan_angle_at_center: Vector2f,
    pub hmd_to_eye_pose: Posef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StencilType {
    HiddenArea,
    VisibleArea,
    BorderLine,
    VisibleRectangle,
}

#[derive(Debug, Clone, Default)]
pub struct StencilMesh {
    pub vertices: Vec<Vector2f>,
    pub indices: Vec<u16>,
}

const VISIBLE_RECTANGLE: [Vector2f; 4] = [
    Vector2f { x: 0.0, y: 0.0 },
    Vector2f { x: 1.0, y: 0.0 },
    Vector2f { x: 1.0, y: 1.0 },
    Vector2f { x: 0.0, y: 1.0 },
];

const VISIBLE_RECTANGLE_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

impl Session {
    pub fn hmd_desc(&mut self) -> HmdDesc {
        let caps = self.caps();
        let configs = self.view_configs();

        let mut tracking_caps = 0;
        if caps.orientation_tracking {
            tracking_caps |= TRACKING_CAP_ORIENTATION;
        }
        if caps.position_tracking {
            tracking_caps |= TRACKING_CAP_ORIENTATION;
        }

        let mut resolution = Sizei::default();
        for view in &configs {
            resolution.w += view.recommended_extent.w;
            resolution.h = resolution.h.max(view.recommended_extent.h);
        }

        let mut default_eye_fov = configs.map(|v| v.recommended_fov);
        let mut max_eye_fov = configs.map(|v| v.max_fov);
        // Pre-1.17 clients treat the eye transform as a plain offset and
        // cannot express a rotated eye, so any cant is folded into the
        // reported frustum instead.
        if self.profile().eye_pose_is_3dof() {
            if let Ok(eyes) = self.eye_views() {
                for eye in 0..2 {
                    let uncanted = eyes[eye].fov.uncant(eyes[eye].pose.orientation);
                    default_eye_fov[eye] = uncanted;
                    max_eye_fov[eye] = uncanted;
                }
            }
        }

        let period = self.current_frame().predicted_display_period;
        let display_refresh_rate = if period > 0 {
            1e9 / period as f32
        } else {
            90.0
        };

        HmdDesc {
            hmd_type: if self.profile().assumes_first_gen_hmd() {
                HmdType::FirstGen
            } else {
                HmdType::SecondGen
            },
            product_name: "Oculus Rift S".to_string(),
            manufacturer: self.runtime.runtime_name(),
            available_tracking_caps: tracking_caps,
            default_tracking_caps: tracking_caps,
            default_eye_fov,
            max_eye_fov,
            resolution,
            display_refresh_rate,
        }
    }

    /// Render-target size for the given field of view at full density.
    pub fn fov_texture_size(&self, eye: usize, fov: FovPort) -> Sizei {
        let ppt = self.pixels_per_tan(eye);
        Sizei::new(
            (ppt.x * (fov.left_tan + fov.right_tan)) as i32,
            (ppt.y * (fov.up_tan + fov.down_tan)) as i32,
        )
    }

    pub fn render_desc(&mut self, eye: usize, fov: FovPort) -> ShimResult<EyeRenderDesc> {
        let views = self.view_configs();
        let mut viewport = Recti::default();
        for view in views.iter().take(eye) {
            viewport.pos.x += view.recommended_extent.w;
        }
        viewport.size = views[eye].recommended_extent;

        let eye_poses = self.eye_views()?;
        Ok(EyeRenderDesc {
            eye,
            fov,
            distorted_viewport: viewport,
            pixels_per_tan_angle_at_center: self.pixels_per_tan(eye),
            hmd_to_eye_pose: eye_poses[eye].pose,
        })
    }

    /// Mesh describing which parts of the eye texture reach the display.
    pub fn fov_stencil(
        &mut self,
        stencil_type: StencilType,
        eye: u32,
        mesh_origin_at_bottom_left: bool,
    ) -> ShimResult<StencilMesh> {
        if !self.caps().visibility_mask {
            return Err(ShimError::Unsupported("visibility mask"));
        }

        if stencil_type == StencilType::VisibleRectangle {
            return Ok(StencilMesh {
                vertices: VISIBLE_RECTANGLE.to_vec(),
                indices: VISIBLE_RECTANGLE_INDICES.to_vec(),
            });
        }

        let mask_type = match stencil_type {
            StencilType::HiddenArea => VisibilityMaskType::HiddenTriangleMesh,
            StencilType::VisibleArea => VisibilityMaskType::VisibleTriangleMesh,
            StencilType::BorderLine => VisibilityMaskType::LineLoop,
            StencilType::VisibleRectangle => unreachable!(),
        };
        let mask = self.runtime.visibility_mask(eye, mask_type)?;

        let mut vertices = mask.vertices;
        if !mesh_origin_at_bottom_left {
            for v in &mut vertices {
                v.y = 1.0 - v.y;
            }
        }
        Ok(StencilMesh {
            vertices,
            indices: mask.indices.iter().map(|&i| i as u16).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::headless::HeadlessRuntime;

    fn session() -> Session {
        Session::create(Box::new(HeadlessRuntime::new()), Config::default()).unwrap()
    }

    #[test]
    fn resolution_sums_eye_widths() {
        let mut session = session();
        let desc = session.hmd_desc();
        assert_eq!(desc.resolution, Sizei::new(2880, 1600));
    }

    #[test]
    fn refresh_rate_defaults_before_first_frame() {
        let mut session = session();
        assert_eq!(session.hmd_desc().display_refresh_rate, 90.0);
        session.wait_to_begin_frame(0).unwrap();
        let desc = session.hmd_desc();
        assert!((desc.display_refresh_rate - 90.0).abs() < 1.0);
    }

    #[test]
    fn fov_texture_size_scales_with_tangents() {
        let session = session();
        // The recommended fov spans 2.0 tangent units per axis, so the
        // recommended extent comes straight back.
        let size = session.fov_texture_size(0, FovPort::new(1.0, 1.0, 1.0, 1.0));
        assert_eq!(size, Sizei::new(1440, 1600));
        let half = session.fov_texture_size(0, FovPort::new(0.5, 0.5, 0.5, 0.5));
        assert_eq!(half, Sizei::new(720, 800));
    }

    #[test]
    fn second_eye_viewport_is_offset() {
        let mut session = session();
        let fov = FovPort::new(1.0, 1.0, 1.0, 1.0);
        let left = session.render_desc(0, fov).unwrap();
        let right = session.render_desc(1, fov).unwrap();
        assert_eq!(left.distorted_viewport.pos.x, 0);
        assert_eq!(right.distorted_viewport.pos.x, 1440);
        assert!(right.hmd_to_eye_pose.position.x > left.hmd_to_eye_pose.position.x);
    }

    #[test]
    fn old_clients_get_the_cant_folded_into_the_fov() {
        let runtime = HeadlessRuntime::new();
        let handle = runtime.handle();
        handle.set_eye_cant(0.2);
        let config = Config {
            minor_version: Some(16),
            ..Default::default()
        };
        let mut session = Session::create(Box::new(runtime), config).unwrap();

        let desc = session.hmd_desc();
        let recommended = session.view_configs()[0].recommended_fov;
        // The canted frustum no longer matches the straight-ahead one.
        assert!((desc.default_eye_fov[0].right_tan - recommended.right_tan).abs() > 1e-3);
        // These clients see no separate maximum.
        assert_eq!(desc.default_eye_fov[0], desc.max_eye_fov[0]);
        // The eyes cant outward symmetrically.
        assert!(
            (desc.default_eye_fov[0].left_tan - desc.default_eye_fov[1].right_tan).abs() < 1e-4
        );
        assert!(
            (desc.default_eye_fov[0].right_tan - desc.default_eye_fov[1].left_tan).abs() < 1e-4
        );
    }

    #[test]
    fn modern_clients_keep_the_runtime_fov() {
        let runtime = HeadlessRuntime::new();
        let handle = runtime.handle();
        handle.set_eye_cant(0.2);
        let config = Config {
            minor_version: Some(43),
            ..Default::default()
        };
        let mut session = Session::create(Box::new(runtime), config).unwrap();

        let desc = session.hmd_desc();
        let config0 = session.view_configs()[0];
        assert_eq!(desc.default_eye_fov[0], config0.recommended_fov);
        assert_eq!(desc.max_eye_fov[0], config0.max_fov);
    }

    #[test]
    fn visible_rectangle_is_constant() {
        let mut session = session();
        let mesh = session
            .fov_stencil(StencilType::VisibleRectangle, 0, true)
            .unwrap();
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn stencil_flips_y_for_top_left_origin() {
        let mut session = session();
        let flipped = session
            .fov_stencil(StencilType::VisibleArea, 0, false)
            .unwrap();
        let unflipped = session
            .fov_stencil(StencilType::VisibleArea, 0, true)
            .unwrap();
        for (a, b) in flipped.vertices.iter().zip(unflipped.vertices.iter()) {
            assert!((a.y - (1.0 - b.y)).abs() < 1e-6);
        }
    }
}
