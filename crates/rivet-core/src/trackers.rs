//! Virtual sensor poses for old clients.
//!
//! Clients compiled before 1.37 treat a zero sensor count as a tracking
//! loss, so three virtual sensors are reported around the play area, each
//! yaw-locked to the head so they always face the user.

use crate::error::ShimResult;
use crate::origin::leveled;
use crate::session::Session;
use crate::types::{Posef, Quatf, Vector3f};

pub const TRACKER_CONNECTED: u32 = 0x0020;
pub const TRACKER_POSE_TRACKED: u32 = 0x0004;

#[derive(Debug, Clone, Copy, Default)]
pub struct TrackerDesc {
    pub frustum_hfov_in_radians: f32,
    pub frustum_vfov_in_radians: f32,
    pub frustum_near_z_in_meters: f32,
    pub frustum_far_z_in_meters: f32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TrackerPose {
    pub tracker_flags: u32,
    pub pose: Posef,
    pub leveled_pose: Posef,
}

fn virtual_poses() -> [Posef; 3] {
    [
        Posef::new(
            Quatf::rotation_y(90f32.to_radians()),
            Vector3f::new(-2.0, 0.0, 0.2),
        ),
        Posef::new(Quatf::rotation_y(0.0), Vector3f::new(-0.2, 0.0, -2.0)),
        Posef::new(
            Quatf::rotation_y(180f32.to_radians()),
            Vector3f::new(0.2, 0.0, 2.0),
        ),
    ]
}

impl Session {
    pub fn tracker_count(&self) -> u32 {
        if self.profile().needs_virtual_trackers() {
            3
        } else {
            0
        }
    }

    pub fn tracker_desc(&self, index: u32) -> TrackerDesc {
        if index >= self.tracker_count() {
            return TrackerDesc::default();
        }
        TrackerDesc {
            frustum_hfov_in_radians: 100f32.to_radians(),
            frustum_vfov_in_radians: 70f32.to_radians(),
            frustum_near_z_in_meters: 0.4,
            frustum_far_z_in_meters: 2.5,
        }
    }

    pub fn tracker_pose(&mut self, index: u32) -> ShimResult<TrackerPose> {
        if index >= self.tracker_count() {
            return Ok(TrackerPose::default());
        }
        let mut pose = virtual_poses()[index as usize];

        let time = self.current_frame().predicted_display_time;
        if let Ok(head) = self.locate_head(time) {
            if head.orientation_valid {
                pose = leveled(head.pose) * pose;
            }
        }

        Ok(TrackerPose {
            tracker_flags: TRACKER_CONNECTED | TRACKER_POSE_TRACKED,
            pose,
            leveled_pose: pose,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::headless::HeadlessRuntime;

    fn old_client_session() -> (Session, crate::headless::HeadlessHandle) {
        let runtime = HeadlessRuntime::new();
        let handle = runtime.handle();
        let config = Config {
            minor_version: Some(30),
            ..Default::default()
        };
        let session = Session::create(Box::new(runtime), config).unwrap();
        (session, handle)
    }

    #[test]
    fn modern_clients_see_no_trackers() {
        let runtime = HeadlessRuntime::new();
        let config = Config {
            minor_version: Some(40),
            ..Default::default()
        };
        let session = Session::create(Box::new(runtime), config).unwrap();
        assert_eq!(session.tracker_count(), 0);
    }

    #[test]
    fn tracker_poses_follow_head_yaw() {
        let (mut session, handle) = old_client_session();
        assert_eq!(session.tracker_count(), 3);
        handle.set_head_pose(Posef::new(
            Quatf::rotation_y(0.5),
            Vector3f::new(0.0, 1.6, 0.0),
        ));
        let front = session.tracker_pose(1).unwrap();
        assert!((front.pose.orientation.yaw() - 0.5).abs() < 1e-4);
        assert_eq!(
            front.tracker_flags,
            TRACKER_CONNECTED | TRACKER_POSE_TRACKED
        );
    }

    #[test]
    fn frustum_matches_virtual_sensor_shape() {
        let (session, _) = old_client_session();
        let desc = session.tracker_desc(0);
        assert!((desc.frustum_hfov_in_radians - 100f32.to_radians()).abs() < 1e-6);
        assert_eq!(desc.frustum_near_z_in_meters, 0.4);
        assert_eq!(desc.frustum_far_z_in_meters, 2.5);
    }

    #[test]
    fn desc_is_zeroed_out_of_range() {
        let (session, _) = old_client_session();
        let desc = session.tracker_desc(99);
        assert_eq!(desc.frustum_far_z_in_meters, 0.0);
    }
}
