//! Calibrated-origin arithmetic.
//!
//! The client's idea of "origin" must survive both its own recenter
//! requests and runtime-initiated reference-space reconfigurations. Each
//! recenter folds a leveled version of the supplied pose into the running
//! origin; each runtime reconfiguration folds in the pose delta the event
//! reported.

use crate::types::{Posef, Quatf};

/// Keep only the heading of `pose`: yaw rotation plus translation.
pub fn leveled(pose: Posef) -> Posef {
    Posef::new(Quatf::rotation_y(pose.orientation.yaw()), pose.position)
}

/// Fold a recenter target into the running origin.
pub fn recentered(origin: Posef, target: Posef) -> Posef {
    (origin * leveled(target)).normalized()
}

/// Fold a runtime-reported space delta into the running origin.
pub fn shifted(origin: Posef, pose_in_previous_space: Posef) -> Posef {
    (origin * pose_in_previous_space).normalized()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Vector3f;

    const EPS: f32 = 1e-4;

    #[test]
    fn recenter_discards_pitch_and_roll() {
        let tilted = Posef::new(
            Quatf::rotation_y(0.5) * Quatf::new(0.2, 0.0, 0.0, 1.0).normalized(),
            Vector3f::new(1.0, 1.6, 0.0),
        );
        let origin = recentered(Posef::IDENTITY, tilted);
        // Pure yaw: no x or z components survive in the orientation.
        assert!(origin.orientation.x.abs() < EPS);
        assert!(origin.orientation.z.abs() < EPS);
        assert!((origin.orientation.yaw() - 0.5).abs() < 1e-3);
        assert!(origin.position.distance(tilted.position) < EPS);
    }

    #[test]
    fn successive_recenters_compose_left_to_right() {
        let a = Posef::new(Quatf::rotation_y(0.3), Vector3f::new(1.0, 0.0, 0.0));
        let b = Posef::new(Quatf::rotation_y(-0.1), Vector3f::new(0.0, 0.0, 2.0));
        let step = recentered(recentered(Posef::IDENTITY, a), b);
        let direct = (leveled(a) * leveled(b)).normalized();
        assert!(step.position.distance(direct.position) < EPS);
        assert!((step.orientation.yaw() - direct.orientation.yaw()).abs() < EPS);
    }

    #[test]
    fn shift_composes_raw_pose() {
        let delta = Posef::new(Quatf::rotation_y(0.25), Vector3f::new(0.0, 0.1, 0.0));
        let origin = shifted(Posef::IDENTITY, delta);
        assert!((origin.orientation.yaw() - 0.25).abs() < EPS);
        assert!((origin.position.y - 0.1).abs() < EPS);
    }
}
