//! Recentering and origin-calibration scenarios.

use rivet_core::backend::{ReferenceSpace, RuntimeEvent};
use rivet_core::config::Config;
use rivet_core::headless::{HeadlessHandle, HeadlessRuntime};
use rivet_core::types::{Posef, Quatf, Vector3f};
use rivet_core::Session;

const EPS: f32 = 1e-4;

fn session() -> (Session, HeadlessHandle) {
    let runtime = HeadlessRuntime::new();
    let handle = runtime.handle();
    let session = Session::create(Box::new(runtime), Config::default()).unwrap();
    (session, handle)
}

#[test]
fn recenter_round_trip_zeroes_the_head_pose() {
    let (mut session, handle) = session();
    let head = Posef::new(
        Quatf::rotation_y(30f32.to_radians()),
        Vector3f::new(1.0, 0.0, 0.0),
    );
    handle.set_head_pose(head);

    session.recenter_tracking_origin().unwrap();

    let located = session.locate_head(0).unwrap();
    assert!(located.pose.position.distance(Vector3f::default()) < EPS);
    assert!(located.pose.orientation.yaw().abs() < EPS);
}

#[test]
fn recenter_preserves_height_offset_direction() {
    let (mut session, handle) = session();
    handle.set_head_pose(Posef::new(
        Quatf::rotation_y(90f32.to_radians()),
        Vector3f::new(0.0, 1.6, -1.0),
    ));
    session.recenter_tracking_origin().unwrap();

    // Step the head 0.5m forward in its own (rotated) frame.
    handle.set_head_pose(Posef::new(
        Quatf::rotation_y(90f32.to_radians()),
        Vector3f::new(-0.5, 1.6, -1.0),
    ));
    let located = session.locate_head(0).unwrap();
    assert!((located.pose.position.z - (-0.5)).abs() < EPS);
    assert!(located.pose.position.x.abs() < EPS);
    assert!(located.pose.position.y.abs() < EPS);
}

#[test]
fn explicit_origins_compose_in_order() {
    let (mut session, _) = session();
    let poses = [
        Posef::new(Quatf::rotation_y(0.3), Vector3f::new(1.0, 0.0, 0.0)),
        Posef::new(Quatf::rotation_y(-0.8), Vector3f::new(0.0, 0.2, 1.5)),
        Posef::new(Quatf::rotation_y(0.1), Vector3f::new(-0.4, 0.0, 0.0)),
    ];

    let mut expected = Posef::IDENTITY;
    for pose in poses {
        session.specify_tracking_origin(pose).unwrap();
        // Inputs are pure yaw rotations, so the leveled pose is the pose
        // itself.
        expected = (expected * pose).normalized();
    }

    let origin = session.calibrated_origin();
    assert!(origin.position.distance(expected.position) < EPS);
    assert!((origin.orientation.yaw() - expected.orientation.yaw()).abs() < EPS);
}

#[test]
fn runtime_space_change_is_folded_into_the_origin() {
    let (mut session, handle) = session();
    let delta = Posef::new(Quatf::rotation_y(0.4), Vector3f::new(0.2, 0.0, -0.3));
    handle.push_event(RuntimeEvent::ReferenceSpaceChangePending {
        space: ReferenceSpace::Local,
        pose_valid: true,
        pose_in_previous_space: delta,
    });

    let status = session.session_status().unwrap();
    assert!(status.should_recenter);
    let origin = session.calibrated_origin();
    assert!((origin.orientation.yaw() - 0.4).abs() < EPS);
    assert!(origin.position.distance(delta.position) < EPS);

    // The client reacts with an explicit recenter, which clears the flag.
    session.recenter_tracking_origin().unwrap();
    assert!(!session.status_bits().should_recenter);
}

#[test]
fn stage_space_changes_do_not_touch_the_origin() {
    let (mut session, handle) = session();
    handle.push_event(RuntimeEvent::ReferenceSpaceChangePending {
        space: ReferenceSpace::Stage,
        pose_valid: true,
        pose_in_previous_space: Posef::new(Quatf::rotation_y(1.0), Vector3f::default()),
    });
    let status = session.session_status().unwrap();
    assert!(!status.should_recenter);
    assert_eq!(session.calibrated_origin(), Posef::IDENTITY);
}
