//! End-to-end frame pacing against the scripted runtime.

use rivet_core::backend::{RuntimeEvent, SessionState};
use rivet_core::config::Config;
use rivet_core::headless::{HeadlessHandle, HeadlessRuntime, RecordedCall};
use rivet_core::layers::{EyeFovLayer, LayerFlags, LegacyLayer};
use rivet_core::swapchain::ChainDesc;
use rivet_core::types::{FovPort, Posef, Recti};
use rivet_core::{ChainHandle, Session};

fn session() -> (Session, HeadlessHandle) {
    let runtime = HeadlessRuntime::new();
    let handle = runtime.handle();
    let session = Session::create(Box::new(runtime), Config::default()).unwrap();
    (session, handle)
}

fn eye_chain(session: &mut Session) -> ChainHandle {
    session
        .create_texture_swap_chain(ChainDesc {
            width: 1440,
            height: 1600,
            format: 1,
            mip_count: 1,
            sample_count: 1,
            array_size: 1,
            static_image: false,
        })
        .unwrap()
}

fn fov_layer(chain: ChainHandle, session: &Session) -> LegacyLayer {
    let extent = session.view_configs()[0].recommended_extent;
    LegacyLayer::EyeFov(EyeFovLayer {
        flags: LayerFlags::default(),
        color: [Some(chain), None],
        viewport: [Recti::new(0, 0, extent.w, extent.h); 2],
        fov: [FovPort::new(1.0, 1.0, 1.0, 1.0); 2],
        pose: [Posef::IDENTITY; 2],
    })
}

#[test]
fn sixty_frame_happy_loop() {
    let (mut session, handle) = session();
    for state in [
        SessionState::Idle,
        SessionState::Ready,
        SessionState::Synchronized,
        SessionState::Visible,
        SessionState::Focused,
    ] {
        handle.push_event(RuntimeEvent::SessionState(state));
    }

    let chain = eye_chain(&mut session);
    let layer = fov_layer(chain, &session);

    for i in 0..60i64 {
        session.wait_to_begin_frame(i).unwrap();
        session.begin_frame(i).unwrap();
        session.commit_texture_swap_chain(chain).unwrap();
        session.end_frame(i, None, &[Some(layer)]).unwrap();
    }

    let status = session.session_status().unwrap();
    assert!(status.has_input_focus);
    assert!(status.is_visible);
    assert!(status.hmd_present);

    // Every end-frame carried the one projection layer.
    let submits: Vec<_> = handle
        .calls()
        .into_iter()
        .filter(|c| matches!(c, RecordedCall::EndFrame { .. }))
        .collect();
    assert_eq!(submits.len(), 60);
    assert!(submits
        .iter()
        .all(|c| *c == RecordedCall::EndFrame { layers: 1 }));
}

#[test]
fn begin_drains_every_committed_chain() {
    let (mut session, handle) = session();
    let a = eye_chain(&mut session);
    let b = eye_chain(&mut session);

    session.wait_to_begin_frame(0).unwrap();
    session.begin_frame(0).unwrap();
    session.commit_texture_swap_chain(a).unwrap();
    session.commit_texture_swap_chain(b).unwrap();
    assert_eq!(session.pending_wait_count(), 2);

    handle.clear_calls();
    session.wait_to_begin_frame(1).unwrap();
    session.begin_frame(1).unwrap();
    assert_eq!(session.pending_wait_count(), 0);
    assert_eq!(
        handle.calls(),
        vec![
            RecordedCall::WaitFrame,
            RecordedCall::WaitImage(a),
            RecordedCall::WaitImage(b),
            RecordedCall::BeginFrame,
        ]
    );
}

#[test]
fn submit_is_end_then_wait_then_begin() {
    let (mut session, handle) = session();
    session.wait_to_begin_frame(0).unwrap();
    session.begin_frame(0).unwrap();
    let client_index = session.current_frame().frame_index;

    handle.clear_calls();
    session.submit_frame(client_index, None, &[]).unwrap();
    assert_eq!(
        handle.calls(),
        vec![
            RecordedCall::EndFrame { layers: 0 },
            RecordedCall::WaitFrame,
            RecordedCall::BeginFrame,
        ]
    );
    // The new slot is stamped one past the frame the submit waited for.
    assert_eq!(session.current_frame().frame_index, client_index + 2);
}

#[test]
fn submit_substitutes_nonpositive_frame_index() {
    let (mut session, _) = session();
    session.wait_to_begin_frame(0).unwrap();
    session.begin_frame(0).unwrap();

    let mut last = session.current_frame().frame_index;
    for _ in 0..10 {
        session.submit_frame(0, None, &[]).unwrap();
        let stamp = session.current_frame().frame_index;
        assert!(stamp > last);
        last = stamp;
    }
}

#[test]
fn destroyed_chain_leaves_the_wait_queue() {
    let (mut session, handle) = session();
    let chain = eye_chain(&mut session);

    session.wait_to_begin_frame(0).unwrap();
    session.begin_frame(0).unwrap();
    session.commit_texture_swap_chain(chain).unwrap();
    assert_eq!(session.pending_wait_count(), 1);

    session.destroy_texture_swap_chain(chain).unwrap();
    assert_eq!(session.pending_wait_count(), 0);

    // The next begin must not wait on the dead handle.
    handle.clear_calls();
    session.wait_to_begin_frame(1).unwrap();
    session.begin_frame(1).unwrap();
    assert!(!handle
        .calls()
        .iter()
        .any(|c| matches!(c, RecordedCall::WaitImage(_))));
}

#[test]
fn exiting_event_sets_should_quit() {
    let (mut session, handle) = session();
    handle.push_event(RuntimeEvent::SessionState(SessionState::Exiting));
    assert!(session.session_status().unwrap().should_quit);
}

#[test]
fn invalid_fov_layer_is_dropped_from_submission() {
    let (mut session, handle) = session();
    let chain = eye_chain(&mut session);
    session.wait_to_begin_frame(0).unwrap();
    session.begin_frame(0).unwrap();

    let bad = LegacyLayer::EyeFov(EyeFovLayer {
        flags: LayerFlags::default(),
        color: [Some(chain), None],
        viewport: [Recti::new(0, 0, 1440, 1600); 2],
        fov: [FovPort::default(); 2],
        pose: [Posef::IDENTITY; 2],
    });
    let good = fov_layer(chain, &session);

    handle.clear_calls();
    session
        .end_frame(0, None, &[Some(bad), None, Some(good)])
        .unwrap();
    assert_eq!(
        handle.calls(),
        vec![RecordedCall::EndFrame { layers: 1 }]
    );
}
