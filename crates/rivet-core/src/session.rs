//! A live headset connection.
//!
//! Owns the backend, the three reference spaces, the frame-slot ring, the
//! swapchain arena and the latched status bits. All entry points funnel
//! through here.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use crate::backend::{
    ChainHandle, ReferenceSpace, Runtime, RuntimeCaps, RuntimeEvent, SpaceHandle, SpaceLocation,
    ViewConfig, ViewPose,
};
use crate::config::Config;
use crate::error::{ShimError, ShimResult};
use crate::input::{InputSource, NullInput};
use crate::origin;
use crate::status::SessionStatusBits;
use crate::swapchain::{ChainDesc, MirrorTexture, SwapchainRegistry};
use crate::types::{Posef, Vector2f};
use crate::version::{self, VersionProfile};

/// Depth of the frame-slot ring: one frame in flight while the next is
/// being waited on.
pub const MAX_FRAMES: usize = 2;

#[derive(Debug, Clone, Copy, Default)]
pub struct FrameSlot {
    pub predicted_display_time: i64,
    pub predicted_display_period: i64,
    pub frame_index: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackingOrigin {
    #[default]
    EyeLevel,
    FloorLevel,
}

pub struct Session {
    pub(crate) runtime: Box<dyn Runtime>,
    pub(crate) config: Config,
    profile: VersionProfile,
    caps: RuntimeCaps,
    view_configs: [ViewConfig; 2],
    pixels_per_tan: [Vector2f; 2],

    pub(crate) view_space: SpaceHandle,
    pub(crate) local_space: SpaceHandle,
    pub(crate) stage_space: SpaceHandle,

    pub(crate) frames: [FrameSlot; MAX_FRAMES],
    pub(crate) current: usize,

    calibrated_origin: Posef,
    tracking_origin: TrackingOrigin,
    status: SessionStatusBits,

    pub(crate) chains: SwapchainRegistry,
    pub(crate) acquired: Mutex<VecDeque<ChainHandle>>,

    pub(crate) input: Box<dyn InputSource>,
}

impl Session {
    pub fn create(mut runtime: Box<dyn Runtime>, config: Config) -> ShimResult<Self> {
        let profile = config
            .minor_version
            .map(VersionProfile::new)
            .unwrap_or_else(version::profile);
        let caps = runtime.caps();
        let view_configs = runtime.view_configs();
        let pixels_per_tan = view_configs.map(|view| {
            let fov = view.recommended_fov;
            Vector2f::new(
                view.recommended_extent.w as f32 / (fov.left_tan + fov.right_tan),
                view.recommended_extent.h as f32 / (fov.up_tan + fov.down_tan),
            )
        });

        let view_space = runtime.create_reference_space(ReferenceSpace::View, Posef::IDENTITY)?;
        let local_space = runtime.create_reference_space(ReferenceSpace::Local, Posef::IDENTITY)?;
        let stage_space = runtime.create_reference_space(ReferenceSpace::Stage, Posef::IDENTITY)?;

        log::info!(
            "session created ({}x{} per eye)",
            view_configs[0].recommended_extent.w,
            view_configs[0].recommended_extent.h
        );

        Ok(Self {
            runtime,
            config,
            profile,
            caps,
            view_configs,
            pixels_per_tan,
            view_space,
            local_space,
            stage_space,
            frames: [FrameSlot::default(); MAX_FRAMES],
            current: 0,
            calibrated_origin: Posef::IDENTITY,
            tracking_origin: TrackingOrigin::default(),
            status: SessionStatusBits::default(),
            chains: SwapchainRegistry::default(),
            acquired: Mutex::new(VecDeque::new()),
            input: Box::new(NullInput),
        })
    }

    pub fn set_input_source(&mut self, input: Box<dyn InputSource>) {
        self.input = input;
    }

    pub fn caps(&self) -> RuntimeCaps {
        self.caps
    }

    pub fn profile(&self) -> VersionProfile {
        self.profile
    }

    pub fn view_configs(&self) -> [ViewConfig; 2] {
        self.view_configs
    }

    pub fn pixels_per_tan(&self, eye: usize) -> Vector2f {
        self.pixels_per_tan[eye]
    }

    pub fn current_frame(&self) -> FrameSlot {
        self.frames[self.current]
    }

    pub fn calibrated_origin(&self) -> Posef {
        self.calibrated_origin
    }

    pub fn tracking_origin(&self) -> TrackingOrigin {
        self.tracking_origin
    }

    pub fn set_tracking_origin(&mut self, origin: TrackingOrigin) {
        self.tracking_origin = origin;
    }

    pub(crate) fn lock_acquired(&self) -> MutexGuard<'_, VecDeque<ChainHandle>> {
        self.acquired
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Chains committed since the last begin-frame that still need their
    /// zero-duration wait.
    pub fn pending_wait_count(&self) -> usize {
        self.lock_acquired().len()
    }

    /// Space every non-head-locked layer is expressed in.
    pub(crate) fn tracking_space(&self) -> SpaceHandle {
        match self.tracking_origin {
            TrackingOrigin::EyeLevel => self.local_space,
            TrackingOrigin::FloorLevel => self.stage_space,
        }
    }

    // --- event pump -----------------------------------------------------

    /// Drain the backend event queue without blocking, latching every
    /// state change into the status bits.
    pub fn pump_events(&mut self) -> ShimResult<()> {
        while let Some(event) = self.runtime.poll_event()? {
            match event {
                RuntimeEvent::SessionState(state) => {
                    log::debug!("session state {state:?}");
                    self.status.apply_session_state(state);
                }
                RuntimeEvent::InstanceLossPending => self.status.should_quit = true,
                RuntimeEvent::ReferenceSpaceChangePending {
                    space: ReferenceSpace::Local,
                    pose_valid,
                    pose_in_previous_space,
                } => {
                    if pose_valid {
                        self.calibrated_origin =
                            origin::shifted(self.calibrated_origin, pose_in_previous_space);
                    }
                    self.status.should_recenter = true;
                }
                RuntimeEvent::ReferenceSpaceChangePending { .. } | RuntimeEvent::Other => {}
            }
        }
        Ok(())
    }

    /// Pump the event queue, then report the latched status.
    pub fn session_status(&mut self) -> ShimResult<SessionStatusBits> {
        self.pump_events()?;
        Ok(self.status)
    }

    pub fn status_bits(&self) -> SessionStatusBits {
        self.status
    }

    // --- recentering ----------------------------------------------------

    /// Recenter on the current head pose.
    pub fn recenter_tracking_origin(&mut self) -> ShimResult<()> {
        let time = self.current_frame().predicted_display_time;
        let location = self
            .runtime
            .locate_space(self.view_space, self.local_space, time)?;
        if !location.orientation_valid && !location.position_valid {
            return Err(ShimError::InvalidHeadsetOrientation);
        }
        self.specify_tracking_origin(location.pose)
    }

    /// Recenter on a caller-provided pose.
    pub fn specify_tracking_origin(&mut self, pose: Posef) -> ShimResult<()> {
        self.calibrated_origin = origin::recentered(self.calibrated_origin, pose);

        let old_space = self.local_space;
        self.local_space = self
            .runtime
            .create_reference_space(ReferenceSpace::Local, self.calibrated_origin)?;
        self.runtime.destroy_space(old_space)?;

        self.clear_should_recenter();
        Ok(())
    }

    pub fn clear_should_recenter(&mut self) {
        self.status.should_recenter = false;
    }

    // --- locating -------------------------------------------------------

    pub fn locate_head(&mut self, time: i64) -> ShimResult<SpaceLocation> {
        Ok(self
            .runtime
            .locate_space(self.view_space, self.local_space, time)?)
    }

    /// Eye poses relative to the head, at the current frame's time.
    pub fn eye_views(&mut self) -> ShimResult<[ViewPose; 2]> {
        let time = self.current_frame().predicted_display_time;
        Ok(self.runtime.locate_views(self.view_space, time)?)
    }

    // --- swapchains -----------------------------------------------------

    pub fn create_texture_swap_chain(&mut self, desc: ChainDesc) -> ShimResult<ChainHandle> {
        Ok(self.chains.create(&mut *self.runtime, desc)?)
    }

    /// Release the committed image and queue the chain for the wait the
    /// next begin-frame performs.
    pub fn commit_texture_swap_chain(&mut self, chain: ChainHandle) -> ShimResult<()> {
        if !self.chains.contains(chain) {
            return Err(ShimError::InvalidParameter("unknown swapchain"));
        }
        let needs_wait = self.chains.commit(&mut *self.runtime, chain)?;
        if needs_wait {
            self.lock_acquired().push_back(chain);
        }
        Ok(())
    }

    /// Remove the chain from the pending-wait queue, then destroy it.
    pub fn destroy_texture_swap_chain(&mut self, chain: ChainHandle) -> ShimResult<()> {
        self.lock_acquired().retain(|&queued| queued != chain);
        Ok(self.chains.destroy(&mut *self.runtime, chain)?)
    }

    pub fn swap_chain_length(&self, chain: ChainHandle) -> ShimResult<i32> {
        self.chains
            .get(chain)
            .map(|c| c.length as i32)
            .ok_or(ShimError::InvalidParameter("unknown swapchain"))
    }

    pub fn swap_chain_current_index(&self, chain: ChainHandle) -> ShimResult<i32> {
        self.chains
            .get(chain)
            .map(|c| c.current_index as i32)
            .ok_or(ShimError::InvalidParameter("unknown swapchain"))
    }

    pub fn swap_chain_desc(&self, chain: ChainHandle) -> ShimResult<ChainDesc> {
        self.chains
            .get(chain)
            .map(|c| c.desc)
            .ok_or(ShimError::InvalidParameter("unknown swapchain"))
    }

    pub fn create_mirror_texture(
        &mut self,
        width: i32,
        height: i32,
        format: i64,
    ) -> ShimResult<MirrorTexture> {
        let dummy = self.create_texture_swap_chain(ChainDesc {
            width,
            height,
            format,
            mip_count: 1,
            sample_count: 1,
            array_size: 1,
            static_image: true,
        })?;
        Ok(MirrorTexture {
            dummy,
            width,
            height,
            format,
        })
    }

    pub fn destroy_mirror_texture(&mut self, mirror: MirrorTexture) -> ShimResult<()> {
        self.destroy_texture_swap_chain(mirror.dummy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SessionState;
    use crate::headless::HeadlessRuntime;
    use crate::types::{Quatf, Vector3f};

    fn session() -> (Session, crate::headless::HeadlessHandle) {
        let runtime = HeadlessRuntime::new();
        let handle = runtime.handle();
        let session = Session::create(Box::new(runtime), Config::default()).unwrap();
        (session, handle)
    }

    #[test]
    fn exiting_event_latches_should_quit() {
        let (mut session, handle) = session();
        handle.push_event(RuntimeEvent::SessionState(SessionState::Exiting));
        let status = session.session_status().unwrap();
        assert!(status.should_quit);
    }

    #[test]
    fn instance_loss_latches_should_quit() {
        let (mut session, handle) = session();
        handle.push_event(RuntimeEvent::InstanceLossPending);
        assert!(session.session_status().unwrap().should_quit);
    }

    #[test]
    fn local_space_change_shifts_origin_and_requests_recenter() {
        let (mut session, handle) = session();
        let delta = Posef::new(Quatf::rotation_y(0.2), Vector3f::new(0.5, 0.0, 0.0));
        handle.push_event(RuntimeEvent::ReferenceSpaceChangePending {
            space: ReferenceSpace::Local,
            pose_valid: true,
            pose_in_previous_space: delta,
        });
        let status = session.session_status().unwrap();
        assert!(status.should_recenter);
        assert!((session.calibrated_origin().orientation.yaw() - 0.2).abs() < 1e-4);
    }

    #[test]
    fn invalid_pose_change_still_requests_recenter() {
        let (mut session, handle) = session();
        handle.push_event(RuntimeEvent::ReferenceSpaceChangePending {
            space: ReferenceSpace::Local,
            pose_valid: false,
            pose_in_previous_space: Posef::new(Quatf::rotation_y(1.0), Vector3f::default()),
        });
        let status = session.session_status().unwrap();
        assert!(status.should_recenter);
        assert_eq!(session.calibrated_origin(), Posef::IDENTITY);
    }

    #[test]
    fn recenter_rejects_fully_invalid_head_pose() {
        let (mut session, handle) = session();
        handle.set_head_validity(false, false);
        assert!(matches!(
            session.recenter_tracking_origin(),
            Err(ShimError::InvalidHeadsetOrientation)
        ));
    }

    #[test]
    fn recenter_accepts_orientation_only_tracking() {
        let (mut session, handle) = session();
        handle.set_head_validity(true, false);
        session.recenter_tracking_origin().unwrap();
    }

    #[test]
    fn specify_origin_clears_recenter_flag() {
        let (mut session, handle) = session();
        handle.push_event(RuntimeEvent::ReferenceSpaceChangePending {
            space: ReferenceSpace::Local,
            pose_valid: false,
            pose_in_previous_space: Posef::IDENTITY,
        });
        session.pump_events().unwrap();
        assert!(session.status_bits().should_recenter);
        session.specify_tracking_origin(Posef::IDENTITY).unwrap();
        assert!(!session.status_bits().should_recenter);
    }

    #[test]
    fn tracking_origin_selects_layer_space() {
        let (mut session, _) = session();
        assert_eq!(session.tracking_space(), session.local_space);
        session.set_tracking_origin(TrackingOrigin::FloorLevel);
        assert_eq!(session.tracking_space(), session.stage_space);
    }
}
