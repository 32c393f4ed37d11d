//! Contract with the input/haptics subsystem.
//!
//! The frontend does not implement controllers itself; it consumes an
//! [`InputSource`] for state queries, device poses and vibration, and
//! ships a [`NullInput`] for sessions without one.

use crate::error::ShimResult;
use crate::types::{Posef, Vector2f, Vector3f};

pub const HAND_COUNT: usize = 2;

pub const CONTROLLER_TOUCH: u32 = 0x0003;
pub const CONTROLLER_XBOX: u32 = 0x0010;
pub const CONTROLLER_REMOTE: u32 = 0x0100;

pub const TRACKED_DEVICE_HMD: u32 = 0x0001;
pub const TRACKED_DEVICE_LTOUCH: u32 = 0x0002;
pub const TRACKED_DEVICE_RTOUCH: u32 = 0x0004;
pub const TRACKED_DEVICE_ALL: u32 = 0xFFFF;

/// Full current-revision input state; the compatibility layer truncates
/// the write for older clients.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputState {
    pub time_in_seconds: f64,
    pub buttons: u32,
    pub touches: u32,
    pub index_trigger: [f32; HAND_COUNT],
    pub hand_trigger: [f32; HAND_COUNT],
    pub thumbstick: [Vector2f; HAND_COUNT],
    pub controller_type: u32,
    pub index_trigger_no_deadzone: [f32; HAND_COUNT],
    pub hand_trigger_no_deadzone: [f32; HAND_COUNT],
    pub thumbstick_no_deadzone: [Vector2f; HAND_COUNT],
    pub index_trigger_raw: [f32; HAND_COUNT],
    pub hand_trigger_raw: [f32; HAND_COUNT],
    pub thumbstick_raw: [Vector2f; HAND_COUNT],
}

/// Pose with derivatives at a point in time.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoseState {
    pub pose: Posef,
    pub angular_velocity: Vector3f,
    pub linear_velocity: Vector3f,
    pub angular_acceleration: Vector3f,
    pub linear_acceleration: Vector3f,
    pub time_in_seconds: f64,
}

pub const STATUS_ORIENTATION_TRACKED: u32 = 0x0001;
pub const STATUS_POSITION_TRACKED: u32 = 0x0002;

#[derive(Debug, Clone, Copy, Default)]
pub struct TrackingState {
    pub head_pose: PoseState,
    pub status_flags: u32,
    pub hand_poses: [PoseState; HAND_COUNT],
    pub hand_status_flags: [u32; HAND_COUNT],
    pub calibrated_origin: Posef,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HapticsDesc {
    pub sample_rate_hz: i32,
    pub sample_size_in_bytes: i32,
    pub queue_min_size_to_avoid_starvation: i32,
    pub submit_min_samples: i32,
    pub submit_max_samples: i32,
    pub submit_optimal_samples: i32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HapticsPlaybackState {
    pub remaining_queue_space: i32,
    pub samples_queued: i32,
}

pub trait InputSource: Send {
    fn input_state(&mut self, controller_type: u32) -> ShimResult<InputState>;

    fn tracking_state(&mut self, abs_time: f64) -> TrackingState;

    /// One pose per requested device, in request order.
    fn device_poses(&mut self, devices: &[u32], abs_time: f64) -> ShimResult<Vec<PoseState>>;

    fn set_vibration(
        &mut self,
        controller_type: u32,
        frequency: f32,
        amplitude: f32,
    ) -> ShimResult<()>;

    fn haptics_desc(&self, controller_type: u32) -> HapticsDesc;

    fn vibration_state(&mut self, controller_type: u32) -> ShimResult<HapticsPlaybackState>;
}

impl crate::session::Session {
    pub fn input_state(&mut self, controller_type: u32) -> ShimResult<InputState> {
        self.input.input_state(controller_type)
    }

    /// Tracking state from the input subsystem, stamped with the current
    /// calibrated origin.
    pub fn tracking_state(&mut self, abs_time: f64) -> TrackingState {
        let mut state = self.input.tracking_state(abs_time);
        state.calibrated_origin = self.calibrated_origin();
        state
    }

    pub fn device_poses(&mut self, devices: &[u32], abs_time: f64) -> ShimResult<Vec<PoseState>> {
        self.input.device_poses(devices, abs_time)
    }

    pub fn set_vibration(
        &mut self,
        controller_type: u32,
        frequency: f32,
        amplitude: f32,
    ) -> ShimResult<()> {
        self.input.set_vibration(controller_type, frequency, amplitude)
    }

    pub fn haptics_desc(&self, controller_type: u32) -> HapticsDesc {
        self.input.haptics_desc(controller_type)
    }

    pub fn vibration_state(&mut self, controller_type: u32) -> ShimResult<HapticsPlaybackState> {
        self.input.vibration_state(controller_type)
    }
}

/// Input source for sessions without a controller subsystem: everything
/// reads as centered and untouched.
#[derive(Debug, Default)]
pub struct NullInput;

impl InputSource for NullInput {
    fn input_state(&mut self, controller_type: u32) -> ShimResult<InputState> {
        Ok(InputState {
            controller_type,
            ..Default::default()
        })
    }

    fn tracking_state(&mut self, abs_time: f64) -> TrackingState {
        TrackingState {
            head_pose: PoseState {
                time_in_seconds: abs_time,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn device_poses(&mut self, devices: &[u32], abs_time: f64) -> ShimResult<Vec<PoseState>> {
        Ok(devices
            .iter()
            .map(|_| PoseState {
                time_in_seconds: abs_time,
                ..Default::default()
            })
            .collect())
    }

    fn set_vibration(&mut self, _: u32, _: f32, _: f32) -> ShimResult<()> {
        Ok(())
    }

    fn haptics_desc(&self, _: u32) -> HapticsDesc {
        HapticsDesc {
            sample_rate_hz: 320,
            sample_size_in_bytes: 1,
            queue_min_size_to_avoid_starvation: 12,
            submit_min_samples: 1,
            submit_max_samples: 256,
            submit_optimal_samples: 20,
        }
    }

    fn vibration_state(&mut self, _: u32) -> ShimResult<HapticsPlaybackState> {
        Ok(HapticsPlaybackState::default())
    }
}
