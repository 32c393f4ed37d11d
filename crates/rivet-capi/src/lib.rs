//! Legacy C ABI.
//!
//! Every exported `ovr_*` symbol matches the original library's name and
//! signature, including the historical aliases old clients link against.
//! Entry points validate their handles, delegate to `rivet-core` and map
//! errors onto legacy result codes; no panic crosses this boundary.

#![allow(non_snake_case, non_camel_case_types, non_upper_case_globals)]
#![allow(clippy::missing_safety_doc)]

pub mod parse;
pub mod registry;
pub mod types;

use std::ffi::{c_char, c_int, c_uint, CStr};
use std::ptr;
use std::sync::Mutex;
use std::time::Instant;

use once_cell::sync::Lazy;

use rivet_core::config::Config;
use rivet_core::error::ShimError;
use rivet_core::input as core_input;
use rivet_core::hmd::{HmdType, StencilType};
use rivet_core::layers::{LegacyLayer, ViewScale};
use rivet_core::swapchain::ChainDesc;
use rivet_core::types::Vector3f;
use rivet_core::version::{self, VersionProfile, CURRENT_MINOR_VERSION};
use rivet_core::{ChainHandle, TrackingOrigin};

pub use registry::set_runtime_factory;
use registry::{latch, with_session};
use types::*;

const VERSION_STRING: &str = concat!("1.43.0", "\0");

static START_TIME: Lazy<Instant> = Lazy::new(Instant::now);
static PROCESS_MINOR: Lazy<Mutex<u32>> = Lazy::new(|| Mutex::new(CURRENT_MINOR_VERSION));

fn bool_to_ovr(value: bool) -> ovrBool {
    if value {
        ovrTrue
    } else {
        ovrFalse
    }
}

unsafe fn cstr_or<'a>(name: *const c_char, default: &'a str) -> &'a str {
    if name.is_null() {
        return default;
    }
    CStr::from_ptr(name).to_str().unwrap_or(default)
}

unsafe fn resolve_chain(chain: ovrTextureSwapChain) -> Option<ChainHandle> {
    if chain.is_null() {
        None
    } else {
        Some((*chain).chain)
    }
}

fn pose_state_to_ovr(state: &core_input::PoseState) -> ovrPoseStatef {
    ovrPoseStatef {
        ThePose: state.pose.into(),
        AngularVelocity: state.angular_velocity.into(),
        LinearVelocity: state.linear_velocity.into(),
        AngularAcceleration: state.angular_acceleration.into(),
        LinearAcceleration: state.linear_acceleration.into(),
        pad0: [0; 4],
        TimeInSeconds: state.time_in_seconds,
    }
}

fn input_state_to_ovr(state: &core_input::InputState) -> ovrInputState {
    ovrInputState {
        TimeInSeconds: state.time_in_seconds,
        Buttons: state.buttons,
        Touches: state.touches,
        IndexTrigger: state.index_trigger,
        HandTrigger: state.hand_trigger,
        Thumbstick: state.thumbstick.map(Into::into),
        ControllerType: state.controller_type,
        IndexTriggerNoDeadzone: state.index_trigger_no_deadzone,
        HandTriggerNoDeadzone: state.hand_trigger_no_deadzone,
        ThumbstickNoDeadzone: state.thumbstick_no_deadzone.map(Into::into),
        IndexTriggerRaw: state.index_trigger_raw,
        HandTriggerRaw: state.hand_trigger_raw,
        ThumbstickRaw: state.thumbstick_raw.map(Into::into),
    }
}

// --- library lifecycle -------------------------------------------------

#[no_mangle]
pub unsafe extern "C" fn ovr_Initialize(params: *const ovrInitParams) -> ovrResult {
    let _ = env_logger::try_init();

    let mut config = Config::from_env();
    let requested = if params.is_null() {
        CURRENT_MINOR_VERSION
    } else {
        (*params).RequestedMinorVersion
    };
    let minor = config.minor_version.unwrap_or(requested);
    config.minor_version = Some(minor);

    if !registry::initialize(config) {
        return ovrSuccess;
    }
    *PROCESS_MINOR.lock().unwrap_or_else(|p| p.into_inner()) = minor;
    version::set_profile(VersionProfile::new(minor));
    log::info!("initialized for client minor version {minor}");
    ovrSuccess
}

#[no_mangle]
pub extern "C" fn ovr_Shutdown() {
    registry::shutdown();
}

#[no_mangle]
pub unsafe extern "C" fn ovr_GetLastErrorInfo(errorInfo: *mut ovrErrorInfo) {
    if errorInfo.is_null() {
        return;
    }
    let (result, message) = registry::last_error();
    let mut info = ovrErrorInfo {
        Result: result,
        ..Default::default()
    };
    write_cstr(&mut info.ErrorString, &message);
    *errorInfo = info;
}

#[no_mangle]
pub extern "C" fn ovr_GetVersionString() -> *const c_char {
    VERSION_STRING.as_ptr() as *const c_char
}

#[no_mangle]
pub extern "C" fn ovr_TraceMessage(_level: c_int, _message: *const c_char) -> c_int {
    0
}

#[no_mangle]
pub extern "C" fn ovr_IdentifyClient(_identity: *const c_char) -> ovrResult {
    ovrSuccess
}

// --- session lifecycle -------------------------------------------------

#[no_mangle]
pub unsafe extern "C" fn ovr_Create(
    pSession: *mut ovrSession,
    pLuid: *mut ovrGraphicsLuid,
) -> ovrResult {
    if pSession.is_null() {
        return latch(ShimError::InvalidParameter("null session out-pointer"));
    }
    *pSession = ptr::null_mut();
    if !registry::is_initialized() {
        return ovrError_NotInitialized;
    }
    match registry::create_session() {
        Ok(shell) => {
            if !pLuid.is_null() {
                *pLuid = ovrGraphicsLuid::default();
            }
            *pSession = shell;
            ovrSuccess
        }
        Err(code) => code,
    }
}

#[no_mangle]
pub extern "C" fn ovr_Destroy(session: ovrSession) {
    registry::destroy_session(session);
}

#[no_mangle]
pub unsafe extern "C" fn ovr_GetSessionStatus(
    session: ovrSession,
    sessionStatus: *mut ovrSessionStatus,
) -> ovrResult {
    if sessionStatus.is_null() {
        return latch(ShimError::InvalidParameter("null status out-pointer"));
    }
    match with_session(session, |s| s.session_status().map_err(latch)) {
        Ok(bits) => {
            *sessionStatus = ovrSessionStatus {
                IsVisible: bool_to_ovr(bits.is_visible),
                HmdPresent: bool_to_ovr(bits.hmd_present),
                HmdMounted: bool_to_ovr(bits.hmd_mounted),
                DisplayLost: bool_to_ovr(bits.display_lost),
                ShouldQuit: bool_to_ovr(bits.should_quit),
                ShouldRecenter: bool_to_ovr(bits.should_recenter),
                HasInputFocus: bool_to_ovr(bits.has_input_focus),
                OverlayPresent: bool_to_ovr(bits.overlay_present),
                DepthRequested: ovrFalse,
            };
            ovrSuccess
        }
        Err(code) => code,
    }
}

// --- headset queries ---------------------------------------------------

#[no_mangle]
pub extern "C" fn ovr_GetHmdDesc(session: ovrSession) -> ovrHmdDesc {
    let minor = *PROCESS_MINOR.lock().unwrap_or_else(|p| p.into_inner());
    let mut desc = ovrHmdDesc {
        Type: if VersionProfile::new(minor).assumes_first_gen_hmd() {
            ovrHmd_CV1
        } else {
            ovrHmd_RiftS
        },
        ..Default::default()
    };

    let core = with_session(session, |s| Ok(s.hmd_desc()));
    let Ok(core) = core else {
        return desc;
    };

    desc.Type = match core.hmd_type {
        HmdType::FirstGen => ovrHmd_CV1,
        HmdType::SecondGen => ovrHmd_RiftS,
    };
    write_cstr(&mut desc.ProductName, &core.product_name);
    write_cstr(&mut desc.Manufacturer, &core.manufacturer);
    desc.AvailableTrackingCaps = core.available_tracking_caps;
    desc.DefaultTrackingCaps = core.default_tracking_caps;
    desc.DefaultEyeFov = core.default_eye_fov.map(Into::into);
    desc.MaxEyeFov = core.max_eye_fov.map(Into::into);
    desc.Resolution = core.resolution.into();
    desc.DisplayRefreshRate = core.display_refresh_rate;
    desc
}

#[no_mangle]
pub extern "C" fn ovr_GetTrackerCount(session: ovrSession) -> c_uint {
    with_session(session, |s| Ok(s.tracker_count())).unwrap_or(0)
}

#[no_mangle]
pub extern "C" fn ovr_GetTrackerDesc(
    session: ovrSession,
    trackerDescIndex: c_uint,
) -> ovrTrackerDesc {
    with_session(session, |s| {
        let desc = s.tracker_desc(trackerDescIndex);
        Ok(ovrTrackerDesc {
            FrustumHFovInRadians: desc.frustum_hfov_in_radians,
            FrustumVFovInRadians: desc.frustum_vfov_in_radians,
            FrustumNearZInMeters: desc.frustum_near_z_in_meters,
            FrustumFarZInMeters: desc.frustum_far_z_in_meters,
        })
    })
    .unwrap_or_default()
}

#[no_mangle]
pub extern "C" fn ovr_GetTrackerPose(
    session: ovrSession,
    trackerPoseIndex: c_uint,
) -> ovrTrackerPose {
    with_session(session, |s| {
        let pose = s.tracker_pose(trackerPoseIndex).map_err(latch)?;
        Ok(ovrTrackerPose {
            TrackerFlags: pose.tracker_flags,
            Pose: pose.pose.into(),
            LeveledPose: pose.leveled_pose.into(),
            pad0: [0; 4],
        })
    })
    .unwrap_or_default()
}

// --- tracking origin ---------------------------------------------------

#[no_mangle]
pub extern "C" fn ovr_SetTrackingOriginType(
    session: ovrSession,
    origin: ovrTrackingOrigin,
) -> ovrResult {
    match with_session(session, |s| {
        s.set_tracking_origin(if origin == ovrTrackingOrigin_FloorLevel {
            TrackingOrigin::FloorLevel
        } else {
            TrackingOrigin::EyeLevel
        });
        Ok(())
    }) {
        Ok(()) => ovrSuccess,
        Err(code) => code,
    }
}

#[no_mangle]
pub extern "C" fn ovr_GetTrackingOriginType(session: ovrSession) -> ovrTrackingOrigin {
    with_session(session, |s| {
        Ok(match s.tracking_origin() {
            TrackingOrigin::EyeLevel => ovrTrackingOrigin_EyeLevel,
            TrackingOrigin::FloorLevel => ovrTrackingOrigin_FloorLevel,
        })
    })
    .unwrap_or(ovrTrackingOrigin_EyeLevel)
}

#[no_mangle]
pub extern "C" fn ovr_RecenterTrackingOrigin(session: ovrSession) -> ovrResult {
    match with_session(session, |s| s.recenter_tracking_origin().map_err(latch)) {
        Ok(()) => ovrSuccess,
        Err(code) => code,
    }
}

#[no_mangle]
pub extern "C" fn ovr_SpecifyTrackingOrigin(session: ovrSession, originPose: ovrPosef) -> ovrResult {
    match with_session(session, |s| {
        s.specify_tracking_origin(originPose.into()).map_err(latch)
    }) {
        Ok(()) => ovrSuccess,
        Err(code) => code,
    }
}

#[no_mangle]
pub extern "C" fn ovr_ClearShouldRecenterFlag(session: ovrSession) {
    let _ = with_session(session, |s| {
        s.clear_should_recenter();
        Ok(())
    });
}

// --- tracking & input --------------------------------------------------

#[no_mangle]
pub extern "C" fn ovr_GetTrackingState(
    session: ovrSession,
    absTime: f64,
    _latencyMarker: ovrBool,
) -> ovrTrackingState {
    with_session(session, |s| {
        let state = s.tracking_state(absTime);
        Ok(ovrTrackingState {
            HeadPose: pose_state_to_ovr(&state.head_pose),
            StatusFlags: state.status_flags,
            HandPoses: [
                pose_state_to_ovr(&state.hand_poses[0]),
                pose_state_to_ovr(&state.hand_poses[1]),
            ],
            HandStatusFlags: state.hand_status_flags,
            CalibratedOrigin: state.calibrated_origin.into(),
        })
    })
    .unwrap_or_default()
}

#[no_mangle]
pub extern "C" fn ovr_GetTrackingStateWithSensorData(
    session: ovrSession,
    absTime: f64,
    latencyMarker: ovrBool,
    _sensorData: *mut std::ffi::c_void,
) -> ovrTrackingState {
    // Private API; the raw sensor data request is ignored.
    ovr_GetTrackingState(session, absTime, latencyMarker)
}

#[no_mangle]
pub unsafe extern "C" fn ovr_GetDevicePoses(
    session: ovrSession,
    deviceTypes: *const ovrTrackedDeviceType,
    deviceCount: c_int,
    absTime: f64,
    outDevicePoses: *mut ovrPoseStatef,
) -> ovrResult {
    if deviceCount > 0 && (deviceTypes.is_null() || outDevicePoses.is_null()) {
        return latch(ShimError::InvalidParameter("null device pose buffer"));
    }
    let devices: &[ovrTrackedDeviceType] = if deviceCount > 0 {
        std::slice::from_raw_parts(deviceTypes, deviceCount as usize)
    } else {
        &[]
    };
    match with_session(session, |s| s.device_poses(devices, absTime).map_err(latch)) {
        Ok(poses) => {
            for (i, pose) in poses.iter().enumerate() {
                *outDevicePoses.add(i) = pose_state_to_ovr(pose);
            }
            ovrSuccess
        }
        Err(code) => code,
    }
}

#[no_mangle]
pub unsafe extern "C" fn ovr_GetInputState(
    session: ovrSession,
    controllerType: ovrControllerType,
    inputState: *mut ovrInputState,
) -> ovrResult {
    if inputState.is_null() {
        return latch(ShimError::InvalidParameter("null input state out-pointer"));
    }
    match with_session(session, |s| {
        let state = s.input_state(controllerType).map_err(latch)?;
        Ok((input_state_to_ovr(&state), s.profile()))
    }) {
        Ok((full, profile)) => {
            // Older clients allocate the smaller historical struct; write
            // exactly that many bytes and not one more.
            let size = match profile.input_state_revision() {
                rivet_core::InputStateRevision::V1 => std::mem::size_of::<ovrInputState1>(),
                rivet_core::InputStateRevision::V2 => std::mem::size_of::<ovrInputState2>(),
                rivet_core::InputStateRevision::V3 => std::mem::size_of::<ovrInputState>(),
            };
            ptr::copy_nonoverlapping(
                &full as *const ovrInputState as *const u8,
                inputState as *mut u8,
                size,
            );
            ovrSuccess
        }
        Err(code) => code,
    }
}

#[no_mangle]
pub extern "C" fn ovr_GetConnectedControllerTypes(_session: ovrSession) -> c_uint {
    ovrControllerType_Touch | ovrControllerType_XBox | ovrControllerType_Remote
}

#[no_mangle]
pub extern "C" fn ovr_GetTouchHapticsDesc(
    session: ovrSession,
    controllerType: ovrControllerType,
) -> ovrTouchHapticsDesc {
    with_session(session, |s| {
        let desc = s.haptics_desc(controllerType);
        Ok(ovrTouchHapticsDesc {
            SampleRateHz: desc.sample_rate_hz,
            SampleSizeInBytes: desc.sample_size_in_bytes,
            QueueMinSizeToAvoidStarvation: desc.queue_min_size_to_avoid_starvation,
            SubmitMinSamples: desc.submit_min_samples,
            SubmitMaxSamples: desc.submit_max_samples,
            SubmitOptimalSamples: desc.submit_optimal_samples,
        })
    })
    .unwrap_or_default()
}

#[no_mangle]
pub extern "C" fn ovr_SetControllerVibration(
    session: ovrSession,
    controllerType: ovrControllerType,
    frequency: f32,
    amplitude: f32,
) -> ovrResult {
    match with_session(session, |s| {
        s.set_vibration(controllerType, frequency, amplitude)
            .map_err(latch)
    }) {
        Ok(()) => ovrSuccess,
        Err(code) => code,
    }
}

#[no_mangle]
pub unsafe extern "C" fn ovr_SubmitControllerVibration(
    session: ovrSession,
    _controllerType: ovrControllerType,
    buffer: *const ovrHapticsBuffer,
) -> ovrResult {
    if buffer.is_null() {
        return latch(ShimError::InvalidParameter("null haptics buffer"));
    }
    match with_session(session, |_| Ok(())) {
        Ok(()) => ovrSuccess,
        Err(code) => code,
    }
}

#[no_mangle]
pub unsafe extern "C" fn ovr_GetControllerVibrationState(
    session: ovrSession,
    controllerType: ovrControllerType,
    outState: *mut ovrHapticsPlaybackState,
) -> ovrResult {
    if outState.is_null() {
        return latch(ShimError::InvalidParameter("null playback state"));
    }
    match with_session(session, |s| s.vibration_state(controllerType).map_err(latch)) {
        Ok(state) => {
            *outState = ovrHapticsPlaybackState {
                RemainingQueueSpace: state.remaining_queue_space,
                SamplesQueued: state.samples_queued,
            };
            ovrSuccess
        }
        Err(code) => code,
    }
}

// --- boundary ----------------------------------------------------------

#[no_mangle]
pub unsafe extern "C" fn ovr_TestBoundary(
    session: ovrSession,
    deviceBitmask: ovrTrackedDeviceType,
    _boundaryType: ovrBoundaryType,
    outTestResult: *mut ovrBoundaryTestResult,
) -> ovrResult {
    if outTestResult.is_null() {
        return latch(ShimError::InvalidParameter("null boundary result"));
    }
    match with_session(session, |s| s.test_boundary(deviceBitmask).map_err(latch)) {
        Ok(result) => {
            *outTestResult = ovrBoundaryTestResult {
                IsTriggering: bool_to_ovr(result.is_triggering),
                ClosestDistance: result.closest_distance,
                ClosestPoint: result.closest_point.into(),
                ClosestPointNormal: result.closest_point_normal.into(),
            };
            ovrSuccess
        }
        Err(code) => code,
    }
}

#[no_mangle]
pub unsafe extern "C" fn ovr_TestBoundaryPoint(
    session: ovrSession,
    point: *const ovrVector3f,
    _singleBoundaryType: ovrBoundaryType,
    outTestResult: *mut ovrBoundaryTestResult,
) -> ovrResult {
    if point.is_null() || outTestResult.is_null() {
        return latch(ShimError::InvalidParameter("null boundary point"));
    }
    let point = Vector3f::from(*point);
    match with_session(session, |s| s.test_boundary_point(point).map_err(latch)) {
        Ok(result) => {
            *outTestResult = ovrBoundaryTestResult {
                IsTriggering: bool_to_ovr(result.is_triggering),
                ClosestDistance: result.closest_distance,
                ClosestPoint: result.closest_point.into(),
                ClosestPointNormal: result.closest_point_normal.into(),
            };
            ovrSuccess
        }
        Err(code) => code,
    }
}

#[no_mangle]
pub extern "C" fn ovr_SetBoundaryLookAndFeel(
    _session: ovrSession,
    _lookAndFeel: *const ovrBoundaryLookAndFeel,
) -> ovrResult {
    latch(ShimError::Unsupported("boundary look and feel"))
}

#[no_mangle]
pub extern "C" fn ovr_ResetBoundaryLookAndFeel(_session: ovrSession) -> ovrResult {
    latch(ShimError::Unsupported("boundary look and feel"))
}

#[no_mangle]
pub unsafe extern "C" fn ovr_GetBoundaryGeometry(
    session: ovrSession,
    _boundaryType: ovrBoundaryType,
    outFloorPoints: *mut ovrVector3f,
    outFloorPointsCount: *mut c_int,
) -> ovrResult {
    match with_session(session, |s| {
        if outFloorPoints.is_null() {
            return Ok(());
        }
        let corners = s.boundary_geometry().map_err(latch)?;
        for (i, corner) in corners.iter().enumerate() {
            unsafe { *outFloorPoints.add(i) = (*corner).into() };
        }
        Ok(())
    }) {
        Ok(()) => {
            if !outFloorPointsCount.is_null() {
                *outFloorPointsCount = 4;
            }
            ovrSuccess
        }
        Err(code) => code,
    }
}

#[no_mangle]
pub unsafe extern "C" fn ovr_GetBoundaryDimensions(
    session: ovrSession,
    _boundaryType: ovrBoundaryType,
    outDimensions: *mut ovrVector3f,
) -> ovrResult {
    if outDimensions.is_null() {
        return latch(ShimError::InvalidParameter("null dimensions out-pointer"));
    }
    match with_session(session, |s| s.boundary_dimensions().map_err(latch)) {
        Ok(dims) => {
            *outDimensions = dims.into();
            ovrSuccess
        }
        Err(code) => code,
    }
}

#[no_mangle]
pub extern "C" fn ovr_GetBoundaryVisible(
    _session: ovrSession,
    _outIsVisible: *mut ovrBool,
) -> ovrResult {
    latch(ShimError::Unsupported("boundary visibility"))
}

#[no_mangle]
pub extern "C" fn ovr_RequestBoundaryVisible(
    _session: ovrSession,
    _visible: ovrBool,
) -> ovrResult {
    latch(ShimError::Unsupported("boundary visibility"))
}

// --- swapchains --------------------------------------------------------

/// Create an image chain for `session`. The graphics binding calls this
/// from its API-specific create entry points once it has translated the
/// texture format.
pub unsafe fn create_texture_swap_chain(
    session: ovrSession,
    desc: *const ovrTextureSwapChainDesc,
    out_chain: *mut ovrTextureSwapChain,
) -> ovrResult {
    if desc.is_null() || out_chain.is_null() {
        return latch(ShimError::InvalidParameter("null swapchain descriptor"));
    }
    let desc = *desc;
    match with_session(session, |s| {
        s.create_texture_swap_chain(ChainDesc {
            width: desc.Width,
            height: desc.Height,
            format: desc.Format as i64,
            mip_count: desc.MipLevels,
            sample_count: desc.SampleCount,
            array_size: desc.ArraySize,
            static_image: desc.StaticImage != ovrFalse,
        })
        .map_err(latch)
    }) {
        Ok(chain) => {
            *out_chain = Box::into_raw(Box::new(ovrTextureSwapChainData {
                session,
                chain,
                desc,
            }));
            ovrSuccess
        }
        Err(code) => code,
    }
}

#[no_mangle]
pub unsafe extern "C" fn ovr_GetTextureSwapChainLength(
    session: ovrSession,
    chain: ovrTextureSwapChain,
    out_Length: *mut c_int,
) -> ovrResult {
    if chain.is_null() || out_Length.is_null() {
        return latch(ShimError::InvalidParameter("null swapchain"));
    }
    let handle = (*chain).chain;
    match with_session(session, |s| s.swap_chain_length(handle).map_err(latch)) {
        Ok(length) => {
            *out_Length = length;
            ovrSuccess
        }
        Err(code) => code,
    }
}

#[no_mangle]
pub unsafe extern "C" fn ovr_GetTextureSwapChainCurrentIndex(
    session: ovrSession,
    chain: ovrTextureSwapChain,
    out_Index: *mut c_int,
) -> ovrResult {
    if chain.is_null() || out_Index.is_null() {
        return latch(ShimError::InvalidParameter("null swapchain"));
    }
    let handle = (*chain).chain;
    match with_session(session, |s| s.swap_chain_current_index(handle).map_err(latch)) {
        Ok(index) => {
            *out_Index = index;
            ovrSuccess
        }
        Err(code) => code,
    }
}

#[no_mangle]
pub unsafe extern "C" fn ovr_GetTextureSwapChainDesc(
    _session: ovrSession,
    chain: ovrTextureSwapChain,
    out_Desc: *mut ovrTextureSwapChainDesc,
) -> ovrResult {
    if chain.is_null() || out_Desc.is_null() {
        return latch(ShimError::InvalidParameter("null swapchain"));
    }
    *out_Desc = (*chain).desc;
    ovrSuccess
}

#[no_mangle]
pub unsafe extern "C" fn ovr_CommitTextureSwapChain(
    session: ovrSession,
    chain: ovrTextureSwapChain,
) -> ovrResult {
    if chain.is_null() {
        return latch(ShimError::InvalidParameter("null swapchain"));
    }
    let handle = (*chain).chain;
    match with_session(session, |s| {
        s.commit_texture_swap_chain(handle).map_err(latch)
    }) {
        Ok(()) => ovrSuccess,
        Err(code) => code,
    }
}

#[no_mangle]
pub unsafe extern "C" fn ovr_DestroyTextureSwapChain(
    session: ovrSession,
    chain: ovrTextureSwapChain,
) {
    if chain.is_null() {
        return;
    }
    let handle = (*chain).chain;
    let _ = with_session(session, |s| {
        s.destroy_texture_swap_chain(handle).map_err(latch)
    });
    drop(Box::from_raw(chain));
}

/// Create a mirror texture wrapper; only descriptor queries work on it.
pub unsafe fn create_mirror_texture(
    session: ovrSession,
    desc: *const ovrMirrorTextureDesc,
    out_mirror: *mut ovrMirrorTexture,
) -> ovrResult {
    if desc.is_null() || out_mirror.is_null() {
        return latch(ShimError::InvalidParameter("null mirror descriptor"));
    }
    let desc = *desc;
    match with_session(session, |s| {
        s.create_mirror_texture(desc.Width, desc.Height, desc.Format as i64)
            .map_err(latch)
    }) {
        Ok(mirror) => {
            *out_mirror = Box::into_raw(Box::new(ovrMirrorTextureData { session, mirror }));
            ovrSuccess
        }
        Err(code) => code,
    }
}

#[no_mangle]
pub unsafe extern "C" fn ovr_DestroyMirrorTexture(
    session: ovrSession,
    mirrorTexture: ovrMirrorTexture,
) {
    if mirrorTexture.is_null() {
        return;
    }
    let mirror = (*mirrorTexture).mirror;
    let _ = with_session(session, |s| s.destroy_mirror_texture(mirror).map_err(latch));
    drop(Box::from_raw(mirrorTexture));
}

// --- rendering setup ---------------------------------------------------

#[no_mangle]
pub extern "C" fn ovr_GetFovTextureSize(
    session: ovrSession,
    eye: ovrEyeType,
    fov: ovrFovPort,
    _pixelsPerDisplayPixel: f32,
) -> ovrSizei {
    with_session(session, |s| {
        Ok(s.fov_texture_size(eye.clamp(0, 1) as usize, fov.into()).into())
    })
    .unwrap_or_default()
}

#[no_mangle]
pub extern "C" fn ovr_GetRenderDesc2(
    session: ovrSession,
    eyeType: ovrEyeType,
    fov: ovrFovPort,
) -> ovrEyeRenderDesc {
    with_session(session, |s| {
        let desc = s
            .render_desc(eyeType.clamp(0, 1) as usize, fov.into())
            .map_err(latch)?;
        Ok(ovrEyeRenderDesc {
            Eye: eyeType,
            Fov: desc.fov.into(),
            DistortedViewport: desc.distorted_viewport.into(),
            PixelsPerTanAngleAtCenter: desc.pixels_per_tan_angle_at_center.into(),
            HmdToEyePose: desc.hmd_to_eye_pose.into(),
        })
    })
    .unwrap_or_default()
}

/// Pre-1.17 alias: the eye transform is an offset, not a pose.
#[no_mangle]
pub extern "C" fn ovr_GetRenderDesc(
    session: ovrSession,
    eyeType: ovrEyeType,
    fov: ovrFovPort,
) -> ovrEyeRenderDesc1 {
    let desc = ovr_GetRenderDesc2(session, eyeType, fov);
    ovrEyeRenderDesc1 {
        Eye: desc.Eye,
        Fov: desc.Fov,
        DistortedViewport: desc.DistortedViewport,
        PixelsPerTanAngleAtCenter: desc.PixelsPerTanAngleAtCenter,
        HmdToEyeOffset: desc.HmdToEyePose.Position,
    }
}

// --- frame pipeline ----------------------------------------------------

#[no_mangle]
pub extern "C" fn ovr_WaitToBeginFrame(session: ovrSession, frameIndex: i64) -> ovrResult {
    match with_session(session, |s| s.wait_to_begin_frame(frameIndex).map_err(latch)) {
        Ok(()) => ovrSuccess,
        Err(code) => code,
    }
}

#[no_mangle]
pub extern "C" fn ovr_BeginFrame(session: ovrSession, frameIndex: i64) -> ovrResult {
    match with_session(session, |s| s.begin_frame(frameIndex).map_err(latch)) {
        Ok(()) => ovrSuccess,
        Err(code) => code,
    }
}

unsafe fn parse_layer_list(
    profile: VersionProfile,
    layerPtrList: *const *const ovrLayerHeader,
    layerCount: c_uint,
) -> Vec<Option<LegacyLayer>> {
    if layerPtrList.is_null() {
        return Vec::new();
    }
    let resolver = |chain: ovrTextureSwapChain| unsafe { resolve_chain(chain) };
    std::slice::from_raw_parts(layerPtrList, layerCount as usize)
        .iter()
        .map(|&header| parse::parse_layer(header, profile, &resolver))
        .collect()
}

#[no_mangle]
pub unsafe extern "C" fn ovr_EndFrame(
    session: ovrSession,
    _frameIndex: i64,
    viewScaleDesc: *const ovrViewScaleDesc,
    layerPtrList: *const *const ovrLayerHeader,
    layerCount: c_uint,
) -> ovrResult {
    let view_scale = viewScaleDesc.as_ref().map(|scale| ViewScale {
        world_scale_in_meters: scale.HmdSpaceToWorldScaleInMeters,
    });
    match with_session(session, |s| {
        let layers = unsafe { parse_layer_list(s.profile(), layerPtrList, layerCount) };
        s.end_frame(_frameIndex, view_scale, &layers).map_err(latch)
    }) {
        Ok(()) => ovrSuccess,
        Err(code) => code,
    }
}

#[no_mangle]
pub unsafe extern "C" fn ovr_SubmitFrame2(
    session: ovrSession,
    frameIndex: i64,
    viewScaleDesc: *const ovrViewScaleDesc,
    layerPtrList: *const *const ovrLayerHeader,
    layerCount: c_uint,
) -> ovrResult {
    let view_scale = viewScaleDesc.as_ref().map(|scale| ViewScale {
        world_scale_in_meters: scale.HmdSpaceToWorldScaleInMeters,
    });
    match with_session(session, |s| {
        let layers = unsafe { parse_layer_list(s.profile(), layerPtrList, layerCount) };
        s.submit_frame(frameIndex, view_scale, &layers).map_err(latch)
    }) {
        Ok(()) => ovrSuccess,
        Err(code) => code,
    }
}

/// Pre-view-scale alias; the old scale descriptor carried nothing the
/// translation needs.
#[no_mangle]
pub unsafe extern "C" fn ovr_SubmitFrame(
    session: ovrSession,
    frameIndex: i64,
    _viewScaleDesc: *const ovrViewScaleDesc1,
    layerPtrList: *const *const ovrLayerHeader,
    layerCount: c_uint,
) -> ovrResult {
    ovr_SubmitFrame2(session, frameIndex, ptr::null(), layerPtrList, layerCount)
}

#[no_mangle]
pub extern "C" fn ovr_GetPredictedDisplayTime(session: ovrSession, frameIndex: i64) -> f64 {
    with_session(session, |s| Ok(s.predicted_display_time(frameIndex))).unwrap_or(0.0)
}

#[no_mangle]
pub extern "C" fn ovr_GetTimeInSeconds() -> f64 {
    START_TIME.elapsed().as_secs_f64()
}

// --- perf stats --------------------------------------------------------

#[no_mangle]
pub extern "C" fn ovr_GetPerfStats(
    _session: ovrSession,
    _outStats: *mut std::ffi::c_void,
) -> ovrResult {
    latch(ShimError::Unsupported("performance statistics"))
}

#[no_mangle]
pub extern "C" fn ovr_ResetPerfStats(_session: ovrSession) -> ovrResult {
    latch(ShimError::Unsupported("performance statistics"))
}

// --- properties --------------------------------------------------------

#[no_mangle]
pub unsafe extern "C" fn ovr_GetBool(
    session: ovrSession,
    propertyName: *const c_char,
    defaultVal: ovrBool,
) -> ovrBool {
    let name = cstr_or(propertyName, "");
    with_session(session, |s| {
        Ok(bool_to_ovr(s.get_property_bool(name, defaultVal != ovrFalse)))
    })
    .unwrap_or(defaultVal)
}

#[no_mangle]
pub extern "C" fn ovr_SetBool(
    _session: ovrSession,
    _propertyName: *const c_char,
    _value: ovrBool,
) -> ovrBool {
    ovrFalse
}

#[no_mangle]
pub unsafe extern "C" fn ovr_GetInt(
    session: ovrSession,
    propertyName: *const c_char,
    defaultVal: c_int,
) -> c_int {
    let name = cstr_or(propertyName, "");
    with_session(session, |s| Ok(s.get_property_int(name, defaultVal))).unwrap_or(defaultVal)
}

#[no_mangle]
pub extern "C" fn ovr_SetInt(
    _session: ovrSession,
    _propertyName: *const c_char,
    _value: c_int,
) -> ovrBool {
    ovrFalse
}

#[no_mangle]
pub unsafe extern "C" fn ovr_GetFloat(
    session: ovrSession,
    propertyName: *const c_char,
    defaultVal: f32,
) -> f32 {
    let name = cstr_or(propertyName, "");
    with_session(session, |s| Ok(s.get_property_float(name, defaultVal))).unwrap_or(defaultVal)
}

#[no_mangle]
pub extern "C" fn ovr_SetFloat(
    _session: ovrSession,
    _propertyName: *const c_char,
    _value: f32,
) -> ovrBool {
    ovrFalse
}

#[no_mangle]
pub unsafe extern "C" fn ovr_GetFloatArray(
    session: ovrSession,
    propertyName: *const c_char,
    values: *mut f32,
    valuesCapacity: c_uint,
) -> c_uint {
    if values.is_null() {
        return 0;
    }
    let name = cstr_or(propertyName, "");
    let out = std::slice::from_raw_parts_mut(values, valuesCapacity as usize);
    with_session(session, |s| Ok(s.get_property_float_array(name, out))).unwrap_or(0)
}

#[no_mangle]
pub extern "C" fn ovr_SetFloatArray(
    _session: ovrSession,
    _propertyName: *const c_char,
    _values: *const f32,
    _valuesSize: c_uint,
) -> ovrBool {
    ovrFalse
}

#[no_mangle]
pub unsafe extern "C" fn ovr_GetString(
    session: ovrSession,
    propertyName: *const c_char,
    defaultVal: *const c_char,
) -> *const c_char {
    let name = cstr_or(propertyName, "");
    // The only recognized string property has a fixed answer, so a static
    // is always safe to hand back across the ABI.
    if registry::is_live(session) && name == rivet_core::props::KEY_GENDER {
        static GENDER: &str = concat!("Unknown", "\0");
        return GENDER.as_ptr() as *const c_char;
    }
    defaultVal
}

#[no_mangle]
pub extern "C" fn ovr_SetString(
    _session: ovrSession,
    _propertyName: *const c_char,
    _value: *const c_char,
) -> ovrBool {
    ovrFalse
}

// --- service & misc ----------------------------------------------------

#[no_mangle]
pub extern "C" fn ovr_Lookup(
    _name: *const c_char,
    _data: *mut *mut std::ffi::c_void,
) -> ovrResult {
    // No service bus is emulated.
    latch(ShimError::ServiceError)
}

#[no_mangle]
pub extern "C" fn ovr_GetExternalCameras(
    _session: ovrSession,
    _cameras: *mut ovrExternalCamera,
    _inoutCameraCount: *mut c_uint,
) -> ovrResult {
    ovrError_NoExternalCameraInfo
}

#[no_mangle]
pub extern "C" fn ovr_SetExternalCameraProperties(
    _session: ovrSession,
    _name: *const c_char,
    _intrinsics: *const ovrCameraIntrinsics,
    _extrinsics: *const ovrCameraExtrinsics,
) -> ovrResult {
    ovrError_NoExternalCameraInfo
}

#[no_mangle]
pub extern "C" fn ovr_GetEnabledCaps(_session: ovrSession) -> c_uint {
    0
}

#[no_mangle]
pub extern "C" fn ovr_SetEnabledCaps(_session: ovrSession, _hmdCaps: c_uint) {}

#[no_mangle]
pub extern "C" fn ovr_GetTrackingCaps(_session: ovrSession) -> c_uint {
    0
}

#[no_mangle]
pub extern "C" fn ovr_ConfigureTracking(
    _session: ovrSession,
    _requestedTrackingCaps: c_uint,
    _requiredTrackingCaps: c_uint,
) -> ovrResult {
    ovrSuccess
}

#[no_mangle]
pub unsafe extern "C" fn ovr_IsExtensionSupported(
    _session: ovrSession,
    _extension: ovrExtensions,
    outExtensionSupported: *mut ovrBool,
) -> ovrResult {
    if outExtensionSupported.is_null() {
        return latch(ShimError::InvalidParameter("null extension out-pointer"));
    }
    *outExtensionSupported = ovrFalse;
    ovrSuccess
}

#[no_mangle]
pub extern "C" fn ovr_EnableExtension(
    _session: ovrSession,
    _extension: ovrExtensions,
) -> ovrResult {
    latch(ShimError::InvalidOperation("extensions cannot be enabled"))
}

// --- fov stencil -------------------------------------------------------

#[no_mangle]
pub unsafe extern "C" fn ovr_GetFovStencil(
    session: ovrSession,
    fovStencilDesc: *const ovrFovStencilDesc,
    meshBuffer: *mut ovrFovStencilMeshBuffer,
) -> ovrResult {
    if fovStencilDesc.is_null() || meshBuffer.is_null() {
        return latch(ShimError::InvalidParameter("null stencil buffer"));
    }
    let desc = *fovStencilDesc;
    let stencil_type = match desc.StencilType {
        ovrFovStencil_HiddenArea => StencilType::HiddenArea,
        ovrFovStencil_VisibleArea => StencilType::VisibleArea,
        ovrFovStencil_BorderLine => StencilType::BorderLine,
        ovrFovStencil_VisibleRectangle => StencilType::VisibleRectangle,
        _ => return latch(ShimError::InvalidParameter("unknown stencil type")),
    };
    let origin_at_bottom_left = desc.StencilFlags & ovrFovStencilFlag_MeshOriginAtBottomLeft != 0;

    match with_session(session, |s| {
        s.fov_stencil(stencil_type, desc.Eye.clamp(0, 1) as u32, origin_at_bottom_left)
            .map_err(latch)
    }) {
        Ok(mesh) => {
            let buffer = &mut *meshBuffer;
            buffer.UsedVertexCount = mesh.vertices.len() as c_int;
            buffer.UsedIndexCount = mesh.indices.len() as c_int;
            if !buffer.VertexBuffer.is_null() && buffer.AllocVertexCount >= buffer.UsedVertexCount {
                for (i, v) in mesh.vertices.iter().enumerate() {
                    *buffer.VertexBuffer.add(i) = (*v).into();
                }
            }
            if !buffer.IndexBuffer.is_null() && buffer.AllocIndexCount >= buffer.UsedIndexCount {
                for (i, &index) in mesh.indices.iter().enumerate() {
                    *buffer.IndexBuffer.add(i) = index;
                }
            }
            ovrSuccess
        }
        Err(code) => code,
    }
}

#[no_mangle]
pub unsafe extern "C" fn ovr_GetViewportStencil(
    session: ovrSession,
    viewportStencilDesc: *const ovrFovStencilDesc,
    outMeshBuffer: *mut ovrFovStencilMeshBuffer,
) -> ovrResult {
    ovr_GetFovStencil(session, viewportStencilDesc, outMeshBuffer)
}

// --- unsupported vendor surfaces ---------------------------------------

#[no_mangle]
pub extern "C" fn ovr_InitDesktopWindow(
    _session: ovrSession,
    _outWindowHandle: *mut u32,
) -> ovrResult {
    latch(ShimError::Unsupported("desktop window"))
}

#[no_mangle]
pub extern "C" fn ovr_ShowDesktopWindow(
    _session: ovrSession,
    _windowDesc: *const std::ffi::c_void,
) -> ovrResult {
    latch(ShimError::Unsupported("desktop window"))
}

#[no_mangle]
pub extern "C" fn ovr_HideDesktopWindow(_session: ovrSession, _windowHandle: u32) -> ovrResult {
    latch(ShimError::Unsupported("desktop window"))
}

#[no_mangle]
pub extern "C" fn ovr_GetHybridInputFocus(
    _session: ovrSession,
    _controllerType: ovrControllerType,
    _outState: *mut std::ffi::c_void,
) -> ovrResult {
    latch(ShimError::Unsupported("hybrid input focus"))
}

#[no_mangle]
pub extern "C" fn ovr_ShowAvatarHands(_session: ovrSession, _showHands: ovrBool) -> ovrResult {
    latch(ShimError::Unsupported("avatar hands"))
}

#[no_mangle]
pub extern "C" fn ovr_ShowKeyboard() -> ovrResult {
    latch(ShimError::Unsupported("keyboard overlay"))
}

#[no_mangle]
pub extern "C" fn ovr_EnableHybridRaycast() -> ovrResult {
    latch(ShimError::Unsupported("hybrid raycast"))
}

#[no_mangle]
pub extern "C" fn ovr_QueryDistortion() -> ovrResult {
    latch(ShimError::Unsupported("distortion query"))
}

#[no_mangle]
pub extern "C" fn ovr_GetHmdColorDesc(_session: ovrSession) -> ovrHmdColorDesc {
    ovrHmdColorDesc {
        ColorSpace: ovrColorSpace_Unknown,
        pad0: [0; 4],
    }
}

#[no_mangle]
pub extern "C" fn ovr_SetClientColorDesc(
    _session: ovrSession,
    _colorDesc: *const ovrHmdColorDesc,
) -> ovrResult {
    latch(ShimError::Unsupported("client color profile"))
}
