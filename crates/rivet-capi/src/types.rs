//! Binary-compatible legacy structures and constants.
//!
//! Layouts follow the current SDK headers; clients compiled against older
//! headers are handled by the parser in `parse` and by truncated writes in
//! the entry points, never by alternate struct definitions.

use std::ffi::{c_char, c_int, c_uint, c_void};

use rivet_core::types::{FovPort, Posef, Quatf, Recti, Sizei, Vector2f, Vector3f};

pub type ovrBool = c_char;
pub const ovrTrue: ovrBool = 1;
pub const ovrFalse: ovrBool = 0;

pub type ovrResult = i32;

pub const ovrSuccess: ovrResult = 0;
pub const ovrSuccess_NotVisible: ovrResult = 1000;

pub const ovrError_MemoryAllocationFailure: ovrResult = -1000;
pub const ovrError_InvalidSession: ovrResult = -1002;
pub const ovrError_Timeout: ovrResult = -1003;
pub const ovrError_NotInitialized: ovrResult = -1004;
pub const ovrError_InvalidParameter: ovrResult = -1005;
pub const ovrError_ServiceError: ovrResult = -1006;
pub const ovrError_NoHmd: ovrResult = -1007;
pub const ovrError_Unsupported: ovrResult = -1009;
pub const ovrError_InvalidHeadsetOrientation: ovrResult = -1011;
pub const ovrError_InvalidOperation: ovrResult = -1015;
pub const ovrError_NoExternalCameraInfo: ovrResult = -1017;
pub const ovrError_RuntimeException: ovrResult = -7000;

pub fn OVR_SUCCESS(result: ovrResult) -> bool {
    result >= 0
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ovrVector2i {
    pub x: c_int,
    pub y: c_int,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ovrSizei {
    pub w: c_int,
    pub h: c_int,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ovrRecti {
    pub Pos: ovrVector2i,
    pub Size: ovrSizei,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ovrQuatf {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for ovrQuatf {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            w: 1.0,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ovrVector2f {
    pub x: f32,
    pub y: f32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ovrVector3f {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ovrPosef {
    pub Orientation: ovrQuatf,
    pub Position: ovrVector3f,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ovrPoseStatef {
    pub ThePose: ovrPosef,
    pub AngularVelocity: ovrVector3f,
    pub LinearVelocity: ovrVector3f,
    pub AngularAcceleration: ovrVector3f,
    pub LinearAcceleration: ovrVector3f,
    pub pad0: [c_char; 4],
    pub TimeInSeconds: f64,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ovrFovPort {
    pub UpTan: f32,
    pub DownTan: f32,
    pub LeftTan: f32,
    pub RightTan: f32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ovrMatrix4f {
    pub M: [[f32; 4]; 4],
}

// --- headset -----------------------------------------------------------

pub type ovrHmdType = i32;
pub const ovrHmd_None: ovrHmdType = 0;
pub const ovrHmd_CV1: ovrHmdType = 7;
pub const ovrHmd_RiftS: ovrHmdType = 14;

pub const ovrTrackingCap_Orientation: c_uint = 0x0010;
pub const ovrTrackingCap_MagYawCorrection: c_uint = 0x0020;
pub const ovrTrackingCap_Position: c_uint = 0x0040;

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ovrHmdDesc {
    pub Type: ovrHmdType,
    pub pad0: [c_char; 4],
    pub ProductName: [c_char; 64],
    pub Manufacturer: [c_char; 64],
    pub VendorId: i16,
    pub ProductId: i16,
    pub SerialNumber: [c_char; 24],
    pub FirmwareMajor: i16,
    pub FirmwareMinor: i16,
    pub AvailableHmdCaps: c_uint,
    pub DefaultHmdCaps: c_uint,
    pub AvailableTrackingCaps: c_uint,
    pub DefaultTrackingCaps: c_uint,
    pub DefaultEyeFov: [ovrFovPort; 2],
    pub MaxEyeFov: [ovrFovPort; 2],
    pub Resolution: ovrSizei,
    pub DisplayRefreshRate: f32,
    pub pad1: [c_char; 4],
}

impl Default for ovrHmdDesc {
    fn default() -> Self {
        // Arrays above 32 entries have no derived Default.
        unsafe { std::mem::zeroed() }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ovrTrackerDesc {
    pub FrustumHFovInRadians: f32,
    pub FrustumVFovInRadians: f32,
    pub FrustumNearZInMeters: f32,
    pub FrustumFarZInMeters: f32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ovrTrackerPose {
    pub TrackerFlags: c_uint,
    pub Pose: ovrPosef,
    pub LeveledPose: ovrPosef,
    pub pad0: [c_char; 4],
}

pub const ovrTracker_Connected: c_uint = 0x0020;
pub const ovrTracker_PoseTracked: c_uint = 0x0004;

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ovrTrackingState {
    pub HeadPose: ovrPoseStatef,
    pub StatusFlags: c_uint,
    pub HandPoses: [ovrPoseStatef; 2],
    pub HandStatusFlags: [c_uint; 2],
    pub CalibratedOrigin: ovrPosef,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ovrSessionStatus {
    pub IsVisible: ovrBool,
    pub HmdPresent: ovrBool,
    pub HmdMounted: ovrBool,
    pub DisplayLost: ovrBool,
    pub ShouldQuit: ovrBool,
    pub ShouldRecenter: ovrBool,
    pub HasInputFocus: ovrBool,
    pub OverlayPresent: ovrBool,
    pub DepthRequested: ovrBool,
}

pub type ovrTrackingOrigin = i32;
pub const ovrTrackingOrigin_EyeLevel: ovrTrackingOrigin = 0;
pub const ovrTrackingOrigin_FloorLevel: ovrTrackingOrigin = 1;

// --- initialization ----------------------------------------------------

pub type ovrLogCallback =
    Option<unsafe extern "C" fn(userData: usize, level: c_int, message: *const c_char)>;

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ovrInitParams {
    pub Flags: u32,
    pub RequestedMinorVersion: u32,
    pub LogCallback: ovrLogCallback,
    pub UserData: usize,
    pub ConnectionTimeoutMS: u32,
    pub pad0: [c_char; 4],
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct ovrErrorInfo {
    pub Result: ovrResult,
    pub ErrorString: [c_char; 512],
}

impl Default for ovrErrorInfo {
    fn default() -> Self {
        unsafe { std::mem::zeroed() }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ovrGraphicsLuid {
    pub Reserved: [c_char; 8],
}

// --- input -------------------------------------------------------------

pub type ovrControllerType = u32;
pub const ovrControllerType_Touch: ovrControllerType = 0x0003;
pub const ovrControllerType_XBox: ovrControllerType = 0x0010;
pub const ovrControllerType_Remote: ovrControllerType = 0x0100;

pub type ovrTrackedDeviceType = u32;
pub const ovrTrackedDevice_HMD: ovrTrackedDeviceType = 0x0001;
pub const ovrTrackedDevice_LTouch: ovrTrackedDeviceType = 0x0002;
pub const ovrTrackedDevice_RTouch: ovrTrackedDeviceType = 0x0004;
pub const ovrTrackedDevice_All: ovrTrackedDeviceType = 0xFFFF;

pub const ovrHand_Count: usize = 2;

/// Pre-1.7 input state.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ovrInputState1 {
    pub TimeInSeconds: f64,
    pub Buttons: c_uint,
    pub Touches: c_uint,
    pub IndexTrigger: [f32; ovrHand_Count],
    pub HandTrigger: [f32; ovrHand_Count],
    pub Thumbstick: [ovrVector2f; ovrHand_Count],
    pub ControllerType: ovrControllerType,
}

/// Pre-1.11 input state.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ovrInputState2 {
    pub TimeInSeconds: f64,
    pub Buttons: c_uint,
    pub Touches: c_uint,
    pub IndexTrigger: [f32; ovrHand_Count],
    pub HandTrigger: [f32; ovrHand_Count],
    pub Thumbstick: [ovrVector2f; ovrHand_Count],
    pub ControllerType: ovrControllerType,
    pub IndexTriggerNoDeadzone: [f32; ovrHand_Count],
    pub HandTriggerNoDeadzone: [f32; ovrHand_Count],
    pub ThumbstickNoDeadzone: [ovrVector2f; ovrHand_Count],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ovrInputState {
    pub TimeInSeconds: f64,
    pub Buttons: c_uint,
    pub Touches: c_uint,
    pub IndexTrigger: [f32; ovrHand_Count],
    pub HandTrigger: [f32; ovrHand_Count],
    pub Thumbstick: [ovrVector2f; ovrHand_Count],
    pub ControllerType: ovrControllerType,
    pub IndexTriggerNoDeadzone: [f32; ovrHand_Count],
    pub HandTriggerNoDeadzone: [f32; ovrHand_Count],
    pub ThumbstickNoDeadzone: [ovrVector2f; ovrHand_Count],
    pub IndexTriggerRaw: [f32; ovrHand_Count],
    pub HandTriggerRaw: [f32; ovrHand_Count],
    pub ThumbstickRaw: [ovrVector2f; ovrHand_Count],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ovrTouchHapticsDesc {
    pub SampleRateHz: c_int,
    pub SampleSizeInBytes: c_int,
    pub QueueMinSizeToAvoidStarvation: c_int,
    pub SubmitMinSamples: c_int,
    pub SubmitMaxSamples: c_int,
    pub SubmitOptimalSamples: c_int,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ovrHapticsBuffer {
    pub Samples: *const c_void,
    pub SamplesCount: c_int,
    pub SubmitMode: i32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ovrHapticsPlaybackState {
    pub RemainingQueueSpace: c_int,
    pub SamplesQueued: c_int,
}

// --- boundary ----------------------------------------------------------

pub type ovrBoundaryType = i32;
pub const ovrBoundary_Outer: ovrBoundaryType = 0x0001;
pub const ovrBoundary_PlayArea: ovrBoundaryType = 0x0100;

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ovrBoundaryTestResult {
    pub IsTriggering: ovrBool,
    pub ClosestDistance: f32,
    pub ClosestPoint: ovrVector3f,
    pub ClosestPointNormal: ovrVector3f,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ovrBoundaryLookAndFeel {
    pub Color: [f32; 4],
}

// --- textures ----------------------------------------------------------

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ovrTextureSwapChainDesc {
    pub Type: i32,
    pub Format: i32,
    pub ArraySize: c_int,
    pub Width: c_int,
    pub Height: c_int,
    pub MipLevels: c_int,
    pub SampleCount: c_int,
    pub StaticImage: ovrBool,
    pub MiscFlags: c_uint,
    pub BindFlags: c_uint,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ovrMirrorTextureDesc {
    pub Format: i32,
    pub Width: c_int,
    pub Height: c_int,
    pub MiscFlags: c_uint,
}

// --- rendering ---------------------------------------------------------

pub type ovrEyeType = i32;
pub const ovrEye_Left: ovrEyeType = 0;
pub const ovrEye_Right: ovrEyeType = 1;
pub const ovrEye_Count: usize = 2;

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ovrEyeRenderDesc {
    pub Eye: ovrEyeType,
    pub Fov: ovrFovPort,
    pub DistortedViewport: ovrRecti,
    pub PixelsPerTanAngleAtCenter: ovrVector2f,
    pub HmdToEyePose: ovrPosef,
}

/// Pre-1.17 render descriptor with an offset-only eye transform.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ovrEyeRenderDesc1 {
    pub Eye: ovrEyeType,
    pub Fov: ovrFovPort,
    pub DistortedViewport: ovrRecti,
    pub PixelsPerTanAngleAtCenter: ovrVector2f,
    pub HmdToEyeOffset: ovrVector3f,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ovrViewScaleDesc {
    pub HmdToEyePose: [ovrPosef; 2],
    pub HmdSpaceToWorldScaleInMeters: f32,
}

/// Pre-view-scale variant passed to the oldest submit entry point.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ovrViewScaleDesc1 {
    pub HmdToEyeOffset: [ovrVector3f; 2],
    pub HmdSpaceToWorldScaleInMeters: f32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ovrTimewarpProjectionDesc {
    pub Projection22: f32,
    pub Projection23: f32,
    pub Projection32: f32,
}

// --- layers ------------------------------------------------------------

pub type ovrLayerType = i32;
pub const ovrLayerType_Disabled: ovrLayerType = 0;
pub const ovrLayerType_EyeFov: ovrLayerType = 1;
pub const ovrLayerType_EyeFovDepth: ovrLayerType = 2;
pub const ovrLayerType_Quad: ovrLayerType = 3;
pub const ovrLayerType_EyeMatrix: ovrLayerType = 5;
pub const ovrLayerType_Cylinder: ovrLayerType = 8;
pub const ovrLayerType_Cube: ovrLayerType = 10;

pub const ovrLayerFlag_HighQuality: c_uint = 0x01;
pub const ovrLayerFlag_TextureOriginAtBottomLeft: c_uint = 0x02;
pub const ovrLayerFlag_HeadLocked: c_uint = 0x04;

/// Size of the reserved block 1.25 added to the layer header.
pub const LAYER_HEADER_RESERVED_BYTES: usize = 128;

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ovrLayerHeader {
    pub Type: ovrLayerType,
    pub Flags: c_uint,
    pub Reserved: [c_char; LAYER_HEADER_RESERVED_BYTES],
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ovrLayerEyeFov {
    pub Header: ovrLayerHeader,
    pub ColorTexture: [ovrTextureSwapChain; 2],
    pub Viewport: [ovrRecti; 2],
    pub Fov: [ovrFovPort; 2],
    pub RenderPose: [ovrPosef; 2],
    pub SensorSampleTime: f64,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ovrLayerEyeFovDepth {
    pub Header: ovrLayerHeader,
    pub ColorTexture: [ovrTextureSwapChain; 2],
    pub Viewport: [ovrRecti; 2],
    pub Fov: [ovrFovPort; 2],
    pub RenderPose: [ovrPosef; 2],
    pub SensorSampleTime: f64,
    pub DepthTexture: [ovrTextureSwapChain; 2],
    pub ProjectionDesc: ovrTimewarpProjectionDesc,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ovrLayerEyeMatrix {
    pub Header: ovrLayerHeader,
    pub ColorTexture: [ovrTextureSwapChain; 2],
    pub Viewport: [ovrRecti; 2],
    pub RenderPose: [ovrPosef; 2],
    pub Matrix: [ovrMatrix4f; 2],
    pub SensorSampleTime: f64,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ovrLayerQuad {
    pub Header: ovrLayerHeader,
    pub ColorTexture: ovrTextureSwapChain,
    pub Viewport: ovrRecti,
    pub QuadPoseCenter: ovrPosef,
    pub QuadSize: ovrVector2f,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ovrLayerCylinder {
    pub Header: ovrLayerHeader,
    pub ColorTexture: ovrTextureSwapChain,
    pub Viewport: ovrRecti,
    pub CylinderPoseCenter: ovrPosef,
    pub CylinderRadius: f32,
    pub CylinderAngle: f32,
    pub CylinderAspectRatio: f32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ovrLayerCube {
    pub Header: ovrLayerHeader,
    pub Orientation: ovrQuatf,
    pub CubeMapTexture: ovrTextureSwapChain,
}

// --- fov stencil -------------------------------------------------------

pub type ovrFovStencilType = i32;
pub const ovrFovStencil_HiddenArea: ovrFovStencilType = 0;
pub const ovrFovStencil_VisibleArea: ovrFovStencilType = 1;
pub const ovrFovStencil_BorderLine: ovrFovStencilType = 2;
pub const ovrFovStencil_VisibleRectangle: ovrFovStencilType = 3;

pub const ovrFovStencilFlag_MeshOriginAtBottomLeft: c_uint = 0x01;

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ovrFovStencilDesc {
    pub StencilType: ovrFovStencilType,
    pub StencilFlags: c_uint,
    pub Eye: ovrEyeType,
    pub FovPort: ovrFovPort,
    pub HmdToEyeRotation: ovrQuatf,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ovrFovStencilMeshBuffer {
    pub AllocVertexCount: c_int,
    pub UsedVertexCount: c_int,
    pub VertexBuffer: *mut ovrVector2f,
    pub AllocIndexCount: c_int,
    pub UsedIndexCount: c_int,
    pub IndexBuffer: *mut u16,
}

// --- misc --------------------------------------------------------------

pub type ovrColorSpace = i32;
pub const ovrColorSpace_Unknown: ovrColorSpace = 0;

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ovrHmdColorDesc {
    pub ColorSpace: ovrColorSpace,
    pub pad0: [c_char; 4],
}

#[repr(C)]
pub struct ovrExternalCamera {
    _private: [u8; 0],
}

#[repr(C)]
pub struct ovrCameraIntrinsics {
    _private: [u8; 0],
}

#[repr(C)]
pub struct ovrCameraExtrinsics {
    _private: [u8; 0],
}

pub type ovrExtensions = i32;
pub type ovrHmdCaps = c_uint;

/// Opaque chain handle handed to the client; resolves through the owning
/// session's registry. The creation descriptor is kept verbatim so the
/// query entry points can echo it.
#[repr(C)]
pub struct ovrTextureSwapChainData {
    pub(crate) session: *mut crate::registry::SessionShell,
    pub(crate) chain: rivet_core::ChainHandle,
    pub(crate) desc: ovrTextureSwapChainDesc,
}

pub type ovrTextureSwapChain = *mut ovrTextureSwapChainData;

#[repr(C)]
pub struct ovrMirrorTextureData {
    pub(crate) session: *mut crate::registry::SessionShell,
    pub(crate) mirror: rivet_core::swapchain::MirrorTexture,
}

pub type ovrMirrorTexture = *mut ovrMirrorTextureData;

pub type ovrSession = *mut crate::registry::SessionShell;

// --- conversions -------------------------------------------------------

impl From<ovrVector3f> for Vector3f {
    fn from(v: ovrVector3f) -> Self {
        Vector3f::new(v.x, v.y, v.z)
    }
}

impl From<Vector3f> for ovrVector3f {
    fn from(v: Vector3f) -> Self {
        ovrVector3f {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

impl From<ovrVector2f> for Vector2f {
    fn from(v: ovrVector2f) -> Self {
        Vector2f::new(v.x, v.y)
    }
}

impl From<Vector2f> for ovrVector2f {
    fn from(v: Vector2f) -> Self {
        ovrVector2f { x: v.x, y: v.y }
    }
}

impl From<ovrQuatf> for Quatf {
    fn from(q: ovrQuatf) -> Self {
        Quatf::new(q.x, q.y, q.z, q.w)
    }
}

impl From<Quatf> for ovrQuatf {
    fn from(q: Quatf) -> Self {
        ovrQuatf {
            x: q.x,
            y: q.y,
            z: q.z,
            w: q.w,
        }
    }
}

impl From<ovrPosef> for Posef {
    fn from(p: ovrPosef) -> Self {
        Posef::new(p.Orientation.into(), p.Position.into())
    }
}

impl From<Posef> for ovrPosef {
    fn from(p: Posef) -> Self {
        ovrPosef {
            Orientation: p.orientation.into(),
            Position: p.position.into(),
        }
    }
}

impl From<ovrFovPort> for FovPort {
    fn from(f: ovrFovPort) -> Self {
        FovPort::new(f.UpTan, f.DownTan, f.LeftTan, f.RightTan)
    }
}

impl From<FovPort> for ovrFovPort {
    fn from(f: FovPort) -> Self {
        ovrFovPort {
            UpTan: f.up_tan,
            DownTan: f.down_tan,
            LeftTan: f.left_tan,
            RightTan: f.right_tan,
        }
    }
}

impl From<ovrRecti> for Recti {
    fn from(r: ovrRecti) -> Self {
        Recti::new(r.Pos.x, r.Pos.y, r.Size.w, r.Size.h)
    }
}

impl From<Recti> for ovrRecti {
    fn from(r: Recti) -> Self {
        ovrRecti {
            Pos: ovrVector2i {
                x: r.pos.x,
                y: r.pos.y,
            },
            Size: ovrSizei {
                w: r.size.w,
                h: r.size.h,
            },
        }
    }
}

impl From<Sizei> for ovrSizei {
    fn from(s: Sizei) -> Self {
        ovrSizei { w: s.w, h: s.h }
    }
}

/// Copy a Rust string into a fixed C char array, always nul-terminated.
pub(crate) fn write_cstr(dst: &mut [c_char], src: &str) {
    let bytes = src.as_bytes();
    let len = bytes.len().min(dst.len().saturating_sub(1));
    for (i, &b) in bytes[..len].iter().enumerate() {
        dst[i] = b as c_char;
    }
    dst[len] = 0;
}
