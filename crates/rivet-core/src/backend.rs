//! Seam to the target runtime.
//!
//! Everything the core needs from the underlying runtime is expressed
//! through [`Runtime`]; the production implementation lives in a separate
//! crate and the scripted [`crate::headless::HeadlessRuntime`] drives the
//! tests. All values cross this boundary in core types, so the core never
//! sees a runtime structure.

use thiserror::Error;

use crate::types::{Fov, FovPort, Posef, Quatf, Recti, Sizei, Vector2f};

/// Opaque reference-space handle minted by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpaceHandle(pub u64);

/// Opaque swapchain handle minted by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceSpace {
    View,
    Local,
    Stage,
}

/// Session lifecycle states reported by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Ready,
    Synchronized,
    Visible,
    Focused,
    Stopping,
    LossPending,
    Exiting,
}

#[derive(Debug, Clone, Copy)]
pub enum RuntimeEvent {
    SessionState(SessionState),
    InstanceLossPending,
    ReferenceSpaceChangePending {
        space: ReferenceSpace,
        pose_valid: bool,
        pose_in_previous_space: Posef,
    },
    /// Anything the frontend does not interpret.
    Other,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FrameTiming {
    pub predicted_display_time: i64,
    pub predicted_display_period: i64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SpaceLocation {
    pub pose: Posef,
    pub orientation_valid: bool,
    pub position_valid: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ViewPose {
    pub pose: Posef,
    pub fov: FovPort,
}

/// Per-eye configuration the runtime recommends.
#[derive(Debug, Clone, Copy)]
pub struct ViewConfig {
    pub recommended_extent: Sizei,
    pub recommended_fov: FovPort,
    pub max_fov: FovPort,
}

/// Optional runtime capabilities the translator keys off.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeCaps {
    pub composition_depth: bool,
    pub composition_cylinder: bool,
    pub composition_cube: bool,
    pub visibility_mask: bool,
    pub orientation_tracking: bool,
    pub position_tracking: bool,
    /// The session's swapchains use a bottom-left image origin.
    pub opengl: bool,
}

/// Creation parameters for an image chain. Format and usage are opaque
/// values owned by the graphics binding.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChainCreateInfo {
    pub width: i32,
    pub height: i32,
    pub format: i64,
    pub mip_count: i32,
    pub sample_count: i32,
    pub array_size: i32,
    pub static_image: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityMaskType {
    HiddenTriangleMesh,
    VisibleTriangleMesh,
    LineLoop,
}

#[derive(Debug, Clone, Default)]
pub struct VisibilityMask {
    pub vertices: Vec<Vector2f>,
    pub indices: Vec<u32>,
}

/// Viewport into an image chain.
#[derive(Debug, Clone, Copy)]
pub struct SubImage {
    pub chain: ChainHandle,
    pub rect: Recti,
    pub array_index: u32,
}

/// Depth block chained onto a projection view for reprojection.
#[derive(Debug, Clone, Copy)]
pub struct DepthInfo {
    pub sub_image: SubImage,
    pub min_depth: f32,
    pub max_depth: f32,
    pub near_z: f32,
    pub far_z: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct ProjectionView {
    pub pose: Posef,
    pub fov: Fov,
    pub sub_image: SubImage,
    pub depth: Option<DepthInfo>,
}

/// A translated composition layer, ready for submission. Blend mode is
/// always texture-source-alpha and quads/cylinders are visible to both
/// eyes; the backend applies those constants.
#[derive(Debug, Clone)]
pub enum CompositionLayer {
    Projection {
        space: SpaceHandle,
        views: [ProjectionView; 2],
    },
    Quad {
        space: SpaceHandle,
        sub_image: SubImage,
        pose: Posef,
        size: Vector2f,
    },
    Cylinder {
        space: SpaceHandle,
        sub_image: SubImage,
        pose: Posef,
        radius: f32,
        central_angle: f32,
        aspect_ratio: f32,
    },
    Cube {
        space: SpaceHandle,
        chain: ChainHandle,
        orientation: Quatf,
    },
}

/// A runtime call failed; carries the raw result code for the last-error
/// latch.
#[derive(Debug, Clone, Error)]
#[error("{message} (result {code})")]
pub struct RuntimeError {
    pub code: i32,
    pub message: String,
}

impl RuntimeError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

pub type RuntimeResult<T> = std::result::Result<T, RuntimeError>;

pub trait Runtime: Send {
    fn caps(&self) -> RuntimeCaps;

    /// Human-readable runtime name, surfaced in the HMD descriptor.
    fn runtime_name(&self) -> String;

    fn view_configs(&self) -> [ViewConfig; 2];

    /// Pull the next pending event, or `None` when the queue is empty.
    fn poll_event(&mut self) -> RuntimeResult<Option<RuntimeEvent>>;

    /// Block until the runtime wants the next frame started.
    fn wait_frame(&mut self) -> RuntimeResult<FrameTiming>;

    fn begin_frame(&mut self) -> RuntimeResult<()>;

    fn end_frame(&mut self, display_time: i64, layers: &[CompositionLayer]) -> RuntimeResult<()>;

    fn create_reference_space(
        &mut self,
        kind: ReferenceSpace,
        pose_in_reference: Posef,
    ) -> RuntimeResult<SpaceHandle>;

    fn destroy_space(&mut self, space: SpaceHandle) -> RuntimeResult<()>;

    fn locate_space(
        &mut self,
        space: SpaceHandle,
        base: SpaceHandle,
        time: i64,
    ) -> RuntimeResult<SpaceLocation>;

    fn locate_views(&mut self, base: SpaceHandle, time: i64) -> RuntimeResult<[ViewPose; 2]>;

    /// Returns the new chain's handle and image count. The first image is
    /// acquired before the chain is handed out, so the client can render
    /// immediately.
    fn create_swapchain(&mut self, info: &ChainCreateInfo) -> RuntimeResult<(ChainHandle, u32)>;

    fn destroy_swapchain(&mut self, chain: ChainHandle) -> RuntimeResult<()>;

    fn acquire_image(&mut self, chain: ChainHandle) -> RuntimeResult<u32>;

    /// Zero-duration wait: polls whether the most recently acquired image
    /// is ready for rendering.
    fn wait_image(&mut self, chain: ChainHandle) -> RuntimeResult<()>;

    fn release_image(&mut self, chain: ChainHandle) -> RuntimeResult<()>;

    /// Width and depth of the stage bounds rectangle, if the runtime
    /// exposes one.
    fn stage_bounds(&mut self) -> RuntimeResult<Vector2f>;

    /// Convert a runtime timestamp to wall-clock seconds.
    fn time_to_seconds(&mut self, time: i64) -> RuntimeResult<f64>;

    fn visibility_mask(
        &mut self,
        view_index: u32,
        mask_type: VisibilityMaskType,
    ) -> RuntimeResult<VisibilityMask>;
}
