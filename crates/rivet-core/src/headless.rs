//! Scripted runtime with no hardware behind it.
//!
//! Serves two purposes: the fallback backend when no real runtime is
//! installed, and the harness every test drives. Events are queued through
//! a [`HeadlessHandle`], calls are recorded in order, and frame timing
//! advances by a fixed synthetic period.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::backend::{
    ChainCreateInfo, ChainHandle, CompositionLayer, FrameTiming, ReferenceSpace, Runtime,
    RuntimeCaps, RuntimeError, RuntimeEvent, RuntimeResult, SpaceHandle, SpaceLocation,
    ViewConfig, ViewPose, VisibilityMask, VisibilityMaskType,
};
use crate::types::{FovPort, Posef, Quatf, Sizei, Vector2f, Vector3f};

const ERR_VALIDATION: i32 = -1;
const ERR_TIME_UNSUPPORTED: i32 = -2;
const ERR_BOUNDS_UNAVAILABLE: i32 = -3;

/// One backend call, in invocation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordedCall {
    WaitFrame,
    BeginFrame,
    EndFrame { layers: usize },
    AcquireImage(ChainHandle),
    WaitImage(ChainHandle),
    ReleaseImage(ChainHandle),
    CreateSwapchain(ChainHandle),
    DestroySwapchain(ChainHandle),
    CreateSpace(ReferenceSpace),
    DestroySpace(SpaceHandle),
}

struct HeadlessChain {
    length: u32,
    current: u32,
    acquired: bool,
    static_image: bool,
}

struct HeadlessState {
    caps: RuntimeCaps,
    view_configs: [ViewConfig; 2],
    events: VecDeque<RuntimeEvent>,
    calls: Vec<RecordedCall>,
    last_layers: Vec<CompositionLayer>,
    spaces: HashMap<u64, (ReferenceSpace, Posef)>,
    chains: HashMap<u64, HeadlessChain>,
    next_handle: u64,
    head_pose: Posef,
    head_orientation_valid: bool,
    head_position_valid: bool,
    ipd: f32,
    /// Outward yaw of each eye, in radians.
    eye_cant: f32,
    stage_bounds: Option<Vector2f>,
    now: i64,
    period: i64,
    chain_length: u32,
    fail_next_acquire: bool,
    fail_time_conversion: bool,
}

impl HeadlessState {
    fn space_in_runtime(&self, space: SpaceHandle) -> RuntimeResult<Posef> {
        let (kind, pose) = self
            .spaces
            .get(&space.0)
            .ok_or_else(|| RuntimeError::new(ERR_VALIDATION, "unknown space handle"))?;
        Ok(match kind {
            ReferenceSpace::View => self.head_pose,
            ReferenceSpace::Local | ReferenceSpace::Stage => *pose,
        })
    }
}

pub struct HeadlessRuntime {
    state: Arc<Mutex<HeadlessState>>,
}

/// Control surface shared with tests; clones refer to the same runtime.
#[derive(Clone)]
pub struct HeadlessHandle {
    state: Arc<Mutex<HeadlessState>>,
}

fn lock(state: &Arc<Mutex<HeadlessState>>) -> MutexGuard<'_, HeadlessState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Default for HeadlessRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessRuntime {
    pub fn new() -> Self {
        let fov = FovPort::new(1.0, 1.0, 1.0, 1.0);
        let max_fov = FovPort::new(1.3, 1.3, 1.3, 1.3);
        let view = ViewConfig {
            recommended_extent: Sizei::new(1440, 1600),
            recommended_fov: fov,
            max_fov,
        };
        let state = HeadlessState {
            caps: RuntimeCaps {
                composition_depth: true,
                composition_cylinder: true,
                composition_cube: true,
                visibility_mask: true,
                orientation_tracking: true,
                position_tracking: true,
                opengl: false,
            },
            view_configs: [view, view],
            events: VecDeque::new(),
            calls: Vec::new(),
            last_layers: Vec::new(),
            spaces: HashMap::new(),
            chains: HashMap::new(),
            next_handle: 1,
            head_pose: Posef::IDENTITY,
            head_orientation_valid: true,
            head_position_valid: true,
            ipd: 0.064,
            eye_cant: 0.0,
            stage_bounds: Some(Vector2f::new(3.0, 3.0)),
            now: 0,
            period: 11_111_111,
            chain_length: 3,
            fail_next_acquire: false,
            fail_time_conversion: false,
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn handle(&self) -> HeadlessHandle {
        HeadlessHandle {
            state: Arc::clone(&self.state),
        }
    }
}

impl HeadlessHandle {
    pub fn push_event(&self, event: RuntimeEvent) {
        lock(&self.state).events.push_back(event);
    }

    pub fn set_head_pose(&self, pose: Posef) {
        lock(&self.state).head_pose = pose;
    }

    pub fn set_head_validity(&self, orientation: bool, position: bool) {
        let mut state = lock(&self.state);
        state.head_orientation_valid = orientation;
        state.head_position_valid = position;
    }

    /// Cant each eye outward by `radians`, as canted-display headsets do.
    pub fn set_eye_cant(&self, radians: f32) {
        lock(&self.state).eye_cant = radians;
    }

    pub fn set_stage_bounds(&self, bounds: Option<Vector2f>) {
        lock(&self.state).stage_bounds = bounds;
    }

    pub fn set_opengl(&self, opengl: bool) {
        lock(&self.state).caps.opengl = opengl;
    }

    pub fn set_depth_supported(&self, supported: bool) {
        lock(&self.state).caps.composition_depth = supported;
    }

    pub fn fail_next_acquire(&self) {
        lock(&self.state).fail_next_acquire = true;
    }

    pub fn fail_time_conversion(&self, fail: bool) {
        lock(&self.state).fail_time_conversion = fail;
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.state).calls.clone()
    }

    pub fn clear_calls(&self) {
        lock(&self.state).calls.clear();
    }

    /// Layers submitted by the most recent end-frame.
    pub fn last_layers(&self) -> Vec<CompositionLayer> {
        lock(&self.state).last_layers.clone()
    }

    pub fn predicted_period(&self) -> i64 {
        lock(&self.state).period
    }
}

impl Runtime for HeadlessRuntime {
    fn caps(&self) -> RuntimeCaps {
        lock(&self.state).caps
    }

    fn runtime_name(&self) -> String {
        "Headless".to_string()
    }

    fn view_configs(&self) -> [ViewConfig; 2] {
        lock(&self.state).view_configs
    }

    fn poll_event(&mut self) -> RuntimeResult<Option<RuntimeEvent>> {
        Ok(lock(&self.state).events.pop_front())
    }

    fn wait_frame(&mut self) -> RuntimeResult<FrameTiming> {
        let mut state = lock(&self.state);
        state.now += state.period;
        state.calls.push(RecordedCall::WaitFrame);
        Ok(FrameTiming {
            predicted_display_time: state.now,
            predicted_display_period: state.period,
        })
    }

    fn begin_frame(&mut self) -> RuntimeResult<()> {
        lock(&self.state).calls.push(RecordedCall::BeginFrame);
        Ok(())
    }

    fn end_frame(&mut self, _display_time: i64, layers: &[CompositionLayer]) -> RuntimeResult<()> {
        let mut state = lock(&self.state);
        state.calls.push(RecordedCall::EndFrame {
            layers: layers.len(),
        });
        state.last_layers = layers.to_vec();
        Ok(())
    }

    fn create_reference_space(
        &mut self,
        kind: ReferenceSpace,
        pose_in_reference: Posef,
    ) -> RuntimeResult<SpaceHandle> {
        let mut state = lock(&self.state);
        let handle = state.next_handle;
        state.next_handle += 1;
        state.spaces.insert(handle, (kind, pose_in_reference));
        state.calls.push(RecordedCall::CreateSpace(kind));
        Ok(SpaceHandle(handle))
    }

    fn destroy_space(&mut self, space: SpaceHandle) -> RuntimeResult<()> {
        let mut state = lock(&self.state);
        state
            .spaces
            .remove(&space.0)
            .ok_or_else(|| RuntimeError::new(ERR_VALIDATION, "unknown space handle"))?;
        state.calls.push(RecordedCall::DestroySpace(space));
        Ok(())
    }

    fn locate_space(
        &mut self,
        space: SpaceHandle,
        base: SpaceHandle,
        _time: i64,
    ) -> RuntimeResult<SpaceLocation> {
        let state = lock(&self.state);
        let target = state.space_in_runtime(space)?;
        let base_pose = state.space_in_runtime(base)?;
        Ok(SpaceLocation {
            pose: base_pose.inverse() * target,
            orientation_valid: state.head_orientation_valid,
            position_valid: state.head_position_valid,
        })
    }

    fn locate_views(&mut self, base: SpaceHandle, _time: i64) -> RuntimeResult<[ViewPose; 2]> {
        let state = lock(&self.state);
        let base_pose = state.space_in_runtime(base)?;
        let head = base_pose.inverse() * state.head_pose;
        let mut views = [ViewPose::default(), ViewPose::default()];
        for (i, view) in views.iter_mut().enumerate() {
            let sign = if i == 0 { -1.0 } else { 1.0 };
            let offset = Posef::new(
                Quatf::rotation_y(-sign * state.eye_cant),
                Vector3f::new(sign * state.ipd * 0.5, 0.0, 0.0),
            );
            view.pose = head * offset;
            view.fov = state.view_configs[i].recommended_fov;
        }
        Ok(views)
    }

    fn create_swapchain(&mut self, info: &ChainCreateInfo) -> RuntimeResult<(ChainHandle, u32)> {
        let mut state = lock(&self.state);
        let handle = state.next_handle;
        state.next_handle += 1;
        let length = if info.static_image {
            1
        } else {
            state.chain_length
        };
        state.chains.insert(
            handle,
            HeadlessChain {
                length,
                current: 0,
                // The graphics binding acquires the first image before
                // handing the chain to the client.
                acquired: true,
                static_image: info.static_image,
            },
        );
        state.calls.push(RecordedCall::CreateSwapchain(ChainHandle(handle)));
        Ok((ChainHandle(handle), length))
    }

    fn destroy_swapchain(&mut self, chain: ChainHandle) -> RuntimeResult<()> {
        let mut state = lock(&self.state);
        state
            .chains
            .remove(&chain.0)
            .ok_or_else(|| RuntimeError::new(ERR_VALIDATION, "unknown chain handle"))?;
        state.calls.push(RecordedCall::DestroySwapchain(chain));
        Ok(())
    }

    fn acquire_image(&mut self, chain: ChainHandle) -> RuntimeResult<u32> {
        let mut state = lock(&self.state);
        if state.fail_next_acquire {
            state.fail_next_acquire = false;
            return Err(RuntimeError::new(ERR_VALIDATION, "scripted acquire failure"));
        }
        let entry = state
            .chains
            .get_mut(&chain.0)
            .ok_or_else(|| RuntimeError::new(ERR_VALIDATION, "unknown chain handle"))?;
        if entry.acquired {
            return Err(RuntimeError::new(ERR_VALIDATION, "image already acquired"));
        }
        entry.current = (entry.current + 1) % entry.length;
        entry.acquired = true;
        let index = entry.current;
        state.calls.push(RecordedCall::AcquireImage(chain));
        Ok(index)
    }

    fn wait_image(&mut self, chain: ChainHandle) -> RuntimeResult<()> {
        let mut state = lock(&self.state);
        let entry = state
            .chains
            .get_mut(&chain.0)
            .ok_or_else(|| RuntimeError::new(ERR_VALIDATION, "unknown chain handle"))?;
        if !entry.acquired {
            return Err(RuntimeError::new(ERR_VALIDATION, "no image acquired"));
        }
        state.calls.push(RecordedCall::WaitImage(chain));
        Ok(())
    }

    fn release_image(&mut self, chain: ChainHandle) -> RuntimeResult<()> {
        let mut state = lock(&self.state);
        let entry = state
            .chains
            .get_mut(&chain.0)
            .ok_or_else(|| RuntimeError::new(ERR_VALIDATION, "unknown chain handle"))?;
        if !entry.acquired && !entry.static_image {
            return Err(RuntimeError::new(ERR_VALIDATION, "no image to release"));
        }
        entry.acquired = false;
        state.calls.push(RecordedCall::ReleaseImage(chain));
        Ok(())
    }

    fn stage_bounds(&mut self) -> RuntimeResult<Vector2f> {
        lock(&self.state)
            .stage_bounds
            .ok_or_else(|| RuntimeError::new(ERR_BOUNDS_UNAVAILABLE, "stage bounds unavailable"))
    }

    fn time_to_seconds(&mut self, time: i64) -> RuntimeResult<f64> {
        let state = lock(&self.state);
        if state.fail_time_conversion {
            return Err(RuntimeError::new(
                ERR_TIME_UNSUPPORTED,
                "time conversion unavailable",
            ));
        }
        Ok(time as f64 * 1e-9)
    }

    fn visibility_mask(
        &mut self,
        _view_index: u32,
        _mask_type: VisibilityMaskType,
    ) -> RuntimeResult<VisibilityMask> {
        Ok(VisibilityMask {
            vertices: vec![
                Vector2f::new(0.0, 0.0),
                Vector2f::new(1.0, 0.0),
                Vector2f::new(1.0, 1.0),
                Vector2f::new(0.0, 1.0),
            ],
            indices: vec![0, 1, 2, 0, 2, 3],
        })
    }
}
