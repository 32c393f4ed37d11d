//! OpenXR implementation of the core runtime seam.
//!
//! The graphics binding creates the instance and the graphics-bound
//! session (that part is API-specific and lives with the texture code);
//! this crate drives everything after that: the event pump, the frame
//! phases, reference spaces, swapchain image flow and layer submission.
//!
//! The safe `openxr` wrappers are used wherever they fit. Frame
//! submission needs a heterogeneous layer list with chained depth blocks,
//! which the typed wrappers cannot express, so the end-frame call drops
//! to `xr::sys` structures over raw handles.

use std::collections::HashMap;
use std::ffi::c_void;
use std::ptr;

use openxr as xr;
use openxr::sys;

use rivet_core::backend::{
    ChainCreateInfo, ChainHandle, CompositionLayer, DepthInfo, FrameTiming, ReferenceSpace,
    Runtime, RuntimeCaps, RuntimeError, RuntimeEvent, RuntimeResult, SessionState, SpaceHandle,
    SpaceLocation, SubImage, ViewConfig, ViewPose, VisibilityMask, VisibilityMaskType,
};
use rivet_core::types::{Fov, FovPort, Posef, Quatf, Recti, Sizei, Vector2f, Vector3f};

fn xr_err(op: &'static str) -> impl Fn(sys::Result) -> RuntimeError {
    move |result| RuntimeError::new(result.into_raw(), format!("{op} failed: {result:?}"))
}

fn to_pose(pose: xr::Posef) -> Posef {
    Posef::new(
        Quatf::new(
            pose.orientation.x,
            pose.orientation.y,
            pose.orientation.z,
            pose.orientation.w,
        ),
        Vector3f::new(pose.position.x, pose.position.y, pose.position.z),
    )
}

fn from_pose(pose: Posef) -> xr::Posef {
    xr::Posef {
        orientation: xr::Quaternionf {
            x: pose.orientation.x,
            y: pose.orientation.y,
            z: pose.orientation.z,
            w: pose.orientation.w,
        },
        position: xr::Vector3f {
            x: pose.position.x,
            y: pose.position.y,
            z: pose.position.z,
        },
    }
}

fn from_fov(fov: Fov) -> xr::Fovf {
    xr::Fovf {
        angle_left: fov.angle_left,
        angle_right: fov.angle_right,
        angle_up: fov.angle_up,
        angle_down: fov.angle_down,
    }
}

fn fov_port_from_xr(fov: xr::Fovf) -> FovPort {
    FovPort::new(
        fov.angle_up.tan(),
        (-fov.angle_down).tan(),
        (-fov.angle_left).tan(),
        fov.angle_right.tan(),
    )
}

fn from_rect(rect: Recti) -> xr::Rect2Di {
    xr::Rect2Di {
        offset: xr::Offset2Di {
            x: rect.pos.x,
            y: rect.pos.y,
        },
        extent: xr::Extent2Di {
            width: rect.size.w,
            height: rect.size.h,
        },
    }
}

fn from_space_kind(kind: ReferenceSpace) -> xr::ReferenceSpaceType {
    match kind {
        ReferenceSpace::View => xr::ReferenceSpaceType::VIEW,
        ReferenceSpace::Local => xr::ReferenceSpaceType::LOCAL,
        ReferenceSpace::Stage => xr::ReferenceSpaceType::STAGE,
    }
}

/// Fallback per-eye frustum for runtimes without the
/// view-configuration-fov extension.
const DEFAULT_FOV: FovPort = FovPort {
    up_tan: 1.0,
    down_tan: 1.0,
    left_tan: 1.0,
    right_tan: 1.0,
};

/// Enumerate the stereo view configuration, chaining the
/// view-configuration-fov query onto each view when the extension is
/// enabled so the descriptor carries the runtime's real frusta. The safe
/// wrapper cannot express the chained structs, so this goes through the
/// raw entry point.
fn enumerate_view_configs(
    instance: &xr::Instance,
    system: xr::SystemId,
    query_fov: bool,
) -> RuntimeResult<[ViewConfig; 2]> {
    let fp = instance.fp();
    let mut count = 0u32;
    let result = unsafe {
        (fp.enumerate_view_configuration_views)(
            instance.as_raw(),
            system,
            xr::ViewConfigurationType::PRIMARY_STEREO,
            0,
            &mut count,
            ptr::null_mut(),
        )
    };
    if result.into_raw() < 0 {
        return Err(RuntimeError::new(
            result.into_raw(),
            format!("view configuration failed: {result:?}"),
        ));
    }
    if count < 2 {
        return Err(RuntimeError::new(
            sys::Result::ERROR_VALIDATION_FAILURE.into_raw(),
            "runtime reported fewer than two views",
        ));
    }

    let zero_fov = xr::Fovf {
        angle_left: 0.0,
        angle_right: 0.0,
        angle_up: 0.0,
        angle_down: 0.0,
    };
    let mut fovs = vec![
        sys::ViewConfigurationViewFovEPIC {
            ty: sys::ViewConfigurationViewFovEPIC::TYPE,
            next: ptr::null_mut(),
            recommended_fov: zero_fov,
            max_mutable_fov: zero_fov,
        };
        count as usize
    ];
    let mut views: Vec<sys::ViewConfigurationView> = Vec::with_capacity(count as usize);
    for fov in &mut fovs {
        views.push(sys::ViewConfigurationView {
            ty: sys::ViewConfigurationView::TYPE,
            next: if query_fov {
                fov as *mut sys::ViewConfigurationViewFovEPIC as *mut c_void
            } else {
                ptr::null_mut()
            },
            recommended_image_rect_width: 0,
            max_image_rect_width: 0,
            recommended_image_rect_height: 0,
            max_image_rect_height: 0,
            recommended_swapchain_sample_count: 0,
            max_swapchain_sample_count: 0,
        });
    }
    let result = unsafe {
        (fp.enumerate_view_configuration_views)(
            instance.as_raw(),
            system,
            xr::ViewConfigurationType::PRIMARY_STEREO,
            count,
            &mut count,
            views.as_mut_ptr(),
        )
    };
    if result.into_raw() < 0 {
        return Err(RuntimeError::new(
            result.into_raw(),
            format!("view configuration failed: {result:?}"),
        ));
    }

    Ok([0usize, 1].map(|i| {
        let (recommended_fov, max_fov) = if query_fov {
            (
                fov_port_from_xr(fovs[i].recommended_fov),
                fov_port_from_xr(fovs[i].max_mutable_fov),
            )
        } else {
            (DEFAULT_FOV, DEFAULT_FOV)
        };
        ViewConfig {
            recommended_extent: Sizei::new(
                views[i].recommended_image_rect_width as i32,
                views[i].recommended_image_rect_height as i32,
            ),
            recommended_fov,
            max_fov,
        }
    }))
}

pub struct OpenXrRuntime<G: xr::Graphics<Format = u32>> {
    instance: xr::Instance,
    session: xr::Session<G>,
    waiter: xr::FrameWaiter,
    stream: xr::FrameStream<G>,
    caps: RuntimeCaps,
    view_configs: [ViewConfig; 2],
    event_buffer: xr::EventDataBuffer,
    session_running: bool,
    spaces: HashMap<u64, xr::Space>,
    chains: HashMap<u64, xr::Swapchain<G>>,
    next_handle: u64,
}

impl<G: xr::Graphics<Format = u32>> OpenXrRuntime<G> {
    /// Wrap a graphics-bound session created by the binding layer.
    ///
    /// `enabled` is the extension set the instance was created with; it
    /// decides which optional layer types are submitted and whether the
    /// runtime's real per-eye frusta can be queried.
    pub fn from_session(
        instance: xr::Instance,
        system: xr::SystemId,
        session: xr::Session<G>,
        waiter: xr::FrameWaiter,
        stream: xr::FrameStream<G>,
        enabled: &xr::ExtensionSet,
        opengl: bool,
    ) -> RuntimeResult<Self> {
        let system_props = instance
            .system_properties(system)
            .map_err(xr_err("system properties"))?;
        let query_fov = enabled.epic_view_configuration_fov;
        if !query_fov {
            log::warn!("view-configuration-fov extension not enabled; using fallback frustum");
        }
        let view_configs = enumerate_view_configs(&instance, system, query_fov)?;

        let caps = RuntimeCaps {
            composition_depth: enabled.khr_composition_layer_depth,
            composition_cylinder: enabled.khr_composition_layer_cylinder,
            composition_cube: enabled.khr_composition_layer_cube,
            visibility_mask: enabled.khr_visibility_mask,
            orientation_tracking: system_props.tracking_properties.orientation_tracking,
            position_tracking: system_props.tracking_properties.position_tracking,
            opengl,
        };

        log::info!(
            "openxr runtime ready: {} ({}x{} per eye)",
            instance
                .properties()
                .map(|p| p.runtime_name)
                .unwrap_or_else(|_| "unknown".to_string()),
            view_configs[0].recommended_extent.w,
            view_configs[0].recommended_extent.h,
        );

        Ok(Self {
            instance,
            session,
            waiter,
            stream,
            caps,
            view_configs,
            event_buffer: xr::EventDataBuffer::new(),
            session_running: false,
            spaces: HashMap::new(),
            chains: HashMap::new(),
            next_handle: 1,
        })
    }

    fn space(&self, handle: SpaceHandle) -> RuntimeResult<&xr::Space> {
        self.spaces.get(&handle.0).ok_or_else(|| {
            RuntimeError::new(
                sys::Result::ERROR_HANDLE_INVALID.into_raw(),
                "unknown space handle",
            )
        })
    }

    fn chain(&mut self, handle: ChainHandle) -> RuntimeResult<&mut xr::Swapchain<G>> {
        self.chains.get_mut(&handle.0).ok_or_else(|| {
            RuntimeError::new(
                sys::Result::ERROR_HANDLE_INVALID.into_raw(),
                "unknown swapchain handle",
            )
        })
    }

    fn raw_space(&self, handle: SpaceHandle) -> RuntimeResult<sys::Space> {
        Ok(self.space(handle)?.as_raw())
    }

    fn raw_chain(&self, handle: ChainHandle) -> RuntimeResult<sys::Swapchain> {
        self.chains.get(&handle.0).map(|c| c.as_raw()).ok_or_else(|| {
            RuntimeError::new(
                sys::Result::ERROR_HANDLE_INVALID.into_raw(),
                "unknown swapchain handle",
            )
        })
    }

    fn sub_image(&self, sub: &SubImage) -> RuntimeResult<sys::SwapchainSubImage> {
        Ok(sys::SwapchainSubImage {
            swapchain: self.raw_chain(sub.chain)?,
            image_rect: from_rect(sub.rect),
            image_array_index: sub.array_index,
        })
    }

    fn depth_block(&self, depth: &DepthInfo) -> RuntimeResult<sys::CompositionLayerDepthInfoKHR> {
        Ok(sys::CompositionLayerDepthInfoKHR {
            ty: sys::CompositionLayerDepthInfoKHR::TYPE,
            next: ptr::null(),
            sub_image: self.sub_image(&depth.sub_image)?,
            min_depth: depth.min_depth,
            max_depth: depth.max_depth,
            near_z: depth.near_z,
            far_z: depth.far_z,
        })
    }
}

// OpenXR session/event/swapchain handles are opaque handles guarded by the
// runtime's own call discipline (the `Runtime` trait is never called
// concurrently on the same instance), so it is safe to move this type
// across threads even though its fields aren't auto-`Send`.
unsafe impl<G: xr::Graphics<Format = u32>> Send for OpenXrRuntime<G> {}

impl<G: xr::Graphics<Format = u32>> Runtime for OpenXrRuntime<G> {
    fn caps(&self) -> RuntimeCaps {
        self.caps
    }

    fn runtime_name(&self) -> String {
        self.instance
            .properties()
            .map(|p| p.runtime_name)
            .unwrap_or_else(|_| "OpenXR".to_string())
    }

    fn view_configs(&self) -> [ViewConfig; 2] {
        self.view_configs
    }

    fn poll_event(&mut self) -> RuntimeResult<Option<RuntimeEvent>> {
        let event = self
            .instance
            .poll_event(&mut self.event_buffer)
            .map_err(xr_err("poll event"))?;
        let Some(event) = event else {
            return Ok(None);
        };

        let translated = match event {
            xr::Event::SessionStateChanged(e) => {
                // The session must be begun and ended in lockstep with the
                // runtime's lifecycle, independent of what the client does.
                match e.state() {
                    xr::SessionState::READY => {
                        if !self.session_running {
                            self.session
                                .begin(xr::ViewConfigurationType::PRIMARY_STEREO)
                                .map_err(xr_err("session begin"))?;
                            self.session_running = true;
                        }
                        RuntimeEvent::SessionState(SessionState::Ready)
                    }
                    xr::SessionState::STOPPING => {
                        if self.session_running {
                            self.session.end().map_err(xr_err("session end"))?;
                            self.session_running = false;
                        }
                        RuntimeEvent::SessionState(SessionState::Stopping)
                    }
                    xr::SessionState::IDLE => RuntimeEvent::SessionState(SessionState::Idle),
                    xr::SessionState::SYNCHRONIZED => {
                        RuntimeEvent::SessionState(SessionState::Synchronized)
                    }
                    xr::SessionState::VISIBLE => RuntimeEvent::SessionState(SessionState::Visible),
                    xr::SessionState::FOCUSED => RuntimeEvent::SessionState(SessionState::Focused),
                    xr::SessionState::LOSS_PENDING => {
                        RuntimeEvent::SessionState(SessionState::LossPending)
                    }
                    xr::SessionState::EXITING => RuntimeEvent::SessionState(SessionState::Exiting),
                    _ => RuntimeEvent::Other,
                }
            }
            xr::Event::InstanceLossPending(_) => RuntimeEvent::InstanceLossPending,
            xr::Event::ReferenceSpaceChangePending(e) => {
                let space = match e.reference_space_type() {
                    xr::ReferenceSpaceType::LOCAL => ReferenceSpace::Local,
                    xr::ReferenceSpaceType::STAGE => ReferenceSpace::Stage,
                    xr::ReferenceSpaceType::VIEW => ReferenceSpace::View,
                    _ => return Ok(Some(RuntimeEvent::Other)),
                };
                RuntimeEvent::ReferenceSpaceChangePending {
                    space,
                    pose_valid: e.pose_valid(),
                    pose_in_previous_space: to_pose(e.pose_in_previous_space()),
                }
            }
            _ => RuntimeEvent::Other,
        };
        Ok(Some(translated))
    }

    fn wait_frame(&mut self) -> RuntimeResult<FrameTiming> {
        let state = self.waiter.wait().map_err(xr_err("wait frame"))?;
        Ok(FrameTiming {
            predicted_display_time: state.predicted_display_time.as_nanos(),
            predicted_display_period: state.predicted_display_period.as_nanos(),
        })
    }

    fn begin_frame(&mut self) -> RuntimeResult<()> {
        self.stream.begin().map_err(xr_err("begin frame"))
    }

    fn end_frame(&mut self, display_time: i64, layers: &[CompositionLayer]) -> RuntimeResult<()> {
        // Backing storage for the chained structures; boxed so addresses
        // stay stable while the pointer list is assembled.
        let mut depth_blocks: Vec<Box<sys::CompositionLayerDepthInfoKHR>> = Vec::new();
        let mut view_arrays: Vec<Box<[sys::CompositionLayerProjectionView; 2]>> = Vec::new();
        let mut projections: Vec<Box<sys::CompositionLayerProjection>> = Vec::new();
        let mut quads: Vec<Box<sys::CompositionLayerQuad>> = Vec::new();
        let mut cylinders: Vec<Box<sys::CompositionLayerCylinderKHR>> = Vec::new();
        let mut cubes: Vec<Box<sys::CompositionLayerCubeKHR>> = Vec::new();
        let mut headers: Vec<*const sys::CompositionLayerBaseHeader> = Vec::new();

        let blend = sys::CompositionLayerFlags::BLEND_TEXTURE_SOURCE_ALPHA;

        for layer in layers {
            match layer {
                CompositionLayer::Projection { space, views } => {
                    let mut array = Box::new(
                        [sys::CompositionLayerProjectionView {
                            ty: sys::CompositionLayerProjectionView::TYPE,
                            next: ptr::null(),
                            pose: from_pose(Posef::IDENTITY),
                            fov: from_fov(Fov::default()),
                            sub_image: self.sub_image(&views[0].sub_image)?,
                        }; 2],
                    );
                    for (i, view) in views.iter().enumerate() {
                        let next = match &view.depth {
                            Some(depth) => {
                                depth_blocks.push(Box::new(self.depth_block(depth)?));
                                &**depth_blocks.last().unwrap()
                                    as *const sys::CompositionLayerDepthInfoKHR
                                    as *const std::ffi::c_void
                            }
                            None => ptr::null(),
                        };
                        array[i] = sys::CompositionLayerProjectionView {
                            ty: sys::CompositionLayerProjectionView::TYPE,
                            next,
                            pose: from_pose(view.pose),
                            fov: from_fov(view.fov),
                            sub_image: self.sub_image(&view.sub_image)?,
                        };
                    }
                    view_arrays.push(array);
                    let views_ptr = view_arrays.last().unwrap().as_ptr();
                    projections.push(Box::new(sys::CompositionLayerProjection {
                        ty: sys::CompositionLayerProjection::TYPE,
                        next: ptr::null(),
                        layer_flags: blend,
                        space: self.raw_space(*space)?,
                        view_count: 2,
                        views: views_ptr,
                    }));
                    headers.push(
                        &**projections.last().unwrap() as *const sys::CompositionLayerProjection
                            as *const sys::CompositionLayerBaseHeader,
                    );
                }
                CompositionLayer::Quad {
                    space,
                    sub_image,
                    pose,
                    size,
                } => {
                    quads.push(Box::new(sys::CompositionLayerQuad {
                        ty: sys::CompositionLayerQuad::TYPE,
                        next: ptr::null(),
                        layer_flags: blend,
                        space: self.raw_space(*space)?,
                        eye_visibility: sys::EyeVisibility::BOTH,
                        sub_image: self.sub_image(sub_image)?,
                        pose: from_pose(*pose),
                        size: xr::Extent2Df {
                            width: size.x,
                            height: size.y,
                        },
                    }));
                    headers.push(
                        &**quads.last().unwrap() as *const sys::CompositionLayerQuad
                            as *const sys::CompositionLayerBaseHeader,
                    );
                }
                CompositionLayer::Cylinder {
                    space,
                    sub_image,
                    pose,
                    radius,
                    central_angle,
                    aspect_ratio,
                } => {
                    cylinders.push(Box::new(sys::CompositionLayerCylinderKHR {
                        ty: sys::CompositionLayerCylinderKHR::TYPE,
                        next: ptr::null(),
                        layer_flags: blend,
                        space: self.raw_space(*space)?,
                        eye_visibility: sys::EyeVisibility::BOTH,
                        sub_image: self.sub_image(sub_image)?,
                        pose: from_pose(*pose),
                        radius: *radius,
                        central_angle: *central_angle,
                        aspect_ratio: *aspect_ratio,
                    }));
                    headers.push(
                        &**cylinders.last().unwrap() as *const sys::CompositionLayerCylinderKHR
                            as *const sys::CompositionLayerBaseHeader,
                    );
                }
                CompositionLayer::Cube {
                    space,
                    chain,
                    orientation,
                } => {
                    cubes.push(Box::new(sys::CompositionLayerCubeKHR {
                        ty: sys::CompositionLayerCubeKHR::TYPE,
                        next: ptr::null(),
                        layer_flags: blend,
                        space: self.raw_space(*space)?,
                        eye_visibility: sys::EyeVisibility::BOTH,
                        swapchain: self.raw_chain(*chain)?,
                        image_array_index: 0,
                        orientation: xr::Quaternionf {
                            x: orientation.x,
                            y: orientation.y,
                            z: orientation.z,
                            w: orientation.w,
                        },
                    }));
                    headers.push(
                        &**cubes.last().unwrap() as *const sys::CompositionLayerCubeKHR
                            as *const sys::CompositionLayerBaseHeader,
                    );
                }
            }
        }

        let end_info = sys::FrameEndInfo {
            ty: sys::FrameEndInfo::TYPE,
            next: ptr::null(),
            display_time: xr::Time::from_nanos(display_time),
            environment_blend_mode: xr::EnvironmentBlendMode::OPAQUE,
            layer_count: headers.len() as u32,
            layers: headers.as_ptr(),
        };
        let result = unsafe { (self.instance.fp().end_frame)(self.session.as_raw(), &end_info) };
        if result.into_raw() < 0 {
            return Err(RuntimeError::new(
                result.into_raw(),
                format!("end frame failed: {result:?}"),
            ));
        }
        Ok(())
    }

    fn create_reference_space(
        &mut self,
        kind: ReferenceSpace,
        pose_in_reference: Posef,
    ) -> RuntimeResult<SpaceHandle> {
        let space = self
            .session
            .create_reference_space(from_space_kind(kind), from_pose(pose_in_reference))
            .map_err(xr_err("create reference space"))?;
        let handle = self.next_handle;
        self.next_handle += 1;
        self.spaces.insert(handle, space);
        Ok(SpaceHandle(handle))
    }

    fn destroy_space(&mut self, space: SpaceHandle) -> RuntimeResult<()> {
        // Dropping the wrapper destroys the runtime handle.
        self.spaces.remove(&space.0).ok_or_else(|| {
            RuntimeError::new(
                sys::Result::ERROR_HANDLE_INVALID.into_raw(),
                "unknown space handle",
            )
        })?;
        Ok(())
    }

    fn locate_space(
        &mut self,
        space: SpaceHandle,
        base: SpaceHandle,
        time: i64,
    ) -> RuntimeResult<SpaceLocation> {
        let base = self.space(base)?;
        let location = self
            .space(space)?
            .locate(base, xr::Time::from_nanos(time))
            .map_err(xr_err("locate space"))?;
        Ok(SpaceLocation {
            pose: to_pose(location.pose),
            orientation_valid: location
                .location_flags
                .contains(xr::SpaceLocationFlags::ORIENTATION_VALID),
            position_valid: location
                .location_flags
                .contains(xr::SpaceLocationFlags::POSITION_VALID),
        })
    }

    fn locate_views(&mut self, base: SpaceHandle, time: i64) -> RuntimeResult<[ViewPose; 2]> {
        let base = self.spaces.get(&base.0).ok_or_else(|| {
            RuntimeError::new(
                sys::Result::ERROR_HANDLE_INVALID.into_raw(),
                "unknown space handle",
            )
        })?;
        let (_flags, views) = self
            .session
            .locate_views(
                xr::ViewConfigurationType::PRIMARY_STEREO,
                xr::Time::from_nanos(time),
                base,
            )
            .map_err(xr_err("locate views"))?;
        let mut out = [ViewPose::default(), ViewPose::default()];
        for (i, view) in views.iter().take(2).enumerate() {
            out[i] = ViewPose {
                pose: to_pose(view.pose),
                fov: fov_port_from_xr(view.fov),
            };
        }
        Ok(out)
    }

    fn create_swapchain(&mut self, info: &ChainCreateInfo) -> RuntimeResult<(ChainHandle, u32)> {
        let create_info = xr::SwapchainCreateInfo::<G> {
            create_flags: if info.static_image {
                xr::SwapchainCreateFlags::STATIC_IMAGE
            } else {
                xr::SwapchainCreateFlags::EMPTY
            },
            usage_flags: xr::SwapchainUsageFlags::COLOR_ATTACHMENT
                | xr::SwapchainUsageFlags::SAMPLED,
            format: info.format as u32,
            sample_count: info.sample_count.max(1) as u32,
            width: info.width.max(1) as u32,
            height: info.height.max(1) as u32,
            face_count: 1,
            array_size: info.array_size.max(1) as u32,
            mip_count: info.mip_count.max(1) as u32,
        };
        let mut chain = self
            .session
            .create_swapchain(&create_info)
            .map_err(xr_err("create swapchain"))?;
        let images = chain
            .enumerate_images()
            .map_err(xr_err("enumerate swapchain images"))?;

        chain.acquire_image().map_err(xr_err("acquire image"))?;

        let handle = self.next_handle;
        self.next_handle += 1;
        self.chains.insert(handle, chain);
        Ok((ChainHandle(handle), images.len() as u32))
    }

    fn destroy_swapchain(&mut self, chain: ChainHandle) -> RuntimeResult<()> {
        self.chains.remove(&chain.0).ok_or_else(|| {
            RuntimeError::new(
                sys::Result::ERROR_HANDLE_INVALID.into_raw(),
                "unknown swapchain handle",
            )
        })?;
        Ok(())
    }

    fn acquire_image(&mut self, chain: ChainHandle) -> RuntimeResult<u32> {
        self.chain(chain)?
            .acquire_image()
            .map_err(xr_err("acquire image"))
    }

    fn wait_image(&mut self, chain: ChainHandle) -> RuntimeResult<()> {
        self.chain(chain)?
            .wait_image(xr::Duration::from_nanos(0))
            .map_err(xr_err("wait image"))
    }

    fn release_image(&mut self, chain: ChainHandle) -> RuntimeResult<()> {
        self.chain(chain)?
            .release_image()
            .map_err(xr_err("release image"))
    }

    fn stage_bounds(&mut self) -> RuntimeResult<Vector2f> {
        let bounds = self
            .session
            .reference_space_bounds_rect(xr::ReferenceSpaceType::STAGE)
            .map_err(xr_err("stage bounds"))?;
        match bounds {
            Some(extent) => Ok(Vector2f::new(extent.width, extent.height)),
            None => Err(RuntimeError::new(
                sys::Result::SPACE_BOUNDS_UNAVAILABLE.into_raw(),
                "stage bounds unavailable",
            )),
        }
    }

    fn time_to_seconds(&mut self, time: i64) -> RuntimeResult<f64> {
        // Runtime timestamps are monotonic-clock nanoseconds; the
        // platform conversion extensions differ from this only by the
        // clock epoch, which legacy clients never compare across.
        Ok(time as f64 * 1e-9)
    }

    fn visibility_mask(
        &mut self,
        view_index: u32,
        mask_type: VisibilityMaskType,
    ) -> RuntimeResult<VisibilityMask> {
        let ext = self.instance.exts().khr_visibility_mask.ok_or_else(|| {
            RuntimeError::new(
                sys::Result::ERROR_EXTENSION_NOT_PRESENT.into_raw(),
                "visibility mask extension not enabled",
            )
        })?;
        let xr_type = match mask_type {
            VisibilityMaskType::HiddenTriangleMesh => {
                sys::VisibilityMaskTypeKHR::HIDDEN_TRIANGLE_MESH
            }
            VisibilityMaskType::VisibleTriangleMesh => {
                sys::VisibilityMaskTypeKHR::VISIBLE_TRIANGLE_MESH
            }
            VisibilityMaskType::LineLoop => sys::VisibilityMaskTypeKHR::LINE_LOOP,
        };

        // Two-call idiom: sizes first, then the buffers.
        let mut mask = sys::VisibilityMaskKHR {
            ty: sys::VisibilityMaskKHR::TYPE,
            next: ptr::null_mut(),
            vertex_capacity_input: 0,
            vertex_count_output: 0,
            vertices: ptr::null_mut(),
            index_capacity_input: 0,
            index_count_output: 0,
            indices: ptr::null_mut(),
        };
        let result = unsafe {
            (ext.get_visibility_mask)(
                self.session.as_raw(),
                xr::ViewConfigurationType::PRIMARY_STEREO,
                view_index,
                xr_type,
                &mut mask,
            )
        };
        if result.into_raw() < 0 {
            return Err(RuntimeError::new(
                result.into_raw(),
                format!("get visibility mask failed: {result:?}"),
            ));
        }

        let mut vertices = vec![xr::Vector2f { x: 0.0, y: 0.0 }; mask.vertex_count_output as usize];
        let mut indices = vec![0u32; mask.index_count_output as usize];
        mask.vertex_capacity_input = vertices.len() as u32;
        mask.vertices = vertices.as_mut_ptr();
        mask.index_capacity_input = indices.len() as u32;
        mask.indices = indices.as_mut_ptr();
        let result = unsafe {
            (ext.get_visibility_mask)(
                self.session.as_raw(),
                xr::ViewConfigurationType::PRIMARY_STEREO,
                view_index,
                xr_type,
                &mut mask,
            )
        };
        if result.into_raw() < 0 {
            return Err(RuntimeError::new(
                result.into_raw(),
                format!("get visibility mask failed: {result:?}"),
            ));
        }

        Ok(VisibilityMask {
            vertices: vertices
                .into_iter()
                .map(|v| Vector2f::new(v.x, v.y))
                .collect(),
            indices,
        })
    }
}
