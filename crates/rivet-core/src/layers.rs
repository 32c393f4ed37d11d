//! Translation of the flat legacy layer list into composition layers.
//!
//! Input is a sparse list of parsed legacy layers; output is the coherent
//! layer vector handed to the backend, with invalid entries dropped the
//! way the legacy runtime tolerated them.

use crate::backend::{
    ChainHandle, CompositionLayer, DepthInfo, ProjectionView, SubImage,
};
use crate::session::Session;
use crate::types::{FovPort, Posef, Quatf, Recti, Sizei, Vector2f, Vector2i};

#[derive(Debug, Clone, Copy, Default)]
pub struct LayerFlags {
    /// Texture origin at the bottom-left corner.
    pub upside_down: bool,
    /// Fix the layer to the head instead of the tracking space.
    pub head_locked: bool,
}

/// Row 2/3 terms of the projection the depth buffer was rendered with.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimewarpProjection {
    pub p22: f32,
    pub p23: f32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ViewScale {
    pub world_scale_in_meters: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct EyeFovLayer {
    pub flags: LayerFlags,
    /// A null right-eye chain reuses the left eye's.
    pub color: [Option<ChainHandle>; 2],
    pub viewport: [Recti; 2],
    pub fov: [FovPort; 2],
    pub pose: [Posef; 2],
}

#[derive(Debug, Clone, Copy)]
pub struct EyeMatrixLayer {
    pub flags: LayerFlags,
    pub color: [Option<ChainHandle>; 2],
    pub viewport: [Recti; 2],
    pub matrix: [[[f32; 4]; 4]; 2],
    pub pose: [Posef; 2],
}

#[derive(Debug, Clone, Copy)]
pub struct QuadLayer {
    pub flags: LayerFlags,
    pub color: Option<ChainHandle>,
    pub viewport: Recti,
    pub pose: Posef,
    pub size: Vector2f,
}

#[derive(Debug, Clone, Copy)]
pub struct CylinderLayer {
    pub flags: LayerFlags,
    pub color: Option<ChainHandle>,
    pub viewport: Recti,
    pub pose: Posef,
    pub radius: f32,
    pub central_angle: f32,
    pub aspect_ratio: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct CubeLayer {
    pub flags: LayerFlags,
    pub color: Option<ChainHandle>,
    pub orientation: Quatf,
}

#[derive(Debug, Clone, Copy)]
pub enum LegacyLayer {
    EyeFov(EyeFovLayer),
    EyeFovDepth {
        fov: EyeFovLayer,
        depth: [Option<ChainHandle>; 2],
        projection: TimewarpProjection,
    },
    EyeMatrix(EyeMatrixLayer),
    Quad(QuadLayer),
    Cylinder(CylinderLayer),
    Cube(CubeLayer),
    Disabled,
}

/// The legacy runtime tolerated zero and oversized viewports; clamp to
/// something the target runtime accepts.
pub fn clamp_rect(rect: Recti, chain_size: Sizei) -> Recti {
    let pos = Vector2i {
        x: rect.pos.x.max(0),
        y: rect.pos.y.max(0),
    };
    let size = if rect.size.w <= 0 || rect.size.h <= 0 {
        chain_size
    } else {
        Sizei::new(rect.size.w.min(chain_size.w), rect.size.h.min(chain_size.h))
    };
    Recti { pos, size }
}

impl Session {
    fn chain_size(&self, chain: ChainHandle) -> Option<Sizei> {
        self.chains
            .get(chain)
            .map(|c| Sizei::new(c.desc.width, c.desc.height))
    }

    fn sub_image(&self, chain: ChainHandle, viewport: Recti) -> Option<SubImage> {
        let size = self.chain_size(chain)?;
        Some(SubImage {
            chain,
            rect: clamp_rect(viewport, size),
            array_index: 0,
        })
    }

    fn projection_views(
        &self,
        flags: LayerFlags,
        color: [Option<ChainHandle>; 2],
        viewport: [Recti; 2],
        pose: [Posef; 2],
        fov_of: impl Fn(usize) -> Option<FovPort>,
        depth_of: impl Fn(usize) -> Option<DepthInfo>,
    ) -> Option<[ProjectionView; 2]> {
        let mut texture = None;
        let mut views = [ProjectionView {
            pose: Posef::IDENTITY,
            fov: Default::default(),
            sub_image: SubImage {
                chain: ChainHandle(0),
                rect: Recti::default(),
                array_index: 0,
            },
            depth: None,
        }; 2];

        for eye in 0..2 {
            if color[eye].is_some() {
                texture = color[eye];
            }
            let chain = texture?;

            let fov_port = fov_of(eye)?;
            let mut fov = fov_port.to_angles();
            // Flipping the field of view flips the image; OpenGL chains
            // are upside down by convention, inverting the check.
            let flip = if self.caps().opengl {
                !flags.upside_down
            } else {
                flags.upside_down
            };
            if flip {
                fov.swap_vertical();
            }

            views[eye] = ProjectionView {
                pose: pose[eye],
                fov,
                sub_image: self.sub_image(chain, viewport[eye])?,
                depth: depth_of(eye),
            };
        }
        Some(views)
    }

    fn depth_info(
        &self,
        chain: Option<ChainHandle>,
        viewport: Recti,
        projection: TimewarpProjection,
        view_scale: Option<ViewScale>,
    ) -> Option<DepthInfo> {
        if self.config.disable_depth || !self.caps().composition_depth {
            return None;
        }
        let chain = chain?;
        let sub_image = self.sub_image(chain, viewport)?;
        let mut near_z = projection.p23 / projection.p22;
        let mut far_z = projection.p23 / (1.0 + projection.p22);
        if let Some(scale) = view_scale {
            near_z *= scale.world_scale_in_meters;
            far_z *= scale.world_scale_in_meters;
        }
        Some(DepthInfo {
            sub_image,
            min_depth: 0.0,
            max_depth: 1.0,
            near_z,
            far_z,
        })
    }

    /// Build the backend layer vector, skipping null, disabled and invalid
    /// entries.
    pub(crate) fn translate_layers(
        &self,
        layers: &[Option<LegacyLayer>],
        view_scale: Option<ViewScale>,
    ) -> Vec<CompositionLayer> {
        let mut out = Vec::with_capacity(layers.len());

        for layer in layers.iter().flatten() {
            let flags = match layer {
                LegacyLayer::EyeFov(l) => l.flags,
                LegacyLayer::EyeFovDepth { fov, .. } => fov.flags,
                LegacyLayer::EyeMatrix(l) => l.flags,
                LegacyLayer::Quad(l) => l.flags,
                LegacyLayer::Cylinder(l) => l.flags,
                LegacyLayer::Cube(l) => l.flags,
                LegacyLayer::Disabled => continue,
            };
            let space = if flags.head_locked {
                self.view_space
            } else {
                self.tracking_space()
            };

            let translated = match layer {
                LegacyLayer::EyeFov(l) => self
                    .projection_views(
                        l.flags,
                        l.color,
                        l.viewport,
                        l.pose,
                        // Some titles submit an all-zero field of view on
                        // their first frame; drop the layer instead.
                        |eye| Some(l.fov[eye]).filter(|f| f.max_side_tan() > 0.0),
                        |_| None,
                    )
                    .map(|views| CompositionLayer::Projection { space, views }),
                LegacyLayer::EyeFovDepth {
                    fov: l,
                    depth,
                    projection,
                } => self
                    .projection_views(
                        l.flags,
                        l.color,
                        l.viewport,
                        l.pose,
                        |eye| Some(l.fov[eye]).filter(|f| f.max_side_tan() > 0.0),
                        |eye| self.depth_info(depth[eye], l.viewport[eye], *projection, view_scale),
                    )
                    .map(|views| CompositionLayer::Projection { space, views }),
                LegacyLayer::EyeMatrix(l) => self
                    .projection_views(
                        l.flags,
                        l.color,
                        l.viewport,
                        l.pose,
                        |eye| Some(FovPort::from_projection(&l.matrix[eye])),
                        |_| None,
                    )
                    .map(|views| CompositionLayer::Projection { space, views }),
                LegacyLayer::Quad(l) => l.color.and_then(|chain| {
                    Some(CompositionLayer::Quad {
                        space,
                        sub_image: self.sub_image(chain, l.viewport)?,
                        pose: l.pose,
                        size: l.size,
                    })
                }),
                LegacyLayer::Cylinder(l) => {
                    if !self.caps().composition_cylinder {
                        None
                    } else {
                        l.color.and_then(|chain| {
                            Some(CompositionLayer::Cylinder {
                                space,
                                sub_image: self.sub_image(chain, l.viewport)?,
                                pose: l.pose,
                                radius: l.radius,
                                central_angle: l.central_angle,
                                aspect_ratio: l.aspect_ratio,
                            })
                        })
                    }
                }
                LegacyLayer::Cube(l) => {
                    if !self.caps().composition_cube {
                        None
                    } else {
                        l.color.map(|chain| CompositionLayer::Cube {
                            space,
                            chain,
                            orientation: l.orientation,
                        })
                    }
                }
                LegacyLayer::Disabled => None,
            };

            if let Some(layer) = translated {
                out.push(layer);
            }
        }

        out
    }
}
