//! Version-aware layer parsing.
//!
//! 1.25 grew the layer header by a 128-byte reserved block, shifting every
//! member of every layer struct. Instead of rebasing pointers in place,
//! each variant is read through member addresses computed against the
//! correct base for the client's profile; the header itself is only read
//! from the pointer the client actually passed.

use std::ptr;

use rivet_core::layers::{
    CubeLayer, CylinderLayer, EyeFovLayer, EyeMatrixLayer, LayerFlags, LegacyLayer, QuadLayer,
    TimewarpProjection,
};
use rivet_core::ChainHandle;
use rivet_core::VersionProfile;

use crate::types::*;

/// Resolve an opaque client chain pointer to the core handle, if any.
pub(crate) type ChainResolver<'a> = &'a dyn Fn(ovrTextureSwapChain) -> Option<ChainHandle>;

/// Base address the layer members are laid out against. Clients older
/// than the reserved block lay members out 128 bytes earlier than the
/// current headers say.
unsafe fn member_base(header: *const ovrLayerHeader, profile: VersionProfile) -> *const u8 {
    if profile.has_layer_reserved_field() {
        header as *const u8
    } else {
        (header as *const u8).sub(LAYER_HEADER_RESERVED_BYTES)
    }
}

unsafe fn read_eye_fov(base: *const u8, flags: LayerFlags, resolve: ChainResolver) -> EyeFovLayer {
    let p = base as *const ovrLayerEyeFov;
    let color = ptr::read(ptr::addr_of!((*p).ColorTexture));
    let viewport = ptr::read(ptr::addr_of!((*p).Viewport));
    let fov = ptr::read(ptr::addr_of!((*p).Fov));
    let pose = ptr::read(ptr::addr_of!((*p).RenderPose));
    EyeFovLayer {
        flags,
        color: color.map(resolve),
        viewport: viewport.map(Into::into),
        fov: fov.map(Into::into),
        pose: pose.map(Into::into),
    }
}

/// Parse one client layer. `None` for null entries and unknown types; the
/// translator drops those the same way the legacy runtime did.
///
/// # Safety
/// `header` must point at a layer structure matching its `Type` field,
/// laid out for the given profile.
pub(crate) unsafe fn parse_layer(
    header: *const ovrLayerHeader,
    profile: VersionProfile,
    resolve: ChainResolver,
) -> Option<LegacyLayer> {
    if header.is_null() {
        return None;
    }

    // Read the tag and flags before switching to the rebased view; the
    // header is not readable through it.
    let layer_type = ptr::read(ptr::addr_of!((*header).Type));
    let raw_flags = ptr::read(ptr::addr_of!((*header).Flags));
    let flags = LayerFlags {
        upside_down: raw_flags & ovrLayerFlag_TextureOriginAtBottomLeft != 0,
        head_locked: raw_flags & ovrLayerFlag_HeadLocked != 0,
    };
    let base = member_base(header, profile);

    match layer_type {
        ovrLayerType_Disabled => Some(LegacyLayer::Disabled),
        ovrLayerType_EyeFov => Some(LegacyLayer::EyeFov(read_eye_fov(base, flags, resolve))),
        ovrLayerType_EyeFovDepth => {
            let p = base as *const ovrLayerEyeFovDepth;
            let depth = ptr::read(ptr::addr_of!((*p).DepthTexture));
            let proj = ptr::read(ptr::addr_of!((*p).ProjectionDesc));
            Some(LegacyLayer::EyeFovDepth {
                fov: read_eye_fov(base, flags, resolve),
                depth: depth.map(resolve),
                projection: TimewarpProjection {
                    p22: proj.Projection22,
                    p23: proj.Projection23,
                },
            })
        }
        ovrLayerType_EyeMatrix => {
            let p = base as *const ovrLayerEyeMatrix;
            let color = ptr::read(ptr::addr_of!((*p).ColorTexture));
            let viewport = ptr::read(ptr::addr_of!((*p).Viewport));
            let pose = ptr::read(ptr::addr_of!((*p).RenderPose));
            let matrix = ptr::read(ptr::addr_of!((*p).Matrix));
            Some(LegacyLayer::EyeMatrix(EyeMatrixLayer {
                flags,
                color: color.map(resolve),
                viewport: viewport.map(Into::into),
                matrix: matrix.map(|m| m.M),
                pose: pose.map(Into::into),
            }))
        }
        ovrLayerType_Quad => {
            let p = base as *const ovrLayerQuad;
            Some(LegacyLayer::Quad(QuadLayer {
                flags,
                color: resolve(ptr::read(ptr::addr_of!((*p).ColorTexture))),
                viewport: ptr::read(ptr::addr_of!((*p).Viewport)).into(),
                pose: ptr::read(ptr::addr_of!((*p).QuadPoseCenter)).into(),
                size: ptr::read(ptr::addr_of!((*p).QuadSize)).into(),
            }))
        }
        ovrLayerType_Cylinder => {
            let p = base as *const ovrLayerCylinder;
            Some(LegacyLayer::Cylinder(CylinderLayer {
                flags,
                color: resolve(ptr::read(ptr::addr_of!((*p).ColorTexture))),
                viewport: ptr::read(ptr::addr_of!((*p).Viewport)).into(),
                pose: ptr::read(ptr::addr_of!((*p).CylinderPoseCenter)).into(),
                radius: ptr::read(ptr::addr_of!((*p).CylinderRadius)),
                central_angle: ptr::read(ptr::addr_of!((*p).CylinderAngle)),
                aspect_ratio: ptr::read(ptr::addr_of!((*p).CylinderAspectRatio)),
            }))
        }
        ovrLayerType_Cube => {
            let p = base as *const ovrLayerCube;
            Some(LegacyLayer::Cube(CubeLayer {
                flags,
                color: resolve(ptr::read(ptr::addr_of!((*p).CubeMapTexture))),
                orientation: ptr::read(ptr::addr_of!((*p).Orientation)).into(),
            }))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rivet_core::VersionProfile;

    fn no_chains(_: ovrTextureSwapChain) -> Option<ChainHandle> {
        None
    }

    #[test]
    fn null_header_parses_to_none() {
        let parsed = unsafe {
            parse_layer(
                std::ptr::null(),
                VersionProfile::new(43),
                &no_chains,
            )
        };
        assert!(parsed.is_none());
    }

    #[test]
    fn modern_quad_reads_in_place() {
        let mut layer: ovrLayerQuad = unsafe { std::mem::zeroed() };
        layer.Header.Type = ovrLayerType_Quad;
        layer.Header.Flags = ovrLayerFlag_HeadLocked;
        layer.Viewport = ovrRecti {
            Pos: ovrVector2i { x: 2, y: 3 },
            Size: ovrSizei { w: 64, h: 32 },
        };
        layer.QuadSize = ovrVector2f { x: 1.5, y: 0.5 };

        let parsed = unsafe {
            parse_layer(
                &layer.Header as *const ovrLayerHeader,
                VersionProfile::new(43),
                &no_chains,
            )
        };
        match parsed {
            Some(LegacyLayer::Quad(quad)) => {
                assert!(quad.flags.head_locked);
                assert_eq!(quad.viewport.pos.x, 2);
                assert_eq!(quad.size.x, 1.5);
                assert!(quad.color.is_none());
            }
            other => panic!("unexpected parse {other:?}"),
        }
    }

    #[test]
    fn pre_reserved_layout_reads_shifted_members() {
        // Build the bytes an old client would hand over: an 8-byte header
        // immediately followed by the quad members.
        #[repr(C)]
        struct OldQuad {
            type_: ovrLayerType,
            flags: u32,
            color: ovrTextureSwapChain,
            viewport: ovrRecti,
            pose: ovrPosef,
            size: ovrVector2f,
        }
        let old = OldQuad {
            type_: ovrLayerType_Quad,
            flags: 0,
            color: std::ptr::null_mut(),
            viewport: ovrRecti {
                Pos: ovrVector2i { x: 7, y: 9 },
                Size: ovrSizei { w: 40, h: 20 },
            },
            pose: ovrPosef::default(),
            size: ovrVector2f { x: 2.0, y: 1.0 },
        };

        let parsed = unsafe {
            parse_layer(
                &old as *const OldQuad as *const ovrLayerHeader,
                VersionProfile::new(20),
                &no_chains,
            )
        };
        match parsed {
            Some(LegacyLayer::Quad(quad)) => {
                assert_eq!(quad.viewport.pos.x, 7);
                assert_eq!(quad.viewport.size.w, 40);
                assert_eq!(quad.size.x, 2.0);
            }
            other => panic!("unexpected parse {other:?}"),
        }
    }

    #[test]
    fn unknown_type_is_skipped() {
        let mut layer: ovrLayerQuad = unsafe { std::mem::zeroed() };
        layer.Header.Type = 99;
        let parsed = unsafe {
            parse_layer(
                &layer.Header as *const ovrLayerHeader,
                VersionProfile::new(43),
                &no_chains,
            )
        };
        assert!(parsed.is_none());
    }
}
