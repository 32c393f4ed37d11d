//! ABI-level behavior: handles, result codes, properties, swapchains.

use std::ffi::CString;
use std::mem::MaybeUninit;
use std::ptr;

use rivet_capi::types::*;
use rivet_capi::{
    create_texture_swap_chain, ovr_CommitTextureSwapChain, ovr_Create, ovr_Destroy,
    ovr_DestroyTextureSwapChain, ovr_GetFloat, ovr_GetInt, ovr_GetLastErrorInfo,
    ovr_GetSessionStatus, ovr_GetTextureSwapChainCurrentIndex, ovr_GetTextureSwapChainDesc,
    ovr_GetTextureSwapChainLength, ovr_GetVersionString, ovr_Initialize, ovr_Lookup,
    ovr_RecenterTrackingOrigin, ovr_SetBool, ovr_SetInt,
};

// The last-error latch is process-global; serialize the tests that touch
// it so a concurrent failure cannot overwrite the code under inspection.
static TEST_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

fn lock_tests() -> std::sync::MutexGuard<'static, ()> {
    TEST_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn init() {
    assert_eq!(unsafe { ovr_Initialize(ptr::null()) }, ovrSuccess);
}

fn create() -> ovrSession {
    init();
    let mut session: ovrSession = ptr::null_mut();
    let mut luid = ovrGraphicsLuid::default();
    assert_eq!(unsafe { ovr_Create(&mut session, &mut luid) }, ovrSuccess);
    assert!(!session.is_null());
    session
}

fn chain_desc() -> ovrTextureSwapChainDesc {
    ovrTextureSwapChainDesc {
        Type: 0,
        Format: 29,
        ArraySize: 1,
        Width: 512,
        Height: 512,
        MipLevels: 1,
        SampleCount: 1,
        StaticImage: ovrFalse,
        MiscFlags: 0,
        BindFlags: 0,
    }
}

#[test]
fn null_session_reports_invalid_session() {
    let _guard = lock_tests();
    init();
    let mut status = ovrSessionStatus::default();
    assert_eq!(
        unsafe { ovr_GetSessionStatus(ptr::null_mut(), &mut status) },
        ovrError_InvalidSession
    );

    let mut info = ovrErrorInfo::default();
    unsafe { ovr_GetLastErrorInfo(&mut info) };
    assert_eq!(info.Result, ovrError_InvalidSession);
    assert_ne!(info.ErrorString[0], 0);
}

#[test]
fn destroyed_session_handle_is_rejected() {
    let _guard = lock_tests();
    let session = create();
    ovr_Destroy(session);
    assert_eq!(
        ovr_RecenterTrackingOrigin(session),
        ovrError_InvalidSession
    );
}

#[test]
fn status_out_pointer_is_required() {
    let _guard = lock_tests();
    let session = create();
    assert_eq!(
        unsafe { ovr_GetSessionStatus(session, ptr::null_mut()) },
        ovrError_InvalidParameter
    );
    ovr_Destroy(session);
}

#[test]
fn version_string_is_nul_terminated() {
    let version = ovr_GetVersionString();
    let text = unsafe { std::ffi::CStr::from_ptr(version) };
    assert!(text.to_str().unwrap().starts_with("1."));
}

#[test]
fn properties_round_trip_through_the_abi() {
    let _guard = lock_tests();
    let session = create();

    let depth = CString::new("TextureSwapChainDepth").unwrap();
    assert!(unsafe { ovr_GetInt(session, depth.as_ptr(), 0) } > 0);

    let unknown = CString::new("SomeVendorKnob").unwrap();
    assert_eq!(unsafe { ovr_GetInt(session, unknown.as_ptr(), 42) }, 42);

    let ipd = CString::new("IPD").unwrap();
    let value = unsafe { ovr_GetFloat(session, ipd.as_ptr(), 0.0) };
    assert!(value > 0.01 && value < 0.1);

    // All setters are documented no-ops.
    assert_eq!(ovr_SetInt(session, depth.as_ptr(), 5), ovrFalse);
    assert_eq!(ovr_SetBool(session, depth.as_ptr(), ovrTrue), ovrFalse);

    ovr_Destroy(session);
}

#[test]
fn swapchain_queries_track_commits() {
    let _guard = lock_tests();
    let session = create();

    let desc = chain_desc();
    let mut chain: ovrTextureSwapChain = ptr::null_mut();
    assert_eq!(
        unsafe { create_texture_swap_chain(session, &desc, &mut chain) },
        ovrSuccess
    );

    let mut length = 0;
    assert_eq!(
        unsafe { ovr_GetTextureSwapChainLength(session, chain, &mut length) },
        ovrSuccess
    );
    assert!(length > 1);

    let mut echoed = MaybeUninit::<ovrTextureSwapChainDesc>::uninit();
    assert_eq!(
        unsafe { ovr_GetTextureSwapChainDesc(session, chain, echoed.as_mut_ptr()) },
        ovrSuccess
    );
    let echoed = unsafe { echoed.assume_init() };
    assert_eq!(echoed.Width, desc.Width);
    assert_eq!(echoed.Format, desc.Format);

    let mut before = -1;
    let mut after = -1;
    unsafe {
        ovr_GetTextureSwapChainCurrentIndex(session, chain, &mut before);
        assert_eq!(ovr_CommitTextureSwapChain(session, chain), ovrSuccess);
        ovr_GetTextureSwapChainCurrentIndex(session, chain, &mut after);
    }
    assert_eq!(after, (before + 1) % length);

    unsafe { ovr_DestroyTextureSwapChain(session, chain) };
    ovr_Destroy(session);
}

#[test]
fn service_lookup_is_never_emulated() {
    let _guard = lock_tests();
    init();
    assert_eq!(
        ovr_Lookup(ptr::null(), ptr::null_mut()),
        ovrError_ServiceError
    );
}
