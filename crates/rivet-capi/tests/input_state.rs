//! Write-size guarantees for clients compiled against old input structs.

use std::mem::size_of;
use std::ptr;

use rivet_capi::types::*;
use rivet_capi::{ovr_Create, ovr_GetInputState, ovr_Initialize};

fn init_client(minor: u32) -> ovrSession {
    let params = ovrInitParams {
        Flags: 0,
        RequestedMinorVersion: minor,
        LogCallback: None,
        UserData: 0,
        ConnectionTimeoutMS: 0,
        pad0: [0; 4],
    };
    assert_eq!(unsafe { ovr_Initialize(&params) }, ovrSuccess);
    let mut session: ovrSession = ptr::null_mut();
    assert_eq!(
        unsafe { ovr_Create(&mut session, ptr::null_mut()) },
        ovrSuccess
    );
    session
}

#[test]
fn input_state_write_is_truncated_to_the_v1_struct() {
    // The whole binary initializes as a 1.5-era client.
    let session = init_client(5);

    const SENTINEL: u8 = 0xAB;
    let mut buffer = [SENTINEL; size_of::<ovrInputState>()];
    let result = unsafe {
        ovr_GetInputState(
            session,
            ovrControllerType_Touch,
            buffer.as_mut_ptr() as *mut ovrInputState,
        )
    };
    assert_eq!(result, ovrSuccess);

    let v1_size = size_of::<ovrInputState1>();
    assert!(v1_size < size_of::<ovrInputState>());

    // Everything inside the old struct was written (the null input source
    // reports zeros, which cannot collide with the sentinel)...
    assert!(buffer[..v1_size].iter().any(|&b| b != SENTINEL));
    // ...and not a single byte beyond it was touched.
    assert!(buffer[v1_size..].iter().all(|&b| b == SENTINEL));
}

#[test]
fn historical_struct_sizes_are_strictly_ordered() {
    assert!(size_of::<ovrInputState1>() < size_of::<ovrInputState2>());
    assert!(size_of::<ovrInputState2>() < size_of::<ovrInputState>());
}
