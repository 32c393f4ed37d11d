//! Process-global state: the initialized-library record, the set of live
//! sessions, the last-error latch and the pluggable runtime factory.

use std::collections::HashSet;
use std::sync::Mutex;

use once_cell::sync::Lazy;

use rivet_core::config::Config;
use rivet_core::headless::HeadlessRuntime;
use rivet_core::{Runtime, Session, ShimError};

use crate::types::*;

pub struct SessionShell {
    pub session: Mutex<Session>,
}

pub type RuntimeFactory = Box<dyn Fn() -> Box<dyn Runtime> + Send>;

struct InitState {
    config: Config,
}

static INIT: Lazy<Mutex<Option<InitState>>> = Lazy::new(|| Mutex::new(None));
static SESSIONS: Lazy<Mutex<HashSet<usize>>> = Lazy::new(|| Mutex::new(HashSet::new()));
static FACTORY: Lazy<Mutex<Option<RuntimeFactory>>> = Lazy::new(|| Mutex::new(None));
static LAST_ERROR: Lazy<Mutex<(ovrResult, String)>> =
    Lazy::new(|| Mutex::new((ovrSuccess, String::new())));

/// Install the backend the next created session will run on. The graphics
/// binding calls this once it has a live runtime session; without it, new
/// sessions fall back to the headless backend.
pub fn set_runtime_factory(factory: RuntimeFactory) {
    *FACTORY.lock().unwrap_or_else(|p| p.into_inner()) = Some(factory);
}

pub(crate) fn initialize(config: Config) -> bool {
    let mut init = INIT.lock().unwrap_or_else(|p| p.into_inner());
    if init.is_some() {
        return false;
    }
    *init = Some(InitState { config });
    true
}

pub(crate) fn is_initialized() -> bool {
    INIT.lock().unwrap_or_else(|p| p.into_inner()).is_some()
}

pub(crate) fn config() -> Config {
    INIT.lock()
        .unwrap_or_else(|p| p.into_inner())
        .as_ref()
        .map(|s| s.config)
        .unwrap_or_default()
}

pub(crate) fn shutdown() {
    let handles: Vec<usize> = SESSIONS
        .lock()
        .unwrap_or_else(|p| p.into_inner())
        .iter()
        .copied()
        .collect();
    for handle in handles {
        destroy_session(handle as *mut SessionShell);
    }
    *INIT.lock().unwrap_or_else(|p| p.into_inner()) = None;
}

pub(crate) fn create_session() -> Result<*mut SessionShell, ovrResult> {
    let runtime = {
        let factory = FACTORY.lock().unwrap_or_else(|p| p.into_inner());
        match factory.as_ref() {
            Some(factory) => factory(),
            None => Box::new(HeadlessRuntime::new()),
        }
    };
    let session = Session::create(runtime, config()).map_err(latch)?;
    let shell = Box::into_raw(Box::new(SessionShell {
        session: Mutex::new(session),
    }));
    SESSIONS
        .lock()
        .unwrap_or_else(|p| p.into_inner())
        .insert(shell as usize);
    Ok(shell)
}

pub(crate) fn destroy_session(shell: *mut SessionShell) {
    let mut sessions = SESSIONS.lock().unwrap_or_else(|p| p.into_inner());
    if sessions.remove(&(shell as usize)) {
        drop(sessions);
        // Dropping the shell ends the session and frees its swapchains.
        drop(unsafe { Box::from_raw(shell) });
    }
}

pub(crate) fn is_live(shell: *mut SessionShell) -> bool {
    !shell.is_null()
        && SESSIONS
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .contains(&(shell as usize))
}

/// Run `f` on a validated session.
pub(crate) fn with_session<R>(
    shell: ovrSession,
    f: impl FnOnce(&mut Session) -> Result<R, ovrResult>,
) -> Result<R, ovrResult> {
    if !is_live(shell) {
        return Err(latch(ShimError::InvalidSession));
    }
    let shell = unsafe { &*shell };
    let mut session = shell.session.lock().unwrap_or_else(|p| p.into_inner());
    f(&mut session)
}

/// Map a core error to its legacy result code and remember it for
/// `ovr_GetLastErrorInfo`.
pub(crate) fn latch(err: ShimError) -> ovrResult {
    let code = match &err {
        ShimError::InvalidSession => ovrError_InvalidSession,
        ShimError::InvalidParameter(_) => ovrError_InvalidParameter,
        ShimError::InvalidHeadsetOrientation => ovrError_InvalidHeadsetOrientation,
        ShimError::Unsupported(_) => ovrError_Unsupported,
        ShimError::ServiceError => ovrError_ServiceError,
        ShimError::InvalidOperation(_) => ovrError_InvalidOperation,
        ShimError::RuntimeFailure(_) => ovrError_RuntimeException,
    };
    log::debug!("entry point failed: {err}");
    *LAST_ERROR.lock().unwrap_or_else(|p| p.into_inner()) = (code, err.to_string());
    code
}

pub(crate) fn last_error() -> (ovrResult, String) {
    LAST_ERROR
        .lock()
        .unwrap_or_else(|p| p.into_inner())
        .clone()
}
