//! Core of the rivet compatibility frontend.
//!
//! This crate owns every semantic of the translation: the session state
//! machine, the frame pipeline, swapchain commit ordering, origin
//! calibration and layer translation. It speaks to the underlying runtime
//! exclusively through [`backend::Runtime`], so the whole crate runs (and
//! is tested) against the scripted [`headless::HeadlessRuntime`] as well
//! as the production OpenXR backend.

#![forbid(unsafe_code)]

pub mod backend;
pub mod boundary;
pub mod config;
pub mod error;
pub mod frame;
pub mod headless;
pub mod hmd;
pub mod input;
pub mod layers;
pub mod origin;
pub mod props;
pub mod session;
pub mod status;
pub mod swapchain;
pub mod trackers;
pub mod types;
pub mod version;

pub use backend::{ChainHandle, Runtime, RuntimeError, SpaceHandle};
pub use error::{ShimError, ShimResult};
pub use session::{Session, TrackingOrigin, MAX_FRAMES};
pub use status::SessionStatusBits;
pub use version::{InputStateRevision, VersionProfile};
