//! Environment-variable configuration, read once at initialization.

use std::env;

pub const DEFAULT_SWAPCHAIN_DEPTH: i32 = 3;

#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Override for the client minor version (`RIVET_MINOR_VERSION`).
    pub minor_version: Option<u32>,
    /// Default image-chain length reported to clients
    /// (`RIVET_SWAPCHAIN_DEPTH`).
    pub swapchain_depth: i32,
    /// Suppress depth-layer submission even when the runtime supports it
    /// (`RIVET_NO_DEPTH`).
    pub disable_depth: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            minor_version: None,
            swapchain_depth: DEFAULT_SWAPCHAIN_DEPTH,
            disable_depth: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(v) = env::var("RIVET_MINOR_VERSION") {
            match v.parse() {
                Ok(minor) => cfg.minor_version = Some(minor),
                Err(_) => log::warn!("ignoring malformed RIVET_MINOR_VERSION={v}"),
            }
        }
        if let Ok(v) = env::var("RIVET_SWAPCHAIN_DEPTH") {
            match v.parse() {
                Ok(depth) if depth > 0 => cfg.swapchain_depth = depth,
                _ => log::warn!("ignoring malformed RIVET_SWAPCHAIN_DEPTH={v}"),
            }
        }
        cfg.disable_depth = env::var("RIVET_NO_DEPTH").is_ok();
        cfg
    }
}
