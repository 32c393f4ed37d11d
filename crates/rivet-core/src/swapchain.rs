//! Image-chain registry.
//!
//! Chains live in a session-owned arena keyed by the backend handle; the
//! client only ever sees the opaque handle. Commit releases the image the
//! client just rendered and, for non-static chains, immediately acquires
//! the next one and queues the chain for the zero-duration wait the next
//! begin-frame performs.

use std::collections::HashMap;

use crate::backend::{ChainCreateInfo, ChainHandle, Runtime, RuntimeResult};

/// Descriptor echoed back to the client, exactly as the chain was created.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChainDesc {
    pub width: i32,
    pub height: i32,
    pub format: i64,
    pub mip_count: i32,
    pub sample_count: i32,
    pub array_size: i32,
    pub static_image: bool,
}

#[derive(Debug)]
pub struct Swapchain {
    pub desc: ChainDesc,
    pub length: u32,
    pub current_index: u32,
    /// Whether an image is currently acquired. Cleared when an acquire
    /// fails so the next commit retries instead of double-releasing.
    acquired: bool,
}

#[derive(Debug, Default)]
pub struct SwapchainRegistry {
    chains: HashMap<ChainHandle, Swapchain>,
}

impl SwapchainRegistry {
    /// Create a chain through the backend and track it. The first image of
    /// a non-static chain is already acquired by the time this returns.
    pub fn create(
        &mut self,
        runtime: &mut dyn Runtime,
        desc: ChainDesc,
    ) -> RuntimeResult<ChainHandle> {
        let info = ChainCreateInfo {
            width: desc.width,
            height: desc.height,
            format: desc.format,
            mip_count: desc.mip_count,
            sample_count: desc.sample_count,
            array_size: desc.array_size,
            static_image: desc.static_image,
        };
        let (handle, length) = runtime.create_swapchain(&info)?;
        self.chains.insert(
            handle,
            Swapchain {
                desc,
                length,
                current_index: 0,
                // The binding acquires image zero so the client can render
                // into a fresh chain immediately.
                acquired: true,
            },
        );
        Ok(handle)
    }

    pub fn get(&self, handle: ChainHandle) -> Option<&Swapchain> {
        self.chains.get(&handle)
    }

    pub fn contains(&self, handle: ChainHandle) -> bool {
        self.chains.contains_key(&handle)
    }

    /// Release the current image; for non-static chains acquire the next
    /// one and report that the chain now needs a wait before use.
    ///
    /// Returns true when the caller must enqueue the chain for the
    /// begin-frame drain.
    pub fn commit(
        &mut self,
        runtime: &mut dyn Runtime,
        handle: ChainHandle,
    ) -> RuntimeResult<bool> {
        let chain = match self.chains.get_mut(&handle) {
            Some(chain) => chain,
            None => return Ok(false),
        };
        if chain.acquired {
            runtime.release_image(handle)?;
            chain.acquired = false;
        }
        if chain.desc.static_image {
            return Ok(false);
        }
        let index = runtime.acquire_image(handle)?;
        chain.current_index = index;
        chain.acquired = true;
        Ok(true)
    }

    pub fn destroy(
        &mut self,
        runtime: &mut dyn Runtime,
        handle: ChainHandle,
    ) -> RuntimeResult<()> {
        if self.chains.remove(&handle).is_some() {
            runtime.destroy_swapchain(handle)?;
        }
        Ok(())
    }

    pub fn handles(&self) -> impl Iterator<Item = ChainHandle> + '_ {
        self.chains.keys().copied()
    }
}

/// Wraps a dummy chain that only exists to answer descriptor queries.
#[derive(Debug, Clone, Copy)]
pub struct MirrorTexture {
    pub dummy: ChainHandle,
    pub width: i32,
    pub height: i32,
    pub format: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{HeadlessRuntime, RecordedCall};

    fn desc() -> ChainDesc {
        ChainDesc {
            width: 256,
            height: 256,
            format: 1,
            mip_count: 1,
            sample_count: 1,
            array_size: 1,
            static_image: false,
        }
    }

    #[test]
    fn commit_releases_then_acquires() {
        let mut runtime = HeadlessRuntime::new();
        let handle = runtime.handle();
        let mut registry = SwapchainRegistry::default();
        let chain = registry.create(&mut runtime, desc()).unwrap();

        handle.clear_calls();
        let needs_wait = registry.commit(&mut runtime, chain).unwrap();
        assert!(needs_wait);
        assert_eq!(
            handle.calls(),
            vec![
                RecordedCall::ReleaseImage(chain),
                RecordedCall::AcquireImage(chain)
            ]
        );
        assert_eq!(registry.get(chain).unwrap().current_index, 1);
    }

    #[test]
    fn static_chain_commit_never_reacquires() {
        let mut runtime = HeadlessRuntime::new();
        let handle = runtime.handle();
        let mut registry = SwapchainRegistry::default();
        let chain = registry
            .create(&mut runtime, ChainDesc {
                static_image: true,
                ..desc()
            })
            .unwrap();

        handle.clear_calls();
        let needs_wait = registry.commit(&mut runtime, chain).unwrap();
        assert!(!needs_wait);
        assert_eq!(handle.calls(), vec![RecordedCall::ReleaseImage(chain)]);
    }

    #[test]
    fn failed_acquire_leaves_index_and_retries() {
        let mut runtime = HeadlessRuntime::new();
        let handle = runtime.handle();
        let mut registry = SwapchainRegistry::default();
        let chain = registry.create(&mut runtime, desc()).unwrap();

        handle.fail_next_acquire();
        assert!(registry.commit(&mut runtime, chain).is_err());
        assert_eq!(registry.get(chain).unwrap().current_index, 0);

        // The next commit skips the release and retries the acquire.
        handle.clear_calls();
        let needs_wait = registry.commit(&mut runtime, chain).unwrap();
        assert!(needs_wait);
        assert_eq!(handle.calls(), vec![RecordedCall::AcquireImage(chain)]);
        assert_eq!(registry.get(chain).unwrap().current_index, 1);
    }

    #[test]
    fn destroy_forwards_to_backend_once() {
        let mut runtime = HeadlessRuntime::new();
        let handle = runtime.handle();
        let mut registry = SwapchainRegistry::default();
        let chain = registry.create(&mut runtime, desc()).unwrap();

        registry.destroy(&mut runtime, chain).unwrap();
        registry.destroy(&mut runtime, chain).unwrap();
        let destroys = handle
            .calls()
            .into_iter()
            .filter(|c| *c == RecordedCall::DestroySwapchain(chain))
            .count();
        assert_eq!(destroys, 1);
        assert!(!registry.contains(chain));
    }
}
