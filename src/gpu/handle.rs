//! Move-only GPU object handles bound to a context epoch.
//!
//! Losing the graphics context implicitly destroys every object created on
//! it. [`ContextEpoch`] counts context generations; each [`GpuHandle`]
//! records the epoch it was created in, so a handle that outlives its
//! context is detectable. Stale handles are never dereferenced (debug
//! assertion) and never explicitly released.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{Error, Result};

/// Shared generation counter of the graphics context.
///
/// Cloning shares the counter. It is bumped twice around every
/// teardown/recreate cycle: once before the old objects go away and once
/// after the new context is ready.
#[derive(Debug, Clone, Default)]
pub struct ContextEpoch(Arc<AtomicU64>);

impl ContextEpoch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    /// First bump: everything created so far becomes stale.
    pub fn begin_teardown(&self) -> u64 {
        self.bump()
    }

    /// Second bump: the replacement context is live.
    pub fn finish_recreate(&self) -> u64 {
        self.bump()
    }

    fn bump(&self) -> u64 {
        let epoch = self.0.fetch_add(1, Ordering::AcqRel) + 1;
        log::debug!("gpu: context epoch -> {epoch}");
        epoch
    }
}

/// A GPU object that needs an explicit release on a live context.
pub trait GpuResource {
    fn release(self);
}

impl GpuResource for wgpu::Texture {
    fn release(self) {
        self.destroy();
    }
}

impl GpuResource for wgpu::Buffer {
    fn release(self) {
        self.destroy();
    }
}

/// Objects freed by dropping the last reference.
macro_rules! release_by_drop {
    ($($ty:ty),* $(,)?) => {
        $(
            impl GpuResource for $ty {
                fn release(self) {
                    drop(self);
                }
            }
        )*
    };
}

release_by_drop!(
    wgpu::TextureView,
    wgpu::Sampler,
    wgpu::BindGroup,
    wgpu::BindGroupLayout,
    wgpu::RenderPipeline,
);

#[derive(Debug)]
struct Owned<T> {
    resource: T,
    epoch: ContextEpoch,
    /// Epoch at construction.
    created: u64,
}

/// Unique owner of one GPU object.
///
/// The default handle is empty. Moving out with [`take`](Self::take) (or
/// `std::mem::take`) leaves the source empty. Dropping a non-empty handle
/// releases its object exactly once, unless the context it was created on
/// is gone, in which case the object already went down with it.
#[derive(Debug)]
pub struct GpuHandle<T: GpuResource> {
    inner: Option<Owned<T>>,
}

impl<T: GpuResource> Default for GpuHandle<T> {
    fn default() -> Self {
        Self { inner: None }
    }
}

impl<T: GpuResource> GpuHandle<T> {
    /// Take ownership of `resource`, stamping it with the current epoch.
    pub fn new(resource: T, epoch: &ContextEpoch) -> Self {
        Self {
            inner: Some(Owned {
                created: epoch.current(),
                epoch: epoch.clone(),
                resource,
            }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_none()
    }

    /// True if the context advanced since this handle was created.
    pub fn is_stale(&self) -> bool {
        self.inner
            .as_ref()
            .is_some_and(|o| o.epoch.current() != o.created)
    }

    /// Borrow the object. Using a stale handle is a bug.
    pub fn get(&self) -> Option<&T> {
        let owned = self.inner.as_ref()?;
        debug_assert!(
            owned.epoch.current() == owned.created,
            "GPU handle from context epoch {} used in epoch {}",
            owned.created,
            owned.epoch.current()
        );
        Some(&owned.resource)
    }

    /// Like [`get`](Self::get), but an empty handle is a `Gpu` error.
    pub fn live(&self, what: &str) -> Result<&T> {
        self.get()
            .ok_or_else(|| Error::Gpu(format!("{what} is not allocated")))
    }

    /// Move the object out without releasing it; the handle becomes empty.
    pub fn take(&mut self) -> Option<T> {
        self.inner.take().map(|o| o.resource)
    }

    /// Release now. No-op on an empty handle.
    pub fn reset(&mut self) {
        if let Some(owned) = self.inner.take() {
            if owned.epoch.current() == owned.created {
                owned.resource.release();
            } else {
                log::trace!(
                    "gpu: skipping release of object from epoch {} (now {})",
                    owned.created,
                    owned.epoch.current()
                );
            }
        }
    }
}

impl<T: GpuResource> Drop for GpuHandle<T> {
    fn drop(&mut self) {
        self.reset();
    }
}
