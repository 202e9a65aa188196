//! Blob Lifetime Tracker
//!
//! Keeps raw source blobs and the assets that reference them alive while GPU
//! uploads are in flight.
//!
//! # Teardown
//!
//! The cache is released exactly once, when both of these have happened:
//! - the pending upload count dropped to zero
//! - the owning loader was destroyed
//!
//! Both facts live in one atomic word (bit 0 = owner destroyed, the rest =
//! pending count), so the thread whose update observes the other fact already
//! true is the single winner that performs the release.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::assets::scene_asset::SceneAsset;
use crate::assets::upload::{BlobView, BufferDescriptor};

const OWNER_DESTROYED: usize = 1;
const PENDING_UNIT: usize = 2;

#[derive(Default)]
struct CacheContents {
    assets: Vec<Arc<SceneAsset>>,
    blobs: Vec<Arc<[u8]>>,
}

pub struct BlobCache {
    state: AtomicUsize,
    contents: Mutex<Option<CacheContents>>,
    released: AtomicBool,
}

impl BlobCache {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: AtomicUsize::new(0),
            contents: Mutex::new(Some(CacheContents::default())),
            released: AtomicBool::new(false),
        })
    }

    /// Retains `asset` until the cache is released.
    pub fn add_asset(&self, asset: Arc<SceneAsset>) {
        match self.contents.lock().as_mut() {
            Some(contents) => contents.assets.push(asset),
            None => log::warn!("Asset registered with an already released blob cache"),
        }
    }

    /// Retains materialized source blobs until the cache is released.
    pub fn retain_blobs(&self, blobs: impl IntoIterator<Item = Arc<[u8]>>) {
        if let Some(contents) = self.contents.lock().as_mut() {
            contents.blobs.extend(blobs);
        }
    }

    /// Wraps `data` in a descriptor whose completion is tracked by this cache.
    #[must_use]
    pub fn track_upload(self: &Arc<Self>, data: BlobView) -> BufferDescriptor {
        let pending = self.state.fetch_add(PENDING_UNIT, Ordering::AcqRel) / PENDING_UNIT + 1;
        log::trace!("Upload issued, {pending} pending");

        let cache = Arc::clone(self);
        BufferDescriptor::with_callback(data, move || cache.on_upload_complete())
    }

    fn on_upload_complete(&self) {
        let prev = self.state.fetch_sub(PENDING_UNIT, Ordering::AcqRel);
        debug_assert!(prev >= PENDING_UNIT, "upload completed with none pending");
        log::trace!("Upload complete, {} pending", prev / PENDING_UNIT - 1);

        // Last pending upload, and the owner is already gone
        if prev == PENDING_UNIT | OWNER_DESTROYED {
            self.release();
        }
    }

    /// Marks the owning loader as destroyed.
    ///
    /// Releases immediately when nothing is pending, otherwise defers to the
    /// last upload completion.
    pub fn on_owner_destroyed(&self) {
        let prev = self.state.fetch_or(OWNER_DESTROYED, Ordering::AcqRel);
        if prev & OWNER_DESTROYED != 0 {
            log::warn!("Blob cache owner destroyed twice");
            return;
        }
        if prev == 0 {
            self.release();
        } else {
            log::debug!(
                "Blob cache release deferred, {} upload(s) pending",
                prev / PENDING_UNIT
            );
        }
    }

    #[inline]
    #[must_use]
    pub fn pending_uploads(&self) -> usize {
        self.state.load(Ordering::Acquire) / PENDING_UNIT
    }

    #[inline]
    #[must_use]
    pub fn is_owner_destroyed(&self) -> bool {
        self.state.load(Ordering::Acquire) & OWNER_DESTROYED != 0
    }

    #[inline]
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Number of assets currently retained.
    #[must_use]
    pub fn retained_assets(&self) -> usize {
        self.contents.lock().as_ref().map_or(0, |c| c.assets.len())
    }

    fn release(&self) {
        let contents = self.contents.lock().take();
        if let Some(contents) = contents {
            log::debug!(
                "Blob cache released {} asset(s), {} blob(s)",
                contents.assets.len(),
                contents.blobs.len()
            );
            // Dropped outside the lock; asset teardown may be arbitrarily heavy
            drop(contents);
        }
        self.released.store(true, Ordering::Release);
    }
}

impl std::fmt::Debug for BlobCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobCache")
            .field("pending_uploads", &self.pending_uploads())
            .field("owner_destroyed", &self.is_owner_destroyed())
            .field("released", &self.is_released())
            .finish()
    }
}
