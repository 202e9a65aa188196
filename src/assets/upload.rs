//! GPU Upload Contract
//!
//! The ingestion pipeline never talks to a graphics API directly. It hands
//! [`BufferDescriptor`]s to a [`GpuUploader`]; the uploader copies the bytes
//! whenever it likes, on whatever thread it likes, and then drops (or
//! [`complete`](BufferDescriptor::complete)s) the descriptor. The descriptor's
//! completion callback runs exactly once in either case.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use slotmap::new_key_type;

new_key_type! {
    pub struct VertexBufferHandle;
    pub struct IndexBufferHandle;
}

/// A shared, immutable byte range of a source blob.
#[derive(Clone)]
pub struct BlobView {
    blob: Arc<[u8]>,
    range: Range<usize>,
}

impl BlobView {
    /// Views `range` of `blob`, or `None` if the range falls outside it.
    #[must_use]
    pub fn new(blob: Arc<[u8]>, range: Range<usize>) -> Option<Self> {
        if range.start > range.end || range.end > blob.len() {
            return None;
        }
        Some(Self { blob, range })
    }

    /// Views an owned buffer in full.
    #[must_use]
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        let len = bytes.len();
        Self {
            blob: bytes.into(),
            range: 0..len,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.blob[self.range.clone()]
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.range.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

impl fmt::Debug for BlobView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobView").field("range", &self.range).finish()
    }
}

pub type UploadCallback = Box<dyn FnOnce() + Send + 'static>;

/// Bytes to upload plus a completion callback.
///
/// The callback fires when the descriptor is completed or dropped, whichever
/// comes first, and never more than once.
pub struct BufferDescriptor {
    data: BlobView,
    callback: Option<UploadCallback>,
}

impl BufferDescriptor {
    #[must_use]
    pub fn new(data: BlobView) -> Self {
        Self {
            data,
            callback: None,
        }
    }

    #[must_use]
    pub fn with_callback(data: BlobView, callback: impl FnOnce() + Send + 'static) -> Self {
        Self {
            data,
            callback: Some(Box::new(callback)),
        }
    }

    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.data.as_bytes()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Signals that the GPU copy finished.
    pub fn complete(mut self) {
        self.fire();
    }

    fn fire(&mut self) {
        if let Some(callback) = self.callback.take() {
            callback();
        }
    }
}

impl Drop for BufferDescriptor {
    fn drop(&mut self) {
        self.fire();
    }
}

impl fmt::Debug for BufferDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferDescriptor")
            .field("len", &self.len())
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

/// GPU-resource collaborator receiving asynchronous buffer uploads.
pub trait GpuUploader {
    fn set_vertex_buffer_at(&mut self, buffer: VertexBufferHandle, slot: u32, data: BufferDescriptor);
    fn set_index_buffer(&mut self, buffer: IndexBufferHandle, data: BufferDescriptor);
}

impl<T: GpuUploader + ?Sized> GpuUploader for &mut T {
    fn set_vertex_buffer_at(&mut self, buffer: VertexBufferHandle, slot: u32, data: BufferDescriptor) {
        (**self).set_vertex_buffer_at(buffer, slot, data);
    }

    fn set_index_buffer(&mut self, buffer: IndexBufferHandle, data: BufferDescriptor) {
        (**self).set_index_buffer(buffer, data);
    }
}

// ============================================================================
// Channel-backed uploader
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadTarget {
    Vertex { buffer: VertexBufferHandle, slot: u32 },
    Index { buffer: IndexBufferHandle },
}

#[derive(Debug)]
pub struct PendingUpload {
    pub target: UploadTarget,
    pub data: BufferDescriptor,
}

/// A [`GpuUploader`] that queues submissions on a channel.
///
/// Clones share the same queue, so the loader can own one end while a render
/// or worker thread drains and completes uploads from another.
#[derive(Debug, Clone)]
pub struct UploadQueue {
    tx: flume::Sender<PendingUpload>,
    rx: flume::Receiver<PendingUpload>,
}

impl Default for UploadQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadQueue {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = flume::unbounded();
        Self { tx, rx }
    }

    /// Number of submitted uploads not yet taken off the queue.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    #[must_use]
    pub fn try_next(&self) -> Option<PendingUpload> {
        self.rx.try_recv().ok()
    }

    /// Takes every queued upload off the queue without completing it.
    #[must_use]
    pub fn drain(&self) -> Vec<PendingUpload> {
        self.rx.drain().collect()
    }

    /// Completes every queued upload, returning how many were completed.
    pub fn complete_all(&self) -> usize {
        let mut completed = 0;
        while let Some(upload) = self.try_next() {
            upload.data.complete();
            completed += 1;
        }
        completed
    }

    fn submit(&self, upload: PendingUpload) {
        // The receiver lives in self, so the channel cannot be disconnected;
        // a rejected upload is dropped, which still fires its callback.
        if let Err(flume::SendError(rejected)) = self.tx.send(upload) {
            log::warn!("Upload queue closed, dropping {:?}", rejected.target);
        }
    }
}

impl GpuUploader for UploadQueue {
    fn set_vertex_buffer_at(&mut self, buffer: VertexBufferHandle, slot: u32, data: BufferDescriptor) {
        self.submit(PendingUpload {
            target: UploadTarget::Vertex { buffer, slot },
            data,
        });
    }

    fn set_index_buffer(&mut self, buffer: IndexBufferHandle, data: BufferDescriptor) {
        self.submit(PendingUpload {
            target: UploadTarget::Index { buffer },
            data,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn blob_view_rejects_out_of_range() {
        let blob: Arc<[u8]> = vec![0u8; 8].into();
        assert!(BlobView::new(blob.clone(), 4..8).is_some());
        assert!(BlobView::new(blob, 4..9).is_none());
    }

    #[test]
    fn callback_runs_once_on_complete() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let desc = BufferDescriptor::with_callback(BlobView::from_vec(vec![1, 2, 3]), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        desc.complete();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn callback_runs_on_drop() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        drop(BufferDescriptor::with_callback(BlobView::from_vec(vec![0]), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
