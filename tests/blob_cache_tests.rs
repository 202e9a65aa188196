//! Blob Lifetime Tests
//!
//! Tests for:
//! - Deferred release while uploads are pending
//! - Immediate release when the owner goes away idle
//! - Assets retained until release
//! - Exactly-once release under concurrent completion and teardown

use std::sync::Arc;
use std::thread;

use myth_gltfio::assets::source::SourceAsset;
use myth_gltfio::assets::upload::BlobView;
use myth_gltfio::assets::{BlobCache, SceneAsset};

fn view() -> BlobView {
    BlobView::from_vec(vec![7u8; 16])
}

// ============================================================================
// Protocol
// ============================================================================

#[test]
fn three_uploads_then_owner_destroyed() {
    let cache = BlobCache::new();
    let uploads: Vec<_> = (0..3).map(|_| cache.track_upload(view())).collect();
    assert_eq!(cache.pending_uploads(), 3);

    cache.on_owner_destroyed();
    assert!(!cache.is_released());

    let mut uploads = uploads.into_iter();
    uploads.next().unwrap().complete();
    assert!(!cache.is_released());
    uploads.next().unwrap().complete();
    assert!(!cache.is_released());
    uploads.next().unwrap().complete();
    assert!(cache.is_released());
}

#[test]
fn owner_destroyed_after_completions_releases_immediately() {
    let cache = BlobCache::new();
    for _ in 0..3 {
        cache.track_upload(view()).complete();
    }
    assert!(!cache.is_released());
    cache.on_owner_destroyed();
    assert!(cache.is_released());
}

#[test]
fn dropped_descriptor_counts_as_completion() {
    let cache = BlobCache::new();
    let upload = cache.track_upload(view());
    cache.on_owner_destroyed();
    drop(upload);
    assert!(cache.is_released());
}

#[test]
fn assets_retained_until_release() {
    let asset = SceneAsset::builder(SourceAsset::default()).build();
    let cache = BlobCache::new();
    cache.add_asset(Arc::clone(&asset));
    cache.retain_blobs([Arc::<[u8]>::from(vec![1u8, 2, 3])]);

    let upload = cache.track_upload(view());
    cache.on_owner_destroyed();
    assert_eq!(Arc::strong_count(&asset), 2);
    assert_eq!(cache.retained_assets(), 1);

    upload.complete();
    assert_eq!(Arc::strong_count(&asset), 1);
    assert_eq!(cache.retained_assets(), 0);
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn concurrent_completion_and_teardown_release_once() {
    for _ in 0..200 {
        let asset = SceneAsset::builder(SourceAsset::default()).build();
        let cache = BlobCache::new();
        cache.add_asset(Arc::clone(&asset));

        let uploads: Vec<_> = (0..4).map(|_| cache.track_upload(view())).collect();
        let workers: Vec<_> = uploads
            .into_iter()
            .map(|upload| thread::spawn(move || upload.complete()))
            .collect();

        let owner = {
            let cache = Arc::clone(&cache);
            thread::spawn(move || cache.on_owner_destroyed())
        };

        for worker in workers {
            worker.join().unwrap();
        }
        owner.join().unwrap();

        assert!(cache.is_released());
        assert_eq!(cache.pending_uploads(), 0);
        // Released exactly once: the retained reference was dropped, no more
        assert_eq!(Arc::strong_count(&asset), 1);
    }
}

#[test]
fn uploads_completed_from_queue_on_another_thread() {
    use myth_gltfio::assets::upload::{GpuUploader, UploadQueue, VertexBufferHandle};

    let cache = BlobCache::new();
    let mut queue = UploadQueue::new();
    for _ in 0..5 {
        queue.set_vertex_buffer_at(VertexBufferHandle::default(), 0, cache.track_upload(view()));
    }
    cache.on_owner_destroyed();
    assert_eq!(queue.pending(), 5);

    let drain = queue.clone();
    let completed = thread::spawn(move || drain.complete_all()).join().unwrap();
    assert_eq!(completed, 5);
    assert!(cache.is_released());
}
