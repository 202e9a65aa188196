//! Asset ingestion
//!
//! - [`source`]: parsed input records and the accessor decoder entry points
//! - [`scene_asset`]: the loaded asset and its bindings
//! - [`resource_loader`]: materializes buffers, issues uploads, derives tangents
//! - [`blob_cache`]: keeps blobs alive until their uploads complete
//! - [`upload`]: the GPU-resource collaborator contract

pub mod accessor;
pub mod blob_cache;
pub mod io;
pub mod resource_loader;
pub mod scene_asset;
pub mod source;
pub mod tangent_frame;
pub mod upload;

#[cfg(feature = "gltf")]
mod gltf_source;

pub use accessor::{AccessorLayout, AccessorType, ComponentType};
pub use blob_cache::BlobCache;
pub use io::{BufferReader, BufferStore, FileBufferReader};
pub use resource_loader::{ResourceConfiguration, ResourceLoader};
pub use scene_asset::{
    BindingData, BindingTarget, BufferBinding, DecodedTexture, SceneAsset, SceneAssetBuilder,
    TextureBinding, TextureSource,
};
pub use source::{
    AccessorDef, AnimationDef, AttributeSemantic, BlobMap, BufferSource, BufferViewDef, ChannelDef,
    MeshDef, NodeDef, PrimitiveDef, SamplerDef, SourceAsset,
};
pub use upload::{
    BlobView, BufferDescriptor, GpuUploader, IndexBufferHandle, PendingUpload, UploadQueue,
    UploadTarget, VertexBufferHandle,
};
