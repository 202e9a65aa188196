#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod animation;
pub mod assets;
pub mod errors;
pub mod scene;

pub use animation::{Animation, Animator, Channel, InterpolationMode, Sampler, TransformKind};
pub use assets::{
    BlobCache, GpuUploader, ResourceConfiguration, ResourceLoader, SceneAsset, SceneAssetBuilder,
    SourceAsset, UploadQueue,
};
pub use errors::{Error, Result};
pub use scene::{BoneBuffers, BoneSink, NodeHandle, RenderableHandle, Skin, TransformHierarchy, TransformTree};
