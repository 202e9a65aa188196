//! Scene collaborators
//!
//! The playback engine does not own a scene graph. It talks to two narrow
//! contracts instead:
//! - [`TransformHierarchy`]: write a node's local transform, read its world transform
//! - [`BoneSink`]: receive the bone matrices for a skinned renderable
//!
//! [`TransformTree`] and [`BoneBuffers`] are small reference implementations
//! used by tools and tests.

pub mod hierarchy;
pub mod skin;

pub use hierarchy::TransformTree;
pub use skin::{BoneBuffers, Skin};

use glam::Mat4;
use slotmap::new_key_type;

new_key_type! {
    pub struct NodeHandle;
    pub struct RenderableHandle;
}

/// Read/write contract of the external transform hierarchy.
pub trait TransformHierarchy {
    /// Replaces the local transform of `node`.
    fn set_transform(&mut self, node: NodeHandle, local: Mat4);

    /// Current world transform of `node`, or `None` if the node is unknown.
    fn world_transform(&self, node: NodeHandle) -> Option<Mat4>;
}

/// Write contract of the external renderable (skinning) resource.
pub trait BoneSink {
    /// Replaces the bone palette of `renderable`.
    fn set_bones(&mut self, renderable: RenderableHandle, bones: &[Mat4]);
}
