use glam::Mat4;
use rustc_hash::FxHashMap;

use crate::scene::{BoneSink, NodeHandle, RenderableHandle, TransformHierarchy};

/// Skinning record of a loaded asset.
#[derive(Debug, Clone, Default)]
pub struct Skin {
    pub name: String,

    // Ordered joint list; joints[i] corresponds to bone index i in the shader
    pub joints: Vec<NodeHandle>,

    // Static data from the asset: transforms mesh-space vertices into joint-local space.
    // Missing trailing entries are treated as identity.
    pub inverse_bind_matrices: Vec<Mat4>,

    /// Renderables that receive this skin's bone palette
    pub targets: Vec<RenderableHandle>,
}

impl Skin {
    /// Computes `world(joint[i]) * inverse_bind[i]` for every joint into `out`.
    ///
    /// Joints that the hierarchy does not know keep an identity world transform.
    pub fn compute_joint_matrices(&self, hierarchy: &impl TransformHierarchy, out: &mut Vec<Mat4>) {
        out.clear();
        out.reserve(self.joints.len());

        for (i, &joint) in self.joints.iter().enumerate() {
            // 1. Current world transform (written by the animator this frame)
            let world = hierarchy.world_transform(joint).unwrap_or_else(|| {
                log::warn!("Skin '{}': joint {i} has no transform", self.name);
                Mat4::IDENTITY
            });

            // 2. Joint-local → skin space
            let ibm = self
                .inverse_bind_matrices
                .get(i)
                .copied()
                .unwrap_or(Mat4::IDENTITY);

            out.push(world * ibm);
        }
    }
}

/// Bone palettes keyed by renderable.
#[derive(Debug, Clone, Default)]
pub struct BoneBuffers {
    bones: FxHashMap<RenderableHandle, Vec<Mat4>>,
}

impl BoneBuffers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, renderable: RenderableHandle) -> Option<&[Mat4]> {
        self.bones.get(&renderable).map(Vec::as_slice)
    }
}

impl BoneSink for BoneBuffers {
    fn set_bones(&mut self, renderable: RenderableHandle, bones: &[Mat4]) {
        let slot = self.bones.entry(renderable).or_default();
        slot.clear();
        slot.extend_from_slice(bones);
    }
}
