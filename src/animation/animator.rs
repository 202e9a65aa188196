use glam::{Mat4, Quat, Vec3};

use crate::animation::clip::{Animation, Channel, TransformKind};
use crate::animation::sampler::{Bracket, Sampler};
use crate::animation::values::Interpolatable;
use crate::assets::scene_asset::SceneAsset;
use crate::errors::{Error, Result};
use crate::scene::{BoneSink, NodeHandle, Skin, TransformHierarchy};

/// Plays back the animations of one loaded asset and refreshes its skins.
///
/// Evaluation is stateless: [`Animator::apply_animation`] may be called with
/// any time in any order. The only side effect is overwriting local transforms
/// in the supplied hierarchy.
#[derive(Debug, Clone, Default)]
pub struct Animator {
    animations: Vec<Animation>,
    skins: Vec<Skin>,
    // Reused across update_bone_matrices calls
    bone_scratch: Vec<Mat4>,
}

impl Animator {
    /// Builds the clip model for every animation in `asset`.
    ///
    /// Keyframe data is read from the asset's animation buffer, so this must
    /// run after resources are loaded and before source data is released.
    #[must_use]
    pub fn new(asset: &SceneAsset) -> Self {
        let data = asset.binding_data();
        let blobs = data.animation_blobs();
        let source = asset.source();

        let animations = source
            .animations
            .iter()
            .map(|def| Animation::from_def(def, source, &blobs, asset.node_map()))
            .collect::<Vec<_>>();

        log::debug!(
            "Animator built {} animation(s), {} skin(s)",
            animations.len(),
            asset.skins().len()
        );

        Self::from_parts(animations, asset.skins().to_vec())
    }

    /// Wraps already-built clips and skins.
    #[must_use]
    pub fn from_parts(animations: Vec<Animation>, skins: Vec<Skin>) -> Self {
        Self {
            animations,
            skins,
            bone_scratch: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn animation_count(&self) -> usize {
        self.animations.len()
    }

    #[must_use]
    pub fn animation(&self, index: usize) -> Option<&Animation> {
        self.animations.get(index)
    }

    #[must_use]
    pub fn animation_name(&self, index: usize) -> Option<&str> {
        self.animations.get(index)?.name.as_deref()
    }

    #[must_use]
    pub fn animation_duration(&self, index: usize) -> Option<f32> {
        self.animations.get(index).map(|a| a.duration)
    }

    /// Evaluates animation `index` at `time` seconds and writes the resulting
    /// local transforms into `hierarchy`.
    ///
    /// `time` wraps into `[0, duration)`; negative times wrap from the end.
    /// Each channel replaces its node's whole local transform, so when several
    /// channels target one node the last one wins.
    pub fn apply_animation(
        &self,
        index: usize,
        time: f32,
        hierarchy: &mut impl TransformHierarchy,
    ) -> Result<()> {
        let animation = self
            .animations
            .get(index)
            .ok_or_else(|| Error::AssetIndexOutOfBounds {
                context: "animation".to_string(),
                index,
            })?;

        let duration = animation.duration;
        let time = if duration > 0.0 {
            time.rem_euclid(duration)
        } else {
            0.0
        };

        for channel in &animation.channels {
            let Some(sampler) = animation.samplers.get(channel.sampler) else {
                continue;
            };
            if let Some((node, local)) = evaluate_channel(channel, sampler, time, duration) {
                hierarchy.set_transform(node, local);
            }
        }
        Ok(())
    }

    /// Recomputes every skin's bone palette from the current world transforms
    /// and pushes it to each renderable the skin targets.
    ///
    /// Call after [`Animator::apply_animation`] for the frame.
    pub fn update_bone_matrices(
        &mut self,
        hierarchy: &impl TransformHierarchy,
        sink: &mut impl BoneSink,
    ) {
        for skin in &self.skins {
            skin.compute_joint_matrices(hierarchy, &mut self.bone_scratch);
            for &target in &skin.targets {
                sink.set_bones(target, &self.bone_scratch);
            }
        }
    }
}

fn evaluate_channel(
    channel: &Channel,
    sampler: &Sampler,
    time: f32,
    duration: f32,
) -> Option<(NodeHandle, Mat4)> {
    let node = channel.target?;
    let kind = channel.kind?;
    let Bracket { prev, next, t } = sampler.bracket(time, duration)?;

    let local = match kind {
        TransformKind::Translation => {
            let value = blend_vec3(sampler, prev.index, next.index, t)?;
            Mat4::from_translation(value)
        }
        TransformKind::Scale => {
            let value = blend_vec3(sampler, prev.index, next.index, t)?;
            Mat4::from_scale(value)
        }
        TransformKind::Rotation => {
            let a = sampler.quat_at(prev.index)?;
            let b = sampler.quat_at(next.index)?;
            Mat4::from_quat(Quat::interpolate_linear(a, b, t))
        }
    };
    Some((node, local))
}

fn blend_vec3(sampler: &Sampler, prev: usize, next: usize, t: f32) -> Option<Vec3> {
    let a = sampler.vec3_at(prev)?;
    let b = sampler.vec3_at(next)?;
    Some(Vec3::interpolate_linear(a, b, t))
}
