use std::str::FromStr;

use crate::animation::sampler::{InterpolationMode, Sampler};
use crate::assets::source::{AnimationDef, BlobMap, SamplerDef, SourceAsset};
use crate::errors::AnimationError;
use crate::scene::NodeHandle;

/// Node transform component a channel drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformKind {
    Translation,
    Rotation,
    Scale,
}

impl FromStr for TransformKind {
    type Err = AnimationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "translation" => Ok(Self::Translation),
            "rotation" => Ok(Self::Rotation),
            "scale" => Ok(Self::Scale),
            // Morph target weights are not driven by this engine
            other => Err(AnimationError::UnsupportedTargetPath(other.to_string())),
        }
    }
}

/// Binds a sampler to one node transform component.
///
/// A channel with no target node or no supported kind is inert: it is kept
/// so channel indices match the source, but playback skips it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Channel {
    pub sampler: usize,
    pub target: Option<NodeHandle>,
    pub kind: Option<TransformKind>,
}

impl Channel {
    #[inline]
    #[must_use]
    pub fn is_inert(&self) -> bool {
        self.target.is_none() || self.kind.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Animation {
    pub name: Option<String>,
    /// Latest final keyframe time over samplers with at least two keyframes
    pub duration: f32,
    pub samplers: Vec<Sampler>,
    pub channels: Vec<Channel>,
}

impl Animation {
    /// Builds a playable clip from a parsed animation record.
    ///
    /// Unreadable samplers and unresolvable channels are logged and left inert
    /// instead of failing the whole clip.
    #[must_use]
    pub fn from_def(
        def: &AnimationDef,
        source: &SourceAsset,
        blobs: &BlobMap,
        node_map: &[NodeHandle],
    ) -> Self {
        let samplers: Vec<Sampler> = def
            .samplers
            .iter()
            .map(|sampler| load_sampler(sampler, source, blobs))
            .collect();

        let duration = samplers
            .iter()
            .filter(|s| s.keyframe_count() >= 2)
            .filter_map(Sampler::last_time)
            .fold(0.0_f32, f32::max);

        let channels = def
            .channels
            .iter()
            .map(|channel| {
                let target = node_map.get(channel.target_node).copied();
                if target.is_none() {
                    log::warn!(
                        "Animation channel targets unknown node {}",
                        channel.target_node
                    );
                }

                let kind = match channel.target_path.parse::<TransformKind>() {
                    Ok(kind) => Some(kind),
                    Err(e) => {
                        log::error!("{e}");
                        None
                    }
                };

                if channel.sampler >= samplers.len() {
                    log::error!("Animation channel references missing sampler {}", channel.sampler);
                }

                Channel {
                    sampler: channel.sampler,
                    target,
                    kind,
                }
            })
            .collect();

        Self {
            name: def.name.clone(),
            duration,
            samplers,
            channels,
        }
    }
}

fn load_sampler(def: &SamplerDef, source: &SourceAsset, blobs: &BlobMap) -> Sampler {
    let times = match source.read_accessor_f32(def.input, blobs) {
        Ok(times) => times,
        Err(e) => {
            log::error!("Unable to read keyframe times: {e}");
            Vec::new()
        }
    };

    let components = source
        .accessors
        .get(def.output)
        .map_or(1, |a| a.accessor_type.component_count());

    let (values, interpolation) = match def.interpolation.parse::<InterpolationMode>() {
        Ok(mode) => {
            if mode != InterpolationMode::Linear {
                log::warn!("{mode:?} interpolation is played back as linear");
            }
            let values = source.decode_accessor(def.output, blobs).unwrap_or_else(|e| {
                log::error!("Unable to read keyframe values: {e}");
                Vec::new()
            });
            (values, mode)
        }
        Err(e) => {
            log::error!("{e}");
            (Vec::new(), InterpolationMode::Linear)
        }
    };

    // An empty value buffer leaves the sampler inert; its timeline still counts toward duration
    Sampler::new(&times, values, components, interpolation)
}
