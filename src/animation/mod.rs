//! Animation System
//!
//! Keyframe playback for loaded assets:
//! - [`Sampler`]: sorted keyframe timeline plus a flat value buffer
//! - [`Animation`], [`Channel`]: the clip model, one channel per driven node transform
//! - [`Animator`]: evaluates a clip at a time and refreshes skin bone palettes
//!
//! Every interpolation mode is currently blended linearly.

mod values;
pub mod animator;
pub mod clip;
pub mod sampler;

pub use animator::Animator;
pub use clip::{Animation, Channel, TransformKind};
pub use sampler::{Bracket, InterpolationMode, Keyframe, Sampler};
pub use values::Interpolatable;
