use std::str::FromStr;

use glam::{Quat, Vec3};

use crate::errors::AnimationError;

/// Declared interpolation of a sampler.
///
/// Playback currently blends every mode linearly; `Step` and `CubicSpline`
/// are recorded so callers can detect them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpolationMode {
    #[default]
    Linear,
    Step,
    CubicSpline,
}

impl FromStr for InterpolationMode {
    type Err = AnimationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LINEAR" => Ok(Self::Linear),
            "STEP" => Ok(Self::Step),
            "CUBICSPLINE" => Ok(Self::CubicSpline),
            other => Err(AnimationError::UnknownInterpolation(other.to_string())),
        }
    }
}

/// One entry of a sampler timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe {
    pub time: f32,
    /// Keyframe position in the source value buffer
    pub index: usize,
}

/// The two keyframes surrounding a playback time and the blend factor between them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    pub prev: Keyframe,
    pub next: Keyframe,
    pub t: f32,
}

/// Time → value mapping for one animated quantity.
#[derive(Debug, Clone, Default)]
pub struct Sampler {
    // Sorted by time, strictly increasing
    keyframes: Vec<Keyframe>,
    values: Vec<f32>,
    components: usize,
    interpolation: InterpolationMode,
}

impl Sampler {
    /// Builds a sampler from raw keyframe times and a flat value buffer.
    ///
    /// Times are sorted; when two keyframes share a timestamp the later one
    /// in source order wins. NaN timestamps are dropped.
    #[must_use]
    pub fn new(
        times: &[f32],
        values: Vec<f32>,
        components: usize,
        interpolation: InterpolationMode,
    ) -> Self {
        let mut keyframes: Vec<Keyframe> = times
            .iter()
            .enumerate()
            .filter(|(index, time)| {
                if time.is_nan() {
                    log::warn!("Dropping keyframe {index} with NaN time");
                    return false;
                }
                true
            })
            .map(|(index, &time)| Keyframe { time, index })
            .collect();

        // Stable sort keeps source order among equal times, so dedup can keep the last one
        keyframes.sort_by(|a, b| a.time.total_cmp(&b.time));
        keyframes.dedup_by(|later, earlier| {
            #[allow(clippy::float_cmp)]
            let same = later.time == earlier.time;
            if same {
                earlier.index = later.index;
            }
            same
        });

        Self {
            keyframes,
            values,
            components,
            interpolation,
        }
    }

    #[inline]
    #[must_use]
    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    #[inline]
    #[must_use]
    pub fn keyframe_count(&self) -> usize {
        self.keyframes.len()
    }

    #[inline]
    #[must_use]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    #[inline]
    #[must_use]
    pub fn components(&self) -> usize {
        self.components
    }

    #[inline]
    #[must_use]
    pub fn interpolation(&self) -> InterpolationMode {
        self.interpolation
    }

    #[must_use]
    pub fn last_time(&self) -> Option<f32> {
        self.keyframes.last().map(|k| k.time)
    }

    /// Selects the keyframes to blend at `time` (already reduced into `[0, duration)`).
    ///
    /// - past the last keyframe: last → first, wrapping through `duration`
    /// - at or before the first keyframe: first → first (`t = 0`)
    /// - otherwise: the keyframe before the first one `>= time`, and that one
    ///
    /// Returns `None` with fewer than two keyframes.
    #[must_use]
    pub fn bracket(&self, time: f32, duration: f32) -> Option<Bracket> {
        let keys = &self.keyframes;
        if keys.len() < 2 {
            return None;
        }

        // Lower bound: first keyframe with time >= `time`
        let found = keys.partition_point(|k| k.time < time);
        let (prev, next) = if found == keys.len() {
            (keys[keys.len() - 1], keys[0])
        } else if found == 0 {
            (keys[0], keys[0])
        } else {
            (keys[found - 1], keys[found])
        };

        let mut interval = next.time - prev.time;
        if interval < 0.0 {
            interval += duration;
        }
        #[allow(clippy::float_cmp)]
        let t = if interval == 0.0 {
            0.0
        } else {
            (time - prev.time) / interval
        };

        Some(Bracket { prev, next, t })
    }

    /// Position in `values` of keyframe `index` for an element `stride` floats wide.
    ///
    /// Cubic-spline outputs store `[in_tangent, value, out_tangent]` per keyframe;
    /// the middle entry is the keyframe value.
    fn value_offset(&self, index: usize, stride: usize) -> usize {
        match self.interpolation {
            InterpolationMode::CubicSpline => (index * 3 + 1) * stride,
            _ => index * stride,
        }
    }

    #[must_use]
    pub fn vec3_at(&self, index: usize) -> Option<Vec3> {
        let start = self.value_offset(index, 3);
        self.values.get(start..start + 3).map(Vec3::from_slice)
    }

    #[must_use]
    pub fn quat_at(&self, index: usize) -> Option<Quat> {
        let start = self.value_offset(index, 4);
        self.values.get(start..start + 4).map(Quat::from_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(times: &[f32]) -> Sampler {
        Sampler::new(times, vec![0.0; times.len()], 1, InterpolationMode::Linear)
    }

    #[test]
    fn unsorted_times_are_ordered() {
        let s = scalar(&[2.0, 0.0, 1.0]);
        let order: Vec<_> = s.keyframes().iter().map(|k| (k.time, k.index)).collect();
        assert_eq!(order, vec![(0.0, 1), (1.0, 2), (2.0, 0)]);
    }

    #[test]
    fn duplicate_time_keeps_later_index() {
        let s = scalar(&[0.0, 1.0, 1.0, 2.0]);
        assert_eq!(s.keyframe_count(), 3);
        assert_eq!(s.keyframes()[1], Keyframe { time: 1.0, index: 2 });
    }

    #[test]
    fn nan_times_are_dropped() {
        let s = scalar(&[0.0, f32::NAN, 1.0]);
        assert_eq!(s.keyframe_count(), 2);
    }

    #[test]
    fn interpolation_parses_gltf_names() {
        assert_eq!("STEP".parse::<InterpolationMode>(), Ok(InterpolationMode::Step));
        assert!("HERMITE".parse::<InterpolationMode>().is_err());
    }

    #[test]
    fn cubic_spline_reads_middle_entry() {
        let values = vec![
            9.0, 9.0, 9.0, 1.0, 2.0, 3.0, 9.0, 9.0, 9.0, // frame 0
            9.0, 9.0, 9.0, 4.0, 5.0, 6.0, 9.0, 9.0, 9.0, // frame 1
        ];
        let s = Sampler::new(&[0.0, 1.0], values, 3, InterpolationMode::CubicSpline);
        assert_eq!(s.vec3_at(1), Some(Vec3::new(4.0, 5.0, 6.0)));
    }
}
