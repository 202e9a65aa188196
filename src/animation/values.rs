use glam::{Quat, Vec3, Vec4};

/// Keyframe value types the playback engine can blend between.
pub trait Interpolatable: Copy + Sized {
    /// Blends `start` → `end` at `t ∈ [0, 1]`.
    ///
    /// Must return `start` exactly at `t = 0` and `end` exactly at `t = 1`
    /// where the representation allows it.
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self;
}

impl Interpolatable for Vec3 {
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        // Weighted form keeps both endpoints exact, unlike `start + (end - start) * t`
        start * (1.0 - t) + end * t
    }
}

impl Interpolatable for Quat {
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        // Keyframes drift off unit length after quantization; slerp expects unit input
        let start = unit_or_identity(start);
        let end = unit_or_identity(end);
        start.slerp(end, t).normalize()
    }
}

fn unit_or_identity(q: Quat) -> Quat {
    Quat::from_vec4(Vec4::from(q).try_normalize().unwrap_or(Vec4::W))
}
