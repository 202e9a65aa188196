//! Tangent-Frame Quaternions
//!
//! Encodes each vertex's (tangent, bitangent, normal) basis as a single unit
//! quaternion. Reflected frames (bitangent sign -1) are stored as a quaternion
//! with negative `w`; since `q` and `-q` describe the same rotation, the
//! shader recovers the handedness from the sign alone.

use glam::{Mat3, Quat, Vec3, Vec4};
use half::f16;

/// Smallest `|w|` kept after packing, so the handedness sign survives 16-bit storage.
const W_BIAS: f32 = 1.0 / 32767.0;

/// Computes one tangent-frame quaternion per vertex.
///
/// Without tangents an arbitrary tangent orthogonal to the normal is chosen.
/// With tangents, `w` of each tangent carries the bitangent sign.
#[must_use]
pub fn tangent_quaternions(normals: &[Vec3], tangents: Option<&[Vec4]>) -> Vec<Quat> {
    match tangents {
        Some(tangents) => normals
            .iter()
            .zip(tangents)
            .map(|(&n, &t)| frame_from_normal_tangent(n, t))
            .collect(),
        None => normals.iter().map(|&n| frame_from_normal(n)).collect(),
    }
}

fn frame_from_normal(normal: Vec3) -> Quat {
    let n = normal.try_normalize().unwrap_or(Vec3::Z);
    let t = n.any_orthonormal_vector();
    let b = n.cross(t);
    pack_tangent_frame(t, b, n)
}

fn frame_from_normal_tangent(normal: Vec3, tangent: Vec4) -> Quat {
    let n = normal.try_normalize().unwrap_or(Vec3::Z);
    // Gram-Schmidt against the normal; degenerate tangents fall back to an arbitrary one
    let t = (tangent.truncate() - n * n.dot(tangent.truncate()))
        .try_normalize()
        .unwrap_or_else(|| n.any_orthonormal_vector());
    let sign = if tangent.w < 0.0 { -1.0 } else { 1.0 };
    let b = n.cross(t) * sign;
    pack_tangent_frame(t, b, n)
}

/// Packs an orthonormal (tangent, bitangent, normal) basis.
///
/// The result has `|w| >= W_BIAS`; `w < 0` marks a reflected basis.
#[must_use]
pub fn pack_tangent_frame(tangent: Vec3, bitangent: Vec3, normal: Vec3) -> Quat {
    // Rebuild a right-handed rotation; the reflection is re-applied through the sign
    let rotation = Mat3::from_cols(tangent, normal.cross(tangent), normal);
    let mut q = Quat::from_mat3(&rotation).normalize();
    if q.w < 0.0 {
        q = -q;
    }

    if q.w < W_BIAS {
        let factor = (1.0 - W_BIAS * W_BIAS).sqrt();
        q = Quat::from_xyzw(q.x * factor, q.y * factor, q.z * factor, W_BIAS);
    }

    if normal.cross(tangent).dot(bitangent) < 0.0 {
        q = -q;
    }
    q
}

/// Serializes quaternions as four IEEE half floats each (x, y, z, w), native byte order.
#[must_use]
pub fn pack_half4(quats: &[Quat]) -> Vec<u8> {
    let halves: Vec<[f16; 4]> = quats
        .iter()
        .map(|q| q.to_array().map(f16::from_f32))
        .collect();
    bytemuck::cast_slice(&halves).to_vec()
}
