//! Accessor Decoding
//!
//! Converts typed, possibly normalized integer data into canonical `f32`
//! sequences. Integer component types are always treated as normalized:
//!
//! | Component type | Result range | Transform                      |
//! |----------------|--------------|--------------------------------|
//! | `I8`           | `[-1, 1]`    | `max(v / 127, -1)`             |
//! | `U8`           | `[0, 1]`     | `v / 255`                      |
//! | `I16`          | `[-1, 1]`    | `max(v / 32767, -1)`           |
//! | `U16`          | `[0, 1]`     | `v / 65535`                    |
//! | `F32`          | unchanged    | bit copy                       |
//!
//! `U32` has no float conversion and is rejected with
//! [`AccessorError::UnsupportedComponentType`].

use crate::errors::AccessorError;

/// Numeric type of a single accessor component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    I8,
    U8,
    I16,
    U16,
    U32,
    F32,
}

impl ComponentType {
    /// Maps a glTF / GL component type constant.
    #[must_use]
    pub fn from_gl(code: u32) -> Option<Self> {
        match code {
            5120 => Some(Self::I8),
            5121 => Some(Self::U8),
            5122 => Some(Self::I16),
            5123 => Some(Self::U16),
            5125 => Some(Self::U32),
            5126 => Some(Self::F32),
            _ => None,
        }
    }

    /// Size of one component in bytes.
    #[inline]
    #[must_use]
    pub fn size(self) -> usize {
        match self {
            Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::U32 | Self::F32 => 4,
        }
    }
}

/// Element shape of an accessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessorType {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
}

impl AccessorType {
    /// Components read per element.
    ///
    /// Only `Vec3` and `Vec4` widen the element; every other shape decodes as
    /// a scalar. This covers all shapes glTF allows for animation outputs.
    #[inline]
    #[must_use]
    pub fn component_count(self) -> usize {
        match self {
            Self::Vec3 => 3,
            Self::Vec4 => 4,
            _ => 1,
        }
    }
}

/// A resolved accessor: where its elements live inside one blob and how to read them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessorLayout {
    /// Number of elements
    pub count: usize,
    pub component_type: ComponentType,
    /// Components per element
    pub components: usize,
    /// Byte offset of the first element from the start of the blob
    pub offset: usize,
    /// Distance between elements; `None` means tightly packed
    pub stride: Option<usize>,
}

impl AccessorLayout {
    /// Bytes between the starts of consecutive elements.
    #[inline]
    #[must_use]
    pub fn element_stride(&self) -> usize {
        self.stride
            .filter(|&s| s > 0)
            .unwrap_or(self.components.saturating_mul(self.component_type.size()))
    }

    /// Number of blob bytes (from the blob start) needed to read every element.
    ///
    /// `None` when the extent does not fit in `usize`.
    #[must_use]
    pub fn required_len(&self) -> Option<usize> {
        if self.count == 0 {
            return Some(self.offset);
        }
        let element = self.components.checked_mul(self.component_type.size())?;
        (self.count - 1)
            .checked_mul(self.element_stride())?
            .checked_add(element)?
            .checked_add(self.offset)
    }

    fn check_bounds(&self, blob: &[u8]) -> Result<(), AccessorError> {
        let required = self.required_len().unwrap_or(usize::MAX);
        if required > blob.len() {
            return Err(AccessorError::OutOfBounds {
                required,
                available: blob.len(),
            });
        }
        Ok(())
    }
}

// ============================================================================
// Normalization
// ============================================================================

#[inline]
#[must_use]
pub fn unpack_snorm8(v: i8) -> f32 {
    (f32::from(v) / 127.0).max(-1.0)
}

#[inline]
#[must_use]
pub fn unpack_unorm8(v: u8) -> f32 {
    f32::from(v) / 255.0
}

#[inline]
#[must_use]
pub fn unpack_snorm16(v: i16) -> f32 {
    (f32::from(v) / 32767.0).max(-1.0)
}

#[inline]
#[must_use]
pub fn unpack_unorm16(v: u16) -> f32 {
    f32::from(v) / 65535.0
}

// ============================================================================
// Decoding
// ============================================================================

/// Decodes an accessor into `count * components` floats.
pub fn decode(layout: &AccessorLayout, blob: &[u8]) -> Result<Vec<f32>, AccessorError> {
    let unpack: fn(&AccessorLayout, &[u8]) -> Vec<f32> = match layout.component_type {
        ComponentType::I8 => |l, b| convert::<1>(l, b, |v| unpack_snorm8(i8::from_le_bytes(v))),
        ComponentType::U8 => |l, b| convert::<1>(l, b, |v| unpack_unorm8(v[0])),
        ComponentType::I16 => |l, b| convert::<2>(l, b, |v| unpack_snorm16(i16::from_le_bytes(v))),
        ComponentType::U16 => |l, b| convert::<2>(l, b, |v| unpack_unorm16(u16::from_le_bytes(v))),
        ComponentType::F32 => |l, b| convert::<4>(l, b, f32::from_le_bytes),
        ComponentType::U32 => {
            return Err(AccessorError::UnsupportedComponentType(layout.component_type));
        }
    };
    layout.check_bounds(blob)?;
    Ok(unpack(layout, blob))
}

/// Reads raw 32-bit floats regardless of the declared component type.
///
/// Keyframe timelines are always `F32` in glTF; the declared type is not consulted.
pub fn read_f32(layout: &AccessorLayout, blob: &[u8]) -> Result<Vec<f32>, AccessorError> {
    let raw = AccessorLayout {
        component_type: ComponentType::F32,
        ..*layout
    };
    raw.check_bounds(blob)?;
    Ok(convert::<4>(&raw, blob, f32::from_le_bytes))
}

fn convert<const N: usize>(
    layout: &AccessorLayout,
    blob: &[u8],
    unpack: impl Fn([u8; N]) -> f32,
) -> Vec<f32> {
    let stride = layout.element_stride();
    let mut out = Vec::with_capacity(layout.count * layout.components);
    let mut bytes = [0u8; N];
    for i in 0..layout.count {
        let base = layout.offset + i * stride;
        for c in 0..layout.components {
            let start = base + c * N;
            bytes.copy_from_slice(&blob[start..start + N]);
            out.push(unpack(bytes));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(count: usize, component_type: ComponentType, components: usize) -> AccessorLayout {
        AccessorLayout {
            count,
            component_type,
            components,
            offset: 0,
            stride: None,
        }
    }

    #[test]
    fn snorm8_clamps_most_negative() {
        assert_eq!(unpack_snorm8(-128), -1.0);
        assert_eq!(unpack_snorm8(-127), -1.0);
        assert_eq!(unpack_snorm8(127), 1.0);
    }

    #[test]
    fn required_len_with_stride() {
        let l = AccessorLayout {
            stride: Some(24),
            offset: 8,
            ..layout(3, ComponentType::F32, 3)
        };
        assert_eq!(l.required_len(), Some(8 + 2 * 24 + 12));
    }

    #[test]
    fn overflowing_extent_is_rejected() {
        let l = layout(usize::MAX / 2, ComponentType::F32, 3);
        assert_eq!(l.required_len(), None);
        assert_eq!(
            decode(&l, &[0u8; 16]),
            Err(AccessorError::OutOfBounds {
                required: usize::MAX,
                available: 16
            })
        );
        assert!(read_f32(&l, &[0u8; 16]).is_err());
    }

    #[test]
    fn strided_f32_skips_interleaved_bytes() {
        let mut blob = Vec::new();
        for v in [1.0f32, 2.0, -9.0, 3.0, 4.0, -9.0] {
            blob.extend_from_slice(&v.to_le_bytes());
        }
        let l = AccessorLayout {
            stride: Some(12),
            ..layout(2, ComponentType::F32, 2)
        };
        assert_eq!(decode(&l, &blob).unwrap(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn out_of_bounds_is_rejected() {
        let l = layout(4, ComponentType::U16, 1);
        assert_eq!(
            decode(&l, &[0u8; 6]),
            Err(AccessorError::OutOfBounds {
                required: 8,
                available: 6
            })
        );
    }
}
