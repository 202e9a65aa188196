//! Accessor Decoder Tests
//!
//! Tests for:
//! - Normalized integer conversion (i8 / u8 / i16 / u16)
//! - f32 passthrough, tightly packed and interleaved
//! - Unsupported component types and out-of-bounds reads
//! - Resolution through source records and URI blob maps

use myth_gltfio::assets::accessor::{self, AccessorLayout, AccessorType, ComponentType};
use myth_gltfio::assets::source::{AccessorDef, BlobMap, BufferSource, BufferViewDef, SourceAsset};
use myth_gltfio::errors::AccessorError;

const EPSILON: f32 = 1e-3;

fn approx_slice(a: &[f32], b: &[f32]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < EPSILON)
}

fn packed(count: usize, component_type: ComponentType, components: usize) -> AccessorLayout {
    AccessorLayout {
        count,
        component_type,
        components,
        offset: 0,
        stride: None,
    }
}

// ============================================================================
// Normalized Integers
// ============================================================================

#[test]
fn signed_byte_normalizes_to_unit_range() {
    let bytes = [(-128i8) as u8, 0, 127];
    let out = accessor::decode(&packed(3, ComponentType::I8, 1), &bytes).unwrap();
    assert!(approx_slice(&out, &[-1.0, 0.0, 1.0]), "{out:?}");
}

#[test]
fn unsigned_byte_normalizes_to_unit_range() {
    let out = accessor::decode(&packed(3, ComponentType::U8, 1), &[0, 128, 255]).unwrap();
    assert!(approx_slice(&out, &[0.0, 0.502, 1.0]), "{out:?}");
}

#[test]
fn signed_short_normalizes_little_endian() {
    let mut bytes = Vec::new();
    for v in [i16::MIN, 0, i16::MAX] {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    let out = accessor::decode(&packed(3, ComponentType::I16, 1), &bytes).unwrap();
    assert!(approx_slice(&out, &[-1.0, 0.0, 1.0]), "{out:?}");
}

#[test]
fn unsigned_short_normalizes() {
    let mut bytes = Vec::new();
    for v in [0u16, 32768, u16::MAX] {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    let out = accessor::decode(&packed(3, ComponentType::U16, 1), &bytes).unwrap();
    assert!(approx_slice(&out, &[0.0, 0.5, 1.0]), "{out:?}");
}

// ============================================================================
// Floats & Layout
// ============================================================================

#[test]
fn float_vec3_is_copied_verbatim() {
    let values = [1.5f32, -2.25, 1e6, 0.0, f32::MIN_POSITIVE, -0.0];
    let bytes: Vec<u8> = values.iter().flat_map(|f| f.to_le_bytes()).collect();
    let out = accessor::decode(&packed(2, ComponentType::F32, 3), &bytes).unwrap();
    assert_eq!(out, values);
}

#[test]
fn interleaved_view_honors_stride() {
    // Two vertices of [position vec3 | normal vec3]; read only the normals
    let verts = [0.0f32, 0.0, 0.0, 0.0, 1.0, 0.0, 5.0, 5.0, 5.0, 1.0, 0.0, 0.0];
    let bytes: Vec<u8> = verts.iter().flat_map(|f| f.to_le_bytes()).collect();
    let layout = AccessorLayout {
        offset: 12,
        stride: Some(24),
        ..packed(2, ComponentType::F32, 3)
    };
    let out = accessor::decode(&layout, &bytes).unwrap();
    assert_eq!(out, [0.0, 1.0, 0.0, 1.0, 0.0, 0.0]);
}

#[test]
fn output_length_is_count_times_components() {
    let bytes = vec![0u8; 4 * 4 * 5];
    let out = accessor::decode(&packed(5, ComponentType::F32, 4), &bytes).unwrap();
    assert_eq!(out.len(), 20);
}

#[test]
fn component_count_policy() {
    assert_eq!(AccessorType::Scalar.component_count(), 1);
    assert_eq!(AccessorType::Vec3.component_count(), 3);
    assert_eq!(AccessorType::Vec4.component_count(), 4);
    assert_eq!(AccessorType::Vec2.component_count(), 1);
    assert_eq!(AccessorType::Mat4.component_count(), 1);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn u32_is_unsupported() {
    let err = accessor::decode(&packed(1, ComponentType::U32, 1), &[0; 4]).unwrap_err();
    assert_eq!(err, AccessorError::UnsupportedComponentType(ComponentType::U32));
}

#[test]
fn short_blob_is_out_of_bounds() {
    let err = accessor::decode(&packed(2, ComponentType::F32, 3), &[0; 20]).unwrap_err();
    assert_eq!(
        err,
        AccessorError::OutOfBounds {
            required: 24,
            available: 20
        }
    );
}

#[test]
fn huge_count_is_out_of_bounds_not_a_panic() {
    let layout = packed(usize::MAX / 2, ComponentType::F32, 3);
    assert!(matches!(
        accessor::decode(&layout, &[0; 16]),
        Err(AccessorError::OutOfBounds { available: 16, .. })
    ));
    assert!(accessor::read_f32(&layout, &[0; 16]).is_err());

    let strided = AccessorLayout {
        stride: Some(usize::MAX / 4),
        ..packed(8, ComponentType::U8, 1)
    };
    assert!(accessor::decode(&strided, &[0; 16]).is_err());
}

#[test]
fn gl_constants_map_to_component_types() {
    assert_eq!(ComponentType::from_gl(5120), Some(ComponentType::I8));
    assert_eq!(ComponentType::from_gl(5126), Some(ComponentType::F32));
    assert_eq!(ComponentType::from_gl(5124), None);
}

// ============================================================================
// Source Records
// ============================================================================

fn source_with_u8_accessor() -> SourceAsset {
    SourceAsset {
        buffers: vec![BufferSource {
            uri: "colors.bin".into(),
            byte_length: 8,
        }],
        buffer_views: vec![BufferViewDef {
            buffer: 0,
            byte_offset: 2,
            byte_length: 6,
            byte_stride: None,
        }],
        accessors: vec![
            AccessorDef {
                buffer_view: Some(0),
                byte_offset: 1,
                count: 1,
                component_type: ComponentType::U8,
                accessor_type: AccessorType::Vec3,
            },
            AccessorDef {
                buffer_view: None,
                byte_offset: 0,
                count: 1,
                component_type: ComponentType::F32,
                accessor_type: AccessorType::Scalar,
            },
        ],
        ..Default::default()
    }
}

#[test]
fn source_accessor_resolves_view_and_accessor_offsets() {
    let source = source_with_u8_accessor();
    let bytes = [9u8, 9, 9, 0, 255, 0, 9, 9];
    let mut blobs = BlobMap::default();
    blobs.insert("colors.bin", &bytes);

    // view offset 2 + accessor offset 1 → bytes [3..6]
    let out = source.decode_accessor(0, &blobs).unwrap();
    assert!(approx_slice(&out, &[0.0, 1.0, 0.0]), "{out:?}");
}

#[test]
fn source_accessor_without_blob_fails() {
    let source = source_with_u8_accessor();
    let err = source.decode_accessor(0, &BlobMap::default()).unwrap_err();
    assert_eq!(
        err,
        AccessorError::MissingBlob {
            uri: "colors.bin".into()
        }
    );
}

#[test]
fn source_accessor_without_view_fails() {
    let source = source_with_u8_accessor();
    let err = source.decode_accessor(1, &BlobMap::default()).unwrap_err();
    assert_eq!(err, AccessorError::MissingBufferView);
    assert!(matches!(
        source.decode_accessor(5, &BlobMap::default()),
        Err(AccessorError::DanglingIndex { index: 5, .. })
    ));
}

#[test]
fn overflowing_source_offsets_are_out_of_bounds() {
    let mut source = source_with_u8_accessor();
    source.buffer_views[0].byte_offset = usize::MAX;
    let bytes = [0u8; 8];
    let mut blobs = BlobMap::default();
    blobs.insert("colors.bin", &bytes);

    assert!(matches!(
        source.decode_accessor(0, &blobs),
        Err(AccessorError::OutOfBounds { .. })
    ));
    assert!(source.read_accessor_f32(0, &blobs).is_err());
}
