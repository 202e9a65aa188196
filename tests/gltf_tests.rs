//! glTF Adapter Tests
//!
//! Tests for:
//! - Record extraction from a parsed glTF document
//! - End-to-end playback of an animation read from glTF JSON

#![cfg(feature = "gltf")]

use base64::Engine;
use glam::Vec3;

use myth_gltfio::animation::Animator;
use myth_gltfio::assets::accessor::{AccessorType, ComponentType};
use myth_gltfio::assets::source::SourceAsset;
use myth_gltfio::assets::{ResourceConfiguration, ResourceLoader, SceneAsset, UploadQueue};
use myth_gltfio::scene::TransformTree;

/// A single node sliding from the origin to x = 2 over one second.
fn sliding_node_gltf() -> gltf::Gltf {
    let floats = [0.0f32, 1.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0];
    let bytes: Vec<u8> = floats.iter().flat_map(|f| f.to_le_bytes()).collect();
    let payload = base64::engine::general_purpose::STANDARD.encode(&bytes);

    let json = r#"{
        "asset": { "version": "2.0" },
        "buffers": [{ "byteLength": 32, "uri": "data:application/octet-stream;base64,PAYLOAD" }],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 8 },
            { "buffer": 0, "byteOffset": 8, "byteLength": 24 }
        ],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 2, "type": "SCALAR", "min": [0.0], "max": [1.0] },
            { "bufferView": 1, "componentType": 5126, "count": 2, "type": "VEC3" }
        ],
        "nodes": [{ "name": "slider" }],
        "animations": [{
            "name": "slide",
            "samplers": [{ "input": 0, "output": 1, "interpolation": "LINEAR" }],
            "channels": [{ "sampler": 0, "target": { "node": 0, "path": "translation" } }]
        }]
    }"#
    .replace("PAYLOAD", &payload);

    gltf::Gltf::from_slice(json.as_bytes()).unwrap()
}

#[test]
fn records_mirror_the_document() {
    let gltf = sliding_node_gltf();
    let source = SourceAsset::from_gltf(&gltf.document, gltf.blob.clone());

    assert_eq!(source.buffers.len(), 1);
    assert!(source.buffers[0].uri.starts_with("data:"));
    assert_eq!(source.buffers[0].byte_length, 32);
    assert_eq!(source.buffer_views[1].byte_offset, 8);

    assert_eq!(source.accessors[1].component_type, ComponentType::F32);
    assert_eq!(source.accessors[1].accessor_type, AccessorType::Vec3);

    let animation = &source.animations[0];
    assert_eq!(animation.name.as_deref(), Some("slide"));
    assert_eq!(animation.samplers[0].interpolation, "LINEAR");
    assert_eq!(animation.channels[0].target_path, "translation");
    assert_eq!(source.nodes[0].name.as_deref(), Some("slider"));
    assert!(source.blob.is_none());
}

#[test]
fn gltf_animation_plays_back() {
    let gltf = sliding_node_gltf();
    let source = SourceAsset::from_gltf(&gltf.document, gltf.blob.clone());

    let mut tree = TransformTree::new();
    let node = tree.create_node("slider");
    let asset = SceneAsset::builder(source)
        .node_map(vec![node])
        .bind_animation_buffer(0)
        .build();

    let mut loader = ResourceLoader::new(UploadQueue::new(), ResourceConfiguration::default());
    loader.load_resources(&asset).unwrap();

    let animator = Animator::new(&asset);
    assert_eq!(animator.animation_duration(0), Some(1.0));

    animator.apply_animation(0, 0.5, &mut tree).unwrap();
    let translation = tree.local_transform(node).unwrap().w_axis.truncate();
    assert!(translation.abs_diff_eq(Vec3::new(1.0, 0.0, 0.0), 1e-5));
}
