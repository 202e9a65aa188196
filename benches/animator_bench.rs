use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use glam::{Mat4, Quat, Vec3};

use myth_gltfio::animation::{Animation, Animator, Channel, InterpolationMode, Sampler, TransformKind};
use myth_gltfio::scene::{BoneBuffers, RenderableHandle, Skin, TransformTree};

const JOINTS: usize = 64;
const KEYFRAMES: usize = 120;

/// A skeleton of `JOINTS` chained nodes, each with translation and rotation tracks.
fn build_rig() -> (TransformTree, Animator) {
    let mut tree = TransformTree::new();
    let mut joints = Vec::with_capacity(JOINTS);
    for i in 0..JOINTS {
        let node = tree.create_node(&format!("joint_{i}"));
        if let Some(&parent) = joints.last() {
            tree.attach(node, parent);
        }
        joints.push(node);
    }

    let times: Vec<f32> = (0..KEYFRAMES).map(|k| k as f32 / 30.0).collect();
    let mut samplers = Vec::new();
    let mut channels = Vec::new();
    for (j, &node) in joints.iter().enumerate() {
        let translations: Vec<f32> = (0..KEYFRAMES)
            .flat_map(|k| Vec3::new(0.0, 0.1, (k as f32 * 0.05 + j as f32).sin() * 0.01).to_array())
            .collect();
        let rotations: Vec<f32> = (0..KEYFRAMES)
            .flat_map(|k| Quat::from_rotation_z((k + j) as f32 * 0.02).to_array())
            .collect();

        channels.push(Channel {
            sampler: samplers.len(),
            target: Some(node),
            kind: Some(TransformKind::Translation),
        });
        samplers.push(Sampler::new(&times, translations, 3, InterpolationMode::Linear));

        channels.push(Channel {
            sampler: samplers.len(),
            target: Some(node),
            kind: Some(TransformKind::Rotation),
        });
        samplers.push(Sampler::new(&times, rotations, 4, InterpolationMode::Linear));
    }

    let animation = Animation {
        name: Some("wave".into()),
        duration: times.last().copied().unwrap_or(0.0),
        samplers,
        channels,
    };

    let mut renderables: slotmap::SlotMap<RenderableHandle, ()> = slotmap::SlotMap::with_key();
    let skin = Skin {
        name: "rig".into(),
        joints,
        inverse_bind_matrices: vec![Mat4::IDENTITY; JOINTS],
        targets: vec![renderables.insert(())],
    };

    (tree, Animator::from_parts(vec![animation], vec![skin]))
}

fn bench_apply_animation(c: &mut Criterion) {
    let (mut tree, animator) = build_rig();
    let mut time = 0.0_f32;
    c.bench_function("apply_animation_64_joints", |b| {
        b.iter(|| {
            time += 1.0 / 60.0;
            animator
                .apply_animation(0, black_box(time), &mut tree)
                .ok();
        });
    });
}

fn bench_update_bone_matrices(c: &mut Criterion) {
    let (mut tree, mut animator) = build_rig();
    animator.apply_animation(0, 1.0, &mut tree).ok();
    let mut bones = BoneBuffers::new();
    c.bench_function("update_bone_matrices_64_joints", |b| {
        b.iter(|| animator.update_bone_matrices(black_box(&tree), &mut bones));
    });
}

criterion_group!(benches, bench_apply_animation, bench_update_bone_matrices);
criterion_main!(benches);
