use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::sync::Arc;

use glam::{Mat4, Vec3};
use skelgraph::animation::{
    AnimationNode, AnimationTrack, Bone, Channel, LinearKeyframe, LoopMode, SkeletalAnimation,
    compute_bone_matrix,
};
use skelgraph::scene::{
    BoundingBox, Frustum, ModelDefinition, ModelInstance, ModelNode, NodeTreeOp, ROOT_SLOT,
};

const BONES: usize = 64;

/// A chain of `BONES` bones, each skinned through an inverse bind and mixed
/// with its parent.
fn create_skeleton() -> ModelDefinition {
    let mut model = ModelDefinition::new("bench", 1 + BONES * 2);
    model.bbox = Some(BoundingBox::new(Vec3::splat(-2.0), Vec3::new(2.0, BONES as f32, 2.0)));

    let step = Mat4::from_translation(Vec3::Y);
    let mut parent = ROOT_SLOT;
    for i in 0..BONES {
        let slot = 1 + i;
        let bind_world = Mat4::from_translation(Vec3::new(0.0, (i + 1) as f32, 0.0));
        let node = model.add_node(
            ModelNode::new(format!("bone_{i}"), step)
                .with_bind_world(bind_world)
                .with_bbox(BoundingBox::new(Vec3::splat(-0.5), Vec3::splat(0.5)))
                .with_matrix_slot(slot),
        );
        model.push_op(NodeTreeOp::place_node(node, parent, slot));
        parent = slot;
    }
    for i in 0..BONES {
        let skin = 1 + BONES + i;
        let source = 1 + i;
        model.push_op(NodeTreeOp::mix(skin, [(source, 0.7), (source.max(2) - 1, 0.3)]));
        model.push_op(NodeTreeOp::inverse_bind(i, skin));
    }
    model
}

fn create_animation() -> SkeletalAnimation {
    let nodes = (0..BONES)
        .map(|bone| {
            let track = AnimationTrack::linear(vec![
                LinearKeyframe::new(0.0, -0.3),
                LinearKeyframe::new(15.0, 0.3),
                LinearKeyframe::new(30.0, -0.3),
            ])
            .unwrap();
            AnimationNode::new(bone).with_track(Channel::RotationZ, track)
        })
        .collect();
    SkeletalAnimation::from_nodes(30.0, LoopMode::Repeat, BONES, nodes).unwrap()
}

fn evaluate_benchmark(c: &mut Criterion) {
    let model = Arc::new(create_skeleton());
    model.validate().unwrap();

    let projection = Mat4::perspective_rh(1.0, 1.0, 0.1, 500.0);
    let view = Mat4::look_at_rh(Vec3::new(0.0, 30.0, 120.0), Vec3::new(0.0, 30.0, 0.0), Vec3::Y);
    let frustum = Frustum::from_matrix(projection * view);

    let bones: Vec<Bone> = (0..BONES)
        .map(|i| Bone::new(i).with_translation(Vec3::Y))
        .collect();

    let mut static_instance = ModelInstance::new(Arc::clone(&model));
    c.bench_function("evaluate_bind_pose", |b| {
        b.iter(|| black_box(static_instance.prepare(&frustum)).unwrap());
    });

    let mut animated = ModelInstance::new(Arc::clone(&model));
    animated.bind_skeletal_animation(Arc::new(create_animation()), &bones);
    c.bench_function("evaluate_animated", |b| {
        b.iter(|| {
            animated.advance(1.0 / 60.0);
            black_box(animated.prepare(&frustum)).unwrap();
        });
    });

    let animation = create_animation();
    c.bench_function("compute_bone_matrix", |b| {
        let mut dst = Mat4::IDENTITY;
        b.iter(|| {
            for bone in &bones {
                compute_bone_matrix(&mut dst, bone, Some(&animation), Some(black_box(17.5))).unwrap();
            }
            black_box(dst);
        });
    });
}

criterion_group!(benches, evaluate_benchmark);
criterion_main!(benches);
