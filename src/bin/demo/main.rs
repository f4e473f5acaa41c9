//! 无窗口演示：构建一个带马尾的小模型，左右摇晃身体并打印发梢轨迹
//!
//! 运行: RUST_LOG=info cargo run --features demo --bin demo

use glam::Vec3;
use vrm_runtime::config::{self, CollisionRenormalize, SpringBoneConfig};
use vrm_runtime::{
    import_look_at, import_spring_bones, BoneGroupDesc, ColliderDesc, ColliderGroupDesc,
    DegreeMap, ExpressionGroup, ExpressionPreset, ExpressionProxy, FirstPerson, HumanBoneName,
    Humanoid, LocalTransform, LookAtDesc, LookAtType, NodeId, NodeTree, Vrm,
};

const FRAMES: usize = 120;
const DT: f32 = 1.0 / 60.0;

fn at(position: Vec3) -> LocalTransform {
    LocalTransform { position, ..Default::default() }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::args().any(|a| a == "--after-pass") {
        config::set_config(SpringBoneConfig {
            collision_renormalize: CollisionRenormalize::AfterPass,
            ..Default::default()
        });
    }

    // hips -> spine -> head -> (eyes, ponytail x3)
    let mut tree = NodeTree::new();
    let hips = tree.add_node("hips", at(Vec3::new(0.0, 1.0, 0.0)));
    let spine = tree.add_child(hips, "spine", at(Vec3::new(0.0, 0.25, 0.0)))?;
    let head = tree.add_child(spine, "head", at(Vec3::new(0.0, 0.3, 0.0)))?;
    let left_eye = tree.add_child(head, "leftEye", at(Vec3::new(0.03, 0.06, -0.05)))?;
    let right_eye = tree.add_child(head, "rightEye", at(Vec3::new(-0.03, 0.06, -0.05)))?;
    let mut ponytail: Vec<NodeId> = Vec::new();
    let mut parent = head;
    for (i, offset) in [Vec3::new(0.0, 0.1, 0.08), Vec3::new(0.0, -0.1, 0.02), Vec3::new(0.0, -0.1, 0.0)]
        .into_iter()
        .enumerate()
    {
        parent = tree.add_child(parent, format!("ponytail_{}", i), at(offset))?;
        ponytail.push(parent);
    }
    let target = tree.add_node("camera", at(Vec3::new(0.5, 1.6, -1.0)));
    tree.update_world_transforms();

    let nodes = [hips, spine, head, left_eye, right_eye, ponytail[0], ponytail[1], ponytail[2]];

    let humanoid = Humanoid::new(
        &tree,
        &[
            (HumanBoneName::Hips, hips),
            (HumanBoneName::Spine, spine),
            (HumanBoneName::Head, head),
            (HumanBoneName::LeftEye, left_eye),
            (HumanBoneName::RightEye, right_eye),
        ],
    )?;

    let degree_map = || Some(DegreeMap { x_range: Some(90.0), y_range: Some(10.0), curve: None });
    let mut look_at = import_look_at(
        &LookAtDesc {
            kind: Some(LookAtType::Bone),
            horizontal_inner: degree_map(),
            horizontal_outer: degree_map(),
            vertical_down: degree_map(),
            vertical_up: degree_map(),
        },
        &humanoid,
    )?;
    look_at.target = Some(target);

    let mut proxy = ExpressionProxy::new();
    let mut blink = ExpressionGroup::new("Blink");
    blink.add_bind(vec![head], 0, 100.0);
    proxy.register_group("Blink", Some(ExpressionPreset::Blink), blink);

    let manager = import_spring_bones(
        &mut tree,
        &nodes,
        &[ColliderGroupDesc {
            node: 2,
            colliders: vec![ColliderDesc { offset: Vec3::new(0.0, 0.05, 0.0), radius: 0.09 }],
        }],
        &[BoneGroupDesc {
            stiffness: 0.8,
            gravity_power: 0.5,
            drag_force: 0.3,
            hit_radius: 0.02,
            collider_groups: vec![0],
            bones: vec![5],
            ..Default::default()
        }],
    )?;

    let mut vrm = Vrm::builder(tree)
        .humanoid(humanoid)
        .expression_proxy(proxy)
        .first_person(FirstPerson::new(head, Vec3::new(0.0, 0.06, 0.0), Vec::new()))
        .look_at(look_at)
        .spring_bone_manager(manager)
        .build()?;

    for frame in 0..FRAMES {
        let t = frame as f32 * DT;
        vrm.tree.node_mut(hips)?.position = Vec3::new((t * 6.0).sin() * 0.2, 1.0, 0.0);
        // 每秒眨一次眼
        vrm.expression_proxy.set_value("blink", if frame % 60 < 6 { 1.0 } else { 0.0 });

        vrm.update(DT);

        if frame % 10 == 0 {
            let tip = vrm.tree.world_position(ponytail[2])?;
            let euler = vrm.look_at.as_ref().map(|l| l.euler()).unwrap_or_default();
            println!(
                "frame {:3}: tip=({:+.3}, {:.3}, {:+.3}) gaze=({:+.1}°, {:+.1}°) blink={:.0}",
                frame,
                tip.x,
                tip.y,
                tip.z,
                euler.x.to_degrees(),
                euler.y.to_degrees(),
                vrm.expression_proxy.morph_weights.get(head, 0)
            );
        }
    }

    vrm.reset()?;
    println!("reset: tip={:?}", vrm.tree.world_position(ponytail[2])?);
    Ok(())
}
