//! 从 VRM secondaryAnimation 描述构建弹簧骨骼
//!
//! 描述结构由宿主从 glTF 扩展中解析后传入，这里只负责：
//! - 在锚定骨骼下创建碰撞球节点
//! - 按先序遍历展开每条骨骼链
//! - VRM 0.0 左手系数据的 Z 轴翻转

use glam::Vec3;

use super::{
    SpringBone, SpringBoneCollider, SpringBoneColliderGroup, SpringBoneGroup, SpringBoneManager,
    SpringBoneParameters,
};
use crate::scene::{LocalTransform, NodeFlags, NodeId, NodeTree};
use crate::Result;

/// 碰撞球节点名称（宿主计算包围盒时据此排除碰撞球）
pub const COLLIDER_NODE_NAME: &str = "vrmColliderSphere";

/// 单个碰撞球描述
#[derive(Clone, Debug, PartialEq)]
pub struct ColliderDesc {
    /// 相对锚定骨骼的偏移（VRM 0.0 左手系）
    pub offset: Vec3,
    pub radius: f32,
}

/// 碰撞球组描述
#[derive(Clone, Debug, PartialEq)]
pub struct ColliderGroupDesc {
    /// 锚定骨骼在节点表中的索引
    pub node: usize,
    pub colliders: Vec<ColliderDesc>,
}

/// 骨骼组描述（对应 secondaryAnimation.boneGroups 的一项）
#[derive(Clone, Debug, PartialEq)]
pub struct BoneGroupDesc {
    pub stiffness: f32,
    /// VRM 0.0 左手系
    pub gravity_dir: Vec3,
    pub gravity_power: f32,
    pub drag_force: f32,
    pub hit_radius: f32,
    /// 引用的碰撞球组索引
    pub collider_groups: Vec<usize>,
    /// 骨骼链根节点索引
    pub bones: Vec<usize>,
    /// 参考空间节点索引，None 表示世界空间
    pub center: Option<usize>,
}

impl Default for BoneGroupDesc {
    fn default() -> Self {
        let params = SpringBoneParameters::default();
        Self {
            stiffness: params.stiffness_force,
            gravity_dir: params.gravity_dir,
            gravity_power: params.gravity_power,
            drag_force: params.drag_force,
            hit_radius: params.radius,
            collider_groups: Vec::new(),
            bones: Vec::new(),
            center: None,
        }
    }
}

/// 节点表索引 -> 树中存在的节点
#[inline]
fn resolve(tree: &NodeTree, nodes: &[NodeId], index: usize) -> Option<NodeId> {
    nodes.get(index).copied().filter(|&id| tree.contains(id))
}

/// VRM 0.0 左手系 -> 右手系
#[inline]
fn flip_z(v: Vec3) -> Vec3 {
    Vec3::new(v.x, v.y, -v.z)
}

/// 构建弹簧骨骼管理器
///
/// `nodes` 是 glTF 节点索引到场景节点的映射表。
/// 无法解析的索引（锚定骨骼、链根、center、碰撞球组）记录警告后跳过。
pub fn import_spring_bones(
    tree: &mut NodeTree,
    nodes: &[NodeId],
    collider_groups: &[ColliderGroupDesc],
    bone_groups: &[BoneGroupDesc],
) -> Result<SpringBoneManager> {
    // 1. 碰撞球组：索引与描述一一对应，解析失败的组为 None
    let mut groups: Vec<Option<SpringBoneColliderGroup>> = Vec::with_capacity(collider_groups.len());
    for (gi, desc) in collider_groups.iter().enumerate() {
        let Some(anchor) = resolve(tree, nodes, desc.node) else {
            log::warn!("[SpringBone] 碰撞球组 {} 的锚定骨骼 {} 不存在，跳过", gi, desc.node);
            groups.push(None);
            continue;
        };

        let mut colliders = Vec::with_capacity(desc.colliders.len());
        for collider in &desc.colliders {
            let transform = LocalTransform {
                position: flip_z(collider.offset),
                ..Default::default()
            };
            let node = tree.add_child(anchor, COLLIDER_NODE_NAME, transform)?;
            tree.insert_flags(node, NodeFlags::COLLIDER)?;
            colliders.push(SpringBoneCollider::new(node, collider.radius));
        }
        groups.push(Some(SpringBoneColliderGroup { node: anchor, colliders }));
    }

    // 碰撞球节点和 center 都需要最新的世界矩阵
    tree.update_world_transforms();

    // 2. 骨骼组
    let mut group_list: Vec<SpringBoneGroup> = Vec::with_capacity(bone_groups.len());
    for (gi, desc) in bone_groups.iter().enumerate() {
        let mut colliders = Vec::new();
        for &ci in &desc.collider_groups {
            match groups.get(ci) {
                Some(Some(group)) => colliders.extend_from_slice(&group.colliders),
                _ => log::warn!("[SpringBone] 骨骼组 {} 引用的碰撞球组 {} 不存在", gi, ci),
            }
        }

        let center = match desc.center {
            Some(index) => {
                let resolved = resolve(tree, nodes, index);
                if resolved.is_none() {
                    log::warn!("[SpringBone] 骨骼组 {} 的 center {} 不存在，改用世界空间", gi, index);
                }
                resolved
            }
            None => None,
        };

        let params = SpringBoneParameters {
            radius: desc.hit_radius,
            stiffness_force: desc.stiffness,
            gravity_dir: flip_z(desc.gravity_dir),
            gravity_power: desc.gravity_power,
            drag_force: desc.drag_force,
            colliders,
            center,
        };

        let mut group = SpringBoneGroup::new();
        for &root_index in &desc.bones {
            let Some(root) = resolve(tree, nodes, root_index) else {
                log::warn!("[SpringBone] 骨骼组 {} 的链根 {} 不存在，跳过", gi, root_index);
                continue;
            };

            for id in tree.traverse(root)? {
                // 碰撞球挂在骨骼下，不参与摇摆
                if tree.node(id)?.has_flag(NodeFlags::COLLIDER) {
                    continue;
                }
                group.push(SpringBone::new(tree, id, params.clone())?);
                tree.insert_flags(id, NodeFlags::SPRING_DRIVEN)?;
            }
        }
        group_list.push(group);
    }

    let collider_groups: Vec<SpringBoneColliderGroup> = groups.into_iter().flatten().collect();
    let manager = SpringBoneManager::new(collider_groups, group_list);
    log::info!(
        "[SpringBone] 导入完成: {} 组 {} 根骨骼, {} 个碰撞球组",
        manager.group_count(),
        manager.bone_count(),
        manager.collider_groups.len()
    );
    Ok(manager)
}
