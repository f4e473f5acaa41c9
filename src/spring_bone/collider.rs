//! 弹簧骨骼碰撞球

use glam::{Mat4, Vec3};

use crate::scene::{NodeId, NodeTree};
use crate::Result;

/// 球形碰撞体
///
/// 偏移保存在 `node` 的本地平移里（node 挂在锚定骨骼下），
/// 因此只需记录节点和半径。
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpringBoneCollider {
    pub node: NodeId,
    pub radius: f32,
}

impl SpringBoneCollider {
    pub fn new(node: NodeId, radius: f32) -> Self {
        Self { node, radius }
    }

    /// 当前世界位置（读取缓存的世界矩阵）
    #[inline]
    pub fn world_position(&self, tree: &NodeTree) -> Result<Vec3> {
        tree.world_position(self.node)
    }

    /// 转换到 center 空间的位置
    #[inline]
    pub fn center_space_position(&self, tree: &NodeTree, world_to_center: &Mat4) -> Result<Vec3> {
        Ok(world_to_center.transform_point3(self.world_position(tree)?))
    }
}

/// 碰撞球组，对应 VRM secondaryAnimation.colliderGroups 的一项
#[derive(Clone, Debug)]
pub struct SpringBoneColliderGroup {
    /// 碰撞球挂载的骨骼节点
    pub node: NodeId,
    pub colliders: Vec<SpringBoneCollider>,
}
