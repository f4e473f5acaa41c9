//! 变换节点树 - 宿主场景图的最小能力面
//!
//! 核心设计思想：
//! - TransformNode: 单个变换节点（骨骼、碰撞球、网格挂点都是节点）
//! - NodeTree: 节点存储在 Vec 中，用 NodeId 引用，父子关系显式保存
//! - 世界矩阵按 local_to_world = parent.local_to_world * local_to_parent 计算

mod node;
mod tree;

pub use node::{NodeFlags, TransformNode};
pub use tree::NodeTree;

use glam::{Quat, Vec3};

/// 节点句柄（NodeTree 内部索引）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

// ============================================================================
// 公共类型定义
// ============================================================================

/// 本地变换数据
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocalTransform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for LocalTransform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}
