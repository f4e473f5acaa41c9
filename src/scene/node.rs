//! 变换节点
//!
//! 每个 TransformNode 代表场景层次中的一个节点。
//! 静态数据（名称、父子关系、标志）初始化后基本不变，
//! 动态数据（本地 TRS、缓存矩阵）每帧由动画或运行时更新。

use bitflags::bitflags;
use glam::{Mat4, Quat, Vec3};

use super::{LocalTransform, NodeId};

// ============================================================================
// 节点标志
// ============================================================================

bitflags! {
    /// 节点标志位
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct NodeFlags: u32 {
        /// 本地旋转由弹簧骨骼写入
        const SPRING_DRIVEN = 1 << 0;
        /// 弹簧骨骼碰撞球
        const COLLIDER = 1 << 1;
        /// 视线骨骼（左右眼）
        const EYE = 1 << 2;
        /// 第一人称骨骼
        const FIRST_PERSON = 1 << 3;
        /// 网格挂点
        const MESH = 1 << 4;
    }
}

// ============================================================================
// 变换节点
// ============================================================================

/// 变换节点
#[derive(Clone, Debug)]
pub struct TransformNode {
    // ========================================
    // 静态数据
    // ========================================

    /// 节点名称
    pub name: String,

    /// 父节点
    pub(crate) parent: Option<NodeId>,

    /// 子节点（按添加顺序）
    pub(crate) children: Vec<NodeId>,

    /// 节点标志
    pub flags: NodeFlags,

    // ========================================
    // 动态数据（每帧更新）
    // ========================================

    /// 本地平移
    pub position: Vec3,

    /// 本地旋转
    pub rotation: Quat,

    /// 本地缩放
    pub scale: Vec3,

    /// 本地变换矩阵 (local_to_parent)
    pub local_to_parent: Mat4,

    /// 全局变换矩阵 (local_to_world)
    pub local_to_world: Mat4,
}

impl TransformNode {
    /// 创建新节点
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            children: Vec::new(),
            flags: NodeFlags::empty(),
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            local_to_parent: Mat4::IDENTITY,
            local_to_world: Mat4::IDENTITY,
        }
    }

    /// 以给定本地变换创建节点
    pub fn with_transform(name: impl Into<String>, transform: LocalTransform) -> Self {
        let mut node = Self::new(name);
        node.position = transform.position;
        node.rotation = transform.rotation;
        node.scale = transform.scale;
        node.compute_local_transform();
        node.local_to_world = node.local_to_parent;
        node
    }

    // ========================================
    // 访问器
    // ========================================

    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[inline]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// 当前本地变换
    #[inline]
    pub fn local_transform(&self) -> LocalTransform {
        LocalTransform {
            position: self.position,
            rotation: self.rotation,
            scale: self.scale,
        }
    }

    /// 获取世界位置
    #[inline]
    pub fn world_position(&self) -> Vec3 {
        self.local_to_world.w_axis.truncate()
    }

    /// 获取世界旋转
    #[inline]
    pub fn world_rotation(&self) -> Quat {
        crate::math::rotation(&self.local_to_world)
    }

    // ========================================
    // 变换计算
    // ========================================

    /// 由 TRS 计算本地变换 (local_to_parent)
    #[inline]
    pub fn compute_local_transform(&mut self) {
        self.local_to_parent =
            Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position);
    }

    /// 设置本地 TRS
    pub fn set_local_transform(&mut self, transform: LocalTransform) {
        self.position = transform.position;
        self.rotation = transform.rotation;
        self.scale = transform.scale;
        self.compute_local_transform();
    }

    #[inline]
    pub fn has_flag(&self, flag: NodeFlags) -> bool {
        self.flags.contains(flag)
    }
}

impl Default for TransformNode {
    fn default() -> Self {
        Self::new(String::new())
    }
}
