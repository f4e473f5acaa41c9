//! 弹簧骨骼系统 - VRM secondaryAnimation
//!
//! 核心设计思想：
//! - SpringBone: 单根骨骼的 verlet 积分 + 球体碰撞，在可选的 center 空间中计算
//! - SpringBoneManager: 按注册顺序管理骨骼组，保证父骨骼先于子骨骼更新
//! - 碰撞球挂在骨骼节点下，每次检测都重新读取其世界矩阵

mod bone;
mod collider;
mod importer;
mod manager;

pub use bone::SpringBone;
pub use collider::{SpringBoneCollider, SpringBoneColliderGroup};
pub use importer::{
    import_spring_bones, BoneGroupDesc, ColliderDesc, ColliderGroupDesc, COLLIDER_NODE_NAME,
};
pub use manager::{SpringBoneGroup, SpringBoneManager};

use glam::Vec3;

use crate::scene::NodeId;

/// 弹簧骨骼参数
#[derive(Clone, Debug, PartialEq)]
pub struct SpringBoneParameters {
    /// 尾部碰撞球半径
    pub radius: f32,
    /// 回到初始姿态的刚度，UniVRM 界面范围 0.0 ~ 4.0
    pub stiffness_force: f32,
    /// 重力方向（单位向量）
    pub gravity_dir: Vec3,
    /// 重力强度
    pub gravity_power: f32,
    /// 速度衰减，范围 0.0 ~ 1.0，越大摇摆越少
    pub drag_force: f32,
    /// 参与碰撞的碰撞球
    pub colliders: Vec<SpringBoneCollider>,
    /// 计算所在的参考节点，None 表示世界空间
    pub center: Option<NodeId>,
}

impl Default for SpringBoneParameters {
    fn default() -> Self {
        Self {
            radius: 0.02,
            stiffness_force: 1.0,
            gravity_dir: Vec3::new(0.0, -1.0, 0.0),
            gravity_power: 0.0,
            drag_force: 0.4,
            colliders: Vec::new(),
            center: None,
        }
    }
}
