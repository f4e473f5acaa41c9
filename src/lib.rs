//! VRM Runtime - Rust 实现的 VRM 运行时
//!
//! 把 VRM 扩展中的声明式数据转换为每帧对场景图的修改：
//! - 弹簧骨骼（SpringBone）二次动画
//! - 视线（LookAt）计算与曲线映射
//! - 表情（Expression）权重
//! - 人形骨骼（Humanoid）姿态
//! - 第一人称（FirstPerson）渲染层

pub mod config;
pub mod expression;
pub mod first_person;
pub mod humanoid;
pub mod look_at;
pub mod math;
pub mod scene;
pub mod spring_bone;
pub mod vrm;

pub use config::{CollisionRenormalize, SpringBoneConfig};
pub use expression::{
    ExpressionGroup, ExpressionPreset, ExpressionProxy, MaterialValueResults, MaterialValueType,
    MorphTargetWeights,
};
pub use first_person::{FirstPerson, FirstPersonFlag, MeshAnnotation, RenderLayers};
pub use humanoid::{BonePose, HumanBoneName, Humanoid, VrmPose};
pub use look_at::{
    import_look_at, CurveMapper, DegreeMap, HermiteCurve, LookAtApplyer, LookAtDesc, LookAtHead,
    LookAtType,
};
pub use scene::{LocalTransform, NodeFlags, NodeId, NodeTree, TransformNode};
pub use spring_bone::{
    import_spring_bones, BoneGroupDesc, ColliderDesc, ColliderGroupDesc, SpringBone,
    SpringBoneCollider, SpringBoneColliderGroup, SpringBoneManager, SpringBoneParameters,
};
pub use vrm::{Vrm, VrmBuilder};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum VrmError {
    #[error("Invalid curve: {0}")]
    InvalidCurve(String),

    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeId),

    #[error("Invalid hierarchy: {0}")]
    InvalidHierarchy(String),

    #[error("Missing VRM component: {0}")]
    MissingComponent(&'static str),

    #[error("Unknown name: {0}")]
    UnknownName(String),
}

pub type Result<T> = std::result::Result<T, VrmError>;
