//! 弹簧骨骼配置
//!
//! 所有参数扁平化，直接在代码中修改默认值即可。
//! 配置在构建 SpringBone 时采样一次，之后每根骨骼持有自己的副本。

use once_cell::sync::Lazy;
use std::sync::RwLock;

/// 碰撞后骨骼长度重新归一化的粒度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionRenormalize {
    /// 每个碰撞体推出后立即归一化（与 UniVRM / three-vrm 一致）
    PerCollider,
    /// 所有碰撞体处理完后只归一化一次
    AfterPass,
}

/// 弹簧骨骼配置（扁平化，不嵌套）
#[derive(Debug, Clone)]
pub struct SpringBoneConfig {
    // ========== 骨骼几何 ==========
    /// 末端骨骼（无子节点）的虚拟尾部长度，默认 0.07（VRM 0.0 固定 7cm）
    pub leaf_tail_length: f32,

    // ========== 碰撞 ==========
    /// 碰撞后长度归一化粒度，默认 PerCollider
    pub collision_renormalize: CollisionRenormalize,

    // ========== 数值 ==========
    /// 两单位向量反向判定阈值，默认 1e-6
    pub unit_vector_epsilon: f32,
    /// delta 不大于此值时 update 不做任何事，默认 0.0
    pub min_delta: f32,

    // ========== 调试 ==========
    /// 是否输出调试日志，默认 false
    pub debug_log: bool,
}

impl Default for SpringBoneConfig {
    fn default() -> Self {
        Self {
            // ====== 骨骼几何 ======
            // UniVRM 对链末端骨骼固定取“自身方向前方 7cm”作为子节点
            leaf_tail_length: 0.07,

            // ====== 碰撞 ======
            collision_renormalize: CollisionRenormalize::PerCollider,

            // ====== 数值 ======
            unit_vector_epsilon: 1e-6,
            min_delta: 0.0,

            // ====== 调试 ======
            debug_log: false,
        }
    }
}

/// 全局配置实例
static SPRING_BONE_CONFIG: Lazy<RwLock<SpringBoneConfig>> = Lazy::new(|| {
    RwLock::new(SpringBoneConfig::default())
});

/// 获取当前配置（只读）
pub fn get_config() -> SpringBoneConfig {
    SPRING_BONE_CONFIG.read().unwrap_or_else(|e| e.into_inner()).clone()
}

/// 手动设置配置（用于运行时调试）
pub fn set_config(config: SpringBoneConfig) {
    *SPRING_BONE_CONFIG.write().unwrap_or_else(|e| e.into_inner()) = config;
}

/// 重置为默认配置
pub fn reset_config() {
    *SPRING_BONE_CONFIG.write().unwrap_or_else(|e| e.into_inner()) = SpringBoneConfig::default();
}
