//! 向量 / 四元数辅助函数
//!
//! 弹簧骨骼与视线计算共用。所有临时量都在栈上，不使用全局暂存变量。

use glam::{Mat4, Quat, Vec3};

/// 计算把单位向量 `from` 旋转到单位向量 `to` 的四元数
///
/// `r = dot(from, to) + 1`，当 `r < epsilon`（两向量几乎反向）时
/// 直接按分量构造一个绕垂直轴 180° 的四元数，避开轴角公式的奇点。
pub fn from_unit_vectors(from: Vec3, to: Vec3, epsilon: f32) -> Quat {
    let r = from.dot(to) + 1.0;

    let q = if r < epsilon {
        // 反向：选择与 from 垂直的旋转轴
        if from.x.abs() > from.z.abs() {
            Quat::from_xyzw(-from.y, from.x, 0.0, 0.0)
        } else {
            Quat::from_xyzw(0.0, -from.z, from.y, 0.0)
        }
    } else {
        let c = from.cross(to);
        Quat::from_xyzw(c.x, c.y, c.z, r)
    };

    q.normalize()
}

/// 四元数旋转向量
#[inline]
pub fn rotate_vector(q: Quat, v: Vec3) -> Vec3 {
    q * v
}

/// 带保护的归一化，零长度或非有限向量返回 `fallback`
#[inline]
pub fn normalize_or_keep(v: Vec3, fallback: Vec3) -> Vec3 {
    let len_sq = v.length_squared();
    if len_sq > 0.0 && len_sq.is_finite() {
        v / len_sq.sqrt()
    } else {
        fallback
    }
}

/// 从矩阵中取平移
#[inline]
pub fn translation(m: &Mat4) -> Vec3 {
    m.w_axis.truncate()
}

/// 从矩阵中分解旋转（忽略缩放）
#[inline]
pub fn rotation(m: &Mat4) -> Quat {
    let (_, rotation, _) = m.to_scale_rotation_translation();
    rotation
}
