//! 视线输出：骨骼旋转或表情权重

use glam::{EulerRot, Quat, Vec2};

use super::CurveMapper;
use crate::expression::{ExpressionPreset, ExpressionProxy};
use crate::scene::{NodeId, NodeTree};
use crate::Result;

/// 视线输出类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookAtType {
    Bone,
    Expression,
}

impl LookAtType {
    /// VRM firstPerson.lookAtTypeName
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Bone" => Some(Self::Bone),
            // VRM 0.x 写作 BlendShape
            "BlendShape" | "Expression" => Some(Self::Expression),
            _ => None,
        }
    }
}

/// 视线输出
///
/// `euler.x` 为俯仰（正值向上），`euler.y` 为偏航（正值向左）。
#[derive(Debug, Clone)]
pub enum LookAtApplyer {
    /// 直接旋转左右眼骨骼
    Bone {
        left_eye: Option<NodeId>,
        right_eye: Option<NodeId>,
        horizontal_inner: CurveMapper,
        horizontal_outer: CurveMapper,
        vertical_down: CurveMapper,
        vertical_up: CurveMapper,
    },
    /// 驱动 lookup / lookdown / lookleft / lookright 表情
    Expression {
        horizontal: CurveMapper,
        vertical_down: CurveMapper,
        vertical_up: CurveMapper,
    },
}

impl LookAtApplyer {
    pub fn kind(&self) -> LookAtType {
        match self {
            Self::Bone { .. } => LookAtType::Bone,
            Self::Expression { .. } => LookAtType::Expression,
        }
    }

    /// 应用视线角度
    pub fn apply(
        &self,
        euler: Vec2,
        tree: &mut NodeTree,
        expressions: &mut ExpressionProxy,
    ) -> Result<()> {
        let pitch = euler.x;
        let yaw = euler.y;

        match self {
            Self::Bone {
                left_eye,
                right_eye,
                horizontal_inner,
                horizontal_outer,
                vertical_down,
                vertical_up,
            } => {
                let eye_pitch = if pitch < 0.0 {
                    -vertical_down.map(-pitch)
                } else {
                    vertical_up.map(pitch)
                };

                // 左右眼内外侧曲线互换，近似双眼会聚
                if let Some(eye) = *left_eye {
                    let eye_yaw = if yaw < 0.0 {
                        -horizontal_inner.map(-yaw)
                    } else {
                        horizontal_outer.map(yaw)
                    };
                    tree.set_local_rotation(eye, eye_rotation(eye_pitch, eye_yaw))?;
                }
                if let Some(eye) = *right_eye {
                    let eye_yaw = if yaw < 0.0 {
                        -horizontal_outer.map(-yaw)
                    } else {
                        horizontal_inner.map(yaw)
                    };
                    tree.set_local_rotation(eye, eye_rotation(eye_pitch, eye_yaw))?;
                }
            }
            Self::Expression {
                horizontal,
                vertical_down,
                vertical_up,
            } => {
                if pitch < 0.0 {
                    expressions.set_preset_value(ExpressionPreset::LookUp, 0.0);
                    expressions.set_preset_value(ExpressionPreset::LookDown, vertical_down.map(-pitch));
                } else {
                    expressions.set_preset_value(ExpressionPreset::LookDown, 0.0);
                    expressions.set_preset_value(ExpressionPreset::LookUp, vertical_up.map(pitch));
                }

                if yaw < 0.0 {
                    expressions.set_preset_value(ExpressionPreset::LookLeft, 0.0);
                    expressions.set_preset_value(ExpressionPreset::LookRight, horizontal.map(-yaw));
                } else {
                    expressions.set_preset_value(ExpressionPreset::LookRight, 0.0);
                    expressions.set_preset_value(ExpressionPreset::LookLeft, horizontal.map(yaw));
                }
            }
        }
        Ok(())
    }
}

/// 欧拉角 YXZ（偏航、俯仰、无滚转）
#[inline]
pub fn eye_rotation(pitch: f32, yaw: f32) -> Quat {
    Quat::from_euler(EulerRot::YXZ, yaw, pitch, 0.0)
}
