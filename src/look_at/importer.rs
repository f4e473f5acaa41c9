//! 从 VRM firstPerson 描述构建视线

use super::{CurveMapper, DegreeMap, LookAtApplyer, LookAtHead, LookAtType};
use crate::humanoid::{HumanBoneName, Humanoid};
use crate::Result;

/// 视线描述（VRM firstPerson 中的 lookAt* 字段）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LookAtDesc {
    /// None 表示未知类型
    pub kind: Option<LookAtType>,
    pub horizontal_inner: Option<DegreeMap>,
    pub horizontal_outer: Option<DegreeMap>,
    pub vertical_down: Option<DegreeMap>,
    pub vertical_up: Option<DegreeMap>,
}

/// 构建视线头部
///
/// 曲线缺失或类型未知时视线头部没有 applyer（只计算角度）；
/// 曲线数组非法时返回 `InvalidCurve`。
pub fn import_look_at(desc: &LookAtDesc, humanoid: &Humanoid) -> Result<LookAtHead> {
    let applyer = import_applyer(desc, humanoid)?;
    if applyer.is_none() {
        log::warn!("[LookAt] 视线描述不完整（类型 {:?}），不驱动眼睛", desc.kind);
    }
    Ok(LookAtHead::new(applyer))
}

fn import_applyer(desc: &LookAtDesc, humanoid: &Humanoid) -> Result<Option<LookAtApplyer>> {
    match desc.kind {
        Some(LookAtType::Bone) => {
            let (Some(inner), Some(outer), Some(down), Some(up)) = (
                &desc.horizontal_inner,
                &desc.horizontal_outer,
                &desc.vertical_down,
                &desc.vertical_up,
            ) else {
                return Ok(None);
            };
            Ok(Some(LookAtApplyer::Bone {
                left_eye: humanoid.get_bone_node(HumanBoneName::LeftEye),
                right_eye: humanoid.get_bone_node(HumanBoneName::RightEye),
                horizontal_inner: CurveMapper::for_bone(inner)?,
                horizontal_outer: CurveMapper::for_bone(outer)?,
                vertical_down: CurveMapper::for_bone(down)?,
                vertical_up: CurveMapper::for_bone(up)?,
            }))
        }
        Some(LookAtType::Expression) => {
            // 表情视线只使用外侧曲线作为水平曲线
            let (Some(outer), Some(down), Some(up)) =
                (&desc.horizontal_outer, &desc.vertical_down, &desc.vertical_up)
            else {
                return Ok(None);
            };
            Ok(Some(LookAtApplyer::Expression {
                horizontal: CurveMapper::for_expression(outer)?,
                vertical_down: CurveMapper::for_expression(down)?,
                vertical_up: CurveMapper::for_expression(up)?,
            }))
        }
        None => Ok(None),
    }
}
