//! 表情组
//!
//! 一个表情组由若干 morph target 绑定和材质值组成，
//! 权重为 0 ~ 1，二值表情在 0.5 处取整。

use glam::Vec4;

use super::{MaterialValueResults, MorphTargetWeights};
use crate::scene::NodeId;

/// morph target 绑定
#[derive(Clone, Debug, PartialEq)]
pub struct ExpressionBind {
    /// 受影响的网格节点
    pub meshes: Vec<NodeId>,
    pub morph_target_index: usize,
    /// 0 ~ 1（VRM 数据中为 0 ~ 100，添加时换算）
    pub weight: f32,
}

/// 材质值类型
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaterialValueType {
    Number,
    Vector2,
    Vector3,
    /// 纹理 offset / tiling
    Vector4,
    Color,
}

/// 材质值绑定
#[derive(Clone, Debug, PartialEq)]
pub struct ExpressionMaterialValue {
    pub material: usize,
    pub property_name: String,
    pub value_type: MaterialValueType,
    pub default_value: Vec4,
    pub target_value: Vec4,
    /// target - default
    pub delta_value: Vec4,
}

/// 表情组
#[derive(Clone, Debug, PartialEq)]
pub struct ExpressionGroup {
    pub name: String,
    /// 当前权重 0 ~ 1
    pub weight: f32,
    pub is_binary: bool,
    binds: Vec<ExpressionBind>,
    material_values: Vec<ExpressionMaterialValue>,
}

impl ExpressionGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            weight: 0.0,
            is_binary: false,
            binds: Vec::new(),
            material_values: Vec::new(),
        }
    }

    pub fn binds(&self) -> &[ExpressionBind] {
        &self.binds
    }

    pub fn material_values(&self) -> &[ExpressionMaterialValue] {
        &self.material_values
    }

    /// 添加 morph target 绑定，`weight` 为 VRM 的 0 ~ 100
    pub fn add_bind(&mut self, meshes: Vec<NodeId>, morph_target_index: usize, weight: f32) {
        self.binds.push(ExpressionBind {
            meshes,
            morph_target_index,
            weight: weight / 100.0,
        });
    }

    /// 添加材质值
    ///
    /// `target` 按类型取前 1 ~ 4 个分量；Vector4 的 offset / tiling
    /// 在 VRM 数据中顺序与材质属性相反，这里调整为 (offset, tiling)。
    pub fn add_material_value(
        &mut self,
        material: usize,
        property_name: impl Into<String>,
        value_type: MaterialValueType,
        default_value: Vec4,
        target: &[f32],
    ) {
        let at = |i: usize| target.get(i).copied().unwrap_or(0.0);
        let target_value = match value_type {
            MaterialValueType::Number => Vec4::new(at(0), 0.0, 0.0, 0.0),
            MaterialValueType::Vector2 => Vec4::new(at(0), at(1), 0.0, 0.0),
            MaterialValueType::Vector3 | MaterialValueType::Color => Vec4::new(at(0), at(1), at(2), 0.0),
            MaterialValueType::Vector4 => Vec4::new(at(2), at(3), at(0), at(1)),
        };

        self.material_values.push(ExpressionMaterialValue {
            material,
            property_name: property_name.into(),
            value_type,
            default_value,
            target_value,
            delta_value: target_value - default_value,
        });
    }

    /// 实际生效的权重
    #[inline]
    pub fn applied_weight(&self) -> f32 {
        if self.is_binary {
            if self.weight < 0.5 { 0.0 } else { 1.0 }
        } else {
            self.weight
        }
    }

    /// 把绑定的 morph target 和材质值恢复为默认
    pub fn clear_applied_weight(&self, morphs: &mut MorphTargetWeights, materials: &mut MaterialValueResults) {
        for bind in &self.binds {
            for &mesh in &bind.meshes {
                morphs.set(mesh, bind.morph_target_index, 0.0);
            }
        }
        for value in &self.material_values {
            materials.set(value.material, &value.property_name, value.default_value);
        }
    }

    /// 累加本组的影响
    pub fn apply_weight(&self, morphs: &mut MorphTargetWeights, materials: &mut MaterialValueResults) {
        let w = self.applied_weight();
        for bind in &self.binds {
            for &mesh in &bind.meshes {
                morphs.add(mesh, bind.morph_target_index, w * bind.weight);
            }
        }
        for value in &self.material_values {
            materials.add(value.material, &value.property_name, value.delta_value * w);
        }
    }
}
