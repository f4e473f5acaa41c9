//! 表情系统 - VRM blendShapeMaster
//!
//! ExpressionProxy 持有全部表情组，每帧先清零再累加，
//! 结果写入 MorphTargetWeights / MaterialValueResults 供宿主读取。

mod group;
mod proxy;

pub use group::{ExpressionBind, ExpressionGroup, ExpressionMaterialValue, MaterialValueType};
pub use proxy::ExpressionProxy;

use std::collections::HashMap;
use std::str::FromStr;

use glam::Vec4;

use crate::scene::NodeId;
use crate::VrmError;

/// 预设表情
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpressionPreset {
    Neutral,
    A,
    I,
    U,
    E,
    O,
    Blink,
    BlinkL,
    BlinkR,
    Joy,
    Angry,
    Sorrow,
    Fun,
    LookUp,
    LookDown,
    LookLeft,
    LookRight,
    Unknown,
}

impl ExpressionPreset {
    pub const ALL: [ExpressionPreset; 18] = [
        Self::Neutral,
        Self::A,
        Self::I,
        Self::U,
        Self::E,
        Self::O,
        Self::Blink,
        Self::BlinkL,
        Self::BlinkR,
        Self::Joy,
        Self::Angry,
        Self::Sorrow,
        Self::Fun,
        Self::LookUp,
        Self::LookDown,
        Self::LookLeft,
        Self::LookRight,
        Self::Unknown,
    ];

    /// VRM 0.x presetName
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::A => "a",
            Self::I => "i",
            Self::U => "u",
            Self::E => "e",
            Self::O => "o",
            Self::Blink => "blink",
            Self::BlinkL => "blink_l",
            Self::BlinkR => "blink_r",
            Self::Joy => "joy",
            Self::Angry => "angry",
            Self::Sorrow => "sorrow",
            Self::Fun => "fun",
            Self::LookUp => "lookup",
            Self::LookDown => "lookdown",
            Self::LookLeft => "lookleft",
            Self::LookRight => "lookright",
            Self::Unknown => "unknown",
        }
    }
}

impl FromStr for ExpressionPreset {
    type Err = VrmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| VrmError::UnknownName(s.to_string()))
    }
}

/// morph target 权重输出（网格节点 -> 各 target 权重）
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MorphTargetWeights {
    weights: HashMap<NodeId, Vec<f32>>,
}

impl MorphTargetWeights {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, mesh: NodeId, index: usize) -> &mut f32 {
        let weights = self.weights.entry(mesh).or_default();
        if weights.len() <= index {
            weights.resize(index + 1, 0.0);
        }
        &mut weights[index]
    }

    pub fn set(&mut self, mesh: NodeId, index: usize, value: f32) {
        *self.slot(mesh, index) = value;
    }

    pub fn add(&mut self, mesh: NodeId, index: usize, value: f32) {
        *self.slot(mesh, index) += value;
    }

    /// 未写入过的 target 为 0
    pub fn get(&self, mesh: NodeId, index: usize) -> f32 {
        self.weights
            .get(&mesh)
            .and_then(|w| w.get(index))
            .copied()
            .unwrap_or(0.0)
    }

    /// 某个网格的全部 target 权重
    pub fn mesh_weights(&self, mesh: NodeId) -> &[f32] {
        self.weights.get(&mesh).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn meshes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.weights.keys().copied()
    }
}

/// 材质值输出（(材质, 属性) -> 值）
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MaterialValueResults {
    values: HashMap<(usize, String), Vec4>,
}

impl MaterialValueResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, material: usize, property: &str, value: Vec4) {
        self.values.insert((material, property.to_string()), value);
    }

    pub fn add(&mut self, material: usize, property: &str, delta: Vec4) {
        *self
            .values
            .entry((material, property.to_string()))
            .or_insert(Vec4::ZERO) += delta;
    }

    pub fn get(&self, material: usize, property: &str) -> Option<Vec4> {
        self.values.get(&(material, property.to_string())).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
