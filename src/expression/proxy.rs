//! 表情代理
//!
//! 按名称或预设设置表情权重，update 时统一写入输出。

use std::collections::HashMap;

use super::{ExpressionGroup, ExpressionPreset, MaterialValueResults, MorphTargetWeights};

/// 表情代理
#[derive(Clone, Debug, Default)]
pub struct ExpressionProxy {
    groups: Vec<ExpressionGroup>,
    name_to_index: HashMap<String, usize>,
    preset_map: HashMap<ExpressionPreset, usize>,
    unknown_group_names: Vec<String>,

    /// morph target 权重输出
    pub morph_weights: MorphTargetWeights,
    /// 材质值输出
    pub material_values: MaterialValueResults,
}

impl ExpressionProxy {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册表情组
    ///
    /// 同名组会被替换；没有预设的组记入 unknown_group_names。
    pub fn register_group(&mut self, name: &str, preset: Option<ExpressionPreset>, group: ExpressionGroup) {
        let index = match self.name_to_index.get(name) {
            Some(&index) => {
                self.groups[index] = group;
                index
            }
            None => {
                let index = self.groups.len();
                self.groups.push(group);
                self.name_to_index.insert(name.to_string(), index);
                index
            }
        };

        match preset {
            Some(preset) => {
                self.preset_map.insert(preset, index);
            }
            None => self.unknown_group_names.push(name.to_string()),
        }
    }

    /// 已注册的组名
    pub fn expressions(&self) -> impl Iterator<Item = &str> {
        self.name_to_index.keys().map(String::as_str)
    }

    pub fn unknown_group_names(&self) -> &[String] {
        &self.unknown_group_names
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// 名称解析：先按预设名，再按组名
    fn find(&self, name: &str) -> Option<usize> {
        name.parse::<ExpressionPreset>()
            .ok()
            .and_then(|preset| self.preset_map.get(&preset).copied())
            .or_else(|| self.name_to_index.get(name).copied())
    }

    pub fn get_group(&self, name: &str) -> Option<&ExpressionGroup> {
        self.find(name).map(|i| &self.groups[i])
    }

    pub fn get_preset_group(&self, preset: ExpressionPreset) -> Option<&ExpressionGroup> {
        self.preset_map.get(&preset).map(|&i| &self.groups[i])
    }

    /// 当前权重，未注册时为 None
    pub fn get_value(&self, name: &str) -> Option<f32> {
        self.get_group(name).map(|g| g.weight)
    }

    pub fn get_preset_value(&self, preset: ExpressionPreset) -> Option<f32> {
        self.get_preset_group(preset).map(|g| g.weight)
    }

    /// 设置权重（截断到 0 ~ 1），未注册的名称记录警告
    pub fn set_value(&mut self, name: &str, weight: f32) -> bool {
        match self.find(name) {
            Some(index) => {
                self.groups[index].weight = weight.clamp(0.0, 1.0);
                true
            }
            None => {
                log::warn!("[Expression] 未找到表情 '{}'", name);
                false
            }
        }
    }

    /// 按预设设置权重
    ///
    /// 视线等内部调用使用此接口，模型没有对应预设时静默忽略。
    pub fn set_preset_value(&mut self, preset: ExpressionPreset, weight: f32) -> bool {
        match self.preset_map.get(&preset) {
            Some(&index) => {
                self.groups[index].weight = weight.clamp(0.0, 1.0);
                true
            }
            None => false,
        }
    }

    /// 全部权重归零
    pub fn reset_all_weights(&mut self) {
        for group in &mut self.groups {
            group.weight = 0.0;
        }
    }

    /// 刷新输出：先把所有绑定恢复默认，再逐组累加
    pub fn update(&mut self) {
        for group in &self.groups {
            group.clear_applied_weight(&mut self.morph_weights, &mut self.material_values);
        }
        for group in &self.groups {
            group.apply_weight(&mut self.morph_weights, &mut self.material_values);
        }
    }
}
