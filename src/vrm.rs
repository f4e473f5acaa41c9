//! VRM 模型
//!
//! 持有场景节点树和各个 VRM 组件，每帧按固定顺序更新：
//! 视线 -> 表情 -> 弹簧骨骼。

use crate::expression::ExpressionProxy;
use crate::first_person::FirstPerson;
use crate::humanoid::Humanoid;
use crate::look_at::LookAtHead;
use crate::scene::NodeTree;
use crate::spring_bone::SpringBoneManager;
use crate::{Result, VrmError};

/// VRM 模型
#[derive(Debug, Clone)]
pub struct Vrm {
    pub tree: NodeTree,
    pub humanoid: Option<Humanoid>,
    pub expression_proxy: ExpressionProxy,
    pub first_person: Option<FirstPerson>,
    /// 视线需要第一人称骨骼，构建时保证两者同时存在
    pub look_at: Option<LookAtHead>,
    pub spring_bone_manager: Option<SpringBoneManager>,
}

impl Vrm {
    pub fn builder(tree: NodeTree) -> VrmBuilder {
        VrmBuilder::new(tree)
    }

    /// 每帧更新（在动画之后调用）
    ///
    /// 单个组件出错只记录警告，不影响其余组件。
    pub fn update(&mut self, delta: f32) {
        // 1. 动画写入的本地姿态 -> 世界矩阵
        self.tree.update_world_transforms();

        // 2. 视线
        if let (Some(look_at), Some(first_person)) = (&mut self.look_at, &self.first_person) {
            if let Err(e) = look_at.update(delta, &mut self.tree, first_person, &mut self.expression_proxy) {
                log::warn!("[VRM] 视线更新失败: {}", e);
            }
        }

        // 3. 表情
        self.expression_proxy.update();

        // 4. 弹簧骨骼
        if let Some(manager) = &mut self.spring_bone_manager {
            manager.late_update(&mut self.tree, delta);
        }

        // 5. 视线和弹簧骨骼修改过的本地旋转 -> 世界矩阵
        self.tree.update_world_transforms();
    }

    /// 回到初始姿态，弹簧骨骼速度清零
    pub fn reset(&mut self) -> Result<()> {
        if let Some(humanoid) = &self.humanoid {
            humanoid.reset_pose(&mut self.tree)?;
        }
        self.tree.update_world_transforms();

        if let Some(manager) = &mut self.spring_bone_manager {
            manager.reset(&mut self.tree);
        }
        self.tree.update_world_transforms();
        Ok(())
    }
}

/// VRM 构建器
#[derive(Debug, Clone)]
pub struct VrmBuilder {
    tree: NodeTree,
    humanoid: Option<Humanoid>,
    expression_proxy: ExpressionProxy,
    first_person: Option<FirstPerson>,
    look_at: Option<LookAtHead>,
    spring_bone_manager: Option<SpringBoneManager>,
}

impl VrmBuilder {
    pub fn new(tree: NodeTree) -> Self {
        Self {
            tree,
            humanoid: None,
            expression_proxy: ExpressionProxy::new(),
            first_person: None,
            look_at: None,
            spring_bone_manager: None,
        }
    }

    pub fn humanoid(mut self, humanoid: Humanoid) -> Self {
        self.humanoid = Some(humanoid);
        self
    }

    pub fn expression_proxy(mut self, proxy: ExpressionProxy) -> Self {
        self.expression_proxy = proxy;
        self
    }

    pub fn first_person(mut self, first_person: FirstPerson) -> Self {
        self.first_person = Some(first_person);
        self
    }

    pub fn look_at(mut self, look_at: LookAtHead) -> Self {
        self.look_at = Some(look_at);
        self
    }

    pub fn spring_bone_manager(mut self, manager: SpringBoneManager) -> Self {
        self.spring_bone_manager = Some(manager);
        self
    }

    pub fn build(mut self) -> Result<Vrm> {
        if self.look_at.is_some() && self.first_person.is_none() {
            return Err(VrmError::MissingComponent("firstPerson"));
        }
        if let Some(first_person) = &self.first_person {
            self.tree.node(first_person.bone())?;
        }
        if let Some(humanoid) = &self.humanoid {
            humanoid.mark_flags(&mut self.tree)?;
        }

        self.tree.update_world_transforms();
        log::info!(
            "[VRM] 构建完成: {} 个节点, {} 根弹簧骨骼, {} 个表情",
            self.tree.len(),
            self.spring_bone_manager.as_ref().map_or(0, SpringBoneManager::bone_count),
            self.expression_proxy.group_count()
        );

        Ok(Vrm {
            tree: self.tree,
            humanoid: self.humanoid,
            expression_proxy: self.expression_proxy,
            first_person: self.first_person,
            look_at: self.look_at,
            spring_bone_manager: self.spring_bone_manager,
        })
    }
}
