//! 弹簧骨骼管理器
//!
//! 骨骼组按注册顺序更新，组内骨骼按先序遍历顺序更新，
//! 保证父骨骼先于子骨骼完成本帧计算。

use super::{SpringBone, SpringBoneColliderGroup};
use crate::scene::{NodeId, NodeTree};
use crate::Result;

/// 一组弹簧骨骼（同一根骨骼链的先序遍历结果）
pub type SpringBoneGroup = Vec<SpringBone>;

/// 弹簧骨骼管理器
#[derive(Clone, Debug, Default)]
pub struct SpringBoneManager {
    /// 碰撞球组（只读，供外部调试显示）
    pub collider_groups: Vec<SpringBoneColliderGroup>,
    /// 骨骼组列表
    pub spring_bone_group_list: Vec<SpringBoneGroup>,
}

impl SpringBoneManager {
    pub fn new(
        collider_groups: Vec<SpringBoneColliderGroup>,
        spring_bone_group_list: Vec<SpringBoneGroup>,
    ) -> Self {
        Self {
            collider_groups,
            spring_bone_group_list,
        }
    }

    /// 所有骨骼切换到同一个参考空间
    ///
    /// 任何一根骨骼失败时立即返回错误；center 节点在开头统一校验，
    /// 校验失败时不会修改任何骨骼。
    pub fn set_center(&mut self, tree: &NodeTree, center: Option<NodeId>) -> Result<()> {
        if let Some(c) = center {
            tree.node(c)?;
        }
        for bone in self.bones_mut() {
            bone.rebase_to(tree, center)?;
        }
        Ok(())
    }

    /// 每帧更新（在动画和视线之后调用）
    ///
    /// 单根骨骼出错（节点被删除等）只记录警告，不中断其余骨骼。
    pub fn late_update(&mut self, tree: &mut NodeTree, delta: f32) {
        for group in &mut self.spring_bone_group_list {
            for bone in group.iter_mut() {
                if let Err(e) = bone.update(tree, delta) {
                    log::warn!("[SpringBone] 骨骼 {:?} 更新失败: {}", bone.bone(), e);
                }
            }
        }
    }

    /// 全部骨骼回到初始姿态
    pub fn reset(&mut self, tree: &mut NodeTree) {
        for bone in self.bones_mut() {
            if let Err(e) = bone.reset(tree) {
                log::warn!("[SpringBone] 骨骼 {:?} 重置失败: {}", bone.bone(), e);
            }
        }
    }

    // ========================================
    // 查询
    // ========================================

    pub fn group_count(&self) -> usize {
        self.spring_bone_group_list.len()
    }

    pub fn bone_count(&self) -> usize {
        self.spring_bone_group_list.iter().map(Vec::len).sum()
    }

    /// 按更新顺序遍历所有骨骼
    pub fn bones(&self) -> impl Iterator<Item = &SpringBone> {
        self.spring_bone_group_list.iter().flatten()
    }

    pub fn bones_mut(&mut self) -> impl Iterator<Item = &mut SpringBone> {
        self.spring_bone_group_list.iter_mut().flatten()
    }

    /// 查找驱动某个节点的弹簧骨骼
    pub fn find_bone(&self, node: NodeId) -> Option<&SpringBone> {
        self.bones().find(|b| b.bone() == node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::LocalTransform;
    use crate::spring_bone::SpringBoneParameters;
    use glam::{Quat, Vec3};

    const FRAME: f32 = 1.0 / 60.0;

    fn at(position: Vec3) -> LocalTransform {
        LocalTransform { position, ..Default::default() }
    }

    /// 三节骨骼链，沿 +X 水平伸出
    fn horizontal_chain(tree: &mut NodeTree) -> Vec<NodeId> {
        let root = tree.add_node("hair", at(Vec3::new(0.0, 1.5, 0.0)));
        let b1 = tree.add_child(root, "hair.1", at(Vec3::new(0.2, 0.0, 0.0))).unwrap();
        let b2 = tree.add_child(b1, "hair.2", at(Vec3::new(0.2, 0.0, 0.0))).unwrap();
        tree.update_world_transforms();
        vec![root, b1, b2]
    }

    fn build(tree: &mut NodeTree) -> (SpringBoneManager, Vec<NodeId>) {
        let chain = horizontal_chain(tree);
        let params = SpringBoneParameters { gravity_power: 1.0, ..Default::default() };
        let group = tree
            .traverse(chain[0])
            .unwrap()
            .into_iter()
            .map(|id| SpringBone::new(tree, id, params.clone()).unwrap())
            .collect();
        (SpringBoneManager::new(Vec::new(), vec![group]), chain)
    }

    #[test]
    fn test_counts_and_order() {
        let mut tree = NodeTree::new();
        let (manager, chain) = build(&mut tree);

        assert_eq!(manager.group_count(), 1);
        assert_eq!(manager.bone_count(), 3);
        let order: Vec<NodeId> = manager.bones().map(SpringBone::bone).collect();
        assert_eq!(order, chain);
        assert!(manager.find_bone(chain[1]).is_some());
    }

    #[test]
    fn test_late_update_bends_chain_with_gravity() {
        let mut tree = NodeTree::new();
        let (mut manager, chain) = build(&mut tree);
        let tip_before = tree.world_position(chain[2]).unwrap();

        for _ in 0..60 {
            manager.late_update(&mut tree, FRAME);
        }

        // 父骨骼先更新，子骨骼读取到的是本帧父矩阵，链条整体下垂
        let tip_after = tree.world_position(chain[2]).unwrap();
        assert!(tip_after.y < tip_before.y - 0.05);
        for bone in manager.bones() {
            let len = (bone.current_tail() - bone.center_space_position()).length();
            assert!((len - bone.center_space_bone_length()).abs() < 1e-4);
        }
    }

    #[test]
    fn test_reset_restores_initial_rotations() {
        let mut tree = NodeTree::new();
        let (mut manager, chain) = build(&mut tree);
        for _ in 0..30 {
            manager.late_update(&mut tree, FRAME);
        }
        assert!(tree.node(chain[0]).unwrap().rotation.angle_between(Quat::IDENTITY) > 1e-3);

        manager.reset(&mut tree);
        for id in chain {
            assert_eq!(tree.node(id).unwrap().rotation, Quat::IDENTITY);
        }
    }

    #[test]
    fn test_set_center_validates_before_mutating() {
        let mut tree = NodeTree::new();
        let (mut manager, _) = build(&mut tree);
        let center = tree.add_node("center", at(Vec3::new(0.0, 1.0, 0.0)));
        tree.update_world_transforms();

        assert!(manager.set_center(&tree, Some(NodeId(42))).is_err());
        assert!(manager.bones().all(|b| b.center().is_none()));

        manager.set_center(&tree, Some(center)).unwrap();
        assert!(manager.bones().all(|b| b.center() == Some(center)));
    }

    #[test]
    fn test_late_update_survives_missing_node() {
        let mut tree = NodeTree::new();
        let (mut manager, _) = build(&mut tree);
        // 指向不存在节点的碰撞球，该骨骼更新失败但不影响其它骨骼
        manager.spring_bone_group_list[0][1]
            .colliders
            .push(crate::spring_bone::SpringBoneCollider::new(NodeId(99), 0.1));

        manager.late_update(&mut tree, FRAME);
        let last = &manager.spring_bone_group_list[0][2];
        assert_ne!(last.current_tail(), last.prev_tail());
    }
}
