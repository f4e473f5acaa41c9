//! 节点树
//!
//! 节点按添加顺序存放在 Vec 中。世界矩阵是缓存值，
//! 只有调用 update_* 系列方法时才会重新计算。

use std::collections::HashMap;

use glam::{Mat4, Quat, Vec3};

use super::{LocalTransform, NodeFlags, NodeId, TransformNode};
use crate::{Result, VrmError};

/// 节点树
#[derive(Clone, Debug, Default)]
pub struct NodeTree {
    nodes: Vec<TransformNode>,
    name_to_index: HashMap<String, usize>,
}

impl NodeTree {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            name_to_index: HashMap::new(),
        }
    }

    /// 添加根节点，返回句柄
    pub fn add_node(&mut self, name: impl Into<String>, transform: LocalTransform) -> NodeId {
        let node = TransformNode::with_transform(name, transform);
        let id = NodeId(self.nodes.len());
        // 重名时保留第一个
        self.name_to_index.entry(node.name.clone()).or_insert(id.0);
        self.nodes.push(node);
        id
    }

    /// 添加子节点（本地变换相对于 parent），并刷新其世界矩阵
    pub fn add_child(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        transform: LocalTransform,
    ) -> Result<NodeId> {
        self.check(parent)?;
        let id = self.add_node(name, transform);
        self.set_parent(id, Some(parent))?;
        self.update_world_transform(id)?;
        Ok(id)
    }

    /// 设置父节点（None 表示变为根节点）
    ///
    /// 本地变换保持不变，世界矩阵需要调用方刷新。
    pub fn set_parent(&mut self, child: NodeId, parent: Option<NodeId>) -> Result<()> {
        self.check(child)?;
        if let Some(p) = parent {
            self.check(p)?;
            // 防止环：parent 不能是 child 自身或其后代
            let mut cursor = Some(p);
            while let Some(c) = cursor {
                if c == child {
                    return Err(VrmError::InvalidHierarchy(format!(
                        "{:?} cannot be parented under its descendant {:?}",
                        child, p
                    )));
                }
                cursor = self.nodes[c.0].parent;
            }
        }

        if let Some(old) = self.nodes[child.0].parent.take() {
            self.nodes[old.0].children.retain(|&c| c != child);
        }
        if let Some(p) = parent {
            self.nodes[p.0].children.push(child);
        }
        self.nodes[child.0].parent = parent;
        Ok(())
    }

    // ========================================
    // 访问器
    // ========================================

    #[inline]
    fn check(&self, id: NodeId) -> Result<()> {
        if id.0 < self.nodes.len() {
            Ok(())
        } else {
            Err(VrmError::NodeNotFound(id))
        }
    }

    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    pub fn get(&self, id: NodeId) -> Option<&TransformNode> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut TransformNode> {
        self.nodes.get_mut(id.0)
    }

    pub fn node(&self, id: NodeId) -> Result<&TransformNode> {
        self.nodes.get(id.0).ok_or(VrmError::NodeNotFound(id))
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut TransformNode> {
        self.nodes.get_mut(id.0).ok_or(VrmError::NodeNotFound(id))
    }

    /// 通过名称查找节点
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.name_to_index.get(name).copied().map(NodeId)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// 所有节点句柄
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    pub fn insert_flags(&mut self, id: NodeId, flags: NodeFlags) -> Result<()> {
        self.node_mut(id)?.flags.insert(flags);
        Ok(())
    }

    // ========================================
    // 矩阵查询（读取缓存）
    // ========================================

    pub fn world_matrix(&self, id: NodeId) -> Result<Mat4> {
        Ok(self.node(id)?.local_to_world)
    }

    pub fn world_position(&self, id: NodeId) -> Result<Vec3> {
        Ok(self.node(id)?.world_position())
    }

    pub fn world_rotation(&self, id: NodeId) -> Result<Quat> {
        Ok(self.node(id)?.world_rotation())
    }

    /// 父节点的世界矩阵（根节点为单位矩阵）
    pub fn parent_world_matrix(&self, id: NodeId) -> Result<Mat4> {
        match self.node(id)?.parent {
            Some(p) => Ok(self.nodes[p.0].local_to_world),
            None => Ok(Mat4::IDENTITY),
        }
    }

    // ========================================
    // 变换更新
    // ========================================

    /// 设置本地旋转并重算本地矩阵
    pub fn set_local_rotation(&mut self, id: NodeId, rotation: Quat) -> Result<()> {
        let node = self.node_mut(id)?;
        node.rotation = rotation;
        node.compute_local_transform();
        Ok(())
    }

    /// 设置本地平移并重算本地矩阵
    pub fn set_local_position(&mut self, id: NodeId, position: Vec3) -> Result<()> {
        let node = self.node_mut(id)?;
        node.position = position;
        node.compute_local_transform();
        Ok(())
    }

    /// 由 TRS 重算本地矩阵
    pub fn update_local_transform(&mut self, id: NodeId) -> Result<()> {
        self.node_mut(id)?.compute_local_transform();
        Ok(())
    }

    /// 使用父节点缓存的世界矩阵重算单个节点的世界矩阵（不递归）
    pub fn update_world_transform(&mut self, id: NodeId) -> Result<()> {
        let parent_world = self.parent_world_matrix(id)?;
        let node = &mut self.nodes[id.0];
        node.local_to_world = parent_world * node.local_to_parent;
        Ok(())
    }

    /// 重算节点及其全部后代的本地和世界矩阵
    pub fn update_world_transform_recursive(&mut self, id: NodeId) -> Result<()> {
        self.check(id)?;
        let mut stack = vec![id];
        while let Some(idx) = stack.pop() {
            self.nodes[idx.0].compute_local_transform();
            self.update_world_transform(idx)?;
            // 逆序压栈保证先序访问
            stack.extend(self.nodes[idx.0].children.iter().rev().copied());
        }
        Ok(())
    }

    /// 从所有根节点刷新整棵树
    pub fn update_world_transforms(&mut self) {
        let roots: Vec<NodeId> = self
            .ids()
            .filter(|&id| self.nodes[id.0].parent.is_none())
            .collect();
        for root in roots {
            // 根节点来自 ids()，一定存在
            let _ = self.update_world_transform_recursive(root);
        }
    }

    /// 深度优先先序遍历（包含 root 自身），结果一次性物化
    pub fn traverse(&self, root: NodeId) -> Result<Vec<NodeId>> {
        self.check(root)?;
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(idx) = stack.pop() {
            order.push(idx);
            stack.extend(self.nodes[idx.0].children.iter().rev().copied());
        }
        Ok(order)
    }

    /// node 是否是 ancestor 自身或其后代
    pub fn is_descendant_of(&self, node: NodeId, ancestor: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(c) = cursor {
            if c == ancestor {
                return true;
            }
            cursor = self.nodes.get(c.0).and_then(|n| n.parent);
        }
        false
    }
}
