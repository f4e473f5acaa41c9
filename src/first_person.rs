//! 第一人称
//!
//! 第一人称骨骼（通常是头部）加偏移给出视点位置；
//! 网格按注解分配渲染层，第一人称相机隐藏头部网格。

use std::collections::HashMap;
use std::str::FromStr;

use bitflags::bitflags;
use glam::Vec3;

use crate::look_at::VECTOR3_FRONT;
use crate::math::rotate_vector;
use crate::scene::{NodeFlags, NodeId, NodeTree};
use crate::{Result, VrmError};

bitflags! {
    /// 渲染层掩码
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct RenderLayers: u32 {
        /// 两种相机都可见
        const BOTH = 0x0fff_ffff;
        /// 仅第一人称相机可见
        const FIRST_PERSON_ONLY = 0x1000_0000;
        /// 仅第三人称相机可见
        const THIRD_PERSON_ONLY = 0x2000_0000;
    }
}

/// 网格的第一人称标志
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FirstPersonFlag {
    /// 按是否挂在第一人称骨骼下自动判断
    #[default]
    Auto,
    Both,
    ThirdPersonOnly,
    FirstPersonOnly,
}

impl FromStr for FirstPersonFlag {
    type Err = VrmError;

    /// 未知字符串按 Auto 处理
    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "Both" => Self::Both,
            "ThirdPersonOnly" => Self::ThirdPersonOnly,
            "FirstPersonOnly" => Self::FirstPersonOnly,
            _ => Self::Auto,
        })
    }
}

/// 网格注解
#[derive(Clone, Debug, PartialEq)]
pub struct MeshAnnotation {
    pub flag: FirstPersonFlag,
    /// 网格节点
    pub mesh: NodeId,
    /// 蒙皮关节，为空表示非蒙皮网格
    pub joints: Vec<NodeId>,
}

/// 第一人称描述
#[derive(Clone, Debug)]
pub struct FirstPerson {
    bone: NodeId,
    bone_offset: Vec3,
    mesh_annotations: Vec<MeshAnnotation>,

    first_person_only_layer: RenderLayers,
    third_person_only_layer: RenderLayers,
    mesh_layers: HashMap<NodeId, RenderLayers>,
    initialized: bool,
}

impl FirstPerson {
    pub fn new(bone: NodeId, bone_offset: Vec3, mesh_annotations: Vec<MeshAnnotation>) -> Self {
        Self {
            bone,
            bone_offset,
            mesh_annotations,
            first_person_only_layer: RenderLayers::FIRST_PERSON_ONLY,
            third_person_only_layer: RenderLayers::THIRD_PERSON_ONLY,
            mesh_layers: HashMap::new(),
            initialized: false,
        }
    }

    /// 第一人称骨骼
    #[inline]
    pub fn bone(&self) -> NodeId {
        self.bone
    }

    #[inline]
    pub fn bone_offset(&self) -> Vec3 {
        self.bone_offset
    }

    pub fn mesh_annotations(&self) -> &[MeshAnnotation] {
        &self.mesh_annotations
    }

    #[inline]
    pub fn first_person_only_layer(&self) -> RenderLayers {
        self.first_person_only_layer
    }

    #[inline]
    pub fn third_person_only_layer(&self) -> RenderLayers {
        self.third_person_only_layer
    }

    /// 视点世界位置（偏移经骨骼世界矩阵变换）
    pub fn world_position(&self, tree: &NodeTree) -> Result<Vec3> {
        Ok(tree.world_matrix(self.bone)?.transform_point3(self.bone_offset))
    }

    /// 骨骼正前方的世界方向
    pub fn world_direction(&self, tree: &NodeTree) -> Result<Vec3> {
        Ok(rotate_vector(tree.world_rotation(self.bone)?, VECTOR3_FRONT))
    }

    /// 为注解网格分配渲染层（只执行一次）
    pub fn setup(
        &mut self,
        tree: &mut NodeTree,
        first_person_only_layer: RenderLayers,
        third_person_only_layer: RenderLayers,
    ) -> Result<()> {
        if self.initialized {
            return Ok(());
        }

        tree.insert_flags(self.bone, NodeFlags::FIRST_PERSON)?;

        let mut layers = HashMap::with_capacity(self.mesh_annotations.len());
        for annotation in &self.mesh_annotations {
            tree.insert_flags(annotation.mesh, NodeFlags::MESH)?;
            let layer = match annotation.flag {
                FirstPersonFlag::Both => RenderLayers::BOTH,
                FirstPersonFlag::FirstPersonOnly => first_person_only_layer,
                FirstPersonFlag::ThirdPersonOnly => third_person_only_layer,
                FirstPersonFlag::Auto => {
                    if self.is_head_mesh(tree, annotation) {
                        third_person_only_layer
                    } else {
                        RenderLayers::BOTH
                    }
                }
            };
            layers.insert(annotation.mesh, layer);
        }

        self.mesh_layers = layers;
        self.first_person_only_layer = first_person_only_layer;
        self.third_person_only_layer = third_person_only_layer;
        self.initialized = true;
        log::info!("[FirstPerson] 已分配 {} 个网格的渲染层", self.mesh_layers.len());
        Ok(())
    }

    /// 蒙皮网格看关节，普通网格看节点本身是否在第一人称骨骼之下
    fn is_head_mesh(&self, tree: &NodeTree, annotation: &MeshAnnotation) -> bool {
        if annotation.joints.is_empty() {
            tree.is_descendant_of(annotation.mesh, self.bone)
        } else {
            annotation
                .joints
                .iter()
                .any(|&joint| tree.is_descendant_of(joint, self.bone))
        }
    }

    /// 网格的渲染层，setup 前或未注解的网格为 None
    pub fn mesh_layers(&self, mesh: NodeId) -> Option<RenderLayers> {
        self.mesh_layers.get(&mesh).copied()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}
