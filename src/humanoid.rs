//! 人形骨骼映射与姿态
//!
//! 姿态以初始姿态为基准：position 是相对偏移，rotation 是 `当前 * 初始⁻¹`。

use std::collections::HashMap;
use std::str::FromStr;

use glam::{Quat, Vec3};

use crate::scene::{NodeFlags, NodeId, NodeTree};
use crate::{Result, VrmError};

macro_rules! human_bones {
    ($($variant:ident => $name:literal),* $(,)?) => {
        /// VRM 0.x 人形骨骼名
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum HumanBoneName {
            $($variant,)*
        }

        impl HumanBoneName {
            /// 全部骨骼名
            pub const ALL: &'static [HumanBoneName] = &[$(HumanBoneName::$variant,)*];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(HumanBoneName::$variant => $name,)*
                }
            }
        }

        impl FromStr for HumanBoneName {
            type Err = VrmError;

            fn from_str(s: &str) -> Result<Self> {
                match s {
                    $($name => Ok(HumanBoneName::$variant),)*
                    _ => Err(VrmError::UnknownName(s.to_string())),
                }
            }
        }
    };
}

human_bones! {
    Hips => "hips",
    LeftUpperLeg => "leftUpperLeg",
    RightUpperLeg => "rightUpperLeg",
    LeftLowerLeg => "leftLowerLeg",
    RightLowerLeg => "rightLowerLeg",
    LeftFoot => "leftFoot",
    RightFoot => "rightFoot",
    Spine => "spine",
    Chest => "chest",
    Neck => "neck",
    Head => "head",
    LeftShoulder => "leftShoulder",
    RightShoulder => "rightShoulder",
    LeftUpperArm => "leftUpperArm",
    RightUpperArm => "rightUpperArm",
    LeftLowerArm => "leftLowerArm",
    RightLowerArm => "rightLowerArm",
    LeftHand => "leftHand",
    RightHand => "rightHand",
    LeftToes => "leftToes",
    RightToes => "rightToes",
    LeftEye => "leftEye",
    RightEye => "rightEye",
    Jaw => "jaw",
    LeftThumbProximal => "leftThumbProximal",
    LeftThumbIntermediate => "leftThumbIntermediate",
    LeftThumbDistal => "leftThumbDistal",
    LeftIndexProximal => "leftIndexProximal",
    LeftIndexIntermediate => "leftIndexIntermediate",
    LeftIndexDistal => "leftIndexDistal",
    LeftMiddleProximal => "leftMiddleProximal",
    LeftMiddleIntermediate => "leftMiddleIntermediate",
    LeftMiddleDistal => "leftMiddleDistal",
    LeftRingProximal => "leftRingProximal",
    LeftRingIntermediate => "leftRingIntermediate",
    LeftRingDistal => "leftRingDistal",
    LeftLittleProximal => "leftLittleProximal",
    LeftLittleIntermediate => "leftLittleIntermediate",
    LeftLittleDistal => "leftLittleDistal",
    RightThumbProximal => "rightThumbProximal",
    RightThumbIntermediate => "rightThumbIntermediate",
    RightThumbDistal => "rightThumbDistal",
    RightIndexProximal => "rightIndexProximal",
    RightIndexIntermediate => "rightIndexIntermediate",
    RightIndexDistal => "rightIndexDistal",
    RightMiddleProximal => "rightMiddleProximal",
    RightMiddleIntermediate => "rightMiddleIntermediate",
    RightMiddleDistal => "rightMiddleDistal",
    RightRingProximal => "rightRingProximal",
    RightRingIntermediate => "rightRingIntermediate",
    RightRingDistal => "rightRingDistal",
    RightLittleProximal => "rightLittleProximal",
    RightLittleIntermediate => "rightLittleIntermediate",
    RightLittleDistal => "rightLittleDistal",
    UpperChest => "upperChest",
}

/// 单根骨骼的姿态
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BonePose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for BonePose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

/// 人形姿态（骨骼名 -> 姿态）
pub type VrmPose = HashMap<HumanBoneName, BonePose>;

/// 人形骨骼映射
#[derive(Debug, Clone, Default)]
pub struct Humanoid {
    /// 每个骨骼名可以映射多个节点，第一个为主节点
    human_bones: HashMap<HumanBoneName, Vec<NodeId>>,
    /// 初始本地姿态（绝对值）
    rest_pose: VrmPose,
}

impl Humanoid {
    /// 创建人形映射并记录当前本地姿态为初始姿态
    pub fn new(tree: &NodeTree, bones: &[(HumanBoneName, NodeId)]) -> Result<Self> {
        let mut human_bones: HashMap<HumanBoneName, Vec<NodeId>> = HashMap::new();
        let mut rest_pose = VrmPose::new();

        for &(name, node) in bones {
            let n = tree.node(node)?;
            human_bones.entry(name).or_default().push(node);
            rest_pose.entry(name).or_insert(BonePose {
                position: n.position,
                rotation: n.rotation,
            });
        }

        Ok(Self { human_bones, rest_pose })
    }

    /// 把左右眼节点标记为 EYE
    pub fn mark_flags(&self, tree: &mut NodeTree) -> Result<()> {
        for (name, flag) in [
            (HumanBoneName::LeftEye, NodeFlags::EYE),
            (HumanBoneName::RightEye, NodeFlags::EYE),
        ] {
            if let Some(node) = self.get_bone_node(name) {
                tree.insert_flags(node, flag)?;
            }
        }
        Ok(())
    }

    /// 骨骼的主节点
    pub fn get_bone_node(&self, name: HumanBoneName) -> Option<NodeId> {
        self.human_bones.get(&name).and_then(|nodes| nodes.first().copied())
    }

    /// 骨骼的全部节点
    pub fn get_bone_nodes(&self, name: HumanBoneName) -> &[NodeId] {
        self.human_bones.get(&name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn rest_pose(&self) -> &VrmPose {
        &self.rest_pose
    }

    /// 当前姿态（相对初始姿态）
    pub fn get_pose(&self, tree: &NodeTree) -> Result<VrmPose> {
        let mut pose = VrmPose::new();
        for (&name, rest) in &self.rest_pose {
            let Some(node) = self.get_bone_node(name) else {
                continue;
            };
            let n = tree.node(node)?;
            pose.insert(name, BonePose {
                position: n.position - rest.position,
                rotation: n.rotation * rest.rotation.inverse(),
            });
        }
        Ok(pose)
    }

    /// 设置姿态（相对初始姿态），只修改本地 TRS，世界矩阵由调用方刷新
    pub fn set_pose(&self, tree: &mut NodeTree, pose: &VrmPose) -> Result<()> {
        for (name, state) in pose {
            let (Some(node), Some(rest)) = (self.get_bone_node(*name), self.rest_pose.get(name)) else {
                continue;
            };
            let n = tree.node_mut(node)?;
            n.position = state.position + rest.position;
            n.rotation = state.rotation * rest.rotation;
            n.compute_local_transform();
        }
        Ok(())
    }

    /// 回到初始姿态
    pub fn reset_pose(&self, tree: &mut NodeTree) -> Result<()> {
        for (name, rest) in &self.rest_pose {
            let Some(node) = self.get_bone_node(*name) else {
                continue;
            };
            let n = tree.node_mut(node)?;
            n.position = rest.position;
            n.rotation = rest.rotation;
            n.compute_local_transform();
        }
        Ok(())
    }
}
