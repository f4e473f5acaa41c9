//! 视线头部：把目标位置分解为第一人称骨骼空间中的俯仰 / 偏航

use glam::{Vec2, Vec3};

use super::applyer::eye_rotation;
use super::LookAtApplyer;
use crate::expression::ExpressionProxy;
use crate::first_person::FirstPerson;
use crate::math::{normalize_or_keep, rotate_vector};
use crate::scene::{NodeId, NodeTree};
use crate::Result;

/// 第一人称骨骼空间中的正前方
pub const VECTOR3_FRONT: Vec3 = Vec3::new(0.0, 0.0, -1.0);

/// 水平分量小于此值时认为视线竖直，偏航取 0
const VERTICAL_EPSILON: f32 = 1e-6;

/// 视线头部
#[derive(Debug, Clone)]
pub struct LookAtHead {
    /// 自动更新时跟随的目标节点
    pub target: Option<NodeId>,
    /// 为 false 时 update 不做任何事，只能手动调用 look_at
    pub auto_update: bool,
    pub applyer: Option<LookAtApplyer>,
    /// (俯仰, 偏航)，弧度
    euler: Vec2,
}

impl LookAtHead {
    pub fn new(applyer: Option<LookAtApplyer>) -> Self {
        Self {
            target: None,
            auto_update: true,
            applyer,
            euler: Vec2::ZERO,
        }
    }

    /// 当前 (俯仰, 偏航)
    #[inline]
    pub fn euler(&self) -> Vec2 {
        self.euler
    }

    /// 看向世界空间中的位置
    ///
    /// 开启自动更新且设置了目标时，结果会在下一次 update 中被覆盖。
    pub fn look_at(
        &mut self,
        position: Vec3,
        tree: &mut NodeTree,
        first_person: &FirstPerson,
        expressions: &mut ExpressionProxy,
    ) -> Result<()> {
        self.euler = self.calc_euler(position, tree, first_person)?;
        if let Some(applyer) = &self.applyer {
            applyer.apply(self.euler, tree, expressions)?;
        }
        Ok(())
    }

    /// 每帧更新：跟随目标节点
    pub fn update(
        &mut self,
        delta: f32,
        tree: &mut NodeTree,
        first_person: &FirstPerson,
        expressions: &mut ExpressionProxy,
    ) -> Result<()> {
        if delta <= 0.0 || !self.auto_update {
            return Ok(());
        }
        let Some(target) = self.target else {
            return Ok(());
        };
        let position = tree.world_position(target)?;
        self.look_at(position, tree, first_person, expressions)
    }

    /// 目标方向 -> (俯仰, 偏航)
    ///
    /// 俯仰正值向上，偏航正值向左（第一人称骨骼本地空间，前方为 -Z）。
    pub fn calc_euler(&self, position: Vec3, tree: &NodeTree, first_person: &FirstPerson) -> Result<Vec2> {
        let head_position = first_person.world_position(tree)?;
        let world_dir = normalize_or_keep(position - head_position, VECTOR3_FRONT);

        // 世界方向转到第一人称骨骼本地空间
        let bone_rotation = tree.world_rotation(first_person.bone())?;
        let dir = rotate_vector(bone_rotation.inverse(), world_dir);

        let horizontal = (dir.x * dir.x + dir.z * dir.z).sqrt();
        let pitch = dir.y.atan2(horizontal);
        let yaw = if horizontal < VERTICAL_EPSILON {
            0.0
        } else {
            (-dir.x).atan2(-dir.z)
        };
        Ok(Vec2::new(pitch, yaw))
    }

    /// 当前视线在世界空间中的方向
    pub fn look_at_world_direction(&self, tree: &NodeTree, first_person: &FirstPerson) -> Result<Vec3> {
        let bone_rotation = tree.world_rotation(first_person.bone())?;
        let local = rotate_vector(eye_rotation(self.euler.x, self.euler.y), VECTOR3_FRONT);
        Ok(rotate_vector(bone_rotation, local))
    }
}

impl Default for LookAtHead {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::{ExpressionGroup, ExpressionPreset};
    use crate::look_at::{CurveMapper, DegreeMap};
    use crate::scene::LocalTransform;
    use glam::Quat;
    use std::f32::consts::FRAC_PI_2;

    const EPS: f32 = 1e-5;

    /// 头部位于 (0, 1.5, 0)，面向 -Z
    fn setup(head_rotation: Quat) -> (NodeTree, FirstPerson) {
        let mut tree = NodeTree::new();
        let head = tree.add_node("head", LocalTransform {
            position: Vec3::new(0.0, 1.5, 0.0),
            rotation: head_rotation,
            scale: Vec3::ONE,
        });
        tree.update_world_transforms();
        (tree, FirstPerson::new(head, Vec3::ZERO, Vec::new()))
    }

    fn euler_to(position: Vec3, head_rotation: Quat) -> Vec2 {
        let (tree, fp) = setup(head_rotation);
        LookAtHead::default().calc_euler(position, &tree, &fp).unwrap()
    }

    #[test]
    fn test_straight_ahead() {
        let euler = euler_to(Vec3::new(0.0, 1.5, -5.0), Quat::IDENTITY);
        assert!(euler.length() < EPS);
    }

    #[test]
    fn test_gaze_sign_conventions() {
        // 本地右侧：偏航为负
        let euler = euler_to(Vec3::new(1.0, 1.5, 0.0), Quat::IDENTITY);
        assert!((euler.y + FRAC_PI_2).abs() < EPS);
        assert!(euler.x.abs() < EPS);

        // 本地左侧：偏航为正
        let euler = euler_to(Vec3::new(-1.0, 1.5, 0.0), Quat::IDENTITY);
        assert!((euler.y - FRAC_PI_2).abs() < EPS);

        // 上方 45°：俯仰为正
        let euler = euler_to(Vec3::new(0.0, 2.5, -1.0), Quat::IDENTITY);
        assert!((euler.x - FRAC_PI_2 / 2.0).abs() < EPS);
        assert!(euler.y.abs() < EPS);

        // 下方：俯仰为负
        let euler = euler_to(Vec3::new(0.0, 0.5, -1.0), Quat::IDENTITY);
        assert!(euler.x < 0.0);
    }

    #[test]
    fn test_vertical_gaze_has_zero_yaw() {
        let euler = euler_to(Vec3::new(0.0, 3.0, 0.0), Quat::IDENTITY);
        assert!((euler.x - FRAC_PI_2).abs() < EPS);
        assert_eq!(euler.y, 0.0);
    }

    #[test]
    fn test_euler_is_in_head_local_space() {
        // 头部左转 90°（绕 +Y），世界 -X 方向成为本地正前方
        let euler = euler_to(Vec3::new(-3.0, 1.5, 0.0), Quat::from_rotation_y(FRAC_PI_2));
        assert!(euler.length() < EPS);
    }

    #[test]
    fn test_world_direction_points_at_target() {
        let (mut tree, fp) = setup(Quat::from_rotation_y(0.4));
        let mut head = LookAtHead::default();
        let mut proxy = ExpressionProxy::new();
        let target = Vec3::new(2.0, 2.5, -3.0);

        head.look_at(target, &mut tree, &fp, &mut proxy).unwrap();
        let dir = head.look_at_world_direction(&tree, &fp).unwrap();
        let expected = (target - Vec3::new(0.0, 1.5, 0.0)).normalize();
        assert!((dir - expected).length() < 1e-4, "{dir:?} vs {expected:?}");
    }

    #[test]
    fn test_update_follows_target_once_enabled() {
        let (mut tree, fp) = setup(Quat::IDENTITY);
        let target = tree.add_node("target", LocalTransform {
            position: Vec3::new(-1.0, 1.5, 0.0),
            ..Default::default()
        });
        tree.update_world_transforms();

        let mapper = CurveMapper::for_expression(&DegreeMap {
            x_range: Some(90.0),
            y_range: Some(1.0),
            curve: None,
        })
        .unwrap();
        let mut head = LookAtHead::new(Some(LookAtApplyer::Expression {
            horizontal: mapper.clone(),
            vertical_down: mapper.clone(),
            vertical_up: mapper,
        }));
        let mut proxy = ExpressionProxy::new();
        proxy.register_group("lookleft", Some(ExpressionPreset::LookLeft), ExpressionGroup::new("lookleft"));

        // 没有目标
        head.update(1.0 / 60.0, &mut tree, &fp, &mut proxy).unwrap();
        assert_eq!(head.euler(), Vec2::ZERO);

        head.target = Some(target);
        // delta <= 0 不更新
        head.update(0.0, &mut tree, &fp, &mut proxy).unwrap();
        assert_eq!(head.euler(), Vec2::ZERO);

        head.auto_update = false;
        head.update(1.0 / 60.0, &mut tree, &fp, &mut proxy).unwrap();
        assert_eq!(head.euler(), Vec2::ZERO);

        head.auto_update = true;
        head.update(1.0 / 60.0, &mut tree, &fp, &mut proxy).unwrap();
        assert!((head.euler().y - FRAC_PI_2).abs() < EPS);
        assert!((proxy.get_preset_value(ExpressionPreset::LookLeft).unwrap() - 1.0).abs() < 1e-4);
    }
}
