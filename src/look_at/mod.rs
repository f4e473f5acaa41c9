//! 视线系统
//!
//! - LookAtHead: 目标位置 -> 第一人称骨骼空间中的 (俯仰, 偏航)
//! - LookAtApplyer: 角度经 CurveMapper 映射后驱动眼骨骼或视线表情
//! - CurveMapper: Hermite 样条响应曲线

mod applyer;
mod curve_mapper;
mod head;
mod importer;

pub use applyer::{eye_rotation, LookAtApplyer, LookAtType};
pub use curve_mapper::{Curve, CurveMapper, DegreeMap, HermiteCurve, DEFAULT_CURVE};
pub use head::{LookAtHead, VECTOR3_FRONT};
pub use importer::{import_look_at, LookAtDesc};
