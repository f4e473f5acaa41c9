//! 视线响应曲线 - Hermite 样条
//!
//! 曲线控制点是扁平数组，每 4 个数一组：(x, y, inTangent, outTangent)

use crate::{Result, VrmError};

/// 曲线 trait
pub trait Curve {
    fn value(&self, v: f32) -> f32;
}

/// 默认曲线：(0,0) 到 (1,1) 的直线
pub const DEFAULT_CURVE: [f32; 8] = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 0.0];

/// 三次 Hermite 样条曲线
///
/// 构建时校验控制点数组，之后求值不会失败。
#[derive(Debug, Clone, PartialEq)]
pub struct HermiteCurve {
    points: Vec<f32>,
}

impl HermiteCurve {
    /// 创建曲线
    ///
    /// 数组长度至少为 8（两个控制点）且为 4 的倍数，否则返回 `InvalidCurve`。
    pub fn new(points: Vec<f32>) -> Result<Self> {
        if points.len() < 8 {
            return Err(VrmError::InvalidCurve(format!(
                "array length must be 8 at least, got {}",
                points.len()
            )));
        }
        if points.len() % 4 != 0 {
            return Err(VrmError::InvalidCurve(format!(
                "array length must be a multiple of 4, got {}",
                points.len()
            )));
        }
        Ok(Self { points })
    }

    /// 控制点数组
    pub fn points(&self) -> &[f32] {
        &self.points
    }

    #[inline]
    fn node_count(&self) -> usize {
        self.points.len() / 4
    }

    #[inline]
    fn x(&self, node: usize) -> f32 {
        self.points[4 * node]
    }

    #[inline]
    fn y(&self, node: usize) -> f32 {
        self.points[4 * node + 1]
    }

    #[inline]
    fn in_tangent(&self, node: usize) -> f32 {
        self.points[4 * node + 2]
    }

    #[inline]
    fn out_tangent(&self, node: usize) -> f32 {
        self.points[4 * node + 3]
    }
}

impl Default for HermiteCurve {
    fn default() -> Self {
        Self { points: DEFAULT_CURVE.to_vec() }
    }
}

/// Hermite 基函数插值
#[inline]
fn hermite(y0: f32, y1: f32, t0: f32, t1: f32, t: f32) -> f32 {
    let t2 = t * t;
    let t3 = t2 * t;
    let h01 = -2.0 * t3 + 3.0 * t2;
    let h10 = t3 - 2.0 * t2 + t;
    let h11 = t3 - t2;
    y0 + (y1 - y0) * h01 + t0 * h10 + t1 * h11
}

impl Curve for HermiteCurve {
    /// 找到第一个 x >= v 的控制点，与其前一个控制点之间插值
    fn value(&self, v: f32) -> f32 {
        let count = self.node_count();
        let Some(out_node) = (0..count).find(|&i| v <= self.x(i)) else {
            // 超出最后一个控制点
            return self.y(count - 1);
        };

        // 位于第一个控制点之前（或恰好在其上）：取第一个控制点
        if out_node == 0 {
            return self.y(0);
        }

        let in_node = out_node - 1;
        let x0 = self.x(in_node);
        let x1 = self.x(out_node);
        if x1 == x0 {
            return self.y(out_node);
        }

        let t = (v - x0) / (x1 - x0);
        hermite(
            self.y(in_node),
            self.y(out_node),
            self.out_tangent(in_node),
            self.in_tangent(out_node),
            t,
        )
    }
}

/// 角度映射描述（VRM firstPerson.lookAt* 的一项）
///
/// 缺省的字段使用 CurveMapper 的默认值。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DegreeMap {
    /// 输入范围（度）
    pub x_range: Option<f32>,
    /// 输出范围（骨骼为度，表情为权重）
    pub y_range: Option<f32>,
    pub curve: Option<Vec<f32>>,
}

/// 把输入角度经曲线映射为输出
#[derive(Debug, Clone, PartialEq)]
pub struct CurveMapper {
    /// 输入上限，超过的输入被截断
    pub curve_x_range_degree: f32,
    /// 输出缩放
    pub curve_y_range_degree: f32,
    pub curve: HermiteCurve,
}

impl Default for CurveMapper {
    fn default() -> Self {
        Self {
            curve_x_range_degree: 90.0,
            curve_y_range_degree: 10.0,
            curve: HermiteCurve::default(),
        }
    }
}

impl CurveMapper {
    pub fn new(x_range: f32, y_range: f32, curve: HermiteCurve) -> Self {
        Self {
            curve_x_range_degree: x_range,
            curve_y_range_degree: y_range,
            curve,
        }
    }

    /// 骨骼视线：输入和输出都从度转换为弧度
    pub fn for_bone(map: &DegreeMap) -> Result<Self> {
        let defaults = Self::default();
        let x_range = map.x_range.unwrap_or(defaults.curve_x_range_degree);
        let y_range = map.y_range.unwrap_or(defaults.curve_y_range_degree);
        Ok(Self::new(x_range.to_radians(), y_range.to_radians(), Self::curve_of(map)?))
    }

    /// 表情视线：输入从度转换为弧度，输出是表情权重
    pub fn for_expression(map: &DegreeMap) -> Result<Self> {
        let defaults = Self::default();
        let x_range = map.x_range.unwrap_or(defaults.curve_x_range_degree);
        let y_range = map.y_range.unwrap_or(defaults.curve_y_range_degree);
        Ok(Self::new(x_range.to_radians(), y_range, Self::curve_of(map)?))
    }

    fn curve_of(map: &DegreeMap) -> Result<HermiteCurve> {
        match &map.curve {
            Some(points) => HermiteCurve::new(points.clone()),
            None => Ok(HermiteCurve::default()),
        }
    }

    /// 映射输入值
    ///
    /// 输入范围不是正数（包括 NaN）时按输入 0 取值。
    pub fn map(&self, src: f32) -> f32 {
        if self.curve_x_range_degree.is_nan() || self.curve_x_range_degree <= 0.0 {
            return self.curve_y_range_degree * self.curve.value(0.0);
        }
        let clamped = src.clamp(0.0, self.curve_x_range_degree);
        let x = clamped / self.curve_x_range_degree;
        self.curve_y_range_degree * self.curve.value(x)
    }
}
