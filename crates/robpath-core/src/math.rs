//! 数学基础类型
//!
//! 基于 nalgebra 的类型别名、公差常量、角度工具和2D包围盒。
//! 图形坐标为绘图单位（通常毫米），角度一律以度为单位存储，
//! 与DXF的约定保持一致。

use serde::{Deserialize, Serialize};

pub type Point2 = nalgebra::Point2<f64>;
pub type Point3 = nalgebra::Point3<f64>;
pub type Vector2 = nalgebra::Vector2<f64>;
pub type Vector3 = nalgebra::Vector3<f64>;

/// 通用几何公差
pub const EPSILON: f64 = 1e-9;

/// 几何等价匹配的默认公差（绘图长度单位）
pub const MATCH_TOLERANCE: f64 = 0.001;

/// 将角度归一化到 [0, 360)
pub fn normalize_deg(angle: f64) -> f64 {
    (angle % 360.0 + 360.0) % 360.0
}

/// 环绕感知的角度比较（359.999° ≈ 0.001°）
pub fn angles_equal_deg(a: f64, b: f64, tolerance: f64) -> bool {
    let diff = (normalize_deg(a) - normalize_deg(b)).abs();
    diff < tolerance || (360.0 - diff) < tolerance
}

/// 检查角度是否落在从 start 逆时针扫到 end 的范围内（均为度）
///
/// 两端角相等视为整周扫掠，任何角度都在范围内。
pub fn angle_in_ccw_sweep(angle: f64, start: f64, end: f64) -> bool {
    let sweep = normalize_deg(end - start);
    if sweep < EPSILON {
        return true;
    }
    let relative = normalize_deg(angle - start);
    relative <= sweep + EPSILON
}

/// 2D轴对齐包围盒
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox2 {
    pub min: Point2,
    pub max: Point2,
}

impl BoundingBox2 {
    pub fn new(min: Point2, max: Point2) -> Self {
        Self { min, max }
    }

    /// 空包围盒（min > max，任何并集操作都会覆盖它）
    pub fn empty() -> Self {
        Self {
            min: Point2::new(f64::INFINITY, f64::INFINITY),
            max: Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    pub fn from_points(points: impl IntoIterator<Item = Point2>) -> Self {
        let mut bbox = Self::empty();
        for p in points {
            bbox.expand_to_include(&p);
        }
        bbox
    }

    pub fn expand_to_include(&mut self, point: &Point2) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
    }

    /// 两个包围盒的并集
    pub fn union(&self, other: &Self) -> Self {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Self {
            min: Point2::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Point2::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Point2 {
        Point2::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    pub fn contains(&self, point: &Point2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_deg() {
        assert!((normalize_deg(-90.0) - 270.0).abs() < EPSILON);
        assert!((normalize_deg(720.5) - 0.5).abs() < EPSILON);
        assert!(normalize_deg(360.0).abs() < EPSILON);
    }

    #[test]
    fn test_angles_equal_wraparound() {
        assert!(angles_equal_deg(359.999, 0.001, 0.01));
        assert!(angles_equal_deg(0.0, 360.0, 0.001));
        assert!(!angles_equal_deg(10.0, 20.0, 0.001));
    }

    #[test]
    fn test_angle_in_ccw_sweep() {
        // 跨越 0° 的扫掠：350° -> 20°
        assert!(angle_in_ccw_sweep(0.0, 350.0, 20.0));
        assert!(angle_in_ccw_sweep(10.0, 350.0, 20.0));
        assert!(!angle_in_ccw_sweep(180.0, 350.0, 20.0));
        // 两端角相等：整周扫掠
        assert!(angle_in_ccw_sweep(123.0, 10.0, 10.0));
        assert!(angle_in_ccw_sweep(270.0, 0.0, 360.0));
    }

    #[test]
    fn test_bbox_union() {
        let a = BoundingBox2::from_points([Point2::new(0.0, 0.0), Point2::new(1.0, 1.0)]);
        let b = BoundingBox2::from_points([Point2::new(-1.0, 2.0)]);
        let u = a.union(&b);
        assert_eq!(u.min, Point2::new(-1.0, 0.0));
        assert_eq!(u.max, Point2::new(1.0, 2.0));
    }

    #[test]
    fn test_empty_bbox_union_identity() {
        let a = BoundingBox2::from_points([Point2::new(3.0, 4.0)]);
        assert_eq!(BoundingBox2::empty().union(&a), a);
        assert!(BoundingBox2::empty().is_empty());
    }
}
