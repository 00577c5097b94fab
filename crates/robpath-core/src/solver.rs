//! 三点求解与凸度换算
//!
//! 纯函数几何求解器：
//! - 三点定圆（3D向量外心公式）
//! - 三点定弧（XY投影外心 + 扫掠方向判定）
//! - 多段线凸度(bulge)转圆弧参数
//!
//! 退化输入（共线、重合、半径异常）以 `None` / `BulgeSegment::Line`
//! 表示，调用方必须提供降级路径，求解器本身绝不中断流程。

use crate::math::{normalize_deg, Point2, Point3, Vector3, EPSILON};

/// 三点定圆的结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleParams {
    pub center: Point3,
    pub radius: f64,
    /// 单位法向量，方向由 (p2-p1)×(p3-p1) 决定
    pub normal: Vector3,
}

/// 三点定弧的结果
///
/// `start_angle`/`end_angle` 以度存储，始终描述逆时针遍历；
/// 原始 p1->p2->p3 若为顺时针，角度已交换并置位 `clockwise`。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcParams {
    pub center: Point3,
    pub radius: f64,
    pub start_angle: f64,
    pub end_angle: f64,
    pub normal: Vector3,
    pub clockwise: bool,
}

/// 由三个不共线的3D点计算圆心、半径和法向量
///
/// 外心采用向量形式（Lengyel公式），不做平面投影，
/// 因此三点不必落在XY平面上。
pub fn circle_from_three_points(
    p1: Point3,
    p2: Point3,
    p3: Point3,
    tolerance: f64,
) -> Option<CircleParams> {
    let ab = p2 - p1;
    let ac = p3 - p1;

    let cross = ab.cross(&ac);
    let cross_len_sq = cross.norm_squared();
    if cross_len_sq < tolerance * tolerance {
        tracing::warn!(?p1, ?p2, ?p3, "three points are collinear or coincident");
        return None;
    }
    let normal = cross / cross_len_sq.sqrt();

    // 外心 = p1 + ((ac·|ab|² - ab·|ac|²) × (ab × ac)) / (2·|ab × ac|²)
    let ab_len_sq = ab.norm_squared();
    let ac_len_sq = ac.norm_squared();
    let numerator = (ac * ab_len_sq - ab * ac_len_sq).cross(&cross);
    let center = p1 + numerator / (2.0 * cross_len_sq);

    let radius = (p1 - center).norm();
    if radius < tolerance {
        tracing::warn!(radius, "computed radius is degenerate");
        return None;
    }

    // 等距校验：相对公差 0.1%，超差只告警不报错
    let rel_tol = radius * 0.001;
    let d2 = (p2 - center).norm();
    let d3 = (p3 - center).norm();
    if (d2 - radius).abs() > rel_tol || (d3 - radius).abs() > rel_tol {
        tracing::warn!(
            radius,
            d2,
            d3,
            "points not equidistant from computed center, proceeding anyway"
        );
    }

    Some(CircleParams {
        center,
        radius,
        normal,
    })
}

/// 由 (起点, 弧上中点, 终点) 计算圆弧参数
///
/// 角度记账在XY投影上进行（2D外心公式），圆心Z取自 p1。
/// 法向量指向负半球时保持原样——方向信息由 `clockwise`
/// 标志及上层轨迹的 reversed 属性承载。
pub fn arc_from_three_points(
    p1: Point3,
    p2: Point3,
    p3: Point3,
    tolerance: f64,
) -> Option<ArcParams> {
    // 先用3D叉积做共线检测并取法向量
    let cross = (p2 - p1).cross(&(p3 - p1));
    if cross.norm_squared() < tolerance * tolerance {
        tracing::warn!(?p1, ?p2, ?p3, "arc points are collinear or coincident");
        return None;
    }
    let normal = cross.normalize();

    // 2D外心（XY投影）
    let d = 2.0
        * (p1.x * (p2.y - p3.y) + p2.x * (p3.y - p1.y) + p3.x * (p1.y - p2.y));
    if d.abs() < tolerance {
        tracing::warn!("arc points are collinear in XY projection");
        return None;
    }

    let sq1 = p1.x * p1.x + p1.y * p1.y;
    let sq2 = p2.x * p2.x + p2.y * p2.y;
    let sq3 = p3.x * p3.x + p3.y * p3.y;
    let cx = (sq1 * (p2.y - p3.y) + sq2 * (p3.y - p1.y) + sq3 * (p1.y - p2.y)) / d;
    let cy = (sq1 * (p3.x - p2.x) + sq2 * (p1.x - p3.x) + sq3 * (p2.x - p1.x)) / d;
    let center = Point3::new(cx, cy, p1.z);

    let radius = ((p1.x - cx).powi(2) + (p1.y - cy).powi(2)).sqrt();
    if radius < tolerance {
        return None;
    }

    let mut start_angle = normalize_deg((p1.y - cy).atan2(p1.x - cx).to_degrees());
    let mid_angle = normalize_deg((p2.y - cy).atan2(p2.x - cx).to_degrees());
    let mut end_angle = normalize_deg((p3.y - cy).atan2(p3.x - cx).to_degrees());

    // 扫掠方向：中点落在 start->end 的逆时针跨度内则为逆时针，
    // 否则为顺时针并交换两端角，保证存储的角度对始终描述逆时针遍历
    let sweep_ccw = normalize_deg(end_angle - start_angle);
    let mid_relative = normalize_deg(mid_angle - start_angle);
    let clockwise = mid_relative >= sweep_ccw;
    if clockwise {
        std::mem::swap(&mut start_angle, &mut end_angle);
    }

    Some(ArcParams {
        center,
        radius,
        start_angle,
        end_angle,
        normal,
        clockwise,
    })
}

/// 凸度换算的结果：圆弧段，或退化为直线段
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BulgeSegment {
    /// 凸度为零或几何上无法构成圆弧，按直线段处理
    Line,
    Arc(BulgeArc),
}

/// 凸度定义的圆弧段参数（2D，角度为度）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BulgeArc {
    pub center: Point2,
    pub radius: f64,
    pub start_angle: f64,
    pub end_angle: f64,
    /// bulge > 0 时为逆时针
    pub ccw: bool,
    /// 包含角超过180°
    pub large_arc: bool,
}

/// 将多段线顶点对和凸度换算为圆弧段
///
/// 凸度约定：`bulge = tan(包含角 / 4)`，正值为逆时针。
/// 弦长趋零、sin(θ/2) 趋零或半径非有限/过大（> 1e9）时
/// 一律返回 `BulgeSegment::Line`，由调用方连直线。
pub fn arc_from_bulge(p1: Point2, p2: Point2, bulge: f64) -> BulgeSegment {
    if bulge.abs() < EPSILON {
        return BulgeSegment::Line;
    }

    let chord_vec = p2 - p1;
    let chord = chord_vec.norm();
    if chord < EPSILON {
        tracing::warn!(bulge, "bulge segment with near-zero chord");
        return BulgeSegment::Line;
    }

    // 包含角 θ = 4·atan(b)，半径 R = |C / (2·sin(θ/2))|
    let theta = 4.0 * bulge.atan();
    let sin_half = (theta / 2.0).sin();
    if sin_half.abs() < EPSILON {
        tracing::warn!(bulge, chord, "inconsistent bulge: sin(theta/2) near zero");
        return BulgeSegment::Line;
    }
    let radius = (chord / (2.0 * sin_half)).abs();
    if !radius.is_finite() || radius > 1e9 {
        tracing::warn!(radius, "bulge arc radius is extreme, falling back to line");
        return BulgeSegment::Line;
    }

    // 圆心在弦中垂线上：偏移量 = (1-b²)/(2b)·(C/2)，
    // 法向取弦的左法向，符号由凸度自带
    let mid = Point2::new((p1.x + p2.x) / 2.0, (p1.y + p2.y) / 2.0);
    let offset = (1.0 - bulge * bulge) / (2.0 * bulge) * (chord / 2.0);
    let nx = -chord_vec.y / chord;
    let ny = chord_vec.x / chord;
    let center = Point2::new(mid.x + offset * nx, mid.y + offset * ny);

    let start_angle = normalize_deg((p1.y - center.y).atan2(p1.x - center.x).to_degrees());
    let end_angle = normalize_deg((p2.y - center.y).atan2(p2.x - center.x).to_degrees());

    BulgeSegment::Arc(BulgeArc {
        center,
        radius,
        start_angle,
        end_angle,
        ccw: bulge > 0.0,
        large_arc: theta.abs() > std::f64::consts::PI,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_circle_from_three_points_equidistant() {
        let p1 = Point3::new(1.0, 0.0, 0.0);
        let p2 = Point3::new(0.0, 1.0, 0.0);
        let p3 = Point3::new(-1.0, 0.0, 0.0);
        let params = circle_from_three_points(p1, p2, p3, 1e-9).unwrap();

        assert_relative_eq!(params.radius, 1.0, epsilon = 1e-9);
        assert_relative_eq!(params.center.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(params.center.y, 0.0, epsilon = 1e-9);
        for p in [p1, p2, p3] {
            assert_relative_eq!((p - params.center).norm(), params.radius, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_circle_tilted_plane() {
        // 倾斜平面上的圆：三点不共面于XY
        let p1 = Point3::new(1.0, 0.0, 1.0);
        let p2 = Point3::new(0.0, 1.0, 2.0);
        let p3 = Point3::new(-1.0, 0.0, 3.0);
        let params = circle_from_three_points(p1, p2, p3, 1e-9).unwrap();
        for p in [p1, p2, p3] {
            assert_relative_eq!((p - params.center).norm(), params.radius, epsilon = 1e-9);
        }
        assert_relative_eq!(params.normal.norm(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_circle_collinear_is_degenerate() {
        let p1 = Point3::new(0.0, 0.0, 0.0);
        let p2 = Point3::new(1.0, 1.0, 1.0);
        let p3 = Point3::new(2.0, 2.0, 2.0);
        assert!(circle_from_three_points(p1, p2, p3, 1e-9).is_none());
    }

    #[test]
    fn test_arc_from_known_circle_samples() {
        // 半径2、圆心(3,1)，采样 10°/55°/100°
        let center = Point2::new(3.0, 1.0);
        let r = 2.0;
        let at = |deg: f64| {
            Point3::new(
                center.x + r * deg.to_radians().cos(),
                center.y + r * deg.to_radians().sin(),
                0.0,
            )
        };
        let params = arc_from_three_points(at(10.0), at(55.0), at(100.0), 1e-6).unwrap();

        assert_relative_eq!(params.radius, r, epsilon = 1e-3);
        assert_relative_eq!(params.center.x, center.x, epsilon = 1e-3);
        assert_relative_eq!(params.center.y, center.y, epsilon = 1e-3);
        assert!(!params.clockwise);
        assert_relative_eq!(params.start_angle, 10.0, epsilon = 1e-3);
        assert_relative_eq!(params.end_angle, 100.0, epsilon = 1e-3);
    }

    #[test]
    fn test_arc_clockwise_swaps_angles() {
        // 同样的采样逆序给入：p1=100°, p2=55°, p3=10° 是顺时针遍历
        let at = |deg: f64| {
            Point3::new(deg.to_radians().cos(), deg.to_radians().sin(), 0.0)
        };
        let params = arc_from_three_points(at(100.0), at(55.0), at(10.0), 1e-6).unwrap();
        assert!(params.clockwise);
        // 存储的角度对仍描述逆时针遍历
        assert_relative_eq!(params.start_angle, 10.0, epsilon = 1e-3);
        assert_relative_eq!(params.end_angle, 100.0, epsilon = 1e-3);
    }

    #[test]
    fn test_arc_wraps_through_zero() {
        // 350° -> 5° -> 20° 的逆时针弧
        let at = |deg: f64| {
            Point3::new(deg.to_radians().cos(), deg.to_radians().sin(), 0.0)
        };
        let params = arc_from_three_points(at(350.0), at(5.0), at(20.0), 1e-6).unwrap();
        assert!(!params.clockwise);
        assert_relative_eq!(params.start_angle, 350.0, epsilon = 1e-3);
        assert_relative_eq!(params.end_angle, 20.0, epsilon = 1e-3);
    }

    #[test]
    fn test_bulge_semicircle() {
        // bulge=1 为半圆：(0,0)->(1,0)，半径0.5，圆心(0.5,0)
        let seg = arc_from_bulge(Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), 1.0);
        match seg {
            BulgeSegment::Arc(arc) => {
                assert_relative_eq!(arc.radius, 0.5, epsilon = 1e-9);
                assert_relative_eq!(arc.center.x, 0.5, epsilon = 1e-9);
                assert_relative_eq!(arc.center.y, 0.0, epsilon = 1e-9);
                assert!(arc.ccw);
                assert!(arc.large_arc);
            }
            BulgeSegment::Line => panic!("semicircle must not degenerate"),
        }
    }

    #[test]
    fn test_bulge_zero_is_line() {
        let seg = arc_from_bulge(Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), 0.0);
        assert_eq!(seg, BulgeSegment::Line);
    }

    #[test]
    fn test_bulge_zero_chord_is_line() {
        let p = Point2::new(2.0, 3.0);
        assert_eq!(arc_from_bulge(p, p, 0.7), BulgeSegment::Line);
    }

    #[test]
    fn test_bulge_negative_is_clockwise_small_arc() {
        let seg = arc_from_bulge(
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            -(std::f64::consts::PI / 8.0).tan(),
        );
        match seg {
            BulgeSegment::Arc(arc) => {
                assert!(!arc.ccw);
                assert!(!arc.large_arc);
            }
            BulgeSegment::Line => panic!("quarter arc must not degenerate"),
        }
    }
}
