//! 图元离散化
//!
//! 把参数化曲线按固定角分辨率转换为有序点列，用于画布预览
//! 和下发给传输层的轨迹点表。离散化是幂等的：同一输入
//! 任何时候重算都得到同一点列，调用方在重算前应清空旧点。
//!
//! 分辨率是显式参数，不是全局常量；调用方自行决定并传入。

use crate::geometry::{Arc, Circle, Geometry, Line, Polyline};
use crate::math::{normalize_deg, Point3, Vector3, EPSILON};
use crate::solver::{arc_from_bulge, BulgeSegment};

/// 默认角分辨率（度）
pub const DEFAULT_RESOLUTION_DEG: f64 = 5.0;

/// 离散化线段：两点，反向时交换
pub fn line_points(line: &Line, reversed: bool) -> Vec<Point3> {
    if reversed {
        vec![line.end, line.start]
    } else {
        vec![line.start, line.end]
    }
}

/// 离散化圆弧
///
/// 从起始角按分辨率步进到终止角，末尾必定追加精确的终点
/// （即使终止角不落在步进边界上）。反向时从终止角向起始角
/// 回走（扫掠符号取反），而不是简单倒序正向点列。
pub fn arc_points(arc: &Arc, resolution_deg: f64, reversed: bool) -> Vec<Point3> {
    let sweep = arc.sweep_angle();
    let step = resolution_deg.abs().max(1e-3);
    let steps = (sweep / step).floor() as usize;

    let (from, signed_step) = if reversed {
        (arc.end_angle, -step)
    } else {
        (arc.start_angle, step)
    };
    let exact_end = if reversed {
        arc.start_point()
    } else {
        arc.end_point()
    };

    let mut points = Vec::with_capacity(steps + 2);
    for i in 0..=steps {
        points.push(arc.point_at_angle(from + signed_step * i as f64));
    }
    let needs_end = points
        .last()
        .map(|last| (exact_end - last).norm() > 1e-6)
        .unwrap_or(true);
    if needs_end {
        points.push(exact_end);
    }
    points
}

/// 离散化整圆
///
/// 在圆所在平面内构造局部正交基后整周采样，末尾显式追加
/// 与首点重合的闭合点。反向时按顺时针方向采样。
pub fn circle_points(circle: &Circle, resolution_deg: f64, reversed: bool) -> Vec<Point3> {
    let (u, v) = plane_basis(&circle.normal);
    let step = resolution_deg.abs().max(1e-3);
    let steps = (360.0 / step).ceil() as usize;

    let mut points = Vec::with_capacity(steps + 1);
    for i in 0..steps {
        let angle = step * i as f64;
        if angle >= 360.0 {
            break;
        }
        let rad = if reversed { -angle } else { angle }.to_radians();
        points.push(
            circle.center + (u * rad.cos() + v * rad.sin()) * circle.radius,
        );
    }

    // 闭合点：首尾重合
    if let Some(first) = points.first().copied() {
        let needs_close = points
            .last()
            .map(|last| (first - last).norm() > EPSILON)
            .unwrap_or(true);
        if needs_close {
            points.push(first);
        }
    }
    points
}

/// 在法向量所在平面内构造局部正交基 (u, v)
///
/// 辅助轴选取沿用任意轴算法：法向量的X、Y分量都小于 1/64 时
/// 视为接近 ±Z，用世界Y叉乘；否则用世界Z叉乘。
fn plane_basis(normal: &Vector3) -> (Vector3, Vector3) {
    let n = if normal.norm_squared() < EPSILON {
        Vector3::z()
    } else {
        normal.normalize()
    };
    let helper = if n.x.abs() < 1.0 / 64.0 && n.y.abs() < 1.0 / 64.0 {
        Vector3::y()
    } else {
        Vector3::z()
    };
    let u = helper.cross(&n).normalize();
    let v = n.cross(&u);
    (u, v)
}

/// 离散化多段线：直线段取顶点，凸度段按圆弧步进
pub fn polyline_points(pl: &Polyline, resolution_deg: f64, reversed: bool) -> Vec<Point3> {
    let mut points: Vec<Point3> = Vec::new();
    for (v1, v2) in pl.segments() {
        let start = Point3::new(v1.point.x, v1.point.y, 0.0);
        let end = Point3::new(v2.point.x, v2.point.y, 0.0);
        if points.is_empty() {
            points.push(start);
        }
        match arc_from_bulge(v1.point, v2.point, v1.bulge) {
            BulgeSegment::Line => points.push(end),
            BulgeSegment::Arc(arc) => {
                let step = resolution_deg.abs().max(1e-3);
                let sweep = if arc.ccw {
                    normalize_deg(arc.end_angle - arc.start_angle)
                } else {
                    normalize_deg(arc.start_angle - arc.end_angle)
                };
                let steps = (sweep / step).floor() as usize;
                let signed_step = if arc.ccw { step } else { -step };
                for i in 1..=steps {
                    let rad = (arc.start_angle + signed_step * i as f64).to_radians();
                    points.push(Point3::new(
                        arc.center.x + arc.radius * rad.cos(),
                        arc.center.y + arc.radius * rad.sin(),
                        0.0,
                    ));
                }
                let needs_end = points
                    .last()
                    .map(|last| (end - last).norm() > 1e-6)
                    .unwrap_or(true);
                if needs_end {
                    points.push(end);
                }
            }
        }
    }
    if reversed {
        points.reverse();
    }
    points
}

/// 离散化任意图元，用于画布预览
///
/// 块引用没有自带曲线，退化为插入点单点。
pub fn geometry_points(geometry: &Geometry, resolution_deg: f64) -> Vec<Point3> {
    match geometry {
        Geometry::Line(l) => line_points(l, false),
        Geometry::Arc(a) => arc_points(a, resolution_deg, false),
        Geometry::Circle(c) => circle_points(c, resolution_deg, false),
        Geometry::Polyline(pl) => polyline_points(pl, resolution_deg, false),
        Geometry::Insert(ins) => vec![ins.location],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Point2;
    use approx::assert_relative_eq;

    #[test]
    fn test_line_reversed_roundtrip() {
        let line = Line::new(Point3::new(0.0, 0.0, 0.0), Point3::new(5.0, 0.0, 0.0));
        let forward = line_points(&line, false);
        let reversed = line_points(&line, true);
        assert_eq!(forward[0], reversed[1]);
        assert_eq!(forward[1], reversed[0]);
        // 再反一次回到原顺序
        assert_eq!(line_points(&line, false), forward);
    }

    #[test]
    fn test_arc_points_exact_end() {
        // 0°到47°、步长5°：47不是5的倍数，末点必须精确落在47°
        let arc = Arc::new(Point3::origin(), 10.0, 0.0, 47.0);
        let points = arc_points(&arc, 5.0, false);
        let last = points.last().unwrap();
        assert_relative_eq!((last - arc.end_point()).norm(), 0.0, epsilon = 1e-9);
        assert_relative_eq!((points[0] - arc.start_point()).norm(), 0.0, epsilon = 1e-9);
        assert!(points.len() >= 2);
    }

    #[test]
    fn test_arc_full_turn_closes() {
        let arc = Arc::new(Point3::origin(), 3.0, 0.0, 360.0);
        let points = arc_points(&arc, 5.0, false);
        assert!(points.len() > 2);
        let first = points.first().unwrap();
        let last = points.last().unwrap();
        assert_relative_eq!((first - last).norm(), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_arc_reversed_walks_backward() {
        let arc = Arc::new(Point3::origin(), 1.0, 0.0, 90.0);
        let points = arc_points(&arc, 15.0, true);
        assert_relative_eq!((points[0] - arc.end_point()).norm(), 0.0, epsilon = 1e-9);
        assert_relative_eq!(
            (points.last().unwrap() - arc.start_point()).norm(),
            0.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_circle_closes_even_divisor() {
        let circle = Circle::new(Point3::new(1.0, 2.0, 0.0), 3.0);
        let points = circle_points(&circle, 5.0, false);
        let first = points.first().unwrap();
        let last = points.last().unwrap();
        assert_relative_eq!((first - last).norm(), 0.0, epsilon = 1e-9);
        assert!(points.len() > 2);
    }

    #[test]
    fn test_circle_closes_uneven_divisor() {
        // 7° 不能整除 360°
        let circle = Circle::new(Point3::origin(), 1.0);
        let points = circle_points(&circle, 7.0, false);
        let first = points.first().unwrap();
        let last = points.last().unwrap();
        assert_relative_eq!((first - last).norm(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_circle_tilted_normal_stays_on_sphere() {
        let normal = Vector3::new(1.0, 1.0, 1.0).normalize();
        let circle = Circle::with_normal(Point3::origin(), 2.0, normal);
        for p in circle_points(&circle, 10.0, false) {
            assert_relative_eq!(p.coords.norm(), 2.0, epsilon = 1e-9);
            // 点必须落在圆平面内
            assert_relative_eq!(p.coords.dot(&normal), 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_polyline_bulge_segment_walk() {
        // 直线段 + 半圆段
        let pl = Polyline::new(
            vec![
                crate::geometry::PolylineVertex::new(Point2::new(-1.0, 0.0)),
                crate::geometry::PolylineVertex::with_bulge(Point2::new(0.0, 0.0), 1.0),
                crate::geometry::PolylineVertex::new(Point2::new(1.0, 0.0)),
            ],
            false,
        );
        let points = polyline_points(&pl, 10.0, false);
        assert_relative_eq!(points[0].x, -1.0, epsilon = 1e-9);
        let last = points.last().unwrap();
        assert_relative_eq!(last.x, 1.0, epsilon = 1e-9);
        // 正凸度为逆时针：半圆从弦下方绕行，应出现 y < -0.4 的点
        assert!(points.iter().any(|p| p.y < -0.4));
    }
}
