//! 几何图元定义
//!
//! 轨迹系统支持的CAD图元：
//! - 线段 (Line)
//! - 圆 (Circle)
//! - 圆弧 (Arc)
//! - 多段线 (Polyline)
//! - 块引用 (Insert)
//!
//! 线段、圆、圆弧以3D坐标存储（Z通常为0，由喷涂高度另行设定），
//! 多段线沿DXF约定保持2D顶点加凸度。角度一律以度存储。

use crate::math::{angle_in_ccw_sweep, BoundingBox2, Point2, Point3, Vector3, EPSILON};
use crate::solver::{arc_from_bulge, BulgeSegment};
use serde::{Deserialize, Serialize};

/// 几何类型枚举
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Geometry {
    Line(Line),
    Circle(Circle),
    Arc(Arc),
    Polyline(Polyline),
    Insert(Insert),
}

impl Geometry {
    /// 获取几何的XY包围盒
    ///
    /// 块引用需要块表才能求包围盒，此处退化为插入点；
    /// 完整的块展开包围盒由 `Document::entity_bounding_box` 提供。
    pub fn bounding_box(&self) -> BoundingBox2 {
        match self {
            Geometry::Line(l) => l.bounding_box(),
            Geometry::Circle(c) => c.bounding_box(),
            Geometry::Arc(a) => a.bounding_box(),
            Geometry::Polyline(pl) => pl.bounding_box(),
            Geometry::Insert(ins) => {
                let p = Point2::new(ins.location.x, ins.location.y);
                BoundingBox2::new(p, p)
            }
        }
    }

    /// 获取几何的类型名称
    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Line(_) => "Line",
            Geometry::Circle(_) => "Circle",
            Geometry::Arc(_) => "Arc",
            Geometry::Polyline(_) => "Polyline",
            Geometry::Insert(_) => "Insert",
        }
    }
}

/// 线段
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Line {
    pub start: Point3,
    pub end: Point3,
}

impl Line {
    pub fn new(start: Point3, end: Point3) -> Self {
        Self { start, end }
    }

    /// 计算线段长度
    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }

    /// 计算线段中点
    pub fn midpoint(&self) -> Point3 {
        Point3::new(
            (self.start.x + self.end.x) / 2.0,
            (self.start.y + self.end.y) / 2.0,
            (self.start.z + self.end.z) / 2.0,
        )
    }

    pub fn bounding_box(&self) -> BoundingBox2 {
        BoundingBox2::from_points([
            Point2::new(self.start.x, self.start.y),
            Point2::new(self.end.x, self.end.y),
        ])
    }
}

/// 圆
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Circle {
    pub center: Point3,
    pub radius: f64,
    /// 单位法向量，默认 +Z
    pub normal: Vector3,
}

impl Circle {
    pub fn new(center: Point3, radius: f64) -> Self {
        Self {
            center,
            radius,
            normal: Vector3::z(),
        }
    }

    pub fn with_normal(center: Point3, radius: f64, normal: Vector3) -> Self {
        Self {
            center,
            radius,
            normal,
        }
    }

    /// 计算周长
    pub fn circumference(&self) -> f64 {
        2.0 * std::f64::consts::PI * self.radius
    }

    pub fn bounding_box(&self) -> BoundingBox2 {
        BoundingBox2::new(
            Point2::new(self.center.x - self.radius, self.center.y - self.radius),
            Point2::new(self.center.x + self.radius, self.center.y + self.radius),
        )
    }
}

/// 圆弧
///
/// 角度以度存储，`start_angle` 到 `end_angle` 始终描述逆时针遍历。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arc {
    pub center: Point3,
    pub radius: f64,
    /// 起始角度（度）
    pub start_angle: f64,
    /// 终止角度（度）
    pub end_angle: f64,
    /// 单位法向量，默认 +Z
    pub normal: Vector3,
}

impl Arc {
    pub fn new(center: Point3, radius: f64, start_angle: f64, end_angle: f64) -> Self {
        Self {
            center,
            radius,
            start_angle,
            end_angle,
            normal: Vector3::z(),
        }
    }

    /// 计算扫过的角度（度，(0, 360]）
    ///
    /// 两端角相等（DXF里 0°→360° 写法的整圆弧）按整周处理，
    /// 不存在扫掠为零的圆弧。
    pub fn sweep_angle(&self) -> f64 {
        let sweep = crate::math::normalize_deg(self.end_angle - self.start_angle);
        if sweep < EPSILON {
            360.0
        } else {
            sweep
        }
    }

    /// 计算弧长
    pub fn length(&self) -> f64 {
        self.sweep_angle().to_radians() * self.radius
    }

    /// 获取圆弧上指定角度（度）的点
    pub fn point_at_angle(&self, angle_deg: f64) -> Point3 {
        let rad = angle_deg.to_radians();
        Point3::new(
            self.center.x + self.radius * rad.cos(),
            self.center.y + self.radius * rad.sin(),
            self.center.z,
        )
    }

    /// 获取起点
    pub fn start_point(&self) -> Point3 {
        self.point_at_angle(self.start_angle)
    }

    /// 获取终点
    pub fn end_point(&self) -> Point3 {
        self.point_at_angle(self.end_angle)
    }

    pub fn bounding_box(&self) -> BoundingBox2 {
        let s = self.start_point();
        let e = self.end_point();
        let mut bbox =
            BoundingBox2::from_points([Point2::new(s.x, s.y), Point2::new(e.x, e.y)]);

        // 象限点（0°/90°/180°/270°）落在扫掠范围内时才参与
        for angle in [0.0, 90.0, 180.0, 270.0] {
            if angle_in_ccw_sweep(angle, self.start_angle, self.end_angle) {
                let p = self.point_at_angle(angle);
                bbox.expand_to_include(&Point2::new(p.x, p.y));
            }
        }

        bbox
    }
}

/// 多段线顶点
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolylineVertex {
    pub point: Point2,
    /// 凸度（bulge）- 用于弧线段，0表示直线
    pub bulge: f64,
}

impl PolylineVertex {
    pub fn new(point: Point2) -> Self {
        Self { point, bulge: 0.0 }
    }

    pub fn with_bulge(point: Point2, bulge: f64) -> Self {
        Self { point, bulge }
    }
}

/// 多段线
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Polyline {
    pub vertices: Vec<PolylineVertex>,
    /// 是否闭合
    pub closed: bool,
}

impl Polyline {
    pub fn new(vertices: Vec<PolylineVertex>, closed: bool) -> Self {
        Self { vertices, closed }
    }

    /// 从点列表创建（所有顶点都是直线连接）
    pub fn from_points(points: impl IntoIterator<Item = Point2>, closed: bool) -> Self {
        Self {
            vertices: points.into_iter().map(PolylineVertex::new).collect(),
            closed,
        }
    }

    /// 顶点数量
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// 线段数量
    pub fn segment_count(&self) -> usize {
        if self.vertices.len() < 2 {
            return 0;
        }
        if self.closed {
            self.vertices.len()
        } else {
            self.vertices.len() - 1
        }
    }

    /// 遍历各段的顶点对（含闭合段）
    pub fn segments(&self) -> impl Iterator<Item = (&PolylineVertex, &PolylineVertex)> {
        (0..self.segment_count()).map(move |i| {
            (
                &self.vertices[i],
                &self.vertices[(i + 1) % self.vertices.len()],
            )
        })
    }

    /// 计算总长度
    pub fn length(&self) -> f64 {
        let mut total = 0.0;
        for (v1, v2) in self.segments() {
            if v1.bulge.abs() < EPSILON {
                total += (v2.point - v1.point).norm();
            } else {
                total += Self::arc_segment_length(v1, v2);
            }
        }
        total
    }

    /// 计算弧线段长度
    fn arc_segment_length(v1: &PolylineVertex, v2: &PolylineVertex) -> f64 {
        let chord = (v2.point - v1.point).norm();
        let s = chord / 2.0;
        let bulge = v1.bulge.abs();
        let radius = s * (1.0 + bulge * bulge) / (2.0 * bulge);
        let angle = 4.0 * bulge.atan();
        radius * angle.abs()
    }

    pub fn bounding_box(&self) -> BoundingBox2 {
        if self.vertices.is_empty() {
            return BoundingBox2::empty();
        }
        let mut bbox = BoundingBox2::from_points(self.vertices.iter().map(|v| v.point));

        // 带凸度的段要把弧的极值点并入包围盒
        for (v1, v2) in self.segments() {
            if v1.bulge.abs() < EPSILON {
                continue;
            }
            if let BulgeSegment::Arc(arc) = arc_from_bulge(v1.point, v2.point, v1.bulge)
            {
                // 按逆时针记账：顺时针弧交换两端角
                let (start, end) = if arc.ccw {
                    (arc.start_angle, arc.end_angle)
                } else {
                    (arc.end_angle, arc.start_angle)
                };
                for angle in [0.0, 90.0, 180.0, 270.0] {
                    if angle_in_ccw_sweep(angle, start, end) {
                        let rad = angle.to_radians();
                        bbox.expand_to_include(&Point2::new(
                            arc.center.x + arc.radius * rad.cos(),
                            arc.center.y + arc.radius * rad.sin(),
                        ));
                    }
                }
            }
        }

        bbox
    }
}

/// 块引用
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insert {
    /// 块名
    pub name: String,
    /// 插入点
    pub location: Point3,
    pub x_scale: f64,
    pub y_scale: f64,
    /// 旋转角度（度）
    pub rotation: f64,
}

impl Insert {
    pub fn new(name: impl Into<String>, location: Point3) -> Self {
        Self {
            name: name.into(),
            location,
            x_scale: 1.0,
            y_scale: 1.0,
            rotation: 0.0,
        }
    }
}
