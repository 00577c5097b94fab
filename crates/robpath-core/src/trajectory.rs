//! 示教轨迹模型
//!
//! 选中图元后派生出 [`TrajectoryPrimitive`]：几何一律以三个带姿态角
//! 的标注点存储（线段为两点），不存 中心+半径+角度，因为三点形式
//! 经反向和持久化往返后无需重推符号约定。圆额外保留原始
//! 中心/半径/法向量，三个任意采样点重建存在数值误差，原始参数
//! 才是精确还原的依据。
//!
//! 离散点列永不持久化，反序列化或任何几何变更后必须重新生成。

use crate::discretize;
use crate::document::{Primitive, PrimitiveId};
use crate::geometry::{Arc, Circle, Geometry, Line};
use crate::math::{Point3, Vector3, MATCH_TOLERANCE};
use crate::solver;
use serde::{Deserialize, Serialize};

/// 带姿态角的轨迹标注点
///
/// Rx/Ry/Rz 为该点处喷头的姿态角（度）。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub position: Point3,
    pub rx: f64,
    pub ry: f64,
    pub rz: f64,
}

impl TrajectoryPoint {
    pub fn new(position: Point3) -> Self {
        Self {
            position,
            rx: 0.0,
            ry: 0.0,
            rz: 0.0,
        }
    }
}

/// 轨迹几何：按图元类型标注的三点（线段两点）表示
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TrajectoryGeometry {
    /// 线段：起点/终点两点表示，姿态角通常为零
    Line {
        start: TrajectoryPoint,
        end: TrajectoryPoint,
    },
    /// 圆弧：起点、弧上中点（原扫掠的角度中点）、终点
    Arc {
        point1: TrajectoryPoint,
        point2: TrajectoryPoint,
        point3: TrajectoryPoint,
    },
    /// 圆：局部基内 0°/120°/240° 三点，另存原始参数做精确重建
    Circle {
        point1: TrajectoryPoint,
        point2: TrajectoryPoint,
        point3: TrajectoryPoint,
        center: Point3,
        radius: f64,
        normal: Vector3,
    },
}

impl TrajectoryGeometry {
    pub fn type_name(&self) -> &'static str {
        match self {
            TrajectoryGeometry::Line { .. } => "Line",
            TrajectoryGeometry::Arc { .. } => "Arc",
            TrajectoryGeometry::Circle { .. } => "Circle",
        }
    }
}

/// 示教轨迹图元
///
/// `points` 是按需重算的离散点列，不参与序列化；
/// `source` 是到当次加载文档内图元的弱引用，跨加载失效后
/// 由 matching 模块按几何等价重新绑定。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrajectoryPrimitive {
    pub geometry: TrajectoryGeometry,
    /// 是否按与习惯方向相反的方向遍历
    pub is_reversed: bool,
    pub nozzle_number: u32,
    pub upper_nozzle_enabled: bool,
    pub upper_nozzle_gas_on: bool,
    pub upper_nozzle_liquid_on: bool,
    pub lower_nozzle_enabled: bool,
    pub lower_nozzle_gas_on: bool,
    pub lower_nozzle_liquid_on: bool,
    /// 运行时长（秒）
    pub runtime: f64,
    /// 选取时的原生几何快照，随项目持久化
    ///
    /// 反向和Z编辑只改标注点，不碰快照；跨加载的等价匹配
    /// 必须拿快照比对，否则编辑过喷涂高度的轨迹永远匹配不上
    /// 停留在图纸平面的实体。
    #[serde(default)]
    pub original_geometry: Option<Geometry>,
    #[serde(skip)]
    pub points: Vec<Point3>,
    #[serde(skip)]
    pub source: Option<PrimitiveId>,
}

impl TrajectoryPrimitive {
    fn from_geometry(geometry: TrajectoryGeometry, source: Option<PrimitiveId>) -> Self {
        Self {
            geometry,
            is_reversed: false,
            nozzle_number: 1,
            upper_nozzle_enabled: false,
            upper_nozzle_gas_on: false,
            upper_nozzle_liquid_on: false,
            lower_nozzle_enabled: false,
            lower_nozzle_gas_on: false,
            lower_nozzle_liquid_on: false,
            runtime: 0.0,
            original_geometry: None,
            points: Vec::new(),
            source,
        }
    }

    /// 路径长度（图纸长度单位，通常为毫米）
    pub fn path_length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| (w[1] - w[0]).norm())
            .sum()
    }

    /// 按 2 m/s 喷涂速度估算的最短运行时长（秒）
    pub fn min_runtime_seconds(&self) -> f64 {
        let meters = self.path_length() / 1000.0;
        meters / 2.0
    }

    /// 液体喷涂是否开启（任一已启用喷头开液即为真）
    pub fn liquid_on(&self) -> bool {
        (self.upper_nozzle_enabled && self.upper_nozzle_liquid_on)
            || (self.lower_nozzle_enabled && self.lower_nozzle_liquid_on)
    }

    /// 气体喷涂是否开启
    pub fn gas_on(&self) -> bool {
        (self.upper_nozzle_enabled && self.upper_nozzle_gas_on)
            || (self.lower_nozzle_enabled && self.lower_nozzle_gas_on)
    }

    /// 用于跨加载等价匹配的原生几何
    ///
    /// 优先返回选取时的快照（不受反向和Z编辑影响）；
    /// 没有快照的旧记录退回用标注点重建。
    pub fn source_geometry(&self) -> Option<Geometry> {
        if let Some(snapshot) = &self.original_geometry {
            return Some(snapshot.clone());
        }
        match &self.geometry {
            TrajectoryGeometry::Line { start, end } => Some(Geometry::Line(Line::new(
                start.position,
                end.position,
            ))),
            TrajectoryGeometry::Arc {
                point1,
                point2,
                point3,
            } => {
                // 反向轨迹的标注点已交换，匹配前换回原遍历顺序
                let (p1, p3) = if self.is_reversed {
                    (point3.position, point1.position)
                } else {
                    (point1.position, point3.position)
                };
                let params = solver::arc_from_three_points(
                    p1,
                    point2.position,
                    p3,
                    MATCH_TOLERANCE,
                )?;
                let mut arc = Arc::new(
                    params.center,
                    params.radius,
                    params.start_angle,
                    params.end_angle,
                );
                arc.normal = params.normal;
                Some(Geometry::Arc(arc))
            }
            TrajectoryGeometry::Circle {
                center,
                radius,
                normal,
                ..
            } => Some(Geometry::Circle(Circle::with_normal(
                *center, *radius, *normal,
            ))),
        }
    }

    /// 重新生成离散点列
    ///
    /// 幂等：旧点列先清空再填充。求解退化时退回标注点本身。
    pub fn regenerate_points(&mut self, resolution_deg: f64) {
        self.points.clear();
        match &self.geometry {
            TrajectoryGeometry::Line { start, end } => {
                self.points.push(start.position);
                self.points.push(end.position);
            }
            TrajectoryGeometry::Arc {
                point1,
                point2,
                point3,
            } => {
                match solver::arc_from_three_points(
                    point1.position,
                    point2.position,
                    point3.position,
                    MATCH_TOLERANCE,
                ) {
                    Some(params) => {
                        let arc = Arc::new(
                            params.center,
                            params.radius,
                            params.start_angle,
                            params.end_angle,
                        );
                        // 存储角始终描述逆时针；原遍历为顺时针时反向走
                        self.points =
                            discretize::arc_points(&arc, resolution_deg, params.clockwise);
                    }
                    None => {
                        tracing::warn!(
                            "arc trajectory is degenerate, emitting defining points"
                        );
                        self.points = vec![
                            point1.position,
                            point2.position,
                            point3.position,
                        ];
                    }
                }
            }
            TrajectoryGeometry::Circle {
                center,
                radius,
                normal,
                point1,
                point2,
                point3,
            } => {
                if *radius < MATCH_TOLERANCE {
                    tracing::warn!(
                        radius,
                        "circle trajectory is degenerate, emitting defining points"
                    );
                    self.points = vec![
                        point1.position,
                        point2.position,
                        point3.position,
                        point1.position,
                    ];
                } else {
                    let circle = Circle::with_normal(*center, *radius, *normal);
                    self.points =
                        discretize::circle_points(&circle, resolution_deg, self.is_reversed);
                }
            }
        }
    }
}

/// 从选中的图元派生轨迹
///
/// 线段端点按离原点近者在前排序；圆弧中点取原扫掠的角度中点；
/// 圆取局部基内 0°/120°/240° 三点。多段线与块引用不能直接
/// 作为轨迹，返回 `None`。
pub fn select(primitive: &Primitive, resolution_deg: f64) -> Option<TrajectoryPrimitive> {
    let geometry = match &primitive.geometry {
        Geometry::Line(line) => {
            // 离原点近的端点作为起点
            let (start, end) =
                if line.start.coords.norm() <= line.end.coords.norm() {
                    (line.start, line.end)
                } else {
                    (line.end, line.start)
                };
            TrajectoryGeometry::Line {
                start: TrajectoryPoint::new(start),
                end: TrajectoryPoint::new(end),
            }
        }
        Geometry::Arc(arc) => {
            let mid_angle = arc.start_angle + arc.sweep_angle() / 2.0;
            TrajectoryGeometry::Arc {
                point1: TrajectoryPoint::new(arc.start_point()),
                point2: TrajectoryPoint::new(arc.point_at_angle(mid_angle)),
                point3: TrajectoryPoint::new(arc.end_point()),
            }
        }
        Geometry::Circle(circle) => {
            let points = circle_defining_points(circle);
            TrajectoryGeometry::Circle {
                point1: TrajectoryPoint::new(points[0]),
                point2: TrajectoryPoint::new(points[1]),
                point3: TrajectoryPoint::new(points[2]),
                center: circle.center,
                radius: circle.radius,
                normal: circle.normal,
            }
        }
        other => {
            tracing::warn!(
                entity_type = other.type_name(),
                "entity type cannot be taught as a trajectory"
            );
            return None;
        }
    };

    let mut trajectory = TrajectoryPrimitive::from_geometry(geometry, Some(primitive.id));
    trajectory.original_geometry = Some(primitive.geometry.clone());
    trajectory.regenerate_points(resolution_deg);
    trajectory.runtime = trajectory.min_runtime_seconds();
    Some(trajectory)
}

/// 圆的三个标注点：局部基内 0°/120°/240°
fn circle_defining_points(circle: &Circle) -> [Point3; 3] {
    let tilted = Circle::with_normal(circle.center, circle.radius, circle.normal);
    // 借离散化的基构造逻辑采样三个标注角
    let samples = discretize::circle_points(&tilted, 120.0, false);
    [samples[0], samples[1], samples[2]]
}

/// 设置轨迹的遍历方向
///
/// 线段交换起止点；圆弧交换 point1/point3（point2 不动，
/// 它仍在弧上）；圆只翻转方向标志，点列按方向重新采样。
pub fn set_reversed(
    trajectory: &mut TrajectoryPrimitive,
    reversed: bool,
    resolution_deg: f64,
) {
    if trajectory.is_reversed == reversed {
        return;
    }
    trajectory.is_reversed = reversed;
    match &mut trajectory.geometry {
        TrajectoryGeometry::Line { start, end } => {
            std::mem::swap(start, end);
        }
        TrajectoryGeometry::Arc { point1, point3, .. } => {
            std::mem::swap(point1, point3);
        }
        TrajectoryGeometry::Circle { .. } => {}
    }
    trajectory.regenerate_points(resolution_deg);
}

/// 修改轨迹所有标注点的Z坐标（喷涂高度）
pub fn set_z(trajectory: &mut TrajectoryPrimitive, z: f64, resolution_deg: f64) {
    match &mut trajectory.geometry {
        TrajectoryGeometry::Line { start, end } => {
            start.position.z = z;
            end.position.z = z;
        }
        TrajectoryGeometry::Arc {
            point1,
            point2,
            point3,
        } => {
            point1.position.z = z;
            point2.position.z = z;
            point3.position.z = z;
        }
        TrajectoryGeometry::Circle {
            point1,
            point2,
            point3,
            center,
            ..
        } => {
            point1.position.z = z;
            point2.position.z = z;
            point3.position.z = z;
            center.z = z;
        }
    }
    trajectory.regenerate_points(resolution_deg);
}

/// 一道喷涂工序：有序的轨迹列表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SprayPass {
    pub name: String,
    pub trajectories: Vec<TrajectoryPrimitive>,
}

impl SprayPass {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            trajectories: Vec::new(),
        }
    }
}

/// 下发给传输层的单条轨迹程序
///
/// 单位换算和寄存器组帧由传输层负责，这里只给图纸长度单位
/// 的有序点列和喷涂开关。
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryProgram {
    pub points: Vec<Point3>,
    pub nozzle_number: u32,
    pub gas_on: bool,
    pub liquid_on: bool,
    pub runtime_seconds: f64,
}

impl TrajectoryProgram {
    /// 从轨迹整理出传输程序
    pub fn from_trajectory(trajectory: &TrajectoryPrimitive) -> Self {
        Self {
            points: trajectory.points.clone(),
            nozzle_number: trajectory.nozzle_number,
            gas_on: trajectory.gas_on(),
            liquid_on: trajectory.liquid_on(),
            runtime_seconds: trajectory.runtime.max(trajectory.min_runtime_seconds()),
        }
    }
}
