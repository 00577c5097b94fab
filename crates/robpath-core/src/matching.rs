//! 几何等价匹配与轨迹重绑定
//!
//! DXF句柄不随项目文件持久化，重新加载图纸后旧引用全部失效。
//! 本模块定义容差意义下的结构化几何等价，并以此把持久化的
//! 轨迹重新绑定到新解析出的图元上。匹配不到只告警，绝不中断。

use crate::document::Document;
use crate::geometry::Geometry;
use crate::math::{angles_equal_deg, Point3, MATCH_TOLERANCE};
use crate::trajectory::SprayPass;

fn points_equal(a: &Point3, b: &Point3, tolerance: f64) -> bool {
    (a - b).norm() <= tolerance
}

/// 判断两个图元在容差内几何等价
///
/// 类型不同一律不等价。线段端点不分方向配对；圆比中心和半径；
/// 圆弧比中心、半径及归一化到 [0°, 360°) 后的两端角（跨0°回绕
/// 视为相等）；多段线要求顶点数、闭合标志一致且各顶点坐标与
/// 凸度按原顺序逐一吻合，不容忍顶点轮转或重排。
pub fn geometrically_equivalent(a: &Geometry, b: &Geometry, tolerance: f64) -> bool {
    match (a, b) {
        (Geometry::Line(la), Geometry::Line(lb)) => {
            (points_equal(&la.start, &lb.start, tolerance)
                && points_equal(&la.end, &lb.end, tolerance))
                || (points_equal(&la.start, &lb.end, tolerance)
                    && points_equal(&la.end, &lb.start, tolerance))
        }
        (Geometry::Circle(ca), Geometry::Circle(cb)) => {
            points_equal(&ca.center, &cb.center, tolerance)
                && (ca.radius - cb.radius).abs() <= tolerance
        }
        (Geometry::Arc(aa), Geometry::Arc(ab)) => {
            points_equal(&aa.center, &ab.center, tolerance)
                && (aa.radius - ab.radius).abs() <= tolerance
                && angles_equal_deg(aa.start_angle, ab.start_angle, tolerance)
                && angles_equal_deg(aa.end_angle, ab.end_angle, tolerance)
        }
        (Geometry::Polyline(pa), Geometry::Polyline(pb)) => {
            pa.closed == pb.closed
                && pa.vertices.len() == pb.vertices.len()
                && pa.vertices.iter().zip(&pb.vertices).all(|(va, vb)| {
                    (va.point - vb.point).norm() <= tolerance
                        && (va.bulge - vb.bulge).abs() <= tolerance
                })
        }
        _ => false,
    }
}

/// 重绑定结果统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// 成功重绑定的轨迹数
    pub rebound: usize,
    /// 找不到等价图元，保留失效引用的轨迹数
    pub unmatched: usize,
}

/// 把各工序中引用失效的轨迹重新绑定到文档内的等价图元
///
/// 逐条轨迹重建几何快照后顺序扫描文档，绑定到首个等价图元。
/// 匹配不消耗图元：多道工序共用同一图元时会绑到同一个ID。
/// 匹配失败的轨迹保留失效引用并计入报告，下游仅失去高亮能力。
pub fn reconcile(
    passes: &mut [SprayPass],
    document: &Document,
    tolerance: f64,
) -> ReconcileReport {
    let mut report = ReconcileReport::default();

    for pass in passes.iter_mut() {
        for trajectory in pass.trajectories.iter_mut() {
            let live = trajectory
                .source
                .and_then(|id| document.get(id))
                .is_some();
            if live {
                continue;
            }

            let Some(snapshot) = trajectory.source_geometry() else {
                tracing::warn!(
                    pass = %pass.name,
                    entity_type = trajectory.geometry.type_name(),
                    "trajectory geometry is degenerate, cannot reconcile"
                );
                report.unmatched += 1;
                continue;
            };

            let matched = document
                .primitives()
                .iter()
                .find(|p| geometrically_equivalent(&snapshot, &p.geometry, tolerance));
            match matched {
                Some(primitive) => {
                    trajectory.source = Some(primitive.id);
                    report.rebound += 1;
                }
                None => {
                    tracing::warn!(
                        pass = %pass.name,
                        entity_type = trajectory.geometry.type_name(),
                        "no equivalent entity found for persisted trajectory"
                    );
                    report.unmatched += 1;
                }
            }
        }
    }

    tracing::info!(
        rebound = report.rebound,
        unmatched = report.unmatched,
        "trajectory reconciliation finished"
    );
    report
}

/// 以默认容差重绑定
pub fn reconcile_default(passes: &mut [SprayPass], document: &Document) -> ReconcileReport {
    reconcile(passes, document, MATCH_TOLERANCE)
}
