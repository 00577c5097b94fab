//! 图纸文档与图元注册表
//!
//! 解析层把DXF实体转成 [`Primitive`] 后交由 [`Document`] 持有。
//! 每个图元分配一个稳定的 [`PrimitiveId`]，供轨迹层做弱引用；
//! 重新加载图纸后旧ID失效，由 matching 模块按几何等价重新绑定。

use crate::geometry::{Geometry, Insert};
use crate::math::{BoundingBox2, Point2};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 图元的文档内唯一标识
///
/// 仅在单次加载的 [`Document`] 生命周期内有效，不跨文件持久。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct PrimitiveId(pub u64);

/// 带标识和图层的图元
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Primitive {
    pub id: PrimitiveId,
    pub geometry: Geometry,
    pub layer: String,
}

/// 加载完成的图纸文档
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    primitives: Vec<Primitive>,
    /// 块表：块名 -> 块内几何（块局部坐标）
    blocks: HashMap<String, Vec<Geometry>>,
    next_id: u64,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加图元并分配ID
    pub fn add(&mut self, geometry: Geometry, layer: impl Into<String>) -> PrimitiveId {
        let id = PrimitiveId(self.next_id);
        self.next_id += 1;
        self.primitives.push(Primitive {
            id,
            geometry,
            layer: layer.into(),
        });
        id
    }

    /// 注册块定义
    pub fn add_block(&mut self, name: impl Into<String>, entities: Vec<Geometry>) {
        self.blocks.insert(name.into(), entities);
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn get(&self, id: PrimitiveId) -> Option<&Primitive> {
        self.primitives.iter().find(|p| p.id == id)
    }

    pub fn block(&self, name: &str) -> Option<&[Geometry]> {
        self.blocks.get(name).map(|v| v.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    /// 单个图元的包围盒，块引用展开块内容后计算
    pub fn entity_bounding_box(&self, geometry: &Geometry) -> BoundingBox2 {
        let mut expanding = Vec::new();
        self.entity_bounding_box_inner(geometry, &mut expanding)
    }

    fn entity_bounding_box_inner(
        &self,
        geometry: &Geometry,
        expanding: &mut Vec<String>,
    ) -> BoundingBox2 {
        match geometry {
            Geometry::Insert(ins) => self.insert_bounding_box(ins, expanding),
            other => other.bounding_box(),
        }
    }

    /// 整张图纸的包围盒
    pub fn bounding_box(&self) -> BoundingBox2 {
        let mut bbox = BoundingBox2::empty();
        for p in &self.primitives {
            bbox = bbox.union(&self.entity_bounding_box(&p.geometry));
        }
        bbox
    }

    /// 块引用的包围盒
    ///
    /// 先在块局部坐标系求块内容的联合包围盒，再把四个角点按
    /// 缩放、旋转、平移变换到世界坐标，对变换后的角点取轴对齐
    /// 范围。不能只变换中心加半宽，旋转会使那条捷径失效。
    ///
    /// `expanding` 是正在展开的块名栈：块定义缺失或引用成环时
    /// 退化为插入点并告警，不让一张能解析的图纸把进程压爆。
    fn insert_bounding_box(&self, ins: &Insert, expanding: &mut Vec<String>) -> BoundingBox2 {
        if expanding.iter().any(|name| name == &ins.name) {
            tracing::warn!(block = %ins.name, "cyclic block reference");
            let p = Point2::new(ins.location.x, ins.location.y);
            return BoundingBox2::new(p, p);
        }
        let Some(entities) = self.blocks.get(&ins.name) else {
            tracing::warn!(block = %ins.name, "block definition not found");
            let p = Point2::new(ins.location.x, ins.location.y);
            return BoundingBox2::new(p, p);
        };

        expanding.push(ins.name.clone());
        let mut local = BoundingBox2::empty();
        for g in entities {
            // 块内嵌套块引用：递归展开
            local = local.union(&self.entity_bounding_box_inner(g, expanding));
        }
        expanding.pop();
        if local.is_empty() {
            let p = Point2::new(ins.location.x, ins.location.y);
            return BoundingBox2::new(p, p);
        }

        let corners = [
            Point2::new(local.min.x, local.min.y),
            Point2::new(local.max.x, local.min.y),
            Point2::new(local.max.x, local.max.y),
            Point2::new(local.min.x, local.max.y),
        ];

        let rad = ins.rotation.to_radians();
        let (sin, cos) = rad.sin_cos();
        BoundingBox2::from_points(corners.iter().map(|c| {
            let sx = c.x * ins.x_scale;
            let sy = c.y * ins.y_scale;
            Point2::new(
                sx * cos - sy * sin + ins.location.x,
                sx * sin + sy * cos + ins.location.y,
            )
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Circle, Line};
    use crate::math::Point3;

    #[test]
    fn test_ids_are_sequential_and_resolvable() {
        let mut doc = Document::new();
        let a = doc.add(
            Geometry::Line(Line::new(Point3::origin(), Point3::new(1.0, 0.0, 0.0))),
            "0",
        );
        let b = doc.add(
            Geometry::Circle(Circle::new(Point3::origin(), 1.0)),
            "spray",
        );
        assert_ne!(a, b);
        assert_eq!(doc.get(a).unwrap().geometry.type_name(), "Line");
        assert_eq!(doc.get(b).unwrap().layer, "spray");
        assert!(doc.get(PrimitiveId(99)).is_none());
    }

    #[test]
    fn test_insert_bounding_box_rotated() {
        // 块内容：(0,0)-(2,0) 的线段；插入时绕原点旋转90°
        let mut doc = Document::new();
        doc.add_block(
            "bar",
            vec![Geometry::Line(Line::new(
                Point3::origin(),
                Point3::new(2.0, 0.0, 0.0),
            ))],
        );
        let mut ins = Insert::new("bar", Point3::new(10.0, 0.0, 0.0));
        ins.rotation = 90.0;
        let bbox = doc.entity_bounding_box(&Geometry::Insert(ins));
        // 旋转后线段沿Y方向：x ≈ 10，y ∈ [0, 2]
        assert!((bbox.min.x - 10.0).abs() < 1e-9);
        assert!((bbox.max.x - 10.0).abs() < 1e-9);
        assert!((bbox.max.y - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_insert_scale_applies_before_rotation() {
        let mut doc = Document::new();
        doc.add_block(
            "bar",
            vec![Geometry::Line(Line::new(
                Point3::origin(),
                Point3::new(1.0, 0.0, 0.0),
            ))],
        );
        let mut ins = Insert::new("bar", Point3::origin());
        ins.x_scale = 3.0;
        let bbox = doc.entity_bounding_box(&Geometry::Insert(ins));
        assert!((bbox.max.x - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_self_referencing_block_does_not_recurse() {
        // 块 "loop" 引用自身：成环处退化为插入点
        let mut doc = Document::new();
        doc.add_block(
            "loop",
            vec![
                Geometry::Line(Line::new(
                    Point3::origin(),
                    Point3::new(2.0, 0.0, 0.0),
                )),
                Geometry::Insert(Insert::new("loop", Point3::new(1.0, 0.0, 0.0))),
            ],
        );
        let ins = Insert::new("loop", Point3::origin());
        let bbox = doc.entity_bounding_box(&Geometry::Insert(ins));
        assert!((bbox.min.x - 0.0).abs() < 1e-9);
        assert!((bbox.max.x - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_mutually_referencing_blocks_do_not_recurse() {
        let mut doc = Document::new();
        doc.add_block(
            "a",
            vec![Geometry::Insert(Insert::new("b", Point3::origin()))],
        );
        doc.add_block(
            "b",
            vec![
                Geometry::Line(Line::new(
                    Point3::origin(),
                    Point3::new(1.0, 1.0, 0.0),
                )),
                Geometry::Insert(Insert::new("a", Point3::origin())),
            ],
        );
        let bbox = doc.entity_bounding_box(&Geometry::Insert(Insert::new(
            "a",
            Point3::origin(),
        )));
        assert!((bbox.max.x - 1.0).abs() < 1e-9);
        assert!((bbox.max.y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_block_falls_back_to_location() {
        let doc = Document::new();
        let ins = Insert::new("nope", Point3::new(5.0, 6.0, 0.0));
        let bbox = doc.entity_bounding_box(&Geometry::Insert(ins));
        assert!((bbox.min.x - 5.0).abs() < 1e-9);
        assert!((bbox.min.y - 6.0).abs() < 1e-9);
    }
}
