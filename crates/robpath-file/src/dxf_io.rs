//! DXF图纸导入
//!
//! 把AutoCAD DXF文件解析成轨迹核心的 [`Document`]：
//! 线段、圆、圆弧、多段线和块引用按原生字段转换，
//! 块定义登记到块表供包围盒展开，其余实体类型跳过。
//!
//! 角度、坐标均按DXF原值保留（角度为度，长度为图纸单位）。

use crate::error::FileError;
use robpath_core::document::Document;
use robpath_core::geometry::{
    Arc, Circle, Geometry, Insert, Line, Polyline, PolylineVertex,
};
use robpath_core::math::{Point2, Point3, Vector3};
use std::path::Path;

/// 从DXF文件导入
pub fn import(path: &Path) -> Result<Document, FileError> {
    let drawing =
        dxf::Drawing::load_file(path).map_err(|e| FileError::Dxf(e.to_string()))?;

    let mut document = Document::new();

    // 块定义先入块表，块引用的包围盒展开要用
    for block in drawing.blocks() {
        let entities: Vec<Geometry> = block
            .entities
            .iter()
            .filter_map(convert_dxf_entity)
            .collect();
        if !entities.is_empty() {
            document.add_block(&block.name, entities);
        }
    }

    let mut skipped = 0usize;
    for entity in drawing.entities() {
        match convert_dxf_entity(entity) {
            Some(geometry) => {
                document.add(geometry, entity.common.layer.clone());
            }
            None => skipped += 1,
        }
    }

    tracing::info!(
        entities = document.len(),
        skipped,
        path = %path.display(),
        "imported DXF drawing"
    );

    Ok(document)
}

fn to_point3(p: &dxf::Point) -> Point3 {
    Point3::new(p.x, p.y, p.z)
}

fn to_vector3(v: &dxf::Vector) -> Vector3 {
    Vector3::new(v.x, v.y, v.z)
}

/// 将DXF实体转换为轨迹核心几何，不支持的类型返回 `None`
fn convert_dxf_entity(entity: &dxf::entities::Entity) -> Option<Geometry> {
    let geometry = match &entity.specific {
        dxf::entities::EntityType::Line(line) => {
            Geometry::Line(Line::new(to_point3(&line.p1), to_point3(&line.p2)))
        }

        dxf::entities::EntityType::Circle(circle) => Geometry::Circle(Circle::with_normal(
            to_point3(&circle.center),
            circle.radius,
            to_vector3(&circle.normal),
        )),

        dxf::entities::EntityType::Arc(arc) => {
            // DXF角度即为度，直接保留
            let mut converted = Arc::new(
                to_point3(&arc.center),
                arc.radius,
                arc.start_angle,
                arc.end_angle,
            );
            converted.normal = to_vector3(&arc.normal);
            Geometry::Arc(converted)
        }

        dxf::entities::EntityType::LwPolyline(lwpoly) => {
            let vertices: Vec<PolylineVertex> = lwpoly
                .vertices
                .iter()
                .map(|v| PolylineVertex::with_bulge(Point2::new(v.x, v.y), v.bulge))
                .collect();
            Geometry::Polyline(Polyline::new(vertices, lwpoly.is_closed()))
        }

        dxf::entities::EntityType::Polyline(poly) => {
            let vertices: Vec<PolylineVertex> = poly
                .vertices()
                .map(|v| {
                    PolylineVertex::with_bulge(
                        Point2::new(v.location.x, v.location.y),
                        v.bulge,
                    )
                })
                .collect();
            Geometry::Polyline(Polyline::new(vertices, poly.is_closed()))
        }

        dxf::entities::EntityType::Insert(insert) => {
            let mut converted =
                Insert::new(insert.name.clone(), to_point3(&insert.location));
            converted.x_scale = insert.x_scale_factor;
            converted.y_scale = insert.y_scale_factor;
            converted.rotation = insert.rotation;
            Geometry::Insert(converted)
        }

        _ => return None,
    };

    Some(geometry)
}
