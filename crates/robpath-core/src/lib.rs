//! RobPath 轨迹推导核心
//!
//! 喷涂机器人示教系统的几何引擎：从图纸图元推导轨迹点列，
//! 并在图纸重新加载后按几何等价重新绑定持久化的轨迹。
//!
//! # 数据流
//!
//! 图纸图元 → 离散化（预览）/ 等价匹配（重绑定）→ 轨迹点列 → 传输层
//!
//! 所有求解器都是无共享状态的纯函数，退化输入以"无结果"
//! 表达并由调用方降级处理，核心不允许中断示教会话。
//!
//! # 示例
//!
//! ```rust
//! use robpath_core::prelude::*;
//!
//! let mut doc = Document::new();
//! let id = doc.add(
//!     Geometry::Line(Line::new(Point3::origin(), Point3::new(100.0, 0.0, 0.0))),
//!     "0",
//! );
//!
//! // 选中图元派生轨迹
//! let traj = trajectory::select(doc.get(id).unwrap(), 5.0).unwrap();
//! assert_eq!(traj.points.len(), 2);
//! ```

pub mod discretize;
pub mod document;
pub mod geometry;
pub mod matching;
pub mod math;
pub mod solver;
pub mod trajectory;

pub mod prelude {
    //! 常用类型的便捷导入
    pub use crate::discretize::{self, DEFAULT_RESOLUTION_DEG};
    pub use crate::document::{Document, Primitive, PrimitiveId};
    pub use crate::geometry::{
        Arc, Circle, Geometry, Insert, Line, Polyline, PolylineVertex,
    };
    pub use crate::matching::{geometrically_equivalent, reconcile, ReconcileReport};
    pub use crate::math::{
        BoundingBox2, Point2, Point3, Vector2, Vector3, EPSILON, MATCH_TOLERANCE,
    };
    pub use crate::solver::{ArcParams, BulgeArc, BulgeSegment, CircleParams};
    pub use crate::trajectory::{
        self, SprayPass, TrajectoryGeometry, TrajectoryPoint, TrajectoryPrimitive,
        TrajectoryProgram,
    };
}
