//! RobPath 文件处理
//!
//! 支持：
//! - `.dxf` 图纸导入
//! - `.json` 示教项目的保存/加载与加载后恢复

pub mod dxf_io;
pub mod error;
pub mod project;

pub use error::FileError;
pub use project::{Project, PROJECT_VERSION};
