//! 示教项目持久化
//!
//! 项目文件是JSON：项目名、图纸路径、各道喷涂工序及其轨迹。
//! 轨迹只存三点标注几何和喷涂参数，离散点列不落盘，
//! 加载后按当前分辨率重新生成，再与新解析的图纸做等价重绑定。

use crate::error::FileError;
use chrono::{DateTime, Utc};
use robpath_core::document::Document;
use robpath_core::matching::{self, ReconcileReport};
use robpath_core::trajectory::SprayPass;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// 项目文件格式版本
pub const PROJECT_VERSION: u32 = 1;

/// 示教项目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub version: u32,
    pub name: String,
    /// 关联的DXF图纸路径
    pub drawing_path: Option<PathBuf>,
    /// 机器人控制器地址（寄存器通信由传输层负责）
    pub robot_ip: String,
    pub robot_port: u16,
    pub passes: Vec<SprayPass>,
    pub current_pass: usize,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            version: PROJECT_VERSION,
            name: name.into(),
            drawing_path: None,
            robot_ip: "127.0.0.1".to_string(),
            robot_port: 502,
            passes: vec![SprayPass::new("pass 1")],
            current_pass: 0,
            created_at: now,
            modified_at: now,
        }
    }

    /// 当前工序
    pub fn current_pass(&self) -> Option<&SprayPass> {
        self.passes.get(self.current_pass)
    }

    pub fn current_pass_mut(&mut self) -> Option<&mut SprayPass> {
        self.passes.get_mut(self.current_pass)
    }

    /// 轨迹总数
    pub fn trajectory_count(&self) -> usize {
        self.passes.iter().map(|p| p.trajectories.len()).sum()
    }

    /// 加载后的恢复：重新生成所有离散点列，再对文档做等价重绑定
    pub fn restore(&mut self, document: &Document, resolution_deg: f64) -> ReconcileReport {
        for pass in &mut self.passes {
            for trajectory in &mut pass.trajectories {
                trajectory.regenerate_points(resolution_deg);
            }
        }
        matching::reconcile_default(&mut self.passes, document)
    }
}

/// 保存项目到JSON文件
pub fn save(project: &Project, path: &Path) -> Result<(), FileError> {
    let mut to_save = project.clone();
    to_save.modified_at = Utc::now();

    let json = serde_json::to_string_pretty(&to_save)?;
    fs::write(path, json)?;

    tracing::info!(
        name = %to_save.name,
        passes = to_save.passes.len(),
        trajectories = to_save.trajectory_count(),
        path = %path.display(),
        "saved project"
    );
    Ok(())
}

/// 从JSON文件加载项目
///
/// 只做反序列化和版本检查；点列重建和轨迹重绑定由
/// [`Project::restore`] 在图纸加载完成后执行。
pub fn load(path: &Path) -> Result<Project, FileError> {
    let json = fs::read_to_string(path)?;
    let project: Project = serde_json::from_str(&json)?;

    if project.version > PROJECT_VERSION {
        return Err(FileError::UnsupportedVersion(format!(
            "project version {} is newer than supported version {}",
            project.version, PROJECT_VERSION
        )));
    }

    tracing::info!(
        name = %project.name,
        passes = project.passes.len(),
        trajectories = project.trajectory_count(),
        path = %path.display(),
        "loaded project"
    );
    Ok(project)
}
