// crates/md_config/src/release.rs

//! 区域与投放配置
//!
//! 区域多边形以经纬度给出；投放支持固定点、文本文件、区域随机和斑块四种方式，
//! 并可按时间表多次投放。

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;

// ============================================================================
// 区域
// ============================================================================

/// 区域用途
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneKind {
    /// 投放区
    Release,
    /// 补充区
    Recruitment,
    /// 定向区（仅作标注）
    Orientation,
}

/// 区域定义
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneConfig {
    /// 区域用途
    pub kind: ZoneKind,
    /// 名称
    #[serde(default)]
    pub name: String,
    /// 多边形顶点 [lon, lat]，首尾不必重复
    pub polygon: Vec<[f64; 2]>,
    /// 深度范围 [min, max]（负值，m）
    #[serde(default)]
    pub depth_range: Option<[f64; 2]>,
}

// ============================================================================
// 投放
// ============================================================================

/// 斑块投放参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchConfig {
    /// 每个斑块的粒子数（含首个粒子）
    pub per_patch: usize,
    /// 斑块水平半径 [m]
    #[serde(default = "default_patch_radius")]
    pub radius_m: f64,
    /// 斑块垂向厚度 [m]
    #[serde(default = "default_patch_thickness")]
    pub thickness_m: f64,
}

fn default_patch_radius() -> f64 { 500.0 }
fn default_patch_thickness() -> f64 { 5.0 }

/// 投放方式
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ReleaseMode {
    /// 固定点 [lon, lat, depth]
    Points {
        /// 投放点列表
        points: Vec<[f64; 3]>,
    },
    /// 文本文件，每行 `lon lat [depth]`
    TextFile {
        /// 文件路径
        path: PathBuf,
    },
    /// 在投放区内随机
    Zone {
        /// 粒子总数
        number_particles: usize,
        /// 深度范围 [min, max]（负值，m）
        #[serde(default = "default_release_depth")]
        depth_range: [f64; 2],
        /// 斑块投放，缺省为均匀随机
        #[serde(default)]
        patches: Option<PatchConfig>,
    },
}

fn default_release_depth() -> [f64; 2] { [0.0, 0.0] }

/// 投放配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseConfig {
    /// 投放方式
    #[serde(flatten)]
    pub mode: ReleaseMode,
    /// 投放时刻 [s]，为空时仅在 t0 投放
    #[serde(default)]
    pub times: Vec<f64>,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            mode: ReleaseMode::Zone {
                number_particles: 100,
                depth_range: default_release_depth(),
                patches: None,
            },
            times: Vec::new(),
        }
    }
}

impl ReleaseConfig {
    /// 每次投放事件的粒子数（文本文件方式在读取前未知，返回 `None`）
    pub fn particles_per_event(&self) -> Option<usize> {
        match &self.mode {
            ReleaseMode::Points { points } => Some(points.len()),
            ReleaseMode::TextFile { .. } => None,
            ReleaseMode::Zone { number_particles, .. } => Some(*number_particles),
        }
    }

    /// 校验投放参数（区域数量与时间表由上层结合其他配置检查）
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.mode {
            ReleaseMode::Points { points } => {
                if points.is_empty() {
                    return Err(ConfigError::invalid("release.points", "[]", "至少需要一个投放点"));
                }
            }
            ReleaseMode::TextFile { path } => {
                if path.as_os_str().is_empty() {
                    return Err(ConfigError::Missing("release.path".to_string()));
                }
            }
            ReleaseMode::Zone { number_particles, depth_range, patches } => {
                if *number_particles == 0 {
                    return Err(ConfigError::invalid("release.number_particles", 0, "粒子数必须为正"));
                }
                if depth_range[0] > depth_range[1] {
                    return Err(ConfigError::invalid(
                        "release.depth_range",
                        format!("{:?}", depth_range),
                        "下限大于上限",
                    ));
                }
                if let Some(p) = patches {
                    if p.per_patch == 0 || number_particles % p.per_patch != 0 {
                        return Err(ConfigError::invalid(
                            "release.patches.per_patch",
                            p.per_patch,
                            "必须为正且整除粒子总数",
                        ));
                    }
                    if p.radius_m < 0.0 || p.thickness_m < 0.0 {
                        return Err(ConfigError::invalid(
                            "release.patches",
                            format!("radius={}, thickness={}", p.radius_m, p.thickness_m),
                            "半径与厚度不能为负",
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}
