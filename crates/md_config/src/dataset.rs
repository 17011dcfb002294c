// crates/md_config/src/dataset.rs

//! 合成数据集配置
//!
//! 描述一个规则经纬度网格上的均匀海洋场，供命令行与测试使用。

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 矩形陆地块（闭区间网格索引）
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LandBlock {
    /// 起始列
    pub i0: usize,
    /// 结束列
    pub i1: usize,
    /// 起始行
    pub j0: usize,
    /// 结束行
    pub j1: usize,
}

/// 合成数据集参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntheticDatasetConfig {
    /// x 方向格点数
    #[serde(default = "default_nx")]
    pub nx: usize,
    /// y 方向格点数
    #[serde(default = "default_ny")]
    pub ny: usize,
    /// 垂向层数，0 表示二维
    #[serde(default)]
    pub nz: usize,
    /// 左下角经度 [°]
    #[serde(default)]
    pub lon0: f64,
    /// 左下角纬度 [°]
    #[serde(default)]
    pub lat0: f64,
    /// 经度间隔 [°]
    #[serde(default = "default_spacing")]
    pub dlon: f64,
    /// 纬度间隔 [°]
    #[serde(default = "default_spacing")]
    pub dlat: f64,
    /// 单元尺度 [m]
    #[serde(default = "default_cell_size")]
    pub cell_size_m: f64,
    /// 水深 [m]
    #[serde(default = "default_depth")]
    pub depth_m: f64,
    /// 东向流速 [m/s]
    #[serde(default)]
    pub u: f64,
    /// 北向流速 [m/s]
    #[serde(default)]
    pub v: f64,
    /// 水温 [°C]
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// 盐度 [PSU]
    #[serde(default = "default_salinity")]
    pub salinity: f64,
    /// 垂向扩散系数 [m²/s]
    #[serde(default = "default_kv")]
    pub kv: f64,
    /// 记录间隔 [s]
    #[serde(default = "default_record_interval")]
    pub record_interval: f64,
    /// 记录条数
    #[serde(default = "default_record_count")]
    pub record_count: usize,
    /// 首条记录时间 [s]
    #[serde(default)]
    pub first_record: f64,
    /// 陆地块
    #[serde(default)]
    pub land: Vec<LandBlock>,
}

fn default_nx() -> usize { 50 }
fn default_ny() -> usize { 50 }
fn default_spacing() -> f64 { 0.01 }
fn default_cell_size() -> f64 { 1000.0 }
fn default_depth() -> f64 { 100.0 }
fn default_temperature() -> f64 { 15.0 }
fn default_salinity() -> f64 { 35.0 }
fn default_kv() -> f64 { 1e-3 }
fn default_record_interval() -> f64 { 86400.0 }
fn default_record_count() -> usize { 31 }

impl Default for SyntheticDatasetConfig {
    fn default() -> Self {
        Self {
            nx: default_nx(),
            ny: default_ny(),
            nz: 0,
            lon0: 0.0,
            lat0: 0.0,
            dlon: default_spacing(),
            dlat: default_spacing(),
            cell_size_m: default_cell_size(),
            depth_m: default_depth(),
            u: 0.0,
            v: 0.0,
            temperature: default_temperature(),
            salinity: default_salinity(),
            kv: default_kv(),
            record_interval: default_record_interval(),
            record_count: default_record_count(),
            first_record: 0.0,
            land: Vec::new(),
        }
    }
}

impl SyntheticDatasetConfig {
    /// 记录覆盖的时间范围 [s]
    pub fn time_span(&self) -> (f64, f64) {
        let last = self.first_record + self.record_interval * (self.record_count.saturating_sub(1)) as f64;
        (self.first_record, last)
    }

    /// 校验
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nx < 4 || self.ny < 4 {
            return Err(ConfigError::invalid(
                "dataset.nx/ny",
                format!("{}x{}", self.nx, self.ny),
                "网格至少 4×4",
            ));
        }
        if self.nz == 1 {
            return Err(ConfigError::invalid("dataset.nz", 1, "三维网格至少 2 层，二维请填 0"));
        }
        if self.dlon <= 0.0 || self.dlat <= 0.0 || self.cell_size_m <= 0.0 || self.depth_m <= 0.0 {
            return Err(ConfigError::invalid(
                "dataset",
                format!("dlon={}, dlat={}, cell={}, depth={}", self.dlon, self.dlat, self.cell_size_m, self.depth_m),
                "间隔、单元尺度与水深必须为正",
            ));
        }
        if self.record_count < 2 || self.record_interval <= 0.0 {
            return Err(ConfigError::invalid(
                "dataset.record_count",
                self.record_count,
                "至少两条记录且间隔为正",
            ));
        }
        for block in &self.land {
            if block.i0 > block.i1 || block.j0 > block.j1 || block.i1 >= self.nx || block.j1 >= self.ny {
                return Err(ConfigError::invalid(
                    "dataset.land",
                    format!("{:?}", block),
                    "陆地块超出网格或上下限颠倒",
                ));
            }
        }
        Ok(())
    }
}
