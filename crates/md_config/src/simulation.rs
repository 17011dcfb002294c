// crates/md_config/src/simulation.rs

//! SimulationConfig - 粒子追踪模拟的完整配置
//!
//! 配置在装配时读取一次，之后以不可变结构传入各过程，运行期间不再访问。

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::biology::BiologyConfig;
use crate::dataset::SyntheticDatasetConfig;
use crate::error::ConfigError;
use crate::release::{ReleaseConfig, ReleaseMode, ZoneConfig, ZoneKind};
use crate::transport::TransportConfig;

/// 模拟配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// 时间参数
    #[serde(default)]
    pub time: TimeConfig,

    /// 输运过程
    #[serde(default)]
    pub transport: TransportConfig,

    /// 生物过程
    #[serde(default)]
    pub biology: BiologyConfig,

    /// 区域
    #[serde(default)]
    pub zones: Vec<ZoneConfig>,

    /// 投放
    #[serde(default)]
    pub release: ReleaseConfig,

    /// 合成数据集
    #[serde(default)]
    pub dataset: SyntheticDatasetConfig,

    /// 随机数种子
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// 是否并行推进粒子
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

fn default_seed() -> u64 { 20_240_601 }
fn default_parallel() -> bool { true }

/// 时间参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeConfig {
    /// 起始时间 [s]
    #[serde(default)]
    pub t0: f64,
    /// 时间步长 [s]，负值表示逆向追踪
    #[serde(default = "default_dt")]
    pub dt: f64,
    /// 模拟总时长 [s]
    #[serde(default = "default_duration")]
    pub simulation_duration: f64,
    /// 单个粒子的最长输运时间 [s]
    #[serde(default = "default_duration")]
    pub transport_duration: f64,
    /// 时间零点对应的日历时刻，用于计算一天中的时刻
    #[serde(default)]
    pub origin: Option<NaiveDateTime>,
}

fn default_dt() -> f64 { 3600.0 }
fn default_duration() -> f64 { 10.0 * 86400.0 }

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            t0: 0.0,
            dt: default_dt(),
            simulation_duration: default_duration(),
            transport_duration: default_duration(),
            origin: None,
        }
    }
}

impl TimeConfig {
    /// 是否逆向追踪
    pub fn is_backward(&self) -> bool {
        self.dt < 0.0
    }

    /// 模拟结束时刻（按时间方向）
    pub fn end_time(&self) -> f64 {
        self.t0 + self.dt.signum() * self.simulation_duration
    }

    /// 判断时刻是否落在本次模拟的时间范围内
    pub fn covers(&self, t: f64) -> bool {
        (t - self.t0) * self.dt.signum() >= 0.0 && (t - self.t0).abs() < self.simulation_duration
    }

    /// 校验
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dt == 0.0 || !self.dt.is_finite() {
            return Err(ConfigError::invalid("time.dt", self.dt, "时间步长不能为零"));
        }
        if self.simulation_duration <= 0.0 || !self.simulation_duration.is_finite() {
            return Err(ConfigError::invalid(
                "time.simulation_duration",
                self.simulation_duration,
                "模拟时长必须为正",
            ));
        }
        if self.transport_duration <= 0.0 || !self.transport_duration.is_finite() {
            return Err(ConfigError::invalid(
                "time.transport_duration",
                self.transport_duration,
                "输运时长必须为正",
            ));
        }
        Ok(())
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            time: TimeConfig::default(),
            transport: TransportConfig::default(),
            biology: BiologyConfig::default(),
            zones: Vec::new(),
            release: ReleaseConfig::default(),
            dataset: SyntheticDatasetConfig::default(),
            seed: default_seed(),
            parallel: default_parallel(),
        }
    }
}

impl SimulationConfig {
    /// 从 JSON 文件加载并校验
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// 从 JSON 字符串加载并校验
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: SimulationConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 保存为格式化 JSON
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// 指定用途的区域数量
    pub fn zone_count(&self, kind: ZoneKind) -> usize {
        self.zones.iter().filter(|z| z.kind == kind).count()
    }

    /// 实际使用的投放时刻
    pub fn release_times(&self) -> Vec<f64> {
        if self.release.times.is_empty() {
            vec![self.time.t0]
        } else {
            self.release.times.clone()
        }
    }

    /// 验证配置有效性，返回第一个发现的问题
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.time.validate()?;
        self.transport.validate()?;
        self.biology.validate()?;
        self.release.validate()?;
        self.dataset.validate()?;

        for (n, zone) in self.zones.iter().enumerate() {
            if zone.polygon.len() < 3 {
                return Err(ConfigError::invalid(
                    format!("zones[{n}].polygon"),
                    zone.polygon.len(),
                    "多边形至少需要 3 个顶点",
                ));
            }
            if let Some([lo, hi]) = zone.depth_range {
                if lo > hi {
                    return Err(ConfigError::invalid(
                        format!("zones[{n}].depth_range"),
                        format!("[{lo}, {hi}]"),
                        "下限大于上限",
                    ));
                }
            }
        }

        if matches!(self.release.mode, ReleaseMode::Zone { .. })
            && self.zone_count(ZoneKind::Release) == 0
        {
            return Err(ConfigError::invalid("zones", 0, "区域投放需要至少一个投放区"));
        }

        if self.biology.recruitment.is_some() && self.zone_count(ZoneKind::Recruitment) == 0 {
            return Err(ConfigError::invalid("zones", 0, "补充过程需要至少一个补充区"));
        }

        for t in &self.release.times {
            if !self.time.covers(*t) {
                return Err(ConfigError::invalid(
                    "release.times",
                    t,
                    "投放时刻不在模拟时间范围内",
                ));
            }
        }

        Ok(())
    }
}
