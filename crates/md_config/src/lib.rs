// crates/md_config/src/lib.rs

//! MariDrift Config Layer
//!
//! 配置层，定义粒子追踪模拟的全部参数。配置以 JSON 存储，缺省项由
//! `#[serde(default = ...)]` 函数补齐，加载后立即校验。
//!
//! # 模块概览
//!
//! - [`simulation`]: 顶层 `SimulationConfig` 与时间参数
//! - [`transport`]: 平流格式、湍流扩散、岸线处理
//! - [`biology`]: 浮力、生长、迁移、致死温度、补充
//! - [`release`]: 区域与投放
//! - [`dataset`]: 合成数据集
//! - [`error`]: 配置错误类型
//!
//! # 层级架构
//!
//! ```text
//! app:     md_cli       ─> 读取 SimulationConfig
//! Layer 4: md_lagrange  ─> 将配置装配为过程管线
//! Layer 2: md_config    (本层)
//! Layer 1: md_foundation
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod biology;
pub mod dataset;
pub mod error;
pub mod release;
pub mod simulation;
pub mod transport;

pub use biology::{
    BiologyConfig, BuoyancyConfig, DielPattern, GrowthConfig, GrowthModel,
    LethalTemperatureConfig, MigrationConfig, RecruitmentConfig, RecruitmentCriterion,
};
pub use dataset::{LandBlock, SyntheticDatasetConfig};
pub use error::ConfigError;
pub use release::{PatchConfig, ReleaseConfig, ReleaseMode, ZoneConfig, ZoneKind};
pub use simulation::{SimulationConfig, TimeConfig};
pub use transport::{
    AdvectionScheme, CoastlineBehavior, HorizontalDispersionConfig, TransportConfig,
    VerticalDispersionConfig,
};
