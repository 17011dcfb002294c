// apps/md_cli/src/commands/mod.rs

//! 子命令实现

pub mod info;
pub mod run;
pub mod validate;

use std::path::Path;

use anyhow::{Context, Result};
use md_config::SimulationConfig;
use md_lagrange::Simulation;

use crate::synthetic::build_dataset;

/// 读取并校验配置
pub(crate) fn load_config(path: &Path) -> Result<SimulationConfig> {
    SimulationConfig::from_file(path).with_context(|| format!("无法加载配置文件 {}", path.display()))
}

/// 构建数据集并装配模拟
pub(crate) fn assemble(config: SimulationConfig) -> Result<Simulation> {
    let dataset = build_dataset(&config.dataset).context("构建合成数据集失败")?;
    Simulation::setup(config, dataset).context("装配模拟失败")
}
