// apps/md_cli/src/commands/info.rs

//! 信息显示命令

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use md_config::SimulationConfig;
use md_grid::GridProvider;

use super::{assemble, load_config};

/// 信息显示参数
#[derive(Args)]
pub struct InfoArgs {
    /// 配置文件路径，给出时显示该配置启用的过程与所需变量
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 以 JSON 打印默认配置
    #[arg(long)]
    pub defaults: bool,
}

/// 执行信息命令
pub fn execute(args: InfoArgs) -> Result<()> {
    info!("=== MariDrift 信息 ===");

    println!("MariDrift CLI 版本: {}", env!("CARGO_PKG_VERSION"));
    println!("目标平台: {}", std::env::consts::ARCH);
    println!("操作系统: {}", std::env::consts::OS);
    println!("并行线程: {}", available_threads());

    if args.defaults || args.config.is_none() {
        println!("\n=== 默认配置 ===");
        let json = serde_json::to_string_pretty(&SimulationConfig::default()).context("序列化默认配置失败")?;
        println!("{json}");
    }

    if let Some(path) = &args.config {
        print_simulation_info(path)?;
    }

    Ok(())
}

fn print_simulation_info(path: &Path) -> Result<()> {
    let config = load_config(path)?;
    let sim = assemble(config)?;
    let ds = sim.dataset();
    let grid = ds.grid();

    println!("\n=== 模拟 ===");
    println!("网格: {} × {}{}", grid.nx(), grid.ny(), match ds.nz() {
        Some(nz) => format!(" × {nz} 层"),
        None => String::new(),
    });
    let (first, last) = ds.time_range();
    println!("数据记录: {} 条, [{first}, {last}] s", ds.record_times().len());
    println!(
        "时间: t0={} s, dt={} s, {} 步{}",
        sim.clock().t0(),
        sim.clock().dt(),
        sim.clock().total_steps(),
        if sim.clock().is_backward() { " (逆向)" } else { "" }
    );

    let names: Vec<_> = sim.pipeline().kinds().iter().map(|k| k.name()).collect();
    println!("过程: {}", names.join(", "));
    let required: Vec<_> = sim.pipeline().required_fields().into_iter().collect();
    println!("必需变量: {}", required.join(", "));
    let loaded: Vec<_> = ds.loaded_fields().collect();
    println!("已加载变量: {}", loaded.join(", "));
    println!("每次投放粒子数: {}", sim.config().release.particles_per_event().map_or("按文件".to_string(), |n| n.to_string()));
    println!("投放次数: {}", sim.config().release_times().len());

    Ok(())
}

fn available_threads() -> usize {
    std::thread::available_parallelism().map_or(1, |n| n.get())
}
