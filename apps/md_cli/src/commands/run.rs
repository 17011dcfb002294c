// apps/md_cli/src/commands/run.rs

//! 运行模拟命令

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tracing::info;

use md_lagrange::{ParticleSnapshot, RunSummary};

use super::{assemble, load_config};

/// 运行模拟参数
#[derive(Args)]
pub struct RunArgs {
    /// 配置文件路径
    #[arg(short, long)]
    pub config: PathBuf,

    /// 结果文件（JSON），缺省时只打印统计
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// 覆盖配置中的随机种子
    #[arg(long)]
    pub seed: Option<u64>,

    /// 强制顺序推进粒子
    #[arg(long)]
    pub sequential: bool,
}

/// 写出的结果
#[derive(Serialize)]
struct RunOutput<'a> {
    summary: &'a RunSummary,
    particles: Vec<ParticleSnapshot>,
}

/// 执行运行命令
pub fn execute(args: RunArgs) -> Result<()> {
    info!("=== MariDrift 模拟启动 ===");

    let mut config = load_config(&args.config)?;
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if args.sequential {
        config.parallel = false;
    }
    let mut sim = assemble(config)?;

    info!(
        "时间: t0={} s, dt={} s, 共 {} 步",
        sim.clock().t0(),
        sim.clock().dt(),
        sim.clock().total_steps()
    );

    let start = Instant::now();
    let summary = sim.run().context("模拟中断")?;
    let elapsed = start.elapsed();

    let stats = &summary.stats;
    info!("=== 模拟完成 ===");
    info!("总步数: {}", summary.ticks);
    info!("计算时间: {:.2} s", elapsed.as_secs_f64());
    info!(
        "粒子: 共 {}, 存活 {}, 出界 {}, 搁浅 {}, 低温 {}, 高温 {}, 超龄 {}",
        stats.total, stats.alive, stats.out, stats.beached, stats.cold, stats.hot, stats.old
    );
    for (n, count) in stats.recruited.iter().enumerate() {
        info!("补充区 {}: {} 个粒子", n + 1, count);
    }

    if let Some(path) = &args.output {
        let file = File::create(path).with_context(|| format!("无法创建 {}", path.display()))?;
        let output = RunOutput {
            summary: &summary,
            particles: sim.snapshots(),
        };
        serde_json::to_writer_pretty(BufWriter::new(file), &output).context("写出结果失败")?;
        info!("结果已写入 {}", path.display());
    }

    Ok(())
}
