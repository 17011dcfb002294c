// crates/md_lagrange/src/simulation.rs

//! 模拟驱动
//!
//! 装配：校验配置 → 投影区域 → 装配管线 → 登记变量 → 创建粒子工厂 → 加载初始时间窗。
//!
//! 每个时间步：刷新时间窗 → 投放到期粒子 → 推进全部粒子 → 时钟前进。
//! 时间窗在粒子推进之前统一刷新，推进期间数据集只读。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use md_config::{SimulationConfig, ZoneKind};
use md_grid::{Dataset, GridProvider};

use crate::clock::SimulationClock;
use crate::context::StepContext;
use crate::error::SimResult;
use crate::particle::ParticleSnapshot;
use crate::pipeline::ActionPipeline;
use crate::population::{Population, PopulationStats};
use crate::release::{ParticleFactory, ReleaseSchedule};
use crate::zone::ZoneSet;

/// 运行结果摘要
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// 完成的步数
    pub ticks: u64,
    /// 结束时刻 [s]
    pub final_time: f64,
    /// 是否被取消
    pub cancelled: bool,
    /// 种群统计
    pub stats: PopulationStats,
}

/// 模拟
pub struct Simulation {
    config: SimulationConfig,
    dataset: Dataset,
    zones: ZoneSet,
    pipeline: ActionPipeline,
    factory: ParticleFactory,
    schedule: ReleaseSchedule,
    population: Population,
    clock: SimulationClock,
    cancel: Arc<AtomicBool>,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("pipeline", &self.pipeline)
            .field("clock", &self.clock)
            .field("particles", &self.population.len())
            .finish()
    }
}

impl Simulation {
    /// 装配模拟；任何配置或数据缺失都在此返回错误
    pub fn setup(config: SimulationConfig, mut dataset: Dataset) -> SimResult<Self> {
        config.validate()?;
        let is_3d = dataset.is_3d();

        let zones = ZoneSet::from_config(&config.zones, &dataset)?;
        let pipeline = ActionPipeline::from_config(&config, &zones, is_3d)?;

        for name in pipeline.required_fields() {
            dataset.require(&name)?;
        }
        for name in pipeline.optional_fields() {
            if dataset.provides(&name) {
                dataset.require(&name)?;
            }
        }

        let factory = ParticleFactory::from_config(&config.release, config.seed, is_3d)?;
        let schedule = ReleaseSchedule::new(config.release_times(), config.time.is_backward());
        let clock = SimulationClock::from_config(&config.time);
        dataset.setup(clock.time(), clock.is_backward())?;

        info!(
            actions = ?pipeline.kinds(),
            is_3d,
            release_events = schedule.len(),
            steps = clock.total_steps(),
            "模拟装配完成"
        );

        Ok(Self {
            config,
            dataset,
            zones,
            pipeline,
            factory,
            schedule,
            population: Population::new(),
            clock,
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    /// 配置
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// 数据集
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// 区域
    pub fn zones(&self) -> &ZoneSet {
        &self.zones
    }

    /// 过程管线
    pub fn pipeline(&self) -> &ActionPipeline {
        &self.pipeline
    }

    /// 种群
    pub fn population(&self) -> &Population {
        &self.population
    }

    /// 时钟
    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    /// 取消标志，置位后在下一步开始前停止
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// 是否还有下一步
    pub fn has_next_step(&self) -> bool {
        self.clock.has_next_step()
    }

    /// 推进一步
    pub fn step(&mut self) -> SimResult<()> {
        let time = self.clock.time();
        let dt = self.clock.dt();

        if self.dataset.refresh(time)? {
            debug!(time, window = ?self.dataset.window(), "时间窗刷新");
        }

        for _ in 0..self.schedule.take_due(time, dt) {
            let batch = self
                .factory
                .release(&self.dataset, &self.zones, &self.pipeline, self.population.len())?;
            debug!(time, count = batch.len(), "投放事件");
            self.population.extend(batch);
        }

        let ctx = StepContext::new(&self.dataset, &self.zones, time, dt, self.clock.transport_duration())
            .with_seconds_of_day(self.clock.seconds_of_day(time));
        self.population.step_all(&self.pipeline, &ctx, self.config.parallel);

        self.clock.advance();
        Ok(())
    }

    /// 运行到结束或被取消
    pub fn run(&mut self) -> SimResult<RunSummary> {
        let mut cancelled = false;
        while self.clock.has_next_step() {
            if self.cancel.load(Ordering::Relaxed) {
                cancelled = true;
                break;
            }
            self.step()?;
        }

        let summary = RunSummary {
            ticks: self.clock.step_index(),
            final_time: self.clock.time(),
            cancelled,
            stats: self.stats(),
        };
        info!(
            ticks = summary.ticks,
            final_time = summary.final_time,
            alive = summary.stats.alive,
            total = summary.stats.total,
            cancelled,
            "模拟结束"
        );
        Ok(summary)
    }

    /// 当前统计
    pub fn stats(&self) -> PopulationStats {
        self.population.stats(self.zones.len(ZoneKind::Recruitment))
    }

    /// 全部粒子的快照
    pub fn snapshots(&self) -> Vec<ParticleSnapshot> {
        self.population.snapshots()
    }
}
