// crates/md_lagrange/src/population.rs

//! 粒子种群
//!
//! 粒子只增不减，死亡粒子保留在原位置，序号即在种群中的下标。

use rayon::prelude::*;
use serde::Serialize;

use crate::context::StepContext;
use crate::particle::{DeathCause, Particle, ParticleSnapshot};
use crate::pipeline::ActionPipeline;

/// 种群统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PopulationStats {
    /// 粒子总数
    pub total: usize,
    /// 存活
    pub alive: usize,
    /// 离开计算域
    pub out: usize,
    /// 搁浅
    pub beached: usize,
    /// 低温致死
    pub cold: usize,
    /// 高温致死
    pub hot: usize,
    /// 超过输运时长
    pub old: usize,
    /// 各补充区的补充数
    pub recruited: Vec<usize>,
}

impl PopulationStats {
    /// 死亡总数
    pub fn dead(&self) -> usize {
        self.total - self.alive
    }
}

/// 粒子种群
#[derive(Debug, Clone, Default)]
pub struct Population {
    particles: Vec<Particle>,
}

impl Population {
    /// 空种群
    pub fn new() -> Self {
        Self::default()
    }

    /// 粒子数
    #[inline]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// 追加一批粒子
    pub fn extend(&mut self, batch: Vec<Particle>) {
        self.particles.extend(batch);
    }

    /// 按序号取粒子
    pub fn get(&self, index: usize) -> Option<&Particle> {
        self.particles.get(index)
    }

    /// 全部粒子
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// 遍历
    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    /// 存活粒子数
    pub fn living_count(&self) -> usize {
        self.particles.iter().filter(|p| p.is_living()).count()
    }

    /// 推进全部粒子一步
    pub fn step_all(&mut self, pipeline: &ActionPipeline, ctx: &StepContext<'_>, parallel: bool) {
        if parallel {
            self.particles.par_iter_mut().for_each(|p| {
                pipeline.step(p, ctx);
            });
        } else {
            for p in &mut self.particles {
                pipeline.step(p, ctx);
            }
        }
    }

    /// 统计，`recruitment_zones` 为补充区数量
    pub fn stats(&self, recruitment_zones: usize) -> PopulationStats {
        let mut stats = PopulationStats {
            total: self.particles.len(),
            recruited: vec![0; recruitment_zones],
            ..Default::default()
        };
        for p in &self.particles {
            match p.death_cause() {
                DeathCause::Alive => stats.alive += 1,
                DeathCause::OutOfDomain => stats.out += 1,
                DeathCause::Beached => stats.beached += 1,
                DeathCause::Cold => stats.cold += 1,
                DeathCause::Hot => stats.hot += 1,
                DeathCause::Old => stats.old += 1,
            }
            if let Some(r) = p.recruitment() {
                for (count, flag) in stats.recruited.iter_mut().zip(r.flags()) {
                    if *flag {
                        *count += 1;
                    }
                }
            }
        }
        stats
    }

    /// 全部粒子的快照
    pub fn snapshots(&self) -> Vec<ParticleSnapshot> {
        self.particles.iter().map(Particle::snapshot).collect()
    }
}
