// crates/md_lagrange/src/lib.rs

//! MariDrift Lagrangian Layer
//!
//! 个体为本的拉格朗日粒子追踪：在时变海流场中推进粒子，并逐步施加
//! 物理与生物过程。
//!
//! # 模块概览
//!
//! - [`particle`]: 粒子记录、可选能力状态与死亡原因
//! - [`integrators`]: Euler/RK4 平流与湍流扩散
//! - [`biology`]: 浮力、生长、垂直迁移、致死温度、补充
//! - [`pipeline`]: 有序过程管线（单步状态机）
//! - [`coastline`]: 岸线反弹
//! - [`release`]: 投放方式与时间表
//! - [`population`]: 种群与统计
//! - [`simulation`]: 模拟驱动
//! - [`zone`]: 投放区与补充区
//! - [`clock`]: 定步长时钟
//! - [`rng`]: 每个粒子独立的随机数生成器
//!
//! # 层级架构
//!
//! ```text
//! app:     md_cli
//! Layer 4: md_lagrange  (本层)
//! Layer 3: md_grid      ─> GridProvider / Dataset
//! Layer 2: md_config    ─> SimulationConfig
//! Layer 1: md_foundation
//! ```
//!
//! # 示例
//!
//! ```ignore
//! let dataset = RectilinearBuilder::new(50, 50).uniform_current(0.1, 0.0).build()?;
//! let mut sim = Simulation::setup(config, dataset)?;
//! let summary = sim.run()?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod biology;
pub mod clock;
pub mod coastline;
pub mod context;
pub mod error;
pub mod integrators;
pub mod particle;
pub mod pipeline;
pub mod population;
pub mod release;
pub mod rng;
pub mod simulation;
pub mod zone;

pub use clock::{SimulationClock, ONE_DAY};
pub use context::StepContext;
pub use error::{SimResult, SimulationError};
pub use particle::{DeathCause, Particle, ParticleSnapshot, Stage};
pub use pipeline::{ActionKind, ActionPipeline, ParticleAction, StepOutcome};
pub use population::{Population, PopulationStats};
pub use release::{ParticleFactory, ReleaseSchedule};
pub use simulation::{RunSummary, Simulation};
pub use zone::{Zone, ZoneSet};

/// Prelude 模块，包含常用类型
pub mod prelude {
    pub use crate::error::{SimResult, SimulationError};
    pub use crate::particle::{DeathCause, Particle, ParticleSnapshot};
    pub use crate::pipeline::{ActionPipeline, ParticleAction};
    pub use crate::simulation::{RunSummary, Simulation};
}
