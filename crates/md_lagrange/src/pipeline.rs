// crates/md_lagrange/src/pipeline.rs

//! 过程管线
//!
//! 装配时按配置生成有序的过程列表，每个时间步对每个粒子执行：
//!
//! 1. 已补充且锁定的粒子跳过本步
//! 2. 年龄超过输运时长 → 死亡（Old），结束本步
//! 3. 平流、水平扩散、垂向扩散
//! 4. 计算域检查：边缘 → Out；陆地 → 按岸线方式处理（搁浅、反弹、停留或忽略）
//! 5. 浮力、垂直迁移（存活时）
//! 6. 网格 → 地理坐标同步（存活时）
//! 7. 生长、致死温度、补充（存活时）
//! 8. 年龄增加 `|dt|`
//!
//! 顺序是结果的一部分，过程按 [`ActionKind`] 排序后固定。

use std::collections::BTreeSet;

use glam::DVec2;
use md_config::{AdvectionScheme, CoastlineBehavior, SimulationConfig, ZoneKind};
use md_grid::{names, GridCoord};

use crate::biology::{
    BuoyancyAction, GrowthAction, LethalTemperatureAction, MigrationAction, RecruitmentAction,
};
use crate::coastline;
use crate::context::StepContext;
use crate::error::{SimResult, SimulationError};
use crate::integrators::{advect, horizontal_dispersion, vertical_dispersion};
use crate::particle::{DeathCause, Particle};
use crate::zone::ZoneSet;

/// 过程种类，声明顺序即执行顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ActionKind {
    /// 平流
    Advection,
    /// 水平扩散
    HorizontalDispersion,
    /// 垂向扩散
    VerticalDispersion,
    /// 浮力
    Buoyancy,
    /// 垂直迁移
    Migration,
    /// 生长
    Growth,
    /// 致死温度
    LethalTemperature,
    /// 补充
    Recruitment,
}

impl ActionKind {
    /// 名称
    pub fn name(self) -> &'static str {
        match self {
            ActionKind::Advection => "advection",
            ActionKind::HorizontalDispersion => "horizontal_dispersion",
            ActionKind::VerticalDispersion => "vertical_dispersion",
            ActionKind::Buoyancy => "buoyancy",
            ActionKind::Migration => "migration",
            ActionKind::Growth => "growth",
            ActionKind::LethalTemperature => "lethal_temperature",
            ActionKind::Recruitment => "recruitment",
        }
    }

    /// 是否为计算域检查之前的输运过程
    pub fn is_transport(self) -> bool {
        self <= ActionKind::VerticalDispersion
    }

    /// 是否在地理坐标同步之前执行
    pub fn before_sync(self) -> bool {
        self <= ActionKind::Migration
    }
}

/// 作用于单个粒子的过程
pub trait ParticleAction: Send + Sync {
    /// 过程种类
    fn kind(&self) -> ActionKind;

    /// 必需的数据集变量
    fn required_fields(&self) -> Vec<String>;

    /// 数据集提供时才使用的变量
    fn optional_fields(&self) -> Vec<String> {
        Vec::new()
    }

    /// 粒子创建时附加所需的能力状态
    fn init_particle(&self, _particle: &mut Particle) {}

    /// 执行过程
    fn execute(&self, particle: &mut Particle, ctx: &StepContext<'_>);
}

/// 单步结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// 粒子在本步开始前已死亡
    AlreadyDead,
    /// 已补充并锁定，未执行任何过程
    Locked,
    /// 超过输运时长，本步死亡
    Expired,
    /// 完成本步（可能在本步死亡）
    Stepped,
}

// ============================================================================
// 输运过程
// ============================================================================

/// 平流
#[derive(Debug, Clone)]
pub struct AdvectionAction {
    scheme: AdvectionScheme,
}

impl AdvectionAction {
    /// 创建
    pub fn new(scheme: AdvectionScheme) -> Self {
        Self { scheme }
    }
}

impl ParticleAction for AdvectionAction {
    fn kind(&self) -> ActionKind {
        ActionKind::Advection
    }

    fn required_fields(&self) -> Vec<String> {
        vec![names::U.to_string(), names::V.to_string()]
    }

    fn optional_fields(&self) -> Vec<String> {
        vec![names::W.to_string()]
    }

    fn execute(&self, particle: &mut Particle, ctx: &StepContext<'_>) {
        let d = advect(self.scheme, ctx.grid, particle.grid(), ctx.time, ctx.dt);
        particle.translate(&d);
        clamp_vertical(particle, ctx);
    }
}

/// 水平扩散
#[derive(Debug, Clone)]
pub struct HorizontalDispersionAction {
    epsilon: f64,
}

impl HorizontalDispersionAction {
    /// 创建，`epsilon` 为湍动能耗散率 [m²/s³]
    pub fn new(epsilon: f64) -> Self {
        Self { epsilon }
    }
}

impl ParticleAction for HorizontalDispersionAction {
    fn kind(&self) -> ActionKind {
        ActionKind::HorizontalDispersion
    }

    fn required_fields(&self) -> Vec<String> {
        Vec::new()
    }

    fn execute(&self, particle: &mut Particle, ctx: &StepContext<'_>) {
        let pos = *particle.grid();
        let d = horizontal_dispersion(ctx.grid, &pos, ctx.dt, self.epsilon, &mut particle.rng);
        particle.translate(&d);
    }
}

/// 垂向扩散
#[derive(Debug, Clone)]
pub struct VerticalDispersionAction {
    field: String,
}

impl VerticalDispersionAction {
    /// 创建，`field` 为垂向扩散系数变量名
    pub fn new(field: impl Into<String>) -> Self {
        Self { field: field.into() }
    }
}

impl ParticleAction for VerticalDispersionAction {
    fn kind(&self) -> ActionKind {
        ActionKind::VerticalDispersion
    }

    fn required_fields(&self) -> Vec<String> {
        vec![self.field.clone()]
    }

    fn execute(&self, particle: &mut Particle, ctx: &StepContext<'_>) {
        let pos = *particle.grid();
        if let Some(dz) = vertical_dispersion(ctx.grid, &self.field, &pos, ctx.time, ctx.dt, &mut particle.rng) {
            particle.translate(&md_grid::Displacement::new(0.0, 0.0, Some(dz)));
            clamp_vertical(particle, ctx);
        }
    }
}

/// 把垂向索引限制在 [0, nz-1]
fn clamp_vertical(particle: &mut Particle, ctx: &StepContext<'_>) {
    if let (Some(z), Some(nz)) = (particle.grid().z, ctx.grid.nz()) {
        if z.is_finite() {
            particle.set_z(z.clamp(0.0, (nz - 1) as f64));
        }
    }
}

// ============================================================================
// 管线
// ============================================================================

/// 有序过程管线
pub struct ActionPipeline {
    actions: Vec<Box<dyn ParticleAction>>,
    coastline: CoastlineBehavior,
    lock_recruited: bool,
}

impl std::fmt::Debug for ActionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionPipeline")
            .field("actions", &self.kinds())
            .field("coastline", &self.coastline)
            .field("lock_recruited", &self.lock_recruited)
            .finish()
    }
}

impl ActionPipeline {
    /// 由过程列表构造，按种类排序；同种过程重复时保留第一个
    pub fn new(mut actions: Vec<Box<dyn ParticleAction>>, coastline: CoastlineBehavior, lock_recruited: bool) -> Self {
        actions.sort_by_key(|a| a.kind());
        actions.dedup_by_key(|a| a.kind());
        Self {
            actions,
            coastline,
            lock_recruited,
        }
    }

    /// 由配置装配
    ///
    /// 仅三维可用的过程在二维模式下启用时返回 `Incompatible`。
    pub fn from_config(cfg: &SimulationConfig, zones: &ZoneSet, is_3d: bool) -> SimResult<Self> {
        let transport = &cfg.transport;
        let biology = &cfg.biology;
        let egg_age_limit = biology.egg_duration_days * crate::clock::ONE_DAY;
        let mut actions: Vec<Box<dyn ParticleAction>> = Vec::new();

        if transport.advection {
            actions.push(Box::new(AdvectionAction::new(transport.scheme)));
        }
        if let Some(hd) = &transport.horizontal_dispersion {
            actions.push(Box::new(HorizontalDispersionAction::new(hd.epsilon)));
        }
        if let Some(vd) = &transport.vertical_dispersion {
            require_3d(ActionKind::VerticalDispersion, is_3d)?;
            actions.push(Box::new(VerticalDispersionAction::new(vd.diffusivity_field.clone())));
        }
        if let Some(b) = &biology.buoyancy {
            require_3d(ActionKind::Buoyancy, is_3d)?;
            actions.push(Box::new(BuoyancyAction::new(b, egg_age_limit)));
        }
        if let Some(m) = &biology.migration {
            require_3d(ActionKind::Migration, is_3d)?;
            actions.push(Box::new(MigrationAction::new(m)));
        }
        if let Some(g) = &biology.growth {
            actions.push(Box::new(GrowthAction::new(g)));
        }
        if let Some(l) = &biology.lethal_temperature {
            actions.push(Box::new(LethalTemperatureAction::new(l, egg_age_limit)));
        }
        let mut lock_recruited = false;
        if let Some(r) = &biology.recruitment {
            let n = zones.len(ZoneKind::Recruitment);
            if n == 0 {
                return Err(SimulationError::incompatible(
                    ActionKind::Recruitment.name(),
                    "没有补充区",
                ));
            }
            if r.criterion == md_config::RecruitmentCriterion::Length && biology.growth.is_none() {
                return Err(SimulationError::incompatible(
                    ActionKind::Recruitment.name(),
                    "按体长判定补充需要启用生长",
                ));
            }
            lock_recruited = r.stop_moving;
            actions.push(Box::new(RecruitmentAction::new(r, n)));
        }

        Ok(Self::new(actions, transport.coastline, lock_recruited))
    }

    /// 已启用的过程种类（按执行顺序）
    pub fn kinds(&self) -> Vec<ActionKind> {
        self.actions.iter().map(|a| a.kind()).collect()
    }

    /// 是否启用了某过程
    pub fn has(&self, kind: ActionKind) -> bool {
        self.actions.iter().any(|a| a.kind() == kind)
    }

    /// 全部必需变量
    pub fn required_fields(&self) -> BTreeSet<String> {
        self.actions.iter().flat_map(|a| a.required_fields()).collect()
    }

    /// 全部可选变量
    pub fn optional_fields(&self) -> BTreeSet<String> {
        self.actions.iter().flat_map(|a| a.optional_fields()).collect()
    }

    /// 为新粒子附加各过程需要的能力状态
    pub fn init_particle(&self, particle: &mut Particle) {
        for action in &self.actions {
            action.init_particle(particle);
        }
    }

    /// 推进单个粒子一步
    pub fn step(&self, particle: &mut Particle, ctx: &StepContext<'_>) -> StepOutcome {
        if !particle.is_living() {
            return StepOutcome::AlreadyDead;
        }
        if self.lock_recruited && particle.is_recruited() {
            return StepOutcome::Locked;
        }
        if particle.age() > ctx.transport_duration {
            particle.kill(DeathCause::Old);
            return StepOutcome::Expired;
        }

        let origin = *particle.grid();
        for action in self.actions.iter().filter(|a| a.kind().is_transport()) {
            action.execute(particle, ctx);
        }
        self.check_domain(particle, &origin, ctx);

        let mut synced = false;
        for action in self.actions.iter().filter(|a| !a.kind().is_transport()) {
            if !particle.is_living() {
                break;
            }
            if !synced && !action.kind().before_sync() {
                particle.sync_geo(ctx.grid);
                synced = true;
            }
            action.execute(particle, ctx);
        }
        if !synced && particle.is_living() {
            particle.sync_geo(ctx.grid);
        }

        particle.grow_older(ctx.dt);
        StepOutcome::Stepped
    }

    fn check_domain(&self, particle: &mut Particle, origin: &GridCoord, ctx: &StepContext<'_>) {
        let pos = *particle.grid();
        if ctx.grid.is_on_edge(&pos) {
            particle.kill(DeathCause::OutOfDomain);
            return;
        }
        if ctx.grid.is_in_water(&pos) {
            return;
        }
        match self.coastline {
            CoastlineBehavior::Beaching => particle.kill(DeathCause::Beached),
            CoastlineBehavior::Bouncing => {
                let d = DVec2::new(pos.x - origin.x, pos.y - origin.y);
                // 反弹失败时退回起点
                let d = coastline::bounce(ctx.grid, origin, d).unwrap_or(DVec2::ZERO);
                let bounced = GridCoord {
                    x: origin.x + d.x,
                    y: origin.y + d.y,
                    z: pos.z,
                };
                if ctx.grid.is_on_edge(&bounced) {
                    particle.kill(DeathCause::OutOfDomain);
                } else {
                    particle.set_grid(bounced);
                }
            }
            CoastlineBehavior::Standstill => particle.set_grid(GridCoord {
                x: origin.x,
                y: origin.y,
                z: pos.z,
            }),
            CoastlineBehavior::Ignore => {}
        }
    }
}

fn require_3d(kind: ActionKind, is_3d: bool) -> SimResult<()> {
    if is_3d {
        Ok(())
    } else {
        Err(SimulationError::incompatible(kind.name(), "仅适用于三维模拟"))
    }
}
