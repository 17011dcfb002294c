// crates/md_lagrange/src/particle.rs

//! 粒子记录
//!
//! 粒子在网格坐标与地理坐标中同时持有位置，网格坐标为积分时的权威表示，
//! 每步末尾由管线同步地理坐标。
//!
//! 可选能力（生长、浮力、补充）以 `Option` 字段表示，在投放时按配置填充，
//! 过程管线只检查能力是否存在。
//!
//! # 生命周期
//!
//! 存活 → 任一致死条件 → 死亡（终态）。死亡粒子保留在种群中，
//! 位置与年龄不再改变。

use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use md_grid::{Displacement, GridCoord, GridPoint, GridProvider};

/// 死亡原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    /// 存活
    #[default]
    Alive,
    /// 离开计算域
    OutOfDomain,
    /// 搁浅
    Beached,
    /// 低温致死
    Cold,
    /// 高温致死
    Hot,
    /// 超过输运时长
    Old,
}

impl DeathCause {
    /// 简短代码
    pub fn code(self) -> &'static str {
        match self {
            DeathCause::Alive => "alive",
            DeathCause::OutOfDomain => "out",
            DeathCause::Beached => "beached",
            DeathCause::Cold => "cold",
            DeathCause::Hot => "hot",
            DeathCause::Old => "old",
        }
    }
}

impl std::fmt::Display for DeathCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// 发育阶段，随体长单调不减
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// 卵
    Egg,
    /// 卵黄囊仔鱼
    YolkSacLarva,
    /// 摄食仔鱼
    FeedingLarva,
}

/// 生长状态
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthState {
    /// 体长 [mm]
    pub length: f64,
    /// 发育阶段
    pub stage: Stage,
}

/// 浮力状态
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuoyancyState {
    /// 卵密度 [g/cm³]
    pub egg_density: f64,
}

/// 补充状态（按补充区编号）
#[derive(Debug, Clone, PartialEq)]
pub struct RecruitmentState {
    recruited: Vec<bool>,
    current_zone: Option<usize>,
    recruit_zone: Option<usize>,
    time_in_zone: f64,
}

impl RecruitmentState {
    /// `zones` 个补充区的空状态
    pub fn new(zones: usize) -> Self {
        Self {
            recruited: vec![false; zones],
            current_zone: None,
            recruit_zone: None,
            time_in_zone: 0.0,
        }
    }

    /// 是否已在该区补充
    pub fn is_recruited_in(&self, zone: usize) -> bool {
        self.recruited.get(zone).copied().unwrap_or(false)
    }

    /// 是否已在任一区补充
    pub fn is_recruited(&self) -> bool {
        self.recruited.iter().any(|r| *r)
    }

    /// 各区补充标志
    pub fn flags(&self) -> &[bool] {
        &self.recruited
    }

    /// 当前所在补充区
    pub fn current_zone(&self) -> Option<usize> {
        self.current_zone
    }

    /// 正在计时的补充区
    pub fn recruit_zone(&self) -> Option<usize> {
        self.recruit_zone
    }

    /// 在计时区内的停留时间 [s]
    pub fn time_in_zone(&self) -> f64 {
        self.time_in_zone
    }

    /// 更新当前所在区
    pub(crate) fn set_current_zone(&mut self, zone: Option<usize>) {
        self.current_zone = zone;
    }

    /// 在 `zone` 内累计停留时间；进入新区时从零开始
    ///
    /// 返回本次是否新达到补充条件。已补充的区不会被重置。
    pub(crate) fn accumulate(&mut self, zone: usize, dt: f64, min_residence: f64) -> bool {
        if self.is_recruited_in(zone) {
            return false;
        }
        self.time_in_zone = if self.recruit_zone == Some(zone) {
            self.time_in_zone + dt
        } else {
            0.0
        };
        self.recruit_zone = Some(zone);
        if self.time_in_zone >= min_residence {
            self.time_in_zone = min_residence;
            if let Some(flag) = self.recruited.get_mut(zone) {
                *flag = true;
                return true;
            }
        }
        false
    }
}

// ============================================================================
// 粒子
// ============================================================================

/// 粒子
#[derive(Debug, Clone)]
pub struct Particle {
    index: usize,
    point: GridPoint,
    age: f64,
    death: DeathCause,
    release_zone: Option<usize>,
    pub(crate) growth: Option<GrowthState>,
    pub(crate) buoyancy: Option<BuoyancyState>,
    pub(crate) recruitment: Option<RecruitmentState>,
    pub(crate) rng: ChaCha8Rng,
}

impl Particle {
    /// 创建存活粒子，年龄为零，不带任何可选能力
    pub fn new(index: usize, point: GridPoint, rng: ChaCha8Rng) -> Self {
        Self {
            index,
            point,
            age: 0.0,
            death: DeathCause::Alive,
            release_zone: None,
            growth: None,
            buoyancy: None,
            recruitment: None,
            rng,
        }
    }

    /// 设置初始年龄 [s]
    pub fn with_age(mut self, age: f64) -> Self {
        self.age = age.max(0.0);
        self
    }

    /// 设置投放区
    pub fn with_release_zone(mut self, zone: Option<usize>) -> Self {
        self.release_zone = zone;
        self
    }

    /// 附加生长能力
    pub fn with_growth(mut self, state: GrowthState) -> Self {
        self.growth = Some(state);
        self
    }

    /// 附加浮力能力
    pub fn with_buoyancy(mut self, state: BuoyancyState) -> Self {
        self.buoyancy = Some(state);
        self
    }

    /// 附加补充能力
    pub fn with_recruitment(mut self, state: RecruitmentState) -> Self {
        self.recruitment = Some(state);
        self
    }

    // ========================================================================
    // 只读访问
    // ========================================================================

    /// 序号
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// 位置
    #[inline]
    pub fn point(&self) -> &GridPoint {
        &self.point
    }

    /// 网格坐标
    #[inline]
    pub fn grid(&self) -> &GridCoord {
        &self.point.grid
    }

    /// 年龄 [s]
    #[inline]
    pub fn age(&self) -> f64 {
        self.age
    }

    /// 是否存活
    #[inline]
    pub fn is_living(&self) -> bool {
        self.death == DeathCause::Alive
    }

    /// 死亡原因
    #[inline]
    pub fn death_cause(&self) -> DeathCause {
        self.death
    }

    /// 投放区
    pub fn release_zone(&self) -> Option<usize> {
        self.release_zone
    }

    /// 生长状态
    pub fn growth(&self) -> Option<&GrowthState> {
        self.growth.as_ref()
    }

    /// 浮力状态
    pub fn buoyancy(&self) -> Option<&BuoyancyState> {
        self.buoyancy.as_ref()
    }

    /// 补充状态
    pub fn recruitment(&self) -> Option<&RecruitmentState> {
        self.recruitment.as_ref()
    }

    /// 体长 [mm]
    pub fn length(&self) -> Option<f64> {
        self.growth.map(|g| g.length)
    }

    /// 发育阶段
    pub fn stage(&self) -> Option<Stage> {
        self.growth.map(|g| g.stage)
    }

    /// 是否已补充
    pub fn is_recruited(&self) -> bool {
        self.recruitment.as_ref().is_some_and(RecruitmentState::is_recruited)
    }

    // ========================================================================
    // 状态变更
    // ========================================================================

    /// 致死；仅第一次调用生效，不改变位置
    pub fn kill(&mut self, cause: DeathCause) {
        if self.is_living() && cause != DeathCause::Alive {
            self.death = cause;
        }
    }

    /// 按网格位移移动（死亡粒子不动）
    pub(crate) fn translate(&mut self, d: &Displacement) {
        if self.is_living() {
            self.point.grid = self.point.grid.translated(d);
        }
    }

    /// 覆盖网格坐标（死亡粒子不动）
    pub(crate) fn set_grid(&mut self, grid: GridCoord) {
        if self.is_living() {
            self.point.grid = grid;
        }
    }

    /// 覆盖垂向索引
    pub(crate) fn set_z(&mut self, z: f64) {
        if self.is_living() && self.point.grid.z.is_some() {
            self.point.grid.z = Some(z);
        }
    }

    /// 网格 → 地理坐标同步
    pub(crate) fn sync_geo(&mut self, grid: &dyn GridProvider) {
        self.point.sync_geo(grid);
    }

    /// 年龄增加 `|dt|`
    pub(crate) fn grow_older(&mut self, dt: f64) {
        self.age += dt.abs();
    }

    /// 只读快照
    pub fn snapshot(&self) -> ParticleSnapshot {
        let geo = &self.point.geo;
        let grid = &self.point.grid;
        let recruitment = self.recruitment.as_ref();
        ParticleSnapshot {
            index: self.index,
            lon: geo.lon,
            lat: geo.lat,
            depth: geo.depth,
            x: grid.x,
            y: grid.y,
            z: grid.z,
            age: self.age,
            living: self.is_living(),
            death_cause: self.death,
            length: self.length(),
            stage: self.stage(),
            release_zone: crate::zone::release_zone_number(self.release_zone),
            recruitment_zone: crate::zone::recruitment_zone_number(recruitment.and_then(|r| r.current_zone())),
            recruited: recruitment.map(|r| r.flags().to_vec()).unwrap_or_default(),
        }
    }
}

/// 输出用的粒子快照
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticleSnapshot {
    /// 序号
    pub index: usize,
    /// 经度
    pub lon: f64,
    /// 纬度
    pub lat: f64,
    /// 深度 [m]
    pub depth: Option<f64>,
    /// 网格 x
    pub x: f64,
    /// 网格 y
    pub y: f64,
    /// 网格 z
    pub z: Option<f64>,
    /// 年龄 [s]
    pub age: f64,
    /// 是否存活
    pub living: bool,
    /// 死亡原因
    pub death_cause: DeathCause,
    /// 体长 [mm]
    pub length: Option<f64>,
    /// 发育阶段
    pub stage: Option<Stage>,
    /// 投放区编号（1..N，0 表示无）
    pub release_zone: i32,
    /// 当前补充区编号（-1..-M，0 表示无）
    pub recruitment_zone: i32,
    /// 各补充区的补充标志
    pub recruited: Vec<bool>,
}
