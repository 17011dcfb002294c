// crates/md_lagrange/src/context.rs

//! 单步上下文
//!
//! 每个时间步构造一次，以只读引用传入所有过程，替代粒子对全局管理器的反向引用。

use md_grid::GridProvider;

use crate::zone::ZoneSet;

/// 单步只读上下文
#[derive(Clone, Copy)]
pub struct StepContext<'a> {
    /// 网格与环境场
    pub grid: &'a dyn GridProvider,
    /// 区域
    pub zones: &'a ZoneSet,
    /// 本步起始时刻 [s]
    pub time: f64,
    /// 带符号的时间步长 [s]
    pub dt: f64,
    /// 本步起始时刻在一天内的秒数
    pub seconds_of_day: f64,
    /// 粒子最大输运时长 [s]
    pub transport_duration: f64,
}

impl<'a> StepContext<'a> {
    /// 创建上下文，一天内秒数按 `time mod 86400` 计算
    pub fn new(grid: &'a dyn GridProvider, zones: &'a ZoneSet, time: f64, dt: f64, transport_duration: f64) -> Self {
        Self {
            grid,
            zones,
            time,
            dt,
            seconds_of_day: time.rem_euclid(crate::clock::ONE_DAY),
            transport_duration,
        }
    }

    /// 覆盖一天内秒数（由日历时钟给出）
    pub fn with_seconds_of_day(mut self, sod: f64) -> Self {
        self.seconds_of_day = sod;
        self
    }

    /// 是否三维
    #[inline]
    pub fn is_3d(&self) -> bool {
        self.grid.is_3d()
    }
}

impl std::fmt::Debug for StepContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepContext")
            .field("time", &self.time)
            .field("dt", &self.dt)
            .field("seconds_of_day", &self.seconds_of_day)
            .finish()
    }
}
