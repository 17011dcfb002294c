// crates/md_lagrange/src/clock.rs

//! 模拟时钟
//!
//! 时刻由步数推算（`t0 + n·dt`），不做浮点累加；`dt` 为带符号的定步长。

use chrono::{Duration, NaiveDateTime, Timelike};

use md_config::TimeConfig;

/// 一天的秒数
pub const ONE_DAY: f64 = 86_400.0;

/// 模拟时钟
#[derive(Debug, Clone)]
pub struct SimulationClock {
    t0: f64,
    dt: f64,
    duration: f64,
    transport_duration: f64,
    origin: Option<NaiveDateTime>,
    step: u64,
}

impl SimulationClock {
    /// 由时间配置创建
    pub fn from_config(cfg: &TimeConfig) -> Self {
        Self {
            t0: cfg.t0,
            dt: cfg.dt,
            duration: cfg.simulation_duration,
            transport_duration: cfg.transport_duration,
            origin: cfg.origin,
            step: 0,
        }
    }

    /// 当前时刻 [s]
    #[inline]
    pub fn time(&self) -> f64 {
        self.t0 + self.step as f64 * self.dt
    }

    /// 起始时刻 [s]
    #[inline]
    pub fn t0(&self) -> f64 {
        self.t0
    }

    /// 带符号的时间步长 [s]
    #[inline]
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// 已完成的步数
    #[inline]
    pub fn step_index(&self) -> u64 {
        self.step
    }

    /// 是否逆向
    #[inline]
    pub fn is_backward(&self) -> bool {
        self.dt < 0.0
    }

    /// 粒子最大输运时长 [s]
    #[inline]
    pub fn transport_duration(&self) -> f64 {
        self.transport_duration
    }

    /// 是否还有下一步
    pub fn has_next_step(&self) -> bool {
        (self.step as f64) * self.dt.abs() < self.duration
    }

    /// 总步数
    pub fn total_steps(&self) -> u64 {
        (self.duration / self.dt.abs()).ceil() as u64
    }

    /// 前进一步
    pub fn advance(&mut self) {
        self.step += 1;
    }

    /// 时刻对应的日历时间，未设置起点时返回 `None`
    pub fn calendar(&self, time: f64) -> Option<NaiveDateTime> {
        let origin = self.origin?;
        let ms = (time * 1000.0).round();
        if !ms.is_finite() {
            return None;
        }
        origin.checked_add_signed(Duration::milliseconds(ms as i64))
    }

    /// 一天内的秒数 [0, 86400)
    ///
    /// 设置了日历起点时按日历计算，否则取 `time mod 86400`。
    pub fn seconds_of_day(&self, time: f64) -> f64 {
        match self.calendar(time) {
            Some(dt) => dt.num_seconds_from_midnight() as f64 + dt.nanosecond() as f64 * 1e-9,
            None => time.rem_euclid(ONE_DAY),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn config(dt: f64, duration: f64) -> TimeConfig {
        TimeConfig {
            t0: 1000.0,
            dt,
            simulation_duration: duration,
            transport_duration: duration,
            origin: None,
        }
    }

    #[test]
    fn test_step_count_forward_and_backward() {
        let mut clock = SimulationClock::from_config(&config(10.0, 35.0));
        let mut n = 0;
        while clock.has_next_step() {
            clock.advance();
            n += 1;
        }
        assert_eq!(n, 4);
        assert_eq!(clock.total_steps(), 4);
        assert!((clock.time() - 1040.0).abs() < 1e-12);

        let mut back = SimulationClock::from_config(&config(-10.0, 30.0));
        back.advance();
        assert!((back.time() - 990.0).abs() < 1e-12);
        assert!(back.is_backward());
    }

    #[test]
    fn test_seconds_of_day_without_origin() {
        let clock = SimulationClock::from_config(&config(1.0, 1.0));
        assert!((clock.seconds_of_day(86_400.0 + 3600.0) - 3600.0).abs() < 1e-9);
        assert!((clock.seconds_of_day(-3600.0) - 82_800.0).abs() < 1e-9);
    }

    #[test]
    fn test_seconds_of_day_with_origin() {
        let mut cfg = config(1.0, 1.0);
        cfg.origin = NaiveDate::from_ymd_opt(2020, 1, 1).and_then(|d| d.and_hms_opt(22, 0, 0));
        let clock = SimulationClock::from_config(&cfg);
        // 22:00 + 3 h = 01:00
        assert!((clock.seconds_of_day(3.0 * 3600.0) - 3600.0).abs() < 1e-9);
        let cal = clock.calendar(3.0 * 3600.0).unwrap();
        assert_eq!(cal.date(), NaiveDate::from_ymd_opt(2020, 1, 2).unwrap());
    }
}
