// crates/md_lagrange/src/biology/mortality.rs

//! 致死温度
//!
//! 卵与仔鱼各有一组低温/高温阈值，达到阈值即死亡。温度缺测时不判定。

use md_config::LethalTemperatureConfig;
use md_grid::names;

use super::is_egg;
use crate::context::StepContext;
use crate::particle::{DeathCause, Particle};
use crate::pipeline::{ActionKind, ParticleAction};

/// 致死温度过程
#[derive(Debug, Clone)]
pub struct LethalTemperatureAction {
    cfg: LethalTemperatureConfig,
    egg_age_limit: f64,
}

impl LethalTemperatureAction {
    /// 创建
    pub fn new(cfg: &LethalTemperatureConfig, egg_age_limit: f64) -> Self {
        Self {
            cfg: cfg.clone(),
            egg_age_limit,
        }
    }

    /// 判定温度是否致死
    pub fn verdict(&self, temp: f64, egg: bool) -> Option<DeathCause> {
        if temp.is_nan() {
            return None;
        }
        let (cold, hot) = if egg {
            (self.cfg.egg_cold, self.cfg.egg_hot)
        } else {
            (self.cfg.larva_cold, self.cfg.larva_hot)
        };
        if cold.is_some_and(|c| temp <= c) {
            Some(DeathCause::Cold)
        } else if hot.is_some_and(|h| temp >= h) {
            Some(DeathCause::Hot)
        } else {
            None
        }
    }
}

impl ParticleAction for LethalTemperatureAction {
    fn kind(&self) -> ActionKind {
        ActionKind::LethalTemperature
    }

    fn required_fields(&self) -> Vec<String> {
        vec![names::TEMP.to_string()]
    }

    fn execute(&self, particle: &mut Particle, ctx: &StepContext<'_>) {
        let temp = ctx.grid.sample(names::TEMP, particle.grid(), ctx.time);
        if let Some(cause) = self.verdict(temp, is_egg(particle, self.egg_age_limit)) {
            particle.kill(cause);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::particle_rng;
    use crate::zone::ZoneSet;
    use md_grid::{GridCoord, GridPoint, RectilinearBuilder, Staggering};

    fn action() -> LethalTemperatureAction {
        LethalTemperatureAction::new(
            &LethalTemperatureConfig {
                egg_cold: Some(5.0),
                egg_hot: Some(25.0),
                larva_cold: Some(8.0),
                larva_hot: None,
            },
            86_400.0,
        )
    }

    #[test]
    fn test_thresholds_inclusive() {
        let a = action();
        assert_eq!(a.verdict(5.0, true), Some(DeathCause::Cold));
        assert_eq!(a.verdict(25.0, true), Some(DeathCause::Hot));
        assert_eq!(a.verdict(6.0, true), None);
        assert_eq!(a.verdict(6.0, false), Some(DeathCause::Cold));
        assert_eq!(a.verdict(40.0, false), None);
        assert_eq!(a.verdict(f64::NAN, true), None);
    }

    #[test]
    fn test_kills_by_sampled_temperature() {
        let mut ds = RectilinearBuilder::new(8, 8)
            .uniform(names::TEMP, Staggering::Rho, 30.0)
            .build()
            .unwrap();
        ds.require(names::TEMP).unwrap();
        ds.setup(0.0, false).unwrap();
        let zones = ZoneSet::default();

        let mut egg = Particle::new(0, GridPoint::from_grid(GridCoord::new_2d(3.0, 3.0), &ds), particle_rng(0, 0));
        action().execute(&mut egg, &StepContext::new(&ds, &zones, 0.0, 60.0, 1e9));
        assert_eq!(egg.death_cause(), DeathCause::Hot);

        let mut larva = Particle::new(1, GridPoint::from_grid(GridCoord::new_2d(3.0, 3.0), &ds), particle_rng(0, 1))
            .with_age(2.0 * 86_400.0);
        action().execute(&mut larva, &StepContext::new(&ds, &zones, 0.0, 60.0, 1e9));
        assert!(larva.is_living());
    }
}
