// crates/md_lagrange/src/biology/migration.rs

//! 昼夜垂直迁移
//!
//! 仔鱼在白天停留于较深的水层，夜间上升。目标深度不低于底床。仅三维。

use md_config::{DielPattern, MigrationConfig};

use super::move_to_depth;
use crate::clock::ONE_DAY;
use crate::context::StepContext;
use crate::particle::{Particle, Stage};
use crate::pipeline::{ActionKind, ParticleAction};

/// 一天中某时刻的目标深度 [m]
pub fn target_depth(cfg: &MigrationConfig, seconds_of_day: f64) -> f64 {
    let sunrise = cfg.sunrise_hour * 3600.0;
    let sunset = cfg.sunset_hour * 3600.0;
    match cfg.pattern {
        DielPattern::Step => {
            if seconds_of_day >= sunrise && seconds_of_day < sunset {
                cfg.day_depth
            } else {
                cfg.night_depth
            }
        }
        DielPattern::Sinusoidal => {
            let noon = 0.5 * (sunrise + sunset);
            let mid = 0.5 * (cfg.day_depth + cfg.night_depth);
            let amp = 0.5 * (cfg.day_depth - cfg.night_depth);
            mid + amp * (2.0 * std::f64::consts::PI * (seconds_of_day - noon) / ONE_DAY).cos()
        }
    }
}

/// 垂直迁移过程
#[derive(Debug, Clone)]
pub struct MigrationAction {
    cfg: MigrationConfig,
}

impl MigrationAction {
    /// 创建
    pub fn new(cfg: &MigrationConfig) -> Self {
        Self { cfg: cfg.clone() }
    }

    fn is_migrating(&self, particle: &Particle) -> bool {
        match particle.stage() {
            Some(stage) => stage > Stage::Egg,
            None => particle.age() >= self.cfg.age_min_days * ONE_DAY,
        }
    }
}

impl ParticleAction for MigrationAction {
    fn kind(&self) -> ActionKind {
        ActionKind::Migration
    }

    fn required_fields(&self) -> Vec<String> {
        Vec::new()
    }

    fn execute(&self, particle: &mut Particle, ctx: &StepContext<'_>) {
        if !self.is_migrating(particle) {
            return;
        }
        let p = *particle.grid();
        let bottom = ctx.grid.bottom_depth(p.x, p.y);
        let mut depth = target_depth(&self.cfg, ctx.seconds_of_day);
        if bottom.is_finite() {
            depth = depth.max(bottom);
        }
        move_to_depth(particle, ctx.grid, depth);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::GrowthState;
    use crate::rng::particle_rng;
    use crate::zone::ZoneSet;
    use md_grid::{GridCoord, GridPoint, GridProvider, RectilinearBuilder};

    #[test]
    fn test_step_pattern() {
        let cfg = MigrationConfig::default();
        assert!((target_depth(&cfg, 12.0 * 3600.0) + 40.0).abs() < 1e-12);
        assert!((target_depth(&cfg, 6.0 * 3600.0) + 40.0).abs() < 1e-12);
        assert!((target_depth(&cfg, 18.0 * 3600.0) + 10.0).abs() < 1e-12);
        assert!((target_depth(&cfg, 2.0 * 3600.0) + 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_sinusoidal_pattern() {
        let cfg = MigrationConfig {
            pattern: DielPattern::Sinusoidal,
            ..MigrationConfig::default()
        };
        assert!((target_depth(&cfg, 12.0 * 3600.0) + 40.0).abs() < 1e-12);
        assert!((target_depth(&cfg, 0.0) + 10.0).abs() < 1e-12);
        assert!((target_depth(&cfg, 6.0 * 3600.0) + 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_target_limited_by_bottom() {
        let ds = RectilinearBuilder::new(8, 8).layers(10).depth(20.0).build().unwrap();
        let zones = ZoneSet::default();
        let action = MigrationAction::new(&MigrationConfig::default());
        let mut p = Particle::new(0, GridPoint::from_grid(GridCoord::new_3d(3.0, 3.0, 9.0), &ds), particle_rng(0, 0));
        let ctx = StepContext::new(&ds, &zones, 12.0 * 3600.0, 60.0, 1e9);
        action.execute(&mut p, &ctx);
        // 底床 -20 m 比最深层中心 (-19 m) 更深，落到 z = 0
        assert_eq!(p.grid().z, Some(0.0));

        let night = StepContext::new(&ds, &zones, 0.0, 60.0, 1e9);
        action.execute(&mut p, &night);
        let depth = ds.z_to_depth(3.0, 3.0, p.grid().z.unwrap());
        assert!((depth + 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_eggs_do_not_migrate() {
        let ds = RectilinearBuilder::new(8, 8).layers(10).depth(100.0).build().unwrap();
        let zones = ZoneSet::default();
        let action = MigrationAction::new(&MigrationConfig::default());
        let mut p = Particle::new(0, GridPoint::from_grid(GridCoord::new_3d(3.0, 3.0, 5.0), &ds), particle_rng(0, 0))
            .with_growth(GrowthState { length: 1.0, stage: Stage::Egg });
        action.execute(&mut p, &StepContext::new(&ds, &zones, 12.0 * 3600.0, 60.0, 1e9));
        assert_eq!(p.grid().z, Some(5.0));
    }
}
