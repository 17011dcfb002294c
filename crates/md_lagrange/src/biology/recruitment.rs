// crates/md_lagrange/src/biology/recruitment.rs

//! 补充
//!
//! 满足年龄或体长条件的粒子在同一补充区内连续停留达到最短时间后，
//! 记为在该区补充。每个区的补充标志一经置位不再清除。

use md_config::{RecruitmentConfig, RecruitmentCriterion, ZoneKind};
use tracing::trace;

use crate::clock::ONE_DAY;
use crate::context::StepContext;
use crate::particle::{Particle, RecruitmentState};
use crate::pipeline::{ActionKind, ParticleAction};

/// 补充过程
#[derive(Debug, Clone)]
pub struct RecruitmentAction {
    criterion: RecruitmentCriterion,
    threshold: f64,
    min_residence: f64,
    depth_range: Option<[f64; 2]>,
    zone_count: usize,
}

impl RecruitmentAction {
    /// 创建，`zone_count` 为补充区数量
    pub fn new(cfg: &RecruitmentConfig, zone_count: usize) -> Self {
        Self {
            criterion: cfg.criterion,
            threshold: cfg.threshold,
            min_residence: cfg.min_residence_days * ONE_DAY,
            depth_range: cfg.depth_range,
            zone_count,
        }
    }

    fn is_eligible(&self, particle: &Particle) -> bool {
        match self.criterion {
            RecruitmentCriterion::Age => particle.age() / ONE_DAY >= self.threshold,
            RecruitmentCriterion::Length => particle.length().is_some_and(|l| l >= self.threshold),
        }
    }

    fn in_depth_range(&self, depth: Option<f64>) -> bool {
        match (self.depth_range, depth) {
            (Some([lo, hi]), Some(d)) => d >= lo && d <= hi,
            _ => true,
        }
    }
}

impl ParticleAction for RecruitmentAction {
    fn kind(&self) -> ActionKind {
        ActionKind::Recruitment
    }

    fn required_fields(&self) -> Vec<String> {
        Vec::new()
    }

    fn init_particle(&self, particle: &mut Particle) {
        particle.recruitment = Some(RecruitmentState::new(self.zone_count));
    }

    fn execute(&self, particle: &mut Particle, ctx: &StepContext<'_>) {
        let depth = particle.point().geo.depth;
        let current = if self.in_depth_range(depth) {
            ctx.zones.locate(ZoneKind::Recruitment, particle.grid(), depth)
        } else {
            None
        };
        let eligible = self.is_eligible(particle);
        let index = particle.index();

        let Some(state) = particle.recruitment.as_mut() else {
            return;
        };
        state.set_current_zone(current);
        if let (Some(zone), true) = (current, eligible) {
            if state.accumulate(zone, ctx.dt.abs(), self.min_residence) {
                trace!(particle = index, zone, "补充");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::GrowthState;
    use crate::particle::Stage;
    use crate::rng::particle_rng;
    use crate::zone::{Zone, ZoneSet};
    use glam::DVec2;
    use md_grid::{Dataset, GridCoord, GridPoint, RectilinearBuilder};

    fn zones() -> ZoneSet {
        let square = |x0: f64| {
            vec![
                DVec2::new(x0, 2.0),
                DVec2::new(x0 + 2.0, 2.0),
                DVec2::new(x0 + 2.0, 4.0),
                DVec2::new(x0, 4.0),
            ]
        };
        let mut set = ZoneSet::default();
        set.push(Zone::new(ZoneKind::Recruitment, 0, "a", square(1.0), None).unwrap());
        set.push(Zone::new(ZoneKind::Recruitment, 1, "b", square(5.0), None).unwrap());
        set
    }

    fn particle_at(ds: &Dataset, x: f64, age_days: f64) -> Particle {
        Particle::new(0, GridPoint::from_grid(GridCoord::new_2d(x, 3.0), ds), particle_rng(0, 0))
            .with_age(age_days * ONE_DAY)
    }

    fn action(min_residence_days: f64) -> RecruitmentAction {
        RecruitmentAction::new(
            &RecruitmentConfig {
                criterion: RecruitmentCriterion::Age,
                threshold: 1.0,
                min_residence_days,
                stop_moving: true,
                depth_range: None,
            },
            2,
        )
    }

    #[test]
    fn test_recruited_after_residence() {
        let ds = RectilinearBuilder::new(10, 10).build().unwrap();
        let zones = zones();
        let a = action(0.5);
        let mut p = particle_at(&ds, 2.0, 2.0);
        a.init_particle(&mut p);

        let dt = 0.25 * ONE_DAY;
        let ctx = StepContext::new(&ds, &zones, 0.0, dt, 1e9);
        a.execute(&mut p, &ctx);
        assert!(!p.is_recruited());
        a.execute(&mut p, &ctx);
        assert!(!p.is_recruited());
        a.execute(&mut p, &ctx);
        assert!(p.is_recruited());
        let state = p.recruitment().unwrap();
        assert!(state.is_recruited_in(0) && !state.is_recruited_in(1));
        assert_eq!(state.current_zone(), Some(0));
    }

    #[test]
    fn test_too_young_not_recruited() {
        let ds = RectilinearBuilder::new(10, 10).build().unwrap();
        let zones = zones();
        let a = action(0.0);
        let mut p = particle_at(&ds, 2.0, 0.5);
        a.init_particle(&mut p);
        a.execute(&mut p, &StepContext::new(&ds, &zones, 0.0, 60.0, 1e9));
        assert!(!p.is_recruited());
        assert_eq!(p.recruitment().unwrap().current_zone(), Some(0));
    }

    #[test]
    fn test_zero_residence_recruits_immediately() {
        let ds = RectilinearBuilder::new(10, 10).build().unwrap();
        let zones = zones();
        let a = action(0.0);
        let mut p = particle_at(&ds, 6.0, 3.0);
        a.init_particle(&mut p);
        a.execute(&mut p, &StepContext::new(&ds, &zones, 0.0, 60.0, 1e9));
        assert!(p.recruitment().unwrap().is_recruited_in(1));
    }

    #[test]
    fn test_length_criterion() {
        let ds = RectilinearBuilder::new(10, 10).build().unwrap();
        let zones = zones();
        let a = RecruitmentAction::new(
            &RecruitmentConfig {
                criterion: RecruitmentCriterion::Length,
                threshold: 10.0,
                ..RecruitmentConfig::default()
            },
            2,
        );
        let ctx = StepContext::new(&ds, &zones, 0.0, 60.0, 1e9);

        let mut small = particle_at(&ds, 2.0, 0.0).with_growth(GrowthState { length: 5.0, stage: Stage::FeedingLarva });
        a.init_particle(&mut small);
        a.execute(&mut small, &ctx);
        assert!(!small.is_recruited());

        let mut big = particle_at(&ds, 2.0, 0.0).with_growth(GrowthState { length: 12.0, stage: Stage::FeedingLarva });
        a.init_particle(&mut big);
        a.execute(&mut big, &ctx);
        assert!(big.is_recruited());
    }
}
