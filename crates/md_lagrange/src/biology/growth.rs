// crates/md_lagrange/src/biology/growth.rs

//! 生长
//!
//! 体长日增量 `c1 + c2·max(T, T_min)` [mm/天]，按 `|dt|` 折算。
//! 饵料限制模型中，摄食仔鱼的增量再乘以 `F/(Ks + F)`，`F` 为各饵料变量的平均值。
//! 发育阶段由体长决定，且不回退。

use md_config::{GrowthConfig, GrowthModel};
use md_grid::names;

use crate::clock::ONE_DAY;
use crate::context::StepContext;
use crate::particle::{GrowthState, Particle, Stage};
use crate::pipeline::{ActionKind, ParticleAction};

/// 体长对应的发育阶段
pub fn stage_for(length: f64, hatch_length: f64, feeding_length: f64) -> Stage {
    if length < hatch_length {
        Stage::Egg
    } else if length < feeding_length {
        Stage::YolkSacLarva
    } else {
        Stage::FeedingLarva
    }
}

/// 生长过程
#[derive(Debug, Clone)]
pub struct GrowthAction {
    model: GrowthModel,
    c1: f64,
    c2: f64,
    temperature_threshold: f64,
    initial_length: f64,
    hatch_length: f64,
    feeding_length: f64,
    half_saturation: f64,
    food_fields: Vec<String>,
}

impl GrowthAction {
    /// 创建
    pub fn new(cfg: &GrowthConfig) -> Self {
        Self {
            model: cfg.model,
            c1: cfg.c1,
            c2: cfg.c2,
            temperature_threshold: cfg.temperature_threshold,
            initial_length: cfg.initial_length,
            hatch_length: cfg.hatch_length,
            feeding_length: cfg.yolk_to_feeding_length,
            half_saturation: cfg.half_saturation,
            food_fields: cfg.food_fields.clone(),
        }
    }

    /// 日增长量 [mm/天]
    pub fn daily_rate(&self, temp: f64) -> f64 {
        self.c1 + self.c2 * temp.max(self.temperature_threshold)
    }

    /// 饵料限制系数，无有效饵料值时为 0
    fn food_factor(&self, ctx: &StepContext<'_>, particle: &Particle) -> f64 {
        let p = particle.grid();
        let (sum, n) = self
            .food_fields
            .iter()
            .map(|name| ctx.grid.sample(name, p, ctx.time))
            .filter(|v| v.is_finite())
            .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
        if n == 0 {
            return 0.0;
        }
        let food = (sum / n as f64).max(0.0);
        food / (self.half_saturation + food)
    }
}

impl ParticleAction for GrowthAction {
    fn kind(&self) -> ActionKind {
        ActionKind::Growth
    }

    fn required_fields(&self) -> Vec<String> {
        let mut fields = vec![names::TEMP.to_string()];
        if self.model == GrowthModel::FoodLimited {
            fields.extend(self.food_fields.iter().cloned());
        }
        fields
    }

    fn init_particle(&self, particle: &mut Particle) {
        particle.growth = Some(GrowthState {
            length: self.initial_length,
            stage: stage_for(self.initial_length, self.hatch_length, self.feeding_length),
        });
    }

    fn execute(&self, particle: &mut Particle, ctx: &StepContext<'_>) {
        let Some(state) = particle.growth else {
            return;
        };
        let temp = ctx.grid.sample(names::TEMP, particle.grid(), ctx.time);
        if temp.is_nan() {
            return;
        }

        let mut dl = self.daily_rate(temp) * ctx.dt.abs() / ONE_DAY;
        if self.model == GrowthModel::FoodLimited && state.stage == Stage::FeedingLarva {
            dl *= self.food_factor(ctx, particle);
        }

        let length = state.length + dl;
        let stage = state
            .stage
            .max(stage_for(length, self.hatch_length, self.feeding_length));
        particle.growth = Some(GrowthState { length, stage });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::particle_rng;
    use crate::zone::ZoneSet;
    use md_grid::{Dataset, GridCoord, GridPoint, RectilinearBuilder, Staggering};

    fn dataset(temp: f64, food: f64) -> Dataset {
        let mut ds = RectilinearBuilder::new(8, 8)
            .records(0.0, 1e7, 2)
            .uniform(names::TEMP, Staggering::Rho, temp)
            .uniform("lphy", Staggering::Rho, food)
            .build()
            .unwrap();
        ds.require(names::TEMP).unwrap();
        ds.require("lphy").unwrap();
        ds.setup(0.0, false).unwrap();
        ds
    }

    fn particle(ds: &Dataset) -> Particle {
        Particle::new(0, GridPoint::from_grid(GridCoord::new_2d(3.0, 3.0), ds), particle_rng(0, 0))
    }

    #[test]
    fn test_stage_thresholds() {
        assert_eq!(stage_for(1.0, 2.8, 4.5), Stage::Egg);
        assert_eq!(stage_for(2.8, 2.8, 4.5), Stage::YolkSacLarva);
        assert_eq!(stage_for(4.5, 2.8, 4.5), Stage::FeedingLarva);
    }

    #[test]
    fn test_one_day_linear_growth() {
        let ds = dataset(20.0, 0.0);
        let zones = ZoneSet::default();
        let action = GrowthAction::new(&GrowthConfig::default());
        let mut p = particle(&ds);
        action.init_particle(&mut p);
        assert_eq!(p.stage(), Some(Stage::Egg));

        action.execute(&mut p, &StepContext::new(&ds, &zones, 0.0, ONE_DAY, 1e9));
        // 0.025 + 0.02 + 0.03·20
        assert!((p.length().unwrap() - 0.645).abs() < 1e-12);
    }

    #[test]
    fn test_cold_water_uses_threshold() {
        let ds = dataset(2.0, 0.0);
        let zones = ZoneSet::default();
        let action = GrowthAction::new(&GrowthConfig::default());
        let mut p = particle(&ds);
        action.init_particle(&mut p);
        action.execute(&mut p, &StepContext::new(&ds, &zones, 0.0, -ONE_DAY, 1e9));
        assert!((p.length().unwrap() - (0.025 + 0.02 + 0.3)).abs() < 1e-12);
    }

    #[test]
    fn test_stage_never_regresses() {
        let ds = dataset(20.0, 0.0);
        let zones = ZoneSet::default();
        let action = GrowthAction::new(&GrowthConfig::default());
        let mut p = particle(&ds).with_growth(GrowthState { length: 1.0, stage: Stage::FeedingLarva });
        action.execute(&mut p, &StepContext::new(&ds, &zones, 0.0, 60.0, 1e9));
        assert_eq!(p.stage(), Some(Stage::FeedingLarva));
    }

    #[test]
    fn test_food_limitation_for_feeding_larva() {
        let ds = dataset(20.0, 0.5);
        let zones = ZoneSet::default();
        let cfg = GrowthConfig {
            model: GrowthModel::FoodLimited,
            food_fields: vec!["lphy".into()],
            ..GrowthConfig::default()
        };
        let action = GrowthAction::new(&cfg);
        assert!(action.required_fields().contains(&"lphy".to_string()));

        let mut p = particle(&ds).with_growth(GrowthState { length: 5.0, stage: Stage::FeedingLarva });
        action.execute(&mut p, &StepContext::new(&ds, &zones, 0.0, ONE_DAY, 1e9));
        // F/(Ks+F) = 0.5
        assert!((p.length().unwrap() - (5.0 + 0.62 * 0.5)).abs() < 1e-12);

        let mut egg = particle(&ds).with_growth(GrowthState { length: 1.0, stage: Stage::Egg });
        action.execute(&mut egg, &StepContext::new(&ds, &zones, 0.0, ONE_DAY, 1e9));
        assert!((egg.length().unwrap() - 1.62).abs() < 1e-12);
    }
}
