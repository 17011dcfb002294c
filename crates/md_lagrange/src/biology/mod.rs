// crates/md_lagrange/src/biology/mod.rs

//! 生物过程
//!
//! - [`buoyancy`]: 卵的浮力（UNESCO 海水密度 + Stokes 沉降）
//! - [`growth`]: 温度依赖生长与发育阶段
//! - [`migration`]: 昼夜垂直迁移
//! - [`mortality`]: 致死温度
//! - [`recruitment`]: 补充区停留判定
//!
//! 卵期判定：启用生长时看发育阶段，否则看年龄是否小于卵期上限。

pub mod buoyancy;
pub mod growth;
pub mod migration;
pub mod mortality;
pub mod recruitment;

pub use buoyancy::{seawater_density, settling_velocity, BuoyancyAction};
pub use growth::{stage_for, GrowthAction};
pub use migration::{target_depth, MigrationAction};
pub use mortality::LethalTemperatureAction;
pub use recruitment::RecruitmentAction;

use crate::particle::{Particle, Stage};

/// 粒子是否处于卵期
///
/// `egg_age_limit` 为未启用生长时的卵期上限 [s]。
pub fn is_egg(particle: &Particle, egg_age_limit: f64) -> bool {
    match particle.stage() {
        Some(stage) => stage == Stage::Egg,
        None => particle.age() < egg_age_limit,
    }
}

/// 把垂向索引写回粒子，限制在 [0, nz-1]；无效值忽略
pub(crate) fn move_to_depth(particle: &mut Particle, grid: &dyn md_grid::GridProvider, depth: f64) {
    let (Some(nz), Some(_)) = (grid.nz(), particle.grid().z) else {
        return;
    };
    let p = *particle.grid();
    let z = grid.depth_to_z(p.x, p.y, depth);
    if z.is_finite() {
        particle.set_z(z.clamp(0.0, (nz - 1) as f64));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::GrowthState;
    use crate::rng::particle_rng;
    use md_grid::{GridCoord, GridPoint, RectilinearBuilder};

    #[test]
    fn test_is_egg_by_age_or_stage() {
        let ds = RectilinearBuilder::new(6, 6).build().unwrap();
        let point = GridPoint::from_grid(GridCoord::new_2d(2.0, 2.0), &ds);
        let p = Particle::new(0, point, particle_rng(0, 0)).with_age(100.0);
        assert!(is_egg(&p, 200.0));
        assert!(!is_egg(&p, 50.0));

        let larva = p.with_growth(GrowthState { length: 3.0, stage: Stage::YolkSacLarva });
        assert!(!is_egg(&larva, 1e9));
    }
}
