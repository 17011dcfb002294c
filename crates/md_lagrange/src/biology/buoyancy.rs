// crates/md_lagrange/src/biology/buoyancy.rs

//! 卵的浮力
//!
//! 海水密度采用 UNESCO (1981) 状态方程的常压形式，卵视为长椭球，
//! 垂向速度按 Stokes 公式计算。仅作用于卵期粒子，仅三维。

use md_config::BuoyancyConfig;
use md_grid::names;

use super::{is_egg, move_to_depth};
use crate::context::StepContext;
use crate::particle::{BuoyancyState, Particle};
use crate::pipeline::{ActionKind, ParticleAction};

// UNESCO 状态方程系数
const C1: f64 = 4.8314e-4;
const C2: f64 = 6.536332e-9;
const C3: f64 = 1.120083e-6;
const C4: f64 = 1.001685e-4;
const C5: f64 = 9.095290e-3;
const C6: f64 = 6.793952e-2;
const C7: f64 = 28.263737;
const C8: f64 = 5.3875e-9;
const C9: f64 = 8.2467e-7;
const C10: f64 = 7.6438e-5;
const C11: f64 = 4.0899e-3;
const C12: f64 = 8.24493e-1;
const C13: f64 = 1.6546e-6;
const C14: f64 = 1.0227e-4;
const C15: f64 = 5.72466e-3;
const DR350: f64 = 28.106331;

/// 重力加速度 [cm/s²]
const GRAVITY: f64 = 980.0;
/// 卵短半轴 [cm]
const MINOR_AXIS: f64 = 0.05;
/// 卵长半轴 [cm]
const MAJOR_AXIS: f64 = 0.14;
/// 运动粘度 [cm²/s]
const VISCOSITY: f64 = 0.01;

/// 常压海水密度 [g/cm³]
///
/// * `temp` - 温度 [°C]
/// * `salt` - 盐度 [PSU]
pub fn seawater_density(temp: f64, salt: f64) -> f64 {
    let t = temp;
    let r1 = ((((C2 * t - C3) * t + C4) * t - C5) * t + C6) * t - C7;
    let r2 = (((C8 * t - C9) * t + C10) * t - C11) * t + C12;
    let r3 = (-C13 * t + C14) * t - C15;
    let sigma = (C1 * salt + r3 * salt.abs().sqrt() + r2) * salt + r1;
    (1000.0 + sigma + DR350) / 1000.0
}

/// 卵的垂向速度 [m/s]，正值向上
pub fn settling_velocity(water_density: f64, egg_density: f64) -> f64 {
    let shape = (2.0 * MAJOR_AXIS / MINOR_AXIS).ln() + 0.5;
    GRAVITY * MINOR_AXIS * MINOR_AXIS / (24.0 * VISCOSITY * water_density)
        * shape
        * (water_density - egg_density)
        / 100.0
}

/// 浮力过程
#[derive(Debug, Clone)]
pub struct BuoyancyAction {
    egg_density: f64,
    egg_age_limit: f64,
}

impl BuoyancyAction {
    /// 创建，`egg_age_limit` 为未启用生长时的卵期上限 [s]
    pub fn new(cfg: &BuoyancyConfig, egg_age_limit: f64) -> Self {
        Self {
            egg_density: cfg.egg_density,
            egg_age_limit,
        }
    }
}

impl ParticleAction for BuoyancyAction {
    fn kind(&self) -> ActionKind {
        ActionKind::Buoyancy
    }

    fn required_fields(&self) -> Vec<String> {
        vec![names::TEMP.to_string(), names::SALT.to_string()]
    }

    fn init_particle(&self, particle: &mut Particle) {
        particle.buoyancy = Some(BuoyancyState {
            egg_density: self.egg_density,
        });
    }

    fn execute(&self, particle: &mut Particle, ctx: &StepContext<'_>) {
        if !is_egg(particle, self.egg_age_limit) {
            return;
        }
        let Some(state) = particle.buoyancy else {
            return;
        };
        let p = *particle.grid();
        let Some(z) = p.z else {
            return;
        };

        let temp = ctx.grid.sample(names::TEMP, &p, ctx.time);
        let salt = ctx.grid.sample(names::SALT, &p, ctx.time);
        if temp.is_nan() || salt.is_nan() {
            return;
        }

        let w = settling_velocity(seawater_density(temp, salt), state.egg_density);
        let depth = ctx.grid.z_to_depth(p.x, p.y, z) + w * ctx.dt;
        move_to_depth(particle, ctx.grid, depth);
    }
}
