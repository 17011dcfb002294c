// crates/md_lagrange/tests/pipeline_ordering.rs

//! 过程管线顺序测试
//!
//! 年龄检查先于平流，计算域检查先于生物过程，锁定的已补充粒子整步跳过。

use glam::DVec2;
use md_config::{
    AdvectionScheme, CoastlineBehavior, LethalTemperatureConfig, RecruitmentConfig,
    RecruitmentCriterion, SimulationConfig, ZoneKind,
};
use md_grid::prelude::*;
use md_grid::Staggering;
use md_lagrange::pipeline::AdvectionAction;
use md_lagrange::prelude::*;
use md_lagrange::rng::particle_rng;
use md_lagrange::{StepContext, StepOutcome, Zone, ZoneSet};

fn eastward(temp: f64) -> Dataset {
    let mut ds = RectilinearBuilder::new(10, 10)
        .cell_size(1.0)
        .records(0.0, 100.0, 2)
        .uniform_current(1.0, 0.0)
        .uniform(names::TEMP, Staggering::Rho, temp)
        .land(6, 9, 7, 9)
        .build()
        .unwrap();
    for name in [names::U, names::V, names::TEMP] {
        ds.require(name).unwrap();
    }
    ds.setup(0.0, false).unwrap();
    ds
}

fn euler() -> ActionPipeline {
    ActionPipeline::new(
        vec![Box::new(AdvectionAction::new(AdvectionScheme::Euler))],
        CoastlineBehavior::Beaching,
        false,
    )
}

fn particle(ds: &Dataset, x: f64, y: f64) -> Particle {
    Particle::new(0, GridPoint::from_grid(GridCoord::new_2d(x, y), ds), particle_rng(1, 0))
}

fn zone(x0: f64, x1: f64) -> ZoneSet {
    let mut zones = ZoneSet::default();
    let polygon = vec![
        DVec2::new(x0, 2.0),
        DVec2::new(x1, 2.0),
        DVec2::new(x1, 6.0),
        DVec2::new(x0, 6.0),
    ];
    zones.push(Zone::new(ZoneKind::Recruitment, 0, "target", polygon, None).unwrap());
    zones
}

fn recruitment_config(stop_moving: bool) -> SimulationConfig {
    let mut cfg = SimulationConfig::default();
    cfg.transport.scheme = AdvectionScheme::Euler;
    cfg.biology.recruitment = Some(RecruitmentConfig {
        criterion: RecruitmentCriterion::Age,
        threshold: 0.0,
        min_residence_days: 0.0,
        stop_moving,
        depth_range: None,
    });
    cfg
}

// ============================================================
// 年龄检查
// ============================================================

#[test]
fn test_age_at_limit_still_moves_and_exits() {
    let ds = eastward(15.0);
    let zones = ZoneSet::default();
    let ctx = StepContext::new(&ds, &zones, 0.0, 1.0, 10.0);

    let mut p = particle(&ds, 8.0, 3.0).with_age(10.0);
    assert_eq!(euler().step(&mut p, &ctx), StepOutcome::Stepped);
    assert_eq!(p.death_cause(), DeathCause::OutOfDomain);
    assert!((p.grid().x - 9.0).abs() < 1e-12);
}

#[test]
fn test_age_over_limit_dies_old_in_place() {
    let ds = eastward(15.0);
    let zones = ZoneSet::default();
    let ctx = StepContext::new(&ds, &zones, 0.0, 1.0, 10.0);

    let mut p = particle(&ds, 8.0, 3.0).with_age(10.5);
    assert_eq!(euler().step(&mut p, &ctx), StepOutcome::Expired);
    assert_eq!(p.death_cause(), DeathCause::Old);
    assert!((p.grid().x - 8.0).abs() < 1e-12);
    // 提前返回，年龄不再增加
    assert!((p.age() - 10.5).abs() < 1e-12);
}

// ============================================================
// 死亡
// ============================================================

#[test]
fn test_kill_is_idempotent() {
    let ds = eastward(15.0);
    let mut p = particle(&ds, 4.0, 4.0);
    p.kill(DeathCause::Cold);
    let before = *p.grid();
    p.kill(DeathCause::Hot);
    assert_eq!(p.death_cause(), DeathCause::Cold);
    assert_eq!(*p.grid(), before);
}

#[test]
fn test_domain_check_precedes_lethal_temperature() {
    let ds = eastward(30.0);
    let zones = ZoneSet::default();
    let mut cfg = SimulationConfig::default();
    cfg.transport.scheme = AdvectionScheme::Euler;
    cfg.biology.lethal_temperature = Some(LethalTemperatureConfig {
        egg_hot: Some(25.0),
        ..Default::default()
    });
    let pipeline = ActionPipeline::from_config(&cfg, &zones, false).unwrap();
    let ctx = StepContext::new(&ds, &zones, 0.0, 1.0, 1e9);

    // (5, 8) → (6, 8) 为陆地
    let mut beached = particle(&ds, 5.0, 8.0);
    pipeline.step(&mut beached, &ctx);
    assert_eq!(beached.death_cause(), DeathCause::Beached);

    let mut hot = particle(&ds, 3.0, 3.0);
    pipeline.step(&mut hot, &ctx);
    assert_eq!(hot.death_cause(), DeathCause::Hot);
    assert!((hot.age() - 1.0).abs() < 1e-12);
}

// ============================================================
// 补充
// ============================================================

#[test]
fn test_recruited_particle_locked() {
    let ds = eastward(15.0);
    let zones = zone(2.0, 6.0);
    let pipeline = ActionPipeline::from_config(&recruitment_config(true), &zones, false).unwrap();
    let ctx = StepContext::new(&ds, &zones, 0.0, 1.0, 1e9);

    let mut p = particle(&ds, 3.0, 4.0);
    pipeline.init_particle(&mut p);
    assert_eq!(pipeline.step(&mut p, &ctx), StepOutcome::Stepped);
    assert!(p.is_recruited());
    assert!((p.grid().x - 4.0).abs() < 1e-12);

    // 已补充且锁定：位置与年龄都不变，超龄也不死亡
    let late = StepContext::new(&ds, &zones, 1.0, 1.0, 0.5);
    for _ in 0..3 {
        assert_eq!(pipeline.step(&mut p, &late), StepOutcome::Locked);
    }
    assert!((p.grid().x - 4.0).abs() < 1e-12);
    assert!((p.age() - 1.0).abs() < 1e-12);
    assert!(p.is_living());
}

#[test]
fn test_recruitment_flag_never_resets() {
    let ds = eastward(15.0);
    let zones = zone(2.0, 4.5);
    let pipeline = ActionPipeline::from_config(&recruitment_config(false), &zones, false).unwrap();
    let ctx = StepContext::new(&ds, &zones, 0.0, 1.0, 1e9);

    let mut p = particle(&ds, 2.5, 4.0);
    pipeline.init_particle(&mut p);
    pipeline.step(&mut p, &ctx);
    assert!(p.recruitment().unwrap().is_recruited_in(0));

    for _ in 0..3 {
        pipeline.step(&mut p, &ctx);
        let state = p.recruitment().unwrap();
        assert!(state.is_recruited_in(0));
        assert!(state.time_in_zone() <= 0.0);
    }
    assert_eq!(p.recruitment().unwrap().current_zone(), None);
    assert!(p.is_living());
}

#[test]
fn test_snapshot_zone_numbers() {
    let ds = eastward(15.0);
    let zones = zone(2.0, 6.0);
    let pipeline = ActionPipeline::from_config(&recruitment_config(true), &zones, false).unwrap();
    let ctx = StepContext::new(&ds, &zones, 0.0, 1.0, 1e9);

    let mut p = particle(&ds, 3.0, 4.0).with_release_zone(Some(1));
    pipeline.init_particle(&mut p);
    pipeline.step(&mut p, &ctx);
    let snap = p.snapshot();
    assert_eq!(snap.release_zone, 2);
    assert_eq!(snap.recruitment_zone, -1);
    assert_eq!(snap.recruited, vec![true]);
}
