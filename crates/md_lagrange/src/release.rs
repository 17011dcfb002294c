// crates/md_lagrange/src/release.rs

//! 粒子投放
//!
//! # 投放方式
//!
//! - 固定点与文本文件：逐点投放；位于网格外、边缘或陆地的点生成已死亡粒子，
//!   保持序号连续
//! - 区域随机：粒子数按投放区面积分配，在外包框内均匀抽样直到落入多边形水域
//! - 斑块：每个斑块首个粒子按区域随机抽样，其余在其周围的半径与厚度内抽样
//!
//! 位置抽样使用独立于粒子的投放生成器，粒子自身的生成器由种子与序号决定。

use std::path::Path;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

use md_config::{PatchConfig, ReleaseConfig, ReleaseMode, ZoneKind};
use md_foundation::MdError;
use md_grid::{GeoCoord, GridCoord, GridPoint, GridProvider};

use crate::error::{SimResult, SimulationError};
use crate::particle::{DeathCause, Particle};
use crate::pipeline::ActionPipeline;
use crate::rng::{particle_rng, release_rng};
use crate::zone::{Zone, ZoneSet};

/// 单个粒子的最大抽样次数
pub const MAX_DRAWS: usize = 2000;

/// 纬度 1° 对应的距离 [m]
pub const ONE_DEG_LATITUDE_IN_METER: f64 = 111_138.0;

// ============================================================================
// 文本文件
// ============================================================================

/// 读取 `lon lat [depth]` 文本，`#` 起始注释，空行忽略；缺省深度为 0
pub fn read_release_file(path: &Path) -> SimResult<Vec<[f64; 3]>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            MdError::file_not_found(path)
        } else {
            MdError::io_with_source(format!("读取投放文件 {} 失败", path.display()), e)
        }
    })?;
    parse_release_points(&content, path)
}

fn parse_release_points(content: &str, path: &Path) -> SimResult<Vec<[f64; 3]>> {
    let mut points = Vec::new();
    for (n, raw) in content.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let values = line
            .split_whitespace()
            .map(str::parse::<f64>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| MdError::parse(path, n + 1, format!("无法解析数值: {e}")))?;
        let point = match values.as_slice() {
            [lon, lat] => [*lon, *lat, 0.0],
            [lon, lat, depth] => [*lon, *lat, *depth],
            _ => {
                return Err(MdError::parse(path, n + 1, format!("需要 2 或 3 列，实际 {}", values.len())).into());
            }
        };
        points.push(point);
    }
    if points.is_empty() {
        return Err(SimulationError::release(format!("投放文件 {} 中没有投放点", path.display())));
    }
    Ok(points)
}

// ============================================================================
// 按面积分配
// ============================================================================

/// 按面积比例分配粒子数，四舍五入的差额从第一个区开始逐个补足
pub fn dispatch_by_area(total: usize, areas: &[f64]) -> Vec<usize> {
    if areas.is_empty() {
        return Vec::new();
    }
    let sum: f64 = areas.iter().sum();
    let mut counts: Vec<i64> = areas
        .iter()
        .map(|a| {
            if sum > 0.0 {
                (total as f64 * a / sum).round() as i64
            } else {
                0
            }
        })
        .collect();

    let diff = total as i64 - counts.iter().sum::<i64>();
    let step = diff.signum();
    let n = counts.len();
    let mut k = 0;
    let mut remaining = diff.abs();
    while remaining > 0 {
        let idx = k % n;
        if step > 0 || counts[idx] > 0 {
            counts[idx] += step;
            remaining -= 1;
        }
        k += 1;
    }
    counts.into_iter().map(|c| c.max(0) as usize).collect()
}

// ============================================================================
// 投放时间表
// ============================================================================

/// 投放时间表
#[derive(Debug, Clone)]
pub struct ReleaseSchedule {
    times: Vec<f64>,
    next: usize,
    direction: f64,
}

impl ReleaseSchedule {
    /// 按时间方向排序
    pub fn new(mut times: Vec<f64>, backward: bool) -> Self {
        let direction = if backward { -1.0 } else { 1.0 };
        times.sort_by(|a, b| (direction * a).total_cmp(&(direction * b)));
        Self {
            times,
            next: 0,
            direction,
        }
    }

    /// 事件总数
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// 是否没有事件
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// 尚未投放的事件数
    pub fn pending(&self) -> usize {
        self.times.len() - self.next
    }

    /// 是否全部投放完毕
    pub fn is_complete(&self) -> bool {
        self.pending() == 0
    }

    /// 取出本步 `[time, time + dt)` 内（含此前遗漏的）到期事件数
    pub fn take_due(&mut self, time: f64, dt: f64) -> usize {
        let start = self.next;
        while let Some(t) = self.times.get(self.next) {
            if self.direction * (t - time) < dt.abs() {
                self.next += 1;
            } else {
                break;
            }
        }
        self.next - start
    }
}

// ============================================================================
// 粒子工厂
// ============================================================================

#[derive(Debug, Clone)]
enum Plan {
    Fixed(Vec<[f64; 3]>),
    Zone {
        number_particles: usize,
        depth_range: [f64; 2],
        patches: Option<PatchConfig>,
    },
}

/// 粒子工厂
#[derive(Debug, Clone)]
pub struct ParticleFactory {
    plan: Plan,
    seed: u64,
    is_3d: bool,
    rng: ChaCha8Rng,
}

impl ParticleFactory {
    /// 由投放配置创建；文本文件在此读取
    pub fn from_config(cfg: &ReleaseConfig, seed: u64, is_3d: bool) -> SimResult<Self> {
        let plan = match &cfg.mode {
            ReleaseMode::Points { points } => Plan::Fixed(points.clone()),
            ReleaseMode::TextFile { path } => Plan::Fixed(read_release_file(path)?),
            ReleaseMode::Zone {
                number_particles,
                depth_range,
                patches,
            } => Plan::Zone {
                number_particles: *number_particles,
                depth_range: *depth_range,
                patches: patches.clone(),
            },
        };
        Ok(Self {
            plan,
            seed,
            is_3d,
            rng: release_rng(seed),
        })
    }

    /// 每次投放的粒子数
    pub fn particles_per_event(&self) -> usize {
        match &self.plan {
            Plan::Fixed(points) => points.len(),
            Plan::Zone { number_particles, .. } => *number_particles,
        }
    }

    /// 执行一次投放，新粒子序号从 `first_index` 开始
    pub fn release(
        &mut self,
        grid: &dyn GridProvider,
        zones: &ZoneSet,
        pipeline: &ActionPipeline,
        first_index: usize,
    ) -> SimResult<Vec<Particle>> {
        let placed = match self.plan.clone() {
            Plan::Fixed(points) => self.place_points(grid, zones, &points),
            Plan::Zone {
                number_particles,
                depth_range,
                patches,
            } => self.place_in_zones(grid, zones, number_particles, depth_range, patches.as_ref())?,
        };

        let particles: Vec<Particle> = placed
            .into_iter()
            .enumerate()
            .map(|(n, site)| {
                let index = first_index + n;
                let mut p = Particle::new(index, site.point, particle_rng(self.seed, index))
                    .with_release_zone(site.zone);
                pipeline.init_particle(&mut p);
                if let Some(cause) = site.death {
                    p.kill(cause);
                }
                p
            })
            .collect();

        debug!(count = particles.len(), first_index, "投放粒子");
        Ok(particles)
    }

    fn place_points(&self, grid: &dyn GridProvider, zones: &ZoneSet, points: &[[f64; 3]]) -> Vec<Site> {
        points
            .iter()
            .map(|[lon, lat, depth]| {
                let geo = GeoCoord::new(*lon, *lat, self.is_3d.then_some(*depth));
                let Some(coord) = grid.geo_to_grid(&geo) else {
                    warn!(lon, lat, "投放点位于网格外");
                    return Site {
                        point: GridPoint {
                            grid: GridCoord {
                                x: f64::NAN,
                                y: f64::NAN,
                                z: self.is_3d.then_some(f64::NAN),
                            },
                            geo,
                        },
                        zone: None,
                        death: Some(DeathCause::OutOfDomain),
                    };
                };
                let death = if grid.is_on_edge(&coord) {
                    warn!(lon, lat, "投放点位于计算域边缘");
                    Some(DeathCause::OutOfDomain)
                } else if !grid.is_in_water(&coord) {
                    warn!(lon, lat, "投放点位于陆地");
                    Some(DeathCause::Beached)
                } else {
                    None
                };
                Site {
                    point: GridPoint::from_grid(coord, grid),
                    zone: zones.locate(ZoneKind::Release, &coord, geo.depth),
                    death,
                }
            })
            .collect()
    }

    fn place_in_zones(
        &mut self,
        grid: &dyn GridProvider,
        zones: &ZoneSet,
        number_particles: usize,
        depth_range: [f64; 2],
        patches: Option<&PatchConfig>,
    ) -> SimResult<Vec<Site>> {
        let release_zones = zones.zones(ZoneKind::Release);
        let per_patch = patches.map_or(1, |p| p.per_patch.max(1));
        let areas: Vec<f64> = release_zones.iter().map(Zone::area).collect();
        let counts = dispatch_by_area(number_particles / per_patch, &areas);

        let mut sites = Vec::with_capacity(number_particles);
        for (zone, count) in release_zones.iter().zip(counts) {
            if count == 0 {
                warn!(zone = zone.index(), "投放区未分配到粒子");
            }
            for _ in 0..count {
                let seed = self.draw_in_zone(grid, zone, depth_range)?;
                let seed_geo = seed.geo;
                sites.push(Site {
                    point: seed,
                    zone: Some(zone.index()),
                    death: None,
                });
                if let Some(patch) = patches {
                    for _ in 1..per_patch {
                        let member = self.draw_around(grid, &seed_geo, patch, zone)?;
                        sites.push(Site {
                            point: member,
                            zone: Some(zone.index()),
                            death: None,
                        });
                    }
                }
            }
        }
        Ok(sites)
    }

    fn draw_in_zone(&mut self, grid: &dyn GridProvider, zone: &Zone, depth_range: [f64; 2]) -> SimResult<GridPoint> {
        let (lo, hi) = zone.bounds();
        for _ in 0..MAX_DRAWS {
            let x = lo.x + self.rng.gen::<f64>() * (hi.x - lo.x);
            let y = lo.y + self.rng.gen::<f64>() * (hi.y - lo.y);
            let depth = depth_range[0] + self.rng.gen::<f64>() * (depth_range[1] - depth_range[0]);
            let z = if self.is_3d {
                let z = grid.depth_to_z(x, y, depth);
                if !z.is_finite() {
                    continue;
                }
                Some(z)
            } else {
                None
            };
            let p = GridCoord { x, y, z };
            if zone.contains(&p) && grid.is_in_water(&p) && !grid.is_on_edge(&p) {
                return Ok(GridPoint::from_grid(p, grid));
            }
        }
        Err(SimulationError::release(format!(
            "投放区 {} 连续 {MAX_DRAWS} 次抽样失败，请检查区域定义",
            zone.index()
        )))
    }

    fn draw_around(
        &mut self,
        grid: &dyn GridProvider,
        center: &GeoCoord,
        patch: &PatchConfig,
        zone: &Zone,
    ) -> SimResult<GridPoint> {
        let one_deg_lon = ONE_DEG_LATITUDE_IN_METER * center.lat.to_radians().cos();
        for _ in 0..MAX_DRAWS {
            let lat = center.lat + patch.radius_m * (self.rng.gen::<f64>() - 0.5) / ONE_DEG_LATITUDE_IN_METER;
            let lon = center.lon + patch.radius_m * (self.rng.gen::<f64>() - 0.5) / one_deg_lon;
            let dz = patch.thickness_m * (self.rng.gen::<f64>() - 0.5);
            let depth = center.depth.map(|d| (d + dz).min(0.0));
            let Some(p) = grid.geo_to_grid(&GeoCoord::new(lon, lat, depth)) else {
                continue;
            };
            if grid.is_in_water(&p) && !grid.is_on_edge(&p) {
                return Ok(GridPoint::from_grid(p, grid));
            }
        }
        Err(SimulationError::release(format!(
            "投放区 {} 的斑块成员连续 {MAX_DRAWS} 次抽样失败",
            zone.index()
        )))
    }
}

/// 抽样结果
#[derive(Debug, Clone, Copy)]
struct Site {
    point: GridPoint,
    zone: Option<usize>,
    death: Option<DeathCause>,
}
