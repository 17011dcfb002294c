// crates/md_lagrange/src/integrators/advection.rs

//! 平流
//!
//! 流速 [m/s] 除以局部度量（x 方向 `dxi`、y 方向 `deta`、垂向层厚）
//! 化为网格索引速度后积分。水平度量取与流速相同的 2×2 模板上度量倒数的双线性平均。
//!
//! # RK4 边界截断
//!
//! 任一中间点落到计算域边缘（或为 NaN）时立即停止，返回已得到的部分估计：
//! `k1/2`、`k2/2` 或 `k3`，垂向分量置零。
//!
//! # 逆向
//!
//! 时间步为负时先按格式求出预估位置，再在预估位置重新求一次位移作为结果；
//! 预估位置已在边缘时直接返回第一次的位移。

use md_config::AdvectionScheme;
use md_grid::{names, Displacement, GridCoord, GridProvider};

/// 显式 Euler 位移
pub fn advect_euler(grid: &dyn GridProvider, p: &GridCoord, time: f64, dt: f64) -> Displacement {
    let (pm, pn) = inverse_metrics(grid, p);

    let u = grid.sample(names::U, p, time);
    let v = grid.sample(names::V, p, time);
    let dx = dt * u * pm;
    let dy = dt * v * pn;

    let dz = p.z.map(|z| {
        if grid.has_field(names::W) {
            let w = grid.sample(names::W, p, time);
            dt * w / grid.cell_thickness(p.x, p.y, z)
        } else {
            0.0
        }
    });

    Displacement::new(dx, dy, dz)
}

/// 度量倒数 `(1/dxi, 1/deta)` [1/m] 在 2×2 模板上的双线性平均，越界节点不计
fn inverse_metrics(grid: &dyn GridProvider, p: &GridCoord) -> (f64, f64) {
    if !p.x.is_finite() || !p.y.is_finite() {
        return (f64::NAN, f64::NAN);
    }
    let (x0, y0) = (p.x.floor(), p.y.floor());
    let (fx, fy) = (p.x - x0, p.y - y0);

    let (mut pm, mut pn, mut co) = (0.0, 0.0, 0.0);
    for jj in 0..2 {
        for ii in 0..2 {
            let w = ((1.0 - ii as f64 - fx) * (1.0 - jj as f64 - fy)).abs();
            if w == 0.0 {
                continue;
            }
            let (i, j) = (x0 as isize + ii, y0 as isize + jj);
            let (dxi, deta) = (grid.dxi(j, i), grid.deta(j, i));
            if !dxi.is_finite() || !deta.is_finite() {
                continue;
            }
            pm += w / dxi;
            pn += w / deta;
            co += w;
        }
    }

    if co > 0.0 {
        (pm / co, pn / co)
    } else {
        (f64::NAN, f64::NAN)
    }
}

/// 经典四阶 Runge-Kutta 位移，带边界截断
pub fn advect_rk4(grid: &dyn GridProvider, p: &GridCoord, time: f64, dt: f64) -> Displacement {
    let flat = p.z.map(|_| 0.0);
    let truncated = |k: Displacement, factor: f64| Displacement {
        horizontal: k.horizontal * factor,
        vertical: flat,
    };
    let half = 0.5 * dt;

    let k1 = advect_euler(grid, p, time, dt);
    let p1 = p.translated(&(k1 * 0.5));
    if grid.is_on_edge(&p1) {
        return truncated(k1, 0.5);
    }

    let k2 = advect_euler(grid, &p1, time + half, dt);
    let p2 = p.translated(&(k2 * 0.5));
    if grid.is_on_edge(&p2) {
        return truncated(k2, 0.5);
    }

    let k3 = advect_euler(grid, &p2, time + half, dt);
    let p3 = p.translated(&k3);
    if grid.is_on_edge(&p3) {
        return truncated(k3, 1.0);
    }

    let k4 = advect_euler(grid, &p3, time + dt, dt);
    (k1 + k2 * 2.0 + k3 * 2.0 + k4) / 6.0
}

/// 按格式与时间方向计算平流位移
pub fn advect(scheme: AdvectionScheme, grid: &dyn GridProvider, p: &GridCoord, time: f64, dt: f64) -> Displacement {
    let step = |q: &GridCoord| match scheme {
        AdvectionScheme::Euler => advect_euler(grid, q, time, dt),
        AdvectionScheme::Rk4 => advect_rk4(grid, q, time, dt),
    };

    let first = step(p);
    if dt >= 0.0 {
        return first;
    }

    let provisional = p.translated(&first);
    if grid.is_on_edge(&provisional) {
        first
    } else {
        step(&provisional)
    }
}
