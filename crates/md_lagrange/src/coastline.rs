// crates/md_lagrange/src/coastline.rs

//! 岸线反弹
//!
//! 水平位移 `d` 使粒子从水点 `origin` 落到陆地时，沿位移方向二分查找
//! 与岸线的交点。陆地掩码按最近节点判定，岸线因此位于半整数网格线上：
//!
//! - 交点在经向岸线（x = i + ½）上 → x 分量关于该线镜像
//! - 交点在纬向岸线（y = j + ½）上 → y 分量镜像
//! - 同时在两条线上（角点）→ 两个分量都镜像
//!
//! 镜像后的终点仍在陆地时以新位移重复，最多 [`MAX_BOUNCES`] 次；
//! 之后仍在陆地则返回 `None`，由调用方决定如何处理。

use glam::DVec2;
use md_grid::{GridCoord, GridProvider};

/// 最多反弹次数
pub const MAX_BOUNCES: usize = 10;

/// 二分查找的最大迭代次数
const MAX_BISECTIONS: usize = 1000;

/// 判定落在岸线上的容差（网格单位）
const FACE_TOLERANCE: f64 = 1e-8;

/// 反弹后的水平位移；终点在水中时原样返回
pub fn bounce(grid: &dyn GridProvider, origin: &GridCoord, d: DVec2) -> Option<DVec2> {
    let mut d = d;
    for _ in 0..MAX_BOUNCES {
        if in_water(grid, origin, d) {
            return Some(d);
        }
        let (meridional, zonal) = impact(grid, origin, d);
        if !meridional && !zonal {
            return None;
        }
        // 起点单元在运动方向上的面
        if meridional {
            let dx1 = origin.x.round() + sign(d.x) * 0.5 - origin.x;
            d.x = 2.0 * dx1 - d.x;
        }
        if zonal {
            let dy1 = origin.y.round() + sign(d.y) * 0.5 - origin.y;
            d.y = 2.0 * dy1 - d.y;
        }
    }
    in_water(grid, origin, d).then_some(d)
}

/// 二分查找交点，返回 (是否在经向岸线上, 是否在纬向岸线上)
fn impact(grid: &dyn GridProvider, origin: &GridCoord, d: DVec2) -> (bool, bool) {
    let mut t = 0.0;
    let mut step = 1.0;
    let mut direction = 1.0;
    for _ in 0..MAX_BISECTIONS {
        step *= 0.5;
        t += direction * step;
        let s = origin.x + t * d.x;
        let ys = origin.y + t * d.y;
        direction = if grid.is_in_water(&GridCoord::new_2d(s, ys)) { 1.0 } else { -1.0 };

        let meridional = d.x != 0.0 && on_face(s);
        let zonal = d.y != 0.0 && on_face(ys);
        if meridional || zonal {
            return (meridional, zonal);
        }
        if step < f64::EPSILON {
            break;
        }
    }
    (false, false)
}

#[inline]
fn in_water(grid: &dyn GridProvider, origin: &GridCoord, d: DVec2) -> bool {
    grid.is_in_water(&GridCoord::new_2d(origin.x + d.x, origin.y + d.y))
}

/// 是否位于半整数网格线上
#[inline]
fn on_face(c: f64) -> bool {
    ((c + 0.5).round() - (c + 0.5)).abs() < FACE_TOLERANCE
}

#[inline]
fn sign(v: f64) -> f64 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use md_grid::{Dataset, RectilinearBuilder};

    /// 列 7..=9 全为陆地，行 0..=2 在列 4..=6 上也为陆地
    fn coast() -> Dataset {
        RectilinearBuilder::new(10, 10)
            .cell_size(1.0)
            .land(7, 9, 0, 9)
            .land(4, 6, 0, 2)
            .build()
            .unwrap()
    }

    #[test]
    fn test_water_move_unchanged() {
        let ds = coast();
        let d = bounce(&ds, &GridCoord::new_2d(3.0, 5.0), DVec2::new(1.0, 0.5)).unwrap();
        assert_eq!(d, DVec2::new(1.0, 0.5));
    }

    #[test]
    fn test_meridional_mirror() {
        let ds = coast();
        let origin = GridCoord::new_2d(5.8, 4.0);
        let d = bounce(&ds, &origin, DVec2::new(1.0, 0.5)).unwrap();
        // 6.8 关于 x = 6.5 镜像到 6.2，y 分量不变
        assert!((origin.x + d.x - 6.2).abs() < 1e-9);
        assert!((d.y - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_zonal_mirror() {
        let ds = coast();
        let origin = GridCoord::new_2d(5.0, 3.2);
        let d = bounce(&ds, &origin, DVec2::new(0.0, -1.0)).unwrap();
        // 2.2 关于 y = 2.5 镜像到 2.8
        assert!((origin.y + d.y - 2.8).abs() < 1e-9);
        assert!(d.x.abs() < 1e-12);
    }

    #[test]
    fn test_result_always_in_water() {
        let ds = coast();
        let origin = GridCoord::new_2d(3.6, 3.4);
        if let Some(d) = bounce(&ds, &origin, DVec2::new(1.3, -1.1)) {
            assert!(ds.is_in_water(&GridCoord::new_2d(origin.x + d.x, origin.y + d.y)));
        }
    }

    #[test]
    fn test_on_face() {
        assert!(on_face(6.5));
        assert!(on_face(-0.5));
        assert!(!on_face(6.4));
    }
}
