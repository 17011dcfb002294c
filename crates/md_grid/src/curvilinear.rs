// crates/md_grid/src/curvilinear.rs

//! 曲线正交网格
//!
//! 网格以 ρ 点为节点，数组布局为 `[j, i]`（行为 y，列为 x）。提供：
//!
//! - 网格坐标 ⇄ 经纬度变换
//! - 陆地掩码、边界与近岸判定
//! - 度量因子 `pm = 1/dx`、`pn = 1/dy`
//! - 水深 `h`（正值）
//!
//! # 坐标反算
//!
//! `lonlat_to_xy` 先用交叉数法判断点是否落在网格外轮廓内，再对子网格外框做二分，
//! 锁定所在单元后以两条单元边的仿射解为初值，用 Newton 迭代求解双线性映射的逆。

use glam::DVec2;
use ndarray::Array2;

use md_foundation::{ensure, MdError, MdResult};

use crate::polygon;

/// 反算 Newton 迭代次数上限
const NEWTON_MAX_ITER: usize = 12;
/// 坐标正算时距网格外缘的最小距离
const EDGE_MARGIN: f64 = 1e-5;

/// 曲线网格
#[derive(Debug, Clone)]
pub struct CurvilinearGrid {
    nx: usize,
    ny: usize,
    lon: Array2<f64>,
    lat: Array2<f64>,
    mask: Array2<bool>,
    pm: Array2<f64>,
    pn: Array2<f64>,
    h: Array2<f64>,
    outline: Vec<DVec2>,
}

impl CurvilinearGrid {
    /// 由 ρ 点数组构造网格，所有数组形状必须为 `(ny, nx)`
    pub fn new(
        lon: Array2<f64>,
        lat: Array2<f64>,
        mask: Array2<bool>,
        pm: Array2<f64>,
        pn: Array2<f64>,
        h: Array2<f64>,
    ) -> MdResult<Self> {
        let (ny, nx) = lon.dim();
        ensure!(nx >= 2 && ny >= 2, MdError::invalid_grid(format!("网格至少 2×2，实际 {nx}×{ny}")));

        for (name, dim) in [
            ("lat", lat.dim()),
            ("mask", mask.dim()),
            ("pm", pm.dim()),
            ("pn", pn.dim()),
            ("h", h.dim()),
        ] {
            ensure!(
                dim == (ny, nx),
                MdError::invalid_grid(format!("{name} 形状 {:?} 与经度数组 {:?} 不一致", dim, (ny, nx)))
            );
        }
        ensure!(
            lon.iter().chain(lat.iter()).all(|v| v.is_finite()),
            MdError::invalid_grid("经纬度包含非有限值")
        );
        for &v in lat.iter() {
            MdError::check_range("lat", v, -90.0, 90.0)?;
        }
        ensure!(
            pm.iter().chain(pn.iter()).all(|v| *v > 0.0 && v.is_finite()),
            MdError::invalid_grid("度量因子 pm/pn 必须为正")
        );
        ensure!(
            h.indexed_iter().all(|((j, i), d)| !mask[[j, i]] || *d > 0.0),
            MdError::invalid_grid("水点水深必须为正")
        );

        let mut grid = Self {
            nx,
            ny,
            lon,
            lat,
            mask,
            pm,
            pn,
            h,
            outline: Vec::new(),
        };
        grid.outline = grid.box_outline(0, nx - 1, 0, ny - 1);
        Ok(grid)
    }

    /// x 方向点数
    #[inline]
    pub fn nx(&self) -> usize {
        self.nx
    }

    /// y 方向点数
    #[inline]
    pub fn ny(&self) -> usize {
        self.ny
    }

    /// 节点经纬度
    #[inline]
    fn node(&self, i: usize, j: usize) -> DVec2 {
        DVec2::new(self.lon[[j, i]], self.lat[[j, i]])
    }

    // ========================================================================
    // 掩码与边界
    // ========================================================================

    /// 单元是否为水点，越界视为陆地
    #[inline]
    pub fn is_water_cell(&self, i: isize, j: isize) -> bool {
        if i < 0 || j < 0 {
            return false;
        }
        self.mask.get((j as usize, i as usize)).copied().unwrap_or(false)
    }

    /// 最近单元是否为水点
    pub fn is_in_water(&self, x: f64, y: f64) -> bool {
        if !x.is_finite() || !y.is_finite() {
            return false;
        }
        self.is_water_cell(x.round() as isize, y.round() as isize)
    }

    /// 是否处于网格外缘一格以内（非有限坐标视为在边界上）
    pub fn is_on_edge(&self, x: f64, y: f64) -> bool {
        if !x.is_finite() || !y.is_finite() {
            return true;
        }
        x > (self.nx - 2) as f64 || x < 1.0 || y > (self.ny - 2) as f64 || y < 1.0
    }

    /// 是否靠近岸线
    ///
    /// 以最近节点为中心，检查点所在象限方向的三个相邻单元，任一为陆地即视为近岸。
    pub fn is_close_to_coast(&self, x: f64, y: f64) -> bool {
        if !x.is_finite() || !y.is_finite() {
            return true;
        }
        let i = x.round() as isize;
        let j = y.round() as isize;
        let ii = if i == x.floor() as isize { 1 } else { -1 };
        let jj = if j == y.floor() as isize { 1 } else { -1 };
        !(self.is_water_cell(i + ii, j)
            && self.is_water_cell(i + ii, j + jj)
            && self.is_water_cell(i, j + jj))
    }

    // ========================================================================
    // 度量
    // ========================================================================

    /// x 方向单元尺度 [m]，越界返回 NaN
    #[inline]
    pub fn dxi(&self, j: isize, i: isize) -> f64 {
        self.metric(&self.pm, j, i)
    }

    /// y 方向单元尺度 [m]，越界返回 NaN
    #[inline]
    pub fn deta(&self, j: isize, i: isize) -> f64 {
        self.metric(&self.pn, j, i)
    }

    fn metric(&self, inv: &Array2<f64>, j: isize, i: isize) -> f64 {
        if i < 0 || j < 0 {
            return f64::NAN;
        }
        inv.get((j as usize, i as usize)).map_or(f64::NAN, |v| 1.0 / v)
    }

    /// 节点水深 [m]
    #[inline]
    pub fn depth_at_node(&self, j: usize, i: usize) -> f64 {
        self.h[[j, i]]
    }

    /// 按水点加权的双线性水深 [m]，邻近无水点时返回 NaN
    pub fn bathymetry(&self, x: f64, y: f64) -> f64 {
        if !x.is_finite() || !y.is_finite() {
            return f64::NAN;
        }
        let xc = x.clamp(0.0, (self.nx - 1) as f64);
        let yc = y.clamp(0.0, (self.ny - 1) as f64);
        let i = (xc.floor() as usize).min(self.nx - 2);
        let j = (yc.floor() as usize).min(self.ny - 2);
        let dx = xc - i as f64;
        let dy = yc - j as f64;

        let mut sum = 0.0;
        let mut co = 0.0;
        for (ii, jj) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
            if !self.mask[[j + jj, i + ii]] {
                continue;
            }
            let w = ((1.0 - ii as f64 - dx) * (1.0 - jj as f64 - dy)).abs();
            sum += w * self.h[[j + jj, i + ii]];
            co += w;
        }
        if co > 0.0 {
            sum / co
        } else {
            f64::NAN
        }
    }

    // ========================================================================
    // 坐标变换
    // ========================================================================

    /// 网格坐标 → (经度, 纬度)，坐标先夹紧到网格范围内
    pub fn xy_to_lonlat(&self, x: f64, y: f64) -> DVec2 {
        let xc = x.clamp(EDGE_MARGIN, self.nx as f64 - 1.0 - EDGE_MARGIN);
        let yc = y.clamp(EDGE_MARGIN, self.ny as f64 - 1.0 - EDGE_MARGIN);
        let i = xc.floor() as usize;
        let j = yc.floor() as usize;
        self.bilinear_node(i, j, xc - i as f64, yc - j as f64)
    }

    fn bilinear_node(&self, i: usize, j: usize, a: f64, b: f64) -> DVec2 {
        self.node(i, j) * ((1.0 - a) * (1.0 - b))
            + self.node(i + 1, j) * (a * (1.0 - b))
            + self.node(i, j + 1) * ((1.0 - a) * b)
            + self.node(i + 1, j + 1) * (a * b)
    }

    /// (经度, 纬度) → 网格坐标，位于网格外时返回 `None`
    pub fn lonlat_to_xy(&self, lon: f64, lat: f64) -> Option<DVec2> {
        let target = DVec2::new(lon, lat);
        if !target.is_finite() || !polygon::contains(&self.outline, target) {
            return None;
        }

        let (mut imin, mut imax, mut jmin, mut jmax) = (0, self.nx - 1, 0, self.ny - 1);
        while imax - imin > 1 || jmax - jmin > 1 {
            if imax - imin > 1 {
                let i0 = (imin + imax) / 2;
                if self.box_contains(imin, i0, jmin, jmax, target) {
                    imax = i0;
                } else {
                    imin = i0;
                }
            }
            if jmax - jmin > 1 {
                let j0 = (jmin + jmax) / 2;
                if self.box_contains(imin, imax, jmin, j0, target) {
                    jmax = j0;
                } else {
                    jmin = j0;
                }
            }
        }

        let (a, b) = self.invert_cell(imin, jmin, target);
        Some(DVec2::new(imin as f64 + a, jmin as f64 + b))
    }

    /// 求单元 (i, j) 内双线性映射的逆，返回单元内局部坐标
    fn invert_cell(&self, i: usize, j: usize, target: DVec2) -> (f64, f64) {
        let p00 = self.node(i, j);
        let p10 = self.node(i + 1, j);
        let p01 = self.node(i, j + 1);
        let p11 = self.node(i + 1, j + 1);

        // 仿射初值
        let e1 = p10 - p00;
        let e2 = p01 - p00;
        let det = e1.perp_dot(e2);
        if det.abs() < f64::EPSILON {
            return (0.0, 0.0);
        }
        let r = target - p00;
        let mut a = r.perp_dot(e2) / det;
        let mut b = e1.perp_dot(r) / det;

        for _ in 0..NEWTON_MAX_ITER {
            let f = self.bilinear_node(i, j, a, b) - target;
            let da = (p10 - p00) * (1.0 - b) + (p11 - p01) * b;
            let db = (p01 - p00) * (1.0 - a) + (p11 - p10) * a;
            let jac = da.perp_dot(db);
            if jac.abs() < f64::EPSILON {
                break;
            }
            let step_a = f.perp_dot(db) / jac;
            let step_b = da.perp_dot(f) / jac;
            a -= step_a;
            b -= step_b;
            if step_a.abs() + step_b.abs() < 1e-14 {
                break;
            }
        }
        (a.clamp(0.0, 1.0), b.clamp(0.0, 1.0))
    }

    fn box_contains(&self, imin: usize, imax: usize, jmin: usize, jmax: usize, p: DVec2) -> bool {
        polygon::contains(&self.box_outline(imin, imax, jmin, jmax), p)
    }

    /// 子网格 [imin, imax] × [jmin, jmax] 的外框，按逆时针排列
    fn box_outline(&self, imin: usize, imax: usize, jmin: usize, jmax: usize) -> Vec<DVec2> {
        let mut outline = Vec::with_capacity(2 * (imax - imin + jmax - jmin));
        for i in imin..imax {
            outline.push(self.node(i, jmin));
        }
        for j in jmin..jmax {
            outline.push(self.node(imax, j));
        }
        for i in ((imin + 1)..=imax).rev() {
            outline.push(self.node(i, jmax));
        }
        for j in ((jmin + 1)..=jmax).rev() {
            outline.push(self.node(imin, j));
        }
        outline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regular(nx: usize, ny: usize) -> CurvilinearGrid {
        let lon = Array2::from_shape_fn((ny, nx), |(_, i)| 10.0 + 0.1 * i as f64);
        let lat = Array2::from_shape_fn((ny, nx), |(j, _)| 40.0 + 0.05 * j as f64);
        let mut mask = Array2::from_elem((ny, nx), true);
        mask[[4, 4]] = false;
        CurvilinearGrid::new(
            lon,
            lat,
            mask,
            Array2::from_elem((ny, nx), 1e-3),
            Array2::from_elem((ny, nx), 2e-3),
            Array2::from_elem((ny, nx), 50.0),
        )
        .unwrap()
    }

    #[test]
    fn test_edge_rule() {
        let g = regular(10, 10);
        assert!(g.is_on_edge(0.5, 5.0));
        assert!(!g.is_on_edge(1.0, 5.0));
        assert!(!g.is_on_edge(8.0, 8.0));
        assert!(g.is_on_edge(8.01, 5.0));
        assert!(g.is_on_edge(f64::NAN, 5.0));
    }

    #[test]
    fn test_mask_rounding() {
        let g = regular(10, 10);
        assert!(!g.is_in_water(4.4, 3.6));
        assert!(g.is_in_water(4.6, 3.6));
        assert!(!g.is_in_water(-3.0, 2.0));
    }

    #[test]
    fn test_close_to_coast_quadrant() {
        let g = regular(10, 10);
        // (3.2, 3.2) 的象限指向 (4,3),(4,4),(3,4)，其中 (4,4) 为陆地
        assert!(g.is_close_to_coast(3.2, 3.2));
        // 反方向象限全部为水
        assert!(!g.is_close_to_coast(2.8, 2.8));
    }

    #[test]
    fn test_metrics() {
        let g = regular(10, 10);
        assert!((g.dxi(2, 3) - 1000.0).abs() < 1e-9);
        assert!((g.deta(2, 3) - 500.0).abs() < 1e-9);
        assert!(g.dxi(-1, 3).is_nan());
        assert!(g.deta(2, 30).is_nan());
    }

    #[test]
    fn test_regular_roundtrip() {
        let g = regular(10, 8);
        let ll = g.xy_to_lonlat(3.25, 2.5);
        assert!((ll.x - 10.325).abs() < 1e-12);
        assert!((ll.y - 40.125).abs() < 1e-12);

        let xy = g.lonlat_to_xy(ll.x, ll.y).unwrap();
        assert!((xy.x - 3.25).abs() < 1e-9);
        assert!((xy.y - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_outside_is_none() {
        let g = regular(10, 10);
        assert!(g.lonlat_to_xy(9.0, 40.2).is_none());
        assert!(g.lonlat_to_xy(10.5, 41.0).is_none());
    }

    #[test]
    fn test_bathymetry_skips_land() {
        let g = regular(10, 10);
        assert!((g.bathymetry(3.5, 3.5) - 50.0).abs() < 1e-12);
        assert!((g.bathymetry(4.0, 3.5) - 50.0).abs() < 1e-12);
        assert!(g.bathymetry(4.0, 4.0).is_nan());
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let lon = Array2::zeros((4, 5));
        let lat = Array2::zeros((4, 4));
        let res = CurvilinearGrid::new(
            lon,
            lat,
            Array2::from_elem((4, 5), true),
            Array2::from_elem((4, 5), 1.0),
            Array2::from_elem((4, 5), 1.0),
            Array2::from_elem((4, 5), 1.0),
        );
        assert!(res.is_err());
    }

    #[test]
    fn test_latitude_beyond_pole_rejected() {
        let lon = Array2::zeros((4, 4));
        let lat = Array2::from_shape_fn((4, 4), |(j, _)| 88.0 + j as f64);
        let res = CurvilinearGrid::new(
            lon,
            lat,
            Array2::from_elem((4, 4), true),
            Array2::from_elem((4, 4), 1.0),
            Array2::from_elem((4, 4), 1.0),
            Array2::from_elem((4, 4), 1.0),
        );
        assert!(matches!(res, Err(MdError::OutOfRange { field: "lat", .. })));
    }
}
