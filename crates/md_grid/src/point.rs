// crates/md_grid/src/point.rs

//! 网格坐标、地理坐标与位移
//!
//! 二维模式下垂向分量为 `None`，而不是取零值；所有位移运算保持这一约定。

use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul};

use crate::provider::GridProvider;

/// 网格坐标（连续的分数索引）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridCoord {
    /// x 方向索引
    pub x: f64,
    /// y 方向索引
    pub y: f64,
    /// 垂向索引，二维为 `None`
    pub z: Option<f64>,
}

impl GridCoord {
    /// 二维坐标
    #[inline]
    pub const fn new_2d(x: f64, y: f64) -> Self {
        Self { x, y, z: None }
    }

    /// 三维坐标
    #[inline]
    pub const fn new_3d(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z: Some(z) }
    }

    /// 水平分量
    #[inline]
    pub fn horizontal(&self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }

    /// 是否三维
    #[inline]
    pub fn is_3d(&self) -> bool {
        self.z.is_some()
    }

    /// 所有分量均有限
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.map_or(true, f64::is_finite)
    }

    /// 平移后的新坐标
    #[inline]
    pub fn translated(&self, d: &Displacement) -> Self {
        let h = self.horizontal() + d.horizontal;
        Self {
            x: h.x,
            y: h.y,
            z: self.z.map(|z| z + d.dz()),
        }
    }
}

/// 地理坐标
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoord {
    /// 经度 [°E]
    pub lon: f64,
    /// 纬度 [°N]
    pub lat: f64,
    /// 深度 [m]（≤ 0），二维为 `None`
    pub depth: Option<f64>,
}

impl GeoCoord {
    /// 构造地理坐标
    pub const fn new(lon: f64, lat: f64, depth: Option<f64>) -> Self {
        Self { lon, lat, depth }
    }
}

// ============================================================================
// 位移
// ============================================================================

/// 网格索引单位的位移
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Displacement {
    /// 水平位移
    pub horizontal: DVec2,
    /// 垂向位移，二维为 `None`
    pub vertical: Option<f64>,
}

impl Displacement {
    /// 构造位移
    #[inline]
    pub fn new(dx: f64, dy: f64, dz: Option<f64>) -> Self {
        Self {
            horizontal: DVec2::new(dx, dy),
            vertical: dz,
        }
    }

    /// 零位移，维数与参考坐标一致
    #[inline]
    pub fn zero_like(p: &GridCoord) -> Self {
        Self::new(0.0, 0.0, p.z.map(|_| 0.0))
    }

    /// x 分量
    #[inline]
    pub fn dx(&self) -> f64 {
        self.horizontal.x
    }

    /// y 分量
    #[inline]
    pub fn dy(&self) -> f64 {
        self.horizontal.y
    }

    /// 垂向分量（二维为 0）
    #[inline]
    pub fn dz(&self) -> f64 {
        self.vertical.unwrap_or(0.0)
    }

    /// 所有分量均有限
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.horizontal.is_finite() && self.vertical.map_or(true, f64::is_finite)
    }
}

impl Add for Displacement {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        let vertical = match (self.vertical, rhs.vertical) {
            (None, None) => None,
            (a, b) => Some(a.unwrap_or(0.0) + b.unwrap_or(0.0)),
        };
        Self {
            horizontal: self.horizontal + rhs.horizontal,
            vertical,
        }
    }
}

impl Mul<f64> for Displacement {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self {
            horizontal: self.horizontal * rhs,
            vertical: self.vertical.map(|v| v * rhs),
        }
    }
}

impl Div<f64> for Displacement {
    type Output = Self;

    fn div(self, rhs: f64) -> Self {
        Self {
            horizontal: self.horizontal / rhs,
            vertical: self.vertical.map(|v| v / rhs),
        }
    }
}

// ============================================================================
// 双坐标点
// ============================================================================

/// 同时持有网格坐标和地理坐标的位置
///
/// 外部修改其中一种表示后，需调用对应的同步方法才能读取另一种。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridPoint {
    /// 网格坐标
    pub grid: GridCoord,
    /// 地理坐标
    pub geo: GeoCoord,
}

impl GridPoint {
    /// 由网格坐标构造并同步地理坐标
    pub fn from_grid<G: GridProvider + ?Sized>(grid: GridCoord, provider: &G) -> Self {
        let geo = provider.grid_to_geo(&grid);
        Self { grid, geo }
    }

    /// 由地理坐标构造；位于网格外时返回 `None`
    pub fn from_geo<G: GridProvider + ?Sized>(geo: GeoCoord, provider: &G) -> Option<Self> {
        provider.geo_to_grid(&geo).map(|grid| Self { grid, geo })
    }

    /// 网格 → 地理
    pub fn sync_geo<G: GridProvider + ?Sized>(&mut self, provider: &G) {
        self.geo = provider.grid_to_geo(&self.grid);
    }

    /// 地理 → 网格；位于网格外时保持原网格坐标并返回 `false`
    pub fn sync_grid<G: GridProvider + ?Sized>(&mut self, provider: &G) -> bool {
        match provider.geo_to_grid(&self.geo) {
            Some(grid) => {
                self.grid = grid;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_displacement_keeps_dimension() {
        let a = Displacement::new(1.0, 2.0, None);
        let b = Displacement::new(0.5, 0.5, None);
        assert!((a + b).vertical.is_none());

        let c = Displacement::new(0.0, 0.0, Some(1.0));
        assert_eq!((a + c).vertical, Some(1.0));
        assert_eq!((c * 0.5).vertical, Some(0.5));
    }

    #[test]
    fn test_translate_2d_ignores_vertical() {
        let p = GridCoord::new_2d(1.0, 1.0);
        let q = p.translated(&Displacement::new(0.5, -0.5, Some(3.0)));
        assert!((q.x - 1.5).abs() < 1e-12);
        assert!((q.y - 0.5).abs() < 1e-12);
        assert!(q.z.is_none());
    }

    #[test]
    fn test_nan_is_not_finite() {
        let p = GridCoord::new_3d(1.0, 2.0, f64::NAN);
        assert!(!p.is_finite());
        assert!(!Displacement::new(f64::NAN, 0.0, None).is_finite());
    }
}
