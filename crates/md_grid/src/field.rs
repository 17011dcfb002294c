// crates/md_grid/src/field.rs

//! 时变网格场
//!
//! `GriddedField` 缓存相邻两个时刻的记录 `tp0`/`tp1`（形状 `[k, j, i]`），
//! 在分数网格坐标上做双线性/三线性空间插值，再按时间权重线性混合。
//!
//! # 交错网格
//!
//! C 网格上速度分量相对 ρ 点偏移半格。采样时先减去偏移得到数组坐标；
//! 在交错方向上，外缘 ρ 点与首个面之间的半格被夹紧到数组范围内。
//!
//! # 越界
//!
//! 水平方向超出数组范围时返回 NaN，不会 panic，由调用方视作离开计算域。
//! 模板中取值非有限的节点（陆地填充）被跳过，权重按实际使用的节点归一化；
//! 全部节点都被跳过时同样返回 NaN。

use ndarray::Array3;
use serde::{Deserialize, Serialize};

use md_foundation::{ensure, MdError, MdResult};

/// 变量在 C 网格上的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Staggering {
    /// ρ 点（标量）
    #[default]
    Rho,
    /// u 点：x 方向偏移 +½
    U,
    /// v 点：y 方向偏移 +½
    V,
    /// w 点：垂向位于层界面，偏移 −½，共 nz+1 层
    W,
}

impl Staggering {
    /// 数组元素相对 ρ 网格坐标的偏移 (x, y, z)
    #[inline]
    pub fn offset(self) -> (f64, f64, f64) {
        match self {
            Staggering::Rho => (0.0, 0.0, 0.0),
            Staggering::U => (0.5, 0.0, 0.0),
            Staggering::V => (0.0, 0.5, 0.0),
            Staggering::W => (0.0, 0.0, -0.5),
        }
    }

    /// 期望的数组形状 `(nk, nj, ni)`；`nz = None` 表示二维
    pub fn shape(self, nx: usize, ny: usize, nz: Option<usize>) -> (usize, usize, usize) {
        let nk = nz.unwrap_or(1);
        match self {
            Staggering::Rho => (nk, ny, nx),
            Staggering::U => (nk, ny, nx - 1),
            Staggering::V => (nk, ny - 1, nx),
            Staggering::W => (nz.map_or(1, |n| n + 1), ny, nx),
        }
    }
}

/// 双时刻缓存的网格场
#[derive(Debug, Clone)]
pub struct GriddedField {
    name: String,
    staggering: Staggering,
    tp0: Array3<f64>,
    tp1: Array3<f64>,
}

impl GriddedField {
    /// 由两条记录构造，形状必须一致
    pub fn new(
        name: impl Into<String>,
        staggering: Staggering,
        tp0: Array3<f64>,
        tp1: Array3<f64>,
    ) -> MdResult<Self> {
        let name = name.into();
        ensure!(
            tp0.dim() == tp1.dim(),
            MdError::invalid_input(format!("变量 {name} 前后两条记录形状不一致"))
        );
        Ok(Self {
            name,
            staggering,
            tp0,
            tp1,
        })
    }

    /// 变量名
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 交错位置
    pub fn staggering(&self) -> Staggering {
        self.staggering
    }

    /// 数组形状 `(nk, nj, ni)`
    pub fn dim(&self) -> (usize, usize, usize) {
        self.tp0.dim()
    }

    /// 时间窗前移一条记录：旧的 `tp1` 成为 `tp0`
    pub(crate) fn shift(&mut self, next: Array3<f64>) -> MdResult<()> {
        MdError::check_size("record", self.tp1.len(), next.len())?;
        self.tp0 = std::mem::replace(&mut self.tp1, next);
        Ok(())
    }

    /// 直接读取某条记录上的节点值
    pub fn value_at(&self, record: usize, k: usize, j: usize, i: usize) -> Option<f64> {
        match record {
            0 => self.tp0.get((k, j, i)).copied(),
            1 => self.tp1.get((k, j, i)).copied(),
            _ => None,
        }
    }

    /// 在分数网格坐标处插值
    ///
    /// * `frac` - 时间权重，0 对应 `tp0`，1 对应 `tp1`
    /// * `coastal` - 近岸时非交错的水平方向退化为最近点
    pub fn sample(&self, x: f64, y: f64, z: Option<f64>, frac: f64, coastal: bool) -> f64 {
        let (ox, oy, oz) = self.staggering.offset();
        let (nk, nj, ni) = self.tp0.dim();

        let Some(ax) = array_coord(x - ox, ni, ox != 0.0) else {
            return f64::NAN;
        };
        let Some(ay) = array_coord(y - oy, nj, oy != 0.0) else {
            return f64::NAN;
        };
        let az = match z {
            Some(z) if nk > 1 && z.is_finite() => (z - oz).clamp(0.0, (nk - 1) as f64),
            Some(z) if !z.is_finite() => return f64::NAN,
            _ => 0.0,
        };

        let (i, dx, ni_st) = stencil_axis(ax, coastal && ox == 0.0);
        let (j, dy, nj_st) = stencil_axis(ay, coastal && oy == 0.0);
        let (k, dz, nk_st) = stencil_axis(az, nk == 1);

        let mut sum = 0.0;
        let mut co = 0.0;
        for kk in 0..nk_st {
            for jj in 0..nj_st {
                for ii in 0..ni_st {
                    let w = ((1.0 - ii as f64 - dx) * (1.0 - jj as f64 - dy) * (1.0 - kk as f64 - dz)).abs();
                    if w == 0.0 {
                        continue;
                    }
                    let idx = (k + kk, j + jj, i + ii);
                    let (Some(&v0), Some(&v1)) = (self.tp0.get(idx), self.tp1.get(idx)) else {
                        return f64::NAN;
                    };
                    // 陆地节点的填充值不参与插值
                    if !v0.is_finite() || !v1.is_finite() {
                        continue;
                    }
                    sum += w * ((1.0 - frac) * v0 + frac * v1);
                    co += w;
                }
            }
        }

        if co > 0.0 {
            sum / co
        } else {
            f64::NAN
        }
    }
}

/// 网格坐标 → 数组坐标；交错方向允许越出半格并夹紧
#[inline]
fn array_coord(a: f64, n: usize, staggered: bool) -> Option<f64> {
    if !a.is_finite() {
        return None;
    }
    let max = (n - 1) as f64;
    let slack = if staggered { 0.5 } else { 0.0 };
    if a < -slack || a > max + slack {
        None
    } else {
        Some(a.clamp(0.0, max))
    }
}

/// 单轴模板：返回 (起始索引, 分数, 模板宽度)
#[inline]
fn stencil_axis(a: f64, nearest: bool) -> (usize, f64, usize) {
    if nearest {
        (a.round() as usize, 0.0, 1)
    } else {
        let i = a.floor();
        (i as usize, a - i, 2)
    }
}
