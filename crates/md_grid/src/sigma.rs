// crates/md_grid/src/sigma.rs

//! σ 垂向坐标
//!
//! 地形跟随坐标，层序自底向上：
//! - 界面 `sigma_w[0] = -1`（底床），`sigma_w[nz] = 0`（水面）
//! - ρ 层 `k` 位于界面 `k` 与 `k+1` 之间，`k = 0` 最深，`k = nz-1` 最浅
//!
//! 网格垂向索引 `z` 与 ρ 层对齐：`z = k` 即第 `k` 层中心，
//! 有效范围 `[0, nz-1]`。
//!
//! # 分布类型
//!
//! - 均匀分布：等间距层
//! - 对数分布：底部加密（边界层解析）

use serde::{Deserialize, Serialize};

use md_foundation::{ensure, MdError, MdResult};

use crate::curvilinear::CurvilinearGrid;

/// σ 层分布类型
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum SigmaDistribution {
    /// 均匀分布
    #[default]
    Uniform,
    /// 对数分布（底部加密）
    Logarithmic {
        /// 加密因子（>1 加密底部）
        factor: f64,
    },
}

/// σ 坐标定义
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigmaLevels {
    nz: usize,
    /// 界面 σ 值（长度 nz+1，自底向上递增）
    sigma_w: Vec<f64>,
    /// 层中心 σ 值（长度 nz）
    sigma_rho: Vec<f64>,
    distribution: SigmaDistribution,
}

impl SigmaLevels {
    /// 均匀分布
    pub fn uniform(nz: usize) -> MdResult<Self> {
        Self::new(nz, SigmaDistribution::Uniform)
    }

    /// 对数分布（底部加密）
    pub fn logarithmic(nz: usize, factor: f64) -> MdResult<Self> {
        Self::new(nz, SigmaDistribution::Logarithmic { factor })
    }

    /// 根据分布类型创建，至少需要 2 层
    pub fn new(nz: usize, distribution: SigmaDistribution) -> MdResult<Self> {
        ensure!(nz >= 2, MdError::invalid_grid(format!("σ 坐标至少需要 2 层，实际 {nz}")));

        let sigma_w: Vec<f64> = (0..=nz)
            .map(|m| {
                let xi = m as f64 / nz as f64;
                let stretched = match distribution {
                    SigmaDistribution::Uniform => xi,
                    SigmaDistribution::Logarithmic { factor } => {
                        let f = factor.max(1.0);
                        ((f * xi).exp() - 1.0) / (f.exp() - 1.0)
                    }
                };
                stretched - 1.0
            })
            .collect();

        let sigma_rho = sigma_w.windows(2).map(|w| 0.5 * (w[0] + w[1])).collect();

        Ok(Self {
            nz,
            sigma_w,
            sigma_rho,
            distribution,
        })
    }

    /// ρ 层数
    #[inline]
    pub fn nz(&self) -> usize {
        self.nz
    }

    /// 层中心 σ 值
    #[inline]
    pub fn sigma_at_rho(&self, k: usize) -> f64 {
        self.sigma_rho[k]
    }

    /// 界面 σ 值
    #[inline]
    pub fn sigma_at_w(&self, m: usize) -> f64 {
        self.sigma_w[m]
    }

    /// 层厚度（无量纲）
    #[inline]
    pub fn thickness_sigma(&self, k: usize) -> f64 {
        self.sigma_w[k + 1] - self.sigma_w[k]
    }

    /// 分布类型
    pub fn distribution(&self) -> SigmaDistribution {
        self.distribution
    }
}

// ============================================================================
// 垂向网格
// ============================================================================

/// 结合水深的垂向网格，提供深度 ⇄ 垂向索引变换
#[derive(Debug, Clone)]
pub struct VerticalGrid {
    levels: SigmaLevels,
}

impl VerticalGrid {
    /// 由 σ 分层构造
    pub fn new(levels: SigmaLevels) -> Self {
        Self { levels }
    }

    /// σ 分层
    pub fn levels(&self) -> &SigmaLevels {
        &self.levels
    }

    /// ρ 层数
    #[inline]
    pub fn nz(&self) -> usize {
        self.levels.nz
    }

    /// 第 k 层中心在 (x, y) 处的深度 [m]
    #[inline]
    pub fn depth_at_level(&self, grid: &CurvilinearGrid, x: f64, y: f64, k: usize) -> f64 {
        self.levels.sigma_rho[k] * grid.bathymetry(x, y)
    }

    /// 底床深度 [m]（负值）
    #[inline]
    pub fn bottom_depth(&self, grid: &CurvilinearGrid, x: f64, y: f64) -> f64 {
        -grid.bathymetry(x, y)
    }

    /// 垂向索引 → 深度，在相邻两层间线性插值
    pub fn z_to_depth(&self, grid: &CurvilinearGrid, x: f64, y: f64, z: f64) -> f64 {
        let top = (self.nz() - 1) as f64;
        let kz = z.clamp(0.0, top);
        let k = (kz.floor() as usize).min(self.nz() - 2);
        let dz = kz - k as f64;
        let sigma = (1.0 - dz) * self.levels.sigma_rho[k] + dz * self.levels.sigma_rho[k + 1];
        sigma * grid.bathymetry(x, y)
    }

    /// 深度 → 垂向索引
    ///
    /// 从最浅层向下搜索首个不深于目标深度的层，再与上一层线性插值；
    /// 浅于最浅层中心返回 `nz-1`，深于最深层中心返回 0。
    pub fn depth_to_z(&self, grid: &CurvilinearGrid, x: f64, y: f64, depth: f64) -> f64 {
        let h = grid.bathymetry(x, y);
        if !h.is_finite() || !depth.is_finite() {
            return f64::NAN;
        }
        let level = |k: usize| self.levels.sigma_rho[k] * h;

        let top = self.nz() - 1;
        if depth >= level(top) {
            return top as f64;
        }
        let mut k = top;
        while k > 0 && level(k) > depth {
            k -= 1;
        }
        if level(k) > depth {
            return 0.0;
        }
        let lower = level(k);
        let upper = level(k + 1);
        (k as f64 + (depth - lower) / (upper - lower)).max(0.0)
    }

    /// (x, y, z) 所在层的厚度 [m]
    pub fn cell_thickness(&self, grid: &CurvilinearGrid, x: f64, y: f64, z: f64) -> f64 {
        let k = z.round().clamp(0.0, (self.nz() - 1) as f64) as usize;
        self.levels.thickness_sigma(k) * grid.bathymetry(x, y)
    }
}
