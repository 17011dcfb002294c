// crates/md_grid/src/synthetic.rs

//! 规则经纬网格上的合成数据集
//!
//! 用于场景测试与命令行演示：等间距经纬度、常数度量因子、平底地形，
//! 可挖出矩形陆地块，变量可为常量或 `(t, k, j, i)` 的函数。

use glam::DVec2;
use ndarray::{Array2, Array3};

use md_foundation::{ensure, MdError, MdResult};

use crate::curvilinear::CurvilinearGrid;
use crate::dataset::{names, Dataset};
use crate::field::Staggering;
use crate::sigma::{SigmaDistribution, SigmaLevels, VerticalGrid};
use crate::source::{FieldSource, InMemorySource};

/// 按 `(t, k, j, i)` 求值的场函数
pub type FieldFn = Box<dyn Fn(f64, usize, usize, usize) -> f64 + Send + Sync>;

enum FieldSpec {
    Uniform(f64),
    Function(FieldFn),
}

/// 合成数据集构建器
pub struct RectilinearBuilder {
    nx: usize,
    ny: usize,
    nz: Option<usize>,
    distribution: SigmaDistribution,
    origin: DVec2,
    spacing: DVec2,
    cell_size: f64,
    depth: f64,
    land: Vec<[usize; 4]>,
    first_record: f64,
    interval: f64,
    count: usize,
    fields: Vec<(String, Staggering, FieldSpec)>,
}

impl RectilinearBuilder {
    /// `nx × ny` 的二维网格，默认 1 km 单元、100 m 水深、两条间隔一天的记录
    pub fn new(nx: usize, ny: usize) -> Self {
        Self {
            nx,
            ny,
            nz: None,
            distribution: SigmaDistribution::Uniform,
            origin: DVec2::ZERO,
            spacing: DVec2::splat(0.01),
            cell_size: 1000.0,
            depth: 100.0,
            land: Vec::new(),
            first_record: 0.0,
            interval: 86_400.0,
            count: 2,
            fields: Vec::new(),
        }
    }

    /// 设置 σ 层数，使数据集成为三维
    pub fn layers(mut self, nz: usize) -> Self {
        self.nz = Some(nz);
        self
    }

    /// σ 层分布
    pub fn sigma(mut self, distribution: SigmaDistribution) -> Self {
        self.distribution = distribution;
        self
    }

    /// 网格原点经纬度
    pub fn origin(mut self, lon: f64, lat: f64) -> Self {
        self.origin = DVec2::new(lon, lat);
        self
    }

    /// 经纬度间距 [°]
    pub fn spacing(mut self, dlon: f64, dlat: f64) -> Self {
        self.spacing = DVec2::new(dlon, dlat);
        self
    }

    /// 单元边长 [m]
    pub fn cell_size(mut self, meters: f64) -> Self {
        self.cell_size = meters;
        self
    }

    /// 水深 [m]
    pub fn depth(mut self, meters: f64) -> Self {
        self.depth = meters;
        self
    }

    /// 把闭区间 `[i0, i1] × [j0, j1]` 的节点设为陆地
    pub fn land(mut self, i0: usize, i1: usize, j0: usize, j1: usize) -> Self {
        self.land.push([i0, i1, j0, j1]);
        self
    }

    /// 记录时刻 `first + r·interval`，共 `count` 条
    pub fn records(mut self, first: f64, interval: f64, count: usize) -> Self {
        self.first_record = first;
        self.interval = interval;
        self.count = count;
        self
    }

    /// 常量变量
    pub fn uniform(mut self, name: &str, staggering: Staggering, value: f64) -> Self {
        self.fields
            .push((name.to_string(), staggering, FieldSpec::Uniform(value)));
        self
    }

    /// 均匀水平流
    pub fn uniform_current(self, u: f64, v: f64) -> Self {
        self.uniform(names::U, Staggering::U, u)
            .uniform(names::V, Staggering::V, v)
    }

    /// 由函数给出的变量
    pub fn field_fn<F>(mut self, name: &str, staggering: Staggering, f: F) -> Self
    where
        F: Fn(f64, usize, usize, usize) -> f64 + Send + Sync + 'static,
    {
        self.fields
            .push((name.to_string(), staggering, FieldSpec::Function(Box::new(f))));
        self
    }

    /// 构建数据集
    pub fn build(self) -> MdResult<Dataset> {
        let (nx, ny) = (self.nx, self.ny);
        ensure!(
            self.cell_size > 0.0 && self.depth > 0.0,
            MdError::invalid_input("单元边长与水深必须为正")
        );
        ensure!(
            self.interval > 0.0,
            MdError::invalid_input("记录间隔必须为正")
        );

        let lon = Array2::from_shape_fn((ny, nx), |(_, i)| self.origin.x + i as f64 * self.spacing.x);
        let lat = Array2::from_shape_fn((ny, nx), |(j, _)| self.origin.y + j as f64 * self.spacing.y);
        let mut mask = Array2::from_elem((ny, nx), true);
        for [i0, i1, j0, j1] in &self.land {
            for j in *j0..=(*j1).min(ny.saturating_sub(1)) {
                for i in *i0..=(*i1).min(nx.saturating_sub(1)) {
                    mask[[j, i]] = false;
                }
            }
        }
        let metric = Array2::from_elem((ny, nx), 1.0 / self.cell_size);
        let h = Array2::from_elem((ny, nx), self.depth);
        let grid = CurvilinearGrid::new(lon, lat, mask, metric.clone(), metric, h)?;

        let vertical = self
            .nz
            .map(|nz| SigmaLevels::new(nz, self.distribution).map(VerticalGrid::new))
            .transpose()?;

        let times: Vec<f64> = (0..self.count)
            .map(|r| self.first_record + r as f64 * self.interval)
            .collect();
        let mut source = InMemorySource::new("synthetic", times.clone())?;
        for (name, staggering, spec) in self.fields {
            let shape = staggering.shape(nx, ny, self.nz);
            source = match spec {
                FieldSpec::Uniform(value) => source.with_constant(name, staggering, Array3::from_elem(shape, value)),
                FieldSpec::Function(f) => {
                    let records = times
                        .iter()
                        .map(|t| Array3::from_shape_fn(shape, |(k, j, i)| f(*t, k, j, i)))
                        .collect();
                    source.with_records(name, staggering, records)?
                }
            };
        }

        Dataset::new(grid, vertical, vec![Box::new(source) as Box<dyn FieldSource>])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::GridCoord;
    use crate::provider::GridProvider;

    #[test]
    fn test_land_block_masks_nodes() {
        let ds = RectilinearBuilder::new(10, 10).land(6, 9, 0, 9).build().unwrap();
        assert!(ds.is_in_water(&GridCoord::new_2d(5.0, 5.0)));
        assert!(!ds.is_in_water(&GridCoord::new_2d(6.0, 5.0)));
        assert!(ds.is_close_to_coast(&GridCoord::new_2d(5.2, 5.0)));
    }

    #[test]
    fn test_metrics_from_cell_size() {
        let ds = RectilinearBuilder::new(6, 6).cell_size(250.0).build().unwrap();
        assert!((ds.dxi(2, 2) - 250.0).abs() < 1e-9);
        assert!((ds.deta(2, 2) - 250.0).abs() < 1e-9);
    }

    #[test]
    fn test_time_varying_field() {
        let mut ds = RectilinearBuilder::new(6, 6)
            .records(0.0, 100.0, 2)
            .field_fn(names::TEMP, Staggering::Rho, |t, _, _, _| 10.0 + t / 100.0)
            .build()
            .unwrap();
        ds.require(names::TEMP).unwrap();
        ds.setup(0.0, false).unwrap();
        let v = ds.sample(names::TEMP, &GridCoord::new_2d(2.0, 2.0), 25.0);
        assert!((v - 10.25).abs() < 1e-12);
    }

    #[test]
    fn test_single_record_rejected() {
        assert!(RectilinearBuilder::new(6, 6).records(0.0, 1.0, 1).build().is_err());
    }
}
