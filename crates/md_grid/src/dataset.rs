// crates/md_grid/src/dataset.rs

//! Dataset - 网格、垂向坐标与时变场的组合
//!
//! 数据集持有一个时间窗 `[t0, t1)`（逆向追踪时为 `(t1, t0]`）以及窗口两端的
//! 场记录。每个时间步开始前由驱动器调用一次 [`Dataset::refresh`]，之后所有粒子
//! 并发地只读采样。
//!
//! # 示例
//!
//! ```
//! use md_grid::{names, synthetic::RectilinearBuilder, GridCoord, GridProvider};
//!
//! let mut ds = RectilinearBuilder::new(10, 10)
//!     .uniform_current(1.0, 0.0)
//!     .records(0.0, 3600.0, 3)
//!     .build()
//!     .unwrap();
//! ds.require(names::U).unwrap();
//! ds.setup(0.0, false).unwrap();
//! let u = ds.sample(names::U, &GridCoord::new_2d(5.0, 5.0), 100.0);
//! assert!((u - 1.0).abs() < 1e-12);
//! ```

use std::collections::BTreeMap;

use md_foundation::{ensure, require, MdError, MdResult};
use tracing::{debug, info};

use crate::curvilinear::CurvilinearGrid;
use crate::field::{GriddedField, Staggering};
use crate::point::{GeoCoord, GridCoord};
use crate::provider::GridProvider;
use crate::sigma::VerticalGrid;
use crate::source::{FieldSource, SourceChain};

/// 常用变量名
pub mod names {
    /// 东向流速 [m/s]
    pub const U: &str = "u";
    /// 北向流速 [m/s]
    pub const V: &str = "v";
    /// 垂向流速 [m/s]
    pub const W: &str = "w";
    /// 水温 [°C]
    pub const TEMP: &str = "temp";
    /// 盐度 [PSU]
    pub const SALT: &str = "salt";
    /// 垂向扩散系数 [m²/s]
    pub const AKT: &str = "AKt";
}

/// 时间窗
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    /// `t0` 对应的全局记录号
    pub rank: usize,
    /// 窗口起点 [s]
    pub t0: f64,
    /// 窗口终点 [s]（逆向追踪时早于 `t0`）
    pub t1: f64,
}

impl TimeWindow {
    /// 记录间隔 [s]
    #[inline]
    pub fn interval(&self) -> f64 {
        (self.t1 - self.t0).abs()
    }

    /// `t1` 的时间权重，夹紧到 [0, 1]
    #[inline]
    pub fn frac(&self, time: f64) -> f64 {
        let dt = self.interval();
        if dt <= 0.0 {
            return 0.0;
        }
        ((dt - (self.t1 - time).abs()) / dt).clamp(0.0, 1.0)
    }
}

/// 数据集
#[derive(Debug)]
pub struct Dataset {
    grid: CurvilinearGrid,
    vertical: Option<VerticalGrid>,
    chain: SourceChain,
    fields: BTreeMap<String, GriddedField>,
    window: Option<TimeWindow>,
    backward: bool,
}

impl Dataset {
    /// 由网格、可选垂向网格（`None` 为二维）与数据源构造
    pub fn new(
        grid: CurvilinearGrid,
        vertical: Option<VerticalGrid>,
        sources: Vec<Box<dyn FieldSource>>,
    ) -> MdResult<Self> {
        let chain = SourceChain::new(sources)?;
        Ok(Self {
            grid,
            vertical,
            chain,
            fields: BTreeMap::new(),
            window: None,
            backward: false,
        })
    }

    /// 水平网格
    pub fn grid(&self) -> &CurvilinearGrid {
        &self.grid
    }

    /// 垂向网格
    pub fn vertical(&self) -> Option<&VerticalGrid> {
        self.vertical.as_ref()
    }

    /// 全部记录时刻
    pub fn record_times(&self) -> &[f64] {
        self.chain.times()
    }

    /// 记录覆盖的时间范围
    pub fn time_range(&self) -> (f64, f64) {
        let t = self.chain.times();
        (t[0], t[t.len() - 1])
    }

    /// 当前时间窗
    pub fn window(&self) -> Option<TimeWindow> {
        self.window
    }

    /// 是否逆向
    pub fn is_backward(&self) -> bool {
        self.backward
    }

    /// 数据源是否提供该变量
    pub fn provides(&self, name: &str) -> bool {
        self.chain.variable(name).is_some()
    }

    /// 已加载的变量名
    pub fn loaded_fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// 已加载的场
    pub fn field(&self, name: &str) -> Option<&GriddedField> {
        self.fields.get(name)
    }

    /// 登记必需变量；数据源不提供时返回 `MissingVariable`
    ///
    /// 时间窗已建立时立即加载该变量。
    pub fn require(&mut self, name: &str) -> MdResult<()> {
        let staggering = require!(self.chain.variable(name), MdError::missing_variable(name));
        if self.fields.contains_key(name) {
            return Ok(());
        }
        match self.window {
            Some(w) => {
                let field = self.load_field(name, staggering, w.rank)?;
                self.fields.insert(name.to_string(), field);
            }
            None => {
                // 占位，setup 时统一加载
                let empty = GriddedField::new(name, staggering, Default::default(), Default::default())?;
                self.fields.insert(name.to_string(), empty);
            }
        }
        Ok(())
    }

    /// 建立初始时间窗并加载全部已登记变量
    pub fn setup(&mut self, time: f64, backward: bool) -> MdResult<TimeWindow> {
        self.backward = backward;
        let rank = self.locate(time)?;
        self.reload(rank)?;
        let window = self.window_at(rank);
        self.window = Some(window);
        info!(
            "数据集时间窗: [{}, {}], 变量: {:?}",
            window.t0,
            window.t1,
            self.fields.keys().collect::<Vec<_>>()
        );
        Ok(window)
    }

    /// 推进时间窗使其包含 `time`，返回窗口是否移动
    ///
    /// 前移恰好一条记录时复用旧的 `tp1`，否则整体重读。
    pub fn refresh(&mut self, time: f64) -> MdResult<bool> {
        let current = require!(self.window, MdError::internal("数据集尚未建立时间窗"));
        let rank = self.locate(time)?;
        if rank == current.rank {
            return Ok(false);
        }

        let advanced_one = if self.backward {
            rank + 1 == current.rank
        } else {
            rank == current.rank + 1
        };

        if advanced_one {
            let next = self.neighbor(rank);
            let names: Vec<String> = self.fields.keys().cloned().collect();
            for name in names {
                let record = self.chain.read(&name, next)?;
                if let Some(field) = self.fields.get_mut(&name) {
                    field.shift(record)?;
                }
            }
        } else {
            self.reload(rank)?;
        }

        let window = self.window_at(rank);
        self.window = Some(window);
        debug!(
            "时间窗更新: [{}, {}] ({})",
            window.t0,
            window.t1,
            self.chain.label_of(self.neighbor(rank))
        );
        Ok(true)
    }

    // ========================================================================
    // 内部
    // ========================================================================

    fn neighbor(&self, rank: usize) -> usize {
        if self.backward {
            rank - 1
        } else {
            rank + 1
        }
    }

    fn window_at(&self, rank: usize) -> TimeWindow {
        let t = self.chain.times();
        TimeWindow {
            rank,
            t0: t[rank],
            t1: t[self.neighbor(rank)],
        }
    }

    /// 找到包含 `time` 的时间窗起点记录号
    fn locate(&self, time: f64) -> MdResult<usize> {
        let t = self.chain.times();
        let n = t.len();
        let (first, last) = (t[0], t[n - 1]);
        ensure!(
            time >= first && time <= last,
            MdError::time_out_of_range(time, first, last)
        );
        let rank = if self.backward {
            t.partition_point(|r| *r < time).max(1)
        } else {
            (t.partition_point(|r| *r <= time) - 1).min(n - 2)
        };
        Ok(rank)
    }

    fn reload(&mut self, rank: usize) -> MdResult<()> {
        let specs: Vec<(String, Staggering)> = self
            .fields
            .iter()
            .map(|(k, f)| (k.clone(), f.staggering()))
            .collect();
        for (name, staggering) in specs {
            let field = self.load_field(&name, staggering, rank)?;
            self.fields.insert(name, field);
        }
        Ok(())
    }

    fn load_field(&self, name: &str, staggering: Staggering, rank: usize) -> MdResult<GriddedField> {
        let tp0 = self.chain.read(name, rank)?;
        let tp1 = self.chain.read(name, self.neighbor(rank))?;
        let expected = staggering.shape(self.grid.nx(), self.grid.ny(), self.nz());
        // 二维变量（如海表高度）在三维网格上允许单层
        let flat = (1, expected.1, expected.2);
        ensure!(
            tp0.dim() == expected || tp0.dim() == flat,
            MdError::invalid_input(format!(
                "变量 {name} 形状 {:?} 与网格期望 {:?} 不符",
                tp0.dim(),
                expected
            ))
        );
        GriddedField::new(name, staggering, tp0, tp1)
    }
}

// ============================================================================
// GridProvider 实现
// ============================================================================

impl GridProvider for Dataset {
    fn nx(&self) -> usize {
        self.grid.nx()
    }

    fn ny(&self) -> usize {
        self.grid.ny()
    }

    fn nz(&self) -> Option<usize> {
        self.vertical.as_ref().map(VerticalGrid::nz)
    }

    fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    fn sample(&self, name: &str, p: &GridCoord, time: f64) -> f64 {
        let (Some(field), Some(window)) = (self.fields.get(name), self.window) else {
            return f64::NAN;
        };
        let coastal = self.grid.is_close_to_coast(p.x, p.y);
        field.sample(p.x, p.y, p.z, window.frac(time), coastal)
    }

    fn dxi(&self, j: isize, i: isize) -> f64 {
        self.grid.dxi(j, i)
    }

    fn deta(&self, j: isize, i: isize) -> f64 {
        self.grid.deta(j, i)
    }

    fn is_on_edge(&self, p: &GridCoord) -> bool {
        self.grid.is_on_edge(p.x, p.y)
    }

    fn is_in_water(&self, p: &GridCoord) -> bool {
        self.grid.is_in_water(p.x, p.y)
    }

    fn is_close_to_coast(&self, p: &GridCoord) -> bool {
        self.grid.is_close_to_coast(p.x, p.y)
    }

    fn depth_to_z(&self, x: f64, y: f64, depth: f64) -> f64 {
        self.vertical
            .as_ref()
            .map_or(f64::NAN, |v| v.depth_to_z(&self.grid, x, y, depth))
    }

    fn z_to_depth(&self, x: f64, y: f64, z: f64) -> f64 {
        self.vertical
            .as_ref()
            .map_or(f64::NAN, |v| v.z_to_depth(&self.grid, x, y, z))
    }

    fn bottom_depth(&self, x: f64, y: f64) -> f64 {
        -self.grid.bathymetry(x, y)
    }

    fn cell_thickness(&self, x: f64, y: f64, z: f64) -> f64 {
        self.vertical
            .as_ref()
            .map_or(f64::NAN, |v| v.cell_thickness(&self.grid, x, y, z))
    }

    fn grid_to_geo(&self, p: &GridCoord) -> GeoCoord {
        let ll = self.grid.xy_to_lonlat(p.x, p.y);
        let depth = p.z.map(|z| self.z_to_depth(p.x, p.y, z));
        GeoCoord::new(ll.x, ll.y, depth)
    }

    fn geo_to_grid(&self, g: &GeoCoord) -> Option<GridCoord> {
        let xy = self.grid.lonlat_to_xy(g.lon, g.lat)?;
        let z = self.vertical.as_ref().map(|v| match g.depth {
            Some(d) => v.depth_to_z(&self.grid, xy.x, xy.y, d),
            None => (v.nz() - 1) as f64,
        });
        Some(GridCoord { x: xy.x, y: xy.y, z })
    }
}
