// crates/md_grid/src/lib.rs

//! MariDrift Grid Layer
//!
//! 网格层，向粒子积分器提供只读的网格与环境场访问。
//!
//! # 模块概览
//!
//! - [`curvilinear`]: 曲线正交网格，坐标变换、陆地掩码、度量因子
//! - [`sigma`]: σ 垂向坐标与深度 ⇄ 垂向索引变换
//! - [`field`]: 交错网格上的时变场插值
//! - [`source`]: 数据源与多文件时间拼接
//! - [`dataset`]: 时间窗管理与 [`GridProvider`] 实现
//! - [`synthetic`]: 规则网格上的合成数据集
//! - [`point`]: 网格坐标、地理坐标与位移
//! - [`polygon`]: 点在多边形内判定
//!
//! # 并发约定
//!
//! 时间窗刷新需要 `&mut Dataset`，只在时间步之间进行；
//! 其余查询都通过 `&dyn GridProvider` 完成，可被多个线程同时调用。

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod curvilinear;
pub mod dataset;
pub mod field;
pub mod point;
pub mod polygon;
pub mod provider;
pub mod sigma;
pub mod source;
pub mod synthetic;

pub use curvilinear::CurvilinearGrid;
pub use dataset::{names, Dataset, TimeWindow};
pub use field::{GriddedField, Staggering};
pub use point::{Displacement, GeoCoord, GridCoord, GridPoint};
pub use provider::GridProvider;
pub use sigma::{SigmaDistribution, SigmaLevels, VerticalGrid};
pub use source::{FieldSource, InMemorySource, SourceChain};
pub use synthetic::RectilinearBuilder;

/// Prelude 模块，包含常用类型
pub mod prelude {
    pub use crate::dataset::{names, Dataset};
    pub use crate::point::{Displacement, GeoCoord, GridCoord, GridPoint};
    pub use crate::provider::GridProvider;
    pub use crate::synthetic::RectilinearBuilder;
}
