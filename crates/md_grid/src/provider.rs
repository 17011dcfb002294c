// crates/md_grid/src/provider.rs

//! GridProvider - 积分器与过程管线使用的只读网格接口
//!
//! 所有方法均为纯函数，可在多个线程中并发调用；越界或无效输入以 NaN
//! 或 `false`/`true` 的边界信号表示，不返回错误。

use crate::point::{GeoCoord, GridCoord};

/// 只读网格与场采样接口
pub trait GridProvider: Send + Sync {
    /// x 方向点数
    fn nx(&self) -> usize;

    /// y 方向点数
    fn ny(&self) -> usize;

    /// ρ 层数，二维返回 `None`
    fn nz(&self) -> Option<usize>;

    /// 是否三维
    fn is_3d(&self) -> bool {
        self.nz().is_some()
    }

    /// 是否存在已加载的变量
    fn has_field(&self, name: &str) -> bool;

    /// 在网格坐标与时刻处采样变量，失败返回 NaN
    fn sample(&self, name: &str, p: &GridCoord, time: f64) -> f64;

    /// x 方向单元尺度 [m]
    fn dxi(&self, j: isize, i: isize) -> f64;

    /// y 方向单元尺度 [m]
    fn deta(&self, j: isize, i: isize) -> f64;

    /// 是否处于计算域边缘
    fn is_on_edge(&self, p: &GridCoord) -> bool;

    /// 是否位于水点
    fn is_in_water(&self, p: &GridCoord) -> bool;

    /// 是否靠近岸线
    fn is_close_to_coast(&self, p: &GridCoord) -> bool;

    /// 深度 → 垂向索引（二维返回 NaN）
    fn depth_to_z(&self, x: f64, y: f64, depth: f64) -> f64;

    /// 垂向索引 → 深度（二维返回 NaN）
    fn z_to_depth(&self, x: f64, y: f64, z: f64) -> f64;

    /// 底床深度 [m]（负值）
    fn bottom_depth(&self, x: f64, y: f64) -> f64;

    /// 所在层的厚度 [m]（二维返回 NaN）
    fn cell_thickness(&self, x: f64, y: f64, z: f64) -> f64;

    /// 网格坐标 → 地理坐标
    fn grid_to_geo(&self, p: &GridCoord) -> GeoCoord;

    /// 地理坐标 → 网格坐标，位于网格外时返回 `None`
    ///
    /// 三维且未给出深度时置于最浅层。
    fn geo_to_grid(&self, g: &GeoCoord) -> Option<GridCoord>;
}
