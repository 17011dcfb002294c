// crates/md_lagrange/src/integrators/mod.rs

//! 积分核
//!
//! 纯函数：给定网格、粒子网格坐标、时刻与步长，返回网格索引单位的位移。
//! 二维时位移的垂向分量为 `None`。
//!
//! - [`advection`]: Euler / RK4 平流，逆向预估校正
//! - [`dispersion`]: 水平随机游走与 Visser 垂向随机位移

pub mod advection;
pub mod dispersion;

pub use advection::{advect, advect_euler, advect_rk4};
pub use dispersion::{horizontal_dispersion, reflect_vertical, vertical_dispersion};
