// crates/md_foundation/src/lib.rs

//! MariDrift Foundation Layer
//!
//! 基础层，为粒子追踪工作区提供统一的错误类型和校验宏。
//!
//! # 模块概览
//!
//! - [`error`]: 统一错误类型 `MdError` 与 `ensure!`/`require!` 宏
//!
//! # 示例
//!
//! ```
//! use md_foundation::prelude::*;
//!
//! fn cell_count(nx: usize, ny: usize) -> MdResult<usize> {
//!     ensure!(nx >= 2 && ny >= 2, MdError::invalid_grid("网格至少需要 2×2 个点"));
//!     Ok(nx * ny)
//! }
//! assert_eq!(cell_count(3, 4).unwrap(), 12);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;

pub use error::{MdError, MdResult};

/// Prelude 模块，包含常用类型
pub mod prelude {
    pub use crate::error::{MdError, MdResult};
    pub use crate::{ensure, require};
}
