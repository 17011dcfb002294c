// crates/md_foundation/src/error.rs

//! 错误处理模块，定义统一错误类型
//!
//! 提供 `MdError` 枚举和 `MdResult` 类型别名，覆盖网格、数据源与时间窗口等
//! 基础层错误。配置错误在 `md_config` 中定义，模拟装配错误在 `md_lagrange` 中定义。
//!
//! # 示例
//!
//! ```
//! use md_foundation::error::{MdError, MdResult};
//!
//! fn open_dataset() -> MdResult<()> {
//!     Err(MdError::missing_variable("temp"))
//! }
//! assert!(open_dataset().is_err());
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// 统一结果类型
pub type MdResult<T> = Result<T, MdError>;

/// MariDrift 基础错误类型
#[derive(Error, Debug)]
pub enum MdError {
    // ========================================================================
    // IO 相关错误
    // ========================================================================

    /// IO 错误
    #[error("IO错误: {message}")]
    Io {
        /// 描述性错误信息
        message: String,
        #[source]
        /// 可选的底层 IO 错误
        source: Option<std::io::Error>,
    },

    /// 文件不存在
    #[error("文件不存在: {path}")]
    FileNotFound {
        /// 未找到的路径
        path: PathBuf,
    },

    /// 文件解析错误
    #[error("文件解析错误: {file} 第{line}行: {message}")]
    ParseError {
        /// 文件路径
        file: PathBuf,
        /// 行号（从 1 开始）
        line: usize,
        /// 错误信息
        message: String,
    },

    // ========================================================================
    // 数据错误
    // ========================================================================

    /// 无效输入
    #[error("无效的输入数据: {message}")]
    InvalidInput {
        /// 说明无效原因
        message: String,
    },

    /// 数据超出范围
    #[error("数据超出范围: {field}={value}, 期望范围=[{min}, {max}]")]
    OutOfRange {
        /// 字段名
        field: &'static str,
        /// 实际值
        value: f64,
        /// 最小允许值
        min: f64,
        /// 最大允许值
        max: f64,
    },

    /// 数组大小不匹配
    #[error("数组大小不匹配: {name} 期望{expected}, 实际{actual}")]
    SizeMismatch {
        /// 数据名称
        name: &'static str,
        /// 期望大小
        expected: usize,
        /// 实际大小
        actual: usize,
    },

    /// 无效网格
    #[error("无效的网格: {message}")]
    InvalidGrid {
        /// 具体错误信息
        message: String,
    },

    /// 数据集中缺少变量
    #[error("数据集中缺少必需变量: {name}")]
    MissingVariable {
        /// 变量名
        name: String,
    },

    /// 时间超出数据集覆盖范围
    #[error("时间 {time} 超出数据记录范围 [{first}, {last}]")]
    TimeOutOfRange {
        /// 请求的时间 [s]
        time: f64,
        /// 首条记录时间 [s]
        first: f64,
        /// 末条记录时间 [s]
        last: f64,
    },

    // ========================================================================
    // 运行时错误
    // ========================================================================

    /// 内部错误
    #[error("内部错误: {message}")]
    Internal {
        /// 内部错误描述
        message: String,
    },
}

// ========================================================================
// 便捷构造方法
// ========================================================================

impl MdError {
    /// 创建 IO 错误（带源）
    pub fn io_with_source(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(source),
        }
    }

    /// 文件不存在
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// 解析错误
    pub fn parse(file: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Self::ParseError {
            file: file.into(),
            line,
            message: message.into(),
        }
    }

    /// 无效输入
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// 数据超出范围
    pub fn out_of_range(field: &'static str, value: f64, min: f64, max: f64) -> Self {
        Self::OutOfRange {
            field,
            value,
            min,
            max,
        }
    }

    /// 数组大小不匹配
    pub fn size_mismatch(name: &'static str, expected: usize, actual: usize) -> Self {
        Self::SizeMismatch {
            name,
            expected,
            actual,
        }
    }

    /// 无效网格
    pub fn invalid_grid(message: impl Into<String>) -> Self {
        Self::InvalidGrid {
            message: message.into(),
        }
    }

    /// 缺少变量
    pub fn missing_variable(name: impl Into<String>) -> Self {
        Self::MissingVariable { name: name.into() }
    }

    /// 时间超出范围
    pub fn time_out_of_range(time: f64, first: f64, last: f64) -> Self {
        Self::TimeOutOfRange { time, first, last }
    }

    /// 内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

// ========================================================================
// 验证辅助方法
// ========================================================================

impl MdError {
    /// 检查数组大小是否匹配
    #[inline]
    pub fn check_size(name: &'static str, expected: usize, actual: usize) -> MdResult<()> {
        if expected != actual {
            Err(Self::size_mismatch(name, expected, actual))
        } else {
            Ok(())
        }
    }

    /// 检查值是否在范围内（NaN 视为越界）
    #[inline]
    pub fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> MdResult<()> {
        if value >= min && value <= max {
            Ok(())
        } else {
            Err(Self::out_of_range(field, value, min, max))
        }
    }
}

impl From<std::io::Error> for MdError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

// ========================================================================
// 校验宏
// ========================================================================

/// 条件不满足时提前返回错误
///
/// ```
/// use md_foundation::{ensure, MdError, MdResult};
///
/// fn positive(v: f64) -> MdResult<f64> {
///     ensure!(v > 0.0, MdError::invalid_input("必须为正"));
///     Ok(v)
/// }
/// assert!(positive(-1.0).is_err());
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr $(,)?) => {
        if !$cond {
            return Err($err.into());
        }
    };
}

/// 解开 `Option`，为 `None` 时提前返回错误
#[macro_export]
macro_rules! require {
    ($opt:expr, $err:expr $(,)?) => {
        match $opt {
            Some(v) => v,
            None => return Err($err.into()),
        }
    };
}

// ========================================================================
// 测试
// ========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MdError::missing_variable("AKt");
        assert!(err.to_string().contains("AKt"));
    }

    #[test]
    fn test_parse_error_display() {
        let err = MdError::parse("drifters.txt", 3, "缺少纬度");
        let msg = err.to_string();
        assert!(msg.contains("drifters.txt"));
        assert!(msg.contains("第3行"));
    }

    #[test]
    fn test_check_size() {
        assert!(MdError::check_size("mask", 10, 10).is_ok());
        assert!(MdError::check_size("mask", 10, 5).is_err());
    }

    #[test]
    fn test_check_range_rejects_nan() {
        assert!(MdError::check_range("dt", 5.0, 0.0, 10.0).is_ok());
        assert!(MdError::check_range("dt", f64::NAN, 0.0, 10.0).is_err());
        assert!(MdError::check_range("dt", 11.0, 0.0, 10.0).is_err());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: MdError = io_err.into();
        assert!(matches!(err, MdError::Io { .. }));
    }

    #[test]
    fn test_ensure_macro() {
        fn check(value: i32) -> MdResult<()> {
            ensure!(value > 0, MdError::invalid_input("value must be positive"));
            Ok(())
        }

        assert!(check(1).is_ok());
        assert!(check(-1).is_err());
    }

    #[test]
    fn test_require_macro() {
        fn get_value(opt: Option<i32>) -> MdResult<i32> {
            let v = require!(opt, MdError::missing_variable("value"));
            Ok(v)
        }

        assert_eq!(get_value(Some(42)).unwrap(), 42);
        assert!(get_value(None).is_err());
    }
}
