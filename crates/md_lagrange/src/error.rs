// crates/md_lagrange/src/error.rs

//! 粒子追踪错误类型
//!
//! 只有装配阶段与每个时间步开始时的时间窗刷新会返回错误；
//! 粒子离开计算域、搁浅等情形是粒子的终态，不是错误。

use thiserror::Error;

use md_config::ConfigError;
use md_foundation::MdError;

/// 模拟结果类型
pub type SimResult<T> = Result<T, SimulationError>;

/// 模拟错误
#[derive(Error, Debug)]
pub enum SimulationError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 数据集错误
    #[error("数据集错误: {0}")]
    Data(#[from] MdError),

    /// 过程与运行模式不兼容
    #[error("过程 {action} 无法启用: {reason}")]
    Incompatible {
        /// 过程名称
        action: &'static str,
        /// 原因
        reason: String,
    },

    /// 投放失败
    #[error("投放失败: {message}")]
    Release {
        /// 错误信息
        message: String,
    },
}

impl SimulationError {
    /// 构造不兼容错误
    pub fn incompatible(action: &'static str, reason: impl Into<String>) -> Self {
        Self::Incompatible {
            action,
            reason: reason.into(),
        }
    }

    /// 构造投放错误
    pub fn release(message: impl Into<String>) -> Self {
        Self::Release {
            message: message.into(),
        }
    }
}
