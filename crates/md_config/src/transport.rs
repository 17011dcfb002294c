// crates/md_config/src/transport.rs

//! 输运过程配置：平流格式、水平/垂向湍流扩散与岸线处理

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 输运配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// 平流格式
    #[serde(default)]
    pub scheme: AdvectionScheme,

    /// 是否启用平流（关闭时粒子只受扩散与生物过程影响）
    #[serde(default = "default_advection")]
    pub advection: bool,

    /// 水平扩散，`None` 表示关闭
    #[serde(default)]
    pub horizontal_dispersion: Option<HorizontalDispersionConfig>,

    /// 垂向扩散，`None` 表示关闭（仅三维）
    #[serde(default)]
    pub vertical_dispersion: Option<VerticalDispersionConfig>,

    /// 粒子上岸时的处理方式
    #[serde(default)]
    pub coastline: CoastlineBehavior,
}

fn default_advection() -> bool { true }

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            scheme: AdvectionScheme::default(),
            advection: default_advection(),
            horizontal_dispersion: None,
            vertical_dispersion: None,
            coastline: CoastlineBehavior::default(),
        }
    }
}

/// 平流时间积分格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AdvectionScheme {
    /// 显式 Euler
    Euler,
    /// 经典四阶 Runge-Kutta
    #[default]
    Rk4,
}

/// 粒子到达陆地单元时的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CoastlineBehavior {
    /// 搁浅死亡
    #[default]
    Beaching,
    /// 在岸线处镜面反弹回水中，粒子存活
    Bouncing,
    /// 水平位置退回到本步起点，粒子存活
    Standstill,
    /// 不做陆地检查
    #[serde(rename = "none")]
    Ignore,
}

/// 水平扩散参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HorizontalDispersionConfig {
    /// 湍流耗散率 ε [m²/s³]
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
}

fn default_epsilon() -> f64 { 1e-9 }

impl Default for HorizontalDispersionConfig {
    fn default() -> Self {
        Self { epsilon: default_epsilon() }
    }
}

/// 垂向扩散参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerticalDispersionConfig {
    /// 垂向扩散系数变量名
    #[serde(default = "default_diffusivity_field")]
    pub diffusivity_field: String,
}

fn default_diffusivity_field() -> String { "AKt".to_string() }

impl Default for VerticalDispersionConfig {
    fn default() -> Self {
        Self { diffusivity_field: default_diffusivity_field() }
    }
}

impl TransportConfig {
    /// 校验输运参数
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(hd) = &self.horizontal_dispersion {
            if hd.epsilon <= 0.0 || !hd.epsilon.is_finite() {
                return Err(ConfigError::invalid(
                    "transport.horizontal_dispersion.epsilon",
                    hd.epsilon,
                    "耗散率必须为正",
                ));
            }
        }
        if let Some(vd) = &self.vertical_dispersion {
            if vd.diffusivity_field.trim().is_empty() {
                return Err(ConfigError::invalid(
                    "transport.vertical_dispersion.diffusivity_field",
                    "",
                    "变量名不能为空",
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coastline_none_spelling() {
        let c: CoastlineBehavior = serde_json::from_str("\"none\"").unwrap();
        assert_eq!(c, CoastlineBehavior::Ignore);
        let c: CoastlineBehavior = serde_json::from_str("\"standstill\"").unwrap();
        assert_eq!(c, CoastlineBehavior::Standstill);
        let c: CoastlineBehavior = serde_json::from_str("\"bouncing\"").unwrap();
        assert_eq!(c, CoastlineBehavior::Bouncing);
    }

    #[test]
    fn test_epsilon_must_be_positive() {
        let mut cfg = TransportConfig::default();
        assert!(cfg.validate().is_ok());
        cfg.horizontal_dispersion = Some(HorizontalDispersionConfig { epsilon: 0.0 });
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_defaults_from_empty_object() {
        let cfg: TransportConfig = serde_json::from_str("{}").unwrap();
        assert!(cfg.advection);
        assert_eq!(cfg.scheme, AdvectionScheme::Rk4);
        assert!(cfg.horizontal_dispersion.is_none());
    }
}
