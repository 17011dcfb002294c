// crates/md_config/src/biology.rs

//! 生物过程配置：浮力、生长、昼夜垂直迁移、致死温度与补充
//!
//! 所有过程均为可选，`None` 表示关闭。时间类参数以天为单位填写，
//! 由 `md_lagrange` 在装配时转换为秒。

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 生物过程配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BiologyConfig {
    /// 未启用生长时，按年龄判定卵期的上限 [天]
    #[serde(default = "default_egg_duration")]
    pub egg_duration_days: f64,

    /// 浮力（卵的 Stokes 沉降/上浮）
    #[serde(default)]
    pub buoyancy: Option<BuoyancyConfig>,

    /// 生长
    #[serde(default)]
    pub growth: Option<GrowthConfig>,

    /// 昼夜垂直迁移
    #[serde(default)]
    pub migration: Option<MigrationConfig>,

    /// 致死温度
    #[serde(default)]
    pub lethal_temperature: Option<LethalTemperatureConfig>,

    /// 补充（在目标区域停留判定）
    #[serde(default)]
    pub recruitment: Option<RecruitmentConfig>,
}

fn default_egg_duration() -> f64 { 4.0 }

impl Default for BiologyConfig {
    fn default() -> Self {
        Self {
            egg_duration_days: default_egg_duration(),
            buoyancy: None,
            growth: None,
            migration: None,
            lethal_temperature: None,
            recruitment: None,
        }
    }
}

// ============================================================================
// 浮力
// ============================================================================

/// 浮力参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuoyancyConfig {
    /// 卵密度 [g/cm³]
    #[serde(default = "default_egg_density")]
    pub egg_density: f64,
}

fn default_egg_density() -> f64 { 1.025 }

impl Default for BuoyancyConfig {
    fn default() -> Self {
        Self { egg_density: default_egg_density() }
    }
}

// ============================================================================
// 生长
// ============================================================================

/// 生长模型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GrowthModel {
    /// 温度线性生长
    #[default]
    Linear,
    /// 摄食期受饵料限制
    FoodLimited,
}

/// 生长参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrowthConfig {
    /// 生长模型
    #[serde(default)]
    pub model: GrowthModel,
    /// 常数项 c1 [mm/天]
    #[serde(default = "default_c1")]
    pub c1: f64,
    /// 温度系数 c2 [mm/天/°C]
    #[serde(default = "default_c2")]
    pub c2: f64,
    /// 温度下限 [°C]，低于此值按下限计算
    #[serde(default = "default_temperature_threshold")]
    pub temperature_threshold: f64,
    /// 初始体长 [mm]
    #[serde(default = "default_initial_length")]
    pub initial_length: f64,
    /// 孵化体长 [mm]
    #[serde(default = "default_hatch_length")]
    pub hatch_length: f64,
    /// 卵黄囊吸收完毕、开始摄食的体长 [mm]
    #[serde(default = "default_yolk_to_feeding_length")]
    pub yolk_to_feeding_length: f64,
    /// 饵料半饱和常数（仅 food_limited）
    #[serde(default = "default_half_saturation")]
    pub half_saturation: f64,
    /// 饵料变量名（仅 food_limited）
    #[serde(default = "default_food_fields")]
    pub food_fields: Vec<String>,
}

fn default_c1() -> f64 { 0.02 }
fn default_c2() -> f64 { 0.03 }
fn default_temperature_threshold() -> f64 { 10.0 }
fn default_initial_length() -> f64 { 0.025 }
fn default_hatch_length() -> f64 { 2.8 }
fn default_yolk_to_feeding_length() -> f64 { 4.5 }
fn default_half_saturation() -> f64 { 0.5 }
fn default_food_fields() -> Vec<String> {
    vec!["lphy".to_string(), "szoo".to_string(), "lzoo".to_string()]
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            model: GrowthModel::default(),
            c1: default_c1(),
            c2: default_c2(),
            temperature_threshold: default_temperature_threshold(),
            initial_length: default_initial_length(),
            hatch_length: default_hatch_length(),
            yolk_to_feeding_length: default_yolk_to_feeding_length(),
            half_saturation: default_half_saturation(),
            food_fields: default_food_fields(),
        }
    }
}

// ============================================================================
// 垂直迁移
// ============================================================================

/// 目标深度随时间的变化方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DielPattern {
    /// 日出至日落取白天深度，其余取夜间深度
    #[default]
    Step,
    /// 以正午为峰值的余弦过渡
    Sinusoidal,
}

/// 昼夜垂直迁移参数（深度为负值，单位 m）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// 目标深度变化方式
    #[serde(default)]
    pub pattern: DielPattern,
    /// 白天深度 [m]
    #[serde(default = "default_day_depth")]
    pub day_depth: f64,
    /// 夜间深度 [m]
    #[serde(default = "default_night_depth")]
    pub night_depth: f64,
    /// 日出时刻 [h]
    #[serde(default = "default_sunrise")]
    pub sunrise_hour: f64,
    /// 日落时刻 [h]
    #[serde(default = "default_sunset")]
    pub sunset_hour: f64,
    /// 未启用生长时，开始迁移的最小年龄 [天]
    #[serde(default)]
    pub age_min_days: f64,
}

fn default_day_depth() -> f64 { -40.0 }
fn default_night_depth() -> f64 { -10.0 }
fn default_sunrise() -> f64 { 6.0 }
fn default_sunset() -> f64 { 18.0 }

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            pattern: DielPattern::default(),
            day_depth: default_day_depth(),
            night_depth: default_night_depth(),
            sunrise_hour: default_sunrise(),
            sunset_hour: default_sunset(),
            age_min_days: 0.0,
        }
    }
}

// ============================================================================
// 致死温度
// ============================================================================

/// 致死温度阈值 [°C]，缺省项表示不检查
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LethalTemperatureConfig {
    /// 卵期低温阈值
    #[serde(default)]
    pub egg_cold: Option<f64>,
    /// 卵期高温阈值
    #[serde(default)]
    pub egg_hot: Option<f64>,
    /// 仔鱼低温阈值
    #[serde(default)]
    pub larva_cold: Option<f64>,
    /// 仔鱼高温阈值
    #[serde(default)]
    pub larva_hot: Option<f64>,
}

// ============================================================================
// 补充
// ============================================================================

/// 补充判定依据
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RecruitmentCriterion {
    /// 年龄 [天]
    #[default]
    Age,
    /// 体长 [mm]，需要启用生长
    Length,
}

/// 补充参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecruitmentConfig {
    /// 判定依据
    #[serde(default)]
    pub criterion: RecruitmentCriterion,
    /// 判定阈值（天或 mm）
    #[serde(default = "default_recruitment_threshold")]
    pub threshold: f64,
    /// 在同一区域内的最短停留时间 [天]
    #[serde(default)]
    pub min_residence_days: f64,
    /// 补充后停止运动
    #[serde(default = "default_stop_moving")]
    pub stop_moving: bool,
    /// 深度范围 [min, max]（负值，m），缺省不限
    #[serde(default)]
    pub depth_range: Option<[f64; 2]>,
}

fn default_recruitment_threshold() -> f64 { 20.0 }
fn default_stop_moving() -> bool { true }

impl Default for RecruitmentConfig {
    fn default() -> Self {
        Self {
            criterion: RecruitmentCriterion::default(),
            threshold: default_recruitment_threshold(),
            min_residence_days: 0.0,
            stop_moving: default_stop_moving(),
            depth_range: None,
        }
    }
}

// ============================================================================
// 校验
// ============================================================================

impl BiologyConfig {
    /// 校验生物过程参数
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.egg_duration_days < 0.0 || !self.egg_duration_days.is_finite() {
            return Err(ConfigError::invalid(
                "biology.egg_duration_days",
                self.egg_duration_days,
                "不能为负",
            ));
        }

        if let Some(b) = &self.buoyancy {
            if b.egg_density <= 0.0 || !b.egg_density.is_finite() {
                return Err(ConfigError::invalid(
                    "biology.buoyancy.egg_density",
                    b.egg_density,
                    "卵密度必须为正",
                ));
            }
        }

        if let Some(g) = &self.growth {
            if g.initial_length <= 0.0 {
                return Err(ConfigError::invalid(
                    "biology.growth.initial_length",
                    g.initial_length,
                    "初始体长必须为正",
                ));
            }
            if g.hatch_length > g.yolk_to_feeding_length {
                return Err(ConfigError::invalid(
                    "biology.growth.hatch_length",
                    g.hatch_length,
                    "孵化体长不能大于开口摄食体长",
                ));
            }
            if g.model == GrowthModel::FoodLimited && g.food_fields.is_empty() {
                return Err(ConfigError::invalid(
                    "biology.growth.food_fields",
                    "[]",
                    "饵料限制模型至少需要一个饵料变量",
                ));
            }
        }

        if let Some(m) = &self.migration {
            if m.day_depth > 0.0 || m.night_depth > 0.0 {
                return Err(ConfigError::invalid(
                    "biology.migration",
                    format!("day={}, night={}", m.day_depth, m.night_depth),
                    "迁移深度必须 ≤ 0",
                ));
            }
            let valid_hour = |h: f64| (0.0..=24.0).contains(&h);
            if !valid_hour(m.sunrise_hour) || !valid_hour(m.sunset_hour) || m.sunrise_hour >= m.sunset_hour {
                return Err(ConfigError::invalid(
                    "biology.migration.sunrise_hour",
                    format!("{}-{}", m.sunrise_hour, m.sunset_hour),
                    "日出须早于日落且在 0-24 h 之间",
                ));
            }
        }

        if let Some(r) = &self.recruitment {
            if r.criterion == RecruitmentCriterion::Length && self.growth.is_none() {
                return Err(ConfigError::invalid(
                    "biology.recruitment.criterion",
                    "length",
                    "按体长补充需要启用生长",
                ));
            }
            if r.min_residence_days < 0.0 {
                return Err(ConfigError::invalid(
                    "biology.recruitment.min_residence_days",
                    r.min_residence_days,
                    "不能为负",
                ));
            }
            if let Some([lo, hi]) = r.depth_range {
                if lo > hi {
                    return Err(ConfigError::invalid(
                        "biology.recruitment.depth_range",
                        format!("[{lo}, {hi}]"),
                        "下限大于上限",
                    ));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_growth_defaults() {
        let g: GrowthConfig = serde_json::from_str("{}").unwrap();
        assert!((g.c1 - 0.02).abs() < 1e-12);
        assert!((g.hatch_length - 2.8).abs() < 1e-12);
        assert_eq!(g.food_fields.len(), 3);
    }

    #[test]
    fn test_length_recruitment_requires_growth() {
        let mut bio = BiologyConfig::default();
        bio.recruitment = Some(RecruitmentConfig {
            criterion: RecruitmentCriterion::Length,
            ..Default::default()
        });
        assert!(bio.validate().is_err());

        bio.growth = Some(GrowthConfig::default());
        assert!(bio.validate().is_ok());
    }

    #[test]
    fn test_positive_migration_depth_rejected() {
        let mut bio = BiologyConfig::default();
        bio.migration = Some(MigrationConfig { day_depth: 5.0, ..Default::default() });
        assert!(bio.validate().is_err());
    }

    #[test]
    fn test_sunrise_after_sunset_rejected() {
        let mut bio = BiologyConfig::default();
        bio.migration = Some(MigrationConfig {
            sunrise_hour: 19.0,
            sunset_hour: 7.0,
            ..Default::default()
        });
        assert!(bio.validate().is_err());
    }
}
