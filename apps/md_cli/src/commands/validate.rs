// apps/md_cli/src/commands/validate.rs

//! 配置验证命令
//!
//! 依次检查：配置能否解析并通过校验、时间范围是否落在数据记录内、
//! 模拟能否装配（过程与数据变量是否匹配）。

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::Args;
use tracing::{error, info, warn};

use md_config::SimulationConfig;

use super::{assemble, load_config};

/// 验证参数
#[derive(Args)]
pub struct ValidateArgs {
    /// 配置文件路径
    #[arg(short, long)]
    pub config: PathBuf,

    /// 严格模式（警告也视为错误）
    #[arg(long)]
    pub strict: bool,
}

/// 验证结果
#[derive(Default)]
struct ValidationResult {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationResult {
    fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    fn is_ok_strict(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }
}

/// 执行验证命令
pub fn execute(args: ValidateArgs) -> Result<()> {
    info!("=== MariDrift 配置验证 ===");

    let mut result = ValidationResult::default();
    validate_config(&args.config, &mut result);
    print_validation_result(&result, args.strict)
}

fn validate_config(path: &Path, result: &mut ValidationResult) {
    println!("\n检查配置文件: {}", path.display());

    if !path.exists() {
        result.add_error(format!("配置文件不存在: {}", path.display()));
        return;
    }

    let config = match load_config(path) {
        Ok(c) => c,
        Err(e) => {
            result.add_error(format!("{e:#}"));
            return;
        }
    };
    println!("  ✓ 配置文件格式有效");

    check_time_coverage(&config, result);

    match assemble(config) {
        Ok(sim) => {
            println!("  ✓ 模拟装配成功");
            let names: Vec<_> = sim.pipeline().kinds().iter().map(|k| k.name()).collect();
            println!("  过程: {}", names.join(", "));
        }
        Err(e) => result.add_error(format!("{e:#}")),
    }
}

/// 模拟时间与数据记录的覆盖关系
fn check_time_coverage(config: &SimulationConfig, result: &mut ValidationResult) {
    let (first, last) = config.dataset.time_span();
    let (lo, hi) = {
        let (a, b) = (config.time.t0, config.time.end_time());
        (a.min(b), a.max(b))
    };
    if lo < first || hi > last {
        result.add_warning(format!(
            "模拟时间 [{lo}, {hi}] s 超出数据记录 [{first}, {last}] s，运行会在越界处中止"
        ));
    }
    if config.time.transport_duration > config.time.simulation_duration {
        result.add_warning(format!(
            "输运时长 {} s 大于模拟时长 {} s，粒子不会因超龄死亡",
            config.time.transport_duration, config.time.simulation_duration
        ));
    }
}

fn print_validation_result(result: &ValidationResult, strict: bool) -> Result<()> {
    println!("\n=== 验证结果 ===");

    if !result.errors.is_empty() {
        println!("\n错误 ({}):", result.errors.len());
        for err in &result.errors {
            error!("  ✗ {}", err);
            println!("  ✗ {}", err);
        }
    }

    if !result.warnings.is_empty() {
        println!("\n警告 ({}):", result.warnings.len());
        for warning in &result.warnings {
            warn!("  ⚠ {}", warning);
            println!("  ⚠ {}", warning);
        }
    }

    let success = if strict {
        result.is_ok_strict()
    } else {
        result.is_ok()
    };

    if success {
        println!("\n✓ 验证通过");
        Ok(())
    } else {
        println!("\n✗ 验证失败");
        bail!(
            "验证失败：发现 {} 个错误，{} 个警告",
            result.errors.len(),
            result.warnings.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_is_error() {
        let mut result = ValidationResult::default();
        validate_config(Path::new("/nonexistent/drift.json"), &mut result);
        assert!(!result.is_ok());
    }

    #[test]
    fn test_points_config_validates() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "release": {{ "mode": "points", "points": [[0.2, 0.2, 0.0]] }} }}"#).unwrap();
        let mut result = ValidationResult::default();
        validate_config(file.path(), &mut result);
        assert!(result.is_ok(), "{:?}", result.errors);
    }

    #[test]
    fn test_zone_release_without_zone_fails() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", serde_json::to_string(&SimulationConfig::default()).unwrap()).unwrap();
        let mut result = ValidationResult::default();
        validate_config(file.path(), &mut result);
        assert!(!result.is_ok());
    }

    #[test]
    fn test_time_outside_records_warns() {
        let mut config = SimulationConfig::default();
        config.time.simulation_duration = 1e9;
        let mut result = ValidationResult::default();
        check_time_coverage(&config, &mut result);
        assert!(!result.warnings.is_empty());
        assert!(!result.is_ok_strict());
    }
}
