// crates/md_grid/src/source.rs

//! 场数据源
//!
//! `FieldSource` 抽象一个按记录读取网格变量的数据源（如一个归档文件）；
//! `SourceChain` 把多个数据源按时间顺序拼接成统一的记录轴。
//!
//! 数据源只在时间窗刷新时被访问，粒子推进过程中不会触发读取。

use ndarray::Array3;
use std::collections::HashMap;

use md_foundation::{ensure, MdError, MdResult};

use crate::field::Staggering;

/// 按记录读取网格变量的数据源
pub trait FieldSource: Send + Sync {
    /// 数据源标识（用于日志）
    fn label(&self) -> &str;

    /// 记录时刻 [s]，严格递增
    fn times(&self) -> &[f64];

    /// 变量的交错位置，不存在时返回 `None`
    fn variable(&self, name: &str) -> Option<Staggering>;

    /// 读取变量的一条记录，形状 `[k, j, i]`
    fn read(&self, name: &str, record: usize) -> MdResult<Array3<f64>>;
}

// ============================================================================
// 内存数据源
// ============================================================================

#[derive(Debug, Clone)]
enum MemoryData {
    Constant(Array3<f64>),
    Records(Vec<Array3<f64>>),
}

/// 内存数据源，变量可以是常量或逐记录给出
#[derive(Debug, Clone)]
pub struct InMemorySource {
    label: String,
    times: Vec<f64>,
    variables: HashMap<String, (Staggering, MemoryData)>,
}

impl InMemorySource {
    /// 创建空数据源
    pub fn new(label: impl Into<String>, times: Vec<f64>) -> MdResult<Self> {
        ensure!(!times.is_empty(), MdError::invalid_input("数据源至少需要一条记录"));
        ensure!(
            times.windows(2).all(|w| w[1] > w[0]),
            MdError::invalid_input("记录时刻必须严格递增")
        );
        Ok(Self {
            label: label.into(),
            times,
            variables: HashMap::new(),
        })
    }

    /// 添加不随时间变化的变量
    pub fn with_constant(mut self, name: impl Into<String>, staggering: Staggering, data: Array3<f64>) -> Self {
        self.variables.insert(name.into(), (staggering, MemoryData::Constant(data)));
        self
    }

    /// 添加逐记录给出的变量，记录数必须与时刻数一致
    pub fn with_records(
        mut self,
        name: impl Into<String>,
        staggering: Staggering,
        records: Vec<Array3<f64>>,
    ) -> MdResult<Self> {
        let name = name.into();
        MdError::check_size("records", self.times.len(), records.len())?;
        if let Some(first) = records.first() {
            ensure!(
                records.iter().all(|r| r.dim() == first.dim()),
                MdError::invalid_input(format!("变量 {name} 各记录形状不一致"))
            );
        }
        self.variables.insert(name, (staggering, MemoryData::Records(records)));
        Ok(self)
    }
}

impl FieldSource for InMemorySource {
    fn label(&self) -> &str {
        &self.label
    }

    fn times(&self) -> &[f64] {
        &self.times
    }

    fn variable(&self, name: &str) -> Option<Staggering> {
        self.variables.get(name).map(|(s, _)| *s)
    }

    fn read(&self, name: &str, record: usize) -> MdResult<Array3<f64>> {
        let (_, data) = self
            .variables
            .get(name)
            .ok_or_else(|| MdError::missing_variable(name))?;
        match data {
            MemoryData::Constant(a) => Ok(a.clone()),
            MemoryData::Records(r) => r
                .get(record)
                .cloned()
                .ok_or_else(|| MdError::internal(format!("{}: 记录 {record} 越界", self.label))),
        }
    }
}

// ============================================================================
// 数据源链
// ============================================================================

/// 按时间顺序拼接的数据源
pub struct SourceChain {
    sources: Vec<Box<dyn FieldSource>>,
    times: Vec<f64>,
    /// 全局记录号 → (数据源序号, 局部记录号)
    owners: Vec<(usize, usize)>,
}

impl std::fmt::Debug for SourceChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceChain")
            .field("sources", &self.sources.iter().map(|s| s.label()).collect::<Vec<_>>())
            .field("records", &self.times.len())
            .finish()
    }
}

impl SourceChain {
    /// 按首条记录时刻排序后拼接，拼接后的时刻必须严格递增
    pub fn new(mut sources: Vec<Box<dyn FieldSource>>) -> MdResult<Self> {
        ensure!(!sources.is_empty(), MdError::invalid_input("至少需要一个数据源"));
        sources.sort_by(|a, b| {
            let ta = a.times().first().copied().unwrap_or(f64::INFINITY);
            let tb = b.times().first().copied().unwrap_or(f64::INFINITY);
            ta.total_cmp(&tb)
        });

        let mut times = Vec::new();
        let mut owners = Vec::new();
        for (s, source) in sources.iter().enumerate() {
            for (r, t) in source.times().iter().enumerate() {
                if let Some(last) = times.last() {
                    ensure!(
                        *t > *last,
                        MdError::invalid_input(format!(
                            "数据源 {} 的记录 {t} 与前一数据源重叠",
                            source.label()
                        ))
                    );
                }
                times.push(*t);
                owners.push((s, r));
            }
        }
        ensure!(times.len() >= 2, MdError::invalid_input("时间插值至少需要两条记录"));

        Ok(Self {
            sources,
            times,
            owners,
        })
    }

    /// 全部记录时刻
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// 数据源数量
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// 变量的交错位置，要求每个数据源都提供且一致
    pub fn variable(&self, name: &str) -> Option<Staggering> {
        let first = self.sources.first()?.variable(name)?;
        self.sources
            .iter()
            .all(|s| s.variable(name) == Some(first))
            .then_some(first)
    }

    /// 读取全局记录
    pub fn read(&self, name: &str, record: usize) -> MdResult<Array3<f64>> {
        let (s, r) = *self
            .owners
            .get(record)
            .ok_or_else(|| MdError::internal(format!("全局记录 {record} 越界")))?;
        self.sources[s].read(name, r)
    }

    /// 记录所属数据源的标识
    pub fn label_of(&self, record: usize) -> &str {
        self.owners
            .get(record)
            .map_or("?", |(s, _)| self.sources[*s].label())
    }
}
