//! 数据导出模块
//!
//! 提供统一的导出接口以及 CSV 与 Excel 两种导出实现

pub mod sheet;
pub mod stats;

#[cfg(feature = "exporter-csv")]
pub mod csv;
#[cfg(feature = "exporter-excel")]
pub mod excel;

pub use sheet::{MAX_XLSX_ROWS, SheetCursor, SheetPlacement};
pub use stats::ExportStats;

#[cfg(feature = "exporter-csv")]
pub use self::csv::SyncCsvExporter;
#[cfg(feature = "exporter-excel")]
pub use excel::SyncExcelExporter;

use crate::error::Result;
use crate::iislog::{LogRecord, LogSchema};
use std::sync::Arc;

/// 同步数据导出器的统一接口
///
/// 调用顺序：`set_schema` → `export_batch`* → `finalize`。
pub trait SyncExporter {
    /// 导出器名称
    fn name(&self) -> &str;

    /// 设置输出表头；只有第一次调用生效
    fn set_schema(&mut self, schema: Arc<LogSchema>);

    /// 批量导出记录
    fn export_batch(&mut self, records: &[LogRecord]) -> Result<()>;

    /// 完成导出，刷新缓冲
    fn finalize(&mut self) -> Result<()>;

    /// 获取导出统计信息
    fn get_stats(&self) -> ExportStats;
}

/// 支持的输出格式
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    serde::Serialize,
    serde::Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Xlsx,
}

impl OutputFormat {
    /// 输出文件扩展名
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Xlsx => "xlsx",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// 表头确定后，记录的字段定义与表头不一致时按字段名投影
pub(crate) struct HeaderState {
    header: Option<Arc<LogSchema>>,
    warned_for: Option<Arc<LogSchema>>,
}

impl HeaderState {
    pub(crate) fn new() -> Self {
        Self { header: None, warned_for: None }
    }

    pub(crate) fn set(&mut self, schema: Arc<LogSchema>) {
        if self.header.is_none() {
            self.header = Some(schema);
        }
    }

    pub(crate) fn get(&self) -> Option<&Arc<LogSchema>> {
        self.header.as_ref()
    }

    /// 取记录在表头顺序下的各列值
    pub(crate) fn row<'a>(&'a mut self, record: &'a LogRecord) -> Vec<&'a str> {
        let header = self.header.get_or_insert_with(|| record.schema().clone());
        if **record.schema() != **header
            && self.warned_for.as_ref() != Some(record.schema())
        {
            tracing::warn!(
                "字段定义变化 [{}]，按表头 [{}] 投影",
                record.schema(),
                header
            );
            self.warned_for = Some(record.schema().clone());
        }
        record.project(header)
    }
}
