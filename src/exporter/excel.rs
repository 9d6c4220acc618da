//! Excel 导出器实现 (同步版本)
//!
//! 工作簿以 constant memory 模式创建，行写入后即落盘，内存占用与文件大小无关。
//! `Worksheet` 借用 `Workbook`，因此导出器只持有工作簿的引用，
//! 由调用方在导出器结束后调用 [`close_workbook`] 写出文件。

use super::{HeaderState, SheetCursor, SheetPlacement, SyncExporter};
use crate::error::{IisLogError, Result};
use crate::exporter::ExportStats;
use crate::iislog::{LogRecord, LogSchema};
use std::path::Path;
use std::sync::Arc;
use xlsxwriter::{Workbook, Worksheet};

/// 创建工作簿（constant memory 模式，启用 zip64 以支持大文件）
pub fn create_workbook<P: AsRef<Path>>(path: P) -> Result<Workbook> {
    let path = path.as_ref().to_string_lossy();
    Workbook::new_with_options(&path, true, None, true)
        .map_err(|e| IisLogError::Excel(format!("{path}: {e}")))
}

/// 关闭工作簿并写出文件
pub fn close_workbook<P: AsRef<Path>>(workbook: Workbook, path: P) -> Result<()> {
    workbook.close().map_err(|e| {
        IisLogError::Excel(format!("{}: {e}", path.as_ref().display()))
    })
}

/// 同步 Excel 导出器
///
/// 每个工作表第 0 行为表头；当前工作表写满后新建下一个工作表并重写表头，
/// 一条记录不会跨工作表。
pub struct SyncExcelExporter<'wb> {
    workbook: &'wb Workbook,
    sheet: Option<Worksheet<'wb>>,
    cursor: SheetCursor,
    headers: HeaderState,
    stats: ExportStats,
}

impl<'wb> SyncExcelExporter<'wb> {
    /// 创建新的同步 Excel 导出器
    ///
    /// `max_rows` 为每个工作表的总行数上限（含表头）。
    pub fn new(
        workbook: &'wb Workbook,
        sheet_prefix: &str,
        max_rows: u32,
    ) -> Self {
        Self {
            workbook,
            sheet: None,
            cursor: SheetCursor::new(sheet_prefix, max_rows),
            headers: HeaderState::new(),
            stats: ExportStats::new(),
        }
    }

    /// 已创建的工作表数量
    pub fn sheets(&self) -> usize {
        self.cursor.sheets()
    }

    fn open_sheet(&mut self, name: &str) -> Result<()> {
        tracing::debug!("新建工作表: {name}");
        let mut sheet = self
            .workbook
            .add_worksheet(Some(name))
            .map_err(|e| IisLogError::Excel(e.to_string()))?;
        if let Some(header) = self.headers.get() {
            for (col, field) in header.fields().iter().enumerate() {
                write_cell(&mut sheet, 0, col, field)?;
            }
        }
        self.sheet = Some(sheet);
        Ok(())
    }

    fn write_record(&mut self, record: &LogRecord) -> Result<()> {
        let row = match self.cursor.advance() {
            SheetPlacement::NewSheet { name } => {
                self.open_sheet(&name)?;
                1
            }
            SheetPlacement::Row(row) => row,
        };

        let values = self.headers.row(record);
        let Some(sheet) = self.sheet.as_mut() else {
            return Err(IisLogError::Excel("工作表未创建".to_string()));
        };
        for (col, value) in values.iter().enumerate() {
            write_cell(sheet, row, col, value)?;
        }
        Ok(())
    }
}

fn write_cell(
    sheet: &mut Worksheet<'_>,
    row: u32,
    col: usize,
    value: &str,
) -> Result<()> {
    let col = u16::try_from(col)
        .map_err(|_| IisLogError::Excel(format!("列数超出范围: {col}")))?;
    sheet
        .write_string(row, col, value, None)
        .map_err(|e| IisLogError::Excel(e.to_string()))
}

impl SyncExporter for SyncExcelExporter<'_> {
    fn name(&self) -> &str {
        "Excel"
    }

    fn set_schema(&mut self, schema: Arc<LogSchema>) {
        self.headers.set(schema);
    }

    fn export_batch(&mut self, records: &[LogRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        self.headers.set(records[0].schema().clone());
        for record in records {
            self.write_record(record)?;
        }

        self.stats.exported_records += records.len();
        tracing::debug!(
            "Excel批量导出: {} 条记录, 当前工作表 {} 行",
            records.len(),
            self.cursor.rows_in_sheet()
        );
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        // 没有数据但已知字段定义时仍输出一个只有表头的工作表
        if self.cursor.sheets() == 0 && self.headers.get().is_some() {
            let name = self.cursor.open_sheet();
            self.open_sheet(&name)?;
        }

        self.stats.sheets = self.cursor.sheets();
        self.stats.finish();

        tracing::info!(
            "Excel导出完成: {} 条记录, {} 个工作表",
            self.stats.exported_records,
            self.stats.sheets
        );
        Ok(())
    }

    fn get_stats(&self) -> ExportStats {
        let mut stats = self.stats.clone();
        stats.sheets = self.cursor.sheets();
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iislog::{IisLogParser, LineOutcome};
    use tempfile::tempdir;

    fn records(schema: &Arc<LogSchema>, n: usize) -> Vec<LogRecord> {
        (0..n)
            .map(|i| {
                let line = format!("2024-01-01 /page{i}");
                match IisLogParser::parse_line(&line, i + 1, Some(schema))
                    .unwrap()
                {
                    LineOutcome::Record(r) => r,
                    other => panic!("unexpected {other:?}"),
                }
            })
            .collect()
    }

    #[test]
    fn test_split_into_sheets() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        let schema = Arc::new(LogSchema::from_whitespace("date cs-uri-stem"));

        let workbook = create_workbook(&path).unwrap();
        let stats = {
            // 每个工作表 1 行表头 + 3 行数据
            let mut exporter = SyncExcelExporter::new(&workbook, "Sheet", 4);
            exporter.set_schema(schema.clone());
            exporter.export_batch(&records(&schema, 7)).unwrap();
            exporter.finalize().unwrap();
            exporter.get_stats()
        };
        close_workbook(workbook, &path).unwrap();

        assert_eq!(stats.exported_records, 7);
        assert_eq!(stats.sheets, 3);
        assert!(path.exists());
    }

    #[test]
    fn test_header_only_workbook() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.xlsx");

        let workbook = create_workbook(&path).unwrap();
        let sheets = {
            let mut exporter = SyncExcelExporter::new(&workbook, "Sheet", 10);
            exporter.set_schema(Arc::new(LogSchema::from_whitespace("a b")));
            exporter.finalize().unwrap();
            exporter.sheets()
        };
        close_workbook(workbook, &path).unwrap();

        assert_eq!(sheets, 1);
        assert!(path.exists());
    }
}
