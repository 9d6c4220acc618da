//! CSV 导出器实现 (同步版本)

use super::{HeaderState, SyncExporter};
use crate::error::{IisLogError, Result};
use crate::exporter::ExportStats;
use crate::iislog::{LogRecord, LogSchema};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// 同步 CSV 导出器
///
/// 表头只写一次；记录按到达顺序逐行写入，没有行数上限。
pub struct SyncCsvExporter {
    writer: csv::Writer<BufWriter<File>>,
    path: PathBuf,
    headers: HeaderState,
    header_written: bool,
    stats: ExportStats,
}

impl SyncCsvExporter {
    /// 创建新的同步 CSV 导出器（已存在的文件会被截断）
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)
            .map_err(|e| IisLogError::file_access(&path, e))?;
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(BufWriter::new(file));

        Ok(Self {
            writer,
            path,
            headers: HeaderState::new(),
            header_written: false,
            stats: ExportStats::new(),
        })
    }

    /// 输出文件路径
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_header(&mut self) -> Result<()> {
        if let Some(header) = self.headers.get() {
            self.writer.write_record(header.fields())?;
            self.header_written = true;
        }
        Ok(())
    }
}

impl SyncExporter for SyncCsvExporter {
    fn name(&self) -> &str {
        "CSV"
    }

    fn set_schema(&mut self, schema: Arc<LogSchema>) {
        self.headers.set(schema);
    }

    fn export_batch(&mut self, records: &[LogRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        if !self.header_written {
            self.headers.set(records[0].schema().clone());
            self.write_header()?;
        }

        for record in records {
            let row = self.headers.row(record);
            self.writer.write_record(&row)?;
        }

        self.stats.exported_records += records.len();
        tracing::debug!("CSV批量导出: {} 条记录", records.len());
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        // 没有数据但已知字段定义时仍写出表头
        if !self.header_written {
            self.write_header()?;
        }

        self.writer.flush()?;
        self.stats.finish();

        tracing::info!(
            "CSV导出完成: {} ({} 条记录)",
            self.path.display(),
            self.stats.exported_records
        );
        Ok(())
    }

    fn get_stats(&self) -> ExportStats {
        self.stats.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iislog::{IisLogParser, LineOutcome};
    use std::fs;
    use tempfile::tempdir;

    fn record(schema: &Arc<LogSchema>, line: &str) -> LogRecord {
        match IisLogParser::parse_line(line, 1, Some(schema)).unwrap() {
            LineOutcome::Record(r) => r,
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_header_written_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let schema = Arc::new(LogSchema::from_whitespace("date cs-uri-query"));

        let mut exporter = SyncCsvExporter::new(&path).unwrap();
        exporter.set_schema(schema.clone());
        exporter
            .export_batch(&[record(&schema, "2024-01-01 a=1,b=2")])
            .unwrap();
        exporter.export_batch(&[record(&schema, "2024-01-02 -")]).unwrap();
        exporter.finalize().unwrap();

        let s = fs::read_to_string(&path).unwrap();
        assert_eq!(
            s,
            "date,cs-uri-query\n2024-01-01,\"a=1,b=2\"\n2024-01-02,-\n"
        );
        assert_eq!(exporter.get_stats().exported_records, 2);
    }

    #[test]
    fn test_finalize_writes_header_without_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.csv");

        let mut exporter = SyncCsvExporter::new(&path).unwrap();
        exporter.set_schema(Arc::new(LogSchema::from_whitespace("a b")));
        exporter.finalize().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "a,b\n");
    }

    #[test]
    fn test_no_schema_no_records_leaves_file_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("none.csv");

        let mut exporter = SyncCsvExporter::new(&path).unwrap();
        exporter.export_batch(&[]).unwrap();
        exporter.finalize().unwrap();

        assert!(fs::read_to_string(&path).unwrap().is_empty());
    }

    #[test]
    fn test_unwritable_destination() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("out.csv");
        let err = SyncCsvExporter::new(&path).err().unwrap();
        assert!(matches!(err, IisLogError::FileAccess { .. }));
    }
}
