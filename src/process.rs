//! 转换流程：单文件流水线与目录批处理
//!
//! 单个文件的处理状态：`打开 → 解析 → (写入)* → 关闭`。坏行在解析阶段被记录并
//! 跳过；文件级错误（源文件不可读、目标不可写、缺少字段定义）结束该文件的处理，
//! 删除不完整的输出，由批处理记录后继续处理下一个文件。

use crate::config::ConvertConfig;
use crate::error::{IisLogError, Result};
use crate::error_writer::ErrorWriter;
use crate::exporter::{ExportStats, OutputFormat, SyncExporter};
use crate::iislog::{ChunkReader, LogSchema};
use glob::{MatchOptions, Pattern};
use std::{
    fmt, fs,
    io::BufRead,
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

/// 转换参数
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub format: OutputFormat,
    pub chunk_size: usize,
    pub max_rows_per_sheet: u32,
    pub sheet_prefix: String,
    pub pattern: String,
    pub recurse: bool,
    pub default_schema: Option<Arc<LogSchema>>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self::from(&ConvertConfig::default())
    }
}

impl From<&ConvertConfig> for ConvertOptions {
    fn from(config: &ConvertConfig) -> Self {
        Self {
            format: config.format,
            chunk_size: config.chunk_size,
            max_rows_per_sheet: config.max_rows_per_sheet,
            sheet_prefix: config.sheet_prefix.clone(),
            pattern: config.pattern.clone(),
            recurse: config.recurse,
            default_schema: config.default_schema().map(Arc::new),
        }
    }
}

impl ConvertOptions {
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_max_rows_per_sheet(mut self, max_rows: u32) -> Self {
        self.max_rows_per_sheet = max_rows;
        self
    }

    pub fn with_recurse(mut self, recurse: bool) -> Self {
        self.recurse = recurse;
        self
    }

    pub fn with_pattern<S: Into<String>>(mut self, pattern: S) -> Self {
        self.pattern = pattern.into();
        self
    }

    pub fn with_default_schema(mut self, schema: Option<LogSchema>) -> Self {
        self.default_schema = schema.map(Arc::new);
        self
    }
}

/// 单个文件的转换结果
#[derive(Debug, Clone)]
pub struct FileReport {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// 写出的记录数
    pub records: usize,
    /// 被跳过的行数
    pub skipped_lines: usize,
    pub stats: ExportStats,
}

/// 批处理结果
#[derive(Debug, Default)]
pub struct BatchReport {
    /// 匹配到的文件数
    pub files_found: usize,
    pub converted: Vec<FileReport>,
    /// 失败的文件及原因
    pub failed: Vec<(PathBuf, String)>,
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn total_records(&self) -> usize {
        self.converted.iter().map(|r| r.records).sum()
    }

    pub fn total_skipped(&self) -> usize {
        self.converted.iter().map(|r| r.skipped_lines).sum()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    /// 合并所有成功文件的导出统计
    pub fn merged_stats(&self) -> ExportStats {
        let mut total = ExportStats::default();
        for file in &self.converted {
            total.merge(&file.stats);
        }
        total
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "共 {} 个文件, 成功 {} 个, 失败 {} 个, 记录 {} 条, 跳过 {} 行, 耗时 {:.2?}",
            self.files_found,
            self.converted.len(),
            self.failed.len(),
            self.total_records(),
            self.total_skipped(),
            self.elapsed
        )
    }
}

/// 将读取器产出的分块依次写入导出器
fn pump<R, E>(
    mut reader: ChunkReader<R>,
    exporter: &mut E,
    source: &Path,
    mut errors: Option<&mut ErrorWriter>,
) -> Result<usize>
where
    R: BufRead,
    E: SyncExporter + ?Sized,
{
    let mut skipped = 0usize;
    for chunk in reader.by_ref() {
        let chunk = chunk?;
        if !chunk.errors.is_empty() {
            skipped += chunk.errors.len();
            if let Some(w) = errors.as_deref_mut() {
                w.write_errors(source, &chunk.errors);
            }
        }
        exporter.export_batch(&chunk.records)?;
    }

    // 表头以第一条记录为准；没有记录时使用最后生效的字段定义
    match reader.schema() {
        Some(schema) => exporter.set_schema(schema.clone()),
        None => {
            return Err(IisLogError::SchemaMissing {
                path: source.to_path_buf(),
            });
        }
    }

    exporter.finalize()?;
    debug!(
        "{}: 读取 {} 行, 跳过 {} 行",
        source.display(),
        reader.line_count(),
        skipped
    );
    Ok(skipped)
}

/// 转换单个文件到 `destination`（路径按原样使用，父目录会自动创建）
///
/// # Errors
/// - `IisLogError::FileAccess` - 源文件不可读或目标不可写
/// - `IisLogError::SchemaMissing` - 文件中没有字段定义且未配置默认字段
/// - `IisLogError::Config` - 请求的输出格式未编译进当前程序
pub fn convert_file(
    source: &Path,
    destination: &Path,
    options: &ConvertOptions,
    errors: Option<&mut ErrorWriter>,
) -> Result<FileReport> {
    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| IisLogError::file_access(parent, e))?;
        }
    }

    let reader = ChunkReader::open(source, options.chunk_size)?
        .with_default_schema(options.default_schema.clone());

    let result = run_exporter(reader, source, destination, options, errors);
    if result.is_err() && destination.exists() {
        // 删除不完整的输出
        let _ = fs::remove_file(destination);
    }
    let (skipped, stats) = result?;

    info!(
        "转换完成: {} -> {} ({})",
        source.display(),
        destination.display(),
        stats
    );
    Ok(FileReport {
        source: source.to_path_buf(),
        destination: destination.to_path_buf(),
        records: stats.exported_records,
        skipped_lines: skipped,
        stats,
    })
}

fn run_exporter<R: BufRead>(
    reader: ChunkReader<R>,
    source: &Path,
    destination: &Path,
    options: &ConvertOptions,
    errors: Option<&mut ErrorWriter>,
) -> Result<(usize, ExportStats)> {
    match options.format {
        #[cfg(feature = "exporter-csv")]
        OutputFormat::Csv => {
            let mut exporter =
                crate::exporter::SyncCsvExporter::new(destination)?;
            let skipped = pump(reader, &mut exporter, source, errors)?;
            Ok((skipped, exporter.get_stats()))
        }
        #[cfg(feature = "exporter-excel")]
        OutputFormat::Xlsx => {
            use crate::exporter::excel;

            let workbook = excel::create_workbook(destination)?;
            let (skipped, stats) = {
                let mut exporter = crate::exporter::SyncExcelExporter::new(
                    &workbook,
                    &options.sheet_prefix,
                    options.max_rows_per_sheet,
                );
                let skipped = pump(reader, &mut exporter, source, errors)?;
                (skipped, exporter.get_stats())
            };
            excel::close_workbook(workbook, destination)?;
            Ok((skipped, stats))
        }
        #[allow(unreachable_patterns)]
        other => Err(IisLogError::config(format!(
            "未启用 {other} 导出功能，请使用对应的 cargo feature 重新编译"
        ))),
    }
}

/// 单文件模式：输出路径会替换为目标格式的扩展名
pub fn convert_single(
    source: &Path,
    output: &Path,
    options: &ConvertOptions,
    errors: Option<&mut ErrorWriter>,
) -> Result<FileReport> {
    if !source.is_file() {
        return Err(IisLogError::config(format!(
            "源文件不存在: {}",
            source.display()
        )));
    }
    let destination = output.with_extension(options.format.extension());
    convert_file(source, &destination, options, errors)
}

/// 计算目录模式下的输出路径：保持相对目录结构并替换扩展名
pub fn destination_for(
    source: &Path,
    source_root: &Path,
    dest_root: &Path,
    format: OutputFormat,
) -> PathBuf {
    let relative = source
        .strip_prefix(source_root)
        .ok()
        .map(Path::to_path_buf)
        .or_else(|| source.file_name().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("output"));
    dest_root.join(relative).with_extension(format.extension())
}

/// 枚举目录中匹配 `pattern` 的文件（按文件名匹配，不区分大小写），结果已排序
pub fn collect_log_files(
    dir: &Path,
    pattern: &str,
    recurse: bool,
) -> Result<Vec<PathBuf>> {
    let pattern = Pattern::new(pattern).map_err(|e| {
        IisLogError::config(format!("无效的文件名模式 {pattern}: {e}"))
    })?;
    let match_opts = MatchOptions { case_sensitive: false, ..Default::default() };

    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(if recurse { usize::MAX } else { 1 })
        .sort_by_file_name();

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("遍历目录失败: {e}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let matched = entry
            .file_name()
            .to_str()
            .is_some_and(|name| pattern.matches_with(name, match_opts));
        if matched {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// 目录模式：逐个转换匹配的文件，单个文件失败不影响其他文件
///
/// # Errors
/// 只有源目录不存在或文件名模式无效时返回错误
pub fn convert_folder(
    source_dir: &Path,
    dest_dir: &Path,
    options: &ConvertOptions,
    mut errors: Option<&mut ErrorWriter>,
) -> Result<BatchReport> {
    if !source_dir.is_dir() {
        return Err(IisLogError::config(format!(
            "源目录不存在: {}",
            source_dir.display()
        )));
    }

    let start = Instant::now();
    let files = collect_log_files(source_dir, &options.pattern, options.recurse)?;
    let mut report = BatchReport { files_found: files.len(), ..Default::default() };

    if files.is_empty() {
        warn!("目录中没有匹配 {} 的文件: {}", options.pattern, source_dir.display());
        return Ok(report);
    }
    info!("在 {} 中找到 {} 个日志文件", source_dir.display(), files.len());

    for source in files {
        let destination =
            destination_for(&source, source_dir, dest_dir, options.format);
        match convert_file(&source, &destination, options, errors.as_deref_mut()) {
            Ok(file_report) => report.converted.push(file_report),
            Err(e) => {
                error!("处理失败 {}: {e}", source.display());
                report.failed.push((source, e.to_string()));
            }
        }
    }

    report.elapsed = start.elapsed();
    info!("批处理完成: {report}");
    debug!("导出统计: {}", report.merged_stats());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_for_mirrors_structure() {
        let dest = destination_for(
            Path::new("/in/W3SVC1/u_ex240101.log"),
            Path::new("/in"),
            Path::new("/out"),
            OutputFormat::Xlsx,
        );
        assert_eq!(dest, PathBuf::from("/out/W3SVC1/u_ex240101.xlsx"));

        let dest = destination_for(
            Path::new("/elsewhere/a.log"),
            Path::new("/in"),
            Path::new("/out"),
            OutputFormat::Csv,
        );
        assert_eq!(dest, PathBuf::from("/out/a.csv"));
    }

    #[test]
    fn test_options_builder() {
        let opts = ConvertOptions::default()
            .with_format(OutputFormat::Xlsx)
            .with_chunk_size(5)
            .with_max_rows_per_sheet(10)
            .with_recurse(true)
            .with_pattern("u_ex*.log")
            .with_default_schema(Some(LogSchema::from_whitespace("a b")));
        assert_eq!(opts.format, OutputFormat::Xlsx);
        assert_eq!(opts.chunk_size, 5);
        assert_eq!(opts.max_rows_per_sheet, 10);
        assert!(opts.recurse);
        assert_eq!(opts.pattern, "u_ex*.log");
        assert_eq!(opts.default_schema.unwrap().len(), 2);
    }

    #[test]
    fn test_batch_report_totals() {
        let file = |records, skipped_lines| FileReport {
            source: PathBuf::from("a.log"),
            destination: PathBuf::from("a.csv"),
            records,
            skipped_lines,
            stats: ExportStats::default(),
        };
        let report = BatchReport {
            files_found: 3,
            converted: vec![file(10, 1), file(5, 0)],
            failed: vec![(PathBuf::from("c.log"), "boom".into())],
            elapsed: Duration::from_millis(5),
        };
        assert_eq!(report.total_records(), 15);
        assert_eq!(report.total_skipped(), 1);
        assert!(report.has_failures());
        assert!(report.to_string().contains("失败 1 个"));
        assert_eq!(report.merged_stats().exported_records, 15);
    }
}
