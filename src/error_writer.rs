//! 跳过行报告 - JSONL 错误记录器
//!
//! 每个被跳过的行（字段数不符、编码错误、空的 `#Fields:` 指令）写成一行 JSON：
//!
//! ```json
//! {"path":"W3SVC1/u_ex240101.log","line":42,"error":"格式错误 (行42): 期望 14 个字段，实际 12 个","raw":"2024-01-01 00:00:01 ..."}
//! ```
//!
//! 文件以追加方式打开，批处理中所有文件共用同一份报告。

use crate::iislog::LineError;
use serde_json::json;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// 错误写入器，将被跳过的行写入 JSONL 文件
pub struct ErrorWriter {
    writer: BufWriter<File>,
    path: PathBuf,
    written: usize,
}

impl ErrorWriter {
    /// 创建新的错误写入器
    ///
    /// # Errors
    /// 当无法创建或打开输出文件时返回错误
    pub fn new<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();

        // 确保父目录存在
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self { writer: BufWriter::new(file), path, written: 0 })
    }

    /// 写入一个源文件的被跳过行
    ///
    /// 单条写入失败只记录日志，不中断转换流程。
    pub fn write_errors<P: AsRef<Path>>(
        &mut self,
        file_path: P,
        errors: &[LineError],
    ) {
        if errors.is_empty() {
            return;
        }

        let file_path_str = file_path.as_ref().to_string_lossy();

        for (line_num, raw_line, error) in errors {
            let json_obj = json!({
                "path": file_path_str,
                "line": line_num,
                "error": error.to_string(),
                "raw": raw_line
            });

            if writeln!(self.writer, "{json_obj}").is_err() {
                tracing::error!("写入错误信息到文件失败: {}", self.path.display());
            } else {
                self.written += 1;
            }
        }

        // 立即刷新缓冲区，确保数据写入磁盘
        if self.writer.flush().is_err() {
            tracing::error!("刷新错误文件缓冲区失败: {}", self.path.display());
        }
    }

    /// 已写入的条数
    pub fn written(&self) -> usize {
        self.written
    }

    /// 获取错误文件路径
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ErrorWriter {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IisLogError;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_error_writer_basic() {
        let temp_dir = tempdir().unwrap();
        let error_file = temp_dir.path().join("report").join("errors.jsonl");

        let mut writer = ErrorWriter::new(&error_file).unwrap();

        let errors = vec![
            (
                42,
                "2024-01-01 00:00:00 GET".to_string(),
                IisLogError::MalformedLine { line: 42, expected: 6, found: 3 },
            ),
            (43, "len=3 prefix=[255]".to_string(), IisLogError::Encoding {
                line: 43,
            }),
        ];

        writer.write_errors("/logs/u_ex240101.log", &errors);
        writer.write_errors("/logs/u_ex240101.log", &[]);
        assert_eq!(writer.written(), 2);

        let content = fs::read_to_string(&error_file).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["path"], "/logs/u_ex240101.log");
        assert_eq!(first["line"], 42);
        assert_eq!(first["raw"], "2024-01-01 00:00:00 GET");

        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["line"], 43);
    }

    #[test]
    fn test_error_writer_appends() {
        let temp_dir = tempdir().unwrap();
        let error_file = temp_dir.path().join("errors.jsonl");
        let errors =
            vec![(1, "x".to_string(), IisLogError::EmptyDirective { line: 1 })];

        ErrorWriter::new(&error_file).unwrap().write_errors("a.log", &errors);
        ErrorWriter::new(&error_file).unwrap().write_errors("b.log", &errors);

        let content = fs::read_to_string(&error_file).unwrap();
        assert_eq!(content.lines().count(), 2);
    }
}
