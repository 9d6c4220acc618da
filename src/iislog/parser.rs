//! IIS 日志行解析器
//!
//! W3C 扩展日志格式以 `#` 开头的指令行描述文件元数据，其中 `#Fields:`
//! 定义了后续数据行的列顺序；数据行使用空白分隔各字段。
//!
//! ## 解析规则
//!
//! - `#Fields:` 指令：生成新的 `LogSchema` 并替换之前的定义，不产生记录
//! - 其他指令（`#Software`、`#Version`、`#Date` 等）与空行：忽略
//! - 数据行：按空白切分，字段数与定义一致时生成 `LogRecord`，
//!   不一致时返回 `MalformedLine`，由调用方记录后跳过
//!
//! ## 使用示例
//!
//! ```rust
//! use iislog_convert::iislog::{IisLogParser, LineOutcome, LogSchema};
//! use std::sync::Arc;
//!
//! let schema = Arc::new(LogSchema::from_whitespace("date time c-ip"));
//! let outcome =
//!     IisLogParser::parse_line("2024-01-01 00:00:00 10.0.0.1", 1, Some(&schema))?;
//! match outcome {
//!     LineOutcome::Record(rec) => assert_eq!(rec.get("c-ip"), Some("10.0.0.1")),
//!     _ => unreachable!(),
//! }
//! # Ok::<(), iislog_convert::error::IisLogError>(())
//! ```

use crate::error::{IisLogError, Result};
use crate::iislog::types::{LogRecord, LogSchema};
use crate::iislog::utils;
use std::sync::Arc;

/// 单行解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// `#Fields:` 指令，携带新的字段定义
    Schema(Arc<LogSchema>),
    /// 其他指令或空行
    Skip,
    /// 数据行，但此时还没有任何字段定义
    Unschemed,
    /// 成功解析的记录
    Record(LogRecord),
}

/// IIS 日志行解析器
pub struct IisLogParser;

impl IisLogParser {
    /// 解析一行文本（不含换行符）。
    ///
    /// 错误处理：字段数不匹配返回 `MalformedLine`，空的 `#Fields:` 指令返回
    /// `EmptyDirective`；两者都是行级错误，不影响文件中的其他行。
    pub fn parse_line(
        line: &str,
        line_num: usize,
        schema: Option<&Arc<LogSchema>>,
    ) -> Result<LineOutcome> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(LineOutcome::Skip);
        }

        if trimmed.starts_with(utils::COMMENT_MARKER) {
            if !utils::is_fields_directive(trimmed) {
                tracing::trace!("行{line_num} 跳过指令: {trimmed}");
                return Ok(LineOutcome::Skip);
            }
            let new_schema = LogSchema::from_whitespace(
                &trimmed[utils::FIELDS_DIRECTIVE.len()..],
            );
            if new_schema.is_empty() {
                return Err(IisLogError::EmptyDirective { line: line_num });
            }
            tracing::debug!("行{line_num} 字段定义: {new_schema}");
            return Ok(LineOutcome::Schema(Arc::new(new_schema)));
        }

        let Some(schema) = schema else {
            return Ok(LineOutcome::Unschemed);
        };

        let values: Vec<String> =
            trimmed.split_whitespace().map(str::to_string).collect();
        if values.len() != schema.len() {
            return Err(IisLogError::MalformedLine {
                line: line_num,
                expected: schema.len(),
                found: values.len(),
            });
        }

        Ok(LineOutcome::Record(LogRecord::new(Arc::clone(schema), values)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Arc<LogSchema> {
        Arc::new(LogSchema::from_whitespace(
            "date time client-ip method uri status",
        ))
    }

    #[test]
    fn test_parse_record() {
        let s = schema();
        let out = IisLogParser::parse_line(
            "2024-01-01 00:00:00 192.168.1.1 GET /index.html 200",
            1,
            Some(&s),
        )
        .unwrap();
        let LineOutcome::Record(rec) = out else {
            panic!("expected record, got {out:?}");
        };
        assert_eq!(rec.get("date"), Some("2024-01-01"));
        assert_eq!(rec.get("time"), Some("00:00:00"));
        assert_eq!(rec.get("client-ip"), Some("192.168.1.1"));
        assert_eq!(rec.get("method"), Some("GET"));
        assert_eq!(rec.get("uri"), Some("/index.html"));
        assert_eq!(rec.get("status"), Some("200"));
    }

    #[test]
    fn test_fields_directive() {
        let out = IisLogParser::parse_line(
            "#Fields: date time s-ip cs-method",
            4,
            None,
        )
        .unwrap();
        let LineOutcome::Schema(s) = out else {
            panic!("expected schema");
        };
        assert_eq!(s.fields(), ["date", "time", "s-ip", "cs-method"]);
    }

    #[test]
    fn test_other_directives_and_blank_lines() {
        let s = schema();
        for line in ["#Software: Microsoft IIS 10.0", "#Version: 1.0", "", "  \t"]
        {
            assert_eq!(
                IisLogParser::parse_line(line, 1, Some(&s)).unwrap(),
                LineOutcome::Skip
            );
        }
    }

    #[test]
    fn test_malformed_line() {
        let s = schema();
        let err = IisLogParser::parse_line("2024-01-01 00:00:00 GET", 9, Some(&s))
            .unwrap_err();
        assert!(matches!(
            err,
            IisLogError::MalformedLine { line: 9, expected: 6, found: 3 }
        ));
    }

    #[test]
    fn test_empty_directive_and_unschemed() {
        let err = IisLogParser::parse_line("#Fields:   ", 2, None).unwrap_err();
        assert!(matches!(err, IisLogError::EmptyDirective { line: 2 }));

        let out = IisLogParser::parse_line("a b c", 3, None).unwrap();
        assert_eq!(out, LineOutcome::Unschemed);
    }
}
