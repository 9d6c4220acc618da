//! IIS 日志解析的工具函数

use crate::error::IisLogError;
use crate::iislog::types::LineError;
use std::{borrow::Cow, str};

/// `#Fields:` 指令前缀
pub const FIELDS_DIRECTIVE: &str = "#Fields:";

/// 注释/指令行的前缀
pub const COMMENT_MARKER: char = '#';

/// 去掉行尾的 `\n` 与 `\r`
#[must_use]
pub fn trim_line_end(line: &[u8]) -> &[u8] {
    let mut end = line.len();
    while end > 0 && matches!(line[end - 1], b'\n' | b'\r') {
        end -= 1;
    }
    &line[..end]
}

/// 去掉文件开头的 UTF-8 BOM
#[must_use]
pub fn strip_bom(line: &[u8]) -> &[u8] {
    line.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(line)
}

/// 判断一行是否为 `#Fields:` 指令（不区分大小写）
#[must_use]
pub fn is_fields_directive(line: &str) -> bool {
    line.get(..FIELDS_DIRECTIVE.len())
        .is_some_and(|p| p.eq_ignore_ascii_case(FIELDS_DIRECTIVE))
}

/// 将读取到的字节转换为字符串（尽可能为 Borrowed）。
///
/// 遇到无效 UTF-8 时记录一条 `Encoding` 错误并返回 `None`，该行会被跳过，
/// 解析继续处理后续行。错误中只保留总长度和最多 8 字节前缀，避免错误文件膨胀。
pub fn line_bytes_to_str_impl<'a>(
    line_bytes: &'a [u8],
    line_num: usize,
    errors: &mut Vec<LineError>,
) -> Option<Cow<'a, str>> {
    match str::from_utf8(line_bytes) {
        Ok(s) => Some(Cow::Borrowed(s)),
        Err(e) => {
            tracing::warn!(line = line_num, error = %e, "发现无效 UTF-8 字节序列");

            let prefix_len = 8usize.min(line_bytes.len());
            let prefix = &line_bytes[..prefix_len];
            let mut raw = format!("len={} prefix={:?}", line_bytes.len(), prefix);
            if prefix_len < line_bytes.len() {
                raw.push_str("...");
            }
            errors.push((
                line_num,
                raw,
                IisLogError::Encoding { line: line_num },
            ));
            None
        }
    }
}
