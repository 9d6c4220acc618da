//! 集成测试公共模块

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// 创建测试用的 IIS 日志文件（自动创建父目录）
pub fn create_test_log(dir: &TempDir, relative: &str, content: &str) -> PathBuf {
    let file_path = dir.path().join(relative);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent).expect("Failed to create test dir");
    }
    fs::write(&file_path, content).expect("Failed to write test file");
    file_path
}

/// 标准测试日志：3 条有效记录
#[allow(dead_code)]
pub const SAMPLE_LOG_CONTENT: &str = "#Software: Microsoft Internet Information Services 10.0\r
#Version: 1.0\r
#Date: 2024-01-01 00:00:00\r
#Fields: date time c-ip cs-method cs-uri-stem sc-status\r
2024-01-01 00:00:00 192.168.1.1 GET /index.html 200\r
2024-01-01 00:00:05 192.168.1.2 POST /login 302\r
2024-01-01 00:00:09 10.0.0.7 GET /favicon.ico 404\r
";

/// 含一行字段数不符的日志：3 条有效记录，第 5 行为坏行
#[allow(dead_code)]
pub const MALFORMED_LOG_CONTENT: &str = "#Software: Microsoft Internet Information Services 10.0
#Fields: date time c-ip cs-method cs-uri-stem sc-status
2024-01-01 00:00:00 192.168.1.1 GET /index.html 200

2024-01-01 00:00:01 192.168.1.1 GET
2024-01-01 00:00:02 192.168.1.3 GET /about 200
2024-01-01 00:00:03 192.168.1.4 GET /contact 200
";

/// 以 UTF-8 BOM 开头的日志（IIS 以 UTF-8 编码写日志时的常见形式）：2 条有效记录
#[allow(dead_code)]
pub const BOM_LOG_CONTENT: &str = "\u{feff}#Software: Microsoft Internet Information Services 10.0\r
#Version: 1.0\r
#Fields: date time c-ip cs-method cs-uri-stem sc-status\r
2024-01-01 00:00:00 192.168.1.1 GET /index.html 200\r
2024-01-01 00:00:05 192.168.1.2 POST /login 302\r
";

/// 第一个 `#Fields:` 指令之前有一行数据的日志：第 1 行被跳过，2 条有效记录
#[allow(dead_code)]
pub const DATA_BEFORE_FIELDS_LOG_CONTENT: &str = "2024-01-01 00:00:00 /stray 200
#Fields: date time cs-uri-stem sc-status
2024-01-01 00:00:01 /a 200
2024-01-01 00:00:02 /b 404
";

/// 没有 `#Fields:` 指令的日志
#[allow(dead_code)]
pub const NO_FIELDS_LOG_CONTENT: &str = "#Software: Microsoft Internet Information Services 10.0
2024-01-01 00:00:00 192.168.1.1 GET /index.html 200
";

/// 生成 `n` 条记录的日志，字段为 `date time cs-uri-stem sc-status`
#[allow(dead_code)]
pub fn generated_log(n: usize) -> String {
    let mut content =
        String::from("#Fields: date time cs-uri-stem sc-status\n");
    for i in 0..n {
        content.push_str(&format!(
            "2024-01-01 00:{:02}:{:02} /page/{i} 200\n",
            (i / 60) % 60,
            i % 60
        ));
    }
    content
}

/// 验证文件存在且非空
#[allow(dead_code)]
pub fn verify_output_file_exists(path: &Path) -> bool {
    path.exists() && fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false)
}
