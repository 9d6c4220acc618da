//! 配置管理模块
//!
//! 提供统一的配置文件读取和管理功能。配置文件为 TOML 格式，所有字段都有默认值，
//! 命令行参数会覆盖配置文件中的同名设置。

use crate::error::{IisLogError, Result};
use crate::exporter::{MAX_XLSX_ROWS, OutputFormat};
use crate::iislog::{DEFAULT_CHUNK_SIZE, LogSchema};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 主配置结构体
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 日志配置
    pub log: LogConfig,
    /// 转换配置
    pub convert: ConvertConfig,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// 是否启用控制台输出
    pub enable_stdout: bool,
    /// 日志输出目录，为空时不写日志文件
    pub log_dir: String,
    /// 日志级别 (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enable_stdout: true,
            log_dir: "logs".to_string(),
            level: "info".to_string(),
        }
    }
}

/// 转换配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// 输出格式
    pub format: OutputFormat,
    /// 分块大小，0表示不分块
    pub chunk_size: usize,
    /// 每个工作表的最大行数（含表头）
    pub max_rows_per_sheet: u32,
    /// 工作表名前缀
    pub sheet_prefix: String,
    /// 目录模式下匹配的文件名模式
    pub pattern: String,
    /// 是否递归子目录
    pub recurse: bool,
    /// 缺少 `#Fields:` 指令时使用的默认字段（空白分隔）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_fields: Option<String>,
    /// 被跳过行的 JSONL 报告路径
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors_out_path: Option<String>,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Csv,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_rows_per_sheet: MAX_XLSX_ROWS,
            sheet_prefix: "Sheet".to_string(),
            pattern: "*.log".to_string(),
            recurse: false,
            default_fields: None,
            errors_out_path: None,
        }
    }
}

impl ConvertConfig {
    /// 解析默认字段定义
    pub fn default_schema(&self) -> Option<LogSchema> {
        self.default_fields
            .as_deref()
            .map(LogSchema::from_whitespace)
            .filter(|s| !s.is_empty())
    }
}

impl Config {
    /// 从文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| IisLogError::file_access(path, e))?;
        Self::from_str(&content)
    }

    /// 从字符串加载配置
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        // 验证日志级别
        match self.log.level.to_ascii_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(IisLogError::config(format!(
                    "无效的日志级别: {}",
                    self.log.level
                )));
            }
        }

        let convert = &self.convert;
        if !(2..=MAX_XLSX_ROWS).contains(&convert.max_rows_per_sheet) {
            return Err(IisLogError::config(format!(
                "工作表行数必须在 2 到 {MAX_XLSX_ROWS} 之间: {}",
                convert.max_rows_per_sheet
            )));
        }

        if convert.sheet_prefix.is_empty() || convert.sheet_prefix.len() > 24 {
            return Err(IisLogError::config("工作表名前缀长度必须在 1 到 24 之间"));
        }

        if glob::Pattern::new(&convert.pattern).is_err() {
            return Err(IisLogError::config(format!(
                "无效的文件名模式: {}",
                convert.pattern
            )));
        }

        if convert.default_fields.is_some() && convert.default_schema().is_none()
        {
            tracing::warn!("default_fields 为空，将忽略");
        }

        Ok(())
    }
}
