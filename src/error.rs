//! 错误类型定义
//!
//! 这个模块定义了库中使用的所有错误类型，使用 thiserror 提供丰富的错误信息。
//! 错误分为三个层级：
//! - 行级错误（`MalformedLine`/`Encoding`/`EmptyDirective`/`DataBeforeSchema`）：跳过该行，文件继续处理
//! - 文件级错误（`FileAccess`/`SchemaMissing` 以及导出器错误）：跳过该文件，批处理继续
//! - 配置错误（`Config`）：在处理开始前直接终止

use std::path::PathBuf;

/// IIS 日志转换的结果类型
pub type Result<T> = std::result::Result<T, IisLogError>;

/// IIS 日志转换错误类型
#[derive(Debug, thiserror::Error)]
pub enum IisLogError {
    /// IO错误
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    /// 源文件不可读或目标文件不可写
    #[error("文件访问失败 ({}): {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 字段数量与 `#Fields:` 定义不一致
    #[error("格式错误 (行{line}): 期望 {expected} 个字段，实际 {found} 个")]
    MalformedLine { line: usize, expected: usize, found: usize },

    /// 行内容不是合法的 UTF-8
    #[error("UTF-8编码错误 (行{line})")]
    Encoding { line: usize },

    /// `#Fields:` 指令中没有字段名
    #[error("空的 #Fields 指令 (行{line})")]
    EmptyDirective { line: usize },

    /// 数据行出现在第一个 `#Fields:` 指令之前
    #[error("字段定义之前的数据行 (行{line})")]
    DataBeforeSchema { line: usize },

    /// 整个文件既没有 `#Fields:` 指令也没有默认字段
    #[error("缺少字段定义: {}", path.display())]
    SchemaMissing { path: PathBuf },

    /// CSV 写入错误
    #[cfg(feature = "exporter-csv")]
    #[error("CSV错误: {0}")]
    Csv(#[from] csv::Error),

    /// Excel 写入错误
    #[error("Excel错误: {0}")]
    Excel(String),

    /// 配置文件解析错误
    #[error("配置文件解析错误: {0}")]
    Toml(#[from] toml::de::Error),

    /// 配置序列化错误
    #[error("配置序列化错误: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),
}

impl IisLogError {
    /// 创建一个配置错误
    pub fn config<S: Into<String>>(message: S) -> Self {
        let message = message.into();
        tracing::error!("配置错误: {}", message);
        Self::Config(message)
    }

    /// 创建一个文件访问错误
    pub fn file_access<P: Into<PathBuf>>(
        path: P,
        source: std::io::Error,
    ) -> Self {
        Self::FileAccess { path: path.into(), source }
    }

    /// 检查是否为 IO 错误
    pub fn is_io_error(&self) -> bool {
        matches!(self, IisLogError::Io(_) | IisLogError::FileAccess { .. })
    }

    /// 检查是否为行级错误（跳过该行即可）
    pub fn is_line_error(&self) -> bool {
        matches!(
            self,
            IisLogError::MalformedLine { .. }
                | IisLogError::Encoding { .. }
                | IisLogError::EmptyDirective { .. }
                | IisLogError::DataBeforeSchema { .. }
        )
    }

    /// 检查是否为缺少字段定义错误
    pub fn is_schema_missing(&self) -> bool {
        matches!(self, IisLogError::SchemaMissing { .. })
    }

    /// 检查是否为配置错误
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            IisLogError::Config(_)
                | IisLogError::Toml(_)
                | IisLogError::TomlSer(_)
        )
    }
}
