//! 命令行参数
//!
//! 使用 clap derive 定义参数；命令行中给出的值覆盖配置文件中的同名设置。

use crate::config::Config;
use crate::error::{IisLogError, Result};
use crate::exporter::OutputFormat;
use clap::{ArgGroup, Parser};
use std::path::PathBuf;

/// 运行模式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// 单文件转换
    Single { source: PathBuf, output: PathBuf },
    /// 目录批量转换
    Folder { source: PathBuf, output: PathBuf },
}

#[derive(Parser, Debug)]
#[command(
    name = "iislog-convert",
    version,
    about = "将 IIS W3C 扩展格式日志转换为 CSV 或 XLSX",
    long_about = r#"
将 IIS W3C 扩展格式日志转换为 CSV 或 XLSX。

按 `#Fields:` 指令确定列顺序，坏行记录后跳过；XLSX 输出超过单个工作表
行数上限时自动拆分到多个工作表。

示例:
  iislog-convert --file u_ex240101.log --output out.csv
  iislog-convert --file u_ex240101.log --output out --format xlsx
  iislog-convert --folder ./logs --output-folder ./converted --recurse
  iislog-convert --folder ./logs --output-folder ./converted --errors-out skipped.jsonl
"#
)]
#[command(group(
    ArgGroup::new("input").required(true).args(["file", "folder"])
))]
pub struct Args {
    /// 单个日志文件
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// 单文件模式的输出路径（扩展名按输出格式替换）
    #[arg(long, value_name = "PATH", requires = "file")]
    pub output: Option<PathBuf>,

    /// 日志目录
    #[arg(long, value_name = "DIR")]
    pub folder: Option<PathBuf>,

    /// 目录模式的输出目录
    #[arg(long, value_name = "DIR", requires = "folder")]
    pub output_folder: Option<PathBuf>,

    /// 输出格式
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// 递归处理子目录
    #[arg(long)]
    pub recurse: bool,

    /// 文件名匹配模式（glob 形式，例如 "u_ex*.log"）
    #[arg(long)]
    pub pattern: Option<String>,

    /// 每个分块的记录数，0 表示整个文件一次处理
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// 每个工作表的最大行数（含表头）
    #[arg(long)]
    pub max_rows_per_sheet: Option<u32>,

    /// 缺少 `#Fields:` 指令时使用的字段列表（空格分隔）
    #[arg(long, value_name = "FIELDS")]
    pub default_fields: Option<String>,

    /// 被跳过行的 JSONL 报告路径
    #[arg(long, value_name = "PATH")]
    pub errors_out: Option<PathBuf>,

    /// TOML 配置文件
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Args {
    /// 确定运行模式
    ///
    /// # Errors
    /// 缺少对应的输出参数时返回 `IisLogError::Config`
    pub fn mode(&self) -> Result<Mode> {
        match (&self.file, &self.folder) {
            (Some(file), None) => {
                let output = self
                    .output
                    .clone()
                    .ok_or_else(|| IisLogError::config("单文件模式需要 --output"))?;
                Ok(Mode::Single { source: file.clone(), output })
            }
            (None, Some(folder)) => {
                let output = self.output_folder.clone().ok_or_else(|| {
                    IisLogError::config("目录模式需要 --output-folder")
                })?;
                Ok(Mode::Folder { source: folder.clone(), output })
            }
            _ => Err(IisLogError::config("--file 与 --folder 必须且只能指定一个")),
        }
    }

    /// 加载配置文件（未指定时使用默认值）并合并命令行参数
    pub fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        self.apply_to(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// 用命令行参数覆盖配置
    pub fn apply_to(&self, config: &mut Config) {
        let convert = &mut config.convert;
        if let Some(format) = self.format {
            convert.format = format;
        }
        if self.recurse {
            convert.recurse = true;
        }
        if let Some(pattern) = &self.pattern {
            convert.pattern = pattern.clone();
        }
        if let Some(n) = self.chunk_size {
            convert.chunk_size = n;
        }
        if let Some(n) = self.max_rows_per_sheet {
            convert.max_rows_per_sheet = n;
        }
        if let Some(fields) = &self.default_fields {
            convert.default_fields = Some(fields.clone());
        }
        if let Some(path) = &self.errors_out {
            convert.errors_out_path = Some(path.to_string_lossy().into_owned());
        }
        if let Some(level) = &self.log_level {
            config.log.level = level.clone();
        }
    }
}
