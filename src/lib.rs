//! IIS W3C 扩展日志转换工具
//!
//! 按 `#Fields:` 指令解析 IIS 日志，分块流式写出为 CSV 或 XLSX。
//!
//! - [`iislog`]：行解析与分块读取
//! - [`exporter`]：CSV / Excel 导出器，Excel 超出行数上限时自动拆分工作表
//! - [`process`]：单文件流水线与目录批处理

pub mod cli;
pub mod config;
pub mod error;
pub mod error_writer;
pub mod exporter;
pub mod iislog;
#[cfg(feature = "logging")]
pub mod logging;
pub mod process;

pub use error::{IisLogError, Result};
