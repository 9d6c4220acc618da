//! IIS 日志解析模块
//!
//! 提供 IIS W3C 扩展日志的行解析、分块读取、类型定义和工具函数

pub mod io;
pub mod parser;
pub mod types;
pub mod utils;

// 重新导出核心类型和函数
pub use io::{ChunkReader, DEFAULT_CHUNK_SIZE};
pub use parser::{IisLogParser, LineOutcome};
pub use types::{Chunk, LineError, LogRecord, LogSchema};
