//! 日志初始化和配置模块
//!
//! 这个模块提供了统一的日志初始化功能，使用 tracing 库。
//! 默认配置：info 级别，输出到控制台和 logs 目录，按天滚动。
//! 设置 `RUST_LOG` 环境变量可覆盖配置中的级别。

use crate::config::LogConfig;
use std::io;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, time::SystemTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("IO错误: {0}")]
    Io(#[from] io::Error),
    #[error("日志配置错误: {0}")]
    Config(String),
}

/// 日志初始化结果
pub type LogResult<T> = Result<T, LogError>;

/// 初始化日志系统
///
/// - 控制台输出（`enable_stdout`）
/// - `log_dir` 非空时按天滚动写入 `iislog-convert.<日期>` 文件
///
/// 返回文件写入线程的 guard，调用方需持有到程序结束，否则尾部日志可能丢失。
/// 如果全局订阅者已经存在（例如测试中重复初始化），返回 `Ok(None)`。
///
/// # Examples
///
/// ```no_run
/// use iislog_convert::config::LogConfig;
/// use iislog_convert::logging::init_logging;
///
/// let _guard = init_logging(&LogConfig::default()).unwrap();
/// ```
pub fn init_logging(config: &LogConfig) -> LogResult<Option<WorkerGuard>> {
    let level = config.level.to_ascii_lowercase();
    if level.parse::<tracing::Level>().is_err() {
        return Err(LogError::Config(format!("无效的日志级别: {level}")));
    }

    // 创建环境过滤器，默认使用配置的级别
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&level));

    // 控制台输出层
    let console_layer = config.enable_stdout.then(|| {
        fmt::layer()
            .with_writer(io::stderr)
            .with_timer(SystemTime)
            .with_target(false)
            .with_ansi(true)
            .boxed()
    });

    // 文件输出层 - 按天滚动
    let mut guard = None;
    let file_layer = if config.log_dir.is_empty() {
        None
    } else {
        std::fs::create_dir_all(&config.log_dir)?;
        let file_appender =
            tracing_appender::rolling::daily(&config.log_dir, "iislog-convert");
        let (non_blocking, g) = tracing_appender::non_blocking(file_appender);
        guard = Some(g);
        Some(
            fmt::layer()
                .with_writer(non_blocking)
                .with_timer(SystemTime)
                .with_target(true)
                .with_ansi(false) // 文件中不使用颜色
                .boxed(),
        )
    };

    // 尝试初始化，如果失败说明已经初始化过了
    match Registry::default()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
    {
        Ok(()) => {
            tracing::debug!("日志系统初始化完成, 级别: {level}");
            Ok(guard)
        }
        Err(_) => Ok(None),
    }
}
