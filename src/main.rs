use anyhow::{Context, Result};
use clap::Parser;
use iislog_convert::{
    cli::{Args, Mode},
    error_writer::ErrorWriter,
    process::{self, ConvertOptions},
};
use tracing::{error, info};

fn main() -> Result<()> {
    let args = Args::parse();
    let mode = args.mode()?;
    let config = args.load_config()?;

    #[cfg(feature = "logging")]
    let _guard = iislog_convert::logging::init_logging(&config.log)
        .context("初始化日志失败")?;

    let options = ConvertOptions::from(&config.convert);
    let mut errors = match &config.convert.errors_out_path {
        Some(path) => Some(
            ErrorWriter::new(path)
                .with_context(|| format!("无法创建错误报告: {path}"))?,
        ),
        None => None,
    };

    match mode {
        Mode::Single { source, output } => {
            if !source.is_file() {
                anyhow::bail!("源文件不存在: {}", source.display());
            }
            match process::convert_single(
                &source,
                &output,
                &options,
                errors.as_mut(),
            ) {
                Ok(report) => println!(
                    "转换完成: {} -> {}，记录 {} 条，跳过 {} 行",
                    report.source.display(),
                    report.destination.display(),
                    report.records,
                    report.skipped_lines
                ),
                Err(e) if e.is_config_error() => return Err(e.into()),
                Err(e) => error!("处理失败 {}: {e}", source.display()),
            }
        }
        Mode::Folder { source, output } => {
            if !source.is_dir() {
                anyhow::bail!("目录不存在: {}", source.display());
            }
            let report =
                process::convert_folder(&source, &output, &options, errors.as_mut())?;
            for (path, reason) in &report.failed {
                eprintln!("失败: {} ({reason})", path.display());
            }
            println!("\n{report}");
        }
    }

    if let Some(w) = &errors {
        if w.written() > 0 {
            info!("{} 条被跳过的行已写入 {}", w.written(), w.path().display());
        }
    }
    Ok(())
}
