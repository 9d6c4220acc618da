use crate::error::{IisLogError, Result};
use crate::iislog::{
    parser::{IisLogParser, LineOutcome},
    types::{Chunk, LineError, LogRecord, LogSchema},
    utils,
};
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
    sync::Arc,
};

/// 默认分块大小
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// 分块读取器：按行读取并解析，记录与坏行合计达到 `chunk_size` 时产出一个
/// `Chunk`。
///
/// 任意时刻只持有当前分块，不会把整个文件读入内存。I/O 错误只会产出一次，
/// 之后迭代结束；坏行（包括出现在字段定义之前的数据行）记录在分块的
/// `errors` 中，不会中断迭代。整个文件都没有字段定义时由调用方通过
/// [`ChunkReader::schema`] 判断。
pub struct ChunkReader<R> {
    reader: R,
    source: PathBuf,
    chunk_size: Option<usize>,
    schema: Option<Arc<LogSchema>>,
    line_num: usize,
    buf: Vec<u8>,
    done: bool,
}

impl ChunkReader<BufReader<File>> {
    /// 打开文件并创建读取器
    ///
    /// # Errors
    /// - `IisLogError::FileAccess` - 文件无法打开
    pub fn open<P: AsRef<Path>>(path: P, chunk_size: usize) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| IisLogError::file_access(path, e))?;
        Ok(Self::new(BufReader::new(file), chunk_size).with_source(path))
    }
}

impl<R: BufRead> ChunkReader<R> {
    /// `chunk_size` 为 0 表示不分块，整个文件作为一个分块
    pub fn new(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            source: PathBuf::from("<input>"),
            chunk_size: if chunk_size == 0 { None } else { Some(chunk_size) },
            schema: None,
            line_num: 0,
            buf: Vec::new(),
            done: false,
        }
    }

    /// 设置错误信息中使用的源文件路径
    pub fn with_source<P: Into<PathBuf>>(mut self, source: P) -> Self {
        self.source = source.into();
        self
    }

    /// 文件中出现 `#Fields:` 之前使用的字段定义
    pub fn with_default_schema(mut self, schema: Option<Arc<LogSchema>>) -> Self {
        self.schema = schema;
        self
    }

    /// 当前生效的字段定义
    pub fn schema(&self) -> Option<&Arc<LogSchema>> {
        self.schema.as_ref()
    }

    /// 已读取的行数
    pub fn line_count(&self) -> usize {
        self.line_num
    }

    fn fill_chunk(&mut self) -> Result<Chunk> {
        let mut chunk = Chunk::default();
        loop {
            self.buf.clear();
            let n = self
                .reader
                .read_until(b'\n', &mut self.buf)
                .map_err(|e| IisLogError::file_access(&self.source, e))?;
            if n == 0 {
                self.done = true;
                break;
            }
            self.line_num += 1;

            let mut bytes = utils::trim_line_end(&self.buf);
            if self.line_num == 1 {
                bytes = utils::strip_bom(bytes);
            }
            let Some(line) = utils::line_bytes_to_str_impl(
                bytes,
                self.line_num,
                &mut chunk.errors,
            ) else {
                continue;
            };

            match IisLogParser::parse_line(
                &line,
                self.line_num,
                self.schema.as_ref(),
            ) {
                Ok(LineOutcome::Record(rec)) => chunk.records.push(rec),
                Ok(LineOutcome::Schema(s)) => self.schema = Some(s),
                Ok(LineOutcome::Skip) => {}
                Ok(LineOutcome::Unschemed) => {
                    tracing::warn!(
                        "{} 第{}行出现在字段定义之前，已跳过",
                        self.source.display(),
                        self.line_num
                    );
                    chunk.errors.push((
                        self.line_num,
                        line.into_owned(),
                        IisLogError::DataBeforeSchema { line: self.line_num },
                    ));
                }
                Err(e) => {
                    tracing::warn!(
                        "{} 跳过第{}行: {}",
                        self.source.display(),
                        self.line_num,
                        e
                    );
                    chunk.errors.push((self.line_num, line.into_owned(), e));
                }
            }

            if self
                .chunk_size
                .is_some_and(|n| chunk.records.len() + chunk.errors.len() >= n)
            {
                break;
            }
        }
        chunk.schema = self.schema.clone();
        Ok(chunk)
    }
}

impl<R: BufRead> Iterator for ChunkReader<R> {
    type Item = Result<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.fill_chunk() {
            Ok(chunk) if chunk.is_empty() => None,
            Ok(chunk) => Some(Ok(chunk)),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl IisLogParser {
    /// 按块解析文件，每次最多 `chunk_size` 条记录，并在每个块解析完成后调用 `hook`。
    ///
    /// 参数说明：
    /// - `path`: 要解析的文件路径。
    /// - `chunk_size`: 每次回调时包含的最大记录数，0 表示不分块。
    /// - `hook`: 当收集到一块记录时被调用，接收记录切片 `&[LogRecord]`。
    /// - `err_hook`: 当块内有被跳过的行时被调用，接收 `&[LineError]`。
    ///
    /// # Errors
    /// - `IisLogError::FileAccess` - 文件打开或读取失败
    /// - `IisLogError::SchemaMissing` - 整个文件都没有字段定义
    pub fn parse_in_chunks<P, F, EF>(
        path: P,
        chunk_size: usize,
        mut hook: F,
        mut err_hook: EF,
    ) -> Result<()>
    where
        P: AsRef<Path>,
        F: FnMut(&[LogRecord]),
        EF: FnMut(&[LineError]),
    {
        let path = path.as_ref();
        tracing::debug!(
            "parse_in_chunks: 开始解析文件 {}, chunk_size = {}",
            path.display(),
            chunk_size
        );

        let mut reader = ChunkReader::open(path, chunk_size)?;
        for chunk in reader.by_ref() {
            let chunk = chunk?;
            if !chunk.errors.is_empty() {
                err_hook(&chunk.errors);
            }
            if !chunk.records.is_empty() {
                hook(&chunk.records);
            }
        }
        ensure_schema(&reader, path)
    }

    /// 解析整个文件，返回全部记录与被跳过的行（适合小文件与测试）
    pub fn parse_all<P: AsRef<Path>>(
        path: P,
    ) -> Result<(Vec<LogRecord>, Vec<LineError>)> {
        let path = path.as_ref();
        let mut records = Vec::new();
        let mut errors = Vec::new();
        let mut reader = ChunkReader::open(path, 0)?;
        for chunk in reader.by_ref() {
            let mut chunk = chunk?;
            records.append(&mut chunk.records);
            errors.append(&mut chunk.errors);
        }
        ensure_schema(&reader, path)?;
        Ok((records, errors))
    }
}

fn ensure_schema<R>(reader: &ChunkReader<R>, path: &Path) -> Result<()> {
    if reader.schema.is_none() {
        return Err(IisLogError::SchemaMissing { path: path.to_path_buf() });
    }
    Ok(())
}
