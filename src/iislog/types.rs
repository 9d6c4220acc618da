use crate::error::IisLogError;
use std::{fmt, sync::Arc};

/// 被跳过的行：(行号, 原始内容, 错误)
pub type LineError = (usize, String, IisLogError);

/// 日志字段定义，来自 `#Fields:` 指令或默认配置
///
/// 同一份定义通过 `Arc` 在该定义下解析出的所有记录之间共享。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LogSchema {
    fields: Vec<String>,
}

impl LogSchema {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { fields: fields.into_iter().map(Into::into).collect() }
    }

    /// 从空白分隔的字段列表构造，例如 `"date time c-ip"`
    pub fn from_whitespace(spec: &str) -> Self {
        Self::new(spec.split_whitespace())
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// 字段名所在的列位置
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == name)
    }
}

impl fmt::Display for LogSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fields.join(" "))
    }
}

/// 单条 IIS 日志记录，字段值与 `LogSchema` 按位置一一对应
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    schema: Arc<LogSchema>,
    values: Vec<String>,
}

impl LogRecord {
    /// 构造记录；调用方保证 `values` 与 `schema` 等长
    pub(crate) fn new(schema: Arc<LogSchema>, values: Vec<String>) -> Self {
        debug_assert_eq!(schema.len(), values.len());
        Self { schema, values }
    }

    pub fn schema(&self) -> &Arc<LogSchema> {
        &self.schema
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// 按字段名取值
    pub fn get(&self, field: &str) -> Option<&str> {
        self.schema.position(field).map(|i| self.values[i].as_str())
    }

    /// 按字段定义顺序遍历 (字段名, 值)
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.schema
            .fields()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(String::as_str))
    }

    /// 按字段名投影到另一份字段定义上，缺失字段为空字符串
    pub fn project<'a>(&'a self, target: &'a LogSchema) -> Vec<&'a str> {
        if self.schema.as_ref() == target {
            return self.values.iter().map(String::as_str).collect();
        }
        target
            .fields()
            .iter()
            .map(|name| self.get(name).unwrap_or(""))
            .collect()
    }
}

/// 一个分块：最多 `chunk_size` 条记录，以及填充过程中遇到的坏行
#[derive(Debug, Default)]
pub struct Chunk {
    pub records: Vec<LogRecord>,
    pub errors: Vec<LineError>,
    /// 分块结束时生效的字段定义
    pub schema: Option<Arc<LogSchema>>,
}

impl Chunk {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.errors.is_empty()
    }
}
