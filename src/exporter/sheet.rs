//! 工作表分页规划
//!
//! xlsx 单个工作表最多 1,048,576 行。`SheetCursor` 只负责计算每条记录写到
//! 哪个工作表的哪一行，不依赖具体的 Excel 写入库，便于单独测试。

/// xlsx 格式单个工作表的最大行数（含表头）
pub const MAX_XLSX_ROWS: u32 = 1_048_576;

/// 默认工作表名前缀，生成 `Sheet1`、`Sheet2`……
pub const DEFAULT_SHEET_PREFIX: &str = "Sheet";

/// 下一条记录的写入位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetPlacement {
    /// 需要先新建工作表并写入表头，记录写在第 1 行（0 为表头）
    NewSheet { name: String },
    /// 写入当前工作表的指定行
    Row(u32),
}

/// 跟踪当前工作表已写入的行数，在容量用尽时切换到新工作表
#[derive(Debug, Clone)]
pub struct SheetCursor {
    prefix: String,
    max_rows: u32,
    sheets: usize,
    rows_in_sheet: u32,
}

impl SheetCursor {
    /// `max_rows` 为每个工作表的总行数上限（含表头），至少为 2
    pub fn new(prefix: impl Into<String>, max_rows: u32) -> Self {
        Self {
            prefix: prefix.into(),
            max_rows: max_rows.clamp(2, MAX_XLSX_ROWS),
            sheets: 0,
            rows_in_sheet: 0,
        }
    }

    /// 每个工作表可容纳的数据行数
    pub fn data_capacity(&self) -> u32 {
        self.max_rows - 1
    }

    /// 已创建的工作表数量
    pub fn sheets(&self) -> usize {
        self.sheets
    }

    /// 当前工作表已写入的数据行数
    pub fn rows_in_sheet(&self) -> u32 {
        self.rows_in_sheet
    }

    /// 第 `index` 个工作表（从 1 开始）的名称
    pub fn sheet_name(&self, index: usize) -> String {
        format!("{}{}", self.prefix, index)
    }

    /// 新建工作表（不写数据行），用于没有任何记录时仍输出表头
    pub fn open_sheet(&mut self) -> String {
        self.sheets += 1;
        self.rows_in_sheet = 0;
        self.sheet_name(self.sheets)
    }

    /// 为下一条记录分配位置
    pub fn advance(&mut self) -> SheetPlacement {
        if self.sheets == 0 || self.rows_in_sheet >= self.data_capacity() {
            let name = self.open_sheet();
            self.rows_in_sheet = 1;
            return SheetPlacement::NewSheet { name };
        }
        self.rows_in_sheet += 1;
        SheetPlacement::Row(self.rows_in_sheet)
    }
}

impl Default for SheetCursor {
    fn default() -> Self {
        Self::new(DEFAULT_SHEET_PREFIX, MAX_XLSX_ROWS)
    }
}
