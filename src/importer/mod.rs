// ==========================================
// 货物装箱与路径决策引擎 - 导入层
// ==========================================
// 职责: 外部数据导入,生成货物登记请求
// 支持: CSV
// ==========================================

pub mod error;
pub mod item_csv;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use item_csv::{CsvImportReport, ItemCsvImporter, RowFailure};
