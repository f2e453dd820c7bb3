// ==========================================
// 货物装箱与路径决策引擎 - 货物 CSV 导入
// ==========================================
// 表头: tracking_id,description,weight,length,width,height,destination,priority
// 规则:
// - tracking_id / priority 为空视为未提供
// - 重量与尺寸必须为正数，目的地不可为空
// - 单行失败记入报告（行号从 2 开始，第 1 行为表头），其余行继续
// ==========================================

use crate::domain::item::ItemRegistration;
use crate::importer::error::{ImportError, ImportResult};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

const REQUIRED_COLUMNS: [&str; 5] = ["weight", "length", "width", "height", "destination"];

// CSV 原始行
#[derive(Debug, Deserialize)]
struct RawItemRow {
    #[serde(default)]
    tracking_id: Option<String>,
    #[serde(default)]
    description: Option<String>,
    weight: f64,
    length: f64,
    width: f64,
    height: f64,
    destination: String,
    #[serde(default)]
    priority: Option<String>,
}

/// 行级失败
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowFailure {
    pub row: usize,
    pub reason: String,
}

/// 导入报告
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CsvImportReport {
    /// (行号, 登记请求)
    pub rows: Vec<(usize, ItemRegistration)>,
    pub failures: Vec<RowFailure>,
}

impl CsvImportReport {
    pub fn total(&self) -> usize {
        self.rows.len() + self.failures.len()
    }
}

// ==========================================
// ItemCsvImporter
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct ItemCsvImporter;

impl ItemCsvImporter {
    pub fn new() -> Self {
        Self
    }

    /// 读取 CSV 文件
    pub fn parse_file(&self, path: &Path) -> ImportResult<CsvImportReport> {
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        if let Some(ext) = path.extension() {
            if !ext.eq_ignore_ascii_case("csv") {
                return Err(ImportError::UnsupportedFormat(
                    ext.to_string_lossy().to_string(),
                ));
            }
        }

        let file = File::open(path)?;
        let report = self.parse_reader(file)?;
        info!(
            path = %path.display(),
            rows = report.rows.len(),
            failures = report.failures.len(),
            "货物 CSV 解析完成"
        );
        Ok(report)
    }

    /// 从任意 Reader 解析
    pub fn parse_reader<R: Read>(&self, reader: R) -> ImportResult<CsvImportReport> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);

        let headers = normalize_headers(reader.headers()?);
        for column in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| h == column) {
                return Err(ImportError::MissingColumn(column.to_string()));
            }
        }

        let mut report = CsvImportReport::default();
        for (idx, result) in reader.records().enumerate() {
            let row = idx + 2;
            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    report.failures.push(RowFailure { row, reason: e.to_string() });
                    continue;
                }
            };

            // 跳过完全空白的行
            if record.iter().all(|v| v.is_empty()) {
                continue;
            }

            match Self::convert_record(&record, &headers, row) {
                Ok(registration) => report.rows.push((row, registration)),
                Err(reason) => {
                    warn!(row, %reason, "CSV 行解析失败");
                    report.failures.push(RowFailure { row, reason });
                }
            }
        }

        Ok(report)
    }

    fn convert_record(
        record: &StringRecord,
        headers: &StringRecord,
        row: usize,
    ) -> Result<ItemRegistration, String> {
        let raw: RawItemRow = record.deserialize(Some(headers)).map_err(|e| e.to_string())?;

        for (field, value) in [
            ("weight", raw.weight),
            ("length", raw.length),
            ("width", raw.width),
            ("height", raw.height),
        ] {
            if !(value > 0.0) || !value.is_finite() {
                return Err(format!("字段 {} 必须为正数: {}", field, value));
            }
        }

        if raw.destination.is_empty() {
            return Err("destination 不能为空".to_string());
        }

        let priority = match non_blank(raw.priority) {
            Some(p) => Some(p.parse::<i32>().map_err(|e| {
                ImportError::TypeConversionError {
                    row,
                    field: "priority".to_string(),
                    message: e.to_string(),
                }
                .to_string()
            })?),
            None => None,
        };

        Ok(ItemRegistration {
            tracking_id: non_blank(raw.tracking_id),
            description: raw.description.unwrap_or_default(),
            weight: raw.weight,
            length: raw.length,
            width: raw.width,
            height: raw.height,
            destination: raw.destination,
            priority,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// 表头统一小写
fn normalize_headers(headers: &StringRecord) -> StringRecord {
    headers.iter().map(|h| h.trim().to_lowercase()).collect()
}
