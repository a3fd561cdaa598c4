// ==========================================
// 采收计件结算系统 - 报表层
// ==========================================
// 职责: 结算记录 → xlsx 字节,文件命名
// 红线: 报表层只读,不访问数据库,不写磁盘
// ==========================================

pub mod error;
pub mod report_writer;
pub mod sheet_name;

use chrono::{DateTime, TimeZone};

pub use error::{ReportError, ReportResult};
pub use report_writer::{summarize, ReportWriter, SummaryRow};
pub use sheet_name::{sanitize_sheet_name, SheetNamer};

/// 报表建议文件名: liquidaciones_<生成时间>.xlsx
pub fn suggested_filename<Tz: TimeZone>(generated_at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("liquidaciones_{}.xlsx", generated_at.format("%Y-%m-%d_%H-%M-%S"))
}
