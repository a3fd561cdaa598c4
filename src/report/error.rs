// ==========================================
// 采收计件结算系统 - 报表层错误类型
// ==========================================

use rust_xlsxwriter::XlsxError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("工作簿生成失败: {0}")]
    Workbook(#[from] XlsxError),

    #[error("没有可生成的工作表（结算记录为空）")]
    NoSheets,

    #[error("工作表名称无效: '{0}'")]
    InvalidSheetName(String),
}

pub type ReportResult<T> = Result<T, ReportError>;
