// ==========================================
// 采收计件结算系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 传播策略: 行级/块级错误只计数,整体失败才向上返回
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 单行解析失败（日期无法确定）
///
/// row 为 1 起始的表格行号
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("日期无效 (行 {row}): '{value}'")]
pub struct RowParseError {
    pub row: usize,
    pub value: String,
}

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xls/.csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    // ===== 数据错误 =====
    #[error("没有插入任何有效行 (错误行数: {error_rows})")]
    NoValidRows { error_rows: usize },

    // ===== 存储错误 =====
    #[error("存储失败: {0}")]
    Storage(#[from] RepositoryError),

    #[error("暂存批量通道不可用（ingest_mode 未配置为 STAGED）")]
    StagingUnavailable,

    // ===== 配置错误 =====
    #[error("配置读取失败 (key: {key}): {message}")]
    ConfigReadError { key: String, message: String },
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
