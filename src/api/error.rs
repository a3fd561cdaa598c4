// ==========================================
// 采收计件结算系统 - API层错误类型
// ==========================================
// 职责: 将仓储/导入/报表层错误转换为调用方可读的错误消息
// 红线: 每个面向调用方的失败都必须带可读原因
// ==========================================

use crate::importer::error::ImportError;
use crate::report::ReportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 调用方输入错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    // ==========================================
    // 整体操作失败
    // ==========================================
    /// 没有任何有效输出（零行插入 / 零工作表）
    #[error("结果为空: {message} (错误行数: {error_rows})")]
    EmptyResult { message: String, error_rows: usize },

    /// 依赖的协作方未配置（如暂存批量通道）
    #[error("功能不可用: {0}")]
    Unavailable(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    // ==========================================
    // 导入 / 报表错误
    // ==========================================
    #[error("文件导入失败: {0}")]
    ImportError(String),

    #[error("报表生成失败: {0}")]
    ReportError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseTransactionError(msg)
            | RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg)
            | RepositoryError::ConstraintViolation(msg) => {
                ApiError::DatabaseError(format!("约束违反: {}", msg))
            }
            RepositoryError::StagingError { step, message } => {
                ApiError::DatabaseError(format!("暂存区 {} 失败: {}", step, message))
            }
            RepositoryError::ValidationError(msg) => ApiError::InvalidInput(msg),
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
        }
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::NoValidRows { error_rows } => ApiError::EmptyResult {
                message: "文件中没有可插入的有效行".to_string(),
                error_rows,
            },
            ImportError::StagingUnavailable => ApiError::Unavailable(err.to_string()),
            ImportError::UnsupportedFormat(_) => ApiError::InvalidInput(err.to_string()),
            ImportError::Storage(repo_err) => ApiError::from(repo_err),
            other => ApiError::ImportError(other.to_string()),
        }
    }
}

// ==========================================
// 从 ReportError 转换
// ==========================================
impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::NoSheets => ApiError::EmptyResult {
                message: err.to_string(),
                error_rows: 0,
            },
            other => ApiError::ReportError(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
