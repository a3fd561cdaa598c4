// ==========================================
// 采收计件结算系统 - 应用层
// ==========================================
// 职责: 组装依赖,提供上传串行化与默认数据库路径
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState, DB_PATH_ENV};
