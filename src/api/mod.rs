// ==========================================
// 采收计件结算系统 - API 层
// ==========================================
// 职责: 对外业务接口,错误统一为 ApiError
// ==========================================

pub mod error;
pub mod settlement_api;

pub use error::{ApiError, ApiResult};
pub use settlement_api::{SettlementApi, SettlementRun};
