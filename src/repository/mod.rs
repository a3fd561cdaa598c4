// ==========================================
// 采收计件结算系统 - 数据仓储层
// ==========================================
// 职责: 数据访问,不含业务逻辑
// 存储: SQLite（rusqlite）
// ==========================================

pub mod delivery_repo;
pub mod delivery_store;
pub mod error;
pub mod price_rule_repo;
pub mod settlement_repo;

// 重导出核心仓储
pub use delivery_repo::{DeliveryRepository, StagedDeliveryRepository};
pub use delivery_store::{DeliveryStore, StagingStore};
pub use error::{RepositoryError, RepositoryResult};
pub use price_rule_repo::{PriceCatalog, PriceRuleRepository};
pub use settlement_repo::{ReplaceOutcome, SettlementRepository};
