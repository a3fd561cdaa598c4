// ==========================================
// 采收计件结算系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、组合键
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod delivery;
pub mod price;
pub mod settlement;
pub mod types;
pub mod views;

// 重导出核心类型
pub use delivery::DeliveryRecord;
pub use price::{PriceContext, PriceRule};
pub use settlement::{SettlementRecord, WorkerDayContainerKey, WorkerDayKey, TOTAL_LABEL};
pub use types::{IngestMode, ReportLayout};
pub use views::{AggregatedSettlement, ContainerSummary, DeliveryRollup, WorkerDaySummary};
