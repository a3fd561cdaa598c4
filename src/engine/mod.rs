// ==========================================
// 采收计件结算系统 - 引擎层
// ==========================================
// 职责: 价格解析 + 结算聚合
// 红线: Engine 不拼 SQL,数据只经由存储端口读取
// 红线: 价格规则快照按请求传入,无进程级缓存
// ==========================================

pub mod price_resolver;
pub mod settlement_aggregator;

// 重导出核心引擎
pub use price_resolver::{PriceResolver, Resolution};
pub use settlement_aggregator::{
    fold_aggregated_view, fold_settlements, fold_worker_summary, AggregationOutcome,
    GenerationSummary, SettlementAggregator,
};
