// ==========================================
// 采收计件结算系统 - 交付仓储
// ==========================================
// core:   标准事务写入 + 查询
// staged: 暂存区批量复制 + 合并
// ==========================================

mod core;
mod staged;


pub use self::core::DeliveryRepository;
pub use self::staged::StagedDeliveryRepository;
