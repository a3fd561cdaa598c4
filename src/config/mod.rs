// ==========================================
// 采收计件结算系统 - 配置层
// ==========================================
// 职责: 管线调优参数与模式选择
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod settlement_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, defaults, ConfigManager};
pub use settlement_config_trait::SettlementConfigReader;
