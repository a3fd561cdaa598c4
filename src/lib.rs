// ==========================================
// 采收计件结算系统 - 核心库
// ==========================================
// 职责: 交付表格导入 → 价格解析 → 工人单日结算 → xlsx 报表
// 技术栈: Rust + SQLite
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "es");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 价格解析与结算聚合
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 报表层 - xlsx 生成
pub mod report;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - 依赖组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体
pub use domain::{
    AggregatedSettlement, ContainerSummary, DeliveryRecord, IngestMode, PriceRule, ReportLayout,
    SettlementRecord, WorkerDaySummary,
};

// 引擎
pub use engine::{PriceResolver, Resolution, SettlementAggregator};

// 导入
pub use importer::{DeliveryImporter, DeliveryImporterImpl, LoadOutcome, RowNormalizer};

// 报表
pub use report::ReportWriter;

// API
pub use api::{ApiError, SettlementApi, SettlementRun};

// ==========================================
// 版本信息
// ==========================================
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "采收计件结算系统";
