// ==========================================
// 采收计件结算系统 - 聚合视图模型
// ==========================================
// 用途: 只读报表视图,不产生任何写入
// ==========================================

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

// ==========================================
// DeliveryRollup - 交付预聚合行（原始 SQL 分组结果）
// ==========================================
// 分组维度: (date, worker_name, container_type, crop_block, species, variety)
// 价格解析只依赖后四个维度,因此可按组整体解析
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryRollup {
    pub date: NaiveDate,
    pub worker_name: String,
    pub worker_id: String,
    pub container_type: String,
    pub crop_block: String,
    pub species: String,
    pub variety: String,
    pub record_count: i64,
    pub total_count: i64,
    pub first_time: Option<NaiveTime>,
    pub last_time: Option<NaiveTime>,
    pub field_names: Vec<String>,
}

// ==========================================
// AggregatedSettlement - 按日/工人/容器的结算视图
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedSettlement {
    pub day: NaiveDate,
    pub worker_id: String,
    pub worker_name: String,
    pub container_type: String,
    pub record_count: i64,
    pub total_count: i64,
    pub average_price: f64,
    pub total_cost: f64,
    pub first_time: Option<NaiveTime>,
    pub last_time: Option<NaiveTime>,
    pub field_names: Vec<String>,
    pub crop_blocks: Vec<String>,
}

// ==========================================
// WorkerDaySummary - 按日/工人汇总
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerDaySummary {
    pub day: NaiveDate,
    pub worker_id: String,
    pub worker_name: String,
    pub container_types: usize, // 使用过的不同容器类型数
    pub total_pieces: i64,
    pub total_cost: f64,
    pub first_time: Option<NaiveTime>,
    pub last_time: Option<NaiveTime>,
}

// ==========================================
// ContainerSummary - 容器类型出现次数
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSummary {
    pub container_type: String,
    pub occurrences: i64,
}
