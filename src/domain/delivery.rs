// ==========================================
// 采收计件结算系统 - 交付领域模型
// ==========================================
// 用途: 导入层写入,结算引擎只读
// 对齐: deliveries 表 / delivery_staging 表
// ==========================================

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

// ==========================================
// DeliveryRecord - 一次采收交付（一个容器事件）
// ==========================================
// 红线: 无唯一性约束,重复记录合法
// 红线: container_count 永不为负
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    // ===== 采收信息 =====
    pub harvest_id: String,   // 交付编号（可重复）
    pub harvest_name: String, // 采收名称

    // ===== 地块信息 =====
    pub field_name: String,                   // 田块名称
    pub field_code: String,                   // 田块成本中心编码
    pub field_tags: Option<String>,           // 田块标签
    pub crop_block: String,                   // 小区（价格维度之一）
    pub crop_block_code: Option<String>,      // 小区成本中心编码
    pub crop_block_tags: Option<String>,      // 小区标签（地籍标签）
    pub species: String,                      // 品种大类（价格维度之一）
    pub variety: String,                      // 品种（价格维度之一）

    // ===== 时间信息 =====
    pub registered_on: NaiveDate,             // 登记日期（必填）
    pub registered_time: Option<NaiveTime>,   // 登记时刻（可选）

    // ===== 工人与承包商 =====
    pub worker_name: String,
    pub worker_id: String,
    pub contractor: Option<String>,
    pub contractor_id: Option<String>,
    pub contractor_tags: Option<String>,

    // ===== 容器与重量 =====
    pub container_type: String,               // 容器类型（价格索引维度）
    pub container_count: i64,                 // 容器数量（>= 0）
    pub actual_weight: f64,                   // 实际重量（>= 0）
    pub theoretical_weight: f64,              // 理论重量（>= 0）

    // ===== 记录人与扩展码 =====
    pub recorded_by: String,
    pub recorded_by_id: String,
    pub crew: Option<String>,                 // 班组
    pub credential_code: Option<String>,      // 工牌码
    pub container_code: Option<String>,       // 容器码
}

impl DeliveryRecord {
    /// 构造一个仅含必要字段的记录（其余字段为空/缺省）
    ///
    /// # 参数
    /// - worker_name: 工人姓名
    /// - registered_on: 登记日期
    /// - container_type: 容器类型
    /// - container_count: 容器数量（负数按 0 处理）
    pub fn minimal(
        worker_name: &str,
        registered_on: NaiveDate,
        container_type: &str,
        container_count: i64,
    ) -> Self {
        Self {
            harvest_id: String::new(),
            harvest_name: String::new(),
            field_name: String::new(),
            field_code: String::new(),
            field_tags: None,
            crop_block: String::new(),
            crop_block_code: None,
            crop_block_tags: None,
            species: String::new(),
            variety: String::new(),
            registered_on,
            registered_time: None,
            worker_name: worker_name.to_string(),
            worker_id: String::new(),
            contractor: None,
            contractor_id: None,
            contractor_tags: None,
            container_type: container_type.to_string(),
            container_count: container_count.max(0),
            actual_weight: 0.0,
            theoretical_weight: 0.0,
            recorded_by: String::new(),
            recorded_by_id: String::new(),
            crew: None,
            credential_code: None,
            container_code: None,
        }
    }
}
