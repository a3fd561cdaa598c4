// ==========================================
// 采收计件结算系统 - 结算领域模型
// ==========================================
// 用途: 结算引擎写入（整体重建）,报表层只读
// 对齐: settlements 表
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 跨容器类型汇总时使用的聚合标签
pub const TOTAL_LABEL: &str = "Total";

// ==========================================
// SettlementRecord - 工人单日结算
// ==========================================
// 红线: piece_cost == piece_count × unit_price（按聚合粒度）
// 红线: 同一次生成中,每个聚合键只产生一条记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementRecord {
    pub worker_name: String,
    pub settle_date: NaiveDate,
    pub label: String, // 容器类型,或汇总标签 "Total"

    // ===== 计件部分 =====
    pub unit_price: f64,
    pub piece_count: i64,
    pub piece_cost: f64,

    // ===== 计时部分（暂未使用的占位字段）=====
    pub hourly_rate: Option<f64>,
    pub hour_count: Option<f64>,
    pub hourly_cost: Option<f64>,
}

// ==========================================
// 组合键
// ==========================================
// 字段顺序即排序顺序: 先工人,再日期（再容器类型）

/// 结算聚合键 (worker, date)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkerDayKey {
    pub worker_name: String,
    pub date: NaiveDate,
}

impl WorkerDayKey {
    pub fn new(worker_name: &str, date: NaiveDate) -> Self {
        Self {
            worker_name: worker_name.to_string(),
            date,
        }
    }
}

/// 明细聚合键 (worker, date, container_type)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkerDayContainerKey {
    pub worker_name: String,
    pub date: NaiveDate,
    pub container_type: String,
}

impl WorkerDayContainerKey {
    pub fn new(worker_name: &str, date: NaiveDate, container_type: &str) -> Self {
        Self {
            worker_name: worker_name.to_string(),
            date,
            container_type: container_type.to_string(),
        }
    }

    /// 去掉容器维度,得到所属的 (worker, date)
    pub fn worker_day(&self) -> WorkerDayKey {
        WorkerDayKey {
            worker_name: self.worker_name.clone(),
            date: self.date,
        }
    }
}
