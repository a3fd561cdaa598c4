// ==========================================
// 采收计件结算系统 - 价格规则领域模型
// ==========================================
// 用途: 价格目录外部维护,结算管线只读（默认价引导除外）
// 对齐: price_rules 表
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// PriceRule - 计件单价规则
// ==========================================
// 通用规则: crop_block / species / variety 全为空
// 特定规则: 任一上下文字段非空
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRule {
    pub price_rule_id: String,
    pub container_type: String,

    // ===== 价格 =====
    pub price: f64, // 单价（>= 0）

    // ===== 上下文（可选收窄）=====
    pub crop_block: Option<String>,
    pub species: Option<String>,
    pub variety: Option<String>,

    // ===== 状态 =====
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl PriceRule {
    /// 创建通用规则（无上下文收窄）
    pub fn general(container_type: &str, price: f64, created_at: DateTime<Utc>) -> Self {
        Self {
            price_rule_id: uuid::Uuid::new_v4().to_string(),
            container_type: container_type.to_string(),
            price,
            crop_block: None,
            species: None,
            variety: None,
            active: true,
            created_at,
        }
    }

    /// 是否为通用规则
    pub fn is_general(&self) -> bool {
        self.crop_block.is_none() && self.species.is_none() && self.variety.is_none()
    }

    /// 特定规则是否命中上下文：规则声明的每个维度都必须与交付一致
    ///
    /// 通用规则恒返回 false
    pub fn matches_context(&self, ctx: &PriceContext<'_>) -> bool {
        if self.is_general() {
            return false;
        }
        let dim_ok = |rule_value: &Option<String>, actual: &str| match rule_value {
            Some(v) => v == actual,
            None => true,
        };
        dim_ok(&self.crop_block, ctx.crop_block)
            && dim_ok(&self.species, ctx.species)
            && dim_ok(&self.variety, ctx.variety)
    }
}

// ==========================================
// PriceContext - 价格解析上下文
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceContext<'a> {
    pub container_type: &'a str,
    pub crop_block: &'a str,
    pub species: &'a str,
    pub variety: &'a str,
}

impl<'a> PriceContext<'a> {
    pub fn new(
        container_type: &'a str,
        crop_block: &'a str,
        species: &'a str,
        variety: &'a str,
    ) -> Self {
        Self {
            container_type,
            crop_block,
            species,
            variety,
        }
    }
}
