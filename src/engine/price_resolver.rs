// ==========================================
// 采收计件结算系统 - 价格解析引擎
// ==========================================
// 规则（最具体优先）:
// 1. 只看同容器类型的启用规则
// 2. 特定规则: 声明的每个上下文维度都必须与交付一致
// 3. 多个特定规则命中 → 取最新创建
// 4. 无特定规则 → 取最新的通用规则
// 5. 仍无 → 调用方默认价表,并引导出一条新的通用规则
// 6. 仍无 → 不可解析（交付从结算中排除）
// ==========================================
// 红线: 规则快照按请求显式传入,无跨请求共享的可变状态
// ==========================================

use crate::domain::{PriceContext, PriceRule};
use chrono::Utc;
use std::collections::HashMap;

// ==========================================
// 纯函数: 步骤 1-4
// ==========================================

/// 在给定规则集中解析价格规则
///
/// # 参数
/// - ctx: 交付的价格上下文
/// - rules: 候选规则（任意顺序；创建时间相同时,靠前者优先）
///
/// # 返回
/// - Some(rule): 命中的特定规则或通用规则
/// - None: 未命中
pub fn resolve<'r>(ctx: &PriceContext<'_>, rules: &'r [PriceRule]) -> Option<&'r PriceRule> {
    let for_container = || {
        rules
            .iter()
            .filter(|r| r.active && r.container_type == ctx.container_type)
    };

    newest(for_container().filter(|r| r.matches_context(ctx)))
        .or_else(|| newest(for_container().filter(|r| r.is_general())))
}

fn newest<'r>(candidates: impl Iterator<Item = &'r PriceRule>) -> Option<&'r PriceRule> {
    candidates.fold(None, |best: Option<&PriceRule>, rule| match best {
        Some(b) if rule.created_at <= b.created_at => Some(b),
        _ => Some(rule),
    })
}

// ==========================================
// Resolution - 解析结果
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// 特定规则命中
    Specific { price: f64, price_rule_id: String },
    /// 通用规则命中
    General { price: f64, price_rule_id: String },
    /// 默认价引导出的新通用规则（调用方负责持久化）
    Bootstrapped(PriceRule),
    /// 不可解析
    Unresolved,
}

impl Resolution {
    pub fn price(&self) -> Option<f64> {
        match self {
            Resolution::Specific { price, .. } | Resolution::General { price, .. } => Some(*price),
            Resolution::Bootstrapped(rule) => Some(rule.price),
            Resolution::Unresolved => None,
        }
    }
}

// ==========================================
// PriceResolver - 带默认价引导的解析器
// ==========================================
pub struct PriceResolver {
    rules_by_container: HashMap<String, Vec<PriceRule>>,
    defaults: HashMap<String, f64>,
    bootstrapped: Vec<PriceRule>,
}

impl PriceResolver {
    /// # 参数
    /// - rules: 启用规则快照（停用规则会被过滤）
    /// - defaults: 容器类型 → 默认单价（步骤 5）
    pub fn new(rules: Vec<PriceRule>, defaults: HashMap<String, f64>) -> Self {
        let mut rules_by_container: HashMap<String, Vec<PriceRule>> = HashMap::new();
        for rule in rules.into_iter().filter(|r| r.active) {
            rules_by_container
                .entry(rule.container_type.clone())
                .or_default()
                .push(rule);
        }

        // 非法默认价（负数/非有限值）直接丢弃
        let defaults = defaults
            .into_iter()
            .filter(|(_, price)| price.is_finite() && *price >= 0.0)
            .collect();

        Self {
            rules_by_container,
            defaults,
            bootstrapped: Vec::new(),
        }
    }

    /// 只读解析器（不引导、不持久化）
    pub fn read_only(rules: Vec<PriceRule>) -> Self {
        Self::new(rules, HashMap::new())
    }

    /// 解析一次交付的单价
    pub fn resolve(&mut self, ctx: &PriceContext<'_>) -> Resolution {
        if let Some(rules) = self.rules_by_container.get(ctx.container_type) {
            if let Some(rule) = resolve(ctx, rules) {
                let price_rule_id = rule.price_rule_id.clone();
                return if rule.is_general() {
                    Resolution::General {
                        price: rule.price,
                        price_rule_id,
                    }
                } else {
                    Resolution::Specific {
                        price: rule.price,
                        price_rule_id,
                    }
                };
            }
        }

        match self.defaults.get(ctx.container_type) {
            Some(&price) => {
                let rule = PriceRule::general(ctx.container_type, price, Utc::now());
                // 后续解析直接命中步骤 4
                self.rules_by_container
                    .entry(rule.container_type.clone())
                    .or_default()
                    .insert(0, rule.clone());
                self.bootstrapped.push(rule.clone());
                Resolution::Bootstrapped(rule)
            }
            None => Resolution::Unresolved,
        }
    }

    /// 本次运行中引导出的通用规则
    pub fn bootstrapped(&self) -> &[PriceRule] {
        &self.bootstrapped
    }

    pub fn into_bootstrapped(self) -> Vec<PriceRule> {
        self.bootstrapped
    }
}
