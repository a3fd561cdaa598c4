// ==========================================
// 采收计件结算系统 - 行标准化器
// ==========================================
// 职责: 一行原始文本单元格 → DeliveryRecord / 行解析失败
// 红线: 无 I/O；只有日期无法确定时才判定失败
// ==========================================

use crate::domain::DeliveryRecord;
use crate::importer::error::RowParseError;
use crate::importer::row_schema::{ColumnSpec, DeliveryDraft, DELIVERY_SCHEMA};

/// 表头行索引（始终跳过）
pub const HEADER_ROW: usize = 0;

pub struct RowNormalizer {
    schema: &'static [ColumnSpec],
}

impl RowNormalizer {
    pub fn new() -> Self {
        Self {
            schema: &DELIVERY_SCHEMA,
        }
    }

    /// 标准化一行
    ///
    /// # 参数
    /// - cells: 原始单元格文本（缺失的尾部单元格按空串处理）
    /// - row_index: 0 起始的行索引
    ///
    /// # 返回
    /// - Ok(Some(record)): 解析成功
    /// - Ok(None): 表头行或全空白行（静默跳过,不计错误）
    /// - Err(RowParseError): 日期无法确定
    pub fn parse(
        &self,
        cells: &[String],
        row_index: usize,
    ) -> Result<Option<DeliveryRecord>, RowParseError> {
        if row_index == HEADER_ROW || is_blank_row(cells) {
            return Ok(None);
        }

        let mut draft = DeliveryDraft::new();
        for spec in self.schema {
            let raw = cells.get(spec.index).map(String::as_str).unwrap_or("");
            (spec.apply)(&mut draft, raw);
        }

        draft.finish().map(Some).map_err(|value| RowParseError {
            row: row_index + 1,
            value,
        })
    }
}

impl Default for RowNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// 全部单元格为空白
pub fn is_blank_row(cells: &[String]) -> bool {
    cells.iter().all(|c| c.trim().is_empty())
}
