// ==========================================
// 采收计件结算系统 - 固定列模式
// ==========================================
// 列位置按索引固定（不按表头名称）
// 模式即有序的 (index, field, parser) 列表,列漂移只需改这一处
// ==========================================

use crate::domain::DeliveryRecord;
use crate::importer::data_cleaner::DataCleaner;
use chrono::NaiveDate;

const CLEANER: DataCleaner = DataCleaner;

/// 模式覆盖的列数（0..=25）
pub const SCHEMA_WIDTH: usize = 26;

/// 日期列索引
pub const DATE_COLUMN: usize = 10;

// ==========================================
// DeliveryDraft - 解析中的记录
// ==========================================
pub struct DeliveryDraft {
    pub record: DeliveryRecord,
    pub registered_on: Option<NaiveDate>,
    pub date_raw: String,
}

impl DeliveryDraft {
    pub fn new() -> Self {
        Self {
            record: DeliveryRecord::minimal("", NaiveDate::MIN, "", 0),
            registered_on: None,
            date_raw: String::new(),
        }
    }

    /// 日期已确定时产出记录
    pub fn finish(self) -> Result<DeliveryRecord, String> {
        match self.registered_on {
            Some(date) => {
                let mut record = self.record;
                record.registered_on = date;
                Ok(record)
            }
            None => Err(self.date_raw),
        }
    }
}

impl Default for DeliveryDraft {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// ColumnSpec - 单列定义
// ==========================================
#[derive(Clone, Copy)]
pub struct ColumnSpec {
    pub index: usize,
    pub field: &'static str,
    pub apply: fn(&mut DeliveryDraft, &str),
}

impl std::fmt::Debug for ColumnSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnSpec")
            .field("index", &self.index)
            .field("field", &self.field)
            .finish()
    }
}

/// 交付表固定列模式
pub static DELIVERY_SCHEMA: [ColumnSpec; SCHEMA_WIDTH] = [
    // ===== 采收 =====
    ColumnSpec {
        index: 0,
        field: "harvest_id",
        apply: |d, v| d.record.harvest_id = CLEANER.clean_text(v),
    },
    ColumnSpec {
        index: 1,
        field: "harvest_name",
        apply: |d, v| d.record.harvest_name = CLEANER.clean_text(v),
    },
    // ===== 地块 =====
    ColumnSpec {
        index: 2,
        field: "field_name",
        apply: |d, v| d.record.field_name = CLEANER.clean_text(v),
    },
    ColumnSpec {
        index: 3,
        field: "field_code",
        apply: |d, v| d.record.field_code = CLEANER.clean_text(v),
    },
    ColumnSpec {
        index: 4,
        field: "field_tags",
        apply: |d, v| d.record.field_tags = CLEANER.normalize_null(v),
    },
    ColumnSpec {
        index: 5,
        field: "crop_block",
        apply: |d, v| d.record.crop_block = CLEANER.clean_text(v),
    },
    ColumnSpec {
        index: 6,
        field: "crop_block_code",
        apply: |d, v| d.record.crop_block_code = CLEANER.normalize_null(v),
    },
    ColumnSpec {
        index: 7,
        field: "crop_block_tags",
        apply: |d, v| d.record.crop_block_tags = CLEANER.normalize_null(v),
    },
    ColumnSpec {
        index: 8,
        field: "species",
        apply: |d, v| d.record.species = CLEANER.clean_text(v),
    },
    ColumnSpec {
        index: 9,
        field: "variety",
        apply: |d, v| d.record.variety = CLEANER.clean_text(v),
    },
    // ===== 时间 =====
    ColumnSpec {
        index: DATE_COLUMN,
        field: "registered_on",
        apply: |d, v| {
            d.registered_on = CLEANER.parse_date(v);
            d.date_raw = v.trim().to_string();
        },
    },
    ColumnSpec {
        index: 11,
        field: "registered_time",
        apply: |d, v| d.record.registered_time = CLEANER.parse_time(v),
    },
    // ===== 工人与承包商 =====
    ColumnSpec {
        index: 12,
        field: "worker_name",
        apply: |d, v| d.record.worker_name = CLEANER.clean_text(v),
    },
    ColumnSpec {
        index: 13,
        field: "worker_id",
        apply: |d, v| d.record.worker_id = CLEANER.clean_text(v),
    },
    ColumnSpec {
        index: 14,
        field: "contractor",
        apply: |d, v| d.record.contractor = CLEANER.normalize_null(v),
    },
    ColumnSpec {
        index: 15,
        field: "contractor_id",
        apply: |d, v| d.record.contractor_id = CLEANER.normalize_null(v),
    },
    ColumnSpec {
        index: 16,
        field: "contractor_tags",
        apply: |d, v| d.record.contractor_tags = CLEANER.normalize_null(v),
    },
    // ===== 容器与重量 =====
    ColumnSpec {
        index: 17,
        field: "container_type",
        apply: |d, v| d.record.container_type = CLEANER.clean_text(v),
    },
    ColumnSpec {
        index: 18,
        field: "container_count",
        apply: |d, v| d.record.container_count = CLEANER.parse_int(v),
    },
    ColumnSpec {
        index: 19,
        field: "actual_weight",
        apply: |d, v| d.record.actual_weight = CLEANER.parse_float(v),
    },
    ColumnSpec {
        index: 20,
        field: "theoretical_weight",
        apply: |d, v| d.record.theoretical_weight = CLEANER.parse_float(v),
    },
    // ===== 记录人与扩展码 =====
    ColumnSpec {
        index: 21,
        field: "recorded_by",
        apply: |d, v| d.record.recorded_by = CLEANER.clean_text(v),
    },
    ColumnSpec {
        index: 22,
        field: "recorded_by_id",
        apply: |d, v| d.record.recorded_by_id = CLEANER.clean_text(v),
    },
    ColumnSpec {
        index: 23,
        field: "crew",
        apply: |d, v| d.record.crew = CLEANER.normalize_null(v),
    },
    ColumnSpec {
        index: 24,
        field: "credential_code",
        apply: |d, v| d.record.credential_code = CLEANER.normalize_null(v),
    },
    ColumnSpec {
        index: 25,
        field: "container_code",
        apply: |d, v| d.record.container_code = CLEANER.normalize_null(v),
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_schema_indexes_are_dense_and_ordered() {
        for (pos, spec) in DELIVERY_SCHEMA.iter().enumerate() {
            assert_eq!(spec.index, pos, "列 {} 位置错误", spec.field);
        }
    }

    #[test]
    fn test_schema_fields_are_unique() {
        let fields: HashSet<&str> = DELIVERY_SCHEMA.iter().map(|s| s.field).collect();
        assert_eq!(fields.len(), SCHEMA_WIDTH);
    }

    #[test]
    fn test_date_column_sets_raw_value() {
        let mut draft = DeliveryDraft::new();
        (DELIVERY_SCHEMA[DATE_COLUMN].apply)(&mut draft, " mañana ");
        assert_eq!(draft.registered_on, None);
        assert_eq!(draft.finish().unwrap_err(), "mañana");
    }
}
