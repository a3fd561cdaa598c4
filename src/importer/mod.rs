// ==========================================
// 采收计件结算系统 - 导入层
// ==========================================
// 职责: 上传文件 → 类型化交付记录 → 存储
// 支持: Excel (.xlsx/.xls), CSV
// ==========================================

// 模块声明
pub mod bulk_loader;
pub mod data_cleaner;
pub mod delivery_importer_impl;
pub mod delivery_importer_trait;
pub mod error;
pub mod file_parser;
pub mod row_normalizer;
pub mod row_schema;

// 重导出核心类型
pub use bulk_loader::{load_staged, BulkLoader, LoadOutcome, LoaderSettings};
pub use data_cleaner::DataCleaner;
pub use delivery_importer_impl::DeliveryImporterImpl;
pub use error::{ImportError, ImportResult, RowParseError};
pub use file_parser::{CsvParser, ExcelFlavor, ExcelParser, UniversalFileParser};
pub use row_normalizer::RowNormalizer;
pub use row_schema::{ColumnSpec, DELIVERY_SCHEMA};

// 重导出 Trait 接口
pub use delivery_importer_trait::{DeliveryImporter, FileParser};
