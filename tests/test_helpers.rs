// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库初始化、交付表格夹具生成
// ==========================================

#![allow(dead_code)]

use harvest_settlement::config::ConfigManager;
use harvest_settlement::db::{init_schema, open_sqlite_connection};
use rust_xlsxwriter::{Format, Workbook};
use std::error::Error;
use tempfile::NamedTempFile;

/// 交付表格列数
pub const COLUMN_COUNT: usize = 26;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_string_lossy().to_string();

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 写入全局配置
pub fn set_config(db_path: &str, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
    let config = ConfigManager::new(db_path)?;
    config.set_global_config_value(key, value)?;
    Ok(())
}

// ==========================================
// 交付行构造
// ==========================================

/// 表头行（内容不参与解析,按位置读取）
pub fn header_row() -> Vec<String> {
    [
        "Id Cosecha", "Cosecha", "Campo", "Ceco Campo", "Etiquetas Campo",
        "Cuartel", "Ceco Cuartel", "Etiquetas Cuartel", "Especie", "Variedad",
        "Fecha Registro", "Hora Registro", "Trabajador", "Id Trabajador",
        "Contratista", "Id Contratista", "Etiquetas Contratista",
        "Tipo Envase", "Cantidad", "Peso Real", "Peso Teorico",
        "Usuario", "Id Usuario", "Cuadrilla", "Credencial", "Codigo Envase",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// 交付行构造器
#[derive(Debug, Clone)]
pub struct DeliveryRowBuilder {
    cells: Vec<String>,
}

impl DeliveryRowBuilder {
    pub fn new(worker: &str, date: &str, container: &str, count: &str) -> Self {
        let mut cells = vec![String::new(); COLUMN_COUNT];
        cells[0] = "H-2024".to_string();
        cells[1] = "Cosecha 2024".to_string();
        cells[2] = "Campo Norte".to_string();
        cells[3] = "CC-01".to_string();
        cells[5] = "C1".to_string();
        cells[8] = "Cereza".to_string();
        cells[9] = "Lapins".to_string();
        cells[10] = date.to_string();
        cells[11] = "09:30".to_string();
        cells[12] = worker.to_string();
        cells[13] = format!("ID-{}", worker);
        cells[17] = container.to_string();
        cells[18] = count.to_string();
        cells[19] = "4,5".to_string();
        cells[20] = "5".to_string();
        cells[21] = "supervisor".to_string();
        cells[22] = "U-1".to_string();
        Self { cells }
    }

    pub fn crop_block(mut self, crop_block: &str) -> Self {
        self.cells[5] = crop_block.to_string();
        self
    }

    pub fn time(mut self, time: &str) -> Self {
        self.cells[11] = time.to_string();
        self
    }

    pub fn field(mut self, field: &str) -> Self {
        self.cells[2] = field.to_string();
        self
    }

    pub fn build(self) -> Vec<String> {
        self.cells
    }
}

/// 生成 xlsx 字节（第一行为表头）
pub fn build_xlsx(rows: &[Vec<String>]) -> Result<Vec<u8>, Box<dyn Error>> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    let all = std::iter::once(header_row()).chain(rows.iter().cloned());
    for (r, row) in all.enumerate() {
        for (c, value) in row.iter().enumerate() {
            if !value.is_empty() {
                sheet.write_string(r as u32, c as u16, value)?;
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// 生成 xlsx 字节,时刻列写为 Excel 时间单元格（日内小数 + hh:mm:ss 格式）
pub fn build_xlsx_with_time_serials(rows: &[Vec<String>]) -> Result<Vec<u8>, Box<dyn Error>> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    let time_format = Format::new().set_num_format("hh:mm:ss");

    let all = std::iter::once(header_row()).chain(rows.iter().cloned());
    for (r, row) in all.enumerate() {
        for (c, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            match value.parse::<f64>() {
                Ok(serial) if r > 0 && c == 11 => {
                    sheet.write_number_with_format(r as u32, c as u16, serial, &time_format)?;
                }
                _ => {
                    sheet.write_string(r as u32, c as u16, value)?;
                }
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// 生成 CSV 字节（第一行为表头）
pub fn build_csv(rows: &[Vec<String>]) -> Result<Vec<u8>, Box<dyn Error>> {
    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(header_row())?;
    for row in rows {
        writer.write_record(row)?;
    }
    Ok(writer.into_inner().map_err(|e| e.into_error())?)
}
