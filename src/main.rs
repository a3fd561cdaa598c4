// ==========================================
// 采收计件结算系统 - 命令行入口
// ==========================================
// 用法:
//   harvest-settlement upload <file> [--staged]
//   harvest-settlement settle ['{"Crate": 2.0}']
//   harvest-settlement containers
//   harvest-settlement workers
//   harvest-settlement worker <name>
//   harvest-settlement prices [container_type]
//
// 数据库路径取自 HARVEST_SETTLEMENT_DB_PATH,否则为用户数据目录
// HARVEST_SETTLEMENT_LOG_FORMAT=json 时输出 JSON 日志
// ==========================================

use anyhow::{bail, Context, Result};
use harvest_settlement::app::{get_default_db_path, AppState};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

const USAGE: &str = "用法: harvest-settlement <upload <file> [--staged] | settle [json] | containers | workers | worker <name> | prices [container_type]>";

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    harvest_settlement::logging::init_from_env();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        bail!(USAGE);
    };

    let db_path = get_default_db_path();
    tracing::info!(version = harvest_settlement::VERSION, db_path = %db_path, "启动");
    let state = AppState::new(db_path).map_err(anyhow::Error::msg)?;

    match command.as_str() {
        "upload" => {
            let path = args.get(1).context(USAGE)?;
            let staged = args.iter().skip(2).any(|a| a == "--staged");
            let data = std::fs::read(path).with_context(|| format!("无法读取文件: {}", path))?;
            let filename = Path::new(path)
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.clone());

            let outcome = state.upload(&data, &filename, staged)?;
            print_json(&outcome)
        }
        "settle" => {
            let overrides: HashMap<String, f64> = match args.get(1) {
                Some(raw) => serde_json::from_str(raw).context("默认价表必须是 JSON 对象")?,
                None => HashMap::new(),
            };

            let run = state.api.generate_settlements(overrides)?;
            std::fs::write(&run.filename, &run.report_bytes)
                .with_context(|| format!("无法写入报表: {}", run.filename))?;
            print_json(&run)
        }
        "containers" => print_json(&state.api.get_container_summary()?),
        "workers" => print_json(&state.api.get_workers()?),
        "worker" => {
            let name = args.get(1).context(USAGE)?;
            print_json(&state.api.get_settlements_for_worker(name)?)
        }
        "prices" => print_json(&state.api.list_price_rules(args.get(1).map(String::as_str))?),
        other => bail!("未知命令: {}\n{}", other, USAGE),
    }
}
