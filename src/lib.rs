pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod security;
pub mod services;

pub use config::ScanConfig;
pub use error::{ScanError, ScanResult};
pub use models::{Category, FileRecord, Finding, RiskSummary, RiskTally, Severity};
pub use security::SecurityScanner;

use std::path::PathBuf;

/// 命令行入口：参数为待扫描的本地文件或目录
pub fn run() {
    // 初始化日志
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let paths: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();
    if paths.is_empty() {
        log::error!("No sources provided. Pass one or more local files or directories to scan.");
        return;
    }

    let config = ScanConfig::load();

    let summary = match commands::scan_local_paths(&paths, &config) {
        Ok(summary) => summary,
        Err(e) => {
            log::error!("Scan failed: {:#}", e);
            return;
        }
    };

    for line in commands::render_summary(&summary).lines() {
        log::info!("{}", line);
    }

    match commands::summary_json(&summary) {
        Ok(json) => println!("{}", json),
        Err(e) => log::error!("{:#}", e),
    }

    if let Some(report_path) = &config.report_path {
        if let Err(e) = commands::write_report(&summary, report_path) {
            log::error!("{:#}", e);
        }
    }
}
