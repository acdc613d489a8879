use crate::config::ScanConfig;
use crate::models::{FileRecord, RiskBucket, RiskSummary, Severity};
use crate::security::SecurityScanner;
use crate::services::{ByteReader, LocalFileReader, LocalGatherer};
use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const SEVERITY_COLUMNS: [Severity; 4] = [
    Severity::Critical,
    Severity::High,
    Severity::Medium,
    Severity::Low,
];

/// 收集本地路径下的文件记录；单个路径收集失败只记录错误
pub fn gather_local_paths(paths: &[PathBuf], config: &ScanConfig) -> Vec<FileRecord> {
    let gatherer = LocalGatherer::new(config.gather.clone());
    let mut records = Vec::new();

    for path in paths {
        match gatherer.gather(path) {
            Ok(mut found) => records.append(&mut found),
            Err(e) => log::error!("Failed to gather files from {:?}: {:#}", path, e),
        }
    }

    records
}

/// 扫描本地文件或目录
pub fn scan_local_paths(paths: &[PathBuf], config: &ScanConfig) -> Result<RiskSummary> {
    let records = gather_local_paths(paths, config);
    let reader: Arc<dyn ByteReader> = match config.max_bytes_per_file {
        Some(limit) => Arc::new(LocalFileReader::with_limit(limit)),
        None => Arc::new(LocalFileReader::new()),
    };
    scan_with_reader(&records, reader, config)
}

/// 使用外部提供的字节来源扫描（对象存储、远程下载等由调用方实现）
pub fn scan_with_reader(
    records: &[FileRecord],
    reader: Arc<dyn ByteReader>,
    config: &ScanConfig,
) -> Result<RiskSummary> {
    let scanner = SecurityScanner::from_rules(&config.rules, reader, config.scan_options())
        .context("Failed to build detector registry from rules")?;
    Ok(scanner.scan_records(records))
}

/// 渲染风险汇总表（分组 × 等级）
pub fn render_summary(summary: &RiskSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<24}{:>10}{:>10}{:>10}{:>10}\n",
        "Risk Summary", "CRITICAL", "HIGH", "MEDIUM", "LOW"
    ));
    for bucket in RiskBucket::ALL {
        out.push_str(&format!("{:<24}", bucket.label()));
        for severity in SEVERITY_COLUMNS {
            out.push_str(&format!("{:>10}", summary.tally.get(bucket, severity)));
        }
        out.push('\n');
    }
    out.push_str(&format!(
        "Files scanned: {}, skipped: {}, findings: {}",
        summary.files_scanned(),
        summary.files_skipped(),
        summary.findings.len()
    ));
    out
}

pub fn summary_json(summary: &RiskSummary) -> Result<String> {
    serde_json::to_string_pretty(summary).context("Failed to serialize risk summary")
}

/// 原子写入报告：先写临时文件，再替换目标文件
pub fn write_report(summary: &RiskSummary, report_path: &Path) -> Result<()> {
    let json = summary_json(summary)?;
    let report_dir = match report_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&report_dir)
        .with_context(|| format!("Failed to create report directory {:?}", report_dir))?;

    let mut tmp = tempfile::NamedTempFile::new_in(&report_dir)
        .context("Failed to create temp file")?;
    tmp.write_all(json.as_bytes())
        .context("Failed to write temp file")?;
    tmp.flush().context("Failed to flush temp file")?;
    tmp.persist(report_path)
        .with_context(|| format!("Failed to persist report to {:?}", report_path))?;

    log::info!("Report written to {:?}", report_path);
    Ok(())
}
