use crate::error::ScanResult;
use crate::models::{
    Category, FileOutcome, FileRecord, FileStatus, RiskSummary, RiskTally, ScoredFinding,
};
use crate::security::content::{ContentLoader, ContentView};
use crate::security::registry::DetectorRegistry;
use crate::security::rules::RuleSet;
use crate::security::severity::SeverityClassifier;
use crate::security::FileClassifier;
use crate::services::ByteReader;
use chrono::Utc;
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default)]
pub struct ScanOptions {
    /// 工作线程数，0 表示使用 rayon 默认值
    pub workers: usize,
    /// 批次时限：超时后尚未开始的文件标记为跳过，已完成的结果保留
    pub batch_timeout: Option<Duration>,
}

/// 单个文件的流水线结果
struct FileScan {
    outcome: FileOutcome,
    findings: Vec<ScoredFinding>,
    tally: RiskTally,
}

/// 每个工作线程私有的累加器，结束时统一合并
#[derive(Default)]
struct BatchAccumulator {
    tally: RiskTally,
    findings: Vec<ScoredFinding>,
    files: Vec<FileOutcome>,
}

impl BatchAccumulator {
    fn absorb(mut self, scan: FileScan) -> Self {
        self.tally = self.tally.merge(scan.tally);
        self.findings.extend(scan.findings);
        self.files.push(scan.outcome);
        self
    }

    fn merge(mut self, other: Self) -> Self {
        self.tally = self.tally.merge(other.tally);
        self.findings.extend(other.findings);
        self.files.extend(other.files);
        self
    }
}

pub struct SecurityScanner {
    registry: DetectorRegistry,
    severity: SeverityClassifier,
    loader: ContentLoader,
    options: ScanOptions,
}

impl SecurityScanner {
    pub fn new(
        registry: DetectorRegistry,
        severity: SeverityClassifier,
        loader: ContentLoader,
        options: ScanOptions,
    ) -> Self {
        Self {
            registry,
            severity,
            loader,
            options,
        }
    }

    /// 由规则集构建扫描器（规则中的正则在此编译）
    pub fn from_rules(
        rules: &RuleSet,
        reader: Arc<dyn ByteReader>,
        options: ScanOptions,
    ) -> ScanResult<Self> {
        Ok(Self::new(
            DetectorRegistry::from_rules(rules)?,
            SeverityClassifier::new(&rules.severity_rules),
            ContentLoader::new(reader),
            options,
        ))
    }

    /// 批量扫描：单个文件失败不会中断批次，始终返回汇总
    pub fn scan_records(&self, records: &[FileRecord]) -> RiskSummary {
        let started_at = Utc::now();
        let scan_id = Uuid::new_v4();
        log::info!("Starting adversarial threat scan {} over {} files...", scan_id, records.len());
        Self::log_census(records);

        let deadline = self.options.batch_timeout.map(|t| Instant::now() + t);

        let acc = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.workers)
            .build()
        {
            Ok(pool) => pool.install(|| self.scan_parallel(records, deadline)),
            Err(e) => {
                log::warn!("Failed to build worker pool, scanning sequentially: {}", e);
                records
                    .iter()
                    .map(|r| self.process_record(r, deadline))
                    .fold(BatchAccumulator::default(), BatchAccumulator::absorb)
            }
        };

        let summary = RiskSummary {
            scan_id,
            started_at,
            finished_at: Utc::now(),
            tally: acc.tally,
            findings: acc.findings,
            files: acc.files,
        };
        log::info!(
            "Workflow complete. {} files scanned, {} skipped, {} findings.",
            summary.files_scanned(),
            summary.files_skipped(),
            summary.findings.len()
        );
        summary
    }

    fn scan_parallel(&self, records: &[FileRecord], deadline: Option<Instant>) -> BatchAccumulator {
        records
            .par_iter()
            .map(|record| self.process_record(record, deadline))
            .fold(BatchAccumulator::default, BatchAccumulator::absorb)
            .reduce(BatchAccumulator::default, BatchAccumulator::merge)
    }

    /// 扫描调用方提供的文本内容（不经过字节来源）
    pub fn scan_content(&self, file_path: &str, content: &str) -> Vec<ScoredFinding> {
        let record = FileRecord::new("memory", file_path, content.len() as u64);
        let category = FileClassifier::classify(&record);
        let view = ContentView::from_bytes(content.as_bytes().to_vec(), category);
        self.detect_and_score(&record, category, &view)
    }

    fn log_census(records: &[FileRecord]) {
        let mut census: BTreeMap<Category, usize> = BTreeMap::new();
        for record in records {
            *census.entry(FileClassifier::classify(record)).or_default() += 1;
        }
        log::info!("Categorized files:");
        for category in Category::ALL {
            log::info!("  {}: {}", category, census.get(&category).copied().unwrap_or(0));
        }
    }

    /// 单文件流水线：Classified -> Loaded -> Detected -> Scored -> Aggregated -> Done
    fn process_record(&self, record: &FileRecord, deadline: Option<Instant>) -> FileScan {
        let category = FileClassifier::classify(record);
        log::info!("Scanning {} (Category: {})...", record.path, category);
        log::debug!("File size: {} bytes.", record.size);

        if deadline.is_some_and(|d| Instant::now() >= d) {
            log::warn!("Skipping {}: batch deadline exceeded", record.path);
            return Self::skipped(record, category, "batch deadline exceeded".to_string());
        }

        let content = match self.loader.load(record, category) {
            Ok(content) => content,
            Err(e) => {
                log::error!("{}", e);
                return Self::skipped(record, category, e.to_string());
            }
        };

        let findings = self.detect_and_score(record, category, &content);

        let mut tally = RiskTally::new();
        for scored in &findings {
            tally.record(scored.category, scored.severity);
            log::warn!("[{}] {}", scored.severity, scored.finding.message);
        }
        log::debug!("File {} passed all scans ({} findings).", record.path, findings.len());

        FileScan {
            outcome: FileOutcome {
                path: record.path.clone(),
                source_type: record.source_type.clone(),
                category,
                size: record.size,
                status: FileStatus::Done,
                checksum: Some(Self::calculate_checksum(content.as_bytes())),
                findings: findings.len(),
            },
            findings,
            tally,
        }
    }

    fn detect_and_score(
        &self,
        record: &FileRecord,
        category: Category,
        content: &ContentView,
    ) -> Vec<ScoredFinding> {
        let mut findings = Vec::new();
        // 检测器出错或 panic 只影响它自己在这个文件上的结果
        for detector in self.registry.detectors_for(category) {
            let outcome =
                panic::catch_unwind(AssertUnwindSafe(|| detector.detect(&record.path, content)));
            match outcome {
                Ok(Ok(found)) => findings.extend(found),
                Ok(Err(e)) => {
                    log::error!("Detector {} failed on {}: {:#}", detector.name(), record.path, e);
                }
                Err(payload) => {
                    log::error!(
                        "Detector {} panicked on {}: {}",
                        detector.name(),
                        record.path,
                        panic_message(payload.as_ref())
                    );
                }
            }
        }

        findings
            .into_iter()
            .map(|finding| {
                let severity = self.severity.classify(&finding.message);
                ScoredFinding {
                    finding,
                    category,
                    severity,
                }
            })
            .collect()
    }

    fn skipped(record: &FileRecord, category: Category, reason: String) -> FileScan {
        FileScan {
            outcome: FileOutcome {
                path: record.path.clone(),
                source_type: record.source_type.clone(),
                category,
                size: record.size,
                status: FileStatus::Skipped { reason },
                checksum: None,
                findings: 0,
            },
            findings: Vec::new(),
            tally: RiskTally::new(),
        }
    }

    /// 计算内容校验和
    pub fn calculate_checksum(content: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content);
        hex::encode(hasher.finalize())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
