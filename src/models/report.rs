use super::file::Category;
use super::finding::{ScoredFinding, Severity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 汇总报告中的三个风险分组
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskBucket {
    NotebookAndDependency,
    Model,
    CodeFiles,
}

impl RiskBucket {
    pub const ALL: [RiskBucket; 3] = [
        RiskBucket::NotebookAndDependency,
        RiskBucket::Model,
        RiskBucket::CodeFiles,
    ];

    pub fn for_category(category: Category) -> Self {
        match category {
            Category::Dependency | Category::Other => RiskBucket::NotebookAndDependency,
            Category::ModelWeights | Category::SerializedModel => RiskBucket::Model,
            Category::Code => RiskBucket::CodeFiles,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskBucket::NotebookAndDependency => "Notebook & Dependency",
            RiskBucket::Model => "Model",
            RiskBucket::CodeFiles => "Code Files",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub critical: u64,
    pub high: u64,
    pub medium: u64,
    pub low: u64,
}

impl SeverityCounts {
    pub fn get(&self, severity: Severity) -> u64 {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
        }
    }

    fn slot(&mut self, severity: Severity) -> &mut u64 {
        match severity {
            Severity::Critical => &mut self.critical,
            Severity::High => &mut self.high,
            Severity::Medium => &mut self.medium,
            Severity::Low => &mut self.low,
        }
    }

    pub fn total(&self) -> u64 {
        self.critical + self.high + self.medium + self.low
    }

    fn merge(self, other: Self) -> Self {
        Self {
            critical: self.critical + other.critical,
            high: self.high + other.high,
            medium: self.medium + other.medium,
            low: self.low + other.low,
        }
    }
}

/// 风险计数表：分组 × 等级 -> 次数。只增不减，合并为逐项相加
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskTally {
    pub notebook_and_dependency: SeverityCounts,
    pub model: SeverityCounts,
    pub code_files: SeverityCounts,
}

impl RiskTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bucket(&self, bucket: RiskBucket) -> &SeverityCounts {
        match bucket {
            RiskBucket::NotebookAndDependency => &self.notebook_and_dependency,
            RiskBucket::Model => &self.model,
            RiskBucket::CodeFiles => &self.code_files,
        }
    }

    fn bucket_mut(&mut self, bucket: RiskBucket) -> &mut SeverityCounts {
        match bucket {
            RiskBucket::NotebookAndDependency => &mut self.notebook_and_dependency,
            RiskBucket::Model => &mut self.model,
            RiskBucket::CodeFiles => &mut self.code_files,
        }
    }

    /// 记录一条已定级的发现
    pub fn record(&mut self, category: Category, severity: Severity) {
        *self
            .bucket_mut(RiskBucket::for_category(category))
            .slot(severity) += 1;
    }

    pub fn get(&self, bucket: RiskBucket, severity: Severity) -> u64 {
        self.bucket(bucket).get(severity)
    }

    pub fn total(&self) -> u64 {
        RiskBucket::ALL.iter().map(|b| self.bucket(*b).total()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn merge(self, other: Self) -> Self {
        Self {
            notebook_and_dependency: self
                .notebook_and_dependency
                .merge(other.notebook_and_dependency),
            model: self.model.merge(other.model),
            code_files: self.code_files.merge(other.code_files),
        }
    }
}

/// 单个文件的终态
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FileStatus {
    Done,
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileOutcome {
    pub path: String,
    pub source_type: String,
    pub category: Category,
    pub size: u64,
    pub status: FileStatus,
    /// 已加载内容的 SHA-256（跳过的文件为 None）
    pub checksum: Option<String>,
    pub findings: usize,
}

impl FileOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self.status, FileStatus::Skipped { .. })
    }
}

/// 一次批量扫描的最终结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskSummary {
    pub scan_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub tally: RiskTally,
    pub findings: Vec<ScoredFinding>,
    pub files: Vec<FileOutcome>,
}

impl RiskSummary {
    pub fn files_scanned(&self) -> usize {
        self.files.iter().filter(|f| !f.is_skipped()).count()
    }

    pub fn files_skipped(&self) -> usize {
        self.files.iter().filter(|f| f.is_skipped()).count()
    }

    pub fn highest_severity(&self) -> Option<Severity> {
        self.findings.iter().map(|f| f.severity).max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_selection() {
        assert_eq!(
            RiskBucket::for_category(Category::Other),
            RiskBucket::NotebookAndDependency
        );
        assert_eq!(
            RiskBucket::for_category(Category::Dependency),
            RiskBucket::NotebookAndDependency
        );
        assert_eq!(RiskBucket::for_category(Category::ModelWeights), RiskBucket::Model);
        assert_eq!(RiskBucket::for_category(Category::SerializedModel), RiskBucket::Model);
        assert_eq!(RiskBucket::for_category(Category::Code), RiskBucket::CodeFiles);
    }

    #[test]
    fn test_record_increments_single_cell() {
        let mut tally = RiskTally::new();
        assert!(tally.is_empty());

        tally.record(Category::Code, Severity::Critical);
        tally.record(Category::Code, Severity::Critical);
        tally.record(Category::SerializedModel, Severity::Low);

        assert_eq!(tally.get(RiskBucket::CodeFiles, Severity::Critical), 2);
        assert_eq!(tally.get(RiskBucket::Model, Severity::Low), 1);
        assert_eq!(tally.get(RiskBucket::NotebookAndDependency, Severity::Medium), 0);
        assert_eq!(tally.total(), 3);
    }

    #[test]
    fn test_merge_is_commutative_and_associative() {
        let mut a = RiskTally::new();
        a.record(Category::Code, Severity::High);
        a.record(Category::Other, Severity::Medium);

        let mut b = RiskTally::new();
        b.record(Category::ModelWeights, Severity::Low);
        b.record(Category::Code, Severity::High);

        let mut c = RiskTally::new();
        c.record(Category::Dependency, Severity::Critical);

        assert_eq!(a.merge(b), b.merge(a));
        assert_eq!(a.merge(b).merge(c), a.merge(b.merge(c)));
        assert_eq!(a.merge(RiskTally::new()), a);
        assert_eq!(a.merge(b).get(RiskBucket::CodeFiles, Severity::High), 2);
    }
}
