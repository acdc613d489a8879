mod scanner;
pub mod classifier;
pub mod content;
pub mod detectors;
pub mod registry;
pub mod rules;
pub mod severity;

pub use classifier::FileClassifier;
pub use content::{ContentLoader, ContentView};
pub use registry::DetectorRegistry;
pub use rules::{RuleSet, SeverityRule};
pub use scanner::{ScanOptions, SecurityScanner};
pub use severity::SeverityClassifier;

use crate::models::{Category, Finding};
use anyhow::Result;

/// 检测器特征：纯函数，不修改共享状态；无发现时返回空列表
pub trait Detector: Send + Sync {
    fn name(&self) -> &str;

    /// 检测器自带的适用分类，可被规则集中的 `applicability` 覆盖
    fn default_categories(&self) -> &[Category];

    fn detect(&self, path: &str, content: &ContentView) -> Result<Vec<Finding>>;
}
