use crate::models::FileRecord;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use walkdir::WalkDir;

/// 本地收集边界：避免被巨型目录拖垮（且不会跟随符号链接）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatherOptions {
    pub max_depth: usize,
    pub max_files: usize,
    /// 常见大目录（依赖/构建产物），默认不深入扫描
    pub skip_dirs: Vec<String>,
}

impl Default for GatherOptions {
    fn default() -> Self {
        Self {
            max_depth: 20,
            max_files: 2000,
            skip_dirs: [
                ".git",
                "node_modules",
                "target",
                "dist",
                "build",
                "__pycache__",
                ".venv",
                "venv",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

pub struct LocalGatherer {
    options: GatherOptions,
}

impl LocalGatherer {
    pub fn new(options: GatherOptions) -> Self {
        Self { options }
    }

    /// 收集本地文件或目录下的文件记录
    pub fn gather(&self, local_path: &Path) -> Result<Vec<FileRecord>> {
        if local_path.is_file() {
            let size = std::fs::metadata(local_path)?.len();
            return Ok(vec![FileRecord::local(local_path.to_string_lossy(), size)]);
        }
        if !local_path.is_dir() {
            anyhow::bail!("Path does not exist: {}", local_path.display());
        }

        let mut records = Vec::new();
        let mut iter = WalkDir::new(local_path)
            .follow_links(false)
            .max_depth(self.options.max_depth)
            .sort_by_file_name()
            .into_iter();

        while let Some(next) = iter.next() {
            let entry = match next {
                Ok(e) => e,
                Err(e) => {
                    log::warn!("Failed to read directory entry under {:?}: {}", local_path, e);
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    if entry.depth() > 0 && self.options.skip_dirs.iter().any(|d| d == name) {
                        log::debug!("Skipping directory: {:?}", entry.path());
                        iter.skip_current_dir();
                    }
                }
                continue;
            }

            if !entry.file_type().is_file() {
                continue;
            }

            if records.len() >= self.options.max_files {
                log::warn!(
                    "Too many files under {:?}, stopping at {}",
                    local_path,
                    self.options.max_files
                );
                break;
            }

            let size = match entry.metadata() {
                Ok(meta) => meta.len(),
                Err(e) => {
                    log::warn!("Failed to stat {:?}: {}", entry.path(), e);
                    0
                }
            };
            records.push(FileRecord::local(entry.path().to_string_lossy(), size));
        }

        log::info!("Gathered {} files from '{}'.", records.len(), local_path.display());
        Ok(records)
    }
}

impl Default for LocalGatherer {
    fn default() -> Self {
        Self::new(GatherOptions::default())
    }
}
