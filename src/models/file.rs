use serde::{Deserialize, Serialize};

/// 待扫描文件记录（由外部收集器产生，扫描过程中不可变）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub source_type: String,
    /// 不透明定位符：本地路径、S3 URI 或下载 URL
    pub path: String,
    pub size: u64,
}

impl FileRecord {
    pub fn new(source_type: impl Into<String>, path: impl Into<String>, size: u64) -> Self {
        Self {
            source_type: source_type.into(),
            path: path.into(),
            size,
        }
    }

    pub fn local(path: impl Into<String>, size: u64) -> Self {
        Self::new("local", path, size)
    }

    /// 路径最后一段（同时兼容 `/` 与 `\` 分隔符，以及 URL）
    pub fn file_name(&self) -> &str {
        self.path
            .rsplit(|c: char| c == '/' || c == '\\')
            .next()
            .unwrap_or(&self.path)
    }

    /// 文件扩展名（含前导 `.`），以 `.` 开头的文件名不视为扩展名
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name();
        match name.rfind('.') {
            Some(0) | None => None,
            Some(idx) => Some(&name[idx..]),
        }
    }
}

/// 文件分类，决定加载方式与适用的检测器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    ModelWeights,
    SerializedModel,
    Code,
    Dependency,
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::ModelWeights,
        Category::SerializedModel,
        Category::Code,
        Category::Dependency,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::ModelWeights => "model_weights",
            Category::SerializedModel => "serialized_model",
            Category::Code => "code",
            Category::Dependency => "dependency",
            Category::Other => "other",
        }
    }

    /// 模型类文件以二进制为主视图
    pub fn is_binary(&self) -> bool {
        matches!(self, Category::ModelWeights | Category::SerializedModel)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_handles_urls_and_windows_paths() {
        let hub = FileRecord::new(
            "huggingface",
            "https://huggingface.co/org/model/resolve/main/model.safetensors",
            0,
        );
        assert_eq!(hub.file_name(), "model.safetensors");
        assert_eq!(hub.extension(), Some(".safetensors"));

        let win = FileRecord::local("C:\\work\\requirements.txt", 10);
        assert_eq!(win.file_name(), "requirements.txt");
    }

    #[test]
    fn test_dotfile_has_no_extension() {
        let record = FileRecord::local("repo/.gitattributes", 3);
        assert_eq!(record.extension(), None);

        let plain = FileRecord::local("repo/Readme", 3);
        assert_eq!(plain.extension(), None);
    }
}
