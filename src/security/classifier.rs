use crate::models::{Category, FileRecord};

pub const SAFETENSORS_EXTENSION: &str = ".safetensors";

pub const SERIALIZED_EXTENSIONS: &[&str] = &[".pkl", ".h5", ".pb", ".onnx", ".tf", ".keras"];

pub const CODE_EXTENSIONS: &[&str] = &[".py", ".ipynb"];

pub const DEPENDENCY_FILES: &[&str] = &["requirements.txt", "package.json"];

/// 按扩展名/文件名为记录分配唯一分类；全函数，未知类型归入 `Other`
pub struct FileClassifier;

impl FileClassifier {
    pub fn classify(record: &FileRecord) -> Category {
        let ext = record.extension();

        if ext == Some(SAFETENSORS_EXTENSION) {
            return Category::ModelWeights;
        }
        if let Some(ext) = ext {
            if SERIALIZED_EXTENSIONS.contains(&ext) {
                return Category::SerializedModel;
            }
            if CODE_EXTENSIONS.contains(&ext) {
                return Category::Code;
            }
        }
        if DEPENDENCY_FILES.contains(&record.file_name()) {
            return Category::Dependency;
        }

        Category::Other
    }
}
