use thiserror::Error;

/// 扫描核心的错误类型
#[derive(Debug, Error)]
pub enum ScanError {
    /// 文件字节不可达或不可读，对应文件被标记为跳过
    #[error("failed to load {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid rule pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("failed to build literal matcher: {0}")]
    Matcher(#[from] aho_corasick::BuildError),

    #[error("unknown detector `{0}` in applicability table")]
    UnknownDetector(String),
}

pub type ScanResult<T> = std::result::Result<T, ScanError>;
