use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read};

/// 字节来源：核心只依赖 `read(path) -> bytes`，不关心背后是本地磁盘、对象存储还是远程下载
pub trait ByteReader: Send + Sync {
    fn read(&self, path: &str) -> io::Result<Vec<u8>>;
}

/// 本地文件读取（最多读取 `max_bytes` 字节，避免 OOM/卡顿）
#[derive(Debug, Clone)]
pub struct LocalFileReader {
    max_bytes: Option<u64>,
}

impl LocalFileReader {
    pub fn new() -> Self {
        Self { max_bytes: None }
    }

    pub fn with_limit(max_bytes: u64) -> Self {
        Self {
            max_bytes: Some(max_bytes),
        }
    }
}

impl Default for LocalFileReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteReader for LocalFileReader {
    fn read(&self, path: &str) -> io::Result<Vec<u8>> {
        let file = File::open(path)?;
        let mut buf = Vec::new();

        match self.max_bytes {
            Some(limit) => {
                file.take(limit.saturating_add(1)).read_to_end(&mut buf)?;
                if buf.len() as u64 > limit {
                    buf.truncate(limit as usize);
                    log::warn!(
                        "File {} truncated for scanning (>{} bytes). Only the first {} bytes were scanned.",
                        path,
                        limit,
                        limit
                    );
                }
            }
            None => {
                let mut file = file;
                file.read_to_end(&mut buf)?;
            }
        }

        Ok(buf)
    }
}

/// 内存字节来源，便于嵌入调用方与测试
#[derive(Debug, Clone, Default)]
pub struct MemoryReader {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), bytes.into());
    }

    pub fn with_file(mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(path, bytes);
        self
    }
}

impl ByteReader for MemoryReader {
    fn read(&self, path: &str) -> io::Result<Vec<u8>> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no such file: {}", path))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_local_reader_truncates_at_limit() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("big.bin");
        std::fs::write(&path, vec![b'a'; 64]).expect("write file");

        let reader = LocalFileReader::with_limit(16);
        let bytes = reader.read(path.to_str().unwrap()).unwrap();
        assert_eq!(bytes.len(), 16);

        let unbounded = LocalFileReader::new();
        assert_eq!(unbounded.read(path.to_str().unwrap()).unwrap().len(), 64);
    }

    #[test]
    fn test_local_reader_accepts_maximum_limit() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("small.txt");
        std::fs::write(&path, "somepackage==1.0.0\n").expect("write file");

        let reader = LocalFileReader::with_limit(u64::MAX);
        let bytes = reader.read(path.to_str().unwrap()).unwrap();
        assert_eq!(bytes, b"somepackage==1.0.0\n".to_vec());
    }

    #[test]
    fn test_local_reader_missing_file_is_error() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("missing.py");

        let err = LocalFileReader::new()
            .read(path.to_str().unwrap())
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_memory_reader_lookup() {
        let reader = MemoryReader::new().with_file("a.py", "print(1)");
        assert_eq!(reader.read("a.py").unwrap(), b"print(1)".to_vec());
        assert!(reader.read("b.py").is_err());
    }
}
