use crate::error::{ScanError, ScanResult};
use crate::models::{Category, FileRecord};
use crate::services::ByteReader;
use std::borrow::Cow;
use std::sync::{Arc, OnceLock};

#[derive(Debug, Clone, Copy)]
enum Utf16Encoding {
    LittleEndian,
    BigEndian,
}

#[derive(Debug)]
enum Primary {
    Text(String),
    Binary(Vec<u8>),
}

/// 文件内容视图：按分类决定主视图（文本或二进制），另一种视图按需惰性派生且只派生一次
#[derive(Debug)]
pub struct ContentView {
    primary: Primary,
    derived_text: OnceLock<String>,
}

impl ContentView {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            primary: Primary::Text(text.into()),
            derived_text: OnceLock::new(),
        }
    }

    pub fn binary(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            primary: Primary::Binary(bytes.into()),
            derived_text: OnceLock::new(),
        }
    }

    /// 按分类的加载策略将原始字节转换为视图
    pub fn from_bytes(bytes: Vec<u8>, category: Category) -> Self {
        if category.is_binary() {
            Self::binary(bytes)
        } else {
            Self::text(decode_text(&bytes))
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self.primary, Primary::Binary(_))
    }

    /// 文本视图；二进制主视图按 UTF-8 有损解码
    pub fn as_text(&self) -> &str {
        match &self.primary {
            Primary::Text(text) => text,
            Primary::Binary(bytes) => self
                .derived_text
                .get_or_init(|| String::from_utf8_lossy(bytes).into_owned()),
        }
    }

    /// 字节视图；文本主视图即其 UTF-8 编码
    pub fn as_bytes(&self) -> &[u8] {
        match &self.primary {
            Primary::Text(text) => text.as_bytes(),
            Primary::Binary(bytes) => bytes,
        }
    }
}

/// 文本判定的采样字符数
const TEXT_SAMPLE_CHARS: usize = 8192;
/// U+FFFD 占比上限
const MAX_REPLACEMENT_RATIO: f32 = 0.05;
/// 控制字符（换行、回车、制表除外）占比上限
const MAX_CONTROL_RATIO: f32 = 0.02;

/// 文本解码：识别 UTF-16（BOM 或 NUL 分布），否则按 UTF-8 有损解码，永不失败
///
/// BOM 只是提示：按 UTF-16 解码的结果须通过文本判定，且 BOM 之后不能是
/// 不含 NUL 的合法 UTF-8，否则回退到 UTF-8。
pub fn decode_text(buf: &[u8]) -> String {
    if let Some((encoding, offset)) = detect_utf16_encoding(buf) {
        let payload = buf.get(offset..).unwrap_or(&[]);
        let decoded = decode_utf16(payload, encoding);
        if decoded.is_empty() || (is_likely_text(&decoded) && !is_plain_utf8(payload)) {
            return decoded;
        }
        log::debug!("UTF-16 decoding rejected, falling back to UTF-8");
    }

    match String::from_utf8_lossy(buf) {
        Cow::Borrowed(s) => s.to_string(),
        Cow::Owned(s) => {
            log::debug!("Invalid UTF-8 sequences replaced during decoding");
            s
        }
    }
}

/// 不含 NUL 的合法 UTF-8：ASCII 文本前的误植 BOM 会被 UTF-16 解码成整段 CJK 字符
fn is_plain_utf8(payload: &[u8]) -> bool {
    !payload.contains(&0) && std::str::from_utf8(payload).is_ok()
}

fn detect_utf16_encoding(buf: &[u8]) -> Option<(Utf16Encoding, usize)> {
    if buf.len() < 2 {
        return None;
    }

    if buf[0] == 0xFF && buf[1] == 0xFE {
        return Some((Utf16Encoding::LittleEndian, 2));
    }
    if buf[0] == 0xFE && buf[1] == 0xFF {
        return Some((Utf16Encoding::BigEndian, 2));
    }

    let sample_len = buf.len().min(4096);
    if sample_len < 4 {
        return None;
    }

    let sample = &buf[..sample_len];
    let total_zeros = sample.iter().filter(|b| **b == 0).count();
    if (total_zeros as f32 / sample_len as f32) < 0.1 {
        return None;
    }

    let even = sample.iter().step_by(2);
    let odd = sample.iter().skip(1).step_by(2);
    let even_len = even.len();
    let odd_len = odd.len();
    let even_ratio = even.filter(|b| **b == 0).count() as f32 / even_len as f32;
    let odd_ratio = odd.filter(|b| **b == 0).count() as f32 / odd_len as f32;

    if odd_ratio > 0.6 && even_ratio < 0.2 {
        return Some((Utf16Encoding::LittleEndian, 0));
    }
    if even_ratio > 0.6 && odd_ratio < 0.2 {
        return Some((Utf16Encoding::BigEndian, 0));
    }

    None
}

fn decode_utf16(payload: &[u8], encoding: Utf16Encoding) -> String {
    let units: Vec<u16> = payload
        .chunks_exact(2)
        .map(|chunk| match encoding {
            Utf16Encoding::LittleEndian => u16::from_le_bytes([chunk[0], chunk[1]]),
            Utf16Encoding::BigEndian => u16::from_be_bytes([chunk[0], chunk[1]]),
        })
        .collect();
    String::from_utf16_lossy(&units)
}

fn is_likely_text(decoded: &str) -> bool {
    let (total, replacement, control) = decoded.chars().take(TEXT_SAMPLE_CHARS).fold(
        (0usize, 0usize, 0usize),
        |(total, replacement, control), ch| {
            (
                total + 1,
                replacement + usize::from(ch == char::REPLACEMENT_CHARACTER),
                control + usize::from(ch.is_control() && !matches!(ch, '\n' | '\r' | '\t')),
            )
        },
    );
    if total == 0 {
        return false;
    }

    let ratio = |count: usize| count as f32 / total as f32;
    ratio(replacement) < MAX_REPLACEMENT_RATIO && ratio(control) < MAX_CONTROL_RATIO
}

/// 内容加载器：通过外部字节来源读取文件，按分类生成视图
#[derive(Clone)]
pub struct ContentLoader {
    reader: Arc<dyn ByteReader>,
}

impl ContentLoader {
    pub fn new(reader: Arc<dyn ByteReader>) -> Self {
        Self { reader }
    }

    pub fn load(&self, record: &FileRecord, category: Category) -> ScanResult<ContentView> {
        let bytes = self.reader.read(&record.path).map_err(|source| ScanError::Load {
            path: record.path.clone(),
            source,
        })?;
        Ok(ContentView::from_bytes(bytes, category))
    }
}
