use crate::error::{ScanError, ScanResult};
use crate::models::{Category, Finding};
use crate::security::content::ContentView;
use crate::security::Detector;
use aho_corasick::{AhoCorasick, AhoCorasickBuilder};
use anyhow::Result;
use regex::Regex;
use std::collections::BTreeSet;

pub const SECRETS: &str = "secrets";
pub const PII: &str = "pii";
pub const BACKDOOR: &str = "backdoor";
pub const DEPENDENCY: &str = "dependency";
pub const CODE_INJECTION: &str = "code_injection";
pub const THREAT_SIGNATURE: &str = "threat_signature";

const MODEL_CATEGORIES: &[Category] = &[Category::ModelWeights, Category::SerializedModel];

fn compile(pattern: &str) -> ScanResult<Regex> {
    Regex::new(pattern).map_err(|source| ScanError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// 字面量表：构建时生成一个 Aho-Corasick 自动机，单次扫描找出所有出现过的条目
struct LiteralTable {
    literals: Vec<String>,
    matcher: AhoCorasick,
}

impl LiteralTable {
    fn new(literals: &[String], ascii_case_insensitive: bool) -> ScanResult<Self> {
        let literals: Vec<String> = literals.iter().filter(|l| !l.is_empty()).cloned().collect();
        let matcher = AhoCorasickBuilder::new()
            .ascii_case_insensitive(ascii_case_insensitive)
            .build(&literals)?;
        Ok(Self { literals, matcher })
    }

    /// 命中的条目，按表内顺序，每个条目至多一次
    fn matched(&self, haystack: &[u8]) -> Vec<&str> {
        let hits: BTreeSet<usize> = self
            .matcher
            .find_overlapping_iter(haystack)
            .map(|m| m.pattern().as_usize())
            .collect();
        hits.into_iter()
            .filter_map(|id| self.literals.get(id).map(String::as_str))
            .collect()
    }
}

/// 密钥/口令赋值检测，每个匹配产生一条发现
pub struct SecretsDetector {
    patterns: Vec<Regex>,
}

impl SecretsDetector {
    pub fn new(patterns: &[String]) -> ScanResult<Self> {
        let patterns = patterns
            .iter()
            .map(|p| compile(p))
            .collect::<ScanResult<Vec<_>>>()?;
        Ok(Self { patterns })
    }
}

impl Detector for SecretsDetector {
    fn name(&self) -> &str {
        SECRETS
    }

    fn default_categories(&self) -> &[Category] {
        &Category::ALL
    }

    fn detect(&self, path: &str, content: &ContentView) -> Result<Vec<Finding>> {
        let text = content.as_text();
        let findings = self
            .patterns
            .iter()
            .flat_map(|re| re.find_iter(text))
            .map(|m| {
                Finding::new(
                    path,
                    SECRETS,
                    format!("Potential secret detected in {}: {}", path, m.as_str()),
                )
            })
            .collect();
        Ok(findings)
    }
}

/// 邮箱与电话号码检测，每类非空匹配集合产生一条发现
pub struct PiiDetector {
    email: Regex,
    phone: Regex,
}

impl PiiDetector {
    pub fn new(email_pattern: &str, phone_pattern: &str) -> ScanResult<Self> {
        Ok(Self {
            email: compile(email_pattern)?,
            phone: compile(phone_pattern)?,
        })
    }
}

impl Detector for PiiDetector {
    fn name(&self) -> &str {
        PII
    }

    fn default_categories(&self) -> &[Category] {
        &Category::ALL
    }

    fn detect(&self, path: &str, content: &ContentView) -> Result<Vec<Finding>> {
        let text = content.as_text();
        let mut findings = Vec::new();

        let emails: Vec<&str> = self.email.find_iter(text).map(|m| m.as_str()).collect();
        if !emails.is_empty() {
            findings.push(Finding::new(
                path,
                PII,
                format!("Emails found in {}: {:?}", path, emails),
            ));
        }

        let phones: Vec<&str> = self.phone.find_iter(text).map(|m| m.as_str()).collect();
        if !phones.is_empty() {
            findings.push(Finding::new(
                path,
                PII,
                format!("Phone numbers found in {}: {:?}", path, phones),
            ));
        }

        Ok(findings)
    }
}

/// 模型后门触发字节检测
pub struct BackdoorDetector {
    triggers: LiteralTable,
}

impl BackdoorDetector {
    pub fn new(triggers: &[String]) -> ScanResult<Self> {
        Ok(Self {
            triggers: LiteralTable::new(triggers, false)?,
        })
    }
}

impl Detector for BackdoorDetector {
    fn name(&self) -> &str {
        BACKDOOR
    }

    fn default_categories(&self) -> &[Category] {
        MODEL_CATEGORIES
    }

    fn detect(&self, path: &str, content: &ContentView) -> Result<Vec<Finding>> {
        Ok(self
            .triggers
            .matched(content.as_bytes())
            .into_iter()
            .map(|trigger| {
                Finding::new(
                    path,
                    BACKDOOR,
                    format!("Potential backdoor trigger '{}' found in {}", trigger, path),
                )
            })
            .collect())
    }
}

/// 依赖清单逐行检测已知漏洞版本
pub struct DependencyDetector {
    vulnerable: Vec<String>,
}

impl DependencyDetector {
    pub fn new(vulnerable: &[String]) -> Self {
        Self {
            vulnerable: vulnerable
                .iter()
                .map(|v| v.trim().to_lowercase())
                .filter(|v| !v.is_empty())
                .collect(),
        }
    }
}

impl Detector for DependencyDetector {
    fn name(&self) -> &str {
        DEPENDENCY
    }

    fn default_categories(&self) -> &[Category] {
        &[Category::Dependency]
    }

    fn detect(&self, path: &str, content: &ContentView) -> Result<Vec<Finding>> {
        let mut findings = Vec::new();

        for line in content.as_text().lines() {
            let normalized = line.trim_start().to_lowercase();
            if self.vulnerable.iter().any(|v| normalized.starts_with(v.as_str())) {
                findings.push(Finding::new(
                    path,
                    DEPENDENCY,
                    format!("Outdated dependency found in {}: {}", path, line.trim()),
                ));
            }
        }

        Ok(findings)
    }
}

/// 代码注入与提示词注入检测：危险调用（区分大小写）+ 对抗性提示词（ASCII 不区分大小写）
pub struct CodeInjectionDetector {
    risky_calls: LiteralTable,
    adversarial_prompts: LiteralTable,
}

impl CodeInjectionDetector {
    pub fn new(risky_calls: &[String], adversarial_prompts: &[String]) -> ScanResult<Self> {
        Ok(Self {
            risky_calls: LiteralTable::new(risky_calls, false)?,
            adversarial_prompts: LiteralTable::new(adversarial_prompts, true)?,
        })
    }
}

impl Detector for CodeInjectionDetector {
    fn name(&self) -> &str {
        CODE_INJECTION
    }

    fn default_categories(&self) -> &[Category] {
        &[Category::Code]
    }

    fn detect(&self, path: &str, content: &ContentView) -> Result<Vec<Finding>> {
        let text = content.as_text().as_bytes();

        let calls = self.risky_calls.matched(text).into_iter().map(|call| {
            Finding::new(
                path,
                CODE_INJECTION,
                format!("Potential code injection risk in {}: found '{}'", path, call),
            )
        });
        let prompts = self.adversarial_prompts.matched(text).into_iter().map(|phrase| {
            Finding::new(
                path,
                CODE_INJECTION,
                format!("Adversarial prompt found in {}: '{}'", path, phrase),
            )
        });

        Ok(calls.chain(prompts).collect())
    }
}

/// 已知恶意签名的字节包含检测
pub struct ThreatSignatureDetector {
    signatures: LiteralTable,
}

impl ThreatSignatureDetector {
    pub fn new(signatures: &[String]) -> ScanResult<Self> {
        Ok(Self {
            signatures: LiteralTable::new(signatures, false)?,
        })
    }
}

impl Detector for ThreatSignatureDetector {
    fn name(&self) -> &str {
        THREAT_SIGNATURE
    }

    fn default_categories(&self) -> &[Category] {
        &Category::ALL
    }

    fn detect(&self, path: &str, content: &ContentView) -> Result<Vec<Finding>> {
        Ok(self
            .signatures
            .matched(content.as_bytes())
            .into_iter()
            .map(|sig| {
                Finding::new(
                    path,
                    THREAT_SIGNATURE,
                    format!("Known malicious signature found in {}: {}", path, sig),
                )
            })
            .collect())
    }
}
