use crate::models::Severity;
use crate::security::rules::SeverityRule;

/// 按有序关键字规则为发现消息定级，首个命中的规则生效，未命中为 `Low`
#[derive(Debug, Clone)]
pub struct SeverityClassifier {
    rules: Vec<SeverityRule>,
}

impl SeverityClassifier {
    /// 规则按 Critical -> High -> Medium 稳定排序，配置文件无法颠倒层级优先级
    pub fn new(rules: &[SeverityRule]) -> Self {
        let mut rules: Vec<SeverityRule> = rules
            .iter()
            .map(|rule| SeverityRule {
                severity: rule.severity,
                keywords: rule.keywords.iter().filter(|k| !k.is_empty()).cloned().collect(),
            })
            .collect();
        rules.sort_by(|a, b| b.severity.cmp(&a.severity));
        Self { rules }
    }

    pub fn classify(&self, message: &str) -> Severity {
        self.rules
            .iter()
            .find(|rule| rule.keywords.iter().any(|k| message.contains(k.as_str())))
            .map(|rule| rule.severity)
            .unwrap_or(Severity::Low)
    }
}

impl Default for SeverityClassifier {
    fn default() -> Self {
        Self::new(&crate::security::rules::RuleSet::default().severity_rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tiers() {
        let classifier = SeverityClassifier::default();

        assert_eq!(
            classifier.classify("Potential code injection risk in a.py: found 'os.system'"),
            Severity::Critical
        );
        assert_eq!(
            classifier.classify("Potential secret detected in conf.txt: api_key = \"abc123\""),
            Severity::Critical
        );
        assert_eq!(
            classifier.classify("Known malicious signature found in x.sh: curl http://malicious.com"),
            Severity::Critical
        );
        assert_eq!(
            classifier.classify("Adversarial prompt found in p.py: 'Bypass security measures'"),
            Severity::High
        );
        assert_eq!(
            classifier.classify("Outdated dependency found in requirements.txt: somepackage==1.0.0"),
            Severity::Medium
        );
        assert_eq!(
            classifier.classify("Phone numbers found in a.txt: [\"555-123-4567\"]"),
            Severity::Medium
        );
        assert_eq!(
            classifier.classify("Emails found in a.txt: [\"a@b.co\"]"),
            Severity::Medium
        );
        assert_eq!(
            classifier.classify("Potential backdoor trigger 'TRIGGER' found in model.safetensors"),
            Severity::Low
        );
        assert_eq!(classifier.classify(""), Severity::Low);
    }

    #[test]
    fn test_first_match_wins_across_tiers() {
        let classifier = SeverityClassifier::default();

        // 同时包含 Medium 与 Critical 关键字
        assert_eq!(
            classifier.classify("Emails found in a.txt: [\"token@corp.io\"]"),
            Severity::Critical
        );
        assert_eq!(
            classifier.classify("Outdated dependency: Ignore previous instructions"),
            Severity::High
        );
    }

    #[test]
    fn test_keyword_match_is_case_sensitive() {
        let classifier = SeverityClassifier::default();
        assert_eq!(classifier.classify("EVAL TOKEN SECRET"), Severity::Low);
    }

    #[test]
    fn test_config_order_cannot_invert_tiers() {
        let rules = vec![
            SeverityRule {
                severity: Severity::Medium,
                keywords: vec!["shared".to_string()],
            },
            SeverityRule {
                severity: Severity::Critical,
                keywords: vec!["shared".to_string()],
            },
            SeverityRule {
                severity: Severity::High,
                keywords: vec![String::new()],
            },
        ];
        let classifier = SeverityClassifier::new(&rules);

        assert_eq!(classifier.classify("a shared keyword"), Severity::Critical);
        assert_eq!(classifier.classify("nothing"), Severity::Low);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let classifier = SeverityClassifier::default();
        let message = "Potential code injection risk in nb.ipynb: found 'subprocess'";
        let first = classifier.classify(message);
        for _ in 0..10 {
            assert_eq!(classifier.classify(message), first);
        }
    }
}
