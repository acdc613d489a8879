use crate::error::{ScanError, ScanResult};
use crate::models::Category;
use crate::security::detectors::{
    BackdoorDetector, CodeInjectionDetector, DependencyDetector, PiiDetector, SecretsDetector,
    ThreatSignatureDetector,
};
use crate::security::rules::RuleSet;
use crate::security::Detector;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// 检测器注册表：分类 -> 适用检测器。新增检测器只需注册，不影响其它检测器
#[derive(Clone, Default)]
pub struct DetectorRegistry {
    detectors: Vec<Arc<dyn Detector>>,
    by_category: HashMap<Category, Vec<usize>>,
}

impl DetectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 由规则集构建内置的六个检测器（正则与字面量自动机在此编译），并应用 `applicability` 覆盖
    pub fn from_rules(rules: &RuleSet) -> ScanResult<Self> {
        let builtin: Vec<Arc<dyn Detector>> = vec![
            Arc::new(SecretsDetector::new(&rules.secret_patterns)?),
            Arc::new(PiiDetector::new(&rules.email_pattern, &rules.phone_pattern)?),
            Arc::new(BackdoorDetector::new(&rules.backdoor_triggers)?),
            Arc::new(DependencyDetector::new(&rules.vulnerable_dependencies)),
            Arc::new(CodeInjectionDetector::new(
                &rules.risky_calls,
                &rules.adversarial_prompts,
            )?),
            Arc::new(ThreatSignatureDetector::new(&rules.threat_signatures)?),
        ];

        let mut registry = Self::new();
        for detector in builtin {
            let categories = rules
                .applicability
                .get(detector.name())
                .cloned()
                .unwrap_or_else(|| detector.default_categories().to_vec());
            registry.register(detector, &categories);
        }
        registry.check_overrides(&rules.applicability)?;

        Ok(registry)
    }

    pub fn register(&mut self, detector: Arc<dyn Detector>, categories: &[Category]) {
        let idx = self.detectors.len();
        self.detectors.push(detector);
        for category in categories {
            let slots = self.by_category.entry(*category).or_default();
            if !slots.contains(&idx) {
                slots.push(idx);
            }
        }
    }

    fn check_overrides(&self, overrides: &BTreeMap<String, Vec<Category>>) -> ScanResult<()> {
        for name in overrides.keys() {
            if !self.detectors.iter().any(|d| d.name() == name) {
                return Err(ScanError::UnknownDetector(name.clone()));
            }
        }
        Ok(())
    }

    /// 返回适用于指定分类的检测器（按注册顺序）
    pub fn detectors_for(&self, category: Category) -> impl Iterator<Item = &Arc<dyn Detector>> {
        self.by_category
            .get(&category)
            .into_iter()
            .flatten()
            .filter_map(move |idx| self.detectors.get(*idx))
    }

    pub fn names_for(&self, category: Category) -> Vec<&str> {
        self.detectors_for(category).map(|d| d.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Finding;
    use crate::security::detectors::{
        BACKDOOR, CODE_INJECTION, DEPENDENCY, PII, SECRETS, THREAT_SIGNATURE,
    };
    use crate::security::ContentView;

    #[test]
    fn test_default_applicability_table() {
        let registry = DetectorRegistry::from_rules(&RuleSet::default()).unwrap();
        assert_eq!(registry.len(), 6);

        assert_eq!(
            registry.names_for(Category::ModelWeights),
            vec![SECRETS, PII, BACKDOOR, THREAT_SIGNATURE]
        );
        assert_eq!(
            registry.names_for(Category::SerializedModel),
            vec![SECRETS, PII, BACKDOOR, THREAT_SIGNATURE]
        );
        assert_eq!(
            registry.names_for(Category::Code),
            vec![SECRETS, PII, CODE_INJECTION, THREAT_SIGNATURE]
        );
        assert_eq!(
            registry.names_for(Category::Dependency),
            vec![SECRETS, PII, DEPENDENCY, THREAT_SIGNATURE]
        );
        assert_eq!(
            registry.names_for(Category::Other),
            vec![SECRETS, PII, THREAT_SIGNATURE]
        );
    }

    #[test]
    fn test_applicability_override() {
        let mut rules = RuleSet::default();
        rules.applicability.insert(
            CODE_INJECTION.to_string(),
            vec![Category::Code, Category::Other],
        );
        let registry = DetectorRegistry::from_rules(&rules).unwrap();

        assert!(registry.names_for(Category::Other).contains(&CODE_INJECTION));
    }

    #[test]
    fn test_unknown_detector_override_is_rejected() {
        let mut rules = RuleSet::default();
        rules
            .applicability
            .insert("entropy".to_string(), vec![Category::Other]);

        let err = DetectorRegistry::from_rules(&rules).err().unwrap();
        assert!(matches!(err, ScanError::UnknownDetector(ref name) if name == "entropy"));
    }

    struct LicenseDetector;

    impl Detector for LicenseDetector {
        fn name(&self) -> &str {
            "license"
        }

        fn default_categories(&self) -> &[Category] {
            &[Category::Other]
        }

        fn detect(&self, path: &str, content: &ContentView) -> anyhow::Result<Vec<Finding>> {
            Ok(content
                .as_text()
                .contains("GPL")
                .then(|| Finding::new(path, "license", format!("Copyleft license in {}", path)))
                .into_iter()
                .collect())
        }
    }

    #[test]
    fn test_custom_detector_registration() {
        let mut registry = DetectorRegistry::from_rules(&RuleSet::default()).unwrap();
        let detector: Arc<dyn Detector> = Arc::new(LicenseDetector);
        let categories = detector.default_categories().to_vec();
        registry.register(detector, &categories);

        assert_eq!(registry.len(), 7);
        assert!(registry.names_for(Category::Other).contains(&"license"));
        assert!(!registry.names_for(Category::Code).contains(&"license"));
    }
}
