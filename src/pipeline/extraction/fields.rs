//! Pattern-based field parsing of OCR text.
//!
//! A `RuleRegistry` maps each field name to a regex with exactly one capture
//! group. Parsing is total: every declared field appears in the report,
//! either with its captured value or with the explicit not-found sentinel —
//! the review UI depends on the fixed shape to know what needs manual entry.
//!
//! First match wins. Lab report formats are single-section; a field label
//! that could legitimately repeat means the rule needs anchoring context,
//! not parser-side disambiguation.

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::ExtractionError;

// ═══════════════════════════════════════════════════════════
// Rules
// ═══════════════════════════════════════════════════════════

/// Immutable pair of field name and compiled pattern.
#[derive(Debug, Clone)]
pub struct ExtractionRule {
    field: String,
    pattern: Regex,
}

impl ExtractionRule {
    /// Compile a rule. The pattern must capture exactly one group.
    pub fn new(field: &str, pattern: &str) -> Result<Self, ExtractionError> {
        let compiled = Regex::new(pattern).map_err(|e| ExtractionError::InvalidRule {
            field: field.to_string(),
            reason: e.to_string(),
        })?;

        // captures_len counts the implicit whole-match group 0
        if compiled.captures_len() != 2 {
            return Err(ExtractionError::InvalidRule {
                field: field.to_string(),
                reason: format!(
                    "pattern must capture exactly one group, has {}",
                    compiled.captures_len() - 1
                ),
            });
        }

        Ok(Self {
            field: field.to_string(),
            pattern: compiled,
        })
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// First captured group in the text, if the pattern matches anywhere.
    pub fn capture<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.pattern
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
    }
}

/// Fixed mapping from field name to extraction rule. Field names are unique.
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    rules: Vec<ExtractionRule>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, rule: ExtractionRule) -> Result<(), ExtractionError> {
        if self.rules.iter().any(|r| r.field == rule.field) {
            return Err(ExtractionError::DuplicateField(rule.field));
        }
        self.rules.push(rule);
        Ok(())
    }

    pub fn rules(&self) -> &[ExtractionRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Built-in rule set for liver function test reports.
    ///
    /// Labels are matched case-sensitively as printed by the common Indian
    /// lab formats these reports come from; whitespace between label and
    /// value is absorbed by the patterns.
    pub fn liver_panel() -> Self {
        const RULES: [(&str, &str); 9] = [
            ("Age", r"Age/Gender\s*:\s*(\d+)"),
            ("Total_Bilirubin", r"TOTAL BILIRUBIN\s*([\d.]+)"),
            ("Direct_Bilirubin", r"DIRECT BILIRUBIN\s*([\d.]+)"),
            ("Alkaline_Phosphotase", r"ALKALINE PHOSPHATASE\s*([\d.]+)"),
            ("Alamine_Aminotransferase", r"SGPT\s*([\d.]+)"),
            ("Aspartate_Aminotransferase", r"SGOT\s*([\d.]+)"),
            ("Total_Protiens", r"TOTAL PROTEINS\s*([\d.]+)"),
            ("Albumin", r"ALBUMIN\s*([\d.]+)"),
            ("Albumin_and_Globulin_Ratio", r"A/G RATIO\s*([\d.]+)"),
        ];

        let mut registry = Self::new();
        for (field, pattern) in RULES {
            let rule = ExtractionRule::new(field, pattern).expect("built-in rule compiles");
            registry.push(rule).expect("built-in field names are unique");
        }
        registry
    }
}

// ═══════════════════════════════════════════════════════════
// Report
// ═══════════════════════════════════════════════════════════

/// Value of a single field: captured string or the not-found sentinel.
///
/// Values stay raw strings — numeric conversion is the caller's concern,
/// since the sentinel is not representable in a numeric type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldOutcome {
    Found(String),
    NotFound,
}

impl FieldOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, FieldOutcome::Found(_))
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            FieldOutcome::Found(v) => Some(v.as_str()),
            FieldOutcome::NotFound => None,
        }
    }
}

/// Complete field-name → outcome mapping for one parse.
///
/// Contains exactly the fields declared in the registry — no extras, no
/// omissions, for every input text including the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldReport {
    fields: BTreeMap<String, FieldOutcome>,
}

impl FieldReport {
    pub fn get(&self, field: &str) -> Option<&FieldOutcome> {
        self.fields.get(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldOutcome)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field names whose value is the sentinel — the manual-correction list.
    pub fn missing_fields(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|(_, outcome)| !outcome.is_found())
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.fields.values().all(FieldOutcome::is_found)
    }
}

/// Apply every rule in the registry against the text.
///
/// Total function: never fails, returns one entry per declared rule.
pub fn extract_fields(text: &str, registry: &RuleRegistry) -> FieldReport {
    let fields = registry
        .rules()
        .iter()
        .map(|rule| {
            let outcome = match rule.capture(text) {
                Some(value) => FieldOutcome::Found(value.to_string()),
                None => FieldOutcome::NotFound,
            };
            (rule.field().to_string(), outcome)
        })
        .collect();

    FieldReport { fields }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report_text() -> &'static str {
        "LIVER FUNCTION TEST\n\
         Age/Gender : 54 /Male\n\
         TOTAL BILIRUBIN    1.2 mg/dL\n\
         DIRECT BILIRUBIN   0.3 mg/dL\n\
         ALKALINE PHOSPHATASE  210 U/L\n\
         SGPT  45 U/L\n\
         SGOT  38 U/L\n\
         TOTAL PROTEINS  6.8 g/dL\n\
         ALBUMIN  3.9 g/dL\n\
         A/G RATIO  1.3\n"
    }

    #[test]
    fn full_report_parses_every_field() {
        let registry = RuleRegistry::liver_panel();
        let report = extract_fields(sample_report_text(), &registry);

        assert!(report.is_complete());
        assert_eq!(report.get("Age").unwrap().value(), Some("54"));
        assert_eq!(report.get("Total_Bilirubin").unwrap().value(), Some("1.2"));
        assert_eq!(
            report.get("Alamine_Aminotransferase").unwrap().value(),
            Some("45")
        );
        assert_eq!(
            report.get("Albumin_and_Globulin_Ratio").unwrap().value(),
            Some("1.3")
        );
    }

    #[test]
    fn partial_text_yields_sentinels_for_the_rest() {
        let registry = RuleRegistry::liver_panel();
        let report = extract_fields("TOTAL BILIRUBIN 1.2 DIRECT BILIRUBIN 0.3", &registry);

        assert_eq!(report.get("Total_Bilirubin").unwrap().value(), Some("1.2"));
        assert_eq!(report.get("Direct_Bilirubin").unwrap().value(), Some("0.3"));

        let missing = report.missing_fields();
        assert_eq!(missing.len(), registry.len() - 2);
        assert!(missing.contains(&"Albumin".to_string()));
        assert!(!missing.contains(&"Total_Bilirubin".to_string()));
    }

    #[test]
    fn empty_text_yields_all_sentinels() {
        let registry = RuleRegistry::liver_panel();
        let report = extract_fields("", &registry);

        assert_eq!(report.len(), registry.len());
        assert_eq!(report.missing_fields().len(), registry.len());
        assert!(!report.is_complete());
    }

    #[test]
    fn report_has_no_extra_keys() {
        let registry = RuleRegistry::liver_panel();
        let report = extract_fields(sample_report_text(), &registry);

        let declared: Vec<&str> = registry.rules().iter().map(|r| r.field()).collect();
        for (name, _) in report.iter() {
            assert!(declared.contains(&name));
        }
        assert_eq!(report.len(), declared.len());
    }

    #[test]
    fn first_match_wins() {
        let mut registry = RuleRegistry::new();
        registry
            .push(ExtractionRule::new("Albumin", r"ALBUMIN\s*([\d.]+)").unwrap())
            .unwrap();

        let report = extract_fields("ALBUMIN 3.9 ALBUMIN 4.4", &registry);
        assert_eq!(report.get("Albumin").unwrap().value(), Some("3.9"));
    }

    #[test]
    fn matching_is_case_sensitive() {
        let registry = RuleRegistry::liver_panel();
        let report = extract_fields("total bilirubin 1.2", &registry);
        assert_eq!(
            report.get("Total_Bilirubin").unwrap(),
            &FieldOutcome::NotFound
        );
    }

    #[test]
    fn rule_requires_exactly_one_capture_group() {
        assert!(matches!(
            ExtractionRule::new("NoGroups", r"ALBUMIN\s*[\d.]+"),
            Err(ExtractionError::InvalidRule { .. })
        ));
        assert!(matches!(
            ExtractionRule::new("TwoGroups", r"(ALBUMIN)\s*([\d.]+)"),
            Err(ExtractionError::InvalidRule { .. })
        ));
    }

    #[test]
    fn rule_rejects_invalid_regex() {
        assert!(matches!(
            ExtractionRule::new("Broken", r"ALBUMIN\s*(["),
            Err(ExtractionError::InvalidRule { .. })
        ));
    }

    #[test]
    fn registry_rejects_duplicate_field_names() {
        let mut registry = RuleRegistry::new();
        registry
            .push(ExtractionRule::new("Albumin", r"ALBUMIN\s*([\d.]+)").unwrap())
            .unwrap();
        let result = registry.push(ExtractionRule::new("Albumin", r"ALB\s*([\d.]+)").unwrap());
        assert!(matches!(result, Err(ExtractionError::DuplicateField(_))));
    }

    #[test]
    fn sentinel_serializes_distinctly_from_values() {
        let json = serde_json::to_string(&FieldOutcome::NotFound).unwrap();
        assert_eq!(json, "\"not_found\"");
        let json = serde_json::to_string(&FieldOutcome::Found("1.2".into())).unwrap();
        assert!(json.contains("1.2"));
    }
}
