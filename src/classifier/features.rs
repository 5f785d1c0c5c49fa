//! Feature derivation for the diabetes risk model.
//!
//! The pre-trained model was fit on the 8 intake features followed by 10
//! derived indicator columns. Column names and order below reproduce the
//! training artifact exactly — reordering or renaming silently corrupts
//! model input, so the vector is assembled in one step from a validated
//! input mapping and never patched afterwards.
//!
//! The Normal BMI band and out-of-range insulin set no indicator: the
//! artifact encodes those baselines as all-zero columns.

use std::collections::BTreeMap;

use super::ClassifierError;

/// Flat numeric feature mapping as collected from the intake form / review UI.
pub type FeatureMap = BTreeMap<String, f64>;

/// Intake features, in the order the model was trained on.
pub const INPUT_FEATURES: [&str; 8] = [
    "Pregnancies",
    "Glucose",
    "BloodPressure",
    "SkinThickness",
    "Insulin",
    "BMI",
    "DiabetesPedigreeFunction",
    "Age",
];

/// Derived indicator columns, in the order the model was trained on.
/// Names are verbatim from the training artifact (including the spaces).
pub const INDICATOR_COLUMNS: [&str; 10] = [
    "NewBMI_Obesity 1",
    "NewBMI_Obesity 2",
    "NewBMI_Obesity 3",
    "NewBMI_Overweight",
    "NewBMI_Underweight",
    "NewInsulinScore_Normal",
    "NewGlucose_Low",
    "NewGlucose_Normal",
    "NewGlucose_Overweight",
    "NewGlucose_Secret",
];

/// Total model input dimension.
pub const VECTOR_DIM: usize = INPUT_FEATURES.len() + INDICATOR_COLUMNS.len();

// ═══════════════════════════════════════════════════════════
// Bucketing
// ═══════════════════════════════════════════════════════════

/// WHO-style BMI bands with the exact interval boundaries the model
/// was trained against (closed on the upper edge).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BmiBand {
    Underweight,
    Normal,
    Overweight,
    Obesity1,
    Obesity2,
    Obesity3,
}

impl BmiBand {
    pub fn classify(bmi: f64) -> Self {
        if bmi <= 18.5 {
            BmiBand::Underweight
        } else if bmi <= 24.9 {
            BmiBand::Normal
        } else if bmi <= 29.9 {
            BmiBand::Overweight
        } else if bmi <= 34.9 {
            BmiBand::Obesity1
        } else if bmi <= 39.9 {
            BmiBand::Obesity2
        } else {
            BmiBand::Obesity3
        }
    }
}

/// Glucose bands (mg/dL), boundaries as trained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlucoseBand {
    Low,
    Normal,
    Overweight,
    Secret,
}

impl GlucoseBand {
    pub fn classify(glucose: f64) -> Self {
        if glucose <= 70.0 {
            GlucoseBand::Low
        } else if glucose <= 99.0 {
            GlucoseBand::Normal
        } else if glucose <= 126.0 {
            GlucoseBand::Overweight
        } else {
            GlucoseBand::Secret
        }
    }
}

/// Fasting insulin reference range (µU/mL), inclusive on both ends.
pub fn insulin_is_normal(insulin: f64) -> bool {
    (16.0..=166.0).contains(&insulin)
}

// ═══════════════════════════════════════════════════════════
// Vector assembly
// ═══════════════════════════════════════════════════════════

fn indicator(set: bool) -> f32 {
    if set {
        1.0
    } else {
        0.0
    }
}

/// Assemble the full ordered model input vector from an intake mapping.
///
/// Fails on any missing or non-finite feature — partial input must never
/// reach the model as silent zeros.
pub fn assemble_vector(features: &FeatureMap) -> Result<[f32; VECTOR_DIM], ClassifierError> {
    let lookup = |name: &str| -> Result<f64, ClassifierError> {
        let value = *features
            .get(name)
            .ok_or_else(|| ClassifierError::MissingFeature(name.to_string()))?;
        if !value.is_finite() {
            return Err(ClassifierError::MalformedFeature(name.to_string()));
        }
        Ok(value)
    };

    let glucose = lookup("Glucose")?;
    let insulin = lookup("Insulin")?;
    let bmi = lookup("BMI")?;

    let bmi_band = BmiBand::classify(bmi);
    let glucose_band = GlucoseBand::classify(glucose);

    Ok([
        lookup("Pregnancies")? as f32,
        glucose as f32,
        lookup("BloodPressure")? as f32,
        lookup("SkinThickness")? as f32,
        insulin as f32,
        bmi as f32,
        lookup("DiabetesPedigreeFunction")? as f32,
        lookup("Age")? as f32,
        indicator(bmi_band == BmiBand::Obesity1),
        indicator(bmi_band == BmiBand::Obesity2),
        indicator(bmi_band == BmiBand::Obesity3),
        indicator(bmi_band == BmiBand::Overweight),
        indicator(bmi_band == BmiBand::Underweight),
        indicator(insulin_is_normal(insulin)),
        indicator(glucose_band == GlucoseBand::Low),
        indicator(glucose_band == GlucoseBand::Normal),
        indicator(glucose_band == GlucoseBand::Overweight),
        indicator(glucose_band == GlucoseBand::Secret),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_features() -> FeatureMap {
        let mut map = FeatureMap::new();
        map.insert("Pregnancies".into(), 2.0);
        map.insert("Glucose".into(), 120.0);
        map.insert("BloodPressure".into(), 70.0);
        map.insert("SkinThickness".into(), 20.0);
        map.insert("Insulin".into(), 80.0);
        map.insert("BMI".into(), 32.0);
        map.insert("DiabetesPedigreeFunction".into(), 0.47);
        map.insert("Age".into(), 33.0);
        map
    }

    // ── BMI bands (boundary exactness is load-bearing) ──

    #[test]
    fn bmi_boundaries_are_exact() {
        assert_eq!(BmiBand::classify(18.5), BmiBand::Underweight);
        assert_eq!(BmiBand::classify(18.6), BmiBand::Normal);
        assert_eq!(BmiBand::classify(24.9), BmiBand::Normal);
        assert_eq!(BmiBand::classify(25.0), BmiBand::Overweight);
        assert_eq!(BmiBand::classify(29.9), BmiBand::Overweight);
        assert_eq!(BmiBand::classify(34.9), BmiBand::Obesity1);
        assert_eq!(BmiBand::classify(39.9), BmiBand::Obesity2);
        assert_eq!(BmiBand::classify(40.0), BmiBand::Obesity3);
    }

    #[test]
    fn glucose_boundaries_are_exact() {
        assert_eq!(GlucoseBand::classify(70.0), GlucoseBand::Low);
        assert_eq!(GlucoseBand::classify(70.1), GlucoseBand::Normal);
        assert_eq!(GlucoseBand::classify(99.0), GlucoseBand::Normal);
        assert_eq!(GlucoseBand::classify(126.0), GlucoseBand::Overweight);
        assert_eq!(GlucoseBand::classify(126.1), GlucoseBand::Secret);
    }

    #[test]
    fn insulin_range_inclusive_on_both_ends() {
        assert!(insulin_is_normal(16.0));
        assert!(insulin_is_normal(166.0));
        assert!(!insulin_is_normal(15.9));
        assert!(!insulin_is_normal(166.1));
    }

    // ── vector assembly ──

    #[test]
    fn vector_has_model_dimension_and_order() {
        let vector = assemble_vector(&complete_features()).unwrap();
        assert_eq!(vector.len(), VECTOR_DIM);

        // Base features in intake order
        assert_eq!(vector[0], 2.0); // Pregnancies
        assert_eq!(vector[1], 120.0); // Glucose
        assert_eq!(vector[5], 32.0); // BMI
        assert_eq!(vector[7], 33.0); // Age

        // BMI 32.0 → Obesity 1 only
        assert_eq!(vector[8], 1.0);
        assert_eq!(&vector[9..13], &[0.0, 0.0, 0.0, 0.0]);

        // Insulin 80 is in the normal range
        assert_eq!(vector[13], 1.0);

        // Glucose 120 → Overweight band only
        assert_eq!(&vector[14..18], &[0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn normal_bmi_sets_no_indicator() {
        let mut features = complete_features();
        features.insert("BMI".into(), 22.0);
        let vector = assemble_vector(&features).unwrap();
        assert_eq!(&vector[8..13], &[0.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn missing_feature_fails_not_zero_fills() {
        let mut features = complete_features();
        features.remove("Insulin");
        let err = assemble_vector(&features).unwrap_err();
        assert!(matches!(err, ClassifierError::MissingFeature(name) if name == "Insulin"));
    }

    #[test]
    fn non_finite_feature_fails() {
        let mut features = complete_features();
        features.insert("BMI".into(), f64::NAN);
        let err = assemble_vector(&features).unwrap_err();
        assert!(matches!(err, ClassifierError::MalformedFeature(name) if name == "BMI"));
    }

    #[test]
    fn column_count_matches_artifact() {
        assert_eq!(VECTOR_DIM, 18);
    }
}
