//! Property tests for the explanation engine and record validation

use cardio_risk_core::{ExplanationCode, ExplanationEngine, RiskRecord, RiskRecordInput};
use proptest::prelude::*;

fn any_record() -> impl Strategy<Value = RiskRecord> {
    (
        (0u8..=1, 0u32..=100, 10.0f64..70.0, 0u32..=150),
        (40.0f64..160.0, 0.8f64..2.5, 1u8..=3, 1u8..=3),
        (0u8..=1, 0u8..=1, 0u8..=1),
    )
        .prop_map(
            |((gender, age, bmi, pp), (map, ratio, chol, gluc), (smoke, alco, active))| {
                RiskRecordInput {
                    gender: Some(f64::from(gender)),
                    age_years: Some(f64::from(age)),
                    bmi: Some(bmi),
                    pulse_pressure: Some(f64::from(pp)),
                    mean_arterial_pressure: Some(map),
                    systolic_diastolic_ratio: Some(ratio),
                    cholesterol: Some(f64::from(chol)),
                    glucose: Some(f64::from(gluc)),
                    smoker: Some(f64::from(smoke)),
                    alcohol: Some(f64::from(alco)),
                    physically_active: Some(f64::from(active)),
                }
                .validate()
                .expect("generated input is always valid")
            },
        )
}

/// The one text each explanation code may carry for a given BMI
fn expected_text(code: ExplanationCode, bmi: f64) -> String {
    match code {
        ExplanationCode::HighPulsePressure => "Denyut nadi tinggi".to_string(),
        ExplanationCode::HighMeanArterialPressure => "Tekanan arteri rata-rata tinggi".to_string(),
        ExplanationCode::AbnormalPressureRatio => {
            "Rasio tekanan sistolik dan diastolik tidak normal".to_string()
        }
        ExplanationCode::CholesterolAboveNormal => "Kolesterol di atas normal".to_string(),
        ExplanationCode::CholesterolWellAboveNormal => "Kolesterol sangat di atas normal".to_string(),
        ExplanationCode::HighGlucose => "Tingkat glukosa tinggi".to_string(),
        ExplanationCode::Smoking => "Kebiasaan merokok".to_string(),
        ExplanationCode::AlcoholConsumption => "Konsumsi alkohol".to_string(),
        ExplanationCode::PhysicalInactivity => "Kurang aktivitas fisik".to_string(),
        ExplanationCode::ObesityClassI => format!(
            "BMI = {:.1}, Obesitas Kelas I: Peningkatan risiko penyakit kardiovaskular.",
            bmi
        ),
        ExplanationCode::ObesityClassII => format!(
            "BMI = {:.1}, Obesitas Kelas II: Risiko tinggi terkena hipertensi, diabetes, dan dislipidemia.",
            bmi
        ),
        ExplanationCode::ObesityClassIII => format!(
            "BMI = {:.1}, Obesitas Kelas III: Risiko penyakit kardiovaskular sangat tinggi.",
            bmi
        ),
    }
}

proptest! {
    #[test]
    fn explanation_texts_are_the_defined_strings(record in any_record()) {
        for explanation in ExplanationEngine::new().explain(&record) {
            prop_assert_eq!(explanation.text, expected_text(explanation.code, record.bmi()));
        }
    }

    #[test]
    fn explanations_follow_rule_order(record in any_record()) {
        let codes: Vec<ExplanationCode> = ExplanationEngine::new()
            .explain(&record)
            .into_iter()
            .map(|e| e.code)
            .collect();
        prop_assert!(codes.windows(2).all(|w| w[0] < w[1]));
        prop_assert!(codes.len() <= 9);
    }

    #[test]
    fn cholesterol_and_obesity_fire_at_most_once(record in any_record()) {
        let codes: Vec<ExplanationCode> = ExplanationEngine::new()
            .explain(&record)
            .into_iter()
            .map(|e| e.code)
            .collect();
        let cholesterol = codes
            .iter()
            .filter(|c| matches!(c, ExplanationCode::CholesterolAboveNormal | ExplanationCode::CholesterolWellAboveNormal))
            .count();
        let obesity = codes
            .iter()
            .filter(|c| matches!(c, ExplanationCode::ObesityClassI | ExplanationCode::ObesityClassII | ExplanationCode::ObesityClassIII))
            .count();
        prop_assert!(cholesterol <= 1);
        prop_assert!(obesity <= 1);
        prop_assert_eq!(obesity == 1, record.bmi() >= 30.0);
        prop_assert_eq!(cholesterol == 1, record.cholesterol().code() > 1);
    }

    #[test]
    fn explain_is_idempotent(record in any_record()) {
        let engine = ExplanationEngine::new();
        prop_assert_eq!(engine.explain(&record), engine.explain(&record));
    }

    #[test]
    fn negative_values_are_always_rejected(value in -1.0e6f64..-1.0e-9, index in 0usize..11) {
        let field = cardio_risk_core::Field::ALL[index];
        let mut input = RiskRecordInput {
            gender: Some(0.0),
            age_years: Some(40.0),
            bmi: Some(25.0),
            pulse_pressure: Some(40.0),
            mean_arterial_pressure: Some(90.0),
            systolic_diastolic_ratio: Some(1.4),
            cholesterol: Some(1.0),
            glucose: Some(1.0),
            smoker: Some(0.0),
            alcohol: Some(0.0),
            physically_active: Some(1.0),
        };
        input.set(field, value);
        let err = input.validate().unwrap_err();
        prop_assert_eq!(err.violations().len(), 1);
        prop_assert_eq!(err.violations()[0].field, field);
    }
}
