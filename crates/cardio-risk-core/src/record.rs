//! Risk record types
//!
//! A [`RiskRecord`] is the validated, immutable set of eleven risk factors
//! describing one individual. Records are only ever built from a
//! [`RiskRecordInput`] (or raw form pairs) through validation, so every
//! record in circulation has all fields present and inside their domains.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::error::{FieldViolation, RecordError, ViolationCode};

/// Number of model features carried by a record
pub const FEATURE_COUNT: usize = 11;

/// Model feature names, in the column order the scaler and classifier expect
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "gender",
    "age_years",
    "bmi",
    "tekanan_denyut_nadi",
    "tekanan_arteri_ratarata",
    "sys_dsys_ratio",
    "cholesterol",
    "gluc",
    "smoke",
    "alco",
    "active",
];

/// Identifies one record field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Gender,
    AgeYears,
    Bmi,
    PulsePressure,
    MeanArterialPressure,
    SystolicDiastolicRatio,
    Cholesterol,
    Glucose,
    Smoker,
    Alcohol,
    PhysicallyActive,
}

impl Field {
    /// All fields in model feature order
    pub const ALL: [Field; FEATURE_COUNT] = [
        Field::Gender,
        Field::AgeYears,
        Field::Bmi,
        Field::PulsePressure,
        Field::MeanArterialPressure,
        Field::SystolicDiastolicRatio,
        Field::Cholesterol,
        Field::Glucose,
        Field::Smoker,
        Field::Alcohol,
        Field::PhysicallyActive,
    ];

    /// Field name used in JSON payloads and error reports
    pub fn name(&self) -> &'static str {
        match self {
            Field::Gender => "gender",
            Field::AgeYears => "age_years",
            Field::Bmi => "bmi",
            Field::PulsePressure => "pulse_pressure",
            Field::MeanArterialPressure => "mean_arterial_pressure",
            Field::SystolicDiastolicRatio => "systolic_diastolic_ratio",
            Field::Cholesterol => "cholesterol",
            Field::Glucose => "glucose",
            Field::Smoker => "smoker",
            Field::Alcohol => "alcohol",
            Field::PhysicallyActive => "physically_active",
        }
    }

    /// Column name the trained model knows this field by
    pub fn feature_name(&self) -> &'static str {
        FEATURE_NAMES[self.index()]
    }

    /// Position of the field in the feature vector
    pub fn index(&self) -> usize {
        match self {
            Field::Gender => 0,
            Field::AgeYears => 1,
            Field::Bmi => 2,
            Field::PulsePressure => 3,
            Field::MeanArterialPressure => 4,
            Field::SystolicDiastolicRatio => 5,
            Field::Cholesterol => 6,
            Field::Glucose => 7,
            Field::Smoker => 8,
            Field::Alcohol => 9,
            Field::PhysicallyActive => 10,
        }
    }

    /// Resolve a field from either its payload name or its model column name
    pub fn from_key(key: &str) -> Option<Field> {
        Field::ALL
            .iter()
            .copied()
            .find(|f| f.name() == key || f.feature_name() == key)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Gender as encoded for the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Gender {
    Male = 0,
    Female = 1,
}

impl TryFrom<u8> for Gender {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Gender::Male),
            1 => Ok(Gender::Female),
            other => Err(format!("gender must be 0 or 1, got {}", other)),
        }
    }
}

impl From<Gender> for u8 {
    fn from(gender: Gender) -> Self {
        gender as u8
    }
}

/// Three-tier laboratory level used for cholesterol and glucose
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Level {
    Normal = 1,
    AboveNormal = 2,
    WellAboveNormal = 3,
}

impl Level {
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl TryFrom<u8> for Level {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Level::Normal),
            2 => Ok(Level::AboveNormal),
            3 => Ok(Level::WellAboveNormal),
            other => Err(format!("level must be 1, 2 or 3, got {}", other)),
        }
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        level as u8
    }
}

/// A validated record of eleven cardiovascular risk factors
///
/// Fields are private; the only way to obtain a record is through
/// [`RiskRecordInput::validate`] or [`RiskRecord::from_pairs`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskRecord {
    gender: Gender,
    age_years: u32,
    bmi: f64,
    pulse_pressure: u32,
    mean_arterial_pressure: f64,
    systolic_diastolic_ratio: f64,
    cholesterol: Level,
    glucose: Level,
    #[serde(serialize_with = "serialize_flag")]
    smoker: bool,
    #[serde(serialize_with = "serialize_flag")]
    alcohol: bool,
    #[serde(serialize_with = "serialize_flag")]
    physically_active: bool,
}

fn serialize_flag<S: serde::Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u8(u8::from(*value))
}

impl RiskRecord {
    pub fn gender(&self) -> Gender {
        self.gender
    }

    pub fn age_years(&self) -> u32 {
        self.age_years
    }

    pub fn bmi(&self) -> f64 {
        self.bmi
    }

    pub fn pulse_pressure(&self) -> u32 {
        self.pulse_pressure
    }

    pub fn mean_arterial_pressure(&self) -> f64 {
        self.mean_arterial_pressure
    }

    pub fn systolic_diastolic_ratio(&self) -> f64 {
        self.systolic_diastolic_ratio
    }

    pub fn cholesterol(&self) -> Level {
        self.cholesterol
    }

    pub fn glucose(&self) -> Level {
        self.glucose
    }

    pub fn smoker(&self) -> bool {
        self.smoker
    }

    pub fn alcohol(&self) -> bool {
        self.alcohol
    }

    pub fn physically_active(&self) -> bool {
        self.physically_active
    }

    /// Numeric value of a single field, encoded as the model sees it
    pub fn value(&self, field: Field) -> f64 {
        self.to_features()[field.index()]
    }

    /// Raw feature vector in [`FEATURE_NAMES`] order
    pub fn to_features(&self) -> [f64; FEATURE_COUNT] {
        [
            f64::from(u8::from(self.gender)),
            f64::from(self.age_years),
            self.bmi,
            f64::from(self.pulse_pressure),
            self.mean_arterial_pressure,
            self.systolic_diastolic_ratio,
            f64::from(self.cholesterol.code()),
            f64::from(self.glucose.code()),
            flag(self.smoker),
            flag(self.alcohol),
            flag(self.physically_active),
        ]
    }

    /// Build a record from raw key/value pairs such as a submitted HTML form
    ///
    /// Keys may be payload names (`pulse_pressure`) or model column names
    /// (`tekanan_denyut_nadi`). Empty values count as missing; unknown keys
    /// are ignored. All problems are reported together.
    pub fn from_pairs<'a, I>(pairs: I) -> Result<RiskRecord, RecordError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut input = RiskRecordInput::default();
        let mut unparseable: Vec<FieldViolation> = Vec::new();

        for (key, raw) in pairs {
            let Some(field) = Field::from_key(key.trim()) else {
                continue;
            };
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            match raw.replace(',', ".").parse::<f64>() {
                Ok(value) => input.set(field, value),
                Err(_) => unparseable.push(FieldViolation::new(
                    field,
                    ViolationCode::Unparseable,
                    format!("'{}' is not a number", raw),
                )),
            }
        }

        match input.validate() {
            Ok(record) if unparseable.is_empty() => Ok(record),
            Ok(_) => Err(RecordError::Invalid(unparseable)),
            Err(RecordError::Invalid(violations)) => {
                let skip: HashSet<Field> = unparseable.iter().map(|v| v.field).collect();
                let mut merged = unparseable;
                merged.extend(
                    violations
                        .into_iter()
                        .filter(|v| !(v.code == ViolationCode::Missing && skip.contains(&v.field))),
                );
                merged.sort_by_key(|v| v.field.index());
                Err(RecordError::Invalid(merged))
            }
        }
    }
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

/// Unvalidated record as received from a user
///
/// Every field is optional and numeric so that malformed submissions can be
/// reported field by field instead of failing deserialization wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskRecordInput {
    #[serde(default)]
    pub gender: Option<f64>,
    #[serde(default)]
    pub age_years: Option<f64>,
    #[serde(default)]
    pub bmi: Option<f64>,
    #[serde(default, alias = "tekanan_denyut_nadi")]
    pub pulse_pressure: Option<f64>,
    #[serde(default, alias = "tekanan_arteri_ratarata")]
    pub mean_arterial_pressure: Option<f64>,
    #[serde(default, alias = "sys_dsys_ratio")]
    pub systolic_diastolic_ratio: Option<f64>,
    #[serde(default)]
    pub cholesterol: Option<f64>,
    #[serde(default, alias = "gluc")]
    pub glucose: Option<f64>,
    #[serde(default, alias = "smoke")]
    pub smoker: Option<f64>,
    #[serde(default, alias = "alco")]
    pub alcohol: Option<f64>,
    #[serde(default, alias = "active")]
    pub physically_active: Option<f64>,
}

impl RiskRecordInput {
    /// Read a field value
    pub fn get(&self, field: Field) -> Option<f64> {
        match field {
            Field::Gender => self.gender,
            Field::AgeYears => self.age_years,
            Field::Bmi => self.bmi,
            Field::PulsePressure => self.pulse_pressure,
            Field::MeanArterialPressure => self.mean_arterial_pressure,
            Field::SystolicDiastolicRatio => self.systolic_diastolic_ratio,
            Field::Cholesterol => self.cholesterol,
            Field::Glucose => self.glucose,
            Field::Smoker => self.smoker,
            Field::Alcohol => self.alcohol,
            Field::PhysicallyActive => self.physically_active,
        }
    }

    /// Set a field value
    pub fn set(&mut self, field: Field, value: f64) {
        let slot = match field {
            Field::Gender => &mut self.gender,
            Field::AgeYears => &mut self.age_years,
            Field::Bmi => &mut self.bmi,
            Field::PulsePressure => &mut self.pulse_pressure,
            Field::MeanArterialPressure => &mut self.mean_arterial_pressure,
            Field::SystolicDiastolicRatio => &mut self.systolic_diastolic_ratio,
            Field::Cholesterol => &mut self.cholesterol,
            Field::Glucose => &mut self.glucose,
            Field::Smoker => &mut self.smoker,
            Field::Alcohol => &mut self.alcohol,
            Field::PhysicallyActive => &mut self.physically_active,
        };
        *slot = Some(value);
    }

    /// Fill fields that are missing here from `other`
    pub fn merge_missing(mut self, other: &RiskRecordInput) -> Self {
        for field in Field::ALL {
            if self.get(field).is_none() {
                if let Some(value) = other.get(field) {
                    self.set(field, value);
                }
            }
        }
        self
    }

    /// Validate every field and build a [`RiskRecord`]
    ///
    /// Collects all violations instead of stopping at the first one.
    pub fn validate(&self) -> Result<RiskRecord, RecordError> {
        let mut v = Validator::default();

        let gender = v.choice::<Gender>(Field::Gender, self.gender, "0 (male) or 1 (female)");
        let age_years = v.non_negative_integer(Field::AgeYears, self.age_years);
        let bmi = v.non_negative_real(Field::Bmi, self.bmi);
        let pulse_pressure = v.non_negative_integer(Field::PulsePressure, self.pulse_pressure);
        let mean_arterial_pressure =
            v.non_negative_real(Field::MeanArterialPressure, self.mean_arterial_pressure);
        let systolic_diastolic_ratio =
            v.non_negative_real(Field::SystolicDiastolicRatio, self.systolic_diastolic_ratio);
        let cholesterol = v.choice::<Level>(Field::Cholesterol, self.cholesterol, "1, 2 or 3");
        let glucose = v.choice::<Level>(Field::Glucose, self.glucose, "1, 2 or 3");
        let smoker = v.flag(Field::Smoker, self.smoker);
        let alcohol = v.flag(Field::Alcohol, self.alcohol);
        let physically_active = v.flag(Field::PhysicallyActive, self.physically_active);

        match (
            gender,
            age_years,
            bmi,
            pulse_pressure,
            mean_arterial_pressure,
            systolic_diastolic_ratio,
            cholesterol,
            glucose,
            smoker,
            alcohol,
            physically_active,
        ) {
            (
                Some(gender),
                Some(age_years),
                Some(bmi),
                Some(pulse_pressure),
                Some(mean_arterial_pressure),
                Some(systolic_diastolic_ratio),
                Some(cholesterol),
                Some(glucose),
                Some(smoker),
                Some(alcohol),
                Some(physically_active),
            ) if v.violations.is_empty() => Ok(RiskRecord {
                gender,
                age_years,
                bmi,
                pulse_pressure,
                mean_arterial_pressure,
                systolic_diastolic_ratio,
                cholesterol,
                glucose,
                smoker,
                alcohol,
                physically_active,
            }),
            _ => Err(RecordError::Invalid(v.violations)),
        }
    }
}

impl From<&RiskRecord> for RiskRecordInput {
    fn from(record: &RiskRecord) -> Self {
        let mut input = RiskRecordInput::default();
        for (field, value) in Field::ALL.iter().zip(record.to_features()) {
            input.set(*field, value);
        }
        input
    }
}

impl TryFrom<RiskRecordInput> for RiskRecord {
    type Error = RecordError;

    fn try_from(input: RiskRecordInput) -> Result<Self, Self::Error> {
        input.validate()
    }
}

/// Accumulates field violations during validation
#[derive(Default)]
struct Validator {
    violations: Vec<FieldViolation>,
}

impl Validator {
    fn reject(&mut self, field: Field, code: ViolationCode, message: impl Into<String>) {
        self.violations.push(FieldViolation::new(field, code, message));
    }

    fn present(&mut self, field: Field, value: Option<f64>) -> Option<f64> {
        match value {
            None => {
                self.reject(field, ViolationCode::Missing, "field is required");
                None
            }
            Some(x) if !x.is_finite() => {
                self.reject(field, ViolationCode::NotFinite, "value must be a finite number");
                None
            }
            Some(x) => Some(x),
        }
    }

    fn non_negative_real(&mut self, field: Field, value: Option<f64>) -> Option<f64> {
        let x = self.present(field, value)?;
        if x < 0.0 {
            self.reject(field, ViolationCode::Negative, format!("{} must not be negative", x));
            return None;
        }
        Some(x)
    }

    fn non_negative_integer(&mut self, field: Field, value: Option<f64>) -> Option<u32> {
        let x = self.non_negative_real(field, value)?;
        if x.fract() != 0.0 {
            self.reject(field, ViolationCode::NotInteger, format!("{} is not a whole number", x));
            return None;
        }
        if x > f64::from(u32::MAX) {
            self.reject(field, ViolationCode::OutOfDomain, format!("{} is too large", x));
            return None;
        }
        Some(x as u32)
    }

    fn choice<T: TryFrom<u8>>(&mut self, field: Field, value: Option<f64>, allowed: &str) -> Option<T> {
        let x = self.present(field, value)?;
        let parsed = if x.fract() == 0.0 && (0.0..=f64::from(u8::MAX)).contains(&x) {
            T::try_from(x as u8).ok()
        } else {
            None
        };
        if parsed.is_none() {
            self.reject(field, ViolationCode::OutOfDomain, format!("{} is not one of {}", x, allowed));
        }
        parsed
    }

    fn flag(&mut self, field: Field, value: Option<f64>) -> Option<bool> {
        let x = self.present(field, value)?;
        if x == 0.0 {
            Some(false)
        } else if x == 1.0 {
            Some(true)
        } else {
            self.reject(field, ViolationCode::OutOfDomain, format!("{} is not one of 0 or 1", x));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_input() -> RiskRecordInput {
        RiskRecordInput {
            gender: Some(1.0),
            age_years: Some(52.0),
            bmi: Some(27.4),
            pulse_pressure: Some(40.0),
            mean_arterial_pressure: Some(93.3),
            systolic_diastolic_ratio: Some(1.5),
            cholesterol: Some(1.0),
            glucose: Some(1.0),
            smoker: Some(0.0),
            alcohol: Some(0.0),
            physically_active: Some(1.0),
        }
    }

    fn codes(err: RecordError) -> Vec<(Field, ViolationCode)> {
        match err {
            RecordError::Invalid(v) => v.into_iter().map(|v| (v.field, v.code)).collect(),
        }
    }

    #[test]
    fn test_valid_input_builds_record() {
        let record = complete_input().validate().unwrap();
        assert_eq!(record.gender(), Gender::Female);
        assert_eq!(record.age_years(), 52);
        assert_eq!(record.pulse_pressure(), 40);
        assert_eq!(record.cholesterol(), Level::Normal);
        assert!(record.physically_active());
        assert!(!record.smoker());
    }

    #[test]
    fn test_features_follow_model_column_order() {
        let record = complete_input().validate().unwrap();
        assert_eq!(
            record.to_features(),
            [1.0, 52.0, 27.4, 40.0, 93.3, 1.5, 1.0, 1.0, 0.0, 0.0, 1.0]
        );
        for (i, field) in Field::ALL.iter().enumerate() {
            assert_eq!(field.index(), i);
            assert_eq!(field.feature_name(), FEATURE_NAMES[i]);
        }
    }

    #[test]
    fn test_all_violations_are_collected() {
        let input = RiskRecordInput {
            gender: Some(2.0),
            bmi: Some(-1.0),
            age_years: Some(40.5),
            smoker: None,
            mean_arterial_pressure: Some(f64::NAN),
            ..complete_input()
        };
        let found = codes(input.validate().unwrap_err());
        assert_eq!(
            found,
            vec![
                (Field::Gender, ViolationCode::OutOfDomain),
                (Field::AgeYears, ViolationCode::NotInteger),
                (Field::Bmi, ViolationCode::Negative),
                (Field::MeanArterialPressure, ViolationCode::NotFinite),
                (Field::Smoker, ViolationCode::Missing),
            ]
        );
    }

    #[test]
    fn test_empty_input_reports_every_field_missing() {
        let found = codes(RiskRecordInput::default().validate().unwrap_err());
        assert_eq!(found.len(), FEATURE_COUNT);
        assert!(found.iter().all(|(_, code)| *code == ViolationCode::Missing));
    }

    #[test]
    fn test_level_out_of_domain() {
        let input = RiskRecordInput {
            cholesterol: Some(0.0),
            glucose: Some(4.0),
            ..complete_input()
        };
        let found = codes(input.validate().unwrap_err());
        assert_eq!(
            found,
            vec![
                (Field::Cholesterol, ViolationCode::OutOfDomain),
                (Field::Glucose, ViolationCode::OutOfDomain),
            ]
        );
    }

    #[test]
    fn test_zero_values_are_accepted() {
        let input = RiskRecordInput {
            age_years: Some(0.0),
            bmi: Some(0.0),
            pulse_pressure: Some(0.0),
            ..complete_input()
        };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_deserialize_accepts_model_column_names() {
        let json = r#"{
            "gender": 0, "age_years": 61, "bmi": 31.2,
            "tekanan_denyut_nadi": 55, "tekanan_arteri_ratarata": 105.0,
            "sys_dsys_ratio": 1.6, "cholesterol": 3, "gluc": 2,
            "smoke": 1, "alco": 0, "active": 0
        }"#;
        let input: RiskRecordInput = serde_json::from_str(json).unwrap();
        let record = input.validate().unwrap();
        assert_eq!(record.pulse_pressure(), 55);
        assert_eq!(record.glucose(), Level::AboveNormal);
        assert!(record.smoker());
    }

    #[test]
    fn test_from_pairs_reports_unparseable_and_missing() {
        let pairs = vec![
            ("gender", "0"),
            ("age_years", "abc"),
            ("bmi", "22,5"),
            ("tekanan_denyut_nadi", "45"),
            ("mean_arterial_pressure", "90"),
            ("systolic_diastolic_ratio", "1.3"),
            ("cholesterol", "1"),
            ("glucose", ""),
            ("smoker", "0"),
            ("alcohol", "0"),
            ("physically_active", "1"),
            ("csrf", "ignored"),
        ];
        let found = codes(RiskRecord::from_pairs(pairs).unwrap_err());
        assert_eq!(
            found,
            vec![
                (Field::AgeYears, ViolationCode::Unparseable),
                (Field::Glucose, ViolationCode::Missing),
            ]
        );
    }

    #[test]
    fn test_from_pairs_builds_record() {
        let input = complete_input();
        let values: Vec<(String, String)> = Field::ALL
            .iter()
            .map(|f| (f.name().to_string(), input.get(*f).unwrap().to_string()))
            .collect();
        let record =
            RiskRecord::from_pairs(values.iter().map(|(k, v)| (k.as_str(), v.as_str()))).unwrap();
        assert_eq!(record, input.validate().unwrap());
    }

    #[test]
    fn test_record_serializes_flags_as_numbers() {
        let record = complete_input().validate().unwrap();
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["gender"], 1);
        assert_eq!(value["cholesterol"], 1);
        assert_eq!(value["physically_active"], 1);
        assert_eq!(value["smoker"], 0);
    }

    #[test]
    fn test_merge_missing_prefers_existing_values() {
        let partial = RiskRecordInput {
            bmi: Some(35.0),
            ..Default::default()
        };
        let merged = partial.merge_missing(&complete_input());
        assert_eq!(merged.bmi, Some(35.0));
        assert_eq!(merged.age_years, Some(52.0));
        assert!(merged.validate().is_ok());
    }

    #[test]
    fn test_input_round_trips_through_record() {
        let record = complete_input().validate().unwrap();
        let back = RiskRecordInput::from(&record);
        assert_eq!(back.validate().unwrap(), record);
    }
}
