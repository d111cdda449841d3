//! HTML form and result page
//!
//! Inputs are named after the model columns (`tekanan_denyut_nadi`, `gluc`,
//! ...) so a submitted form maps onto [`RiskRecord::from_pairs`] directly.
//!
//! [`RiskRecord::from_pairs`]: cardio_risk_core::RiskRecord::from_pairs

use cardio_risk_core::{Assessment, Field, FieldViolation};
use std::collections::HashMap;
use std::fmt::Write;

/// Page title
pub const TITLE: &str = "Deteksi Risiko Kardiovaskular";

/// Submit button caption
pub const SUBMIT_LABEL: &str = "Prediksi Risiko Kardiovaskular";

const LEVEL_OPTIONS: &[(&str, &str)] = &[
    ("1", "Normal"),
    ("2", "Di atas Normal"),
    ("3", "Sangat Di atas Normal"),
];

const FLAG_OPTIONS: &[(&str, &str)] = &[("0", "Tidak"), ("1", "Ya")];

const GENDER_OPTIONS: &[(&str, &str)] = &[("0", "Pria"), ("1", "Wanita")];

enum Widget {
    Select(&'static [(&'static str, &'static str)]),
    Number { step: &'static str },
}

fn label(field: Field) -> &'static str {
    match field {
        Field::Gender => "Jenis Kelamin",
        Field::AgeYears => "Usia (tahun)",
        Field::Bmi => "BMI",
        Field::PulsePressure => "Tekanan Denyut Nadi",
        Field::MeanArterialPressure => "Tekanan Arteri Rata-rata",
        Field::SystolicDiastolicRatio => "Rasio Tekanan Sistolik-Diastolik",
        Field::Cholesterol => "Kolesterol",
        Field::Glucose => "Glukosa",
        Field::Smoker => "Merokok",
        Field::Alcohol => "Konsumsi Alkohol",
        Field::PhysicallyActive => "Aktivitas Fisik",
    }
}

fn widget(field: Field) -> Widget {
    match field {
        Field::Gender => Widget::Select(GENDER_OPTIONS),
        Field::Cholesterol | Field::Glucose => Widget::Select(LEVEL_OPTIONS),
        Field::Smoker | Field::Alcohol | Field::PhysicallyActive => Widget::Select(FLAG_OPTIONS),
        Field::AgeYears | Field::PulsePressure => Widget::Number { step: "1" },
        Field::Bmi | Field::MeanArterialPressure => Widget::Number { step: "0.1" },
        Field::SystolicDiastolicRatio => Widget::Number { step: "0.01" },
    }
}

/// Escape text for HTML content and attribute values
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// State of the form page for one render
#[derive(Debug, Clone, Default)]
pub struct FormPage {
    values: HashMap<Field, String>,
    violations: Vec<FieldViolation>,
    assessment: Option<Assessment>,
    failure: Option<String>,
}

impl FormPage {
    /// Empty form
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep submitted values so the user does not have to retype them
    pub fn with_values<'a, I>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        for (key, value) in pairs {
            if let Some(field) = Field::from_key(key.trim()) {
                self.values.insert(field, value.trim().to_string());
            }
        }
        self
    }

    pub fn with_violations(mut self, violations: Vec<FieldViolation>) -> Self {
        self.violations = violations;
        self
    }

    pub fn with_assessment(mut self, assessment: Assessment) -> Self {
        self.assessment = Some(assessment);
        self
    }

    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Render the whole page
    ///
    /// The reason list is shown only when `explanations_enabled` is set.
    pub fn render(&self, explanations_enabled: bool) -> String {
        let mut body = String::new();

        if !self.violations.is_empty() {
            body.push_str("<div class=\"errors\"><p>Input tidak valid:</p><ul>");
            for v in &self.violations {
                let _ = write!(
                    body,
                    "<li>{}: {}</li>",
                    label(v.field),
                    escape(&v.message)
                );
            }
            body.push_str("</ul></div>");
        }

        if let Some(message) = &self.failure {
            let _ = write!(body, "<div class=\"errors\"><p>{}</p></div>", escape(message));
        }

        body.push_str("<form method=\"post\" action=\"/\"><div class=\"grid\">");
        for field in Field::ALL {
            self.render_field(&mut body, field);
        }
        let _ = write!(
            body,
            "</div><button type=\"submit\">{}</button></form>",
            SUBMIT_LABEL
        );

        if let Some(assessment) = &self.assessment {
            render_result(&mut body, assessment, explanations_enabled);
        }

        format!(
            r#"<!DOCTYPE html>
<html lang="id">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>
body {{ font-family: sans-serif; max-width: 960px; margin: 2rem auto; padding: 0 1rem; }}
.grid {{ display: grid; grid-template-columns: repeat(3, 1fr); gap: 1rem; margin-bottom: 1rem; }}
label {{ display: block; font-size: 0.9rem; margin-bottom: 0.25rem; }}
input, select {{ width: 100%; padding: 0.4rem; box-sizing: border-box; }}
.invalid input, .invalid select {{ border: 1px solid #c0392b; }}
.errors {{ color: #c0392b; }}
.result {{ margin-top: 1.5rem; padding: 1rem; border-radius: 4px; background: #f4f6f7; }}
.result.at-risk {{ background: #fdecea; }}
</style>
</head>
<body>
<h1>{title}</h1>
{body}
</body>
</html>
"#,
            title = TITLE,
            body = body
        )
    }

    fn render_field(&self, out: &mut String, field: Field) {
        let name = field.feature_name();
        let current = self.values.get(&field).map(String::as_str);
        let invalid = self.violations.iter().any(|v| v.field == field);
        let class = if invalid { " class=\"invalid\"" } else { "" };

        let _ = write!(
            out,
            "<div{}><label for=\"{}\">{}</label>",
            class,
            name,
            label(field)
        );
        match widget(field) {
            Widget::Select(options) => {
                let _ = write!(out, "<select id=\"{0}\" name=\"{0}\">", name);
                for (value, caption) in options {
                    let selected = if current == Some(*value) { " selected" } else { "" };
                    let _ = write!(
                        out,
                        "<option value=\"{}\"{}>{}</option>",
                        value, selected, caption
                    );
                }
                out.push_str("</select>");
            }
            Widget::Number { step } => {
                let _ = write!(
                    out,
                    "<input type=\"number\" id=\"{0}\" name=\"{0}\" min=\"0\" step=\"{1}\" value=\"{2}\">",
                    name,
                    step,
                    escape(current.unwrap_or("0"))
                );
            }
        }
        out.push_str("</div>");
    }
}

fn render_result(out: &mut String, assessment: &Assessment, explanations_enabled: bool) {
    let class = if assessment.is_at_risk() {
        "result at-risk"
    } else {
        "result"
    };
    let _ = write!(
        out,
        "<section class=\"{}\"><p class=\"prediction\">Prediksi: {}</p>",
        class, assessment.label
    );
    if explanations_enabled {
        out.push_str("<p>Alasan:</p><ul class=\"reasons\">");
        for reason in assessment.reasons() {
            let _ = write!(out, "<li>{}</li>", escape(reason));
        }
        out.push_str("</ul>");
    }
    out.push_str("</section>");
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardio_risk_core::{Explanation, ExplanationCode, RiskLabel, ViolationCode};

    fn assessment(label: RiskLabel) -> Assessment {
        Assessment {
            label,
            probability: 0.7,
            explanations: vec![Explanation::new(
                ExplanationCode::HighPulsePressure,
                Field::PulsePressure,
                "Denyut nadi tinggi",
            )],
            duration_us: 10,
        }
    }

    #[test]
    fn test_empty_form_has_all_inputs() {
        let html = FormPage::new().render(true);
        assert!(html.contains(TITLE));
        assert!(html.contains(SUBMIT_LABEL));
        for field in Field::ALL {
            assert!(html.contains(&format!("name=\"{}\"", field.feature_name())));
            assert!(html.contains(label(field)));
        }
        assert!(html.contains(">Pria<"));
        assert!(html.contains(">Sangat Di atas Normal<"));
        assert!(!html.contains("Prediksi:"));
    }

    #[test]
    fn test_result_with_reasons() {
        let html = FormPage::new()
            .with_assessment(assessment(RiskLabel::AtRisk))
            .render(true);
        assert!(html.contains("Prediksi: Berisiko Terkena"));
        assert!(html.contains("Alasan:"));
        assert!(html.contains("<li>Denyut nadi tinggi</li>"));
    }

    #[test]
    fn test_result_without_reasons() {
        let html = FormPage::new()
            .with_assessment(assessment(RiskLabel::NotAtRisk))
            .render(false);
        assert!(html.contains("Prediksi: Tidak Berisiko Terkena"));
        assert!(!html.contains("Alasan:"));
    }

    #[test]
    fn test_violations_and_values_are_kept() {
        let html = FormPage::new()
            .with_values([("bmi", "<b>"), ("gluc", "3")])
            .with_violations(vec![FieldViolation::new(
                Field::Bmi,
                ViolationCode::Unparseable,
                "'<b>' is not a number",
            )])
            .render(true);
        assert!(html.contains("BMI: &#39;&lt;b&gt;&#39; is not a number"));
        assert!(html.contains("value=\"&lt;b&gt;\""));
        assert!(html.contains("<option value=\"3\" selected>"));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a & \"b\""), "a &amp; &quot;b&quot;");
    }
}
