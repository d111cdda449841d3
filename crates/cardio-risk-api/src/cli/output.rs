//! Output formatting for the CLI
//!
//! JSON and YAML for machines, a colored summary for people. The summary
//! uses the same wording as the web form.

use clap::ValueEnum;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

use cardio_risk_core::{Assessment, Explanation};

use super::CliError;

/// Output format options for CLI results
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Default)]
pub enum OutputFormat {
    /// Human-readable summary with colors
    #[default]
    Table,
    /// JSON format for machine processing
    Json,
    /// YAML format
    Yaml,
}

fn render_structured<T: Serialize>(value: &T, format: OutputFormat) -> Result<bool, CliError> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)
                .map_err(|e| CliError::SerializationError(e.to_string()))?;
            println!("{}", json);
            Ok(true)
        }
        OutputFormat::Yaml => {
            let yaml = serde_yaml::to_string(value)
                .map_err(|e| CliError::SerializationError(e.to_string()))?;
            println!("{}", yaml);
            Ok(true)
        }
        OutputFormat::Table => Ok(false),
    }
}

/// One explanation in CLI output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplanationOutput {
    pub code: String,
    pub field: String,
    pub text: String,
}

impl From<&Explanation> for ExplanationOutput {
    fn from(explanation: &Explanation) -> Self {
        Self {
            code: explanation.code.as_str().to_string(),
            field: explanation.field.name().to_string(),
            text: explanation.text.clone(),
        }
    }
}

/// Result of the `assess` command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentOutput {
    /// Machine label, `at_risk` or `not_at_risk`
    pub label: String,
    /// Verdict as shown to users
    pub verdict: String,
    pub at_risk: bool,
    pub probability: f64,
    pub explanations_enabled: bool,
    pub explanations: Vec<ExplanationOutput>,
    pub duration_us: u64,
}

impl AssessmentOutput {
    pub fn from_assessment(assessment: &Assessment, explanations_enabled: bool) -> Self {
        Self {
            label: assessment.label.as_str().to_string(),
            verdict: assessment.label.to_string(),
            at_risk: assessment.is_at_risk(),
            probability: assessment.probability,
            explanations_enabled,
            explanations: assessment.explanations.iter().map(Into::into).collect(),
            duration_us: assessment.duration_us,
        }
    }

    /// Render output in the specified format
    pub fn render(&self, format: OutputFormat) -> Result<(), CliError> {
        if render_structured(self, format)? {
            return Ok(());
        }

        let mut stdout = io::stdout();
        let verdict = if self.at_risk {
            self.verdict.red().bold()
        } else {
            self.verdict.green().bold()
        };

        writeln!(stdout).ok();
        writeln!(stdout, "{} {}", "Prediksi:".bold(), verdict).ok();
        writeln!(
            stdout,
            "{}",
            format!("probability {:.3}", self.probability).dimmed()
        )
        .ok();

        if self.explanations_enabled {
            writeln!(stdout).ok();
            writeln!(stdout, "{}", "Alasan:".bold()).ok();
            for explanation in &self.explanations {
                writeln!(stdout, "- {}", explanation.text).ok();
            }
        }
        writeln!(stdout).ok();
        Ok(())
    }
}

/// Result of the `explain` command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplainOutput {
    pub count: usize,
    pub explanations: Vec<ExplanationOutput>,
}

impl ExplainOutput {
    pub fn from_explanations(explanations: &[Explanation]) -> Self {
        Self {
            count: explanations.len(),
            explanations: explanations.iter().map(Into::into).collect(),
        }
    }

    pub fn render(&self, format: OutputFormat) -> Result<(), CliError> {
        if render_structured(self, format)? {
            return Ok(());
        }

        let mut stdout = io::stdout();
        writeln!(stdout).ok();
        writeln!(stdout, "{}", "Alasan:".bold()).ok();
        if self.explanations.is_empty() {
            writeln!(stdout, "{}", "(tidak ada)".dimmed()).ok();
        }
        for explanation in &self.explanations {
            writeln!(
                stdout,
                "- {} {}",
                explanation.text,
                format!("[{}]", explanation.code).dimmed()
            )
            .ok();
        }
        writeln!(stdout).ok();
        Ok(())
    }
}

/// One fetched artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactOutput {
    pub name: String,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub sha256: String,
    pub size_bytes: usize,
}

/// Result of the `fetch` command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchOutput {
    pub model_kind: String,
    pub artifacts: Vec<ArtifactOutput>,
}

impl FetchOutput {
    pub fn render(&self, format: OutputFormat) -> Result<(), CliError> {
        if render_structured(self, format)? {
            return Ok(());
        }

        let mut stdout = io::stdout();
        writeln!(stdout).ok();
        writeln!(stdout, "{}", "Model Artifacts".cyan().bold()).ok();
        writeln!(stdout, "{}", "=".repeat(60)).ok();
        for artifact in &self.artifacts {
            writeln!(stdout).ok();
            writeln!(stdout, "{} {}", "✓".green(), artifact.name.bold()).ok();
            writeln!(stdout, "  source: {}", artifact.source).ok();
            if let Some(path) = &artifact.path {
                writeln!(stdout, "  path:   {}", path).ok();
            }
            writeln!(stdout, "  sha256: {}", artifact.sha256).ok();
            writeln!(stdout, "  size:   {} bytes", artifact.size_bytes).ok();
        }
        writeln!(stdout).ok();
        writeln!(stdout, "classifier: {}", self.model_kind).ok();
        writeln!(stdout).ok();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardio_risk_core::{ExplanationCode, Field, RiskLabel};

    fn assessment() -> Assessment {
        Assessment {
            label: RiskLabel::AtRisk,
            probability: 0.91,
            explanations: vec![Explanation::new(
                ExplanationCode::Smoking,
                Field::Smoker,
                "Kebiasaan merokok",
            )],
            duration_us: 35,
        }
    }

    #[test]
    fn test_assessment_output() {
        let output = AssessmentOutput::from_assessment(&assessment(), true);
        assert_eq!(output.label, "at_risk");
        assert_eq!(output.verdict, "Berisiko Terkena");
        assert!(output.at_risk);
        assert_eq!(output.explanations[0].code, "SMOKING");
        assert_eq!(output.explanations[0].field, "smoker");
    }

    #[test]
    fn test_assessment_output_serializes() {
        let output = AssessmentOutput::from_assessment(&assessment(), true);
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["verdict"], "Berisiko Terkena");
        assert_eq!(json["explanations"][0]["text"], "Kebiasaan merokok");

        let yaml = serde_yaml::to_string(&output).unwrap();
        assert!(yaml.contains("label: at_risk"));
    }

    #[test]
    fn test_explain_output_count() {
        let output = ExplainOutput::from_explanations(&assessment().explanations);
        assert_eq!(output.count, 1);
    }

    #[test]
    fn test_render_all_formats() {
        let output = AssessmentOutput::from_assessment(&assessment(), false);
        for format in [OutputFormat::Table, OutputFormat::Json, OutputFormat::Yaml] {
            assert!(output.render(format).is_ok());
        }
    }
}
