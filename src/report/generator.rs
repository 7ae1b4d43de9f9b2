//! Export generation.
//!
//! Produces the downloadable forms of the latest run: a CSV ranking for
//! spreadsheets, a Markdown sustainability report, and JSON.

use crate::error::{ExportError, ExportResult};
use crate::models::{MaterialResult, QuestionnaireInput};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

/// Everything an export contains.
#[derive(Debug, Clone, Serialize)]
pub struct ExportDocument {
    pub generated_at: DateTime<Utc>,
    /// Questionnaire behind the ranking, when known.
    pub inputs: Option<QuestionnaireInput>,
    /// Latest run, best first.
    pub ranking: Vec<MaterialResult>,
    pub summary: HistorySummary,
}

/// History metrics printed alongside the ranking.
#[derive(Debug, Clone, Serialize)]
pub struct HistorySummary {
    pub runs: usize,
    pub baseline_co2: f64,
    pub baseline_cost: f64,
    pub avg_co2_reduction_percent: f64,
    pub avg_cost_savings: f64,
}

/// Export file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ExportFormat {
    /// Spreadsheet-friendly ranking (default)
    #[default]
    Csv,
    /// Printable sustainability report
    Markdown,
    /// Machine-readable document
    Json,
}

impl ExportFormat {
    /// Guess the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_lowercase().as_str() {
            "csv" => Some(ExportFormat::Csv),
            "md" | "markdown" => Some(ExportFormat::Markdown),
            "json" => Some(ExportFormat::Json),
            _ => None,
        }
    }

    pub fn default_file_name(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "EcoPackAI_Ranking.csv",
            ExportFormat::Markdown => "EcoPackAI_Report.md",
            ExportFormat::Json => "EcoPackAI_Report.json",
        }
    }
}

/// Render the document in the requested format.
pub fn generate_export(doc: &ExportDocument, format: ExportFormat) -> ExportResult<String> {
    if doc.ranking.is_empty() {
        return Err(ExportError::NothingToExport);
    }
    match format {
        ExportFormat::Csv => generate_csv_export(doc.inputs.as_ref(), &doc.ranking),
        ExportFormat::Markdown => Ok(generate_markdown_report(doc)),
        ExportFormat::Json => generate_json_report(doc),
    }
}

/// Generate the inputs and the ranking as CSV.
///
/// The file holds two titled blocks, "Inputs" then "Top N Ranking", the
/// same content a spreadsheet would keep on two sheets.
pub fn generate_csv_export(
    inputs: Option<&QuestionnaireInput>,
    rows: &[MaterialResult],
) -> ExportResult<String> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());

    writer.write_record(["Inputs"])?;
    writer.write_record(["Field", "Value"])?;
    for (field, value) in input_rows(inputs) {
        writer.write_record([field, value])?;
    }

    writer.write_record([format!("Top {} Ranking", rows.len())])?;
    writer.write_record([
        "Rank",
        "Material",
        "Predicted Cost",
        "Predicted CO2",
        "Suitability Score",
    ])?;

    for (i, row) in rows.iter().enumerate() {
        writer.write_record([
            (i + 1).to_string(),
            row.material.clone(),
            format!("{:.2}", row.predicted_cost),
            format!("{:.2}", row.predicted_co2),
            format!("{:.2}", row.suitability_score),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Csv(csv::Error::from(e.into_error())))?;
    Ok(String::from_utf8(bytes)?)
}

/// Labelled questionnaire fields, "-" for each when unknown.
fn input_rows(inputs: Option<&QuestionnaireInput>) -> [(&'static str, &'static str); 4] {
    match inputs {
        Some(inputs) => inputs.labelled_fields(),
        None => [
            ("Category", "-"),
            ("Fragility", "-"),
            ("Shipping", "-"),
            ("Priority", "-"),
        ],
    }
}

/// Escape a value for a Markdown table cell.
fn table_cell(value: &str) -> String {
    value.replace('|', "\\|")
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(doc: &ExportDocument) -> String {
    let mut output = String::new();

    output.push_str("# EcoPackAI - Sustainability Report\n\n");
    output.push_str(&format!(
        "*Generated {}*\n\n",
        doc.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    output.push_str(&generate_inputs_section(doc.inputs.as_ref()));
    output.push_str(&generate_ranking_section(&doc.ranking));
    output.push_str(&generate_summary_section(&doc.summary));

    output
}

fn generate_inputs_section(inputs: Option<&QuestionnaireInput>) -> String {
    let mut section = String::new();

    section.push_str("## Inputs\n\n");
    section.push_str("| Field | Value |\n");
    section.push_str("|:---|:---|\n");

    for (field, value) in input_rows(inputs) {
        section.push_str(&format!("| {} | {} |\n", field, value));
    }
    section.push('\n');

    section
}

fn generate_ranking_section(rows: &[MaterialResult]) -> String {
    let mut section = String::new();

    section.push_str(&format!("## Top {} Ranking\n\n", rows.len()));
    section.push_str("| # | Material | Cost | CO₂ | Score |\n");
    section.push_str("|:---:|:---|---:|---:|---:|\n");

    for (i, row) in rows.iter().enumerate() {
        section.push_str(&format!(
            "| {} | {} | {:.2} | {:.2} | {:.2} |\n",
            i + 1,
            table_cell(&row.material),
            row.predicted_cost,
            row.predicted_co2,
            row.suitability_score
        ));
    }
    section.push('\n');

    section
}

fn generate_summary_section(summary: &HistorySummary) -> String {
    let mut section = String::new();

    section.push_str("## History\n\n");
    if summary.runs == 0 {
        section.push_str("No recorded runs.\n\n");
        return section;
    }

    section.push_str(&format!(
        "- **CO₂ Reduction:** {:.2}% (baseline {:.2})\n",
        summary.avg_co2_reduction_percent, summary.baseline_co2
    ));
    section.push_str(&format!(
        "- **Cost Savings:** {:.2} (baseline {:.2})\n",
        summary.avg_cost_savings, summary.baseline_cost
    ));
    section.push_str(&format!("- Average across {} runs\n\n", summary.runs));

    section
}

/// Generate a JSON report.
pub fn generate_json_report(doc: &ExportDocument) -> ExportResult<String> {
    Ok(serde_json::to_string_pretty(doc)?)
}
