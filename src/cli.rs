//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::{FormValues, Level, ProductCategory, ShippingType};
use crate::report::ExportFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// EcoPackAI - sustainable packaging recommendations from the terminal
///
/// Ask the EcoPackAI service which packaging materials suit a product,
/// track how the recommendations compare against a baseline across runs,
/// and export the latest ranking.
///
/// Examples:
///   ecopack recommend --category electronics --fragility high --shipping international --priority high
///   ecopack recommend --chart
///   ecopack history
///   ecopack trends --metric co2
///   ecopack export --output ranking.csv
///   ecopack --server http://ecopack.local:5000 usage
///   ecopack --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .ecopack.toml in the current directory
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// EcoPackAI service URL
    ///
    /// Can also be set via ECOPACK_SERVER env var or .ecopack.toml config.
    #[arg(short, long, global = true, value_name = "URL", env = "ECOPACK_SERVER")]
    pub server: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Directory holding the saved form values
    #[arg(long, global = true, value_name = "DIR")]
    pub state_dir: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Generate a default .ecopack.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Submit the questionnaire and show the recommended materials
    ///
    /// Fields not given on the command line are taken from the last
    /// submission.
    Recommend(RecommendArgs),

    /// Show the recorded runs and the average metrics
    History,

    /// Show the per-run CO₂ reduction and cost savings trends
    Trends {
        /// Which trend to show
        #[arg(long, default_value = "both")]
        metric: TrendMetric,
    },

    /// Chart the recorded materials
    Chart {
        /// Which chart to draw
        #[arg(default_value = "comparison")]
        kind: ChartKind,
    },

    /// Show how often each material has been recommended
    Usage,

    /// Export the latest ranking
    Export(ExportArgs),

    /// Clear the recorded history, on the server and locally
    ClearHistory,

    /// Forget the saved form values
    ClearForm,

    /// Check that the service is reachable
    Health,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct RecommendArgs {
    /// Product category
    #[arg(long, value_name = "CATEGORY")]
    pub category: Option<ProductCategory>,

    /// How fragile the product is
    #[arg(long, value_name = "LEVEL")]
    pub fragility: Option<Level>,

    /// Domestic or international shipping
    #[arg(long, value_name = "TYPE")]
    pub shipping: Option<ShippingType>,

    /// Weight given to sustainability
    #[arg(long, value_name = "LEVEL")]
    pub priority: Option<Level>,

    /// Also draw the material comparison chart
    #[arg(long)]
    pub chart: bool,

    /// Write the ranking to this file after a successful run
    #[arg(long, value_name = "FILE")]
    pub export: Option<PathBuf>,

    /// Export format (guessed from the file extension when omitted)
    #[arg(long, value_name = "FORMAT", requires = "export")]
    pub format: Option<ExportFormat>,
}

impl RecommendArgs {
    /// Questionnaire fields given on the command line.
    pub fn form_values(&self) -> FormValues {
        FormValues {
            product_category: self.category,
            fragility: self.fragility,
            shipping_type: self.shipping,
            sustainability_priority: self.priority,
        }
    }
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct ExportArgs {
    /// Output file path
    ///
    /// Defaults to EcoPackAI_Ranking.csv (or the report name for other formats)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Export format (guessed from the file extension when omitted)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<ExportFormat>,
}

/// Trend selection for `trends`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum TrendMetric {
    Co2,
    Cost,
    #[default]
    Both,
}

/// Chart selection for `chart`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ChartKind {
    /// Average suitability score per material
    #[default]
    Comparison,
    /// Materials ordered by average suitability score, best first
    Ranking,
    /// CO₂ reduction against the baseline per material
    Co2,
    /// Cost savings against the baseline per material
    Cost,
}

/// Pick the export format: explicit flag, then file extension, then CSV.
pub fn resolve_export_format(format: Option<ExportFormat>, path: Option<&PathBuf>) -> ExportFormat {
    format
        .or_else(|| path.and_then(|p| ExportFormat::from_path(p)))
        .unwrap_or_default()
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.command.is_none() {
            return Err("A command is required (see --help)".to_string());
        }

        if let Some(ref server) = self.server {
            if !server.starts_with("http://") && !server.starts_with("https://") {
                return Err("Server URL must start with 'http://' or 'https://'".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        // Validate timeout if provided
        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            command: Some(Command::History),
            config: None,
            server: None,
            timeout: None,
            state_dir: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_recommend() {
        let args = Args::try_parse_from([
            "ecopack",
            "recommend",
            "--category",
            "fragile_goods",
            "--fragility",
            "high",
            "--shipping",
            "international",
        ])
        .unwrap();

        match args.command {
            Some(Command::Recommend(rec)) => {
                let form = rec.form_values();
                assert_eq!(form.product_category, Some(ProductCategory::FragileGoods));
                assert_eq!(form.fragility, Some(Level::High));
                assert_eq!(form.shipping_type, Some(ShippingType::International));
                assert_eq!(form.sustainability_priority, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = Args::try_parse_from([
            "ecopack",
            "usage",
            "--server",
            "https://ecopack.example.com",
            "--timeout",
            "5",
        ])
        .unwrap();
        assert_eq!(args.server.as_deref(), Some("https://ecopack.example.com"));
        assert_eq!(args.timeout, Some(5));
    }

    #[test]
    fn test_validation_requires_command() {
        let mut args = make_args();
        args.command = None;
        assert!(args.validate().is_err());

        args.init_config = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_server() {
        let mut args = make_args();
        args.server = Some("localhost:5000".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_timeout() {
        let mut args = make_args();
        args.timeout = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_resolve_export_format() {
        let md = PathBuf::from("report.md");
        assert_eq!(
            resolve_export_format(None, Some(&md)),
            ExportFormat::Markdown
        );
        assert_eq!(
            resolve_export_format(Some(ExportFormat::Json), Some(&md)),
            ExportFormat::Json
        );
        assert_eq!(resolve_export_format(None, None), ExportFormat::Csv);
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
