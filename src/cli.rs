//! Command line of `swisscv`
//!
//! Global flags (`-v`, `-q`, `--config`) work before or after the subcommand.

use clap::{Args, Parser, Subcommand};

use crate::export::ExportFormat;
use crate::reference::Language;

/// swisscv - Synthetic Swiss CV persona generator
///
/// Samples demographically plausible Swiss personas from canton, name and
/// occupation statistics and writes them as JSON, HTML and CSV documents.
#[derive(Parser, Debug)]
#[command(name = "swisscv")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// More log output; repeat for more (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only report errors; also hides the generate summary line
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// TOML config to use instead of the search path
    #[arg(short, long, env = "SWISSCV_CONFIG", global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a batch of personas and export them
    Generate {
        /// Number of personas to generate
        #[arg(short = 'n', long, default_value = "1")]
        count: usize,

        #[command(flatten)]
        filters: SampleFilters,

        /// Output formats, comma separated (json, html, pdf, csv)
        #[arg(short, long, value_enum, value_delimiter = ',')]
        format: Vec<ExportFormat>,

        /// Output directory
        #[arg(short, long)]
        output_dir: Option<String>,

        /// Attach a generated summary to each persona
        #[arg(long)]
        summary: bool,

        /// Worker threads for sampling (0 = one per CPU)
        #[arg(short, long, default_value = "1")]
        jobs: usize,

        /// Reference data directory
        #[arg(long, env = "SWISSCV_DATA_DIR")]
        data_dir: Option<String>,
    },

    /// Sample one persona and print it as JSON
    Sample {
        #[command(flatten)]
        filters: SampleFilters,

        /// Attach a generated summary
        #[arg(long)]
        summary: bool,

        /// Reference data directory
        #[arg(long, env = "SWISSCV_DATA_DIR")]
        data_dir: Option<String>,
    },

    /// Reference data inspection
    Data {
        #[command(subcommand)]
        subcommand: DataSubcommand,
    },

    /// Inspect, create or check the TOML configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Print the version, git revision and toolchain
    Version,
}

/// Options shared by `generate` and `sample`
#[derive(Args, Debug, Clone, Default)]
pub struct SampleFilters {
    /// Seed for the first persona (defaults to the current time)
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Force a canton code (e.g. ZH, GE); "all" samples by population
    #[arg(long)]
    pub canton: Option<String>,

    /// Preferred industry (e.g. technology, finance); "all" for any
    #[arg(long)]
    pub industry: Option<String>,

    /// Force the persona language (de, fr, it, en)
    #[arg(short, long)]
    pub language: Option<Language>,
}

impl SampleFilters {
    /// Canton filter with "all" treated as unset
    pub fn canton(&self) -> Option<&str> {
        unset_if_all(self.canton.as_deref())
    }

    /// Industry filter with "all" treated as unset
    pub fn industry(&self) -> Option<&str> {
        unset_if_all(self.industry.as_deref())
    }
}

fn unset_if_all(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
}

/// Reference data subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum DataSubcommand {
    /// Load every table and report problems
    Validate {
        /// Reference data directory
        #[arg(long, env = "SWISSCV_DATA_DIR")]
        data_dir: Option<String>,
    },

    /// Show row counts and where each table comes from
    Info {
        /// Reference data directory
        #[arg(long, env = "SWISSCV_DATA_DIR")]
        data_dir: Option<String>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigSubcommand {
    /// Print the effective configuration after env overrides
    Show,

    /// Write a commented default config
    Init {
        /// Target file [default: ~/.swisscv/config.toml]
        #[arg(short, long)]
        path: Option<String>,

        /// Replace a file that already exists
        #[arg(short, long)]
        force: bool,
    },

    /// Load and check the configuration, then exit
    Validate,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_generate_defaults() {
        let cli = Cli::parse_from(["swisscv", "generate"]);
        match cli.command {
            Commands::Generate {
                count,
                filters,
                format,
                output_dir,
                summary,
                jobs,
                ..
            } => {
                assert_eq!(count, 1);
                assert!(filters.seed.is_none());
                assert!(format.is_empty());
                assert!(output_dir.is_none());
                assert!(!summary);
                assert_eq!(jobs, 1);
            }
            _ => panic!("Expected Generate command"),
        }
    }

    #[test]
    fn test_generate_with_options() {
        let cli = Cli::parse_from([
            "swisscv",
            "generate",
            "--count",
            "25",
            "--seed",
            "42",
            "--canton",
            "GE",
            "--language",
            "fr",
            "--format",
            "json,html,csv",
            "--output-dir",
            "/tmp/out",
            "--jobs",
            "4",
            "--summary",
        ]);
        match cli.command {
            Commands::Generate {
                count,
                filters,
                format,
                output_dir,
                summary,
                jobs,
                ..
            } => {
                assert_eq!(count, 25);
                assert_eq!(filters.seed, Some(42));
                assert_eq!(filters.canton(), Some("GE"));
                assert_eq!(filters.language, Some(Language::Fr));
                assert_eq!(
                    format,
                    vec![ExportFormat::Json, ExportFormat::Html, ExportFormat::Csv]
                );
                assert_eq!(output_dir.as_deref(), Some("/tmp/out"));
                assert!(summary);
                assert_eq!(jobs, 4);
            }
            _ => panic!("Expected Generate command"),
        }
    }

    #[test]
    fn test_all_means_unset() {
        let cli = Cli::parse_from(["swisscv", "sample", "--canton", "all", "--industry", "ALL"]);
        match cli.command {
            Commands::Sample { filters, .. } => {
                assert!(filters.canton().is_none());
                assert!(filters.industry().is_none());
            }
            _ => panic!("Expected Sample command"),
        }
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["swisscv", "generate", "--format", "docx"]).is_err());
        assert!(Cli::try_parse_from(["swisscv", "generate", "--format", "pdf,csv"]).is_ok());
    }

    #[test]
    fn test_rejects_unknown_language() {
        assert!(Cli::try_parse_from(["swisscv", "sample", "--language", "rm"]).is_err());
    }

    #[test]
    fn test_data_subcommands() {
        let cli = Cli::parse_from(["swisscv", "data", "info", "--data-dir", "./data"]);
        match cli.command {
            Commands::Data {
                subcommand: DataSubcommand::Info { data_dir },
            } => assert_eq!(data_dir.as_deref(), Some("./data")),
            _ => panic!("Expected Data Info command"),
        }

        let cli = Cli::parse_from(["swisscv", "data", "validate"]);
        assert!(matches!(
            cli.command,
            Commands::Data {
                subcommand: DataSubcommand::Validate { .. }
            }
        ));
    }

    #[test]
    fn test_verbose_flags() {
        let cli = Cli::parse_from(["swisscv", "-vv", "version"]);
        assert_eq!(cli.verbose, 2);
        assert!(!cli.quiet);
    }

    #[test]
    fn test_quiet_flag() {
        let cli = Cli::parse_from(["swisscv", "--quiet", "version"]);
        assert!(cli.quiet);
    }

    #[test]
    fn test_global_config() {
        let cli = Cli::parse_from(["swisscv", "config", "show", "--config", "/etc/x.toml"]);
        assert_eq!(cli.config.as_deref(), Some("/etc/x.toml"));
        assert!(matches!(
            cli.command,
            Commands::Config {
                subcommand: ConfigSubcommand::Show
            }
        ));
    }

    #[test]
    fn test_config_init() {
        let cli = Cli::parse_from(["swisscv", "config", "init", "--force"]);
        match cli.command {
            Commands::Config {
                subcommand: ConfigSubcommand::Init { path, force },
            } => {
                assert!(path.is_none());
                assert!(force);
            }
            _ => panic!("Expected Config Init command"),
        }
    }
}
