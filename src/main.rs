//! swisscv - Synthetic Swiss CV persona generator
//!
//! Entry point for the `swisscv` binary: loads configuration, sets up
//! logging and dispatches to the generate, sample, data and config commands.

mod cli;
mod config;
mod error;
mod export;
mod logging;
mod persona;
mod reference;
mod sampling;
mod summary;
mod version;

use std::time::Duration;

use chrono::Utc;
use clap::Parser;
use tracing::{debug, info};

use crate::cli::{Cli, Commands, ConfigSubcommand, DataSubcommand, SampleFilters};
use crate::config::GeneratorConfig;
use crate::error::{Error, Result};
use crate::export::{ExportFormat, Exporter};
use crate::persona::{PersonaGenerator, PersonaRecord};
use crate::reference::{ReferenceDataProvider, SourceName};
use crate::sampling::{AgeRange, PersonaSampler, SampleRequest};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprint!("{}", e.format_for_terminal());
        std::process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<()> {
    // Commands that don't need full logging
    match &cli.command {
        Commands::Version => {
            version::print_version();
            return Ok(());
        }
        Commands::Config { subcommand } => {
            logging::init_simple(tracing::Level::WARN)?;
            return handle_config_command(subcommand.clone(), cli.config.as_deref());
        }
        _ => {}
    }

    let mut config = GeneratorConfig::load(cli.config.as_deref())?;
    apply_cli_overrides(&mut config, &cli.command);

    // The guards must be kept alive for the lifetime of the program
    let _log_guards = logging::init_logging(&config.logging, cli.verbose, cli.quiet)?;

    let build = version::build_info();
    debug!(
        version = %build.full_version(),
        target = %build.target,
        profile = %build.profile,
        "Starting swisscv"
    );

    match cli.command {
        Commands::Generate {
            count,
            filters,
            format,
            jobs,
            ..
        } => run_generate(&config, count, &filters, &format, jobs, cli.quiet),
        Commands::Sample { filters, .. } => run_sample(&config, &filters),
        Commands::Data { subcommand } => match subcommand {
            DataSubcommand::Validate { .. } => run_data_validate(&config),
            DataSubcommand::Info { .. } => run_data_info(&config),
        },
        Commands::Version | Commands::Config { .. } => {
            // Already handled above
            unreachable!();
        }
    }
}

/// CLI flags take precedence over environment and file settings
fn apply_cli_overrides(config: &mut GeneratorConfig, command: &Commands) {
    let data_dir = match command {
        Commands::Generate { data_dir, .. } | Commands::Sample { data_dir, .. } => data_dir,
        Commands::Data { subcommand } => match subcommand {
            DataSubcommand::Validate { data_dir } | DataSubcommand::Info { data_dir } => data_dir,
        },
        _ => &None,
    };
    if let Some(dir) = data_dir {
        config.data.dir = shellexpand::tilde(dir).into_owned();
    }

    match command {
        Commands::Generate {
            output_dir,
            summary,
            ..
        } => {
            if let Some(dir) = output_dir {
                config.output.dir = shellexpand::tilde(dir).into_owned();
            }
            if *summary {
                config.summary.enabled = true;
            }
        }
        Commands::Sample { summary: true, .. } => {
            config.summary.enabled = true;
        }
        _ => {}
    }
}

/// Snapshot the reference data and build the persona generator
fn build_generator(config: &GeneratorConfig) -> Result<PersonaGenerator> {
    let provider = ReferenceDataProvider::from_settings(&config.data);
    let data = provider.snapshot()?;
    info!(
        data_dir = %config.data.dir,
        cantons = data.cantons.len(),
        occupations = data.occupations.len(),
        companies = data.companies.len(),
        "Reference data loaded"
    );

    let ages = AgeRange::new(config.sampling.min_age, config.sampling.max_age);
    Ok(PersonaGenerator::new(
        PersonaSampler::new(data).with_age_range(ages),
    ))
}

fn build_request(filters: &SampleFilters) -> SampleRequest {
    let seed = filters
        .seed
        .unwrap_or_else(|| Utc::now().timestamp().unsigned_abs());
    let mut request = SampleRequest::new(seed);
    if let Some(canton) = filters.canton() {
        request = request.with_canton(canton);
    }
    if let Some(industry) = filters.industry() {
        request = request.with_industry(industry);
    }
    if let Some(language) = filters.language {
        request = request.with_language(language);
    }
    request
}

/// Attach summaries on a tokio runtime that lives only for this step
fn attach_summaries(
    config: &GeneratorConfig,
    generator: &PersonaGenerator,
    personas: Vec<PersonaRecord>,
) -> Result<Vec<PersonaRecord>> {
    let backend = summary::build_generator(&config.summary)?;
    let timeout = Duration::from_secs(config.summary.timeout_secs);
    let concurrency = num_cpus::get().min(8);
    info!(
        backend = backend.name(),
        personas = personas.len(),
        concurrency,
        "Generating summaries"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(concurrency)
        .thread_name("swisscv-summary")
        .build()
        .map_err(|e| Error::Internal(format!("Failed to create async runtime: {}", e)))?;

    let assembler = *generator.assembler();
    Ok(runtime.block_on(assembler.attach_summaries(personas, backend, timeout, concurrency)))
}

fn run_generate(
    config: &GeneratorConfig,
    count: usize,
    filters: &SampleFilters,
    formats: &[ExportFormat],
    jobs: usize,
    quiet: bool,
) -> Result<()> {
    let generator = build_generator(config)?;
    let request = build_request(filters);
    info!(
        count,
        seed = request.seed,
        canton = request.canton_override.as_deref().unwrap_or("all"),
        industry = request.industry_preference.as_deref().unwrap_or("all"),
        jobs,
        "Generating personas"
    );

    let mut personas = generator.generate_batch(&request, count, jobs)?;
    if config.summary.enabled {
        personas = attach_summaries(config, &generator, personas)?;
    }

    let formats = if formats.is_empty() {
        config.output.formats.clone()
    } else {
        formats.to_vec()
    };
    let exporter = Exporter::new(config.output_dir(), &formats);
    let written = exporter.export(&personas)?;

    if !quiet {
        println!(
            "Generated {} persona(s), {} file(s) in {}",
            personas.len(),
            written.len(),
            exporter.output_dir().display()
        );
    }
    Ok(())
}

fn run_sample(config: &GeneratorConfig, filters: &SampleFilters) -> Result<()> {
    let generator = build_generator(config)?;
    let request = build_request(filters);
    let mut persona = generator.generate(&request)?;

    if config.summary.enabled {
        persona = attach_summaries(config, &generator, vec![persona])?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Internal("summary step returned no persona".to_string()))?;
    }

    println!("{}", serde_json::to_string_pretty(&persona)?);
    Ok(())
}

fn source_rows(provider: &ReferenceDataProvider, source: SourceName) -> Result<usize> {
    Ok(match source {
        SourceName::Cantons => provider.cantons()?.len(),
        SourceName::Occupations => provider.occupations()?.len(),
        SourceName::Companies => provider.companies()?.len(),
        SourceName::GivenNames(lang) => provider
            .given_names()?
            .get(&lang)
            .map(|table| table.len())
            .unwrap_or(0),
        SourceName::Surnames => provider.surnames()?.len(),
    })
}

/// Load every table in strict mode; the first broken table fails the command
fn run_data_validate(config: &GeneratorConfig) -> Result<()> {
    let mut settings = config.data.clone();
    settings.strict = true;
    let provider = ReferenceDataProvider::from_settings(&settings);

    println!("Validating reference data in {}", config.data.dir);
    let mut first_error = None;
    for source in SourceName::all() {
        match source_rows(&provider, source) {
            Ok(rows) => println!(
                "  ok     {:<12} {:>6} rows  ({})",
                source.to_string(),
                rows,
                provider.origin(source)
            ),
            Err(e) => {
                println!("  FAILED {:<12} {}", source.to_string(), e);
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => {
            println!("Reference data is valid.");
            Ok(())
        }
    }
}

fn run_data_info(config: &GeneratorConfig) -> Result<()> {
    let provider = ReferenceDataProvider::from_settings(&config.data);

    println!("Data directory: {}", config.data.dir);
    println!("Bundled fallback: {}", config.data.bundled_fallback);
    println!();
    println!("  {:<12} {:>6}  source", "table", "rows");
    for source in SourceName::all() {
        let rows = match source_rows(&provider, source) {
            Ok(rows) => rows.to_string(),
            Err(e) => format!("error: {}", e),
        };
        println!(
            "  {:<12} {:>6}  {}",
            source.to_string(),
            rows,
            provider.origin(source)
        );
    }

    let cantons = provider.cantons()?;
    println!();
    println!("  canton  lang  population  name");
    for canton in cantons.iter() {
        println!(
            "  {:<6}  {:<4}  {:>10}  {}",
            canton.code,
            canton.primary_language.code(),
            canton.population,
            canton.name
        );
    }
    Ok(())
}

/// Handle configuration subcommands
fn handle_config_command(subcommand: ConfigSubcommand, config_path: Option<&str>) -> Result<()> {
    match subcommand {
        ConfigSubcommand::Show => {
            let cfg = GeneratorConfig::load(config_path)?;
            println!("{}", toml::to_string_pretty(&cfg)?);
        }
        ConfigSubcommand::Init { path, force } => {
            let written = config::init_config(path.as_deref(), force)?;
            println!("Configuration written to {}", written.display());
        }
        ConfigSubcommand::Validate => {
            GeneratorConfig::load(config_path)?;
            println!("Configuration is valid.");
        }
    }

    Ok(())
}
