//! `tmatch run | validate | columns` — config-driven two-table reconciliation.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use serde::Serialize;

use tablematch_io::{export_result, load_pair, read_headers, IoError};
use tablematch_recon::{run, DatasetConfig, ExportFormat, ReconConfig, ReconSummary, RuleSet, Table};

use crate::exit_codes::{
    EXIT_ERROR, EXIT_EXPORT, EXIT_INVALID_CONFIG, EXIT_LOAD, EXIT_UNMATCHED, EXIT_USAGE,
};
use crate::CliError;

#[derive(Subcommand)]
pub enum ReconCommands {
    /// Reconcile the two datasets named in a TOML config file
    #[command(after_help = "\
Examples:
  tmatch run recon.toml
  tmatch run recon.toml --json
  tmatch run recon.toml --output-dir out --format csv
  tmatch run recon.toml --no-export --strict")]
    Run {
        /// Path to the .toml config file
        config: PathBuf,

        /// Print the JSON summary to stdout
        #[arg(long)]
        json: bool,

        /// Write results here instead of the config's [output] dir
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Export format (xlsx or csv), overriding the config
        #[arg(long)]
        format: Option<ExportFormat>,

        /// Skip writing result files
        #[arg(long)]
        no_export: bool,

        /// Exit with code 6 when any row is left unmatched
        #[arg(long)]
        strict: bool,
    },

    /// Validate a config without running
    #[command(after_help = "\
Examples:
  tmatch validate recon.toml
  tmatch validate recon.toml --with-data")]
    Validate {
        /// Path to the .toml config file
        config: PathBuf,

        /// Also load both datasets and check every rule column exists
        #[arg(long)]
        with_data: bool,
    },

    /// List a dataset's column names, one per line
    #[command(after_help = "\
Examples:
  tmatch columns base_a.csv
  tmatch columns base_b.xlsx --sheet Plan1
  tmatch columns export.txt --delimiter ';'")]
    Columns {
        /// CSV, TSV, TXT or Excel-family file
        file: PathBuf,

        /// Worksheet to read (first sheet when omitted)
        #[arg(long)]
        sheet: Option<String>,

        /// Field delimiter for text files (sniffed when omitted)
        #[arg(long)]
        delimiter: Option<char>,
    },
}

pub fn cmd_recon(cmd: ReconCommands, quiet: bool) -> Result<(), CliError> {
    match cmd {
        ReconCommands::Run {
            config,
            json,
            output_dir,
            format,
            no_export,
            strict,
        } => cmd_run(config, json, output_dir, format, no_export, strict, quiet),
        ReconCommands::Validate { config, with_data } => cmd_validate(config, with_data),
        ReconCommands::Columns {
            file,
            sheet,
            delimiter,
        } => cmd_columns(file, sheet, delimiter),
    }
}

fn recon_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError {
        code,
        message: msg.into(),
        hint: None,
    }
}

fn load_err(err: IoError) -> CliError {
    match err {
        IoError::UnsupportedFormat { .. } => recon_err(EXIT_LOAD, err.to_string())
            .with_hint("convert the file to csv or xlsx"),
        IoError::Table(_) => recon_err(EXIT_LOAD, err.to_string())
            .with_hint("dataset prefixes must be non-empty and contain no whitespace"),
        _ => recon_err(EXIT_LOAD, err.to_string()),
    }
}

/// JSON document printed by `run --json`.
#[derive(Debug, Serialize)]
struct RunReport {
    name: String,
    summary: ReconSummary,
    outputs: Vec<PathBuf>,
}

fn read_config(config_path: &Path) -> Result<(ReconConfig, PathBuf), CliError> {
    let config_str = std::fs::read_to_string(config_path).map_err(|e| {
        recon_err(
            EXIT_USAGE,
            format!("cannot read config {}: {e}", config_path.display()),
        )
    })?;
    let config = ReconConfig::from_toml(&config_str)
        .map_err(|e| recon_err(EXIT_INVALID_CONFIG, e.to_string()))?;

    // Dataset files and the output dir resolve relative to the config file
    let base_dir = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    Ok((config, base_dir))
}

/// Load both sides, reporting every failure before giving up.
fn load_tables(base_dir: &Path, config: &ReconConfig) -> Result<(Table, Table), CliError> {
    match load_pair(base_dir, &config.datasets) {
        (Ok(a), Ok(b)) => Ok((a, b)),
        (Err(e), Ok(_)) | (Ok(_), Err(e)) => Err(load_err(e)),
        (Err(ea), Err(eb)) => {
            eprintln!("error: {ea}");
            Err(load_err(eb))
        }
    }
}

fn build_rules(config: &ReconConfig, a: &Table, b: &Table) -> Result<RuleSet, CliError> {
    let rules = RuleSet::build(config.rules.clone(), a.schema(), b.schema()).map_err(|e| {
        recon_err(EXIT_INVALID_CONFIG, e.to_string())
            .with_hint("list a dataset's columns with `tmatch columns <file>`")
    })?;
    log::info!(
        "{} rule(s) checked against datasets {} and {}",
        rules.len(),
        a.prefix(),
        b.prefix()
    );
    Ok(rules)
}

fn cmd_run(
    config_path: PathBuf,
    json_output: bool,
    output_dir: Option<PathBuf>,
    format: Option<ExportFormat>,
    no_export: bool,
    strict: bool,
    quiet: bool,
) -> Result<(), CliError> {
    let (config, base_dir) = read_config(&config_path)?;
    log::debug!(
        "config '{}' from {}, paths relative to {}",
        config.name,
        config_path.display(),
        base_dir.display()
    );
    let (table_a, table_b) = load_tables(&base_dir, &config)?;
    let rules = build_rules(&config, &table_a, &table_b)?;

    let result = run(&table_a, &table_b, &rules);

    let outputs = if no_export {
        Vec::new()
    } else {
        let dir = output_dir.unwrap_or_else(|| tablematch_io::loader::resolve(&base_dir, &config.output.dir));
        let format = format.unwrap_or(config.output.format);
        export_result(&result, &dir, format).map_err(|e| recon_err(EXIT_EXPORT, e.to_string()))?
    };

    let s = &result.summary;
    if !quiet {
        eprintln!(
            "{}: {} matched, {} only in {}, {} only in {} ({} vs {} rows)",
            config.name,
            s.matched,
            s.only_a,
            table_a.prefix(),
            s.only_b,
            table_b.prefix(),
            s.rows_a,
            s.rows_b,
        );
        for count in &s.per_rule {
            eprintln!("  {}: {}", count.rule, count.matched);
        }
        for path in &outputs {
            eprintln!("wrote {}", path.display());
        }
    }

    if json_output {
        let report = RunReport {
            name: config.name.clone(),
            summary: s.clone(),
            outputs,
        };
        let json_str = serde_json::to_string_pretty(&report)
            .map_err(|e| recon_err(EXIT_ERROR, format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    }

    if no_export {
        log::info!("--no-export: result files not written");
    }

    if strict && (s.only_a > 0 || s.only_b > 0) {
        return Err(recon_err(
            EXIT_UNMATCHED,
            format!("{} unmatched row(s) remain", s.only_a + s.only_b),
        ));
    }

    Ok(())
}

fn cmd_validate(config_path: PathBuf, with_data: bool) -> Result<(), CliError> {
    let (config, base_dir) = read_config(&config_path)?;

    if with_data {
        let (table_a, table_b) = load_tables(&base_dir, &config)?;
        build_rules(&config, &table_a, &table_b)?;
        eprintln!(
            "valid: '{}' with {} rule(s); {} and {} rows loaded",
            config.name,
            config.rules.len(),
            table_a.len(),
            table_b.len(),
        );
    } else {
        eprintln!(
            "valid: '{}' with {} rule(s)",
            config.name,
            config.rules.len(),
        );
    }
    Ok(())
}

fn cmd_columns(file: PathBuf, sheet: Option<String>, delimiter: Option<char>) -> Result<(), CliError> {
    let label = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let dataset = DatasetConfig {
        sheet,
        delimiter,
        ..DatasetConfig::for_file(file.to_string_lossy(), label)
    };

    let headers = read_headers(&file, &dataset, "FILE").map_err(load_err)?;
    log::debug!("{}: {} column(s)", file.display(), headers.len());
    for header in headers {
        println!("{header}");
    }
    Ok(())
}
